//! Host-level end-to-end tests for the receive path: pulses in, canonical
//! state out. Run with `cargo test --features host`.

use hayward_netbus::pulse::encode_burst;
use hayward_netbus::{
    ClimateMode, DecodedFrame, Decoder, DiscardReason, FeedOutcome, HeatPumpState, ModeRestrict,
    Packet, PulseRecord, Registry, Source,
};

/// A heater conditions report (0xD2) with outlet 28.5C, exhaust 11.0C and
/// coil 17.5C, as its real (non-inverted) bytes.
const COND2: [u8; 12] = [
    0xD2, 0xB1, 0x11, 0x66, 0x75, 0x52, 0x5F, 0x00, 0x64, 0x00, 0x00, 0x84,
];

fn with_checksum(mut bytes: [u8; 12]) -> [u8; 12] {
    bytes[11] = bytes[..11].iter().fold(0u8, |s, b| s.wrapping_add(*b));
    bytes
}

fn complemented(bytes: &[u8]) -> Vec<u8> {
    bytes.iter().map(|b| !b).collect()
}

/// Runs a byte sequence through the transmit serializer and back through
/// the decoder, closing the frame with a bus-idle timeout.
fn decode_pulses(wire_bytes: &[u8], now_ms: u64) -> Result<DecodedFrame, FeedOutcome> {
    let packet = Packet::from_bytes(wire_bytes).expect("valid frame length");
    let mut decoder = Decoder::new();
    let mut last = FeedOutcome::Pending;
    for (low_ms, high_ms) in encode_burst(&packet, 1) {
        last = decoder.feed(PulseRecord::from_ms(low_ms, high_ms), now_ms);
        if let FeedOutcome::Frame(frame) = last {
            return Ok(frame);
        }
        if let FeedOutcome::Discarded(_) = last {
            return Err(last);
        }
    }
    match decoder.on_idle_timeout(now_ms) {
        FeedOutcome::Frame(frame) => Ok(frame),
        other => Err(other),
    }
}

#[test]
fn heater_outlet_temperature_frame_decodes_inverted() {
    // The heater signals with inverted polarity: the wire carries the
    // complement of the real bytes.
    let wire = complemented(&COND2);
    let frame = decode_pulses(&wire, 5_000).expect("frame");
    assert_eq!(frame.source, Source::Heater);
    assert_eq!(frame.packet.bytes(), &COND2);

    let mut registry = Registry::new();
    let mut state = HeatPumpState::new();
    let accepted = registry.accept(&frame, &mut state);
    assert!(accepted.first);
    assert_eq!(state.t03_temperature_outlet, Some(28.5));
    assert_eq!(state.t06_temperature_exhaust, Some(11.0));
    assert_eq!(state.t04_temperature_coil, Some(17.5));
    assert_eq!(state.last_heater_frame, Some(5_000));
    assert_eq!(state.last_controller_frame, None);
}

#[test]
fn controller_mode_setpoint_frame_decodes() {
    let bytes = with_checksum([
        0x81, 0xB1, 0x17, 0x06, 0x77, 0x78, 0x3D, 0x3D, 0x3D, 0x3D, 0x00, 0x00,
    ]);
    let frame = decode_pulses(&bytes, 60_000).expect("frame");
    assert_eq!(frame.source, Source::Controller);

    let mut registry = Registry::new();
    let mut state = HeatPumpState::new();
    registry.accept(&frame, &mut state);
    assert_eq!(state.mode, Some(ClimateMode::Heat));
    assert_eq!(state.mode_restrictions, Some(ModeRestrict::Any));
    assert_eq!(state.r01_setpoint_cooling, Some(3.0));
    assert_eq!(state.r02_setpoint_heating, Some(29.5));
    assert_eq!(state.r03_setpoint_auto, Some(30.0));
    // In heating mode the target follows the heating setpoint.
    assert_eq!(state.target_temperature, Some(29.5));
    assert_eq!(state.last_controller_frame, Some(60_000));
}

#[test]
fn corrupt_frame_is_rejected_without_touching_state() {
    let mut bytes = with_checksum([
        0x81, 0xB1, 0x17, 0x06, 0x77, 0x78, 0x3D, 0x3D, 0x3D, 0x3D, 0x00, 0x00,
    ]);
    bytes[5] ^= 0x08;
    let outcome = decode_pulses(&bytes, 0).expect_err("must not decode");
    assert_eq!(outcome, FeedOutcome::Discarded(DiscardReason::BadChecksum));
}

#[test]
fn unknown_type_registers_a_passthrough_entry_once() {
    let bytes = with_checksum([
        0xAB, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x00,
    ]);
    let frame = decode_pulses(&bytes, 42_000).expect("frame");

    let mut registry = Registry::new();
    let mut state = HeatPumpState::new();
    let before = registry.entries().count();
    let accepted = registry.accept(&frame, &mut state);
    assert_eq!(registry.entries().count(), before + 1);
    assert!(accepted.first);
    assert!(matches!(
        accepted.kind,
        hayward_netbus::FrameKind::Unknown(0xAB)
    ));

    // Apart from the liveness timestamp, nothing was decoded.
    let mut expected = HeatPumpState::new();
    expected.last_controller_frame = Some(42_000);
    assert_eq!(state, expected);

    // A repeat of the same unknown id reuses the entry.
    let again = registry.accept(&frame, &mut state);
    assert_eq!(registry.entries().count(), before + 1);
    assert!(!again.first);
    assert!(!again.changed);
}

#[test]
fn checksum_round_trip_over_both_lengths() {
    // P1: any valid frame survives serialize-then-decode bit-exactly.
    let long = with_checksum([
        0x85, 0xB1, 0x44, 0x06, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x2C, 0x00,
    ]);
    let mut short = [0xD2u8, 0x31, 0x22, 0x13, 0x04, 0x55, 0x46, 0x37, 0x00];
    short[8] = short[1..8].iter().fold(0u8, |s, b| s.wrapping_add(*b));

    for bytes in [&long[..], &short[..]] {
        let frame = decode_pulses(bytes, 0).expect("frame");
        assert_eq!(frame.source, Source::Controller);
        assert_eq!(frame.packet.bytes(), bytes);
    }
}

#[test]
fn polarity_dual_yields_the_same_logical_frame() {
    // P2: the complement of a frame decodes to the same bytes, attributed
    // to the heater.
    let bytes = with_checksum([
        0x82, 0xB1, 0x30, 0x3A, 0x66, 0x5A, 0x78, 0x00, 0x00, 0x00, 0x00, 0x00,
    ]);
    let direct = decode_pulses(&bytes, 0).expect("frame");
    let dual = decode_pulses(&complemented(&bytes), 0).expect("frame");
    assert_eq!(direct.packet, dual.packet);
    assert_eq!(direct.source, Source::Controller);
    assert_eq!(dual.source, Source::Heater);
}

#[test]
fn framer_is_idempotent_over_trailing_idle() {
    // P3: one idle closes the frame, a second idle is a no-op.
    let bytes = with_checksum([
        0x81, 0xB1, 0x17, 0x06, 0x77, 0x78, 0x3D, 0x3D, 0x3D, 0x3D, 0x00, 0x00,
    ]);
    let packet = Packet::from_bytes(&bytes).unwrap();
    let mut decoder = Decoder::new();
    let mut frames = 0;
    for (low_ms, high_ms) in encode_burst(&packet, 1) {
        if let FeedOutcome::Frame(_) = decoder.feed(PulseRecord::from_ms(low_ms, high_ms), 0) {
            frames += 1;
        }
    }
    assert_eq!(frames, 1);
    assert_eq!(decoder.on_idle_timeout(1), FeedOutcome::Pending);
    assert_eq!(decoder.on_idle_timeout(2), FeedOutcome::Pending);
}

#[test]
fn repeated_burst_finalizes_every_copy() {
    // Eight repeats arrive back to back; each preamble closes the previous
    // copy and the final idle closes the last.
    let bytes = with_checksum([
        0x81, 0xB1, 0x17, 0x06, 0x77, 0x78, 0x3D, 0x3D, 0x3D, 0x3D, 0x00, 0x00,
    ]);
    let packet = Packet::from_bytes(&bytes).unwrap();
    let mut decoder = Decoder::new();
    let mut frames = 0;
    for (low_ms, high_ms) in encode_burst(&packet, 8) {
        if let FeedOutcome::Frame(frame) = decoder.feed(PulseRecord::from_ms(low_ms, high_ms), 0) {
            assert_eq!(frame.packet.bytes(), &bytes);
            frames += 1;
        }
    }
    if let FeedOutcome::Frame(_) = decoder.on_idle_timeout(0) {
        frames += 1;
    }
    assert_eq!(frames, 8);
}

#[test]
fn registry_returns_the_same_slot_across_frames() {
    // P4: the singleton entry survives and rotates data into prev.
    let first = with_checksum([
        0x81, 0xB1, 0x17, 0x06, 0x77, 0x78, 0x3D, 0x3D, 0x3D, 0x3D, 0x00, 0x00,
    ]);
    let second = with_checksum([
        0x81, 0xB1, 0x17, 0x06, 0x75, 0x78, 0x3D, 0x3D, 0x3D, 0x3D, 0x00, 0x00,
    ]);
    let mut registry = Registry::new();
    let mut state = HeatPumpState::new();

    let frame_a = decode_pulses(&first, 10).expect("frame");
    let frame_b = decode_pulses(&second, 20).expect("frame");
    let a = registry.accept(&frame_a, &mut state);
    let b = registry.accept(&frame_b, &mut state);
    assert_eq!(a.kind, b.kind);
    assert!(a.first && !b.first);
    assert!(b.changed);

    let entry = registry.entry(a.kind).expect("entry");
    assert_eq!(entry.data.unwrap().bytes(), &second);
    assert_eq!(entry.prev.unwrap().bytes(), &first);
    assert!(entry.is_changed());

    // A third identical frame makes the slot report unchanged.
    let frame_c = decode_pulses(&second, 30).expect("frame");
    let c = registry.accept(&frame_c, &mut state);
    assert!(!c.changed);
    assert!(!registry.entry(a.kind).unwrap().is_changed());
}

#[test]
fn conditions_one_flavors_split_on_marker_byte() {
    // 0xD1 with marker 0x05 carries only the inlet temperature; any other
    // marker carries the water-flow flag too.
    let plain = with_checksum([
        0xD1, 0xB1, 0x05, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x75, 0x00, 0x00,
    ]);
    let flow = with_checksum([
        0xD1, 0xB1, 0x0B, 0x00, 0x02, 0x00, 0x00, 0x00, 0x00, 0x66, 0x00, 0x00,
    ]);

    let mut registry = Registry::new();
    let mut state = HeatPumpState::new();

    let frame = decode_pulses(&plain, 0).expect("frame");
    let accepted = registry.accept(&frame, &mut state);
    assert_eq!(accepted.kind, hayward_netbus::FrameKind::Conditions1);
    assert_eq!(state.t02_temperature_inlet, Some(28.5));
    assert_eq!(state.s02_water_flow, None);

    let frame = decode_pulses(&flow, 0).expect("frame");
    let accepted = registry.accept(&frame, &mut state);
    assert_eq!(accepted.kind, hayward_netbus::FrameKind::Conditions1B);
    assert_eq!(state.s02_water_flow, Some(true));
    assert_eq!(state.t02_temperature_inlet, Some(21.0));
}

#[test]
fn clock_frame_is_surfaced_verbatim() {
    let bytes = with_checksum([
        0xCF, 0xB1, 0x00, 0x00, 0x02, 0x07, 0x15, 0x0E, 0x21, 0x00, 0x00, 0x00,
    ]);
    let frame = decode_pulses(&bytes, 0).expect("frame");
    let mut registry = Registry::new();
    let mut state = HeatPumpState::new();
    registry.accept(&frame, &mut state);
    let clock = state.clock.expect("clock");
    assert_eq!(
        (clock.year, clock.month, clock.day, clock.hour, clock.minute),
        (0x02, 0x07, 0x15, 0x0E, 0x21)
    );
}
