//! Host-level tests for the control path: a `Call` against the frame
//! catalog produces (or withholds) outbound packets.

use hayward_netbus::{
    Call, ClimateMode, DecodedFrame, DefrostEcoMode, FanMode, FlowMeter, HeatPumpState, Packet,
    Registry, Source,
};

fn with_checksum(mut bytes: [u8; 12]) -> [u8; 12] {
    bytes[11] = bytes[..11].iter().fold(0u8, |s, b| s.wrapping_add(*b));
    bytes
}

fn seed(registry: &mut Registry, state: &mut HeatPumpState, bytes: [u8; 12]) {
    let frame = DecodedFrame {
        packet: Packet::from_bytes(&bytes).expect("frame length"),
        source: Source::Heater,
        frame_time_ms: 1_000,
    };
    registry.accept(&frame, state);
}

/// 0x81 with power on, heat, any-mode restriction, heating setpoint 29.5C.
const CONF_MODE: [u8; 12] = [
    0x81, 0xB1, 0x17, 0x06, 0x77, 0x78, 0x3D, 0x3D, 0x3D, 0x3D, 0x00, 0x00,
];
/// 0x82 with fan mode low and a defrost program.
const CONF_FAN: [u8; 12] = [
    0x82, 0xB1, 0x00, 0x36, 0x66, 0x5A, 0x78, 0x00, 0x00, 0x00, 0x00, 0x00,
];
/// 0x85 with the flow meter disabled and 300 pulses per liter.
const CONF_FLOW: [u8; 12] = [
    0x85, 0xB1, 0x00, 0x14, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x2C, 0x00,
];

#[test]
fn fan_mode_change_clones_and_patches_the_fan_frame() {
    let mut registry = Registry::new();
    let mut state = HeatPumpState::new();
    seed(&mut registry, &mut state, with_checksum(CONF_FAN));

    let result = registry.control(&Call::new().fan_mode(FanMode::Scheduled));
    assert!(!result.awaiting_data);
    assert_eq!(result.packets.len(), 1);
    let packet = &result.packets[0];
    assert_eq!(packet.type_id(), 0x82);
    // The nibble is the only payload change, and the checksum follows.
    assert_eq!(packet.byte(2) >> 4, 0x03);
    assert!(packet.is_checksum_valid());
    let reference = with_checksum(CONF_FAN);
    for index in 3..11 {
        assert_eq!(packet.byte(index), reference[index], "byte {index}");
    }
}

#[test]
fn untouched_frames_stay_silent() {
    // P5: a call that touches no field of a frame must not produce a
    // packet from it.
    let mut registry = Registry::new();
    let mut state = HeatPumpState::new();
    seed(&mut registry, &mut state, with_checksum(CONF_MODE));
    seed(&mut registry, &mut state, with_checksum(CONF_FAN));

    let result = registry.control(&Call::new());
    assert!(result.packets.is_empty());
    assert!(!result.awaiting_data);
}

#[test]
fn echoing_the_current_value_produces_nothing() {
    // P6: a delta equal to the held payload is not retransmitted.
    let mut registry = Registry::new();
    let mut state = HeatPumpState::new();
    seed(&mut registry, &mut state, with_checksum(CONF_FAN));

    let result = registry.control(&Call::new().fan_mode(FanMode::Low));
    assert!(result.packets.is_empty());
}

#[test]
fn control_before_first_frame_reports_awaiting_data() {
    let registry = Registry::new();
    let result = registry.control(&Call::new().fan_mode(FanMode::High));
    assert!(result.packets.is_empty());
    assert!(result.awaiting_data);
}

#[test]
fn mode_change_rewrites_the_mode_byte() {
    let mut registry = Registry::new();
    let mut state = HeatPumpState::new();
    seed(&mut registry, &mut state, with_checksum(CONF_MODE));

    let result = registry.control(&Call::new().mode(ClimateMode::Off));
    assert_eq!(result.packets.len(), 1);
    let packet = &result.packets[0];
    assert_eq!(packet.type_id(), 0x81);
    // Power, heat and auto bits cleared; the unknown bits ride along.
    assert_eq!(packet.byte(2) & 0x31, 0x00);
    assert_eq!(packet.byte(2) & 0x06, 0x06);
    assert!(packet.is_checksum_valid());
}

#[test]
fn target_temperature_lands_in_the_active_mode_setpoint() {
    let mut registry = Registry::new();
    let mut state = HeatPumpState::new();
    seed(&mut registry, &mut state, with_checksum(CONF_MODE));

    // Heating is active, so the heating setpoint byte moves.
    let result = registry.control(&Call::new().target_temperature(28.0));
    assert_eq!(result.packets.len(), 1);
    let packet = &result.packets[0];
    assert_eq!(packet.byte(4), 0x74);
    assert_eq!(packet.byte(3), CONF_MODE[3]);
    assert_eq!(packet.byte(5), CONF_MODE[5]);
}

#[test]
fn mode_and_target_in_one_call_follow_the_new_mode() {
    let mut registry = Registry::new();
    let mut state = HeatPumpState::new();
    seed(&mut registry, &mut state, with_checksum(CONF_MODE));

    let result = registry.control(
        &Call::new()
            .mode(ClimateMode::Cool)
            .target_temperature(20.0),
    );
    assert_eq!(result.packets.len(), 1);
    let packet = &result.packets[0];
    // Cooling setpoint byte took the target, heating byte untouched.
    assert_eq!(packet.byte(3), 0x64);
    assert_eq!(packet.byte(4), CONF_MODE[4]);
}

#[test]
fn flow_meter_and_pulses_per_liter_patch_the_flow_frame() {
    let mut registry = Registry::new();
    let mut state = HeatPumpState::new();
    seed(&mut registry, &mut state, with_checksum(CONF_FLOW));
    assert_eq!(state.u01_flow_meter, Some(FlowMeter::Disabled));
    assert_eq!(state.u02_pulses_per_liter, Some(300));

    let result = registry.control(
        &Call::new()
            .u01_flow_meter(FlowMeter::Enabled)
            .u02_pulses_per_liter(450),
    );
    assert_eq!(result.packets.len(), 1);
    let packet = &result.packets[0];
    assert_eq!(packet.type_id(), 0x85);
    assert_ne!(packet.byte(2) & 0x04, 0);
    assert_eq!(packet.byte(9), 0x01);
    assert_eq!(packet.byte(10), 0xC2);
    assert!(packet.is_checksum_valid());
}

#[test]
fn eco_defrost_toggle_patches_the_flags_byte() {
    let mut registry = Registry::new();
    let mut state = HeatPumpState::new();
    seed(&mut registry, &mut state, with_checksum(CONF_FLOW));
    assert_eq!(state.d06_defrost_eco_mode, Some(DefrostEcoMode::Normal));

    let result = registry.control(&Call::new().d06_defrost_eco_mode(DefrostEcoMode::Eco));
    assert_eq!(result.packets.len(), 1);
    assert_ne!(result.packets[0].byte(2) & 0x40, 0);
}

#[test]
fn one_call_can_fan_out_to_several_frames() {
    let mut registry = Registry::new();
    let mut state = HeatPumpState::new();
    seed(&mut registry, &mut state, with_checksum(CONF_MODE));
    seed(&mut registry, &mut state, with_checksum(CONF_FAN));

    let result = registry.control(
        &Call::new()
            .mode(ClimateMode::Auto)
            .fan_mode(FanMode::High),
    );
    assert_eq!(result.packets.len(), 2);
    // Registry order: the mode frame first, the fan frame second.
    assert_eq!(result.packets[0].type_id(), 0x81);
    assert_eq!(result.packets[1].type_id(), 0x82);
}

#[test]
fn out_of_band_target_is_rejected_by_validation() {
    let state = HeatPumpState::new();
    let call = Call::new().target_temperature(40.0);
    assert!(call.validate(&state).is_err());
    assert!(Call::new().target_temperature(28.0).validate(&state).is_ok());

    // A narrower advertised window tightens the check.
    let mut state = state;
    state.min_target_temperature = Some(20.0);
    state.max_target_temperature = Some(25.0);
    assert!(Call::new().target_temperature(28.0).validate(&state).is_err());
}

#[test]
fn traits_follow_the_mode_restriction() {
    let mut registry = Registry::new();
    let mut state = HeatPumpState::new();
    // Heating-only restriction: bit 3 set, bit 2 clear.
    let restricted = with_checksum([
        0x81, 0xB1, 0x19, 0x06, 0x77, 0x78, 0x3D, 0x3D, 0x3D, 0x3D, 0x00, 0x00,
    ]);
    seed(&mut registry, &mut state, restricted);

    let mut traits = hayward_netbus::Traits::default();
    registry.collect_traits(&mut traits);
    assert!(traits.modes.contains(&ClimateMode::Off));
    assert!(traits.modes.contains(&ClimateMode::Heat));
    assert!(!traits.modes.contains(&ClimateMode::Cool));
    assert_eq!(traits.fan_modes.len(), 5);
}
