//! Host-level tests for the transmit gate: throttling and collision
//! avoidance with the keypad controller.

use hayward_netbus::shared_constants::{SINGLE_FRAME_MAX_DURATION_MS, TRANSMIT_COUNT};
use hayward_netbus::{TxGate, TxHold};

const BURST_MS: u64 = SINGLE_FRAME_MAX_DURATION_MS * TRANSMIT_COUNT as u64;

#[test]
fn receiving_blocks_the_gate() {
    let gate = TxGate::new();
    assert_eq!(
        gate.clear_to_send(120_000, true, BURST_MS),
        Err(TxHold::Receiving)
    );
}

#[test]
fn ten_seconds_must_pass_between_bursts() {
    // P7: between two transmits the bus sees at least 10s of quiet.
    let mut gate = TxGate::new();
    gate.note_transmit(120_000);
    assert_eq!(
        gate.clear_to_send(129_999, false, BURST_MS),
        Err(TxHold::Throttled)
    );
    assert_eq!(gate.clear_to_send(130_000, false, BURST_MS), Ok(()));
}

#[test]
fn burst_must_fit_before_the_next_keypad_frame() {
    // P8: with a keypad frame expected inside the burst window, hold off.
    let mut gate = TxGate::new();
    gate.note_controller_frame(100_000);
    // Next keypad frame expected at 160_000.
    assert_eq!(
        gate.clear_to_send(158_000, false, BURST_MS),
        Err(TxHold::ControllerWindow)
    );
    assert_eq!(gate.clear_to_send(110_000, false, BURST_MS), Ok(()));
}

#[test]
fn silent_keypad_frees_the_bus_after_ninety_seconds() {
    let mut gate = TxGate::new();
    gate.note_controller_frame(100_000);
    // 1.5x the keypad period without a frame: assume it was unplugged.
    assert!(gate.controller_timed_out(190_001));
    assert_eq!(gate.clear_to_send(190_001, false, BURST_MS), Ok(()));
    // Just inside the window the regular collision rule still applies.
    assert!(!gate.controller_timed_out(189_999));
}

#[test]
fn startup_grace_assumes_an_unheard_keypad() {
    // Before a full keypad period has elapsed since boot, a keypad could
    // still announce itself at the end of its first minute.
    let gate = TxGate::new();
    assert_eq!(gate.next_controller_frame(5_000), Some(60_000));
    assert_eq!(gate.clear_to_send(5_000, false, BURST_MS), Ok(()));
    assert_eq!(
        gate.clear_to_send(59_000, false, BURST_MS),
        Err(TxHold::ControllerWindow)
    );
    // After the grace period with no keypad heard, the bus is free.
    assert_eq!(gate.next_controller_frame(61_000), None);
    assert_eq!(gate.clear_to_send(61_000, false, BURST_MS), Ok(()));
}

#[test]
fn keypad_timestamps_move_the_window() {
    let mut gate = TxGate::new();
    gate.note_controller_frame(100_000);
    gate.note_controller_frame(160_000);
    assert_eq!(gate.next_controller_frame(161_000), Some(220_000));
    assert!(gate.has_controller());
}
