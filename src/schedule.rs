//! Transmit gating: throttling and collision avoidance with the keypad.
//!
//! The keypad controller owns the bus cadence — it repeats its frames once
//! per minute — so our bursts must fit into the gap. The gate is plain
//! arithmetic over millisecond timestamps; the TX worker feeds it the clock
//! so the rules stay testable on the host.

use crate::shared_constants::{
    CONTROLLER_PERIOD_MS, CONTROLLER_TIMEOUT_MS, TX_THROTTLE_MS,
};

/// Why the gate refused to transmit this tick.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TxHold {
    /// A frame is currently being received.
    Receiving,
    /// Less than the throttle window since our last burst.
    Throttled,
    /// The keypad is due before our burst would finish.
    ControllerWindow,
}

/// Decides when a burst may start.
#[derive(Copy, Clone, Debug, Default)]
pub struct TxGate {
    last_tx_ms: Option<u64>,
    controller_seen: bool,
    last_controller_ms: Option<u64>,
}

impl TxGate {
    /// A gate that has seen nothing yet.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last_tx_ms: None,
            controller_seen: false,
            last_controller_ms: None,
        }
    }

    /// Records a finalized controller frame.
    pub fn note_controller_frame(&mut self, now_ms: u64) {
        self.controller_seen = true;
        self.last_controller_ms = Some(now_ms);
    }

    /// Records a completed burst of our own.
    pub fn note_transmit(&mut self, now_ms: u64) {
        self.last_tx_ms = Some(now_ms);
    }

    /// A controller has spoken at least once.
    #[must_use]
    pub const fn has_controller(&self) -> bool {
        self.controller_seen
    }

    /// The controller missed 1.5x its usual period; assume it was
    /// unplugged.
    #[must_use]
    pub fn controller_timed_out(&self, now_ms: u64) -> bool {
        self.last_controller_ms
            .is_some_and(|last| last + CONTROLLER_TIMEOUT_MS < now_ms)
    }

    /// When the next controller frame is expected, if one can be expected
    /// at all. Early after boot we conservatively assume a yet-unheard
    /// controller could speak at the end of its first period.
    #[must_use]
    pub fn next_controller_frame(&self, now_ms: u64) -> Option<u64> {
        if let Some(last) = self.last_controller_ms {
            return Some(last + CONTROLLER_PERIOD_MS);
        }
        if now_ms < CONTROLLER_PERIOD_MS {
            return Some(CONTROLLER_PERIOD_MS);
        }
        None
    }

    /// At least the throttle window has passed since our last burst.
    #[must_use]
    pub fn throttle_elapsed(&self, now_ms: u64) -> bool {
        self.last_tx_ms
            .is_none_or(|last| last + TX_THROTTLE_MS <= now_ms)
    }

    /// Whether a burst of `burst_ms` may start now.
    ///
    /// # Errors
    ///
    /// Returns the first precondition that does not hold.
    pub fn clear_to_send(
        &self,
        now_ms: u64,
        receiving: bool,
        burst_ms: u64,
    ) -> Result<(), TxHold> {
        if receiving {
            return Err(TxHold::Receiving);
        }
        if !self.throttle_elapsed(now_ms) {
            return Err(TxHold::Throttled);
        }
        if self.has_controller() && self.controller_timed_out(now_ms) {
            // The keypad went away; the bus is ours.
            return Ok(());
        }
        match self.next_controller_frame(now_ms) {
            Some(next) if now_ms + burst_ms >= next => Err(TxHold::ControllerWindow),
            _ => Ok(()),
        }
    }
}
