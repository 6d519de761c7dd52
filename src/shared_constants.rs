//! Wire timing and sizing constants for the NET-port bus.
//!
//! All pulse durations come straight from the observed bus traffic: a frame
//! is a 9 ms/5 ms preamble followed by one low/high symbol per bit, and the
//! keypad controller repeats its configuration frames once per minute.

/// Tolerance applied around every nominal pulse width, in microseconds.
pub const PULSE_TOLERANCE_US: u32 = 600;

/// Preamble low period before every frame.
pub const PREAMBLE_LOW_MS: u32 = 9;
/// Preamble high period before every frame.
pub const PREAMBLE_HIGH_MS: u32 = 5;
/// Low period that leads every bit symbol.
pub const BIT_LOW_MS: u32 = 1;
/// High period of a `1` bit.
pub const BIT_LONG_HIGH_MS: u32 = 3;
/// High period of a `0` bit.
pub const BIT_SHORT_HIGH_MS: u32 = BIT_LOW_MS;
/// A high period at least this long means the frame is over and the bus is
/// idle. Successive frames of one group are 100 ms apart.
pub const FRAME_END_THRESHOLD_MS: u32 = 50;
/// High period between repeats of a transmitted command.
pub const FRAME_SPACING_MS: u32 = 100;
/// High period after the last repeat of a transmitted command.
pub const GROUP_SPACING_MS: u32 = 250;

/// Number of back-to-back copies sent for every outbound command.
pub const TRANSMIT_COUNT: u8 = 8;

/// Long frames carry 12 bytes, short frames 9.
pub const FRAME_LEN_LONG: usize = 12;
/// Short frame length in bytes.
pub const FRAME_LEN_SHORT: usize = 9;

/// Minimum spacing between two of our own transmissions.
pub const TX_THROTTLE_MS: u64 = 10 * 1000;
/// Interval at which the keypad controller normally repeats its frames.
pub const CONTROLLER_PERIOD_MS: u64 = 60 * 1000;
/// Without a controller frame for 1.5x its period, assume it was unplugged.
pub const CONTROLLER_TIMEOUT_MS: u64 = CONTROLLER_PERIOD_MS + CONTROLLER_PERIOD_MS / 2;
/// Without a heater frame for this long, report the heater offline.
pub const HEATER_OFFLINE_MS: u64 = 30 * 1000;

/// Worst-case duration of one transmitted frame: every bit long, plus the
/// inter-frame spacing and the preamble.
pub const SINGLE_FRAME_MAX_DURATION_MS: u64 = (FRAME_LEN_LONG as u64)
    * 8
    * ((BIT_LONG_HIGH_MS + BIT_LOW_MS) as u64)
    + (FRAME_SPACING_MS as u64)
    + ((PREAMBLE_LOW_MS + PREAMBLE_HIGH_MS) as u64);

/// Pulse queue capacity: at least 12 long frames' worth of symbols.
pub const PULSE_QUEUE_LEN: usize = 2048;
/// Outbound command queue capacity.
pub const TX_QUEUE_LEN: usize = 8;

/// How long the RX worker waits for pulses before checking for bus idle.
pub const RX_POP_TIMEOUT_MS: u64 = 120;
/// How often the TX worker re-evaluates its send preconditions.
pub const TX_TICK_MS: u64 = 1500;
/// Grace period after boot before the first transmission is attempted.
pub const TX_STARTUP_DELAY_MS: u64 = 15 * 1000;
/// How long a momentary status line stays visible.
pub const STATUS_MOMENTARY_MS: u64 = 5 * 1000;
