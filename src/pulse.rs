//! Pulse records and the bit-banged wire format.
//!
//! Every symbol on the bus is one low period followed by one high period.
//! The capture side pairs the two half-periods into a [`PulseRecord`]; the
//! transmit side serializes a packet into the same (low, high) pairs, which
//! also makes receive/transmit round trips directly testable.

use crate::packet::Packet;
use crate::shared_constants::{
    BIT_LONG_HIGH_MS, BIT_LOW_MS, BIT_SHORT_HIGH_MS, FRAME_END_THRESHOLD_MS, FRAME_SPACING_MS,
    GROUP_SPACING_MS, PREAMBLE_HIGH_MS, PREAMBLE_LOW_MS, PULSE_TOLERANCE_US,
};

/// One low/high symbol captured from the bus, in microseconds.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PulseRecord {
    /// Duration of the low half-period.
    pub low_us: u32,
    /// Duration of the high half-period.
    pub high_us: u32,
}

impl PulseRecord {
    /// Builds a record from millisecond durations (handy in tests and in
    /// the transmit path, which thinks in milliseconds).
    #[must_use]
    pub const fn from_ms(low_ms: u32, high_ms: u32) -> Self {
        Self {
            low_us: low_ms * 1000,
            high_us: high_ms * 1000,
        }
    }
}

/// What a pulse record looks like to the framer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PulseClass {
    /// The 9 ms/5 ms frame heading.
    Preamble,
    /// A `1` bit.
    LongBit,
    /// A `0` bit.
    ShortBit,
    /// The bus went idle (or a half-period is missing entirely).
    FrameEnd,
    /// Out of tolerance for every known symbol.
    Invalid,
}

#[inline]
fn near(actual_us: u32, nominal_ms: u32) -> bool {
    let nominal_us = nominal_ms * 1000;
    actual_us >= nominal_us.saturating_sub(PULSE_TOLERANCE_US)
        && actual_us <= nominal_us + PULSE_TOLERANCE_US
}

/// Classifies one record against the wire format.
///
/// Only the high period identifies the preamble, matching how the keypad
/// itself tolerates a stretched preamble low after long idle periods.
#[must_use]
pub fn classify(record: PulseRecord) -> PulseClass {
    if near(record.high_us, PREAMBLE_HIGH_MS) {
        PulseClass::Preamble
    } else if near(record.low_us, BIT_LOW_MS) && near(record.high_us, BIT_LONG_HIGH_MS) {
        PulseClass::LongBit
    } else if near(record.low_us, BIT_LOW_MS) && near(record.high_us, BIT_SHORT_HIGH_MS) {
        PulseClass::ShortBit
    } else if record.low_us == 0
        || record.high_us == 0
        || record.high_us >= FRAME_END_THRESHOLD_MS * 1000
    {
        PulseClass::FrameEnd
    } else {
        PulseClass::Invalid
    }
}

/// Serializes one frame into `(low_ms, high_ms)` pairs: the preamble, then
/// every byte LSB-first with a 3 ms high for `1` and a 1 ms high for `0`.
///
/// The spacing element that separates repeats is not included; the
/// transmitter appends it per copy so it can yield between repeats without
/// ever yielding mid-frame.
pub fn encode_frame(packet: &Packet) -> impl Iterator<Item = (u32, u32)> + '_ {
    core::iter::once((PREAMBLE_LOW_MS, PREAMBLE_HIGH_MS)).chain(packet.bytes().iter().flat_map(
        |byte| {
            (0..8u8).map(move |bit_index| {
                let high = if byte & (1 << bit_index) != 0 {
                    BIT_LONG_HIGH_MS
                } else {
                    BIT_SHORT_HIGH_MS
                };
                (BIT_LOW_MS, high)
            })
        },
    ))
}

/// The spacing element transmitted after one copy of a frame: 100 ms high
/// between repeats, 250 ms after the last one.
#[must_use]
pub const fn spacing_after(repeat: u8, repeats: u8) -> (u32, u32) {
    if repeat + 1 == repeats {
        (BIT_LOW_MS, GROUP_SPACING_MS)
    } else {
        (BIT_LOW_MS, FRAME_SPACING_MS)
    }
}

/// Serializes a packet into the full transmit burst of `repeats` copies,
/// spacing elements included.
pub fn encode_burst(
    packet: &Packet,
    repeats: u8,
) -> impl Iterator<Item = (u32, u32)> + '_ {
    (0..repeats).flat_map(move |repeat| {
        encode_frame(packet).chain(core::iter::once(spacing_after(repeat, repeats)))
    })
}

/// Total on-wire duration of a burst, in milliseconds.
#[must_use]
pub fn burst_duration_ms(packet: &Packet, repeats: u8) -> u64 {
    encode_burst(packet, repeats)
        .map(|(low, high)| u64::from(low) + u64::from(high))
        .sum()
}
