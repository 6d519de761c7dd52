//! The receive-side frame state machine.
//!
//! Fed one [`PulseRecord`] at a time. Bits accumulate LSB-first into bytes,
//! bytes into a packet buffer bounded at twelve. A frame is complete once
//! its length is 9 or 12 bytes *and* its checksum validates under one of
//! the two polarities; completion is only acted on when the bus tells us
//! the frame is over (idle, the next preamble, or an out-of-band pulse).
//!
//! The decoder is deliberately free of clocks and logging: callers pass the
//! current time in and log the returned outcomes.

use crate::packet::{Packet, Source};
use crate::pulse::{classify, PulseClass, PulseRecord};

/// A finalized frame, its polarity already normalized.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DecodedFrame {
    /// The packet with real (non-inverted) bytes.
    pub packet: Packet,
    /// Who sent it.
    pub source: Source,
    /// When it finished, in milliseconds.
    pub frame_time_ms: u64,
}

/// Why the decoder threw away an in-progress frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DiscardReason {
    /// A pulse width matched no symbol.
    InvalidPulse,
    /// The bus went idle before the frame was complete.
    IncompleteFrame,
    /// Length was right but neither polarity produced a valid checksum.
    BadChecksum,
    /// More than twelve bytes accumulated.
    Overflow,
}

/// Outcome of feeding one pulse record.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FeedOutcome {
    /// Nothing to report yet.
    Pending,
    /// A frame finished.
    Frame(DecodedFrame),
    /// An in-progress frame was dropped.
    Discarded(DiscardReason),
}

/// Frame state machine. One per bus.
#[derive(Clone, Debug)]
pub struct Decoder {
    packet: Packet,
    current_byte: u8,
    bit_index: u8,
    started: bool,
}

impl Decoder {
    /// A decoder in the idle state.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            packet: Packet::new(),
            current_byte: 0,
            bit_index: 0,
            started: false,
        }
    }

    /// True while a frame is being accumulated. The transmit scheduler
    /// holds off while this is set.
    #[must_use]
    pub const fn is_receiving(&self) -> bool {
        self.started
    }

    /// Back to idle; zeroes the packet buffer.
    pub fn reset(&mut self) {
        self.packet.reset();
        self.current_byte = 0;
        self.bit_index = 0;
        self.started = false;
    }

    /// Length and checksum both line up.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        if !self.started || !self.packet.is_size_valid() {
            return false;
        }
        let mut candidate = self.packet;
        candidate.validate() != Source::Unknown
    }

    /// Feeds one captured record through the state machine.
    pub fn feed(&mut self, record: PulseRecord, now_ms: u64) -> FeedOutcome {
        match classify(record) {
            PulseClass::Preamble => {
                let outcome = if !self.started || self.packet.is_empty() {
                    FeedOutcome::Pending
                } else if self.packet.is_size_valid() {
                    self.finalize(now_ms)
                } else {
                    FeedOutcome::Discarded(DiscardReason::IncompleteFrame)
                };
                self.reset();
                self.started = true;
                outcome
            }
            PulseClass::LongBit if self.started => self.append_bit(true),
            PulseClass::ShortBit if self.started => self.append_bit(false),
            PulseClass::FrameEnd if self.started => {
                if self.packet.is_size_valid() {
                    self.finalize(now_ms)
                } else {
                    self.reset();
                    FeedOutcome::Discarded(DiscardReason::IncompleteFrame)
                }
            }
            PulseClass::Invalid if self.started => {
                // A foreign pulse right after a full frame is just the
                // spacing being chewed up by a collision; keep the frame.
                if self.packet.is_size_valid() {
                    self.finalize(now_ms)
                } else {
                    self.reset();
                    FeedOutcome::Discarded(DiscardReason::InvalidPulse)
                }
            }
            _ => FeedOutcome::Pending,
        }
    }

    /// Synthesizes a frame-end when the RX worker notices the bus has been
    /// idle past the threshold with a frame still open.
    pub fn on_idle_timeout(&mut self, now_ms: u64) -> FeedOutcome {
        if !self.started {
            return FeedOutcome::Pending;
        }
        self.feed(
            PulseRecord {
                low_us: 0,
                high_us: 0,
            },
            now_ms,
        )
    }

    fn append_bit(&mut self, long: bool) -> FeedOutcome {
        if long {
            self.current_byte |= 1 << self.bit_index;
        }
        self.bit_index += 1;
        if self.bit_index == 8 {
            if !self.packet.push(self.current_byte) {
                self.reset();
                return FeedOutcome::Discarded(DiscardReason::Overflow);
            }
            self.bit_index = 0;
            self.current_byte = 0;
        }
        FeedOutcome::Pending
    }

    fn finalize(&mut self, now_ms: u64) -> FeedOutcome {
        let mut packet = self.packet;
        let source = packet.validate();
        self.reset();
        if source == Source::Unknown {
            return FeedOutcome::Discarded(DiscardReason::BadChecksum);
        }
        FeedOutcome::Frame(DecodedFrame {
            packet,
            source,
            frame_time_ms: now_ms,
        })
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pulse::encode_burst;

    fn feed_bytes(decoder: &mut Decoder, bytes: &[u8]) -> Option<DecodedFrame> {
        let packet = Packet::from_bytes(bytes).unwrap();
        let mut frame = None;
        for (low_ms, high_ms) in encode_burst(&packet, 1) {
            if let FeedOutcome::Frame(decoded) =
                decoder.feed(PulseRecord::from_ms(low_ms, high_ms), 1_000)
            {
                frame = Some(decoded);
            }
        }
        frame
    }

    #[test]
    fn decodes_a_controller_frame_from_its_own_pulses() {
        let mut bytes = [0x81u8, 0xB1, 0x17, 0x06, 0x77, 0x78, 0x3D, 0x3D, 0x3D, 0x3D, 0x00, 0x00];
        bytes[11] = bytes[..11].iter().fold(0u8, |s, b| s.wrapping_add(*b));

        let mut decoder = Decoder::new();
        let frame = feed_bytes(&mut decoder, &bytes).expect("frame");
        assert_eq!(frame.source, Source::Controller);
        assert_eq!(frame.packet.bytes(), &bytes);
        assert!(!decoder.is_receiving());
    }

    #[test]
    fn idle_after_idle_is_a_no_op() {
        let mut decoder = Decoder::new();
        assert_eq!(decoder.on_idle_timeout(0), FeedOutcome::Pending);
        assert_eq!(decoder.on_idle_timeout(1), FeedOutcome::Pending);
    }

    #[test]
    fn overflow_resets_the_frame() {
        let mut decoder = Decoder::new();
        decoder.feed(PulseRecord::from_ms(9, 5), 0);
        for _ in 0..13 * 8 {
            decoder.feed(PulseRecord::from_ms(1, 1), 0);
        }
        assert!(!decoder.is_receiving());
    }

    #[test]
    fn preamble_mid_frame_restarts_accumulation() {
        let mut decoder = Decoder::new();
        decoder.feed(PulseRecord::from_ms(9, 5), 0);
        for _ in 0..8 {
            decoder.feed(PulseRecord::from_ms(1, 3), 0);
        }
        let outcome = decoder.feed(PulseRecord::from_ms(9, 5), 0);
        assert_eq!(outcome, FeedOutcome::Discarded(DiscardReason::IncompleteFrame));
        assert!(decoder.is_receiving());
    }
}
