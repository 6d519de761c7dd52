//! Frame catalog and dispatch.
//!
//! Every known frame kind is one variant of [`FrameKind`]; dispatch is a
//! `match`, so the catalog is closed at compile time. The [`Registry`] owns
//! one entry per kind with the last and previous raw packets, and grows a
//! pass-through entry the first time an unrecognized type id shows up so
//! repeats of the same unknown frame are deduplicated rather than logged
//! over and over.

pub mod clock;
pub mod conditions;
pub mod conf_fan_defrost;
pub mod conf_flow;
pub mod conf_limits;
pub mod conf_mode;

use core::fmt;

use heapless::Vec;

use crate::call::Call;
use crate::decoder::DecodedFrame;
use crate::packet::{Packet, Source};
use crate::shared_constants::TX_QUEUE_LEN;
use crate::state::{HeatPumpState, Traits};

/// 0x84 — configuration frame with no identified fields.
pub const FRAME_ID_CONF_RESERVED_4: u8 = 0x84;
/// 0x86 — configuration frame with no identified fields.
pub const FRAME_ID_CONF_RESERVED_6: u8 = 0x86;

/// How many unrecognized type ids the registry can track.
const MAX_UNKNOWN_KINDS: usize = 16;

/// Every frame kind the driver knows how to tell apart.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FrameKind {
    /// 0x81 mode, setpoints and differentials.
    ConfMode,
    /// 0x82 fan mode and defrost program.
    ConfFanDefrost,
    /// 0x83 setpoint limits.
    ConfSetpointLimits,
    /// 0x84, preserved verbatim.
    ConfReserved4,
    /// 0x85 flow meter and economy defrost.
    ConfFlowMeter,
    /// 0x86, preserved verbatim.
    ConfReserved6,
    /// 0xCF power-on clock.
    Clock,
    /// 0xD1 inlet temperature report.
    Conditions1,
    /// 0xD1 variant with the water-flow flag.
    Conditions1B,
    /// 0xD2 long frame with outlet/exhaust/coil temperatures.
    Conditions2,
    /// 0xD2 short companion frame, fields unidentified.
    Conditions2B,
    /// Any type id without a specialized decoder.
    Unknown(u8),
}

impl FrameKind {
    /// Registration order of the specialized kinds. Lookup is linear and
    /// first match wins, which is what lets the two 0xD1 flavors and the
    /// two 0xD2 lengths coexist.
    const KNOWN: [Self; 11] = [
        Self::ConfMode,
        Self::ConfFanDefrost,
        Self::ConfSetpointLimits,
        Self::ConfReserved4,
        Self::ConfFlowMeter,
        Self::ConfReserved6,
        Self::Clock,
        Self::Conditions1,
        Self::Conditions1B,
        Self::Conditions2,
        Self::Conditions2B,
    ];

    fn matches(self, packet: &Packet) -> bool {
        match self {
            Self::ConfMode => packet.type_id() == conf_mode::FRAME_ID,
            Self::ConfFanDefrost => packet.type_id() == conf_fan_defrost::FRAME_ID,
            Self::ConfSetpointLimits => packet.type_id() == conf_limits::FRAME_ID,
            Self::ConfReserved4 => packet.type_id() == FRAME_ID_CONF_RESERVED_4,
            Self::ConfFlowMeter => packet.type_id() == conf_flow::FRAME_ID,
            Self::ConfReserved6 => packet.type_id() == FRAME_ID_CONF_RESERVED_6,
            Self::Clock => packet.type_id() == clock::FRAME_ID,
            Self::Conditions1 => {
                packet.type_id() == conditions::FRAME_ID_CONDITIONS_1
                    && packet.byte(conditions::CONDITIONS_1_MARKER_INDEX)
                        == conditions::CONDITIONS_1_MARKER
            }
            Self::Conditions1B => {
                packet.type_id() == conditions::FRAME_ID_CONDITIONS_1
                    && packet.byte(conditions::CONDITIONS_1_MARKER_INDEX)
                        != conditions::CONDITIONS_1_MARKER
            }
            Self::Conditions2 => {
                packet.type_id() == conditions::FRAME_ID_CONDITIONS_2 && packet.is_long()
            }
            Self::Conditions2B => {
                packet.type_id() == conditions::FRAME_ID_CONDITIONS_2 && packet.is_short()
            }
            Self::Unknown(signature) => packet.type_id() == signature,
        }
    }

    /// Fixed-width name used in frame log lines.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ConfMode => "CONFIG_1  ",
            Self::ConfFanDefrost => "CONFIG_2  ",
            Self::ConfSetpointLimits => "CONFIG_3  ",
            Self::ConfReserved4 => "CONFIG_4  ",
            Self::ConfFlowMeter => "CONFIG_5  ",
            Self::ConfReserved6 => "CONFIG_6  ",
            Self::Clock => "CLOCK     ",
            Self::Conditions1 => "COND_1    ",
            Self::Conditions1B => "COND_1B   ",
            Self::Conditions2 => "COND_2    ",
            Self::Conditions2B => "COND_2B   ",
            Self::Unknown(_) => "UNKNOWN   ",
        }
    }

    fn parse(self, packet: &Packet, state: &mut HeatPumpState) {
        match self {
            Self::ConfMode => conf_mode::parse(packet, state),
            Self::ConfFanDefrost => conf_fan_defrost::parse(packet, state),
            Self::ConfSetpointLimits => conf_limits::parse(packet, state),
            Self::ConfFlowMeter => conf_flow::parse(packet, state),
            Self::Clock => clock::parse(packet, state),
            Self::Conditions1 => conditions::parse_conditions_1(packet, state),
            Self::Conditions1B => conditions::parse_conditions_1b(packet, state),
            Self::Conditions2 => conditions::parse_conditions_2(packet, state),
            // Reserved and unknown payloads are preserved verbatim; the
            // short 0xD2 has no identified fields either.
            Self::ConfReserved4 | Self::ConfReserved6 | Self::Conditions2B | Self::Unknown(_) => {}
        }
    }

    fn control(self, data: Option<&Packet>, call: &Call) -> ControlOutcome {
        match self {
            Self::ConfMode => conf_mode::control(data, call),
            Self::ConfFanDefrost => conf_fan_defrost::control(data, call),
            Self::ConfFlowMeter => conf_flow::control(data, call),
            _ => ControlOutcome::Untouched,
        }
    }

    fn write_fields(
        self,
        cur: &Packet,
        prev: &Packet,
        out: &mut impl fmt::Write,
    ) -> fmt::Result {
        match self {
            Self::ConfMode => conf_mode::write_fields(cur, prev, out),
            Self::ConfFanDefrost => conf_fan_defrost::write_fields(cur, prev, out),
            Self::ConfSetpointLimits => conf_limits::write_fields(cur, prev, out),
            Self::ConfFlowMeter => conf_flow::write_fields(cur, prev, out),
            Self::Clock => clock::write_fields(cur, prev, out),
            Self::Conditions1 => conditions::write_fields_conditions_1(cur, prev, out),
            Self::Conditions1B => conditions::write_fields_conditions_1b(cur, prev, out),
            Self::Conditions2 => conditions::write_fields_conditions_2(cur, prev, out),
            Self::ConfReserved4 | Self::ConfReserved6 | Self::Conditions2B | Self::Unknown(_) => {
                write_raw_fields(cur, prev, out)
            }
        }
    }
}

/// Raw byte dump with changed bytes marked, for kinds without a decoder.
fn write_raw_fields(cur: &Packet, prev: &Packet, out: &mut impl fmt::Write) -> fmt::Result {
    out.write_str("[ ")?;
    for index in 1..cur.len().saturating_sub(1) {
        let marker = if cur.byte(index) == prev.byte(index) { ' ' } else { '*' };
        write!(out, "{:02X}{marker}", cur.byte(index))?;
    }
    out.write_str("]")
}

/// What a specialized frame did with a control request.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ControlOutcome {
    /// The call touches none of this frame's fields.
    Untouched,
    /// The requested values equal the last observed payload.
    NoChange,
    /// The call touches this frame but no payload has been observed yet.
    AwaitingData,
    /// A new outbound packet, checksum finalized.
    Send(Packet),
}

/// One registry slot: the kind plus its last and previous payloads.
///
/// The slot is created at registration and lives for the life of the bus;
/// `data` turns `Some` on the first matching frame and from then on `prev`
/// trails it by exactly one frame.
#[derive(Copy, Clone, Debug)]
pub struct Entry {
    /// Which frame kind this slot holds.
    pub kind: FrameKind,
    /// Last accepted packet.
    pub data: Option<Packet>,
    /// The packet before that.
    pub prev: Option<Packet>,
    /// Who sent the last accepted packet.
    pub source: Source,
    /// When the last packet was accepted, in milliseconds.
    pub frame_time_ms: u64,
}

impl Entry {
    const fn new(kind: FrameKind) -> Self {
        Self {
            kind,
            data: None,
            prev: None,
            source: Source::Unknown,
            frame_time_ms: 0,
        }
    }

    /// The last payload differs from the previous one (or there is no
    /// previous one yet).
    #[must_use]
    pub fn is_changed(&self) -> bool {
        match (&self.data, &self.prev) {
            (Some(data), Some(prev)) => data != prev,
            _ => true,
        }
    }

    /// Renders the field-by-field view of the last payload, marking
    /// differences against the previous one unless `no_diff` is set.
    pub fn write_format(&self, no_diff: bool, out: &mut impl fmt::Write) -> fmt::Result {
        let Some(data) = &self.data else {
            return out.write_str("N/A");
        };
        let reference = if no_diff { data } else { self.prev.as_ref().unwrap_or(data) };
        self.kind.write_fields(data, reference, out)
    }

    /// Renders the previous payload, or `N/A` before two frames were seen.
    pub fn write_format_prev(&self, out: &mut impl fmt::Write) -> fmt::Result {
        let Some(prev) = &self.prev else {
            return out.write_str("N/A");
        };
        self.kind.write_fields(prev, prev, out)
    }

    /// Renders the uniform log line: prefix, hex header, name, source and
    /// age.
    pub fn write_line(&self, prefix: &str, now_ms: u64, out: &mut impl fmt::Write) -> fmt::Result {
        write!(out, "{prefix:<5}")?;
        if let Some(data) = &self.data {
            data.write_header(self.prev.as_ref(), out)?;
        }
        let age = now_ms.saturating_sub(self.frame_time_ms);
        if let FrameKind::Unknown(signature) = self.kind {
            write!(out, " TYPE_{signature:02X}   ")?;
        } else {
            write!(out, " {}", self.kind.name())?;
        }
        write!(out, "({}) ({}.{}s) ", self.source.tag(), age / 1000, (age % 1000) / 100)?;
        self.write_format(false, out)
    }
}

/// Result of walking the registry with a control request.
#[derive(Clone, Debug, Default)]
pub struct ControlResult {
    /// Outbound packets produced by the specialized frames, in registry
    /// order.
    pub packets: Vec<Packet, TX_QUEUE_LEN>,
    /// At least one touched frame had no observed payload to start from.
    pub awaiting_data: bool,
}

/// Summary of one accepted frame.
#[derive(Copy, Clone, Debug)]
pub struct Accepted {
    /// The kind that matched.
    pub kind: FrameKind,
    /// The payload differs from the slot's previous one.
    pub changed: bool,
    /// This was the first frame of its kind.
    pub first: bool,
}

/// The ordered frame catalog with per-kind state.
pub struct Registry {
    known: [Entry; FrameKind::KNOWN.len()],
    unknown: Vec<Entry, MAX_UNKNOWN_KINDS>,
}

impl Registry {
    /// A registry with every specialized kind registered and nothing
    /// observed.
    #[must_use]
    pub const fn new() -> Self {
        let mut known = [Entry::new(FrameKind::ConfMode); FrameKind::KNOWN.len()];
        let mut index = 0;
        while index < FrameKind::KNOWN.len() {
            known[index] = Entry::new(FrameKind::KNOWN[index]);
            index += 1;
        }
        Self {
            known,
            unknown: Vec::new(),
        }
    }

    /// All entries in registration order, specialized kinds first.
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.known.iter().chain(self.unknown.iter())
    }

    /// The entry holding the given kind, if registered.
    #[must_use]
    pub fn entry(&self, kind: FrameKind) -> Option<&Entry> {
        self.entries().find(|entry| entry.kind == kind)
    }

    fn find_or_register(&mut self, packet: &Packet) -> Option<&mut Entry> {
        let position = self
            .known
            .iter()
            .position(|entry| entry.kind.matches(packet));
        if let Some(position) = position {
            return Some(&mut self.known[position]);
        }
        let position = self
            .unknown
            .iter()
            .position(|entry| entry.kind.matches(packet));
        if let Some(position) = position {
            return Some(&mut self.unknown[position]);
        }
        let entry = Entry::new(FrameKind::Unknown(packet.type_id()));
        if self.unknown.push(entry).is_err() {
            return None;
        }
        self.unknown.last_mut()
    }

    /// Folds one finalized frame into the catalog and the canonical state.
    ///
    /// The matched slot's previous payload is retained for diffing, the
    /// specialized parser runs against `state`, and the heater/controller
    /// last-seen timestamps are stamped from the frame source.
    pub fn accept(&mut self, frame: &DecodedFrame, state: &mut HeatPumpState) -> Accepted {
        match frame.source {
            Source::Heater => state.last_heater_frame = Some(frame.frame_time_ms),
            Source::Controller => state.last_controller_frame = Some(frame.frame_time_ms),
            Source::Unknown | Source::Local => {}
        }

        let Some(entry) = self.find_or_register(&frame.packet) else {
            // Unknown table full; the frame still counted for liveness.
            return Accepted {
                kind: FrameKind::Unknown(frame.packet.type_id()),
                changed: false,
                first: false,
            };
        };
        let kind = entry.kind;
        let previous = entry.data;
        let first = previous.is_none();
        let changed = previous.map_or(true, |prev| prev != frame.packet);

        kind.parse(&frame.packet, state);

        entry.prev = previous;
        entry.data = Some(frame.packet);
        entry.source = frame.source;
        entry.frame_time_ms = frame.frame_time_ms;

        Accepted { kind, changed, first }
    }

    /// Walks the catalog in order, letting every specialized frame turn the
    /// request into an outbound packet.
    #[must_use]
    pub fn control(&self, call: &Call) -> ControlResult {
        let mut result = ControlResult::default();
        for entry in self.entries() {
            match entry.kind.control(entry.data.as_ref(), call) {
                ControlOutcome::Send(packet) => {
                    let _ = result.packets.push(packet);
                }
                ControlOutcome::AwaitingData => result.awaiting_data = true,
                ControlOutcome::Untouched | ControlOutcome::NoChange => {}
            }
        }
        result
    }

    /// Aggregates the capability set from the observed configuration
    /// frames.
    pub fn collect_traits(&self, traits: &mut Traits) {
        for entry in self.entries() {
            match entry.kind {
                FrameKind::ConfMode => conf_mode::collect_traits(entry.data.as_ref(), traits),
                FrameKind::ConfFanDefrost => conf_fan_defrost::collect_traits(traits),
                _ => {}
            }
        }
    }

    /// Renders the observed packets as Rust array initializers, one per
    /// line, for replaying captures in tests and simulators.
    pub fn write_code(&self, out: &mut impl fmt::Write) -> fmt::Result {
        for entry in self.entries() {
            let Some(data) = &entry.data else { continue };
            write!(out, "const FRAME_{:02X}: [u8; {}] = [", data.type_id(), data.len())?;
            for (index, byte) in data.bytes().iter().enumerate() {
                if index > 0 {
                    out.write_str(", ")?;
                }
                write!(out, "0x{byte:02X}")?;
            }
            out.write_str("];\n")?;
        }
        Ok(())
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
