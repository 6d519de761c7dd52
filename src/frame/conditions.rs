//! 0xD1/0xD2 — live operating conditions reported by the heater.
//!
//! 0xD1 comes in two flavors told apart by the byte after the subtype:
//! 0x05 marks the plain inlet-temperature report, anything else the variant
//! that also carries the water-flow flag. 0xD2 exists as a 12-byte frame
//! with three temperatures and a 9-byte companion whose fields are still
//! unidentified.

use core::fmt;

use crate::codec::Temperature;
use crate::packet::Packet;
use crate::state::HeatPumpState;

/// Type id shared by both 0xD1 flavors.
pub const FRAME_ID_CONDITIONS_1: u8 = 0xD1;
/// Type id shared by the long and short 0xD2 frames.
pub const FRAME_ID_CONDITIONS_2: u8 = 0xD2;

/// The byte that disambiguates the two 0xD1 flavors.
pub const CONDITIONS_1_MARKER_INDEX: usize = 2;
/// Marker value of the plain inlet-temperature flavor.
pub const CONDITIONS_1_MARKER: u8 = 0x05;

const T02_INLET: usize = 9;
const FLOW_FLAGS: usize = 4;
const FLAG_S02_WATER_FLOW: u8 = 1 << 1;

const T03_OUTLET: usize = 4;
const T06_EXHAUST: usize = 5;
const T04_COIL: usize = 6;
const T_FOURTH: usize = 8;

pub(crate) fn parse_conditions_1(packet: &Packet, state: &mut HeatPumpState) {
    state.t02_temperature_inlet = Some(Temperature(packet.byte(T02_INLET)).decode());
}

pub(crate) fn parse_conditions_1b(packet: &Packet, state: &mut HeatPumpState) {
    state.s02_water_flow = Some(packet.byte(FLOW_FLAGS) & FLAG_S02_WATER_FLOW != 0);
    state.t02_temperature_inlet = Some(Temperature(packet.byte(T02_INLET)).decode());
}

pub(crate) fn parse_conditions_2(packet: &Packet, state: &mut HeatPumpState) {
    state.t03_temperature_outlet = Some(Temperature(packet.byte(T03_OUTLET)).decode());
    state.t06_temperature_exhaust = Some(Temperature(packet.byte(T06_EXHAUST)).decode());
    state.t04_temperature_coil = Some(Temperature(packet.byte(T04_COIL)).decode());
}

pub(crate) fn write_fields_conditions_1(
    cur: &Packet,
    prev: &Packet,
    out: &mut impl fmt::Write,
) -> fmt::Result {
    out.write_str("t02:")?;
    Temperature(cur.byte(T02_INLET)).write_diff(Temperature(prev.byte(T02_INLET)), out)
}

pub(crate) fn write_fields_conditions_1b(
    cur: &Packet,
    prev: &Packet,
    out: &mut impl fmt::Write,
) -> fmt::Result {
    let flowing = cur.byte(FLOW_FLAGS) & FLAG_S02_WATER_FLOW != 0;
    let marker = if cur.byte(FLOW_FLAGS) == prev.byte(FLOW_FLAGS) { "" } else { "*" };
    write!(out, "S02:{}{marker} t02:", if flowing { "FLOW" } else { "DRY " })?;
    Temperature(cur.byte(T02_INLET)).write_diff(Temperature(prev.byte(T02_INLET)), out)
}

pub(crate) fn write_fields_conditions_2(
    cur: &Packet,
    prev: &Packet,
    out: &mut impl fmt::Write,
) -> fmt::Result {
    out.write_str("t03:")?;
    Temperature(cur.byte(T03_OUTLET)).write_diff(Temperature(prev.byte(T03_OUTLET)), out)?;
    out.write_str(" t06:")?;
    Temperature(cur.byte(T06_EXHAUST)).write_diff(Temperature(prev.byte(T06_EXHAUST)), out)?;
    out.write_str(" t04:")?;
    Temperature(cur.byte(T04_COIL)).write_diff(Temperature(prev.byte(T04_COIL)), out)?;
    out.write_str(" t?:")?;
    Temperature(cur.byte(T_FOURTH)).write_diff(Temperature(prev.byte(T_FOURTH)), out)
}
