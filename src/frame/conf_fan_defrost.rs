//! 0x82 — fan mode and defrost program.

use core::fmt;

use crate::call::Call;
use crate::codec::{DecimalNumber, FanMode, Temperature, TemperatureExt};
use crate::packet::Packet;
use crate::state::{HeatPumpState, Traits};

use super::ControlOutcome;

/// Frame type id.
pub const FRAME_ID: u8 = 0x82;

const FAN: usize = 2;
const D01_DEFROST_START: usize = 3;
const D02_DEFROST_END: usize = 4;
const D03_CYCLE_TIME: usize = 5;
const D04_MAX_TIME: usize = 6;
const RESERVED_FIRST: usize = 7;
const RESERVED_LAST: usize = 10;

fn fan_mode(packet: &Packet) -> FanMode {
    FanMode::from_nibble(packet.byte(FAN) >> 4)
}

pub(crate) fn parse(packet: &Packet, state: &mut HeatPumpState) {
    state.fan_mode = Some(fan_mode(packet));
    state.d01_defrost_start = Some(TemperatureExt(packet.byte(D01_DEFROST_START)).decode());
    state.d02_defrost_end = Some(Temperature(packet.byte(D02_DEFROST_END)).decode());
    state.d03_defrosting_cycle_time_minutes =
        Some(DecimalNumber(packet.byte(D03_CYCLE_TIME)).decode());
    state.d04_max_defrost_time_minutes = Some(DecimalNumber(packet.byte(D04_MAX_TIME)).decode());
}

pub(crate) fn control(data: Option<&Packet>, call: &Call) -> ControlOutcome {
    let touched = call.fan_mode.is_some()
        || call.d01_defrost_start.is_some()
        || call.d02_defrost_end.is_some()
        || call.d03_defrosting_cycle_time_minutes.is_some()
        || call.d04_max_defrost_time_minutes.is_some();
    if !touched {
        return ControlOutcome::Untouched;
    }
    let Some(data) = data else {
        return ControlOutcome::AwaitingData;
    };

    let mut command = *data;
    if let Some(fan) = call.fan_mode {
        let low_nibble = command.byte(FAN) & 0x0F;
        command.set_byte(FAN, (fan.to_nibble() << 4) | low_nibble);
    }
    if let Some(value) = call.d01_defrost_start {
        command.set_byte(D01_DEFROST_START, TemperatureExt::encode(value).0);
    }
    if let Some(value) = call.d02_defrost_end {
        command.set_byte(D02_DEFROST_END, Temperature::encode(value).0);
    }
    if let Some(value) = call.d03_defrosting_cycle_time_minutes {
        command.set_byte(D03_CYCLE_TIME, DecimalNumber::encode(value).0);
    }
    if let Some(value) = call.d04_max_defrost_time_minutes {
        command.set_byte(D04_MAX_TIME, DecimalNumber::encode(value).0);
    }

    if command == *data {
        return ControlOutcome::NoChange;
    }
    command.set_checksum();
    ControlOutcome::Send(command)
}

pub(crate) fn collect_traits(traits: &mut Traits) {
    traits.add_fan_mode(FanMode::Low);
    traits.add_fan_mode(FanMode::High);
    traits.add_fan_mode(FanMode::Ambient);
    traits.add_fan_mode(FanMode::Scheduled);
    traits.add_fan_mode(FanMode::AmbientScheduled);
}

pub(crate) fn write_fields(
    cur: &Packet,
    prev: &Packet,
    out: &mut impl fmt::Write,
) -> fmt::Result {
    let marker = if cur.byte(FAN) == prev.byte(FAN) { "" } else { "*" };
    write!(out, "fan:{}{marker} d01:", fan_mode(cur).tag())?;
    TemperatureExt(cur.byte(D01_DEFROST_START))
        .write_diff(TemperatureExt(prev.byte(D01_DEFROST_START)), out)?;
    out.write_str(" d02:")?;
    Temperature(cur.byte(D02_DEFROST_END))
        .write_diff(Temperature(prev.byte(D02_DEFROST_END)), out)?;
    out.write_str(" d03:")?;
    DecimalNumber(cur.byte(D03_CYCLE_TIME))
        .write_diff(DecimalNumber(prev.byte(D03_CYCLE_TIME)), out)?;
    out.write_str("min d04:")?;
    DecimalNumber(cur.byte(D04_MAX_TIME)).write_diff(DecimalNumber(prev.byte(D04_MAX_TIME)), out)?;
    out.write_str("min [")?;
    for index in RESERVED_FIRST..=RESERVED_LAST {
        let marker = if cur.byte(index) == prev.byte(index) { ' ' } else { '*' };
        write!(out, "{:02X}{marker}", cur.byte(index))?;
    }
    out.write_str("]")
}
