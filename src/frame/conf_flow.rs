//! 0x85 — flow meter and economy defrost configuration.

use core::fmt;

use crate::call::Call;
use crate::codec::{DecimalNumber, DefrostEcoMode, FlowMeter, LargeInteger};
use crate::packet::Packet;
use crate::state::HeatPumpState;

use super::ControlOutcome;

/// Frame type id.
pub const FRAME_ID: u8 = 0x85;

const FLAGS: usize = 2;
const D05_MIN_ECO_TIME: usize = 3;
const U02_HIGH: usize = 9;
const U02_LOW: usize = 10;

const FLAG_U01_FLOW_METER: u8 = 1 << 2;
const FLAG_D06_ECO_DEFROST: u8 = 1 << 6;

fn flow_meter(packet: &Packet) -> FlowMeter {
    if packet.byte(FLAGS) & FLAG_U01_FLOW_METER != 0 {
        FlowMeter::Enabled
    } else {
        FlowMeter::Disabled
    }
}

fn eco_mode(packet: &Packet) -> DefrostEcoMode {
    if packet.byte(FLAGS) & FLAG_D06_ECO_DEFROST != 0 {
        DefrostEcoMode::Eco
    } else {
        DefrostEcoMode::Normal
    }
}

pub(crate) fn parse(packet: &Packet, state: &mut HeatPumpState) {
    state.u01_flow_meter = Some(flow_meter(packet));
    state.d06_defrost_eco_mode = Some(eco_mode(packet));
    state.d05_min_economy_defrost_time_minutes =
        Some(DecimalNumber(packet.byte(D05_MIN_ECO_TIME)).decode());
    state.u02_pulses_per_liter =
        Some(LargeInteger::from_wire(packet.byte(U02_HIGH), packet.byte(U02_LOW)).decode());
}

pub(crate) fn control(data: Option<&Packet>, call: &Call) -> ControlOutcome {
    let touched = call.u01_flow_meter.is_some()
        || call.d06_defrost_eco_mode.is_some()
        || call.d05_min_economy_defrost_time_minutes.is_some()
        || call.u02_pulses_per_liter.is_some();
    if !touched {
        return ControlOutcome::Untouched;
    }
    let Some(data) = data else {
        return ControlOutcome::AwaitingData;
    };

    let mut command = *data;
    if let Some(flow_meter) = call.u01_flow_meter {
        let mut flags = command.byte(FLAGS) & !FLAG_U01_FLOW_METER;
        if flow_meter == FlowMeter::Enabled {
            flags |= FLAG_U01_FLOW_METER;
        }
        command.set_byte(FLAGS, flags);
    }
    if let Some(eco) = call.d06_defrost_eco_mode {
        let mut flags = command.byte(FLAGS) & !FLAG_D06_ECO_DEFROST;
        if eco == DefrostEcoMode::Eco {
            flags |= FLAG_D06_ECO_DEFROST;
        }
        command.set_byte(FLAGS, flags);
    }
    if let Some(minutes) = call.d05_min_economy_defrost_time_minutes {
        command.set_byte(D05_MIN_ECO_TIME, DecimalNumber::encode(minutes).0);
    }
    if let Some(pulses) = call.u02_pulses_per_liter {
        let [high, low] = LargeInteger(pulses).to_wire();
        command.set_byte(U02_HIGH, high);
        command.set_byte(U02_LOW, low);
    }

    if command == *data {
        return ControlOutcome::NoChange;
    }
    command.set_checksum();
    ControlOutcome::Send(command)
}

pub(crate) fn write_fields(
    cur: &Packet,
    prev: &Packet,
    out: &mut impl fmt::Write,
) -> fmt::Result {
    let flags_marker = if cur.byte(FLAGS) == prev.byte(FLAGS) { "" } else { "*" };
    write!(
        out,
        "U01:{}{flags_marker} d06:{}{flags_marker} d05:",
        if flow_meter(cur) == FlowMeter::Enabled { "ENBL" } else { "DIS " },
        if eco_mode(cur) == DefrostEcoMode::Eco { "ECO " } else { "NORM" },
    )?;
    DecimalNumber(cur.byte(D05_MIN_ECO_TIME))
        .write_diff(DecimalNumber(prev.byte(D05_MIN_ECO_TIME)), out)?;
    let u02 = LargeInteger::from_wire(cur.byte(U02_HIGH), cur.byte(U02_LOW));
    let prev_u02 = LargeInteger::from_wire(prev.byte(U02_HIGH), prev.byte(U02_LOW));
    let marker = if u02 == prev_u02 { "" } else { "*" };
    write!(out, "min U02:{}p/L{marker}", u02.decode())
}
