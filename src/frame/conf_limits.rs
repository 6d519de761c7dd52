//! 0x83 — setpoint limits per mode.

use core::fmt;

use crate::codec::{ClimateMode, TemperatureExt};
use crate::packet::Packet;
use crate::state::HeatPumpState;

/// Frame type id.
pub const FRAME_ID: u8 = 0x83;

const R08_MIN_COOL: usize = 7;
const R09_MAX_COOL: usize = 8;
const R10_MIN_HEAT: usize = 9;
const R11_MAX_HEAT: usize = 10;

pub(crate) fn parse(packet: &Packet, state: &mut HeatPumpState) {
    let min_cool = TemperatureExt(packet.byte(R08_MIN_COOL)).decode();
    let max_cool = TemperatureExt(packet.byte(R09_MAX_COOL)).decode();
    let min_heat = TemperatureExt(packet.byte(R10_MIN_HEAT)).decode();
    let max_heat = TemperatureExt(packet.byte(R11_MAX_HEAT)).decode();
    state.r08_min_cool_setpoint = Some(min_cool);
    state.r09_max_cooling_setpoint = Some(max_cool);
    state.r10_min_heating_setpoint = Some(min_heat);
    state.r11_max_heating_setpoint = Some(max_heat);

    // The window the keypad enforces depends on the mode the pump is in;
    // without a mode yet (or powered off) allow the widest span.
    let (min, max) = match state.mode {
        Some(ClimateMode::Heat) => (min_heat, max_heat),
        Some(ClimateMode::Cool) => (min_cool, max_cool),
        _ => (min_cool, max_heat),
    };
    state.min_target_temperature = Some(min);
    state.max_target_temperature = Some(max);
}

pub(crate) fn write_fields(
    cur: &Packet,
    prev: &Packet,
    out: &mut impl fmt::Write,
) -> fmt::Result {
    out.write_str("r08:")?;
    TemperatureExt(cur.byte(R08_MIN_COOL)).write_diff(TemperatureExt(prev.byte(R08_MIN_COOL)), out)?;
    out.write_str(" r09:")?;
    TemperatureExt(cur.byte(R09_MAX_COOL)).write_diff(TemperatureExt(prev.byte(R09_MAX_COOL)), out)?;
    out.write_str(" r10:")?;
    TemperatureExt(cur.byte(R10_MIN_HEAT)).write_diff(TemperatureExt(prev.byte(R10_MIN_HEAT)), out)?;
    out.write_str(" r11:")?;
    TemperatureExt(cur.byte(R11_MAX_HEAT)).write_diff(TemperatureExt(prev.byte(R11_MAX_HEAT)), out)
}
