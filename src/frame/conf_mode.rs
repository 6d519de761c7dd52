//! 0x81 — mode, setpoints and regulation differentials.
//!
//! This is the frame the keypad sends to change what the pump does, and the
//! one we clone when a user request touches the mode, the target
//! temperature, the restriction or one of the r04..r07 differentials.

use core::fmt;

use crate::call::Call;
use crate::codec::{ClimateMode, HpMode, ModeRestrict, Temperature, TemperatureExt};
use crate::packet::Packet;
use crate::state::{HeatPumpState, Traits};

use super::ControlOutcome;

/// Frame type id.
pub const FRAME_ID: u8 = 0x81;

const MODE: usize = 2;
const R01_SETPOINT_COOLING: usize = 3;
const R02_SETPOINT_HEATING: usize = 4;
const R03_SETPOINT_AUTO: usize = 5;
const R04_RETURN_DIFF_COOLING: usize = 6;
const R05_SHUTDOWN_DIFF_COOLING: usize = 7;
const R06_RETURN_DIFF_HEATING: usize = 8;
const R07_SHUTDOWN_DIFF_HEATING: usize = 9;
const RESERVED: usize = 10;

fn mode_byte(packet: &Packet) -> HpMode {
    HpMode(packet.byte(MODE))
}

/// The setpoint byte that drives regulation in the given mode. When the
/// pump is off the restriction decides which setpoint a new target lands
/// in, defaulting to heating.
const fn target_index(mode: HpMode) -> usize {
    match mode.climate_mode() {
        ClimateMode::Cool => R01_SETPOINT_COOLING,
        ClimateMode::Heat => R02_SETPOINT_HEATING,
        ClimateMode::Auto => R03_SETPOINT_AUTO,
        ClimateMode::Off => match mode.restriction() {
            ModeRestrict::Cooling => R01_SETPOINT_COOLING,
            _ => R02_SETPOINT_HEATING,
        },
    }
}

pub(crate) fn parse(packet: &Packet, state: &mut HeatPumpState) {
    let mode = mode_byte(packet);
    state.mode = Some(mode.climate_mode());
    state.mode_restrictions = Some(mode.restriction());
    state.r01_setpoint_cooling = Some(Temperature(packet.byte(R01_SETPOINT_COOLING)).decode());
    state.r02_setpoint_heating = Some(Temperature(packet.byte(R02_SETPOINT_HEATING)).decode());
    state.r03_setpoint_auto = Some(Temperature(packet.byte(R03_SETPOINT_AUTO)).decode());
    state.r04_return_diff_cooling =
        Some(TemperatureExt(packet.byte(R04_RETURN_DIFF_COOLING)).decode());
    state.r05_shutdown_temp_diff_when_cooling =
        Some(TemperatureExt(packet.byte(R05_SHUTDOWN_DIFF_COOLING)).decode());
    state.r06_return_diff_heating =
        Some(TemperatureExt(packet.byte(R06_RETURN_DIFF_HEATING)).decode());
    state.r07_shutdown_diff_heating =
        Some(TemperatureExt(packet.byte(R07_SHUTDOWN_DIFF_HEATING)).decode());
    state.target_temperature =
        Some(Temperature(packet.byte(target_index(mode))).decode());
}

pub(crate) fn control(data: Option<&Packet>, call: &Call) -> ControlOutcome {
    let touched = call.mode.is_some()
        || call.mode_restrictions.is_some()
        || call.target_temperature.is_some()
        || call.r04_return_diff_cooling.is_some()
        || call.r05_shutdown_temp_diff_when_cooling.is_some()
        || call.r06_return_diff_heating.is_some()
        || call.r07_shutdown_diff_heating.is_some();
    if !touched {
        return ControlOutcome::Untouched;
    }
    let Some(data) = data else {
        return ControlOutcome::AwaitingData;
    };

    let mut command = *data;
    let mut mode = mode_byte(&command);
    if let Some(requested) = call.mode {
        mode = mode.with_climate_mode(requested);
    }
    if let Some(restriction) = call.mode_restrictions {
        mode = mode.with_restriction(restriction);
    }
    command.set_byte(MODE, mode.0);

    if let Some(celsius) = call.target_temperature {
        command.set_byte(target_index(mode), Temperature::encode(celsius).0);
    }
    if let Some(value) = call.r04_return_diff_cooling {
        command.set_byte(R04_RETURN_DIFF_COOLING, TemperatureExt::encode(value).0);
    }
    if let Some(value) = call.r05_shutdown_temp_diff_when_cooling {
        command.set_byte(R05_SHUTDOWN_DIFF_COOLING, TemperatureExt::encode(value).0);
    }
    if let Some(value) = call.r06_return_diff_heating {
        command.set_byte(R06_RETURN_DIFF_HEATING, TemperatureExt::encode(value).0);
    }
    if let Some(value) = call.r07_shutdown_diff_heating {
        command.set_byte(R07_SHUTDOWN_DIFF_HEATING, TemperatureExt::encode(value).0);
    }

    if command == *data {
        return ControlOutcome::NoChange;
    }
    command.set_checksum();
    ControlOutcome::Send(command)
}

pub(crate) fn collect_traits(data: Option<&Packet>, traits: &mut Traits) {
    traits.add_mode(ClimateMode::Off);
    let Some(data) = data else {
        traits.add_mode(ClimateMode::Heat);
        traits.add_mode(ClimateMode::Cool);
        traits.add_mode(ClimateMode::Auto);
        return;
    };
    match mode_byte(data).restriction() {
        ModeRestrict::Any => {
            traits.add_mode(ClimateMode::Heat);
            traits.add_mode(ClimateMode::Cool);
            traits.add_mode(ClimateMode::Auto);
        }
        ModeRestrict::Heating => traits.add_mode(ClimateMode::Heat),
        ModeRestrict::Cooling => traits.add_mode(ClimateMode::Cool),
    }
}

pub(crate) fn write_fields(
    cur: &Packet,
    prev: &Packet,
    out: &mut impl fmt::Write,
) -> fmt::Result {
    let mode = mode_byte(cur);
    let prev_mode = mode_byte(prev);
    out.write_str("cool:")?;
    Temperature(cur.byte(R01_SETPOINT_COOLING))
        .write_diff(Temperature(prev.byte(R01_SETPOINT_COOLING)), out)?;
    out.write_str(" heat:")?;
    Temperature(cur.byte(R02_SETPOINT_HEATING))
        .write_diff(Temperature(prev.byte(R02_SETPOINT_HEATING)), out)?;
    out.write_str(" auto:")?;
    Temperature(cur.byte(R03_SETPOINT_AUTO))
        .write_diff(Temperature(prev.byte(R03_SETPOINT_AUTO)), out)?;
    out.write_str(" r04:")?;
    TemperatureExt(cur.byte(R04_RETURN_DIFF_COOLING))
        .write_diff(TemperatureExt(prev.byte(R04_RETURN_DIFF_COOLING)), out)?;
    out.write_str(" r05:")?;
    TemperatureExt(cur.byte(R05_SHUTDOWN_DIFF_COOLING))
        .write_diff(TemperatureExt(prev.byte(R05_SHUTDOWN_DIFF_COOLING)), out)?;
    out.write_str(" r06:")?;
    TemperatureExt(cur.byte(R06_RETURN_DIFF_HEATING))
        .write_diff(TemperatureExt(prev.byte(R06_RETURN_DIFF_HEATING)), out)?;
    out.write_str(" r07:")?;
    TemperatureExt(cur.byte(R07_SHUTDOWN_DIFF_HEATING))
        .write_diff(TemperatureExt(prev.byte(R07_SHUTDOWN_DIFF_HEATING)), out)?;
    let marker = if mode.0 == prev_mode.0 { "" } else { "*" };
    write!(
        out,
        " mode:({}/{}/{}){marker} [{:02X}]",
        if mode.power() { "ON " } else { "OFF" },
        mode.tag(),
        mode.restriction().tag(),
        cur.byte(RESERVED),
    )
}
