//! User-level change requests.

use crate::codec::{ClimateMode, DefrostEcoMode, FanMode, FlowMeter, ModeRestrict};
use crate::error::{Error, Result};
use crate::state::HeatPumpState;

/// A change request against the heat pump.
///
/// Every field is optional; the specialized frames each pick out the fields
/// they own and ignore the rest. Build one with the fluent setters:
///
/// ```
/// use hayward_netbus::{Call, FanMode};
///
/// let call = Call::new().fan_mode(FanMode::Scheduled).target_temperature(28.0);
/// assert_eq!(call.fan_mode, Some(FanMode::Scheduled));
/// ```
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Call {
    /// Requested target temperature for the active mode.
    pub target_temperature: Option<f32>,
    /// Requested climate mode.
    pub mode: Option<ClimateMode>,
    /// Requested fan mode.
    pub fan_mode: Option<FanMode>,
    /// Requested installer mode restriction (H02).
    pub mode_restrictions: Option<ModeRestrict>,
    /// Defrost start threshold (d01).
    pub d01_defrost_start: Option<f32>,
    /// Defrost end threshold (d02).
    pub d02_defrost_end: Option<f32>,
    /// Defrost cycle time in minutes (d03).
    pub d03_defrosting_cycle_time_minutes: Option<f32>,
    /// Maximum defrost time in minutes (d04).
    pub d04_max_defrost_time_minutes: Option<f32>,
    /// Minimum economy defrost time in minutes (d05).
    pub d05_min_economy_defrost_time_minutes: Option<f32>,
    /// Defrost economy mode (d06).
    pub d06_defrost_eco_mode: Option<DefrostEcoMode>,
    /// Return differential while cooling (r04).
    pub r04_return_diff_cooling: Option<f32>,
    /// Shutdown differential while cooling (r05).
    pub r05_shutdown_temp_diff_when_cooling: Option<f32>,
    /// Return differential while heating (r06).
    pub r06_return_diff_heating: Option<f32>,
    /// Shutdown differential while heating (r07).
    pub r07_shutdown_diff_heating: Option<f32>,
    /// Flow meter enable (U01).
    pub u01_flow_meter: Option<FlowMeter>,
    /// Flow meter pulses per liter (U02).
    pub u02_pulses_per_liter: Option<u16>,
}

impl Call {
    /// An empty request.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            target_temperature: None,
            mode: None,
            fan_mode: None,
            mode_restrictions: None,
            d01_defrost_start: None,
            d02_defrost_end: None,
            d03_defrosting_cycle_time_minutes: None,
            d04_max_defrost_time_minutes: None,
            d05_min_economy_defrost_time_minutes: None,
            d06_defrost_eco_mode: None,
            r04_return_diff_cooling: None,
            r05_shutdown_temp_diff_when_cooling: None,
            r06_return_diff_heating: None,
            r07_shutdown_diff_heating: None,
            u01_flow_meter: None,
            u02_pulses_per_liter: None,
        }
    }

    /// Sets the target temperature.
    #[must_use]
    pub const fn target_temperature(mut self, celsius: f32) -> Self {
        self.target_temperature = Some(celsius);
        self
    }

    /// Sets the climate mode.
    #[must_use]
    pub const fn mode(mut self, mode: ClimateMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Sets the fan mode.
    #[must_use]
    pub const fn fan_mode(mut self, fan_mode: FanMode) -> Self {
        self.fan_mode = Some(fan_mode);
        self
    }

    /// Sets the installer mode restriction.
    #[must_use]
    pub const fn mode_restrictions(mut self, restriction: ModeRestrict) -> Self {
        self.mode_restrictions = Some(restriction);
        self
    }

    /// Sets the defrost start threshold.
    #[must_use]
    pub const fn d01_defrost_start(mut self, celsius: f32) -> Self {
        self.d01_defrost_start = Some(celsius);
        self
    }

    /// Sets the defrost end threshold.
    #[must_use]
    pub const fn d02_defrost_end(mut self, celsius: f32) -> Self {
        self.d02_defrost_end = Some(celsius);
        self
    }

    /// Sets the defrost cycle time.
    #[must_use]
    pub const fn d03_defrosting_cycle_time_minutes(mut self, minutes: f32) -> Self {
        self.d03_defrosting_cycle_time_minutes = Some(minutes);
        self
    }

    /// Sets the maximum defrost time.
    #[must_use]
    pub const fn d04_max_defrost_time_minutes(mut self, minutes: f32) -> Self {
        self.d04_max_defrost_time_minutes = Some(minutes);
        self
    }

    /// Sets the minimum economy defrost time.
    #[must_use]
    pub const fn d05_min_economy_defrost_time_minutes(mut self, minutes: f32) -> Self {
        self.d05_min_economy_defrost_time_minutes = Some(minutes);
        self
    }

    /// Sets the defrost economy mode.
    #[must_use]
    pub const fn d06_defrost_eco_mode(mut self, eco: DefrostEcoMode) -> Self {
        self.d06_defrost_eco_mode = Some(eco);
        self
    }

    /// Sets the cooling return differential.
    #[must_use]
    pub const fn r04_return_diff_cooling(mut self, celsius: f32) -> Self {
        self.r04_return_diff_cooling = Some(celsius);
        self
    }

    /// Sets the cooling shutdown differential.
    #[must_use]
    pub const fn r05_shutdown_temp_diff_when_cooling(mut self, celsius: f32) -> Self {
        self.r05_shutdown_temp_diff_when_cooling = Some(celsius);
        self
    }

    /// Sets the heating return differential.
    #[must_use]
    pub const fn r06_return_diff_heating(mut self, celsius: f32) -> Self {
        self.r06_return_diff_heating = Some(celsius);
        self
    }

    /// Sets the heating shutdown differential.
    #[must_use]
    pub const fn r07_shutdown_diff_heating(mut self, celsius: f32) -> Self {
        self.r07_shutdown_diff_heating = Some(celsius);
        self
    }

    /// Sets the flow meter enable.
    #[must_use]
    pub const fn u01_flow_meter(mut self, flow_meter: FlowMeter) -> Self {
        self.u01_flow_meter = Some(flow_meter);
        self
    }

    /// Sets the flow meter pulses per liter.
    #[must_use]
    pub const fn u02_pulses_per_liter(mut self, pulses: u16) -> Self {
        self.u02_pulses_per_liter = Some(pulses);
        self
    }

    /// Rejects a requested target temperature outside the window the heat
    /// pump currently advertises.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TargetTemperatureOutOfRange`] with the offending
    /// value and the active window.
    pub fn validate(&self, state: &HeatPumpState) -> Result<()> {
        if let Some(celsius) = self.target_temperature {
            if !state.is_temperature_valid(celsius) {
                return Err(Error::TargetTemperatureOutOfRange {
                    celsius,
                    min: state.min_target(),
                    max: state.max_target(),
                });
            }
        }
        Ok(())
    }
}
