//! Canonical heat-pump state shared with downstream consumers.

use heapless::Vec;

use crate::codec::{
    ClimateAction, ClimateMode, DefrostEcoMode, FanMode, FlowMeter, ModeRestrict,
};

/// Default lower target bound when the limits frame has not been seen yet.
pub const DEFAULT_MIN_TARGET: f32 = 15.0;
/// Default upper target bound when the limits frame has not been seen yet.
pub const DEFAULT_MAX_TARGET: f32 = 33.0;

/// The heat pump's notion of time, surfaced verbatim from the 0xCF frame.
///
/// The year/month/day bytes count powered-on elapsed units, not calendar
/// dates; they reset when the pump loses power. Do not turn this into a
/// wall-clock timestamp.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PowerOnClock {
    /// Elapsed "years" counter.
    pub year: u8,
    /// Elapsed "months" counter.
    pub month: u8,
    /// Elapsed "days" counter.
    pub day: u8,
    /// Hour, 0-23.
    pub hour: u8,
    /// Minute, 0-59.
    pub minute: u8,
}

/// Everything decoded from the bus so far.
///
/// Absent means never observed. The RX worker is the only writer; consumers
/// take whole-struct snapshots through the orchestrator.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct HeatPumpState {
    /// Suction temperature (t01). Its byte position is still undetermined,
    /// so nothing writes it yet.
    pub t01_temperature_suction: Option<f32>,
    /// Inlet water temperature (t02).
    pub t02_temperature_inlet: Option<f32>,
    /// Outlet water temperature (t03).
    pub t03_temperature_outlet: Option<f32>,
    /// Coil temperature (t04).
    pub t04_temperature_coil: Option<f32>,
    /// Ambient air temperature (t05).
    pub t05_temperature_ambient: Option<f32>,
    /// Compressor exhaust temperature (t06).
    pub t06_temperature_exhaust: Option<f32>,

    /// Cooling setpoint (r01).
    pub r01_setpoint_cooling: Option<f32>,
    /// Heating setpoint (r02).
    pub r02_setpoint_heating: Option<f32>,
    /// Auto-mode setpoint (r03).
    pub r03_setpoint_auto: Option<f32>,
    /// Return differential while cooling (r04).
    pub r04_return_diff_cooling: Option<f32>,
    /// Shutdown differential while cooling (r05).
    pub r05_shutdown_temp_diff_when_cooling: Option<f32>,
    /// Return differential while heating (r06).
    pub r06_return_diff_heating: Option<f32>,
    /// Shutdown differential while heating (r07).
    pub r07_shutdown_diff_heating: Option<f32>,
    /// Minimum cooling setpoint (r08).
    pub r08_min_cool_setpoint: Option<f32>,
    /// Maximum cooling setpoint (r09).
    pub r09_max_cooling_setpoint: Option<f32>,
    /// Minimum heating setpoint (r10).
    pub r10_min_heating_setpoint: Option<f32>,
    /// Maximum heating setpoint (r11).
    pub r11_max_heating_setpoint: Option<f32>,

    /// Defrost start threshold (d01).
    pub d01_defrost_start: Option<f32>,
    /// Defrost end threshold (d02).
    pub d02_defrost_end: Option<f32>,
    /// Delay between defrost cycles in minutes (d03).
    pub d03_defrosting_cycle_time_minutes: Option<f32>,
    /// Maximum duration of one defrost cycle in minutes (d04).
    pub d04_max_defrost_time_minutes: Option<f32>,
    /// Minimum economy defrost time in minutes (d05).
    pub d05_min_economy_defrost_time_minutes: Option<f32>,
    /// Defrost economy mode (d06).
    pub d06_defrost_eco_mode: Option<DefrostEcoMode>,

    /// Flow meter installed and enabled (U01).
    pub u01_flow_meter: Option<FlowMeter>,
    /// Flow meter pulses per liter (U02).
    pub u02_pulses_per_liter: Option<u16>,
    /// Water currently flowing (S02).
    pub s02_water_flow: Option<bool>,

    /// Requested climate mode.
    pub mode: Option<ClimateMode>,
    /// Current climate action.
    pub action: Option<ClimateAction>,
    /// Fan mode.
    pub fan_mode: Option<FanMode>,
    /// Installer mode restriction (H02).
    pub mode_restrictions: Option<ModeRestrict>,

    /// Target temperature for the active mode.
    pub target_temperature: Option<f32>,
    /// Lower bound of the target window for the active mode.
    pub min_target_temperature: Option<f32>,
    /// Upper bound of the target window for the active mode.
    pub max_target_temperature: Option<f32>,

    /// Power-on clock, surfaced verbatim.
    pub clock: Option<PowerOnClock>,

    /// Timestamp of the last heater-originated frame, in milliseconds.
    pub last_heater_frame: Option<u64>,
    /// Timestamp of the last controller-originated frame, in milliseconds.
    pub last_controller_frame: Option<u64>,
}

impl HeatPumpState {
    /// An empty state with nothing observed.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            t01_temperature_suction: None,
            t02_temperature_inlet: None,
            t03_temperature_outlet: None,
            t04_temperature_coil: None,
            t05_temperature_ambient: None,
            t06_temperature_exhaust: None,
            r01_setpoint_cooling: None,
            r02_setpoint_heating: None,
            r03_setpoint_auto: None,
            r04_return_diff_cooling: None,
            r05_shutdown_temp_diff_when_cooling: None,
            r06_return_diff_heating: None,
            r07_shutdown_diff_heating: None,
            r08_min_cool_setpoint: None,
            r09_max_cooling_setpoint: None,
            r10_min_heating_setpoint: None,
            r11_max_heating_setpoint: None,
            d01_defrost_start: None,
            d02_defrost_end: None,
            d03_defrosting_cycle_time_minutes: None,
            d04_max_defrost_time_minutes: None,
            d05_min_economy_defrost_time_minutes: None,
            d06_defrost_eco_mode: None,
            u01_flow_meter: None,
            u02_pulses_per_liter: None,
            s02_water_flow: None,
            mode: None,
            action: None,
            fan_mode: None,
            mode_restrictions: None,
            target_temperature: None,
            min_target_temperature: None,
            max_target_temperature: None,
            clock: None,
            last_heater_frame: None,
            last_controller_frame: None,
        }
    }

    /// Lower target bound for the active mode, with the factory default
    /// when the limits frame has not been observed.
    #[must_use]
    pub fn min_target(&self) -> f32 {
        self.min_target_temperature.unwrap_or(DEFAULT_MIN_TARGET)
    }

    /// Upper target bound for the active mode.
    #[must_use]
    pub fn max_target(&self) -> f32 {
        self.max_target_temperature.unwrap_or(DEFAULT_MAX_TARGET)
    }

    /// True when `celsius` lies inside the current target window.
    #[must_use]
    pub fn is_temperature_valid(&self, celsius: f32) -> bool {
        celsius >= self.min_target() && celsius <= self.max_target()
    }
}

/// Capability set advertised to downstream consumers, aggregated from the
/// observed configuration frames.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Traits {
    /// Climate modes the installer restriction allows.
    pub modes: Vec<ClimateMode, 4>,
    /// Fan modes the keypad knows about.
    pub fan_modes: Vec<FanMode, 5>,
    /// The bus reports the inlet temperature continuously.
    pub supports_current_temperature: bool,
    /// The bus reports what the pump is doing, not just what was asked.
    pub supports_action: bool,
}

impl Traits {
    /// Adds a climate mode if it is not present yet.
    pub fn add_mode(&mut self, mode: ClimateMode) {
        if !self.modes.contains(&mode) {
            let _ = self.modes.push(mode);
        }
    }

    /// Adds a fan mode if it is not present yet.
    pub fn add_fan_mode(&mut self, fan_mode: FanMode) {
        if !self.fan_modes.contains(&fan_mode) {
            let _ = self.fan_modes.push(fan_mode);
        }
    }
}
