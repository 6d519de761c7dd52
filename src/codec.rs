//! On-wire field encodings.
//!
//! The bus packs every numeric field into single bytes with half-degree
//! resolution. Two distinct temperature encodings coexist and must not be
//! unified: the standard one carries separate offset and sign bits, the
//! extended one biases the integer part by -30. Keep both exactly as the
//! heat pump speaks them.

use core::fmt;

/// Standard single-byte temperature.
///
/// Bit 0 is the half-degree flag, bits 1..=5 the integer part, bit 6 adds a
/// +2 offset and bit 7 negates the whole value.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Temperature(pub u8);

impl Temperature {
    /// Decodes to degrees Celsius.
    #[must_use]
    pub fn decode(self) -> f32 {
        let raw = self.0;
        let mut value = f32::from((raw >> 1) & 0x1F);
        if raw & 0x40 != 0 {
            value += 2.0;
        }
        if raw & 0x01 != 0 {
            value += 0.5;
        }
        if raw & 0x80 != 0 { -value } else { value }
    }

    /// Encodes degrees Celsius into the raw byte.
    #[must_use]
    pub fn encode(celsius: f32) -> Self {
        let negative = celsius < 0.0;
        let mut magnitude = if negative { -celsius } else { celsius };
        let offset = magnitude >= 2.0;
        if offset {
            magnitude -= 2.0;
        }
        let whole = magnitude as u8;
        let half = magnitude - f32::from(whole) >= 0.5;
        let mut raw = (whole & 0x1F) << 1;
        if half {
            raw |= 0x01;
        }
        if offset {
            raw |= 0x40;
        }
        if negative {
            raw |= 0x80;
        }
        Self(raw)
    }

    pub(crate) fn write_diff(
        self,
        prev: Self,
        out: &mut impl fmt::Write,
    ) -> fmt::Result {
        let marker = if self == prev { "" } else { "*" };
        write!(out, "{:.1}C(0x{:02X}){marker}", self.decode(), self.0)
    }
}

/// Extended single-byte temperature used by the tuning parameters.
///
/// Bit 0 is the half-degree flag; bits 1..=7 hold the integer part biased
/// by +30 so the field reaches below zero.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TemperatureExt(pub u8);

impl TemperatureExt {
    /// Decodes to degrees Celsius.
    #[must_use]
    pub fn decode(self) -> f32 {
        let mut value = f32::from(self.0 >> 1) - 30.0;
        if self.0 & 0x01 != 0 {
            value += 0.5;
        }
        value
    }

    /// Encodes degrees Celsius into the raw byte.
    #[must_use]
    pub fn encode(celsius: f32) -> Self {
        let whole = celsius as i32;
        let frac = celsius - whole as f32;
        let half = if frac >= 0.5 || frac <= -0.5 { 1 } else { 0 };
        let biased = (celsius + 30.0) as u8;
        Self((biased << 1) | half)
    }

    pub(crate) fn write_diff(
        self,
        prev: Self,
        out: &mut impl fmt::Write,
    ) -> fmt::Result {
        let marker = if self == prev { "" } else { "*" };
        write!(out, "{:.1}C(0x{:02X}){marker}", self.decode(), self.0)
    }
}

/// Signed decimal number with half-unit resolution (cycle times and the
/// like). Bit 0 is the half flag, bits 1..=6 the integer, bit 7 the sign.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DecimalNumber(pub u8);

impl DecimalNumber {
    /// Decodes to the represented value.
    #[must_use]
    pub fn decode(self) -> f32 {
        let integer = f32::from((self.0 >> 1) & 0x3F);
        let signed = if self.0 & 0x80 != 0 { -integer } else { integer };
        if self.0 & 0x01 != 0 { signed + 0.5 } else { signed }
    }

    /// Encodes a value into the raw byte.
    #[must_use]
    pub fn encode(value: f32) -> Self {
        let negative = value < 0.0;
        let magnitude = if negative { -value } else { value };
        let whole = magnitude as u8;
        let half = magnitude - f32::from(whole) >= 0.5;
        let mut raw = (whole & 0x3F) << 1;
        if half {
            raw |= 0x01;
        }
        if negative {
            raw |= 0x80;
        }
        Self(raw)
    }

    pub(crate) fn write_diff(
        self,
        prev: Self,
        out: &mut impl fmt::Write,
    ) -> fmt::Result {
        let marker = if self == prev { "" } else { "*" };
        write!(out, "{:.1}(0x{:02X}){marker}", self.decode(), self.0)
    }
}

/// Two-byte integer carried byte-swapped on the wire (high byte first).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LargeInteger(pub u16);

impl LargeInteger {
    /// Reads the two wire bytes.
    #[must_use]
    pub const fn from_wire(high: u8, low: u8) -> Self {
        Self(u16::from_be_bytes([high, low]))
    }

    /// Produces the two wire bytes, high byte first.
    #[must_use]
    pub const fn to_wire(self) -> [u8; 2] {
        self.0.to_be_bytes()
    }

    /// The represented value.
    #[must_use]
    pub const fn decode(self) -> u16 {
        self.0
    }
}

/// Fan behavior selected on the keypad. Carried in the high nibble of the
/// fan byte of the 0x82 configuration frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FanMode {
    /// Fan at low speed.
    Low,
    /// Fan at high speed.
    High,
    /// Fan driven by ambient temperature.
    Ambient,
    /// Fan driven by the programmed schedule.
    Scheduled,
    /// Ambient and schedule combined.
    AmbientScheduled,
}

impl FanMode {
    /// Decodes the high nibble of the fan byte. Unknown nibbles fall back
    /// to low speed, matching the keypad's behavior.
    #[must_use]
    pub const fn from_nibble(nibble: u8) -> Self {
        match nibble {
            0x01 => Self::High,
            0x02 => Self::Ambient,
            0x03 => Self::Scheduled,
            0x04 => Self::AmbientScheduled,
            _ => Self::Low,
        }
    }

    /// The wire nibble.
    #[must_use]
    pub const fn to_nibble(self) -> u8 {
        match self {
            Self::Low => 0x00,
            Self::High => 0x01,
            Self::Ambient => 0x02,
            Self::Scheduled => 0x03,
            Self::AmbientScheduled => 0x04,
        }
    }

    /// Fixed-width tag for log lines.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Low => "LOW   ",
            Self::High => "HIGH  ",
            Self::Ambient => "AMBI  ",
            Self::Scheduled => "TIME  ",
            Self::AmbientScheduled => "AMBTME",
        }
    }
}

/// Which climate modes the installer allows (parameter H02).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ModeRestrict {
    /// Cooling only.
    Cooling,
    /// Heating, cooling and auto.
    Any,
    /// Heating only.
    Heating,
}

impl ModeRestrict {
    /// Fixed-width tag for log lines.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Cooling => "COOLING ONLY",
            Self::Any => "ANY MODE    ",
            Self::Heating => "HEATING ONLY",
        }
    }
}

/// Defrost economy setting (parameter d06).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DefrostEcoMode {
    /// Economy defrosting.
    Eco,
    /// Normal defrosting.
    Normal,
}

/// Whether a flow meter is installed and enabled (parameter U01).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FlowMeter {
    /// Flow meter enabled; U02 sets its pulses per liter.
    Enabled,
    /// No flow meter.
    Disabled,
}

/// Requested climate mode.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ClimateMode {
    /// Powered off.
    Off,
    /// Heating to the r02 setpoint.
    Heat,
    /// Cooling to the r01 setpoint.
    Cool,
    /// Automatic around the r03 setpoint.
    Auto,
}

/// What the heat pump is currently doing.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ClimateAction {
    /// Powered off.
    Off,
    /// Powered but satisfied.
    Idle,
    /// Actively heating.
    Heating,
    /// Actively cooling.
    Cooling,
}

/// The power/heat/auto mode byte of the 0x81 configuration frame.
///
/// Bit 0 powers the unit, bit 2 and bit 3 encode the H02 restriction, bit 4
/// selects heating and bit 5 automatic mode. Bits 1, 6 and 7 are preserved
/// but not understood.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct HpMode(pub u8);

impl HpMode {
    const POWER: u8 = 1 << 0;
    const ENABLE_AUTO: u8 = 1 << 2;
    const HEATING_ONLY: u8 = 1 << 3;
    const HEAT: u8 = 1 << 4;
    const AUTO: u8 = 1 << 5;

    /// True when the unit is powered.
    #[must_use]
    pub const fn power(self) -> bool {
        self.0 & Self::POWER != 0
    }

    /// The H02 restriction encoded by the enable-auto/heating-only pair.
    #[must_use]
    pub const fn restriction(self) -> ModeRestrict {
        if self.0 & Self::HEATING_ONLY != 0 {
            ModeRestrict::Heating
        } else if self.0 & Self::ENABLE_AUTO != 0 {
            ModeRestrict::Any
        } else {
            ModeRestrict::Cooling
        }
    }

    /// Rewrites the restriction bits.
    #[must_use]
    pub const fn with_restriction(self, restriction: ModeRestrict) -> Self {
        let mut raw = self.0 & !(Self::ENABLE_AUTO | Self::HEATING_ONLY);
        match restriction {
            ModeRestrict::Heating => raw |= Self::HEATING_ONLY,
            ModeRestrict::Any => raw |= Self::ENABLE_AUTO,
            ModeRestrict::Cooling => {}
        }
        Self(raw)
    }

    /// The climate mode selected by the power/heat/auto bits. Cooling is
    /// the powered default when neither heat nor auto is set.
    #[must_use]
    pub const fn climate_mode(self) -> ClimateMode {
        if self.0 & Self::POWER == 0 {
            ClimateMode::Off
        } else if self.0 & Self::AUTO != 0 {
            ClimateMode::Auto
        } else if self.0 & Self::HEAT != 0 {
            ClimateMode::Heat
        } else {
            ClimateMode::Cool
        }
    }

    /// Rewrites the power/heat/auto bits for the requested mode.
    #[must_use]
    pub const fn with_climate_mode(self, mode: ClimateMode) -> Self {
        let mut raw = self.0 & !(Self::POWER | Self::HEAT | Self::AUTO);
        match mode {
            ClimateMode::Auto => raw |= Self::POWER | Self::AUTO,
            ClimateMode::Heat => raw |= Self::POWER | Self::HEAT,
            ClimateMode::Cool => raw |= Self::POWER,
            ClimateMode::Off => {}
        }
        Self(raw)
    }

    /// Fixed-width tag for the selected mode.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self.climate_mode() {
            ClimateMode::Off => "OFF    ",
            ClimateMode::Heat => "HEATING",
            ClimateMode::Cool => "COOLING",
            ClimateMode::Auto => "AUTO   ",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temperature_decodes_known_bytes() {
        // Bytes observed on a live bus next to the keypad display.
        assert_eq!(Temperature(0x75).decode(), 28.5);
        assert_eq!(Temperature(0x52).decode(), 11.0);
        assert_eq!(Temperature(0x5F).decode(), 17.5);
        assert_eq!(Temperature(0x64).decode(), 20.0);
    }

    #[test]
    fn temperature_round_trips_with_half_degree() {
        // The encodable range tops out at 31 + 2 (offset) + 0.5.
        for tenths in (-335i32..=335).step_by(5) {
            let celsius = tenths as f32 / 10.0;
            assert_eq!(Temperature::encode(celsius).decode(), celsius, "at {celsius}");
        }
    }

    #[test]
    fn temperature_half_degree_bit() {
        let encoded = Temperature::encode(28.5);
        assert_eq!(encoded.0 & 0x01, 1);
        assert_eq!(encoded.decode(), 28.5);
        assert_eq!(Temperature::encode(28.0).decode(), 28.0);
    }

    #[test]
    fn extended_temperature_is_biased_by_thirty() {
        assert_eq!(TemperatureExt::encode(0.0).0, 30 << 1);
        assert_eq!(TemperatureExt::encode(-30.0).decode(), -30.0);
        assert_eq!(TemperatureExt::encode(2.5).decode(), 2.5);
        assert_eq!(TemperatureExt((31 << 1) | 1).decode(), 1.5);
    }

    #[test]
    fn decimal_number_sign_and_half() {
        assert_eq!(DecimalNumber::encode(45.0).decode(), 45.0);
        assert_eq!(DecimalNumber::encode(7.5).decode(), 7.5);
        assert_eq!(DecimalNumber::encode(-3.0).decode(), -3.0);
    }

    #[test]
    fn large_integer_is_byte_swapped() {
        let value = LargeInteger::from_wire(0x01, 0x2C);
        assert_eq!(value.decode(), 300);
        assert_eq!(value.to_wire(), [0x01, 0x2C]);
    }

    #[test]
    fn mode_byte_bits() {
        // Observed keypad frame: power on, heat, auto allowed.
        let mode = HpMode(0x17);
        assert!(mode.power());
        assert_eq!(mode.climate_mode(), ClimateMode::Heat);
        assert_eq!(mode.restriction(), ModeRestrict::Any);

        let off = mode.with_climate_mode(ClimateMode::Off);
        assert_eq!(off.climate_mode(), ClimateMode::Off);
        // Unknown bits ride along untouched.
        assert_eq!(off.0 & 0x02, 0x02);

        let heating_only = mode.with_restriction(ModeRestrict::Heating);
        assert_eq!(heating_only.restriction(), ModeRestrict::Heating);
    }

    #[test]
    fn fan_nibble_table() {
        assert_eq!(FanMode::from_nibble(0x00), FanMode::Low);
        assert_eq!(FanMode::from_nibble(0x03), FanMode::Scheduled);
        assert_eq!(FanMode::from_nibble(0x0F), FanMode::Low);
        assert_eq!(FanMode::AmbientScheduled.to_nibble(), 0x04);
    }
}
