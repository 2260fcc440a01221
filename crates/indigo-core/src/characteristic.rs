// ── Characteristic model ──
//
// The accessory-protocol side of the bridge: characteristic identifiers,
// their value type and the enumerated states the protocol defines for
// locks, doors, window coverings and thermostats.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::CoreError;
use crate::state::format_number;

/// A characteristic the bridge can expose on an accessory.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum Characteristic {
    On,
    Brightness,
    ColorTemperature,
    Hue,
    Saturation,
    RotationSpeed,
    CurrentPosition,
    TargetPosition,
    PositionState,
    LockCurrentState,
    LockTargetState,
    CurrentDoorState,
    TargetDoorState,
    ObstructionDetected,
    CurrentHeatingCoolingState,
    TargetHeatingCoolingState,
    CurrentTemperature,
    TargetTemperature,
    TemperatureDisplayUnits,
    CoolingThresholdTemperature,
    HeatingThresholdTemperature,
    CurrentRelativeHumidity,
    CurrentAmbientLightLevel,
    MotionDetected,
}

impl Characteristic {
    /// Whether the host may write this characteristic.
    pub fn is_writable(self) -> bool {
        matches!(
            self,
            Self::On
                | Self::Brightness
                | Self::ColorTemperature
                | Self::Hue
                | Self::Saturation
                | Self::RotationSpeed
                | Self::TargetPosition
                | Self::LockTargetState
                | Self::TargetDoorState
                | Self::TargetHeatingCoolingState
                | Self::TargetTemperature
                | Self::TemperatureDisplayUnits
                | Self::CoolingThresholdTemperature
                | Self::HeatingThresholdTemperature
        )
    }

    /// Inclusive valid range for numeric characteristics.
    pub fn range(self) -> Option<(f64, f64)> {
        match self {
            Self::Brightness
            | Self::Saturation
            | Self::RotationSpeed
            | Self::CurrentPosition
            | Self::TargetPosition
            | Self::CurrentRelativeHumidity => Some((0.0, 100.0)),
            Self::Hue => Some((0.0, 360.0)),
            Self::ColorTemperature => Some((153.0, 500.0)),
            Self::TargetTemperature => Some((10.0, 38.0)),
            Self::CoolingThresholdTemperature => Some((10.0, 35.0)),
            Self::HeatingThresholdTemperature => Some((0.0, 25.0)),
            Self::CurrentTemperature => Some((-270.0, 100.0)),
            Self::CurrentAmbientLightLevel => Some((0.0001, 100_000.0)),
            Self::LockCurrentState => Some((0.0, 3.0)),
            Self::CurrentDoorState => Some((0.0, 4.0)),
            Self::PositionState | Self::CurrentHeatingCoolingState => Some((0.0, 2.0)),
            Self::TargetHeatingCoolingState => Some((0.0, 3.0)),
            Self::LockTargetState | Self::TargetDoorState | Self::TemperatureDisplayUnits => {
                Some((0.0, 1.0))
            }
            Self::On | Self::ObstructionDetected | Self::MotionDetected => None,
        }
    }

    /// Whether the value is boolean-typed.
    pub fn is_bool(self) -> bool {
        matches!(self, Self::On | Self::ObstructionDetected | Self::MotionDetected)
    }

    /// Check a host-supplied value against type and range.
    pub fn validate(self, value: CharValue) -> Result<(), CoreError> {
        if self.is_bool() {
            return match value {
                CharValue::Bool(_) => Ok(()),
                CharValue::Number(n) if n == 0.0 || n == 1.0 => Ok(()),
                CharValue::Number(n) => Err(CoreError::InvalidValue {
                    capability: self.to_string(),
                    reason: format!("expected a boolean, got {}", format_number(n)),
                }),
            };
        }

        let CharValue::Number(n) = value else {
            return Err(CoreError::InvalidValue {
                capability: self.to_string(),
                reason: "expected a number".into(),
            });
        };
        if !n.is_finite() {
            return Err(CoreError::InvalidValue {
                capability: self.to_string(),
                reason: "value is not finite".into(),
            });
        }
        if let Some((min, max)) = self.range() {
            if n < min || n > max {
                return Err(CoreError::OutOfRange {
                    capability: self.to_string(),
                    value: n,
                    min,
                    max,
                });
            }
        }
        Ok(())
    }
}

// ── Values ───────────────────────────────────────────────────────────

/// A characteristic value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CharValue {
    Bool(bool),
    Number(f64),
}

impl CharValue {
    pub fn as_bool(self) -> bool {
        match self {
            Self::Bool(b) => b,
            Self::Number(n) => n != 0.0,
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            Self::Bool(b) => {
                if b {
                    1.0
                } else {
                    0.0
                }
            }
            Self::Number(n) => n,
        }
    }
}

impl From<bool> for CharValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for CharValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl fmt::Display for CharValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => f.write_str(&format_number(*n)),
        }
    }
}

impl FromStr for CharValue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "true" | "on" | "yes" => Ok(Self::Bool(true)),
            "false" | "off" | "no" => Ok(Self::Bool(false)),
            other => other
                .parse::<f64>()
                .map(Self::Number)
                .map_err(|_| format!("'{s}' is neither a boolean nor a number")),
        }
    }
}

// ── Enumerated states ────────────────────────────────────────────────

macro_rules! coded_state {
    ($(#[$meta:meta])* $name:ident { $($variant:ident = $code:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Protocol code for this state.
            pub fn code(self) -> u8 {
                match self {
                    $(Self::$variant => $code),+
                }
            }

            /// Parse a protocol code.
            pub fn from_code(code: u8) -> Option<Self> {
                match code {
                    $($code => Some(Self::$variant),)+
                    _ => None,
                }
            }

            /// Parse a characteristic value, rejecting non-integral or unknown codes.
            pub fn from_value(value: CharValue) -> Option<Self> {
                let n = value.as_f64();
                if n.fract() != 0.0 || !(0.0..=255.0).contains(&n) {
                    return None;
                }
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::as_conversions)]
                let code = n as u8;
                Self::from_code(code)
            }
        }

        impl From<$name> for CharValue {
            fn from(state: $name) -> Self {
                CharValue::Number(f64::from(state.code()))
            }
        }
    };
}

coded_state!(
    /// Lock current/target state.
    LockState { Unsecured = 0, Secured = 1 }
);

coded_state!(
    /// Garage door current/target state.
    DoorState { Open = 0, Closed = 1, Opening = 2, Closing = 3, Stopped = 4 }
);

coded_state!(
    /// Motion direction of a door, window or window covering.
    PositionState { Decreasing = 0, Increasing = 1, Stopped = 2 }
);

coded_state!(
    /// Thermostat mode. `Auto` is only valid as a target.
    HeatingCoolingMode { Off = 0, Heat = 1, Cool = 2, Auto = 3 }
);

coded_state!(
    /// Unit the host displays temperatures in.
    TemperatureUnits { Celsius = 0, Fahrenheit = 1 }
);

/// The accessory-protocol service an accessory is published as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display)]
pub enum ServiceKind {
    Lightbulb,
    Switch,
    Fan,
    LockMechanism,
    Door,
    Window,
    WindowCovering,
    GarageDoorOpener,
    Thermostat,
    TemperatureSensor,
    LightSensor,
    MotionSensor,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn names_parse_in_kebab_case() {
        assert_eq!(
            "target-door-state".parse::<Characteristic>().unwrap(),
            Characteristic::TargetDoorState
        );
        assert_eq!(Characteristic::ColorTemperature.to_string(), "color-temperature");
        assert_eq!("On".parse::<Characteristic>().unwrap(), Characteristic::On);
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let err = Characteristic::Brightness
            .validate(CharValue::Number(101.0))
            .unwrap_err();
        assert!(matches!(err, CoreError::OutOfRange { max, .. } if max == 100.0));
        assert!(Characteristic::Hue.validate(CharValue::Number(360.0)).is_ok());
        assert!(
            Characteristic::TargetTemperature
                .validate(CharValue::Number(9.5))
                .is_err()
        );
        assert!(
            Characteristic::TargetHeatingCoolingState
                .validate(CharValue::Number(4.0))
                .is_err()
        );
    }

    #[test]
    fn booleans_accept_zero_and_one() {
        assert!(Characteristic::On.validate(CharValue::Number(1.0)).is_ok());
        assert!(Characteristic::On.validate(CharValue::Number(2.0)).is_err());
        assert!(Characteristic::Brightness.validate(CharValue::Bool(true)).is_err());
    }

    #[test]
    fn coded_states_round_trip_through_values() {
        assert_eq!(CharValue::from(DoorState::Closed), CharValue::Number(1.0));
        assert_eq!(
            HeatingCoolingMode::from_value(CharValue::Number(3.0)),
            Some(HeatingCoolingMode::Auto)
        );
        assert_eq!(LockState::from_value(CharValue::Number(0.5)), None);
        assert_eq!(LockState::from_code(7), None);
    }

    #[test]
    fn values_parse_from_cli_text() {
        assert_eq!("on".parse::<CharValue>().unwrap(), CharValue::Bool(true));
        assert_eq!("22.5".parse::<CharValue>().unwrap(), CharValue::Number(22.5));
        assert!("warm".parse::<CharValue>().is_err());
        assert_eq!(CharValue::Number(60.0).to_string(), "60");
    }
}
