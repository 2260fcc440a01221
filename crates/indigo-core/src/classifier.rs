// ── Device classification ──
//
// Decides which accessory variant, if any, an Indigo device or action
// becomes. The first matching rule wins.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::accessory::CapabilityFlags;
use crate::characteristic::ServiceKind;
use crate::config::BridgeConfig;
use crate::state::DeviceState;

/// The accessory variants the bridge can build.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum AccessoryKind {
    Action,
    Switch,
    Lock,
    Door,
    GarageDoor,
    Window,
    WindowCovering,
    Thermostat,
    Fan,
    Light,
    TemperatureSensor,
    LightSensor,
    MotionSensor,
}

impl AccessoryKind {
    /// The service the accessory is published as.
    pub fn service(self) -> ServiceKind {
        match self {
            Self::Action | Self::Switch => ServiceKind::Switch,
            Self::Lock => ServiceKind::LockMechanism,
            Self::Door => ServiceKind::Door,
            Self::GarageDoor => ServiceKind::GarageDoorOpener,
            Self::Window => ServiceKind::Window,
            Self::WindowCovering => ServiceKind::WindowCovering,
            Self::Thermostat => ServiceKind::Thermostat,
            Self::Fan => ServiceKind::Fan,
            Self::Light => ServiceKind::Lightbulb,
            Self::TemperatureSensor => ServiceKind::TemperatureSensor,
            Self::LightSensor => ServiceKind::LightSensor,
            Self::MotionSensor => ServiceKind::MotionSensor,
        }
    }
}

/// Classify a device from its discovery JSON.
///
/// Precedence: actions, then the on/off override lists (switch, lock,
/// door, garage door, window, window covering), then HVAC, speed
/// control, dimmable or on/off lights, and finally the sensor types.
/// Returns `None` for anything else.
pub fn classify(device: &Map<String, Value>, config: &BridgeConfig) -> Option<AccessoryKind> {
    let state = DeviceState::from_snapshot(device);

    if state.text("restParent") == Some("actions") {
        return Some(AccessoryKind::Action);
    }

    let flags = CapabilityFlags::from_state(&state);

    if flags.on_off {
        if let Some(id) = state.id() {
            let overrides = [
                (&config.treat_as_switch_ids, AccessoryKind::Switch),
                (&config.treat_as_lock_ids, AccessoryKind::Lock),
                (&config.treat_as_door_ids, AccessoryKind::Door),
                (&config.treat_as_garage_door_ids, AccessoryKind::GarageDoor),
                (&config.treat_as_window_ids, AccessoryKind::Window),
                (&config.treat_as_window_covering_ids, AccessoryKind::WindowCovering),
            ];
            if let Some((_, kind)) = overrides
                .iter()
                .find(|(ids, _)| ids.iter().any(|i| *i == id))
            {
                return Some(*kind);
            }
        }
    }

    if flags.hvac {
        return Some(AccessoryKind::Thermostat);
    }
    if flags.speed_control {
        return Some(AccessoryKind::Fan);
    }
    if flags.dimmable() || flags.on_off {
        return Some(AccessoryKind::Light);
    }

    match state.text("type") {
        Some("temperatureSensor") => Some(AccessoryKind::TemperatureSensor),
        Some("lightSensor") => Some(AccessoryKind::LightSensor),
        Some("motionSensor") => Some(AccessoryKind::MotionSensor),
        _ => None,
    }
}
