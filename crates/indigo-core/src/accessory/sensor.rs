// Read-only sensors: temperature, ambient light and motion.

use super::{Accessory, RemoteHandler};
use crate::characteristic::{CharValue, Characteristic};
use crate::classifier::AccessoryKind;
use crate::error::CoreError;
use crate::state::{DeviceState, PropertyValue};

pub(super) const TEMPERATURE_HANDLERS: &[(&str, RemoteHandler)] = &[
    ("sensorValue", push_temperature),
    ("displayRawState", push_temperature),
];
pub(super) const LIGHT_HANDLERS: &[(&str, RemoteHandler)] = &[("lightLevel", push_light_level)];
pub(super) const MOTION_HANDLERS: &[(&str, RemoteHandler)] = &[("motionDetected", push_motion)];

pub(super) fn characteristics(kind: AccessoryKind) -> Vec<Characteristic> {
    match kind {
        AccessoryKind::TemperatureSensor => vec![Characteristic::CurrentTemperature],
        AccessoryKind::LightSensor => vec![Characteristic::CurrentAmbientLightLevel],
        AccessoryKind::MotionSensor => vec![Characteristic::MotionDetected],
        _ => Vec::new(),
    }
}

/// Raw temperature in Indigo's unit. `sensorValue` is numeric; older
/// plugins only fill in the display string.
fn raw_temperature(state: &DeviceState) -> Option<f64> {
    state
        .number("sensorValue")
        .or_else(|| state.number("displayRawState"))
}

pub(super) async fn read(acc: &Accessory, characteristic: Characteristic) -> Result<CharValue, CoreError> {
    acc.refresh_status().await?;
    match characteristic {
        Characteristic::CurrentTemperature => {
            let t = acc
                .with_state(raw_temperature)
                .ok_or_else(|| CoreError::MissingProperty {
                    accessory: acc.name(),
                    key: "sensorValue".into(),
                })?;
            Ok(super::indigo_temp_to_celsius(t, acc.config().thermostats_in_celsius).into())
        }
        Characteristic::CurrentAmbientLightLevel => Ok(acc.number("lightLevel")?.into()),
        Characteristic::MotionDetected => {
            let key = "motionDetected";
            if acc.with_state(|s| s.get(key).is_none()) {
                return Err(CoreError::MissingProperty {
                    accessory: acc.name(),
                    key: key.into(),
                });
            }
            Ok(CharValue::Bool(acc.flag(key)))
        }
        other => Err(acc.unsupported(other)),
    }
}

fn push_temperature(acc: &Accessory, _value: &PropertyValue) {
    if let Some(t) = acc.with_state(raw_temperature) {
        let celsius = super::indigo_temp_to_celsius(t, acc.config().thermostats_in_celsius);
        acc.push(Characteristic::CurrentTemperature, celsius);
    }
}

fn push_light_level(acc: &Accessory, value: &PropertyValue) {
    if let Some(lux) = value.as_f64() {
        acc.push(Characteristic::CurrentAmbientLightLevel, lux);
    }
}

fn push_motion(acc: &Accessory, value: &PropertyValue) {
    acc.push(Characteristic::MotionDetected, value.is_truthy());
}
