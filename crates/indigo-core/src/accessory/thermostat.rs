// HVAC thermostats.
//
// The host always works in Celsius. Indigo reports temperatures in
// whatever unit the thermostat uses; `thermostats_in_celsius` says which.

use indigo_api::Params;

use super::{Accessory, CapabilityFlags, RemoteHandler, invalid_code};
use crate::characteristic::{CharValue, Characteristic, HeatingCoolingMode, TemperatureUnits};
use crate::error::CoreError;
use crate::state::{DeviceState, PropertyValue};

const HEAT_MODES: &[&str] = &["hvacOperationModeIsHeat", "hvacOperationModeIsProgramHeat"];
const COOL_MODES: &[&str] = &["hvacOperationModeIsCool", "hvacOperationModeIsProgramCool"];
const AUTO_MODES: &[&str] = &["hvacOperationModeIsAuto", "hvacOperationModeIsProgramAuto"];

pub(super) const HANDLERS: &[(&str, RemoteHandler)] = &[
    ("inputTemperatureVals", push_current_temperature),
    ("inputHumidityVals", push_humidity),
    ("setpointHeat", push_heating_threshold),
    ("setpointCool", push_cooling_threshold),
    ("hvacHeaterIsOn", push_current_mode),
    ("hvacCoolerIsOn", push_current_mode),
    ("hvacOperationModeIsOff", push_target_mode),
    ("hvacOperationModeIsHeat", push_target_mode),
    ("hvacOperationModeIsProgramHeat", push_target_mode),
    ("hvacOperationModeIsCool", push_target_mode),
    ("hvacOperationModeIsProgramCool", push_target_mode),
    ("hvacOperationModeIsAuto", push_target_mode),
    ("hvacOperationModeIsProgramAuto", push_target_mode),
];

pub(super) fn characteristics(flags: CapabilityFlags) -> Vec<Characteristic> {
    let mut list = vec![
        Characteristic::CurrentHeatingCoolingState,
        Characteristic::TargetHeatingCoolingState,
        Characteristic::CurrentTemperature,
        Characteristic::TargetTemperature,
        Characteristic::TemperatureDisplayUnits,
        Characteristic::CoolingThresholdTemperature,
        Characteristic::HeatingThresholdTemperature,
    ];
    if flags.humidity {
        list.push(Characteristic::CurrentRelativeHumidity);
    }
    list
}

// ── Unit conversion ──────────────────────────────────────────────────

fn round_tenth(t: f64) -> f64 {
    (t * 10.0).round() / 10.0
}

/// Indigo temperature to Celsius, rounded to one decimal place.
pub fn indigo_temp_to_celsius(t: f64, in_celsius: bool) -> f64 {
    if in_celsius {
        t
    } else {
        round_tenth((t - 32.0) * 5.0 / 9.0)
    }
}

/// Celsius to the thermostat's own unit, rounded to one decimal place.
pub fn celsius_to_indigo_temp(t: f64, in_celsius: bool) -> f64 {
    if in_celsius {
        t
    } else {
        round_tenth(t * 9.0 / 5.0 + 32.0)
    }
}

// ── Derived values ───────────────────────────────────────────────────

fn current_mode(state: &DeviceState) -> HeatingCoolingMode {
    if state.flag("hvacHeaterIsOn") {
        HeatingCoolingMode::Heat
    } else if state.flag("hvacCoolerIsOn") {
        HeatingCoolingMode::Cool
    } else {
        HeatingCoolingMode::Off
    }
}

fn target_mode(state: &DeviceState) -> HeatingCoolingMode {
    if state.any_flag(HEAT_MODES) {
        HeatingCoolingMode::Heat
    } else if state.any_flag(COOL_MODES) {
        HeatingCoolingMode::Cool
    } else if state.any_flag(AUTO_MODES) {
        HeatingCoolingMode::Auto
    } else {
        HeatingCoolingMode::Off
    }
}

/// The setpoint that matters in the current mode, in Indigo's unit.
/// Outside heat and cool modes this is the midpoint of the two.
fn target_temperature(state: &DeviceState) -> Option<f64> {
    let heat = state.number("setpointHeat");
    let cool = state.number("setpointCool");
    if state.any_flag(HEAT_MODES) {
        heat
    } else if state.any_flag(COOL_MODES) {
        cool
    } else {
        Some((heat? + cool?) / 2.0)
    }
}

fn to_host(acc: &Accessory, t: f64) -> f64 {
    indigo_temp_to_celsius(t, acc.config().thermostats_in_celsius)
}

// ── Read / write ─────────────────────────────────────────────────────

pub(super) async fn read(acc: &Accessory, characteristic: Characteristic) -> Result<CharValue, CoreError> {
    if characteristic == Characteristic::TemperatureDisplayUnits {
        return Ok(acc.display_units().into());
    }
    if !acc.flags().hvac {
        return Err(acc.unsupported(characteristic));
    }

    acc.refresh_status().await?;
    match characteristic {
        Characteristic::CurrentHeatingCoolingState => Ok(acc.with_state(current_mode).into()),
        Characteristic::TargetHeatingCoolingState => Ok(acc.with_state(target_mode).into()),
        Characteristic::CurrentTemperature => {
            Ok(to_host(acc, acc.number("inputTemperatureVals")?).into())
        }
        Characteristic::TargetTemperature => {
            let t = acc
                .with_state(target_temperature)
                .ok_or_else(|| CoreError::MissingProperty {
                    accessory: acc.name(),
                    key: "setpointHeat/setpointCool".into(),
                })?;
            Ok(to_host(acc, t).into())
        }
        Characteristic::CoolingThresholdTemperature => {
            Ok(to_host(acc, acc.number("setpointCool")?).into())
        }
        Characteristic::HeatingThresholdTemperature => {
            Ok(to_host(acc, acc.number("setpointHeat")?).into())
        }
        Characteristic::CurrentRelativeHumidity => Ok(acc.number("inputHumidityVals")?.into()),
        other => Err(acc.unsupported(other)),
    }
}

pub(super) async fn write(
    acc: &Accessory,
    characteristic: Characteristic,
    value: CharValue,
) -> Result<(), CoreError> {
    if characteristic == Characteristic::TemperatureDisplayUnits {
        let units =
            TemperatureUnits::from_value(value).ok_or_else(|| invalid_code(characteristic, value))?;
        acc.set_display_units(units);
        return Ok(());
    }
    if !acc.flags().hvac {
        return Err(acc.unsupported(characteristic));
    }

    let in_celsius = acc.config().thermostats_in_celsius;
    match characteristic {
        Characteristic::TargetHeatingCoolingState => {
            let key = match HeatingCoolingMode::from_value(value) {
                Some(HeatingCoolingMode::Off) => "hvacOperationModeIsOff",
                Some(HeatingCoolingMode::Heat) => "hvacOperationModeIsHeat",
                Some(HeatingCoolingMode::Cool) => "hvacOperationModeIsCool",
                Some(HeatingCoolingMode::Auto) => "hvacOperationModeIsAuto",
                None => return Err(invalid_code(characteristic, value)),
            };
            acc.update_status(Params::new().with(key, "true")).await
        }
        Characteristic::TargetTemperature => {
            let t = celsius_to_indigo_temp(value.as_f64(), in_celsius);
            // The setpoint to move depends on the mode Indigo has right now.
            acc.fetch_status().await?;
            let (heat, cool) =
                acc.with_state(|s| (s.flag("hvacOperationModeIsHeat"), s.flag("hvacOperationModeIsCool")));
            let params = if heat {
                Params::new().with("setpointHeat", CharValue::Number(t))
            } else if cool {
                Params::new().with("setpointCool", CharValue::Number(t))
            } else {
                let adjust = if in_celsius { 2.0 } else { 5.0 };
                Params::new()
                    .with("setpointHeat", CharValue::Number(round_tenth(t - adjust)))
                    .with("setpointCool", CharValue::Number(round_tenth(t + adjust)))
            };
            acc.update_status(params).await
        }
        Characteristic::CoolingThresholdTemperature => {
            let t = celsius_to_indigo_temp(value.as_f64(), in_celsius);
            acc.update_status(Params::new().with("setpointCool", CharValue::Number(t)))
                .await
        }
        Characteristic::HeatingThresholdTemperature => {
            let t = celsius_to_indigo_temp(value.as_f64(), in_celsius);
            acc.update_status(Params::new().with("setpointHeat", CharValue::Number(t)))
                .await
        }
        other => Err(acc.unsupported(other)),
    }
}

// ── Push handlers ────────────────────────────────────────────────────

fn push_current_temperature(acc: &Accessory, value: &PropertyValue) {
    if let Some(t) = value.as_f64() {
        acc.push(Characteristic::CurrentTemperature, to_host(acc, t));
    }
}

fn push_humidity(acc: &Accessory, value: &PropertyValue) {
    if let Some(h) = value.as_f64() {
        acc.push(Characteristic::CurrentRelativeHumidity, h);
    }
}

fn push_target_temperature(acc: &Accessory) {
    if let Some(t) = acc.with_state(target_temperature) {
        acc.push(Characteristic::TargetTemperature, to_host(acc, t));
    }
}

fn push_heating_threshold(acc: &Accessory, value: &PropertyValue) {
    if let Some(t) = value.as_f64() {
        acc.push(Characteristic::HeatingThresholdTemperature, to_host(acc, t));
    }
    push_target_temperature(acc);
}

fn push_cooling_threshold(acc: &Accessory, value: &PropertyValue) {
    if let Some(t) = value.as_f64() {
        acc.push(Characteristic::CoolingThresholdTemperature, to_host(acc, t));
    }
    push_target_temperature(acc);
}

fn push_current_mode(acc: &Accessory, _value: &PropertyValue) {
    acc.push(Characteristic::CurrentHeatingCoolingState, acc.with_state(current_mode));
}

fn push_target_mode(acc: &Accessory, _value: &PropertyValue) {
    acc.push(Characteristic::TargetHeatingCoolingState, acc.with_state(target_mode));
    push_target_temperature(acc);
}
