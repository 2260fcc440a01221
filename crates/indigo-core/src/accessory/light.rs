// Lights: on/off, brightness, white temperature and hue/saturation.
//
// Turning a dimmable light on restores its last non-zero brightness
// rather than sending a bare on, since hosts send On and Brightness
// together when the user drags a slider.

use indigo_api::Params;

use super::{Accessory, CapabilityFlags, RemoteHandler, on_off};
use crate::characteristic::{CharValue, Characteristic};
use crate::error::CoreError;
use crate::state::PropertyValue;

const MIN_MIRED: f64 = 153.0;
const MAX_MIRED: f64 = 500.0;

pub(super) const HANDLERS: &[(&str, RemoteHandler)] = &[
    ("isOn", on_off::push_on),
    ("brightness", push_brightness),
    ("whiteTemperature", push_color_temperature),
    ("hue", push_hue),
    ("saturation", push_saturation),
];

pub(super) fn characteristics(flags: CapabilityFlags) -> Vec<Characteristic> {
    let mut list = vec![Characteristic::On];
    if flags.dimmable() {
        list.push(Characteristic::Brightness);
    }
    if flags.white_temperature {
        list.push(Characteristic::ColorTemperature);
    }
    if flags.hsv {
        list.extend([Characteristic::Hue, Characteristic::Saturation]);
    }
    list
}

pub(super) async fn read(acc: &Accessory, characteristic: Characteristic) -> Result<CharValue, CoreError> {
    if characteristic == Characteristic::On {
        return on_off::read_on(acc).await;
    }

    acc.refresh_status().await?;
    match characteristic {
        Characteristic::Brightness => {
            let brightness = acc.number("brightness")?;
            acc.remember_brightness(brightness);
            Ok(brightness.into())
        }
        Characteristic::ColorTemperature => {
            let kelvin = acc.number("whiteTemperature")?;
            Ok(kelvin_to_mired(kelvin).into())
        }
        Characteristic::Hue => Ok(acc.number("hue")?.into()),
        Characteristic::Saturation => Ok(acc.number("saturation")?.into()),
        other => Err(acc.unsupported(other)),
    }
}

pub(super) async fn write(
    acc: &Accessory,
    characteristic: Characteristic,
    value: CharValue,
) -> Result<(), CoreError> {
    match characteristic {
        Characteristic::On => write_on(acc, value.as_bool()).await,
        Characteristic::Brightness => write_brightness(acc, value.as_f64()).await,
        Characteristic::ColorTemperature => {
            let kelvin = mired_to_kelvin(value.as_f64());
            acc.update_status(Params::new().with("whiteTemperature", format!("{kelvin:.0}")))
                .await
        }
        Characteristic::Hue => acc.update_status(Params::new().with("hue", value)).await,
        Characteristic::Saturation => {
            acc.update_status(Params::new().with("saturation", value))
                .await
        }
        other => Err(acc.unsupported(other)),
    }
}

async fn write_on(acc: &Accessory, on: bool) -> Result<(), CoreError> {
    if on && acc.flags().dimmable() {
        if let Some(previous) = acc.previous_brightness() {
            return write_brightness(acc, previous).await;
        }
    }
    on_off::write_on(acc, on).await
}

async fn write_brightness(acc: &Accessory, brightness: f64) -> Result<(), CoreError> {
    acc.remember_brightness(brightness);
    acc.update_status(Params::new().with("brightness", CharValue::Number(brightness)))
        .await
}

/// Mired (host) to Kelvin (Indigo).
pub(super) fn mired_to_kelvin(mired: f64) -> f64 {
    (1_000_000.0 / mired).round()
}

/// Kelvin (Indigo) to mired (host), clamped to the host's range.
pub(super) fn kelvin_to_mired(kelvin: f64) -> f64 {
    if kelvin <= 0.0 {
        return MAX_MIRED;
    }
    (1_000_000.0 / kelvin).round().clamp(MIN_MIRED, MAX_MIRED)
}

fn push_brightness(acc: &Accessory, value: &PropertyValue) {
    if let Some(brightness) = value.as_f64() {
        acc.remember_brightness(brightness);
        acc.push(Characteristic::Brightness, brightness);
    }
}

fn push_color_temperature(acc: &Accessory, value: &PropertyValue) {
    if let Some(kelvin) = value.as_f64() {
        acc.push(Characteristic::ColorTemperature, kelvin_to_mired(kelvin));
    }
}

fn push_hue(acc: &Accessory, value: &PropertyValue) {
    if let Some(hue) = value.as_f64() {
        acc.push(Characteristic::Hue, hue);
    }
}

fn push_saturation(acc: &Accessory, value: &PropertyValue) {
    if let Some(saturation) = value.as_f64() {
        acc.push(Characteristic::Saturation, saturation);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    use super::super::Origin;
    use super::super::test_support::Harness;
    use super::*;
    use crate::classifier::AccessoryKind;
    use crate::config::BridgeConfig;

    fn dimmer(brightness: u32, on: bool) -> Value {
        json!({
            "id": 101,
            "name": "Porch",
            "typeSupportsOnOff": true,
            "typeSupportsDim": true,
            "isOn": on,
            "brightness": brightness
        })
    }

    #[tokio::test]
    async fn turning_on_restores_previous_brightness() {
        let h = Harness::start().await;
        h.serve_device(101, &dimmer(60, true)).await;
        let acc = h.accessory(AccessoryKind::Light, &dimmer(60, true), BridgeConfig::default());

        acc.write(Characteristic::On, CharValue::Bool(false), Origin::User)
            .await
            .unwrap();
        acc.write(Characteristic::On, CharValue::Bool(true), Origin::User)
            .await
            .unwrap();

        assert_eq!(h.put_queries().await, vec!["isOn=0", "brightness=60"]);
    }

    #[tokio::test]
    async fn turning_on_without_history_sends_bare_on() {
        let h = Harness::start().await;
        h.serve_device(101, &dimmer(0, false)).await;
        let acc = h.accessory(AccessoryKind::Light, &dimmer(0, false), BridgeConfig::default());

        acc.write(Characteristic::On, CharValue::Bool(true), Origin::User)
            .await
            .unwrap();

        assert_eq!(h.put_queries().await, vec!["isOn=1"]);
    }

    #[tokio::test]
    async fn brightness_out_of_range_is_rejected_before_any_request() {
        let h = Harness::start().await;
        let acc = h.accessory(AccessoryKind::Light, &dimmer(10, true), BridgeConfig::default());

        let err = acc
            .write(Characteristic::Brightness, CharValue::Number(150.0), Origin::User)
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::OutOfRange { .. }));
        assert_eq!(h.queue.issued(), 0);
    }

    #[tokio::test]
    async fn non_dimmable_lights_do_not_expose_brightness() {
        let h = Harness::start().await;
        let device = json!({"id": 101, "name": "Lamp", "typeSupportsOnOff": true, "isOn": true});
        let acc = h.accessory(AccessoryKind::Light, &device, BridgeConfig::default());

        assert_eq!(acc.characteristics(), vec![Characteristic::On]);
        let err = acc.read(Characteristic::Brightness).await.unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedCapability { .. }));
    }

    #[tokio::test]
    async fn color_temperature_is_sent_in_kelvin() {
        let h = Harness::start().await;
        let device = json!({
            "id": 101, "name": "Desk", "typeSupportsOnOff": true,
            "supportsWhiteTemperature": true, "whiteTemperature": 4000
        });
        h.serve_device(101, &device).await;
        let acc = h.accessory(AccessoryKind::Light, &device, BridgeConfig::default());

        acc.write(Characteristic::ColorTemperature, CharValue::Number(250.0), Origin::User)
            .await
            .unwrap();
        let mired = acc.read(Characteristic::ColorTemperature).await.unwrap();

        assert_eq!(h.put_queries().await, vec!["whiteTemperature=4000"]);
        assert_eq!(mired, CharValue::Number(250.0));
    }

    #[tokio::test]
    async fn remote_brightness_change_is_pushed_and_remembered() {
        let h = Harness::start().await;
        h.serve_device(101, &dimmer(60, true)).await;
        let acc = h.accessory(AccessoryKind::Light, &dimmer(0, false), BridgeConfig::default());

        acc.apply_remote(dimmer(60, true).as_object().unwrap());

        assert_eq!(
            h.sink.latest("101", Characteristic::Brightness),
            Some(CharValue::Number(60.0))
        );
        assert_eq!(h.sink.latest("101", Characteristic::On), Some(CharValue::Bool(true)));
        assert_eq!(acc.previous_brightness(), Some(60.0));
    }

    #[test]
    fn mired_conversion_clamps_to_host_range() {
        assert!((mired_to_kelvin(153.0) - 6536.0).abs() < f64::EPSILON);
        assert!((kelvin_to_mired(10_000.0) - MIN_MIRED).abs() < f64::EPSILON);
        assert!((kelvin_to_mired(1_500.0) - MAX_MIRED).abs() < f64::EPSILON);
    }
}
