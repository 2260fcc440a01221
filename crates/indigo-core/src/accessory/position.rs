// Doors, windows and window coverings.
//
// Dimmable devices map brightness to position directly. Plain relays
// are either fully open (100) or fully closed (0).

use indigo_api::Params;

use super::{Accessory, RemoteHandler};
use crate::characteristic::{CharValue, Characteristic, PositionState};
use crate::error::CoreError;
use crate::state::PropertyValue;

pub(super) const HANDLERS: &[(&str, RemoteHandler)] = &[
    ("isOn", push_on_position),
    ("brightness", push_brightness_position),
];

pub(super) fn characteristics() -> Vec<Characteristic> {
    vec![
        Characteristic::CurrentPosition,
        Characteristic::TargetPosition,
        Characteristic::PositionState,
    ]
}

fn relay_position(on: bool) -> f64 {
    if on { 100.0 } else { 0.0 }
}

fn supported(acc: &Accessory) -> bool {
    let flags = acc.flags();
    flags.on_off || flags.dimmable()
}

pub(super) async fn read(acc: &Accessory, characteristic: Characteristic) -> Result<CharValue, CoreError> {
    if !supported(acc) {
        return Err(acc.unsupported(characteristic));
    }
    if characteristic == Characteristic::PositionState {
        return Ok(PositionState::Stopped.into());
    }

    acc.refresh_status().await?;
    let position = if acc.flags().dimmable() {
        acc.number("brightness")?
    } else {
        relay_position(acc.flag("isOn"))
    };
    Ok(position.into())
}

pub(super) async fn write(
    acc: &Accessory,
    characteristic: Characteristic,
    value: CharValue,
) -> Result<(), CoreError> {
    if characteristic != Characteristic::TargetPosition || !supported(acc) {
        return Err(acc.unsupported(characteristic));
    }

    let position = value.as_f64();
    let params = if acc.flags().dimmable() {
        Params::new().with("brightness", value)
    } else {
        Params::new().with("isOn", u8::from(position > 0.0))
    };

    acc.update_status(params).await?;
    acc.push_after_settle(Characteristic::CurrentPosition, value);
    Ok(())
}

fn push_position(acc: &Accessory, position: f64) {
    acc.push(Characteristic::CurrentPosition, position);
    acc.push(Characteristic::TargetPosition, position);
}

fn push_on_position(acc: &Accessory, value: &PropertyValue) {
    if !acc.flags().dimmable() {
        push_position(acc, relay_position(value.is_truthy()));
    }
}

fn push_brightness_position(acc: &Accessory, value: &PropertyValue) {
    if let Some(brightness) = value.as_f64() {
        push_position(acc, brightness);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::super::Origin;
    use super::super::test_support::{Harness, SETTLE};
    use super::*;
    use crate::classifier::AccessoryKind;
    use crate::config::BridgeConfig;

    #[tokio::test]
    async fn relay_door_opens_fully_then_settles() {
        let h = Harness::start().await;
        let device = json!({"id": 50, "name": "Side Door", "typeSupportsOnOff": true, "isOn": false});
        h.serve_device(50, &json!({"id": 50, "typeSupportsOnOff": true, "isOn": true}))
            .await;
        let acc = h.accessory(AccessoryKind::Door, &device, BridgeConfig::default());

        acc.write(Characteristic::TargetPosition, CharValue::Number(100.0), Origin::User)
            .await
            .unwrap();

        assert_eq!(h.put_queries().await, vec!["isOn=1"]);
        tokio::time::sleep(SETTLE * 3).await;
        assert_eq!(
            h.sink.latest("50", Characteristic::CurrentPosition),
            Some(CharValue::Number(100.0))
        );
    }

    #[tokio::test]
    async fn dimmable_covering_maps_brightness_to_position() {
        let h = Harness::start().await;
        let device = json!({
            "id": 51, "name": "Blind", "typeSupportsOnOff": true,
            "typeSupportsDim": true, "brightness": 30
        });
        h.serve_device(51, &device).await;
        let acc = h.accessory(AccessoryKind::WindowCovering, &device, BridgeConfig::default());

        assert_eq!(
            acc.read(Characteristic::CurrentPosition).await.unwrap(),
            CharValue::Number(30.0)
        );
        acc.write(Characteristic::TargetPosition, CharValue::Number(45.0), Origin::User)
            .await
            .unwrap();

        assert_eq!(h.put_queries().await, vec!["brightness=45"]);
    }

    #[tokio::test]
    async fn position_state_is_always_stopped() {
        let h = Harness::start().await;
        let device = json!({"id": 52, "name": "Skylight", "typeSupportsOnOff": true});
        let acc = h.accessory(AccessoryKind::Window, &device, BridgeConfig::default());

        assert_eq!(
            acc.read(Characteristic::PositionState).await.unwrap(),
            PositionState::Stopped.into()
        );
        assert_eq!(h.queue.issued(), 0);
    }
}
