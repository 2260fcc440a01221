// Relay devices presented as garage door openers: on means open.

use indigo_api::Params;

use super::{Accessory, RemoteHandler, invalid_code};
use crate::characteristic::{CharValue, Characteristic, DoorState};
use crate::error::CoreError;
use crate::state::PropertyValue;

pub(super) const HANDLERS: &[(&str, RemoteHandler)] = &[("isOn", push_door_state)];

pub(super) fn characteristics() -> Vec<Characteristic> {
    vec![
        Characteristic::CurrentDoorState,
        Characteristic::TargetDoorState,
        Characteristic::ObstructionDetected,
    ]
}

fn door_state(on: bool) -> DoorState {
    if on { DoorState::Open } else { DoorState::Closed }
}

pub(super) async fn read(acc: &Accessory, characteristic: Characteristic) -> Result<CharValue, CoreError> {
    if !acc.flags().on_off {
        return Err(acc.unsupported(characteristic));
    }
    if characteristic == Characteristic::ObstructionDetected {
        return Ok(CharValue::Bool(false));
    }
    acc.refresh_status().await?;
    Ok(door_state(acc.flag("isOn")).into())
}

pub(super) async fn write(
    acc: &Accessory,
    characteristic: Characteristic,
    value: CharValue,
) -> Result<(), CoreError> {
    if characteristic != Characteristic::TargetDoorState || !acc.flags().on_off {
        return Err(acc.unsupported(characteristic));
    }
    let target = match DoorState::from_value(value) {
        Some(state @ (DoorState::Open | DoorState::Closed)) => state,
        _ => return Err(invalid_code(characteristic, value)),
    };

    let on = target == DoorState::Open;
    acc.update_status(Params::new().with("isOn", u8::from(on))).await?;
    acc.push_after_settle(Characteristic::CurrentDoorState, target.into());
    Ok(())
}

fn push_door_state(acc: &Accessory, value: &PropertyValue) {
    let state = door_state(value.is_truthy());
    acc.push(Characteristic::CurrentDoorState, state);
    acc.push(Characteristic::TargetDoorState, state);
}
