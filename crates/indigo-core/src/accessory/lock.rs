// Relay devices presented as lock mechanisms: on means secured.

use indigo_api::Params;

use super::{Accessory, RemoteHandler, invalid_code};
use crate::characteristic::{CharValue, Characteristic, LockState};
use crate::error::CoreError;
use crate::state::PropertyValue;

pub(super) const HANDLERS: &[(&str, RemoteHandler)] = &[("isOn", push_lock_state)];

pub(super) fn characteristics() -> Vec<Characteristic> {
    vec![Characteristic::LockCurrentState, Characteristic::LockTargetState]
}

fn lock_state(on: bool) -> LockState {
    if on { LockState::Secured } else { LockState::Unsecured }
}

pub(super) async fn read(acc: &Accessory, characteristic: Characteristic) -> Result<CharValue, CoreError> {
    if !acc.flags().on_off {
        return Err(acc.unsupported(characteristic));
    }
    acc.refresh_status().await?;
    Ok(lock_state(acc.flag("isOn")).into())
}

/// Send the target, then report it as current once the bolt has moved.
pub(super) async fn write(
    acc: &Accessory,
    characteristic: Characteristic,
    value: CharValue,
) -> Result<(), CoreError> {
    if characteristic != Characteristic::LockTargetState || !acc.flags().on_off {
        return Err(acc.unsupported(characteristic));
    }
    let target = LockState::from_value(value).ok_or_else(|| invalid_code(characteristic, value))?;

    let on = target == LockState::Secured;
    acc.update_status(Params::new().with("isOn", u8::from(on))).await?;
    acc.push_after_settle(Characteristic::LockCurrentState, target.into());
    Ok(())
}

fn push_lock_state(acc: &Accessory, value: &PropertyValue) {
    let state = lock_state(value.is_truthy());
    acc.push(Characteristic::LockCurrentState, state);
    acc.push(Characteristic::LockTargetState, state);
}
