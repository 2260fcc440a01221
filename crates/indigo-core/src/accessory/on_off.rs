// On/off switches, and the on/off plumbing lights and fans share.

use indigo_api::Params;

use super::{Accessory, RemoteHandler};
use crate::characteristic::{CharValue, Characteristic};
use crate::error::CoreError;
use crate::state::PropertyValue;

pub(super) const HANDLERS: &[(&str, RemoteHandler)] = &[("isOn", push_on)];

pub(super) fn characteristics() -> Vec<Characteristic> {
    vec![Characteristic::On]
}

pub(super) async fn read(acc: &Accessory, characteristic: Characteristic) -> Result<CharValue, CoreError> {
    match characteristic {
        Characteristic::On => read_on(acc).await,
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
        other => Err(acc.unsupported(other)),
    }
}

/// Refresh, then report `isOn`.
pub(super) async fn read_on(acc: &Accessory) -> Result<CharValue, CoreError> {
    if !acc.flags().on_off {
        return Err(acc.unsupported(Characteristic::On));
    }
    acc.refresh_status().await?;
    Ok(CharValue::Bool(acc.flag("isOn")))
}

/// Send `isOn=1` or `isOn=0`.
pub(super) async fn write_on(acc: &Accessory, on: bool) -> Result<(), CoreError> {
    if !acc.flags().on_off {
        return Err(acc.unsupported(Characteristic::On));
    }
    acc.update_status(Params::new().with("isOn", u8::from(on))).await
}

pub(super) fn push_on(acc: &Accessory, value: &PropertyValue) {
    acc.push(Characteristic::On, value.is_truthy());
}
