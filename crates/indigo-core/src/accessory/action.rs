// Indigo action groups, presented as momentary switches.

use tracing::warn;

use super::Accessory;
use crate::characteristic::{CharValue, Characteristic};
use crate::error::CoreError;

pub(super) fn characteristics() -> Vec<Characteristic> {
    vec![Characteristic::On]
}

/// Actions have no state to fetch; they always read as off.
pub(super) fn read(acc: &Accessory, characteristic: Characteristic) -> Result<CharValue, CoreError> {
    match characteristic {
        Characteristic::On => Ok(CharValue::Bool(false)),
        other => Err(acc.unsupported(other)),
    }
}

/// Run the action group and flip the switch back off after settling.
pub(super) async fn write(
    acc: &Accessory,
    characteristic: Characteristic,
    value: CharValue,
) -> Result<(), CoreError> {
    if characteristic != Characteristic::On {
        return Err(acc.unsupported(characteristic));
    }
    if !value.as_bool() {
        return Ok(());
    }

    let result = acc.execute().await;
    if let Err(ref e) = result {
        warn!(accessory = %acc.name(), error = %e, "action group failed");
    }
    acc.push_after_settle(Characteristic::On, CharValue::Bool(false));
    result
}
