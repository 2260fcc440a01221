// Fans with a four-step speed index (0 off, 1 low, 2 medium, 3 high).

use indigo_api::Params;

use super::{Accessory, CapabilityFlags, RemoteHandler, on_off};
use crate::characteristic::{CharValue, Characteristic};
use crate::error::CoreError;
use crate::state::PropertyValue;

const MAX_SPEED_INDEX: f64 = 3.0;

pub(super) const HANDLERS: &[(&str, RemoteHandler)] = &[
    ("isOn", on_off::push_on),
    ("speedIndex", push_rotation_speed),
];

pub(super) fn characteristics(flags: CapabilityFlags) -> Vec<Characteristic> {
    let mut list = vec![Characteristic::On];
    if flags.speed_control {
        list.push(Characteristic::RotationSpeed);
    }
    list
}

pub(super) async fn read(acc: &Accessory, characteristic: Characteristic) -> Result<CharValue, CoreError> {
    match characteristic {
        Characteristic::On => on_off::read_on(acc).await,
        Characteristic::RotationSpeed => {
            acc.refresh_status().await?;
            let speed = index_to_speed(acc.number("speedIndex")?);
            acc.remember_rotation_speed(speed);
            Ok(speed.into())
        }
        other => Err(acc.unsupported(other)),
    }
}

pub(super) async fn write(
    acc: &Accessory,
    characteristic: Characteristic,
    value: CharValue,
) -> Result<(), CoreError> {
    match characteristic {
        Characteristic::On => {
            if value.as_bool() && acc.flags().speed_control {
                if let Some(previous) = acc.previous_rotation_speed() {
                    return write_speed(acc, previous).await;
                }
            }
            on_off::write_on(acc, value.as_bool()).await
        }
        Characteristic::RotationSpeed => write_speed(acc, value.as_f64()).await,
        other => Err(acc.unsupported(other)),
    }
}

async fn write_speed(acc: &Accessory, speed: f64) -> Result<(), CoreError> {
    acc.remember_rotation_speed(speed);
    acc.update_status(Params::new().with("speedIndex", speed_to_index(speed)))
        .await
}

/// Speed index to a 0..=100 rotation speed.
pub(super) fn index_to_speed(index: f64) -> f64 {
    (index.clamp(0.0, MAX_SPEED_INDEX) / MAX_SPEED_INDEX) * 100.0
}

/// Rotation speed to the nearest step at or above it.
pub(super) fn speed_to_index(speed: f64) -> u8 {
    if speed > 200.0 / 3.0 {
        3
    } else if speed > 100.0 / 3.0 {
        2
    } else if speed > 0.0 {
        1
    } else {
        0
    }
}

fn push_rotation_speed(acc: &Accessory, value: &PropertyValue) {
    if let Some(index) = value.as_f64() {
        let speed = index_to_speed(index);
        acc.remember_rotation_speed(speed);
        acc.push(Characteristic::RotationSpeed, speed);
    }
}
