// ── Accessories ──
//
// One `Accessory` per exposed Indigo device. It owns the cached device
// state, translates characteristic reads and writes into Indigo requests,
// and pushes characteristic updates when the device changes remotely.
//
// Behavior per device class lives in the submodules. Each provides the
// characteristics it exposes, async read/write functions, and a static
// table mapping Indigo property keys to push handlers.

mod action;
mod fan;
mod garage;
mod light;
mod lock;
mod on_off;
mod position;
mod sensor;
mod thermostat;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use indigo_api::{Method, Params, RequestQueue};
use serde::Serialize;
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::characteristic::{CharValue, Characteristic, ServiceKind, TemperatureUnits};
use crate::classifier::AccessoryKind;
use crate::config::BridgeConfig;
use crate::error::CoreError;
use crate::sink::CharacteristicSink;
use crate::state::{DeviceState, NAME_KEY, PropertyChange, PropertyValue};

pub use thermostat::{celsius_to_indigo_temp, indigo_temp_to_celsius};

/// Where a characteristic write came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// The host is asking for a change; Indigo must be updated.
    User,
    /// The host is echoing back a value the bridge itself pushed.
    RemoteEcho,
}

/// Push handler for one Indigo property key.
pub(crate) type RemoteHandler = fn(&Accessory, &PropertyValue);

// ── Capability flags ─────────────────────────────────────────────────

/// What an Indigo device reports it can do.
///
/// Indigo has used two spellings for most flags over its versions
/// (`typeSupportsOnOff` and `supportsOnOff`); either counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct CapabilityFlags {
    pub on_off: bool,
    pub dim: bool,
    pub dimmer: bool,
    pub white_temperature: bool,
    pub hsv: bool,
    pub speed_control: bool,
    pub hvac: bool,
    pub humidity: bool,
}

impl CapabilityFlags {
    pub fn from_state(state: &DeviceState) -> Self {
        Self {
            on_off: state.any_flag(&["typeSupportsOnOff", "supportsOnOff"]),
            dim: state.any_flag(&["typeSupportsDim", "supportsDim"]),
            dimmer: state.any_flag(&["typeIsDimmer", "isDimmer"])
                || state.text("type") == Some("dimmer"),
            white_temperature: state.flag("supportsWhiteTemperature"),
            hsv: state.flag("supportsHSV"),
            speed_control: state.any_flag(&[
                "typeSupportsSpeedControl",
                "supportsSpeedControl",
                "typeIsSpeedControl",
            ]),
            hvac: state.any_flag(&["typeSupportsHVAC", "supportsHVAC", "typeIsHVAC"]),
            humidity: state.flag("displayHumidityInRemoteUI"),
        }
    }

    /// Brightness-capable, under either flag.
    pub fn dimmable(self) -> bool {
        self.dim || self.dimmer
    }
}

/// Static accessory information reported to the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccessoryInfo {
    pub manufacturer: &'static str,
    pub serial_number: String,
    pub model: Option<String>,
    pub firmware_revision: Option<String>,
}

// ── Accessory ────────────────────────────────────────────────────────

struct Inner {
    device: DeviceState,
    name: String,
    previous_brightness: Option<f64>,
    previous_rotation_speed: Option<f64>,
    display_units: TemperatureUnits,
}

/// An Indigo device exposed as an accessory.
pub struct Accessory {
    id: String,
    device_url: String,
    kind: AccessoryKind,
    inner: Mutex<Inner>,
    channel: RequestQueue,
    sink: Arc<dyn CharacteristicSink>,
    config: Arc<BridgeConfig>,
    handlers: HashMap<&'static str, RemoteHandler>,
    cancel: CancellationToken,
}

impl Accessory {
    /// Build an accessory from the device's discovery JSON.
    pub fn new(
        kind: AccessoryKind,
        device_url: impl Into<String>,
        snapshot: &Map<String, Value>,
        channel: RequestQueue,
        sink: Arc<dyn CharacteristicSink>,
        config: Arc<BridgeConfig>,
    ) -> Self {
        let device_url = device_url.into();
        let device = DeviceState::from_snapshot(snapshot);
        let id = device.id().unwrap_or_else(|| device_url.clone());
        let name = format!(
            "{}{}",
            config.accessory_name_prefix,
            device.name().unwrap_or(&id)
        );

        let previous_brightness = device.number("brightness").filter(|b| *b > 0.0);
        let previous_rotation_speed = device
            .number("speedIndex")
            .map(fan::index_to_speed)
            .filter(|s| *s > 0.0);
        let display_units = if config.thermostats_in_celsius {
            TemperatureUnits::Celsius
        } else {
            TemperatureUnits::Fahrenheit
        };

        let handlers = remote_handlers(kind).iter().copied().collect();

        Self {
            id,
            device_url,
            kind,
            inner: Mutex::new(Inner {
                device,
                name,
                previous_brightness,
                previous_rotation_speed,
                display_units,
            }),
            channel,
            sink,
            config,
            handlers,
            cancel: CancellationToken::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Identity ─────────────────────────────────────────────────────

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name, including the configured prefix.
    pub fn name(&self) -> String {
        self.lock().name.clone()
    }

    pub fn kind(&self) -> AccessoryKind {
        self.kind
    }

    pub fn service(&self) -> ServiceKind {
        self.kind.service()
    }

    pub fn device_url(&self) -> &str {
        &self.device_url
    }

    pub fn flags(&self) -> CapabilityFlags {
        CapabilityFlags::from_state(&self.lock().device)
    }

    pub fn info(&self) -> AccessoryInfo {
        let inner = self.lock();
        AccessoryInfo {
            manufacturer: "Indigo",
            serial_number: self.id.clone(),
            model: inner.device.text("type").map(str::to_owned),
            firmware_revision: inner.device.get("versByte").map(ToString::to_string),
        }
    }

    /// Characteristics this accessory exposes, given its capability flags.
    pub fn characteristics(&self) -> Vec<Characteristic> {
        let flags = self.flags();
        match self.kind {
            AccessoryKind::Switch => on_off::characteristics(),
            AccessoryKind::Light => light::characteristics(flags),
            AccessoryKind::Fan => fan::characteristics(flags),
            AccessoryKind::Lock => lock::characteristics(),
            AccessoryKind::Door | AccessoryKind::Window | AccessoryKind::WindowCovering => {
                position::characteristics()
            }
            AccessoryKind::GarageDoor => garage::characteristics(),
            AccessoryKind::Thermostat => thermostat::characteristics(flags),
            AccessoryKind::Action => action::characteristics(),
            AccessoryKind::TemperatureSensor
            | AccessoryKind::LightSensor
            | AccessoryKind::MotionSensor => sensor::characteristics(self.kind),
        }
    }

    /// A copy of the cached device state.
    pub fn state(&self) -> DeviceState {
        self.lock().device.clone()
    }

    pub fn settle_delay(&self) -> Duration {
        self.config.settle_delay
    }

    // ── Host-facing operations ───────────────────────────────────────

    /// Fetch the device from Indigo and push every changed characteristic.
    pub async fn refresh_status(&self) -> Result<Vec<PropertyChange>, CoreError> {
        let changes = self.fetch_status().await?;
        self.dispatch(&changes);
        Ok(changes)
    }

    /// Refresh from Indigo, then return the current characteristic value.
    pub async fn read(&self, characteristic: Characteristic) -> Result<CharValue, CoreError> {
        self.require(characteristic)?;

        let value = match self.kind {
            AccessoryKind::Switch => on_off::read(self, characteristic).await,
            AccessoryKind::Light => light::read(self, characteristic).await,
            AccessoryKind::Fan => fan::read(self, characteristic).await,
            AccessoryKind::Lock => lock::read(self, characteristic).await,
            AccessoryKind::Door | AccessoryKind::Window | AccessoryKind::WindowCovering => {
                position::read(self, characteristic).await
            }
            AccessoryKind::GarageDoor => garage::read(self, characteristic).await,
            AccessoryKind::Thermostat => thermostat::read(self, characteristic).await,
            AccessoryKind::Action => action::read(self, characteristic),
            AccessoryKind::TemperatureSensor
            | AccessoryKind::LightSensor
            | AccessoryKind::MotionSensor => sensor::read(self, characteristic).await,
        }?;

        debug!(accessory = %self.name(), %characteristic, %value, "read");
        Ok(value)
    }

    /// Apply a characteristic value.
    ///
    /// Echoes of values the bridge pushed itself are acknowledged without
    /// touching Indigo. Everything else is validated and sent as a PUT (or
    /// EXECUTE for actions), then the cached state is reconciled with the
    /// device's answer without pushing anything back to the host.
    pub async fn write(
        &self,
        characteristic: Characteristic,
        value: CharValue,
        origin: Origin,
    ) -> Result<(), CoreError> {
        if origin == Origin::RemoteEcho {
            trace!(accessory = %self.name(), %characteristic, %value, "echo acknowledged");
            return Ok(());
        }

        self.require(characteristic)?;
        if !characteristic.is_writable() {
            return Err(self.unsupported(characteristic));
        }
        characteristic.validate(value)?;

        debug!(accessory = %self.name(), %characteristic, %value, "write");

        match self.kind {
            AccessoryKind::Switch => on_off::write(self, characteristic, value).await,
            AccessoryKind::Light => light::write(self, characteristic, value).await,
            AccessoryKind::Fan => fan::write(self, characteristic, value).await,
            AccessoryKind::Lock => lock::write(self, characteristic, value).await,
            AccessoryKind::Door | AccessoryKind::Window | AccessoryKind::WindowCovering => {
                position::write(self, characteristic, value).await
            }
            AccessoryKind::GarageDoor => garage::write(self, characteristic, value).await,
            AccessoryKind::Thermostat => thermostat::write(self, characteristic, value).await,
            AccessoryKind::Action => action::write(self, characteristic, value).await,
            AccessoryKind::TemperatureSensor
            | AccessoryKind::LightSensor
            | AccessoryKind::MotionSensor => Err(self.unsupported(characteristic)),
        }
    }

    /// Merge properties pushed by Indigo and propagate what changed.
    pub fn apply_remote(&self, props: &Map<String, Value>) -> Vec<PropertyChange> {
        let changes = self.absorb(props);
        self.dispatch(&changes);
        changes
    }

    // ── Shared plumbing for the capability modules ───────────────────

    /// GET the device and merge it into the cache without propagating.
    pub(crate) async fn fetch_status(&self) -> Result<Vec<PropertyChange>, CoreError> {
        let json = self
            .channel
            .request_json(&self.device_url, Method::Get, Params::new())
            .await?;
        let Value::Object(map) = json else {
            return Err(CoreError::Parse {
                message: format!("expected a JSON object for {}", self.device_url),
                body: json.to_string(),
            });
        };
        Ok(self.absorb(&map))
    }

    /// PUT the parameters, then reconcile the cache without propagating.
    pub(crate) async fn update_status(&self, params: Params) -> Result<(), CoreError> {
        self.channel
            .request(&self.device_url, Method::Put, params)
            .await?;
        self.fetch_status().await?;
        Ok(())
    }

    pub(crate) async fn execute(&self) -> Result<(), CoreError> {
        self.channel
            .request(&self.device_url, Method::Execute, Params::new())
            .await?;
        Ok(())
    }

    fn absorb(&self, props: &Map<String, Value>) -> Vec<PropertyChange> {
        let mut inner = self.lock();
        let changes = inner.device.apply_snapshot(props);
        if let Some(name) = props.get(NAME_KEY).and_then(Value::as_str) {
            inner.name = format!("{}{name}", self.config.accessory_name_prefix);
        }
        changes
    }

    fn dispatch(&self, changes: &[PropertyChange]) {
        for change in changes {
            if let Some(handler) = self.handlers.get(change.key.as_str()) {
                trace!(accessory = %self.id, key = %change.key, value = %change.new, "remote change");
                handler(self, &change.new);
            }
        }
    }

    /// Hand a value to the host.
    pub(crate) fn push(&self, characteristic: Characteristic, value: impl Into<CharValue>) {
        self.sink.publish(&self.id, characteristic, value.into());
    }

    /// Push a value after the settle delay.
    ///
    /// The push fires even if the device changes again in the meantime;
    /// it is only dropped if the accessory itself goes away.
    pub(crate) fn push_after_settle(&self, characteristic: Characteristic, value: CharValue) {
        let sink = Arc::clone(&self.sink);
        let id = self.id.clone();
        let delay = self.config.settle_delay;
        let cancel = self.cancel.child_token();

        tokio::spawn(async move {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {}
                () = tokio::time::sleep(delay) => {
                    sink.publish(&id, characteristic, value);
                }
            }
        });
    }

    pub(crate) fn with_state<R>(&self, f: impl FnOnce(&DeviceState) -> R) -> R {
        f(&self.lock().device)
    }

    pub(crate) fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub(crate) fn previous_brightness(&self) -> Option<f64> {
        self.lock().previous_brightness
    }

    pub(crate) fn remember_brightness(&self, brightness: f64) {
        if brightness > 0.0 {
            self.lock().previous_brightness = Some(brightness);
        }
    }

    pub(crate) fn previous_rotation_speed(&self) -> Option<f64> {
        self.lock().previous_rotation_speed
    }

    pub(crate) fn remember_rotation_speed(&self, speed: f64) {
        if speed > 0.0 {
            self.lock().previous_rotation_speed = Some(speed);
        }
    }

    pub(crate) fn display_units(&self) -> TemperatureUnits {
        self.lock().display_units
    }

    pub(crate) fn set_display_units(&self, units: TemperatureUnits) {
        self.lock().display_units = units;
    }

    /// A cached number, or `MissingProperty`.
    pub(crate) fn number(&self, key: &str) -> Result<f64, CoreError> {
        self.with_state(|s| s.number(key))
            .ok_or_else(|| CoreError::MissingProperty {
                accessory: self.name(),
                key: key.to_owned(),
            })
    }

    pub(crate) fn flag(&self, key: &str) -> bool {
        self.with_state(|s| s.flag(key))
    }

    pub(crate) fn unsupported(&self, characteristic: Characteristic) -> CoreError {
        CoreError::UnsupportedCapability {
            accessory: self.name(),
            capability: characteristic.to_string(),
        }
    }

    fn require(&self, characteristic: Characteristic) -> Result<(), CoreError> {
        if self.characteristics().contains(&characteristic) {
            Ok(())
        } else {
            Err(self.unsupported(characteristic))
        }
    }
}

impl Drop for Accessory {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for Accessory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Accessory")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("device_url", &self.device_url)
            .finish_non_exhaustive()
    }
}

fn remote_handlers(kind: AccessoryKind) -> &'static [(&'static str, RemoteHandler)] {
    match kind {
        AccessoryKind::Switch => on_off::HANDLERS,
        AccessoryKind::Light => light::HANDLERS,
        AccessoryKind::Fan => fan::HANDLERS,
        AccessoryKind::Lock => lock::HANDLERS,
        AccessoryKind::Door | AccessoryKind::Window | AccessoryKind::WindowCovering => {
            position::HANDLERS
        }
        AccessoryKind::GarageDoor => garage::HANDLERS,
        AccessoryKind::Thermostat => thermostat::HANDLERS,
        AccessoryKind::Action => &[],
        AccessoryKind::TemperatureSensor => sensor::TEMPERATURE_HANDLERS,
        AccessoryKind::LightSensor => sensor::LIGHT_HANDLERS,
        AccessoryKind::MotionSensor => sensor::MOTION_HANDLERS,
    }
}

/// Shared by the capability modules when a value must be an enumerated code.
pub(crate) fn invalid_code(characteristic: Characteristic, value: CharValue) -> CoreError {
    warn!(%characteristic, %value, "unknown state code");
    CoreError::InvalidValue {
        capability: characteristic.to_string(),
        reason: format!("{value} is not a valid state"),
    }
}
