//! Core of the Indigo accessory bridge.
//!
//! Maps Indigo home-automation devices onto accessory-protocol
//! characteristics and keeps the two in sync:
//!
//! - [`Registry`] discovers devices over the REST API and routes inbound
//!   change notifications to the right [`Accessory`].
//! - [`Accessory`] serves characteristic reads and writes, and pushes
//!   updates to a [`CharacteristicSink`] when the device changes remotely.
//! - [`DeviceState`] caches each device's property bag and reports what
//!   changed when a fresh snapshot arrives.
//!
//! All traffic to Indigo goes through a single [`indigo_api::RequestQueue`].

pub mod accessory;
pub mod characteristic;
pub mod classifier;
pub mod config;
pub mod error;
pub mod registry;
pub mod sink;
pub mod state;

pub use accessory::{Accessory, AccessoryInfo, CapabilityFlags, Origin};
pub use characteristic::{
    CharValue, Characteristic, DoorState, HeatingCoolingMode, LockState, PositionState,
    ServiceKind, TemperatureUnits,
};
pub use classifier::{AccessoryKind, classify};
pub use config::{BridgeConfig, DEFAULT_SETTLE_DELAY};
pub use error::CoreError;
pub use registry::{MAX_ACCESSORIES, Registry};
pub use sink::{CharacteristicSink, MemorySink, Published, TracingSink};
pub use state::{DeviceState, PropertyChange, PropertyValue};
