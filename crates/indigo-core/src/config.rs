// ── Bridge configuration ──
//
// Runtime settings the core needs: discovery filters, classification
// overrides, naming and timing. Loading from disk lives in indigo-config.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default delay before a two-phase accessory reports its new position.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(1);

/// Settings that shape discovery and accessory behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Also expose Indigo action groups as momentary switches.
    pub include_actions: bool,
    /// Only expose these ids. `None` means every device.
    pub include_ids: Option<Vec<String>>,
    /// Never expose these ids. Applied after the include list.
    pub exclude_ids: Vec<String>,

    // ── Classification overrides for plain on/off devices ──
    pub treat_as_switch_ids: Vec<String>,
    pub treat_as_lock_ids: Vec<String>,
    pub treat_as_door_ids: Vec<String>,
    pub treat_as_garage_door_ids: Vec<String>,
    pub treat_as_window_ids: Vec<String>,
    pub treat_as_window_covering_ids: Vec<String>,

    /// Indigo reports thermostat and sensor temperatures in Celsius.
    pub thermostats_in_celsius: bool,
    /// Prepended to every accessory name.
    pub accessory_name_prefix: String,
    /// Delay before a settled current state is pushed after a write.
    #[serde(with = "millis")]
    pub settle_delay: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            include_actions: false,
            include_ids: None,
            exclude_ids: Vec::new(),
            treat_as_switch_ids: Vec::new(),
            treat_as_lock_ids: Vec::new(),
            treat_as_door_ids: Vec::new(),
            treat_as_garage_door_ids: Vec::new(),
            treat_as_window_ids: Vec::new(),
            treat_as_window_covering_ids: Vec::new(),
            thermostats_in_celsius: false,
            accessory_name_prefix: String::new(),
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

impl BridgeConfig {
    /// Whether a device id passes the include/exclude filters.
    ///
    /// The include list, when present, is the candidate set; the exclude
    /// list is then subtracted from it.
    pub fn includes(&self, id: &str) -> bool {
        if let Some(ref include) = self.include_ids {
            if !include.iter().any(|i| i == id) {
                return false;
            }
        }
        !self.exclude_ids.iter().any(|i| i == id)
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
