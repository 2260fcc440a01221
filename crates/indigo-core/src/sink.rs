// ── Characteristic sinks ──
//
// Where pushed characteristic values go. A running bridge hands values to
// the accessory host; the CLI logs them; tests record them.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::info;

use crate::characteristic::{CharValue, Characteristic};

/// Receives characteristic values the bridge pushes to the host.
///
/// Called from async tasks and from the request path, so implementations
/// must not block.
pub trait CharacteristicSink: Send + Sync {
    fn publish(&self, accessory_id: &str, characteristic: Characteristic, value: CharValue);
}

/// Logs every push at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl CharacteristicSink for TracingSink {
    fn publish(&self, accessory_id: &str, characteristic: Characteristic, value: CharValue) {
        info!(accessory = accessory_id, %characteristic, %value, "characteristic updated");
    }
}

/// One recorded push.
#[derive(Debug, Clone, PartialEq)]
pub struct Published {
    pub accessory_id: String,
    pub characteristic: Characteristic,
    pub value: CharValue,
}

/// Records every push in order.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<Published>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Published>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every push so far, oldest first.
    pub fn events(&self) -> Vec<Published> {
        self.lock().clone()
    }

    /// The most recent value pushed for one characteristic.
    pub fn latest(&self, accessory_id: &str, characteristic: Characteristic) -> Option<CharValue> {
        self.lock()
            .iter()
            .rev()
            .find(|p| p.accessory_id == accessory_id && p.characteristic == characteristic)
            .map(|p| p.value)
    }

    /// How many times a characteristic was pushed.
    pub fn count(&self, accessory_id: &str, characteristic: Characteristic) -> usize {
        self.lock()
            .iter()
            .filter(|p| p.accessory_id == accessory_id && p.characteristic == characteristic)
            .count()
    }
}

impl CharacteristicSink for MemorySink {
    fn publish(&self, accessory_id: &str, characteristic: Characteristic, value: CharValue) {
        self.lock().push(Published {
            accessory_id: accessory_id.to_owned(),
            characteristic,
            value,
        });
    }
}
