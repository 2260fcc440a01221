// ── Accessory registry ──
//
// Discovery and inbound routing. Owns the id → accessory index; every
// accessory shares the registry's request queue, sink and config.

use std::sync::{Arc, PoisonError, RwLock};

use indexmap::IndexMap;
use indigo_api::{Method, Params, RequestQueue};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::accessory::Accessory;
use crate::classifier::classify;
use crate::config::BridgeConfig;
use crate::error::CoreError;
use crate::sink::CharacteristicSink;
use crate::state::{DeviceState, PropertyChange};

/// Most accessories a single bridge may expose.
pub const MAX_ACCESSORIES: usize = 99;

const DEVICES_ROOT: &str = "/devices";
const ACTIONS_ROOT: &str = "/actions";

/// All accessories the bridge currently exposes.
pub struct Registry {
    channel: RequestQueue,
    config: Arc<BridgeConfig>,
    sink: Arc<dyn CharacteristicSink>,
    accessories: RwLock<IndexMap<String, Arc<Accessory>>>,
}

impl Registry {
    pub fn new(channel: RequestQueue, config: BridgeConfig, sink: Arc<dyn CharacteristicSink>) -> Self {
        Self {
            channel,
            config: Arc::new(config),
            sink,
            accessories: RwLock::new(IndexMap::new()),
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn channel(&self) -> &RequestQueue {
        &self.channel
    }

    /// Enumerate Indigo's devices (and actions, if enabled) and rebuild
    /// the index. Returns the exposed accessories sorted by name.
    ///
    /// Accessories already known by id are kept and refreshed from the
    /// listing rather than rebuilt. A root that fails to load is logged
    /// and skipped; discovery fails only if every root fails.
    pub async fn discover(&self) -> Result<Vec<Arc<Accessory>>, CoreError> {
        let mut roots = vec![DEVICES_ROOT];
        if self.config.include_actions {
            roots.push(ACTIONS_ROOT);
        }

        let mut found: IndexMap<String, Arc<Accessory>> = IndexMap::new();
        let mut first_error = None;
        let mut loaded = 0_usize;

        for root in roots {
            match self.channel.request_json(root, Method::Get, Params::new()).await {
                Ok(listing) => {
                    loaded += 1;
                    self.add_listing(root, &listing, &mut found);
                }
                Err(e) => {
                    warn!(root, error = %e, "failed to list Indigo items");
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        if loaded == 0 {
            if let Some(e) = first_error {
                return Err(e.into());
            }
        }

        if found.len() > MAX_ACCESSORIES {
            warn!(
                found = found.len(),
                limit = MAX_ACCESSORIES,
                "too many accessories; exposing only the first {MAX_ACCESSORIES} discovered. \
                 Use include_ids or exclude_ids to filter the list"
            );
            found.truncate(MAX_ACCESSORIES);
        }

        info!(count = found.len(), "accessories discovered");

        let mut sorted: Vec<Arc<Accessory>> = found.values().cloned().collect();
        sorted.sort_by_cached_key(|a| a.name());

        *self
            .accessories
            .write()
            .unwrap_or_else(PoisonError::into_inner) = found;

        Ok(sorted)
    }

    fn add_listing(&self, root: &str, listing: &Value, found: &mut IndexMap<String, Arc<Accessory>>) {
        let Some(items) = listing.as_array() else {
            warn!(root, "Indigo listing is not an array");
            return;
        };

        for item in items {
            let Some(item) = item.as_object() else { continue };
            let Some(id) = DeviceState::from_snapshot(item).id() else {
                debug!(root, "skipping listing entry without an id");
                continue;
            };

            if !self.config.includes(&id) {
                debug!(id, "ignoring excluded id");
                continue;
            }

            if let Some(existing) = self.get(&id) {
                existing.apply_remote(item);
                found.insert(id, existing);
                continue;
            }

            let Some(kind) = classify(item, &self.config) else {
                debug!(
                    id,
                    device_type = item.get("type").and_then(serde_json::Value::as_str).unwrap_or("?"),
                    "ignoring unknown accessory type"
                );
                continue;
            };

            let device_url = item
                .get("href")
                .or_else(|| item.get("restURL"))
                .and_then(Value::as_str)
                .map_or_else(|| format!("{root}/{id}"), str::to_owned);

            let accessory = Accessory::new(
                kind,
                device_url,
                item,
                self.channel.clone(),
                Arc::clone(&self.sink),
                Arc::clone(&self.config),
            );
            debug!(id, name = %accessory.name(), %kind, "accessory created");
            found.insert(id, Arc::new(accessory));
        }
    }

    /// Look up an accessory by Indigo id.
    pub fn get(&self, id: &str) -> Option<Arc<Accessory>> {
        self.accessories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Exposed accessories, sorted by name.
    pub fn accessories(&self) -> Vec<Arc<Accessory>> {
        let mut list: Vec<_> = self
            .accessories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        list.sort_by_cached_key(|a| a.name());
        list
    }

    pub fn len(&self) -> usize {
        self.accessories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Indigo says a device changed: re-fetch it and propagate.
    pub async fn route_inbound_refresh(&self, id: &str) -> Result<Vec<PropertyChange>, CoreError> {
        let accessory = self.lookup(id)?;
        info!(id, name = %accessory.name(), "inbound refresh");
        accessory.refresh_status().await
    }

    /// Indigo pushed a property bag: merge it and propagate, no fetch.
    pub fn route_inbound_push(
        &self,
        id: &str,
        props: &Map<String, Value>,
    ) -> Result<Vec<PropertyChange>, CoreError> {
        let accessory = self.lookup(id)?;
        info!(id, name = %accessory.name(), "inbound push");
        Ok(accessory.apply_remote(props))
    }

    fn lookup(&self, id: &str) -> Result<Arc<Accessory>, CoreError> {
        self.get(id).ok_or_else(|| {
            warn!(id, "inbound update for unknown device");
            CoreError::NotFound { id: id.to_owned() }
        })
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("accessories", &self.len())
            .finish_non_exhaustive()
    }
}
