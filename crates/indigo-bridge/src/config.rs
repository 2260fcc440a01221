//! Config loading with CLI overrides, and construction of the runtime
//! (request queue plus registry) from it.

use std::path::PathBuf;
use std::sync::Arc;

use indigo_api::{IndigoClient, RequestQueue};
use indigo_config::Config;
use indigo_core::{CharacteristicSink, Registry};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// The config file in effect: `--config`, else the platform default.
pub fn resolve_path(global: &GlobalOpts) -> PathBuf {
    global.config.clone().unwrap_or_else(indigo_config::config_path)
}

/// Load the config file and apply `--host` / `--port`.
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    let path = resolve_path(global);
    tracing::debug!(path = %path.display(), "loading config");

    let mut cfg = indigo_config::load_config(&path)?;
    if let Some(ref host) = global.host {
        cfg.host = Some(host.clone());
    }
    if let Some(port) = global.port {
        cfg.port = port;
    }
    Ok(cfg)
}

/// Spawn the request queue and build an empty registry on top of it.
pub fn build_registry(
    cfg: &Config,
    sink: Arc<dyn CharacteristicSink>,
) -> Result<Registry, CliError> {
    let server = cfg.server_config()?;
    let client = IndigoClient::new(server.base_url, &server.transport).map_err(|e| {
        CliError::ConnectionFailed {
            reason: e.to_string(),
        }
    })?;
    let queue = RequestQueue::spawn(client);
    Ok(Registry::new(queue, cfg.bridge_config(), sink))
}
