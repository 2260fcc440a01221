//! Configuration for the Indigo accessory bridge.
//!
//! One TOML file plus `INDIGO_*` environment overrides, credential
//! resolution (env var, keyring, plaintext), and translation into the
//! `ServerConfig` and `BridgeConfig` the runtime crates take.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

use indigo_api::{BasicAuth, TlsMode, TransportConfig};
use indigo_core::BridgeConfig;

const KEYRING_SERVICE: &str = "indigo-bridge";
const ENV_PREFIX: &str = "INDIGO_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no Indigo host configured (set `host` in {path} or INDIGO_HOST)")]
    MissingHost { path: String },

    #[error("no password found for user '{username}' on {host}")]
    NoCredentials { username: String, host: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config ─────────────────────────────────────────────────────

/// The bridge configuration file.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// `http` or `https`.
    pub protocol: String,
    pub host: Option<String>,
    pub port: u16,
    /// Path prefix when Indigo sits behind a reverse proxy.
    pub path: String,

    pub username: Option<String>,
    /// Plaintext password. Prefer `password_env` or the keyring.
    pub password: Option<String>,
    /// Environment variable holding the password.
    pub password_env: Option<String>,

    /// Accept self-signed certificates.
    pub insecure: bool,
    /// Extra CA certificate (PEM) to trust.
    pub ca_cert: Option<PathBuf>,
    pub timeout_secs: u64,

    pub include_actions: bool,
    #[serde(deserialize_with = "opt_ids")]
    pub include_ids: Option<Vec<String>>,
    #[serde(deserialize_with = "ids")]
    pub exclude_ids: Vec<String>,

    #[serde(deserialize_with = "ids")]
    pub treat_as_switch_ids: Vec<String>,
    #[serde(deserialize_with = "ids")]
    pub treat_as_lock_ids: Vec<String>,
    #[serde(deserialize_with = "ids")]
    pub treat_as_door_ids: Vec<String>,
    #[serde(deserialize_with = "ids")]
    pub treat_as_garage_door_ids: Vec<String>,
    #[serde(deserialize_with = "ids")]
    pub treat_as_window_ids: Vec<String>,
    #[serde(deserialize_with = "ids")]
    pub treat_as_window_covering_ids: Vec<String>,

    pub thermostats_in_celsius: bool,
    pub accessory_name_prefix: String,

    /// Port for Indigo's change notifications. No listener when unset.
    pub listen_port: Option<u16>,
    pub settle_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            protocol: "http".into(),
            host: None,
            port: 8176,
            path: String::new(),
            username: None,
            password: None,
            password_env: None,
            insecure: false,
            ca_cert: None,
            timeout_secs: 30,
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
            listen_port: None,
            settle_delay_ms: 1000,
        }
    }
}

// Device ids may be written as numbers or strings; they are compared as strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Int(i64),
    Text(String),
}

impl From<IdRepr> for String {
    fn from(id: IdRepr) -> Self {
        match id {
            IdRepr::Int(n) => n.to_string(),
            IdRepr::Text(s) => s,
        }
    }
}

fn ids<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    Vec::<IdRepr>::deserialize(d).map(|v| v.into_iter().map(String::from).collect())
}

fn opt_ids<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<String>>, D::Error> {
    Option::<Vec<IdRepr>>::deserialize(d)
        .map(|v| v.map(|list| list.into_iter().map(String::from).collect()))
}

/// Connection settings for the request queue.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub base_url: Url,
    pub transport: TransportConfig,
}

impl Config {
    /// Indigo base URL, including any path prefix.
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        let host = self.host.as_deref().ok_or_else(|| ConfigError::MissingHost {
            path: config_path().display().to_string(),
        })?;

        if !matches!(self.protocol.as_str(), "http" | "https") {
            return Err(ConfigError::Validation {
                field: "protocol".into(),
                reason: format!("expected 'http' or 'https', got '{}'", self.protocol),
            });
        }

        let path = self.path.trim_end_matches('/');
        let path = if path.is_empty() || path.starts_with('/') {
            path.to_owned()
        } else {
            format!("/{path}")
        };

        let raw = format!("{}://{host}:{}{path}", self.protocol, self.port);
        raw.parse().map_err(|_| ConfigError::Validation {
            field: "host".into(),
            reason: format!("invalid URL: {raw}"),
        })
    }

    /// Resolve the password: `password_env`, then the keyring entry for
    /// the host, then the plaintext `password`.
    pub fn resolve_password(&self) -> Result<Option<SecretString>, ConfigError> {
        let Some(ref username) = self.username else {
            return Ok(None);
        };
        let host = self.host.clone().unwrap_or_default();

        if let Some(ref env_name) = self.password_env {
            if let Ok(val) = std::env::var(env_name) {
                debug!(env = %env_name, "password from environment");
                return Ok(Some(SecretString::from(val)));
            }
        }

        if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &host) {
            if let Ok(secret) = entry.get_password() {
                debug!("password from keyring");
                return Ok(Some(SecretString::from(secret)));
            }
        }

        if let Some(ref pw) = self.password {
            return Ok(Some(SecretString::from(pw.clone())));
        }

        Err(ConfigError::NoCredentials {
            username: username.clone(),
            host,
        })
    }

    pub fn transport(&self) -> Result<TransportConfig, ConfigError> {
        let tls = if self.insecure {
            TlsMode::DangerAcceptInvalid
        } else if let Some(ref ca) = self.ca_cert {
            TlsMode::CustomCa(ca.clone())
        } else {
            TlsMode::System
        };

        let mut transport = TransportConfig {
            tls,
            timeout: Duration::from_secs(self.timeout_secs),
            auth: None,
        };
        if let (Some(username), Some(password)) = (&self.username, self.resolve_password()?) {
            transport = transport.with_auth(BasicAuth::new(username.clone(), password));
        }
        Ok(transport)
    }

    pub fn server_config(&self) -> Result<ServerConfig, ConfigError> {
        Ok(ServerConfig {
            base_url: self.base_url()?,
            transport: self.transport()?,
        })
    }

    pub fn bridge_config(&self) -> BridgeConfig {
        BridgeConfig {
            include_actions: self.include_actions,
            include_ids: self.include_ids.clone(),
            exclude_ids: self.exclude_ids.clone(),
            treat_as_switch_ids: self.treat_as_switch_ids.clone(),
            treat_as_lock_ids: self.treat_as_lock_ids.clone(),
            treat_as_door_ids: self.treat_as_door_ids.clone(),
            treat_as_garage_door_ids: self.treat_as_garage_door_ids.clone(),
            treat_as_window_ids: self.treat_as_window_ids.clone(),
            treat_as_window_covering_ids: self.treat_as_window_covering_ids.clone(),
            thermostats_in_celsius: self.thermostats_in_celsius,
            accessory_name_prefix: self.accessory_name_prefix.clone(),
            settle_delay: Duration::from_millis(self.settle_delay_ms),
        }
    }

    /// A copy safe to print.
    pub fn redacted(&self) -> Self {
        Self {
            password: self.password.as_ref().map(|_| "********".into()),
            ..self.clone()
        }
    }
}

/// Store the password for `host` in the system keyring, where
/// [`Config::resolve_password`] looks for it.
pub fn store_password(host: &str, password: &str) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, host).map_err(|e| ConfigError::Validation {
        field: "keyring".into(),
        reason: format!("failed to access keyring: {e}"),
    })?;
    entry
        .set_password(password)
        .map_err(|e| ConfigError::Validation {
            field: "keyring".into(),
            reason: format!("failed to store password: {e}"),
        })
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "indigo-bridge", "indigo-bridge").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("indigo-bridge");
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// The provider stack: defaults, then the TOML file, then `INDIGO_*`.
pub fn figment(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX))
}

/// Load the config from a file (missing files are fine) plus environment.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let config: Config = figment(path).extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Write a starter config file. Refuses to overwrite an existing one.
pub fn write_starter(path: &Path, host: &str) -> Result<(), ConfigError> {
    if path.exists() {
        return Err(ConfigError::Validation {
            field: "path".into(),
            reason: format!("{} already exists", path.display()),
        });
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let config = Config {
        host: Some(host.to_owned()),
        ..Config::default()
    };
    std::fs::write(path, toml::to_string_pretty(&config)?)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    fn from_toml(s: &str) -> Config {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::string(s))
            .extract()
            .unwrap()
    }

    #[test]
    fn defaults_fill_missing_keys() {
        let config = from_toml(r#"host = "indigo.local""#);
        assert_eq!(config.port, 8176);
        assert_eq!(config.protocol, "http");
        assert_eq!(config.settle_delay_ms, 1000);
        assert_eq!(config.listen_port, None);
        assert_eq!(config.base_url().unwrap().as_str(), "http://indigo.local:8176/");
    }

    #[test]
    fn path_prefix_loses_trailing_slash() {
        let config = from_toml(
            r#"
            host = "indigo.local"
            protocol = "https"
            port = 443
            path = "/proxy/"
            "#,
        );
        assert_eq!(config.base_url().unwrap().as_str(), "https://indigo.local/proxy");
    }

    #[test]
    fn ids_accept_numbers_and_strings() {
        let config = from_toml(
            r#"
            host = "indigo.local"
            include_ids = [12345, "678"]
            treat_as_lock_ids = [42]
            "#,
        );
        assert_eq!(config.include_ids, Some(vec!["12345".into(), "678".into()]));
        assert_eq!(config.bridge_config().treat_as_lock_ids, vec!["42".to_owned()]);
    }

    #[test]
    fn missing_host_is_reported() {
        let config = Config::default();
        assert!(matches!(config.base_url(), Err(ConfigError::MissingHost { .. })));
    }

    #[test]
    fn bad_protocol_is_rejected() {
        let config = from_toml(
            r#"
            host = "indigo.local"
            protocol = "ftp"
            "#,
        );
        assert!(matches!(config.base_url(), Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn bridge_config_carries_settle_delay() {
        let config = from_toml(
            r#"
            host = "indigo.local"
            settle_delay_ms = 250
            thermostats_in_celsius = true
            "#,
        );
        let bridge = config.bridge_config();
        assert_eq!(bridge.settle_delay, Duration::from_millis(250));
        assert!(bridge.thermostats_in_celsius);
    }

    #[test]
    fn no_username_means_no_auth() {
        let config = from_toml(r#"host = "indigo.local""#);
        assert!(config.transport().unwrap().auth.is_none());
    }

    #[test]
    fn plaintext_password_is_the_last_resort() {
        let config = from_toml(
            r#"
            host = "no-such-keyring-host.invalid"
            username = "admin"
            password = "hunter2"
            password_env = "INDIGO_BRIDGE_TEST_UNSET_PASSWORD"
            "#,
        );
        let pw = config.resolve_password().unwrap().unwrap();
        assert_eq!(pw.expose_secret(), "hunter2");
    }

    #[test]
    fn redaction_hides_the_password() {
        let config = from_toml(
            r#"
            host = "indigo.local"
            username = "admin"
            password = "hunter2"
            "#,
        );
        assert_eq!(config.redacted().password.as_deref(), Some("********"));
    }

    #[test]
    fn starter_file_round_trips_and_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        write_starter(&path, "indigo.local").unwrap();
        let loaded: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&path))
            .extract()
            .unwrap();

        assert_eq!(loaded.host.as_deref(), Some("indigo.local"));
        assert!(write_starter(&path, "other").is_err());
    }
}
