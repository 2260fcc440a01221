// ── Core error types ──
//
// Errors surfaced to the host runtime and the CLI. Consumers never see
// reqwest or serde_json errors directly: the `From<indigo_api::Error>`
// impl folds them into the transport and parse classes.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Channel errors ───────────────────────────────────────────────
    #[error("Cannot reach Indigo server: {message}")]
    Transport {
        message: String,
        /// HTTP status code, when the server answered at all.
        status: Option<u16>,
    },

    #[error("Malformed response from Indigo: {message}")]
    Parse { message: String, body: String },

    // ── Capability errors ────────────────────────────────────────────
    #[error("{accessory} does not support {capability}")]
    UnsupportedCapability {
        accessory: String,
        capability: String,
    },

    #[error("{capability} value {value} is outside {min}..={max}")]
    OutOfRange {
        capability: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Invalid value for {capability}: {reason}")]
    InvalidValue { capability: String, reason: String },

    #[error("{accessory} has no '{key}' in its device state")]
    MissingProperty { accessory: String, key: String },

    // ── Lookup errors ────────────────────────────────────────────────
    #[error("Device not found: {id}")]
    NotFound { id: String },
}

impl CoreError {
    /// True for the transport class (no usable answer from the server).
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<indigo_api::Error> for CoreError {
    fn from(err: indigo_api::Error) -> Self {
        match err {
            indigo_api::Error::Deserialization { message, body } => {
                CoreError::Parse { message, body }
            }
            indigo_api::Error::Http { status, path, body } => {
                let message = if body.is_empty() {
                    format!("HTTP {status} for {path}")
                } else {
                    format!("HTTP {status} for {path}: {body}")
                };
                CoreError::Transport {
                    message,
                    status: Some(status),
                }
            }
            indigo_api::Error::Transport(ref e) => CoreError::Transport {
                message: err.to_string(),
                status: e.status().map(|s| s.as_u16()),
            },
            other => CoreError::Transport {
                message: other.to_string(),
                status: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialization_maps_to_parse_with_body() {
        let err: CoreError = indigo_api::Error::Deserialization {
            message: "expected value".into(),
            body: "<html>".into(),
        }
        .into();
        assert!(matches!(err, CoreError::Parse { ref body, .. } if body == "<html>"));
        assert!(!err.is_transport());
    }

    #[test]
    fn http_status_maps_to_transport() {
        let err: CoreError = indigo_api::Error::Http {
            status: 503,
            path: "/devices".into(),
            body: String::new(),
        }
        .into();
        assert!(matches!(err, CoreError::Transport { status: Some(503), .. }));
        assert_eq!(err.to_string(), "Cannot reach Indigo server: HTTP 503 for /devices");
    }

    #[test]
    fn closed_channel_maps_to_transport() {
        let err: CoreError = indigo_api::Error::ChannelClosed.into();
        assert!(err.is_transport());
    }
}
