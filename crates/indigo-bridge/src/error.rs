//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use indigo_config::ConfigError;
use indigo_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const UNSUPPORTED: i32 = 5;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the Indigo server")]
    #[diagnostic(
        code(indigo::connection_failed),
        help(
            "Check that Indigo's web server is running and reachable.\n\
             {reason}"
        )
    )]
    ConnectionFailed { reason: String },

    #[error("Indigo sent a response that could not be parsed")]
    #[diagnostic(
        code(indigo::bad_response),
        help("The server answered but not with JSON. Check `path` if Indigo sits behind a proxy.\n{message}")
    )]
    BadResponse { message: String },

    #[error("Indigo rejected the credentials")]
    #[diagnostic(
        code(indigo::auth_failed),
        help(
            "Set `username` in the config and store the password with:\n  \
             indigo-bridge config set-password"
        )
    )]
    AuthFailed,

    // ── Resources ────────────────────────────────────────────────────
    #[error("Accessory '{id}' not found")]
    #[diagnostic(
        code(indigo::not_found),
        help("Run: indigo-bridge list to see the exposed accessories")
    )]
    NotFound { id: String },

    #[error("{message}")]
    #[diagnostic(
        code(indigo::unsupported),
        help("Run: indigo-bridge list -o json to see each accessory's characteristics")
    )]
    Unsupported { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(indigo::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(
        code(indigo::config),
        help("Create a config with: indigo-bridge config init --server <host>")
    )]
    Config(#[from] ConfigError),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {0}")]
    #[diagnostic(code(indigo::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::BadResponse { .. } => exit_code::CONNECTION,
            Self::AuthFailed => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Unsupported { .. } => exit_code::UNSUPPORTED,
            Self::Validation { .. } | Self::Config(_) => exit_code::USAGE,
            Self::Io(_) | Self::Json(_) => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Transport {
                status: Some(401 | 302 | 303),
                ..
            } => CliError::AuthFailed,

            CoreError::Transport { message, .. } => CliError::ConnectionFailed { reason: message },

            CoreError::Parse { message, .. } => CliError::BadResponse { message },

            CoreError::NotFound { id } => CliError::NotFound { id },

            err @ (CoreError::UnsupportedCapability { .. } | CoreError::MissingProperty { .. }) => {
                CliError::Unsupported {
                    message: err.to_string(),
                }
            }

            err @ (CoreError::OutOfRange { .. } | CoreError::InvalidValue { .. }) => {
                CliError::Validation {
                    field: "value".into(),
                    reason: err.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirects_mean_bad_credentials() {
        let err: CliError = CoreError::Transport {
            message: "HTTP 302 for /devices".into(),
            status: Some(302),
        }
        .into();
        assert!(matches!(err, CliError::AuthFailed));
        assert_eq!(err.exit_code(), exit_code::AUTH);
    }

    #[test]
    fn range_errors_are_usage_errors() {
        let err: CliError = CoreError::OutOfRange {
            capability: "brightness".into(),
            value: 150.0,
            min: 0.0,
            max: 100.0,
        }
        .into();
        assert_eq!(err.exit_code(), exit_code::USAGE);
    }

    #[test]
    fn unknown_ids_are_not_found() {
        let err: CliError = CoreError::NotFound { id: "9".into() }.into();
        assert_eq!(err.exit_code(), exit_code::NOT_FOUND);
    }
}
