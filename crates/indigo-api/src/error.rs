use thiserror::Error;

/// Top-level error type for the `indigo-api` crate.
///
/// `Transport`, `Http` and `ChannelClosed` are the transport class: the
/// request never produced a usable answer. `Deserialization` means the
/// server answered but the body was not valid JSON. `indigo-core` maps
/// these into its own taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// The server answered with a non-success status.
    #[error("Indigo returned HTTP {status} for {path}")]
    Http {
        status: u16,
        path: String,
        body: String,
    },

    /// The HTTP method could not be encoded.
    #[error("Invalid HTTP method: {0}")]
    InvalidMethod(String),

    /// The request queue worker has stopped.
    #[error("Request queue is closed")]
    ChannelClosed,

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the server reported the resource as missing.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Http { status: 404, .. } => true,
            _ => false,
        }
    }

    /// Returns `true` if the failure happened after a response arrived
    /// but its body could not be parsed.
    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Deserialization { .. })
    }
}
