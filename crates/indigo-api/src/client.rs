// Indigo REST HTTP client
//
// Wraps `reqwest::Client` with Indigo-specific URL construction and
// status handling. Knows nothing about ordering: callers go through
// `RequestQueue`, which owns the only instance in a running bridge.

use std::fmt;

use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::transport::{BasicAuth, TransportConfig};

/// The request verbs the Indigo REST API understands.
///
/// `Execute` is Indigo's own verb for running an action group; it is sent
/// as the literal HTTP method `EXECUTE` with no body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Method {
    Get,
    Put,
    Execute,
}

impl Method {
    fn to_http(self) -> Result<reqwest::Method, Error> {
        match self {
            Self::Get => Ok(reqwest::Method::GET),
            Self::Put => Ok(reqwest::Method::PUT),
            Self::Execute => reqwest::Method::from_bytes(b"EXECUTE")
                .map_err(|e| Error::InvalidMethod(e.to_string())),
        }
    }
}

/// Ordered query-string parameters for a request.
///
/// Indigo takes device updates as query parameters on a PUT
/// (`PUT /devices/123?brightness=60`), so values are kept as strings in
/// insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<(String, String)>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace a parameter.
    pub fn insert(&mut self, key: impl Into<String>, value: impl ToString) {
        let key = key.into();
        let value = value.to_string();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (k, v)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("&")?;
            }
            write!(f, "{k}={v}")?;
        }
        Ok(())
    }
}

/// Raw HTTP client for the Indigo REST API.
///
/// `base_url` already includes any configured path prefix
/// (`http://indigo.local:8176/proxy`); request paths are appended to it
/// verbatim and always start with `/`.
pub struct IndigoClient {
    http: reqwest::Client,
    base_url: Url,
    auth: Option<BasicAuth>,
}

impl IndigoClient {
    /// Create a client from a `TransportConfig`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            auth: transport.auth.clone(),
        })
    }

    /// Create a client with a pre-built `reqwest::Client` and no credentials.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            auth: None,
        }
    }

    /// The server base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build the full URL for a path relative to the base URL.
    pub fn url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let full = if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        };
        Ok(Url::parse(&full)?)
    }

    /// Send one request and return the raw response body.
    pub async fn send(&self, path: &str, method: Method, params: &Params) -> Result<String, Error> {
        let url = self.url(path)?;
        debug!(%method, %url, params = %params, "indigo request");

        let mut builder = self.http.request(method.to_http()?, url);
        if !params.is_empty() {
            builder = builder.query(&params.0);
        }
        if let Some(ref auth) = self.auth {
            builder = auth.apply(builder);
        }

        let resp = builder.send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            return Err(Error::Http {
                status: status.as_u16(),
                path: path.to_owned(),
                body: body.chars().take(200).collect(),
            });
        }

        trace!(path, bytes = body.len(), "indigo response");
        Ok(body)
    }
}
