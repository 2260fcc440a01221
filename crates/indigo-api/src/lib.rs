// indigo-api: Async Rust client for the Indigo REST API.
//
// Every outbound request funnels through a single `RequestQueue` so the
// Indigo server never sees more than one request in flight.

pub mod client;
pub mod error;
pub mod queue;
pub mod transport;

pub use client::{IndigoClient, Method, Params};
pub use error::Error;
pub use queue::RequestQueue;
pub use transport::{BasicAuth, TlsMode, TransportConfig};
