//! HTTP listener for Indigo change notifications.
//!
//! Indigo (or a trigger script running inside it) calls back when a device
//! changes. `GET /devices/:id` asks the bridge to re-fetch the device;
//! `POST /devices/:id` hands over the changed properties directly.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::Path;
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use indigo_core::{CoreError, PropertyChange, Registry};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

type Rejection = (StatusCode, String);

/// Reply body for both routes.
#[derive(Debug, Serialize)]
pub struct InboundReply {
    pub id: String,
    pub changed: Vec<PropertyChange>,
}

/// Build the HTTP router.
pub fn build_router(registry: Arc<Registry>) -> Router {
    Router::new()
        .route("/devices/:id", get(refresh_handler).post(push_handler))
        .layer(Extension(registry))
}

/// Bind `0.0.0.0:<port>`.
pub async fn bind(port: u16) -> std::io::Result<TcpListener> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "listening for Indigo change notifications");
    Ok(listener)
}

/// Serve on a bound listener until `shutdown` fires.
pub async fn serve(
    listener: TcpListener,
    registry: Arc<Registry>,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    axum::serve(listener, build_router(registry))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}

async fn refresh_handler(
    Extension(registry): Extension<Arc<Registry>>,
    Path(id): Path<String>,
) -> Result<Json<InboundReply>, Rejection> {
    let changed = registry
        .route_inbound_refresh(&id)
        .await
        .map_err(reject)?;
    Ok(Json(InboundReply { id, changed }))
}

async fn push_handler(
    Extension(registry): Extension<Arc<Registry>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<InboundReply>, Rejection> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    let props = parse_body(content_type, &body).map_err(|reason| {
        warn!(id, %reason, "rejected inbound push");
        (StatusCode::BAD_REQUEST, reason)
    })?;

    let changed = registry.route_inbound_push(&id, &props).map_err(reject)?;
    Ok(Json(InboundReply { id, changed }))
}

fn reject(err: CoreError) -> Rejection {
    match err {
        CoreError::NotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        other => (StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
    }
}

// ── Body parsing ─────────────────────────────────────────────────────

/// A JSON object, or a urlencoded form whose values are coerced to
/// booleans and numbers where they parse as such.
fn parse_body(content_type: Option<&str>, body: &str) -> Result<Map<String, Value>, String> {
    if content_type.is_some_and(|ct| ct.starts_with(FORM_CONTENT_TYPE)) {
        return Ok(parse_form(body));
    }

    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err("expected a JSON object of device properties".into()),
        Err(e) => Err(format!("invalid JSON body: {e}")),
    }
}

fn parse_form(body: &str) -> Map<String, Value> {
    url::form_urlencoded::parse(body.as_bytes())
        .map(|(k, v)| (k.into_owned(), coerce(&v)))
        .collect()
}

fn coerce(raw: &str) -> Value {
    match raw {
        "true" | "True" => Value::Bool(true),
        "false" | "False" => Value::Bool(false),
        _ => raw
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map_or_else(|| Value::String(raw.to_owned()), Value::from),
    }
}
