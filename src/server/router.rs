//! Router and dispatch handler.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request as HttpRequest, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::request::Request;
use crate::result::{ActionResult, ResponseBuffer};
use crate::routing::RouteManager;
use crate::session::MIN_SWEEP_INTERVAL;

/// Largest request body read before answering 413.
pub const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

#[derive(Clone)]
struct DispatchState {
    manager: Arc<RouteManager>,
    max_body_bytes: usize,
}

/// Create the router serving every path through `manager`.
pub fn create_router(manager: Arc<RouteManager>) -> Router {
    create_router_with_limit(manager, DEFAULT_MAX_BODY_BYTES)
}

/// Create the router with an explicit request body limit.
pub fn create_router_with_limit(manager: Arc<RouteManager>, max_body_bytes: usize) -> Router {
    let state = DispatchState {
        manager,
        max_body_bytes,
    };

    Router::new()
        .fallback(dispatch)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn dispatch(State(state): State<DispatchState>, request: HttpRequest) -> Response {
    let (parts, body) = request.into_parts();

    let body = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(path = parts.uri.path(), "Rejecting request body: {}", e);
            return (StatusCode::PAYLOAD_TOO_LARGE, "Payload Too Large").into_response();
        }
    };

    let mut buffer = ResponseBuffer::new();
    let request = Request::from_parts(&parts, body.to_vec());

    match state.manager.handle_request(&mut buffer, request).await {
        Ok(()) => buffer.into_response(),
        Err(e) => {
            error!(path = parts.uri.path(), "Dispatch failed: {}", e);
            ActionResult::internal_error().into_response()
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Finish in-flight requests on shutdown.
    pub graceful_shutdown: bool,
    /// How often expired sessions are swept.
    pub sweep_interval: Duration,
    /// Largest accepted request body.
    pub max_body_bytes: usize,
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    pub fn without_graceful_shutdown(mut self) -> Self {
        self.graceful_shutdown = false;
        self
    }

    /// Periods shorter than [`MIN_SWEEP_INTERVAL`] are raised to it.
    pub fn with_sweep_interval(mut self, every: Duration) -> Self {
        self.sweep_interval = every.max(MIN_SWEEP_INTERVAL);
        self
    }

    pub fn with_max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            graceful_shutdown: true,
            sweep_interval: Duration::from_secs(60),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}
