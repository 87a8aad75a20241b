//! Message Relay Endpoint
//!
//! Every path accepts the same contract: `OPTIONS` answers CORS
//! preflights, `POST` relays a `{ "to", "message" }` payload to the
//! provider. Every response carries the CORS headers.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, error, warn};

use notify_core::{MessageRelay, RelayError, SendReceipt, SendRequest, MISSING_FIELDS_MESSAGE};

use crate::metrics::RelayMetrics;
use crate::rate_limit::RateLimiter;

/// Headers a browser client may send on the relay request.
pub const CORS_ALLOW_HEADERS: &str = "authorization, x-client-info, apikey, content-type";

pub const SEND_FAILED_MESSAGE: &str = "Failed to send WhatsApp message";
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Shared state for the relay endpoint.
#[derive(Clone)]
pub struct RelayState {
    pub relay: Arc<MessageRelay>,
    pub metrics: RelayMetrics,
    pub rate_limiter: Arc<RateLimiter>,
    pub max_body_bytes: usize,
    /// Key rate limiting on `X-Forwarded-For` instead of the peer address.
    /// Only safe behind a proxy that overwrites the header.
    pub trust_forwarded_for: bool,
}

/// Body of a successful send.
#[derive(Serialize)]
struct SendSuccess {
    success: bool,
    #[serde(flatten)]
    receipt: SendReceipt,
}

/// Creates the relay router. All paths route to the same handler.
pub fn create_relay_router(state: RelayState) -> Router {
    Router::new().fallback(dispatch).with_state(state)
}

async fn dispatch(State(state): State<RelayState>, request: Request) -> Response {
    let method = request.method().clone();
    let response = if method == Method::OPTIONS {
        handle_preflight()
    } else if method == Method::POST {
        handle_send(&state, request).await
    } else {
        json_response(
            StatusCode::METHOD_NOT_ALLOWED,
            json!({ "error": "Method not allowed" }),
        )
    };
    with_cors(response)
}

/// Preflight: 200 with no body. CORS headers are added by the caller.
fn handle_preflight() -> Response {
    StatusCode::OK.into_response()
}

async fn handle_send(state: &RelayState, request: Request) -> Response {
    let client = client_key(&request, state.trust_forwarded_for);
    if !state.rate_limiter.consume(&client) {
        state.metrics.rate_limited.inc();
        warn!(client = %client, "Rate limit exceeded");
        return json_response(
            StatusCode::TOO_MANY_REQUESTS,
            json!({ "error": "Too many requests" }),
        );
    }
    state.metrics.requests_total.inc();

    let bytes = match axum::body::to_bytes(request.into_body(), state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(client = %client, error = %e, "Request body rejected");
            return json_response(
                StatusCode::PAYLOAD_TOO_LARGE,
                json!({ "error": "Request body too large" }),
            );
        }
    };

    let send_request = match SendRequest::from_json(&bytes) {
        Ok(req) => req,
        Err(e) => {
            state.metrics.internal_failures.inc();
            error!(client = %client, error = %e, "Malformed request body");
            return internal_error();
        }
    };

    let started = Instant::now();
    let result = state.relay.send(send_request).await;
    if !matches!(result, Err(RelayError::Validation(_))) {
        state
            .metrics
            .provider_latency
            .observe(started.elapsed().as_secs_f64());
    }

    match result {
        Ok(receipt) => {
            state.metrics.messages_sent.inc();
            (
                StatusCode::OK,
                Json(SendSuccess {
                    success: true,
                    receipt,
                }),
            )
                .into_response()
        }
        Err(e) => error_response(&state.metrics, e),
    }
}

fn error_response(metrics: &RelayMetrics, err: RelayError) -> Response {
    match err {
        RelayError::Validation(e) => {
            metrics.validation_failures.inc();
            warn!(missing = ?e.missing_fields(), "Send request missing required fields");
            json_response(
                StatusCode::BAD_REQUEST,
                json!({
                    "error": MISSING_FIELDS_MESSAGE,
                    "missing": e.missing_fields(),
                }),
            )
        }
        RelayError::Provider { status, details } => {
            metrics.provider_failures.inc();
            json_response(
                provider_status(status),
                json!({
                    "error": SEND_FAILED_MESSAGE,
                    "details": details,
                }),
            )
        }
        other => {
            metrics.internal_failures.inc();
            // Cause already logged where the provider call ran
            debug!(error = %other, "Relay failed");
            internal_error()
        }
    }
}

/// Provider error status passed through to the caller; anything outside
/// 4xx/5xx becomes 502.
fn provider_status(status: u16) -> StatusCode {
    match StatusCode::from_u16(status) {
        Ok(code) if code.is_client_error() || code.is_server_error() => code,
        _ => StatusCode::BAD_GATEWAY,
    }
}

fn internal_error() -> Response {
    json_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "error": INTERNAL_ERROR_MESSAGE }),
    )
}

fn json_response(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

fn with_cors(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(CORS_ALLOW_HEADERS),
    );
    response
}

/// Identifies the client for rate limiting: the peer address, or the
/// first `X-Forwarded-For` entry when `trust_forwarded_for` is set.
/// Falls back to `unknown`.
fn client_key(request: &Request, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for {
        let forwarded = request
            .headers()
            .get("x-forwarded-for")
            .and_then(|h| h.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        if let Some(addr) = forwarded {
            return addr.to_string();
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
