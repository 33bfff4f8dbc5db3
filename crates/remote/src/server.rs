// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP server implementation.
//!
//! Exposes the reconciliation endpoint at [`SYNC_PATH`]. Only `POST` is
//! accepted; the body is parsed and validated by hand so every failure
//! gets the same JSON error shape.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Json, Router};
use tokio::net::TcpListener;
use tracing::{info, warn};

use offsync_core::protocol::SYNC_PATH;
use offsync_core::validate::validate_request;
use offsync_core::{ClockSource, SyncRequest, SyncResponse, SystemClock};

use crate::auth::authenticate;
use crate::error::ApiError;
use crate::reconcile::reconcile;
use crate::state::ServerState;

/// Largest accepted request body.
const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

/// Handler state: storage plus the clock used for missing timestamps.
#[derive(Clone)]
pub struct AppState {
    pub store: ServerState,
    pub clock: Arc<dyn ClockSource>,
}

impl AppState {
    pub fn new(store: ServerState) -> Self {
        AppState {
            store,
            clock: Arc::new(SystemClock),
        }
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(SYNC_PATH, post(sync_handler).fallback(method_not_allowed))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

/// Run the HTTP server on the given address until Ctrl-C.
pub async fn run(addr: SocketAddr, state: AppState) -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on: {}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

async fn sync_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SyncResponse>, ApiError> {
    let user_id = authenticate(&state.store, &headers).await?;
    let request = parse_request(&body)?;
    let response = reconcile(&state.store, &user_id, &request, state.clock.now_ms()).await;
    Ok(Json(response))
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

/// Parses and validates a batch. An empty body is an empty batch.
pub(crate) fn parse_request(body: &[u8]) -> Result<SyncRequest, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(SyncRequest::default());
    }
    let request: SyncRequest =
        serde_json::from_slice(body).map_err(|e| ApiError::InvalidPayload(vec![e.to_string()]))?;
    validate_request(&request).map_err(|e| match e {
        offsync_core::Error::InvalidBatch { issues } => ApiError::InvalidPayload(issues),
        other => ApiError::InvalidPayload(vec![other.to_string()]),
    })?;
    Ok(request)
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
