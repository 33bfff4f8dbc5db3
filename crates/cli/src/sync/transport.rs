// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Transport abstraction for batch submission.
//!
//! Provides a trait-based transport layer that enables:
//! - HTTP submission to the reconciliation endpoint for production
//! - Mock transports for unit testing

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use offsync_core::protocol::{SyncRequest, SyncResponse, SYNC_PATH};

/// Error type for transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Request never reached the server.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Request timed out.
    #[error("request timed out")]
    Timeout,

    /// Server answered with a non-success status.
    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// Client could not be built.
    #[error("invalid transport configuration: {0}")]
    Config(String),
}

impl TransportError {
    /// HTTP status, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true if the batch itself was rejected and resubmitting it
    /// can never succeed.
    ///
    /// 401 means the session lapsed, 408 and 429 mean "try later"; all
    /// other 4xx statuses reject the payload.
    pub fn is_poison(&self) -> bool {
        match self.status() {
            Some(status) => (400..500).contains(&status) && !matches!(status, 401 | 408 | 429),
            None => false,
        }
    }
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Submits sync batches to the server of record.
pub trait Transport: Send + Sync {
    /// Posts one batch and returns the server's report of what it applied.
    fn submit(
        &self,
        batch: SyncRequest,
    ) -> Pin<Box<dyn Future<Output = TransportResult<SyncResponse>> + Send + '_>>;
}

/// HTTP transport posting JSON batches with reqwest.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
    auth_token: Option<String>,
}

impl HttpTransport {
    /// Creates a transport for the server at `base_url`.
    ///
    /// With no `timeout`, requests wait as long as the connection allows.
    pub fn new(
        base_url: &str,
        auth_token: Option<String>,
        timeout: Option<Duration>,
    ) -> TransportResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| TransportError::Config(e.to_string()))?;

        Ok(HttpTransport {
            client,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), SYNC_PATH),
            auth_token,
        })
    }

    /// Full URL batches are posted to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn request_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::ConnectionFailed(e.to_string())
    }
}

impl Transport for HttpTransport {
    fn submit(
        &self,
        batch: SyncRequest,
    ) -> Pin<Box<dyn Future<Output = TransportResult<SyncResponse>> + Send + '_>> {
        Box::pin(async move {
            let mut request = self.client.post(&self.endpoint).json(&batch);
            if let Some(token) = &self.auth_token {
                request = request.bearer_auth(token);
            }

            let response = request.send().await.map_err(request_error)?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(TransportError::Status {
                    status: status.as_u16(),
                    body,
                });
            }

            let body = response.text().await.map_err(request_error)?;
            SyncResponse::from_json(&body)
                .map_err(|e| TransportError::SerializationError(e.to_string()))
        })
    }
}
