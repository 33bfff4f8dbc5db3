// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Bearer token authentication against the `sessions` table.

use axum::http::{header, HeaderMap};
use tracing::{debug, error};

use crate::error::ApiError;
use crate::state::ServerState;

/// Extracts the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return None;
    }
    Some(token)
}

/// Resolves the request's bearer token to a user id.
pub async fn authenticate(state: &ServerState, headers: &HeaderMap) -> Result<String, ApiError> {
    let Some(token) = bearer_token(headers) else {
        debug!("request without bearer token");
        return Err(ApiError::Unauthorized);
    };
    match state.resolve_session(token).await {
        Ok(Some(user_id)) => Ok(user_id),
        Ok(None) => {
            debug!("unknown bearer token");
            Err(ApiError::Unauthorized)
        }
        Err(e) => {
            error!(error = %e, "session lookup failed");
            Err(ApiError::Internal)
        }
    }
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
