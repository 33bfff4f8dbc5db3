// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access.
//!
//! The variable name constants are generated by `build.rs` and live in the
//! [`vars`] submodule. Environment values override `offsync.toml`.

use std::path::PathBuf;

/// Generated environment variable name constants.
pub mod vars {
    include!(concat!(env!("OUT_DIR"), "/env_vars.rs"));
}

/// Returns the value of `OFFSYNC_DATA_DIR` if set and non-empty.
pub fn data_dir() -> Option<PathBuf> {
    non_empty(vars::OFFSYNC_DATA_DIR).map(PathBuf::from)
}

/// Returns the value of `OFFSYNC_SERVER_URL` if set and non-empty.
pub fn server_url() -> Option<String> {
    non_empty(vars::OFFSYNC_SERVER_URL)
}

/// Returns the value of `OFFSYNC_AUTH_TOKEN` if set and non-empty.
pub fn auth_token() -> Option<String> {
    non_empty(vars::OFFSYNC_AUTH_TOKEN)
}

fn non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
