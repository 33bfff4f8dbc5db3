// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

//! Test infrastructure for command testing without a data directory.
//!
//! `TestContext` wraps a [`Context`] over an in-memory store and default
//! config, so command logic can run without touching the user's data.

use super::Context;
use crate::config::Config;
use crate::store::LocalStore;
use std::sync::Arc;
use tempfile::TempDir;

pub struct TestContext {
    pub ctx: Context,
    _temp_dir: TempDir, // Keep alive for duration of test
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TestContext {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let data_dir = temp_dir.path().to_path_buf();
        let config = Config::default();
        let db_path = config.db_path(&data_dir);
        let store = Arc::new(LocalStore::in_memory());
        assert!(store.open(), "in-memory store should open");
        TestContext {
            ctx: Context {
                data_dir,
                config,
                db_path,
                store,
            },
            _temp_dir: temp_dir,
        }
    }
}
