// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod draft;
pub mod event;
pub mod status;
pub mod sync;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{resolve_data_dir, Config};
use crate::error::{Error, Result};
use crate::queue::OfflineQueue;
use crate::store::LocalStore;

/// Everything a command needs: resolved directories, config and an open store.
pub struct Context {
    pub data_dir: PathBuf,
    pub config: Config,
    pub db_path: PathBuf,
    pub store: Arc<LocalStore>,
}

impl Context {
    /// Queue over this context's store.
    pub fn queue(&self) -> OfflineQueue {
        OfflineQueue::new(Arc::clone(&self.store))
    }
}

/// Helper to resolve config and open the queue database.
///
/// The queue itself degrades silently when storage is unavailable; on the
/// command line that is reported as an error instead.
pub fn open_context(data_dir: Option<&Path>) -> Result<Context> {
    let data_dir = resolve_data_dir(data_dir);
    let config = Config::load(&data_dir)?;
    let db_path = config.db_path(&data_dir);
    let store = Arc::new(LocalStore::new(&db_path));
    if !store.open() {
        return Err(Error::StoreUnavailable(db_path.display().to_string()));
    }
    Ok(Context {
        data_dir,
        config,
        db_path,
        store,
    })
}

#[cfg(test)]
#[path = "mod_tests.rs"]
pub mod testing;
