// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

// Allow unused items: test helpers are shared across multiple test binaries,
// and not every test file uses every helper.
#![allow(dead_code)]
#![allow(unused_imports)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;

pub use predicates::prelude::*;
pub use tempfile::TempDir;

/// `offsync` bound to `temp` as its data directory, isolated from the
/// caller's environment.
pub fn offsync(temp: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("offsync");
    cmd.arg("--data-dir")
        .arg(temp.path())
        .env_remove("OFFSYNC_DATA_DIR")
        .env_remove("OFFSYNC_SERVER_URL")
        .env_remove("OFFSYNC_AUTH_TOKEN")
        .env_remove("RUST_LOG");
    cmd
}

/// Queues a draft for `attempt` and returns stdout.
pub fn queue_draft(temp: &TempDir, attempt: &str, content: &str) -> String {
    let output = offsync(temp)
        .args(["draft", attempt, "--content", content])
        .output()
        .unwrap();
    assert!(output.status.success());
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Runs `status -o json` and parses the result.
pub fn status_json(temp: &TempDir) -> serde_json::Value {
    let output = offsync(temp).args(["status", "-o", "json"]).output().unwrap();
    assert!(output.status.success());
    serde_json::from_slice(&output.stdout).unwrap()
}
