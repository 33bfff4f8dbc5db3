// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Capped exponential backoff between failed sync cycles.

use std::cmp;
use std::time::Duration;

/// Default delay before the first retry.
pub const INITIAL_BACKOFF: Duration = Duration::from_millis(2_000);

/// Default upper bound on the retry delay.
pub const MAX_BACKOFF: Duration = Duration::from_millis(60_000);

/// Delay doubles per consecutive failure up to `max`; a success resets it.
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    current: Duration,
    failures: u32,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        let initial = cmp::min(initial, max);
        Backoff {
            initial,
            max,
            current: initial,
            failures: 0,
        }
    }

    /// Records a failure and returns the delay to wait before retrying.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = cmp::min(self.current.saturating_mul(2), self.max);
        self.failures = self.failures.saturating_add(1);
        delay
    }

    /// Delay the next failure will be given.
    pub fn current(&self) -> Duration {
        self.current
    }

    /// Failures since the last reset.
    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn reset(&mut self) {
        self.current = self.initial;
        self.failures = 0;
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Backoff::new(INITIAL_BACKOFF, MAX_BACKOFF)
    }
}

#[cfg(test)]
#[path = "backoff_tests.rs"]
mod tests;
