// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync orchestrator: drains the offline queue to the server.
//!
//! One cycle runs at a time per orchestrator. A cycle submits bounded
//! batches until every queued entry has been offered once, removing only
//! what the server reports applied. Entries the server leaves out are not
//! resent within the same cycle, so they never starve newer work. Failures leave the queue untouched and arm a retry timer whose
//! delay doubles per consecutive failure.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::AbortHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use offsync_core::{DraftRecord, EventRecord, SyncRequest, SyncResponse};

use super::backoff::{Backoff, INITIAL_BACKOFF, MAX_BACKOFF};
use super::signals::{HostSignal, SignalSource, SyncReason, BACKGROUND_SYNC_TAG};
use super::transport::Transport;
use crate::queue::OfflineQueue;

/// Default cap on drafts per submitted batch.
pub const MAX_DRAFTS_PER_BATCH: usize = 5;

/// Default cap on events per submitted batch.
pub const MAX_EVENTS_PER_BATCH: usize = 50;

/// Tunables for the orchestrator.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub max_drafts_per_batch: usize,
    pub max_events_per_batch: usize,
}

impl Default for SyncOptions {
    fn default() -> Self {
        SyncOptions {
            initial_backoff: INITIAL_BACKOFF,
            max_backoff: MAX_BACKOFF,
            max_drafts_per_batch: MAX_DRAFTS_PER_BATCH,
            max_events_per_batch: MAX_EVENTS_PER_BATCH,
        }
    }
}

/// Coarse orchestrator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Nothing running, no retry armed.
    Idle,
    /// A cycle is in flight.
    Syncing,
    /// Waiting on the retry timer.
    PendingRetry,
}

/// Totals for one call to [`SyncOrchestrator::sync_now`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub batches: usize,
    pub synced_drafts: usize,
    pub synced_events: usize,
    pub dropped_drafts: usize,
}

/// Result of a sync request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The queue was drained.
    Drained(CycleReport),
    /// Another cycle was running; it will pick the request up.
    Coalesced,
    /// Host reported no connectivity; a retry is armed.
    Offline { retry_in: Duration },
    /// A batch failed; remaining work stays queued and a retry is armed.
    Failed {
        report: CycleReport,
        retry_in: Duration,
        error: String,
    },
}

/// Point-in-time view of the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncStatus {
    pub state: SyncState,
    pub pending: bool,
    pub online: bool,
    pub next_backoff: Duration,
    pub consecutive_failures: u32,
}

enum CycleError {
    Offline,
    Failed(String),
}

struct Control {
    syncing: bool,
    pending: bool,
    retry: Option<AbortHandle>,
    backoff: Backoff,
    listener: Option<CancellationToken>,
    disposed: bool,
}

struct Inner<T> {
    queue: OfflineQueue,
    transport: T,
    options: SyncOptions,
    online: AtomicBool,
    control: Mutex<Control>,
}

/// Drives delivery of queued drafts and events.
pub struct SyncOrchestrator<T: Transport + 'static> {
    inner: Arc<Inner<T>>,
}

impl<T: Transport + 'static> Clone for SyncOrchestrator<T> {
    fn clone(&self) -> Self {
        SyncOrchestrator {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Transport + 'static> SyncOrchestrator<T> {
    /// Creates an idle orchestrator. Nothing runs until a sync is
    /// requested or [`SyncOrchestrator::start`] is called.
    pub fn new(queue: OfflineQueue, transport: T, options: SyncOptions) -> Self {
        let backoff = Backoff::new(options.initial_backoff, options.max_backoff);
        SyncOrchestrator {
            inner: Arc::new(Inner {
                queue,
                transport,
                options,
                online: AtomicBool::new(true),
                control: Mutex::new(Control {
                    syncing: false,
                    pending: false,
                    retry: None,
                    backoff,
                    listener: None,
                    disposed: false,
                }),
            }),
        }
    }

    pub fn queue(&self) -> &OfflineQueue {
        &self.inner.queue
    }

    pub fn is_online(&self) -> bool {
        self.inner.online.load(Ordering::SeqCst)
    }

    pub fn set_online(&self, online: bool) {
        self.inner.online.store(online, Ordering::SeqCst);
    }

    pub fn status(&self) -> SyncStatus {
        let ctl = self.control();
        let state = if ctl.syncing {
            SyncState::Syncing
        } else if ctl.retry.is_some() {
            SyncState::PendingRetry
        } else {
            SyncState::Idle
        };
        SyncStatus {
            state,
            pending: ctl.pending,
            online: self.is_online(),
            next_backoff: ctl.backoff.current(),
            consecutive_failures: ctl.backoff.failures(),
        }
    }

    /// Attaches a signal source and kicks off a startup sync.
    ///
    /// Replaces any previously attached source.
    pub fn start<S: SignalSource>(&self, mut signals: S) {
        let token = CancellationToken::new();
        {
            let mut ctl = self.control();
            ctl.disposed = false;
            if let Some(previous) = ctl.listener.replace(token.clone()) {
                previous.cancel();
            }
        }

        let this = self.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    signal = signals.next_signal() => match signal {
                        Some(signal) => this.handle_signal(signal),
                        None => break,
                    },
                }
            }
            debug!("signal listener stopped");
        });

        self.request_sync(SyncReason::Startup);
    }

    /// Detaches the signal source and clears any armed retry.
    pub fn dispose(&self) {
        let mut ctl = self.control();
        ctl.disposed = true;
        if let Some(token) = ctl.listener.take() {
            token.cancel();
        }
        if let Some(timer) = ctl.retry.take() {
            timer.abort();
        }
        debug!("orchestrator disposed");
    }

    /// Reacts to one host signal.
    pub fn handle_signal(&self, signal: HostSignal) {
        match signal {
            HostSignal::Online => {
                self.set_online(true);
                self.request_sync(SyncReason::Online);
            }
            HostSignal::Offline => self.set_online(false),
            HostSignal::BackgroundWake { tag } if tag == BACKGROUND_SYNC_TAG => {
                self.request_sync(SyncReason::BackgroundWake);
            }
            HostSignal::BackgroundWake { tag } => {
                debug!(%tag, "ignoring background wake for another tag");
            }
            HostSignal::Unloading => {
                if let Some(timer) = self.control().retry.take() {
                    timer.abort();
                    debug!("retry cleared on unload");
                }
            }
        }
    }

    /// Requests a sync without waiting for it.
    pub fn request_sync(&self, reason: SyncReason) {
        self.control().pending = true;
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(%reason, "sync requested outside a runtime");
            return;
        };
        let this = self.clone();
        runtime.spawn(async move {
            let outcome = this.sync_now(reason).await;
            debug!(%reason, ?outcome, "sync request finished");
        });
    }

    /// Runs a sync cycle and waits for it, unless one is already running.
    pub async fn sync_now(&self, reason: SyncReason) -> SyncOutcome {
        {
            let mut ctl = self.control();
            ctl.pending = true;
            if ctl.syncing {
                debug!(%reason, "sync already running");
                return SyncOutcome::Coalesced;
            }
            ctl.syncing = true;
            if let Some(timer) = ctl.retry.take() {
                timer.abort();
            }
        }
        debug!(%reason, "sync cycle starting");

        let mut report = CycleReport::default();
        loop {
            let result = self.run_cycle(&mut report).await;
            let outcome = match result {
                Ok(()) => {
                    let mut ctl = self.control();
                    if ctl.pending {
                        debug!("sync requested during cycle, continuing");
                        continue;
                    }
                    ctl.syncing = false;
                    SyncOutcome::Drained(report)
                }
                Err(CycleError::Offline) => {
                    let retry_in = self.schedule_retry();
                    debug!(?retry_in, "offline, sync deferred");
                    SyncOutcome::Offline { retry_in }
                }
                Err(CycleError::Failed(error)) => {
                    let retry_in = self.schedule_retry();
                    warn!(%error, ?retry_in, "sync failed, will retry");
                    SyncOutcome::Failed {
                        report,
                        retry_in,
                        error,
                    }
                }
            };

            let dropped = report.dropped_drafts;
            if report.synced_drafts + report.synced_events + dropped > 0 {
                info!(
                    %reason,
                    batches = report.batches,
                    drafts = report.synced_drafts,
                    events = report.synced_events,
                    dropped,
                    "sync cycle finished"
                );
            }
            return outcome;
        }
    }

    async fn run_cycle(&self, report: &mut CycleReport) -> Result<(), CycleError> {
        self.control().pending = false;
        if !self.is_online() {
            return Err(CycleError::Offline);
        }

        let queue = &self.inner.queue;
        let options = &self.inner.options;
        // Entries left queued this cycle are not resent until the next one.
        let mut held_drafts: HashSet<String> = HashSet::new();
        let mut held_events: HashSet<i64> = HashSet::new();
        loop {
            let drafts: Vec<DraftRecord> = queue
                .list_queued_drafts()
                .into_iter()
                .filter(|d| !held_drafts.contains(&d.id))
                .take(options.max_drafts_per_batch)
                .collect();
            let events: Vec<EventRecord> = queue
                .list_queued_events(None)
                .into_iter()
                .filter(|e| !held_events.contains(&e.id))
                .take(options.max_events_per_batch)
                .collect();
            if drafts.is_empty() && events.is_empty() {
                break;
            }

            report.batches += 1;
            let batch = SyncRequest::from_records(&drafts, &events);
            match self.inner.transport.submit(batch).await {
                Ok(response) => {
                    let (omitted_drafts, omitted_events) =
                        self.acknowledge(&response, &drafts, &events, report);
                    held_drafts.extend(omitted_drafts);
                    held_events.extend(omitted_events);
                }
                Err(e) if e.is_poison() && !drafts.is_empty() => {
                    warn!(
                        status = ?e.status(),
                        drafts = drafts.len(),
                        error = %e,
                        "server rejected batch, dropping its drafts"
                    );
                    for draft in &drafts {
                        queue.remove_queued_draft(&draft.id);
                    }
                    report.dropped_drafts += drafts.len();
                }
                Err(e) if e.is_poison() => {
                    warn!(
                        status = ?e.status(),
                        events = events.len(),
                        error = %e,
                        "server rejected events, keeping them queued"
                    );
                    held_events.extend(events.iter().map(|e| e.id));
                }
                Err(e) => return Err(CycleError::Failed(e.to_string())),
            }
        }

        let held = held_drafts.len() + held_events.len();
        if held > 0 {
            return Err(CycleError::Failed(format!(
                "server left {held} entries unapplied"
            )));
        }

        self.control().backoff.reset();
        Ok(())
    }

    /// Removes what the server applied. Returns the ids it left out.
    fn acknowledge(
        &self,
        response: &SyncResponse,
        drafts: &[DraftRecord],
        events: &[EventRecord],
        report: &mut CycleReport,
    ) -> (Vec<String>, Vec<i64>) {
        let queue = &self.inner.queue;
        let synced_drafts: HashSet<&str> =
            response.synced_draft_ids.iter().map(String::as_str).collect();
        let synced_events: HashSet<i64> = response.synced_event_ids.iter().copied().collect();

        let mut omitted_drafts = Vec::new();
        for draft in drafts {
            if synced_drafts.contains(draft.id.as_str()) {
                queue.remove_synced_draft(&draft.id, draft.revision);
                report.synced_drafts += 1;
            } else {
                omitted_drafts.push(draft.id.clone());
            }
        }

        let (applied, omitted_events): (Vec<i64>, Vec<i64>) = events
            .iter()
            .map(|e| e.id)
            .partition(|id| synced_events.contains(id));
        queue.remove_queued_events(&applied);
        report.synced_events += applied.len();

        let omitted = omitted_drafts.len() + omitted_events.len();
        if omitted > 0 {
            debug!(omitted, "server omitted entries, keeping them queued");
        }
        (omitted_drafts, omitted_events)
    }

    /// Marks work pending and arms the retry timer if none is armed.
    fn schedule_retry(&self) -> Duration {
        let mut ctl = self.control();
        ctl.syncing = false;
        ctl.pending = true;
        let delay = ctl.backoff.next_delay();
        if ctl.disposed || ctl.retry.is_some() {
            return delay;
        }

        let this = self.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            this.control().retry = None;
            let outcome = this.sync_now(SyncReason::Retry).await;
            debug!(?outcome, "retry finished");
        });
        ctl.retry = Some(timer.abort_handle());
        delay
    }

    fn control(&self) -> MutexGuard<'_, Control> {
        self.inner.control.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
