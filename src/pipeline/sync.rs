// src/pipeline/sync.rs
//! Status and snapshot synchronization with the backend.
//!
//! A single poll task runs while any stage is `running`. Each tick fetches
//! the status and all four snapshots concurrently and applies whatever
//! succeeded. Failed fetches are logged and dropped; the next tick retries.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use super::state::{PipelineState, Snapshot};
use crate::core::PipelineApi;

pub struct Synchronizer<A: PipelineApi> {
    inner: Arc<Inner<A>>,
}

struct Inner<A> {
    api: Arc<A>,
    state: watch::Sender<PipelineState>,
    interval: Duration,
    poller: Mutex<Option<JoinHandle<()>>>,
}

impl<A: PipelineApi> Clone for Synchronizer<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A: PipelineApi> Synchronizer<A> {
    pub fn new(api: Arc<A>, state: watch::Sender<PipelineState>, interval: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                api,
                state,
                interval,
                poller: Mutex::new(None),
            }),
        }
    }

    pub fn state(&self) -> &watch::Sender<PipelineState> {
        &self.inner.state
    }

    /// One unconditional sync of status and all snapshots.
    pub async fn refresh(&self) {
        sync_once(&self.inner).await;
    }

    /// Start the poll task if a stage is running and none is active;
    /// stop it if nothing is running.
    pub async fn reconcile(&self) {
        let mut slot = self.inner.poller.lock().await;
        let running = self.inner.state.borrow().any_running();
        let active = slot.as_ref().is_some_and(|h| !h.is_finished());

        if running && !active {
            debug!("Stage running, polling every {:?}", self.inner.interval);
            *slot = Some(tokio::spawn(poll_loop(Arc::clone(&self.inner))));
        } else if !running {
            if let Some(handle) = slot.take() {
                handle.abort();
                debug!("No stage running, polling cancelled");
            }
        }
    }

    pub async fn is_polling(&self) -> bool {
        self.inner
            .poller
            .lock()
            .await
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    pub async fn stop(&self) {
        if let Some(handle) = self.inner.poller.lock().await.take() {
            handle.abort();
        }
    }
}

async fn poll_loop<A: PipelineApi>(inner: Arc<Inner<A>>) {
    let period = inner.interval;
    let mut ticker = time::interval_at(Instant::now() + period, period);
    // A slow tick delays the next one instead of bunching them up.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        sync_once(&inner).await;

        if inner.state.borrow().any_running() {
            continue;
        }

        // Re-check under the slot lock so a stage started concurrently
        // either sees this task gone or keeps it alive.
        let mut slot = inner.poller.lock().await;
        if !inner.state.borrow().any_running() {
            debug!("No stage running, polling stopped");
            *slot = None;
            return;
        }
    }
}

async fn sync_once<A: PipelineApi>(inner: &Inner<A>) {
    let api = &inner.api;
    let (status, sourced, ranked, deep_scraped, results) = tokio::join!(
        api.fetch_status(),
        api.fetch_sourced(),
        api.fetch_ranked(),
        api.fetch_deep_scraped(),
        api.fetch_results(),
    );

    let snapshots = [
        sourced.map(Snapshot::Sourced),
        ranked.map(Snapshot::Ranked),
        deep_scraped.map(Snapshot::DeepScraped),
        results.map(Snapshot::Results),
    ];

    inner.state.send_modify(|state| {
        match status {
            Ok(status) => {
                if state.apply_status(&status) {
                    debug!("Backend stage '{}': {:?}", status.stage, state.statuses());
                }
            }
            Err(e) => warn!("Status poll failed: {}", e),
        }

        for snapshot in snapshots {
            match snapshot {
                Ok(snapshot) => state.apply_snapshot(snapshot),
                Err(e) => warn!("Snapshot poll failed: {}", e),
            }
        }
    });
}
