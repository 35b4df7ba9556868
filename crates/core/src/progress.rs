// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Heartbeat signalling for long-running lock holders
//!
//! A [`ProgressCallback`] carries the lease timeout of the work it belongs to
//! and a registry of listeners. Every progress signal is delivered to each
//! registered listener; lock implementations register a listener that renews
//! their tokens. Registration is owned by a [`ListenerHandle`] and ends when
//! the handle is dropped.

use crate::semaphore::SemaphoreError;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Arc, Mutex, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Receives liveness signals
#[async_trait]
pub trait ProgressListener: Send + Sync {
    async fn progress_made(&self) -> Result<(), SemaphoreError>;
}

#[derive(Default)]
struct Registry {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(u64, Arc<dyn ProgressListener>)>>,
}

impl Registry {
    fn remove(&self, id: u64) {
        let mut listeners = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
        listeners.retain(|(listener_id, _)| *listener_id != id);
    }

    fn snapshot(&self) -> Vec<Arc<dyn ProgressListener>> {
        self.listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect()
    }
}

/// Liveness signal source shared between a unit of work and its locks
#[derive(Clone)]
pub struct ProgressCallback {
    lock_timeout: Duration,
    registry: Arc<Registry>,
}

impl ProgressCallback {
    pub fn new(lock_timeout: Duration) -> Self {
        Self {
            lock_timeout,
            registry: Arc::new(Registry::default()),
        }
    }

    /// Lease length that listeners renew to on every signal
    pub fn lock_timeout(&self) -> Duration {
        self.lock_timeout
    }

    pub fn add_listener(&self, listener: Arc<dyn ProgressListener>) -> ListenerHandle {
        let id = self.registry.next_id.fetch_add(1, Ordering::SeqCst);
        self.registry
            .listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((id, listener));
        ListenerHandle {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.registry
            .listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// Signal liveness to every registered listener.
    ///
    /// Every listener is called; the first failure is returned.
    pub async fn progress_made(&self) -> Result<(), SemaphoreError> {
        let mut first_error = None;
        for listener in self.registry.snapshot() {
            if let Err(e) = listener.progress_made().await {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Interval of the automatic heartbeat: a third of the lease
    pub fn auto_progress_interval(&self) -> Duration {
        (self.lock_timeout / 3).max(Duration::from_millis(1))
    }

    /// Start signalling progress automatically until the returned guard drops.
    ///
    /// Signals come from a ticker on the current runtime. A watchdog thread
    /// signals instead whenever that ticker has been silent for a whole
    /// interval, so a task that blocks its executor thread keeps its leases.
    ///
    /// Must be called from within a tokio runtime.
    pub fn auto_progress(&self) -> AutoProgress {
        let period = self.auto_progress_interval();
        let last_beat = Arc::new(Mutex::new(std::time::Instant::now()));

        let callback = self.clone();
        let beat = Arc::clone(&last_beat);
        let ticker = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if let Err(e) = callback.progress_made().await {
                    tracing::warn!(error = %e, "automatic progress signal failed");
                }
                *beat.lock().unwrap_or_else(|e| e.into_inner()) = std::time::Instant::now();
            }
        });

        let watchdog = spawn_watchdog(self.clone(), period, last_beat, Handle::current());
        AutoProgress { ticker, watchdog }
    }
}

/// Signal from a dedicated thread whenever the runtime ticker falls a whole
/// interval behind. Dropping the returned sender stops the thread.
fn spawn_watchdog(
    callback: ProgressCallback,
    period: Duration,
    last_beat: Arc<Mutex<std::time::Instant>>,
    runtime: Handle,
) -> Option<mpsc::Sender<()>> {
    let (stop_tx, stop_rx) = mpsc::channel::<()>();
    let spawned = std::thread::Builder::new()
        .name("fleetlock-heartbeat".to_string())
        .spawn(move || loop {
            let since = last_beat.lock().unwrap_or_else(|e| e.into_inner()).elapsed();
            match stop_rx.recv_timeout(period.saturating_sub(since)) {
                Err(mpsc::RecvTimeoutError::Timeout) => {}
                Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
            }

            let since = last_beat.lock().unwrap_or_else(|e| e.into_inner()).elapsed();
            if since < period {
                continue;
            }
            tracing::debug!(
                silent_ms = since.as_millis() as u64,
                "runtime ticker stalled; signalling from watchdog"
            );
            if let Err(e) = runtime.block_on(callback.progress_made()) {
                tracing::warn!(error = %e, "automatic progress signal failed");
            }
            *last_beat.lock().unwrap_or_else(|e| e.into_inner()) = std::time::Instant::now();
        });

    match spawned {
        Ok(_) => Some(stop_tx),
        Err(e) => {
            tracing::warn!(error = %e, "heartbeat watchdog thread failed to start");
            None
        }
    }
}

impl std::fmt::Debug for ProgressCallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressCallback")
            .field("lock_timeout", &self.lock_timeout)
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// Registration of one listener; dropping it unregisters the listener
pub struct ListenerHandle {
    id: u64,
    registry: Weak<Registry>,
}

impl ListenerHandle {
    pub fn remove(self) {}
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.id);
        }
    }
}

/// Running automatic heartbeat; stopped on drop
pub struct AutoProgress {
    ticker: JoinHandle<()>,
    watchdog: Option<mpsc::Sender<()>>,
}

impl AutoProgress {
    pub fn stop(self) {}
}

impl Drop for AutoProgress {
    fn drop(&mut self) {
        self.ticker.abort();
        if let Some(stop) = self.watchdog.take() {
            let _ = stop.send(());
        }
    }
}

#[cfg(test)]
#[path = "progress_tests.rs"]
mod tests;
