// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic garbage collection for the in-memory semaphore

use crate::semaphore::MemoryCountingSemaphore;
use fleetlock_core::{Clock, TokenGen};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Configuration for the maintenance task
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceConfig {
    /// How often to collect expired grants
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
    /// Whether to log stats after every cycle
    #[serde(default = "default_log_stats")]
    pub log_stats: bool,
}

fn default_log_stats() -> bool {
    true
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            log_stats: true,
        }
    }
}

impl MaintenanceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_log_stats(mut self, enabled: bool) -> Self {
        self.log_stats = enabled;
        self
    }
}

/// Snapshot of semaphore occupancy
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SemaphoreStats {
    pub keys: usize,
    pub live_grants: usize,
    pub expired_grants: usize,
}

/// Background garbage collector for a [`MemoryCountingSemaphore`]
pub struct MaintenanceTask<C: Clock, G: TokenGen> {
    config: MaintenanceConfig,
    semaphore: MemoryCountingSemaphore<C, G>,
}

impl<C: Clock, G: TokenGen> MaintenanceTask<C, G> {
    pub fn new(config: MaintenanceConfig, semaphore: MemoryCountingSemaphore<C, G>) -> Self {
        Self { config, semaphore }
    }

    /// Run a single maintenance cycle, returning the number of grants collected
    pub fn tick(&self) -> usize {
        let collected = self.semaphore.run_garbage_collection();
        if self.config.log_stats {
            let stats = self.semaphore.stats();
            tracing::debug!(
                collected,
                keys = stats.keys,
                live_grants = stats.live_grants,
                "semaphore maintenance"
            );
        }
        collected
    }

    pub fn interval(&self) -> Duration {
        self.config.interval
    }

    /// Run [`MaintenanceTask::tick`] every interval until the handle drops.
    ///
    /// The first cycle runs one interval after spawning.
    pub fn spawn(self) -> MaintenanceHandle {
        let period = self.config.interval.max(Duration::from_millis(1));
        let task = tokio::spawn(async move {
            let mut interval =
                tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                self.tick();
            }
        });
        MaintenanceHandle { task }
    }
}

/// Running maintenance task; stopped on drop
pub struct MaintenanceHandle {
    task: JoinHandle<()>,
}

impl MaintenanceHandle {
    pub fn stop(self) {}
}

impl Drop for MaintenanceHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
#[path = "maintenance_tests.rs"]
mod tests;
