// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration of semaphore-gated runners

use super::runner::ProgressingRunner;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Shortest lock timeout a gated runner accepts
pub const MINIMUM_RUNNER_TIMEOUT: Duration = Duration::from_secs(1);

fn default_max_lock_count() -> u32 {
    1
}

/// Lock settings of one gated job, loadable from TOML
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatedLockSettings {
    /// Semaphore key naming the job
    pub lock_key: String,
    /// Lease length; renewed every third of it while the job runs
    #[serde(with = "humantime_serde")]
    pub lock_timeout: Duration,
    /// Concurrent holders allowed across the fleet
    #[serde(default = "default_max_lock_count")]
    pub max_lock_count: u32,
}

/// Everything a [`super::SemaphoreGatedRunner`] needs
#[derive(Clone)]
pub struct SemaphoreGatedRunnerConfiguration {
    runner: Option<Arc<dyn ProgressingRunner>>,
    lock_key: Option<String>,
    lock_timeout: Duration,
    max_lock_count: u32,
}

impl Default for SemaphoreGatedRunnerConfiguration {
    fn default() -> Self {
        Self {
            runner: None,
            lock_key: None,
            lock_timeout: Duration::ZERO,
            max_lock_count: default_max_lock_count(),
        }
    }
}

impl SemaphoreGatedRunnerConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_settings(settings: GatedLockSettings) -> Self {
        Self {
            runner: None,
            lock_key: Some(settings.lock_key),
            lock_timeout: settings.lock_timeout,
            max_lock_count: settings.max_lock_count,
        }
    }

    pub fn with_runner(mut self, runner: impl ProgressingRunner) -> Self {
        self.set_runner(runner);
        self
    }

    pub fn with_lock_key(mut self, lock_key: impl Into<String>) -> Self {
        self.set_lock_key(lock_key);
        self
    }

    pub fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.set_lock_timeout(lock_timeout);
        self
    }

    pub fn with_max_lock_count(mut self, max_lock_count: u32) -> Self {
        self.set_max_lock_count(max_lock_count);
        self
    }

    pub fn set_runner(&mut self, runner: impl ProgressingRunner) {
        self.runner = Some(Arc::new(runner));
    }

    pub fn set_lock_key(&mut self, lock_key: impl Into<String>) {
        self.lock_key = Some(lock_key.into());
    }

    pub fn set_lock_timeout(&mut self, lock_timeout: Duration) {
        self.lock_timeout = lock_timeout;
    }

    /// Whole seconds, as job schedules usually state them
    pub fn set_lock_timeout_sec(&mut self, seconds: u64) {
        self.lock_timeout = Duration::from_secs(seconds);
    }

    pub fn set_max_lock_count(&mut self, max_lock_count: u32) {
        self.max_lock_count = max_lock_count;
    }

    pub fn runner(&self) -> Option<&Arc<dyn ProgressingRunner>> {
        self.runner.as_ref()
    }

    pub fn lock_key(&self) -> Option<&str> {
        self.lock_key.as_deref()
    }

    pub fn lock_timeout(&self) -> Duration {
        self.lock_timeout
    }

    pub fn max_lock_count(&self) -> u32 {
        self.max_lock_count
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match &self.runner {
            None => return Err(ConfigError::MissingRunner),
            Some(runner) if runner.name().trim().is_empty() => {
                return Err(ConfigError::BlankRunnerName)
            }
            Some(_) => {}
        }
        match self.lock_key.as_deref() {
            Some(key) if !key.is_empty() => {}
            _ => return Err(ConfigError::MissingLockKey),
        }
        if self.lock_timeout < MINIMUM_RUNNER_TIMEOUT {
            return Err(ConfigError::InvalidLockTimeout(self.lock_timeout));
        }
        if self.max_lock_count < 1 {
            return Err(ConfigError::InvalidMaxLockCount(self.max_lock_count));
        }
        Ok(())
    }
}

impl std::fmt::Debug for SemaphoreGatedRunnerConfiguration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SemaphoreGatedRunnerConfiguration")
            .field("runner", &self.runner.as_ref().map(|r| r.name()))
            .field("lock_key", &self.lock_key)
            .field("lock_timeout", &self.lock_timeout)
            .field("max_lock_count", &self.max_lock_count)
            .finish()
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
