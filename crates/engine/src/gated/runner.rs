// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runs a recurring job under a fleet-wide counting lock

use super::config::SemaphoreGatedRunnerConfiguration;
use crate::error::{ConfigError, TaskError};
use crate::lease::LeaseSet;
use async_trait::async_trait;
use fleetlock_core::{CountingSemaphore, ProgressCallback, SemaphoreError, MAX_CONTEXT_CHARS};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

/// A unit of work that reports liveness while it runs
#[async_trait]
pub trait ProgressingRunner: Send + Sync + 'static {
    async fn run(&self, progress: &ProgressCallback) -> Result<(), TaskError>;

    /// Lock context recorded for this runner's grants.
    ///
    /// Names longer than [`MAX_CONTEXT_CHARS`] are truncated.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// What happened on one invocation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// The gate was closed; the semaphore was not touched
    GateClosed,
    /// Every slot was held elsewhere, or the semaphore could not be reached
    LockUnavailable,
    Completed,
    /// The task failed or panicked; the error was logged and the lock released
    TaskFailed,
}

/// Runs its task only while holding one of `max_lock_count` slots of its key
pub struct SemaphoreGatedRunner<S: CountingSemaphore> {
    semaphore: S,
    runner: Arc<dyn ProgressingRunner>,
    context: String,
    lock_key: String,
    lock_timeout: Duration,
    max_lock_count: u32,
}

impl<S: CountingSemaphore> SemaphoreGatedRunner<S> {
    pub fn new(
        semaphore: S,
        config: SemaphoreGatedRunnerConfiguration,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let runner = config.runner().cloned().ok_or(ConfigError::MissingRunner)?;
        let lock_key = config
            .lock_key()
            .map(str::to_string)
            .ok_or(ConfigError::MissingLockKey)?;
        let context = lock_context(runner.name());
        Ok(Self {
            semaphore,
            runner,
            context,
            lock_key,
            lock_timeout: config.lock_timeout(),
            max_lock_count: config.max_lock_count(),
        })
    }

    pub fn lock_key(&self) -> &str {
        &self.lock_key
    }

    /// Lock context recorded for this runner's grants
    pub fn context(&self) -> &str {
        &self.context
    }

    /// Run the task once if a slot is free.
    ///
    /// The lock is released whether the task succeeded or failed. Task errors
    /// and panics are logged and reported as [`RunOutcome::TaskFailed`]. A failed release
    /// means the lease ran out while the task still ran, so another holder may
    /// have run concurrently; that error is returned.
    pub async fn run(&self) -> Result<RunOutcome, SemaphoreError> {
        let context = self.context.as_str();
        let acquired = self
            .semaphore
            .attempt_to_acquire_lock(
                &self.lock_key,
                self.lock_timeout,
                self.max_lock_count,
                context,
            )
            .await;

        let token = match acquired {
            Ok(Some(token)) => token,
            Ok(None) => {
                tracing::debug!(
                    key = %self.lock_key,
                    runner = context,
                    "lock held elsewhere; skipping"
                );
                return Ok(RunOutcome::LockUnavailable);
            }
            Err(e) => {
                tracing::warn!(
                    key = %self.lock_key,
                    runner = context,
                    error = %e,
                    "lock acquire failed; skipping"
                );
                return Ok(RunOutcome::LockUnavailable);
            }
        };

        tracing::info!(key = %self.lock_key, runner = context, "lock acquired; running");
        let start = std::time::Instant::now();

        let progress = ProgressCallback::new(self.lock_timeout);
        let mut lease = LeaseSet::new(self.semaphore.clone(), self.lock_timeout);
        lease.push(self.lock_key.clone(), token);
        lease.renew_on_progress(&progress);

        let auto = progress.auto_progress();
        let result = AssertUnwindSafe(self.runner.run(&progress))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(panic_message(panic).into()));
        auto.stop();

        let released = lease.close().await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        let outcome = match result {
            Ok(()) => {
                tracing::info!(
                    key = %self.lock_key,
                    runner = context,
                    elapsed_ms,
                    "run completed"
                );
                RunOutcome::Completed
            }
            Err(e) => {
                tracing::error!(
                    key = %self.lock_key,
                    runner = context,
                    elapsed_ms,
                    error = %e,
                    "run failed"
                );
                RunOutcome::TaskFailed
            }
        };

        if let Err(e) = released {
            tracing::error!(
                key = %self.lock_key,
                runner = context,
                error = %e,
                "lock lost before release; another holder may have run concurrently"
            );
            return Err(e);
        }
        Ok(outcome)
    }
}

/// Cut a runner name down to what every semaphore accepts as context
fn lock_context(name: &str) -> String {
    match name.char_indices().nth(MAX_CONTEXT_CHARS) {
        Some((end, _)) => {
            tracing::debug!(name, "runner name truncated to fit the lock context");
            name[..end].to_string()
        }
        None => name.to_string(),
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    let detail = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string payload".to_string());
    format!("task panicked: {detail}")
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
