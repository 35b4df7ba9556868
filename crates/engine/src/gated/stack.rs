// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Gate plus gated runner, bundled as one schedulable worker

use super::config::SemaphoreGatedRunnerConfiguration;
use super::gate::Gate;
use super::runner::{RunOutcome, SemaphoreGatedRunner};
use crate::error::ConfigError;
use fleetlock_core::{CountingSemaphore, SemaphoreError};
use std::sync::Arc;

/// Configuration of a [`SemaphoreGatedWorkerStack`]
#[derive(Clone, Default)]
pub struct SemaphoreGatedWorkerStackConfiguration {
    gate: Option<Arc<dyn Gate>>,
    runner_config: SemaphoreGatedRunnerConfiguration,
}

impl SemaphoreGatedWorkerStackConfiguration {
    pub fn new(runner_config: SemaphoreGatedRunnerConfiguration) -> Self {
        Self {
            gate: None,
            runner_config,
        }
    }

    pub fn with_gate(mut self, gate: impl Gate + 'static) -> Self {
        self.set_gate(gate);
        self
    }

    pub fn set_gate(&mut self, gate: impl Gate + 'static) {
        self.gate = Some(Arc::new(gate));
    }

    pub fn set_runner_config(&mut self, runner_config: SemaphoreGatedRunnerConfiguration) {
        self.runner_config = runner_config;
    }

    pub fn runner_config(&self) -> &SemaphoreGatedRunnerConfiguration {
        &self.runner_config
    }
}

impl std::fmt::Debug for SemaphoreGatedWorkerStackConfiguration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SemaphoreGatedWorkerStackConfiguration")
            .field("gated", &self.gate.is_some())
            .field("runner_config", &self.runner_config)
            .finish()
    }
}

/// Checks its gate, then runs its job under the fleet lock
pub struct SemaphoreGatedWorkerStack<S: CountingSemaphore> {
    gate: Option<Arc<dyn Gate>>,
    runner: SemaphoreGatedRunner<S>,
}

impl<S: CountingSemaphore> SemaphoreGatedWorkerStack<S> {
    pub fn new(
        semaphore: S,
        config: SemaphoreGatedWorkerStackConfiguration,
    ) -> Result<Self, ConfigError> {
        let runner = SemaphoreGatedRunner::new(semaphore, config.runner_config)?;
        Ok(Self {
            gate: config.gate,
            runner,
        })
    }

    pub fn runner(&self) -> &SemaphoreGatedRunner<S> {
        &self.runner
    }

    /// One scheduled invocation. A closed gate skips the run without
    /// touching the semaphore.
    pub async fn run(&self) -> Result<RunOutcome, SemaphoreError> {
        if let Some(gate) = &self.gate {
            if !gate.can_run().await {
                tracing::debug!(key = self.runner.lock_key(), "gate closed; skipping");
                return Ok(RunOutcome::GateClosed);
            }
        }
        self.runner.run().await
    }
}

#[cfg(test)]
#[path = "stack_tests.rs"]
mod tests;
