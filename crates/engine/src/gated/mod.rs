// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Semaphore-gated execution of recurring jobs
//!
//! A scheduler invokes a worker stack on every tick. The stack checks its
//! gate, tries once for a slot of the job's lock and, when it gets one, runs
//! the job with an automatic heartbeat. Not getting a slot is the normal
//! steady state across a fleet and is never retried here.

mod config;
mod gate;
mod runner;
mod stack;

pub use config::{GatedLockSettings, SemaphoreGatedRunnerConfiguration, MINIMUM_RUNNER_TIMEOUT};
pub use gate::{AlwaysOpen, Gate, SwitchGate};
pub use runner::{ProgressingRunner, RunOutcome, SemaphoreGatedRunner};
pub use stack::{SemaphoreGatedWorkerStack, SemaphoreGatedWorkerStackConfiguration};
