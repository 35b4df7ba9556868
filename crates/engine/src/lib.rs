// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Fleet-wide read/write locks and semaphore-gated job execution

mod error;
pub mod gated;
mod lease;
mod read_lock;
mod write_lock;
mod write_read;

pub use error::{ConfigError, TaskError};
pub use gated::{
    AlwaysOpen, Gate, GatedLockSettings, ProgressingRunner, RunOutcome, SemaphoreGatedRunner,
    SemaphoreGatedRunnerConfiguration, SemaphoreGatedWorkerStack,
    SemaphoreGatedWorkerStackConfiguration, SwitchGate,
};
pub use read_lock::SemaphoreReadLock;
pub use write_lock::SemaphoreWriteLock;
pub use write_read::WriteReadSemaphore;
