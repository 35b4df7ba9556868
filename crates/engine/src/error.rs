// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the locking engine

use std::time::Duration;
use thiserror::Error;

/// Error returned by a wrapped task
pub type TaskError = Box<dyn std::error::Error + Send + Sync>;

/// Invalid engine configuration, reported before any semaphore call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("runner is required")]
    MissingRunner,
    #[error("runner name is used as the lock context and cannot be blank")]
    BlankRunnerName,
    #[error("lock key is required")]
    MissingLockKey,
    #[error("lock timeout must be at least 1s, got {0:?}")]
    InvalidLockTimeout(Duration),
    #[error("max lock count must be at least 1, got {0}")]
    InvalidMaxLockCount(u32),
}
