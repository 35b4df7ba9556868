// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Counting semaphore contract
//!
//! The semaphore is the only shared state in a fleet: a key-addressed store
//! that hands out a bounded number of expiring tokens per key. Implementations
//! must make each acquire/refresh/release decision atomically across every
//! process that talks to them.

use crate::token::LockToken;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Longest lock context every semaphore accepts
pub const MAX_CONTEXT_CHARS: usize = 256;

/// Errors reported by a counting semaphore
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SemaphoreError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The token no longer names a live grant; its lease expired or was revoked.
    #[error("lock release failed for key '{key}': token {token} is not held")]
    LockReleaseFailed { key: String, token: LockToken },
    #[error("semaphore backend error: {0}")]
    Backend(String),
}

impl SemaphoreError {
    /// True when a holder lost its lease while still believing it held the lock
    pub fn is_lease_violation(&self) -> bool {
        matches!(self, SemaphoreError::LockReleaseFailed { .. })
    }
}

/// Shared, expiring counting semaphore
#[async_trait]
pub trait CountingSemaphore: Clone + Send + Sync + 'static {
    /// Try to take one of `max_lock_count` slots for `key`, without waiting.
    ///
    /// Returns `None` when every slot is held by an unexpired grant.
    async fn attempt_to_acquire_lock(
        &self,
        key: &str,
        timeout: Duration,
        max_lock_count: u32,
        context: &str,
    ) -> Result<Option<LockToken>, SemaphoreError>;

    /// Push the expiry of a live grant to `now + timeout`
    async fn refresh_lock_timeout(
        &self,
        key: &str,
        token: &LockToken,
        timeout: Duration,
    ) -> Result<(), SemaphoreError>;

    /// Give a slot back
    async fn release_lock(&self, key: &str, token: &LockToken) -> Result<(), SemaphoreError>;

    /// Context of the earliest grant on `key` that has not expired
    async fn first_unexpired_lock_context(
        &self,
        key: &str,
    ) -> Result<Option<String>, SemaphoreError>;
}
