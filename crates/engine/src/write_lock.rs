// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Semaphore-backed write lock

use crate::lease::LeaseSet;
use async_trait::async_trait;
use fleetlock_core::{reader_key, CountingSemaphore, Lock, LockError, LockToken, WriteLock};

/// Exclusive-writer lock holding the single writer token of one key
pub struct SemaphoreWriteLock<S: CountingSemaphore> {
    lock_key: String,
    lease: LeaseSet<S>,
}

impl<S: CountingSemaphore> SemaphoreWriteLock<S> {
    pub(crate) fn new(lock_key: impl Into<String>, lease: LeaseSet<S>) -> Self {
        Self {
            lock_key: lock_key.into(),
            lease,
        }
    }

    /// Logical key this lock was taken on
    pub fn lock_key(&self) -> &str {
        &self.lock_key
    }
}

#[async_trait]
impl<S: CountingSemaphore> Lock for SemaphoreWriteLock<S> {
    async fn close(&mut self) -> Result<(), LockError> {
        let result = self.lease.close().await;
        tracing::debug!(key = %self.lock_key, ok = result.is_ok(), "write lock closed");
        result.map_err(LockError::from)
    }

    fn is_closed(&self) -> bool {
        self.lease.is_closed()
    }

    fn held_tokens(&self) -> Vec<(&str, &LockToken)> {
        self.lease.held_tokens()
    }
}

#[async_trait]
impl<S: CountingSemaphore> WriteLock for SemaphoreWriteLock<S> {
    async fn existing_read_lock_context(&self) -> Result<Option<String>, LockError> {
        let context = self
            .lease
            .semaphore()
            .first_unexpired_lock_context(&reader_key(&self.lock_key))
            .await?;
        Ok(context)
    }
}
