// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Semaphore-backed read lock

use crate::lease::LeaseSet;
use async_trait::async_trait;
use fleetlock_core::{CountingSemaphore, Lock, LockError, LockToken, ReadLock};

/// Shared lock holding one reader token per requested key
pub struct SemaphoreReadLock<S: CountingSemaphore> {
    lock_keys: Vec<String>,
    lease: LeaseSet<S>,
}

impl<S: CountingSemaphore> SemaphoreReadLock<S> {
    pub(crate) fn new(lock_keys: Vec<String>, lease: LeaseSet<S>) -> Self {
        Self { lock_keys, lease }
    }

    pub fn lock_keys(&self) -> &[String] {
        &self.lock_keys
    }
}

#[async_trait]
impl<S: CountingSemaphore> Lock for SemaphoreReadLock<S> {
    async fn close(&mut self) -> Result<(), LockError> {
        let result = self.lease.close().await;
        tracing::debug!(keys = ?self.lock_keys, ok = result.is_ok(), "read lock closed");
        result.map_err(LockError::from)
    }

    fn is_closed(&self) -> bool {
        self.lease.is_closed()
    }

    fn held_tokens(&self) -> Vec<(&str, &LockToken)> {
        self.lease.held_tokens()
    }
}

impl<S: CountingSemaphore> ReadLock for SemaphoreReadLock<S> {}
