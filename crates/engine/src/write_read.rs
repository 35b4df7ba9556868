// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Non-blocking reader/writer locks over a counting semaphore
//!
//! Every logical key is backed by two semaphore keys. The writer key admits a
//! single holder. The reader key admits up to `max_readers` holders. A reader
//! refuses to start while a writer holds the key; a writer does not wait for
//! readers that are already running.

use crate::error::ConfigError;
use crate::lease::LeaseSet;
use crate::read_lock::SemaphoreReadLock;
use crate::write_lock::SemaphoreWriteLock;
use fleetlock_core::{
    reader_key, writer_key, CountingSemaphore, LockError, LockType, ReadLockRequest,
    WriteLockRequest,
};

/// Hands out read and write locks; never waits or retries.
#[derive(Clone)]
pub struct WriteReadSemaphore<S: CountingSemaphore> {
    semaphore: S,
    max_readers: u32,
}

impl<S: CountingSemaphore> WriteReadSemaphore<S> {
    pub fn new(semaphore: S, max_readers: u32) -> Result<Self, ConfigError> {
        if max_readers < 1 {
            return Err(ConfigError::InvalidMaxLockCount(max_readers));
        }
        Ok(Self {
            semaphore,
            max_readers,
        })
    }

    pub fn max_readers(&self) -> u32 {
        self.max_readers
    }

    /// Context of the first live holder of `key`; lookup failures read as unknown
    async fn holder_of(&self, key: &str) -> Option<String> {
        match self.semaphore.first_unexpired_lock_context(key).await {
            Ok(context) => context,
            Err(e) => {
                tracing::warn!(key, error = %e, "could not look up lock holder");
                None
            }
        }
    }

    /// Take the writer slot of the request's key.
    ///
    /// Fails with [`LockError::Unavailable`] while another writer holds it.
    pub async fn get_write_lock(
        &self,
        request: &WriteLockRequest,
    ) -> Result<SemaphoreWriteLock<S>, LockError> {
        let key = writer_key(request.lock_key());
        let token = self
            .semaphore
            .attempt_to_acquire_lock(
                &key,
                request.lock_timeout(),
                1,
                request.caller_context(),
            )
            .await?;

        let Some(token) = token else {
            let holder = self.holder_of(&key).await;
            tracing::debug!(key = request.lock_key(), holder = ?holder, "write lock unavailable");
            return Err(LockError::unavailable(
                LockType::Write,
                request.lock_key(),
                holder,
            ));
        };

        let mut lease = LeaseSet::new(self.semaphore.clone(), request.lock_timeout());
        lease.push(key, token);
        lease.renew_on_progress(request.callback());
        tracing::debug!(key = request.lock_key(), "write lock acquired");
        Ok(SemaphoreWriteLock::new(request.lock_key(), lease))
    }

    /// Take a reader slot on every key of the request, or none at all.
    ///
    /// Writers are checked for every key before any reader slot is taken.
    /// Slots already taken by this call are released before an error returns.
    pub async fn get_read_lock(
        &self,
        request: &ReadLockRequest,
    ) -> Result<SemaphoreReadLock<S>, LockError> {
        for key in request.lock_keys() {
            let writer = self
                .semaphore
                .first_unexpired_lock_context(&writer_key(key))
                .await?;
            if let Some(writer) = writer {
                tracing::debug!(key = %key, %writer, "read lock blocked by writer");
                return Err(LockError::unavailable(LockType::Write, key, Some(writer)));
            }
        }

        let mut lease = LeaseSet::new(self.semaphore.clone(), request.lock_timeout());
        for key in request.lock_keys() {
            let physical = reader_key(key);
            let attempt = self
                .semaphore
                .attempt_to_acquire_lock(
                    &physical,
                    request.lock_timeout(),
                    self.max_readers,
                    request.caller_context(),
                )
                .await;

            let error = match attempt {
                Ok(Some(token)) => {
                    lease.push(physical, token);
                    continue;
                }
                Ok(None) => {
                    let holder = self.holder_of(&physical).await;
                    LockError::unavailable(LockType::Read, key, holder)
                }
                Err(e) => LockError::from(e),
            };

            if let Err(e) = lease.close().await {
                tracing::warn!(error = %e, "failed to release partial read lock");
            }
            tracing::debug!(key = %key, error = %error, "read lock unavailable");
            return Err(error);
        }

        lease.renew_on_progress(request.callback());
        tracing::debug!(keys = ?request.lock_keys(), "read lock acquired");
        Ok(SemaphoreReadLock::new(request.lock_keys().to_vec(), lease))
    }
}

#[cfg(test)]
#[path = "write_read_tests.rs"]
mod tests;
