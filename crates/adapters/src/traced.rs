// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced semaphore wrapper for consistent observability

use async_trait::async_trait;
use fleetlock_core::{CountingSemaphore, LockToken, SemaphoreError};
use std::time::Duration;
use tracing::Instrument;

/// Wrapper that adds tracing to any CountingSemaphore
#[derive(Clone)]
pub struct TracedCountingSemaphore<S> {
    inner: S,
}

impl<S> TracedCountingSemaphore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: CountingSemaphore> CountingSemaphore for TracedCountingSemaphore<S> {
    async fn attempt_to_acquire_lock(
        &self,
        key: &str,
        timeout: Duration,
        max_lock_count: u32,
        context: &str,
    ) -> Result<Option<LockToken>, SemaphoreError> {
        let span = tracing::info_span!("semaphore.acquire", key, max_lock_count);
        async {
            tracing::debug!(context, timeout_ms = timeout.as_millis() as u64, "attempting");

            let start = std::time::Instant::now();
            let result = self
                .inner
                .attempt_to_acquire_lock(key, timeout, max_lock_count, context)
                .await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            match &result {
                Ok(Some(token)) => tracing::debug!(%token, elapsed_ms, "granted"),
                Ok(None) => tracing::debug!(elapsed_ms, "no slot available"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "acquire failed"),
            }

            result
        }
        .instrument(span)
        .await
    }

    async fn refresh_lock_timeout(
        &self,
        key: &str,
        token: &LockToken,
        timeout: Duration,
    ) -> Result<(), SemaphoreError> {
        let span = tracing::info_span!("semaphore.refresh", key, %token);
        async {
            let result = self.inner.refresh_lock_timeout(key, token, timeout).await;
            match &result {
                Ok(()) => tracing::trace!(timeout_ms = timeout.as_millis() as u64, "refreshed"),
                Err(e) if e.is_lease_violation() => {
                    tracing::warn!(error = %e, "lease lost before refresh")
                }
                Err(e) => tracing::error!(error = %e, "refresh failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn release_lock(&self, key: &str, token: &LockToken) -> Result<(), SemaphoreError> {
        let span = tracing::info_span!("semaphore.release", key, %token);
        async {
            let start = std::time::Instant::now();
            let result = self.inner.release_lock(key, token).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            match &result {
                Ok(()) => tracing::debug!(elapsed_ms, "released"),
                Err(e) if e.is_lease_violation() => {
                    tracing::warn!(elapsed_ms, error = %e, "lease lost before release")
                }
                Err(e) => tracing::error!(elapsed_ms, error = %e, "release failed"),
            }

            result
        }
        .instrument(span)
        .await
    }

    async fn first_unexpired_lock_context(
        &self,
        key: &str,
    ) -> Result<Option<String>, SemaphoreError> {
        let result = self.inner.first_unexpired_lock_context(key).await;
        tracing::trace!(key, holder = ?result.as_ref().ok(), "looked up holder");
        result
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
