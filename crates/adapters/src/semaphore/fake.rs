// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake counting semaphore for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::MemoryCountingSemaphore;
use async_trait::async_trait;
use fleetlock_core::{CountingSemaphore, LockToken, SemaphoreError, SequentialTokenGen, TokioClock};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Recorded semaphore call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SemaphoreCall {
    Acquire {
        key: String,
        timeout: Duration,
        max_lock_count: u32,
        context: String,
    },
    Refresh {
        key: String,
        token: LockToken,
        timeout: Duration,
    },
    Release {
        key: String,
        token: LockToken,
    },
    FirstUnexpiredContext {
        key: String,
    },
}

impl SemaphoreCall {
    pub fn key(&self) -> &str {
        match self {
            SemaphoreCall::Acquire { key, .. }
            | SemaphoreCall::Refresh { key, .. }
            | SemaphoreCall::Release { key, .. }
            | SemaphoreCall::FirstUnexpiredContext { key } => key,
        }
    }
}

#[derive(Default)]
struct FakeState {
    calls: Vec<SemaphoreCall>,
    acquire_error: Option<SemaphoreError>,
    refresh_error: Option<SemaphoreError>,
    release_error: Option<SemaphoreError>,
}

/// Fake semaphore that records every call.
///
/// Grants are kept by a real [`MemoryCountingSemaphore`] on the tokio clock,
/// so paused-time tests see leases expire. Injected errors are returned
/// before the inner semaphore is consulted.
#[derive(Clone)]
pub struct FakeCountingSemaphore {
    inner: MemoryCountingSemaphore<TokioClock, SequentialTokenGen>,
    state: Arc<Mutex<FakeState>>,
}

impl Default for FakeCountingSemaphore {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeCountingSemaphore {
    pub fn new() -> Self {
        Self {
            inner: MemoryCountingSemaphore::with_parts(TokioClock, SequentialTokenGen::default()),
            state: Arc::new(Mutex::new(FakeState::default())),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<SemaphoreCall> {
        self.state().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// Backing semaphore, for inspecting or expiring grants directly
    pub fn inner(&self) -> &MemoryCountingSemaphore<TokioClock, SequentialTokenGen> {
        &self.inner
    }

    /// Fail every acquire attempt with `error` until cleared
    pub fn set_acquire_error(&self, error: Option<SemaphoreError>) {
        self.state().acquire_error = error;
    }

    /// Fail every refresh with `error` until cleared
    pub fn set_refresh_error(&self, error: Option<SemaphoreError>) {
        self.state().refresh_error = error;
    }

    /// Fail every release with `error` until cleared
    pub fn set_release_error(&self, error: Option<SemaphoreError>) {
        self.state().release_error = error;
    }

    /// Number of live grants across all keys
    pub fn live_grants(&self) -> usize {
        self.inner.stats().live_grants
    }
}

#[async_trait]
impl CountingSemaphore for FakeCountingSemaphore {
    async fn attempt_to_acquire_lock(
        &self,
        key: &str,
        timeout: Duration,
        max_lock_count: u32,
        context: &str,
    ) -> Result<Option<LockToken>, SemaphoreError> {
        let injected = {
            let mut state = self.state();
            state.calls.push(SemaphoreCall::Acquire {
                key: key.to_string(),
                timeout,
                max_lock_count,
                context: context.to_string(),
            });
            state.acquire_error.clone()
        };
        if let Some(error) = injected {
            return Err(error);
        }
        self.inner
            .attempt_to_acquire_lock(key, timeout, max_lock_count, context)
            .await
    }

    async fn refresh_lock_timeout(
        &self,
        key: &str,
        token: &LockToken,
        timeout: Duration,
    ) -> Result<(), SemaphoreError> {
        let injected = {
            let mut state = self.state();
            state.calls.push(SemaphoreCall::Refresh {
                key: key.to_string(),
                token: token.clone(),
                timeout,
            });
            state.refresh_error.clone()
        };
        if let Some(error) = injected {
            return Err(error);
        }
        self.inner.refresh_lock_timeout(key, token, timeout).await
    }

    async fn release_lock(&self, key: &str, token: &LockToken) -> Result<(), SemaphoreError> {
        let injected = {
            let mut state = self.state();
            state.calls.push(SemaphoreCall::Release {
                key: key.to_string(),
                token: token.clone(),
            });
            state.release_error.clone()
        };
        if let Some(error) = injected {
            return Err(error);
        }
        self.inner.release_lock(key, token).await
    }

    async fn first_unexpired_lock_context(
        &self,
        key: &str,
    ) -> Result<Option<String>, SemaphoreError> {
        self.state().calls.push(SemaphoreCall::FirstUnexpiredContext {
            key: key.to_string(),
        });
        self.inner.first_unexpired_lock_context(key).await
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
