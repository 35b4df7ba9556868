// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Set of held semaphore tokens shared by every lock kind
//!
//! A lease set owns the tokens acquired for one lock, the listener that renews
//! them, and the obligation to release them. Closing is explicit; a set
//! dropped while still open releases its tokens on the current runtime.

use async_trait::async_trait;
use fleetlock_core::{
    CountingSemaphore, ListenerHandle, LockToken, ProgressCallback, ProgressListener,
    SemaphoreError,
};
use std::sync::Arc;
use std::time::Duration;

pub(crate) struct LeaseSet<S: CountingSemaphore> {
    semaphore: S,
    lock_timeout: Duration,
    tokens: Vec<(String, LockToken)>,
    listener: Option<ListenerHandle>,
    closed: bool,
}

impl<S: CountingSemaphore> LeaseSet<S> {
    pub(crate) fn new(semaphore: S, lock_timeout: Duration) -> Self {
        Self {
            semaphore,
            lock_timeout,
            tokens: Vec::new(),
            listener: None,
            closed: false,
        }
    }

    pub(crate) fn push(&mut self, key: String, token: LockToken) {
        self.tokens.push((key, token));
    }

    pub(crate) fn semaphore(&self) -> &S {
        &self.semaphore
    }

    /// Renew every held token on each progress signal of `callback`
    pub(crate) fn renew_on_progress(&mut self, callback: &ProgressCallback) {
        let refresher = TokenRefresher {
            semaphore: self.semaphore.clone(),
            tokens: self.tokens.clone(),
            lock_timeout: self.lock_timeout,
        };
        self.listener = Some(callback.add_listener(Arc::new(refresher)));
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed
    }

    pub(crate) fn held_tokens(&self) -> Vec<(&str, &LockToken)> {
        self.tokens
            .iter()
            .map(|(key, token)| (key.as_str(), token))
            .collect()
    }

    /// Stop renewing, then release every token. The first failure is returned
    /// after all releases were attempted.
    pub(crate) async fn close(&mut self) -> Result<(), SemaphoreError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.listener.take();

        let mut first_error = None;
        for (key, token) in std::mem::take(&mut self.tokens) {
            if let Err(e) = self.semaphore.release_lock(&key, &token).await {
                tracing::warn!(key = %key, %token, error = %e, "failed to release token");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl<S: CountingSemaphore> Drop for LeaseSet<S> {
    fn drop(&mut self) {
        self.listener.take();
        if self.closed || self.tokens.is_empty() {
            return;
        }

        let tokens = std::mem::take(&mut self.tokens);
        let semaphore = self.semaphore.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                tracing::warn!(tokens = tokens.len(), "lock dropped without close; releasing");
                runtime.spawn(async move {
                    for (key, token) in tokens {
                        if let Err(e) = semaphore.release_lock(&key, &token).await {
                            tracing::warn!(
                                key = %key,
                                %token,
                                error = %e,
                                "background release failed"
                            );
                        }
                    }
                });
            }
            Err(_) => tracing::warn!(
                tokens = tokens.len(),
                "lock dropped without close outside a runtime; leases will expire"
            ),
        }
    }
}

struct TokenRefresher<S> {
    semaphore: S,
    tokens: Vec<(String, LockToken)>,
    lock_timeout: Duration,
}

#[async_trait]
impl<S: CountingSemaphore> ProgressListener for TokenRefresher<S> {
    async fn progress_made(&self) -> Result<(), SemaphoreError> {
        let mut first_error = None;
        for (key, token) in &self.tokens {
            if let Err(e) = self
                .semaphore
                .refresh_lock_timeout(key, token, self.lock_timeout)
                .await
            {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
#[path = "lease_tests.rs"]
mod tests;
