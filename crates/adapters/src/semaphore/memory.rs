// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process counting semaphore with expiring grants

use crate::maintenance::SemaphoreStats;
use async_trait::async_trait;
pub use fleetlock_core::MAX_CONTEXT_CHARS;
use fleetlock_core::{
    Clock, CountingSemaphore, LockToken, SemaphoreError, SystemClock, TokenGen, UuidTokenGen,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

#[derive(Clone, Debug)]
struct Grant {
    token: LockToken,
    context: String,
    expires_at: Instant,
}

impl Grant {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// Counting semaphore held in process memory.
///
/// Clones share state, so every clone handed to a lock or runner sees the
/// same grants. Each decision is made under one mutex.
#[derive(Clone)]
pub struct MemoryCountingSemaphore<C: Clock = SystemClock, G: TokenGen = UuidTokenGen> {
    clock: C,
    token_gen: G,
    grants: Arc<Mutex<HashMap<String, Vec<Grant>>>>,
}

impl MemoryCountingSemaphore {
    pub fn new() -> Self {
        Self::with_parts(SystemClock, UuidTokenGen)
    }
}

impl Default for MemoryCountingSemaphore {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock, G: TokenGen> MemoryCountingSemaphore<C, G> {
    pub fn with_parts(clock: C, token_gen: G) -> Self {
        Self {
            clock,
            token_gen,
            grants: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn grants(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<Grant>>> {
        self.grants.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Expire every grant at once. Released tokens can no longer be refreshed
    /// or released; the grants stay until garbage collection.
    pub fn release_all_locks(&self) {
        let now = self.clock.now();
        for grant in self.grants().values_mut().flatten() {
            if grant.is_live(now) {
                grant.expires_at = now;
            }
        }
    }

    /// Drop expired grants and empty keys. Returns how many grants were dropped.
    pub fn run_garbage_collection(&self) -> usize {
        let now = self.clock.now();
        let mut grants = self.grants();
        let mut collected = 0;
        grants.retain(|_, held| {
            let before = held.len();
            held.retain(|grant| grant.is_live(now));
            collected += before - held.len();
            !held.is_empty()
        });
        collected
    }

    /// Grants currently retained, live or expired
    pub fn lock_row_count(&self) -> usize {
        self.grants().values().map(Vec::len).sum()
    }

    pub fn stats(&self) -> SemaphoreStats {
        let now = self.clock.now();
        let grants = self.grants();
        let mut stats = SemaphoreStats {
            keys: grants.len(),
            ..SemaphoreStats::default()
        };
        for grant in grants.values().flatten() {
            if grant.is_live(now) {
                stats.live_grants += 1;
            } else {
                stats.expired_grants += 1;
            }
        }
        stats
    }
}

fn validate_key(key: &str) -> Result<(), SemaphoreError> {
    if key.is_empty() {
        return Err(SemaphoreError::InvalidArgument("key cannot be empty".into()));
    }
    Ok(())
}

fn validate_timeout(timeout: Duration) -> Result<(), SemaphoreError> {
    if timeout.is_zero() {
        return Err(SemaphoreError::InvalidArgument(
            "timeout must be greater than zero".into(),
        ));
    }
    Ok(())
}

fn validate_context(context: &str) -> Result<(), SemaphoreError> {
    if context.trim().is_empty() {
        return Err(SemaphoreError::InvalidArgument(
            "context cannot be empty".into(),
        ));
    }
    if context.chars().count() > MAX_CONTEXT_CHARS {
        return Err(SemaphoreError::InvalidArgument(format!(
            "context length cannot be more than {MAX_CONTEXT_CHARS}"
        )));
    }
    Ok(())
}

#[async_trait]
impl<C: Clock, G: TokenGen> CountingSemaphore for MemoryCountingSemaphore<C, G> {
    async fn attempt_to_acquire_lock(
        &self,
        key: &str,
        timeout: Duration,
        max_lock_count: u32,
        context: &str,
    ) -> Result<Option<LockToken>, SemaphoreError> {
        validate_key(key)?;
        validate_timeout(timeout)?;
        validate_context(context)?;
        if max_lock_count < 1 {
            return Err(SemaphoreError::InvalidArgument(
                "max lock count must be at least 1".into(),
            ));
        }

        let now = self.clock.now();
        let mut grants = self.grants();
        let held = grants.entry(key.to_string()).or_default();

        // Expired grants give their slot back
        held.retain(|grant| grant.is_live(now));
        if held.len() >= max_lock_count as usize {
            return Ok(None);
        }

        let token = self.token_gen.next();
        held.push(Grant {
            token: token.clone(),
            context: context.to_string(),
            expires_at: now + timeout,
        });
        Ok(Some(token))
    }

    async fn refresh_lock_timeout(
        &self,
        key: &str,
        token: &LockToken,
        timeout: Duration,
    ) -> Result<(), SemaphoreError> {
        validate_key(key)?;
        validate_timeout(timeout)?;

        let now = self.clock.now();
        let mut grants = self.grants();
        let grant = grants
            .get_mut(key)
            .and_then(|held| held.iter_mut().find(|g| &g.token == token))
            .filter(|grant| grant.is_live(now));
        match grant {
            Some(grant) => {
                grant.expires_at = now + timeout;
                Ok(())
            }
            None => Err(SemaphoreError::LockReleaseFailed {
                key: key.to_string(),
                token: token.clone(),
            }),
        }
    }

    async fn release_lock(&self, key: &str, token: &LockToken) -> Result<(), SemaphoreError> {
        validate_key(key)?;

        let now = self.clock.now();
        let mut grants = self.grants();
        let position = grants.get(key).and_then(|held| {
            held.iter()
                .position(|grant| &grant.token == token && grant.is_live(now))
        });
        match (position, grants.get_mut(key)) {
            (Some(index), Some(held)) => {
                held.remove(index);
                Ok(())
            }
            _ => Err(SemaphoreError::LockReleaseFailed {
                key: key.to_string(),
                token: token.clone(),
            }),
        }
    }

    async fn first_unexpired_lock_context(
        &self,
        key: &str,
    ) -> Result<Option<String>, SemaphoreError> {
        validate_key(key)?;

        let now = self.clock.now();
        let grants = self.grants();
        Ok(grants.get(key).and_then(|held| {
            held.iter()
                .find(|grant| grant.is_live(now))
                .map(|grant| grant.context.clone())
        }))
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
