// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Validated lock requests

use crate::lock::LockError;
use crate::progress::ProgressCallback;
use std::time::Duration;

/// Shortest lease a lock request may ask for
pub const MINIMUM_LOCK_TIMEOUT: Duration = Duration::from_secs(2);

fn validate_callback(callback: &ProgressCallback) -> Result<(), LockError> {
    if callback.lock_timeout() < MINIMUM_LOCK_TIMEOUT {
        return Err(LockError::InvalidRequest(format!(
            "lock timeout must be at least {}s, got {:?}",
            MINIMUM_LOCK_TIMEOUT.as_secs(),
            callback.lock_timeout()
        )));
    }
    Ok(())
}

fn validate_context(context: &str) -> Result<(), LockError> {
    if context.trim().is_empty() {
        return Err(LockError::InvalidRequest("caller context is required".into()));
    }
    Ok(())
}

fn validate_key(key: &str) -> Result<(), LockError> {
    if key.is_empty() {
        return Err(LockError::InvalidRequest("lock key cannot be empty".into()));
    }
    Ok(())
}

/// Request for an exclusive-writer lock on one key
#[derive(Clone, Debug)]
pub struct WriteLockRequest {
    callback: ProgressCallback,
    caller_context: String,
    lock_key: String,
}

impl WriteLockRequest {
    pub fn new(
        callback: ProgressCallback,
        caller_context: impl Into<String>,
        lock_key: impl Into<String>,
    ) -> Result<Self, LockError> {
        let caller_context = caller_context.into();
        let lock_key = lock_key.into();
        validate_callback(&callback)?;
        validate_context(&caller_context)?;
        validate_key(&lock_key)?;
        Ok(Self {
            callback,
            caller_context,
            lock_key,
        })
    }

    pub fn callback(&self) -> &ProgressCallback {
        &self.callback
    }

    pub fn caller_context(&self) -> &str {
        &self.caller_context
    }

    pub fn lock_key(&self) -> &str {
        &self.lock_key
    }

    pub fn lock_timeout(&self) -> Duration {
        self.callback.lock_timeout()
    }
}

/// Request for a shared lock over a set of keys
#[derive(Clone, Debug)]
pub struct ReadLockRequest {
    callback: ProgressCallback,
    caller_context: String,
    lock_keys: Vec<String>,
}

impl ReadLockRequest {
    /// Duplicate keys are collapsed; first-seen order is kept.
    pub fn new<I, K>(
        callback: ProgressCallback,
        caller_context: impl Into<String>,
        lock_keys: I,
    ) -> Result<Self, LockError>
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        let caller_context = caller_context.into();
        validate_callback(&callback)?;
        validate_context(&caller_context)?;

        let mut keys: Vec<String> = Vec::new();
        for key in lock_keys {
            let key = key.into();
            validate_key(&key)?;
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        if keys.is_empty() {
            return Err(LockError::InvalidRequest(
                "at least one lock key is required".into(),
            ));
        }

        Ok(Self {
            callback,
            caller_context,
            lock_keys: keys,
        })
    }

    pub fn callback(&self) -> &ProgressCallback {
        &self.callback
    }

    pub fn caller_context(&self) -> &str {
        &self.caller_context
    }

    pub fn lock_keys(&self) -> &[String] {
        &self.lock_keys
    }

    pub fn lock_timeout(&self) -> Duration {
        self.callback.lock_timeout()
    }
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
