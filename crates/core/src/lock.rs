// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lock handles and the errors they raise
//!
//! A logical lock key maps onto two physical semaphore keys: one for the
//! single writer and one for the bounded set of readers.

use crate::semaphore::SemaphoreError;
use crate::token::LockToken;
use async_trait::async_trait;
use thiserror::Error;

pub const WRITER_LOCK_SUFFIX: &str = "_WRITER_LOCK";
pub const READER_LOCK_SUFFIX: &str = "_READER_LOCK";

/// Physical semaphore key guarding writers of `key`
pub fn writer_key(key: &str) -> String {
    format!("{key}{WRITER_LOCK_SUFFIX}")
}

/// Physical semaphore key guarding readers of `key`
pub fn reader_key(key: &str) -> String {
    format!("{key}{READER_LOCK_SUFFIX}")
}

/// Kind of lock, reported when an acquisition collides
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LockType {
    Read,
    Write,
}

impl std::fmt::Display for LockType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LockType::Read => write!(f, "read"),
            LockType::Write => write!(f, "write"),
        }
    }
}

fn held_by(context: &Option<String>) -> String {
    match context {
        Some(context) => format!(" (held by: {context})"),
        None => String::new(),
    }
}

/// Errors from lock acquisition and release
#[derive(Debug, Error)]
pub enum LockError {
    /// A conflicting lock is held right now; try again later.
    #[error("{lock_type} lock unavailable for key '{key}'{}", held_by(.holder_context))]
    Unavailable {
        lock_type: LockType,
        key: String,
        holder_context: Option<String>,
    },
    #[error("invalid lock request: {0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Semaphore(#[from] SemaphoreError),
}

impl LockError {
    pub fn unavailable(lock_type: LockType, key: impl Into<String>, holder: Option<String>) -> Self {
        LockError::Unavailable {
            lock_type,
            key: key.into(),
            holder_context: holder,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, LockError::Unavailable { .. })
    }

    pub fn is_lease_violation(&self) -> bool {
        matches!(self, LockError::Semaphore(e) if e.is_lease_violation())
    }

    /// Context of the holder that blocked an acquisition, when still known
    pub fn holder_context(&self) -> Option<&str> {
        match self {
            LockError::Unavailable { holder_context, .. } => holder_context.as_deref(),
            _ => None,
        }
    }
}

/// A held lock. Must be closed by the call site that acquired it.
#[async_trait]
pub trait Lock: Send {
    /// Stop renewing and release every token.
    ///
    /// All tokens are released even when one release fails; the first failure
    /// is returned afterwards. Closing a second time does nothing.
    async fn close(&mut self) -> Result<(), LockError>;

    fn is_closed(&self) -> bool;

    /// Physical semaphore keys and the tokens held on them
    fn held_tokens(&self) -> Vec<(&str, &LockToken)>;
}

/// Shared lock over one or more keys
pub trait ReadLock: Lock {}

/// Exclusive-writer lock over one key.
///
/// Existing readers are not waited for; callers that need readers drained poll
/// [`WriteLock::existing_read_lock_context`] themselves.
#[async_trait]
pub trait WriteLock: Lock {
    async fn existing_read_lock_context(&self) -> Result<Option<String>, LockError>;
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
