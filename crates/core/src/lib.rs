// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fleetlock-core: contracts for fleet-wide read/write locking
//!
//! This crate provides:
//! - The counting semaphore contract every backend implements
//! - Lock handles, requests, and their errors
//! - Progress callbacks that keep held leases alive

pub mod clock;
pub mod lock;
pub mod progress;
pub mod request;
pub mod semaphore;
pub mod token;

pub use clock::{Clock, FakeClock, SystemClock, TokioClock};
pub use lock::{reader_key, writer_key, Lock, LockError, LockType, ReadLock, WriteLock};
pub use progress::{AutoProgress, ListenerHandle, ProgressCallback, ProgressListener};
pub use request::{ReadLockRequest, WriteLockRequest, MINIMUM_LOCK_TIMEOUT};
pub use semaphore::{CountingSemaphore, SemaphoreError, MAX_CONTEXT_CHARS};
pub use token::{LockToken, SequentialTokenGen, TokenGen, UuidTokenGen};
