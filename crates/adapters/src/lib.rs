// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Counting semaphore backends and wrappers

pub mod maintenance;
pub mod semaphore;
pub mod traced;

pub use maintenance::{MaintenanceConfig, MaintenanceHandle, MaintenanceTask, SemaphoreStats};
pub use semaphore::{MemoryCountingSemaphore, MAX_CONTEXT_CHARS};
pub use traced::TracedCountingSemaphore;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use semaphore::{FakeCountingSemaphore, SemaphoreCall};
