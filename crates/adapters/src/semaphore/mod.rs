// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Counting semaphore backends

mod memory;

pub use memory::{MemoryCountingSemaphore, MAX_CONTEXT_CHARS};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeCountingSemaphore, SemaphoreCall};
