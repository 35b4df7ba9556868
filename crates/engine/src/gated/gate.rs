// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Kill switches checked before a gated run touches the semaphore

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Decides whether a gated job may run right now
#[async_trait]
pub trait Gate: Send + Sync {
    async fn can_run(&self) -> bool;
}

/// Gate that never blocks
#[derive(Clone, Copy, Debug, Default)]
pub struct AlwaysOpen;

#[async_trait]
impl Gate for AlwaysOpen {
    async fn can_run(&self) -> bool {
        true
    }
}

/// Shared on/off switch; clones flip the same switch
#[derive(Clone, Debug)]
pub struct SwitchGate {
    open: Arc<AtomicBool>,
}

impl SwitchGate {
    pub fn new(open: bool) -> Self {
        Self {
            open: Arc::new(AtomicBool::new(open)),
        }
    }

    pub fn open(&self) {
        self.open.store(true, Ordering::SeqCst);
    }

    pub fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

impl Default for SwitchGate {
    fn default() -> Self {
        Self::new(true)
    }
}

#[async_trait]
impl Gate for SwitchGate {
    async fn can_run(&self) -> bool {
        self.is_open()
    }
}
