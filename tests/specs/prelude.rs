//! Shared helpers for the behavioral specs

pub use fleetlock_adapters::{
    FakeCountingSemaphore, MemoryCountingSemaphore, SemaphoreCall, TracedCountingSemaphore,
};
pub use fleetlock_core::{
    CountingSemaphore, Lock, LockError, LockType, ProgressCallback, ReadLockRequest,
    SequentialTokenGen, TokioClock, WriteLock, WriteLockRequest,
};
pub use fleetlock_engine::{
    ProgressingRunner, RunOutcome, SemaphoreGatedRunner, SemaphoreGatedRunnerConfiguration,
    SemaphoreGatedWorkerStack, SemaphoreGatedWorkerStackConfiguration, SwitchGate, TaskError,
    WriteReadSemaphore,
};
pub use std::time::Duration;

/// Semaphore shared by every worker of a simulated fleet
pub type FleetSemaphore = TracedCountingSemaphore<MemoryCountingSemaphore<TokioClock, SequentialTokenGen>>;

pub fn fleet_semaphore() -> FleetSemaphore {
    TracedCountingSemaphore::new(MemoryCountingSemaphore::with_parts(
        TokioClock,
        SequentialTokenGen::new("grant"),
    ))
}

/// A fleet semaphore and a reader/writer view of it
pub fn fleet(max_readers: u32) -> (FleetSemaphore, WriteReadSemaphore<FleetSemaphore>) {
    let semaphore = fleet_semaphore();
    let locks = WriteReadSemaphore::new(semaphore.clone(), max_readers).unwrap();
    (semaphore, locks)
}

/// Live grants held on the fleet semaphore
pub fn live_grants(semaphore: &FleetSemaphore) -> usize {
    semaphore.inner().stats().live_grants
}

pub fn callback(secs: u64) -> ProgressCallback {
    ProgressCallback::new(Duration::from_secs(secs))
}

pub fn write_request(context: &str, key: &str) -> WriteLockRequest {
    WriteLockRequest::new(callback(5), context, key).unwrap()
}

pub fn read_request(context: &str, keys: &[&str]) -> ReadLockRequest {
    ReadLockRequest::new(callback(5), context, keys.iter().copied()).unwrap()
}

/// Split an unavailable error into (type, key, holder)
pub fn unavailable(err: &LockError) -> (LockType, String, Option<String>) {
    match err {
        LockError::Unavailable {
            lock_type,
            key,
            holder_context,
        } => (*lock_type, key.clone(), holder_context.clone()),
        other => panic!("expected Unavailable, got {other:?}"),
    }
}
