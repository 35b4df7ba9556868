//! Gated worker stack specs
//!
//! Verify that a closed gate keeps a job off the semaphore entirely.

use crate::prelude::*;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Clone, Default)]
struct CleanupJob {
    runs: Arc<AtomicUsize>,
}

#[async_trait]
impl ProgressingRunner for CleanupJob {
    async fn run(&self, progress: &ProgressCallback) -> Result<(), TaskError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        progress.progress_made().await?;
        Ok(())
    }
}

fn stack(
    semaphore: &FakeCountingSemaphore,
    job: &CleanupJob,
    gate: &SwitchGate,
) -> SemaphoreGatedWorkerStack<FakeCountingSemaphore> {
    let runner_config = SemaphoreGatedRunnerConfiguration::new()
        .with_runner(job.clone())
        .with_lock_key("cleanup")
        .with_lock_timeout(Duration::from_secs(10));
    let config = SemaphoreGatedWorkerStackConfiguration::new(runner_config).with_gate(gate.clone());
    SemaphoreGatedWorkerStack::new(semaphore.clone(), config).unwrap()
}

#[tokio::test]
async fn closed_gate_skips_without_semaphore_calls() {
    let semaphore = FakeCountingSemaphore::new();
    let job = CleanupJob::default();
    let gate = SwitchGate::new(false);

    let outcome = stack(&semaphore, &job, &gate).run().await.unwrap();

    assert_eq!(outcome, RunOutcome::GateClosed);
    assert!(semaphore.calls().is_empty());
    assert_eq!(job.runs.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn open_gate_runs_under_the_lock() {
    let semaphore = FakeCountingSemaphore::new();
    let job = CleanupJob::default();
    let gate = SwitchGate::new(true);

    let outcome = stack(&semaphore, &job, &gate).run().await.unwrap();

    assert_eq!(outcome, RunOutcome::Completed);
    assert_eq!(job.runs.load(Ordering::SeqCst), 1);
    let kinds: Vec<&str> = semaphore
        .calls()
        .iter()
        .map(|call| match call {
            SemaphoreCall::Acquire { .. } => "acquire",
            SemaphoreCall::Refresh { .. } => "refresh",
            SemaphoreCall::Release { .. } => "release",
            SemaphoreCall::FirstUnexpiredContext { .. } => "lookup",
        })
        .collect();
    assert_eq!(kinds, ["acquire", "refresh", "release"]);
}
