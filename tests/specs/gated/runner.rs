//! Semaphore-gated runner specs
//!
//! Verify fleet-wide exclusivity of recurring jobs and their lease handling.

use crate::prelude::*;
use async_trait::async_trait;
use fleetlock_engine::GatedLockSettings;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Clone, Default)]
struct ReportJob {
    runs: Arc<AtomicUsize>,
    work: Duration,
}

#[async_trait]
impl ProgressingRunner for ReportJob {
    async fn run(&self, _progress: &ProgressCallback) -> Result<(), TaskError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.work).await;
        Ok(())
    }
}

fn worker(semaphore: &FleetSemaphore, job: &ReportJob) -> SemaphoreGatedRunner<FleetSemaphore> {
    let config = SemaphoreGatedRunnerConfiguration::new()
        .with_runner(job.clone())
        .with_lock_key("nightly-report")
        .with_lock_timeout(Duration::from_secs(3))
        .with_max_lock_count(1);
    SemaphoreGatedRunner::new(semaphore.clone(), config).unwrap()
}

#[tokio::test(start_paused = true)]
async fn singleton_job_runs_once_across_concurrent_workers() {
    let semaphore = fleet_semaphore();
    let job = ReportJob {
        work: Duration::from_secs(1),
        ..ReportJob::default()
    };
    let first = worker(&semaphore, &job);
    let second = worker(&semaphore, &job);

    let (a, b) = tokio::join!(first.run(), second.run());
    let outcomes = [a.unwrap(), b.unwrap()];

    assert!(outcomes.contains(&RunOutcome::Completed));
    assert!(outcomes.contains(&RunOutcome::LockUnavailable));
    assert_eq!(job.runs.load(Ordering::SeqCst), 1);
    assert_eq!(live_grants(&semaphore), 0);
}

#[tokio::test(start_paused = true)]
async fn long_job_keeps_its_lock_with_automatic_heartbeat() {
    let semaphore = fleet_semaphore();
    let job = ReportJob {
        work: Duration::from_secs(30),
        ..ReportJob::default()
    };
    let runner = worker(&semaphore, &job);
    let competitor = worker(&semaphore, &job);

    let running = tokio::spawn(async move { runner.run().await });
    tokio::time::sleep(Duration::from_secs(20)).await;
    assert_eq!(competitor.run().await.unwrap(), RunOutcome::LockUnavailable);

    assert_eq!(running.await.unwrap().unwrap(), RunOutcome::Completed);
    assert_eq!(job.runs.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn sequential_ticks_each_run_the_job() {
    let semaphore = fleet_semaphore();
    let job = ReportJob::default();
    let runner = worker(&semaphore, &job);

    for _ in 0..3 {
        assert_eq!(runner.run().await.unwrap(), RunOutcome::Completed);
    }
    assert_eq!(job.runs.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn job_settings_load_from_toml() {
    let settings: GatedLockSettings = toml::from_str(
        r#"
        lock_key = "table-rebuild"
        lock_timeout = "45s"
        max_lock_count = 2
        "#,
    )
    .unwrap();
    let job = ReportJob::default();
    let config = SemaphoreGatedRunnerConfiguration::from_settings(settings).with_runner(job.clone());
    let semaphore = FakeCountingSemaphore::new();

    let runner = SemaphoreGatedRunner::new(semaphore.clone(), config).unwrap();
    assert_eq!(runner.run().await.unwrap(), RunOutcome::Completed);

    assert!(matches!(
        &semaphore.calls()[0],
        SemaphoreCall::Acquire { key, timeout, max_lock_count: 2, .. }
            if key == "table-rebuild" && *timeout == Duration::from_secs(45)
    ));
}

#[derive(Clone, Default)]
struct ImportJob {
    runs: Arc<AtomicUsize>,
}

#[async_trait]
impl ProgressingRunner for ImportJob {
    async fn run(&self, _progress: &ProgressCallback) -> Result<(), TaskError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        // Synchronous work that never yields to the runtime
        std::thread::sleep(Duration::from_millis(1800));
        Ok(())
    }
}

#[tokio::test]
async fn blocking_job_keeps_its_lease_on_a_single_threaded_runtime() {
    let semaphore = fleet_semaphore();
    let job = ImportJob::default();
    let config = SemaphoreGatedRunnerConfiguration::new()
        .with_runner(job.clone())
        .with_lock_key("bulk-import")
        .with_lock_timeout(Duration::from_secs(1));
    let runner = SemaphoreGatedRunner::new(semaphore.clone(), config).unwrap();

    assert_eq!(runner.run().await.unwrap(), RunOutcome::Completed);
    assert_eq!(job.runs.load(Ordering::SeqCst), 1);
    assert_eq!(live_grants(&semaphore), 0);
}
