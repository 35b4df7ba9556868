//! Heartbeat specs
//!
//! Verify that progress signals keep leases alive and silence loses them.

use crate::prelude::*;

#[tokio::test(start_paused = true)]
async fn steady_progress_keeps_write_lock_past_its_timeout() {
    let (_semaphore, locks) = fleet(2);
    let progress = callback(3);
    let request = WriteLockRequest::new(progress.clone(), "jobX", "tableA").unwrap();
    let mut lock = locks.get_write_lock(&request).await.unwrap();

    for _ in 0..6 {
        tokio::time::advance(Duration::from_millis(2500)).await;
        progress.progress_made().await.unwrap();
    }

    let err = locks
        .get_write_lock(&write_request("jobY", "tableA"))
        .await
        .err()
        .unwrap();
    assert!(err.is_unavailable());
    lock.close().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn automatic_progress_keeps_read_lock_alive() {
    let (_semaphore, locks) = fleet(2);
    let progress = callback(3);
    let request = ReadLockRequest::new(progress.clone(), "jobX", ["a", "b"]).unwrap();
    let mut lock = locks.get_read_lock(&request).await.unwrap();

    let auto = progress.auto_progress();
    tokio::time::sleep(Duration::from_secs(20)).await;
    auto.stop();

    lock.close().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn silent_lock_expires_and_close_reports_lease_violation() {
    let (_semaphore, locks) = fleet(2);
    let mut lock = locks.get_write_lock(&write_request("jobX", "tableA")).await.unwrap();

    tokio::time::advance(Duration::from_secs(6)).await;

    let mut successor = locks.get_write_lock(&write_request("jobY", "tableA")).await.unwrap();
    let err = lock.close().await.unwrap_err();
    assert!(err.is_lease_violation());
    successor.close().await.unwrap();
}

#[tokio::test]
async fn one_callback_renews_several_locks() {
    let (semaphore, locks) = fleet(2);
    let progress = callback(5);
    let mut writer = locks
        .get_write_lock(&WriteLockRequest::new(progress.clone(), "jobX", "out").unwrap())
        .await
        .unwrap();
    let mut reader = locks
        .get_read_lock(&ReadLockRequest::new(progress.clone(), "jobX", ["in"]).unwrap())
        .await
        .unwrap();
    assert_eq!(progress.listener_count(), 2);

    progress.progress_made().await.unwrap();

    writer.close().await.unwrap();
    assert_eq!(progress.listener_count(), 1);
    reader.close().await.unwrap();
    assert_eq!(progress.listener_count(), 0);
    assert_eq!(live_grants(&semaphore), 0);
}

#[tokio::test]
async fn dropped_lock_is_released_in_background() {
    let (semaphore, locks) = fleet(2);
    let lock = locks.get_write_lock(&write_request("jobX", "tableA")).await.unwrap();
    drop(lock);

    for _ in 0..10 {
        if live_grants(&semaphore) == 0 {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert_eq!(live_grants(&semaphore), 0);
}
