//! Reader/writer lock specs
//!
//! Verify writer exclusivity, bounded readers and all-or-nothing reads.

use crate::prelude::*;

#[tokio::test]
async fn second_writer_fails_while_first_holds_and_succeeds_after_close() {
    let (_semaphore, locks) = fleet(4);
    let mut first = locks.get_write_lock(&write_request("jobX", "tableA")).await.unwrap();

    let err = locks
        .get_write_lock(&write_request("jobY", "tableA"))
        .await
        .err()
        .unwrap();
    assert_eq!(
        unavailable(&err),
        (LockType::Write, "tableA".to_string(), Some("jobX".to_string()))
    );
    assert_eq!(
        err.to_string(),
        "write lock unavailable for key 'tableA' (held by: jobX)"
    );

    first.close().await.unwrap();
    let mut second = locks.get_write_lock(&write_request("jobY", "tableA")).await.unwrap();
    second.close().await.unwrap();
}

#[tokio::test]
async fn writer_starts_beside_reader_but_blocks_new_readers() {
    let (_semaphore, locks) = fleet(4);
    let mut reader = locks.get_read_lock(&read_request("reader-1", &["tableA"])).await.unwrap();

    let mut writer = locks.get_write_lock(&write_request("writer", "tableA")).await.unwrap();
    assert_eq!(
        writer.existing_read_lock_context().await.unwrap(),
        Some("reader-1".to_string())
    );

    let err = locks
        .get_read_lock(&read_request("reader-2", &["tableA"]))
        .await
        .err()
        .unwrap();
    assert_eq!(
        unavailable(&err),
        (LockType::Write, "tableA".to_string(), Some("writer".to_string()))
    );

    reader.close().await.unwrap();
    writer.close().await.unwrap();
}

#[tokio::test]
async fn read_lock_holds_one_token_per_key() {
    let (semaphore, locks) = fleet(4);
    let mut lock = locks
        .get_read_lock(&read_request("jobX", &["a", "b", "c"]))
        .await
        .unwrap();

    let keys: Vec<&str> = lock.held_tokens().into_iter().map(|(key, _)| key).collect();
    assert_eq!(keys, ["a_READER_LOCK", "b_READER_LOCK", "c_READER_LOCK"]);
    assert_eq!(live_grants(&semaphore), 3);

    lock.close().await.unwrap();
}

#[tokio::test]
async fn failed_read_lock_leaves_no_tokens_behind() {
    let (semaphore, locks) = fleet(1);
    let mut blocker = locks.get_read_lock(&read_request("blocker", &["c"])).await.unwrap();
    let before = live_grants(&semaphore);

    let err = locks
        .get_read_lock(&read_request("jobX", &["a", "b", "c"]))
        .await
        .err()
        .unwrap();

    assert_eq!(
        unavailable(&err),
        (LockType::Read, "c".to_string(), Some("blocker".to_string()))
    );
    assert_eq!(live_grants(&semaphore), before);

    blocker.close().await.unwrap();
}

#[tokio::test]
async fn acquire_then_close_restores_slot_count() {
    let (semaphore, locks) = fleet(3);
    let before = live_grants(&semaphore);

    let mut writer = locks.get_write_lock(&write_request("w", "t1")).await.unwrap();
    let mut reader = locks.get_read_lock(&read_request("r", &["t2", "t3"])).await.unwrap();
    writer.close().await.unwrap();
    reader.close().await.unwrap();

    assert_eq!(live_grants(&semaphore), before);
    assert_eq!(semaphore.inner().lock_row_count(), 0);
}

#[tokio::test]
async fn two_readers_share_then_third_is_refused() {
    let (_semaphore, locks) = fleet(2);
    let request = ReadLockRequest::new(callback(5), "jobX", ["tableA"]).unwrap();

    let mut first = locks.get_read_lock(&request).await.unwrap();
    let mut second = locks.get_read_lock(&request).await.unwrap();
    let (first_key, first_token) = first.held_tokens()[0];
    let (second_key, second_token) = second.held_tokens()[0];
    assert_eq!(first_key, "tableA_READER_LOCK");
    assert_eq!(second_key, "tableA_READER_LOCK");
    assert_ne!(first_token, second_token);

    let err = locks.get_read_lock(&request).await.err().unwrap();
    assert_eq!(
        unavailable(&err),
        (LockType::Read, "tableA".to_string(), Some("jobX".to_string()))
    );

    first.close().await.unwrap();
    second.close().await.unwrap();
}

#[tokio::test]
async fn close_is_idempotent() {
    let (semaphore, locks) = fleet(2);
    let mut lock = locks.get_write_lock(&write_request("jobX", "tableA")).await.unwrap();

    lock.close().await.unwrap();
    lock.close().await.unwrap();

    assert!(lock.is_closed());
    assert_eq!(live_grants(&semaphore), 0);
}

#[test]
fn invalid_requests_fail_before_reaching_the_semaphore() {
    let short = ReadLockRequest::new(callback(1), "jobX", ["tableA"]).err().unwrap();
    assert!(matches!(short, LockError::InvalidRequest(_)));

    let blank = WriteLockRequest::new(callback(5), "  ", "tableA").err().unwrap();
    assert!(matches!(blank, LockError::InvalidRequest(_)));

    let none = ReadLockRequest::new(callback(5), "jobX", Vec::<String>::new())
        .err()
        .unwrap();
    assert!(matches!(none, LockError::InvalidRequest(_)));
}
