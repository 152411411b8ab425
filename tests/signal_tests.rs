use std::sync::Arc;
use std::time::{Duration, Instant};

use salvo::ChangeSignal;

#[tokio::test]
async fn test_stale_version_returns_immediately() {
    let signal = ChangeSignal::new();
    assert_eq!(signal.version(), 0);
    assert_eq!(signal.bump(), 1);

    let observed = tokio::time::timeout(
        Duration::from_millis(100),
        signal.await_change(Some(0), Duration::from_secs(10)),
    )
    .await
    .expect("stale version must not wait");
    assert_eq!(observed.version, 1);
    assert!(!observed.timed_out);

    let fresh = signal.await_change(None, Duration::from_secs(10)).await;
    assert_eq!(fresh.version, 1);
    assert!(!fresh.timed_out);
}

#[tokio::test]
async fn test_times_out_without_bump() {
    let signal = ChangeSignal::new();
    let wait = Duration::from_millis(40);
    let start = Instant::now();
    let observed = signal.await_change(Some(0), wait).await;
    assert!(start.elapsed() >= wait);
    assert!(observed.timed_out);
    assert_eq!(observed.version, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_bump_wakes_every_waiter() {
    let signal = Arc::new(ChangeSignal::new());
    let waiters: Vec<_> = (0..8)
        .map(|_| {
            let signal = signal.clone();
            tokio::spawn(async move { signal.await_change(Some(0), Duration::from_secs(5)).await })
        })
        .collect();
    tokio::time::sleep(Duration::from_millis(20)).await;
    signal.bump();

    for waiter in waiters {
        let observed = waiter.await.unwrap();
        assert!(!observed.timed_out);
        assert_eq!(observed.version, 1);
    }
}

#[tokio::test]
async fn test_abandoned_wait_leaves_version_alone() {
    let signal = ChangeSignal::new();
    let abandoned = tokio::time::timeout(
        Duration::from_millis(10),
        signal.await_change(Some(0), Duration::from_secs(10)),
    )
    .await;
    assert!(abandoned.is_err());
    assert_eq!(signal.version(), 0);

    signal.bump();
    let observed = signal.await_change(Some(0), Duration::from_secs(1)).await;
    assert_eq!(observed.version, 1);
}

#[test]
fn test_bumps_are_counted_across_threads() {
    let signal = Arc::new(ChangeSignal::new());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let signal = signal.clone();
            std::thread::spawn(move || {
                for _ in 0..250 {
                    signal.bump();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(signal.version(), 1000);
}
