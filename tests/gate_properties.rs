//! Admission properties of the concurrency gate under real contention.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use prodo::gate::{ConcurrencyGate, GateError};

#[tokio::test]
async fn test_capacity_n_admits_exactly_n() {
    let gate = ConcurrencyGate::new(3);
    let timeout = Duration::from_millis(50);

    let mut held = Vec::new();
    for _ in 0..3 {
        held.push(gate.try_acquire(timeout).await.expect("immediate grant"));
    }

    let started = Instant::now();
    let denied = gate.try_acquire(timeout).await;
    assert!(matches!(denied, Err(GateError::Overloaded { .. })));
    assert!(started.elapsed() < Duration::from_secs(1));

    drop(held.pop());
    assert!(gate.try_acquire(timeout).await.is_ok());
}

#[tokio::test]
async fn test_blocked_acquirer_admitted_after_release() {
    let gate = ConcurrencyGate::new(1);
    let permit = gate.try_acquire(Duration::from_millis(10)).await.expect("permit");

    let waiter = {
        let gate = gate.clone();
        tokio::spawn(async move { gate.try_acquire(Duration::from_secs(2)).await.is_ok() })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    permit.release();

    assert!(waiter.await.expect("join"));
}

#[tokio::test]
async fn test_concurrent_holders_never_exceed_capacity() {
    let gate = ConcurrencyGate::new(2);
    let active = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let gate = gate.clone();
            let active = Arc::clone(&active);
            let peak = Arc::clone(&peak);
            tokio::spawn(async move {
                let Ok(_permit) = gate.try_acquire(Duration::from_secs(5)).await else {
                    return;
                };
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                active.fetch_sub(1, Ordering::SeqCst);
            })
        })
        .collect();

    for task in tasks {
        task.await.expect("join");
    }

    assert!(peak.load(Ordering::SeqCst) <= 2);
    assert_eq!(gate.available(), 2);
}
