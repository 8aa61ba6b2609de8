//! Lifecycle and timing tests for the discovery daemon, driven by a fake
//! prober. Timing tests run on tokio's paused clock.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use netmap_core::{Device, Topology};
use netmap_discover::error::Result as ScanResult;
use netmap_discover::{DaemonController, DaemonError, Prober, ScanError, TopologyStore};

/// Prober that records when it was called and how many calls overlap.
#[derive(Default)]
struct FakeProber {
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    fail_first: usize,
    delay: Duration,
    times: Mutex<Vec<Instant>>,
}

impl FakeProber {
    fn failing_first(n: usize) -> Self {
        Self {
            fail_first: n,
            ..Default::default()
        }
    }

    fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Default::default()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn gaps(&self) -> Vec<Duration> {
        let times = self.times.lock().unwrap();
        times.windows(2).map(|w| w[1] - w[0]).collect()
    }
}

#[async_trait]
impl Prober for FakeProber {
    async fn scan(&self, range: &str) -> ScanResult<Topology> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        self.times.lock().unwrap().push(Instant::now());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if n < self.fail_first {
            return Err(ScanError::NmapFailed {
                code: 1,
                stderr: format!("cannot scan {range}"),
            });
        }
        Ok(Topology::new(
            vec![Device::new("192.168.1.1", "gw", "up")],
            vec![],
        ))
    }
}

fn controller(prober: Arc<FakeProber>, interval_secs: i64) -> DaemonController {
    DaemonController::new(prober, Arc::new(TopologyStore::in_memory()), interval_secs)
}

const RANGE: &str = "192.168.1.0/24";

#[tokio::test(start_paused = true)]
async fn start_reports_interval_and_rejects_second_start() {
    let prober = Arc::new(FakeProber::default());
    let ctl = controller(prober.clone(), 30);

    assert_eq!(ctl.start(RANGE).await, Ok(30));
    assert_eq!(ctl.start("10.0.0.0/8").await, Err(DaemonError::AlreadyRunning));
    assert_eq!(ctl.active_tasks(), 1);

    let status = ctl.status().await;
    assert!(status.running);
    assert_eq!(status.network_range.as_deref(), Some(RANGE));
    assert_eq!(status.interval_secs, 30);

    tokio::time::sleep(Duration::from_secs(95)).await;
    assert_eq!(ctl.active_tasks(), 1);
    assert_eq!(prober.max_in_flight.load(Ordering::SeqCst), 1);
    // Scans at 0, 30, 60, 90.
    assert_eq!(prober.calls(), 4);

    ctl.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn stop_joins_task_and_writes_cease() {
    let prober = Arc::new(FakeProber::default());
    let ctl = controller(prober.clone(), 1);

    ctl.start(RANGE).await.unwrap();
    tokio::time::sleep(Duration::from_millis(3500)).await;

    assert_eq!(ctl.stop().await, Ok(()));
    assert_eq!(ctl.active_tasks(), 0);
    assert!(!ctl.is_running().await);

    let calls = prober.calls();
    assert!(calls >= 3);
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(prober.calls(), calls);
}

#[tokio::test(start_paused = true)]
async fn stop_when_stopped_fails_and_changes_nothing() {
    let ctl = controller(Arc::new(FakeProber::default()), 300);
    let before = ctl.status().await;

    assert_eq!(ctl.stop().await, Err(DaemonError::NotRunning));
    assert_eq!(ctl.status().await, before);
    assert!(!before.running);
    assert!(ctl.store().get().is_none());
}

#[tokio::test(start_paused = true)]
async fn interval_spaces_consecutive_snapshots() {
    for n in [1_i64, 5, 60] {
        let prober = Arc::new(FakeProber::default());
        let ctl = controller(prober.clone(), 300);

        assert_eq!(ctl.set_interval(n).await, n);
        assert_eq!(ctl.start(RANGE).await, Ok(n));
        tokio::time::sleep(Duration::from_secs(n as u64 * 4) + Duration::from_millis(500)).await;
        ctl.stop().await.unwrap();

        let expected = Duration::from_secs(n as u64);
        let gaps = prober.gaps();
        assert!(gaps.len() >= 3, "interval {n}: only {} gaps", gaps.len());
        for gap in gaps {
            assert!(
                gap >= expected && gap < expected + Duration::from_millis(100),
                "interval {n}: gap {gap:?}"
            );
        }
    }
}

#[tokio::test(start_paused = true)]
async fn interval_change_applies_from_next_wait() {
    let prober = Arc::new(FakeProber::default());
    let ctl = controller(prober.clone(), 60);

    ctl.start(RANGE).await.unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    ctl.set_interval(5).await;
    assert_eq!(ctl.interval(), 5);

    // The wait already in progress keeps its 60s length.
    tokio::time::sleep(Duration::from_secs(58)).await;
    assert_eq!(prober.calls(), 1);

    tokio::time::sleep(Duration::from_secs(7)).await;
    ctl.stop().await.unwrap();

    let gaps = prober.gaps();
    assert_eq!(gaps.len(), 2);
    assert!(gaps[0] >= Duration::from_secs(60) && gaps[0] < Duration::from_secs(61));
    assert!(gaps[1] >= Duration::from_secs(5) && gaps[1] < Duration::from_secs(6));
}

#[tokio::test(start_paused = true)]
async fn scan_failure_does_not_end_the_loop() {
    let prober = Arc::new(FakeProber::failing_first(1));
    let store = Arc::new(TopologyStore::in_memory());
    let ctl = DaemonController::new(prober.clone(), store.clone(), 1);

    ctl.start(RANGE).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    let failed = store.get().unwrap();
    assert!(failed.error().unwrap().contains("cannot scan 192.168.1.0/24"));

    tokio::time::sleep(Duration::from_secs(1)).await;
    let current = store.get().unwrap();
    assert_eq!(current.topology().unwrap().devices.len(), 1);
    assert!(ctl.is_running().await);
    assert_eq!(ctl.active_tasks(), 1);

    ctl.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn stop_waits_for_in_flight_scan() {
    let prober = Arc::new(FakeProber::slow(Duration::from_secs(10)));
    let store = Arc::new(TopologyStore::in_memory());
    let ctl = DaemonController::new(prober.clone(), store.clone(), 300);

    ctl.start(RANGE).await.unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(store.get().is_none());

    let begun = Instant::now();
    ctl.stop().await.unwrap();
    assert!(begun.elapsed() >= Duration::from_secs(9));
    assert_eq!(ctl.active_tasks(), 0);
    assert!(store.get().is_some());
    assert_eq!(prober.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn concurrent_starts_yield_one_task() {
    let prober = Arc::new(FakeProber::default());
    let ctl = controller(prober.clone(), 10);

    let (a, b) = tokio::join!(ctl.start(RANGE), ctl.start(RANGE));
    let oks = [&a, &b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(oks, 1);
    assert!(a == Err(DaemonError::AlreadyRunning) || b == Err(DaemonError::AlreadyRunning));
    assert_eq!(ctl.active_tasks(), 1);

    ctl.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_starts_across_threads() {
    let prober = Arc::new(FakeProber::default());
    let ctl = Arc::new(controller(prober.clone(), 3600));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let ctl = ctl.clone();
            tokio::spawn(async move { ctl.start(RANGE).await })
        })
        .collect();

    let mut oks = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(interval) => {
                assert_eq!(interval, 3600);
                oks += 1;
            }
            Err(e) => assert_eq!(e, DaemonError::AlreadyRunning),
        }
    }
    assert_eq!(oks, 1);
    assert!(ctl.active_tasks() <= 1);

    ctl.stop().await.unwrap();
    assert_eq!(ctl.active_tasks(), 0);
    assert!(prober.max_in_flight.load(Ordering::SeqCst) <= 1);
}

#[tokio::test(start_paused = true)]
async fn restart_after_stop() {
    let prober = Arc::new(FakeProber::default());
    let ctl = controller(prober.clone(), 5);

    ctl.start(RANGE).await.unwrap();
    ctl.stop().await.unwrap();
    assert_eq!(ctl.start("10.0.0.0/24").await, Ok(5));
    assert_eq!(ctl.active_tasks(), 1);
    assert_eq!(
        ctl.status().await.network_range.as_deref(),
        Some("10.0.0.0/24")
    );
    ctl.stop().await.unwrap();
}

#[tokio::test]
async fn zero_and_negative_intervals_are_accepted() {
    let prober = Arc::new(FakeProber::default());
    let ctl = controller(prober.clone(), 300);

    assert_eq!(ctl.set_interval(-5).await, -5);
    assert_eq!(ctl.interval(), -5);
    assert_eq!(ctl.set_interval(0).await, 0);

    ctl.start(RANGE).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    ctl.stop().await.unwrap();

    assert!(prober.calls() > 1);
    assert_eq!(ctl.active_tasks(), 0);
}

#[tokio::test(start_paused = true)]
async fn daemon_persists_snapshots() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("current_topology.json");
    let store = Arc::new(TopologyStore::open(&path));
    let ctl = DaemonController::new(Arc::new(FakeProber::default()), store, 60);

    ctl.start(RANGE).await.unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    ctl.stop().await.unwrap();

    let reopened = TopologyStore::open(&path);
    let snapshot = reopened.get().unwrap();
    assert_eq!(snapshot.topology().unwrap().devices[0].ip, "192.168.1.1");
}

/// Prober with a bug: the first scan panics, later ones succeed.
#[derive(Default)]
struct PanickingProber {
    calls: AtomicUsize,
}

#[async_trait]
impl Prober for PanickingProber {
    async fn scan(&self, _range: &str) -> ScanResult<Topology> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            panic!("prober bug");
        }
        Ok(Topology::default())
    }
}

#[tokio::test(start_paused = true)]
async fn dead_polling_task_is_reported_stopped_and_can_restart() {
    let prober = Arc::new(PanickingProber::default());
    let ctl = DaemonController::new(prober.clone(), Arc::new(TopologyStore::in_memory()), 60);

    ctl.start(RANGE).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let status = ctl.status().await;
    assert!(!status.running);
    assert_eq!(status.active_tasks, 0);
    assert!(!ctl.is_running().await);

    assert_eq!(ctl.start(RANGE).await, Ok(60));
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(ctl.is_running().await);
    assert_eq!(ctl.active_tasks(), 1);
    assert_eq!(prober.calls.load(Ordering::SeqCst), 2);

    ctl.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn stop_after_task_died_reports_not_running() {
    let ctl = DaemonController::new(
        Arc::new(PanickingProber::default()),
        Arc::new(TopologyStore::in_memory()),
        60,
    );

    ctl.start(RANGE).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(ctl.stop().await, Err(DaemonError::NotRunning));
}
