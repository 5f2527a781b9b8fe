//! Crawl coordination: the bounded scan queue, the fixed worker pool that
//! drains it, and the control surface exposed to external callers.

pub mod queue;
pub mod throttle;
mod worker;

pub use queue::ScanQueue;
pub use throttle::ScanThrottle;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::info;

use crate::core::config::ScannerConfig;
use crate::core::events::{Event, StatusHub};
use crate::core::model::{RepoId, StatusSnapshot};
use crate::github::fetcher::FileSource;
use crate::github::tokens::TokenPool;
use crate::store::Store;

/// Scan completions inside the current rolling minute, kept for the status
/// payload.
struct MinuteWindow {
    completed: u32,
    started: Instant,
}

pub struct Scanner {
    cfg: ScannerConfig,
    queue: ScanQueue,
    throttle: ScanThrottle,
    store: Arc<dyn Store>,
    source: Arc<dyn FileSource>,
    pool: Arc<TokenPool>,
    hub: Arc<StatusHub>,
    running: AtomicBool,
    total_scanned: AtomicU64,
    total_found: AtomicU64,
    minute: Mutex<MinuteWindow>,
}

impl Scanner {
    pub fn new(
        cfg: ScannerConfig,
        store: Arc<dyn Store>,
        source: Arc<dyn FileSource>,
        pool: Arc<TokenPool>,
        hub: Arc<StatusHub>,
    ) -> Arc<Self> {
        Arc::new(Self {
            queue: ScanQueue::new(cfg.max_queue_size),
            throttle: ScanThrottle::per_minute(cfg.scans_per_minute),
            cfg,
            store,
            source,
            pool,
            hub,
            running: AtomicBool::new(false),
            total_scanned: AtomicU64::new(0),
            total_found: AtomicU64::new(0),
            minute: Mutex::new(MinuteWindow {
                completed: 0,
                started: Instant::now(),
            }),
        })
    }

    /// Spawns the worker pool. Idempotent: a second start while running is a
    /// no-op.
    pub fn start(self: &Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("Starting {} scan workers", self.cfg.workers);
        for worker_id in 0..self.cfg.workers {
            let scanner = Arc::clone(self);
            tokio::spawn(async move { worker::run(scanner, worker_id).await });
        }
        self.emit_status();
    }

    /// Advisory stop: workers observe the flag at the top of their loop, so
    /// shutdown may take up to one fetch cycle.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.emit_status();
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Queue admission. Drops pairs already recorded as scanned, already
    /// queued, or currently in flight; drops silently when the queue is full.
    pub async fn add_to_queue(&self, owner: &str, repo: &str) -> bool {
        if self.store.is_repo_scanned(owner, repo).await.unwrap_or(false) {
            return false;
        }
        if !self.queue.try_enqueue(RepoId::new(owner, repo)) {
            return false;
        }
        self.hub.emit(Event::Queue(self.queue.len()));
        true
    }

    pub async fn add_credential(&self, value: &str, label: Option<&str>) -> bool {
        self.pool.add(value, label).await
    }

    pub async fn remove_credential(&self, value: &str) -> bool {
        let removed = self.pool.remove(value);
        if removed {
            let _ = self.store.remove_credential(value).await;
        }
        removed
    }

    /// Point-in-time state. May race with worker updates; a slightly stale
    /// snapshot is acceptable.
    pub fn status(&self) -> StatusSnapshot {
        let repos_per_minute = {
            let minute = self.minute.lock().unwrap();
            if minute.started.elapsed() < Duration::from_secs(60) {
                minute.completed
            } else {
                0
            }
        };
        StatusSnapshot {
            running: self.is_running(),
            repos_per_minute,
            queue_size: self.queue.len(),
            total_found: self.total_found.load(Ordering::SeqCst),
            total_scanned: self.total_scanned.load(Ordering::SeqCst),
            scanning_repos: self.queue.in_flight(),
            credentials: self.pool.status(),
        }
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn queue_is_full(&self) -> bool {
        self.queue.is_full()
    }

    fn emit_status(&self) {
        self.hub.emit(Event::Status(self.status()));
    }

    fn note_completion(&self) {
        let mut minute = self.minute.lock().unwrap();
        if minute.started.elapsed() >= Duration::from_secs(60) {
            minute.completed = 0;
            minute.started = Instant::now();
        }
        minute.completed += 1;
    }
}
