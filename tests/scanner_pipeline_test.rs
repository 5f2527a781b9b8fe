//! End-to-end scanner pipeline tests against an in-memory store and a stub
//! file source, so no network is involved.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use keyscan::core::config::ScannerConfig;
use keyscan::core::events::StatusHub;
use keyscan::core::model::RepoFile;
use keyscan::github::fetcher::FileSource;
use keyscan::github::TokenPool;
use keyscan::store::{MemoryStore, Store};
use keyscan::{Result, Scanner};

/// A repository source with no scannable files.
struct EmptySource;

#[async_trait]
impl FileSource for EmptySource {
    async fn list_scannable_files(
        &self,
        _owner: &str,
        _repo: &str,
        _max_files: usize,
        _concurrency: usize,
    ) -> Result<Vec<RepoFile>> {
        Ok(Vec::new())
    }
}

/// Every repository exposes the same single leaky file.
struct LeakySource;

#[async_trait]
impl FileSource for LeakySource {
    async fn list_scannable_files(
        &self,
        _owner: &str,
        _repo: &str,
        _max_files: usize,
        _concurrency: usize,
    ) -> Result<Vec<RepoFile>> {
        Ok(vec![RepoFile {
            path: ".env".to_string(),
            content: "OPENAI_KEY=sk-proj-abcdEFGH12345678901234567890\n".to_string(),
        }])
    }
}

fn build_scanner(workers: usize, source: Arc<dyn FileSource>) -> (Arc<Scanner>, Arc<dyn Store>) {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let pool = Arc::new(TokenPool::new(
        Arc::clone(&store),
        "https://api.github.com".to_string(),
        Duration::from_secs(5),
    ));
    let cfg = ScannerConfig {
        workers,
        ..ScannerConfig::default()
    };
    let scanner = Scanner::new(cfg, Arc::clone(&store), source, pool, Arc::new(StatusHub::new()));
    (scanner, store)
}

async fn wait_for<F: Fn() -> bool>(condition: F) {
    for _ in 0..250 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("condition not reached within 5s");
}

#[tokio::test]
async fn single_worker_drains_the_queue_completely() {
    let (scanner, _store) = build_scanner(1, Arc::new(EmptySource));

    assert!(scanner.add_to_queue("octo", "alpha").await);
    assert!(scanner.add_to_queue("octo", "beta").await);
    assert!(scanner.add_to_queue("octo", "gamma").await);
    assert_eq!(scanner.queue_len(), 3);

    scanner.start();
    wait_for(|| scanner.status().total_scanned == 3).await;
    scanner.stop();

    let status = scanner.status();
    assert_eq!(status.total_scanned, 3);
    assert_eq!(status.queue_size, 0);
    assert!(status.scanning_repos.is_empty());
}

#[tokio::test]
async fn concurrent_enqueue_of_the_same_repo_admits_exactly_one() {
    let (scanner, _store) = build_scanner(1, Arc::new(EmptySource));

    let mut handles = Vec::new();
    for _ in 0..10 {
        let scanner = Arc::clone(&scanner);
        handles.push(tokio::spawn(async move {
            scanner.add_to_queue("octo", "contested").await
        }));
    }

    let mut admitted = 0;
    for handle in handles {
        if handle.await.unwrap() {
            admitted += 1;
        }
    }
    assert_eq!(admitted, 1);
    assert_eq!(scanner.queue_len(), 1);
}

#[tokio::test]
async fn scanned_repos_are_rejected_at_admission() {
    let (scanner, store) = build_scanner(1, Arc::new(EmptySource));
    store.mark_repo_scanned("octo", "done", 0).await.unwrap();

    assert!(!scanner.add_to_queue("octo", "done").await);
    assert_eq!(scanner.queue_len(), 0);
}

#[tokio::test]
async fn identical_keys_across_repos_produce_one_finding() {
    let (scanner, store) = build_scanner(1, Arc::new(LeakySource));

    assert!(scanner.add_to_queue("octo", "alpha").await);
    assert!(scanner.add_to_queue("octo", "fork").await);

    scanner.start();
    wait_for(|| scanner.status().total_scanned == 2).await;
    scanner.stop();

    // Both repos settle, but the second one's key dedups by hash.
    let status = scanner.status();
    assert_eq!(status.total_found, 1);
    assert!(store.is_repo_scanned("octo", "alpha").await.unwrap());
    assert!(store.is_repo_scanned("octo", "fork").await.unwrap());
}

#[tokio::test]
async fn queue_rejects_beyond_capacity() {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let pool = Arc::new(TokenPool::new(
        Arc::clone(&store),
        "https://api.github.com".to_string(),
        Duration::from_secs(5),
    ));
    let cfg = ScannerConfig {
        workers: 1,
        max_queue_size: 2,
        ..ScannerConfig::default()
    };
    let scanner = Scanner::new(cfg, store, Arc::new(EmptySource), pool, Arc::new(StatusHub::new()));

    assert!(scanner.add_to_queue("octo", "one").await);
    assert!(scanner.add_to_queue("octo", "two").await);
    assert!(!scanner.add_to_queue("octo", "three").await);
    assert!(scanner.queue_is_full());
}
