use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::core::events::Event;
use crate::core::model::{Detection, OutcomeKind, RepoId, ScanOutcome};
use crate::store::NewFinding;

use super::Scanner;

const IDLE_POLL: Duration = Duration::from_millis(200);

/// Worker loop. Runs until the scanner's running flag drops.
pub(super) async fn run(scanner: Arc<Scanner>, worker_id: usize) {
    debug!("Worker {} started", worker_id);
    while scanner.is_running() {
        if scanner.queue.is_empty() {
            tokio::time::sleep(IDLE_POLL).await;
            continue;
        }
        // Take a rate-limit slot only once there is work to take, so idle
        // polling does not drain the per-minute quota. The wait ends early
        // on stop instead of sitting out the window.
        if !scanner
            .throttle
            .acquire_while(|| scanner.is_running())
            .await
        {
            continue;
        }
        let Some(id) = scanner.queue.pop_in_flight() else {
            tokio::time::sleep(IDLE_POLL).await;
            continue;
        };
        scanner.emit_status();

        let outcome = scan_repo(&scanner, &id).await;
        scanner.queue.finish(&id);

        if outcome.error != Some(OutcomeKind::AlreadyScanned) {
            scanner.total_scanned.fetch_add(1, Ordering::SeqCst);
            scanner.note_completion();
        }
        scanner
            .total_found
            .fetch_add(outcome.findings.len() as u64, Ordering::SeqCst);
        scanner.emit_status();
        if !outcome.findings.is_empty() {
            scanner.hub.emit(Event::Finding(outcome));
        }
    }
    debug!("Worker {} stopped", worker_id);
}

/// Scans a single repository end to end: fetch candidate files, run detection
/// over each, persist novel findings. The repo is marked scanned on every
/// path out of here except the duplicate-claim race, so failures are not
/// retried.
async fn scan_repo(scanner: &Scanner, id: &RepoId) -> ScanOutcome {
    let started = Instant::now();

    // Another worker may have settled this repo between admission and here.
    if scanner
        .store
        .is_repo_scanned(&id.owner, &id.name)
        .await
        .unwrap_or(false)
    {
        return ScanOutcome {
            owner: id.owner.clone(),
            repo: id.name.clone(),
            findings: Vec::new(),
            files_scanned: 0,
            duration_ms: 0,
            error: Some(OutcomeKind::AlreadyScanned),
        };
    }

    let files = match scanner
        .source
        .list_scannable_files(
            &id.owner,
            &id.name,
            scanner.cfg.max_files_per_repo,
            scanner.cfg.fetch_concurrency,
        )
        .await
    {
        Ok(files) => files,
        Err(err) => {
            let kind = if err.is_rate_limited() {
                OutcomeKind::RateLimited
            } else {
                OutcomeKind::FetchFailed
            };
            warn!("Fetch failed for {}: {}", id, err);
            let _ = scanner.store.mark_repo_scanned(&id.owner, &id.name, 0).await;
            return ScanOutcome {
                owner: id.owner.clone(),
                repo: id.name.clone(),
                findings: Vec::new(),
                files_scanned: 0,
                duration_ms: started.elapsed().as_millis() as u64,
                error: Some(kind),
            };
        }
    };

    if files.is_empty() {
        let _ = scanner.store.mark_repo_scanned(&id.owner, &id.name, 0).await;
        return ScanOutcome {
            owner: id.owner.clone(),
            repo: id.name.clone(),
            findings: Vec::new(),
            files_scanned: 0,
            duration_ms: started.elapsed().as_millis() as u64,
            error: Some(OutcomeKind::NoFiles),
        };
    }

    let mut findings: Vec<Detection> = Vec::new();
    for file in &files {
        for detection in crate::detect::detect(&file.content, &file.path) {
            // Cross-repo dedup by hash: the first repo to surface a key owns
            // the finding.
            match scanner.store.find_by_hash(&detection.key_hash).await {
                Ok(Some(_)) => continue,
                Ok(None) => {}
                Err(err) => {
                    debug!("Finding lookup failed: {}", err);
                    continue;
                }
            }
            let record = NewFinding {
                provider: detection.provider,
                key_masked: detection.key_masked.clone(),
                key_hash: detection.key_hash.clone(),
                repo_owner: id.owner.clone(),
                repo_name: id.name.clone(),
                file_path: file.path.clone(),
                url: format!(
                    "https://github.com/{}/{}/blob/main/{}",
                    id.owner, id.name, file.path
                ),
                line: detection.line,
                confidence: detection.confidence,
            };
            match scanner.store.create_finding(record).await {
                Ok(_) => findings.push(detection),
                Err(err) => debug!("Persisting finding failed: {}", err),
            }
        }
    }

    let _ = scanner
        .store
        .mark_repo_scanned(&id.owner, &id.name, findings.len())
        .await;

    ScanOutcome {
        owner: id.owner.clone(),
        repo: id.name.clone(),
        findings,
        files_scanned: files.len(),
        duration_ms: started.elapsed().as_millis() as u64,
        error: None,
    }
}
