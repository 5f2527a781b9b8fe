//! Bounded enumeration and retrieval of a repository's scannable files.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::debug;

use crate::core::error::Result;
use crate::core::model::RepoFile;
use crate::detect::filters;

use super::client::GitHubClient;

/// Source of repository files for a scan. The scanner depends on this trait
/// so tests can substitute canned file sets.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FileSource: Send + Sync {
    async fn list_scannable_files(
        &self,
        owner: &str,
        repo: &str,
        max_files: usize,
        concurrency: usize,
    ) -> Result<Vec<RepoFile>>;
}

#[derive(Debug, Deserialize)]
struct ContentsEntry {
    name: String,
    path: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    download_url: Option<String>,
}

pub struct RepoFetcher {
    client: Arc<GitHubClient>,
}

impl RepoFetcher {
    pub fn new(client: Arc<GitHubClient>) -> Self {
        Self { client }
    }

    /// Breadth-first walk over the contents API, pruning skip-listed paths
    /// and collecting allow-listed files until `max_files` is reached. A
    /// rate-limited listing call ends the traversal with partial results.
    async fn collect_candidates(
        &self,
        owner: &str,
        repo: &str,
        max_files: usize,
    ) -> Vec<(String, String)> {
        let mut candidates: Vec<(String, String)> = Vec::new();
        let mut directories: VecDeque<String> = VecDeque::from([String::new()]);

        while let Some(dir) = directories.pop_front() {
            if candidates.len() >= max_files {
                break;
            }

            let path = format!("/repos/{}/{}/contents/{}", owner, repo, dir);
            let response = match self.client.api_get(&path).await {
                Ok(response) => response,
                Err(e) if e.is_rate_limited() => {
                    debug!(
                        "Rate limited while listing {}/{}, keeping partial results",
                        owner, repo
                    );
                    break;
                }
                Err(e) => {
                    debug!("Listing {}/{}/{} failed: {}", owner, repo, dir, e);
                    continue;
                }
            };
            if !response.is_success() {
                continue;
            }
            let entries: Vec<ContentsEntry> = match response.json() {
                Ok(entries) => entries,
                Err(_) => continue,
            };

            for entry in entries {
                if filters::is_skipped_path(&entry.path) {
                    continue;
                }
                match entry.kind.as_str() {
                    "dir" => directories.push_back(entry.path),
                    "file" => {
                        if candidates.len() >= max_files {
                            break;
                        }
                        if let Some(url) = entry.download_url {
                            if filters::is_scannable_file(&entry.name) {
                                candidates.push((entry.path, url));
                            }
                        }
                    }
                    _ => {}
                }
            }
        }

        candidates
    }
}

#[async_trait]
impl FileSource for RepoFetcher {
    async fn list_scannable_files(
        &self,
        owner: &str,
        repo: &str,
        max_files: usize,
        concurrency: usize,
    ) -> Result<Vec<RepoFile>> {
        let candidates = self.collect_candidates(owner, repo, max_files).await;
        debug!("{}/{}: {} candidate files", owner, repo, candidates.len());

        // Contents come down in fixed-size batches; one bad file never sinks
        // its batch.
        let mut files = Vec::with_capacity(candidates.len());
        for batch in candidates.chunks(concurrency.max(1)) {
            let mut set = tokio::task::JoinSet::new();
            for (path, url) in batch {
                let client = Arc::clone(&self.client);
                let path = path.clone();
                let url = url.clone();
                set.spawn(async move {
                    match client.raw_get(&url).await {
                        Ok(content) => Some(RepoFile { path, content }),
                        Err(e) => {
                            debug!("Skipping {}: {}", path, e);
                            None
                        }
                    }
                });
            }
            while let Some(joined) = set.join_next().await {
                if let Ok(Some(file)) = joined {
                    files.push(file);
                }
            }
        }

        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contents_entries_deserialize_from_api_shape() {
        let json = r#"[
            {"name": ".env", "path": ".env", "type": "file",
             "download_url": "https://raw.githubusercontent.com/o/r/main/.env"},
            {"name": "src", "path": "src", "type": "dir", "download_url": null},
            {"name": "app.min.js", "path": "dist/app.min.js", "type": "file",
             "download_url": "https://raw.githubusercontent.com/o/r/main/dist/app.min.js"}
        ]"#;

        let entries: Vec<ContentsEntry> = serde_json::from_str(json).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].kind, "file");
        assert!(entries[0].download_url.is_some());
        assert!(entries[1].download_url.is_none());
    }
}
