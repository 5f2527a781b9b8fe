//! Live discovery from the public events feed.
//!
//! Conditional polling with ETags: unchanged pages cost nothing against the
//! rate limit, and the interval honors the server's `X-Poll-Interval` hint
//! when it is longer than our floor.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::core::config::DiscoveryConfig;
use crate::github::client::GitHubClient;
use crate::scanner::Scanner;

use super::{extract_repos, RawEvent};

pub struct LivePoll {
    scanner: Arc<Scanner>,
    client: Arc<GitHubClient>,
    min_interval: Duration,
}

impl LivePoll {
    pub fn new(scanner: Arc<Scanner>, client: Arc<GitHubClient>, cfg: &DiscoveryConfig) -> Self {
        Self {
            scanner,
            client,
            min_interval: Duration::from_secs(cfg.min_poll_interval_secs),
        }
    }

    pub async fn run(self) {
        let mut etag: Option<String> = None;
        let mut interval = self.min_interval;

        while self.scanner.is_running() {
            match self.client.public_events(etag.as_deref()).await {
                Ok(response) => {
                    if let Some(hint) = response.poll_interval {
                        interval = self.min_interval.max(Duration::from_secs(hint));
                    }
                    if response.is_not_modified() {
                        debug!("Events feed unchanged");
                    } else if response.is_success() {
                        if let Some(tag) = &response.etag {
                            etag = Some(tag.clone());
                        }
                        match response.json::<Vec<RawEvent>>() {
                            Ok(events) => {
                                let mut enqueued = 0;
                                for repo in extract_repos(&events) {
                                    if self.scanner.add_to_queue(&repo.owner, &repo.name).await {
                                        enqueued += 1;
                                    }
                                }
                                debug!("Events poll enqueued {} repos", enqueued);
                            }
                            Err(err) => warn!("Events feed parse failed: {}", err),
                        }
                    } else {
                        warn!("Events feed returned HTTP {}", response.status);
                    }
                }
                Err(err) => {
                    warn!("Events poll failed: {}", err);
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    continue;
                }
            }
            tokio::time::sleep(interval).await;
        }
    }
}
