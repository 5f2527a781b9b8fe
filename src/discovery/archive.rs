//! GH Archive replay.
//!
//! Walks the hourly `.json.gz` dumps in order, a configurable number of hours
//! behind the present so only published archives are requested. The watermark
//! only advances after an hour is fully enqueued, so transient failures replay
//! the same hour.

use chrono::{DateTime, DurationRound, Timelike, Utc};
use flate2::read::GzDecoder;
use std::io::{BufRead, BufReader};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::core::config::DiscoveryConfig;
use crate::core::error::Result;
use crate::core::model::RepoId;
use crate::github::{self, http};
use crate::scanner::Scanner;

use super::{extract_repos, RawEvent};

const QUEUE_FULL_BACKOFF: Duration = Duration::from_secs(10);
const ERROR_BACKOFF: Duration = Duration::from_secs(60);
const CAUGHT_UP_SLEEP: Duration = Duration::from_secs(3600);

pub struct ArchiveReplay {
    scanner: Arc<Scanner>,
    cfg: DiscoveryConfig,
    timeout: Duration,
}

impl ArchiveReplay {
    pub fn new(scanner: Arc<Scanner>, cfg: DiscoveryConfig) -> Self {
        Self {
            scanner,
            cfg,
            timeout: Duration::from_secs(120),
        }
    }

    pub async fn run(self) {
        let mut watermark = match self.initial_hour() {
            Some(hour) => hour,
            None => return,
        };
        info!("Archive replay starting at {}", watermark);

        while self.scanner.is_running() {
            if self.scanner.queue_is_full() {
                tokio::time::sleep(QUEUE_FULL_BACKOFF).await;
                continue;
            }
            if watermark > self.latest_published_hour() {
                debug!("Archive replay caught up, sleeping");
                tokio::time::sleep(CAUGHT_UP_SLEEP).await;
                continue;
            }

            match self.replay_hour(watermark).await {
                Ok(enqueued) => {
                    info!("Archive hour {} enqueued {} repos", watermark, enqueued);
                    watermark += chrono::Duration::hours(1);
                }
                Err(err) => {
                    warn!("Archive hour {} failed: {}", watermark, err);
                    tokio::time::sleep(ERROR_BACKOFF).await;
                }
            }
        }
    }

    fn initial_hour(&self) -> Option<DateTime<Utc>> {
        let truncated = Utc::now().duration_trunc(chrono::Duration::hours(1)).ok()?;
        Some(truncated - chrono::Duration::hours(self.cfg.catchup_lag_hours))
    }

    fn latest_published_hour(&self) -> DateTime<Utc> {
        Utc::now() - chrono::Duration::hours(self.cfg.catchup_lag_hours)
    }

    async fn replay_hour(&self, hour: DateTime<Utc>) -> Result<usize> {
        let url = format!(
            "{}/{}-{}.json.gz",
            self.cfg.archive_base_url,
            hour.format("%Y-%m-%d"),
            hour.hour()
        );
        let headers = vec![("User-Agent".to_string(), github::USER_AGENT.to_string())];
        let response = http::get_async(url.clone(), headers, self.timeout).await?;
        if !response.is_success() {
            return Err(crate::core::error::ScanError::Http(format!(
                "HTTP {} fetching {}",
                response.status_code, url
            )));
        }

        let repos = parse_archive(&response.body, self.cfg.max_events_per_hour)?;
        let mut enqueued = 0;
        for repo in repos {
            // Hold the hour rather than drop its tail when the queue fills.
            while self.scanner.queue_is_full() {
                if !self.scanner.is_running() {
                    return Ok(enqueued);
                }
                tokio::time::sleep(QUEUE_FULL_BACKOFF).await;
            }
            if self.scanner.add_to_queue(&repo.owner, &repo.name).await {
                enqueued += 1;
            }
        }
        Ok(enqueued)
    }
}

/// Decompresses an hourly dump and extracts unique repos from its
/// newline-delimited events, reading at most `max_events` lines.
pub fn parse_archive(gz: &[u8], max_events: usize) -> Result<Vec<RepoId>> {
    let reader = BufReader::new(GzDecoder::new(gz));
    let mut events = Vec::new();
    for line in reader.lines().take(max_events) {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        // Individual malformed lines are dropped, not fatal.
        match serde_json::from_str::<RawEvent>(&line) {
            Ok(event) => events.push(event),
            Err(err) => debug!("Skipping malformed archive line: {}", err),
        }
    }
    Ok(extract_repos(&events))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn gzip(lines: &[&str]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        for line in lines {
            writeln!(encoder, "{}", line).unwrap();
        }
        encoder.finish().unwrap()
    }

    #[test]
    fn parses_gzipped_event_lines() {
        let gz = gzip(&[
            r#"{"type":"PushEvent","repo":{"name":"octo/alpha"}}"#,
            r#"{"type":"WatchEvent","repo":{"name":"octo/ignored"}}"#,
            r#"{"type":"CreateEvent","repo":{"name":"octo/beta"}}"#,
        ]);
        let repos = parse_archive(&gz, 1000).unwrap();
        let names: Vec<String> = repos.iter().map(|r| r.full_name()).collect();
        assert_eq!(names, vec!["octo/alpha", "octo/beta"]);
    }

    #[test]
    fn caps_events_read_per_hour() {
        let gz = gzip(&[
            r#"{"type":"PushEvent","repo":{"name":"octo/alpha"}}"#,
            r#"{"type":"PushEvent","repo":{"name":"octo/beta"}}"#,
        ]);
        assert_eq!(parse_archive(&gz, 1).unwrap().len(), 1);
    }

    #[test]
    fn tolerates_malformed_lines() {
        let gz = gzip(&[
            "not json",
            r#"{"type":"PushEvent","repo":{"name":"octo/alpha"}}"#,
        ]);
        assert_eq!(parse_archive(&gz, 1000).unwrap().len(), 1);
    }
}
