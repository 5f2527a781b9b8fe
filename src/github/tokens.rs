//! Rotating pool of GitHub API credentials.
//!
//! Selection is greedy round-robin-by-usage: each acquire returns the
//! least-used credential that is not inside a rate-limit window, which
//! balances load across the pool without a separate scheduler.

use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::core::error::Result;
use crate::core::model::CredentialStatus;
use crate::store::Store;

use super::{http, USER_AGENT};

#[derive(Debug, Clone)]
struct TokenInfo {
    value: String,
    usage: u64,
    last_used: Option<DateTime<Utc>>,
    rate_limited: bool,
    reset_at: Option<DateTime<Utc>>,
}

impl TokenInfo {
    fn fresh(value: String, usage: u64, last_used: Option<DateTime<Utc>>) -> Self {
        Self {
            value,
            usage,
            last_used,
            rate_limited: false,
            reset_at: None,
        }
    }

    fn available(&self, now: DateTime<Utc>) -> bool {
        !self.rate_limited || self.reset_at.map_or(true, |reset| reset < now)
    }
}

pub struct TokenPool {
    store: Arc<dyn Store>,
    tokens: Mutex<Vec<TokenInfo>>,
    base_url: String,
    timeout: Duration,
}

impl TokenPool {
    pub fn new(store: Arc<dyn Store>, base_url: String, timeout: Duration) -> Self {
        Self {
            store,
            tokens: Mutex::new(Vec::new()),
            base_url,
            timeout,
        }
    }

    /// Loads stored active credentials, or seeds the pool from the
    /// comma-separated `GITHUB_TOKENS` environment variable.
    pub async fn initialize(&self) -> Result<()> {
        let stored = self.store.list_active_credentials().await?;

        if stored.is_empty() {
            let seed = std::env::var("GITHUB_TOKENS").unwrap_or_default();
            for value in seed.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                if !self.add(value, None).await {
                    warn!("Seed credential rejected by liveness check");
                }
            }
        } else {
            let mut tokens = self.tokens.lock().unwrap();
            *tokens = stored
                .into_iter()
                .map(|c| TokenInfo::fresh(c.value, c.usage, c.used_at))
                .collect();
            info!("Loaded {} credentials from store", tokens.len());
        }

        Ok(())
    }

    /// Validates the credential against the identity endpoint before
    /// persisting and pooling it. Rejection is reported as `false`, never as
    /// an error.
    pub async fn add(&self, value: &str, label: Option<&str>) -> bool {
        let url = format!("{}/user", self.base_url);
        let headers = vec![
            ("Accept".to_string(), "application/vnd.github.v3+json".to_string()),
            ("User-Agent".to_string(), USER_AGENT.to_string()),
            ("Authorization".to_string(), format!("Bearer {}", value)),
        ];

        match http::get_async(url, headers, self.timeout).await {
            Ok(response) if response.is_success() => {}
            _ => return false,
        }

        if self.store.upsert_credential(value, label).await.is_err() {
            return false;
        }

        let mut tokens = self.tokens.lock().unwrap();
        if !tokens.iter().any(|t| t.value == value) {
            tokens.push(TokenInfo::fresh(value.to_string(), 0, None));
        }
        true
    }

    /// Least-used credential whose rate-limit window (if any) has elapsed.
    pub fn acquire(&self) -> Option<String> {
        let now = Utc::now();
        let tokens = self.tokens.lock().unwrap();
        tokens
            .iter()
            .filter(|t| t.available(now))
            .min_by_key(|t| t.usage)
            .map(|t| t.value.clone())
    }

    /// Bumps usage in memory; the store write happens out of band so a slow
    /// or failing persistence layer never stalls a request.
    pub fn mark_used(&self, value: &str) {
        {
            let mut tokens = self.tokens.lock().unwrap();
            if let Some(token) = tokens.iter_mut().find(|t| t.value == value) {
                token.usage += 1;
                token.last_used = Some(Utc::now());
            }
        }

        let store = Arc::clone(&self.store);
        let value = value.to_string();
        tokio::spawn(async move {
            if let Err(e) = store.increment_credential_usage(&value).await {
                debug!("Failed to persist credential usage: {}", e);
            }
        });
    }

    /// Flags the credential unusable until `reset_at`.
    pub fn mark_rate_limited(&self, value: &str, reset_at: DateTime<Utc>) {
        let mut tokens = self.tokens.lock().unwrap();
        if let Some(token) = tokens.iter_mut().find(|t| t.value == value) {
            token.rate_limited = true;
            token.reset_at = Some(reset_at);
            warn!("Credential rate limited until {}", reset_at);
        }
    }

    /// Drops the credential from the pool; returns whether it was present.
    pub fn remove(&self, value: &str) -> bool {
        let mut tokens = self.tokens.lock().unwrap();
        let before = tokens.len();
        tokens.retain(|t| t.value != value);
        tokens.len() != before
    }

    pub fn status(&self) -> CredentialStatus {
        let now = Utc::now();
        let tokens = self.tokens.lock().unwrap();
        let available = tokens.iter().filter(|t| t.available(now)).count();
        CredentialStatus {
            total: tokens.len(),
            available,
            rate_limited: tokens.len() - available,
        }
    }

    #[cfg(test)]
    pub(crate) fn seed_unchecked(&self, value: &str, usage: u64) {
        self.tokens
            .lock()
            .unwrap()
            .push(TokenInfo::fresh(value.to_string(), usage, None));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::Duration as ChronoDuration;

    fn pool() -> TokenPool {
        TokenPool::new(
            Arc::new(MemoryStore::new()),
            "https://api.github.test".to_string(),
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn acquire_returns_least_used() {
        let pool = pool();
        pool.seed_unchecked("tok-a", 5);
        pool.seed_unchecked("tok-b", 1);
        pool.seed_unchecked("tok-c", 3);

        assert_eq!(pool.acquire().as_deref(), Some("tok-b"));
    }

    #[tokio::test]
    async fn rate_limited_credentials_are_skipped() {
        let pool = pool();
        pool.seed_unchecked("tok-a", 5);
        pool.seed_unchecked("tok-b", 1);
        pool.seed_unchecked("tok-c", 3);

        pool.mark_rate_limited("tok-b", Utc::now() + ChronoDuration::hours(1));
        assert_eq!(pool.acquire().as_deref(), Some("tok-c"));

        let status = pool.status();
        assert_eq!(status.total, 3);
        assert_eq!(status.available, 2);
        assert_eq!(status.rate_limited, 1);
    }

    #[tokio::test]
    async fn elapsed_reset_window_restores_availability() {
        let pool = pool();
        pool.seed_unchecked("tok-a", 0);
        pool.mark_rate_limited("tok-a", Utc::now() - ChronoDuration::seconds(1));

        assert_eq!(pool.acquire().as_deref(), Some("tok-a"));
        assert_eq!(pool.status().available, 1);
    }

    #[tokio::test]
    async fn empty_or_exhausted_pool_yields_none() {
        let pool = pool();
        assert!(pool.acquire().is_none());

        pool.seed_unchecked("tok-a", 0);
        pool.mark_rate_limited("tok-a", Utc::now() + ChronoDuration::hours(1));
        assert!(pool.acquire().is_none());
    }

    #[tokio::test]
    async fn mark_used_bumps_usage_and_reorders_selection() {
        let pool = pool();
        pool.seed_unchecked("tok-a", 0);
        pool.seed_unchecked("tok-b", 1);

        pool.mark_used("tok-a");
        pool.mark_used("tok-a");
        assert_eq!(pool.acquire().as_deref(), Some("tok-b"));
    }

    #[tokio::test]
    async fn remove_drops_the_credential() {
        let pool = pool();
        pool.seed_unchecked("tok-a", 0);
        assert!(pool.remove("tok-a"));
        assert!(!pool.remove("tok-a"));
        assert_eq!(pool.status().total, 0);
    }
}
