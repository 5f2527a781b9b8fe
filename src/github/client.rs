//! Credential-aware GitHub API client.
//!
//! Wraps the curl bridge with pool accounting: every authenticated call
//! acquires the least-used credential, and 403/429 responses flag it
//! rate-limited until the window advertised in `x-ratelimit-reset`.

use chrono::{TimeZone, Utc};
use std::sync::Arc;
use std::time::Duration;

use crate::core::config::GitHubConfig;
use crate::core::error::{Result, ScanError};

use super::http;
use super::tokens::TokenPool;
use super::USER_AGENT;

pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
    pub remaining: Option<u64>,
    pub etag: Option<String>,
    pub poll_interval: Option<u64>,
}

impl ApiResponse {
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(Into::into)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_not_modified(&self) -> bool {
        self.status == 304
    }
}

pub struct GitHubClient {
    pool: Arc<TokenPool>,
    base_url: String,
    timeout: Duration,
}

impl GitHubClient {
    pub fn new(pool: Arc<TokenPool>, config: &GitHubConfig) -> Self {
        Self {
            pool,
            base_url: config.base_url.clone(),
            timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }

    /// Authenticated GET against the REST API. Fails fast when the pool is
    /// exhausted instead of falling back to anonymous calls.
    pub async fn api_get(&self, path: &str) -> Result<ApiResponse> {
        let token = self.pool.acquire().ok_or(ScanError::NoCredentials)?;
        let url = format!("{}{}", self.base_url, path);
        let headers = vec![
            ("Accept".to_string(), "application/vnd.github.v3+json".to_string()),
            ("User-Agent".to_string(), USER_AGENT.to_string()),
            ("Authorization".to_string(), format!("Bearer {}", token)),
        ];

        let response = http::get_async(url, headers, self.timeout).await?;
        if response.is_rate_limited() {
            self.pool.mark_rate_limited(&token, reset_time(&response));
            return Err(ScanError::RateLimited(format!(
                "HTTP {} from {}",
                response.status_code, path
            )));
        }
        self.pool.mark_used(&token);

        Ok(to_api_response(response))
    }

    /// Conditional GET of the public events feed. This endpoint works without
    /// a credential, so an empty pool degrades to anonymous polling rather
    /// than failing.
    pub async fn public_events(&self, etag: Option<&str>) -> Result<ApiResponse> {
        let url = format!("{}/events", self.base_url);
        let mut headers = vec![
            ("Accept".to_string(), "application/vnd.github.v3+json".to_string()),
            ("User-Agent".to_string(), USER_AGENT.to_string()),
        ];
        if let Some(tag) = etag {
            headers.push(("If-None-Match".to_string(), tag.to_string()));
        }
        let token = self.pool.acquire();
        if let Some(ref token) = token {
            headers.push(("Authorization".to_string(), format!("Bearer {}", token)));
        }

        let response = http::get_async(url, headers, self.timeout).await?;
        if response.is_rate_limited() {
            if let Some(ref token) = token {
                self.pool.mark_rate_limited(token, reset_time(&response));
            }
            return Err(ScanError::RateLimited("HTTP 403/429 from /events".to_string()));
        }
        if let Some(ref token) = token {
            self.pool.mark_used(token);
        }

        Ok(to_api_response(response))
    }

    /// Unauthenticated fetch of raw file content from a download URL.
    pub async fn raw_get(&self, url: &str) -> Result<String> {
        let headers = vec![("User-Agent".to_string(), USER_AGENT.to_string())];
        let response = http::get_async(url.to_string(), headers, self.timeout).await?;

        if response.is_not_found() {
            return Err(ScanError::NotFound(url.to_string()));
        }
        if !response.is_success() {
            return Err(ScanError::Http(format!(
                "HTTP {} fetching {}",
                response.status_code, url
            )));
        }
        response.text()
    }
}

fn to_api_response(response: http::HttpResponse) -> ApiResponse {
    ApiResponse {
        status: response.status_code,
        remaining: response.header_u64("x-ratelimit-remaining"),
        etag: response.header("etag").map(str::to_string),
        poll_interval: response.header_u64("x-poll-interval"),
        body: response.body,
    }
}

/// Reset timestamp from `x-ratelimit-reset` (epoch seconds), defaulting to a
/// one-minute backoff when the header is missing or unparsable.
fn reset_time(response: &http::HttpResponse) -> chrono::DateTime<Utc> {
    response
        .header_u64("x-ratelimit-reset")
        .and_then(|epoch| Utc.timestamp_opt(epoch as i64, 0).single())
        .unwrap_or_else(|| Utc::now() + chrono::Duration::minutes(1))
}
