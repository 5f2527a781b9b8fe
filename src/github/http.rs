//! Blocking curl client bridged onto the async runtime.
//!
//! Every network call in the crate funnels through [`get_async`], which runs
//! the transfer on the blocking pool and hands back status, body, and the
//! response headers the rate-limit accounting needs.

use curl::easy::{Easy2, Handler, List, WriteError};
use std::collections::HashMap;
use std::time::Duration;

use crate::core::error::{Result, ScanError};

/// Collects the response body and header lines as curl delivers them.
struct Collector {
    body: Vec<u8>,
    headers: Vec<String>,
}

impl Handler for Collector {
    fn write(&mut self, data: &[u8]) -> std::result::Result<usize, WriteError> {
        self.body.extend_from_slice(data);
        Ok(data.len())
    }

    fn header(&mut self, data: &[u8]) -> bool {
        if let Ok(line) = std::str::from_utf8(data) {
            self.headers.push(line.trim_end().to_string());
        }
        true
    }
}

pub struct HttpClient {
    timeout: Duration,
}

impl HttpClient {
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Perform a GET request.
    pub fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<HttpResponse> {
        let mut easy = Easy2::new(Collector {
            body: Vec::new(),
            headers: Vec::new(),
        });

        easy.url(url)?;
        easy.timeout(self.timeout)?;
        easy.follow_location(true)?;
        easy.max_redirections(5)?;
        easy.ssl_verify_peer(true)?;
        easy.ssl_verify_host(true)?;

        let mut list = List::new();
        for (key, value) in headers {
            list.append(&format!("{}: {}", key, value))?;
        }
        easy.http_headers(list)?;

        easy.perform()?;

        let status_code = easy.response_code()? as u16;
        let collector = easy.get_ref();

        Ok(HttpResponse {
            status_code,
            body: collector.body.clone(),
            headers: parse_header_lines(&collector.headers),
        })
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs a blocking GET on the blocking pool.
pub async fn get_async(
    url: String,
    headers: Vec<(String, String)>,
    timeout: Duration,
) -> Result<HttpResponse> {
    tokio::task::spawn_blocking(move || {
        let client = HttpClient::with_timeout(timeout);
        let header_refs: Vec<(&str, &str)> = headers
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
            .collect();
        client.get(&url, &header_refs)
    })
    .await
    .map_err(|e| ScanError::Unknown(format!("Task join error: {}", e)))?
}

fn parse_header_lines(lines: &[String]) -> HashMap<String, String> {
    lines
        .iter()
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim().to_ascii_lowercase(), value.trim().to_string()))
        .collect()
}

#[derive(Debug)]
pub struct HttpResponse {
    pub status_code: u16,
    pub body: Vec<u8>,
    headers: HashMap<String, String>,
}

impl HttpResponse {
    pub fn text(&self) -> Result<String> {
        String::from_utf8(self.body.clone())
            .map_err(|e| ScanError::Unknown(format!("Invalid UTF-8: {}", e)))
    }

    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(Into::into)
    }

    /// Response header lookup, case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn header_u64(&self, name: &str) -> Option<u64> {
        self.header(name).and_then(|value| value.parse().ok())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status_code == 403 || self.status_code == 429
    }

    pub fn is_not_modified(&self) -> bool {
        self.status_code == 304
    }

    pub fn is_not_found(&self) -> bool {
        self.status_code == 404
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status_code: u16, header_lines: &[&str]) -> HttpResponse {
        HttpResponse {
            status_code,
            body: Vec::new(),
            headers: parse_header_lines(
                &header_lines.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
            ),
        }
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let res = response(200, &["X-RateLimit-Remaining: 4999", "ETag: \"abc\""]);
        assert_eq!(res.header_u64("x-ratelimit-remaining"), Some(4999));
        assert_eq!(res.header("etag"), Some("\"abc\""));
        assert_eq!(res.header("x-poll-interval"), None);
    }

    #[test]
    fn status_predicates() {
        assert!(response(200, &[]).is_success());
        assert!(response(403, &[]).is_rate_limited());
        assert!(response(429, &[]).is_rate_limited());
        assert!(response(304, &[]).is_not_modified());
        assert!(response(404, &[]).is_not_found());
    }

    #[test]
    fn malformed_header_lines_are_ignored() {
        let res = response(200, &["HTTP/1.1 200 OK", "x-poll-interval: 60"]);
        assert_eq!(res.header_u64("x-poll-interval"), Some(60));
    }
}
