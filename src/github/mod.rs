pub mod client;
pub mod fetcher;
pub mod http;
pub mod tokens;

pub use client::GitHubClient;
pub use fetcher::{FileSource, RepoFetcher};
pub use tokens::TokenPool;

/// User agent sent on every outbound request.
pub const USER_AGENT: &str = "KeyScan/1.0";
