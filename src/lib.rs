//! # KeyScan
//!
//! Continuous discovery and scanning of public GitHub repositories for
//! leaked LLM provider API keys.
//!
//! ## Architecture
//!
//! - `discovery`: feeds repo names from GH Archive replay and live events
//!   polling into the scan queue
//! - `scanner`: bounded queue plus a fixed worker pool with a global
//!   per-minute ceiling
//! - `github`: credential pool, REST client, and repository file fetcher
//! - `detect`: provider profiles, heuristics, and the detection pass itself
//! - `store`: persistence boundary for findings, scanned repos, and
//!   credentials
//!
//! Raw key material never leaves the detector: findings carry only a masked
//! form and a SHA-256 hash.
//!
//! ## Example
//!
//! ```rust
//! let content = "OPENAI_KEY=sk-proj-abcdEFGH12345678901234567890";
//! let detections = keyscan::detect::detect(content, ".env");
//!
//! assert_eq!(detections.len(), 1);
//! assert!(detections[0].key_masked.contains("****"));
//! ```

pub mod cli;
pub mod core;
pub mod detect;
pub mod discovery;
pub mod github;
pub mod scanner;
pub mod store;

// Re-export commonly used types
pub use core::config::Config;
pub use core::error::{Result, ScanError};
pub use core::events::{Event, EventKind, StatusHub};
pub use core::model::{Detection, RepoId, ScanOutcome, StatusSnapshot};
pub use detect::providers::Provider;
pub use github::{GitHubClient, RepoFetcher, TokenPool};
pub use scanner::Scanner;
pub use store::{MemoryStore, Store};
