pub mod config;
pub mod error;
pub mod events;
pub mod model;

pub use config::Config;
pub use error::{Result, ScanError};
pub use events::{Event, EventKind, StatusHub, SubscriptionId};
pub use model::{
    CredentialStatus, Detection, OutcomeKind, RepoFile, RepoId, ScanOutcome, StatusSnapshot,
};
