pub mod config;
pub mod error;
pub mod models;
pub mod github;
pub mod taxonomy;
pub mod pipeline;
pub mod storage;

pub use config::{Config, PipelineConfig};
pub use error::{Error, Result};
pub use github::GitHubClient;
pub use models::{CandidateUser, LicenseTally};
pub use pipeline::{Pipeline, RunReport};
pub use storage::Storage;
pub use taxonomy::LicenseBucket;
