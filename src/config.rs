use crate::error::{Error, Result};
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub github_token: String,
    pub database_path: String,
    pub batch_size: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let github_token = env::var("GITHUB_TOKEN")
            .map_err(|_| Error::Config("GITHUB_TOKEN environment variable not set".to_string()))?;

        let database_path = env::var("DATABASE_PATH")
            .unwrap_or_else(|_| "licensemap.db".to_string());

        let batch_size = env::var("BATCH_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5000);

        Ok(Self {
            github_token,
            database_path,
            batch_size,
        })
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub batch_size: usize,
}

impl From<&Config> for PipelineConfig {
    fn from(config: &Config) -> Self {
        Self {
            batch_size: config.batch_size,
        }
    }
}
