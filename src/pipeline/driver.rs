use indicatif::{ProgressBar, ProgressStyle};

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::github::GitHubClient;
use crate::models::{CandidateUser, LicenseTally};
use crate::storage::Storage;

pub struct Pipeline {
    github: GitHubClient,
    storage: Storage,
    config: PipelineConfig,
}

/// Outcome counts for one batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub processed: usize,
    pub applied: usize,
    pub empty: usize,
    pub failed: usize,
}

enum UserOutcome {
    Applied,
    Empty,
}

impl Pipeline {
    pub fn new(github: GitHubClient, storage: Storage, config: PipelineConfig) -> Self {
        Self {
            github,
            storage,
            config,
        }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Processes one batch of candidate users, enumerating, classifying and
    /// applying each user's tally in turn. Per-user failures are counted and
    /// logged; only a failure to read the candidate batch itself aborts the
    /// run. There is no checkpointing: re-running applies the same batch
    /// again and double-counts.
    pub async fn run(&mut self) -> Result<RunReport> {
        let users = self.storage.candidate_users(self.config.batch_size)?;
        tracing::info!("Processing {} candidate users", users.len());

        let pb = ProgressBar::new(users.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} users")
                .unwrap()
                .progress_chars("#>-"),
        );

        let mut report = RunReport::default();
        for user in &users {
            match self.process_user(user).await {
                Ok(UserOutcome::Applied) => report.applied += 1,
                Ok(UserOutcome::Empty) => report.empty += 1,
                Err(e) => {
                    tracing::warn!("Skipping user {}: {}", user.login, e);
                    report.failed += 1;
                }
            }
            report.processed += 1;
            pb.inc(1);
        }

        pb.finish_with_message("Batch complete");
        Ok(report)
    }

    async fn process_user(&mut self, user: &CandidateUser) -> Result<UserOutcome> {
        let keys = self.github.list_owned_licenses(&user.login).await?;
        let tally = LicenseTally::from_keys(&keys);

        if tally.is_empty() {
            tracing::debug!("No licensed repositories for {}", user.login);
            return Ok(UserOutcome::Empty);
        }

        // The update runs in its own transaction, opened only after the
        // remote enumeration has completed.
        self.storage.apply_tally(user, &tally)?;
        tracing::debug!(
            "Applied {} license counts for {} to {}, {}, {}",
            tally.total(),
            user.login,
            user.city,
            user.state,
            user.country
        );
        Ok(UserOutcome::Applied)
    }
}
