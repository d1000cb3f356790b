use reqwest::{header, Client};
use tokio::time::{sleep, Duration};

use crate::error::{Error, Result};
use crate::github::paginator::Paginator;
use crate::github::rate_limiter::RateLimiter;
use crate::models::Repository;

pub struct GitHubClient {
    client: Client,
    rate_limiter: RateLimiter,
    base_url: String,
}

impl GitHubClient {
    pub fn new(token: &str) -> Result<Self> {
        Self::with_base_url(token, "https://api.github.com")
    }

    /// Used by tests to point the client at a mock server.
    pub fn with_base_url(token: &str, base_url: &str) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", token))?,
        );
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            header::HeaderValue::from_static("2022-11-28"),
        );
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static("licensemap/1.0"),
        );

        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            rate_limiter: RateLimiter::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Overrides the rate-limit reset margin, for tests.
    pub fn with_reset_margin(mut self, margin: Duration) -> Self {
        self.rate_limiter = self.rate_limiter.with_margin(margin);
        self
    }

    /// License keys of the user's owned, non-fork repositories. Forks and
    /// repositories without license metadata are dropped before
    /// classification.
    pub async fn list_owned_licenses(&self, login: &str) -> Result<Vec<String>> {
        let repos = self.list_owned_repos(login).await?;
        Ok(repos
            .into_iter()
            .filter(|repo| !repo.fork)
            .filter_map(|repo| repo.license.map(|license| license.key))
            .collect())
    }

    /// Lists the user's owned repositories. On a rate-limit signal this
    /// blocks until the reported reset plus the safety margin and retries
    /// the listing exactly once; a second rate limit propagates as an error.
    pub async fn list_owned_repos(&self, login: &str) -> Result<Vec<Repository>> {
        let url = format!("{}/users/{}/repos?type=owner", self.base_url, login);
        let paginator = Paginator::new(&self.client, &self.rate_limiter);
        tracing::info!("Fetching repositories for: {}", login);

        match paginator.fetch_all(&url, 100).await {
            Err(Error::RateLimited(reset)) => {
                let backoff = self.rate_limiter.backoff_from(reset);
                tracing::warn!(
                    "Rate limit met listing repos for {}, sleeping for {:?}",
                    login,
                    backoff
                );
                sleep(backoff).await;
                paginator.fetch_all(&url, 100).await
            }
            other => other,
        }
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }
}

/// Extracts the `message` field GitHub puts in JSON error bodies, falling
/// back to the raw body.
pub(crate) fn api_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
        .unwrap_or_else(|| body.to_string())
}
