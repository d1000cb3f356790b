use serde::{Deserialize, Serialize};

/// A user read from the candidate source for one processing batch.
///
/// The source query only returns rows with all four fields present and
/// non-empty, so no further validation happens here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateUser {
    pub login: String,
    pub city: String,
    pub state: String,
    pub country: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    pub fork: bool,
    pub license: Option<RepoLicense>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoLicense {
    pub key: String,
    pub name: Option<String>,
    pub spdx_id: Option<String>,
}
