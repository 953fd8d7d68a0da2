//! Remote repository hosting.
//!
//! The pipeline only sees [`RepoHost`]: one call for the recursive tree and
//! one per file for raw content. Nothing here retries; retry policy belongs
//! to the caller.

pub mod github;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::types::identifiers::RepoReference;
use crate::types::tree::TreeEntry;

pub use github::GitHubClient;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Rate limited by host (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },
    #[error("Transient network error: {0}")]
    TransientNetwork(String),
    #[error("Unexpected HTTP status {status} for {url}")]
    UnexpectedStatus { status: u16, url: String },
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("HTTP client setup failed: {0}")]
    Setup(String),
}

impl FetchError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::RateLimited { .. } | FetchError::TransientNetwork(_))
    }
}

/// Recursive listing of one ref.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoTree {
    pub entries: Vec<TreeEntry>,
    /// The host cut the listing short.
    pub truncated: bool,
}

#[async_trait]
pub trait RepoHost: Send + Sync {
    /// Complete recursive listing for the reference's ref (default branch
    /// when unset), in one logical call.
    async fn fetch_tree(&self, repo: &RepoReference) -> Result<RepoTree, FetchError>;

    /// Raw bytes of one file at the reference's ref.
    async fn fetch_file(&self, repo: &RepoReference, path: &str) -> Result<Vec<u8>, FetchError>;
}

#[async_trait]
impl<T> RepoHost for Arc<T>
where
    T: RepoHost + ?Sized,
{
    async fn fetch_tree(&self, repo: &RepoReference) -> Result<RepoTree, FetchError> {
        (**self).fetch_tree(repo).await
    }

    async fn fetch_file(&self, repo: &RepoReference, path: &str) -> Result<Vec<u8>, FetchError> {
        (**self).fetch_file(repo, path).await
    }
}
