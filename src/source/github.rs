use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, ACCEPT, AUTHORIZATION, RETRY_AFTER};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use super::{FetchError, RepoHost, RepoTree};
use crate::config::DigestConfig;
use crate::types::identifiers::RepoReference;
use crate::types::tree::TreeEntry;

const USER_AGENT: &str = concat!("repo-digest/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct GitTreeResponse {
    #[serde(default)]
    tree: Vec<GitTreeItem>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Debug, Deserialize)]
struct GitTreeItem {
    path: String,
    #[serde(rename = "type")]
    item_type: String,
    size: Option<u64>,
}

impl GitTreeResponse {
    fn into_tree(self) -> RepoTree {
        RepoTree {
            entries: self.tree.into_iter().filter_map(GitTreeItem::into_entry).collect(),
            truncated: self.truncated,
        }
    }
}

impl GitTreeItem {
    // `commit` items are submodules and have no content here
    fn into_entry(self) -> Option<TreeEntry> {
        match self.item_type.as_str() {
            "blob" => Some(TreeEntry::file(self.path, self.size)),
            "tree" => Some(TreeEntry::directory(self.path)),
            _ => None,
        }
    }
}

/// GitHub REST tree listing plus raw-content retrieval.
pub struct GitHubClient {
    client: Client,
    api_url: Url,
    raw_url: Url,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(config: &DigestConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| FetchError::Setup(e.to_string()))?;

        let api_url = Url::parse(&config.github_api_url)
            .map_err(|e| FetchError::Setup(format!("github_api_url: {e}")))?;
        let raw_url = Url::parse(&config.raw_content_url)
            .map_err(|e| FetchError::Setup(format!("raw_content_url: {e}")))?;

        Ok(Self {
            client,
            api_url,
            raw_url,
            token: config.github_token.clone(),
        })
    }

    fn tree_url(&self, repo: &RepoReference) -> Result<Url, FetchError> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::Setup("github_api_url cannot be a base".into()))?
            .pop_if_empty()
            .extend(["repos", repo.owner(), repo.name(), "git", "trees"])
            .extend(repo.ref_or_head().split('/'));
        url.query_pairs_mut().append_pair("recursive", "1");
        Ok(url)
    }

    fn raw_file_url(&self, repo: &RepoReference, path: &str) -> Result<Url, FetchError> {
        let mut url = self.raw_url.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::Setup("raw_content_url cannot be a base".into()))?
            .pop_if_empty()
            .extend([repo.owner(), repo.name()])
            .extend(repo.ref_or_head().split('/'))
            .extend(path.split('/'));
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.header(AUTHORIZATION, format!("Bearer {token}")),
            None => request,
        }
    }
}

#[async_trait]
impl RepoHost for GitHubClient {
    async fn fetch_tree(&self, repo: &RepoReference) -> Result<RepoTree, FetchError> {
        let url = self.tree_url(repo)?;
        debug!(%url, "fetching repository tree");

        let request = self
            .client
            .get(url.clone())
            .header(ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28");
        let response = self.authorized(request).send().await.map_err(map_transport)?;

        if let Some(early) = tree_status(response.status(), response.headers(), url.as_str()) {
            debug!(repo = %repo, status = %response.status(), "tree listing ended before body");
            return early;
        }

        let body: GitTreeResponse = response
            .json()
            .await
            .map_err(|e| FetchError::InvalidResponse(e.to_string()))?;

        if body.truncated {
            warn!(repo = %repo, "tree listing truncated by host");
        }

        Ok(body.into_tree())
    }

    async fn fetch_file(&self, repo: &RepoReference, path: &str) -> Result<Vec<u8>, FetchError> {
        let url = self.raw_file_url(repo, path)?;
        let response = self
            .authorized(self.client.get(url.clone()))
            .send()
            .await
            .map_err(map_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(status, response.headers(), url.as_str()));
        }

        let bytes = response.bytes().await.map_err(map_transport)?;
        Ok(bytes.to_vec())
    }
}

fn map_transport(err: reqwest::Error) -> FetchError {
    if err.is_decode() {
        FetchError::InvalidResponse(err.to_string())
    } else {
        FetchError::TransientNetwork(err.to_string())
    }
}

/// `None` when the listing body should be read. GitHub answers 409 for a
/// repository with no commits, which is an empty listing rather than an error.
fn tree_status(
    status: StatusCode,
    headers: &HeaderMap,
    url: &str,
) -> Option<Result<RepoTree, FetchError>> {
    if status == StatusCode::CONFLICT {
        return Some(Ok(RepoTree::default()));
    }
    if !status.is_success() {
        return Some(Err(classify_status(status, headers, url)));
    }
    None
}

/// Map a non-success status to the error taxonomy.
pub(crate) fn classify_status(status: StatusCode, headers: &HeaderMap, url: &str) -> FetchError {
    match status {
        StatusCode::NOT_FOUND => FetchError::NotFound(url.to_string()),
        StatusCode::TOO_MANY_REQUESTS => FetchError::RateLimited {
            retry_after: retry_after(headers),
        },
        StatusCode::FORBIDDEN if is_rate_limit(headers) => FetchError::RateLimited {
            retry_after: retry_after(headers),
        },
        s if s.is_server_error() => {
            FetchError::TransientNetwork(format!("host returned {} for {url}", s.as_u16()))
        }
        s => FetchError::UnexpectedStatus {
            status: s.as_u16(),
            url: url.to_string(),
        },
    }
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers.get(name)?.to_str().ok()?.trim().parse().ok()
}

fn is_rate_limit(headers: &HeaderMap) -> bool {
    headers.contains_key(RETRY_AFTER) || header_u64(headers, "x-ratelimit-remaining") == Some(0)
}

/// `Retry-After` as delay-seconds or HTTP-date, else time until
/// `x-ratelimit-reset` (epoch seconds).
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    if let Some(secs) = header_u64(headers, RETRY_AFTER.as_str()) {
        return Some(Duration::from_secs(secs));
    }
    if let Some(at) = headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| DateTime::parse_from_rfc2822(v.trim()).ok())
    {
        let wait = at.with_timezone(&Utc) - Utc::now();
        return Some(wait.to_std().unwrap_or(Duration::ZERO));
    }
    let reset = header_u64(headers, "x-ratelimit-reset")?;
    let now = u64::try_from(Utc::now().timestamp()).ok()?;
    Some(Duration::from_secs(reset.saturating_sub(now)))
}
