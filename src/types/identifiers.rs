use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepoReferenceError {
    #[error("Not a GitHub URL: {0}")]
    NotGitHub(String),
    #[error("Cannot parse owner/repo from: {0}")]
    MissingOwnerOrRepo(String),
    #[error("Malformed URL {input}: {reason}")]
    Malformed { input: String, reason: String },
}

/// Identifies a repository on the hosting service, optionally pinned to a ref.
///
/// Constructed once from user input; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoReference {
    owner: String,
    name: String,
    git_ref: Option<String>,
}

impl RepoReference {
    pub fn new(owner: impl Into<String>, name: impl Into<String>, git_ref: Option<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            git_ref,
        }
    }

    /// Parse a GitHub URL such as `https://github.com/owner/repo`,
    /// `https://github.com/owner/repo.git` or `https://github.com/owner/repo/tree/main`.
    ///
    /// Fails before any network access when the input does not resolve to an
    /// `{owner}/{repo}` pair.
    pub fn parse(input: &str) -> Result<Self, RepoReferenceError> {
        let trimmed = input.trim().trim_end_matches('/');
        let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);
        if trimmed.is_empty() {
            return Err(RepoReferenceError::MissingOwnerOrRepo(input.to_string()));
        }

        let url = Url::parse(trimmed).map_err(|e| RepoReferenceError::Malformed {
            input: input.to_string(),
            reason: e.to_string(),
        })?;

        match url.host_str() {
            Some("github.com") | Some("www.github.com") => {}
            _ => return Err(RepoReferenceError::NotGitHub(trimmed.to_string())),
        }

        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|p| !p.is_empty()).collect())
            .unwrap_or_default();

        if segments.len() < 2 {
            return Err(RepoReferenceError::MissingOwnerOrRepo(trimmed.to_string()));
        }

        // `/owner/repo/tree/<ref>` pins a branch or tag; the ref may itself
        // contain slashes (`feature/x`), so it takes every remaining segment
        let git_ref = match segments.get(2..) {
            Some(["tree", rest @ ..]) if !rest.is_empty() => Some(rest.join("/")),
            _ => None,
        };

        Ok(Self::new(segments[0], segments[1], git_ref))
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn git_ref(&self) -> Option<&str> {
        self.git_ref.as_deref()
    }

    /// The ref to resolve against; `HEAD` selects the default branch.
    /// May contain `/`.
    pub fn ref_or_head(&self) -> &str {
        self.git_ref.as_deref().unwrap_or("HEAD")
    }
}

impl fmt::Display for RepoReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// SHA-256 digest of assembled content, lowercase hex (64 chars).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentFingerprint(String);

impl ContentFingerprint {
    pub fn from_content(content: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(content);

        let hash = hasher.finalize();
        ContentFingerprint(hex::encode(hash))
    }

    /// Accepts only a well-formed 64-character lowercase hex digest.
    pub fn from_hex(hex_digest: &str) -> Option<Self> {
        let well_formed = hex_digest.len() == 64
            && hex_digest
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        well_formed.then(|| ContentFingerprint(hex_digest.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
