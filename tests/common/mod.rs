#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use repo_digest::selection::ContentAssembler;
use repo_digest::source::{FetchError, RepoHost, RepoTree};
use repo_digest::summarizer::{Summarizer, SummarizerError};
use repo_digest::types::{AssembledContent, RepoReference, SummaryResult, TreeEntry};
use repo_digest::DigestConfig;

/// In-memory hosting API. Paths listed without content fail with NotFound.
#[derive(Default)]
pub struct StubHost {
    pub entries: Vec<TreeEntry>,
    pub files: HashMap<String, Vec<u8>>,
    pub delays: HashMap<String, Duration>,
    pub tree_error: Option<FetchError>,
    pub tree_delay: Option<Duration>,
    pub truncated: bool,
    pub tree_calls: AtomicUsize,
    pub file_calls: AtomicUsize,
}

impl StubHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: &str, content: &str) -> Self {
        self.entries
            .push(TreeEntry::file(path, Some(content.len() as u64)));
        self.files.insert(path.to_string(), content.as_bytes().to_vec());
        self
    }

    pub fn with_bytes(mut self, path: &str, content: Vec<u8>) -> Self {
        self.entries
            .push(TreeEntry::file(path, Some(content.len() as u64)));
        self.files.insert(path.to_string(), content);
        self
    }

    pub fn with_entry(mut self, entry: TreeEntry) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn with_delay(mut self, path: &str, delay: Duration) -> Self {
        self.delays.insert(path.to_string(), delay);
        self
    }

    pub fn failing_tree(mut self, err: FetchError) -> Self {
        self.tree_error = Some(err);
        self
    }

    pub fn tree_calls(&self) -> usize {
        self.tree_calls.load(Ordering::SeqCst)
    }

    pub fn file_calls(&self) -> usize {
        self.file_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RepoHost for StubHost {
    async fn fetch_tree(&self, _repo: &RepoReference) -> Result<RepoTree, FetchError> {
        self.tree_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.tree_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = &self.tree_error {
            return Err(err.clone());
        }
        Ok(RepoTree {
            entries: self.entries.clone(),
            truncated: self.truncated,
        })
    }

    async fn fetch_file(&self, _repo: &RepoReference, path: &str) -> Result<Vec<u8>, FetchError> {
        self.file_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(path) {
            tokio::time::sleep(*delay).await;
        }
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(path.to_string()))
    }
}

/// Summarizer that counts calls and echoes how many blocks it saw.
#[derive(Default)]
pub struct CountingSummarizer {
    pub calls: AtomicUsize,
    pub fail_with: Option<SummarizerError>,
    pub delay: Option<Duration>,
}

impl CountingSummarizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(err: SummarizerError) -> Self {
        Self {
            fail_with: Some(err),
            ..Self::default()
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Summarizer for CountingSummarizer {
    async fn generate(&self, prompt: &str) -> Result<SummaryResult, SummarizerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }
        Ok(SummaryResult {
            summary: format!("{} file blocks", prompt.matches("## File: ").count()),
            technologies: vec!["Rust".to_string()],
            structure: "flat".to_string(),
        })
    }
}

pub fn repo() -> RepoReference {
    RepoReference::new("octo", "demo", None)
}

pub fn summary(text: &str) -> SummaryResult {
    SummaryResult {
        summary: text.to_string(),
        technologies: vec!["Rust".to_string()],
        structure: "flat".to_string(),
    }
}

pub async fn assemble_with(host: &StubHost, config: &DigestConfig) -> AssembledContent {
    ContentAssembler::from_config(config)
        .assemble(host, &repo(), &host.entries)
        .await
}

pub async fn assemble(host: &StubHost) -> AssembledContent {
    assemble_with(host, &DigestConfig::default()).await
}
