use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use crate::cache::{CacheStore, DiskStore, FingerprintCache};
use crate::config::DigestConfig;
use crate::selection::ContentAssembler;
use crate::source::{FetchError, GitHubClient, RepoHost};
use crate::summarizer::{OpenAiSummarizer, Summarizer, SummarizerError};
use crate::types::context_bundle::{
    AssembledContent, PipelineWarning, SkipReason, SkippedFile, SummaryOutcome, SummaryReport,
    UnassembledReason,
};
use crate::types::identifiers::{RepoReference, RepoReferenceError};

#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] RepoReferenceError),
    #[error("Repository not found (may be private or does not exist): {0}")]
    NotFound(String),
    #[error("Rate limited by GitHub (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },
    #[error("Transient network error: {0}")]
    TransientNetwork(String),
    #[error("Timed out after {after:?} during {stage}")]
    Timeout { stage: &'static str, after: Duration },
    #[error("Failed to fetch repository: {0}")]
    Upstream(FetchError),
    #[error("LLM summarization failed: {0}")]
    Summarizer(#[from] SummarizerError),
}

impl From<FetchError> for SummarizeError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::NotFound(what) => SummarizeError::NotFound(what),
            FetchError::RateLimited { retry_after } => SummarizeError::RateLimited { retry_after },
            FetchError::TransientNetwork(msg) => SummarizeError::TransientNetwork(msg),
            other => SummarizeError::Upstream(other),
        }
    }
}

impl SummarizeError {
    /// Whether the caller may try again unchanged.
    pub fn is_retryable(&self) -> bool {
        match self {
            SummarizeError::RateLimited { .. }
            | SummarizeError::TransientNetwork(_)
            | SummarizeError::Timeout { .. } => true,
            SummarizeError::Summarizer(e) => matches!(
                e,
                SummarizerError::RateLimited { .. } | SummarizerError::Request(_)
            ),
            _ => false,
        }
    }

    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            SummarizeError::RateLimited { retry_after }
            | SummarizeError::Summarizer(SummarizerError::RateLimited { retry_after }) => *retry_after,
            _ => None,
        }
    }
}

/// `summarize(github_url)`: listing → filter → prioritize → assemble →
/// fingerprint cache → summarizer.
///
/// No stage retries. Dropping the returned future abandons in-flight
/// fetches; only a complete assembly is ever fingerprinted and stored.
pub struct RepoDigest<H, S, C> {
    host: H,
    summarizer: S,
    cache: FingerprintCache<C>,
    assembler: ContentAssembler,
    tree_timeout: Duration,
    summarize_timeout: Duration,
}

impl RepoDigest<GitHubClient, OpenAiSummarizer, DiskStore> {
    /// GitHub host, OpenAI-compatible summarizer and an on-disk cache at
    /// `config.cache_dir`.
    pub fn from_config(config: &DigestConfig) -> Result<Self, SummarizeError> {
        let host = GitHubClient::new(config)?;
        let summarizer = OpenAiSummarizer::new(config)?;
        let cache = FingerprintCache::new(DiskStore::new(&config.cache_dir));
        Ok(Self::new(host, summarizer, cache, config))
    }
}

impl<H, S, C> RepoDigest<H, S, C>
where
    H: RepoHost,
    S: Summarizer,
    C: CacheStore,
{
    pub fn new(host: H, summarizer: S, cache: FingerprintCache<C>, config: &DigestConfig) -> Self {
        Self {
            host,
            summarizer,
            cache,
            assembler: ContentAssembler::from_config(config),
            tree_timeout: config.tree_timeout,
            summarize_timeout: config.summarize_timeout,
        }
    }

    pub fn cache(&self) -> &FingerprintCache<C> {
        &self.cache
    }

    pub async fn summarize(&self, github_url: &str) -> Result<SummaryReport, SummarizeError> {
        let repo = RepoReference::parse(github_url)?;
        self.summarize_reference(&repo).await
    }

    pub async fn summarize_reference(&self, repo: &RepoReference) -> Result<SummaryReport, SummarizeError> {
        info!(repo = %repo, git_ref = repo.ref_or_head(), "summarize request");

        let (content, warnings) = self.assemble(repo).await?;
        let stats = content.stats().clone();

        if stats.files_considered == 0 {
            info!(repo = %repo, "no includable files");
            return Ok(SummaryReport {
                repository: repo.to_string(),
                outcome: SummaryOutcome::EmptyRepository,
                stats,
                warnings,
            });
        }
        if content.is_empty() {
            let reason = UnassembledReason::from_stats(&stats);
            warn!(repo = %repo, ?reason, considered = stats.files_considered, "nothing assembled");
            return Ok(SummaryReport {
                repository: repo.to_string(),
                outcome: SummaryOutcome::NothingAssembled { reason },
                stats,
                warnings,
            });
        }

        info!(repo = %repo, chars = stats.chars_used, files = stats.files_included, "assembled content");

        let summarizer = &self.summarizer;
        let timeout = self.summarize_timeout;
        let cached = self
            .cache
            .get_or_compute(&content, |c| {
                let prompt = c.render();
                async move {
                    match tokio::time::timeout(timeout, summarizer.generate(&prompt)).await {
                        Ok(result) => result.map_err(SummarizeError::from),
                        Err(_) => Err(SummarizeError::Timeout {
                            stage: "summarization",
                            after: timeout,
                        }),
                    }
                }
            })
            .await?;

        info!(repo = %repo, fingerprint = %cached.fingerprint, cache_hit = cached.hit, "summarization complete");

        Ok(SummaryReport {
            repository: repo.to_string(),
            outcome: SummaryOutcome::Summarized {
                result: cached.result,
                fingerprint: cached.fingerprint,
                cache_hit: cached.hit,
            },
            stats,
            warnings,
        })
    }

    /// Tree listing plus assembly, without summarizing.
    ///
    /// Listing failures propagate; single-file failures become a
    /// [`PipelineWarning::PartialContent`].
    pub async fn assemble(
        &self,
        repo: &RepoReference,
    ) -> Result<(AssembledContent, Vec<PipelineWarning>), SummarizeError> {
        let tree = tokio::time::timeout(self.tree_timeout, self.host.fetch_tree(repo))
            .await
            .map_err(|_| SummarizeError::Timeout {
                stage: "tree listing",
                after: self.tree_timeout,
            })??;

        let content = self.assembler.assemble(&self.host, repo, &tree.entries).await;

        let mut warnings = Vec::new();
        if tree.truncated {
            warnings.push(PipelineWarning::TreeTruncated);
        }
        let failed: Vec<SkippedFile> = content
            .skipped()
            .iter()
            .filter(|s| matches!(s.reason, SkipReason::FetchFailed { .. }))
            .cloned()
            .collect();
        if !failed.is_empty() {
            warnings.push(PipelineWarning::PartialContent { skipped: failed });
        }

        Ok((content, warnings))
    }
}
