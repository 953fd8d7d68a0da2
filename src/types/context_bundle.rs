use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::identifiers::ContentFingerprint;

#[derive(Debug, Error)]
pub enum FileBlockError {
    #[error("Content must be valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

/// One fetched file, labeled with its path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileBlock {
    pub path: String,
    pub content: String,
}

impl FileBlock {
    /// Ingest raw bytes fetched from the host.
    ///
    /// Rejects anything that is not UTF-8 text; the content is kept verbatim
    /// (no newline or whitespace normalization) so fingerprints see real bytes.
    pub fn ingest(path: impl Into<String>, raw_content: Vec<u8>) -> Result<Self, FileBlockError> {
        let content = String::from_utf8(raw_content)?;
        Ok(FileBlock {
            path: path.into(),
            content,
        })
    }

    /// The labeled block as it appears in the assembled payload.
    pub fn render(&self) -> String {
        format!("\n## File: {}\n```\n{}\n```\n", self.path, self.content)
    }

    /// Budget cost, in characters, of the rendered block.
    pub fn char_len(&self) -> usize {
        self.render().chars().count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    FetchFailed { message: String },
    NotText,
    Empty,
    Oversized { bytes: u64 },
}

/// A file that passed filtering but never made it into the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFile {
    pub path: String,
    pub reason: SkipReason,
}

/// Statistics describing the outcome of assembly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssemblyStats {
    pub entries_listed: usize,
    pub files_considered: usize,
    pub files_included: usize,
    pub files_skipped: usize,
    pub files_excluded_by_budget: usize,
    pub budget: usize,
    pub chars_used: usize,
}

/// The sealed, ordered payload handed to the summarizer.
///
/// Only the assembler builds one of these; once returned it is read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssembledContent {
    repository: String,
    overview: Option<String>,
    blocks: Vec<FileBlock>,
    skipped: Vec<SkippedFile>,
    stats: AssemblyStats,
}

impl AssembledContent {
    pub(crate) fn sealed(
        repository: String,
        overview: Option<String>,
        blocks: Vec<FileBlock>,
        skipped: Vec<SkippedFile>,
        stats: AssemblyStats,
    ) -> Self {
        Self {
            repository,
            overview,
            blocks,
            skipped,
            stats,
        }
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub fn blocks(&self) -> &[FileBlock] {
        &self.blocks
    }

    pub fn skipped(&self) -> &[SkippedFile] {
        &self.skipped
    }

    pub fn stats(&self) -> &AssemblyStats {
        &self.stats
    }

    pub fn chars_used(&self) -> usize {
        self.stats.chars_used
    }

    /// True when no file made it into the payload.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Serialized form: repository header, optional directory overview, then
    /// every block in assembled order. This is both the prompt text and the
    /// fingerprint input.
    pub fn render(&self) -> String {
        let mut out = format!("# Repository: {}\n", self.repository);
        if let Some(overview) = &self.overview {
            out.push_str("\n## Directory Structure\n```\n");
            out.push_str(overview);
            out.push_str("\n```\n");
        }
        for block in &self.blocks {
            out.push_str(&block.render());
        }
        out
    }

    pub fn fingerprint(&self) -> ContentFingerprint {
        ContentFingerprint::from_content(self.render().as_bytes())
    }
}

/// Structured summary produced by the summarizer collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryResult {
    pub summary: String,
    pub technologies: Vec<String>,
    pub structure: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SummaryOutcome {
    Summarized {
        result: SummaryResult,
        fingerprint: ContentFingerprint,
        cache_hit: bool,
    },
    /// No includable file was found; nothing was sent to the summarizer.
    EmptyRepository,
    /// Includable files exist but none of them made it into the payload.
    /// Nothing was sent to the summarizer.
    NothingAssembled { reason: UnassembledReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnassembledReason {
    /// Every candidate was skipped (fetch failure, not text, empty, oversized).
    AllSkipped,
    /// The first fetched block alone exceeds the content budget.
    OverBudget,
}

impl UnassembledReason {
    pub fn from_stats(stats: &AssemblyStats) -> Self {
        if stats.files_excluded_by_budget > 0 {
            UnassembledReason::OverBudget
        } else {
            UnassembledReason::AllSkipped
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PipelineWarning {
    /// Some files could not be fetched; assembly went ahead without them.
    PartialContent { skipped: Vec<SkippedFile> },
    /// The host returned a truncated tree listing.
    TreeTruncated,
}

/// Final result of `summarize`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryReport {
    pub repository: String,
    pub outcome: SummaryOutcome,
    pub stats: AssemblyStats,
    pub warnings: Vec<PipelineWarning>,
}

impl SummaryReport {
    pub fn result(&self) -> Option<&SummaryResult> {
        match &self.outcome {
            SummaryOutcome::Summarized { result, .. } => Some(result),
            SummaryOutcome::EmptyRepository | SummaryOutcome::NothingAssembled { .. } => None,
        }
    }

    pub fn is_empty_repository(&self) -> bool {
        matches!(self.outcome, SummaryOutcome::EmptyRepository)
    }
}
