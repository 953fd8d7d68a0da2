pub mod budgeting;
pub mod filters;
pub mod ranking;

use std::pin::pin;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::config::DigestConfig;
use crate::source::RepoHost;
use crate::types::context_bundle::{
    AssembledContent, AssemblyStats, FileBlock, SkipReason, SkippedFile,
};
use crate::types::identifiers::RepoReference;
use crate::types::tree::TreeEntry;
pub use budgeting::{apply_budget, BudgetResult, BudgetStep, ContentAccumulator};
pub use filters::{decide, FilterDecision, FilterReason, FilterRules};
pub use ranking::{prioritize, NameTierAssigner, PriorityTier, TierAssigner};

/// Filter, prioritize, fetch and budget a repository listing into one
/// sealed [`AssembledContent`].
pub struct ContentAssembler<T = NameTierAssigner> {
    rules: FilterRules,
    tiers: T,
    budget: usize,
    max_file_bytes: u64,
    max_tree_entries: usize,
    include_tree_overview: bool,
    fetch_concurrency: usize,
    file_timeout: Duration,
}

impl ContentAssembler<NameTierAssigner> {
    pub fn from_config(config: &DigestConfig) -> Self {
        Self::new(FilterRules::default(), NameTierAssigner::default(), config)
    }
}

impl<T> ContentAssembler<T>
where
    T: TierAssigner,
{
    pub fn new(rules: FilterRules, tiers: T, config: &DigestConfig) -> Self {
        Self {
            rules,
            tiers,
            budget: config.content_budget,
            max_file_bytes: config.max_file_bytes,
            max_tree_entries: config.max_tree_entries,
            include_tree_overview: config.include_tree_overview,
            fetch_concurrency: config.fetch_concurrency.max(1),
            file_timeout: config.file_timeout,
        }
    }

    /// Included entries in fetch order.
    pub fn select(&self, entries: &[TreeEntry]) -> Vec<(PriorityTier, TreeEntry)> {
        let included: Vec<TreeEntry> = entries
            .iter()
            .filter(|e| self.rules.includes(e))
            .cloned()
            .collect();
        prioritize(&self.tiers, included)
    }

    /// Never fails: a file that cannot be fetched is recorded as skipped and
    /// assembly continues with the next one.
    ///
    /// Fetches run concurrently (bounded) but results are consumed in
    /// priority order, so the payload does not depend on completion order.
    /// Stops at the first block that would overflow the budget; that block is
    /// omitted and any in-flight fetches are dropped.
    pub async fn assemble<H>(
        &self,
        host: &H,
        repo: &RepoReference,
        entries: &[TreeEntry],
    ) -> AssembledContent
    where
        H: RepoHost + ?Sized,
    {
        let selected = self.select(entries);
        let files_considered = selected.len();
        info!(
            repo = %repo,
            listed = entries.len(),
            included = files_considered,
            "filtered repository tree"
        );

        let mut fetched = pin!(stream::iter(selected)
            .map(move |(_, entry)| self.fetch_block(host, repo, entry))
            .buffered(self.fetch_concurrency));

        let mut acc = ContentAccumulator::new(self.budget);
        let mut skipped = Vec::new();

        while let Some(outcome) = fetched.next().await {
            match outcome {
                Ok(block) => {
                    let path = block.path.clone();
                    if acc.try_append(block) == BudgetStep::Exhausted {
                        debug!(%path, chars_used = acc.chars_used(), "budget reached, omitting block");
                        break;
                    }
                }
                Err(skip) => {
                    warn!(path = %skip.path, reason = ?skip.reason, "skipping file");
                    skipped.push(skip);
                }
            }
        }

        let chars_used = acc.chars_used();
        let blocks = acc.into_blocks();
        let stats = AssemblyStats {
            entries_listed: entries.len(),
            files_considered,
            files_included: blocks.len(),
            files_skipped: skipped.len(),
            files_excluded_by_budget: files_considered - blocks.len() - skipped.len(),
            budget: self.budget,
            chars_used,
        };

        let overview = self
            .include_tree_overview
            .then(|| directory_overview(entries, self.max_tree_entries));

        AssembledContent::sealed(repo.to_string(), overview, blocks, skipped, stats)
    }

    async fn fetch_block<H>(
        &self,
        host: &H,
        repo: &RepoReference,
        entry: TreeEntry,
    ) -> Result<FileBlock, SkippedFile>
    where
        H: RepoHost + ?Sized,
    {
        let skip = |reason| SkippedFile {
            path: entry.path.clone(),
            reason,
        };

        if let Some(bytes) = entry.size.filter(|s| *s > self.max_file_bytes) {
            return Err(skip(SkipReason::Oversized { bytes }));
        }

        let raw = match tokio::time::timeout(self.file_timeout, host.fetch_file(repo, &entry.path)).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => {
                return Err(skip(SkipReason::FetchFailed {
                    message: e.to_string(),
                }))
            }
            Err(_) => {
                return Err(skip(SkipReason::FetchFailed {
                    message: format!("timed out after {:?}", self.file_timeout),
                }))
            }
        };

        let len = raw.len() as u64;
        if len > self.max_file_bytes {
            return Err(skip(SkipReason::Oversized { bytes: len }));
        }

        let block = FileBlock::ingest(entry.path.clone(), raw).map_err(|_| skip(SkipReason::NotText))?;
        if block.content.trim().is_empty() {
            return Err(skip(SkipReason::Empty));
        }
        Ok(block)
    }
}

/// Indented listing of every file path, sorted, capped at `max_entries`.
pub fn directory_overview(entries: &[TreeEntry], max_entries: usize) -> String {
    let mut paths: Vec<&TreeEntry> = entries.iter().filter(|e| !e.is_dir()).collect();
    paths.sort_by(|a, b| a.path.cmp(&b.path));

    let total = paths.len();
    let mut lines: Vec<String> = paths
        .iter()
        .take(max_entries)
        .map(|e| format!("{}{}", "  ".repeat(e.depth()), e.file_name()))
        .collect();

    if total > max_entries {
        lines.push(format!("... ({} more files)", total - max_entries));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overview_indents_by_depth_and_caps() {
        let entries = vec![
            TreeEntry::file("src/main.rs", None),
            TreeEntry::directory("src"),
            TreeEntry::file("Cargo.toml", None),
            TreeEntry::file("src/util/mod.rs", None),
        ];
        assert_eq!(
            directory_overview(&entries, 10),
            "Cargo.toml\n  main.rs\n    mod.rs"
        );
        assert_eq!(
            directory_overview(&entries, 1),
            "Cargo.toml\n... (2 more files)"
        );
    }
}
