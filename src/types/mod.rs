pub mod context_bundle;
pub mod identifiers;
pub mod tree;

pub use context_bundle::{
    AssembledContent, AssemblyStats, FileBlock, FileBlockError, PipelineWarning, SkipReason,
    SkippedFile, SummaryOutcome, SummaryReport, SummaryResult, UnassembledReason,
};
pub use identifiers::{ContentFingerprint, RepoReference, RepoReferenceError};
pub use tree::{EntryKind, TreeEntry};
