//! Deterministic repository content selection for LLM summarization.
//!
//! `repo-digest` lists a GitHub repository's tree, filters out noise, ranks
//! what is left, and assembles a character-budgeted payload. The payload is
//! fingerprinted with SHA-256 and the expensive summarizer call is memoized
//! on that fingerprint. Identical repository content always yields the same
//! payload, byte-for-byte, and therefore the same cache key.

pub mod cache;
pub mod config;
pub mod pipeline;
pub mod selection;
pub mod source;
pub mod summarizer;
pub mod types;

pub use config::DigestConfig;
pub use pipeline::{RepoDigest, SummarizeError};
