//! The summarizer collaborator: prompt text in, structured summary out.

pub mod openai;
pub mod parse;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::types::context_bundle::SummaryResult;

pub use openai::OpenAiSummarizer;
pub use parse::parse_summary;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SummarizerError {
    #[error("LLM API key is not set")]
    MissingApiKey,
    #[error("LLM request failed: {0}")]
    Request(String),
    #[error("LLM rate limited (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },
    #[error("LLM returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("LLM returned an invalid response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Its own retry policy, if any, is the implementation's business.
    async fn generate(&self, prompt: &str) -> Result<SummaryResult, SummarizerError>;
}

#[async_trait]
impl<T> Summarizer for Arc<T>
where
    T: Summarizer + ?Sized,
{
    async fn generate(&self, prompt: &str) -> Result<SummaryResult, SummarizerError> {
        (**self).generate(prompt).await
    }
}
