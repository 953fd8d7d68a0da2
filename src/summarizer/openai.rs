use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::{parse_summary, Summarizer, SummarizerError};
use crate::config::DigestConfig;
use crate::types::context_bundle::SummaryResult;

const SYSTEM_PROMPT: &str = "You are a software project analyst. Given repository contents \
(directory tree and key files), produce a JSON object with exactly these fields:

- \"summary\": A clear, human-readable description of what the project does (2-4 sentences).
- \"technologies\": A JSON array of the main languages, frameworks, and libraries used.
- \"structure\": A brief description of how the project is organized (1-2 sentences).

Respond ONLY with valid JSON, no markdown fences, no extra text.";

fn answer_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "summary": {"type": "string"},
            "technologies": {"type": "array", "items": {"type": "string"}, "minItems": 1},
            "structure": {"type": "string"}
        },
        "required": ["summary", "technologies", "structure"],
        "additionalProperties": false
    })
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// Chat-completions client for any OpenAI-compatible endpoint.
pub struct OpenAiSummarizer {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAiSummarizer {
    pub fn new(config: &DigestConfig) -> Result<Self, SummarizerError> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| SummarizerError::Request(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.llm_base_url.clone(),
            model: config.llm_model.clone(),
            api_key: config.llm_api_key.clone(),
        })
    }

    fn chat_endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    fn request_body(&self, prompt: &str) -> Value {
        json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": [{"type": "text", "text": prompt}]}
            ],
            "response_format": {
                "type": "json_schema",
                "json_schema": {"name": "answer", "strict": true, "schema": answer_schema()}
            }
        })
    }
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    async fn generate(&self, prompt: &str) -> Result<SummaryResult, SummarizerError> {
        let api_key = self.api_key.as_deref().ok_or(SummarizerError::MissingApiKey)?;

        info!(model = %self.model, prompt_chars = prompt.chars().count(), "calling LLM");
        let response = self
            .client
            .post(self.chat_endpoint())
            .bearer_auth(api_key)
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| SummarizerError::Request(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok())
                .map(Duration::from_secs);
            return Err(SummarizerError::RateLimited { retry_after });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SummarizerError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| SummarizerError::InvalidResponse(e.to_string()))?;

        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| SummarizerError::InvalidResponse("response has no message content".into()))?;

        debug!(chars = content.len(), "LLM answered");
        parse_summary(&content)
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn logged_prompt_size_counts_characters() {
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let mut config = DigestConfig::default();
        config.llm_api_key = Some("k".into());
        // nothing listens here; the request fails after the log line
        config.llm_base_url = "http://127.0.0.1:9/v1/".into();
        let summarizer = OpenAiSummarizer::new(&config).unwrap();

        // 4 chars, 7 bytes
        let _ = summarizer.generate("ééé!").await;

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("prompt_chars=4"), "{output}");
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        let summarizer = OpenAiSummarizer::new(&DigestConfig::default()).unwrap();
        assert_eq!(
            summarizer.generate("prompt").await,
            Err(SummarizerError::MissingApiKey)
        );
    }

    #[test]
    fn request_uses_strict_schema() {
        let summarizer = OpenAiSummarizer::new(&DigestConfig::default()).unwrap();
        let body = summarizer.request_body("hello");
        assert_eq!(body["response_format"]["json_schema"]["strict"], json!(true));
        assert_eq!(body["messages"][1]["content"][0]["text"], json!("hello"));
        assert_eq!(
            summarizer.chat_endpoint(),
            "https://api.tokenfactory.nebius.com/v1/chat/completions"
        );
    }
}
