use serde_json::Value;

use super::SummarizerError;
use crate::types::context_bundle::SummaryResult;

/// Parse the model's JSON answer, tolerating a surrounding markdown fence.
pub fn parse_summary(raw: &str) -> Result<SummaryResult, SummarizerError> {
    let text = strip_fence(raw.trim());

    let data: Value = serde_json::from_str(text)
        .map_err(|_| SummarizerError::InvalidResponse("Invalid JSON response from LLM".into()))?;

    let summary = data
        .get("summary")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid("summary"))?;
    let structure = data
        .get("structure")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid("structure"))?;
    let technologies = data
        .get("technologies")
        .and_then(Value::as_array)
        .ok_or_else(|| invalid("technologies"))?
        .iter()
        .map(|t| t.as_str().map(str::to_string))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| invalid("technologies"))?;

    Ok(SummaryResult {
        summary: summary.to_string(),
        technologies,
        structure: structure.to_string(),
    })
}

fn invalid(field: &str) -> SummarizerError {
    SummarizerError::InvalidResponse(format!("Missing or invalid '{field}' field"))
}

fn strip_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // drop the info string (```json) up to the first newline
    let body = match rest.split_once('\n') {
        Some((_, body)) => body,
        None => rest,
    };
    body.strip_suffix("```").unwrap_or(body).trim()
}
