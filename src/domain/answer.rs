use serde::{Deserialize, Serialize};
use serde_json::json;

/// Schema-constrained answer produced by the model in structured mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredAnswer {
    pub disclaimer: String,
    pub rationale: String,
    #[serde(alias = "ok_report")]
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Answer {
    Text(String),
    Structured(StructuredAnswer),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AnswerParseError {
    #[error("model output is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("model output field `{0}` is empty")]
    EmptyField(&'static str),
}

impl StructuredAnswer {
    pub const SCHEMA_NAME: &'static str = "caregraph_response";

    /// JSON schema for the three-field response, in the draft-07 subset every provider accepts.
    pub fn json_schema() -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "disclaimer": {
                    "type": "string",
                    "description": "Medical disclaimer"
                },
                "rationale": {
                    "type": "string",
                    "description": "Reasoning grounded in guidelines"
                },
                "summary": {
                    "type": "string",
                    "description": "Concise clinical summary and next steps"
                }
            },
            "required": ["disclaimer", "rationale", "summary"],
            "additionalProperties": false
        })
    }

    /// Parses raw model output, tolerating markdown code fences and prose around the object.
    pub fn parse(raw: &str) -> Result<Self, AnswerParseError> {
        let block = extract_json_block(raw);

        let parsed: Self = match serde_json::from_str(block) {
            Ok(answer) => answer,
            Err(first_error) => outermost_object(block)
                .and_then(|object| serde_json::from_str(object).ok())
                .ok_or_else(|| AnswerParseError::InvalidJson(first_error.to_string()))?,
        };

        parsed.validate()
    }

    fn validate(self) -> Result<Self, AnswerParseError> {
        if self.disclaimer.trim().is_empty() {
            return Err(AnswerParseError::EmptyField("disclaimer"));
        }
        if self.rationale.trim().is_empty() {
            return Err(AnswerParseError::EmptyField("rationale"));
        }
        if self.summary.trim().is_empty() {
            return Err(AnswerParseError::EmptyField("summary"));
        }
        Ok(self)
    }
}

fn extract_json_block(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(fence_start) = trimmed.find("```") else {
        return trimmed;
    };

    let after_fence = &trimmed[fence_start + 3..];
    let body = after_fence
        .strip_prefix("json")
        .or_else(|| after_fence.strip_prefix("JSON"))
        .unwrap_or(after_fence);

    match body.find("```") {
        Some(fence_end) => body[..fence_end].trim(),
        None => body.trim(),
    }
}

fn outermost_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
