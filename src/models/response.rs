use serde::{Deserialize, Serialize};

use crate::models::Language;

/// Counters reported by the normalizer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizeStats {
    pub original_length: usize,
    pub cleaned_length: usize,
    pub standardized_length: usize,
    pub word_count: usize,
}

/// Success body of the normalizer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizeResponse {
    /// Cleaned input text, before LLM restructuring
    pub original_story: String,
    pub structured_story: String,
    pub context_for_generation: String,
    pub language: Language,
    pub request_id: String,
    pub processed_at: String,
    pub stats: NormalizeStats,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeStats {
    pub prompt_length: usize,
    pub code_length: usize,
    pub estimated_lines: usize,
}

/// Success body of a code generator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeResponse {
    pub presigned_url: String,
    pub code_length: usize,
    /// Only set for Java output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    pub language: Language,
    pub request_id: String,
    pub generated_at: String,
    pub stats: CodeStats,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BddStats {
    pub prompt_length: usize,
    pub bdd_length: usize,
    pub estimated_lines: usize,
    pub scenario_count: usize,
}

/// Success body of the BDD generator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BddResponse {
    pub presigned_url: String,
    pub bdd_length: usize,
    pub scenario_count: usize,
    pub language: Language,
    pub request_id: String,
    pub generated_at: String,
    pub stats: BddStats,
}

/// Body of every non-200 response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// Short error label, e.g. "Validation failed"
    pub error: String,
    pub message: String,
    pub request_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Error source chain, only for internal faults
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<String>,
}

/// Either the stage's declared output or an error payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseBody<T> {
    Success(T),
    Error(ErrorBody),
}

/// Envelope returned by every stage handler
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageResponse<T> {
    pub status_code: u16,
    pub body: ResponseBody<T>,
}

impl<T> StageResponse<T> {
    pub fn ok(body: T) -> Self {
        Self {
            status_code: 200,
            body: ResponseBody::Success(body),
        }
    }

    pub fn error(status_code: u16, body: ErrorBody) -> Self {
        Self {
            status_code,
            body: ResponseBody::Error(body),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }

    /// The success body, if any
    pub fn success(&self) -> Option<&T> {
        match &self.body {
            ResponseBody::Success(body) => Some(body),
            ResponseBody::Error(_) => None,
        }
    }

    /// The error body, if any
    pub fn error_body(&self) -> Option<&ErrorBody> {
        match &self.body {
            ResponseBody::Success(_) => None,
            ResponseBody::Error(body) => Some(body),
        }
    }
}

/// Count of `\n`-separated segments; an empty artifact still counts as one line
pub fn estimated_lines(text: &str) -> usize {
    text.split('\n').count()
}

/// Length in characters, matching how lengths are reported on the wire
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}
