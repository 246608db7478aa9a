use serde::{Deserialize, Serialize};

/// Request id used when the caller does not supply one
pub const UNKNOWN_REQUEST_ID: &str = "unknown";

/// Input to the story normalizer stage
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizeRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Free-text story typed by the user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_story: Option<String>,
    /// Story read from an uploaded file; preferred over `user_story`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl NormalizeRequest {
    pub fn request_id(&self) -> &str {
        self.request_id.as_deref().unwrap_or(UNKNOWN_REQUEST_ID)
    }

    /// Pick the story text: trimmed file content if present, otherwise the trimmed user story
    pub fn input_text(&self) -> &str {
        let file_content = self.file_content.as_deref().map(str::trim).unwrap_or("");
        if !file_content.is_empty() {
            return file_content;
        }
        self.user_story.as_deref().map(str::trim).unwrap_or("")
    }

    /// Whether the text came from an uploaded file
    pub fn uses_file_content(&self) -> bool {
        self.file_content
            .as_deref()
            .is_some_and(|c| !c.trim().is_empty())
    }

    /// Lowercased language tag, empty when absent
    pub fn language_tag(&self) -> String {
        self.language.as_deref().unwrap_or("").to_lowercase()
    }
}

/// Input to a code generator stage
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_for_generation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl CodeRequest {
    pub fn request_id(&self) -> &str {
        self.request_id.as_deref().unwrap_or(UNKNOWN_REQUEST_ID)
    }
}

/// Input to the BDD test generator stage
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BddRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Alias accepted for `code`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_code: Option<String>,
    /// Signed link to previously generated code, used when no code is inlined
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presigned_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl BddRequest {
    pub fn request_id(&self) -> &str {
        self.request_id.as_deref().unwrap_or(UNKNOWN_REQUEST_ID)
    }

    /// Inline code, `code` taking precedence over `generatedCode`
    pub fn inline_code(&self) -> Option<&str> {
        [self.code.as_deref(), self.generated_code.as_deref()]
            .into_iter()
            .flatten()
            .find(|c| !c.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalize_request() {
        let json = r#"{"requestId": "req-1", "userStory": "  As a user  ", "language": "PYTHON", "extra": 1}"#;
        let request: NormalizeRequest = serde_json::from_str(json).unwrap();

        assert_eq!(request.request_id(), "req-1");
        assert_eq!(request.input_text(), "As a user");
        assert_eq!(request.language_tag(), "python");
        assert!(!request.uses_file_content());
    }

    #[test]
    fn test_file_content_preferred() {
        let request = NormalizeRequest {
            user_story: Some("typed story".to_string()),
            file_content: Some("uploaded story".to_string()),
            ..Default::default()
        };
        assert_eq!(request.input_text(), "uploaded story");
        assert!(request.uses_file_content());

        let blank_file = NormalizeRequest {
            user_story: Some("typed story".to_string()),
            file_content: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(blank_file.input_text(), "typed story");
    }

    #[test]
    fn test_request_id_defaults_to_unknown() {
        let request: CodeRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.request_id(), UNKNOWN_REQUEST_ID);
    }

    #[test]
    fn test_bdd_inline_code_alias() {
        let request: BddRequest =
            serde_json::from_str(r#"{"code": "", "generatedCode": "print(1)"}"#).unwrap();
        assert_eq!(request.inline_code(), Some("print(1)"));

        let request: BddRequest = serde_json::from_str(r#"{"language": "java"}"#).unwrap();
        assert_eq!(request.inline_code(), None);
    }
}
