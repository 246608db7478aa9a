use thiserror::Error;

use crate::models::Language;

/// Minimum story length in characters, after trimming
pub const MIN_TEXT_LENGTH: usize = 10;
/// Maximum story length in characters, before trimming
pub const MAX_TEXT_LENGTH: usize = 100_000;

/// Why a story was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("User story must not be empty")]
    Empty,
    #[error("User story is too short (minimum {} characters)", MIN_TEXT_LENGTH)]
    TooShort,
    #[error("User story is too long (maximum {} characters)", MAX_TEXT_LENGTH)]
    TooLong,
    #[error("Unsupported language {tag:?}. Use: {supported}")]
    UnsupportedLanguage { tag: String, supported: String },
}

/// Validate a story and its target language
///
/// Rules are checked in order and the first failure wins:
/// empty, too short, too long, unsupported language.
pub fn validate_input(text: &str, language: &str) -> Result<Language, ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty);
    }

    if trimmed.chars().count() < MIN_TEXT_LENGTH {
        return Err(ValidationError::TooShort);
    }

    if text.chars().count() > MAX_TEXT_LENGTH {
        return Err(ValidationError::TooLong);
    }

    language
        .parse::<Language>()
        .map_err(|_| ValidationError::UnsupportedLanguage {
            tag: language.to_string(),
            supported: Language::supported_list(),
        })
}
