use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Target languages the pipeline can generate code for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    Java,
}

/// Every accepted language tag, in the order shown to callers
pub const SUPPORTED_LANGUAGES: [Language; 2] = [Language::Python, Language::Java];

impl Language {
    /// Lowercase tag used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::Java => "java",
        }
    }

    /// Uppercase tag used inside prompts and generation contexts
    pub fn upper(&self) -> &'static str {
        match self {
            Language::Python => "PYTHON",
            Language::Java => "JAVA",
        }
    }

    /// File extension for generated source files
    pub fn extension(&self) -> &'static str {
        match self {
            Language::Python => "py",
            Language::Java => "java",
        }
    }

    /// Comma-separated list of supported tags, for error messages
    pub fn supported_list() -> String {
        SUPPORTED_LANGUAGES
            .iter()
            .map(Language::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a tag is not one of [`SUPPORTED_LANGUAGES`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported language: {0:?}")]
pub struct UnknownLanguage(pub String);

impl FromStr for Language {
    type Err = UnknownLanguage;

    /// Exact match on the lowercase tag; callers lower-case first when they want leniency
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "python" => Ok(Language::Python),
            "java" => Ok(Language::Java),
            other => Err(UnknownLanguage(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_language() {
        assert_eq!("python".parse::<Language>().unwrap(), Language::Python);
        assert_eq!("java".parse::<Language>().unwrap(), Language::Java);
        assert!("Java".parse::<Language>().is_err());
        assert!("rust".parse::<Language>().is_err());
    }

    #[test]
    fn test_supported_list() {
        assert_eq!(Language::supported_list(), "python, java");
        assert_eq!(Language::Java.upper(), "JAVA");
        assert_eq!(Language::Python.extension(), "py");
    }
}
