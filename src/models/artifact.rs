use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Language;

/// Name used for a Java artifact when no `public class` declaration is found
pub const PLACEHOLDER_CLASS_NAME: &str = "GeneratedCode";

/// What kind of artifact is being persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactKind {
    /// Generated source code; Java carries the derived class name
    Code {
        language: Language,
        class_name: Option<String>,
    },
    /// Gherkin feature file
    BddFeature,
}

impl ArtifactKind {
    /// Top-level namespace for this kind of artifact
    pub fn category(&self) -> &'static str {
        match self {
            ArtifactKind::Code { .. } => "generated-code",
            ArtifactKind::BddFeature => "bdd-tests",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactKind::Code { language, .. } => language.extension(),
            ArtifactKind::BddFeature => "feature",
        }
    }

    /// Suffix appended to the request id in the key, if any
    pub fn derived_name(&self) -> Option<&str> {
        match self {
            ArtifactKind::Code { class_name, .. } => class_name.as_deref(),
            ArtifactKind::BddFeature => Some("tests"),
        }
    }

    /// Storage key: `{category}/{request_id}[_{derived_name}].{ext}`
    pub fn key(&self, request_id: &str) -> String {
        match self.derived_name() {
            Some(name) => format!(
                "{}/{}_{}.{}",
                self.category(),
                request_id,
                name,
                self.extension()
            ),
            None => format!("{}/{}.{}", self.category(), request_id, self.extension()),
        }
    }
}

/// A persisted artifact and its time-limited fetch link
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactReference {
    pub key: String,
    pub url: String,
    pub expires_at: DateTime<Utc>,
    /// Size of the stored body in bytes
    pub byte_length: usize,
}
