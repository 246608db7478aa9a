use std::time::Duration;

use chrono::Utc;
use tracing::info;

use crate::models::{ArtifactKind, ArtifactReference, PLACEHOLDER_CLASS_NAME};
use crate::storage::{BlobStore, ObjectMetadata, StorageError};

const CLASS_MARKER: &str = "public class ";

/// Best-effort name of the first public class in Java source
///
/// Looks at the first line containing `public class ` and takes the identifier after it.
/// This is a line scan, not a parser: later or nested public classes are ignored, and a
/// declaration with no usable name falls back to [`PLACEHOLDER_CLASS_NAME`].
pub fn extract_public_class_name(code: &str) -> String {
    code.lines()
        .find_map(|line| line.split_once(CLASS_MARKER).map(|(_, rest)| rest))
        .map(|rest| {
            rest.trim_start()
                .chars()
                .take_while(|c| c.is_alphanumeric() || *c == '_' || *c == '$')
                .collect::<String>()
        })
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| PLACEHOLDER_CLASS_NAME.to_string())
}

/// Make a caller-supplied request id safe to use inside a storage key
pub fn sanitize_key_component(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        format!("_{}", cleaned)
    } else {
        cleaned
    }
}

/// Write `content` once under the key for `kind` and return a signed fetch link
pub fn persist_artifact<S: BlobStore>(
    store: &S,
    content: &str,
    request_id: &str,
    kind: &ArtifactKind,
    ttl: Duration,
) -> Result<ArtifactReference, StorageError> {
    let key_kind = match kind {
        ArtifactKind::Code {
            language,
            class_name,
        } => ArtifactKind::Code {
            language: *language,
            class_name: class_name.as_deref().map(sanitize_key_component),
        },
        ArtifactKind::BddFeature => ArtifactKind::BddFeature,
    };
    let key = key_kind.key(&sanitize_key_component(request_id));

    let mut metadata = ObjectMetadata::new("text/plain")
        .with("request-id", request_id)
        .with("generated-at", Utc::now().to_rfc3339());
    metadata = match kind {
        ArtifactKind::Code {
            language,
            class_name,
        } => {
            let metadata = metadata.with("language", language.as_str());
            match class_name {
                Some(name) => metadata.with("class-name", name.as_str()),
                None => metadata,
            }
        }
        ArtifactKind::BddFeature => metadata.with("file-type", "gherkin-feature"),
    };

    store.put(&key, content, &metadata)?;
    info!("Artifact stored at {}", key);

    let presigned = store.presign_get(&key, ttl)?;
    info!("Signed link expires at {}", presigned.expires_at.to_rfc3339());

    Ok(ArtifactReference {
        key,
        url: presigned.url,
        expires_at: presigned.expires_at,
        byte_length: content.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Language;
    use crate::storage::{FsBlobStore, FsStoreConfig, DEFAULT_URL_TTL};
    use tempfile::TempDir;

    #[test]
    fn test_extract_class_name() {
        let code = "package shop;\n\nimport java.util.List;\n\npublic class OrderService {\n}\n";
        assert_eq!(extract_public_class_name(code), "OrderService");

        assert_eq!(
            extract_public_class_name("public class Repository<T> extends Base {"),
            "Repository"
        );
        assert_eq!(
            extract_public_class_name("public class Invoice{\n}\npublic class Second {}"),
            "Invoice"
        );
    }

    #[test]
    fn test_extract_class_name_fallback() {
        assert_eq!(extract_public_class_name("def main():\n    pass"), "GeneratedCode");
        assert_eq!(extract_public_class_name("class Hidden {}"), "GeneratedCode");
        assert_eq!(extract_public_class_name("public class {"), "GeneratedCode");
        assert_eq!(extract_public_class_name(""), "GeneratedCode");
    }

    #[test]
    fn test_sanitize_key_component() {
        assert_eq!(sanitize_key_component("req-123_a.b"), "req-123_a.b");
        assert_eq!(sanitize_key_component("../../etc"), ".._.._etc");
        assert_eq!(sanitize_key_component("a b/c"), "a_b_c");
        assert_eq!(sanitize_key_component(".."), "_..");
        assert_eq!(sanitize_key_component(""), "_");
    }

    #[test]
    fn test_persist_java_artifact() {
        let dir = TempDir::new().unwrap();
        let store = FsBlobStore::new(FsStoreConfig {
            root: dir.path().to_path_buf(),
            public_url: "http://localhost:8080/artifacts".to_string(),
            signing_key: "secret".to_string(),
        })
        .unwrap();

        let kind = ArtifactKind::Code {
            language: Language::Java,
            class_name: Some("OrderService".to_string()),
        };
        let reference =
            persist_artifact(&store, "public class OrderService {}", "r1", &kind, DEFAULT_URL_TTL)
                .unwrap();

        assert_eq!(reference.key, "generated-code/r1_OrderService.java");
        assert_eq!(reference.byte_length, 28);
        assert_eq!(
            store.fetch_signed(&reference.url).unwrap(),
            "public class OrderService {}"
        );

        let metadata = store.metadata(&reference.key).unwrap();
        assert_eq!(metadata.get("request-id"), Some("r1"));
        assert_eq!(metadata.get("language"), Some("java"));
        assert_eq!(metadata.get("class-name"), Some("OrderService"));
        assert!(metadata.get("generated-at").is_some());
    }

    #[test]
    fn test_persist_sanitizes_key_parts() {
        let dir = TempDir::new().unwrap();
        let store = FsBlobStore::new(FsStoreConfig {
            root: dir.path().to_path_buf(),
            public_url: "http://localhost:8080/artifacts".to_string(),
            signing_key: "secret".to_string(),
        })
        .unwrap();

        let kind = ArtifactKind::Code {
            language: Language::Java,
            class_name: Some("Inner$Café".to_string()),
        };
        let reference =
            persist_artifact(&store, "public class Inner$Café {}", "../r 2", &kind, DEFAULT_URL_TTL)
                .unwrap();

        assert_eq!(reference.key, "generated-code/.._r_2_Inner_Caf_.java");
        let metadata = store.metadata(&reference.key).unwrap();
        assert_eq!(metadata.get("request-id"), Some("../r 2"));
        assert_eq!(metadata.get("class-name"), Some("Inner$Café"));
    }
}
