use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

/// Path meaning "read from standard input"
pub const STDIN_PATH: &str = "-";

/// Read a whole text file, or standard input when `path` is `-`
pub fn read_text(path: &Path) -> Result<String> {
    if path == Path::new(STDIN_PATH) {
        let mut content = String::new();
        std::io::stdin()
            .read_to_string(&mut content)
            .context("Failed to read standard input")?;
        return Ok(content);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {:?}", path))
}

/// Set `requestId` on a raw request payload
///
/// Payloads that are not a JSON object are returned untouched so the stage can reject them.
pub fn with_request_id(raw: String, request_id: Option<&str>) -> String {
    let Some(request_id) = request_id else {
        return raw;
    };
    match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Object(mut fields)) => {
            fields.insert("requestId".to_string(), Value::from(request_id));
            Value::Object(fields).to_string()
        }
        _ => raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_text_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("request.json");
        std::fs::write(&path, r#"{"generatedCode": "print(1)"}"#).unwrap();

        assert_eq!(read_text(&path).unwrap(), r#"{"generatedCode": "print(1)"}"#);
    }

    #[test]
    fn test_read_errors_carry_context() {
        let dir = TempDir::new().unwrap();
        let err = read_text(&dir.path().join("absent.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read file"));
    }

    #[test]
    fn test_with_request_id_overrides_field() {
        let raw = r#"{"requestId": "old", "userStory": 12345}"#.to_string();
        let patched: Value = serde_json::from_str(&with_request_id(raw, Some("new"))).unwrap();

        assert_eq!(patched["requestId"], "new");
        assert_eq!(patched["userStory"], 12345);
    }

    #[test]
    fn test_with_request_id_leaves_other_payloads() {
        assert_eq!(with_request_id("{broken".to_string(), Some("id")), "{broken");
        assert_eq!(with_request_id("[1, 2]".to_string(), Some("id")), "[1, 2]");
        assert_eq!(with_request_id(r#"{"a": 1}"#.to_string(), None), r#"{"a": 1}"#);
    }
}
