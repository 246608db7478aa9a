use std::borrow::Cow;
use std::time::Duration;

use tracing::{info, info_span, Instrument};

use crate::llm::{build_bdd_prompt, CompletionClient, GenerationParams};
use crate::models::{
    char_len, estimated_lines, ArtifactKind, BddRequest, BddResponse, BddStats, Language,
    StageResponse,
};
use crate::stages::{decode_request, finish, now_rfc3339, StageError};
use crate::storage::{persist_artifact, BlobStore, DEFAULT_URL_TTL};

const SCENARIO_MARKER: &str = "Scenario:";

/// Configuration for the BDD test generator
#[derive(Debug, Clone)]
pub struct BddConfig {
    pub params: GenerationParams,
    pub url_ttl: Duration,
}

impl Default for BddConfig {
    fn default() -> Self {
        Self {
            params: GenerationParams::bdd_generation(),
            url_ttl: DEFAULT_URL_TTL,
        }
    }
}

/// Where the code under test comes from
enum CodeSource<'a> {
    Inline(&'a str),
    SignedLink(&'a str),
}

/// Number of literal `Scenario:` occurrences in a feature text
pub fn count_scenarios(feature: &str) -> usize {
    feature.matches(SCENARIO_MARKER).count()
}

/// Execute the BDD test generator
///
/// Code comes inline (`code`, then `generatedCode`) or, failing that, from a signed
/// link issued by this pipeline's store.
pub async fn execute_bdd<C: CompletionClient, S: BlobStore>(
    client: &C,
    store: &S,
    request: &BddRequest,
    config: &BddConfig,
) -> StageResponse<BddResponse> {
    let request_id = request.request_id();
    let span = info_span!("stage", stage = "generate-bdd", request_id = %request_id);

    async {
        let result = generate_bdd(client, store, request, config).await;
        finish("generate-bdd", request_id, result)
    }
    .instrument(span)
    .await
}

/// Execute the BDD test generator on a raw JSON payload
pub async fn execute_bdd_json<C: CompletionClient, S: BlobStore>(
    client: &C,
    store: &S,
    raw: &str,
    config: &BddConfig,
) -> StageResponse<BddResponse> {
    match decode_request::<BddRequest, _>("generate-bdd", raw) {
        Ok(request) => execute_bdd(client, store, &request, config).await,
        Err(response) => response,
    }
}

async fn generate_bdd<C: CompletionClient, S: BlobStore>(
    client: &C,
    store: &S,
    request: &BddRequest,
    config: &BddConfig,
) -> Result<BddResponse, StageError> {
    let source = match (request.inline_code(), request.presigned_url.as_deref()) {
        (Some(code), _) => CodeSource::Inline(code),
        (None, Some(url)) if !url.is_empty() => CodeSource::SignedLink(url),
        _ => {
            return Err(StageError::MissingField {
                label: "Missing code",
                field: "code",
            });
        }
    };

    let language_tag = request.language.as_deref().unwrap_or("");
    let language: Language = language_tag
        .parse()
        .map_err(|_| StageError::UnsupportedLanguage {
            actual: language_tag.to_string(),
            supported: Language::supported_list(),
        })?;

    let code: Cow<'_, str> = match source {
        CodeSource::Inline(code) => Cow::Borrowed(code),
        CodeSource::SignedLink(url) => {
            info!("Fetching code through signed link");
            Cow::Owned(store.fetch_signed(url)?)
        }
    };
    info!("Received {} code: {} characters", language, char_len(&code));

    let prompt = build_bdd_prompt(&code, language);
    info!("Prompt built: {} characters", char_len(&prompt));

    let feature = client.complete(&prompt, &config.params).await?;
    let scenario_count = count_scenarios(&feature);
    info!(
        "Generated feature: {} characters, {} scenarios",
        char_len(&feature),
        scenario_count
    );

    let artifact = persist_artifact(
        store,
        &feature,
        request.request_id(),
        &ArtifactKind::BddFeature,
        config.url_ttl,
    )?;

    Ok(BddResponse {
        presigned_url: artifact.url,
        bdd_length: char_len(&feature),
        scenario_count,
        language,
        request_id: request.request_id().to_string(),
        generated_at: now_rfc3339(),
        stats: BddStats {
            prompt_length: char_len(&prompt),
            bdd_length: char_len(&feature),
            estimated_lines: estimated_lines(&feature),
            scenario_count,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::StubClient;
    use crate::storage::{FsBlobStore, FsStoreConfig, ObjectMetadata};
    use tempfile::TempDir;

    const FEATURE: &str = "\
Feature: Soma
  Scenario: soma de positivos
    Given os números 1 e 2
    When somo
    Then obtenho 3

  Scenario: soma com zero
    Given os números 0 e 2
    When somo
    Then obtenho 2

  Scenario: soma de negativos
    Given os números -1 e -2
    When somo
    Then obtenho -3";

    fn store(dir: &TempDir) -> FsBlobStore {
        FsBlobStore::new(FsStoreConfig {
            root: dir.path().to_path_buf(),
            public_url: "http://localhost:8080/artifacts".to_string(),
            signing_key: "secret".to_string(),
        })
        .unwrap()
    }

    fn request(code: Option<&str>, language: &str) -> BddRequest {
        BddRequest {
            request_id: Some("req-9".to_string()),
            code: code.map(str::to_string),
            generated_code: None,
            presigned_url: None,
            language: Some(language.to_string()),
        }
    }

    #[test]
    fn test_count_scenarios() {
        assert_eq!(count_scenarios(FEATURE), 3);
        assert_eq!(count_scenarios("Feature: vazio"), 0);
        assert_eq!(count_scenarios("Scenario Outline: x\nScenario:y"), 1);
    }

    #[tokio::test]
    async fn test_generates_and_counts_scenarios() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let client = StubClient::replying(FEATURE);

        let response = execute_bdd(
            &client,
            &store,
            &request(Some("def soma(a, b):\n    return a + b"), "python"),
            &BddConfig::default(),
        )
        .await;

        assert_eq!(response.status_code, 200);
        let body = response.success().unwrap();
        assert_eq!(body.scenario_count, 3);
        assert_eq!(body.stats.scenario_count, 3);
        assert_eq!(body.bdd_length, FEATURE.chars().count());
        assert_eq!(body.stats.estimated_lines, 15);
        assert!(body.presigned_url.contains("bdd-tests/req-9_tests.feature"));
        assert_eq!(store.fetch_signed(&body.presigned_url).unwrap(), FEATURE);

        let metadata = store.metadata("bdd-tests/req-9_tests.feature").unwrap();
        assert_eq!(metadata.get("file-type"), Some("gherkin-feature"));

        let params = client.params();
        assert_eq!(params[0].max_tokens, 6000);
        assert_eq!(params[0].temperature, 0.2);
    }

    #[tokio::test]
    async fn test_missing_code() {
        let dir = TempDir::new().unwrap();
        let client = StubClient::replying(FEATURE);
        let response =
            execute_bdd(&client, &store(&dir), &request(None, "python"), &BddConfig::default())
                .await;

        assert_eq!(response.status_code, 400);
        assert_eq!(response.error_body().unwrap().error, "Missing code");
    }

    #[tokio::test]
    async fn test_unsupported_language() {
        let dir = TempDir::new().unwrap();
        let client = StubClient::replying(FEATURE);
        let response = execute_bdd(
            &client,
            &store(&dir),
            &request(Some("fn main() {}"), "rust"),
            &BddConfig::default(),
        )
        .await;

        assert_eq!(response.status_code, 400);
        assert_eq!(response.error_body().unwrap().error, "Unsupported language");
        assert!(client.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_generated_code_alias() {
        let dir = TempDir::new().unwrap();
        let client = StubClient::replying(FEATURE);
        let mut req = request(None, "java");
        req.generated_code = Some("public class Calc {}".to_string());

        let response = execute_bdd(&client, &store(&dir), &req, &BddConfig::default()).await;

        assert_eq!(response.status_code, 200);
        assert!(client.prompts()[0].contains("```java\npublic class Calc {}\n```"));
    }

    #[tokio::test]
    async fn test_code_from_signed_link() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store
            .put(
                "generated-code/req-9.py",
                "def dobro(x):\n    return 2 * x",
                &ObjectMetadata::new("text/plain"),
            )
            .unwrap();
        let link = store
            .presign_get("generated-code/req-9.py", Duration::from_secs(60))
            .unwrap();

        let client = StubClient::replying(FEATURE);
        let mut req = request(None, "python");
        req.presigned_url = Some(link.url);

        let response = execute_bdd(&client, &store, &req, &BddConfig::default()).await;

        assert_eq!(response.status_code, 200);
        assert!(client.prompts()[0].contains("def dobro(x):"));
    }

    #[tokio::test]
    async fn test_forged_link_is_internal_error() {
        let dir = TempDir::new().unwrap();
        let client = StubClient::replying(FEATURE);
        let mut req = request(None, "python");
        req.presigned_url = Some(
            "http://localhost:8080/artifacts/generated-code/req-9.py?expires=99999999999&signature=00"
                .to_string(),
        );

        let response = execute_bdd(&client, &store(&dir), &req, &BddConfig::default()).await;

        assert_eq!(response.status_code, 500);
        assert!(response.error_body().unwrap().message.contains("signature"));
        assert!(client.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_payloads_are_rejected() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let client = StubClient::replying(FEATURE);

        let wrong_type = execute_bdd_json(
            &client,
            &store,
            r#"{"requestId": "req-5", "code": {"source": "x"}, "language": "python"}"#,
            &BddConfig::default(),
        )
        .await;
        assert_eq!(wrong_type.status_code, 400);
        let body = wrong_type.error_body().unwrap();
        assert_eq!(body.error, "Invalid request");
        assert_eq!(body.request_id, "req-5");

        let truncated =
            execute_bdd_json(&client, &store, r#"{"code": "print(1)""#, &BddConfig::default())
                .await;
        assert_eq!(truncated.status_code, 400);
        assert_eq!(truncated.error_body().unwrap().request_id, "unknown");
        assert!(client.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_llm_failure_is_fatal() {
        let dir = TempDir::new().unwrap();
        let client = StubClient::failing();
        let response = execute_bdd(
            &client,
            &store(&dir),
            &request(Some("print('x')"), "python"),
            &BddConfig::default(),
        )
        .await;

        assert_eq!(response.status_code, 500);
        assert!(response.error_body().unwrap().trace.is_some());
    }
}
