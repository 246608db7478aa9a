use std::time::Duration;

use tracing::{info, info_span, Instrument};

use crate::llm::{build_code_prompt, CompletionClient, GenerationParams};
use crate::models::{
    char_len, estimated_lines, ArtifactKind, CodeRequest, CodeResponse, CodeStats, Language,
    StageResponse,
};
use crate::stages::{decode_request, finish, now_rfc3339, StageError};
use crate::storage::{extract_public_class_name, persist_artifact, BlobStore, DEFAULT_URL_TTL};

/// Configuration for a code generator bound to one target language
#[derive(Debug, Clone)]
pub struct CodeGenConfig {
    pub target: Language,
    pub params: GenerationParams,
    /// Lifetime of the returned fetch link
    pub url_ttl: Duration,
}

impl CodeGenConfig {
    pub fn for_target(target: Language) -> Self {
        Self {
            target,
            params: GenerationParams::code_generation(),
            url_ttl: DEFAULT_URL_TTL,
        }
    }

    pub fn python() -> Self {
        Self::for_target(Language::Python)
    }

    pub fn java() -> Self {
        Self::for_target(Language::Java)
    }
}

/// Execute a code generator
///
/// 1. Require a generation context and the configured target language
/// 2. Build the language-specific prompt
/// 3. Generate the code (failure is fatal)
/// 4. Persist it and return a signed fetch link
pub async fn execute_codegen<C: CompletionClient, S: BlobStore>(
    client: &C,
    store: &S,
    request: &CodeRequest,
    config: &CodeGenConfig,
) -> StageResponse<CodeResponse> {
    let request_id = request.request_id();
    let stage = format!("generate-{}", config.target);
    let span = info_span!("stage", stage = %stage, request_id = %request_id);

    async {
        let result = generate_code(client, store, request, config).await;
        finish(&stage, request_id, result)
    }
    .instrument(span)
    .await
}

/// Execute a code generator on a raw JSON payload
pub async fn execute_codegen_json<C: CompletionClient, S: BlobStore>(
    client: &C,
    store: &S,
    raw: &str,
    config: &CodeGenConfig,
) -> StageResponse<CodeResponse> {
    let stage = format!("generate-{}", config.target);
    match decode_request::<CodeRequest, _>(&stage, raw) {
        Ok(request) => execute_codegen(client, store, &request, config).await,
        Err(response) => response,
    }
}

async fn generate_code<C: CompletionClient, S: BlobStore>(
    client: &C,
    store: &S,
    request: &CodeRequest,
    config: &CodeGenConfig,
) -> Result<CodeResponse, StageError> {
    let context = request
        .context_for_generation
        .as_deref()
        .filter(|c| !c.is_empty())
        .ok_or(StageError::MissingField {
            label: "Missing context",
            field: "contextForGeneration",
        })?;

    let language = request.language.as_deref().unwrap_or("");
    if language != config.target.as_str() {
        return Err(StageError::WrongLanguage {
            expected: config.target,
            actual: language.to_string(),
        });
    }
    info!("Received context: {} characters", char_len(context));

    let prompt = build_code_prompt(context, config.target);
    info!("Prompt built: {} characters", char_len(&prompt));

    let code = client.complete(&prompt, &config.params).await?;
    info!(
        "Generated {} code: {} characters, {} lines",
        config.target,
        char_len(&code),
        estimated_lines(&code)
    );

    let class_name = match config.target {
        Language::Java => Some(extract_public_class_name(&code)),
        Language::Python => None,
    };
    let kind = ArtifactKind::Code {
        language: config.target,
        class_name: class_name.clone(),
    };
    let artifact = persist_artifact(store, &code, request.request_id(), &kind, config.url_ttl)?;

    Ok(CodeResponse {
        presigned_url: artifact.url,
        code_length: char_len(&code),
        class_name,
        language: config.target,
        request_id: request.request_id().to_string(),
        generated_at: now_rfc3339(),
        stats: CodeStats {
            prompt_length: char_len(&prompt),
            code_length: char_len(&code),
            estimated_lines: estimated_lines(&code),
        },
    })
}
