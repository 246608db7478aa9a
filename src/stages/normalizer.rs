use tracing::{info, info_span, warn, Instrument};

use crate::llm::{build_normalize_prompt, CompletionClient, GenerationParams};
use crate::models::{
    char_len, Language, NormalizeRequest, NormalizeResponse, NormalizeStats, StageResponse,
};
use crate::stages::{decode_request, finish, now_rfc3339, StageError};
use crate::text::{clean_text, validate_input};

/// First line of every generation context
pub const CONTEXT_HEADER: &str = "=== HISTÓRIA DE USUÁRIO PADRONIZADA ===";

/// Configuration for the story normalizer
#[derive(Debug, Clone)]
pub struct NormalizerConfig {
    pub params: GenerationParams,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            params: GenerationParams::normalizer(),
        }
    }
}

/// Outcome of asking the LLM to restructure a story
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Standardization {
    /// The LLM's restructured story
    Restructured(String),
    /// The LLM could not be used; the cleaned input is passed through unchanged
    Fallback { text: String, reason: String },
}

impl Standardization {
    pub fn text(&self) -> &str {
        match self {
            Standardization::Restructured(text) => text,
            Standardization::Fallback { text, .. } => text,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Standardization::Fallback { .. })
    }
}

/// Ask the LLM to restructure `cleaned` without inventing content
///
/// Never fails: any invocation error, or an empty completion, yields
/// [`Standardization::Fallback`] carrying `cleaned` as-is.
pub async fn standardize_story<C: CompletionClient>(
    client: &C,
    cleaned: &str,
    params: &GenerationParams,
) -> Standardization {
    let prompt = build_normalize_prompt(cleaned);

    match client.complete(&prompt, params).await {
        Ok(text) if !text.is_empty() => {
            info!(
                "Story standardized: {} -> {} characters",
                char_len(cleaned),
                char_len(&text)
            );
            Standardization::Restructured(text)
        }
        Ok(_) => {
            warn!("LLM returned an empty story, using cleaned text");
            Standardization::Fallback {
                text: cleaned.to_string(),
                reason: "empty completion".to_string(),
            }
        }
        Err(e) => {
            warn!("LLM standardization failed, using cleaned text: {}", e);
            Standardization::Fallback {
                text: cleaned.to_string(),
                reason: e.to_string(),
            }
        }
    }
}

/// Header, target language tag, blank line, then the story verbatim
pub fn build_generation_context(story: &str, language: Language) -> String {
    [
        CONTEXT_HEADER.to_string(),
        format!("Linguagem de destino: {}", language.upper()),
        String::new(),
        story.to_string(),
    ]
    .join("\n")
}

/// Execute the story normalizer
///
/// 1. Pick the input text (file content over typed story)
/// 2. Validate text and language
/// 3. Clean the text
/// 4. Restructure it with the LLM, falling back to the cleaned text
/// 5. Build the generation context for the code generator
pub async fn execute_normalizer<C: CompletionClient>(
    client: &C,
    request: &NormalizeRequest,
    config: &NormalizerConfig,
) -> StageResponse<NormalizeResponse> {
    let request_id = request.request_id();
    let span = info_span!("stage", stage = "normalize", request_id = %request_id);

    async {
        let result = normalize_story(client, request, config).await;
        finish("normalize", request_id, result)
    }
    .instrument(span)
    .await
}

/// Execute the story normalizer on a raw JSON payload
///
/// A payload that does not decode is answered with a 400 `Invalid request` envelope.
pub async fn execute_normalizer_json<C: CompletionClient>(
    client: &C,
    raw: &str,
    config: &NormalizerConfig,
) -> StageResponse<NormalizeResponse> {
    match decode_request::<NormalizeRequest, _>("normalize", raw) {
        Ok(request) => execute_normalizer(client, &request, config).await,
        Err(response) => response,
    }
}

async fn normalize_story<C: CompletionClient>(
    client: &C,
    request: &NormalizeRequest,
    config: &NormalizerConfig,
) -> Result<NormalizeResponse, StageError> {
    let input_text = request.input_text();
    let language_tag = request.language_tag();
    info!(
        "Received {} characters from {} (language {:?})",
        char_len(input_text),
        if request.uses_file_content() { "file" } else { "text" },
        language_tag
    );

    let language = validate_input(input_text, &language_tag)?;

    let cleaned = clean_text(input_text);
    info!(
        "Cleaned text: {} -> {} characters",
        char_len(input_text),
        char_len(&cleaned)
    );

    let standardization = standardize_story(client, &cleaned, &config.params).await;
    let structured_story = standardization.text().to_string();

    let context_for_generation = build_generation_context(&structured_story, language);
    info!("Generation context: {} characters", char_len(&context_for_generation));

    Ok(NormalizeResponse {
        stats: NormalizeStats {
            original_length: char_len(input_text),
            cleaned_length: char_len(&cleaned),
            standardized_length: char_len(&structured_story),
            word_count: structured_story.split_whitespace().count(),
        },
        original_story: cleaned,
        structured_story,
        context_for_generation,
        language,
        request_id: request.request_id().to_string(),
        processed_at: now_rfc3339(),
    })
}
