use serde::Serialize;
use tracing::{info, warn};

use crate::llm::CompletionClient;
use crate::models::{
    BddRequest, BddResponse, CodeRequest, CodeResponse, Language, NormalizeRequest,
    NormalizeResponse, StageResponse,
};
use crate::stages::{
    execute_bdd, execute_codegen, execute_normalizer, BddConfig, CodeGenConfig, NormalizerConfig,
};
use crate::storage::BlobStore;

/// Configuration for a full story -> code -> tests run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub normalizer: NormalizerConfig,
    pub python: CodeGenConfig,
    pub java: CodeGenConfig,
    pub bdd: BddConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            normalizer: NormalizerConfig::default(),
            python: CodeGenConfig::python(),
            java: CodeGenConfig::java(),
            bdd: BddConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Code generator bound to `language`
    pub fn codegen_for(&self, language: Language) -> &CodeGenConfig {
        match language {
            Language::Python => &self.python,
            Language::Java => &self.java,
        }
    }
}

/// Responses of every stage that ran; later stages are absent after a failure
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineOutcome {
    pub request_id: String,
    pub normalize: StageResponse<NormalizeResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<StageResponse<CodeResponse>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bdd: Option<StageResponse<BddResponse>>,
}

impl PipelineOutcome {
    /// Name of the stage that stopped the run, if any
    pub fn failed_stage(&self) -> Option<&'static str> {
        if !self.normalize.is_success() {
            return Some("normalize");
        }
        match (&self.code, &self.bdd) {
            (Some(code), _) if !code.is_success() => Some("generate-code"),
            (Some(_), Some(bdd)) if !bdd.is_success() => Some("generate-bdd"),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failed_stage().is_none()
            && self.bdd.as_ref().is_some_and(StageResponse::is_success)
    }
}

/// Run normalizer, code generator and BDD generator in sequence
///
/// Each stage's output becomes the next stage's input; the run stops at the first
/// non-200 response. A request without an id is given a fresh UUID so all artifacts
/// of the run share one key prefix.
pub async fn run_pipeline<C: CompletionClient, S: BlobStore>(
    client: &C,
    store: &S,
    request: &NormalizeRequest,
    config: &PipelineConfig,
) -> PipelineOutcome {
    let mut request = request.clone();
    let request_id = request
        .request_id
        .get_or_insert_with(|| uuid::Uuid::new_v4().to_string())
        .clone();
    info!("Pipeline started for request {}", request_id);

    let normalize = execute_normalizer(client, &request, &config.normalizer).await;
    let Some(normalized) = normalize.success().cloned() else {
        warn!("Pipeline stopped after normalize ({})", normalize.status_code);
        return PipelineOutcome {
            request_id,
            normalize,
            code: None,
            bdd: None,
        };
    };

    let codegen_config = config.codegen_for(normalized.language);
    let code_request = CodeRequest {
        request_id: Some(request_id.clone()),
        context_for_generation: Some(normalized.context_for_generation),
        language: Some(normalized.language.as_str().to_string()),
    };
    let code = execute_codegen(client, store, &code_request, codegen_config).await;
    let Some(generated) = code.success().cloned() else {
        warn!("Pipeline stopped after generate-code ({})", code.status_code);
        return PipelineOutcome {
            request_id,
            normalize,
            code: Some(code),
            bdd: None,
        };
    };

    let bdd_request = BddRequest {
        request_id: Some(request_id.clone()),
        code: None,
        generated_code: None,
        presigned_url: Some(generated.presigned_url),
        language: Some(generated.language.as_str().to_string()),
    };
    let bdd = execute_bdd(client, store, &bdd_request, &config.bdd).await;
    if bdd.is_success() {
        info!("Pipeline completed for request {}", request_id);
    } else {
        warn!("Pipeline stopped after generate-bdd ({})", bdd.status_code);
    }

    PipelineOutcome {
        request_id,
        normalize,
        code: Some(code),
        bdd: Some(bdd),
    }
}
