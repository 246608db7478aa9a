pub mod io;
pub mod llm;
pub mod models;
pub mod stages;
pub mod storage;
pub mod text;

pub use io::{format_summary, read_text, with_request_id, write_json};
pub use llm::{AnthropicClient, CompletionClient, GenerationParams, LlmConfig};
pub use models::{
    BddRequest, BddResponse, CodeRequest, CodeResponse, Language, NormalizeRequest,
    NormalizeResponse, StageResponse,
};
pub use stages::{
    execute_bdd, execute_bdd_json, execute_codegen, execute_codegen_json, execute_normalizer,
    execute_normalizer_json, run_pipeline, BddConfig, CodeGenConfig, NormalizerConfig,
    PipelineConfig, PipelineOutcome,
};
pub use storage::{BlobStore, FsBlobStore, FsStoreConfig};
