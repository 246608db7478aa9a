use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use storyforge::{
    execute_bdd_json, execute_codegen_json, execute_normalizer_json, format_summary, read_text,
    run_pipeline, with_request_id, write_json, AnthropicClient, BddConfig, CodeGenConfig,
    FsBlobStore, FsStoreConfig, Language, LlmConfig, NormalizeRequest, NormalizerConfig,
    PipelineConfig, StageResponse,
};

#[derive(Parser)]
#[command(name = "storyforge")]
#[command(author, version, about = "User story to code and BDD tests pipeline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean, validate and standardize a user story
    Normalize {
        /// Request JSON file (`-` for stdin)
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Output file for the response envelope (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Override the request id
        #[arg(long)]
        request_id: Option<String>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Generate source code from a generation context
    GenerateCode {
        /// Target language of this generator (python or java)
        #[arg(short, long)]
        target: Language,

        /// Request JSON file (`-` for stdin)
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Output file for the response envelope (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Override the request id
        #[arg(long)]
        request_id: Option<String>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Generate a Gherkin feature for generated code
    GenerateBdd {
        /// Request JSON file (`-` for stdin)
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Output file for the response envelope (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Override the request id
        #[arg(long)]
        request_id: Option<String>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Run story normalization, code generation and BDD generation in sequence
    Pipeline {
        /// User story text
        #[arg(short, long, conflicts_with = "story_file")]
        story: Option<String>,

        /// File holding the user story (`-` for stdin)
        #[arg(long)]
        story_file: Option<PathBuf>,

        /// Target language (python or java)
        #[arg(short, long, default_value = "python")]
        language: String,

        /// Request id shared by every stage (random when absent)
        #[arg(long)]
        request_id: Option<String>,

        /// Output file for all stage responses (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Normalize {
            input,
            output,
            request_id,
            verbose,
        } => {
            setup_logging(verbose);
            let raw = load_request(&input, request_id.as_deref())?;

            let client = llm_client()?;
            let response =
                execute_normalizer_json(&client, &raw, &NormalizerConfig::default()).await;
            emit(&response, output.as_deref())
        }
        Commands::GenerateCode {
            target,
            input,
            output,
            request_id,
            verbose,
        } => {
            setup_logging(verbose);
            let raw = load_request(&input, request_id.as_deref())?;

            let client = llm_client()?;
            let store = blob_store()?;
            let config = CodeGenConfig::for_target(target);
            let response = execute_codegen_json(&client, &store, &raw, &config).await;
            emit(&response, output.as_deref())
        }
        Commands::GenerateBdd {
            input,
            output,
            request_id,
            verbose,
        } => {
            setup_logging(verbose);
            let raw = load_request(&input, request_id.as_deref())?;

            let client = llm_client()?;
            let store = blob_store()?;
            let response = execute_bdd_json(&client, &store, &raw, &BddConfig::default()).await;
            emit(&response, output.as_deref())
        }
        Commands::Pipeline {
            story,
            story_file,
            language,
            request_id,
            output,
            verbose,
        } => {
            setup_logging(verbose);
            let story = match (story, story_file) {
                (Some(story), _) => story,
                (None, Some(path)) => read_text(&path)?,
                (None, None) => bail!("Provide a story with --story or --story-file"),
            };
            let request = NormalizeRequest {
                request_id,
                user_story: Some(story),
                file_content: None,
                language: Some(language),
            };

            let client = llm_client()?;
            let store = blob_store()?;
            let outcome =
                run_pipeline(&client, &store, &request, &PipelineConfig::default()).await;

            write_json(&outcome, output.as_deref())?;
            eprintln!("{}", format_summary(&outcome));
            if let Some(stage) = outcome.failed_stage() {
                bail!("Pipeline stopped at {}", stage);
            }
            Ok(())
        }
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

/// Raw request payload, decoded later by the stage itself
fn load_request(input: &Path, request_id: Option<&str>) -> Result<String> {
    info!("Loading request from {:?}", input);
    let raw = read_text(input).context("Failed to load request")?;
    Ok(with_request_id(raw, request_id))
}

fn llm_client() -> Result<AnthropicClient> {
    let config = LlmConfig::from_env()?;
    Ok(AnthropicClient::new(config))
}

fn blob_store() -> Result<FsBlobStore> {
    let store = FsBlobStore::new(FsStoreConfig::from_env()?)?;
    info!("Storing artifacts under {:?}", store.root());
    Ok(store)
}

/// Write the response envelope and fail the process on a non-200 status
fn emit<T: Serialize>(response: &StageResponse<T>, output: Option<&Path>) -> Result<()> {
    write_json(response, output)?;
    if let Some(path) = output {
        info!("Response written to {:?}", path);
    }
    if !response.is_success() {
        bail!("Stage returned status {}", response.status_code);
    }
    Ok(())
}
