use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::models::StageResponse;
use crate::stages::PipelineOutcome;

/// Write a response envelope as pretty JSON to `path`, or to stdout when absent
pub fn write_json<T: Serialize>(value: &T, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create file: {:?}", path))?;
            serde_json::to_writer_pretty(file, value).context("Failed to write JSON")?;
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            serde_json::to_writer_pretty(&mut stdout, value).context("Failed to write JSON")?;
            writeln!(stdout)?;
        }
    }
    Ok(())
}

/// One-line status for a stage response
fn stage_line<T>(name: &str, response: &StageResponse<T>) -> String {
    match response.error_body() {
        Some(err) => format!("{:<14} {}  {}: {}", name, response.status_code, err.error, err.message),
        None => format!("{:<14} {}", name, response.status_code),
    }
}

/// Human-readable summary of a pipeline run
pub fn format_summary(outcome: &PipelineOutcome) -> String {
    let mut lines = vec![format!("Request {}", outcome.request_id)];
    lines.push(stage_line("normalize", &outcome.normalize));

    if let Some(code) = &outcome.code {
        lines.push(stage_line("generate-code", code));
        if let Some(body) = code.success() {
            lines.push(format!("  code: {}", body.presigned_url));
        }
    }
    if let Some(bdd) = &outcome.bdd {
        lines.push(stage_line("generate-bdd", bdd));
        if let Some(body) = bdd.success() {
            lines.push(format!("  tests: {} ({} scenarios)", body.presigned_url, body.scenario_count));
        }
    }

    match outcome.failed_stage() {
        Some(stage) => lines.push(format!("Stopped at {}", stage)),
        None => lines.push("Completed".to_string()),
    }
    lines.join("\n")
}
