use once_cell::sync::Lazy;
use regex::Regex;

/// ASCII and C1 control characters, keeping tab, newline and carriage return
static CONTROL_CHARS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x7F-\x9F]").expect("Valid regex pattern")
});

static LINE_ENDINGS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\r\n|\r").expect("Valid regex pattern"));

static HORIZONTAL_SPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t]+").expect("Valid regex pattern"));

/// Three or more newlines, with any whitespace between them
static BLANK_LINE_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*\n\s*\n").expect("Valid regex pattern"));

/// Clean raw story text before it is shown to the LLM
///
/// Steps, in order:
/// 1. Strip control characters
/// 2. Unify line endings to `\n`
/// 3. Collapse runs of spaces/tabs to one space
/// 4. Collapse three or more newlines to exactly two
/// 5. Trim leading/trailing whitespace
///
/// Total and idempotent; the output is never longer than the input.
pub fn clean_text(text: &str) -> String {
    let cleaned = CONTROL_CHARS.replace_all(text, "");
    let cleaned = LINE_ENDINGS.replace_all(&cleaned, "\n");
    let cleaned = HORIZONTAL_SPACE.replace_all(&cleaned, " ");
    let cleaned = BLANK_LINE_RUNS.replace_all(&cleaned, "\n\n");
    cleaned.trim().to_string()
}
