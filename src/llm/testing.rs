use std::sync::Mutex;

use crate::llm::{CompletionClient, GenerationParams, LlmError};

/// Deterministic completion client for tests
///
/// Returns canned replies in order (the last one repeats) and records every prompt.
pub struct StubClient {
    replies: Vec<Option<String>>,
    calls: Mutex<Vec<(String, GenerationParams)>>,
}

impl StubClient {
    /// Always answer with `reply`
    pub fn replying(reply: &str) -> Self {
        Self::sequence(&[Some(reply)])
    }

    /// Always fail with an API error
    pub fn failing() -> Self {
        Self::sequence(&[None])
    }

    /// Answer with each entry in turn; `None` fails that call
    pub fn sequence(replies: &[Option<&str>]) -> Self {
        Self {
            replies: replies.iter().map(|r| r.map(str::to_string)).collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(prompt, _)| prompt.clone())
            .collect()
    }

    pub fn params(&self) -> Vec<GenerationParams> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, params)| params.clone())
            .collect()
    }
}

impl CompletionClient for StubClient {
    async fn complete(&self, prompt: &str, params: &GenerationParams) -> Result<String, LlmError> {
        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((prompt.to_string(), params.clone()));
            calls.len() - 1
        };

        let reply = self
            .replies
            .get(index)
            .or(self.replies.last())
            .cloned()
            .flatten();

        match reply {
            Some(text) => Ok(text.trim().to_string()),
            None => Err(LlmError::Api {
                status: 503,
                body: "stub service unavailable".to_string(),
            }),
        }
    }
}
