use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::types::{ExtractionRequest, LlmClient};
use super::StructuringError;
use crate::config::AppConfig;

/// Base delay before the first transient-failure retry.
const BACKOFF_BASE_MS: u64 = 750;
/// Backoff ceiling.
const BACKOFF_CAP_MS: u64 = 5_000;

/// Blocking client for an OpenAI-style /chat/completions endpoint.
///
/// Sampling is pinned to temperature 0 so the same report text yields the
/// same rows, and output length is bounded by `max_output_tokens`. Every
/// call carries a wall-clock timeout. Transient failures (connect,
/// timeout, 429, 5xx) are retried with exponential backoff up to
/// `max_attempts`; permanent failures surface immediately. No caching:
/// identical inputs re-invoke the model.
pub struct ChatCompletionsClient {
    base_url: String,
    api_key: String,
    model: String,
    max_output_tokens: u32,
    timeout_secs: u64,
    max_attempts: usize,
    client: reqwest::blocking::Client,
}

impl ChatCompletionsClient {
    pub fn new(
        base_url: &str,
        api_key: &str,
        model: &str,
        max_output_tokens: u32,
        timeout_secs: u64,
        max_attempts: usize,
    ) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            max_output_tokens,
            timeout_secs,
            max_attempts: max_attempts.max(1),
            client,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            &config.api_base_url,
            &config.api_key,
            &config.model,
            config.max_output_tokens,
            config.request_timeout_secs,
            config.max_attempts,
        )
    }

    fn send_once(&self, request: &ExtractionRequest) -> Result<String, StructuringError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatRequest {
            model: &self.model,
            temperature: 0.0,
            max_tokens: self.max_output_tokens,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    StructuringError::Connection(self.base_url.clone())
                } else if e.is_timeout() {
                    StructuringError::Timeout(self.timeout_secs)
                } else {
                    StructuringError::Http(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(StructuringError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .map_err(|e| StructuringError::ResponseParsing(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| StructuringError::ResponseParsing("response carried no choices".into()))
    }
}

impl LlmClient for ChatCompletionsClient {
    fn complete(&self, request: &ExtractionRequest) -> Result<String, StructuringError> {
        let mut delay_ms = BACKOFF_BASE_MS;
        let mut attempt = 0usize;
        loop {
            attempt += 1;
            match self.send_once(request) {
                Ok(text) => return Ok(text),
                Err(e) if e.is_transient() && attempt < self.max_attempts => {
                    tracing::warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "transient extraction API failure, backing off"
                    );
                    std::thread::sleep(Duration::from_millis(delay_ms));
                    delay_ms = (delay_ms * 2).min(BACKOFF_CAP_MS);
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Request body for /chat/completions
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    max_tokens: u32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// Response body from /chat/completions
#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

/// Mock LLM client for tests: pops scripted outcomes in order, then
/// repeats the fallback response.
pub struct MockLlmClient {
    script: Mutex<VecDeque<Result<String, StructuringError>>>,
    fallback: String,
}

impl MockLlmClient {
    pub fn new(response: &str) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: response.to_string(),
        }
    }

    pub fn with_script(outcomes: Vec<Result<String, StructuringError>>) -> Self {
        Self {
            script: Mutex::new(outcomes.into()),
            fallback: String::new(),
        }
    }
}

impl LlmClient for MockLlmClient {
    fn complete(&self, _request: &ExtractionRequest) -> Result<String, StructuringError> {
        let scripted = self.script.lock().expect("mock script lock").pop_front();
        match scripted {
            Some(outcome) => outcome,
            None => Ok(self.fallback.clone()),
        }
    }
}
