//! LLM backend trait and concrete implementations.
//!
//! Backends:
//!   OpenAiBackend  OpenAI chat completions with JSON-schema structured output
//!   OllamaBackend  local Ollama `/api/chat` with a `format` schema
//!
//! Configuration picks exactly one backend at startup; callers only ever see
//! `Arc<dyn LlmBackend>`.

use async_trait::async_trait;
use scholarwatch_common::sandbox::SandboxClient;
use scholarwatch_common::WatchError;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_MAX_TOKENS: u32 = 4096;
const DEFAULT_TEMPERATURE: f32 = 0.1;

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Request blocked: {0}")]
    Blocked(#[from] WatchError),
    #[error("Rate limit exceeded")]
    RateLimitExceeded,
    #[error("API error [{status}]: {message}")]
    ApiError { status: u16, message: String },
    #[error("Invalid model output: {0}")]
    Validation(String),
}

// ── Request / Response ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,   // "system" | "user" | "assistant"
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }
}

/// Structured-output constraint attached to a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResponseFormat {
    JsonSchema { name: String, schema: serde_json::Value },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmRequest {
    pub messages: Vec<Message>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub response_format: Option<ResponseFormat>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub content: String,
    pub model: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

// ── Trait ─────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait LlmBackend: Send + Sync {
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError>;
    fn model_id(&self) -> &str;
    fn is_local(&self) -> bool;
}

// ── Helpers ───────────────────────────────────────────────────────────────────

async fn check_response_status(resp: reqwest::Response) -> Result<serde_json::Value, LlmError> {
    let status = resp.status().as_u16();
    let text = resp.text().await?;
    if status == 429 {
        return Err(LlmError::RateLimitExceeded);
    }
    if status >= 400 {
        let parsed: Option<serde_json::Value> = serde_json::from_str(&text).ok();
        let message = parsed
            .as_ref()
            .and_then(|b| {
                b["error"]["message"]
                    .as_str()
                    .or_else(|| b["error"].as_str())
                    .or_else(|| b["message"].as_str())
            })
            .map(String::from)
            .unwrap_or_else(|| text.chars().take(300).collect());
        return Err(LlmError::ApiError { status, message });
    }
    Ok(serde_json::from_str(&text)?)
}

fn parse_openai_response(json: &serde_json::Value, fallback_model: &str) -> Result<LlmResponse, LlmError> {
    let message = &json["choices"][0]["message"];
    if let Some(refusal) = message["refusal"].as_str() {
        return Err(LlmError::Validation(format!("model refused: {refusal}")));
    }
    Ok(LlmResponse {
        content: message["content"].as_str().unwrap_or("").to_string(),
        model: json["model"].as_str().unwrap_or(fallback_model).to_string(),
        prompt_tokens:     json["usage"]["prompt_tokens"].as_u64().unwrap_or(0) as u32,
        completion_tokens: json["usage"]["completion_tokens"].as_u64().unwrap_or(0) as u32,
    })
}

fn parse_ollama_response(json: &serde_json::Value, fallback_model: &str) -> LlmResponse {
    LlmResponse {
        content: json["message"]["content"].as_str().unwrap_or("").to_string(),
        model: json["model"].as_str().unwrap_or(fallback_model).to_string(),
        prompt_tokens:     json["prompt_eval_count"].as_u64().unwrap_or(0) as u32,
        completion_tokens: json["eval_count"].as_u64().unwrap_or(0) as u32,
    }
}

/// Chat-completions body with `response_format` in strict JSON-schema mode.
pub fn openai_body(req: &LlmRequest, default_model: &str) -> serde_json::Value {
    let mut body = serde_json::json!({
        "model":       req.model.as_deref().unwrap_or(default_model),
        "messages":    req.messages,
        "max_tokens":  req.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        "temperature": req.temperature.unwrap_or(DEFAULT_TEMPERATURE),
    });
    if let Some(ResponseFormat::JsonSchema { name, schema }) = &req.response_format {
        body["response_format"] = serde_json::json!({
            "type": "json_schema",
            "json_schema": { "name": name, "strict": true, "schema": schema },
        });
    }
    body
}

/// Native Ollama chat body; the schema goes in `format`.
pub fn ollama_body(req: &LlmRequest, default_model: &str) -> serde_json::Value {
    let mut body = serde_json::json!({
        "model":    req.model.as_deref().unwrap_or(default_model),
        "messages": req.messages,
        "stream":   false,
        "options":  {
            "temperature": req.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            "num_predict": req.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        },
    });
    if let Some(ResponseFormat::JsonSchema { schema, .. }) = &req.response_format {
        body["format"] = schema.clone();
    }
    body
}

// ── 1. Ollama (local) ─────────────────────────────────────────────────────────

pub struct OllamaBackend {
    pub base_url: String,
    pub model: String,
    client: SandboxClient,
}

impl OllamaBackend {
    pub fn new(client: SandboxClient, base_url: impl Into<String>, model: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.into(),
            client,
        }
    }
}

#[async_trait]
impl LlmBackend for OllamaBackend {
    #[instrument(skip(self, req), fields(model = %self.model))]
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError> {
        let url = format!("{}/api/chat", self.base_url);
        let body = ollama_body(&req, &self.model);
        let resp = self.client.post(&url)?.json(&body).send().await?;
        let json = check_response_status(resp).await?;
        let out = parse_ollama_response(&json, &self.model);
        debug!(prompt_tokens = out.prompt_tokens, completion_tokens = out.completion_tokens, "Ollama completion");
        Ok(out)
    }

    fn model_id(&self) -> &str { &self.model }
    fn is_local(&self) -> bool { true }
}

// ── 2. OpenAI ─────────────────────────────────────────────────────────────────

pub struct OpenAiBackend {
    pub model: String,
    base_url: String,
    api_key: SecretString,
    client: SandboxClient,
}

impl OpenAiBackend {
    pub fn new(client: SandboxClient, api_key: SecretString, model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            base_url: OPENAI_API_BASE.to_string(),
            api_key,
            client,
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl LlmBackend for OpenAiBackend {
    #[instrument(skip(self, req), fields(model = %self.model))]
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = openai_body(&req, &self.model);
        let resp = self.client
            .post(&url)?
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;
        let json = check_response_status(resp).await?;
        let out = parse_openai_response(&json, &self.model)?;
        debug!(prompt_tokens = out.prompt_tokens, completion_tokens = out.completion_tokens, "OpenAI completion");
        Ok(out)
    }

    fn model_id(&self) -> &str { &self.model }
    fn is_local(&self) -> bool { false }
}
