//! Completion provider implementations.
//!
//! | Config Value | Provider | Endpoint |
//! |-------------|----------|----------|
//! | `"gemini"` | [`GeminiProvider`] | `POST …/models/{model}:generateContent` |
//! | `"openai"` | [`OpenAIChatProvider`] | `POST …/v1/chat/completions` |
//!
//! Each provider sends the prompt as a single user message, returns the
//! decoded body, and knows where its primary text lives. Non-2xx statuses
//! and transport failures are errors; a 2xx body with the wrong shape is
//! left to the caller, which reports it as a degraded answer.

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use docs_rag_core::answer::CompletionProvider;

use crate::config::CompletionConfig;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

pub fn create_completer(config: &CompletionConfig) -> Result<Arc<dyn CompletionProvider>> {
    let api_key = std::env::var(&config.api_key_env).map_err(|_| {
        anyhow::anyhow!("{} environment variable not set", config.api_key_env)
    })?;

    match config.provider.as_str() {
        "gemini" => Ok(Arc::new(GeminiProvider::new(config, api_key)?)),
        "openai" => Ok(Arc::new(OpenAIChatProvider::new(config, api_key)?)),
        other => bail!("Unknown completion provider: {}", other),
    }
}

async fn post_json(request: reqwest::RequestBuilder, label: &str) -> Result<Value> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        let body_text = response.text().await.unwrap_or_default();
        bail!("{} API error {}: {}", label, status, body_text);
    }
    Ok(response.json().await?)
}

fn http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()?)
}

/// Google Gemini `generateContent`.
pub struct GeminiProvider {
    model: String,
    endpoint: String,
    api_key: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(config: &CompletionConfig, api_key: String) -> Result<Self> {
        let endpoint = config.url.clone().unwrap_or_else(|| {
            format!("{}/{}:generateContent", GEMINI_BASE_URL, config.model)
        });
        Ok(Self {
            model: config.model.clone(),
            endpoint,
            api_key,
            client: http_client(config.timeout_secs)?,
        })
    }
}

#[async_trait]
impl CompletionProvider for GeminiProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<Value> {
        let payload = json!({
            "contents": [
                {
                    "role": "user",
                    "parts": [{ "text": prompt }]
                }
            ]
        });

        let request = self
            .client
            .post(&self.endpoint)
            .header("X-goog-api-key", &self.api_key)
            .json(&payload);
        post_json(request, "Gemini").await
    }

    /// `candidates[0].content.parts[0].text`
    fn extract_text(&self, response: &Value) -> Option<String> {
        response
            .get("candidates")?
            .get(0)?
            .get("content")?
            .get("parts")?
            .get(0)?
            .get("text")?
            .as_str()
            .map(str::to_string)
    }
}

/// OpenAI-compatible chat completions.
pub struct OpenAIChatProvider {
    model: String,
    endpoint: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAIChatProvider {
    pub fn new(config: &CompletionConfig, api_key: String) -> Result<Self> {
        Ok(Self {
            model: config.model.clone(),
            endpoint: config
                .url
                .clone()
                .unwrap_or_else(|| OPENAI_CHAT_URL.to_string()),
            api_key,
            client: http_client(config.timeout_secs)?,
        })
    }
}

#[async_trait]
impl CompletionProvider for OpenAIChatProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<Value> {
        let payload = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }]
        });

        let request = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&payload);
        post_json(request, "OpenAI").await
    }

    fn extract_text(&self, response: &Value) -> Option<String> {
        response
            .get("choices")?
            .get(0)?
            .get("message")?
            .get("content")?
            .as_str()
            .map(str::to_string)
    }
}
