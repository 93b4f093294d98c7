use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use crate::wire::CompletionRequest;

/// OpenAI chat-completions provider. The instruction's system part, when
/// present, becomes a system message ahead of the single user message.
pub struct OpenAIProvider {
    model: String,
    api_key: String,
    api_base: String,
    client: Client,
}

impl OpenAIProvider {
    pub fn new(model: String, api_key: String, timeout: Duration, api_base: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("openai client build failed")?;
        Ok(Self { model, api_key, api_base, client })
    }

    fn body(&self, req: &CompletionRequest) -> Value {
        let mut messages = Vec::new();
        if let Some(system) = &req.instruction.system {
            messages.push(json!({ "role": "system", "content": system }));
        }
        messages.push(json!({ "role": "user", "content": req.instruction.user }));

        let mut body = json!({
            "model": self.model,
            "messages": messages,
            "max_tokens": req.max_tokens,
        });
        if let Some(t) = req.temperature {
            body["temperature"] = json!(t);
        }
        body
    }
}

// Minimal structs to parse the chat response
#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}
#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}
#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[async_trait]
impl super::Provider for OpenAIProvider {
    async fn complete(&self, req: &CompletionRequest) -> Result<String> {
        let url = format!("{}/v1/chat/completions", self.api_base.trim_end_matches('/'));
        let body = self.body(req);
        tracing::debug!(%url, body = %body, "openai request");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("openai request failed")?;

        let status = resp.status();
        let text = resp.text().await.context("openai read body failed")?;
        tracing::debug!(%status, body = %text, "openai raw response");

        if !status.is_success() {
            return Err(anyhow!("OpenAI API error ({}): {}", status, text));
        }

        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse OpenAI response: {e}"))?;

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}
