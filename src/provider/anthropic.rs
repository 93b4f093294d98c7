use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::Provider;
use crate::wire::CompletionRequest;

pub struct Anthropic {
    pub model: String,
    pub api_key: String,
    pub api_base: String,
    pub api_version: String,
    client: Client,
}

#[derive(Serialize)]
struct MsgRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Msg<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MsgResponse {
    content: Vec<Block>,
}

#[derive(Deserialize)]
struct Block {
    #[serde(default)]
    text: String,
    #[serde(default)]
    r#type: String,
}

impl Anthropic {
    pub fn new(
        model: String,
        api_key: String,
        timeout: Duration,
        api_base: String,
        api_version: String,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("anthropic client build failed")?;
        Ok(Self { model, api_key, api_base, api_version, client })
    }

    fn body<'a>(&'a self, req: &'a CompletionRequest) -> MsgRequest<'a> {
        MsgRequest {
            model: &self.model,
            max_tokens: req.max_tokens,
            messages: vec![Msg { role: "user", content: &req.instruction.user }],
            system: req.instruction.system.as_deref(),
            temperature: req.temperature,
        }
    }
}

/// Concatenate every text block, in order.
fn collect_text(resp: MsgResponse) -> String {
    resp.content
        .into_iter()
        .filter(|b| b.r#type == "text")
        .map(|b| b.text)
        .collect()
}

#[async_trait]
impl Provider for Anthropic {
    async fn complete(&self, req: &CompletionRequest) -> Result<String> {
        let url = format!("{}/v1/messages", self.api_base.trim_end_matches('/'));
        tracing::debug!(%url, max_tokens = req.max_tokens, temperature = ?req.temperature, "anthropic request");

        let resp = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.api_version)
            .json(&self.body(req))
            .send()
            .await
            .context("anthropic request failed")?;

        let status = resp.status();
        let text = resp.text().await.context("anthropic read body failed")?;
        tracing::debug!(%status, body = %text, "anthropic raw response");

        if !status.is_success() {
            return Err(anyhow!("anthropic API error ({}): {}", status, text));
        }

        let parsed: MsgResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("anthropic response parse error: {}", e))?;

        Ok(collect_text(parsed))
    }

    fn name(&self) -> &'static str {
        "anthropic"
    }
}
