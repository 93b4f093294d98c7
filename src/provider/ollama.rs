use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::Provider;
use crate::wire::{CompletionRequest, Instruction};

pub struct Ollama {
    pub model: String,
    pub url: String,
    client: Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Msg>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    num_predict: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct Msg {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: MsgOut,
}

#[derive(Deserialize)]
struct MsgOut {
    #[serde(default)]
    content: String,
}

fn to_messages(ins: &Instruction) -> Vec<Msg> {
    let mut out = Vec::with_capacity(2);
    if let Some(sys) = &ins.system {
        out.push(Msg { role: "system".into(), content: sys.clone() });
    }
    out.push(Msg { role: "user".into(), content: ins.user.clone() });
    out
}

impl Ollama {
    pub fn new(model: String, url: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("ollama client build failed")?;
        Ok(Self { model, url, client })
    }
}

#[async_trait]
impl Provider for Ollama {
    async fn complete(&self, req: &CompletionRequest) -> Result<String> {
        let url = format!("{}/api/chat", self.url.trim_end_matches('/'));
        let body = ChatRequest {
            model: &self.model,
            messages: to_messages(&req.instruction),
            stream: false,
            options: OllamaOptions {
                num_predict: req.max_tokens,
                temperature: req.temperature,
            },
        };
        tracing::debug!(%url, "ollama request");

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .context("ollama request failed")?;

        let status = resp.status();
        let text = resp.text().await.context("ollama read body failed")?;
        tracing::debug!(%status, body = %text, "ollama raw response");

        if !status.is_success() {
            return Err(anyhow!("ollama error ({}): {}", status, text));
        }

        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("ollama response parse error: {}", e))?;
        Ok(parsed.message.content)
    }

    fn name(&self) -> &'static str {
        "ollama"
    }
}
