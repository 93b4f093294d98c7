use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::cli::ProviderKind;
use crate::config::Config;
use crate::wire::CompletionRequest;

pub mod anthropic;
pub mod ollama;
pub mod openai;
#[cfg(test)]
pub mod scripted;

/// A hosted text-completion endpoint.
///
/// Implementations return the generated text as-is. Transport failures and
/// non-success statuses are errors; an empty completion is not.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn complete(&self, req: &CompletionRequest) -> Result<String>;

    fn name(&self) -> &'static str;
}

pub type DynProvider = Arc<dyn Provider>;

fn env_key(var: &str) -> Result<String> {
    std::env::var(var).map_err(|_| anyhow!("{var} env var is not set"))
}

pub fn make_provider(cfg: &Config) -> Result<DynProvider> {
    let timeout = Duration::from_secs(cfg.timeout_secs);
    let model = cfg.model_name().to_string();

    match cfg.provider {
        ProviderKind::Anthropic => Ok(Arc::new(anthropic::Anthropic::new(
            model,
            env_key("ANTHROPIC_API_KEY")?,
            timeout,
            cfg.anthropic_url.clone(),
            cfg.anthropic_version.clone(),
        )?)),
        ProviderKind::OpenAI => Ok(Arc::new(openai::OpenAIProvider::new(
            model,
            env_key("OPENAI_API_KEY")?,
            timeout,
            cfg.openai_url.clone(),
        )?)),
        ProviderKind::Ollama => Ok(Arc::new(ollama::Ollama::new(
            model,
            cfg.ollama_url.clone(),
            timeout,
        )?)),
    }
}
