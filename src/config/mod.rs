use anyhow::{bail, Context, Result};
use fs_err as fs;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::cli::{Args, ProviderKind};
use crate::orchestrator::Budgets;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: ProviderKind,
    /// Falls back to a per-provider default when unset.
    pub model: Option<String>,
    pub timeout_secs: u64,
    pub idea_max_tokens: u32,
    pub idea_temperature: f32,
    pub prompt_max_tokens: u32,
    pub anthropic_url: String,
    pub anthropic_version: String,
    pub openai_url: String,
    pub ollama_url: String,
    pub bind: String,
    pub save_artifacts: bool,
    pub artifacts_root: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Anthropic,
            model: None,
            timeout_secs: 120,
            idea_max_tokens: 2000,
            idea_temperature: 1.0,
            prompt_max_tokens: 4000,
            anthropic_url: "https://api.anthropic.com".into(),
            anthropic_version: "2023-06-01".into(),
            openai_url: "https://api.openai.com".into(),
            ollama_url: "http://localhost:11434".into(),
            bind: "127.0.0.1:3000".into(),
            save_artifacts: false,
            artifacts_root: ".".into(),
        }
    }
}

impl Config {
    /// Defaults, overlaid by a TOML or YAML file when one is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("toml") => toml::from_str(&text)
                .with_context(|| format!("invalid TOML config {}", path.display())),
            Some("yaml") | Some("yml") => serde_yaml::from_str(&text)
                .with_context(|| format!("invalid YAML config {}", path.display())),
            _ => bail!("unsupported config format: {} (expected .toml, .yaml or .yml)", path.display()),
        }
    }

    /// CLI flags win over file values.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(p) = &args.provider {
            self.provider = p.clone();
        }
        if let Some(m) = &args.model {
            self.model = Some(m.clone());
        }
        if let Some(t) = args.timeout_secs {
            self.timeout_secs = t;
        }
        if args.save_artifacts {
            self.save_artifacts = true;
        }
        if let Some(root) = &args.artifacts_root {
            self.artifacts_root = root.clone();
        }
    }

    pub fn model_name(&self) -> &str {
        match &self.model {
            Some(m) => m,
            None => match self.provider {
                ProviderKind::Anthropic => "claude-sonnet-4-20250514",
                ProviderKind::OpenAI => "gpt-4.1-mini",
                ProviderKind::Ollama => "llama3.1",
            },
        }
    }

    pub fn budgets(&self) -> Budgets {
        Budgets {
            idea_max_tokens: self.idea_max_tokens,
            idea_temperature: self.idea_temperature,
            prompt_max_tokens: self.prompt_max_tokens,
        }
    }
}
