use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::wire::{ProjectType, PromptCriteria, SkillLevel, TimeCommitment};

#[derive(ValueEnum, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[value(name = "openai", alias = "open-ai")]
    OpenAI,
    Anthropic,
    Ollama,
}

#[derive(Parser, Debug)]
#[command(name = "vibe_ideagen", version, about = "Project idea and AI code-generation prompt generator")]
pub struct Args {
    #[arg(long, value_enum, global = true)]
    pub provider: Option<ProviderKind>,

    #[arg(long, global = true)]
    pub model: Option<String>,

    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    /// TOML or YAML config file
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[arg(long, default_value_t = false, global = true)]
    pub debug: bool,

    /// Write every provider request/response under <artifacts-root>/.vibe/tx
    #[arg(long, default_value_t = false, global = true)]
    pub save_artifacts: bool,

    #[arg(long, global = true)]
    pub artifacts_root: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate project ideas (interactive unless --json)
    Ideas(IdeasArgs),
    /// Generate an AI code-generation prompt
    Prompt(PromptArgs),
    /// Serve both operations over HTTP
    Serve {
        #[arg(long)]
        bind: Option<String>,
    },
}

/// Target stack for a generated prompt.
#[derive(ClapArgs, Debug, Clone)]
pub struct StackArgs {
    #[arg(long, default_value = "python")]
    pub language: String,

    #[arg(long, default_value = "none")]
    pub framework: String,

    #[arg(long, default_value = "intermediate")]
    pub complexity: String,

    #[arg(long, default_value = "mixed")]
    pub code_style: String,
}

#[derive(ClapArgs, Debug)]
pub struct IdeasArgs {
    #[arg(long)]
    pub interests: Option<String>,

    #[arg(long, value_enum, default_value_t = SkillLevel::Intermediate)]
    pub skill_level: SkillLevel,

    #[arg(long, value_enum, default_value_t = ProjectType::SurpriseMe)]
    pub project_type: ProjectType,

    #[arg(long = "time", value_enum, default_value_t = TimeCommitment::OneWeek)]
    pub time_commitment: TimeCommitment,

    /// Print one batch as JSON and exit
    #[arg(long, default_value_t = false)]
    pub json: bool,

    #[command(flatten)]
    pub stack: StackArgs,
}

#[derive(ClapArgs, Debug)]
pub struct PromptArgs {
    #[arg(long)]
    pub description: String,

    #[command(flatten)]
    pub stack: StackArgs,

    #[arg(long)]
    pub features: Option<String>,

    #[arg(long)]
    pub constraints: Option<String>,

    /// Also write the prompt to this file
    #[arg(long)]
    pub out: Option<String>,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

impl StackArgs {
    pub fn criteria(&self, description: String, features: Option<String>, constraints: Option<String>) -> PromptCriteria {
        PromptCriteria {
            project_description: description,
            language: self.language.clone(),
            framework: self.framework.clone(),
            complexity: self.complexity.clone(),
            code_style: self.code_style.clone(),
            features,
            constraints,
        }
    }
}

impl PromptArgs {
    pub fn criteria(&self) -> PromptCriteria {
        self.stack.criteria(
            self.description.clone(),
            self.features.clone(),
            self.constraints.clone(),
        )
    }
}
