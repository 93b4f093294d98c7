use anyhow::Result;
use clap::Parser;
use fs_err as fs;
use std::path::Path;
use std::sync::Arc;

mod cli;
mod config;
mod errors;
mod extract;
mod log;
mod orchestrator;
mod prompt;
mod provider;
mod sanitize;
mod server;
mod ux;
mod wire;

use cli::{Command, IdeasArgs};
use orchestrator::Orchestrator;
use wire::{GenerationCriteria, IdeaBatch, IdeaHistory, PromptCriteria, PromptResponse};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Args::parse();
    log::init_tracing(args.debug);

    let mut cfg = config::Config::load(args.config.as_deref().map(Path::new))?;
    cfg.apply_args(&args);
    tracing::debug!(?cfg, "effective config");

    let prov = provider::make_provider(&cfg)?;
    let mut orch = Orchestrator::new(prov, cfg.budgets());
    if cfg.save_artifacts {
        orch = orch.with_artifacts(log::ArtifactLog::new(&cfg.artifacts_root));
    }

    match &args.command {
        Command::Ideas(a) => run_ideas(&orch, a).await,
        Command::Prompt(a) => {
            deliver_prompt(&orch, &a.criteria(), a.out.as_deref(), a.json).await
        }
        Command::Serve { bind } => {
            let bind = bind.clone().unwrap_or_else(|| cfg.bind.clone());
            server::serve(Arc::new(orch), &bind).await
        }
    }
}

fn criteria_for(a: &IdeasArgs) -> GenerationCriteria {
    GenerationCriteria::new(a.interests.clone(), a.skill_level, a.project_type, a.time_commitment)
}

/// Interactive session. The history lives here and grows after every
/// successful batch; each round gets a fresh nonce.
async fn run_ideas(orch: &Orchestrator, a: &IdeasArgs) -> Result<()> {
    let mut history = IdeaHistory::new();

    if a.json {
        let ideas = orch.run_idea_generation(&criteria_for(a), &history).await?;
        println!("{}", serde_json::to_string_pretty(&IdeaBatch { ideas })?);
        return Ok(());
    }

    let mut round = 0;
    loop {
        let criteria = criteria_for(a);
        let outcome =
            ux::with_spinner("Generating ideas", orch.run_idea_generation(&criteria, &history)).await;
        let ideas = match outcome {
            Ok(ideas) => ideas,
            Err(e) => {
                ux::show_failure("generate project ideas", &e);
                if ux::confirm("Try again?") {
                    continue;
                }
                return Ok(());
            }
        };

        round += 1;
        history = history.with_ideas(&ideas);
        ux::show_ideas(&ideas, round);

        let answer = ux::ask(&format!(
            "Pick an idea (1-{}) to build a prompt, 'm' for more ideas, anything else to quit:",
            ideas.len()
        ));
        match ux::parse_choice(&answer, ideas.len()) {
            ux::Choice::More => continue,
            ux::Choice::Pick(i) => {
                let criteria = a.stack.criteria(ideas[i].to_project_description(), None, None);
                return deliver_prompt(orch, &criteria, None, false).await;
            }
            ux::Choice::Quit => return Ok(()),
        }
    }
}

async fn deliver_prompt(
    orch: &Orchestrator,
    criteria: &PromptCriteria,
    out: Option<&str>,
    json: bool,
) -> Result<()> {
    let outcome = if json {
        orch.run_prompt_generation(criteria).await
    } else {
        ux::with_spinner("Generating prompt", orch.run_prompt_generation(criteria)).await
    };
    let prompt = match outcome {
        Ok(p) => p,
        Err(e) => {
            ux::show_failure("generate prompt", &e);
            return Err(e.into());
        }
    };

    if let Some(path) = out {
        fs::write(path, prompt.as_str())?;
        tracing::info!(%path, "prompt written");
    }

    if json {
        let body = PromptResponse { prompt: prompt.into_string() };
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        ux::show_prompt(&prompt);
    }
    Ok(())
}
