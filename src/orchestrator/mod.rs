use std::time::Instant;

use crate::errors::GenerationError;
use crate::extract::extract_json;
use crate::log::ArtifactLog;
use crate::prompt::{build_idea_instruction, build_prompt_instruction};
use crate::provider::DynProvider;
use crate::sanitize::sanitize;
use crate::wire::{
    CompletionRequest, GeneratedPrompt, GenerationCriteria, IdeaBatch, IdeaHistory, Instruction,
    ProjectIdea, PromptCriteria,
};

/// Output-length and sampling settings per operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Budgets {
    pub idea_max_tokens: u32,
    /// Kept high so repeated idea requests vary.
    pub idea_temperature: f32,
    pub prompt_max_tokens: u32,
}

impl Default for Budgets {
    fn default() -> Self {
        Self {
            idea_max_tokens: 2000,
            idea_temperature: 1.0,
            prompt_max_tokens: 4000,
        }
    }
}

/// Runs one generation per call: build the instruction, make a single
/// provider round trip, normalize the text into a typed result.
///
/// Holds no per-call state, so one instance can serve concurrent callers.
/// Idea history belongs to the caller and is only read here.
pub struct Orchestrator {
    provider: DynProvider,
    budgets: Budgets,
    artifacts: Option<ArtifactLog>,
}

impl Orchestrator {
    pub fn new(provider: DynProvider, budgets: Budgets) -> Self {
        Self { provider, budgets, artifacts: None }
    }

    pub fn with_artifacts(mut self, log: ArtifactLog) -> Self {
        self.artifacts = Some(log);
        self
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// One provider round trip, no retry.
    async fn call(&self, stage: &str, req: &CompletionRequest) -> Result<String, GenerationError> {
        let outcome = self.provider.complete(req).await;

        if let Some(log) = &self.artifacts {
            self.save_artifacts(log.clone(), stage, req, outcome.as_ref().ok()).await;
        }

        outcome.map_err(|e| {
            tracing::warn!(stage, provider = self.provider.name(), error = %format!("{e:#}"), "provider call failed");
            GenerationError::ProviderUnavailable(format!("{e:#}"))
        })
    }

    /// Writes run on the blocking pool. Failures are only logged.
    async fn save_artifacts(
        &self,
        log: ArtifactLog,
        stage: &str,
        req: &CompletionRequest,
        raw: Option<&String>,
    ) {
        let provider = self.provider.name();
        let (stage_owned, req, raw) = (stage.to_string(), req.clone(), raw.cloned());
        let saved = tokio::task::spawn_blocking(move || {
            log.save_stage(&stage_owned, provider, &req, raw.as_deref())
        })
        .await;

        match saved {
            Ok(Ok(saved)) => tracing::debug!(stage, dir = %saved.dir.display(), "artifacts saved"),
            Ok(Err(e)) => tracing::warn!(stage, error = %e, "could not save artifacts"),
            Err(e) => tracing::warn!(stage, error = %e, "artifact writer task failed"),
        }
    }

    pub async fn run_idea_generation(
        &self,
        criteria: &GenerationCriteria,
        history: &IdeaHistory,
    ) -> Result<Vec<ProjectIdea>, GenerationError> {
        let started = Instant::now();
        let req = CompletionRequest {
            instruction: Instruction::user_only(build_idea_instruction(criteria, history)),
            max_tokens: self.budgets.idea_max_tokens,
            temperature: Some(self.budgets.idea_temperature),
        };

        let raw = self.call("ideas", &req).await?;
        let ideas = parse_ideas(&raw).map_err(|e| {
            tracing::warn!(error = %e, "idea payload rejected");
            e
        })?;

        tracing::info!(
            count = ideas.len(),
            history = history.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "ideas generated"
        );
        Ok(ideas)
    }

    pub async fn run_prompt_generation(
        &self,
        criteria: &PromptCriteria,
    ) -> Result<GeneratedPrompt, GenerationError> {
        let started = Instant::now();
        let instruction = build_prompt_instruction(criteria).map_err(|e| {
            tracing::warn!(error = %e, "prompt request rejected");
            e
        })?;
        let req = CompletionRequest {
            instruction,
            max_tokens: self.budgets.prompt_max_tokens,
            temperature: None,
        };

        let raw = self.call("prompt", &req).await?;
        let text = sanitize(&raw);
        if text.is_empty() {
            tracing::warn!(raw_len = raw.len(), "provider returned an empty prompt");
            return Err(GenerationError::MalformedResponse("empty response".into()));
        }

        tracing::info!(
            chars = text.chars().count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "prompt generated"
        );
        Ok(GeneratedPrompt::from_sanitized(text))
    }
}

/// Extract the idea batch, strip markup from its text fields and require a
/// non-empty list of titled ideas.
fn parse_ideas(raw: &str) -> Result<Vec<ProjectIdea>, GenerationError> {
    let batch: IdeaBatch = extract_json(raw)?;
    if batch.ideas.is_empty() {
        return Err(GenerationError::MalformedResponse("no ideas in payload".into()));
    }

    let ideas: Vec<ProjectIdea> = batch.ideas.into_iter().map(clean_idea).collect();
    if let Some(pos) = ideas.iter().position(|i| i.title.is_empty()) {
        return Err(GenerationError::MalformedResponse(format!(
            "idea {} has a blank title",
            pos + 1
        )));
    }
    Ok(ideas)
}

fn clean_idea(mut idea: ProjectIdea) -> ProjectIdea {
    idea.title = sanitize(&idea.title);
    idea.description = sanitize(&idea.description);
    idea.tech_stack = idea.tech_stack.iter().map(|s| sanitize(s)).collect();
    idea.learning_outcomes = idea.learning_outcomes.iter().map(|s| sanitize(s)).collect();
    idea
}
