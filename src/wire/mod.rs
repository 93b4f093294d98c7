use chrono::Utc;
use clap::ValueEnum;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// ========================================
/// Generation vocabulary
/// ========================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unrecognised label: {0}")]
pub struct UnknownLabel(pub String);

/// Lowercase and drop everything but letters/digits, so "Long-term",
/// "long term" and "LongTerm" compare equal.
fn fold(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum SkillLevel {
    #[serde(alias = "beginner")]
    Beginner,
    #[serde(alias = "intermediate")]
    Intermediate,
    #[serde(alias = "advanced")]
    Advanced,
    #[serde(alias = "expert")]
    Expert,
}

impl SkillLevel {
    pub fn label(&self) -> &'static str {
        match self {
            SkillLevel::Beginner => "Beginner",
            SkillLevel::Intermediate => "Intermediate",
            SkillLevel::Advanced => "Advanced",
            SkillLevel::Expert => "Expert",
        }
    }
}

impl FromStr for SkillLevel {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match fold(s).as_str() {
            "beginner" => Ok(SkillLevel::Beginner),
            "intermediate" => Ok(SkillLevel::Intermediate),
            "advanced" => Ok(SkillLevel::Advanced),
            "expert" => Ok(SkillLevel::Expert),
            _ => Err(UnknownLabel(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum ProjectType {
    #[serde(rename = "Web App")]
    WebApp,
    #[serde(rename = "Mobile App")]
    MobileApp,
    #[serde(rename = "Desktop App")]
    DesktopApp,
    #[serde(rename = "AI/ML")]
    AiMl,
    #[serde(rename = "Game")]
    Game,
    #[serde(rename = "CLI Tool")]
    CliTool,
    #[serde(rename = "API/Backend")]
    ApiBackend,
    /// UI sentinel; never reaches the provider as-is.
    #[serde(rename = "Surprise Me")]
    SurpriseMe,
    #[serde(rename = "any")]
    Any,
}

impl ProjectType {
    pub fn label(&self) -> &'static str {
        match self {
            ProjectType::WebApp => "Web App",
            ProjectType::MobileApp => "Mobile App",
            ProjectType::DesktopApp => "Desktop App",
            ProjectType::AiMl => "AI/ML",
            ProjectType::Game => "Game",
            ProjectType::CliTool => "CLI Tool",
            ProjectType::ApiBackend => "API/Backend",
            ProjectType::SurpriseMe => "Surprise Me",
            ProjectType::Any => "any",
        }
    }

    /// Token embedded in the idea instruction.
    pub fn instruction_token(&self) -> &'static str {
        match self {
            ProjectType::SurpriseMe | ProjectType::Any => "any",
            other => other.label(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum TimeCommitment {
    #[serde(rename = "Weekend")]
    Weekend,
    #[serde(rename = "One Week", alias = "OneWeek")]
    OneWeek,
    #[serde(rename = "One Month", alias = "OneMonth")]
    OneMonth,
    #[serde(rename = "Long-term", alias = "LongTerm")]
    LongTerm,
}

impl TimeCommitment {
    pub fn label(&self) -> &'static str {
        match self {
            TimeCommitment::Weekend => "Weekend",
            TimeCommitment::OneWeek => "One Week",
            TimeCommitment::OneMonth => "One Month",
            TimeCommitment::LongTerm => "Long-term",
        }
    }
}

impl FromStr for TimeCommitment {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match fold(s).as_str() {
            "weekend" => Ok(TimeCommitment::Weekend),
            "oneweek" | "1week" => Ok(TimeCommitment::OneWeek),
            "onemonth" | "1month" => Ok(TimeCommitment::OneMonth),
            "longterm" => Ok(TimeCommitment::LongTerm),
            _ => Err(UnknownLabel(s.to_string())),
        }
    }
}

macro_rules! display_via_label {
    ($($t:ty),*) => {
        $(impl fmt::Display for $t {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        })*
    };
}

display_via_label!(SkillLevel, ProjectType, TimeCommitment);

/// A label the provider filled in. Recognised values map onto the enum,
/// anything else non-empty is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Labeled<T> {
    Known(T),
    Other(String),
}

impl<'de, T: FromStr> Deserialize<'de> for Labeled<T> {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(d)?;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(serde::de::Error::custom("empty label"));
        }
        Ok(trimmed
            .parse::<T>()
            .map(Labeled::Known)
            .unwrap_or_else(|_| Labeled::Other(trimmed.to_string())))
    }
}

impl<T: fmt::Display> fmt::Display for Labeled<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Labeled::Known(v) => v.fmt(f),
            Labeled::Other(s) => f.write_str(s),
        }
    }
}

/// ========================================
/// Idea path
/// ========================================

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationCriteria {
    pub interests: Option<String>,
    pub skill_level: SkillLevel,
    pub project_type: ProjectType,
    pub time_commitment: TimeCommitment,
    /// Only diversifies sampling on the provider side.
    pub nonce: i64,
}

impl GenerationCriteria {
    pub fn new(
        interests: Option<String>,
        skill_level: SkillLevel,
        project_type: ProjectType,
        time_commitment: TimeCommitment,
    ) -> Self {
        Self {
            interests,
            skill_level,
            project_type,
            time_commitment,
            nonce: Utc::now().timestamp_millis(),
        }
    }

    pub fn with_nonce(mut self, nonce: i64) -> Self {
        self.nonce = nonce;
        self
    }
}

/// Titles returned so far in one session, oldest first. Owned by the caller;
/// the core only reads it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdeaHistory(Vec<String>);

impl IdeaHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn titles(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Append a batch of titles, producing the history for the next request.
    pub fn with_titles<I>(mut self, titles: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        self.0.extend(titles);
        self
    }

    pub fn with_ideas(self, ideas: &[ProjectIdea]) -> Self {
        self.with_titles(ideas.iter().map(|i| i.title.clone()))
    }
}

impl From<Vec<String>> for IdeaHistory {
    fn from(titles: Vec<String>) -> Self {
        Self(titles)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectIdea {
    pub title: String,
    pub description: String,
    pub tech_stack: Vec<String>,
    pub learning_outcomes: Vec<String>,
    pub difficulty: Labeled<SkillLevel>,
    pub estimated_time: Labeled<TimeCommitment>,
}

impl ProjectIdea {
    /// Seed text for a prompt request built from this idea.
    pub fn to_project_description(&self) -> String {
        let requirements = self
            .learning_outcomes
            .iter()
            .map(|o| format!("- {o}"))
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            "{}\n\n{}\n\nKey Requirements:\n{}\n\nTech Stack: {}",
            self.title,
            self.description,
            requirements,
            self.tech_stack.join(", ")
        )
    }
}

/// Payload shape the provider is asked for; also the success body of
/// `POST /api/generate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdeaBatch {
    pub ideas: Vec<ProjectIdea>,
}

/// Body of `POST /api/generate`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdeaRequest {
    #[serde(default)]
    pub interests: Option<String>,
    pub skill_level: SkillLevel,
    pub project_type: ProjectType,
    pub time_commitment: TimeCommitment,
    #[serde(default)]
    pub previous_titles: Vec<String>,
    #[serde(default)]
    pub seed: Option<i64>,
}

impl IdeaRequest {
    pub fn into_parts(self) -> (GenerationCriteria, IdeaHistory) {
        let mut criteria = GenerationCriteria::new(
            self.interests,
            self.skill_level,
            self.project_type,
            self.time_commitment,
        );
        if let Some(seed) = self.seed {
            criteria = criteria.with_nonce(seed);
        }
        (criteria, IdeaHistory::from(self.previous_titles))
    }
}

/// ========================================
/// Prompt path
/// ========================================

/// Also the body of `POST /api/generate-prompt`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptCriteria {
    pub project_description: String,
    pub language: String,
    pub framework: String,
    pub complexity: String,
    pub code_style: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<String>,
}

/// Sanitized plain-text prompt. Only built from sanitizer output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedPrompt(String);

impl GeneratedPrompt {
    pub(crate) fn from_sanitized(text: String) -> Self {
        Self(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for GeneratedPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptResponse {
    pub prompt: String,
}

/// ========================================
/// Provider request
/// ========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub user: String,
}

impl Instruction {
    pub fn user_only(user: String) -> Self {
        Self { system: None, user }
    }

    /// Both parts as one text, for asserting on the whole instruction.
    #[cfg(test)]
    pub fn full_text(&self) -> String {
        match &self.system {
            Some(sys) => format!("{sys}\n\n{}", self.user),
            None => self.user.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub instruction: Instruction,
    pub max_tokens: u32,
    /// `None` leaves the provider's default sampling untouched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}
