use crate::errors::ValidationError;
use crate::wire::{GenerationCriteria, IdeaHistory, Instruction, PromptCriteria};

/// Number of ideas asked for per request.
pub const IDEAS_PER_REQUEST: usize = 3;

const DEFAULT_INTERESTS: &str = "general software development";

fn idea_fields() -> &'static str {
r#"For each project idea, provide:
1. A catchy, descriptive title (unique and creative)
2. A 2-3 sentence description explaining what the project does and why it is valuable
3. A tech stack (4-6 specific technologies/frameworks)
4. Learning outcomes (3-4 key skills they will gain)
5. Difficulty level (Beginner/Intermediate/Advanced/Expert)
6. Estimated completion time (Weekend/One Week/One Month/Long-term)"#
}

fn idea_qualities() -> &'static str {
r#"Make the ideas:
- Practical and buildable
- Aligned with current industry trends
- Specific enough to start immediately
- Relevant to the user's interests
- Distinct from one another

Use maximum creativity to ensure variety. Consider:
- Different domains (finance, health, education, entertainment, productivity, etc.)
- Different scales (micro-services, full applications, tools, games, etc.)
- Different technologies (web, mobile, desktop, CLI, APIs, etc.)
- Unique combinations of features and use cases"#
}

fn idea_format() -> &'static str {
r#"CRITICAL: Return ONLY the raw JSON object with no markdown formatting, no code blocks, no backticks, and no additional text.

Format:
{
  "ideas": [
    {
      "title": "Project Title",
      "description": "Detailed description.",
      "techStack": ["Tech1", "Tech2", "Tech3", "Tech4"],
      "learningOutcomes": ["Skill 1", "Skill 2", "Skill 3"],
      "difficulty": "Intermediate",
      "estimatedTime": "One Week"
    }
  ]
}"#
}

/// Numbered prior titles plus the prohibition. Empty history yields no section.
fn exclusion_section(history: &IdeaHistory) -> Option<String> {
    if history.is_empty() {
        return None;
    }
    let list = history
        .titles()
        .iter()
        .enumerate()
        .map(|(i, title)| format!("{}. {}", i + 1, title))
        .collect::<Vec<_>>()
        .join("\n");
    Some(format!(
"CRITICAL INSTRUCTION - AVOID DUPLICATES:
You have previously generated these project ideas:
{list}

You MUST generate completely NEW and DIFFERENT project ideas. DO NOT:
- Reuse any of the titles listed above
- Create variations or near-duplicates of the titles listed above
- Use concepts or themes similar to the titles listed above

Generate entirely fresh ideas that are distinctly different from every listed title."
    ))
}

/// Instruction asking for exactly three project ideas as a raw JSON payload.
///
/// The duplicate-avoidance section appears only when `history` has titles;
/// the nonce is embedded verbatim to keep provider-side sampling from
/// repeating itself.
pub fn build_idea_instruction(criteria: &GenerationCriteria, history: &IdeaHistory) -> String {
    let interests = criteria
        .interests
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_INTERESTS);

    let exclusion = exclusion_section(history)
        .map(|s| format!("\n{s}\n"))
        .unwrap_or_default();

    format!(
"You are an expert software development mentor helping someone find the perfect project to build.

Generation ID: {nonce}

Generate exactly {count} unique, creative, and practical project ideas based on these criteria:
- Interests: {interests}
- Skill Level: {skill}
- Project Type: {project_type}
- Time Commitment: {time}
{exclusion}
{fields}

Order the {count} ideas by ascending difficulty: the first is the easiest and the last is the most challenging.

{qualities}

{format}",
        nonce = criteria.nonce,
        count = IDEAS_PER_REQUEST,
        interests = interests,
        skill = criteria.skill_level,
        project_type = criteria.project_type.instruction_token(),
        time = criteria.time_commitment,
        exclusion = exclusion,
        fields = idea_fields(),
        qualities = idea_qualities(),
        format = idea_format(),
    )
}

fn prompt_system() -> &'static str {
r#"You are an expert at crafting detailed, comprehensive prompts for AI code generation tools. Your goal is to generate a highly detailed, structured prompt that will help an AI generate high-quality, production-ready code.

IMPORTANT: Output the prompt in plain text without any markdown formatting. Do not use:
- Markdown headings (#, ##, ###, ####)
- Bold or italic emphasis markers (**text**, *text*, __text__, _text_)
- Code fences or code blocks
- Inline code backticks

Use plain text with capitalized section labels followed by a colon, like "PROJECT OVERVIEW:" or "TECHNICAL REQUIREMENTS:". Use plain numbers (1., 2., 3.) for lists and dashes for sub-items.

Make the prompt extremely detailed and specific so the AI generates the best possible code without further clarification."#
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.trim().is_empty())
}

/// Instruction asking for a markdown-free code-generation prompt.
///
/// Fails before anything is sent when the project description is blank.
/// Features and constraints lines are left out entirely when empty.
pub fn build_prompt_instruction(criteria: &PromptCriteria) -> Result<Instruction, ValidationError> {
    let description = criteria.project_description.trim();
    if description.is_empty() {
        return Err(ValidationError::EmptyDescription);
    }

    let has_framework = !criteria.framework.trim().eq_ignore_ascii_case("none")
        && !criteria.framework.trim().is_empty();
    let framework = if has_framework {
        criteria.framework.as_str()
    } else {
        "Vanilla/No framework"
    };
    let stack = if has_framework {
        format!("{} and {}", criteria.language, criteria.framework)
    } else {
        criteria.language.clone()
    };

    let mut specs = vec![
        format!("- Programming Language: {}", criteria.language),
        format!("- Framework/Library: {framework}"),
        format!("- Complexity Level: {}", criteria.complexity),
        format!("- Code Style: {}", criteria.code_style),
    ];
    if let Some(features) = non_empty(&criteria.features) {
        specs.push(format!("- Required Features: {features}"));
    }
    if let Some(constraints) = non_empty(&criteria.constraints) {
        specs.push(format!("- Constraints & Requirements: {constraints}"));
    }

    let user = format!(
"Generate a comprehensive AI prompt for the following project:

PROJECT DESCRIPTION:
{description}

TECHNICAL SPECIFICATIONS:
{specs}

Create a detailed prompt that:
1. Gives a clear project overview and objectives
2. Specifies all technical requirements and dependencies
3. Outlines the expected code structure and architecture
4. Includes specific coding standards for {stack}
5. Addresses error handling, edge cases, and validation
6. Specifies testing requirements (unit tests, integration tests)
7. Includes performance optimization guidelines
8. Covers security best practices
9. Defines clear success criteria
10. Requests proper documentation and comments

CRITICAL: Format the output as plain text without any markdown: no headings, no bold or italic markers, no code fences, no backticks. Use capitalized section labels followed by a colon, like \"SECTION NAME:\", followed by the content. Make it ready to paste directly into an AI code generation tool.",
        specs = specs.join("\n"),
    );

    Ok(Instruction {
        system: Some(prompt_system().to_string()),
        user,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{ProjectType, SkillLevel, TimeCommitment};

    fn finance_criteria() -> GenerationCriteria {
        GenerationCriteria::new(
            Some("finance".into()),
            SkillLevel::Beginner,
            ProjectType::WebApp,
            TimeCommitment::Weekend,
        )
        .with_nonce(1_700_000_000_000)
    }

    fn prompt_criteria() -> PromptCriteria {
        PromptCriteria {
            project_description: "A CLI that tracks reading habits".into(),
            language: "rust".into(),
            framework: "none".into(),
            complexity: "intermediate".into(),
            code_style: "functional".into(),
            features: None,
            constraints: None,
        }
    }

    #[test]
    fn idea_instruction_without_history() {
        let text = build_idea_instruction(&finance_criteria(), &IdeaHistory::new());
        assert!(text.contains("exactly 3"));
        for needle in ["finance", "Beginner", "Web App", "Weekend"] {
            assert!(text.contains(needle), "missing {needle}");
        }
        assert!(!text.contains("AVOID DUPLICATES"));
        assert!(!text.contains("previously generated"));
    }

    #[test]
    fn idea_instruction_with_history_lists_titles() {
        let history = IdeaHistory::from(vec!["Budget Tracker Pro".to_string()]);
        let text = build_idea_instruction(&finance_criteria(), &history);
        assert!(text.contains("1. Budget Tracker Pro"));
        assert!(text.contains("AVOID DUPLICATES"));
        assert!(text.contains("MUST generate completely NEW"));
    }

    #[test]
    fn every_prior_title_appears_once_with_its_ordinal() {
        let titles = vec![
            "Budget Tracker Pro".to_string(),
            "Recipe Roulette".to_string(),
            "Habit Hero".to_string(),
        ];
        let text = build_idea_instruction(&finance_criteria(), &IdeaHistory::from(titles.clone()));
        for (i, title) in titles.iter().enumerate() {
            assert_eq!(text.matches(title.as_str()).count(), 1, "{title}");
            assert!(text.contains(&format!("{}. {}", i + 1, title)));
        }
    }

    #[test]
    fn blank_interests_fall_back() {
        let mut criteria = finance_criteria();
        criteria.interests = Some("   ".into());
        let text = build_idea_instruction(&criteria, &IdeaHistory::new());
        assert!(text.contains("Interests: general software development"));

        criteria.interests = None;
        let text = build_idea_instruction(&criteria, &IdeaHistory::new());
        assert!(text.contains("Interests: general software development"));
    }

    #[test]
    fn surprise_me_is_sent_as_any() {
        let mut criteria = finance_criteria();
        criteria.project_type = ProjectType::SurpriseMe;
        let text = build_idea_instruction(&criteria, &IdeaHistory::new());
        assert!(text.contains("Project Type: any"));
        assert!(!text.contains("Surprise Me"));
    }

    #[test]
    fn idea_instruction_embeds_nonce_order_and_shape() {
        let text = build_idea_instruction(&finance_criteria(), &IdeaHistory::new());
        assert!(text.contains("Generation ID: 1700000000000"));
        assert!(text.contains("ascending difficulty"));
        assert!(text.contains("Return ONLY the raw JSON object"));
        for field in ["\"techStack\"", "\"learningOutcomes\"", "\"difficulty\"", "\"estimatedTime\""] {
            assert!(text.contains(field), "missing {field}");
        }
    }

    #[test]
    fn empty_description_is_rejected() {
        let mut criteria = prompt_criteria();
        criteria.project_description = "  \n\t".into();
        assert_eq!(
            build_prompt_instruction(&criteria),
            Err(ValidationError::EmptyDescription)
        );
    }

    #[test]
    fn features_line_only_when_present() {
        let ins = build_prompt_instruction(&prompt_criteria()).unwrap();
        assert!(!ins.full_text().contains("Required Features"));
        assert!(!ins.full_text().contains("Constraints & Requirements"));

        let mut criteria = prompt_criteria();
        criteria.features = Some("offline sync, CSV export".into());
        criteria.constraints = Some("".into());
        let ins = build_prompt_instruction(&criteria).unwrap();
        assert!(ins.user.contains("- Required Features: offline sync, CSV export"));
        assert!(!ins.user.contains("Constraints & Requirements"));
    }

    #[test]
    fn prompt_instruction_forbids_markdown_and_requests_coverage() {
        let ins = build_prompt_instruction(&prompt_criteria()).unwrap();
        let text = ins.full_text().to_lowercase();
        for needle in [
            "without any markdown",
            "headings",
            "code fences",
            "followed by a colon",
            "overview",
            "technical requirements",
            "architecture",
            "coding standards for rust",
            "error handling",
            "testing requirements",
            "performance",
            "security",
            "documentation",
        ] {
            assert!(text.contains(needle), "missing {needle}");
        }
    }

    #[test]
    fn framework_pairing_in_coding_standards() {
        let mut criteria = prompt_criteria();
        criteria.language = "typescript".into();
        criteria.framework = "nextjs".into();
        let ins = build_prompt_instruction(&criteria).unwrap();
        assert!(ins.user.contains("coding standards for typescript and nextjs"));
        assert!(ins.user.contains("- Framework/Library: nextjs"));

        let ins = build_prompt_instruction(&prompt_criteria()).unwrap();
        assert!(ins.user.contains("- Framework/Library: Vanilla/No framework"));
    }
}
