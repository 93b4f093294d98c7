use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::future::Future;
use std::io::{self, Write};
use std::time::Duration;

use crate::errors::GenerationError;
use crate::wire::{GeneratedPrompt, ProjectIdea};

/// What the user wants after a batch of ideas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    More,
    /// Zero-based index into the batch just shown.
    Pick(usize),
    Quit,
}

pub fn parse_choice(input: &str, batch_len: usize) -> Choice {
    let ans = input.trim().to_lowercase();
    if ans == "m" || ans == "more" {
        return Choice::More;
    }
    match ans.parse::<usize>() {
        Ok(n) if n >= 1 && n <= batch_len => Choice::Pick(n - 1),
        _ => Choice::Quit,
    }
}

pub fn show_ideas(ideas: &[ProjectIdea], round: usize) {
    println!("\n=== IDEAS (round {round}) ===");
    for (i, idea) in ideas.iter().enumerate() {
        println!(
            "\n{}. {}  {}",
            i + 1,
            idea.title.green().bold(),
            format!("[{} · {}]", idea.difficulty, idea.estimated_time).cyan()
        );
        println!("   {}", idea.description);
        println!("   {} {}", "Stack:".bold(), idea.tech_stack.join(", "));
        if !idea.learning_outcomes.is_empty() {
            println!("   {}", "You'll learn:".bold());
            for o in &idea.learning_outcomes {
                println!("     - {o}");
            }
        }
    }
    println!();
}

pub fn show_prompt(prompt: &GeneratedPrompt) {
    println!(
        "\n{}",
        "┏━━━━━━━━━━━━━━━━━━━━━━━ Generated Prompt ━━━━━━━━━━━━━━━━━━━━━━┓".bold()
    );
    println!("{prompt}");
    println!(
        "{}",
        "┗━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┛".bold()
    );
}

/// Every failure reads as retryable to the user; the kind goes to the log.
pub fn show_failure(what: &str, err: &GenerationError) {
    tracing::error!(code = err.code(), error = %err, "{what} failed");
    eprintln!("{} {}", "✗".red().bold(), format!("Failed to {what}. Please try again.").red());
}

pub fn ask(prompt: &str) -> String {
    print!("{prompt} ");
    let _ = io::stdout().flush();
    let mut s = String::new();
    if io::stdin().read_line(&mut s).is_ok() {
        s
    } else {
        String::new()
    }
}

pub fn confirm(prompt: &str) -> bool {
    let ans = ask(&format!("{prompt} [y/N]:")).trim().to_lowercase();
    ans == "y" || ans == "yes"
}

/// Show a spinner while `fut` is pending. It only says a call is in flight.
pub async fn with_spinner<F: Future>(message: &str, fut: F) -> F::Output {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg} ({elapsed})")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    let out = fut.await;
    pb.finish_and_clear();
    out
}
