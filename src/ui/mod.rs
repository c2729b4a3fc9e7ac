//! User interface module - interaction (prompts) and formatting.
//!
//! Separates concerns:
//! - `formatter` - Pure formatting functions and the console reporter
//! - This module - Interactive prompts and user input handling

use std::io::{self, BufRead, Write};

use crate::error::Result;

pub mod formatter;

// Re-export formatter functions for convenience
pub use formatter::{
    display_branch_status, display_config, display_error, display_status, display_success,
    ConsoleReporter,
};

/// Asks the user questions
pub trait Prompter {
    /// Yes/no question; an empty answer picks `default`
    fn confirm(&self, question: &str, default: bool) -> Result<bool>;

    /// Free-text question; an empty answer picks `default`.
    ///
    /// The answer is passed through `validate` and the question is repeated
    /// until it passes. Returns the validated value.
    fn input(
        &self,
        question: &str,
        default: &str,
        validate: &dyn Fn(&str) -> Result<String>,
    ) -> Result<String>;
}

/// Prompts on stdout, reads answers from stdin
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl TerminalPrompter {
    fn read_answer(prompt: &str) -> Result<String> {
        print!("{}", prompt);
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().lock().read_line(&mut input)? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "no answer on stdin").into());
        }
        Ok(input.trim().to_string())
    }
}

/// Interprets a yes/no answer; empty input picks the default.
///
/// Anything other than y/yes/n/no is `None`.
pub fn parse_yes_no(answer: &str, default: bool) -> Option<bool> {
    match answer.trim().to_lowercase().as_str() {
        "" => Some(default),
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

impl Prompter for TerminalPrompter {
    fn confirm(&self, question: &str, default: bool) -> Result<bool> {
        let hint = if default { "Y/n" } else { "y/N" };
        loop {
            let answer = Self::read_answer(&format!("\n{} ({}): ", question, hint))?;
            match parse_yes_no(&answer, default) {
                Some(value) => return Ok(value),
                None => display_error("Please answer 'y' or 'n'"),
            }
        }
    }

    fn input(
        &self,
        question: &str,
        default: &str,
        validate: &dyn Fn(&str) -> Result<String>,
    ) -> Result<String> {
        loop {
            let answer = Self::read_answer(&format!("{} [{}]: ", question, default))?;
            let answer = if answer.is_empty() {
                default
            } else {
                answer.as_str()
            };

            match validate(answer) {
                Ok(value) => return Ok(value),
                Err(e) => display_error(&e.to_string()),
            }
        }
    }
}
