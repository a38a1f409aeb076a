//! Operator prompting
//!
//! All human input flows through the `Prompt` trait so the resolution
//! and reconciliation logic can be driven by scripted answers in tests.

use std::io::{BufRead, Write};

use crate::errors::DeployError;

/// Interactive questions asked during a run
pub trait Prompt {
    /// Ask a free-form question; empty input selects the default
    fn ask(&mut self, question: &str, default: Option<&str>) -> Result<String, DeployError>;

    /// Ask a yes/no question
    fn confirm(&mut self, question: &str, default: bool) -> Result<bool, DeployError>;

    /// Ask the operator to pick one of several options; returns the index
    fn choose(&mut self, question: &str, options: &[&str], default: usize) -> Result<usize, DeployError>;
}

/// Prompt implementation reading from stdin
///
/// With `assume_defaults` set (the `--yes` flag), every question with a
/// default resolves without touching stdin; questions without one still
/// block for input.
pub struct StdinPrompt {
    assume_defaults: bool,
}

impl StdinPrompt {
    pub fn new(assume_defaults: bool) -> Self {
        Self { assume_defaults }
    }

    fn read_line(&self) -> Result<String, DeployError> {
        let mut line = String::new();
        let bytes_read = std::io::stdin().lock().read_line(&mut line)?;
        if bytes_read == 0 {
            return Err(DeployError::ConfigError(
                "unexpected end of input".to_string(),
            ));
        }
        Ok(line.trim().to_string())
    }

    fn write_question(&self, text: &str) -> Result<(), DeployError> {
        let mut stdout = std::io::stdout().lock();
        write!(stdout, "{}", text)?;
        stdout.flush()?;
        Ok(())
    }
}

impl Prompt for StdinPrompt {
    fn ask(&mut self, question: &str, default: Option<&str>) -> Result<String, DeployError> {
        if self.assume_defaults {
            if let Some(value) = default {
                return Ok(value.to_string());
            }
        }

        loop {
            match default {
                Some(value) => self.write_question(&format!("{} [{}]: ", question, value))?,
                None => self.write_question(&format!("{}: ", question))?,
            }

            let answer = self.read_line()?;
            if !answer.is_empty() {
                return Ok(answer);
            }
            if let Some(value) = default {
                return Ok(value.to_string());
            }
            // No default; ask again
        }
    }

    fn confirm(&mut self, question: &str, default: bool) -> Result<bool, DeployError> {
        if self.assume_defaults {
            return Ok(default);
        }

        let hint = if default { "Y/n" } else { "y/N" };
        loop {
            self.write_question(&format!("{} [{}]: ", question, hint))?;
            let answer = self.read_line()?.to_lowercase();
            match answer.as_str() {
                "" => return Ok(default),
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => {}
            }
        }
    }

    fn choose(&mut self, question: &str, options: &[&str], default: usize) -> Result<usize, DeployError> {
        if self.assume_defaults {
            return Ok(default);
        }

        let mut listing = format!("{}\n", question);
        for (i, option) in options.iter().enumerate() {
            listing.push_str(&format!("  {}) {}\n", i + 1, option));
        }

        loop {
            self.write_question(&format!("{}Choice [{}]: ", listing, default + 1))?;
            let answer = self.read_line()?;
            if answer.is_empty() {
                return Ok(default);
            }
            if let Ok(n) = answer.parse::<usize>() {
                if n >= 1 && n <= options.len() {
                    return Ok(n - 1);
                }
            }
        }
    }
}
