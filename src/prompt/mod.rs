// ABOUTME: Operator confirmation for destructive steps.
// ABOUTME: Auto-confirm answers each question with its policy default; the terminal asks.

use thiserror::Error;

/// Asks the operator yes/no questions.
pub trait Prompter: Send + Sync {
    /// Ask `question`. `default` is the answer the policy recommends.
    fn confirm(&self, question: &str, default: bool) -> Result<bool, PromptError>;

    /// True when no human is answering.
    fn is_automatic(&self) -> bool {
        false
    }
}

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("failed to read confirmation: {0}")]
    Terminal(String),
}

/// Non-interactive mode (`--yes`): every question takes its default answer.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoConfirm;

impl Prompter for AutoConfirm {
    fn confirm(&self, question: &str, default: bool) -> Result<bool, PromptError> {
        tracing::info!(answer = default, "auto-confirmed: {}", question);
        Ok(default)
    }

    fn is_automatic(&self) -> bool {
        true
    }
}

/// Interactive confirmation on the controlling terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn confirm(&self, question: &str, default: bool) -> Result<bool, PromptError> {
        dialoguer::Confirm::new()
            .with_prompt(question)
            .default(default)
            .interact()
            .map_err(|e| PromptError::Terminal(e.to_string()))
    }
}

/// Pick the prompter for the `--yes` flag.
pub fn prompter_for(auto_confirm: bool) -> Box<dyn Prompter> {
    if auto_confirm {
        Box::new(AutoConfirm)
    } else {
        Box::new(TerminalPrompter)
    }
}
