//! Terminal confirmation for destructive and state-changing actions.

use std::io::{self, BufRead, IsTerminal, Write};

use async_trait::async_trait;
use curator_session::{Confirm, ConfirmPrompt};
use tracing::{debug, warn};

/// Asks `y/N` on an interactive terminal.
///
/// With `--yes` every prompt is accepted. Without a terminal on stdin prompts
/// are declined, so scripted runs never act without an explicit `--yes`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TerminalConfirm {
    assume_yes: bool,
}

impl TerminalConfirm {
    pub(crate) const fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

#[async_trait]
impl Confirm for TerminalConfirm {
    async fn confirm(&self, prompt: &ConfirmPrompt) -> bool {
        if self.assume_yes {
            debug!(prompt = %prompt, "confirmation accepted by --yes");
            return true;
        }
        if !io::stdin().is_terminal() {
            eprintln!("{prompt} (not a terminal; pass --yes to confirm)");
            return false;
        }
        let question = prompt.to_string();
        tokio::task::spawn_blocking(move || ask(&question))
            .await
            .unwrap_or_else(|err| {
                warn!(error = %err, "confirmation prompt failed");
                false
            })
    }
}

fn ask(question: &str) -> bool {
    let mut stderr = io::stderr();
    if write!(stderr, "{question} [y/N] ").and_then(|()| stderr.flush()).is_err() {
        return false;
    }
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    is_yes(&answer)
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
