//! User confirmation as an injected capability.
//!
//! # Design
//! - The gateway never asks; callers run [`confirm_then_perform`] so every
//!   state-changing action goes through the same prompt path.
//! - Front ends supply an implementation: a terminal prompt, a dialog, or a
//!   fixed policy in tests.

use std::fmt;
use std::future::Future;

use async_trait::async_trait;

use crate::action::{Action, ActionKind};

/// What the user is asked to approve.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfirmPrompt {
    /// Action awaiting approval.
    pub action: Action,
    /// Number of affected items.
    pub count: usize,
    /// Question shown to the user.
    pub message: String,
}

impl ConfirmPrompt {
    /// Prompt for `action` applied to `count` items.
    #[must_use]
    pub fn new(action: Action, count: usize) -> Self {
        let subject = if count == 1 {
            "this item".to_string()
        } else {
            format!("{count} selected items")
        };
        let mut message = format!("Are you sure you want to {} {subject}?", action.verb());
        if action.kind() == ActionKind::Destructive {
            message.push_str(" This cannot be undone.");
        }
        Self {
            action,
            count,
            message,
        }
    }

    /// Whether this prompt has to be shown at all.
    #[must_use]
    pub const fn required(&self) -> bool {
        self.action.requires_confirmation()
    }
}

impl fmt::Display for ConfirmPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Blocking yes/no decision supplied by the front end.
#[async_trait]
pub trait Confirm: Send + Sync {
    /// Return `true` to proceed.
    async fn confirm(&self, prompt: &ConfirmPrompt) -> bool;
}

/// Accepts every prompt.
#[derive(Clone, Copy, Debug, Default)]
pub struct AutoConfirm;

#[async_trait]
impl Confirm for AutoConfirm {
    async fn confirm(&self, _prompt: &ConfirmPrompt) -> bool {
        true
    }
}

/// Declines every prompt.
#[derive(Clone, Copy, Debug, Default)]
pub struct AutoDecline;

#[async_trait]
impl Confirm for AutoDecline {
    async fn confirm(&self, _prompt: &ConfirmPrompt) -> bool {
        false
    }
}

/// Adapter for synchronous closures.
pub struct ConfirmFn<F>(pub F);

#[async_trait]
impl<F> Confirm for ConfirmFn<F>
where
    F: Fn(&ConfirmPrompt) -> bool + Send + Sync,
{
    async fn confirm(&self, prompt: &ConfirmPrompt) -> bool {
        (self.0)(prompt)
    }
}

/// Ask when the prompt requires it, then run `perform`. Returns `None` when
/// the user declined.
pub async fn confirm_then_perform<F, Fut, R>(
    confirmer: &dyn Confirm,
    prompt: &ConfirmPrompt,
    perform: F,
) -> Option<R>
where
    F: FnOnce() -> Fut + Send,
    Fut: Future<Output = R> + Send,
{
    if prompt.required() && !confirmer.confirm(prompt).await {
        return None;
    }
    Some(perform().await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn prompt_wording_depends_on_count_and_kind() {
        assert_eq!(
            ConfirmPrompt::new(Action::Approve, 1).message,
            "Are you sure you want to approve this item?"
        );
        assert_eq!(
            ConfirmPrompt::new(Action::Delete, 3).message,
            "Are you sure you want to delete 3 selected items? This cannot be undone."
        );
        assert!(!ConfirmPrompt::new(Action::Duplicate, 1).required());
    }

    #[tokio::test]
    async fn declined_prompt_skips_the_call() {
        let calls = AtomicUsize::new(0);
        let prompt = ConfirmPrompt::new(Action::Delete, 1);
        let outcome = confirm_then_perform(&AutoDecline, &prompt, || async {
            calls.fetch_add(1, Ordering::SeqCst);
        })
        .await;
        assert!(outcome.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn structural_actions_skip_the_prompt() {
        let asked = AtomicUsize::new(0);
        let confirmer = ConfirmFn(|_: &ConfirmPrompt| {
            asked.fetch_add(1, Ordering::SeqCst);
            false
        });
        let prompt = ConfirmPrompt::new(Action::Reorder, 2);
        let outcome = confirm_then_perform(&confirmer, &prompt, || async { 7 }).await;
        assert_eq!(outcome, Some(7));
        assert_eq!(asked.load(Ordering::SeqCst), 0);

        let approve = ConfirmPrompt::new(Action::Approve, 1);
        assert!(confirm_then_perform(&confirmer, &approve, || async {}).await.is_none());
        assert_eq!(asked.load(Ordering::SeqCst), 1);
    }
}
