//! Mutating actions and display helpers.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::model::ItemId;
use crate::view::{BadgeTone, StatusBadge};

/// Mutating operations a controller can request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Approve a pending item.
    Approve,
    /// Reject a pending item.
    Reject,
    /// Suspend an active item.
    Suspend,
    /// Reactivate a suspended item.
    Activate,
    /// Publish a draft.
    Publish,
    /// Mark as verified.
    Verify,
    /// Flag for review.
    Flag,
    /// Clear a review flag.
    Unflag,
    /// Move to the archive.
    Archive,
    /// Restore from the archive.
    Unarchive,
    /// Remove permanently.
    Delete,
    /// Create a copy.
    Duplicate,
    /// Change display order.
    Reorder,
    /// Apply field edits to many items.
    BulkEdit,
}

/// Broad classification of an [`Action`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionKind {
    /// Moves the item to another status.
    StatusTransition,
    /// Removes the item.
    Destructive,
    /// Changes structure without a status change.
    Structural,
}

impl Action {
    /// Every supported action.
    pub const ALL: [Self; 14] = [
        Self::Approve,
        Self::Reject,
        Self::Suspend,
        Self::Activate,
        Self::Publish,
        Self::Verify,
        Self::Flag,
        Self::Unflag,
        Self::Archive,
        Self::Unarchive,
        Self::Delete,
        Self::Duplicate,
        Self::Reorder,
        Self::BulkEdit,
    ];

    /// Wire name (`snake_case`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Suspend => "suspend",
            Self::Activate => "activate",
            Self::Publish => "publish",
            Self::Verify => "verify",
            Self::Flag => "flag",
            Self::Unflag => "unflag",
            Self::Archive => "archive",
            Self::Unarchive => "unarchive",
            Self::Delete => "delete",
            Self::Duplicate => "duplicate",
            Self::Reorder => "reorder",
            Self::BulkEdit => "bulk_edit",
        }
    }

    /// Classification used to pick the view patch.
    #[must_use]
    pub const fn kind(self) -> ActionKind {
        match self {
            Self::Delete => ActionKind::Destructive,
            Self::Duplicate | Self::Reorder | Self::BulkEdit => ActionKind::Structural,
            Self::Approve
            | Self::Reject
            | Self::Suspend
            | Self::Activate
            | Self::Publish
            | Self::Verify
            | Self::Flag
            | Self::Unflag
            | Self::Archive
            | Self::Unarchive => ActionKind::StatusTransition,
        }
    }

    /// Destructive and state-changing actions ask the user first.
    #[must_use]
    pub const fn requires_confirmation(self) -> bool {
        !matches!(self.kind(), ActionKind::Structural)
    }

    /// Status label an item carries after this action succeeds.
    #[must_use]
    pub const fn resulting_status(self) -> Option<&'static str> {
        match self {
            Self::Approve => Some("approved"),
            Self::Reject => Some("rejected"),
            Self::Suspend => Some("suspended"),
            Self::Activate | Self::Unarchive => Some("active"),
            Self::Publish => Some("published"),
            Self::Verify => Some("verified"),
            Self::Flag => Some("flagged"),
            Self::Unflag => Some("unflagged"),
            Self::Archive => Some("archived"),
            Self::Delete | Self::Duplicate | Self::Reorder | Self::BulkEdit => None,
        }
    }

    /// Default badge shown after a successful status transition.
    #[must_use]
    pub fn default_badge(self) -> Option<StatusBadge> {
        self.resulting_status().map(StatusBadge::for_status)
    }

    /// Present-tense verb used in confirmation prompts.
    #[must_use]
    pub const fn verb(self) -> &'static str {
        match self {
            Self::BulkEdit => "edit",
            other => other.as_str(),
        }
    }

    /// Fallback success message when the server sends none.
    #[must_use]
    pub fn success_message(self, count: usize) -> String {
        let noun = if count == 1 { "item" } else { "items" };
        match self.resulting_status() {
            Some(status) => format!("{count} {noun} {status}."),
            None => match self {
                Self::Delete => format!("{count} {noun} deleted."),
                Self::Duplicate => format!("{count} {noun} duplicated."),
                Self::Reorder => "Order updated.".to_string(),
                _ => format!("{count} {noun} updated."),
            },
        }
    }
}

impl Display for Action {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown action name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown action")]
pub struct UnknownAction {
    /// Input that failed to parse.
    pub value: String,
}

impl FromStr for Action {
    type Err = UnknownAction;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == normalized)
            .ok_or_else(|| UnknownAction {
                value: value.to_string(),
            })
    }
}

/// Items an action applies to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActionTarget {
    /// One row.
    Single(ItemId),
    /// A bulk selection snapshot.
    Many(Vec<ItemId>),
}

impl ActionTarget {
    /// Identifiers covered by the target.
    #[must_use]
    pub fn ids(&self) -> Vec<ItemId> {
        match self {
            Self::Single(id) => vec![id.clone()],
            Self::Many(ids) => ids.clone(),
        }
    }

    /// Number of targeted items.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Many(ids) => ids.len(),
        }
    }

    /// Whether the target covers nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Validated bulk submission: an action plus a non-empty id snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BulkActionRequest {
    action: Action,
    target_ids: Vec<ItemId>,
}

impl BulkActionRequest {
    /// Validate a bulk submission.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingAction`] when no action is chosen and
    /// [`ValidationError::EmptySelection`] when no ids are given.
    pub fn new(action: Option<Action>, target_ids: Vec<ItemId>) -> Result<Self, ValidationError> {
        let action = action.ok_or(ValidationError::MissingAction)?;
        if target_ids.is_empty() {
            return Err(ValidationError::EmptySelection);
        }
        Ok(Self { action, target_ids })
    }

    /// Chosen action.
    #[must_use]
    pub const fn action(&self) -> Action {
        self.action
    }

    /// Targeted ids.
    #[must_use]
    pub fn target_ids(&self) -> &[ItemId] {
        &self.target_ids
    }

    /// Consume into the gateway target.
    #[must_use]
    pub fn into_target(self) -> ActionTarget {
        ActionTarget::Many(self.target_ids)
    }
}

/// Badge tone for a known status label.
#[must_use]
pub fn tone_for_status(status: &str) -> BadgeTone {
    match status {
        "approved" | "active" | "published" | "verified" => BadgeTone::Success,
        "rejected" | "suspended" => BadgeTone::Danger,
        "flagged" | "pending" => BadgeTone::Warning,
        "draft" | "unflagged" => BadgeTone::Info,
        _ => BadgeTone::Neutral,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_wire_and_dashed_names() {
        assert_eq!("bulk-edit".parse::<Action>().unwrap(), Action::BulkEdit);
        assert_eq!(" Verify ".parse::<Action>().unwrap(), Action::Verify);
        assert!("launch".parse::<Action>().is_err());
        for action in Action::ALL {
            assert_eq!(action.as_str().parse::<Action>().unwrap(), action);
        }
    }

    #[test]
    fn structural_actions_skip_confirmation() {
        assert!(Action::Delete.requires_confirmation());
        assert!(Action::Approve.requires_confirmation());
        assert!(!Action::Duplicate.requires_confirmation());
        assert!(!Action::Reorder.requires_confirmation());
    }

    #[test]
    fn status_transitions_carry_badges() {
        let badge = Action::Verify.default_badge().unwrap();
        assert_eq!(badge.label, "verified");
        assert_eq!(badge.tone, BadgeTone::Success);
        assert!(Action::Delete.default_badge().is_none());
        assert_eq!(Action::Unarchive.resulting_status(), Some("active"));
    }

    #[test]
    fn bulk_request_requires_action_and_ids() {
        assert_eq!(
            BulkActionRequest::new(None, vec![ItemId::from(1)]),
            Err(ValidationError::MissingAction)
        );
        assert_eq!(
            BulkActionRequest::new(Some(Action::Delete), Vec::new()),
            Err(ValidationError::EmptySelection)
        );
        let request = BulkActionRequest::new(Some(Action::Publish), vec![ItemId::from(1)]).unwrap();
        assert_eq!(request.action(), Action::Publish);
        assert_eq!(request.into_target().len(), 1);
    }

    #[test]
    fn success_messages_pluralise() {
        assert_eq!(Action::Approve.success_message(1), "1 item approved.");
        assert_eq!(Action::Delete.success_message(3), "3 items deleted.");
        assert_eq!(Action::Reorder.success_message(2), "Order updated.");
    }
}
