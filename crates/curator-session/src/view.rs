//! The list view model: the single rendered state the session keeps consistent.
//!
//! # Design
//! - Rows keep their checkbox state here; [`crate::selection::SelectionStore`]
//!   mirrors it and is the only writer.
//! - Replacement is wholesale (search/filter), patches are per row (actions).
//! - Row lookups that miss are reported, never treated as errors.

use serde::Serialize;

use crate::action::tone_for_status;
use crate::model::{Entity, ItemId, ListFragment, Stats};

/// Visual tone of a status badge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeTone {
    /// Positive state.
    Success,
    /// Needs attention.
    Warning,
    /// Negative state.
    Danger,
    /// Informational state.
    Info,
    /// No particular meaning.
    Neutral,
}

impl BadgeTone {
    /// CSS-style class name for front ends.
    #[must_use]
    pub const fn class(self) -> &'static str {
        match self {
            Self::Success => "badge-success",
            Self::Warning => "badge-warning",
            Self::Danger => "badge-danger",
            Self::Info => "badge-info",
            Self::Neutral => "badge-neutral",
        }
    }
}

/// Status badge rendered in a row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StatusBadge {
    /// Text shown in the badge.
    pub label: String,
    /// Visual tone.
    pub tone: BadgeTone,
}

impl StatusBadge {
    /// Badge for a status label, with the tone derived from the label.
    #[must_use]
    pub fn for_status(status: &str) -> Self {
        Self {
            label: status.to_string(),
            tone: tone_for_status(status),
        }
    }
}

/// Where a row is in its confirm/perform cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionPhase {
    /// Nothing pending.
    #[default]
    Idle,
    /// Waiting for the user to confirm.
    Confirming,
    /// Request sent, awaiting the response.
    InFlight,
}

/// One rendered row.
#[derive(Clone, Debug, PartialEq)]
pub struct Row<T> {
    /// Row identifier.
    pub id: ItemId,
    /// Entity data; `None` for rows rendered from server markup.
    pub item: Option<T>,
    /// Checkbox state.
    pub checked: bool,
    /// Status badge, for status-bearing entities.
    pub badge: Option<StatusBadge>,
    /// Action cycle state.
    pub phase: ActionPhase,
}

impl<T: Entity> Row<T> {
    fn from_item(item: T) -> Self {
        Self {
            id: item.id(),
            badge: item.status().map(StatusBadge::for_status),
            item: Some(item),
            checked: false,
            phase: ActionPhase::Idle,
        }
    }
}

impl<T> Row<T> {
    const fn bare(id: ItemId) -> Self {
        Self {
            id,
            item: None,
            checked: false,
            badge: None,
            phase: ActionPhase::Idle,
        }
    }
}

/// List container state.
#[derive(Clone, Debug, PartialEq)]
pub struct ListView<T> {
    rows: Vec<Row<T>>,
    select_all: bool,
    stats: Stats,
    markup: Option<String>,
    revision: u64,
}

impl<T> Default for ListView<T> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            select_all: false,
            stats: Stats::default(),
            markup: None,
            revision: 0,
        }
    }
}

impl<T: Entity> ListView<T> {
    /// Replace every row with a fresh item list. Checkboxes start unchecked.
    pub fn replace_items(&mut self, items: Vec<T>) {
        self.rows = items.into_iter().map(Row::from_item).collect();
        self.markup = None;
        self.select_all = false;
        self.revision = self.revision.saturating_add(1);
    }
}

impl<T> ListView<T> {
    /// Replace the list container with server markup.
    pub fn replace_fragment(&mut self, fragment: ListFragment) {
        self.rows = fragment.row_ids.into_iter().map(Row::bare).collect();
        self.markup = Some(fragment.markup);
        self.select_all = false;
        if let Some(stats) = fragment.stats {
            self.stats = stats;
        }
        self.revision = self.revision.saturating_add(1);
    }

    /// Rendered rows in display order.
    #[must_use]
    pub fn rows(&self) -> &[Row<T>] {
        &self.rows
    }

    /// Look up a row.
    #[must_use]
    pub fn row(&self, id: &ItemId) -> Option<&Row<T>> {
        self.rows.iter().find(|row| &row.id == id)
    }

    pub(crate) fn row_mut(&mut self, id: &ItemId) -> Option<&mut Row<T>> {
        self.rows.iter_mut().find(|row| &row.id == id)
    }

    /// Whether a row is rendered.
    #[must_use]
    pub fn contains(&self, id: &ItemId) -> bool {
        self.row(id).is_some()
    }

    /// Rendered ids in display order.
    #[must_use]
    pub fn rendered_ids(&self) -> Vec<ItemId> {
        self.rows.iter().map(|row| row.id.clone()).collect()
    }

    /// Ids whose checkbox is checked.
    #[must_use]
    pub fn checked_ids(&self) -> Vec<ItemId> {
        self.rows
            .iter()
            .filter(|row| row.checked)
            .map(|row| row.id.clone())
            .collect()
    }

    /// Number of checked row checkboxes.
    #[must_use]
    pub fn checked_count(&self) -> usize {
        self.rows.iter().filter(|row| row.checked).count()
    }

    /// State of the "select all" checkbox.
    #[must_use]
    pub const fn select_all_checked(&self) -> bool {
        self.select_all
    }

    /// Current statistics.
    #[must_use]
    pub const fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Markup from the last filter response, if the list came from one.
    #[must_use]
    pub fn markup(&self) -> Option<&str> {
        self.markup.as_deref()
    }

    /// Bumped on every wholesale replacement.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    pub(crate) fn set_checked(&mut self, id: &ItemId, checked: bool) -> bool {
        match self.row_mut(id) {
            Some(row) => {
                row.checked = checked;
                true
            }
            None => false,
        }
    }

    pub(crate) fn set_select_all(&mut self, checked: bool) {
        self.select_all = checked;
    }

    /// Replace statistics.
    pub fn set_stats(&mut self, stats: Stats) {
        self.stats = stats;
    }

    /// Swap a row's status badge. Returns `false` when the row is gone.
    pub fn set_badge(&mut self, id: &ItemId, badge: StatusBadge) -> bool {
        match self.row_mut(id) {
            Some(row) => {
                row.badge = Some(badge);
                true
            }
            None => false,
        }
    }

    /// Remove a row. Returns the removed row, or `None` when already gone.
    pub fn remove_row(&mut self, id: &ItemId) -> Option<Row<T>> {
        let index = self.rows.iter().position(|row| &row.id == id)?;
        Some(self.rows.remove(index))
    }

    /// Update a row's action phase when the row still exists.
    pub fn set_phase(&mut self, id: &ItemId, phase: ActionPhase) {
        if let Some(row) = self.row_mut(id) {
            row.phase = phase;
        }
    }
}
