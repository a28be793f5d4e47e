//! Bulk-selection state and its checkbox mirror.
//!
//! # Design
//! - The set and the row checkboxes are written together so that
//!   `size() == view.checked_count()` after every call.
//! - Membership is always derived from the rows currently rendered; ids that are
//!   not on screen are ignored rather than remembered.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::model::ItemId;
use crate::view::ListView;

/// Default bulk button label; `{count}` is replaced with the selection size.
pub const DEFAULT_BULK_LABEL: &str = "Run ({count} items)";

/// Bulk-action button state derived from the selection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BulkButton {
    /// Rendered label.
    pub label: String,
    /// Disabled iff nothing is selected.
    pub enabled: bool,
}

/// Set of selected row ids, kept in sync with row checkboxes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectionStore {
    selected: BTreeSet<ItemId>,
    label_template: String,
}

impl Default for SelectionStore {
    fn default() -> Self {
        Self::new(DEFAULT_BULK_LABEL)
    }
}

impl SelectionStore {
    /// Empty selection with a custom bulk label template.
    #[must_use]
    pub fn new(label_template: impl Into<String>) -> Self {
        Self {
            selected: BTreeSet::new(),
            label_template: label_template.into(),
        }
    }

    /// Check one row. Returns `false` when the row is not rendered.
    pub fn select<T>(&mut self, view: &mut ListView<T>, id: &ItemId) -> bool {
        if !view.set_checked(id, true) {
            return false;
        }
        self.selected.insert(id.clone());
        Self::sync_select_all(view);
        true
    }

    /// Uncheck one row. Returns `false` when it was not selected.
    pub fn deselect<T>(&mut self, view: &mut ListView<T>, id: &ItemId) -> bool {
        view.set_checked(id, false);
        let removed = self.selected.remove(id);
        Self::sync_select_all(view);
        removed
    }

    /// Check every listed row that is currently rendered.
    pub fn select_all<T>(&mut self, view: &mut ListView<T>, ids: &[ItemId]) {
        for id in ids {
            if view.set_checked(id, true) {
                self.selected.insert(id.clone());
            }
        }
        Self::sync_select_all(view);
    }

    /// Uncheck everything.
    pub fn deselect_all<T>(&mut self, view: &mut ListView<T>) {
        for id in std::mem::take(&mut self.selected) {
            view.set_checked(&id, false);
        }
        Self::sync_select_all(view);
    }

    /// Handle the "select all" checkbox.
    ///
    /// Membership is re-derived from the rows rendered right now. `ids` is what
    /// the caller last believed was on screen; it never adds or keeps a row.
    /// Returns how many of those ids are no longer rendered.
    pub fn toggle_all<T>(
        &mut self,
        view: &mut ListView<T>,
        checked: bool,
        ids: &[ItemId],
    ) -> usize {
        let rendered: BTreeSet<ItemId> = view.rendered_ids().into_iter().collect();
        for id in &rendered {
            view.set_checked(id, checked);
            if checked {
                self.selected.insert(id.clone());
            } else {
                self.selected.remove(id);
            }
        }
        Self::sync_select_all(view);
        ids.iter().filter(|id| !rendered.contains(*id)).count()
    }

    /// Forget everything after the list was replaced wholesale.
    pub fn reset<T>(&mut self, view: &mut ListView<T>) {
        self.selected.clear();
        for id in view.checked_ids() {
            view.set_checked(&id, false);
        }
        view.set_select_all(false);
    }

    /// Forget one id whose row was removed.
    pub fn forget<T>(&mut self, view: &mut ListView<T>, id: &ItemId) {
        self.selected.remove(id);
        Self::sync_select_all(view);
    }

    /// Number of selected rows.
    #[must_use]
    pub fn size(&self) -> usize {
        self.selected.len()
    }

    /// Whether a row is selected.
    #[must_use]
    pub fn contains(&self, id: &ItemId) -> bool {
        self.selected.contains(id)
    }

    /// Selected ids in sorted order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ItemId> {
        self.selected.iter().cloned().collect()
    }

    /// Bulk button label and enabled state.
    #[must_use]
    pub fn bulk_button(&self) -> BulkButton {
        let count = self.size();
        BulkButton {
            label: self.label_template.replace("{count}", &count.to_string()),
            enabled: count > 0,
        }
    }

    fn sync_select_all<T>(view: &mut ListView<T>) {
        let rows = view.rows();
        let all = !rows.is_empty() && rows.iter().all(|row| row.checked);
        view.set_select_all(all);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Record;
    use serde_json::json;

    fn view_with(ids: &[u64]) -> ListView<Record> {
        let mut view = ListView::default();
        view.replace_items(
            ids.iter()
                .map(|id| serde_json::from_value(json!({"id": id})).unwrap())
                .collect(),
        );
        view
    }

    fn ids(raw: &[u64]) -> Vec<ItemId> {
        raw.iter().copied().map(ItemId::from).collect()
    }

    #[test]
    fn toggle_all_then_deselect_unchecks_master() {
        let mut view = view_with(&[1, 2, 3]);
        let mut store = SelectionStore::default();

        store.toggle_all(&mut view, true, &ids(&[1, 2, 3]));
        assert!(view.select_all_checked());
        store.deselect(&mut view, &ItemId::from(2));

        assert_eq!(store.snapshot(), ids(&[1, 3]));
        assert!(!view.select_all_checked());
        assert_eq!(store.size(), view.checked_count());
    }

    #[test]
    fn toggle_all_ignores_rows_no_longer_rendered() {
        let mut view = view_with(&[1, 2]);
        let mut store = SelectionStore::default();

        let stale = store.toggle_all(&mut view, true, &ids(&[1, 2, 3]));
        assert_eq!(stale, 1);
        assert_eq!(store.snapshot(), ids(&[1, 2]));
        assert_eq!(store.size(), view.checked_count());
    }

    #[test]
    fn select_rejects_unknown_rows() {
        let mut view = view_with(&[1]);
        let mut store = SelectionStore::default();
        assert!(!store.select(&mut view, &ItemId::from(9)));
        assert_eq!(store.size(), 0);
    }

    #[test]
    fn bulk_button_tracks_size() {
        let mut view = view_with(&[1, 2]);
        let mut store = SelectionStore::default();
        assert_eq!(
            store.bulk_button(),
            BulkButton {
                label: "Run (0 items)".into(),
                enabled: false
            }
        );
        store.select(&mut view, &ItemId::from(2));
        let button = store.bulk_button();
        assert_eq!(button.label, "Run (1 items)");
        assert!(button.enabled);
    }

    #[test]
    fn deselect_all_and_reset_clear_checkboxes() {
        let mut view = view_with(&[1, 2, 3]);
        let mut store = SelectionStore::default();
        let rendered = view.rendered_ids();
        store.select_all(&mut view, &rendered);
        store.deselect_all(&mut view);
        assert_eq!(view.checked_count(), 0);
        assert!(!view.select_all_checked());

        store.select(&mut view, &ItemId::from(1));
        store.reset(&mut view);
        assert_eq!(store.size(), 0);
        assert_eq!(view.checked_count(), 0);
    }

    #[test]
    fn toggle_all_includes_rows_rendered_after_the_callers_list() {
        let mut view = view_with(&[1, 2, 3, 4]);
        let mut store = SelectionStore::default();

        let stale = store.toggle_all(&mut view, true, &ids(&[1, 2, 3]));
        assert_eq!(stale, 0);
        assert_eq!(store.snapshot(), ids(&[1, 2, 3, 4]));
        assert_eq!(view.checked_count(), 4);
        assert!(view.select_all_checked());

        store.toggle_all(&mut view, false, &ids(&[1]));
        assert_eq!(store.size(), 0);
        assert_eq!(view.checked_count(), 0);
        assert!(!view.select_all_checked());
    }

    #[test]
    fn empty_list_never_shows_select_all() {
        let mut view = view_with(&[]);
        let mut store = SelectionStore::default();
        store.toggle_all(&mut view, true, &[]);
        assert!(!view.select_all_checked());
    }
}
