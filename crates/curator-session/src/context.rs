//! Per-session shared context handed to every component.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::busy::BusyGate;
use crate::config::{EntityProfile, SessionConfig};
use crate::error::SessionError;
use crate::model::{Entity, ItemId, ListFragment, ListQuery, NoticeKind};
use crate::notify::NotificationCenter;
use crate::selection::SelectionStore;
use crate::sequence::{RowSequencer, Sequencer};
use crate::view::ListView;

/// Everything guarded by the session lock. The lock is never held across `.await`.
#[derive(Debug)]
pub(crate) struct PageState<T> {
    pub(crate) view: ListView<T>,
    pub(crate) selection: SelectionStore,
    pub(crate) queries: Sequencer,
    pub(crate) stats: Sequencer,
    pub(crate) rows: RowSequencer,
    pub(crate) pending: ListQuery,
}

impl<T: Entity> PageState<T> {
    fn new(profile: &EntityProfile) -> Self {
        Self {
            view: ListView::default(),
            selection: SelectionStore::new(profile.bulk_label.clone()),
            queries: Sequencer::default(),
            stats: Sequencer::default(),
            rows: RowSequencer::default(),
            pending: ListQuery::default(),
        }
    }

    pub(crate) fn replace_items(&mut self, items: Vec<T>) {
        self.view.replace_items(items);
        self.after_replace();
    }
}

impl<T> PageState<T> {
    pub(crate) fn replace_fragment(&mut self, fragment: ListFragment) {
        self.view.replace_fragment(fragment);
        self.after_replace();
    }

    pub(crate) fn remove_row(&mut self, id: &ItemId) -> bool {
        let removed = self.view.remove_row(id).is_some();
        self.selection.forget(&mut self.view, id);
        removed
    }

    fn after_replace(&mut self) {
        self.selection.reset(&mut self.view);
        self.rows.clear();
    }
}

/// Shared session context: backend, state, and the cross-cutting services.
pub(crate) struct SessionContext<T, B> {
    pub(crate) backend: Arc<B>,
    state: Mutex<PageState<T>>,
    pub(crate) busy: BusyGate,
    pub(crate) notices: NotificationCenter,
    pub(crate) config: SessionConfig,
    pub(crate) profile: EntityProfile,
}

impl<T: Entity, B> SessionContext<T, B> {
    pub(crate) fn new(backend: Arc<B>, profile: EntityProfile, config: SessionConfig) -> Self {
        Self {
            backend,
            state: Mutex::new(PageState::new(&profile)),
            busy: BusyGate::new(),
            notices: NotificationCenter::new(config.notice_window),
            config,
            profile,
        }
    }
}

impl<T, B> SessionContext<T, B> {
    pub(crate) fn lock(&self) -> MutexGuard<'_, PageState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Surface a failure: warnings for validation, errors otherwise.
    pub(crate) fn notify_failure(&self, err: &SessionError) {
        let kind = if err.is_validation() {
            NoticeKind::Warning
        } else {
            NoticeKind::Error
        };
        let message = err.user_message(&self.config.fallback_error);
        debug!(entity = %self.profile.entity, kind = kind.as_str(), "surfacing failure");
        self.notices.push(kind, "", message);
    }
}
