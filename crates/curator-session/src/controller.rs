//! Per-page session object composing selection, queries, actions, statistics,
//! and the realtime feed.
//!
//! # Design
//! - One controller per view; every component shares an `Arc`'d context, there
//!   is no global state.
//! - Page state sits behind a single lock that is never held across `.await`.
//!   Tickets, not locks, keep overlapping responses in order.
//! - [`SessionController::shutdown`] (also run on drop) stops the feed, the
//!   poller, the debounce timer, and pending notification timers.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, info};

use crate::action::{Action, ActionTarget};
use crate::backend::{Backend, bounded};
use crate::busy::BusyGate;
use crate::config::{ConfigError, EntityProfile, SessionConfig};
use crate::confirm::{Confirm, ConfirmPrompt, confirm_then_perform};
use crate::context::SessionContext;
use crate::error::{SessionError, SessionResult};
use crate::feed::{FeedHandle, FeedStatus, RealtimeFeed};
use crate::gateway::{ActionGateway, ActionReceipt};
use crate::model::{Entity, ItemId, ListQuery, SearchPage, Stats};
use crate::notify::{NoticeId, Notification};
use crate::patcher::{OptimisticViewPatcher, PatchReport};
use crate::query::{DebouncedQueryChannel, InputDecision, QueryOutcome};
use crate::selection::BulkButton;
use crate::sequence::Ticket;
use crate::stats::StatsRefresher;
use crate::view::{ActionPhase, Row};

/// Result of a confirm-then-perform cycle.
#[derive(Clone, Debug, PartialEq)]
pub enum ActOutcome {
    /// The user declined; nothing was sent.
    Declined,
    /// The server accepted the action and the view was patched.
    Completed {
        /// Server response.
        receipt: ActionReceipt,
        /// View changes.
        report: PatchReport,
    },
}

/// Point-in-time copy of everything a front end renders.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewSnapshot<T> {
    /// Rendered rows in display order.
    pub rows: Vec<Row<T>>,
    /// Select-all checkbox state.
    pub select_all: bool,
    /// Selected identifiers, sorted.
    pub selection: Vec<ItemId>,
    /// Bulk button label and state.
    pub bulk_button: BulkButton,
    /// Latest statistics.
    pub stats: Stats,
    /// List container markup, when the list came from the filter path.
    pub markup: Option<String>,
    /// Increments on every list replacement.
    pub revision: u64,
    /// Loading overlays on screen (0 or 1).
    pub overlay_instances: usize,
    /// Visible notifications, oldest first.
    pub notifications: Vec<Notification>,
}

#[derive(Default)]
struct Lifecycle {
    feed: Option<FeedHandle>,
    poller: Option<JoinHandle<()>>,
}

/// Resource session controller for one entity list.
pub struct SessionController<T: Entity, B: Backend<T>> {
    ctx: Arc<SessionContext<T, B>>,
    query: DebouncedQueryChannel<T, B>,
    gateway: ActionGateway<T, B>,
    patcher: OptimisticViewPatcher<T, B>,
    stats: StatsRefresher<T, B>,
    feed: RealtimeFeed<T, B>,
    confirmer: Box<dyn Confirm>,
    lifecycle: Mutex<Lifecycle>,
}

impl<T: Entity, B: Backend<T>> SessionController<T, B> {
    /// Build a session. Nothing runs until [`Self::start`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when `config` or `profile` is invalid.
    pub fn new(
        backend: B,
        confirmer: impl Confirm + 'static,
        profile: EntityProfile,
        config: SessionConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        profile.validate()?;
        let ctx = Arc::new(SessionContext::new(Arc::new(backend), profile, config));
        let stats = StatsRefresher::new(Arc::clone(&ctx));
        Ok(Self {
            query: DebouncedQueryChannel::new(Arc::clone(&ctx)),
            gateway: ActionGateway::new(Arc::clone(&ctx)),
            patcher: OptimisticViewPatcher::new(Arc::clone(&ctx), stats.clone()),
            feed: RealtimeFeed::new(Arc::clone(&ctx), stats.clone()),
            stats,
            confirmer: Box::new(confirmer),
            lifecycle: Mutex::new(Lifecycle::default()),
            ctx,
        })
    }

    /// Open the realtime feed and start the statistics poller. Idempotent.
    pub fn start(&self) {
        let mut lifecycle = self.lifecycle();
        if lifecycle.feed.is_none() {
            lifecycle.feed = Some(self.feed.open());
        }
        if lifecycle.poller.is_none() {
            lifecycle.poller = Some(self.stats.spawn_poller());
        }
        info!(entity = %self.ctx.profile.entity, "session started");
    }

    /// Stop background work and clear transient state.
    pub fn shutdown(&self) {
        self.query.cancel();
        let mut lifecycle = self.lifecycle();
        if let Some(feed) = lifecycle.feed.take() {
            feed.close();
        }
        if let Some(poller) = lifecycle.poller.take() {
            poller.abort();
        }
        drop(lifecycle);
        self.ctx.notices.clear();
        {
            let mut state = self.ctx.lock();
            let state = &mut *state;
            state.selection.reset(&mut state.view);
        }
        debug!(entity = %self.ctx.profile.entity, "session shut down");
    }

    /// Seed the list with the initial page render.
    pub fn mount(&self, page: SearchPage<T>) {
        let mut state = self.ctx.lock();
        state.replace_items(page.items);
        state.view.set_stats(page.stats);
    }

    // Selection

    /// Check one rendered row. Returns `false` for ids not on screen.
    pub fn select(&self, id: &ItemId) -> bool {
        let mut state = self.ctx.lock();
        let state = &mut *state;
        state.selection.select(&mut state.view, id)
    }

    /// Uncheck one row.
    pub fn deselect(&self, id: &ItemId) -> bool {
        let mut state = self.ctx.lock();
        let state = &mut *state;
        state.selection.deselect(&mut state.view, id)
    }

    /// Check every listed row that is rendered.
    pub fn select_all(&self, ids: &[ItemId]) {
        let mut state = self.ctx.lock();
        let state = &mut *state;
        state.selection.select_all(&mut state.view, ids);
    }

    /// Check every rendered row.
    pub fn select_visible(&self) {
        let mut state = self.ctx.lock();
        let state = &mut *state;
        let rendered = state.view.rendered_ids();
        state.selection.select_all(&mut state.view, &rendered);
    }

    /// Uncheck everything.
    pub fn deselect_all(&self) {
        let mut state = self.ctx.lock();
        let state = &mut *state;
        state.selection.deselect_all(&mut state.view);
    }

    /// Select-all checkbox handler.
    pub fn toggle_all(&self, checked: bool, ids: &[ItemId]) {
        let mut state = self.ctx.lock();
        let state = &mut *state;
        let stale = state.selection.toggle_all(&mut state.view, checked, ids);
        if stale > 0 {
            debug!(stale, "select-all ignored ids that are no longer rendered");
        }
    }

    /// Number of selected rows.
    #[must_use]
    pub fn selection_size(&self) -> usize {
        self.ctx.lock().selection.size()
    }

    /// Selected ids, sorted.
    #[must_use]
    pub fn selection(&self) -> Vec<ItemId> {
        self.ctx.lock().selection.snapshot()
    }

    // Queries

    /// Typed search text.
    pub fn search_input(&self, text: &str) -> InputDecision {
        self.query.input(text)
    }

    /// Submit the pending search immediately.
    pub async fn search_now(&self) -> QueryOutcome {
        self.query.search_now().await
    }

    /// Change one filter and reload the list container.
    pub async fn change_filter(&self, key: &str, value: Option<String>) -> QueryOutcome {
        self.query.change_filter(key, value).await
    }

    /// Query the next dispatch would send.
    #[must_use]
    pub fn pending_query(&self) -> ListQuery {
        self.query.pending()
    }

    // Actions

    /// Confirm-then-perform one action on one row.
    ///
    /// # Errors
    ///
    /// Propagates [`ActionGateway::perform`] failures; the row keeps its
    /// pre-action state.
    pub async fn act(&self, id: &ItemId, action: Action) -> SessionResult<ActOutcome> {
        let prompt = ConfirmPrompt::new(action, 1);
        if prompt.required() {
            self.ctx.lock().view.set_phase(id, ActionPhase::Confirming);
        }
        let outcome = confirm_then_perform(self.confirmer.as_ref(), &prompt, || async {
            let ticket = {
                let mut state = self.ctx.lock();
                state.view.set_phase(id, ActionPhase::InFlight);
                state.rows.issue()
            };
            let result = self.gateway.perform(action, ActionTarget::Single(id.clone())).await;
            (ticket, result)
        })
        .await;
        self.ctx.lock().view.set_phase(id, ActionPhase::Idle);

        let Some((ticket, result)) = outcome else {
            debug!(action = %action, id = %id, "action declined");
            return Ok(ActOutcome::Declined);
        };
        let receipt = result?;
        let report = self.patcher.apply(action, &[(id.clone(), ticket)]);
        Ok(ActOutcome::Completed { receipt, report })
    }

    /// Confirm-then-perform `action` on the current selection in one request.
    ///
    /// The selection is cleared after the server accepts the action.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Validation`] without a request when no action is
    /// chosen or nothing is selected; otherwise propagates gateway failures.
    pub async fn run_bulk(&self, action: Option<Action>) -> SessionResult<ActOutcome> {
        let snapshot = self.selection();
        let request = self.gateway.validate_bulk(action, snapshot)?;
        let action = request.action();
        let prompt = ConfirmPrompt::new(action, request.target_ids().len());

        let outcome = confirm_then_perform(self.confirmer.as_ref(), &prompt, || async {
            let ids = request.target_ids().to_vec();
            let tickets: Vec<(ItemId, Ticket)> = {
                let mut state = self.ctx.lock();
                ids.iter()
                    .map(|id| {
                        state.view.set_phase(id, ActionPhase::InFlight);
                        (id.clone(), state.rows.issue())
                    })
                    .collect()
            };
            let result = self.gateway.perform(action, ActionTarget::Many(ids)).await;
            (tickets, result)
        })
        .await;

        let Some((tickets, result)) = outcome else {
            debug!(action = %action, "bulk action declined");
            return Ok(ActOutcome::Declined);
        };
        {
            let mut state = self.ctx.lock();
            for (id, _) in &tickets {
                state.view.set_phase(id, ActionPhase::Idle);
            }
        }
        let receipt = result?;
        let report = self.patcher.apply(action, &tickets);
        self.deselect_all();
        Ok(ActOutcome::Completed { receipt, report })
    }

    /// Fetch one item from the server.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Network`] when the request fails.
    pub async fn view_item(&self, id: &ItemId) -> SessionResult<T> {
        let _busy = self.ctx.busy.acquire();
        bounded(self.ctx.config.request_timeout, self.ctx.backend.view(id))
            .await
            .map_err(|err| {
                let err = SessionError::from(err);
                self.ctx.notify_failure(&err);
                err
            })
    }

    /// Refresh statistics now.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Network`] when the request fails.
    pub async fn refresh_stats(&self) -> SessionResult<bool> {
        self.stats.refresh().await
    }

    // Observation

    /// Copy of the current view.
    #[must_use]
    pub fn snapshot(&self) -> ViewSnapshot<T> {
        let state = self.ctx.lock();
        ViewSnapshot {
            rows: state.view.rows().to_vec(),
            select_all: state.view.select_all_checked(),
            selection: state.selection.snapshot(),
            bulk_button: state.selection.bulk_button(),
            stats: state.view.stats().clone(),
            markup: state.view.markup().map(str::to_string),
            revision: state.view.revision(),
            overlay_instances: self.ctx.busy.overlay_instances(),
            notifications: self.ctx.notices.active(),
        }
    }

    /// Visible notifications.
    #[must_use]
    pub fn notifications(&self) -> Vec<Notification> {
        self.ctx.notices.active()
    }

    /// Follow notifications as they are raised.
    #[must_use]
    pub fn notification_stream(&self) -> BroadcastStream<Notification> {
        self.ctx.notices.stream()
    }

    /// Dismiss a notification.
    pub fn dismiss(&self, id: NoticeId) -> bool {
        self.ctx.notices.dismiss(id)
    }

    /// Shared loading indicator.
    #[must_use]
    pub fn busy(&self) -> &BusyGate {
        &self.ctx.busy
    }

    /// Realtime feed state, when started.
    #[must_use]
    pub fn feed_status(&self) -> Option<FeedStatus> {
        self.lifecycle().feed.as_ref().map(FeedHandle::status)
    }

    /// Session configuration.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.ctx.config
    }

    /// Entity profile.
    #[must_use]
    pub fn profile(&self) -> &EntityProfile {
        &self.ctx.profile
    }

    fn lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Entity, B: Backend<T>> Drop for SessionController<T, B> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
