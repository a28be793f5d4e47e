//! Debounced search and filter queries.
//!
//! # Design
//! - Text input is coalesced behind a quiet period; every keystroke cancels the
//!   pending timer. Empty input dispatches at once, very short terms never do.
//! - The timer only decides *when* to dispatch. The dispatch itself runs on its
//!   own task so a later keystroke cannot cancel a request already in flight.
//! - Search and filter share one ticket sequence; a response that is not newer
//!   than the last applied one is dropped.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::backend::{Backend, bounded};
use crate::context::SessionContext;
use crate::error::SessionError;
use crate::model::{Entity, ListFragment, ListQuery, SearchPage};
use crate::sequence::Ticket;

/// What [`DebouncedQueryChannel::input`] did with the text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputDecision {
    /// Sent immediately (empty term).
    Dispatched,
    /// Queued behind the quiet period.
    Scheduled,
    /// Too short to search; nothing queued.
    Suppressed,
}

/// Result of one dispatched query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueryOutcome {
    /// The response replaced the list.
    Applied(Ticket),
    /// A newer query superseded this one; the response was ignored.
    Stale(Ticket),
    /// The request failed; the list is unchanged.
    Failed(SessionError),
}

impl QueryOutcome {
    /// Whether the list was replaced.
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

#[derive(Clone, Copy, Debug)]
enum QueryPath {
    Search,
    Filter,
}

enum Landed<T> {
    Page(SearchPage<T>),
    Fragment(ListFragment),
}

/// Turns rapid input into at most one logically active query.
pub struct DebouncedQueryChannel<T, B> {
    ctx: Arc<SessionContext<T, B>>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl<T: Entity, B: Backend<T>> DebouncedQueryChannel<T, B> {
    pub(crate) const fn new(ctx: Arc<SessionContext<T, B>>) -> Self {
        Self {
            ctx,
            timer: Mutex::new(None),
        }
    }

    /// Record typed text and decide whether and when to search.
    pub fn input(&self, text: &str) -> InputDecision {
        self.cancel();
        let term = text.trim();
        let query = {
            let mut state = self.ctx.lock();
            state.pending.term = term.to_string();
            state.pending.clone()
        };

        let len = term.chars().count();
        if len == 0 {
            let ctx = Arc::clone(&self.ctx);
            tokio::spawn(async move {
                let _ = dispatch(&ctx, query, QueryPath::Search).await;
            });
            return InputDecision::Dispatched;
        }
        if len < self.ctx.config.min_term_len {
            debug!(len, "search term too short; not dispatching");
            return InputDecision::Suppressed;
        }

        let ctx = Arc::clone(&self.ctx);
        let delay = self.ctx.config.debounce;
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tokio::spawn(async move {
                let _ = dispatch(&ctx, query, QueryPath::Search).await;
            });
        });
        *self.timer_slot() = Some(timer);
        InputDecision::Scheduled
    }

    /// Dispatch the pending search now, skipping the quiet period.
    pub async fn search_now(&self) -> QueryOutcome {
        self.cancel();
        let query = self.pending();
        dispatch(&self.ctx, query, QueryPath::Search).await
    }

    /// Change one categorical filter (`None` clears it) and reload the list
    /// container.
    pub async fn change_filter(&self, key: &str, value: Option<String>) -> QueryOutcome {
        self.cancel();
        let query = {
            let mut state = self.ctx.lock();
            state.pending.set_filter(key, value);
            state.pending.clone()
        };
        dispatch(&self.ctx, query, QueryPath::Filter).await
    }

    /// Drop the pending debounce timer, if any.
    pub fn cancel(&self) {
        if let Some(timer) = self.timer_slot().take() {
            timer.abort();
        }
    }

    /// Query that the next dispatch would send.
    #[must_use]
    pub fn pending(&self) -> ListQuery {
        self.ctx.lock().pending.clone()
    }

    fn timer_slot(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.timer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T, B> Drop for DebouncedQueryChannel<T, B> {
    fn drop(&mut self) {
        if let Some(timer) = self
            .timer
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            timer.abort();
        }
    }
}

async fn dispatch<T, B>(ctx: &SessionContext<T, B>, query: ListQuery, path: QueryPath) -> QueryOutcome
where
    T: Entity,
    B: Backend<T>,
{
    let ticket = ctx.lock().queries.issue();
    debug!(ticket = ticket.get(), ?path, term = %query.term, filters = query.filters.len(), "dispatching query");

    let _busy = ctx.busy.acquire();
    let limit = ctx.config.request_timeout;
    let result = match path {
        QueryPath::Search => bounded(limit, ctx.backend.search(&query))
            .await
            .map(Landed::Page),
        QueryPath::Filter => bounded(limit, ctx.backend.filter(&query))
            .await
            .map(Landed::Fragment),
    };

    match result {
        Ok(landed) => {
            let mut state = ctx.lock();
            if !state.queries.admit(ticket) {
                drop(state);
                debug!(ticket = ticket.get(), "discarding stale query response");
                return QueryOutcome::Stale(ticket);
            }
            match landed {
                Landed::Page(page) => {
                    state.replace_items(page.items);
                    state.view.set_stats(page.stats);
                }
                Landed::Fragment(fragment) => state.replace_fragment(fragment),
            }
            QueryOutcome::Applied(ticket)
        }
        Err(err) => {
            if ctx.lock().queries.is_superseded(ticket) {
                debug!(ticket = ticket.get(), error = %err, "ignoring failure of superseded query");
                return QueryOutcome::Stale(ticket);
            }
            let err = SessionError::from(err);
            warn!(ticket = ticket.get(), error = %err, "query failed");
            ctx.notify_failure(&err);
            QueryOutcome::Failed(err)
        }
    }
}
