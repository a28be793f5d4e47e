//! Server interface consumed by a session.
//!
//! Implementations own transport, routes, and authentication; the session only
//! sees typed results and [`BackendError`].

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::action::Action;
use crate::error::BackendError;
use crate::model::{Entity, ItemId, ListFragment, ListQuery, RealtimeEvent, Reply, SearchPage, Stats};

/// Server-push event stream. Item errors are reported and skipped by the feed.
pub type EventStream = BoxStream<'static, Result<RealtimeEvent, BackendError>>;

/// Black-box backend for one entity type.
#[async_trait]
pub trait Backend<T: Entity>: Send + Sync + 'static {
    /// Run a text search; returns matching rows and fresh statistics.
    async fn search(&self, query: &ListQuery) -> Result<SearchPage<T>, BackendError>;

    /// Fetch the list container markup for a filter change.
    async fn filter(&self, query: &ListQuery) -> Result<ListFragment, BackendError>;

    /// Run an action against one item.
    async fn perform_action(&self, id: &ItemId, action: Action) -> Result<Reply, BackendError>;

    /// Run an action against many items in one request.
    async fn bulk_action(&self, ids: &[ItemId], action: Action) -> Result<Reply, BackendError>;

    /// Fetch aggregate statistics.
    async fn statistics(&self) -> Result<Stats, BackendError>;

    /// Fetch one item.
    async fn view(&self, id: &ItemId) -> Result<T, BackendError>;

    /// Open the server-push event subscription.
    async fn event_stream(&self) -> Result<EventStream, BackendError>;
}

/// Run a backend call with an upper time bound.
pub(crate) async fn bounded<F, R>(limit: Duration, call: F) -> Result<R, BackendError>
where
    F: Future<Output = Result<R, BackendError>>,
{
    tokio::time::timeout(limit, call)
        .await
        .unwrap_or_else(|_| {
            Err(BackendError::Timeout {
                after_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
            })
        })
}
