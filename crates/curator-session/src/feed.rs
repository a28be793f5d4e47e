//! Server-push event consumption.
//!
//! # Design
//! - One subscription per session; each event becomes a notification of the
//!   same kind and triggers a statistics refresh.
//! - Item errors are logged and skipped. A failed subscription or the end of
//!   the stream closes the feed; there is no reconnect.
//! - The consumer runs on its own task; [`FeedHandle`] aborts it on close or drop.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::context::SessionContext;
use crate::model::Entity;
use crate::stats::StatsRefresher;

/// Connection state of the feed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeedStatus {
    /// Subscription requested, not yet established.
    Connecting,
    /// Receiving events.
    Open,
    /// Ended, failed, or closed by the session.
    Closed,
}

/// Owner of a running feed task.
#[derive(Debug)]
pub struct FeedHandle {
    task: JoinHandle<()>,
    status: Arc<watch::Sender<FeedStatus>>,
    received: Arc<AtomicU64>,
}

impl FeedHandle {
    /// Current connection state.
    #[must_use]
    pub fn status(&self) -> FeedStatus {
        *self.status.borrow()
    }

    /// Follow connection state changes.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<FeedStatus> {
        self.status.subscribe()
    }

    /// Events delivered so far.
    #[must_use]
    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    /// Stop consuming events.
    pub fn close(&self) {
        self.task.abort();
        self.status.send_replace(FeedStatus::Closed);
    }
}

impl Drop for FeedHandle {
    fn drop(&mut self) {
        self.close();
    }
}

/// Realtime event consumer for one session.
pub struct RealtimeFeed<T, B> {
    ctx: Arc<SessionContext<T, B>>,
    stats: StatsRefresher<T, B>,
}

impl<T: Entity, B: Backend<T>> RealtimeFeed<T, B> {
    pub(crate) const fn new(ctx: Arc<SessionContext<T, B>>, stats: StatsRefresher<T, B>) -> Self {
        Self { ctx, stats }
    }

    /// Subscribe and start delivering events.
    #[must_use = "dropping the handle closes the feed"]
    pub fn open(&self) -> FeedHandle {
        let status = Arc::new(watch::Sender::new(FeedStatus::Connecting));
        let received = Arc::new(AtomicU64::new(0));
        let ctx = Arc::clone(&self.ctx);
        let stats = self.stats.clone();
        let task_status = Arc::clone(&status);
        let task_received = Arc::clone(&received);

        let task = tokio::spawn(async move {
            let mut events = match ctx.backend.event_stream().await {
                Ok(events) => events,
                Err(err) => {
                    warn!(error = %err, "realtime subscription failed");
                    task_status.send_replace(FeedStatus::Closed);
                    return;
                }
            };
            task_status.send_replace(FeedStatus::Open);
            info!(entity = %ctx.profile.entity, "realtime feed open");

            while let Some(item) = events.next().await {
                match item {
                    Ok(event) => {
                        task_received.fetch_add(1, Ordering::Relaxed);
                        debug!(kind = event.kind.as_str(), title = %event.title, "realtime event");
                        ctx.notices.push(event.kind, event.title, event.message);
                        stats.refresh_detached();
                    }
                    Err(err) => warn!(error = %err, "skipping realtime event"),
                }
            }

            info!(entity = %ctx.profile.entity, "realtime feed ended");
            task_status.send_replace(FeedStatus::Closed);
        });

        FeedHandle {
            task,
            status,
            received,
        }
    }
}
