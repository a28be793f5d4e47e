//! Statistics refresh: on demand, detached, and on a fixed poll period.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::backend::{Backend, bounded};
use crate::context::SessionContext;
use crate::error::SessionError;
use crate::model::Entity;

/// Fetches aggregate statistics and applies them in issue order.
pub struct StatsRefresher<T, B> {
    ctx: Arc<SessionContext<T, B>>,
}

impl<T, B> Clone for StatsRefresher<T, B> {
    fn clone(&self) -> Self {
        Self {
            ctx: Arc::clone(&self.ctx),
        }
    }
}

impl<T: Entity, B: Backend<T>> StatsRefresher<T, B> {
    pub(crate) const fn new(ctx: Arc<SessionContext<T, B>>) -> Self {
        Self { ctx }
    }

    /// Fetch statistics now. Returns `true` when the response was applied and
    /// `false` when a newer response had already landed.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Network`] when the request fails or times out.
    pub async fn refresh(&self) -> Result<bool, SessionError> {
        let ticket = self.ctx.lock().stats.issue();
        let result = bounded(self.ctx.config.request_timeout, self.ctx.backend.statistics()).await;
        match result {
            Ok(stats) => {
                let mut state = self.ctx.lock();
                if !state.stats.admit(ticket) {
                    drop(state);
                    debug!(ticket = ticket.get(), "discarding stale statistics");
                    return Ok(false);
                }
                state.view.set_stats(stats);
                Ok(true)
            }
            Err(err) => {
                warn!(ticket = ticket.get(), error = %err, "statistics refresh failed");
                Err(err.into())
            }
        }
    }

    /// Refresh in the background; failures are only logged.
    pub fn refresh_detached(&self) -> JoinHandle<()> {
        let refresher = self.clone();
        tokio::spawn(async move {
            let _ = refresher.refresh().await;
        })
    }

    /// Poll every `stats_interval`, starting one period from now.
    pub(crate) fn spawn_poller(&self) -> JoinHandle<()> {
        let refresher = self.clone();
        let period = self.ctx.config.stats_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let _ = refresher.refresh().await;
            }
        })
    }
}
