//! Minimal view deltas after a successful action.

use std::sync::Arc;

use tracing::debug;

use crate::action::{Action, ActionKind};
use crate::backend::Backend;
use crate::context::SessionContext;
use crate::model::{Entity, ItemId};
use crate::sequence::Ticket;
use crate::stats::StatsRefresher;

/// What a patch did to each targeted row.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PatchReport {
    /// Rows whose badge changed or that were removed.
    pub patched: Vec<ItemId>,
    /// Targets with no rendered row.
    pub missing: Vec<ItemId>,
    /// Targets whose row already reflects a later action.
    pub stale: Vec<ItemId>,
}

/// Applies the view change implied by an action without reloading the list.
pub struct OptimisticViewPatcher<T, B> {
    ctx: Arc<SessionContext<T, B>>,
    stats: StatsRefresher<T, B>,
}

impl<T: Entity, B: Backend<T>> OptimisticViewPatcher<T, B> {
    pub(crate) const fn new(ctx: Arc<SessionContext<T, B>>, stats: StatsRefresher<T, B>) -> Self {
        Self { ctx, stats }
    }

    /// Patch each `(id, ticket)` pair, then refresh statistics in the background.
    pub fn apply(&self, action: Action, targets: &[(ItemId, Ticket)]) -> PatchReport {
        let badge = self.ctx.profile.badge_for(action);
        let kind = action.kind();
        let mut report = PatchReport::default();
        {
            let mut state = self.ctx.lock();
            for (id, ticket) in targets {
                if !state.view.contains(id) {
                    report.missing.push(id.clone());
                    continue;
                }
                if kind == ActionKind::Structural {
                    continue;
                }
                if !state.rows.admit(id, *ticket) {
                    report.stale.push(id.clone());
                    continue;
                }
                let changed = match (kind, &badge) {
                    (ActionKind::Destructive, _) => state.remove_row(id),
                    (ActionKind::StatusTransition, Some(badge)) => state.view.set_badge(id, badge.clone()),
                    _ => false,
                };
                if changed {
                    report.patched.push(id.clone());
                }
            }
        }
        debug!(
            action = %action,
            patched = report.patched.len(),
            missing = report.missing.len(),
            stale = report.stale.len(),
            "view patched"
        );
        self.stats.refresh_detached();
        report
    }
}
