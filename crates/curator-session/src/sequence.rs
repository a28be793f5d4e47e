//! Monotonic tickets used to drop responses that arrive out of order.
//!
//! A ticket is issued before a request leaves and checked when its response is
//! applied. Both steps run under the session state lock, so issue order is apply
//! order regardless of network timing.

use std::collections::HashMap;

use crate::model::ItemId;

/// Sequence number assigned to one dispatched request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    /// Raw sequence number.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Single-stream sequencer (query and statistics paths).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Sequencer {
    last_issued: u64,
    last_applied: u64,
}

impl Sequencer {
    /// Issue the next ticket.
    pub const fn issue(&mut self) -> Ticket {
        self.last_issued = self.last_issued.saturating_add(1);
        Ticket(self.last_issued)
    }

    /// Accept a response if it is newer than the last applied one.
    pub const fn admit(&mut self, ticket: Ticket) -> bool {
        if ticket.0 > self.last_applied {
            self.last_applied = ticket.0;
            true
        } else {
            false
        }
    }

    /// Whether a newer ticket has been issued since `ticket`.
    #[must_use]
    pub const fn is_superseded(&self, ticket: Ticket) -> bool {
        self.last_issued > ticket.0
    }

    /// Last ticket whose response was applied.
    #[must_use]
    pub const fn last_applied(&self) -> u64 {
        self.last_applied
    }
}

/// Per-row sequencer for action patches.
///
/// Tickets are drawn from one global counter so ordering holds across rows and
/// bulk submissions; staleness is judged per row.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RowSequencer {
    next: u64,
    applied: HashMap<ItemId, u64>,
}

impl RowSequencer {
    /// Issue a ticket for a confirmed action on a row.
    pub fn issue(&mut self) -> Ticket {
        self.next = self.next.saturating_add(1);
        Ticket(self.next)
    }

    /// Accept a patch for `id` if it is newer than the last one applied to that row.
    pub fn admit(&mut self, id: &ItemId, ticket: Ticket) -> bool {
        let last = self.applied.get(id).copied().unwrap_or(0);
        if ticket.0 > last {
            self.applied.insert(id.clone(), ticket.0);
            true
        } else {
            false
        }
    }

    /// Drop bookkeeping for rows that no longer exist.
    pub fn clear(&mut self) {
        self.applied.clear();
    }
}
