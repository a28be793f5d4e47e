//! Shared loading indicator.
//!
//! # Design
//! - Reference counted: each in-flight operation holds a [`BusyGuard`]; the
//!   overlay is visible while at least one guard is alive.
//! - Release happens in `Drop`, so early returns, errors, timeouts, and task
//!   cancellation all clear the indicator.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::watch;
use tracing::debug;

/// Reference-counted busy indicator shared by every component of a session.
#[derive(Clone, Debug)]
pub struct BusyGate {
    inner: Arc<BusyInner>,
}

#[derive(Debug)]
struct BusyInner {
    count: AtomicUsize,
    overlay: watch::Sender<bool>,
}

impl Default for BusyGate {
    fn default() -> Self {
        Self::new()
    }
}

impl BusyGate {
    /// Idle gate with no overlay.
    #[must_use]
    pub fn new() -> Self {
        let (overlay, _) = watch::channel(false);
        Self {
            inner: Arc::new(BusyInner {
                count: AtomicUsize::new(0),
                overlay,
            }),
        }
    }

    /// Mark one operation as in flight.
    #[must_use = "the gate is released when the guard is dropped"]
    pub fn acquire(&self) -> BusyGuard {
        let shown = self.inner.overlay.send_if_modified(|visible| {
            self.inner.count.fetch_add(1, Ordering::AcqRel);
            let changed = !*visible;
            *visible = true;
            changed
        });
        if shown {
            debug!("loading overlay shown");
        }
        BusyGuard { gate: self.clone() }
    }

    // The count only changes inside the watch write lock, so visibility and
    // count cannot drift apart between threads.
    fn release(&self) {
        let hidden = self.inner.overlay.send_if_modified(|visible| {
            let remaining = self.inner.count.load(Ordering::Acquire).saturating_sub(1);
            self.inner.count.store(remaining, Ordering::Release);
            let changed = *visible && remaining == 0;
            *visible = remaining > 0;
            changed
        });
        if hidden {
            debug!("loading overlay hidden");
        }
    }

    /// Whether any operation is in flight.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.in_flight() > 0
    }

    /// Number of outstanding guards.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.inner.count.load(Ordering::Acquire)
    }

    /// Number of overlay instances currently rendered (0 or 1).
    #[must_use]
    pub fn overlay_instances(&self) -> usize {
        usize::from(*self.inner.overlay.borrow())
    }

    /// Observe overlay visibility changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.inner.overlay.subscribe()
    }
}

/// Holds the gate open for one operation.
#[derive(Debug)]
pub struct BusyGuard {
    gate: BusyGate,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.gate.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn double_acquire_renders_one_overlay() {
        let gate = BusyGate::new();
        let first = gate.acquire();
        let second = gate.acquire();
        assert_eq!(gate.overlay_instances(), 1);
        assert_eq!(gate.in_flight(), 2);

        drop(first);
        assert_eq!(gate.overlay_instances(), 1);
        assert!(gate.is_busy());

        drop(second);
        assert_eq!(gate.overlay_instances(), 0);
        assert!(!gate.is_busy());
    }

    #[test]
    fn guard_releases_on_early_return() {
        fn failing(gate: &BusyGate) -> Result<(), &'static str> {
            let _busy = gate.acquire();
            Err("boom")
        }

        let gate = BusyGate::new();
        assert!(failing(&gate).is_err());
        assert_eq!(gate.overlay_instances(), 0);
    }

    #[test]
    fn overlay_stays_visible_while_any_thread_holds_a_guard() {
        let gate = BusyGate::new();
        let workers: Vec<_> = (0..4)
            .map(|_| {
                let gate = gate.clone();
                std::thread::spawn(move || {
                    let mut hidden_while_held = 0_usize;
                    for _ in 0..20_000 {
                        let guard = gate.acquire();
                        std::thread::yield_now();
                        if gate.overlay_instances() == 0 {
                            hidden_while_held += 1;
                        }
                        drop(guard);
                    }
                    hidden_while_held
                })
            })
            .collect();

        let hidden: usize = workers
            .into_iter()
            .map(|worker| worker.join().expect("worker panicked"))
            .sum();
        assert_eq!(hidden, 0);
        assert_eq!(gate.in_flight(), 0);
        assert_eq!(gate.overlay_instances(), 0);
    }

    #[tokio::test]
    async fn subscribers_see_visibility_changes() {
        let gate = BusyGate::new();
        let mut rx = gate.subscribe();
        let guard = gate.acquire();
        rx.changed().await.unwrap();
        assert!(*rx.borrow_and_update());
        drop(guard);
        rx.changed().await.unwrap();
        assert!(!*rx.borrow());
    }
}
