//! Transient, dismissible notifications.
//!
//! # Design
//! - Each notification owns a timer task that removes it after the display
//!   window; manual dismissal aborts the timer.
//! - Front ends either poll [`NotificationCenter::active`] or follow the
//!   broadcast stream.
//! - Requires a tokio runtime: pushing spawns the expiry timer.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::AbortHandle;
use tokio_stream::wrappers::BroadcastStream;
use tracing::debug;

use crate::model::NoticeKind;

const BROADCAST_CAPACITY: usize = 64;

/// Identifier of one notification within a session.
pub type NoticeId = u64;

/// A notification currently on screen.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Notification {
    /// Session-unique identifier.
    pub id: NoticeId,
    /// Severity.
    pub kind: NoticeKind,
    /// Heading; may be empty.
    pub title: String,
    /// Body text.
    pub message: String,
    /// When it was raised.
    pub created_at: DateTime<Utc>,
}

#[derive(Default)]
struct NoticeState {
    next_id: NoticeId,
    active: Vec<Notification>,
    timers: HashMap<NoticeId, AbortHandle>,
}

/// Notification host for one session.
#[derive(Clone)]
pub struct NotificationCenter {
    state: Arc<Mutex<NoticeState>>,
    window: Duration,
    sender: broadcast::Sender<Notification>,
}

impl NotificationCenter {
    /// Center whose notifications disappear after `window`.
    #[must_use]
    pub fn new(window: Duration) -> Self {
        let (sender, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            state: Arc::new(Mutex::new(NoticeState::default())),
            window,
            sender,
        }
    }

    /// Show a notification and schedule its removal.
    pub fn push(
        &self,
        kind: NoticeKind,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> NoticeId {
        let notification = {
            let mut state = self.lock();
            state.next_id = state.next_id.saturating_add(1);
            let notification = Notification {
                id: state.next_id,
                kind,
                title: title.into(),
                message: message.into(),
                created_at: Utc::now(),
            };
            state.active.push(notification.clone());
            notification
        };
        let id = notification.id;
        debug!(id, kind = kind.as_str(), message = %notification.message, "notification shown");
        let _ = self.sender.send(notification);

        let center = self.clone();
        let window = self.window;
        let timer = tokio::spawn(async move {
            tokio::time::sleep(window).await;
            center.expire(id);
        });

        let mut state = self.lock();
        if state.active.iter().any(|notice| notice.id == id) {
            state.timers.insert(id, timer.abort_handle());
        }
        id
    }

    /// Remove a notification before its window elapses.
    pub fn dismiss(&self, id: NoticeId) -> bool {
        let mut state = self.lock();
        if let Some(timer) = state.timers.remove(&id) {
            timer.abort();
        }
        let before = state.active.len();
        state.active.retain(|notice| notice.id != id);
        before != state.active.len()
    }

    /// Notifications currently visible, oldest first.
    #[must_use]
    pub fn active(&self) -> Vec<Notification> {
        self.lock().active.clone()
    }

    /// Remove every notification and cancel their timers.
    pub fn clear(&self) {
        let mut state = self.lock();
        for (_, timer) in state.timers.drain() {
            timer.abort();
        }
        state.active.clear();
    }

    /// Receive notifications as they are raised.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    /// Stream form of [`Self::subscribe`].
    #[must_use]
    pub fn stream(&self) -> BroadcastStream<Notification> {
        BroadcastStream::new(self.subscribe())
    }

    fn expire(&self, id: NoticeId) {
        let mut state = self.lock();
        state.timers.remove(&id);
        state.active.retain(|notice| notice.id != id);
        drop(state);
        debug!(id, "notification expired");
    }

    fn lock(&self) -> MutexGuard<'_, NoticeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn notifications_expire_after_window() {
        let center = NotificationCenter::new(Duration::from_secs(5));
        center.push(NoticeKind::Error, "Upload failed", "disk full");
        assert_eq!(center.active().len(), 1);

        tokio::time::sleep(Duration::from_millis(4_990)).await;
        assert_eq!(center.active().len(), 1);

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(center.active().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn dismiss_removes_immediately() {
        let center = NotificationCenter::new(Duration::from_secs(5));
        let first = center.push(NoticeKind::Info, "", "one");
        let second = center.push(NoticeKind::Success, "", "two");

        assert!(center.dismiss(first));
        assert!(!center.dismiss(first));
        let active = center.active();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, second);
    }

    #[tokio::test]
    async fn subscribers_receive_pushes() {
        let center = NotificationCenter::new(Duration::from_secs(5));
        let mut rx = center.subscribe();
        center.push(NoticeKind::Warning, "Heads up", "quota at 90%");
        let received = rx.recv().await.unwrap();
        assert_eq!(received.kind, NoticeKind::Warning);
        assert_eq!(received.title, "Heads up");
        center.clear();
        assert!(center.active().is_empty());
    }
}
