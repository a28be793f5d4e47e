//! In-memory scripted backend for controller tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use curator_session::{
    Action, Backend, BackendError, EntityProfile, EventStream, ItemId, ListFragment, ListQuery,
    RealtimeEvent, Record, Reply, SearchPage, SessionConfig, Stats,
};
use futures_util::StreamExt;
use serde_json::{Map, Value, json};
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::UnboundedReceiverStream;

/// Sender side of the scripted realtime stream.
pub type EventSender = mpsc::UnboundedSender<Result<RealtimeEvent, BackendError>>;

#[derive(Default)]
struct Inner {
    records: Mutex<Vec<Record>>,
    searches: Mutex<Vec<ListQuery>>,
    filters: Mutex<Vec<ListQuery>>,
    actions: Mutex<Vec<(Vec<ItemId>, Action)>>,
    stats_calls: AtomicUsize,
    search_holds: Mutex<VecDeque<oneshot::Receiver<()>>>,
    filter_holds: Mutex<VecDeque<oneshot::Receiver<()>>>,
    action_holds: Mutex<VecDeque<oneshot::Receiver<()>>>,
    stats_holds: Mutex<VecDeque<oneshot::Receiver<()>>>,
    search_failures: Mutex<VecDeque<BackendError>>,
    replies: Mutex<VecDeque<Reply>>,
    events: Mutex<Option<mpsc::UnboundedReceiver<Result<RealtimeEvent, BackendError>>>>,
}

/// Backend whose responses and timing are controlled by the test.
#[derive(Clone, Default)]
pub struct ScriptedBackend {
    inner: Arc<Inner>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn wait_for(holds: &Mutex<VecDeque<oneshot::Receiver<()>>>) {
    let hold = lock(holds).pop_front();
    if let Some(hold) = hold {
        let _ = hold.await;
    }
}

impl ScriptedBackend {
    pub fn with_records(records: Vec<Record>) -> Self {
        let backend = Self::default();
        *lock(&backend.inner.records) = records;
        backend
    }

    /// Hold the next search until the returned sender fires.
    pub fn hold_next_search(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        lock(&self.inner.search_holds).push_back(rx);
        tx
    }

    pub fn hold_next_filter(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        lock(&self.inner.filter_holds).push_back(rx);
        tx
    }

    pub fn hold_next_action(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        lock(&self.inner.action_holds).push_back(rx);
        tx
    }

    pub fn hold_next_stats(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        lock(&self.inner.stats_holds).push_back(rx);
        tx
    }

    /// Fail the next search call; the failure is bound when the call starts.
    pub fn fail_next_search(&self, err: BackendError) {
        lock(&self.inner.search_failures).push_back(err);
    }

    pub fn reply_next(&self, reply: Reply) {
        lock(&self.inner.replies).push_back(reply);
    }

    /// Script the realtime stream; events sent on the returned channel are delivered.
    pub fn event_channel(&self) -> EventSender {
        let (tx, rx) = mpsc::unbounded_channel();
        *lock(&self.inner.events) = Some(rx);
        tx
    }

    pub fn searches(&self) -> Vec<ListQuery> {
        lock(&self.inner.searches).clone()
    }

    pub fn filters(&self) -> Vec<ListQuery> {
        lock(&self.inner.filters).clone()
    }

    pub fn actions(&self) -> Vec<(Vec<ItemId>, Action)> {
        lock(&self.inner.actions).clone()
    }

    pub fn stats_calls(&self) -> usize {
        self.inner.stats_calls.load(Ordering::SeqCst)
    }

    fn matching(&self, query: &ListQuery) -> Vec<Record> {
        let term = query.term.to_lowercase();
        lock(&self.inner.records)
            .iter()
            .filter(|record| {
                record
                    .title()
                    .is_some_and(|title| title.to_lowercase().contains(&term))
            })
            .filter(|record| {
                query.filters.iter().all(|(key, value)| {
                    record.field(key).and_then(Value::as_str) == Some(value.as_str())
                })
            })
            .cloned()
            .collect()
    }

    fn apply(&self, ids: &[ItemId], action: Action) {
        let mut records = lock(&self.inner.records);
        match action {
            Action::Delete => records.retain(|record| !ids.contains(&record.id)),
            other => {
                for record in records.iter_mut().filter(|record| ids.contains(&record.id)) {
                    if let Some(status) = other.resulting_status() {
                        record.fields.insert("status".into(), json!(status));
                    }
                    if other == Action::Verify {
                        record.fields.insert("is_verified".into(), json!(true));
                    }
                }
            }
        }
    }

    async fn run_action(&self, ids: Vec<ItemId>, action: Action) -> Result<Reply, BackendError> {
        lock(&self.inner.actions).push((ids.clone(), action));
        wait_for(&self.inner.action_holds).await;
        let scripted = lock(&self.inner.replies).pop_front();
        let reply = scripted.unwrap_or_else(|| Reply::ok(None));
        if reply.success {
            self.apply(&ids, action);
        }
        Ok(reply)
    }
}

#[async_trait]
impl Backend<Record> for ScriptedBackend {
    async fn search(&self, query: &ListQuery) -> Result<SearchPage<Record>, BackendError> {
        lock(&self.inner.searches).push(query.clone());
        let failure = lock(&self.inner.search_failures).pop_front();
        wait_for(&self.inner.search_holds).await;
        if let Some(err) = failure {
            return Err(err);
        }
        let items = self.matching(query);
        let mut stats = Map::new();
        stats.insert("total".into(), json!(items.len()));
        Ok(SearchPage {
            items,
            stats: Stats::new(stats),
        })
    }

    async fn filter(&self, query: &ListQuery) -> Result<ListFragment, BackendError> {
        lock(&self.inner.filters).push(query.clone());
        wait_for(&self.inner.filter_holds).await;
        let items = self.matching(query);
        let markup = items
            .iter()
            .map(|record| format!("<tr data-id=\"{}\"></tr>", record.id))
            .collect::<String>();
        Ok(ListFragment {
            markup,
            row_ids: items.iter().map(|record| record.id.clone()).collect(),
            stats: None,
        })
    }

    async fn perform_action(&self, id: &ItemId, action: Action) -> Result<Reply, BackendError> {
        self.run_action(vec![id.clone()], action).await
    }

    async fn bulk_action(&self, ids: &[ItemId], action: Action) -> Result<Reply, BackendError> {
        self.run_action(ids.to_vec(), action).await
    }

    async fn statistics(&self) -> Result<Stats, BackendError> {
        let call = self.inner.stats_calls.fetch_add(1, Ordering::SeqCst) + 1;
        wait_for(&self.inner.stats_holds).await;
        let total = lock(&self.inner.records).len();
        let mut stats = Map::new();
        stats.insert("total".into(), json!(total));
        stats.insert("call".into(), json!(call));
        Ok(Stats::new(stats))
    }

    async fn view(&self, id: &ItemId) -> Result<Record, BackendError> {
        lock(&self.inner.records)
            .iter()
            .find(|record| &record.id == id)
            .cloned()
            .ok_or(BackendError::Status {
                status: 404,
                message: Some("Not found".into()),
            })
    }

    async fn event_stream(&self) -> Result<EventStream, BackendError> {
        let rx = lock(&self.inner.events).take().ok_or(BackendError::Transport {
            detail: "no event stream scripted".into(),
        })?;
        Ok(UnboundedReceiverStream::new(rx).boxed())
    }
}

pub fn record(id: u64, title: &str, status: &str) -> Record {
    serde_json::from_value(json!({"id": id, "title": title, "status": status}))
        .unwrap_or_else(|err| panic!("invalid record fixture: {err}"))
}

pub fn catalogue() -> Vec<Record> {
    vec![
        record(1, "Cat stories", "pending"),
        record(2, "Catalogue", "active"),
        record(3, "Dog days", "pending"),
        record(4, "Doghouse", "suspended"),
    ]
}

pub fn ids(raw: &[u64]) -> Vec<ItemId> {
    raw.iter().copied().map(ItemId::from).collect()
}

pub fn fast_config() -> SessionConfig {
    SessionConfig {
        request_timeout: Duration::from_millis(500),
        ..SessionConfig::default()
    }
}

pub fn profile() -> EntityProfile {
    EntityProfile::named("stories")
}
