#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::redundant_pub_crate)]

//! Resource session controller for entity management lists.
//!
//! One [`SessionController`] per list view owns the selection, debounces search
//! and filter input, runs confirmed single-item and bulk actions, patches the
//! view optimistically, refreshes statistics, and turns server-push events into
//! transient notifications. The server is reached through the [`Backend`] trait.
//!
//! Layout:
//! - `model.rs`, `action.rs`: identifiers, wire bodies, and the action catalogue
//! - `view.rs`, `selection.rs`: the view model and checkbox state
//! - `query.rs`, `gateway.rs`, `patcher.rs`, `stats.rs`, `feed.rs`: behaviour
//! - `busy.rs`, `notify.rs`, `sequence.rs`, `confirm.rs`: shared services
//! - `controller.rs`: composition and lifecycle

pub mod action;
pub mod backend;
pub mod busy;
pub mod config;
pub mod confirm;
pub(crate) mod context;
pub mod controller;
pub mod error;
pub mod feed;
pub mod gateway;
pub mod model;
pub mod notify;
pub mod patcher;
pub mod query;
pub mod selection;
pub mod sequence;
pub mod sse;
pub mod stats;
pub mod view;

pub use action::{Action, ActionKind, ActionTarget, BulkActionRequest};
pub use backend::{Backend, EventStream};
pub use busy::{BusyGate, BusyGuard};
pub use config::{ConfigError, EntityProfile, SessionConfig};
pub use confirm::{AutoConfirm, AutoDecline, Confirm, ConfirmFn, ConfirmPrompt, confirm_then_perform};
pub use controller::{ActOutcome, SessionController, ViewSnapshot};
pub use error::{BackendError, SessionError, SessionResult, ValidationError};
pub use feed::{FeedHandle, FeedStatus, RealtimeFeed};
pub use gateway::{ActionGateway, ActionReceipt};
pub use model::{
    Entity, ItemId, ListFragment, ListQuery, NoticeKind, RealtimeEvent, Record, Reply, SearchPage, Stats,
};
pub use notify::{NoticeId, Notification, NotificationCenter};
pub use patcher::{OptimisticViewPatcher, PatchReport};
pub use query::{DebouncedQueryChannel, InputDecision, QueryOutcome};
pub use selection::{BulkButton, SelectionStore};
pub use sequence::{RowSequencer, Sequencer, Ticket};
pub use sse::{SseDecodeError, SseFrame, SseParser, decode_frame};
pub use stats::StatsRefresher;
pub use view::{ActionPhase, BadgeTone, ListView, Row, StatusBadge};
