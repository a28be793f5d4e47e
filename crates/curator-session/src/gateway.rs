//! Mutating requests: one item or many, one request per logical action.
//!
//! The gateway does not ask for confirmation; see [`crate::confirm`].

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::action::{Action, ActionTarget, BulkActionRequest};
use crate::backend::{Backend, bounded};
use crate::context::SessionContext;
use crate::error::{SessionError, SessionResult, ValidationError};
use crate::model::{Entity, ItemId, NoticeKind, Reply};

/// Successful action response.
#[derive(Clone, Debug, PartialEq)]
pub struct ActionReceipt {
    /// Action that ran.
    pub action: Action,
    /// Items it ran against.
    pub target: ActionTarget,
    /// Message shown to the user.
    pub message: String,
    /// Extra fields returned by the server.
    pub data: Map<String, Value>,
}

/// Sends action requests and reports their outcome as notifications.
pub struct ActionGateway<T, B> {
    ctx: Arc<SessionContext<T, B>>,
}

impl<T: Entity, B: Backend<T>> ActionGateway<T, B> {
    pub(crate) const fn new(ctx: Arc<SessionContext<T, B>>) -> Self {
        Self { ctx }
    }

    /// Run `action` against `target`.
    ///
    /// The busy gate is held for the duration of the request and released on
    /// every exit path, including cancellation of the returned future.
    ///
    /// # Errors
    ///
    /// - [`SessionError::Validation`] when `target` is empty (no request sent).
    /// - [`SessionError::Network`] for transport failures, bad statuses,
    ///   undecodable bodies, and timeouts.
    /// - [`SessionError::Application`] when the server answers `success: false`.
    pub async fn perform(&self, action: Action, target: ActionTarget) -> SessionResult<ActionReceipt> {
        if target.is_empty() {
            let err = SessionError::from(ValidationError::EmptySelection);
            self.ctx.notify_failure(&err);
            return Err(err);
        }

        let limit = self.ctx.config.request_timeout;
        let reply = {
            let _busy = self.ctx.busy.acquire();
            match &target {
                ActionTarget::Single(id) => bounded(limit, self.ctx.backend.perform_action(id, action)).await,
                ActionTarget::Many(ids) => bounded(limit, self.ctx.backend.bulk_action(ids, action)).await,
            }
        }
        .and_then(Reply::into_result);

        match reply {
            Ok(reply) => {
                let message = reply
                    .message
                    .filter(|message| !message.trim().is_empty())
                    .unwrap_or_else(|| action.success_message(target.len()));
                info!(action = %action, items = target.len(), "action succeeded");
                self.ctx.notices.push(NoticeKind::Success, "", message.clone());
                Ok(ActionReceipt {
                    action,
                    target,
                    message,
                    data: reply.data,
                })
            }
            Err(err) => {
                let err = SessionError::from(err);
                warn!(action = %action, items = target.len(), error = %err, "action failed");
                self.ctx.notify_failure(&err);
                Err(err)
            }
        }
    }

    /// Check a bulk submission without touching the network.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Validation`] (and raises a warning) when no
    /// action was chosen or `ids` is empty.
    pub fn validate_bulk(&self, action: Option<Action>, ids: Vec<ItemId>) -> SessionResult<BulkActionRequest> {
        BulkActionRequest::new(action, ids).map_err(|err| {
            let err = SessionError::from(err);
            warn!(error = %err, "bulk submission rejected");
            self.ctx.notify_failure(&err);
            err
        })
    }

    /// Validate, then run a bulk action in one request.
    ///
    /// # Errors
    ///
    /// See [`Self::validate_bulk`] and [`Self::perform`].
    pub async fn perform_bulk(&self, action: Option<Action>, ids: Vec<ItemId>) -> SessionResult<ActionReceipt> {
        let request = self.validate_bulk(action, ids)?;
        self.perform(request.action(), request.into_target()).await
    }
}
