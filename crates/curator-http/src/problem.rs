//! Mapping of transport failures and error responses onto [`BackendError`].

use std::time::Duration;

use curator_session::BackendError;
use reqwest::{Response, StatusCode};
use serde_json::Value;

const MESSAGE_KEYS: [&str; 4] = ["message", "detail", "error", "title"];
const MAX_TEXT_MESSAGE: usize = 200;

/// Classify a failed send.
pub(crate) fn transport(err: &reqwest::Error, timeout: Duration) -> BackendError {
    if err.is_timeout() {
        BackendError::Timeout {
            after_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }
    } else if err.is_decode() || err.is_body() {
        BackendError::Decode {
            detail: err.to_string(),
        }
    } else {
        BackendError::Transport {
            detail: err.to_string(),
        }
    }
}

/// Turn a non-success response into [`BackendError::Status`], keeping the
/// server's message when the body carries one.
pub(crate) async fn classify(response: Response) -> BackendError {
    let status = response.status();
    let bytes = response.bytes().await.unwrap_or_default();
    BackendError::Status {
        status: status.as_u16(),
        message: problem_message(status, &bytes),
    }
}

/// Extract a human-readable message from an error body.
///
/// JSON bodies are searched for `message`, `detail`, `error`, then `title`.
/// Short plain-text bodies are used verbatim; markup is ignored.
pub(crate) fn problem_message(status: StatusCode, body: &[u8]) -> Option<String> {
    if let Ok(value) = serde_json::from_slice::<Value>(body) {
        return MESSAGE_KEYS
            .iter()
            .find_map(|key| value.get(*key).and_then(Value::as_str))
            .map(str::trim)
            .filter(|message| !message.is_empty())
            .map(str::to_string);
    }
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() || text.starts_with('<') || text.len() > MAX_TEXT_MESSAGE {
        return None;
    }
    if status.canonical_reason() == Some(text) {
        return None;
    }
    Some(text.to_string())
}
