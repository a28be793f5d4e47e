//! Span helpers that tie log lines to one CLI invocation.

use tracing::Span;

use crate::init::build_sha;

/// Span covering one command; every log line emitted inside carries the
/// command name, the request id sent to the server, and the build identifier.
#[must_use]
pub fn command_span(command: &str, request_id: &str) -> Span {
    tracing::info_span!(
        "command",
        command = %command,
        request_id = %request_id,
        build_sha = %build_sha(),
        entity = tracing::field::Empty,
    )
}

/// Record the entity a command operates on.
pub fn record_entity(span: &Span, entity: &str) {
    span.record("entity", tracing::field::display(entity));
}
