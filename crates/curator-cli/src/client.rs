//! Shared session wiring, error types, and URL parsing for the CLI.

use std::fmt::{self, Display, Formatter};

use anyhow::anyhow;
use curator_http::{HttpBackend, HttpConfig};
use curator_session::{BackendError, EntityProfile, Record, SessionController, SessionError};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{StatusCode, Url};

use crate::cli::{Cli, DEFAULT_ENTITY};
use crate::profile::Profile;
use crate::prompt::TerminalConfirm;

pub(crate) const HEADER_REQUEST_ID: &str = "x-request-id";

/// Session type driven by every command.
pub(crate) type Session = SessionController<Record, HttpBackend<Record>>;

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }

    /// Classify a session failure. Client-side validation and rejected input
    /// (400, 409, 422) exit with the validation code.
    pub(crate) fn from_session(err: &SessionError, fallback: &str) -> Self {
        let message = err.user_message(fallback);
        match err {
            SessionError::Validation(_) => Self::validation(message),
            SessionError::Network {
                source: BackendError::Status { status, .. },
            } if is_input_rejection(*status) => Self::validation(message),
            SessionError::Network { source } => {
                Self::failure(anyhow!("{message} ({source})"))
            }
            SessionError::Application { .. } => Self::failure(anyhow!(message)),
        }
    }
}

fn is_input_rejection(status: u16) -> bool {
    StatusCode::from_u16(status).is_ok_and(|status| {
        matches!(
            status,
            StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY
        )
    })
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

/// Application context passed to command handlers.
pub(crate) struct AppContext {
    pub(crate) session: Session,
}

impl AppContext {
    /// Build the HTTP backend and session from flags and the optional profile.
    pub(crate) fn from_cli(cli: &Cli, request_id: &str, profile: Profile) -> CliResult<Self> {
        let entity = cli
            .entity
            .clone()
            .or_else(|| profile.entity.as_ref().map(|entity| entity.entity.clone()))
            .unwrap_or_else(|| DEFAULT_ENTITY.to_string());
        let mut labels = profile
            .entity
            .unwrap_or_else(|| EntityProfile::named(entity.clone()));
        labels.entity.clone_from(&entity);

        let mut http = HttpConfig::new(cli.api_url.clone(), entity);
        http.csrf_token.clone_from(&cli.csrf_token);
        http.timeout_ms = cli.timeout.saturating_mul(1_000);
        if let Some(endpoints) = profile.endpoints {
            http.endpoints = endpoints;
        }

        let mut headers = HeaderMap::new();
        let request_id = HeaderValue::from_str(request_id).map_err(|_| {
            CliError::failure(anyhow!("request identifier contains invalid characters"))
        })?;
        headers.insert(HEADER_REQUEST_ID, request_id);

        let backend = HttpBackend::with_headers(http, headers)
            .map_err(|err| CliError::validation(format!("invalid server settings: {err:?}")))?;
        let session = SessionController::new(
            backend,
            TerminalConfirm::new(cli.yes),
            labels,
            profile.session,
        )
        .map_err(|err| CliError::validation(format!("invalid session settings: {err:?}")))?;
        Ok(Self { session })
    }

    pub(crate) fn entity(&self) -> &str {
        &self.session.profile().entity
    }

    pub(crate) fn fallback(&self) -> &str {
        &self.session.config().fallback_error
    }

    pub(crate) fn fail(&self, err: &SessionError) -> CliError {
        CliError::from_session(err, self.fallback())
    }
}

/// Parse the API URL provided to the CLI.
pub(crate) fn parse_url(input: &str) -> Result<Url, String> {
    input
        .parse::<Url>()
        .map_err(|err| format!("invalid URL '{input}': {err}"))
}
