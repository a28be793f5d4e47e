//! Optional JSON profile file.
//!
//! ```json
//! {
//!   "log_format": "json",
//!   "session": { "debounce_ms": 300, "request_timeout_ms": 10000 },
//!   "entity": { "entity": "stories", "statuses": { "verify": "approved" } },
//!   "endpoints": { "search": "api/{entity}/search" }
//! }
//! ```

use std::fs;
use std::path::Path;

use anyhow::anyhow;
use curator_http::Endpoints;
use curator_session::{EntityProfile, SessionConfig};
use curator_telemetry::{LogFormat, log_format_from_config};
use serde::Deserialize;
use serde_json::Value;

use crate::client::{CliError, CliResult};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProfileFile {
    session: SessionConfig,
    entity: Option<EntityProfile>,
    endpoints: Option<Endpoints>,
}

/// Settings read from a profile file; every section is optional.
#[derive(Debug, Default)]
pub(crate) struct Profile {
    pub(crate) session: SessionConfig,
    pub(crate) entity: Option<EntityProfile>,
    pub(crate) endpoints: Option<Endpoints>,
    pub(crate) log_format: Option<LogFormat>,
}

impl Profile {
    pub(crate) fn load(path: &Path) -> CliResult<Self> {
        let raw = fs::read_to_string(path).map_err(|err| {
            CliError::failure(anyhow!(
                "failed to read profile '{}': {err}",
                path.display()
            ))
        })?;
        Self::parse(&raw).map_err(|err| match err {
            CliError::Validation(message) => {
                CliError::validation(format!("{}: {message}", path.display()))
            }
            other @ CliError::Failure(_) => other,
        })
    }

    pub(crate) fn parse(raw: &str) -> CliResult<Self> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|err| CliError::validation(format!("profile is not valid JSON: {err}")))?;
        let log_format = log_format_from_config(Some(&value));
        let file: ProfileFile = serde_json::from_value(value)
            .map_err(|err| CliError::validation(format!("profile is invalid: {err}")))?;
        Ok(Self {
            session: file.session,
            entity: file.entity,
            endpoints: file.endpoints,
            log_format,
        })
    }
}
