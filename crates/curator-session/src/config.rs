//! Session timing and per-entity configuration.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::action::Action;
use crate::selection::DEFAULT_BULK_LABEL;
use crate::view::StatusBadge;

/// Quiet period before a typed search is dispatched.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);
/// Shortest non-empty search term that is dispatched.
pub const DEFAULT_MIN_TERM_LEN: usize = 2;
/// How long a notification stays visible.
pub const DEFAULT_NOTICE_WINDOW: Duration = Duration::from_secs(5);
/// Statistics poll period.
pub const DEFAULT_STATS_INTERVAL: Duration = Duration::from_secs(30);
/// Upper bound for any backend request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Message shown when a failure carries no server message.
pub const DEFAULT_FALLBACK_ERROR: &str = "The request could not be completed.";

/// Timing and policy knobs for one session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Debounce quiet period.
    #[serde(rename = "debounce_ms", with = "millis")]
    pub debounce: Duration,
    /// Minimum length of a non-empty search term.
    pub min_term_len: usize,
    /// Notification display window.
    #[serde(rename = "notice_window_ms", with = "millis")]
    pub notice_window: Duration,
    /// Statistics poll period.
    #[serde(rename = "stats_interval_ms", with = "millis")]
    pub stats_interval: Duration,
    /// Per-request timeout.
    #[serde(rename = "request_timeout_ms", with = "millis")]
    pub request_timeout: Duration,
    /// Generic failure message.
    pub fallback_error: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            min_term_len: DEFAULT_MIN_TERM_LEN,
            notice_window: DEFAULT_NOTICE_WINDOW,
            stats_interval: DEFAULT_STATS_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            fallback_error: DEFAULT_FALLBACK_ERROR.to_string(),
        }
    }
}

/// Invalid configuration values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A duration that must be positive was zero.
    #[error("duration must be positive")]
    ZeroDuration {
        /// Offending field.
        field: &'static str,
    },
    /// The entity name was blank.
    #[error("entity name must not be empty")]
    EmptyEntity,
}

impl SessionConfig {
    /// Check values that would otherwise fail at runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroDuration`] for a zero poll period, request
    /// timeout, or notification window.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("stats_interval_ms", self.stats_interval),
            ("request_timeout_ms", self.request_timeout),
            ("notice_window_ms", self.notice_window),
        ] {
            if value.is_zero() {
                return Err(ConfigError::ZeroDuration { field });
            }
        }
        Ok(())
    }
}

/// Entity-specific labels and status mappings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityProfile {
    /// Entity name (`stories`, `episodes`, `voice-actors`, ...).
    pub entity: String,
    /// Bulk button label template; `{count}` is replaced.
    pub bulk_label: String,
    /// Status label overrides per action.
    pub statuses: BTreeMap<Action, String>,
}

impl Default for EntityProfile {
    fn default() -> Self {
        Self::named("items")
    }
}

impl EntityProfile {
    /// Profile with default labels.
    #[must_use]
    pub fn named(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            bulk_label: DEFAULT_BULK_LABEL.to_string(),
            statuses: BTreeMap::new(),
        }
    }

    /// Badge to show after `action` succeeds, if the action changes status.
    #[must_use]
    pub fn badge_for(&self, action: Action) -> Option<StatusBadge> {
        self.statuses
            .get(&action)
            .map(|status| StatusBadge::for_status(status))
            .or_else(|| action.default_badge())
    }

    /// Check the profile.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyEntity`] when the entity name is blank.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.entity.trim().is_empty() {
            return Err(ConfigError::EmptyEntity);
        }
        Ok(())
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
