//! Backend configuration: server location, entity, route templates, and CSRF.
//!
//! # Design
//! - Routes are templates with `{entity}`, `{id}`, and `{action}` placeholders so
//!   one backend type serves every entity list.
//! - Templates are relative; they resolve against the base URL, which keeps any
//!   path prefix the server is mounted under.
//! - Everything is validated once at construction; request paths never fail on
//!   configuration.

use std::time::Duration;

use curator_session::{Action, ItemId};
use reqwest::header::HeaderValue;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Client timeout applied when none is configured.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
/// Header carrying the CSRF token on XHR-style calls.
pub const HEADER_CSRF: &str = "x-csrf-token";
/// Header marking a request as XHR-style.
pub const HEADER_REQUESTED_WITH: &str = "x-requested-with";
/// Form field carrying the CSRF token on native form submissions.
pub const CSRF_FORM_FIELD: &str = "_token";

const ENTITY: &str = "{entity}";
const ID: &str = "{id}";
const ACTION: &str = "{action}";

/// Route templates, one per backend operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    /// JSON search (POST).
    pub search: String,
    /// Markup list for filters (GET, query string appended).
    pub filter: String,
    /// Single-item mutation (POST).
    pub action: String,
    /// Single-item removal (DELETE).
    pub delete: String,
    /// Bulk form submission (POST).
    pub bulk: String,
    /// Aggregate statistics (GET).
    pub statistics: String,
    /// One item (GET).
    pub view: String,
    /// Server-sent events subscription (GET).
    pub events: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            search: "admin/{entity}/search".into(),
            filter: "admin/{entity}".into(),
            action: "admin/{entity}/{id}/{action}".into(),
            delete: "admin/{entity}/{id}".into(),
            bulk: "admin/{entity}/bulk-action".into(),
            statistics: "admin/{entity}/statistics".into(),
            view: "admin/{entity}/{id}".into(),
            events: "admin/{entity}/events".into(),
        }
    }
}

impl Endpoints {
    /// Check that every template carries the placeholders its route needs.
    ///
    /// # Errors
    ///
    /// Returns [`HttpConfigError::Template`] naming the first offending route.
    pub fn validate(&self) -> Result<(), HttpConfigError> {
        let required: [(&'static str, &str, &[&'static str]); 8] = [
            ("search", &self.search, &[]),
            ("filter", &self.filter, &[]),
            ("action", &self.action, &[ID, ACTION]),
            ("delete", &self.delete, &[ID]),
            ("bulk", &self.bulk, &[]),
            ("statistics", &self.statistics, &[]),
            ("view", &self.view, &[ID]),
            ("events", &self.events, &[]),
        ];
        for (route, template, placeholders) in required {
            if template.trim().is_empty() {
                return Err(HttpConfigError::Template {
                    route,
                    placeholder: None,
                });
            }
            if let Some(missing) = placeholders.iter().find(|needle| !template.contains(**needle)) {
                return Err(HttpConfigError::Template {
                    route,
                    placeholder: Some(*missing),
                });
            }
        }
        Ok(())
    }
}

/// Substitute placeholders; identifiers are percent-encoded.
#[must_use]
pub fn render(template: &str, entity: &str, id: Option<&ItemId>, action: Option<Action>) -> String {
    let mut path = template.replace(ENTITY, &encode(entity));
    if let Some(id) = id {
        path = path.replace(ID, &encode(id.as_str()));
    }
    if let Some(action) = action {
        path = path.replace(ACTION, action.as_str());
    }
    path
}

fn encode(segment: &str) -> String {
    url::form_urlencoded::byte_serialize(segment.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Everything the HTTP backend needs to reach one entity list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Server root; route templates resolve against it.
    pub base_url: Url,
    /// Entity name substituted into `{entity}`.
    pub entity: String,
    /// Route templates.
    #[serde(default)]
    pub endpoints: Endpoints,
    /// CSRF token sent as a header on XHR calls and a form field on bulk posts.
    #[serde(default)]
    pub csrf_token: Option<String>,
    /// Client timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

const fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

impl HttpConfig {
    /// Configuration with conventional routes and no CSRF token.
    #[must_use]
    pub fn new(base_url: Url, entity: impl Into<String>) -> Self {
        Self {
            base_url,
            entity: entity.into(),
            endpoints: Endpoints::default(),
            csrf_token: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    /// Attach a CSRF token.
    #[must_use]
    pub fn with_csrf_token(mut self, token: impl Into<String>) -> Self {
        self.csrf_token = Some(token.into());
        self
    }

    /// Client timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns the first [`HttpConfigError`] found.
    pub fn validate(&self) -> Result<(), HttpConfigError> {
        if self.entity.trim().is_empty() {
            return Err(HttpConfigError::EmptyEntity);
        }
        if self.base_url.cannot_be_a_base() {
            return Err(HttpConfigError::BaseUrl {
                url: self.base_url.to_string(),
            });
        }
        if self.timeout_ms == 0 {
            return Err(HttpConfigError::ZeroTimeout);
        }
        if let Some(token) = &self.csrf_token {
            HeaderValue::from_str(token)
                .map_err(|_| HttpConfigError::Header { name: HEADER_CSRF })?;
        }
        self.endpoints.validate()
    }

    /// Resolve a route template to an absolute URL.
    ///
    /// # Errors
    ///
    /// Returns [`HttpConfigError::Route`] when the rendered path is not a valid
    /// relative reference.
    pub fn resolve(
        &self,
        template: &str,
        id: Option<&ItemId>,
        action: Option<Action>,
    ) -> Result<Url, HttpConfigError> {
        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let rendered = render(template, &self.entity, id, action);
        base.join(&rendered).map_err(|err| HttpConfigError::Route {
            path: rendered,
            detail: err.to_string(),
        })
    }
}

/// Configuration problems detected before any request is sent.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HttpConfigError {
    /// No entity name.
    #[error("entity name is empty")]
    EmptyEntity,
    /// Base URL cannot carry route paths (e.g. `mailto:`).
    #[error("base URL cannot be used as a base")]
    BaseUrl {
        /// Rejected URL.
        url: String,
    },
    /// A route template is empty or lacks a required placeholder.
    #[error("route template is invalid")]
    Template {
        /// Route name.
        route: &'static str,
        /// Missing placeholder; `None` when the template is empty.
        placeholder: Option<&'static str>,
    },
    /// A configured header value contains invalid characters.
    #[error("header value is invalid")]
    Header {
        /// Header name.
        name: &'static str,
    },
    /// Zero client timeout.
    #[error("timeout must be greater than zero")]
    ZeroTimeout,
    /// A rendered route could not be joined to the base URL.
    #[error("route could not be resolved")]
    Route {
        /// Rendered path.
        path: String,
        /// Parser detail.
        detail: String,
    },
    /// The HTTP client could not be built.
    #[error("failed to build HTTP client")]
    Client {
        /// Builder error detail.
        detail: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base: &str) -> HttpConfig {
        HttpConfig::new(base.parse().unwrap(), "stories")
    }

    #[test]
    fn defaults_resolve_under_base_prefix() {
        let config = config("https://example.test/panel");
        let id = ItemId::from(42);
        assert_eq!(
            config
                .resolve(&config.endpoints.action, Some(&id), Some(Action::Verify))
                .unwrap()
                .as_str(),
            "https://example.test/panel/admin/stories/42/verify"
        );
        assert_eq!(
            config.resolve(&config.endpoints.search, None, None).unwrap().path(),
            "/panel/admin/stories/search"
        );
    }

    #[test]
    fn identifiers_are_percent_encoded() {
        let id = ItemId::from("a b/c");
        assert_eq!(render("x/{id}", "stories", Some(&id), None), "x/a%20b%2Fc");
    }

    #[test]
    fn validate_rejects_missing_placeholders_and_bad_tokens() {
        let mut config = config("https://example.test/");
        assert_eq!(config.validate(), Ok(()));

        config.endpoints.action = "admin/{entity}/{id}".into();
        assert_eq!(
            config.validate(),
            Err(HttpConfigError::Template {
                route: "action",
                placeholder: Some("{action}"),
            })
        );

        config.endpoints = Endpoints::default();
        config.csrf_token = Some("bad\ntoken".into());
        assert_eq!(
            config.validate(),
            Err(HttpConfigError::Header { name: HEADER_CSRF })
        );

        config.csrf_token = None;
        config.entity = " ".into();
        assert_eq!(config.validate(), Err(HttpConfigError::EmptyEntity));
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: HttpConfig = serde_json::from_str(
            r#"{"base_url":"https://example.test/","entity":"users","endpoints":{"view":"api/users/{id}"}}"#,
        )
        .unwrap();
        assert_eq!(config.timeout_ms, DEFAULT_TIMEOUT_MS);
        assert_eq!(config.endpoints.view, "api/users/{id}");
        assert_eq!(config.endpoints.search, Endpoints::default().search);
    }
}
