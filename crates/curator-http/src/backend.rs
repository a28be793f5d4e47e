//! reqwest implementation of [`Backend`].
//!
//! # Design
//! - Search, single-item actions, statistics, and item reads are XHR-style JSON
//!   calls carrying `X-Requested-With` and the CSRF header.
//! - Filter reads and bulk submissions behave like plain navigation: no XHR
//!   header, markup or redirects accepted, CSRF sent as a form field.
//! - The event subscription uses its own client without a total timeout so a
//!   long-lived stream is not cut off.

use std::marker::PhantomData;
use std::time::Duration;

use async_trait::async_trait;
use curator_session::{
    Action, Backend, BackendError, Entity, EventStream, ItemId, ListFragment, ListQuery, Reply,
    SearchPage, Stats,
};
use reqwest::header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE, HeaderMap};
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;
use url::Url;

use crate::config::{CSRF_FORM_FIELD, HEADER_CSRF, HEADER_REQUESTED_WITH, HttpConfig, HttpConfigError};
use crate::fragment::parse_fragment;
use crate::problem::{classify, transport};
use crate::stream::sse_events;

const JSON: &str = "application/json";
const FORM_ACCEPT: &str = "application/json, text/html;q=0.9";

/// HTTP backend for one entity list.
pub struct HttpBackend<T> {
    client: Client,
    stream_client: Client,
    config: HttpConfig,
    entity: PhantomData<fn() -> T>,
}

impl<T> Clone for HttpBackend<T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            stream_client: self.stream_client.clone(),
            config: self.config.clone(),
            entity: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for HttpBackend<T> {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("HttpBackend")
            .field("base_url", &self.config.base_url.as_str())
            .field("entity", &self.config.entity)
            .finish_non_exhaustive()
    }
}

impl<T> HttpBackend<T> {
    /// Build a backend from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`HttpConfigError`] when the configuration is invalid or the
    /// client cannot be built.
    pub fn new(config: HttpConfig) -> Result<Self, HttpConfigError> {
        Self::with_headers(config, HeaderMap::new())
    }

    /// Build a backend that sends `headers` on every request (request ids,
    /// session cookies).
    ///
    /// # Errors
    ///
    /// Returns [`HttpConfigError`] when the configuration is invalid or the
    /// client cannot be built.
    pub fn with_headers(config: HttpConfig, headers: HeaderMap) -> Result<Self, HttpConfigError> {
        config.validate()?;
        let build_failed = |err: reqwest::Error| HttpConfigError::Client {
            detail: err.to_string(),
        };
        let client = Client::builder()
            .timeout(config.timeout())
            .default_headers(headers.clone())
            .build()
            .map_err(build_failed)?;
        let stream_client = Client::builder()
            .connect_timeout(config.timeout())
            .default_headers(headers)
            .build()
            .map_err(build_failed)?;
        Ok(Self {
            client,
            stream_client,
            config,
            entity: PhantomData,
        })
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &HttpConfig {
        &self.config
    }

    fn url(
        &self,
        template: &str,
        id: Option<&ItemId>,
        action: Option<Action>,
    ) -> Result<Url, BackendError> {
        self.config
            .resolve(template, id, action)
            .map_err(|err| BackendError::Transport {
                detail: format!("{err:?}"),
            })
    }

    fn xhr(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder
            .header(HEADER_REQUESTED_WITH, "XMLHttpRequest")
            .header(ACCEPT, JSON);
        match &self.config.csrf_token {
            Some(token) => builder.header(HEADER_CSRF, token.as_str()),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, BackendError> {
        let response = builder
            .send()
            .await
            .map_err(|err| transport(&err, self.timeout()))?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(classify(response).await)
        }
    }

    async fn body(&self, response: Response) -> Result<Vec<u8>, BackendError> {
        response
            .bytes()
            .await
            .map(|bytes| bytes.to_vec())
            .map_err(|err| transport(&err, self.timeout()))
    }

    async fn json<D: DeserializeOwned>(&self, response: Response) -> Result<D, BackendError> {
        let bytes = self.body(response).await?;
        serde_json::from_slice(&bytes).map_err(|err| BackendError::Decode {
            detail: err.to_string(),
        })
    }

    async fn reply(&self, response: Response) -> Result<Reply, BackendError> {
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.contains("json"));
        let bytes = self.body(response).await?;
        if !is_json || bytes.iter().all(u8::is_ascii_whitespace) {
            debug!(json = is_json, "non-JSON reply treated as success");
            return Ok(Reply::ok(None));
        }
        serde_json::from_slice(&bytes).map_err(|err| BackendError::Decode {
            detail: err.to_string(),
        })
    }

    const fn timeout(&self) -> Duration {
        self.config.timeout()
    }
}

#[async_trait]
impl<T> Backend<T> for HttpBackend<T>
where
    T: Entity + DeserializeOwned,
{
    async fn search(&self, query: &ListQuery) -> Result<SearchPage<T>, BackendError> {
        let url = self.url(&self.config.endpoints.search, None, None)?;
        let request = self.xhr(self.client.post(url)).json(&search_body(query));
        let response = self.send(request).await?;
        let envelope: SearchEnvelope<T> = self.json(response).await?;
        envelope.into_page()
    }

    async fn filter(&self, query: &ListQuery) -> Result<ListFragment, BackendError> {
        let mut url = self.url(&self.config.endpoints.filter, None, None)?;
        let encoded = query.query_string();
        url.set_query((!encoded.is_empty()).then_some(encoded.as_str()));
        let response = self
            .send(self.client.get(url).header(ACCEPT, "text/html"))
            .await?;
        let bytes = self.body(response).await?;
        Ok(parse_fragment(String::from_utf8_lossy(&bytes).into_owned()))
    }

    async fn perform_action(&self, id: &ItemId, action: Action) -> Result<Reply, BackendError> {
        let endpoints = &self.config.endpoints;
        let request = if action == Action::Delete {
            self.client.delete(self.url(&endpoints.delete, Some(id), None)?)
        } else {
            self.client
                .post(self.url(&endpoints.action, Some(id), Some(action))?)
        };
        let response = self.send(self.xhr(request)).await?;
        self.reply(response).await
    }

    async fn bulk_action(&self, ids: &[ItemId], action: Action) -> Result<Reply, BackendError> {
        let url = self.url(&self.config.endpoints.bulk, None, None)?;
        let form = bulk_form(ids, action, self.config.csrf_token.as_deref());
        let request = self.client.post(url).header(ACCEPT, FORM_ACCEPT).form(&form);
        let response = self.send(request).await?;
        self.reply(response).await
    }

    async fn statistics(&self) -> Result<Stats, BackendError> {
        let url = self.url(&self.config.endpoints.statistics, None, None)?;
        let response = self.send(self.xhr(self.client.get(url))).await?;
        let value: Value = self.json(response).await?;
        stats_from(value)
    }

    async fn view(&self, id: &ItemId) -> Result<T, BackendError> {
        let url = self.url(&self.config.endpoints.view, Some(id), None)?;
        let response = self.send(self.xhr(self.client.get(url))).await?;
        let value: Value = self.json(response).await?;
        serde_json::from_value(item_from(value)?).map_err(|err| BackendError::Decode {
            detail: err.to_string(),
        })
    }

    async fn event_stream(&self) -> Result<EventStream, BackendError> {
        let url = self.url(&self.config.endpoints.events, None, None)?;
        let request = self
            .stream_client
            .get(url)
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache");
        let response = self.send(request).await?;
        Ok(sse_events(response.bytes_stream()))
    }
}

#[derive(Deserialize)]
struct SearchEnvelope<T> {
    #[serde(default = "accepted", alias = "ok")]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default = "Vec::new", alias = "data", alias = "results")]
    items: Vec<T>,
    #[serde(default)]
    stats: Stats,
}

const fn accepted() -> bool {
    true
}

impl<T> SearchEnvelope<T> {
    fn into_page(self) -> Result<SearchPage<T>, BackendError> {
        if !self.success {
            return Err(BackendError::Rejected {
                message: self.message,
            });
        }
        Ok(SearchPage {
            items: self.items,
            stats: self.stats,
        })
    }
}

/// JSON body for the search endpoint: the term plus the active filters.
pub(crate) fn search_body(query: &ListQuery) -> Value {
    let mut body = Map::new();
    body.insert("search".into(), Value::String(query.term.trim().to_string()));
    for (key, value) in &query.filters {
        body.insert(key.clone(), Value::String(value.clone()));
    }
    Value::Object(body)
}

/// Form fields for a bulk submission.
pub(crate) fn bulk_form(
    ids: &[ItemId],
    action: Action,
    csrf_token: Option<&str>,
) -> Vec<(&'static str, String)> {
    let mut form: Vec<(&'static str, String)> = ids
        .iter()
        .map(|id| ("itemIds[]", id.to_string()))
        .collect();
    form.push(("action", action.as_str().to_string()));
    if let Some(token) = csrf_token {
        form.push((CSRF_FORM_FIELD, token.to_string()));
    }
    form
}

/// Accept `{success, stats}` envelopes and bare counter objects.
pub(crate) fn stats_from(value: Value) -> Result<Stats, BackendError> {
    let Value::Object(mut object) = value else {
        return Err(BackendError::Decode {
            detail: "statistics body is not an object".into(),
        });
    };
    if object.get("success").and_then(Value::as_bool) == Some(false) {
        return Err(BackendError::Rejected {
            message: object
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string),
        });
    }
    match object.remove("stats") {
        Some(Value::Object(stats)) => Ok(Stats::new(stats)),
        Some(_) => Err(BackendError::Decode {
            detail: "statistics field is not an object".into(),
        }),
        None => {
            object.remove("success");
            object.remove("message");
            Ok(Stats::new(object))
        }
    }
}

/// Unwrap `{success, item}` or `{success, data}` envelopes around one item.
pub(crate) fn item_from(value: Value) -> Result<Value, BackendError> {
    let Value::Object(mut object) = value else {
        return Ok(value);
    };
    if object.get("success").and_then(Value::as_bool) == Some(false) {
        return Err(BackendError::Rejected {
            message: object
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string),
        });
    }
    for key in ["item", "data"] {
        match object.remove(key) {
            Some(inner @ Value::Object(_)) => return Ok(inner),
            Some(other) => {
                object.insert(key.to_string(), other);
            }
            None => {}
        }
    }
    Ok(Value::Object(object))
}

#[cfg(test)]
mod tests {
    use super::*;
    use curator_session::Record;
    use serde_json::json;

    #[test]
    fn search_body_flattens_filters() {
        let mut query = ListQuery::with_term("  cats ");
        query.set_filter("status", Some("pending".into()));
        assert_eq!(
            search_body(&query),
            json!({"search": "cats", "status": "pending"})
        );
    }

    #[test]
    fn bulk_form_repeats_item_ids() {
        let ids = vec![ItemId::from(1), ItemId::from(2)];
        let form = bulk_form(&ids, Action::Archive, Some("tok"));
        assert_eq!(
            form,
            vec![
                ("itemIds[]", "1".to_string()),
                ("itemIds[]", "2".to_string()),
                ("action", "archive".to_string()),
                ("_token", "tok".to_string()),
            ]
        );
    }

    #[test]
    fn stats_accept_envelopes_and_bare_objects() {
        let wrapped = stats_from(json!({"success": true, "stats": {"total": 4}})).unwrap();
        assert_eq!(wrapped.count("total"), Some(4));

        let bare = stats_from(json!({"total": 2, "pending": 1})).unwrap();
        assert_eq!(bare.count("pending"), Some(1));

        assert_eq!(
            stats_from(json!({"success": false, "message": "nope"})),
            Err(BackendError::Rejected {
                message: Some("nope".into())
            })
        );
        assert!(matches!(
            stats_from(json!([1])),
            Err(BackendError::Decode { .. })
        ));
    }

    #[test]
    fn items_are_unwrapped_from_envelopes() {
        let value = item_from(json!({"success": true, "item": {"id": 9, "title": "x"}})).unwrap();
        let record: Record = serde_json::from_value(value).unwrap();
        assert_eq!(record.id, ItemId::from(9));

        let bare = item_from(json!({"id": 3, "data": "text"})).unwrap();
        assert_eq!(bare, json!({"id": 3, "data": "text"}));
    }

    #[test]
    fn search_envelope_rejects_unsuccessful_pages() {
        let envelope: SearchEnvelope<Record> =
            serde_json::from_value(json!({"success": false, "message": "bad term"})).unwrap();
        assert_eq!(
            envelope.into_page().err(),
            Some(BackendError::Rejected {
                message: Some("bad term".into())
            })
        );

        let envelope: SearchEnvelope<Record> =
            serde_json::from_value(json!({"data": [{"id": 1}], "stats": {"total": 1}})).unwrap();
        let page = envelope.into_page().unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.stats.count("total"), Some(1));
    }
}
