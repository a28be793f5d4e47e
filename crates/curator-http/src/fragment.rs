//! Extraction of row identifiers and embedded statistics from list markup.

use curator_session::{ItemId, ListFragment, Stats};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static ROW_ID: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r#"data-id\s*=\s*(?:"([^"]+)"|'([^']+)')"#).ok());
static STATS: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r#"data-stats\s*=\s*(?:'([^']*)'|"([^"]*)")"#).ok());

/// Parse a filter response into a fragment.
///
/// Row ids come from `data-id` attributes in document order; an id repeated on
/// nested controls of the same row is kept once. Statistics are read from the
/// first `data-stats` attribute holding a JSON object.
#[must_use]
pub fn parse_fragment(markup: String) -> ListFragment {
    let row_ids = row_ids(&markup);
    let stats = embedded_stats(&markup);
    ListFragment {
        markup,
        row_ids,
        stats,
    }
}

fn row_ids(markup: &str) -> Vec<ItemId> {
    let Some(pattern) = ROW_ID.as_ref() else {
        return Vec::new();
    };
    let mut ids: Vec<ItemId> = Vec::new();
    for captures in pattern.captures_iter(markup) {
        let Some(raw) = captures.get(1).or_else(|| captures.get(2)) else {
            continue;
        };
        let id = ItemId::new(unescape(raw.as_str().trim()));
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    ids
}

fn embedded_stats(markup: &str) -> Option<Stats> {
    let captures = STATS.as_ref()?.captures(markup)?;
    let raw = captures.get(1).or_else(|| captures.get(2))?;
    match serde_json::from_str::<Value>(&unescape(raw.as_str())).ok()? {
        Value::Object(values) => Some(Stats::new(values)),
        _ => None,
    }
}

fn unescape(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
