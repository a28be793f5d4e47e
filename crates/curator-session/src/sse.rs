//! Server-sent events codec (transport-only).
//!
//! # Design
//! - Accept partial chunks and emit complete frames when a blank line arrives.
//! - Keep this module free of I/O so any transport can feed it.
//! - Decode JSON payloads into [`RealtimeEvent`]; the frame's `event:` name is
//!   used as the kind when the payload does not carry one.

use serde_json::Value;
use thiserror::Error;

use crate::model::RealtimeEvent;

/// One parsed SSE frame.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SseFrame {
    /// Optional event name.
    pub event: Option<String>,
    /// Optional event id.
    pub id: Option<String>,
    /// Optional retry hint in milliseconds.
    pub retry: Option<u64>,
    /// Concatenated data payload.
    pub data: String,
}

impl SseFrame {
    fn is_empty(&self) -> bool {
        self.event.is_none() && self.id.is_none() && self.retry.is_none() && self.data.is_empty()
    }
}

/// Incremental SSE parser for streamed chunks.
#[derive(Debug, Default)]
pub struct SseParser {
    line: String,
    pending_cr: bool,
    builder: FrameBuilder,
}

impl SseParser {
    /// Feed a chunk; returns every frame completed by it.
    pub fn push(&mut self, chunk: &str) -> Vec<SseFrame> {
        let mut frames = Vec::new();
        for ch in chunk.chars() {
            if self.pending_cr {
                self.pending_cr = false;
                if ch == '\n' {
                    continue;
                }
            }
            match ch {
                '\n' => self.finish_line(&mut frames),
                '\r' => {
                    self.pending_cr = true;
                    self.finish_line(&mut frames);
                }
                _ => self.line.push(ch),
            }
        }
        frames
    }

    /// Flush a trailing frame when the stream ends without a blank line.
    pub fn finish(&mut self) -> Option<SseFrame> {
        if !self.line.is_empty() {
            self.finish_line(&mut Vec::new());
        }
        self.builder.take_frame()
    }

    fn finish_line(&mut self, frames: &mut Vec<SseFrame>) {
        let line = std::mem::take(&mut self.line);
        if line.is_empty() {
            if let Some(frame) = self.builder.take_frame() {
                frames.push(frame);
            }
            return;
        }
        if line.starts_with(':') {
            return;
        }
        let (field, value) = line
            .split_once(':')
            .map(|(field, value)| (field, value.strip_prefix(' ').unwrap_or(value)))
            .unwrap_or((line.as_str(), ""));
        self.builder.apply_field(field, value);
    }
}

/// Frame that could not be decoded into an event.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("undecodable event frame")]
pub struct SseDecodeError {
    /// Event name of the frame.
    pub event: Option<String>,
    /// Event id of the frame.
    pub id: Option<String>,
    /// Raw payload.
    pub data: String,
}

/// Decode a frame into a realtime event.
///
/// # Errors
///
/// Returns [`SseDecodeError`] for empty payloads, non-JSON payloads, and JSON
/// that does not describe an event.
pub fn decode_frame(frame: &SseFrame) -> Result<RealtimeEvent, SseDecodeError> {
    let fail = || SseDecodeError {
        event: frame.event.clone(),
        id: frame.id.clone(),
        data: frame.data.clone(),
    };
    let data = frame.data.trim();
    if data.is_empty() {
        return Err(fail());
    }
    let mut value: Value = serde_json::from_str(data).map_err(|_| fail())?;
    let Some(object) = value.as_object_mut() else {
        return Err(fail());
    };
    if !object.contains_key("kind") && !object.contains_key("type") {
        if let Some(name) = frame.event.as_deref().filter(|name| is_kind(name)) {
            object.insert("kind".to_string(), Value::String(name.to_string()));
        }
    }
    serde_json::from_value(value).map_err(|_| fail())
}

fn is_kind(name: &str) -> bool {
    matches!(name, "success" | "error" | "danger" | "warning" | "info")
}

#[derive(Debug, Default)]
struct FrameBuilder {
    event: Option<String>,
    id: Option<String>,
    retry: Option<u64>,
    data: String,
}

impl FrameBuilder {
    fn apply_field(&mut self, field: &str, value: &str) {
        match field {
            "event" => self.event = Some(value.to_string()),
            "id" => self.id = Some(value.to_string()),
            "retry" => self.retry = value.parse::<u64>().ok(),
            "data" => {
                if !self.data.is_empty() {
                    self.data.push('\n');
                }
                self.data.push_str(value);
            }
            _ => {}
        }
    }

    fn take_frame(&mut self) -> Option<SseFrame> {
        let frame = SseFrame {
            event: self.event.take(),
            id: self.id.take(),
            retry: self.retry.take(),
            data: std::mem::take(&mut self.data),
        };
        if frame.is_empty() { None } else { Some(frame) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NoticeKind;

    #[test]
    fn parser_emits_frames_on_blank_lines() {
        let mut parser = SseParser::default();
        let frames = parser.push("event: test\ndata: hello\n\nid: 42\ndata: world\n\n");
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].event.as_deref(), Some("test"));
        assert_eq!(frames[0].data, "hello");
        assert_eq!(frames[1].id.as_deref(), Some("42"));
        assert_eq!(frames[1].data, "world");
    }

    #[test]
    fn parser_handles_split_chunks_crlf_and_comments() {
        let mut parser = SseParser::default();
        assert!(parser.push(": keepalive\r\nretry: 3000\r\nda").is_empty());
        let frames = parser.push("ta: line1\r\ndata: line2\r\n\r\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].retry, Some(3000));
        assert_eq!(frames[0].data, "line1\nline2");
    }

    #[test]
    fn finish_flushes_trailing_frame() {
        let mut parser = SseParser::default();
        assert!(parser.push("data: {\"message\":\"tail\"}").is_empty());
        let frame = parser.finish().unwrap();
        assert_eq!(decode_frame(&frame).unwrap().message, "tail");
    }

    #[test]
    fn decode_uses_event_name_as_kind_fallback() {
        let frame = SseFrame {
            event: Some("warning".into()),
            data: r#"{"title":"Quota","message":"90% used"}"#.into(),
            ..SseFrame::default()
        };
        let event = decode_frame(&frame).unwrap();
        assert_eq!(event.kind, NoticeKind::Warning);
        assert_eq!(event.title, "Quota");

        let explicit = SseFrame {
            event: Some("warning".into()),
            data: r#"{"type":"success","message":"ok"}"#.into(),
            ..SseFrame::default()
        };
        assert_eq!(decode_frame(&explicit).unwrap().kind, NoticeKind::Success);
    }

    #[test]
    fn decode_rejects_non_objects() {
        for data in ["", "not json", "[1,2]", r#"{"type":"shout"}"#] {
            let frame = SseFrame {
                data: data.into(),
                ..SseFrame::default()
            };
            assert!(decode_frame(&frame).is_err(), "{data} should fail");
        }
    }
}
