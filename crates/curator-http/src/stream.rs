//! Server-sent events body decoding.
//!
//! # Design
//! - Chunks are fed to [`SseParser`]; multi-byte characters split across chunks
//!   are carried over instead of being replaced.
//! - Frames without data (keepalives, retry hints) are skipped; malformed data is
//!   yielded as a decode error and the stream continues.
//! - A body error ends the stream after being yielded once.

use std::collections::VecDeque;
use std::fmt::Display;

use curator_session::{BackendError, EventStream, RealtimeEvent, SseFrame, SseParser, decode_frame};
use futures_util::stream::{self, BoxStream, Stream, StreamExt};

/// Decode a streamed body into realtime events.
pub(crate) fn sse_events<S, B, E>(body: S) -> EventStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    stream::unfold(FrameDecoder::new(body.boxed()), |mut decoder| async move {
        let item = decoder.next_item().await?;
        Some((item, decoder))
    })
    .boxed()
}

struct FrameDecoder<B, E> {
    body: BoxStream<'static, Result<B, E>>,
    parser: SseParser,
    ready: VecDeque<SseFrame>,
    carry: Vec<u8>,
    done: bool,
}

impl<B: AsRef<[u8]>, E: Display> FrameDecoder<B, E> {
    fn new(body: BoxStream<'static, Result<B, E>>) -> Self {
        Self {
            body,
            parser: SseParser::default(),
            ready: VecDeque::new(),
            carry: Vec::new(),
            done: false,
        }
    }

    async fn next_item(&mut self) -> Option<Result<RealtimeEvent, BackendError>> {
        loop {
            if let Some(frame) = self.ready.pop_front() {
                if frame.data.trim().is_empty() {
                    continue;
                }
                return Some(decode_frame(&frame).map_err(|err| BackendError::Decode {
                    detail: format!("{err}: {}", err.data),
                }));
            }
            if self.done {
                return None;
            }
            match self.body.next().await {
                Some(Ok(chunk)) => self.feed(chunk.as_ref()),
                Some(Err(err)) => {
                    self.done = true;
                    return Some(Err(BackendError::Transport {
                        detail: err.to_string(),
                    }));
                }
                None => {
                    self.done = true;
                    self.finish();
                }
            }
        }
    }

    fn feed(&mut self, chunk: &[u8]) {
        self.carry.extend_from_slice(chunk);
        let (text, rest) = match std::str::from_utf8(&self.carry) {
            Ok(text) => (text.to_string(), Vec::new()),
            Err(err) if err.error_len().is_none() => {
                let valid = err.valid_up_to();
                (
                    String::from_utf8_lossy(&self.carry[..valid]).into_owned(),
                    self.carry[valid..].to_vec(),
                )
            }
            Err(_) => (String::from_utf8_lossy(&self.carry).into_owned(), Vec::new()),
        };
        self.carry = rest;
        self.ready.extend(self.parser.push(&text));
    }

    fn finish(&mut self) {
        if !self.carry.is_empty() {
            let text = String::from_utf8_lossy(&self.carry).into_owned();
            self.carry.clear();
            self.ready.extend(self.parser.push(&text));
        }
        self.ready.extend(self.parser.finish());
    }
}
