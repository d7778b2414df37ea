//! Server-sent event streams
//!
//! Long-running jobs report progress over `text/event-stream`. [`EventDecoder`]
//! turns raw body chunks into [`ServerEvent`]s; chunk boundaries may fall
//! anywhere, including inside a line or a UTF-8 sequence.

use super::error::ClientError;
use super::{ApiRequest, RequestTimeout};
use futures::{Stream, StreamExt, stream};
use reqwest::header::{self, HeaderValue};
use serde::de::DeserializeOwned;
use std::collections::VecDeque;

/// One dispatched event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerEvent {
    /// `event:` field, `None` for the default `message` type
    pub event: Option<String>,
    /// `data:` lines joined with `\n`
    pub data: String,
    /// Last `id:` seen
    pub id: Option<String>,
}

impl ServerEvent {
    /// Decode the data payload as JSON
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::EventStream`] if the payload is not valid JSON for `T`
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        serde_json::from_str(&self.data).map_err(|err| {
            let event = self.event.as_deref().unwrap_or("message");
            ClientError::EventStream(format!("undecodable {event} event: {err}"))
        })
    }
}

/// Incremental `text/event-stream` decoder
#[derive(Debug, Default)]
pub struct EventDecoder {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
    last_id: Option<String>,
}

impl EventDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a body chunk and collect every event it completes
    pub fn push(&mut self, chunk: &[u8]) -> Vec<ServerEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(['\n', '\r']);
            if let Some(event) = self.process_line(line) {
                events.push(event);
            }
        }
        events
    }

    /// Flush at end of stream: a trailing line without newline is processed,
    /// and a pending event is dispatched.
    pub fn finish(&mut self) -> Option<ServerEvent> {
        if !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            let line = String::from_utf8_lossy(&rest).into_owned();
            if let Some(event) = self.process_line(line.trim_end_matches('\r')) {
                return Some(event);
            }
        }
        self.dispatch()
    }

    fn process_line(&mut self, line: &str) -> Option<ServerEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            "id" if !value.contains('\0') => self.last_id = Some(value.to_string()),
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<ServerEvent> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        Some(ServerEvent {
            event,
            data: std::mem::take(&mut self.data).join("\n"),
            id: self.last_id.clone(),
        })
    }
}

struct StreamState<S> {
    body: S,
    decoder: EventDecoder,
    ready: VecDeque<ServerEvent>,
    done: bool,
}

impl ApiRequest {
    /// Open an event stream.
    ///
    /// The call is unbounded in time and still passes through the middleware
    /// chain, so a `401` is handled like any other.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server answers with a
    /// non-success status. Errors while reading the body are yielded by the stream.
    pub async fn event_stream(
        self,
    ) -> Result<impl Stream<Item = Result<ServerEvent, ClientError>>, ClientError> {
        let response = self
            .header(header::ACCEPT, HeaderValue::from_static("text/event-stream"))
            .timeout(RequestTimeout::Unbounded)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_else(|_| status.to_string());
            return Err(ClientError::from_status(status, message));
        }

        let state = StreamState {
            body: Box::pin(response.bytes_stream()),
            decoder: EventDecoder::new(),
            ready: VecDeque::new(),
            done: false,
        };

        Ok(stream::unfold(state, |mut state| async move {
            loop {
                if let Some(event) = state.ready.pop_front() {
                    return Some((Ok(event), state));
                }
                if state.done {
                    return None;
                }
                match state.body.next().await {
                    Some(Ok(chunk)) => {
                        let events = state.decoder.push(&chunk);
                        state.ready.extend(events);
                    }
                    Some(Err(err)) => {
                        state.done = true;
                        return Some((Err(err.into()), state));
                    }
                    None => {
                        state.done = true;
                        state.ready.extend(state.decoder.finish());
                    }
                }
            }
        }))
    }
}
