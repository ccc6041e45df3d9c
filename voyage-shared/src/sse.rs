//! Push-based decoder for `text/event-stream` bodies.
//!
//! Bytes arrive in arbitrary chunks; complete events (terminated by a blank
//! line) are parsed as JSON and returned, while a partial trailing event is
//! kept until the next call. Used for the component stream and for the
//! language-model streaming API, whose `[DONE]` sentinel is skipped.

use serde_json::Value;
use tracing::debug;

#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and collect every event it completes.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Value> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some((end, separator_len)) = find_event_boundary(&self.buffer) {
            let raw: Vec<u8> = self.buffer.drain(..end + separator_len).collect();
            if let Some(value) = parse_event(&raw[..end]) {
                events.push(value);
            }
        }
        events
    }

    /// Flush an unterminated trailing event once the stream has closed.
    pub fn finish(&mut self) -> Vec<Value> {
        let raw = std::mem::take(&mut self.buffer);
        parse_event(&raw).into_iter().collect()
    }

    /// Bytes held back waiting for the rest of an event.
    #[cfg(test)]
    fn pending(&self) -> usize {
        self.buffer.len()
    }
}

fn find_event_boundary(buffer: &[u8]) -> Option<(usize, usize)> {
    let lf = buffer.windows(2).position(|w| w == b"\n\n").map(|i| (i, 2));
    let crlf = buffer.windows(4).position(|w| w == b"\r\n\r\n").map(|i| (i, 4));
    match (lf, crlf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}

fn parse_event(raw: &[u8]) -> Option<Value> {
    let text = String::from_utf8_lossy(raw);
    let data: Vec<&str> = text
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|rest| rest.strip_prefix(' ').unwrap_or(rest))
        .collect();

    if data.is_empty() {
        return None;
    }

    let payload = data.join("\n");
    if payload.trim() == "[DONE]" {
        return None;
    }

    match serde_json::from_str(&payload) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("Skipping non-JSON event payload: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decodes_complete_events() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b"data: {\"type\":\"context\",\"tripId\":3}\n\ndata: {\"a\":1}\n\n");
        assert_eq!(events, vec![json!({"type": "context", "tripId": 3}), json!({"a": 1})]);
        assert_eq!(decoder.pending(), 0);
    }

    #[test]
    fn test_retains_partial_event_across_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"data: {\"field\":").is_empty());
        assert!(decoder.pending() > 0);
        assert!(decoder.feed(b"\"origin\"}\n").is_empty());
        let events = decoder.feed(b"\ndata: {\"x\"");
        assert_eq!(events, vec![json!({"field": "origin"})]);
        assert_eq!(decoder.feed(b":2}\n\n"), vec![json!({"x": 2})]);
    }

    #[test]
    fn test_skips_done_sentinel_and_garbage() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b": keep-alive\n\ndata: not json\n\ndata: [DONE]\n\n");
        assert!(events.is_empty());
    }

    #[test]
    fn test_crlf_framing_and_finish() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b"data: {\"n\":1}\r\n\r\ndata: {\"n\":2}");
        assert_eq!(events, vec![json!({"n": 1})]);
        assert_eq!(decoder.finish(), vec![json!({"n": 2})]);
        assert_eq!(decoder.pending(), 0);
    }
}
