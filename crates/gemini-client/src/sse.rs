//! Server-Sent Events decoding for `streamGenerateContent?alt=sse`.
//!
//! Only the `data` field matters here; `event`, `id`, `retry` and comment
//! lines are ignored. Multi-line `data` fields are joined with `\n`.

use std::collections::VecDeque;

use futures::stream::{self, Stream, StreamExt};

use crate::{ChunkStream, ClientError, GenerateContentResponse};

/// Incremental decoder. Bytes may be split anywhere, including inside a
/// UTF-8 sequence; lines are only decoded once complete.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
    /// `buf[..scanned]` is known to contain no newline.
    scanned: usize,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes, returning the `data` payloads of every event completed by them.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(bytes);
        let mut events = Vec::new();
        let mut start = 0;
        let mut from = self.scanned;
        while let Some(offset) = self.buf[from..].iter().position(|b| *b == b'\n') {
            let end = from + offset;
            let line = String::from_utf8_lossy(&self.buf[start..end]).into_owned();
            self.process_line(line.trim_end_matches('\r'), &mut events);
            start = end + 1;
            from = start;
        }
        self.buf.drain(..start);
        self.scanned = self.buf.len();
        events
    }

    /// Flush a trailing event that was not terminated by a blank line.
    pub fn finish(&mut self) -> Vec<String> {
        let mut events = Vec::new();
        if !self.buf.is_empty() {
            let raw = std::mem::take(&mut self.buf);
            self.scanned = 0;
            let line = String::from_utf8_lossy(&raw);
            self.process_line(line.trim_end_matches(|c| c == '\n' || c == '\r'), &mut events);
        }
        self.dispatch(&mut events);
        events
    }

    fn process_line(&mut self, line: &str, events: &mut Vec<String>) {
        if line.is_empty() {
            self.dispatch(events);
            return;
        }
        if line.starts_with(':') {
            return;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        if field == "data" {
            self.data.push(value.to_string());
        }
    }

    fn dispatch(&mut self, events: &mut Vec<String>) {
        if !self.data.is_empty() {
            events.push(self.data.join("\n"));
            self.data.clear();
        }
    }
}

struct DecodeState<S> {
    bytes: S,
    decoder: SseDecoder,
    pending: VecDeque<String>,
    finished: bool,
}

/// Turn a byte stream into a stream of decoded response chunks.
///
/// A transport error ends the stream after being yielded once.
pub fn decode_chunks<S, B, E>(bytes: S) -> ChunkStream
where
    S: Stream<Item = Result<B, E>> + Send + Unpin + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<ClientError> + Send + 'static,
{
    let state = DecodeState {
        bytes,
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut st| async move {
        loop {
            if let Some(data) = st.pending.pop_front() {
                let item = serde_json::from_str::<GenerateContentResponse>(&data)
                    .map_err(ClientError::from);
                return Some((item, st));
            }
            if st.finished {
                return None;
            }
            match st.bytes.next().await {
                Some(Ok(chunk)) => {
                    let events = st.decoder.feed(chunk.as_ref());
                    st.pending.extend(events);
                }
                Some(Err(e)) => {
                    st.finished = true;
                    st.pending.clear();
                    return Some((Err(e.into()), st));
                }
                None => {
                    st.finished = true;
                    let events = st.decoder.finish();
                    st.pending.extend(events);
                }
            }
        }
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_split_across_feeds() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"data: {\"a\"").is_empty());
        assert!(decoder.feed(b":1}\n").is_empty());
        assert_eq!(decoder.feed(b"\ndata: x\n\n"), vec!["{\"a\":1}", "x"]);
    }

    #[test]
    fn crlf_comments_and_other_fields() {
        let mut decoder = SseDecoder::new();
        let events =
            decoder.feed(b": keep-alive\r\nevent: message\r\ndata: one\r\ndata: two\r\n\r\n");
        assert_eq!(events, vec!["one\ntwo"]);
    }

    #[test]
    fn utf8_split_inside_character() {
        let payload = "data: こんにちは\n\n".as_bytes();
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(&payload[..8]).is_empty());
        assert_eq!(decoder.feed(&payload[8..]), vec!["こんにちは"]);
    }

    #[test]
    fn long_line_fed_in_small_pieces() {
        let text = "x".repeat(64 * 1024);
        let payload = format!("data: {}\r\n\r\ndata: next\n\n", text);
        let mut decoder = SseDecoder::new();
        let mut events = Vec::new();
        for piece in payload.as_bytes().chunks(7) {
            events.extend(decoder.feed(piece));
        }
        assert_eq!(events, vec![text, "next".to_string()]);
        assert!(decoder.buf.is_empty());
        assert_eq!(decoder.scanned, 0);
    }

    #[test]
    fn finish_flushes_unterminated_event() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"data: tail").is_empty());
        assert_eq!(decoder.finish(), vec!["tail"]);
        assert!(decoder.finish().is_empty());
    }

    #[tokio::test]
    async fn decode_chunks_yields_responses_in_order() {
        let body: Vec<Result<Vec<u8>, ClientError>> = vec![
            Ok(b"data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"Hel\"}]}}]}\n\n".to_vec()),
            Ok(b"data: {\"usageMetadata\":{}}\n\ndata: {\"candidates\":[{\"content\":".to_vec()),
            Ok(b"{\"parts\":[{\"text\":\"lo\"}]}}]}\n\n".to_vec()),
        ];
        let chunks: Vec<_> = decode_chunks(stream::iter(body)).collect().await;
        assert_eq!(chunks.len(), 3);
        let texts: Vec<Option<String>> = chunks.into_iter().map(|c| c.unwrap().text()).collect();
        assert_eq!(texts, vec![Some("Hel".to_string()), None, Some("lo".to_string())]);
    }

    #[tokio::test]
    async fn decode_chunks_stops_after_transport_error() {
        let body: Vec<Result<Vec<u8>, ClientError>> = vec![
            Ok(b"data: {}\n\n".to_vec()),
            Err(ClientError::Status {
                status: 500,
                body: "boom".into(),
            }),
            Ok(b"data: {}\n\n".to_vec()),
        ];
        let chunks: Vec<_> = decode_chunks(stream::iter(body)).collect().await;
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].is_ok());
        assert!(chunks[1].is_err());
    }

    #[tokio::test]
    async fn decode_chunks_reports_bad_json() {
        let body: Vec<Result<&'static [u8], ClientError>> = vec![Ok(&b"data: not json\n\n"[..])];
        let chunks: Vec<_> = decode_chunks(stream::iter(body)).collect().await;
        assert!(matches!(chunks[0], Err(ClientError::Decode(_))));
    }
}
