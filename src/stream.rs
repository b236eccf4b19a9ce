use std::fmt::Display;

use futures_util::{Stream, StreamExt};
use serde::Deserialize;
use tracing::debug;

use crate::error::SearchError;

/// One NDJSON record of a streamed `/api/generate` body.
#[derive(Debug, Deserialize)]
struct StreamLine {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    done: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed {
    /// More chunks are needed.
    Pending,
    /// A `done: true` record was seen; later chunks must be ignored.
    Done,
}

/// Reassembles generated text from arbitrarily fragmented NDJSON chunks.
///
/// Bytes are held until a newline arrives, so neither JSON records nor
/// multi-byte characters need to align with chunk boundaries.
#[derive(Debug, Default)]
pub struct StreamReader {
    carry: Vec<u8>,
    /// Prefix of `carry` already known to hold no newline.
    scanned: usize,
    text: String,
    done: bool,
}

impl StreamReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn feed(&mut self, chunk: &[u8]) -> Feed {
        if self.done {
            return Feed::Done;
        }
        self.carry.extend_from_slice(chunk);

        let mut start = 0;
        let mut from = self.scanned;
        while let Some(offset) = self.carry[from..].iter().position(|&b| b == b'\n') {
            let end = from + offset;
            let line = self.carry[start..end].to_vec();
            start = end + 1;
            from = start;
            if self.process_line(&line) {
                self.done = true;
                self.carry.clear();
                self.scanned = 0;
                return Feed::Done;
            }
        }
        self.carry.drain(..start);
        self.scanned = self.carry.len();
        Feed::Pending
    }

    /// Returns true when the line carries the completion flag.
    fn process_line(&mut self, line: &[u8]) -> bool {
        let Ok(line) = std::str::from_utf8(line) else {
            debug!("skipping non-utf8 stream line");
            return false;
        };
        let line = line.trim();
        if line.is_empty() {
            return false;
        }
        match serde_json::from_str::<StreamLine>(line) {
            Ok(record) => {
                if let Some(fragment) = record.response {
                    self.text.push_str(&fragment);
                }
                record.done
            }
            Err(e) => {
                debug!(error = %e, line, "skipping malformed stream line");
                false
            }
        }
    }

    /// Resolve at end of input. An unterminated trailing record still
    /// counts; without a completion record, no text means `EmptyResponse`.
    pub fn finish(mut self) -> Result<String, SearchError> {
        if !self.done && !self.carry.is_empty() {
            let rest = std::mem::take(&mut self.carry);
            self.scanned = 0;
            self.done = self.process_line(&rest);
        }
        if !self.done && self.text.is_empty() {
            return Err(SearchError::EmptyResponse);
        }
        Ok(self.text)
    }
}

/// Drive a byte-chunk stream through a [`StreamReader`], stopping at the
/// completion record or at the end of the stream.
pub async fn read_stream<S, B, E>(stream: S) -> Result<String, SearchError>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
{
    let mut stream = std::pin::pin!(stream);
    let mut reader = StreamReader::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| SearchError::Transport(e.to_string()))?;
        if reader.feed(chunk.as_ref()) == Feed::Done {
            break;
        }
    }
    reader.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;
    use proptest::prelude::*;

    fn feed_all(chunks: &[&[u8]]) -> Result<String, SearchError> {
        let mut reader = StreamReader::new();
        for chunk in chunks {
            if reader.feed(chunk) == Feed::Done {
                break;
            }
        }
        reader.finish()
    }

    /// NDJSON encoding of `text`, one record per fragment, ending with done.
    fn encode(fragments: &[String]) -> Vec<u8> {
        let mut wire = String::new();
        for f in fragments {
            wire.push_str(&serde_json::json!({ "response": f, "done": false }).to_string());
            wire.push('\n');
        }
        wire.push_str(r#"{"response":"","done":true}"#);
        wire.push('\n');
        wire.into_bytes()
    }

    #[test]
    fn record_split_across_chunks() {
        let text = feed_all(&[
            br#"{"response":"buk"#,
            b"hari:1:1\"}\n{\"done\":true}\n",
        ])
        .unwrap();
        assert_eq!(text, "bukhari:1:1");
    }

    #[test]
    fn stops_consuming_after_done() {
        let mut reader = StreamReader::new();
        let feed = reader.feed(b"{\"response\":\"a\"}\n{\"done\":true}\n{\"response\":\"b\"}\n");
        assert_eq!(feed, Feed::Done);
        assert_eq!(reader.feed(b"{\"response\":\"c\"}\n"), Feed::Done);
        assert_eq!(reader.finish().unwrap(), "a");
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let text = feed_all(&[
            b"garbage\n{\"response\":\"muslim\"}\n{\"respo\n",
            b"{\"response\":\":2:10\"}\r\n\n{\"done\":true}\n",
        ])
        .unwrap();
        assert_eq!(text, "muslim:2:10");
    }

    #[test]
    fn lenient_completion_without_done() {
        let text = feed_all(&[b"{\"response\":\"nasai:3:4\"}\n"]).unwrap();
        assert_eq!(text, "nasai:3:4");
    }

    #[test]
    fn trailing_unterminated_record_is_processed() {
        let text = feed_all(&[b"{\"response\":\"ibnmajah:1:2\",\"done\":true}"]).unwrap();
        assert_eq!(text, "ibnmajah:1:2");
    }

    #[test]
    fn empty_stream_is_empty_response() {
        assert_eq!(feed_all(&[]), Err(SearchError::EmptyResponse));
        assert_eq!(
            feed_all(&[b"{\"done\":false}\n", b"{\"response\":\"\"}\n"]),
            Err(SearchError::EmptyResponse)
        );
    }

    #[test]
    fn done_with_no_text_resolves_empty() {
        assert_eq!(
            feed_all(&[b"{\"response\":\"\",\"done\":true}\n"]),
            Ok(String::new())
        );
    }

    #[test]
    fn byte_at_a_time_scans_each_byte_once() {
        let long = "bukhari:1:1, ".repeat(200);
        let wire = encode(&[long.clone()]);
        let mut reader = StreamReader::new();
        let mut feed = Feed::Pending;
        for byte in &wire {
            feed = reader.feed(std::slice::from_ref(byte));
            if feed == Feed::Done {
                break;
            }
            // Everything still buffered has been checked for a newline
            assert_eq!(reader.scanned, reader.carry.len());
        }
        assert_eq!(feed, Feed::Done);
        assert_eq!(reader.finish().unwrap(), long);
    }

    #[test]
    fn multibyte_text_split_mid_character() {
        let wire = encode(&["حديث".to_string(), " tirmidhi:5:6".to_string()]);
        // Split inside the first Arabic character's UTF-8 encoding
        let split = wire.iter().position(|&b| b >= 0x80).unwrap() + 1;
        let text = feed_all(&[&wire[..split], &wire[split..]]).unwrap();
        assert_eq!(text, "حديث tirmidhi:5:6");
    }

    #[tokio::test]
    async fn read_stream_collects_chunks() {
        let chunks: Vec<Result<Vec<u8>, std::io::Error>> = vec![
            Ok(b"{\"response\":\"abu\"}\n{\"resp".to_vec()),
            Ok(b"onse\":\"dawud:1:1\"}\n".to_vec()),
            Ok(b"{\"done\":true}\n".to_vec()),
        ];
        let text = read_stream(stream::iter(chunks)).await.unwrap();
        assert_eq!(text, "abudawud:1:1");
    }

    #[tokio::test]
    async fn read_stream_surfaces_transport_errors() {
        let chunks: Vec<Result<Vec<u8>, std::io::Error>> = vec![
            Ok(b"{\"response\":\"x\"}\n".to_vec()),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
        ];
        let err = read_stream(stream::iter(chunks)).await.unwrap_err();
        assert_eq!(err.code(), "Transport");
    }

    proptest! {
        #[test]
        fn reassembles_under_any_chunking(
            fragments in prop::collection::vec("[a-z:0-9 ,\u{0600}-\u{06FF}\"\\\\\n]{0,12}", 1..8),
            cuts in prop::collection::vec(any::<prop::sample::Index>(), 0..16),
        ) {
            let expected: String = fragments.concat();

            let wire = encode(&fragments);
            let mut points: Vec<usize> = cuts.iter().map(|i| i.index(wire.len() + 1)).collect();
            points.push(0);
            points.push(wire.len());
            points.sort_unstable();
            points.dedup();

            let chunks: Vec<&[u8]> = points.windows(2).map(|w| &wire[w[0]..w[1]]).collect();
            prop_assert_eq!(feed_all(&chunks).unwrap(), expected);
        }
    }
}
