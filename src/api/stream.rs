//! Streaming bodies: counted upload chunks out, server-sent events in.

const CHUNK_SIZE: usize = 64 * 1024;

/// Request body that calls `on_chunk` with each chunk's length as the
/// transport pulls it.
pub(crate) fn counted_body(
    bytes: &[u8],
    on_chunk: impl Fn(u64) + Send + Sync + 'static,
) -> reqwest::Body {
    let chunks: Vec<Vec<u8>> = bytes.chunks(CHUNK_SIZE).map(<[u8]>::to_vec).collect();
    let stream = futures_util::stream::iter(chunks.into_iter().map(move |chunk| {
        on_chunk(chunk.len() as u64);
        Ok::<_, std::io::Error>(chunk)
    }));
    reqwest::Body::wrap_stream(stream)
}

/// Incremental `text/event-stream` decoder yielding each event's `data`.
///
/// Works on bytes so a multi-byte character split across network chunks
/// is only decoded once the whole event has arrived.
#[derive(Debug, Default)]
pub(crate) struct EventStreamDecoder {
    buffer: Vec<u8>,
}

impl EventStreamDecoder {
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend(chunk.iter().copied().filter(|b| *b != b'\r'));

        let mut events = Vec::new();
        while let Some(end) = find_blank_line(&self.buffer) {
            let block: Vec<u8> = self.buffer.drain(..end + 2).collect();
            if let Some(data) = event_data(&block[..end]) {
                events.push(data);
            }
        }
        events
    }

    /// Data of a final event the server did not terminate with a blank line.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        event_data(&rest)
    }
}

fn find_blank_line(buffer: &[u8]) -> Option<usize> {
    buffer.windows(2).position(|w| w == b"\n\n")
}

fn event_data(block: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(block);
    let lines: Vec<&str> = text
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| data.strip_prefix(' ').unwrap_or(data))
        .collect();
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_events_split_across_chunks() {
        let mut decoder = EventStreamDecoder::default();
        assert!(decoder.push(b"data: {\"phase\": \"o").is_empty());
        let events = decoder.push(b"cr\"}\n\ndata: {\"phase\": \"translation\"}\n\n");
        assert_eq!(events, vec![r#"{"phase": "ocr"}"#, r#"{"phase": "translation"}"#]);
        assert!(decoder.finish().is_none());
    }

    #[test]
    fn multibyte_text_survives_chunk_boundary() {
        let frame = "data: {\"t\": \"çeviri\"}\n\n".as_bytes();
        let split = frame.iter().position(|b| *b >= 0x80).unwrap() + 1;
        let mut decoder = EventStreamDecoder::default();
        assert!(decoder.push(&frame[..split]).is_empty());
        assert_eq!(decoder.push(&frame[split..]), vec!["{\"t\": \"çeviri\"}"]);
    }

    #[test]
    fn crlf_and_comments_are_tolerated() {
        let mut decoder = EventStreamDecoder::default();
        let events = decoder.push(b": keep-alive\r\n\r\ndata: 1\r\n\r\n");
        assert_eq!(events, vec!["1"]);
    }

    #[test]
    fn unterminated_final_event_is_recovered() {
        let mut decoder = EventStreamDecoder::default();
        assert!(decoder.push(b"data: {\"phase\": \"complete\"}").is_empty());
        assert_eq!(decoder.finish().as_deref(), Some(r#"{"phase": "complete"}"#));
    }
}
