//! Byte-level framing for the `data: <json>` record stream.

/// Incremental splitter for `\n`-delimited `data:` records.
///
/// Bytes after the last newline stay buffered across reads, so multi-byte
/// UTF-8 sequences and records split across read boundaries are reassembled
/// before any text decoding happens.
#[derive(Default)]
pub(crate) struct DataLineDecoder {
    buf: Vec<u8>,
}

impl DataLineDecoder {
    /// Appends raw bytes and returns the payloads of any completed `data:`
    /// lines. Non-data lines are dropped.
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);
        let mut payloads = Vec::new();
        while let Some(newline) = self.buf.iter().position(|byte| *byte == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=newline).collect();
            if let Some(payload) = parse_data_line(&line[..line.len() - 1]) {
                payloads.push(payload);
            }
        }
        payloads
    }

    /// Flushes a trailing record not terminated by a newline.
    ///
    /// Call once at end-of-stream so the final line is not lost.
    pub fn flush(&mut self) -> Option<String> {
        if self.buf.is_empty() {
            return None;
        }
        let line = std::mem::take(&mut self.buf);
        parse_data_line(&line)
    }
}

fn parse_data_line(line: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(line);
    let tail = text.trim_end_matches('\r').strip_prefix("data:")?;
    Some(tail.trim_start().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_payloads_and_drops_other_lines() {
        let mut decoder = DataLineDecoder::default();
        let payloads = decoder.push_chunk(b"event: message\ndata: {\"a\":1}\n\ndata: [DONE]\n");
        assert_eq!(payloads, vec!["{\"a\":1}".to_string(), "[DONE]".to_string()]);
    }

    #[test]
    fn reassembles_record_split_across_reads() {
        let mut decoder = DataLineDecoder::default();
        assert!(decoder.push_chunk(b"data: {\"content\":\"hel").is_empty());
        let payloads = decoder.push_chunk(b"lo\"}\n");
        assert_eq!(payloads, vec!["{\"content\":\"hello\"}".to_string()]);
    }

    #[test]
    fn reassembles_multibyte_character_split_across_reads() {
        let text = "data: {\"content\":\"héllo\"}\n";
        let bytes = text.as_bytes();
        // Split in the middle of the two-byte 'é'.
        let split = text.find('é').expect("é") + 1;
        let mut decoder = DataLineDecoder::default();
        assert!(decoder.push_chunk(&bytes[..split]).is_empty());
        let payloads = decoder.push_chunk(&bytes[split..]);
        assert_eq!(payloads, vec!["{\"content\":\"héllo\"}".to_string()]);
    }

    #[test]
    fn strips_carriage_returns_and_optional_space() {
        let mut decoder = DataLineDecoder::default();
        let payloads = decoder.push_chunk(b"data:{\"a\":1}\r\ndata:  padded\r\n");
        assert_eq!(payloads, vec!["{\"a\":1}".to_string(), "padded".to_string()]);
    }

    #[test]
    fn flush_recovers_trailing_record_without_newline() {
        let mut decoder = DataLineDecoder::default();
        assert!(decoder.push_chunk(b"data: tail").is_empty());
        assert_eq!(decoder.flush(), Some("tail".to_string()));
        assert_eq!(decoder.flush(), None);
    }

    #[test]
    fn flush_ignores_trailing_non_data_line() {
        let mut decoder = DataLineDecoder::default();
        assert!(decoder.push_chunk(b": keepalive").is_empty());
        assert_eq!(decoder.flush(), None);
    }
}
