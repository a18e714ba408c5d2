//! Incremental frame reassembly from raw network chunks.

use super::GENERIC_EVENT;

/// One raw `{event, data}` unit from the wire, before typing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Event name; defaults to `"message"` when the line is absent.
    pub event: String,
    /// Single-line payload; empty when the frame carried none.
    pub data: String,
}

/// Buffers transport bytes and splits them into complete frames.
///
/// The transport hands over chunks at arbitrary boundaries, possibly
/// mid-line or even mid-code-point, so the reader accumulates raw
/// bytes and only decodes a segment once its blank-line terminator has
/// arrived. Feeding the same bytes through any chunking yields the
/// same frame sequence.
#[derive(Debug, Default)]
pub struct FrameReader {
    buf: Vec<u8>,
}

impl FrameReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every frame completed by it.
    ///
    /// An incomplete trailing segment stays buffered for the next call.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Frame> {
        self.buf.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some((pos, len)) = find_separator(&self.buf) {
            let segment: Vec<u8> = self.buf.drain(..pos + len).collect();
            if let Some(frame) = parse_segment(&segment[..pos]) {
                frames.push(frame);
            }
        }

        frames
    }

    /// Bytes currently held back as an incomplete frame.
    pub fn pending(&self) -> &[u8] {
        &self.buf
    }
}

/// Position and byte length of the next blank-line separator.
///
/// Both bare-LF (`\n\n`) and CRLF (`\r\n\r\n`) framing occur on the
/// wire; the leading `\r` of a CRLF line ending belongs to the
/// preceding line and is stripped during parsing.
fn find_separator(buf: &[u8]) -> Option<(usize, usize)> {
    for (i, &b) in buf.iter().enumerate() {
        if b != b'\n' {
            continue;
        }
        if buf.get(i + 1) == Some(&b'\n') {
            return Some((i, 2));
        }
        if buf.get(i + 1) == Some(&b'\r') && buf.get(i + 2) == Some(&b'\n') {
            return Some((i, 3));
        }
    }
    None
}

/// Parse one complete segment into a frame.
///
/// Returns `None` for empty segments (stray separators on the wire).
fn parse_segment(segment: &[u8]) -> Option<Frame> {
    let text = String::from_utf8_lossy(segment);

    let mut event: Option<String> = None;
    let mut data: Option<String> = None;

    for line in text.lines() {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if let Some(value) = field_value(line, "event") {
            event = Some(value.to_string());
        } else if let Some(value) = field_value(line, "data") {
            if data.is_none() {
                data = Some(value.to_string());
            }
        }
    }

    if event.is_none() && data.is_none() {
        return None;
    }

    Some(Frame {
        event: event.unwrap_or_else(|| GENERIC_EVENT.to_string()),
        data: data.unwrap_or_default(),
    })
}

/// Extract the value of `<field>:` from a line, stripping the single
/// optional space after the colon.
fn field_value<'a>(line: &'a str, field: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(field)?;
    let value = rest.strip_prefix(':')?;
    Some(value.strip_prefix(' ').unwrap_or(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_frame() {
        let mut reader = FrameReader::new();
        let frames = reader.push(b"event: text\ndata: hello\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event, "text");
        assert_eq!(frames[0].data, "hello");
    }

    #[test]
    fn event_line_absent_defaults_to_message() {
        let mut reader = FrameReader::new();
        let frames = reader.push(b"data: hello\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event, "message");
        assert_eq!(frames[0].data, "hello");
    }

    #[test]
    fn partial_tail_is_retained() {
        let mut reader = FrameReader::new();
        let frames = reader.push(b"event: text\ndata: hel");
        assert!(frames.is_empty());
        assert!(!reader.pending().is_empty());

        let frames = reader.push(b"lo\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "hello");
        assert!(reader.pending().is_empty());
    }

    #[test]
    fn chunk_split_mid_code_point() {
        let mut reader = FrameReader::new();
        let bytes = "event: text\ndata: caf\u{e9}\n\n".as_bytes();
        // Split inside the two-byte e-acute sequence.
        let split = bytes.len() - 4;
        assert!(reader.push(&bytes[..split]).is_empty());
        let frames = reader.push(&bytes[split..]);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "caf\u{e9}");
    }

    #[test]
    fn stray_separator_produces_no_frame() {
        let mut reader = FrameReader::new();
        let frames = reader.push(b"\n\nevent: done\ndata: \n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event, "done");
    }

    #[test]
    fn crlf_terminated_frame_parses() {
        let mut reader = FrameReader::new();
        let frames = reader.push(b"event: text\r\ndata: hi\r\n\r\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event, "text");
        assert_eq!(frames[0].data, "hi");
        assert!(reader.pending().is_empty());
    }

    #[test]
    fn crlf_separator_split_across_chunks() {
        let mut reader = FrameReader::new();
        assert!(reader.push(b"data: hi\r\n").is_empty());
        let frames = reader.push(b"\r\ndata: again\r\n\r\n");
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].data, "hi");
        assert_eq!(frames[1].data, "again");
    }

    #[test]
    fn value_without_space_after_colon() {
        let mut reader = FrameReader::new();
        let frames = reader.push(b"event:text\ndata:hi\n\n");
        assert_eq!(frames[0].event, "text");
        assert_eq!(frames[0].data, "hi");
    }
}
