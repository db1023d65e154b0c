//! Incremental extraction of top-level JSON objects from accumulated text.
//!
//! The response body is a sequence of JSON object literals, optionally mixed
//! with SSE framing such as `data: ` prefixes, `: heartbeat` comments or
//! `event:`/`id:`/`retry:` lines. Chunk boundaries carry no meaning: an object
//! may be split anywhere, including inside a string or an escape sequence.
//!
//! The extractor finds each candidate `{`, then walks forward counting brace
//! depth while tracking string and escape context, so braces and quotes inside
//! string values never affect the depth. A balanced literal is decoded; if the
//! literal is not valid JSON the scan resumes one byte past its opening brace.
//! An unbalanced literal at the end of the text stays open until more text
//! arrives.

use serde_json::{Map, Value};

use super::frame::Frame;

/// Line prefixes that mark SSE comment and metadata lines.
const METADATA_PREFIXES: [&[u8]; 4] = [b":", b"event:", b"id:", b"retry:"];

/// Result of one extraction pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Frames completed during this pass, in buffer order.
    pub frames: Vec<Frame>,
    /// Offset just past the last successfully decoded object, or the start
    /// offset if none was decoded.
    pub watermark: usize,
}

/// A candidate object whose closing brace has not been seen yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenFrame {
    start: usize,
    position: usize,
    depth: usize,
    inside_string: bool,
    escape_next: bool,
}

impl OpenFrame {
    fn at(start: usize) -> Self {
        Self {
            start,
            position: start,
            depth: 0,
            inside_string: false,
            escape_next: false,
        }
    }
}

enum Walk {
    Open(OpenFrame),
    Closed { start: usize, end: usize },
}

/// Scanner that finds complete JSON objects in a growing buffer.
///
/// Scan progress is kept between calls so an object split across appends is
/// continued where the previous pass stopped. The buffer handed to
/// [`extract`](Self::extract) must only grow between calls, except for
/// prefix removal reported through [`rebase`](Self::rebase).
#[derive(Debug, Clone, Default)]
pub struct FrameExtractor {
    cursor: usize,
    open: Option<OpenFrame>,
    malformed: usize,
    /// Offset 0 of the buffer is not a line start because a prefix of the
    /// line was compacted away.
    mid_line: bool,
}

impl FrameExtractor {
    /// Create an extractor positioned at the start of an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan `buffer` from `start` and return every object completed so far.
    pub fn extract(&mut self, buffer: &str, start: usize) -> Extraction {
        let bytes = buffer.as_bytes();
        let start = start.min(bytes.len());

        if self.open.is_some_and(|open| open.start < start || open.position > bytes.len()) {
            self.open = None;
        }
        let mut search_from = self.cursor.clamp(start, bytes.len());
        let mut frames = Vec::new();
        let mut watermark = start;

        loop {
            let open = match self.open.take() {
                Some(open) => open,
                None => match next_candidate(bytes, search_from, self.mid_line) {
                    Some(candidate) => OpenFrame::at(candidate),
                    None => {
                        search_from = bytes.len();
                        break;
                    }
                },
            };

            match walk(bytes, open) {
                Walk::Open(open) => {
                    search_from = open.start;
                    self.open = Some(open);
                    break;
                }
                Walk::Closed { start, end } => {
                    let literal = &buffer[start..=end];
                    match serde_json::from_str::<Map<String, Value>>(literal) {
                        Ok(object) => {
                            match Frame::from_object(object) {
                                Some(frame) => frames.push(frame),
                                None => tracing::debug!(
                                    offset = start,
                                    len = literal.len(),
                                    "Discarding frame without content fields"
                                ),
                            }
                            watermark = end + 1;
                            search_from = end + 1;
                        }
                        Err(error) => {
                            self.malformed += 1;
                            tracing::debug!(
                                offset = start,
                                len = literal.len(),
                                error = %error,
                                "Skipping malformed candidate object"
                            );
                            search_from = start + 1;
                        }
                    }
                }
            }
        }

        self.cursor = search_from;
        Extraction { frames, watermark }
    }

    /// Shift all offsets left after `removed` was cut from the buffer front.
    ///
    /// The cut text is only inspected for whether it ended a line, so the
    /// metadata-line check keeps judging the retained text by its real line.
    pub fn rebase(&mut self, removed: &str) {
        if !removed.is_empty() {
            self.mid_line = !removed.ends_with('\n');
        }
        let removed = removed.len();
        self.cursor = self.cursor.saturating_sub(removed);
        if let Some(open) = self.open.as_mut() {
            open.start = open.start.saturating_sub(removed);
            open.position = open.position.saturating_sub(removed);
        }
    }

    /// Offset of the object currently waiting for more text, if any.
    pub fn open_frame_start(&self) -> Option<usize> {
        self.open.map(|open| open.start)
    }

    /// Whether the scan stopped inside a string literal.
    pub fn inside_string(&self) -> bool {
        self.open.is_some_and(|open| open.inside_string)
    }

    /// Whether the scan stopped right after a backslash inside a string.
    pub fn escape_next(&self) -> bool {
        self.open.is_some_and(|open| open.escape_next)
    }

    /// Number of balanced candidates that failed to decode.
    pub fn malformed_count(&self) -> usize {
        self.malformed
    }

}

/// One-shot extraction over a complete buffer.
pub fn extract_frames(buffer: &str, start: usize) -> Extraction {
    FrameExtractor::new().extract(buffer, start)
}

/// Find the next structural `{` at or after `from`.
fn next_candidate(bytes: &[u8], mut from: usize, mid_line: bool) -> Option<usize> {
    while from < bytes.len() {
        let index = from + bytes[from..].iter().position(|&b| b == b'{')?;
        if !is_metadata_line(bytes, index, mid_line) {
            return Some(index);
        }
        tracing::debug!(offset = index, "Skipping brace on SSE metadata line");
        from = index + 1;
    }
    None
}

/// A line that already yielded a frame is never a metadata line, so text
/// left over from a compacted line never is either.
fn is_metadata_line(bytes: &[u8], index: usize, mid_line: bool) -> bool {
    let line_start = match bytes[..index].iter().rposition(|&b| b == b'\n') {
        Some(newline) => newline + 1,
        None if mid_line => return false,
        None => 0,
    };
    let line = &bytes[line_start..index];
    METADATA_PREFIXES.iter().any(|prefix| line.starts_with(prefix))
}

fn walk(bytes: &[u8], mut open: OpenFrame) -> Walk {
    while open.position < bytes.len() {
        let byte = bytes[open.position];
        open.position += 1;

        if open.escape_next {
            open.escape_next = false;
            continue;
        }

        if open.inside_string {
            match byte {
                b'\\' => open.escape_next = true,
                b'"' => open.inside_string = false,
                _ => {}
            }
            continue;
        }

        match byte {
            b'"' => open.inside_string = true,
            b'{' => open.depth += 1,
            b'}' => {
                open.depth = open.depth.saturating_sub(1);
                if open.depth == 0 {
                    return Walk::Closed {
                        start: open.start,
                        end: open.position - 1,
                    };
                }
            }
            _ => {}
        }
    }

    Walk::Open(open)
}
