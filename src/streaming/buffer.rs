//! Growable text buffer with a processed watermark and prefix compaction.

use crate::config::StreamingConfig;
use super::extractor::FrameExtractor;
use super::frame::Frame;

/// Per-session parsing state.
///
/// `processed_index` never exceeds `buffer.len()`; everything before it has
/// been consumed by the extractor.
#[derive(Debug, Clone, Default)]
pub struct ParserState {
    buffer: String,
    processed_index: usize,
    extractor: FrameExtractor,
}

impl ParserState {
    /// Buffered text, including the already processed prefix.
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Offset up to which the buffer is fully consumed.
    pub fn processed_index(&self) -> usize {
        self.processed_index
    }

    /// Whether the scan is paused inside a string literal.
    pub fn inside_string(&self) -> bool {
        self.extractor.inside_string()
    }

    /// Whether the scan is paused right after a backslash.
    pub fn escape_next(&self) -> bool {
        self.extractor.escape_next()
    }
}

/// Owns the session buffer: appends text, extracts frames, and compacts.
///
/// Compaction drops the processed prefix once the buffer is longer than
/// `compaction_threshold` and the watermark is past `min_reclaim`, so memory
/// stays bounded for long streams without ever discarding unprocessed text.
#[derive(Debug)]
pub struct BufferManager {
    state: ParserState,
    policy: StreamingConfig,
    compactions: usize,
    reclaimed: usize,
}

impl BufferManager {
    /// Create an empty buffer with the given retention policy.
    pub fn new(policy: StreamingConfig) -> Self {
        Self {
            state: ParserState::default(),
            policy,
            compactions: 0,
            reclaimed: 0,
        }
    }

    /// Append decoded text and return the frames it completed.
    pub fn append(&mut self, text: &str) -> Vec<Frame> {
        self.state.buffer.push_str(text);
        let frames = self.extract();
        self.compact_if_needed();
        frames
    }

    /// Run a last extraction pass and drop whatever remains unprocessed.
    ///
    /// A trailing object that never closed is discarded without emission.
    pub fn finish(&mut self) -> Vec<Frame> {
        let frames = self.extract();

        let leftover = self.state.buffer.len() - self.state.processed_index;
        if let Some(start) = self.state.extractor.open_frame_start() {
            tracing::debug!(
                partial_bytes = self.state.buffer.len() - start,
                "Discarding incomplete trailing frame"
            );
        } else if leftover > 0 {
            tracing::trace!(leftover, "Discarding unconsumed trailing text");
        }

        self.state = ParserState::default();
        frames
    }

    /// Current buffer length in bytes.
    pub fn len(&self) -> usize {
        self.state.buffer.len()
    }

    /// Returns true if nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.state.buffer.is_empty()
    }

    /// Offset up to which the buffer is consumed.
    pub fn watermark(&self) -> usize {
        self.state.processed_index
    }

    /// Read-only view of the parser state.
    pub fn state(&self) -> &ParserState {
        &self.state
    }

    /// Number of compactions performed.
    pub fn compactions(&self) -> usize {
        self.compactions
    }

    /// Total bytes discarded by compaction.
    pub fn reclaimed(&self) -> usize {
        self.reclaimed
    }

    fn extract(&mut self) -> Vec<Frame> {
        let ParserState {
            buffer,
            processed_index,
            extractor,
        } = &mut self.state;
        let extraction = extractor.extract(buffer, *processed_index);
        *processed_index = extraction.watermark;
        extraction.frames
    }

    fn compact_if_needed(&mut self) -> bool {
        let watermark = self.state.processed_index;
        if self.state.buffer.len() <= self.policy.compaction_threshold
            || watermark <= self.policy.min_reclaim
        {
            return false;
        }

        self.state.extractor.rebase(&self.state.buffer[..watermark]);
        self.state.buffer.drain(..watermark);
        self.state.processed_index = 0;
        self.compactions += 1;
        self.reclaimed += watermark;

        tracing::debug!(
            reclaimed = watermark,
            retained = self.state.buffer.len(),
            "Compacted stream buffer"
        );
        true
    }
}
