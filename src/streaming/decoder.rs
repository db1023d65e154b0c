//! Incremental UTF-8 decoding of response body chunks.

use crate::error::StreamError;

/// Longest prefix of a UTF-8 sequence that can still be waiting for bytes.
const MAX_PENDING: usize = 3;

/// Converts byte chunks to text, carrying split multi-byte sequences forward.
///
/// A sequence cut off at the end of one chunk is held back and completed by
/// the next chunk. A sequence that can never become valid is replaced with
/// U+FFFD. Only bytes still pending at [`flush`](Self::flush) are an error.
#[derive(Debug, Default)]
pub struct ByteDecoder {
    pending: Vec<u8>,
    replaced: usize,
}

impl ByteDecoder {
    /// Create an empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the next chunk, returning all text that is complete so far.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        if self.pending.is_empty() {
            return self.decode_complete(chunk);
        }

        let mut joined = std::mem::take(&mut self.pending);
        joined.extend_from_slice(chunk);
        self.decode_complete(&joined)
    }

    /// Finish decoding. Fails if an incomplete sequence is still pending.
    pub fn flush(&mut self) -> Result<(), StreamError> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let pending = self.pending.len();
        self.pending.clear();
        Err(StreamError::IncompleteCharacter { pending })
    }

    /// Number of bytes held back waiting for the rest of their character.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Number of invalid sequences replaced with U+FFFD so far.
    pub fn replaced(&self) -> usize {
        self.replaced
    }

    fn decode_complete(&mut self, mut input: &[u8]) -> String {
        let mut text = String::with_capacity(input.len());

        loop {
            match std::str::from_utf8(input) {
                Ok(valid) => {
                    text.push_str(valid);
                    break;
                }
                Err(error) => {
                    let (valid, rest) = input.split_at(error.valid_up_to());
                    if let Ok(valid) = std::str::from_utf8(valid) {
                        text.push_str(valid);
                    }
                    match error.error_len() {
                        Some(invalid) => {
                            self.replaced += 1;
                            tracing::warn!(
                                invalid_bytes = invalid,
                                "Replacing invalid UTF-8 sequence in stream"
                            );
                            text.push(char::REPLACEMENT_CHARACTER);
                            input = &rest[invalid..];
                        }
                        None => {
                            debug_assert!(rest.len() <= MAX_PENDING);
                            self.pending.extend_from_slice(rest);
                            break;
                        }
                    }
                }
            }
        }

        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_passes_through() {
        let mut decoder = ByteDecoder::new();
        assert_eq!(decoder.decode(b"{\"content\":\"hi\"}"), "{\"content\":\"hi\"}");
        assert!(decoder.flush().is_ok());
    }

    #[test]
    fn test_two_byte_character_split_across_chunks() {
        let bytes = "café".as_bytes();
        let (first, second) = bytes.split_at(bytes.len() - 1);

        let mut decoder = ByteDecoder::new();
        assert_eq!(decoder.decode(first), "caf");
        assert_eq!(decoder.pending_len(), 1);
        assert_eq!(decoder.decode(second), "é");
        assert_eq!(decoder.pending_len(), 0);
        assert!(decoder.flush().is_ok());
    }

    #[test]
    fn test_four_byte_character_split_into_single_bytes() {
        let bytes = "a🦀b".as_bytes();
        let mut decoder = ByteDecoder::new();
        let text: String = bytes.iter().map(|b| decoder.decode(std::slice::from_ref(b))).collect();
        assert_eq!(text, "a🦀b");
        assert!(decoder.flush().is_ok());
    }

    #[test]
    fn test_invalid_interior_byte_is_replaced() {
        let mut decoder = ByteDecoder::new();
        assert_eq!(decoder.decode(b"a\xFFb"), "a\u{FFFD}b");
        assert_eq!(decoder.replaced(), 1);
        assert!(decoder.flush().is_ok());
    }

    #[test]
    fn test_truncated_sequence_fails_at_flush() {
        let mut decoder = ByteDecoder::new();
        let bytes = "€".as_bytes();
        assert_eq!(decoder.decode(&bytes[..2]), "");
        assert_eq!(
            decoder.flush(),
            Err(StreamError::IncompleteCharacter { pending: 2 })
        );
        assert_eq!(decoder.pending_len(), 0);
    }
}
