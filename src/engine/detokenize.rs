//! Incremental detokenization of byte pieces into text fragments.
//!
//! Incomplete UTF-8 sequences are held inside the decoder until the bytes
//! that complete them arrive, so a fragment never ends mid-character.

use encoding_rs::{CoderResult, Decoder, UTF_8};

pub struct StreamDetokenizer {
    decoder: Decoder,
}

impl StreamDetokenizer {
    pub fn new() -> Self {
        Self {
            decoder: UTF_8.new_decoder_without_bom_handling(),
        }
    }

    /// Feed one token's bytes; returns the text that became complete.
    pub fn push(&mut self, bytes: &[u8]) -> String {
        self.decode(bytes, false)
    }

    /// Flush anything still held back (lossily) and start over.
    pub fn finish(&mut self) -> String {
        let text = self.decode(&[], true);
        self.decoder = UTF_8.new_decoder_without_bom_handling();
        text
    }

    fn decode(&mut self, bytes: &[u8], last: bool) -> String {
        let capacity = self
            .decoder
            .max_utf8_buffer_length(bytes.len())
            .unwrap_or(bytes.len() * 3 + 4);
        self.decode_with_capacity(bytes, last, capacity)
    }

    fn decode_with_capacity(&mut self, mut bytes: &[u8], last: bool, capacity: usize) -> String {
        let mut out = String::with_capacity(capacity);
        loop {
            let (result, read, _) = self.decoder.decode_to_string(bytes, &mut out, last);
            bytes = &bytes[read..];
            match result {
                CoderResult::InputEmpty => return out,
                CoderResult::OutputFull => out.reserve(bytes.len() * 3 + 4),
            }
        }
    }
}

impl Default for StreamDetokenizer {
    fn default() -> Self {
        Self::new()
    }
}
