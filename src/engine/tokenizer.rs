//! Tokenization interface and a vocabulary-table tokenizer.
//!
//! The engine only needs `encode` (once per stop string) and `decode`
//! (once per processed token). Decoding an incomplete multi-byte sequence
//! must not fail; it yields replacement characters instead.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TokenizerError {
    #[error("Encoding failed: {0}")]
    EncodingFailed(String),

    #[error("Decoding failed: {0}")]
    DecodingFailed(String),

    #[error("Invalid token ID: {0}")]
    InvalidToken(u32),
}

/// Text <-> token id conversion used by the stop processor.
pub trait Tokenizer: Send + Sync {
    /// Encode text to token IDs.
    fn encode(&self, text: &str) -> Result<Vec<u32>, TokenizerError>;

    /// Decode token IDs to text. Not guaranteed to be a per-token concatenation.
    fn decode(&self, tokens: &[u32]) -> Result<String, TokenizerError>;

    /// Check if token is end-of-sequence.
    fn is_eos(&self, _token: u32) -> bool {
        false
    }
}

/// One vocabulary entry: either literal text or raw bytes (for pieces that
/// hold only part of a multi-byte character).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VocabPiece {
    Text(String),
    Bytes(Vec<u8>),
}

impl VocabPiece {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Bytes(bytes) => bytes,
        }
    }
}

impl From<&str> for VocabPiece {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for VocabPiece {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Vec<u8>> for VocabPiece {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<&[u8]> for VocabPiece {
    fn from(bytes: &[u8]) -> Self {
        Self::Bytes(bytes.to_vec())
    }
}

/// Byte-level tokenizer backed by an explicit vocabulary table.
/// Token ID `i` decodes to the bytes of `pieces[i]`.
#[derive(Debug, Clone)]
pub struct VocabTokenizer {
    pieces: Vec<Vec<u8>>,
    eos_token: Option<u32>,
}

impl VocabTokenizer {
    pub fn new<I, P>(pieces: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<VocabPiece>,
    {
        let pieces = pieces
            .into_iter()
            .map(|p| p.into().as_bytes().to_vec())
            .collect();
        Self { pieces, eos_token: None }
    }

    /// Mark `token` as the end-of-sequence token.
    pub fn with_eos(mut self, token: u32) -> Self {
        self.eos_token = Some(token);
        self
    }

    pub fn vocab_size(&self) -> usize {
        self.pieces.len()
    }

    pub fn eos_token(&self) -> Option<u32> {
        self.eos_token
    }

    /// Raw bytes of a single token.
    pub fn piece_bytes(&self, token: u32) -> Result<&[u8], TokenizerError> {
        self.pieces
            .get(token as usize)
            .map(Vec::as_slice)
            .ok_or(TokenizerError::InvalidToken(token))
    }

    /// Longest vocabulary piece matching the start of `rest`; lowest ID on ties.
    fn longest_match(&self, rest: &[u8]) -> Option<(u32, usize)> {
        let mut best: Option<(u32, usize)> = None;
        for (id, piece) in self.pieces.iter().enumerate() {
            if piece.is_empty() || !rest.starts_with(piece) {
                continue;
            }
            if best.map_or(true, |(_, len)| piece.len() > len) {
                best = Some((id as u32, piece.len()));
            }
        }
        best
    }
}

impl Tokenizer for VocabTokenizer {
    fn encode(&self, text: &str) -> Result<Vec<u32>, TokenizerError> {
        let bytes = text.as_bytes();
        let mut tokens = Vec::new();
        let mut pos = 0;
        while pos < bytes.len() {
            let (id, len) = self.longest_match(&bytes[pos..]).ok_or_else(|| {
                TokenizerError::EncodingFailed(format!("no token covers byte offset {}", pos))
            })?;
            tokens.push(id);
            pos += len;
        }
        Ok(tokens)
    }

    fn decode(&self, tokens: &[u32]) -> Result<String, TokenizerError> {
        let mut bytes = Vec::new();
        for &token in tokens {
            bytes.extend_from_slice(self.piece_bytes(token)?);
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn is_eos(&self, token: u32) -> bool {
        self.eos_token == Some(token)
    }
}
