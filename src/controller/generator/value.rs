//! # Value Generator
//!
//! Draws bytes from a cryptographically secure source and encodes them
//! according to a [`ResolvedGenerationRequest`].
//!
//! In character-length mode `length` bytes are drawn and the encoded text is
//! truncated to `length` characters. Every supported encoding expands its input
//! (base64 4/3, base32 8/5, hex 2), so the unpadded part of the output is always
//! at least `length` characters long and the truncated value never contains
//! padding.

use super::request::{Encoding, ResolvedGenerationRequest};
use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use zeroize::Zeroizing;

/// The random source could not supply bytes
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("failed to read from secure random source: {message}")]
pub struct GenerationError {
    message: String,
}

impl GenerationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Source of cryptographically secure random bytes
pub trait RandomSource: Send + Sync + fmt::Debug {
    /// Fill `buf` completely or fail without retrying
    ///
    /// # Errors
    ///
    /// Returns a [`GenerationError`] if the source cannot be read.
    fn fill(&self, buf: &mut [u8]) -> Result<(), GenerationError>;
}

/// Operating system CSPRNG
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn fill(&self, buf: &mut [u8]) -> Result<(), GenerationError> {
        OsRng
            .try_fill_bytes(buf)
            .map_err(|e| GenerationError::new(e.to_string()))
    }
}

/// Produces encoded random values
#[derive(Debug, Clone)]
pub struct ValueGenerator {
    source: Arc<dyn RandomSource>,
}

impl Default for ValueGenerator {
    fn default() -> Self {
        Self::new(Arc::new(OsRandom))
    }
}

impl ValueGenerator {
    pub fn new(source: Arc<dyn RandomSource>) -> Self {
        Self { source }
    }

    /// Generate one value for `request`
    ///
    /// # Errors
    ///
    /// Returns a [`GenerationError`] if the random source fails.
    pub fn generate(&self, request: &ResolvedGenerationRequest) -> Result<Vec<u8>, GenerationError> {
        let mut raw = Zeroizing::new(vec![0u8; request.length]);
        self.source.fill(&mut raw)?;

        let mut encoded = match request.encoding {
            // length is a byte count by construction, no text to truncate
            Encoding::Raw => return Ok(raw.to_vec()),
            Encoding::Base64 => STANDARD.encode(raw.as_slice()),
            Encoding::Base64Url => URL_SAFE.encode(raw.as_slice()),
            Encoding::Base32 => data_encoding::BASE32.encode(&raw),
            Encoding::Hex => data_encoding::HEXLOWER.encode(&raw),
        };

        if !request.is_byte_length {
            // all alphabets are ASCII, so byte and char indices agree
            encoded.truncate(request.length);
        }

        Ok(encoded.into_bytes())
    }
}
