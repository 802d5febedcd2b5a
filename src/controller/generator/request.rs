//! # Length/Encoding Resolver
//!
//! Normalizes the length string and encoding name of a resource or annotation
//! into a [`ResolvedGenerationRequest`].
//!
//! A length is a plain non-negative integer (character-length mode) or the same
//! integer followed by `b`/`B` (byte-length mode).

use crate::constants::{
    BYTE_LENGTH_SUFFIX, DEFAULT_SECRET_ENCODING, DEFAULT_SECRET_LENGTH, MAX_SECRET_LENGTH,
};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while resolving a generation request
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("invalid length '{value}': {reason}")]
    InvalidLength { value: String, reason: String },
    #[error("invalid encoding '{value}': expected one of base64, base64url, base32, hex, raw")]
    InvalidEncoding { value: String },
}

/// Text encoding applied to generated bytes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// Standard base64 alphabet with padding
    #[default]
    Base64,
    /// URL-safe base64 alphabet with padding
    Base64Url,
    /// RFC 4648 base32 with padding
    Base32,
    /// Lowercase hexadecimal
    Hex,
    /// Random bytes without any text encoding
    Raw,
}

impl Encoding {
    pub fn as_str(self) -> &'static str {
        match self {
            Encoding::Base64 => "base64",
            Encoding::Base64Url => "base64url",
            Encoding::Base32 => "base32",
            Encoding::Hex => "hex",
            Encoding::Raw => "raw",
        }
    }

    /// Size of the encoded form of `bytes` random bytes, padding included
    pub fn encoded_len(self, bytes: usize) -> usize {
        match self {
            Encoding::Base64 | Encoding::Base64Url => bytes.div_ceil(3) * 4,
            Encoding::Base32 => bytes.div_ceil(5) * 8,
            Encoding::Hex => bytes * 2,
            Encoding::Raw => bytes,
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Encoding {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "base64" => Ok(Encoding::Base64),
            "base64url" => Ok(Encoding::Base64Url),
            "base32" => Ok(Encoding::Base32),
            "hex" => Ok(Encoding::Hex),
            "raw" => Ok(Encoding::Raw),
            other => Err(ResolveError::InvalidEncoding {
                value: other.to_string(),
            }),
        }
    }
}

/// Normalized generation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedGenerationRequest {
    /// Raw byte count (byte-length mode) or output characters (character-length mode)
    pub length: usize,
    pub is_byte_length: bool,
    pub encoding: Encoding,
}

impl ResolvedGenerationRequest {
    /// Size in bytes of every value produced for this request
    pub fn output_len(&self) -> usize {
        if self.is_byte_length {
            self.encoding.encoded_len(self.length)
        } else {
            self.length
        }
    }

    fn bounded(self) -> Result<Self, ResolveError> {
        let size = self.output_len();
        if size > MAX_SECRET_LENGTH {
            let suffix = if self.is_byte_length { "b" } else { "" };
            return Err(ResolveError::InvalidLength {
                value: format!("{}{suffix}", self.length),
                reason: format!(
                    "{} encoding produces {size} bytes, exceeding maximum of {MAX_SECRET_LENGTH}",
                    self.encoding
                ),
            });
        }
        Ok(self)
    }
}

/// Deployment-wide defaults for omitted length/encoding values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationDefaults {
    pub length: usize,
    pub is_byte_length: bool,
    pub encoding: Encoding,
}

impl Default for GenerationDefaults {
    fn default() -> Self {
        Self {
            length: 40,
            is_byte_length: false,
            encoding: Encoding::Base64,
        }
    }
}

impl GenerationDefaults {
    /// Parse defaults from their string form (as found in the environment)
    ///
    /// Empty strings fall back to the built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns a [`ResolveError`] when either value is malformed or the encoded
    /// value would exceed [`MAX_SECRET_LENGTH`].
    pub fn parse(length: &str, encoding: &str) -> Result<Self, ResolveError> {
        let length = if length.is_empty() {
            DEFAULT_SECRET_LENGTH
        } else {
            length
        };
        let encoding = if encoding.is_empty() {
            DEFAULT_SECRET_ENCODING
        } else {
            encoding
        };
        let (length, is_byte_length) = parse_length(length)?;
        let request = ResolvedGenerationRequest {
            length,
            is_byte_length,
            encoding: encoding.parse()?,
        }
        .bounded()?;
        Ok(Self {
            length: request.length,
            is_byte_length: request.is_byte_length,
            encoding: request.encoding,
        })
    }
}

/// Parse a length string into `(length, is_byte_length)`
///
/// # Errors
///
/// Returns [`ResolveError::InvalidLength`] unless the value is ASCII digits
/// with at most one trailing `b`/`B`, and fits under [`MAX_SECRET_LENGTH`].
pub fn parse_length(raw: &str) -> Result<(usize, bool), ResolveError> {
    let invalid = |reason: &str| ResolveError::InvalidLength {
        value: raw.to_string(),
        reason: reason.to_string(),
    };

    let (digits, is_byte_length) = match raw.strip_suffix(|c: char| {
        c.eq_ignore_ascii_case(&BYTE_LENGTH_SUFFIX)
    }) {
        Some(rest) => (rest, true),
        None => (raw, false),
    };

    if digits.is_empty() {
        return Err(invalid("missing number"));
    }
    // usize::from_str accepts a leading '+', which is not a valid length
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid("expected a non-negative integer with an optional 'b' suffix"));
    }

    let length: usize = digits
        .parse()
        .map_err(|e| invalid(&format!("number out of range: {e}")))?;
    if length > MAX_SECRET_LENGTH {
        return Err(invalid(&format!("exceeds maximum of {MAX_SECRET_LENGTH}")));
    }

    Ok((length, is_byte_length))
}

/// Resolve a declared length and encoding against the defaults
///
/// `None` and empty strings both mean "not declared".
///
/// # Errors
///
/// Returns a [`ResolveError`] for a malformed length, an unknown encoding, or a
/// byte length whose encoded form exceeds [`MAX_SECRET_LENGTH`].
pub fn resolve(
    length: Option<&str>,
    encoding: Option<&str>,
    defaults: &GenerationDefaults,
) -> Result<ResolvedGenerationRequest, ResolveError> {
    let (length, is_byte_length) = match length.filter(|l| !l.is_empty()) {
        Some(raw) => parse_length(raw)?,
        None => (defaults.length, defaults.is_byte_length),
    };

    let encoding = match encoding.filter(|e| !e.is_empty()) {
        Some(raw) => raw.parse()?,
        None => defaults.encoding,
    };

    ResolvedGenerationRequest {
        length,
        is_byte_length,
        encoding,
    }
    .bounded()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_length_character_mode() {
        assert_eq!(parse_length("16"), Ok((16, false)));
        assert_eq!(parse_length("0"), Ok((0, false)));
    }

    #[test]
    fn test_parse_length_byte_mode() {
        assert_eq!(parse_length("16b"), Ok((16, true)));
        assert_eq!(parse_length("16B"), Ok((16, true)));
        assert_eq!(parse_length("0b"), Ok((0, true)));
    }

    #[test]
    fn test_parse_length_rejects_malformed() {
        for raw in ["", "b", "abc", "16bb", "-1", "+5", "16x", " 16", "1.5", "16 b"] {
            assert!(
                matches!(parse_length(raw), Err(ResolveError::InvalidLength { .. })),
                "expected '{raw}' to be rejected"
            );
        }
    }

    #[test]
    fn test_parse_length_rejects_oversized() {
        let too_big = (MAX_SECRET_LENGTH + 1).to_string();
        assert!(parse_length(&too_big).is_err());
        assert!(parse_length("99999999999999999999999999").is_err());
    }

    #[test]
    fn test_encoding_is_case_sensitive() {
        assert_eq!("hex".parse::<Encoding>(), Ok(Encoding::Hex));
        assert_eq!(
            "Base64".parse::<Encoding>(),
            Err(ResolveError::InvalidEncoding {
                value: "Base64".to_string()
            })
        );
    }

    #[test]
    fn test_resolve_uses_defaults_when_absent() {
        let defaults = GenerationDefaults::default();
        let request = resolve(None, None, &defaults).expect("defaults resolve");
        assert_eq!(request.length, 40);
        assert!(!request.is_byte_length);
        assert_eq!(request.encoding, Encoding::Base64);

        let request = resolve(Some(""), Some(""), &defaults).expect("empty resolves");
        assert_eq!(request.length, 40);
        assert_eq!(request.encoding, Encoding::Base64);
    }

    #[test]
    fn test_resolve_declared_values() {
        let defaults = GenerationDefaults::default();
        let request = resolve(Some("24b"), Some("base32"), &defaults).expect("valid request");
        assert_eq!(
            request,
            ResolvedGenerationRequest {
                length: 24,
                is_byte_length: true,
                encoding: Encoding::Base32,
            }
        );
    }

    #[test]
    fn test_resolve_bounds_encoded_size() {
        let defaults = GenerationDefaults::default();
        // 786432 bytes encode to exactly 1MiB of base64
        let request = resolve(Some("786432b"), Some("base64"), &defaults).expect("at the limit");
        assert_eq!(request.output_len(), MAX_SECRET_LENGTH);
        assert!(matches!(
            resolve(Some("786433b"), Some("base64"), &defaults),
            Err(ResolveError::InvalidLength { .. })
        ));
        assert!(matches!(
            resolve(Some("1048576b"), Some("base32"), &defaults),
            Err(ResolveError::InvalidLength { .. })
        ));
        assert!(matches!(
            resolve(Some("524289b"), Some("hex"), &defaults),
            Err(ResolveError::InvalidLength { .. })
        ));
        // character mode and raw bytes are already the output size
        assert!(resolve(Some("1048576"), Some("base32"), &defaults).is_ok());
        assert!(resolve(Some("1048576b"), Some("raw"), &defaults).is_ok());
        assert!(GenerationDefaults::parse("1048576b", "hex").is_err());
    }

    #[test]
    fn test_encoded_len_includes_padding() {
        assert_eq!(Encoding::Base64.encoded_len(16), 24);
        assert_eq!(Encoding::Base64Url.encoded_len(1), 4);
        assert_eq!(Encoding::Base32.encoded_len(16), 32);
        assert_eq!(Encoding::Hex.encoded_len(16), 32);
        assert_eq!(Encoding::Raw.encoded_len(16), 16);
    }

    #[test]
    fn test_resolve_unknown_encoding() {
        let defaults = GenerationDefaults::default();
        assert!(matches!(
            resolve(Some("16"), Some("base58"), &defaults),
            Err(ResolveError::InvalidEncoding { .. })
        ));
    }

    #[test]
    fn test_defaults_parse() {
        let defaults = GenerationDefaults::parse("32b", "hex").expect("valid defaults");
        assert_eq!(defaults.length, 32);
        assert!(defaults.is_byte_length);
        assert_eq!(defaults.encoding, Encoding::Hex);

        assert_eq!(
            GenerationDefaults::parse("", "").expect("empty falls back"),
            GenerationDefaults::default()
        );
        assert!(GenerationDefaults::parse("forty", "base64").is_err());
    }
}
