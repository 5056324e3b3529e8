//! Source decoders for legacy single-byte encodings.

use std::borrow::Cow;

use encoding_rs::{Encoding, WINDOWS_1252};
use thiserror::Error;

/// Failure to decode a body under its declared source encoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// A byte with no assigned character in a strict code page.
    #[error("byte 0x{byte:02X} at offset {offset} is not defined in {charset}")]
    UnmappedByte {
        charset: &'static str,
        offset: usize,
        byte: u8,
    },

    /// The decoder rejected the sequence without pinpointing a byte.
    #[error("malformed {charset} byte sequence")]
    Malformed { charset: &'static str },
}

/// Decodes bytes of one legacy encoding into text.
///
/// Implementations must be strict: input that is not valid for the encoding
/// is reported as a [`DecodeError`], never replaced with U+FFFD.
pub trait SourceDecoder: Send + Sync {
    /// Charset name this decoder is registered under (matched exactly).
    fn name(&self) -> &'static str;

    /// Decode `input`. Implementations return `Cow::Borrowed` only when the
    /// text is byte-for-byte identical to the input.
    fn decode<'a>(&self, input: &'a [u8]) -> Result<Cow<'a, str>, DecodeError>;
}

/// ISO-8859-1: every byte maps to the code point of the same value.
#[derive(Debug, Clone, Copy, Default)]
pub struct Latin1;

impl SourceDecoder for Latin1 {
    fn name(&self) -> &'static str {
        "ISO-8859-1"
    }

    fn decode<'a>(&self, input: &'a [u8]) -> Result<Cow<'a, str>, DecodeError> {
        if input.is_ascii() {
            if let Ok(text) = std::str::from_utf8(input) {
                return Ok(Cow::Borrowed(text));
            }
        }
        Ok(Cow::Owned(input.iter().map(|&b| char::from(b)).collect()))
    }
}

/// Windows-1252 with the five unassigned code points treated as errors.
#[derive(Debug, Clone, Copy, Default)]
pub struct Windows1252;

impl Windows1252 {
    const UNDEFINED: [u8; 5] = [0x81, 0x8D, 0x8F, 0x90, 0x9D];
}

impl SourceDecoder for Windows1252 {
    fn name(&self) -> &'static str {
        "Windows-1252"
    }

    fn decode<'a>(&self, input: &'a [u8]) -> Result<Cow<'a, str>, DecodeError> {
        if let Some(offset) = input.iter().position(|b| Self::UNDEFINED.contains(b)) {
            return Err(DecodeError::UnmappedByte {
                charset: self.name(),
                offset,
                byte: input[offset],
            });
        }

        // encoding_rs maps the undefined bytes to C1 controls, which were
        // rejected above, so nothing here is ever replaced.
        let (text, _had_errors) = WINDOWS_1252.decode_without_bom_handling(input);
        Ok(text)
    }
}

/// Any `encoding_rs` encoding registered under a caller-chosen name.
#[derive(Debug, Clone, Copy)]
pub struct LegacyEncoding {
    name: &'static str,
    encoding: &'static Encoding,
}

impl LegacyEncoding {
    pub fn new(name: &'static str, encoding: &'static Encoding) -> Self {
        Self { name, encoding }
    }
}

impl SourceDecoder for LegacyEncoding {
    fn name(&self) -> &'static str {
        self.name
    }

    fn decode<'a>(&self, input: &'a [u8]) -> Result<Cow<'a, str>, DecodeError> {
        self.encoding
            .decode_without_bom_handling_and_without_replacement(input)
            .ok_or(DecodeError::Malformed { charset: self.name })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latin1_maps_every_byte() {
        let all: Vec<u8> = (0u8..=255).collect();
        let text = Latin1.decode(&all).unwrap();

        assert_eq!(text.chars().count(), 256);
        for (byte, ch) in all.iter().zip(text.chars()) {
            assert_eq!(*byte as u32, ch as u32);
        }
    }

    #[test]
    fn latin1_borrows_ascii() {
        let text = Latin1.decode(b"plain ascii").unwrap();
        assert!(matches!(text, Cow::Borrowed("plain ascii")));
    }

    #[test]
    fn windows_1252_decodes_punctuation_block() {
        // 0x80 euro sign, 0x93/0x94 curly quotes
        let text = Windows1252.decode(&[0x80, 0x20, 0x93, b'x', 0x94]).unwrap();
        assert_eq!(text, "\u{20AC} \u{201C}x\u{201D}");
    }

    #[test]
    fn windows_1252_rejects_undefined_bytes() {
        let err = Windows1252.decode(b"ab\x8Dcd").unwrap_err();
        assert_eq!(
            err,
            DecodeError::UnmappedByte {
                charset: "Windows-1252",
                offset: 2,
                byte: 0x8D,
            }
        );
        assert_eq!(
            err.to_string(),
            "byte 0x8D at offset 2 is not defined in Windows-1252"
        );
    }

    #[test]
    fn legacy_encoding_uses_registered_name() {
        let koi8 = LegacyEncoding::new("KOI8-R", encoding_rs::KOI8_R);
        assert_eq!(koi8.name(), "KOI8-R");

        // "Мир" in KOI8-R
        let text = koi8.decode(&[0xED, 0xC9, 0xD2]).unwrap();
        assert_eq!(text, "Мир");
    }
}
