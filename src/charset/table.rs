//! Codec table and the conversion routine.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

use bytes::Bytes;

use crate::charset::codec::{DecodeError, Latin1, LegacyEncoding, SourceDecoder, Windows1252};

/// Built on first use, read-only afterwards.
static SHARED: LazyLock<Arc<CodecTable>> = LazyLock::new(|| Arc::new(CodecTable::standard()));

/// Registry of source decoders keyed by exact charset name.
#[derive(Default)]
pub struct CodecTable {
    decoders: HashMap<&'static str, Box<dyn SourceDecoder>>,
}

impl CodecTable {
    /// An empty table. Every source name passes through unchanged.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The table of legacy encodings the proxy ships with.
    pub fn standard() -> Self {
        Self::empty()
            .register(Latin1)
            .register(Windows1252)
            .register(LegacyEncoding::new("ISO-8859-2", encoding_rs::ISO_8859_2))
            .register(LegacyEncoding::new("ISO-8859-15", encoding_rs::ISO_8859_15))
            .register(LegacyEncoding::new("Windows-1251", encoding_rs::WINDOWS_1251))
            .register(LegacyEncoding::new("KOI8-R", encoding_rs::KOI8_R))
    }

    /// The process-wide standard table.
    pub fn shared() -> Arc<CodecTable> {
        Arc::clone(&SHARED)
    }

    /// Add a decoder, replacing any previous one with the same name.
    pub fn register(mut self, decoder: impl SourceDecoder + 'static) -> Self {
        self.decoders.insert(decoder.name(), Box::new(decoder));
        self
    }

    /// Exact, case-sensitive lookup.
    pub fn lookup(&self, name: &str) -> Option<&dyn SourceDecoder> {
        self.decoders.get(name).map(|d| d.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.decoders.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.decoders.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Transcode `input` from `from` into `to`.
    ///
    /// Sources missing from the table are returned untouched. The output is
    /// always UTF-8; `to` is validated when configuration is loaded.
    pub fn convert(&self, input: Bytes, from: &str, to: &str) -> Result<Bytes, DecodeError> {
        let Some(decoder) = self.lookup(from) else {
            tracing::trace!(from, to, "No decoder registered, passing body through");
            return Ok(input);
        };

        match decoder.decode(&input)? {
            // Borrowed text is the input itself.
            Cow::Borrowed(_) => Ok(input),
            Cow::Owned(text) => Ok(Bytes::from(text.into_bytes())),
        }
    }
}

impl fmt::Debug for CodecTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecTable")
            .field("decoders", &self.names())
            .finish()
    }
}

/// Transcode through the shared standard table.
pub fn convert(input: Bytes, from: &str, to: &str) -> Result<Bytes, DecodeError> {
    SHARED.convert(input, from, to)
}

/// Whether `label` names UTF-8, the only supported target.
pub fn is_utf8_label(label: &str) -> bool {
    label.eq_ignore_ascii_case("utf-8") || label.eq_ignore_ascii_case("utf8")
}
