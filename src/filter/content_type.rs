//! `Content-Type` charset declaration.
//!
//! An existing declaration is never touched. Otherwise `; charset=<target>`
//! is appended to whatever the handler set, including nothing at all.

use axum::http::header::{InvalidHeaderValue, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderValue};

const CHARSET: &[u8] = b"charset";

/// Case-insensitive search for `charset` anywhere in the value.
pub fn declares_charset(value: &[u8]) -> bool {
    value
        .windows(CHARSET.len())
        .any(|w| w.eq_ignore_ascii_case(CHARSET))
}

/// `<original>; charset=<target>`, byte for byte.
pub fn with_charset(original: &[u8], target: &str) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut value = Vec::with_capacity(original.len() + 10 + target.len());
    value.extend_from_slice(original);
    value.extend_from_slice(b"; charset=");
    value.extend_from_slice(target.as_bytes());
    HeaderValue::from_bytes(&value)
}

/// Append a charset to `Content-Type` unless one is already declared.
///
/// Returns `true` when the header was rewritten.
pub fn ensure_charset(headers: &mut HeaderMap, target: &str) -> Result<bool, InvalidHeaderValue> {
    let original = headers
        .get(CONTENT_TYPE)
        .map(HeaderValue::as_bytes)
        .unwrap_or_default();

    if declares_charset(original) {
        return Ok(false);
    }

    let value = with_charset(original, target)?;
    headers.insert(CONTENT_TYPE, value);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with(content_type: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_str(content_type).unwrap());
        headers
    }

    #[test]
    fn appends_when_absent() {
        let mut headers = headers_with("text/plain");
        assert!(ensure_charset(&mut headers, "utf-8").unwrap());
        assert_eq!(headers[CONTENT_TYPE], "text/plain; charset=utf-8");
    }

    #[test]
    fn existing_declaration_is_untouched() {
        for value in [
            "text/html; charset=ISO-8859-1",
            "text/html; CHARSET=windows-1252",
            "application/xml;Charset=\"koi8-r\"",
        ] {
            let mut headers = headers_with(value);
            assert!(!ensure_charset(&mut headers, "utf-8").unwrap());
            assert_eq!(headers[CONTENT_TYPE], value);
        }
    }

    #[test]
    fn missing_header_gets_bare_parameter() {
        let mut headers = HeaderMap::new();
        assert!(ensure_charset(&mut headers, "utf-8").unwrap());
        assert_eq!(headers[CONTENT_TYPE], "; charset=utf-8");
    }

    #[test]
    fn substring_match_is_enough() {
        // Any occurrence counts, not just a parameter name.
        let mut headers = headers_with("application/x-charset-test");
        assert!(!ensure_charset(&mut headers, "utf-8").unwrap());
        assert_eq!(headers[CONTENT_TYPE], "application/x-charset-test");
    }

    #[test]
    fn opaque_bytes_are_preserved() {
        let raw = b"text/plain; name=caf\xe9";
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_bytes(raw).unwrap());

        ensure_charset(&mut headers, "utf-8").unwrap();
        assert_eq!(
            headers[CONTENT_TYPE].as_bytes(),
            b"text/plain; name=caf\xe9; charset=utf-8"
        );
    }

    #[test]
    fn invalid_target_is_rejected() {
        assert!(with_charset(b"text/plain", "utf-8\r\nx-injected: 1").is_err());
    }
}
