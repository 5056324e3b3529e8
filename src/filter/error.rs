//! Rewrite failures.
//!
//! Any failure after the handler ran replaces its response with a plain-text
//! 500; the captured body never reaches the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::charset::DecodeError;

/// Reasons a captured response could not be rewritten.
///
/// Every variant is reported to the client as a plain-text 500 in place of
/// the handler's response.
#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("charset conversion failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("response body exceeds the {limit} byte buffer limit")]
    BodyTooLarge { limit: usize },

    #[error("failed to read response body: {0}")]
    Body(axum::Error),
}

impl RewriteError {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            RewriteError::Decode(_) => "decode",
            RewriteError::BodyTooLarge { .. } => "body_too_large",
            RewriteError::Body(_) => "body",
        }
    }
}

impl IntoResponse for RewriteError {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}
