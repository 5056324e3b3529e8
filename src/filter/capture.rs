//! Response capture.
//!
//! Stands in for the client-facing response while the wrapped handler runs:
//! body bytes and the status are recorded, nothing is forwarded.

use axum::body::Body;
use axum::http::StatusCode;
use bytes::{Bytes, BytesMut};
use http_body_util::BodyExt;

use crate::filter::error::RewriteError;

/// Status and body recorded from one handler invocation.
#[derive(Debug, Default)]
pub struct CapturedResponse {
    status: Option<StatusCode>,
    body: Option<BytesMut>,
}

impl CapturedResponse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk. Returns the number of bytes accepted, always all of them.
    pub fn write(&mut self, chunk: &[u8]) -> usize {
        self.body.get_or_insert_with(BytesMut::new).extend_from_slice(chunk);
        chunk.len()
    }

    /// Record a status. The last call wins.
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = Some(status);
    }

    /// The recorded status, or `200 OK` if none was set.
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    pub fn len(&self) -> usize {
        self.body.as_ref().map_or(0, |b| b.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drain a response body into the accumulator, one data frame per write.
    ///
    /// Trailers are dropped. Fails without writing anything further once the
    /// accumulated size would pass `limit`.
    pub async fn drain(&mut self, mut body: Body, limit: usize) -> Result<(), RewriteError> {
        while let Some(frame) = body.frame().await {
            let frame = frame.map_err(RewriteError::Body)?;
            let Ok(data) = frame.into_data() else {
                continue;
            };
            if self.len().saturating_add(data.len()) > limit {
                return Err(RewriteError::BodyTooLarge { limit });
            }
            self.write(&data);
        }
        Ok(())
    }

    /// The accumulated body, empty if nothing was written.
    pub fn into_body(self) -> Bytes {
        self.body.map(BytesMut::freeze).unwrap_or_default()
    }
}
