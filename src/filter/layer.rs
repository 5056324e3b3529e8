//! Tower layer that transcodes a wrapped service's responses.

use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::{Body, HttpBody};
use axum::http::header::{CONTENT_ENCODING, CONTENT_LENGTH, TRANSFER_ENCODING};
use axum::http::{HeaderMap, HeaderValue, Method, Request, Response, StatusCode};
use axum::response::IntoResponse;
use axum::BoxError;
use bytes::Bytes;
use futures_util::future::BoxFuture;
use tower::{Layer, Service};

use crate::charset::CodecTable;
use crate::config::CharsetConfig;
use crate::filter::capture::CapturedResponse;
use crate::filter::content_type::ensure_charset;
use crate::filter::error::RewriteError;
use crate::observability::metrics;

/// Default cap on how much of a response body is buffered.
pub const DEFAULT_MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

/// Per-route conversion settings, shared read-only by every request.
#[derive(Debug)]
pub struct TranscodeFilter {
    route: String,
    charset: CharsetConfig,
    codecs: Arc<CodecTable>,
    max_body_bytes: usize,
}

impl TranscodeFilter {
    /// Filter backed by the shared codec table.
    pub fn new(route: impl Into<String>, charset: CharsetConfig) -> Self {
        Self {
            route: route.into(),
            charset,
            codecs: CodecTable::shared(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    pub fn with_codecs(mut self, codecs: Arc<CodecTable>) -> Self {
        self.codecs = codecs;
        self
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn charset(&self) -> &CharsetConfig {
        &self.charset
    }

    /// Rewrite a finished handler response to a `method` request.
    ///
    /// The body is fully captured before anything else happens. On any
    /// failure the handler's response is discarded and a plain-text 500 is
    /// returned instead, so no partially converted output escapes.
    ///
    /// Bodies carrying a non-identity `Content-Encoding` are passed through
    /// untouched: their bytes are not text in the source charset.
    pub async fn apply<B>(&self, method: &Method, response: Response<B>) -> axum::response::Response
    where
        B: HttpBody<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        let (mut parts, body) = response.into_parts();

        if is_content_encoded(&parts.headers) {
            tracing::warn!(
                route = %self.route,
                content_encoding = ?parts.headers.get(CONTENT_ENCODING),
                "Encoded response body, skipping charset conversion"
            );
            return Response::from_parts(parts, Body::new(body));
        }

        let mut capture = CapturedResponse::new();
        capture.set_status(parts.status);
        if let Err(err) = capture.drain(Body::new(body), self.max_body_bytes).await {
            return self.fail(err);
        }

        match ensure_charset(&mut parts.headers, &self.charset.to) {
            Ok(true) => tracing::trace!(
                route = %self.route,
                to = %self.charset.to,
                "Declared charset on Content-Type"
            ),
            Ok(false) => {}
            Err(e) => tracing::warn!(
                route = %self.route,
                error = %e,
                "Could not declare charset, leaving Content-Type as is"
            ),
        }

        let status = capture.status();
        let captured_len = capture.len();
        let converted = match self
            .codecs
            .convert(capture.into_body(), &self.charset.from, &self.charset.to)
        {
            Ok(bytes) => bytes,
            Err(e) => return self.fail(e.into()),
        };

        // The body is now one buffer, so the upstream framing no longer
        // applies. HEAD and bodiless statuses keep the upstream headers.
        if !is_bodiless(method, status) {
            parts.headers.remove(TRANSFER_ENCODING);
            parts
                .headers
                .insert(CONTENT_LENGTH, HeaderValue::from(converted.len()));
        }

        tracing::debug!(
            route = %self.route,
            from = %self.charset.from,
            to = %self.charset.to,
            status = %status,
            captured_bytes = captured_len,
            converted_bytes = converted.len(),
            "Response transcoded"
        );
        metrics::record_conversion(&self.route, converted.len());

        parts.status = status;
        Response::from_parts(parts, Body::from(converted))
    }

    fn fail(&self, err: RewriteError) -> axum::response::Response {
        tracing::warn!(
            route = %self.route,
            from = %self.charset.from,
            error = %err,
            "Response rewrite failed"
        );
        metrics::record_conversion_failure(&self.route, err.kind());
        err.into_response()
    }
}

fn is_content_encoded(headers: &HeaderMap) -> bool {
    headers.get_all(CONTENT_ENCODING).iter().any(|value| {
        let value = value.as_bytes().trim_ascii();
        !value.is_empty() && !value.eq_ignore_ascii_case(b"identity")
    })
}

fn is_bodiless(method: &Method, status: StatusCode) -> bool {
    *method == Method::HEAD
        || status.is_informational()
        || status == StatusCode::NO_CONTENT
        || status == StatusCode::NOT_MODIFIED
}

/// Wraps a service so its responses pass through a [`TranscodeFilter`].
#[derive(Debug, Clone)]
pub struct CharsetLayer {
    filter: Arc<TranscodeFilter>,
}

impl CharsetLayer {
    pub fn new(filter: TranscodeFilter) -> Self {
        Self {
            filter: Arc::new(filter),
        }
    }

    pub fn filter(&self) -> &TranscodeFilter {
        &self.filter
    }
}

impl<S> Layer<S> for CharsetLayer {
    type Service = CharsetService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CharsetService {
            inner,
            filter: Arc::clone(&self.filter),
        }
    }
}

/// Service produced by [`CharsetLayer`].
#[derive(Debug, Clone)]
pub struct CharsetService<S> {
    inner: S,
    filter: Arc<TranscodeFilter>,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for CharsetService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
    ResBody: HttpBody<Data = Bytes> + Send + 'static,
    ResBody::Error: Into<BoxError>,
{
    type Response = axum::response::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        // Call the instance that was driven to readiness.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let filter = Arc::clone(&self.filter);
        let method = req.method().clone();
        let pending = inner.call(req);

        Box::pin(async move {
            let response = pending.await?;
            Ok::<_, S::Error>(filter.apply(&method, response).await)
        })
    }
}
