//! Forwarding to a route's upstream.
//!
//! # Design Decisions
//! - One shared pooled client for all routes
//! - `Accept-Encoding` is dropped so bodies arrive uncompressed and can be
//!   transcoded
//! - Upstream failures become 502 responses, never service errors

use std::convert::Infallible;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::body::Body;
use axum::http::header::ACCEPT_ENCODING;
use axum::http::uri::{Authority, PathAndQuery, Scheme};
use axum::http::{Request, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use futures_util::future::BoxFuture;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use tower::Service;

use crate::config::TimeoutConfig;
use crate::http::request::request_id;

pub type HttpClient = Client<HttpConnector, Body>;

/// Build the client shared by every upstream.
pub fn build_client(timeouts: &TimeoutConfig) -> HttpClient {
    let mut connector = HttpConnector::new();
    connector.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));
    Client::builder(TokioExecutor::new()).build(connector)
}

/// Sends requests to a single upstream authority.
#[derive(Clone)]
pub struct UpstreamService {
    client: HttpClient,
    authority: Authority,
    route: Arc<str>,
}

impl UpstreamService {
    pub fn new(client: HttpClient, authority: Authority, route: impl Into<Arc<str>>) -> Self {
        Self {
            client,
            authority,
            route: route.into(),
        }
    }

    fn upstream_uri(&self, uri: &Uri) -> Result<Uri, axum::http::Error> {
        let path_and_query = uri
            .path_and_query()
            .cloned()
            .unwrap_or_else(|| PathAndQuery::from_static("/"));
        Uri::builder()
            .scheme(Scheme::HTTP)
            .authority(self.authority.clone())
            .path_and_query(path_and_query)
            .build()
    }
}

impl std::fmt::Debug for UpstreamService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamService")
            .field("authority", &self.authority)
            .field("route", &self.route)
            .finish()
    }
}

impl Service<Request<Body>> for UpstreamService {
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let (mut parts, body) = req.into_parts();
        let id = request_id(&parts.headers).to_string();
        let route = Arc::clone(&self.route);

        let uri = match self.upstream_uri(&parts.uri) {
            Ok(uri) => uri,
            Err(e) => {
                tracing::error!(
                    request_id = %id,
                    route = %route,
                    error = %e,
                    "Could not build upstream URI"
                );
                return Box::pin(async { Ok::<_, Infallible>(bad_gateway()) });
            }
        };
        parts.uri = uri;
        parts.headers.remove(ACCEPT_ENCODING);

        let client = self.client.clone();
        Box::pin(async move {
            let response = match client.request(Request::from_parts(parts, body)).await {
                Ok(response) => {
                    let (parts, body) = response.into_parts();
                    Response::from_parts(parts, Body::new(body))
                }
                Err(e) => {
                    tracing::error!(request_id = %id, route = %route, error = %e, "Upstream error");
                    bad_gateway()
                }
            };
            Ok::<_, Infallible>(response)
        })
    }
}

fn bad_gateway() -> Response {
    (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower::ServiceExt;

    fn service(authority: &'static str) -> UpstreamService {
        UpstreamService::new(
            build_client(&TimeoutConfig::default()),
            Authority::from_static(authority),
            "test",
        )
    }

    #[tokio::test]
    async fn rewrites_uri_to_upstream() {
        let svc = service("127.0.0.1:3000");

        let uri = svc.upstream_uri(&"/a/b?x=1".parse().unwrap()).unwrap();
        assert_eq!(uri, "http://127.0.0.1:3000/a/b?x=1");

        let uri = svc.upstream_uri(&"http://client.example/".parse().unwrap()).unwrap();
        assert_eq!(uri, "http://127.0.0.1:3000/");
    }

    #[tokio::test]
    async fn unreachable_upstream_is_bad_gateway() {
        // Reserve a port, then free it so nothing is listening.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let authority: Authority = addr.to_string().parse().unwrap();
        let svc = UpstreamService::new(build_client(&TimeoutConfig::default()), authority, "test");

        let response = svc
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
