//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the proxy handler
//! - Wire up middleware (request ID, tracing, timeout)
//! - Compile one upstream + charset filter per configured route
//! - Dispatch requests to the matching route

use std::convert::Infallible;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{uri::Authority, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::util::BoxCloneSyncService;
use tower::{ServiceBuilder, ServiceExt};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::charset::{is_utf8_label, CodecTable};
use crate::config::{ProxyConfig, RouteConfig};
use crate::filter::{CharsetLayer, TranscodeFilter};
use crate::http::request::{propagate_request_id_layer, request_id, set_request_id_layer};
use crate::http::upstream::{build_client, HttpClient, UpstreamService};
use crate::observability::metrics;
use crate::routing::{AndMatcher, Route, RouteTable};

/// A route's full pipeline: charset filter over the upstream forwarder.
pub type RouteService = BoxCloneSyncService<Request<Body>, Response, Infallible>;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<RouteTable<RouteService>>,
}

/// HTTP server for the charset proxy.
pub struct HttpServer {
    router: Router,
    route_count: usize,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Self {
        let client = build_client(&config.timeouts);
        let routes = config
            .routes
            .iter()
            .filter_map(|route| compile_route(route, &client))
            .collect();

        let table = RouteTable::new(routes);
        if table.is_empty() {
            tracing::warn!("No routes compiled, every request will be answered with 404");
        }
        let route_count = table.len();

        let state = AppState {
            routes: Arc::new(table),
        };

        let router = Self::build_router(&config, state);
        Self {
            router,
            route_count,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    request_id = %request_id(req.headers()),
                    method = %req.method(),
                    path = %req.uri().path(),
                )
            }))
            .layer(propagate_request_id_layer())
            .layer(set_request_id_layer())
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.route_count,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Attach the route's charset filter to its upstream.
fn compile_route(route: &RouteConfig, client: &HttpClient) -> Option<Route<RouteService>> {
    let authority = match Authority::from_str(&route.upstream) {
        Ok(a) => a,
        Err(e) => {
            tracing::error!(
                route = %route.name,
                upstream = %route.upstream,
                error = %e,
                "Skipping route with invalid upstream"
            );
            return None;
        }
    };

    let charset = route.rewrite.charset.clone();
    let passthrough = !CodecTable::shared().contains(&charset.from);
    if passthrough && !is_utf8_label(&charset.from) {
        tracing::warn!(
            route = %route.name,
            from = %charset.from,
            "No decoder for source charset, bodies will pass through unchanged"
        );
    }
    tracing::info!(
        route = %route.name,
        upstream = %authority,
        from = %charset.from,
        to = %charset.to,
        passthrough,
        "Route attached"
    );

    let filter = TranscodeFilter::new(route.name.as_str(), charset)
        .with_max_body_bytes(route.max_body_bytes);
    let service = ServiceBuilder::new()
        .layer(CharsetLayer::new(filter))
        .service(UpstreamService::new(client.clone(), authority, route.name.as_str()));

    Some(Route {
        name: route.name.clone(),
        priority: route.priority,
        matcher: Box::new(AndMatcher::for_route(route)),
        target: BoxCloneSyncService::new(service),
    })
}

/// Main proxy handler.
/// Looks up the route and runs the request through its pipeline.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();

    let Some(route) = state.routes.match_request(&request) else {
        tracing::warn!(path = %request.uri().path(), "No route matched");
        metrics::record_request("none", StatusCode::NOT_FOUND.as_u16(), start_time);
        return (StatusCode::NOT_FOUND, "No matching route found").into_response();
    };

    let response = match route.target.clone().oneshot(request).await {
        Ok(response) => response,
        Err(never) => match never {},
    };

    metrics::record_request(&route.name, response.status().as_u16(), start_time);
    response
}
