//! Metrics collection and exposition.
//!
//! # Metrics
//! - `charset_conversions_total` (counter): conversions by route, outcome
//! - `charset_conversion_failures_total` (counter): failures by route, kind
//! - `charset_converted_bytes_total` (counter): converted body bytes by route
//! - `proxy_requests_total` (counter): requests by route, status
//! - `proxy_request_duration_seconds` (histogram): latency by route

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => {
            tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter")
        }
    }
}

pub fn record_conversion(route: &str, bytes: usize) {
    counter!("charset_conversions_total", "route" => route.to_owned(), "outcome" => "success")
        .increment(1);
    counter!("charset_converted_bytes_total", "route" => route.to_owned()).increment(bytes as u64);
}

pub fn record_conversion_failure(route: &str, kind: &'static str) {
    counter!("charset_conversions_total", "route" => route.to_owned(), "outcome" => "failed")
        .increment(1);
    counter!("charset_conversion_failures_total", "route" => route.to_owned(), "kind" => kind)
        .increment(1);
}

pub fn record_request(route: &str, status: u16, start: Instant) {
    counter!("proxy_requests_total", "route" => route.to_owned(), "status" => status.to_string())
        .increment(1);
    histogram!("proxy_request_duration_seconds", "route" => route.to_owned())
        .record(start.elapsed().as_secs_f64());
}
