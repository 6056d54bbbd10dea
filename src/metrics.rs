//! Prometheus counters for the poller, notifier, dispatcher and API clients,
//! and an optional `/metrics` endpoint serving them.

use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Request, Response, Server, StatusCode};
use lazy_static::lazy_static;
use log::info;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use std::convert::Infallible;
use std::net::SocketAddr;

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    pub static ref POLLER_TICKS: IntCounter = IntCounter::new(
        "headroom_poller_ticks_total",
        "Polls of the trades endpoint"
    ).expect("valid metric");

    pub static ref POLLER_FETCH_FAILURES: IntCounter = IntCounter::new(
        "headroom_poller_fetch_failures_total",
        "Polls whose trade fetch failed"
    ).expect("valid metric");

    pub static ref NOTIFICATIONS: IntCounterVec = IntCounterVec::new(
        Opts::new("headroom_notifications_total", "Buy alerts by delivery outcome"),
        &["outcome"]
    ).expect("valid metric");

    pub static ref COMMANDS_HANDLED: IntCounterVec = IntCounterVec::new(
        Opts::new("headroom_commands_handled_total", "Bot commands handled"),
        &["command"]
    ).expect("valid metric");

    pub static ref UPSTREAM_ERRORS: IntCounterVec = IntCounterVec::new(
        Opts::new("headroom_upstream_errors_total", "Failed upstream API calls"),
        &["source"]
    ).expect("valid metric");

    pub static ref WATERMARK: IntGauge = IntGauge::new(
        "headroom_watermark_timestamp",
        "Block timestamp of the newest announced buy"
    ).expect("valid metric");
}

/// Registers every collector with [`REGISTRY`]. Call once at startup.
pub fn init() -> Result<(), prometheus::Error> {
    REGISTRY.register(Box::new(POLLER_TICKS.clone()))?;
    REGISTRY.register(Box::new(POLLER_FETCH_FAILURES.clone()))?;
    REGISTRY.register(Box::new(NOTIFICATIONS.clone()))?;
    REGISTRY.register(Box::new(COMMANDS_HANDLED.clone()))?;
    REGISTRY.register(Box::new(UPSTREAM_ERRORS.clone()))?;
    REGISTRY.register(Box::new(WATERMARK.clone()))?;
    Ok(())
}

pub fn record_tick() {
    POLLER_TICKS.inc();
}

pub fn record_fetch_failure() {
    POLLER_FETCH_FAILURES.inc();
}

pub fn record_notification(success: bool) {
    let outcome = if success { "sent" } else { "failed" };
    NOTIFICATIONS.with_label_values(&[outcome]).inc();
}

pub fn record_command(command: &'static str) {
    COMMANDS_HANDLED.with_label_values(&[command]).inc();
}

pub fn record_upstream_error(source: &'static str) {
    UPSTREAM_ERRORS.with_label_values(&[source]).inc();
}

pub fn record_watermark(timestamp: i64) {
    WATERMARK.set(timestamp);
}

/// Registry contents in the Prometheus text format.
pub fn render() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&REGISTRY.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

async fn handle(_req: Request<Body>) -> Result<Response<Body>, Infallible> {
    let response = match render() {
        Ok(text) => Response::new(Body::from(text)),
        Err(e) => {
            let mut response = Response::new(Body::from(e.to_string()));
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            response
        }
    };
    Ok(response)
}

/// Serves [`render`] over HTTP until the task is dropped.
pub async fn serve(addr: SocketAddr) -> Result<(), hyper::Error> {
    let make_svc = make_service_fn(|_| async { Ok::<_, Infallible>(service_fn(handle)) });
    let server = Server::try_bind(&addr)?.serve(make_svc);
    info!("Metrics exporter listening on {}", addr);
    server.await
}
