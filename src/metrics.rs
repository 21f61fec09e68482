//! Prometheus metrics.
//!
//! HTTP traffic is recorded by [`metrics_middleware`] under the matched route
//! template, so `/api/hostel/rooms/{id}` is one series no matter how many
//! rooms exist. The `track_*` functions record school operations. Everything
//! is a no-op when `OBSERVABILITY_ENABLED=false`.

use std::sync::OnceLock;
use std::time::{Duration, Instant};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
    routing::get,
};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

const LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Large broadcasts reach whole schools.
const RECIPIENT_BUCKETS: &[f64] = &[1.0, 5.0, 25.0, 100.0, 500.0, 2_500.0, 10_000.0];

const UPKEEP_INTERVAL: Duration = Duration::from_secs(5);

static OBSERVABILITY_ENABLED: OnceLock<bool> = OnceLock::new();

pub fn is_observability_enabled() -> bool {
    *OBSERVABILITY_ENABLED.get_or_init(|| {
        std::env::var("OBSERVABILITY_ENABLED")
            .map(|v| !matches!(v.trim().to_lowercase().as_str(), "false" | "0" | "off"))
            .unwrap_or(true)
    })
}

/// Installs the Prometheus recorder and its upkeep task.
///
/// Returns `None` when observability is disabled or the recorder cannot be
/// installed (for example a second install in the same process).
pub fn init_metrics() -> Option<PrometheusHandle> {
    if !is_observability_enabled() {
        return None;
    }

    let installed = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            LATENCY_BUCKETS,
        )
        .and_then(|b| {
            b.set_buckets_for_metric(
                Matcher::Full("broadcast_recipients".to_string()),
                RECIPIENT_BUCKETS,
            )
        })
        .and_then(|b| b.install_recorder());

    let handle = match installed {
        Ok(handle) => handle,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to install Prometheus recorder, metrics disabled");
            return None;
        }
    };

    let upkeep = handle.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(UPKEEP_INTERVAL);
        loop {
            ticker.tick().await;
            upkeep.run_upkeep();
        }
    });

    Some(handle)
}

/// Keeps `http_requests_active` balanced even if the handler future is dropped.
struct InFlight;

impl InFlight {
    fn start() -> Self {
        gauge!("http_requests_active").increment(1.0);
        Self
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        gauge!("http_requests_active").decrement(1.0);
    }
}

fn status_class(status: u16) -> &'static str {
    match status {
        100..=199 => "1xx",
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        500..=599 => "5xx",
        _ => "other",
    }
}

pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    if !is_observability_enabled() {
        return next.run(req).await;
    }

    // Unmatched requests share one series instead of one per unknown URL.
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| "unmatched".to_string(), |p| p.as_str().to_string());
    let method = req.method().to_string();

    let _in_flight = InFlight::start();
    let started = Instant::now();
    let response = next.run(req).await;
    let elapsed = started.elapsed().as_secs_f64();

    let status = response.status().as_u16();
    counter!(
        "http_requests_total",
        "method" => method.clone(),
        "path" => route.clone(),
        "status" => status.to_string(),
        "class" => status_class(status)
    )
    .increment(1);
    histogram!("http_request_duration_seconds", "method" => method, "path" => route)
        .record(elapsed);

    response
}

pub fn metrics_app(handle: PrometheusHandle) -> Router {
    Router::new().route("/metrics", get(move || async move { handle.render() }))
}

fn outcome(ok: bool, yes: &'static str, no: &'static str) -> &'static str {
    if ok { yes } else { no }
}

pub fn track_user_login_success(role: &str) {
    if is_observability_enabled() {
        counter!("user_logins_total", "role" => role.to_string(), "status" => "success")
            .increment(1);
    }
}

pub fn track_user_login_failure(reason: &'static str) {
    if is_observability_enabled() {
        counter!("user_logins_total", "role" => "unknown", "status" => "failure", "reason" => reason)
            .increment(1);
    }
}

pub fn track_jwt_issued() {
    if is_observability_enabled() {
        counter!("jwt_tokens_issued_total").increment(1);
    }
}

pub fn track_user_created(role: &str) {
    if is_observability_enabled() {
        counter!("users_created_total", "role" => role.to_string()).increment(1);
    }
}

pub fn track_school_created() {
    if is_observability_enabled() {
        counter!("schools_created_total").increment(1);
    }
}

pub fn track_attendance_check_in(allowed: bool) {
    if is_observability_enabled() {
        let result = outcome(allowed, "accepted", "outside_geofence");
        counter!("attendance_check_ins_total", "outcome" => result).increment(1);
    }
}

/// `outcome` is one of `allocated`, `released`, `room_full`, `already_allocated`.
pub fn track_hostel_allocation(outcome: &'static str) {
    if is_observability_enabled() {
        counter!("hostel_allocations_total", "outcome" => outcome).increment(1);
    }
}

pub fn track_inventory_movement(direction: &'static str, quantity: i32) {
    if is_observability_enabled() {
        counter!("inventory_units_moved_total", "direction" => direction)
            .increment(u64::try_from(quantity).unwrap_or(0));
    }
}

pub fn track_leave_decision(stage: &'static str, approved: bool) {
    if is_observability_enabled() {
        let decision = outcome(approved, "approved", "rejected");
        counter!("leave_decisions_total", "stage" => stage, "decision" => decision).increment(1);
    }
}

pub fn track_radio_program_write(operation: &'static str) {
    if is_observability_enabled() {
        counter!("radio_program_writes_total", "operation" => operation).increment(1);
    }
}

pub fn track_upload(files: usize, bytes: usize) {
    if is_observability_enabled() {
        counter!("uploaded_files_total").increment(files as u64);
        counter!("uploaded_bytes_total").increment(bytes as u64);
    }
}

pub fn track_tally_request(endpoint: &'static str, success: bool) {
    if is_observability_enabled() {
        let status = outcome(success, "success", "error");
        counter!("tally_requests_total", "endpoint" => endpoint, "status" => status).increment(1);
    }
}

pub fn track_broadcast(recipients: usize) {
    if is_observability_enabled() {
        counter!("broadcasts_total").increment(1);
        histogram!("broadcast_recipients").record(recipients as f64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_class() {
        assert_eq!(status_class(201), "2xx");
        assert_eq!(status_class(409), "4xx");
        assert_eq!(status_class(502), "5xx");
        assert_eq!(status_class(42), "other");
    }

    #[test]
    fn test_tracking_without_recorder_is_harmless() {
        track_hostel_allocation("allocated");
        track_inventory_movement("out", -3);
        track_broadcast(0);
    }
}
