//! Request counters for `/api/metrics`.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

const SLOW_REQUEST: Duration = Duration::from_secs(1);

pub struct RequestMetrics {
    started: Instant,
    total: AtomicU64,
    success: AtomicU64,
    error: AtomicU64,
    total_micros: AtomicU64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub total: u64,
    pub success: u64,
    pub error: u64,
    /// Percentage of requests answered below 400.
    pub success_rate: f64,
    pub avg_response_ms: f64,
    pub uptime_secs: u64,
}

impl Default for RequestMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestMetrics {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            total: AtomicU64::new(0),
            success: AtomicU64::new(0),
            error: AtomicU64::new(0),
            total_micros: AtomicU64::new(0),
        }
    }

    pub fn record(&self, status: StatusCode, elapsed: Duration) {
        self.total.fetch_add(1, Ordering::Relaxed);
        if status.as_u16() < 400 {
            self.success.fetch_add(1, Ordering::Relaxed);
        } else {
            self.error.fetch_add(1, Ordering::Relaxed);
        }
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.total_micros.fetch_add(micros, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let total = self.total.load(Ordering::Relaxed);
        let success = self.success.load(Ordering::Relaxed);
        let error = self.error.load(Ordering::Relaxed);
        let micros = self.total_micros.load(Ordering::Relaxed);

        let (success_rate, avg_response_ms) = if total == 0 {
            (0.0, 0.0)
        } else {
            (
                success as f64 * 100.0 / total as f64,
                micros as f64 / 1000.0 / total as f64,
            )
        };

        MetricsSnapshot {
            total,
            success,
            error,
            success_rate,
            avg_response_ms,
            uptime_secs: self.started.elapsed().as_secs(),
        }
    }
}

/// Middleware: time every request and count it by outcome.
pub async fn track_requests(
    State(metrics): State<Arc<RequestMetrics>>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let started = Instant::now();

    let response = next.run(request).await;
    let elapsed = started.elapsed();
    metrics.record(response.status(), elapsed);

    if elapsed > SLOW_REQUEST {
        tracing::warn!(
            %method,
            %uri,
            status = response.status().as_u16(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Slow request"
        );
    }
    response
}
