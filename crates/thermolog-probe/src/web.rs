//! Health endpoint for the sampling loop.

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use std::sync::Arc;
use thermolog_core::{HealthMonitor, HealthReport};
use tower_http::trace::TraceLayer;

/// Creates the health router.
pub fn create_router(health: Arc<HealthMonitor>) -> Router {
    Router::new()
        .route("/health", get(health_get))
        .layer(TraceLayer::new_for_http())
        .with_state(health)
}

/// GET /health - 200 while readings arrive, 503 after two missed intervals
async fn health_get(State(health): State<Arc<HealthMonitor>>) -> (StatusCode, Json<HealthReport>) {
    let report = health.report();
    let status = if report.healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use std::time::Duration;
    use tower::ServiceExt;

    async fn get_health(health: Arc<HealthMonitor>) -> (StatusCode, serde_json::Value) {
        let response = create_router(health)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test(start_paused = true)]
    async fn test_healthy_after_success() {
        let health = Arc::new(HealthMonitor::new(Duration::from_secs(5)));
        health.record_success();

        let (status, body) = get_health(health).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["total_samples"], 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unhealthy_after_two_missed_intervals() {
        let health = Arc::new(HealthMonitor::new(Duration::from_secs(5)));
        health.record_failure("Sensor still busy after measurement");
        tokio::time::advance(Duration::from_secs(11)).await;

        let (status, body) = get_health(health).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "unhealthy");
        assert_eq!(body["consecutive_failures"], 1);
    }
}
