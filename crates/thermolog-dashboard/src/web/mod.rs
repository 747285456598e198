//! Dashboard web UI module.

use askama::Template;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::warn;

use thermolog_core::{Datastore, Reading};

use crate::rendering::Chart;

/// Shared state for the dashboard handlers.
#[derive(Debug)]
pub struct AppState {
    pub store: Datastore,
    /// Sampling interval of the probe feeding the store.
    pub sample_interval: Duration,
}

/// Main index page template.
#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate {
    chart: Chart,
    refresh_secs: u64,
}

/// Optional time window.
#[derive(Debug, Default, Deserialize)]
struct RangeQuery {
    hours: Option<u32>,
}

impl RangeQuery {
    /// Lower bound of the window. A span reaching past the representable
    /// range means no bound.
    fn since(&self) -> Option<DateTime<Utc>> {
        let span = chrono::Duration::try_hours(i64::from(self.hours?))?;
        Utc::now().checked_sub_signed(span)
    }
}

/// Creates the web router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Main page
        .route("/", get(index))
        // Raw readings
        .route("/api/readings", get(readings_json))
        // Liveness
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET / - Chart page
async fn index(State(state): State<Arc<AppState>>, Query(range): Query<RangeQuery>) -> Response {
    let readings = match state.store.readings(range.since()).await {
        Ok(readings) => readings,
        Err(e) => return internal_error(e),
    };

    // Missing more than one cycle leaves a gap in the line.
    let chart = Chart::build(&readings, state.sample_interval * 2);
    let template = IndexTemplate {
        chart,
        refresh_secs: state.sample_interval.as_secs().max(1),
    };
    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => internal_error(e),
    }
}

/// GET /api/readings - Readings as JSON
async fn readings_json(
    State(state): State<Arc<AppState>>,
    Query(range): Query<RangeQuery>,
) -> Result<Json<Vec<Reading>>, Response> {
    state
        .store
        .readings(range.since())
        .await
        .map(Json)
        .map_err(internal_error)
}

/// GET /health - 200 if the datastore answers a query, 503 otherwise
async fn health(State(state): State<Arc<AppState>>) -> Response {
    match state.store.ping().await {
        Ok(()) => Json(json!({ "status": "ok" })).into_response(),
        Err(e) => {
            warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unhealthy", "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

fn internal_error(e: impl std::fmt::Display) -> Response {
    warn!("Request failed: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("Failed to load readings: {}", e),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tempfile::TempDir;
    use tower::ServiceExt;

    /// Dashboard state over a read-only handle, plus the writer feeding it.
    struct Fixture {
        _dir: TempDir,
        writer: Datastore,
        state: Arc<AppState>,
    }

    async fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("readings.db");
        let writer = Datastore::open(&path).await.unwrap();
        let store = Datastore::open_existing(&path).await.unwrap();
        let state = Arc::new(AppState {
            store,
            sample_interval: Duration::from_secs(60),
        });
        Fixture {
            _dir: dir,
            writer,
            state,
        }
    }

    async fn get(state: Arc<AppState>, uri: &str) -> (StatusCode, String) {
        let response = create_router(state)
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    fn reading(minutes_ago: i64, temperature: f64, humidity: f64) -> Reading {
        Reading {
            timestamp: Utc::now() - chrono::Duration::minutes(minutes_ago),
            temperature,
            humidity,
        }
    }

    #[tokio::test]
    async fn test_index_with_empty_store() {
        let fixture = fixture().await;

        let (status, body) = get(fixture.state, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<svg"));
        assert!(body.contains("No readings yet."));
        assert!(body.contains("0 readings"));
    }

    #[tokio::test]
    async fn test_index_with_readings() {
        let fixture = fixture().await;
        fixture.writer.insert(&reading(2, 21.0, 45.0)).await.unwrap();
        fixture.writer.insert(&reading(1, 21.5, 47.2)).await.unwrap();

        let (status, body) = get(fixture.state, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("21.5°C"));
        assert!(body.contains("47.2%"));
        assert!(body.contains("2 readings"));
        assert!(!body.contains("No readings yet."));
    }

    #[tokio::test]
    async fn test_hours_filter() {
        let fixture = fixture().await;
        fixture.writer.insert(&reading(300, 19.0, 40.0)).await.unwrap();
        fixture.writer.insert(&reading(10, 21.5, 47.2)).await.unwrap();

        let (status, body) = get(fixture.state.clone(), "/api/readings?hours=1").await;
        assert_eq!(status, StatusCode::OK);
        let rows: Vec<Reading> = serde_json::from_str(&body).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].temperature, 21.5);

        let (_, body) = get(fixture.state, "/api/readings").await;
        let rows: Vec<Reading> = serde_json::from_str(&body).unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn test_hours_beyond_calendar_means_everything() {
        let fixture = fixture().await;
        fixture.writer.insert(&reading(300, 19.0, 40.0)).await.unwrap();
        fixture.writer.insert(&reading(10, 21.5, 47.2)).await.unwrap();

        let (status, body) = get(fixture.state.clone(), "/api/readings?hours=4000000000").await;
        assert_eq!(status, StatusCode::OK);
        let rows: Vec<Reading> = serde_json::from_str(&body).unwrap();
        assert_eq!(rows.len(), 2);

        let (status, body) = get(fixture.state, "/?hours=4294967295").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("2 readings"));
    }

    #[test]
    fn test_since_bounds() {
        assert_eq!(RangeQuery { hours: None }.since(), None);
        assert_eq!(RangeQuery { hours: Some(u32::MAX) }.since(), None);

        let since = RangeQuery { hours: Some(2) }.since().unwrap();
        let span = Utc::now() - since;
        assert!(span >= chrono::Duration::hours(2));
        assert!(span < chrono::Duration::hours(2) + chrono::Duration::seconds(5));
    }

    #[tokio::test]
    async fn test_health_ok() {
        let fixture = fixture().await;

        let (status, body) = get(fixture.state, "/health").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn test_health_unavailable_when_store_closed() {
        let fixture = fixture().await;
        fixture.state.store.close().await;

        let (status, body) = get(fixture.state, "/health").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body.contains("unhealthy"));
    }
}
