//! cardinality-api - HTTP surface of the cardinality exporter.
//!
//! # Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/` | Static page linking to the scrape path |
//! | GET | `{metrics_path}` | Prometheus exposition of the current gauges |
//!
//! Scrapes read whatever the gauges hold at that moment and are
//! independent of probe timing.

pub mod handlers;

use axum::Router;
use axum::routing::get;
use cardinality_metrics::MetricState;

/// Default scrape path.
pub const DEFAULT_METRICS_PATH: &str = "/metrics";

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub metrics: MetricState,
    pub metrics_path: String,
}

/// Build the exporter router.
///
/// `metrics_path` must start with `/` and must not be `/` itself.
pub fn build_router(metrics: MetricState, metrics_path: &str) -> Router {
    let state = ApiState {
        metrics,
        metrics_path: metrics_path.to_string(),
    };

    Router::new()
        .route("/", get(handlers::index))
        .route(metrics_path, get(handlers::prometheus_metrics))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use cardinality_metrics::Collection;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn get_body(router: Router, uri: &str) -> (StatusCode, String) {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let resp = router.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn root_links_to_metrics_path() {
        let router = build_router(MetricState::new().unwrap(), DEFAULT_METRICS_PATH);
        let (status, body) = get_body(router, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<title>Cardinality Exporter</title>"));
        assert!(body.contains("<a href=\"/metrics\">Metrics</a>"));
    }

    #[tokio::test]
    async fn scrape_serves_current_gauges() {
        let metrics = MetricState::new().unwrap();
        metrics.set(Collection::SeriesCountByMetricName, "up", 42.0);

        let router = build_router(metrics.clone(), DEFAULT_METRICS_PATH);
        let (status, body) = get_body(router.clone(), "/metrics").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("cardinality_exporter_series_count_by_metric_name{metric=\"up\"} 42"));

        // Later updates show up on the next scrape.
        metrics.set(Collection::SeriesCountByMetricName, "up", 43.0);
        let (_, body) = get_body(router, "/metrics").await;
        assert!(body.contains("cardinality_exporter_series_count_by_metric_name{metric=\"up\"} 43"));
    }

    #[tokio::test]
    async fn custom_metrics_path() {
        let router = build_router(MetricState::new().unwrap(), "/probe/metrics");

        let (status, body) = get_body(router.clone(), "/probe/metrics").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("cardinality_exporter_build_info"));

        let (status, _) = get_body(router.clone(), "/metrics").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, body) = get_body(router, "/").await;
        assert!(body.contains("<a href=\"/probe/metrics\">Metrics</a>"));
    }
}
