//! HTTP handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::{Html, IntoResponse};
use tracing::error;

use crate::ApiState;

/// GET /
pub async fn index(State(state): State<ApiState>) -> Html<String> {
    Html(format!(
        "<html>\n\
         <head><title>Cardinality Exporter</title></head>\n\
         <body>\n\
         <h1>Cardinality Exporter</h1>\n\
         <p><a href=\"{}\">Metrics</a></p>\n\
         </body>\n\
         </html>\n",
        state.metrics_path
    ))
}

/// GET {metrics_path}
pub async fn prometheus_metrics(State(state): State<ApiState>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [(CONTENT_TYPE, state.metrics.content_type())],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("failed to encode metrics: {e}"),
            )
                .into_response()
        }
    }
}
