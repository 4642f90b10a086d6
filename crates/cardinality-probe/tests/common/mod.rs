//! Fake TSDB upstream for probe tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::get;

pub const UP_ONLY: &str = r#"{"status":"success","data":{"seriesCountByMetricName":[{"name":"up","value":42}],"labelValueCountByLabelName":[],"memoryInBytesByLabelName":[],"seriesCountByLabelValuePair":[]}}"#;

pub const FULL: &str = r#"{
    "status": "success",
    "data": {
        "seriesCountByMetricName": [
            {"name": "up", "value": 42},
            {"name": "node_cpu_seconds_total", "value": 128}
        ],
        "labelValueCountByLabelName": [
            {"name": "__name__", "value": 211},
            {"name": "instance", "value": 6}
        ],
        "memoryInBytesByLabelName": [
            {"name": "__name__", "value": 8266}
        ],
        "seriesCountByLabelValuePair": [
            {"name": "job=node", "value": 425},
            {"name": "job=prometheus", "value": 83}
        ]
    }
}"#;

#[derive(Clone)]
struct Canned {
    status: StatusCode,
    body: String,
    delay: Duration,
}

#[derive(Clone)]
struct UpstreamState {
    canned: Arc<Mutex<Canned>>,
    hits: Arc<AtomicUsize>,
}

/// A local HTTP server answering `/api/v1/status/tsdb` with a canned response.
pub struct Upstream {
    addr: SocketAddr,
    state: UpstreamState,
}

impl Upstream {
    pub async fn start(status: StatusCode, body: &str) -> Self {
        let state = UpstreamState {
            canned: Arc::new(Mutex::new(Canned {
                status,
                body: body.to_string(),
                delay: Duration::ZERO,
            })),
            hits: Arc::new(AtomicUsize::new(0)),
        };

        let router = Router::new()
            .route("/api/v1/status/tsdb", get(tsdb_status))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    pub fn respond_with(&self, status: StatusCode, body: &str) {
        let mut canned = self.state.canned.lock().unwrap();
        canned.status = status;
        canned.body = body.to_string();
    }

    pub fn delay(&self, delay: Duration) {
        self.state.canned.lock().unwrap().delay = delay;
    }
}

/// Serve `router` on an ephemeral local port and return its base URL.
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

async fn tsdb_status(State(state): State<UpstreamState>) -> impl IntoResponse {
    state.hits.fetch_add(1, Ordering::SeqCst);
    let canned = state.canned.lock().unwrap().clone();
    if !canned.delay.is_zero() {
        tokio::time::sleep(canned.delay).await;
    }
    (
        canned.status,
        [(header::CONTENT_TYPE, "application/json")],
        canned.body,
    )
}
