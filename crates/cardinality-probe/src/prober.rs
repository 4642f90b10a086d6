//! Probe logic.
//!
//! Issues a GET against the upstream status endpoint, decodes the body and
//! overwrites the matching gauges. No retries, no backoff. Redirects are
//! followed up to [`MAX_REDIRECTS`] hops, and `https` upstreams are reached
//! over rustls.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::header::{HOST, LOCATION, USER_AGENT};
use http::{Method, Request, StatusCode, Uri};
use http_body_util::{BodyExt, Empty};
use rustls::RootCertStore;
use rustls::pki_types::ServerName;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_rustls::TlsConnector;
use tracing::{debug, info, warn};

use cardinality_metrics::{Collection, MetricState};

use crate::error::{ProbeError, ProbeResult};
use crate::status::CardinalityStatus;

/// Path of the upstream cardinality status endpoint.
pub const STATUS_PATH: &str = "/api/v1/status/tsdb";

/// Redirect hops followed before a request is abandoned.
pub const MAX_REDIRECTS: usize = 10;

const USER_AGENT_VALUE: &str = concat!("cardinality-exporter/", env!("CARGO_PKG_VERSION"));

/// Outcome of a successful probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeReport {
    /// HTTP status returned by the upstream.
    pub status: StatusCode,
    /// Pairs written into the gauges.
    pub applied: usize,
}

/// Probes one upstream with a fixed per-request timeout.
#[derive(Debug, Clone)]
pub struct Prober {
    url: String,
    timeout: Duration,
    tls_roots: Arc<RootCertStore>,
}

/// One resolved hop: where to dial and what to send.
struct Target {
    address: String,
    origin: String,
    server_name: Option<ServerName<'static>>,
    request: Request<Empty<Bytes>>,
}

enum Reply {
    Body(StatusCode, Bytes),
    Redirect(String),
}

impl Prober {
    /// Create a prober for `base_url` (an `http` or `https` origin).
    ///
    /// `timeout` bounds the whole exchange, redirects included. `https`
    /// upstreams are verified against the Mozilla root store.
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let mut roots = RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

        Self {
            url: format!("{}{STATUS_PATH}", base_url.trim_end_matches('/')),
            timeout,
            tls_roots: Arc::new(roots),
        }
    }

    /// Replace the trust anchors used for `https` upstreams.
    pub fn with_tls_roots(mut self, roots: RootCertStore) -> Self {
        self.tls_roots = Arc::new(roots);
        self
    }

    /// Full URL of the status endpoint.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run one fetch-decode-update cycle.
    ///
    /// On any error `state` is left untouched.
    pub async fn probe(&self, state: &MetricState) -> ProbeResult<ProbeReport> {
        let (status, document) = self.fetch().await?;

        if !document.is_success() {
            warn!(url = %self.url, status = %document.status, "upstream reported non-success status field");
        }

        let applied = apply(&document, state);
        info!(
            url = %self.url,
            status = %status,
            applied,
            "request to upstream returned status"
        );

        Ok(ProbeReport { status, applied })
    }

    /// Fetch and decode the status document without touching any state.
    pub async fn fetch(&self) -> ProbeResult<(StatusCode, CardinalityStatus)> {
        let (status, body) = match tokio::time::timeout(self.timeout, self.follow()).await {
            Ok(result) => result?,
            Err(_) => {
                debug!(url = %self.url, timeout = ?self.timeout, "upstream request timed out");
                return Err(ProbeError::Transport {
                    url: self.url.clone(),
                    reason: format!("request timed out after {:?}", self.timeout),
                });
            }
        };

        let document = CardinalityStatus::from_slice(&body).map_err(|source| ProbeError::Decode {
            url: self.url.clone(),
            source,
        })?;

        Ok((status, document))
    }

    /// Send the request, following redirects until a final response.
    async fn follow(&self) -> ProbeResult<(StatusCode, Bytes)> {
        let mut url = self.url.clone();
        for _ in 0..=MAX_REDIRECTS {
            let target = self.build_request(&url)?;
            match self.send(target).await? {
                Reply::Body(status, body) => return Ok((status, body)),
                Reply::Redirect(next) => {
                    debug!(from = %url, to = %next, "following upstream redirect");
                    url = next;
                }
            }
        }

        Err(ProbeError::Transport {
            url: self.url.clone(),
            reason: format!("stopped after {MAX_REDIRECTS} redirects"),
        })
    }

    /// Build the GET request for `url` and the `host:port` to dial.
    fn build_request(&self, url: &str) -> ProbeResult<Target> {
        let construction = |reason: String| ProbeError::RequestConstruction {
            url: self.url.clone(),
            reason,
        };

        let uri: Uri = url
            .parse()
            .map_err(|e: http::uri::InvalidUri| construction(e.to_string()))?;

        let tls = match uri.scheme_str() {
            Some("http") => false,
            Some("https") => true,
            Some(other) => return Err(construction(format!("unsupported scheme {other:?}"))),
            None => return Err(construction("missing scheme".to_string())),
        };
        let authority = uri
            .authority()
            .ok_or_else(|| construction("missing host".to_string()))?;
        let default_port = if tls { 443 } else { 80 };
        let address = format!("{}:{}", authority.host(), authority.port_u16().unwrap_or(default_port));

        let server_name = if tls {
            let host = authority.host().trim_start_matches('[').trim_end_matches(']');
            let name = ServerName::try_from(host)
                .map_err(|e| construction(format!("invalid tls server name {host:?}: {e}")))?
                .to_owned();
            Some(name)
        } else {
            None
        };

        let path = uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or(STATUS_PATH);

        let request = Request::builder()
            .method(Method::GET)
            .uri(path)
            .header(HOST, authority.as_str())
            .header(USER_AGENT, USER_AGENT_VALUE)
            .body(Empty::<Bytes>::new())
            .map_err(|e| construction(e.to_string()))?;

        let origin = format!("{}://{}", if tls { "https" } else { "http" }, authority.as_str());

        Ok(Target {
            address,
            origin,
            server_name,
            request,
        })
    }

    fn tls_connector(&self) -> Result<TlsConnector, rustls::Error> {
        let config = rustls::ClientConfig::builder_with_provider(rustls::crypto::ring::default_provider().into())
            .with_safe_default_protocol_versions()?
            .with_root_certificates(Arc::clone(&self.tls_roots))
            .with_no_client_auth();
        Ok(TlsConnector::from(Arc::new(config)))
    }

    async fn send(&self, target: Target) -> ProbeResult<Reply> {
        let transport = |reason: String| ProbeError::Transport {
            url: self.url.clone(),
            reason,
        };

        let stream = tokio::net::TcpStream::connect(&target.address)
            .await
            .map_err(|e| transport(e.to_string()))?;

        match target.server_name {
            None => self.exchange(stream, &target.origin, target.request).await,
            Some(server_name) => {
                let connector = self
                    .tls_connector()
                    .map_err(|e| transport(format!("tls setup: {e}")))?;
                let stream = connector
                    .connect(server_name, stream)
                    .await
                    .map_err(|e| transport(format!("tls handshake: {e}")))?;
                self.exchange(stream, &target.origin, target.request).await
            }
        }
    }

    async fn exchange<S>(&self, stream: S, origin: &str, request: Request<Empty<Bytes>>) -> ProbeResult<Reply>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let transport = |reason: String| ProbeError::Transport {
            url: self.url.clone(),
            reason,
        };

        let path = request.uri().path().to_string();
        let io = hyper_util::rt::TokioIo::new(stream);
        let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
            .await
            .map_err(|e| transport(e.to_string()))?;

        // Drive the connection in the background.
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                debug!(error = %e, "upstream connection closed with error");
            }
        });

        let response = sender
            .send_request(request)
            .await
            .map_err(|e| transport(e.to_string()))?;

        let status = response.status();
        if is_redirect(status) {
            if let Some(location) = response.headers().get(LOCATION) {
                let location = location
                    .to_str()
                    .map_err(|e| transport(format!("invalid redirect location: {e}")))?;
                return Ok(Reply::Redirect(resolve_location(origin, &path, location)));
            }
        }
        if !status.is_success() {
            return Err(ProbeError::UpstreamStatus {
                url: self.url.clone(),
                status,
            });
        }

        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|source| ProbeError::BodyRead {
                url: self.url.clone(),
                source,
            })?
            .to_bytes();

        Ok(Reply::Body(status, body))
    }
}

fn is_redirect(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    )
}

/// Resolve a `Location` header against the request it answered.
fn resolve_location(origin: &str, path: &str, location: &str) -> String {
    if location.contains("://") {
        location.to_string()
    } else if let Some(rest) = location.strip_prefix("//") {
        let scheme = origin.split("://").next().unwrap_or("http");
        format!("{scheme}://{rest}")
    } else if location.starts_with('/') {
        format!("{origin}{location}")
    } else {
        let dir = path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
        format!("{origin}{dir}/{location}")
    }
}

/// Fold a decoded document into the gauges and return the number of pairs
/// written. Keys absent from `document` keep whatever value they already had.
pub fn apply(document: &CardinalityStatus, state: &MetricState) -> usize {
    let mut applied = 0;

    for collection in Collection::ALL {
        for pair in document.data.pairs(collection) {
            state.set(collection, &pair.name, pair.value as f64);
            applied += 1;
        }
    }

    applied
}
