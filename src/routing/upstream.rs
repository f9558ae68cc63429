//! Route group that forwards to the HTTP service owning an API area.
//!
//! # Responsibilities
//! - Validate the upstream base URL at load time
//! - Rewrite the request URI onto the upstream authority
//! - Forward the exact raw body bytes and end-to-end headers
//! - Relay the upstream response minus its hop-by-hop headers
//!
//! # Design Decisions
//! - Full original path is forwarded; the mount prefix is not stripped
//! - Only plain `http://` upstreams (the connector speaks no TLS)
//! - Transport failures surface as 502 through the Response Finalizer
//! - No retries or timeouts here; the platform bounds the invocation

use axum::body::Body;
use axum::http::header::{self, HeaderMap, HeaderName};
use axum::http::{Request, StatusCode, Uri};
use axum::response::Response;
use futures_util::future::BoxFuture;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use url::Url;

use crate::config::RouteGroupConfig;
use crate::error::{HandlerError, RouteLoadError};
use crate::http::request::NormalizedRequest;
use crate::routing::group::{HandlerGroup, HandlerResult};

const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

pub struct UpstreamGroup {
    name: String,
    /// `scheme://authority`
    origin: String,
    /// Base path without trailing slash; empty for root.
    base_path: String,
    client: Client<HttpConnector, Body>,
}

impl UpstreamGroup {
    /// Build from route config. A missing or unusable upstream is a load failure.
    pub fn from_config(config: &RouteGroupConfig) -> Result<Self, RouteLoadError> {
        let upstream = config
            .upstream
            .as_deref()
            .ok_or_else(|| RouteLoadError::MissingUpstream {
                group: config.name.clone(),
            })?;
        Self::new(&config.name, upstream)
    }

    pub fn new(name: &str, upstream: &str) -> Result<Self, RouteLoadError> {
        let invalid = |reason: String| RouteLoadError::InvalidUpstream {
            group: name.to_string(),
            upstream: upstream.to_string(),
            reason,
        };

        let url = Url::parse(upstream).map_err(|e| invalid(e.to_string()))?;
        if url.scheme() != "http" {
            return Err(invalid(format!("unsupported scheme `{}`", url.scheme())));
        }
        let host = url
            .host_str()
            .ok_or_else(|| invalid("missing host".to_string()))?;
        let authority = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };

        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        Ok(Self {
            name: name.to_string(),
            origin: format!("{}://{}", url.scheme(), authority),
            base_path: url.path().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn target_uri(&self, uri: &Uri) -> Result<Uri, HandlerError> {
        let path_and_query = uri.path_and_query().map_or("/", |pq| pq.as_str());
        format!("{}{}{}", self.origin, self.base_path, path_and_query)
            .parse()
            .map_err(|e| {
                HandlerError::with_status(StatusCode::BAD_GATEWAY, "Upstream request failed")
                    .caused_by(e)
            })
    }

    async fn forward(&self, req: NormalizedRequest) -> HandlerResult {
        let uri = self.target_uri(req.uri())?;

        let mut builder = Request::builder().method(req.method().clone()).uri(uri);
        if let Some(headers) = builder.headers_mut() {
            copy_end_to_end(req.headers(), headers);
        }
        let upstream_req = builder.body(Body::from(req.raw_body().clone())).map_err(|e| {
            HandlerError::with_status(StatusCode::BAD_GATEWAY, "Upstream request failed").caused_by(e)
        })?;

        match self.client.request(upstream_req).await {
            Ok(response) => {
                tracing::debug!(group = %self.name, status = %response.status(), "Upstream responded");
                let (mut parts, body) = response.into_parts();
                strip_hop_by_hop(&mut parts.headers);
                Ok(Response::from_parts(parts, Body::new(body)))
            }
            Err(e) => {
                tracing::error!(group = %self.name, error = %e, "Upstream error");
                Err(
                    HandlerError::with_status(StatusCode::BAD_GATEWAY, "Upstream request failed")
                        .caused_by(e),
                )
            }
        }
    }
}

impl HandlerGroup for UpstreamGroup {
    fn handle(&self, req: NormalizedRequest) -> BoxFuture<'_, HandlerResult> {
        Box::pin(self.forward(req))
    }
}

/// Copy everything except hop-by-hop headers and `Host`.
fn copy_end_to_end(from: &HeaderMap, to: &mut HeaderMap) {
    for (name, value) in from {
        if is_hop_by_hop(name) || name == header::HOST {
            continue;
        }
        to.append(name.clone(), value.clone());
    }
}

/// Drop hop-by-hop headers from an upstream response before it is relayed.
fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP {
        headers.remove(*name);
    }
}

fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(&name.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn route(upstream: Option<&str>) -> RouteGroupConfig {
        RouteGroupConfig {
            name: "coins".into(),
            prefix: "/api/coins".into(),
            upstream: upstream.map(ToString::to_string),
        }
    }

    #[test]
    fn missing_upstream_fails_to_load() {
        let err = UpstreamGroup::from_config(&route(None)).err().unwrap();
        assert!(matches!(err, RouteLoadError::MissingUpstream { .. }));
    }

    #[test]
    fn unsupported_scheme_fails_to_load() {
        let err = UpstreamGroup::from_config(&route(Some("https://coins.internal")))
            .err()
            .unwrap();
        assert!(matches!(err, RouteLoadError::InvalidUpstream { .. }));
        let err = UpstreamGroup::from_config(&route(Some("not a url"))).err().unwrap();
        assert!(matches!(err, RouteLoadError::InvalidUpstream { .. }));
    }

    #[test]
    fn target_uri_keeps_path_and_query() {
        let group = UpstreamGroup::new("coins", "http://127.0.0.1:4001/").unwrap();
        let uri: Uri = "/api/coins/balance?user=7".parse().unwrap();
        assert_eq!(
            group.target_uri(&uri).unwrap().to_string(),
            "http://127.0.0.1:4001/api/coins/balance?user=7"
        );

        let group = UpstreamGroup::new("coins", "http://svc/v2").unwrap();
        assert_eq!(
            group.target_uri(&uri).unwrap().to_string(),
            "http://svc/v2/api/coins/balance?user=7"
        );
    }

    #[test]
    fn hop_by_hop_headers_are_dropped() {
        let mut from = HeaderMap::new();
        from.insert(header::HOST, HeaderValue::from_static("dispatcher.example.com"));
        from.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        from.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        from.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer t"));
        from.insert("stripe-signature", HeaderValue::from_static("t=1,v1=abc"));

        let mut to = HeaderMap::new();
        copy_end_to_end(&from, &mut to);

        assert_eq!(to.len(), 2);
        assert!(to.contains_key(header::AUTHORIZATION));
        assert!(to.contains_key("stripe-signature"));
    }

    #[test]
    fn upstream_response_loses_hop_by_hop_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, HeaderValue::from_static("close"));
        headers.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        headers.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(header::SET_COOKIE, HeaderValue::from_static("sid=1"));

        strip_hop_by_hop(&mut headers);

        assert_eq!(headers.len(), 2);
        assert!(headers.contains_key(header::CONTENT_TYPE));
        assert!(headers.contains_key(header::SET_COOKIE));
    }
}
