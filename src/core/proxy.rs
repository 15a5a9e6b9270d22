//! Same-origin relay in front of the configurable backend.
//!
//! Every request under the proxy prefix is re-targeted at the origin the
//! resolver returns at that moment. Upstream statuses are relayed untouched;
//! only a failed exchange turns into the generic 500 payload.

use crate::core::resolver::BaseUrlResolver;
use crate::utils::error::Result;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{
        header::{HeaderMap, HeaderValue, CONTENT_TYPE},
        Method, StatusCode,
    },
    response::{IntoResponse, Response},
    routing::any,
    Json, Router,
};
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;

/// Headers that are never copied to the upstream request. The reply is
/// relayed without `Content-Encoding`, so `accept-encoding` stays behind too.
const EXCLUDED_HEADERS: [&str; 4] = ["host", "connection", "content-length", "accept-encoding"];

pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

pub const PROXY_FAILURE_MESSAGE: &str = "proxy request failed";

#[derive(Clone)]
pub struct Forwarder {
    client: Client,
    resolver: Arc<BaseUrlResolver>,
    prefix: Arc<str>,
    max_body_bytes: usize,
}

impl Forwarder {
    pub fn new(resolver: Arc<BaseUrlResolver>, prefix: &str) -> Self {
        Self {
            client: Client::new(),
            resolver,
            prefix: Arc::from(prefix),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    /// Caps the inbound body; larger bodies end in the generic 500.
    pub fn with_body_limit(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Builds the upstream request without sending it.
    pub fn build_upstream(
        &self,
        method: &Method,
        path_and_query: &str,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Result<reqwest::Request> {
        let origin = self.resolver.resolve();
        let url = format!(
            "{}{}",
            origin.trim_end_matches('/'),
            upstream_path(path_and_query, &self.prefix)
        );

        let mut builder = self
            .client
            .request(method.clone(), url)
            .headers(forwarded_headers(headers));

        if let Some(body) = encode_body(method, body)? {
            builder = builder.body(body);
        }

        Ok(builder.build()?)
    }

    pub async fn forward(&self, req: Request) -> Response {
        let (parts, body) = req.into_parts();
        let path_and_query = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or_else(|| parts.uri.path());

        let body = match axum::body::to_bytes(body, self.max_body_bytes).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!("Failed to read request body for {}: {}", path_and_query, e);
                return proxy_failure();
            }
        };

        let upstream = match self.build_upstream(&parts.method, path_and_query, &parts.headers, &body)
        {
            Ok(upstream) => upstream,
            Err(e) => {
                tracing::error!("Could not build upstream request for {}: {}", path_and_query, e);
                return proxy_failure();
            }
        };

        let target = upstream.url().to_string();
        tracing::debug!("Proxying {} {} -> {}", parts.method, path_and_query, target);

        match self.exchange(upstream).await {
            Ok(response) => {
                tracing::debug!("Upstream {} answered {}", target, response.status());
                response
            }
            Err(e) => {
                tracing::error!("Upstream exchange with {} failed: {}", target, e);
                proxy_failure()
            }
        }
    }

    async fn exchange(&self, upstream: reqwest::Request) -> Result<Response> {
        let upstream = self.client.execute(upstream).await?;

        let status = upstream.status();
        let content_type = upstream
            .headers()
            .get(CONTENT_TYPE)
            .cloned()
            .unwrap_or_else(|| HeaderValue::from_static("application/json"));
        let bytes = upstream.bytes().await?;

        let mut response = Response::new(Body::from(bytes));
        *response.status_mut() = status;
        response.headers_mut().insert(CONTENT_TYPE, content_type);
        Ok(response)
    }
}

/// Removes the proxy prefix, keeping the rest of the path and the query string.
pub fn upstream_path<'a>(path_and_query: &'a str, prefix: &str) -> &'a str {
    match path_and_query.strip_prefix(prefix) {
        Some(rest) if rest.is_empty() || rest.starts_with('/') || rest.starts_with('?') => rest,
        _ => path_and_query,
    }
}

/// Inbound headers minus the excluded set, with `Content-Type` forced to JSON.
pub fn forwarded_headers(inbound: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(inbound.len() + 1);

    for (name, value) in inbound {
        if EXCLUDED_HEADERS
            .iter()
            .any(|excluded| name.as_str().eq_ignore_ascii_case(excluded))
        {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }

    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers
}

/// Re-encodes the body as JSON for body-bearing methods. Bodies that are not
/// JSON are sent as a JSON string.
pub fn encode_body(method: &Method, body: &[u8]) -> Result<Option<Vec<u8>>> {
    let carries_body = matches!(*method, Method::POST | Method::PUT | Method::PATCH);
    if !carries_body || body.is_empty() {
        return Ok(None);
    }

    let value = serde_json::from_slice::<Value>(body)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(body).into_owned()));

    Ok(Some(serde_json::to_vec(&value)?))
}

pub fn proxy_failure() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": PROXY_FAILURE_MESSAGE })),
    )
        .into_response()
}

pub async fn proxy_handler(State(forwarder): State<Forwarder>, req: Request) -> Response {
    forwarder.forward(req).await
}

/// Mounts the proxy at its prefix, for the bare prefix (with or without a
/// trailing slash) and everything below it.
pub fn routes(forwarder: Forwarder) -> Router {
    let prefix = forwarder.prefix().to_string();

    Router::new()
        .route(&prefix, any(proxy_handler))
        .route(&format!("{}/", prefix), any(proxy_handler))
        .route(&format!("{}/*rest", prefix), any(proxy_handler))
        .with_state(forwarder)
}
