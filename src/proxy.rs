use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, header};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::GatewayError;
use crate::normalize::{self, NormalizedResponse};
use crate::registry::BackendRegistry;
use crate::routes::Route;

/// A single downstream call, built from the matched route and the inbound request
#[derive(Debug, Clone, PartialEq)]
pub struct ProxiedRequest {
    pub method: Method,
    pub url: String,
    /// Inbound `Cookie` header, forwarded byte for byte
    pub cookies: Option<HeaderValue>,
    pub body: Option<Bytes>,
}

/// What came back from the backend, before normalization
#[derive(Debug, Clone)]
pub struct DownstreamResponse {
    pub status: StatusCode,
    pub body: Bytes,
    pub cookies: Vec<(String, String)>,
}

/// Shareable HTTP client for the backend services
///
/// One downstream call per inbound request: no retries, and no timeout
/// beyond what the transport applies by default.
#[derive(Clone)]
pub struct ProxyClient {
    http: reqwest::Client,
    registry: Arc<BackendRegistry>,
}

impl ProxyClient {
    pub fn new(registry: BackendRegistry) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self::with_client(http, registry))
    }

    pub fn with_client(http: reqwest::Client, registry: BackendRegistry) -> Self {
        Self {
            http,
            registry: Arc::new(registry),
        }
    }

    /// Resolves the downstream URL and collects what gets forwarded.
    pub fn prepare(
        &self,
        route: &Route,
        params: &HashMap<String, String>,
        query: Option<&str>,
        headers: &HeaderMap,
        body: Bytes,
    ) -> Result<ProxiedRequest, GatewayError> {
        let base_url = self
            .registry
            .resolve(route.service)
            .ok_or(GatewayError::ServiceNotConfigured(route.service))?;

        let mut url = format!("{}{}", base_url, route.downstream_path(params)?);
        if let Some(query) = query.filter(|q| !q.is_empty()) {
            url.push('?');
            url.push_str(query);
        }

        let carries_body = route.method != Method::GET && route.method != Method::HEAD;
        let body = (carries_body && !body.is_empty()).then_some(body);

        Ok(ProxiedRequest {
            method: route.method.clone(),
            url,
            cookies: inbound_cookie_header(headers),
            body,
        })
    }

    /// Issues the downstream call. Only transport failures are errors here;
    /// every status the backend answers with is returned as-is.
    pub async fn send(&self, request: ProxiedRequest) -> Result<DownstreamResponse, GatewayError> {
        tracing::debug!("Forwarding {} {}", request.method, request.url);

        let mut builder = self.http.request(request.method, &request.url);

        if let Some(cookies) = request.cookies {
            builder = builder.header(header::COOKIE, cookies);
        }

        if let Some(body) = request.body {
            builder = builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let cookies = response
            .cookies()
            .map(|c| (c.name().to_string(), c.value().to_string()))
            .collect();
        let body = response.bytes().await?;

        tracing::debug!("{} answered {} ({} bytes)", request.url, status, body.len());

        Ok(DownstreamResponse {
            status,
            body,
            cookies,
        })
    }

    /// Proxies one inbound request for `route` and normalizes the answer.
    pub async fn dispatch(
        &self,
        route: &Route,
        params: &HashMap<String, String>,
        query: Option<&str>,
        headers: &HeaderMap,
        body: Bytes,
    ) -> Result<NormalizedResponse, GatewayError> {
        let request = self.prepare(route, params, query, headers, body)?;
        let response = self.send(request).await?;

        Ok(normalize::normalize(route, response))
    }
}

/// The inbound `Cookie` header, untouched.
///
/// Several `Cookie` headers are joined into one with `; `, as HTTP/2 clients
/// may split them.
pub fn inbound_cookie_header(headers: &HeaderMap) -> Option<HeaderValue> {
    let mut values = headers.get_all(header::COOKIE).iter();
    let first = values.next()?;

    let mut joined = first.as_bytes().to_vec();
    for value in values {
        joined.extend_from_slice(b"; ");
        joined.extend_from_slice(value.as_bytes());
    }

    HeaderValue::from_bytes(&joined).ok()
}
