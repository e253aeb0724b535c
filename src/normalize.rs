use axum::{
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{Value as JsonValue, json};

use crate::proxy::DownstreamResponse;
use crate::routes::Route;

pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch from microservice";
pub const AUTH_COOKIE: &str = "Authorization";

/// Cookie re-set on the client response, always `HttpOnly` and `Secure`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingCookie {
    pub name: String,
    pub value: String,
}

impl OutgoingCookie {
    pub fn header_value(&self) -> String {
        format!("{}={}; Secure; HttpOnly; Path=/", self.name, self.value)
    }
}

/// Client-facing response for a proxied route
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedResponse {
    pub status: StatusCode,
    pub body: JsonValue,
    pub cookie: Option<OutgoingCookie>,
}

impl NormalizedResponse {
    pub fn envelope(status: StatusCode, error: &str, data: JsonValue) -> Self {
        Self {
            status,
            body: json!({
                "error": error,
                "data_returned_from_microservice": data,
            }),
            cookie: None,
        }
    }
}

impl IntoResponse for NormalizedResponse {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(self.body)).into_response();

        if let Some(cookie) = self.cookie {
            match HeaderValue::from_str(&cookie.header_value()) {
                Ok(value) => {
                    response.headers_mut().append(header::SET_COOKIE, value);
                }
                Err(e) => tracing::warn!("Dropping unrepresentable {} cookie: {}", cookie.name, e),
            }
        }

        response
    }
}

/// Shapes a downstream answer for the client.
///
/// A body that is not JSON becomes `[]`. Success statuses of the route pass
/// the body through; anything else is wrapped in the error envelope with the
/// backend's status kept.
pub fn normalize(route: &Route, response: DownstreamResponse) -> NormalizedResponse {
    let status = response.status;
    let body = match serde_json::from_slice::<JsonValue>(&response.body) {
        Ok(body) => body,
        Err(e) => {
            if !response.body.is_empty() {
                tracing::warn!(
                    "{} {} returned a non-JSON body ({}), substituting []",
                    route.method,
                    route.path,
                    e
                );
            }
            JsonValue::Array(Vec::new())
        }
    };

    if !route.is_success(status.as_u16()) {
        tracing::warn!("{} {} failed downstream with {}", route.method, route.path, status);
        return NormalizedResponse::envelope(status, FETCH_FAILED_MESSAGE, body);
    }

    let cookie = if route.relay_auth_cookie && status == StatusCode::OK {
        response
            .cookies
            .into_iter()
            .find(|(name, _)| name == AUTH_COOKIE)
            .map(|(name, value)| OutgoingCookie { name, value })
    } else {
        None
    };

    NormalizedResponse {
        status,
        body,
        cookie,
    }
}
