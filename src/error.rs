use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::normalize::NormalizedResponse;
use crate::registry::ServiceId;

pub const NOT_FOUND_MESSAGE: &str = "Endpoint does not exist";
pub const METHOD_NOT_ALLOWED_MESSAGE: &str =
    "Method not allowed - double check the method you are using";
pub const UNREACHABLE_MESSAGE: &str = "Failed to reach microservice";

/// Uniform error envelope for failed downstream calls
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorEnvelope {
    pub error: String,
    /// Body returned by the backend, or null when it could not be reached
    #[schema(value_type = Object)]
    pub data_returned_from_microservice: JsonValue,
}

/// Response type for local routing errors
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Response type for health check endpoint
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

/// Errors raised while handling a request locally or reaching a backend
///
/// Application errors reported by a backend are not represented here: they
/// are normal downstream responses and go through the normalizer.
#[derive(Debug)]
pub enum GatewayError {
    /// Connection, timeout or transport failure talking to the backend
    DownstreamUnreachable(reqwest::Error),
    /// A route targets a service with no base URL
    ServiceNotConfigured(ServiceId),
    /// A path parameter that would resolve out of its segment (`.` or `..`)
    InvalidPathParameter { name: String, value: String },
    /// No route matches the path
    RouteNotFound,
    /// The path matches but not with this method
    MethodNotAllowed,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        match self {
            GatewayError::DownstreamUnreachable(err) => {
                tracing::error!("Downstream call failed: {}", err);
                NormalizedResponse::envelope(
                    StatusCode::BAD_GATEWAY,
                    UNREACHABLE_MESSAGE,
                    JsonValue::Null,
                )
                .into_response()
            }
            GatewayError::ServiceNotConfigured(service) => {
                tracing::error!("No base URL configured for service '{}'", service);
                NormalizedResponse::envelope(
                    StatusCode::BAD_GATEWAY,
                    UNREACHABLE_MESSAGE,
                    JsonValue::Null,
                )
                .into_response()
            }
            GatewayError::InvalidPathParameter { name, value } => {
                tracing::debug!("Refusing path parameter {}='{}'", name, value);
                message(StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE)
            }
            GatewayError::RouteNotFound => message(StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE),
            GatewayError::MethodNotAllowed => {
                message(StatusCode::METHOD_NOT_ALLOWED, METHOD_NOT_ALLOWED_MESSAGE)
            }
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        GatewayError::DownstreamUnreachable(err)
    }
}

fn message(status: StatusCode, message: &str) -> Response {
    let body = Json(MessageResponse {
        message: message.to_string(),
    });

    (status, body).into_response()
}
