use crate::error::GatewayError;
use axum::http::{Method, Uri};

/// Fallback for paths no route matches
pub async fn not_found(method: Method, uri: Uri) -> GatewayError {
    tracing::debug!("No route for {} {}", method, uri.path());
    GatewayError::RouteNotFound
}

/// Fallback for known paths requested with an unsupported method
pub async fn method_not_allowed(method: Method, uri: Uri) -> GatewayError {
    tracing::debug!("Method {} not allowed on {}", method, uri.path());
    GatewayError::MethodNotAllowed
}
