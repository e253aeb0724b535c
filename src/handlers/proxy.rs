use crate::error::GatewayError;
use crate::normalize::NormalizedResponse;
use crate::routes::Route;
use crate::state::AppState;
use axum::{body::Bytes, http::HeaderMap};
use std::collections::HashMap;
use std::sync::Arc;

/// Handler shared by every proxied route
///
/// Forwards the request to the route's backend and returns the normalized
/// answer. Registered once per Route Table entry with the route bound in.
pub async fn proxy_handler(
    state: AppState,
    route: Arc<Route>,
    params: HashMap<String, String>,
    query: Option<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<NormalizedResponse, GatewayError> {
    let response = state
        .proxy
        .dispatch(&route, &params, query.as_deref(), &headers, body)
        .await?;

    tracing::info!(
        "{} {} -> {} service answered {}",
        route.method,
        route.path,
        route.service,
        response.status
    );
    Ok(response)
}
