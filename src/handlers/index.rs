use crate::routes;
use crate::state::AppState;
use axum::{extract::State, Json};
use utoipa::openapi::OpenApi;

/// GET / handler - Describes the gateway
///
/// Returns the OpenAPI document covering the local endpoints and every
/// proxied route.
#[utoipa::path(
    get,
    path = routes::INDEX,
    responses(
        (status = 200, description = "OpenAPI document for this gateway")
    ),
    tag = "gateway"
)]
pub async fn index_handler(State(state): State<AppState>) -> Json<OpenApi> {
    Json(state.api_doc.as_ref().clone())
}
