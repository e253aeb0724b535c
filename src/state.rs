use crate::proxy::ProxyClient;
use std::sync::Arc;
use utoipa::openapi::OpenApi;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub proxy: ProxyClient,
    pub api_doc: Arc<OpenApi>,
}
