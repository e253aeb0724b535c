// Helpers for driving the gateway against in-process mock backends

use axum::{response::Response, Router};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::api_doc;
use crate::proxy::ProxyClient;
use crate::registry::{BackendRegistry, ServiceId};
use crate::routes::{self, RouteTable};
use crate::state::AppState;

/// Serves `app` on an ephemeral local port and returns its base URL.
pub async fn spawn_backend(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

/// Points every backend service at the same base URL.
pub fn registry_for(base_url: &str) -> BackendRegistry {
    BackendRegistry::default()
        .with(ServiceId::Subscription, base_url)
        .with(ServiceId::Damage, base_url)
        .with(ServiceId::User, base_url)
}

/// The full gateway router over the canonical route table.
pub fn gateway(registry: BackendRegistry) -> Router {
    let table = RouteTable::canonical().unwrap();
    let state = AppState {
        proxy: ProxyClient::with_client(reqwest::Client::builder().no_proxy().build().unwrap(), registry),
        api_doc: Arc::new(api_doc::build(&table)),
    };

    routes::app(&table, state).unwrap()
}

pub async fn body_json(response: Response) -> JsonValue {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}
