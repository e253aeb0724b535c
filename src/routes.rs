// Route table and path constants - single source of truth for all API paths

use anyhow::{Result, anyhow, bail};
use axum::{
    body::Bytes,
    extract::{Path, RawQuery, State},
    http::{HeaderMap, Method},
    routing::{MethodFilter, MethodRouter, get, on},
    Router,
};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use utoipa_swagger_ui::SwaggerUi;

use crate::error::GatewayError;
use crate::handlers;
use crate::registry::ServiceId;
use crate::state::AppState;

pub const INDEX: &str = "/";
pub const HEALTH: &str = "/health";
pub const SWAGGER_UI: &str = "/apidocs";
pub const OPENAPI_JSON: &str = "/apispec.json";

pub const SUBSCRIPTIONS: &str = "/subscriptions";
pub const SUBSCRIPTIONS_TOTAL_PRICE: &str = "/subscriptions/current/total-price";
pub const DAMAGE_REPORTS: &str = "/damage-reports";
pub const DAMAGE_TYPES: &str = "/damage-types";
pub const CAR_TOTAL_COST: &str = "/cars/{id}/total-cost";
pub const SUBSCRIPTION_TOTAL_COST: &str = "/subscriptions/{subscriptionId}/total-cost";
pub const LOGIN: &str = "/login";

/// Downstream statuses passed through to the client unchanged
pub const DEFAULT_SUCCESS_STATUSES: &[u16] = &[200, 201, 204];

/// A proxied endpoint: inbound method and path pattern, and where it goes
#[derive(Debug, Clone)]
pub struct Route {
    pub method: Method,
    pub path: &'static str,
    pub service: ServiceId,
    /// Downstream path, using the same `{name}` placeholders as `path`
    pub downstream: &'static str,
    pub success_statuses: &'static [u16],
    /// Relay the `Authorization` cookie set by the backend on success
    pub relay_auth_cookie: bool,
    pub summary: &'static str,
}

impl Route {
    pub fn new(
        method: Method,
        path: &'static str,
        service: ServiceId,
        downstream: &'static str,
        summary: &'static str,
    ) -> Self {
        Self {
            method,
            path,
            service,
            downstream,
            success_statuses: DEFAULT_SUCCESS_STATUSES,
            relay_auth_cookie: false,
            summary,
        }
    }

    pub fn relaying_auth_cookie(mut self) -> Self {
        self.relay_auth_cookie = true;
        self
    }

    pub fn params(&self) -> Vec<&'static str> {
        placeholders(self.path).collect()
    }

    pub fn is_success(&self, status: u16) -> bool {
        self.success_statuses.contains(&status)
    }

    /// Substitutes bound path parameters into the downstream template.
    ///
    /// Each value is percent-encoded back into a single path segment, so a
    /// decoded `/` or `?` stays inside its segment. `.` and `..` are refused:
    /// URL parsing would resolve them and leave the template. A placeholder
    /// with no binding is kept literally.
    pub fn downstream_path(&self, params: &HashMap<String, String>) -> Result<String, GatewayError> {
        let mut segments = Vec::new();
        for segment in self.downstream.split('/') {
            let bound = placeholder(segment).and_then(|name| Some((name, params.get(name)?)));
            let value = match bound {
                Some((name, value)) => {
                    if value == "." || value == ".." {
                        return Err(GatewayError::InvalidPathParameter {
                            name: name.to_string(),
                            value: value.clone(),
                        });
                    }
                    urlencoding::encode(value)
                }
                None => Cow::Borrowed(segment),
            };
            segments.push(value);
        }
        Ok(segments.join("/"))
    }
}

fn placeholder(segment: &str) -> Option<&str> {
    segment.strip_prefix('{')?.strip_suffix('}')
}

fn placeholders(pattern: &'static str) -> impl Iterator<Item = &'static str> {
    pattern.split('/').filter_map(placeholder)
}

/// Static table of proxied routes, validated once at startup
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new(routes: Vec<Route>) -> Result<Self> {
        let table = Self { routes };
        table.validate()?;
        Ok(table)
    }

    /// The gateway's route table.
    pub fn canonical() -> Result<Self> {
        use ServiceId::{Damage, Subscription, User};

        Self::new(vec![
            Route::new(Method::GET, SUBSCRIPTIONS, Subscription, "/subscriptions", "List subscriptions"),
            Route::new(
                Method::GET,
                SUBSCRIPTIONS_TOTAL_PRICE,
                Subscription,
                "/subscriptions/current/total-price",
                "Total monthly price of current subscriptions",
            ),
            Route::new(Method::GET, DAMAGE_REPORTS, Damage, "/damage-reports", "List damage reports"),
            Route::new(Method::GET, DAMAGE_TYPES, Damage, "/damage-types", "List damage types"),
            Route::new(
                Method::GET,
                CAR_TOTAL_COST,
                Damage,
                "/cars/{id}/total-cost",
                "Total damage cost for a car",
            ),
            Route::new(
                Method::GET,
                SUBSCRIPTION_TOTAL_COST,
                Damage,
                "/damage-reports/subscriptions/{subscriptionId}/total-cost",
                "Total damage cost for a subscription",
            ),
            Route::new(Method::POST, LOGIN, User, "/login", "Log in and receive an auth cookie")
                .relaying_auth_cookie(),
        ])
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Checks that (method, path) pairs are unique and that every path
    /// parameter is used by the downstream template.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for route in &self.routes {
            if !seen.insert((route.method.clone(), route.path)) {
                bail!("duplicate route {} {}", route.method, route.path);
            }
            if route.path == INDEX || route.path == HEALTH {
                bail!("{} is served by the gateway itself", route.path);
            }
            let downstream: HashSet<&str> = placeholders(route.downstream).collect();
            for param in route.params() {
                if !downstream.contains(param) {
                    bail!(
                        "path parameter '{}' of {} {} is missing from downstream template '{}'",
                        param,
                        route.method,
                        route.path,
                        route.downstream
                    );
                }
            }
        }
        Ok(())
    }
}

/// Builds the gateway router: local endpoints, one proxy handler per route,
/// API docs, and the 404/405 fallbacks.
pub fn app(table: &RouteTable, state: AppState) -> Result<Router> {
    table.validate()?;

    let mut by_path: BTreeMap<&'static str, MethodRouter<AppState>> = BTreeMap::new();

    for route in table.routes() {
        let filter = MethodFilter::try_from(route.method.clone())
            .map_err(|e| anyhow!("cannot route {} {}: {}", route.method, route.path, e))?;

        let route = Arc::new(route.clone());
        let path = route.path;
        let handler = move |State(state): State<AppState>,
                            Path(params): Path<HashMap<String, String>>,
                            RawQuery(query): RawQuery,
                            headers: HeaderMap,
                            body: Bytes| {
            let route = Arc::clone(&route);
            async move { handlers::proxy_handler(state, route, params, query, headers, body).await }
        };

        let method_router = match by_path.remove(path) {
            Some(existing) => existing.on(filter, handler),
            None => on(filter, handler),
        };
        by_path.insert(path, method_router);
    }

    let mut router = Router::new()
        .route(INDEX, get(handlers::index_handler))
        .route(HEALTH, get(handlers::health_handler));

    for (path, method_router) in by_path {
        router = router.route(path, method_router);
    }

    let swagger = SwaggerUi::new(SWAGGER_UI).url(OPENAPI_JSON, state.api_doc.as_ref().clone());

    // Applies to every method router registered so far, the docs routes included.
    Ok(router
        .merge(swagger)
        .method_not_allowed_fallback(handlers::method_not_allowed)
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}
