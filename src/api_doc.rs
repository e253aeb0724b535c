use axum::http::Method;
use utoipa::openapi::{
    content::ContentBuilder,
    path::{HttpMethod, Operation, OperationBuilder, ParameterBuilder, ParameterIn},
    response::ResponseBuilder,
    OpenApi as OpenApiDoc, Ref, Required,
};
use utoipa::OpenApi;

use crate::error::{ErrorEnvelope, HealthResponse, MessageResponse};
use crate::handlers;
use crate::routes::{Route, RouteTable};

/// OpenAPI documentation for the locally served endpoints
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Car subscription API gateway",
        version = "1.0.0",
        description = "Single entry point forwarding to the subscription, damage and user microservices"
    ),
    paths(
        handlers::health::health_handler,
        handlers::index::index_handler
    ),
    components(
        schemas(
            ErrorEnvelope,
            MessageResponse,
            HealthResponse
        )
    ),
    tags(
        (name = "health", description = "Health check operations"),
        (name = "gateway", description = "Gateway self-description"),
        (name = "proxy", description = "Operations forwarded to a backend microservice")
    )
)]
pub struct ApiDoc;

/// Full document: the local endpoints plus one operation per proxied route.
pub fn build(table: &RouteTable) -> OpenApiDoc {
    let mut doc = ApiDoc::openapi();

    for route in table.routes() {
        match http_method(&route.method) {
            Some(method) => doc.paths.add_path_operation(route.path, vec![method], operation(route)),
            None => tracing::warn!("{} {} left out of API docs", route.method, route.path),
        }
    }

    doc
}

fn http_method(method: &Method) -> Option<HttpMethod> {
    Some(match method {
        &Method::GET => HttpMethod::Get,
        &Method::POST => HttpMethod::Post,
        &Method::PUT => HttpMethod::Put,
        &Method::PATCH => HttpMethod::Patch,
        &Method::DELETE => HttpMethod::Delete,
        &Method::HEAD => HttpMethod::Head,
        &Method::OPTIONS => HttpMethod::Options,
        &Method::TRACE => HttpMethod::Trace,
        _ => return None,
    })
}

fn operation(route: &Route) -> Operation {
    let envelope = ResponseBuilder::new()
        .description("Backend failure, wrapped with the backend's status code")
        .content(
            "application/json",
            ContentBuilder::new()
                .schema(Some(Ref::from_schema_name("ErrorEnvelope")))
                .build(),
        )
        .build();

    let mut builder = OperationBuilder::new()
        .summary(Some(route.summary))
        .description(Some(format!(
            "Forwarded to the {} service at `{}`.",
            route.service, route.downstream
        )))
        .tags(Some(vec!["proxy"]))
        .response(
            "200",
            ResponseBuilder::new()
                .description("Backend response, passed through unchanged")
                .build(),
        )
        .response("default", envelope)
        .response(
            "502",
            ResponseBuilder::new()
                .description("Backend could not be reached")
                .build(),
        );

    for param in route.params() {
        builder = builder.parameter(
            ParameterBuilder::new()
                .name(param)
                .parameter_in(ParameterIn::Path)
                .required(Required::True)
                .description(Some("Forwarded to the backend as received"))
                .build(),
        );
    }

    builder.build()
}
