//! HTTP surface of the driver route tracker.
//!
//! `POST /tracking/position` classifies a live driver position against the
//! order's planned route, `POST /tracking/bypass` files a manual override
//! with photographic evidence.

pub mod auth;
pub mod config;
pub mod docs;
pub mod error;
pub mod health;
pub mod state;
pub mod tracking;

use std::sync::Arc;

use aide::{
    axum::{ApiRouter, routing::get},
    openapi::{OpenApi, SecurityScheme},
    transform::TransformOpenApi,
};
use axum::{Extension, Router, http::Method};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

use crate::{
    docs::docs_routes, health::health_handler, state::AppState,
    tracking::routes::tracking_routes,
};

/// Builds the application router together with its OpenAPI document.
pub fn build_app(state: Arc<AppState>) -> (Router, Arc<OpenApi>) {
    aide::generate::on_error(|error| tracing::error!("{}", error));
    aide::generate::extract_schemas(true);

    let cors_layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_origin(Any)
        .allow_headers(Any);

    let mut api = OpenApi::default();

    let app = ApiRouter::new()
        .nest_api_service("/docs", docs_routes(state.clone()))
        .nest_api_service("/tracking", tracking_routes(state.clone()))
        .api_route("/health", get(health_handler))
        .finish_api_with(&mut api, api_docs);

    let api = Arc::new(api);

    let app = app
        .layer(ServiceBuilder::new().layer(cors_layer))
        .layer(Extension(api.clone()))
        .with_state(state);

    (app, api)
}

fn api_docs(api: TransformOpenApi) -> TransformOpenApi {
    api.title("Enroute Tracking API").security_scheme(
        "BearerAuth",
        SecurityScheme::Http {
            scheme: "bearer".to_string(),
            bearer_format: None,
            description: Some("Session token of the signed-in driver".to_string()),
            extensions: Default::default(),
        },
    )
}
