use std::sync::Arc;

use aide::{
    axum::{
        ApiRouter, IntoApiResponse,
        routing::{get, get_with},
    },
    openapi::OpenApi,
    scalar::Scalar,
};
use axum::{Extension, Json, response::IntoResponse};

use crate::state::AppState;

const OPENAPI_JSON_PATH: &str = "/docs/api.json";

/// Scalar reference page plus the raw document it renders.
pub fn docs_routes(state: Arc<AppState>) -> ApiRouter {
    aide::generate::infer_responses(true);

    let router = ApiRouter::new()
        .api_route(
            "/",
            get_with(
                Scalar::new(OPENAPI_JSON_PATH)
                    .with_title("Enroute Tracking API")
                    .axum_handler(),
                |op| op.description("Interactive reference for the tracking endpoints."),
            ),
        )
        .route("/api.json", get(serve_openapi))
        .with_state(state);

    aide::generate::infer_responses(false);

    router
}

async fn serve_openapi(Extension(api): Extension<Arc<OpenApi>>) -> impl IntoApiResponse {
    Json(api).into_response()
}
