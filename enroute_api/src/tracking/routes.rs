use std::sync::Arc;

use aide::axum::{ApiRouter, routing::post_with};
use axum::extract::DefaultBodyLimit;

use crate::{
    state::AppState,
    tracking::{bypass::bypass_handler, update_position::update_position_handler},
};

pub fn tracking_routes(state: Arc<AppState>) -> ApiRouter {
    aide::generate::infer_responses(true);

    let body_limit = DefaultBodyLimit::max(state.config.max_evidence_bytes);

    let router = ApiRouter::new()
        .api_route(
            "/position",
            post_with(update_position_handler, |op| {
                op.description(
                    "Classifies the driver's live position against the order's planned route \
                     and records a route event.",
                )
                .security_requirement("BearerAuth")
            }),
        )
        .api_route(
            "/bypass",
            post_with(bypass_handler, |op| {
                op.description(
                    "Files a manual bypass report. Multipart form with `orderId`, `reason`, \
                     optional `notes`, optional `lat`/`lng` and the evidence `file`.",
                )
                .security_requirement("BearerAuth")
            }),
        )
        .layer(body_limit)
        .with_state(state);

    aide::generate::infer_responses(false);

    router
}
