use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use enroute_tracking::{
    deviation::{RouteCheck, RouteStatus},
    geopoint::GeoPoint,
    order::OrderId,
    tracker::PositionUpdate,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{auth::Caller, error::ApiError, state::AppState};

#[derive(Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePositionBody {
    pub order_id: String,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, PartialEq, Serialize, JsonSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UpdatePositionResponse {
    NoRoute,
    OnRoute,
    OffRoute {
        /// Miles to the planned route, null when the stored route cannot be
        /// decoded.
        #[serde(rename = "offRouteDistance")]
        off_route_distance: Option<f64>,
    },
}

impl From<RouteCheck> for UpdatePositionResponse {
    fn from(check: RouteCheck) -> Self {
        match check.status {
            RouteStatus::NoRoute => UpdatePositionResponse::NoRoute,
            RouteStatus::OnRoute => UpdatePositionResponse::OnRoute,
            RouteStatus::OffRoute => UpdatePositionResponse::OffRoute {
                off_route_distance: check.off_route_distance().map(f64::from),
            },
        }
    }
}

pub async fn update_position_handler(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    body: Result<Json<UpdatePositionBody>, JsonRejection>,
) -> Result<Json<UpdatePositionResponse>, ApiError> {
    let Json(body) = body.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    let order_id = body.order_id.trim();
    if order_id.is_empty() {
        return Err(ApiError::BadRequest(String::from("orderId is required")));
    }

    let check = state
        .tracker
        .update_position(
            &caller.user_id,
            PositionUpdate {
                order_id: OrderId::from(order_id),
                position: GeoPoint::new(body.lat, body.lng),
            },
        )
        .await?;

    Ok(Json(check.into()))
}
