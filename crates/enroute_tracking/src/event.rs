use jiff::Timestamp;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    bypass::BypassReport,
    deviation::{RouteCheck, RouteStatus},
    geopoint::GeoPoint,
    order::{OrderId, UserId},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RouteEventKind {
    OnRoute,
    OffRoute,
    BypassSubmitted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RouteEventMeta {
    // listed first: a bypass payload also carries lat/lng
    Bypass {
        reason: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        notes: Option<String>,
        evidence_url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        lat: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        lng: Option<f64>,
    },
    Position {
        lat: f64,
        lng: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        distance_miles: Option<f64>,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        route_undecodable: bool,
    },
}

/// One entry of the append-only route tracking log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteEvent {
    pub id: Uuid,
    pub order_id: OrderId,
    pub driver_id: UserId,
    pub event_type: RouteEventKind,
    pub meta: RouteEventMeta,
    pub created_at: Timestamp,
}

impl RouteEvent {
    /// `None` for [`RouteStatus::NoRoute`], which is never logged.
    pub fn from_check(
        order_id: &OrderId,
        driver_id: &UserId,
        position: &GeoPoint,
        check: &RouteCheck,
    ) -> Option<Self> {
        let event_type = match check.status {
            RouteStatus::NoRoute => return None,
            RouteStatus::OnRoute => RouteEventKind::OnRoute,
            RouteStatus::OffRoute => RouteEventKind::OffRoute,
        };

        Some(Self {
            id: Uuid::new_v4(),
            order_id: order_id.clone(),
            driver_id: driver_id.clone(),
            event_type,
            meta: RouteEventMeta::Position {
                lat: position.lat,
                lng: position.lng,
                distance_miles: check.off_route_distance().map(f64::from),
                route_undecodable: check.route_undecodable,
            },
            created_at: Timestamp::now(),
        })
    }

    pub fn bypass_submitted(report: &BypassReport) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_id: report.order_id.clone(),
            driver_id: report.driver_id.clone(),
            event_type: RouteEventKind::BypassSubmitted,
            meta: RouteEventMeta::Bypass {
                reason: report.reason.clone(),
                notes: report.notes.clone(),
                evidence_url: report.evidence_url.clone(),
                lat: report.lat,
                lng: report.lng,
            },
            created_at: report.created_at,
        }
    }
}
