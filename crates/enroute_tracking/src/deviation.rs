use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    distance::{Distance, Miles},
    geometry::DistanceMode,
    geopoint::GeoPoint,
    polyline,
};

/// Positions further than this from the planned path are off route.
pub const OFF_ROUTE_THRESHOLD: Distance<Miles> = Distance::new(0.3);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RouteStatus {
    NoRoute,
    OnRoute,
    OffRoute,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteCheck {
    pub status: RouteStatus,
    /// Distance to the planned path, `None` when the order has no path.
    pub distance: Option<Distance<Miles>>,
    pub route_undecodable: bool,
}

impl RouteCheck {
    pub fn no_route() -> Self {
        Self {
            status: RouteStatus::NoRoute,
            distance: None,
            route_undecodable: false,
        }
    }

    pub fn is_off_route(&self) -> bool {
        self.status == RouteStatus::OffRoute
    }

    /// The deviation to report, `None` unless off route with a finite distance.
    pub fn off_route_distance(&self) -> Option<Distance<Miles>> {
        self.distance
            .filter(|distance| self.is_off_route() && distance.is_finite())
    }
}

/// The decoded form of an order's stored polyline.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedRoute {
    points: Vec<GeoPoint>,
    undecodable: bool,
}

impl PlannedRoute {
    /// `None` when the order has no stored path. A stored path that does not
    /// decode becomes an empty route flagged as undecodable, so it is always
    /// off route rather than an error for the caller.
    pub fn from_stored(encoded: Option<&str>) -> Option<Self> {
        let encoded = encoded.map(str::trim).filter(|e| !e.is_empty())?;

        let route = match polyline::decode(encoded) {
            Ok(points) => Self {
                points,
                undecodable: false,
            },
            Err(error) => {
                warn!(%error, "Stored route polyline is undecodable, using an empty path");
                Self {
                    points: Vec::new(),
                    undecodable: true,
                }
            }
        };

        Some(route)
    }

    pub fn from_points(points: Vec<GeoPoint>) -> Self {
        Self {
            points,
            undecodable: false,
        }
    }

    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    pub fn is_undecodable(&self) -> bool {
        self.undecodable
    }

    pub fn check(&self, position: &GeoPoint, mode: DistanceMode) -> RouteCheck {
        let distance = mode.distance_to_path(&self.points, position);

        RouteCheck {
            status: classify(distance),
            distance: Some(distance),
            route_undecodable: self.undecodable,
        }
    }
}

/// On route up to and including [`OFF_ROUTE_THRESHOLD`].
pub fn classify(distance: Distance<Miles>) -> RouteStatus {
    if distance <= OFF_ROUTE_THRESHOLD {
        RouteStatus::OnRoute
    } else {
        RouteStatus::OffRoute
    }
}

pub fn check_position(
    route: Option<&PlannedRoute>,
    position: &GeoPoint,
    mode: DistanceMode,
) -> RouteCheck {
    match route {
        Some(route) => route.check(position, mode),
        None => RouteCheck::no_route(),
    }
}
