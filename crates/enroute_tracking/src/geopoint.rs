use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::distance::{Distance, Miles, miles};

/// Earth radius used for every great-circle computation in the crate.
pub const EARTH_RADIUS_MILES: f64 = 3958.8;

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Finite and inside [-90, 90] x [-180, 180].
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    pub fn haversine_distance(&self, other: &GeoPoint) -> Distance<Miles> {
        miles!(haversine_distance(self.lat, self.lng, other.lat, other.lng))
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

impl From<GeoPoint> for geo_types::Point {
    fn from(point: GeoPoint) -> Self {
        geo_types::Point::new(point.lng, point.lat)
    }
}

impl From<&GeoPoint> for geo_types::Point {
    fn from(point: &GeoPoint) -> Self {
        geo_types::Point::new(point.lng, point.lat)
    }
}

impl From<&GeoPoint> for geo_types::Coord {
    fn from(point: &GeoPoint) -> Self {
        geo_types::Coord {
            x: point.lng,
            y: point.lat,
        }
    }
}

impl From<geo_types::Point> for GeoPoint {
    fn from(point: geo_types::Point) -> Self {
        GeoPoint::new(point.y(), point.x())
    }
}

/// Great-circle distance in miles.
pub fn haversine_distance(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lng1_rad = lng1.to_radians();
    let lat2_rad = lat2.to_radians();
    let lng2_rad = lng2.to_radians();

    let delta_lat = lat2_rad - lat1_rad;
    let delta_lng = lng2_rad - lng1_rad;

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_MILES * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_is_symmetric() {
        let new_york = GeoPoint::new(40.7128, -74.0060);
        let brussels = GeoPoint::new(50.8503, 4.3517);

        let there = new_york.haversine_distance(&brussels).value();
        let back = brussels.haversine_distance(&new_york).value();

        assert!((there - back).abs() < 1e-9);
    }

    #[test]
    fn test_haversine_same_point_is_zero() {
        let point = GeoPoint::new(40.7128, -74.0060);
        assert_eq!(point.haversine_distance(&point).value(), 0.0);
    }

    #[test]
    fn test_haversine_along_equator() {
        // 0.01 degree of arc on a 3958.8 mile sphere
        let distance = GeoPoint::new(0.0, 0.0)
            .haversine_distance(&GeoPoint::new(0.0, 0.01))
            .value();
        let expected = EARTH_RADIUS_MILES * 0.01_f64.to_radians();

        assert!((distance - expected).abs() < 1e-9);
        assert!((distance - 0.6909).abs() < 1e-3);
    }

    #[test]
    fn test_validity() {
        assert!(GeoPoint::new(90.0, -180.0).is_valid());
        assert!(!GeoPoint::new(90.5, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, 181.0).is_valid());
        assert!(!GeoPoint::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn test_geo_types_axis_order() {
        let point: geo_types::Point = GeoPoint::new(1.5, 2.5).into();
        assert_eq!(point.x(), 2.5);
        assert_eq!(point.y(), 1.5);
        assert_eq!(GeoPoint::from(point), GeoPoint::new(1.5, 2.5));
    }
}
