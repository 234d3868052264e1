use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    distance::{Distance, Miles},
    geopoint::GeoPoint,
};

/// How the distance between a live position and a planned path is measured.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMode {
    /// Distance to the nearest path vertex. Overestimates the deviation when
    /// vertices are sparse compared to the off-route threshold.
    #[default]
    Vertex,
    /// Distance to the nearest point on any path edge.
    Segment,
}

impl DistanceMode {
    pub fn distance_to_path(&self, path: &[GeoPoint], point: &GeoPoint) -> Distance<Miles> {
        match self {
            DistanceMode::Vertex => nearest_vertex_distance(path, point),
            DistanceMode::Segment => nearest_segment_distance(path, point),
        }
    }
}

impl FromStr for DistanceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vertex" => Ok(DistanceMode::Vertex),
            "segment" => Ok(DistanceMode::Segment),
            other => Err(format!(
                "unknown distance mode {other:?}, expected \"vertex\" or \"segment\""
            )),
        }
    }
}

/// Infinite for an empty path.
pub fn nearest_vertex_distance(path: &[GeoPoint], point: &GeoPoint) -> Distance<Miles> {
    path.iter()
        .map(|vertex| point.haversine_distance(vertex))
        .fold(Distance::INFINITY, Distance::min)
}

pub fn closest_vertex_index(path: &[GeoPoint], point: &GeoPoint) -> Option<usize> {
    path.iter()
        .enumerate()
        .min_by(|(_, p), (_, p2)| {
            point
                .haversine_distance(p)
                .value()
                .total_cmp(&point.haversine_distance(p2).value())
        })
        .map(|v| v.0)
}

/// Never larger than [`nearest_vertex_distance`] for the same input.
pub fn nearest_segment_distance(path: &[GeoPoint], point: &GeoPoint) -> Distance<Miles> {
    match path {
        [] => Distance::INFINITY,
        [vertex] => point.haversine_distance(vertex),
        _ => path
            .windows(2)
            .map(|edge| {
                let projected = project_onto_segment(point, &edge[0], &edge[1]);
                point
                    .haversine_distance(&projected)
                    .min(point.haversine_distance(&edge[0]))
                    .min(point.haversine_distance(&edge[1]))
            })
            .fold(Distance::INFINITY, Distance::min),
    }
}

pub fn path_length(path: &[GeoPoint]) -> Distance<Miles> {
    path.windows(2)
        .map(|edge| edge[0].haversine_distance(&edge[1]))
        .fold(Distance::ZERO, |total, distance| total + distance)
}

// Projection happens in an equirectangular frame centered on `point`, which is
// accurate for edges that are short compared to the Earth radius.
fn project_onto_segment(point: &GeoPoint, start: &GeoPoint, end: &GeoPoint) -> GeoPoint {
    let cos_lat = point.lat.to_radians().cos();

    let start_lng = wrap_longitude(start.lng - point.lng);
    let end_lng = wrap_longitude(end.lng - point.lng);
    let start_lat = start.lat - point.lat;
    let end_lat = end.lat - point.lat;

    let (ax, ay) = (start_lng * cos_lat, start_lat);
    let (dx, dy) = ((end_lng - start_lng) * cos_lat, end_lat - start_lat);

    let length_squared = dx * dx + dy * dy;
    if length_squared == 0.0 {
        return *start;
    }

    let t = (-(ax * dx + ay * dy) / length_squared).clamp(0.0, 1.0);

    GeoPoint::new(
        point.lat + start_lat + t * (end_lat - start_lat),
        point.lng + start_lng + t * (end_lng - start_lng),
    )
}

fn wrap_longitude(delta: f64) -> f64 {
    if delta > 180.0 {
        delta - 360.0
    } else if delta < -180.0 {
        delta + 360.0
    } else {
        delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn equator_path() -> Vec<GeoPoint> {
        vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 0.01),
            GeoPoint::new(0.0, 0.02),
        ]
    }

    #[test]
    fn test_vertex_distance_on_vertex_is_zero() {
        let path = equator_path();
        let distance = nearest_vertex_distance(&path, &GeoPoint::new(0.0, 0.01));
        assert!(distance.value().abs() < 1e-12);
    }

    #[test]
    fn test_vertex_distance_empty_path_is_infinite() {
        let distance = nearest_vertex_distance(&[], &GeoPoint::new(0.0, 0.0));
        assert_eq!(distance.value(), f64::INFINITY);
        assert_eq!(
            nearest_segment_distance(&[], &GeoPoint::new(0.0, 0.0)).value(),
            f64::INFINITY
        );
    }

    #[test]
    fn test_vertex_distance_picks_nearest() {
        let path = equator_path();
        let distance = nearest_vertex_distance(&path, &GeoPoint::new(0.0, 0.1)).value();
        let expected = GeoPoint::new(0.0, 0.02)
            .haversine_distance(&GeoPoint::new(0.0, 0.1))
            .value();

        assert_eq!(distance, expected);
        assert!(distance > 5.0);
    }

    #[test]
    fn test_closest_vertex_index() {
        let path = equator_path();
        assert_eq!(
            closest_vertex_index(&path, &GeoPoint::new(0.001, 0.011)),
            Some(1)
        );
        assert_eq!(closest_vertex_index(&[], &GeoPoint::new(0.0, 0.0)), None);
    }

    #[test]
    fn test_segment_distance_between_sparse_vertices() {
        // two vertices ~6.9 miles apart, position halfway and slightly north
        let path = vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 0.1)];
        let position = GeoPoint::new(0.001, 0.05);

        let vertex = nearest_vertex_distance(&path, &position).value();
        let segment = nearest_segment_distance(&path, &position).value();
        let expected = position
            .haversine_distance(&GeoPoint::new(0.0, 0.05))
            .value();

        assert!(vertex > 3.0);
        assert!((segment - expected).abs() < 1e-6);
    }

    #[test]
    fn test_segment_distance_clamps_to_endpoints() {
        let path = vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 0.01)];
        let beyond = GeoPoint::new(0.0, 0.05);

        let segment = nearest_segment_distance(&path, &beyond).value();
        let vertex = nearest_vertex_distance(&path, &beyond).value();

        assert!((segment - vertex).abs() < 1e-9);
    }

    #[test]
    fn test_segment_never_exceeds_vertex() {
        let path = vec![
            GeoPoint::new(40.7128, -74.0060),
            GeoPoint::new(40.7306, -73.9866),
            GeoPoint::new(40.7484, -73.9857),
            GeoPoint::new(40.7580, -73.9855),
        ];
        let positions = [
            GeoPoint::new(40.7200, -73.9990),
            GeoPoint::new(40.7400, -73.9700),
            GeoPoint::new(40.8000, -74.1000),
            GeoPoint::new(40.7580, -73.9855),
        ];

        for position in positions {
            let vertex = nearest_vertex_distance(&path, &position);
            let segment = nearest_segment_distance(&path, &position);
            assert!(segment <= vertex, "{segment} > {vertex} at {position}");
        }
    }

    #[test]
    fn test_segment_across_antimeridian() {
        let path = vec![GeoPoint::new(0.0, 179.99), GeoPoint::new(0.0, -179.99)];
        let position = GeoPoint::new(0.0, 180.0);

        assert!(nearest_segment_distance(&path, &position).value() < 1e-6);
    }

    #[test]
    fn test_path_length() {
        let length = path_length(&equator_path()).value();
        let expected = GeoPoint::new(0.0, 0.0)
            .haversine_distance(&GeoPoint::new(0.0, 0.02))
            .value();

        assert!((length - expected).abs() < 1e-9);
        assert_eq!(path_length(&[]).value(), 0.0);
    }

    #[test]
    fn test_distance_mode_from_str() {
        assert_eq!("vertex".parse(), Ok(DistanceMode::Vertex));
        assert_eq!(" Segment ".parse(), Ok(DistanceMode::Segment));
        assert!("edge".parse::<DistanceMode>().is_err());
    }
}
