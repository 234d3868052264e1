//! Encoded polyline format.
//!
//! Each coordinate is scaled by 1e5, stored as the difference from the
//! previous point, zig-zag encoded, and split into 5-bit chunks (least
//! significant first). Every chunk but the last carries the `0x20`
//! continuation bit, and each chunk is written as the character `chunk + 63`.

use thiserror::Error;
use tracing::warn;

use crate::geopoint::GeoPoint;

const PRECISION: f64 = 1e5;
const CHAR_OFFSET: u8 = 63;
const MAX_CHAR: u8 = 126;
const CONTINUATION_BIT: u64 = 0x20;
const CHUNK_MASK: u64 = 0x1f;
const CHUNK_BITS: u32 = 5;

#[derive(Debug, Error, PartialEq)]
pub enum PolylineError {
    #[error("unexpected end of input at byte {0}")]
    UnexpectedEnd(usize),

    #[error("invalid character {character:?} at byte {position}")]
    InvalidCharacter { character: char, position: usize },

    #[error("latitude ending at byte {0} has no matching longitude")]
    MissingLongitude(usize),

    #[error("value starting at byte {0} does not fit in 64 bits")]
    Overflow(usize),

    #[error("decoded point ({lat}, {lng}) is outside the valid coordinate range")]
    OutOfRange { lat: f64, lng: f64 },
}

pub fn decode(encoded: &str) -> Result<Vec<GeoPoint>, PolylineError> {
    let mut points = Vec::with_capacity(encoded.len() / 4);
    let mut index = 0;
    let mut lat: i64 = 0;
    let mut lng: i64 = 0;

    while index < encoded.len() {
        lat = lat.wrapping_add(decode_value(encoded, &mut index)?);
        if index == encoded.len() {
            return Err(PolylineError::MissingLongitude(index));
        }
        lng = lng.wrapping_add(decode_value(encoded, &mut index)?);

        let point = GeoPoint::new(lat as f64 / PRECISION, lng as f64 / PRECISION);
        if !point.is_valid() {
            return Err(PolylineError::OutOfRange {
                lat: point.lat,
                lng: point.lng,
            });
        }

        points.push(point);
    }

    Ok(points)
}

/// Like [`decode`], but a malformed input yields an empty path.
pub fn decode_or_empty(encoded: &str) -> Vec<GeoPoint> {
    decode(encoded).unwrap_or_else(|error| {
        warn!(%error, "Failed to decode polyline");
        Vec::new()
    })
}

fn decode_value(encoded: &str, index: &mut usize) -> Result<i64, PolylineError> {
    let bytes = encoded.as_bytes();
    let start = *index;
    let mut result: u64 = 0;
    let mut shift: u32 = 0;

    loop {
        let Some(&byte) = bytes.get(*index) else {
            return Err(PolylineError::UnexpectedEnd(*index));
        };

        if !(CHAR_OFFSET..=MAX_CHAR).contains(&byte) {
            // every byte before this one was ASCII, so this is a char boundary
            let character = encoded[*index..]
                .chars()
                .next()
                .unwrap_or(char::REPLACEMENT_CHARACTER);
            return Err(PolylineError::InvalidCharacter {
                character,
                position: *index,
            });
        }

        if shift > u64::BITS - CHUNK_BITS {
            return Err(PolylineError::Overflow(start));
        }

        let chunk = u64::from(byte - CHAR_OFFSET);
        *index += 1;

        result |= (chunk & CHUNK_MASK) << shift;
        shift += CHUNK_BITS;

        if chunk < CONTINUATION_BIT {
            break;
        }
    }

    let value = if result & 1 == 1 {
        !(result >> 1) as i64
    } else {
        (result >> 1) as i64
    };

    Ok(value)
}

pub fn encode(points: &[GeoPoint]) -> String {
    let mut encoded = String::with_capacity(points.len() * 8);
    let mut previous_lat: i64 = 0;
    let mut previous_lng: i64 = 0;

    for point in points {
        let lat = (point.lat * PRECISION).round() as i64;
        let lng = (point.lng * PRECISION).round() as i64;

        encode_value(lat - previous_lat, &mut encoded);
        encode_value(lng - previous_lng, &mut encoded);

        previous_lat = lat;
        previous_lng = lng;
    }

    encoded
}

fn encode_value(value: i64, encoded: &mut String) {
    let mut value = ((value << 1) ^ (value >> 63)) as u64;

    while value >= CONTINUATION_BIT {
        let chunk = (CONTINUATION_BIT | (value & CHUNK_MASK)) as u8;
        encoded.push(char::from(chunk + CHAR_OFFSET));
        value >>= CHUNK_BITS;
    }

    encoded.push(char::from(value as u8 + CHAR_OFFSET));
}

#[cfg(test)]
mod tests {
    use super::*;

    const REFERENCE: &str = "_p~iF~ps|U_ulLnnqC_mqNvxq`@";

    fn reference_points() -> Vec<GeoPoint> {
        vec![
            GeoPoint::new(38.5, -120.2),
            GeoPoint::new(40.7, -120.95),
            GeoPoint::new(43.252, -126.453),
        ]
    }

    fn assert_close(actual: &[GeoPoint], expected: &[GeoPoint]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a.lat - e.lat).abs() < 1e-6, "{a} != {e}");
            assert!((a.lng - e.lng).abs() < 1e-6, "{a} != {e}");
        }
    }

    #[test]
    fn test_decode_reference() {
        let points = decode(REFERENCE).unwrap();
        assert_close(&points, &reference_points());
    }

    #[test]
    fn test_encode_reference() {
        assert_eq!(encode(&reference_points()), REFERENCE);
    }

    #[test]
    fn test_round_trip_keeps_five_decimals() {
        let points = vec![
            GeoPoint::new(40.71280, -74.00600),
            GeoPoint::new(40.71312, -74.00577),
            GeoPoint::new(40.71401, -74.00498),
            GeoPoint::new(-33.86882, 151.20930),
            GeoPoint::new(0.0, 0.0),
        ];

        let decoded = decode(&encode(&points)).unwrap();
        assert_close(&decoded, &points);
    }

    #[test]
    fn test_round_trip_rounds_extra_precision() {
        let decoded = decode(&encode(&[GeoPoint::new(12.3456789, -98.7654321)])).unwrap();
        assert_close(&decoded, &[GeoPoint::new(12.34568, -98.76543)]);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(decode("").unwrap(), vec![]);
        assert_eq!(encode(&[]), "");
    }

    #[test]
    fn test_truncated_run() {
        // "_p~iF" is a complete latitude, "~ps" is an unfinished longitude
        assert_eq!(decode("_p~iF~ps"), Err(PolylineError::UnexpectedEnd(8)));
    }

    #[test]
    fn test_latitude_without_longitude() {
        assert_eq!(decode("_p~iF"), Err(PolylineError::MissingLongitude(5)));
    }

    #[test]
    fn test_decode_or_empty() {
        assert_close(&decode_or_empty(REFERENCE), &reference_points());
        assert!(decode_or_empty("_p~iF~ps").is_empty());
        assert!(decode_or_empty("not a polyline").is_empty());
    }

    #[test]
    fn test_invalid_character() {
        assert_eq!(
            decode("_p~iF ps|U"),
            Err(PolylineError::InvalidCharacter {
                character: ' ',
                position: 5
            })
        );
        assert_eq!(
            decode("_p~iFé"),
            Err(PolylineError::InvalidCharacter {
                character: 'é',
                position: 5
            })
        );
    }

    #[test]
    fn test_overlong_run() {
        let encoded = "~".repeat(20);
        assert_eq!(decode(&encoded), Err(PolylineError::Overflow(0)));
    }

    #[test]
    fn test_out_of_range() {
        let encoded = encode(&[GeoPoint::new(89.0, 0.0)]);
        // a second delta of +89 degrees pushes latitude past the pole
        let overflowing = format!("{encoded}{encoded}");
        assert!(matches!(
            decode(&overflowing),
            Err(PolylineError::OutOfRange { .. })
        ));
    }
}
