use enroute_tracking::geopoint::GeoPoint;

/// Parses `"lat,lng"`, the format printed by `GeoPoint`'s `Display`.
pub fn parse_point(input: &str) -> Result<GeoPoint, String> {
    let (lat, lng) = input
        .split_once(',')
        .ok_or_else(|| format!("expected \"lat,lng\", got {input:?}"))?;

    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|_| format!("invalid latitude {:?}", lat.trim()))?;
    let lng: f64 = lng
        .trim()
        .parse()
        .map_err(|_| format!("invalid longitude {:?}", lng.trim()))?;

    let point = GeoPoint::new(lat, lng);
    if !point.is_valid() {
        return Err(format!("{point} is outside the valid coordinate range"));
    }

    Ok(point)
}
