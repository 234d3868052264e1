use clap::Args;
use comfy_table::Table;
use enroute_tracking::{
    deviation::{OFF_ROUTE_THRESHOLD, PlannedRoute, check_position},
    geometry::{DistanceMode, closest_vertex_index},
    geopoint::GeoPoint,
};
use tracing::info;

use crate::parsers;

#[derive(Args)]
pub struct CheckArgs {
    /// The encoded route polyline
    #[arg(short, long)]
    polyline: String,

    /// The driver position as "lat,lng"
    #[arg(short = 'a', long, value_parser = parsers::parse_point, allow_hyphen_values = true)]
    at: GeoPoint,

    /// How the distance to the route is measured
    #[arg(short, long, default_value = "vertex")]
    mode: DistanceMode,
}

pub fn run(args: CheckArgs) -> anyhow::Result<()> {
    let route = PlannedRoute::from_stored(Some(&args.polyline));
    let points = route.as_ref().map(PlannedRoute::points).unwrap_or_default();

    info!(
        "Checking {} against {} route points ({:?} mode)",
        args.at,
        points.len(),
        args.mode
    );

    let check = check_position(route.as_ref(), &args.at, args.mode);

    let mut table = Table::new();
    table.set_header(vec!["field", "value"]);
    table.add_row(vec!["status".to_string(), format!("{:?}", check.status)]);
    table.add_row(vec![
        "distance".to_string(),
        check
            .distance
            .filter(|distance| distance.is_finite())
            .map(|distance| distance.to_string())
            .unwrap_or_else(|| "-".to_string()),
    ]);
    table.add_row(vec![
        "threshold".to_string(),
        OFF_ROUTE_THRESHOLD.to_string(),
    ]);
    table.add_row(vec![
        "closest vertex".to_string(),
        closest_vertex_index(points, &args.at)
            .map(|index| index.to_string())
            .unwrap_or_else(|| "-".to_string()),
    ]);
    table.add_row(vec![
        "route undecodable".to_string(),
        check.route_undecodable.to_string(),
    ]);

    println!("{table}");

    Ok(())
}
