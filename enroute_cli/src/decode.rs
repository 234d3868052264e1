use clap::Args;
use comfy_table::Table;
use enroute_tracking::{
    geometry::path_length,
    geopoint::GeoPoint,
    polyline,
};
use geojson::{Feature, GeoJson, Geometry};

#[derive(Args)]
pub struct DecodeArgs {
    /// The encoded polyline
    polyline: String,

    /// Print a GeoJSON LineString feature instead of a table
    #[arg(long)]
    geojson: bool,

    /// Print an empty path instead of failing on malformed input
    #[arg(long)]
    lenient: bool,
}

pub fn run(args: DecodeArgs) -> anyhow::Result<()> {
    let points = if args.lenient {
        polyline::decode_or_empty(&args.polyline)
    } else {
        polyline::decode(&args.polyline)?
    };

    if args.geojson {
        println!("{}", to_geojson(&points));
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["#", "lat", "lng"]);
    for (index, point) in points.iter().enumerate() {
        table.add_row(vec![
            index.to_string(),
            format!("{:.5}", point.lat),
            format!("{:.5}", point.lng),
        ]);
    }

    println!("{table}");
    println!(
        "{} points, {:.3} miles",
        points.len(),
        path_length(&points).value()
    );

    Ok(())
}

fn to_geojson(points: &[GeoPoint]) -> GeoJson {
    let line: geo_types::LineString = points.iter().map(geo_types::Coord::from).collect();

    GeoJson::Feature(Feature {
        bbox: None,
        properties: None,
        foreign_members: None,
        id: None,
        geometry: Some(Geometry::from(&line)),
    })
}
