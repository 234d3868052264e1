use clap::Args;
use enroute_tracking::{geopoint::GeoPoint, polyline};

use crate::parsers;

#[derive(Args)]
pub struct EncodeArgs {
    /// Points as "lat,lng", in route order
    #[arg(required = true, value_parser = parsers::parse_point, allow_hyphen_values = true)]
    points: Vec<GeoPoint>,
}

pub fn run(args: EncodeArgs) {
    println!("{}", polyline::encode(&args.points));
}
