use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;

use crate::{check::CheckArgs, decode::DecodeArgs, encode::EncodeArgs};

mod check;
mod decode;
mod encode;
mod parsers;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the points of an encoded polyline
    #[command(visible_alias = "d")]
    Decode {
        #[command(flatten)]
        args: DecodeArgs,
    },
    /// Encode "lat,lng" points into a polyline
    #[command(visible_alias = "e")]
    Encode {
        #[command(flatten)]
        args: EncodeArgs,
    },
    /// Classify a position against a planned route, offline
    #[command(visible_alias = "c")]
    Check {
        #[command(flatten)]
        args: CheckArgs,
    },
}

fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(if cli.debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    match cli.command {
        Commands::Decode { args } => decode::run(args)?,
        Commands::Encode { args } => encode::run(args),
        Commands::Check { args } => check::run(args)?,
    }

    Ok(())
}
