use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use foundation::math::Vec2;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tools::{RenderOptions, Source, inspect, load, render_snapshot, render_trend, resolve_variant};

#[derive(Parser, Debug)]
#[command(name = "bcgmap", version, about = "Render and inspect BCG taxa tolerance maps")]
struct Args {
    /// Directory the manifest's asset paths are relative to
    #[arg(long, global = true, env = "BCGMAP_DATA", default_value = ".")]
    data: PathBuf,

    /// Manifest JSON (defaults to the standard asset list)
    #[arg(long, global = true)]
    manifest: Option<PathBuf>,

    /// Variant preset name or path to a variant JSON file
    #[arg(long, global = true)]
    variant: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a settled SVG snapshot of the map
    Render {
        /// Year bucket, 1-6
        #[arg(long)]
        year: Option<String>,

        /// Highlighted BCG category, e.g. 2 or 5
        #[arg(long)]
        category: Option<String>,

        #[arg(long, default_value_t = 960.0)]
        width: f64,

        #[arg(long, default_value_t = 600.0)]
        height: f64,

        #[arg(long)]
        out: PathBuf,
    },

    /// Write one station's trend plot as SVG
    Trend {
        /// Station id as built from the variant's id columns
        #[arg(long)]
        station: String,

        #[arg(long)]
        year: Option<String>,

        #[arg(long, default_value_t = 480.0)]
        width: f64,

        #[arg(long, default_value_t = 320.0)]
        height: f64,

        #[arg(long)]
        out: PathBuf,
    },

    /// Print a JSON summary of the dataset
    Inspect,

    /// Print a variant as JSON
    Variant { name: String },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let source = Source {
        data_dir: args.data,
        manifest: args.manifest,
        variant: args.variant,
    };

    match args.command {
        Command::Render {
            year,
            category,
            width,
            height,
            out,
        } => {
            let opts = RenderOptions {
                year,
                category,
                width,
                height,
            };
            let svg = render_snapshot(load(&source)?, &opts)?;
            fs::write(&out, svg).with_context(|| format!("write {}", out.display()))?;
            info!(out = %out.display(), "wrote map");
        }
        Command::Trend {
            station,
            year,
            width,
            height,
            out,
        } => {
            let data = load(&source)?;
            let svg = render_trend(&data, &station, year.as_deref(), Vec2::new(width, height))?;
            fs::write(&out, svg).with_context(|| format!("write {}", out.display()))?;
            info!(out = %out.display(), "wrote trend plot");
        }
        Command::Inspect => {
            let summary = inspect(&load(&source)?);
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Variant { name } => {
            println!("{}", resolve_variant(&name)?.to_json_string_pretty()?);
        }
    }
    Ok(())
}
