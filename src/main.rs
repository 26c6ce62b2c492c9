// SPDX-License-Identifier: GPL-3.0-only

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "depth-cloud")]
#[command(about = "Reconstruct point clouds and meshes from depth maps")]
#[command(version = depth_cloud::constants::app_info::version())]
struct Cli {
    /// Config file (default: <config dir>/depth-cloud/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Raw depth input shared by all subcommands
#[derive(Args, Clone)]
pub struct DepthInput {
    /// Raw little-endian 16-bit depth dump
    depth: PathBuf,

    /// Raster width in pixels
    #[arg(long, default_value = "640")]
    width: u32,

    /// Raster height in pixels
    #[arg(long, default_value = "480")]
    height: u32,

    /// Millimeters per raw depth unit
    #[arg(long, default_value = "1.0")]
    scale: f32,

    /// Samples are Kinect v1 disparity rather than depth
    #[arg(long)]
    disparity: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a point cloud or mesh and export it
    Reconstruct {
        #[command(flatten)]
        input: DepthInput,

        /// Calibration JSON (default: Kinect v1 depth intrinsics, no color stream)
        #[arg(short, long)]
        calibration: Option<PathBuf>,

        /// Color image used as texture (PNG, JPEG, ...)
        #[arg(long)]
        color: Option<PathBuf>,

        /// Triangulate into a mesh
        #[arg(short, long)]
        mesh: bool,

        /// Drop samples without depth instead of zero-filling them
        #[arg(long)]
        remove_invalid: bool,

        /// Binary PLY output
        #[arg(long)]
        binary: bool,

        /// Output file; the extension picks the format (default: depth_cloud_TIMESTAMP.ply)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Render a depth map as a color image
    Colorize {
        #[command(flatten)]
        input: DepthInput,

        /// Color ramp: classic, turbo or grayscale
        #[arg(long)]
        ramp: Option<String>,

        /// Near end of the range in millimeters
        #[arg(long)]
        min: Option<f32>,

        /// Far end of the range in millimeters
        #[arg(long)]
        max: Option<f32>,

        /// Output image (default: depth_TIMESTAMP.png)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Denoise a depth map and write it back as raw 16-bit samples
    Filter {
        #[command(flatten)]
        input: DepthInput,

        /// Filter kind: mean, gaussian or median
        #[arg(short, long, default_value = "median")]
        kind: String,

        /// Odd window size
        #[arg(short, long, default_value = "3")]
        size: usize,

        /// Gaussian sigma
        #[arg(long, default_value = "1.0")]
        sigma: f32,

        /// Output dump (default: depth_filtered_TIMESTAMP.raw)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print depth statistics
    Info {
        #[command(flatten)]
        input: DepthInput,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=depth_cloud=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let config = cli::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Reconstruct {
            input,
            calibration,
            color,
            mesh,
            remove_invalid,
            binary,
            output,
        } => cli::reconstruct(
            config,
            &input,
            cli::ReconstructArgs {
                calibration,
                color,
                mesh,
                remove_invalid,
                binary,
                output,
            },
        ),
        Commands::Colorize {
            input,
            ramp,
            min,
            max,
            output,
        } => cli::colorize(config, &input, ramp.as_deref(), min, max, output),
        Commands::Filter {
            input,
            kind,
            size,
            sigma,
            output,
        } => cli::filter(&input, &kind, size, sigma, output),
        Commands::Info { input } => cli::info(&input),
    }
}
