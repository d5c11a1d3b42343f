//! Likeness CLI - compare two images with multiple similarity metrics.

use std::path::PathBuf;
use std::process;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

mod commands;
mod exit_codes;

use exit_codes::ExitCode;

const EXIT_CODES_HELP: &str = "\
Exit codes:
  0   Comparison completed
  1   General error
  2   Invalid arguments
  65  Comparison failed (metric error)
  66  Cannot read or decode an input image
  78  Configuration error (feature model unavailable in this build)";

#[derive(Parser)]
#[command(name = "likeness")]
#[command(author, version, about = "Multi-metric image similarity scoring", long_about = None)]
#[command(after_help = EXIT_CODES_HELP)]
struct Cli {
    /// First image
    #[arg(value_name = "IMAGE1")]
    image1: PathBuf,

    /// Second image
    #[arg(value_name = "IMAGE2")]
    image2: PathBuf,

    /// Pixel-difference metric for the distance score
    #[arg(short, long, default_value = "ssim", value_parser = ["ssim", "mse"])]
    distance: String,

    /// Feature model for the cosine similarity
    #[arg(short, long, default_value = "hog", value_parser = ["hog", "vit"])]
    features: String,

    /// Perceptual hash algorithm
    #[arg(long, default_value = "dct", value_parser = ["dct", "mean", "gradient", "blockhash"])]
    hash: String,

    /// Print the result as JSON instead of a report
    #[arg(long)]
    json: bool,

    /// Enable verbose logging (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("likeness_core={default_level},{default_level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = commands::compare::execute(commands::compare::CompareArgs {
        image1: cli.image1,
        image2: cli.image2,
        distance: cli.distance,
        features: cli.features,
        hash: cli.hash,
        json: cli.json,
    });

    if let Err(err) = result {
        let exit = ExitCode::from_anyhow(&err);
        if let Some(message) = exit.message {
            eprintln!("{} {}", "Error:".red().bold(), message);
        }
        process::exit(exit.code);
    }
}
