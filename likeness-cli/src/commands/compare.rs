//! Compare command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;
use likeness_core::{Comparator, ComparatorConfig, ComparisonResult, DistanceMetric};
use tracing::{debug, info};

pub struct CompareArgs {
    pub image1: PathBuf,
    pub image2: PathBuf,
    pub distance: String,
    pub features: String,
    pub hash: String,
    pub json: bool,
}

/// Execute the compare command.
pub fn execute(args: CompareArgs) -> Result<()> {
    let config = ComparatorConfig::from_names(
        Some(&args.features),
        Some(&args.distance),
        Some(&args.hash),
    )?;
    debug!(%config, "Parsed comparator options");

    let comparator = Comparator::from_config(config)?;
    let result = comparator
        .compare(&args.image1, &args.image2)
        .context("Comparison failed")?;

    info!(
        image1 = %args.image1.display(),
        image2 = %args.image2.display(),
        "Comparison finished"
    );

    if args.json {
        let body = serde_json::to_string_pretty(&result).context("Failed to serialize result")?;
        println!("{body}");
    } else {
        for note in &result.notes {
            println!("{} {}", "Note:".yellow().bold(), note);
        }
        for line in render_report(&result, comparator.distance_metric()) {
            println!("{line}");
        }
    }

    Ok(())
}

/// Format the human-readable report, one score per line.
///
/// The size-dependent scores are omitted when they were not computed.
pub fn render_report(result: &ComparisonResult, metric: DistanceMetric) -> Vec<String> {
    let mut lines = vec![format!(
        "Cosine Similarity Score: {:.4}",
        result.cosine_similarity
    )];
    if let Some(score) = result.opencv_match {
        lines.push(format!("OpenCV Match Score: {score:.4}"));
    }
    if let Some(score) = result.distance_score {
        lines.push(format!("{}: {score:.4}", metric.label()));
    }
    lines.push(format!(
        "pHash Similarity: {:.2}%",
        result.phash_similarity * 100.0
    ));
    lines
}
