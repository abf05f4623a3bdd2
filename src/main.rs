use std::path::{Path, PathBuf};
use std::time::Instant;
use std::fs;

use anyhow::{bail, Context};
use clap::Parser;
use log::{error, info};
use rayon::prelude::*;

use skeleton_topology_lib::config::Config;
use skeleton_topology_lib::image_io::{get_mask_files_in_dir, load_mask};
use skeleton_topology_lib::output::{write_summary_csv, FileSummary};
use skeleton_topology_lib::pipeline::process_mask;
use skeleton_topology_lib::SkeletonError;

/// Command-line arguments
#[derive(Parser, Debug)]
#[clap(author, version, about = "Skeleton topology - line graph extraction and junction pruning")]
struct Args {
    /// Path to input mask or directory of masks
    #[clap(short, long)]
    input: Option<String>,

    /// Path to output directory
    #[clap(short, long)]
    output: Option<String>,

    /// Path to configuration file (defaults are used if it does not exist)
    #[clap(short, long, default_value = "config.toml")]
    config: String,

    /// Keep every branch (overwrites config)
    #[clap(long)]
    no_prune: bool,

    /// Input masks are already skeletons (overwrites config)
    #[clap(long)]
    no_thinning: bool,

    /// Minimum reported line length in pixels (overwrites config)
    #[clap(short, long)]
    min_length: Option<f64>,

    /// Enable debug mode (save intermediate skeletons and log more info)
    #[clap(short, long)]
    debug: bool,
}

fn process_path(path: &Path, config: &Config, debug: bool) -> Result<FileSummary, SkeletonError> {
    info!("Processing: {}", path.display());
    let input = load_mask(path, config.foreground_threshold)?;
    process_mask(input, config, debug)
}

/// Main function
fn main() -> anyhow::Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    let default_filter = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    // Load configuration
    let mut config = Config::from_file_or_default(&args.config)
        .with_context(|| format!("loading configuration from {}", args.config))?;

    // Override config with command-line arguments
    if let Some(input) = args.input.clone() {
        config.input_path = input;
    }

    if let Some(output) = args.output.clone() {
        config.output_base_dir = output;
    }

    if args.no_prune {
        config.prune_junctions = false;
    }

    if args.no_thinning {
        config.skeletonize = false;
    }

    if let Some(min_length) = args.min_length {
        config.min_line_length = min_length;
    }

    config.validate().context("invalid configuration")?;

    let start_time = Instant::now();

    let output_base = PathBuf::from(&config.output_base_dir);
    fs::create_dir_all(&output_base)
        .with_context(|| format!("creating output directory {}", output_base.display()))?;

    let input_path = PathBuf::from(&config.input_path);

    let summaries = if input_path.is_file() {
        info!("Processing single file: {}", input_path.display());
        vec![process_path(&input_path, &config, args.debug)?]
    } else if input_path.is_dir() {
        info!("Processing directory: {}", input_path.display());
        let mask_files = get_mask_files_in_dir(&input_path)?;
        info!("Found {} mask files", mask_files.len());

        let results: Vec<(PathBuf, Result<FileSummary, SkeletonError>)> = if config.use_parallel {
            mask_files
                .par_iter()
                .map(|path| (path.clone(), process_path(path, &config, args.debug)))
                .collect()
        } else {
            mask_files
                .iter()
                .map(|path| (path.clone(), process_path(path, &config, args.debug)))
                .collect()
        };

        let mut summaries = Vec::with_capacity(results.len());
        for (path, result) in results {
            match result {
                Ok(summary) => summaries.push(summary),
                Err(e) => error!("Error processing {}: {}", path.display(), e),
            }
        }
        summaries
    } else {
        bail!(SkeletonError::InvalidPath(input_path));
    };

    write_summary_csv(&summaries, &output_base).context("writing summary table")?;

    let elapsed = start_time.elapsed();
    info!(
        "Processed {} files in {:.2} seconds",
        summaries.len(),
        elapsed.as_secs_f64()
    );

    Ok(())
}
