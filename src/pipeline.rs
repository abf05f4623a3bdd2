// src/pipeline.rs - Per-file processing: analyse one mask and write its reports

use std::fs;
use std::path::PathBuf;

use log::{info, warn};

use crate::analysis::{analyze, AnalysisOptions, SkeletonAnalysis};
use crate::config::Config;
use crate::errors::Result;
use crate::image_io::{save_image, save_mask, InputMask};
use crate::labels::NodeKind;
use crate::output::{render_labels, write_lines_csv, write_lines_json, FileSummary};
use crate::thinning::{Identity, Skeletonize, ZhangSuen};

/// Thinning strategy selected by the configuration
pub fn skeletonizer_for(config: &Config) -> &'static (dyn Skeletonize + Sync) {
    if config.skeletonize {
        &ZhangSuen
    } else {
        &Identity
    }
}

/// Summarise an analysis for the batch table; lengths are scaled
pub fn summarize(filename: &str, analysis: &SkeletonAnalysis, pixel_scale: f64) -> FileSummary {
    FileSummary {
        filename: filename.to_string(),
        line_count: analysis.lines.len(),
        terminus_count: analysis.labels.count(NodeKind::Terminus),
        junction_count: analysis.labels.count(NodeKind::Junction),
        total_length: analysis.lines.iter().map(|l| l.length).sum::<f64>() * pixel_scale,
        removed_branches: analysis.pruning.map_or(0, |p| p.removed_branches),
        converged: analysis.pruning.map_or(true, |p| p.converged),
    }
}

/// Process a single mask: analyse it, then write line tables and images
pub fn process_mask(input: InputMask, config: &Config, debug: bool) -> Result<FileSummary> {
    let InputMask { raster, path, filename } = input;

    let options = AnalysisOptions::from(config);
    let analysis = analyze(&raster, skeletonizer_for(config), &options)?;

    if let Some(pruning) = analysis.pruning {
        if !pruning.converged {
            warn!(
                "{}: pruning did not converge within {} iterations, reporting best-effort result",
                path.display(),
                config.max_prune_iterations
            );
        }
    }

    let output_dir = PathBuf::from(&config.output_base_dir);

    write_lines_csv(&analysis.lines, &output_dir, &filename, config.pixel_scale, &config.unit)?;
    write_lines_json(
        &analysis.lines,
        &analysis.labels,
        &output_dir,
        &filename,
        config.pixel_scale,
        &config.unit,
        config.include_paths,
    )?;

    if config.save_label_image {
        let labels_dir = output_dir.join("labels");
        fs::create_dir_all(&labels_dir)?;
        save_image(&render_labels(&analysis.labels), labels_dir.join(format!("{}_labels.png", filename)))?;
    }

    // Save intermediate skeleton if requested
    if debug {
        let debug_dir = output_dir.join("debug");
        fs::create_dir_all(&debug_dir)?;
        save_mask(&analysis.skeleton, debug_dir.join(format!("{}_skeleton.png", filename)))?;
    }

    let summary = summarize(&filename, &analysis, config.pixel_scale);
    info!(
        "{}: {} lines, {} termini, {} junctions, {} branches pruned",
        filename,
        summary.line_count,
        summary.terminus_count,
        summary.junction_count,
        summary.removed_branches
    );

    Ok(summary)
}
