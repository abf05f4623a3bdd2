// src/analysis.rs - One-call skeleton analysis: thin, prune, trace, filter

use log::debug;
use rayon::prelude::*;

use crate::classifier::classify;
use crate::config::Config;
use crate::errors::Result;
use crate::labels::LabelRaster;
use crate::pruner::prune;
use crate::raster::BinaryRaster;
use crate::thinning::Skeletonize;
use crate::tracer::{extract_lines, Line};

/// Parameters of the analysis core, independent of file handling
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisOptions {
    pub prune_junctions: bool,
    /// Lines shorter than this are dropped from the result, not from the raster
    pub min_line_length: f64,
    pub max_prune_iterations: usize,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            prune_junctions: true,
            min_line_length: 0.0,
            max_prune_iterations: 100_000,
        }
    }
}

impl From<&Config> for AnalysisOptions {
    fn from(config: &Config) -> Self {
        Self {
            prune_junctions: config.prune_junctions,
            min_line_length: config.min_line_length,
            max_prune_iterations: config.max_prune_iterations,
        }
    }
}

/// Pruning statistics, present when pruning ran
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PruneSummary {
    pub iterations: usize,
    pub removed_branches: usize,
    pub removed_pixels: usize,
    pub converged: bool,
}

/// Final topology of one raster, in pixel units
#[derive(Debug, Clone)]
pub struct SkeletonAnalysis {
    /// Skeleton after thinning and pruning
    pub skeleton: BinaryRaster,
    pub labels: LabelRaster,
    /// Lines at least `min_line_length` long, longest first
    pub lines: Vec<Line>,
    pub pruning: Option<PruneSummary>,
}

/// Analyse a binary raster: skeletonize, optionally prune junctions, trace lines.
pub fn analyze<S>(raster: &BinaryRaster, skeletonizer: &S, options: &AnalysisOptions) -> Result<SkeletonAnalysis>
where
    S: Skeletonize + ?Sized,
{
    let thinned = skeletonizer.skeletonize(raster);
    debug!(
        "Skeletonized {}x{} raster: {} -> {} foreground pixels",
        raster.width(),
        raster.height(),
        raster.foreground_count(),
        thinned.foreground_count()
    );

    let (skeleton, labels, lines, pruning) = if options.prune_junctions {
        let outcome = prune(&thinned, options.max_prune_iterations)?;
        let summary = PruneSummary {
            iterations: outcome.iterations,
            removed_branches: outcome.removed_branches,
            removed_pixels: outcome.removed_pixels,
            converged: outcome.converged,
        };
        (outcome.skeleton, outcome.labels, outcome.lines, Some(summary))
    } else {
        let labels = classify(&thinned);
        let lines = extract_lines(&labels);
        (thinned, labels, lines, None)
    };

    let total = lines.len();
    let lines: Vec<Line> = lines
        .into_iter()
        .filter(|line| line.length >= options.min_line_length)
        .collect();
    debug!("Traced {} lines, {} kept after length filter", total, lines.len());

    Ok(SkeletonAnalysis {
        skeleton,
        labels,
        lines,
        pruning,
    })
}

/// Analyse independent rasters (e.g. frames of a time series) in parallel.
///
/// Each raster is processed on its own copy; results keep the input order.
pub fn analyze_batch<S>(
    rasters: &[BinaryRaster],
    skeletonizer: &S,
    options: &AnalysisOptions,
) -> Vec<Result<SkeletonAnalysis>>
where
    S: Skeletonize + Sync + ?Sized,
{
    rasters
        .par_iter()
        .map(|raster| analyze(raster, skeletonizer, options))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thinning::{Identity, ZhangSuen};
    use assert_approx_eq::assert_approx_eq;

    fn t_shape() -> BinaryRaster {
        BinaryRaster::from_ascii(&[
            ".............",
            ".............",
            ".###########.",
            "....#........",
            "....#........",
            ".............",
        ])
        .expect("valid fixture")
    }

    #[test]
    fn without_pruning_all_branches_are_reported() {
        let options = AnalysisOptions {
            prune_junctions: false,
            ..AnalysisOptions::default()
        };
        let analysis = analyze(&t_shape(), &Identity, &options).expect("analysis succeeds");
        assert!(analysis.pruning.is_none());
        assert_eq!(analysis.lines.len(), 3);
        assert_eq!(analysis.skeleton, t_shape());
    }

    #[test]
    fn pruning_merges_branches_into_one_line() {
        let analysis = analyze(&t_shape(), &Identity, &AnalysisOptions::default()).expect("analysis succeeds");
        let summary = analysis.pruning.expect("pruning ran");
        assert!(summary.converged);
        assert_eq!(summary.removed_branches, 1);
        assert_eq!(analysis.lines.len(), 1);
        assert_approx_eq!(analysis.lines[0].length, 10.0);
    }

    #[test]
    fn min_length_filters_report_only() {
        let options = AnalysisOptions {
            prune_junctions: false,
            min_line_length: 2.5,
            ..AnalysisOptions::default()
        };
        let analysis = analyze(&t_shape(), &Identity, &options).expect("analysis succeeds");
        let lengths: Vec<f64> = analysis.lines.iter().map(|l| l.length).collect();
        assert_eq!(lengths, vec![7.0, 3.0]);
        assert_eq!(analysis.skeleton.foreground_count(), t_shape().foreground_count());
    }

    #[test]
    fn blank_raster_yields_nothing() {
        let blank = BinaryRaster::new(8, 8).expect("valid size");
        let analysis = analyze(&blank, &ZhangSuen, &AnalysisOptions::default()).expect("analysis succeeds");
        assert!(analysis.lines.is_empty());
        assert!(analysis.labels.is_blank());
    }

    #[test]
    fn batch_keeps_input_order() {
        let line = BinaryRaster::from_ascii(&[".......", ".#####.", "......."]).expect("valid fixture");
        let rasters = vec![t_shape(), line];
        let results = analyze_batch(&rasters, &Identity, &AnalysisOptions::default());

        assert_eq!(results.len(), 2);
        let first = results[0].as_ref().expect("first succeeds");
        let second = results[1].as_ref().expect("second succeeds");
        assert_approx_eq!(first.lines[0].length, 10.0);
        assert_approx_eq!(second.lines[0].length, 4.0);
    }
}
