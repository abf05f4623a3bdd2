// src/lib.rs - Library interface for skeleton topology analysis

pub mod analysis;
pub mod chain_code;
pub mod classifier;
pub mod config;
pub mod errors;
pub mod image_io;
pub mod labels;
pub mod neighbourhood;
pub mod output;
pub mod pipeline;
pub mod pruner;
pub mod raster;
pub mod thinning;
pub mod tracer;

// Re-export commonly used types and functions
pub use errors::{SkeletonError, Result};
pub use config::Config;
pub use raster::{BinaryRaster, BACKGROUND, FOREGROUND};
pub use pipeline::process_mask;
pub use image_io::{InputMask, load_mask};

// Re-export the analysis core
pub use analysis::{
    analyze,
    analyze_batch,
    AnalysisOptions,
    PruneSummary,
    SkeletonAnalysis,
};
pub use chain_code::ChainCode;
pub use classifier::classify;
pub use labels::{LabelRaster, NodeKind};
pub use pruner::{prune, PruneOutcome};
pub use thinning::{Identity, Skeletonize, ZhangSuen};
pub use tracer::{extract_lines, Line};
