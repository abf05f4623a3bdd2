use std::fs;
use std::path::Path;
use csv::Writer;
use image::{Rgb, RgbImage};
use serde::Serialize;

use crate::errors::Result;
use crate::labels::{LabelRaster, NodeKind};
use crate::tracer::Line;

/// Colours of the label visualisation
const TERMINUS_COLOR: [u8; 3] = [255, 64, 64];
const EDGE_COLOR: [u8; 3] = [255, 255, 255];
const JUNCTION_COLOR: [u8; 3] = [64, 160, 255];

/// A line as handed to tables and overlays, in physical units
#[derive(Debug, Clone, Serialize)]
pub struct LineRecord {
    pub index: usize,
    pub start_x: u32,
    pub start_y: u32,
    pub end_x: u32,
    pub end_y: u32,
    /// Scaled length
    pub length: f64,
    pub closed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_code: Option<Vec<u8>>,
}

impl LineRecord {
    pub fn from_line(index: usize, line: &Line, pixel_scale: f64, include_path: bool) -> Self {
        let (start_x, start_y) = line.start_point();
        let (end_x, end_y) = line.end_point();
        Self {
            index,
            start_x,
            start_y,
            end_x,
            end_y,
            length: line.length * pixel_scale,
            closed: line.is_closed(),
            chain_code: include_path.then(|| line.chain_code.steps().to_vec()),
        }
    }
}

/// Per-file JSON report
#[derive(Debug, Serialize)]
pub struct LineReport<'a> {
    pub filename: &'a str,
    pub width: u32,
    pub height: u32,
    pub unit: &'a str,
    pub pixel_scale: f64,
    pub lines: Vec<LineRecord>,
}

/// One row of the batch summary table
#[derive(Debug, Clone, Serialize)]
pub struct FileSummary {
    pub filename: String,
    pub line_count: usize,
    pub terminus_count: usize,
    pub junction_count: usize,
    pub total_length: f64,
    pub removed_branches: usize,
    pub converged: bool,
}

pub fn line_records(lines: &[Line], pixel_scale: f64, include_paths: bool) -> Vec<LineRecord> {
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| LineRecord::from_line(i + 1, line, pixel_scale, include_paths))
        .collect()
}

/// Write the line table of one file to `<output>/lines/<filename>.csv`
pub fn write_lines_csv<P: AsRef<Path>>(
    lines: &[Line],
    output_dir: P,
    filename: &str,
    pixel_scale: f64,
    unit: &str,
) -> Result<()> {
    let output_path = output_dir.as_ref().join("lines").join(format!("{}.csv", filename));

    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut writer = Writer::from_path(&output_path)?;

    let length_header = format!("Length_{}", unit);
    writer.write_record([
        "Line",
        "Start_X",
        "Start_Y",
        "End_X",
        "End_Y",
        length_header.as_str(),
        "Closed",
    ])?;

    for record in line_records(lines, pixel_scale, false) {
        writer.write_record(&[
            record.index.to_string(),
            record.start_x.to_string(),
            record.start_y.to_string(),
            record.end_x.to_string(),
            record.end_y.to_string(),
            format!("{:.6}", record.length),
            record.closed.to_string(),
        ])?;
    }

    writer.flush()?;

    Ok(())
}

/// Write lines (optionally with chain codes) to `<output>/lines/<filename>.json`
pub fn write_lines_json<P: AsRef<Path>>(
    lines: &[Line],
    labels: &LabelRaster,
    output_dir: P,
    filename: &str,
    pixel_scale: f64,
    unit: &str,
    include_paths: bool,
) -> Result<()> {
    let output_path = output_dir.as_ref().join("lines").join(format!("{}.json", filename));

    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let report = LineReport {
        filename,
        width: labels.width(),
        height: labels.height(),
        unit,
        pixel_scale,
        lines: line_records(lines, pixel_scale, include_paths),
    };

    fs::write(&output_path, serde_json::to_string_pretty(&report)?)?;

    Ok(())
}

/// Write the batch summary to `<output>/summary.csv`
pub fn write_summary_csv<P: AsRef<Path>>(summaries: &[FileSummary], output_dir: P) -> Result<()> {
    fs::create_dir_all(output_dir.as_ref())?;
    let mut writer = Writer::from_path(output_dir.as_ref().join("summary.csv"))?;
    for summary in summaries {
        writer.serialize(summary)?;
    }
    writer.flush()?;
    Ok(())
}

/// Colour each labelled pixel by node type on a black background
pub fn render_labels(labels: &LabelRaster) -> RgbImage {
    RgbImage::from_fn(labels.width(), labels.height(), |x, y| {
        match labels.kind_at(x, y) {
            Some(NodeKind::Terminus) => Rgb(TERMINUS_COLOR),
            Some(NodeKind::Edge) => Rgb(EDGE_COLOR),
            Some(NodeKind::Junction) => Rgb(JUNCTION_COLOR),
            None => Rgb([0, 0, 0]),
        }
    })
}
