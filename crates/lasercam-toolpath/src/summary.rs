//! Job statistics reported to the operator and written into the G-code.

use chrono::{DateTime, Utc};
use lasercam_core::{CurveKind, LayerRole};
use serde::Serialize;

use crate::estimate::{format_duration, TimeEstimate};
use crate::toolpath::ToolpathEntry;

/// What one layer contributed to the job
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LayerStatistics {
    pub layer: Option<LayerRole>,
    /// Arcs, circles, ellipses and NURBS
    pub curves: usize,
    pub polycurves: usize,
    pub polylines: usize,
    pub lines: usize,
    pub estimate: TimeEstimate,
}

impl LayerStatistics {
    /// Count the entries of `layer`; `estimate` is that layer's share of the job.
    pub fn collect(layer: LayerRole, entries: &[ToolpathEntry], estimate: TimeEstimate) -> Self {
        let mut stats = LayerStatistics {
            layer: Some(layer),
            estimate,
            ..Default::default()
        };
        for entry in entries.iter().filter(|e| e.layer == layer) {
            match entry.kind {
                CurveKind::Line => stats.lines += 1,
                CurveKind::Polyline => stats.polylines += 1,
                CurveKind::PolyCurve => stats.polycurves += 1,
                CurveKind::Arc | CurveKind::Circle | CurveKind::Ellipse | CurveKind::Nurbs => {
                    stats.curves += 1
                }
            }
        }
        stats
    }

    pub fn processed(&self) -> usize {
        self.curves + self.polycurves + self.polylines + self.lines
    }
}

/// Run summary
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JobSummary {
    pub document_name: String,
    pub material_name: String,
    pub layers: Vec<LayerStatistics>,
    pub skipped: usize,
    pub skipped_out_of_bounds: usize,
    pub estimate: TimeEstimate,
    pub generated_at: Option<DateTime<Utc>>,
}

impl JobSummary {
    /// Human readable lines, also used for the G-code comment block.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("File: {}", self.document_name),
            format!("Material profile: {}", self.material_name),
        ];
        if let Some(at) = self.generated_at {
            lines.push(format!("Generated: {}", at.format("%Y-%m-%d %H:%M:%S UTC")));
        }
        lines.push(String::new());

        for stats in &self.layers {
            let Some(layer) = stats.layer else { continue };
            if stats.processed() == 0 {
                continue;
            }
            let verb = match layer {
                LayerRole::Engrave => "Engraving",
                LayerRole::Cut => "Cutting",
            };
            for (count, what) in [
                (stats.curves, "curves"),
                (stats.polycurves, "polycurves"),
                (stats.polylines, "polylines"),
                (stats.lines, "lines"),
            ] {
                if count > 0 {
                    lines.push(format!("{verb} {what} processed: {count}"));
                }
            }
            let noun = match layer {
                LayerRole::Engrave => "engraving",
                LayerRole::Cut => "cutting",
            };
            lines.push(format!(
                "Total {noun} length: {} mm",
                stats.estimate.cut_length as u64
            ));
            lines.push(format!(
                "{verb} time: {}",
                format_duration(stats.estimate.total_seconds())
            ));
            lines.push(String::new());
        }

        lines.push(format!("Skipped objects: {}", self.skipped));
        lines.push(format!(
            "Skipped out of bounds objects: {}",
            self.skipped_out_of_bounds
        ));
        lines.push(String::new());
        lines.push(format!(
            "Total estimated time to run this file: {}",
            format_duration(self.estimate.total_seconds())
        ));
        lines
    }
}
