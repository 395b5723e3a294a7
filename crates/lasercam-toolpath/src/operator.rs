//! Operator interaction.
//!
//! The compiler asks the operator at a few fixed points: continue or abort
//! after validation, which layer or material to use when that is ambiguous,
//! whether to spread cuts on heat-sensitive material, and where to save.
//! Every question is a synchronous call on [`Operator`].

use std::fmt;
use std::path::PathBuf;

use lasercam_core::LayerRole;

use crate::summary::JobSummary;
use crate::tessellate::TessellationProgress;

/// Answer at a checkpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Continue,
    Abort,
}

/// Where the run stops to ask
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Checkpoint {
    /// Duplicate curves found; continuing drops all but the first copy
    Duplicates { count: usize },
    /// Non-planar curves found; continuing excludes them
    NonPlanar { count: usize },
    /// Curves off the machine plane found; continuing excludes them
    OffPlane { count: usize },
    /// Curves were skipped or lie outside the working area
    SkippedGeometry { skipped: usize, out_of_bounds: usize },
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Checkpoint::Duplicates { count } => write!(f, "{count} duplicate curves found"),
            Checkpoint::NonPlanar { count } => write!(f, "{count} curves are not planar"),
            Checkpoint::OffPlane { count } => {
                write!(f, "{count} curves are not parallel to the machine plane")
            }
            Checkpoint::SkippedGeometry {
                skipped,
                out_of_bounds,
            } => write!(
                f,
                "{skipped} curves skipped, {out_of_bounds} curves outside the working area"
            ),
        }
    }
}

/// Questions the compiler asks during a run
pub trait Operator {
    fn confirm(&mut self, checkpoint: &Checkpoint) -> Decision;

    /// Pick the host layer for `role`, or `None` to leave it out.
    fn choose_layer(&mut self, role: LayerRole, layers: &[String]) -> Option<String>;

    fn choose_material(&mut self, materials: &[String]) -> Option<String>;

    /// Asked only for heat-sensitive materials.
    fn use_interleaved_sort(&mut self, material: &str) -> bool;

    /// Base path of the output file, without material suffix or extension.
    fn save_location(&mut self) -> Option<PathBuf>;

    fn report_summary(&mut self, summary: &JobSummary);

    fn report_progress(&mut self, _progress: TessellationProgress) {}
}

/// Checkpoint policy for non-interactive runs
pub type DecisionPolicy = fn(&Checkpoint) -> Decision;

pub fn always_continue(_: &Checkpoint) -> Decision {
    Decision::Continue
}

pub fn always_abort(_: &Checkpoint) -> Decision {
    Decision::Abort
}

/// Deterministic operator for the CLI and tests.
///
/// Records every checkpoint it was asked about and the final summary.
#[derive(Debug, Clone)]
pub struct HeadlessOperator {
    policy: DecisionPolicy,
    cut_layer: Option<String>,
    engrave_layer: Option<String>,
    material: Option<String>,
    interleave: bool,
    save_path: Option<PathBuf>,
    pub checkpoints: Vec<Checkpoint>,
    pub summary: Option<JobSummary>,
    pub progress_reports: usize,
}

impl Default for HeadlessOperator {
    fn default() -> Self {
        Self {
            policy: always_continue,
            cut_layer: None,
            engrave_layer: None,
            material: None,
            interleave: false,
            save_path: None,
            checkpoints: Vec::new(),
            summary: None,
            progress_reports: 0,
        }
    }
}

impl HeadlessOperator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(mut self, policy: DecisionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Layer returned when asked to choose one for `role`.
    pub fn with_layer(mut self, role: LayerRole, layer: impl Into<String>) -> Self {
        match role {
            LayerRole::Cut => self.cut_layer = Some(layer.into()),
            LayerRole::Engrave => self.engrave_layer = Some(layer.into()),
        }
        self
    }

    pub fn with_material(mut self, material: impl Into<String>) -> Self {
        self.material = Some(material.into());
        self
    }

    pub fn with_interleaved_sort(mut self, interleave: bool) -> Self {
        self.interleave = interleave;
        self
    }

    pub fn with_save_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.save_path = Some(path.into());
        self
    }
}

impl Operator for HeadlessOperator {
    fn confirm(&mut self, checkpoint: &Checkpoint) -> Decision {
        self.checkpoints.push(*checkpoint);
        (self.policy)(checkpoint)
    }

    fn choose_layer(&mut self, role: LayerRole, layers: &[String]) -> Option<String> {
        let wanted = match role {
            LayerRole::Cut => self.cut_layer.as_ref(),
            LayerRole::Engrave => self.engrave_layer.as_ref(),
        }?;
        layers.iter().find(|l| *l == wanted).cloned()
    }

    fn choose_material(&mut self, materials: &[String]) -> Option<String> {
        let wanted = self.material.as_ref()?;
        materials
            .iter()
            .find(|m| m.eq_ignore_ascii_case(wanted))
            .cloned()
    }

    fn use_interleaved_sort(&mut self, _material: &str) -> bool {
        self.interleave
    }

    fn save_location(&mut self) -> Option<PathBuf> {
        self.save_path.clone()
    }

    fn report_summary(&mut self, summary: &JobSummary) {
        self.summary = Some(summary.clone());
    }

    fn report_progress(&mut self, _progress: TessellationProgress) {
        self.progress_reports += 1;
    }
}
