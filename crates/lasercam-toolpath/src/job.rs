//! Job pipeline.
//!
//! Runs the compiler end to end against a host document:
//! layer resolution, capture, validation with operator checkpoints,
//! tessellation, nesting order, toolpath assembly, estimation and
//! G-code emission. Writing the file is a separate step so the result can
//! be inspected first.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use lasercam_core::{
    capture_layer, CurveObject, Error, HostDocument, LayerRole, MaterialProfile, ObjectId,
    OutputError, Point, ProfileCatalog, ProfileError, Result,
};
use tracing::{debug, info, warn};

use crate::estimate::{format_duration, TimeEstimate, TimeEstimator};
use crate::gcode_gen::GCodeEmitter;
use crate::nesting::{NestingSorter, SortMode};
use crate::operator::{Checkpoint, Decision, Operator};
use crate::summary::{JobSummary, LayerStatistics};
use crate::tessellate::{CurveTessellator, Tessellation, TessellationSettings};
use crate::toolpath::{MotionProgram, SkippedEntry, ToolpathBuilder, ToolpathEntry};
use crate::validation::{FlagKind, GeometryValidator, ValidationReport, ValidationSettings};

/// Everything a run needs besides the document, the profile and the operator
#[derive(Debug, Clone)]
pub struct JobSettings {
    pub cut_layer_name: String,
    pub engrave_layer_name: String,
    pub validation: ValidationSettings,
    /// Precision is taken from the material profile
    pub tessellation: TessellationSettings,
    /// Stride of the heat-spreading sort
    pub interleave_stride: usize,
    /// Multiplied into every estimated time
    pub estimate_factor: f64,
    pub include_summary: bool,
    pub output_extension: String,
    /// Generation time written into the summary; `None` omits it
    pub timestamp: Option<DateTime<Utc>>,
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            cut_layer_name: LayerRole::Cut.default_layer_name().to_string(),
            engrave_layer_name: LayerRole::Engrave.default_layer_name().to_string(),
            validation: ValidationSettings::default(),
            tessellation: TessellationSettings::default(),
            interleave_stride: 5,
            estimate_factor: 1.0,
            include_summary: true,
            output_extension: "nc".to_string(),
            timestamp: None,
        }
    }
}

impl JobSettings {
    fn layer_name(&self, role: LayerRole) -> &str {
        match role {
            LayerRole::Cut => &self.cut_layer_name,
            LayerRole::Engrave => &self.engrave_layer_name,
        }
    }
}

/// Host layers chosen for each role
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerSelection {
    pub cut: Option<String>,
    pub engrave: Option<String>,
}

impl LayerSelection {
    pub fn get(&self, role: LayerRole) -> Option<&str> {
        match role {
            LayerRole::Cut => self.cut.as_deref(),
            LayerRole::Engrave => self.engrave.as_deref(),
        }
    }

    fn set(&mut self, role: LayerRole, layer: Option<String>) {
        match role {
            LayerRole::Cut => self.cut = layer,
            LayerRole::Engrave => self.engrave = layer,
        }
    }
}

fn same_layer_name(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Map layer roles to host layers.
///
/// Configured names match case-insensitively. A single-layer document that
/// matches one role leaves the other unassigned; any other unresolved role
/// is put to the operator.
pub fn resolve_layers<D, O>(doc: &D, settings: &JobSettings, operator: &mut O) -> Result<LayerSelection>
where
    D: HostDocument + ?Sized,
    O: Operator + ?Sized,
{
    let layers = doc.layer_names();
    let mut selection = LayerSelection::default();

    for role in LayerRole::ALL {
        let wanted = settings.layer_name(role);
        let found = layers.iter().find(|l| same_layer_name(l, wanted)).cloned();
        selection.set(role, found);
    }

    let single_match = layers.len() == 1 && (selection.cut.is_some() || selection.engrave.is_some());
    if !single_match {
        for role in LayerRole::ALL {
            if selection.get(role).is_none() {
                let chosen = operator.choose_layer(role, &layers);
                debug!("Operator chose layer {:?} for {}", chosen, role);
                selection.set(role, chosen);
            }
        }
    }

    if selection.cut.is_none() && selection.engrave.is_none() {
        return Err(Error::NoLayerSelected);
    }

    info!(
        "Layers resolved: engrave={:?} cut={:?}",
        selection.engrave, selection.cut
    );
    Ok(selection)
}

/// Snapshot every curve on the selected layers, engrave layer first.
pub fn capture_curves<D>(doc: &D, selection: &LayerSelection, tolerance: f64) -> Result<Vec<CurveObject>>
where
    D: HostDocument + ?Sized,
{
    let mut objects = Vec::new();
    for role in LayerRole::ALL {
        let Some(layer) = selection.get(role) else {
            continue;
        };
        let captured = capture_layer(doc, layer, role, tolerance);
        if captured.is_empty() {
            warn!("Layer '{}' has no curve objects", layer);
        } else {
            info!("Captured {} curves from layer '{}'", captured.len(), layer);
        }
        objects.extend(captured);
    }

    if objects.is_empty() {
        return Err(Error::NoObjects);
    }
    Ok(objects)
}

/// Pick the material profile: the requested name, else the operator's choice.
pub fn select_material<O>(
    catalog: &ProfileCatalog,
    requested: Option<&str>,
    operator: &mut O,
) -> Result<MaterialProfile>
where
    O: Operator + ?Sized,
{
    let name = match requested {
        Some(name) => name.to_string(),
        None => operator
            .choose_material(&catalog.material_names())
            .ok_or(ProfileError::NoMaterialSelected)?,
    };
    let profile = catalog.material(&name)?;
    info!("Material profile: {}", profile.name);
    Ok(profile)
}

/// Compiled job, ready to be written
#[derive(Debug, Clone)]
pub struct Job {
    /// Captured curves with their nesting links
    pub objects: Vec<CurveObject>,
    pub validation: ValidationReport,
    pub sort_mode: SortMode,
    /// Entries in emission order
    pub entries: Vec<ToolpathEntry>,
    pub program: MotionProgram,
    /// Curves dropped after validation
    pub skipped: Vec<SkippedEntry>,
    pub estimate: TimeEstimate,
    pub summary: JobSummary,
    pub gcode: String,
    pub material_name: String,
}

impl Job {
    /// Curves excluded for any reason other than the working area.
    pub fn skipped_count(&self) -> usize {
        self.validation.skipped_objects().len() + self.skipped.len()
    }

    pub fn skipped_out_of_bounds_count(&self) -> usize {
        self.validation.count(FlagKind::OutOfBounds)
    }

    /// Output path for a chosen base path: `<base>_<material>.<ext>`.
    pub fn output_path(&self, base: &Path, extension: &str) -> PathBuf {
        let material: String = self
            .material_name
            .chars()
            .map(|c| if matches!(c, '/' | '\\') { '-' } else { c })
            .collect();
        let mut name = base.as_os_str().to_os_string();
        name.push(format!("_{material}.{extension}"));
        PathBuf::from(name)
    }

    /// Write the G-code and check the file landed.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let shown = path.display().to_string();
        std::fs::write(path, &self.gcode).map_err(|e| OutputError::WriteFailed {
            path: shown.clone(),
            reason: e.to_string(),
        })?;

        let metadata = std::fs::metadata(path).map_err(|_| OutputError::Missing {
            path: shown.clone(),
        })?;
        if metadata.len() == 0 {
            return Err(OutputError::Empty { path: shown }.into());
        }
        info!("Wrote {} bytes to {}", metadata.len(), shown);
        Ok(())
    }
}

/// Compiles host curves into a G-code job for one material profile
pub struct JobCompiler<'a> {
    settings: &'a JobSettings,
    profile: &'a MaterialProfile,
}

impl<'a> JobCompiler<'a> {
    pub fn new(settings: &'a JobSettings, profile: &'a MaterialProfile) -> Self {
        Self { settings, profile }
    }

    /// Compile, ask for a save location, write and report the summary.
    pub fn run<D, O>(&self, doc: &mut D, operator: &mut O) -> Result<(Job, PathBuf)>
    where
        D: HostDocument + ?Sized,
        O: Operator + ?Sized,
    {
        let job = self.compile(doc, operator)?;
        let base = operator.save_location().ok_or(OutputError::NoLocation)?;
        let path = job.output_path(&base, &self.settings.output_extension);
        job.write_to(&path)?;
        operator.report_summary(&job.summary);
        Ok((job, path))
    }

    pub fn compile<D, O>(&self, doc: &mut D, operator: &mut O) -> Result<Job>
    where
        D: HostDocument + ?Sized,
        O: Operator + ?Sized,
    {
        let tolerance = self.settings.validation.tolerance;
        let selection = resolve_layers(doc, self.settings, operator)?;
        let mut objects = capture_curves(doc, &selection, tolerance)?;
        doc.unselect_all();

        let validation = GeometryValidator::new(self.settings.validation.clone()).validate(&objects);
        self.checkpoints(doc, operator, &objects, &validation)?;

        let sort_mode = self.sort_mode(operator);

        let valid = validation.valid_objects();
        let tessellator = CurveTessellator::new(TessellationSettings {
            precision: self.profile.precision,
            ..self.settings.tessellation.clone()
        });
        let results = tessellator.tessellate_all(valid.iter().map(|i| &objects[*i]), |progress| {
            operator.report_progress(progress)
        });

        let mut builder = ToolpathBuilder::new(tolerance);
        let mut tessellations: HashMap<usize, Tessellation> = HashMap::new();
        let mut outlines: Vec<Option<Vec<Point>>> = vec![None; objects.len()];
        let mut sortable = Vec::with_capacity(valid.len());
        for (&index, result) in valid.iter().zip(results) {
            match result {
                Ok(tessellation) => {
                    outlines[index] = Some(tessellation.outline());
                    tessellations.insert(index, tessellation);
                    sortable.push(index);
                }
                Err(error) => {
                    warn!("Skipping curve {}: {}", objects[index].id, error);
                    builder.skip(index, &objects[index], error);
                }
            }
        }

        let sorter = NestingSorter::new(tolerance, sort_mode);
        let order = sorter.sort(&mut objects, &outlines, &sortable);

        for index in order {
            if let Some(tessellation) = tessellations.remove(&index) {
                if let Err(error) = builder.push(index, &objects[index], tessellation) {
                    debug!("Curve {} left out: {}", objects[index].id, error);
                }
            }
        }

        let toolpath = builder.build();
        let dropped: Vec<ObjectId> = toolpath.skipped.iter().map(|s| s.object).collect();
        if !dropped.is_empty() {
            doc.select_objects(&dropped);
        }

        let estimator = TimeEstimator::from_profile(self.profile, self.settings.estimate_factor);
        let (estimate, layers) = layer_estimates(&estimator, &toolpath.entries);
        info!(
            "Estimated run time {} ({:.1} mm cut, {:.1} mm slew)",
            format_duration(estimate.total_seconds()),
            estimate.cut_length,
            estimate.slew_length
        );

        let summary = JobSummary {
            document_name: doc.name().to_string(),
            material_name: self.profile.name.clone(),
            layers,
            skipped: validation.skipped_objects().len() + toolpath.skipped.len(),
            skipped_out_of_bounds: validation.count(FlagKind::OutOfBounds),
            estimate,
            generated_at: self.settings.timestamp,
        };

        let gcode = GCodeEmitter::new(self.profile.precision)
            .with_summary(self.settings.include_summary)
            .emit(&toolpath.program, self.profile, &summary);

        Ok(Job {
            objects,
            validation,
            sort_mode,
            entries: toolpath.entries,
            program: toolpath.program,
            skipped: toolpath.skipped,
            estimate,
            summary,
            gcode,
            material_name: self.profile.name.clone(),
        })
    }

    /// Ask the operator about every kind of flagged geometry, in a fixed order.
    fn checkpoints<D, O>(
        &self,
        doc: &mut D,
        operator: &mut O,
        objects: &[CurveObject],
        validation: &ValidationReport,
    ) -> Result<()>
    where
        D: HostDocument + ?Sized,
        O: Operator + ?Sized,
    {
        let gates = [
            (
                vec![FlagKind::Duplicate],
                Checkpoint::Duplicates {
                    count: validation.count(FlagKind::Duplicate),
                },
            ),
            (
                vec![FlagKind::NonPlanar],
                Checkpoint::NonPlanar {
                    count: validation.count(FlagKind::NonPlanar),
                },
            ),
            (
                vec![FlagKind::OffPlane],
                Checkpoint::OffPlane {
                    count: validation.count(FlagKind::OffPlane),
                },
            ),
            (
                vec![FlagKind::Degenerate, FlagKind::OutOfBounds],
                Checkpoint::SkippedGeometry {
                    skipped: validation.count(FlagKind::Degenerate),
                    out_of_bounds: validation.count(FlagKind::OutOfBounds),
                },
            ),
        ];

        for (kinds, checkpoint) in gates {
            let flagged: Vec<ObjectId> = kinds
                .iter()
                .flat_map(|kind| validation.flags_of(*kind))
                .map(|flag| objects[flag.index].id)
                .collect();
            if flagged.is_empty() {
                continue;
            }

            doc.select_objects(&flagged);
            let decision = operator.confirm(&checkpoint);
            info!("Checkpoint '{}': {:?}", checkpoint, decision);
            if decision == Decision::Abort {
                return Err(Error::Aborted {
                    checkpoint: checkpoint.to_string(),
                });
            }
        }
        Ok(())
    }

    fn sort_mode<O: Operator + ?Sized>(&self, operator: &mut O) -> SortMode {
        if self.profile.heat_sensitive && operator.use_interleaved_sort(&self.profile.name) {
            info!(
                "Interleaved sort with stride {} for {}",
                self.settings.interleave_stride, self.profile.name
            );
            SortMode::Interleaved {
                stride: self.settings.interleave_stride,
            }
        } else {
            SortMode::Spatial
        }
    }
}

/// Job total plus per-layer statistics. Each entry's bridging slew counts
/// towards its own layer.
fn layer_estimates(
    estimator: &TimeEstimator,
    entries: &[ToolpathEntry],
) -> (TimeEstimate, Vec<LayerStatistics>) {
    let mut per_layer: HashMap<LayerRole, TimeEstimate> = HashMap::new();
    let mut pos = Point::origin();
    for entry in entries {
        *per_layer.entry(entry.layer).or_default() += estimator.estimate_entry(entry, pos);
        pos = entry.end();
    }

    let layers: Vec<LayerStatistics> = LayerRole::ALL
        .iter()
        .map(|role| {
            LayerStatistics::collect(
                *role,
                entries,
                per_layer.get(role).copied().unwrap_or_default(),
            )
        })
        .collect();
    let total = layers.iter().map(|l| l.estimate).sum();
    (total, layers)
}
