//! # LaserCAM
//!
//! Compiles curves drawn in a CAD document into G-code for a 2-axis CO2
//! laser cutter.
//!
//! ## Architecture
//!
//! LaserCAM is organized as a workspace with multiple crates:
//!
//! 1. **lasercam-core** - Geometry, curve snapshots, host documents, material profiles, errors
//! 2. **lasercam-toolpath** - Validation, tessellation, nesting order, estimation, G-code
//! 3. **lasercam-settings** - Configuration files and material profile sources
//! 4. **lasercam** - Headless binary that integrates all crates

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::info;

pub use lasercam_core::{data, geometry};
pub use lasercam_settings as settings;
pub use lasercam_toolpath as toolpath;

pub use lasercam_core::{
    CurveGeometry, CurveObject, Error, HostDocument, LayerRole, MaterialProfile, MemoryDocument,
    Point, ProfileCatalog, Result, WorkArea,
};
pub use lasercam_settings::{Config, FallbackProvider, ProfileConfig};
pub use lasercam_toolpath::{
    always_abort, always_continue, DecisionPolicy, HeadlessOperator, Job, JobCompiler,
    JobSettings, JobSummary, Operator,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Pretty formatting on stderr, keeping stdout for reports
/// - RUST_LOG environment variable support, INFO by default
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(tracing::Level::INFO.to_string()));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_line_number(true)
        .pretty();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

/// Job settings from configuration and the catalog's working area.
pub fn job_settings(config: &Config, work_area: WorkArea) -> JobSettings {
    let defaults = JobSettings::default();
    JobSettings {
        cut_layer_name: config.layers.cut.clone(),
        engrave_layer_name: config.layers.engrave.clone(),
        validation: toolpath::ValidationSettings {
            tolerance: config.validation.tolerance,
            check_duplicates: config.validation.check_duplicates,
            check_planarity: config.validation.check_planarity,
            check_plane_alignment: config.validation.check_plane_alignment,
            check_bounds: config.validation.check_bounds,
            duplicate_samples: config.validation.duplicate_samples,
            work_area,
        },
        tessellation: toolpath::TessellationSettings {
            tolerance: config.validation.tolerance,
            chord_tolerance: config.tessellation.chord_tolerance,
            min_segments: config.tessellation.min_segments,
            max_depth: config.tessellation.max_depth,
            ..defaults.tessellation
        },
        interleave_stride: config.sorting.interleave_stride,
        estimate_factor: config.estimate.factor,
        include_summary: config.output.include_summary,
        output_extension: config.output.extension.clone(),
        timestamp: None,
    }
}

/// Profile provider for the configured sources.
///
/// Without a configured source the built-in catalog is used. The cache is
/// only consulted when its file exists.
pub fn profile_provider(config: &ProfileConfig) -> FallbackProvider {
    let primary: Box<dyn settings::ProfileSource> = match &config.source {
        Some(path) => Box::new(settings::JsonFileSource::new(path)),
        None => Box::new(settings::BuiltinSource),
    };
    let provider = FallbackProvider::new(primary);
    match config.cache_path().filter(|p| p.is_file()) {
        Some(cache) => provider.with_cache(Box::new(settings::JsonFileSource::new(cache))),
        None => provider,
    }
}

/// One headless compile request
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// JSON description of the host document
    pub document: PathBuf,
    pub material: Option<String>,
    /// Base output path, without material suffix or extension
    pub output: Option<PathBuf>,
    /// Layer used for cutting when the configured name is missing
    pub cut_layer: Option<String>,
    /// Layer used for engraving when the configured name is missing
    pub engrave_layer: Option<String>,
    /// Accept the heat-spreading sort for heat-sensitive materials
    pub interleave: bool,
    /// Abort at the first validation checkpoint instead of continuing
    pub strict: bool,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Base output path: explicit, else the document name in the output
/// directory, else next to the document.
fn output_base(config: &Config, options: &RunOptions) -> PathBuf {
    if let Some(output) = &options.output {
        return output.clone();
    }
    let stem = options
        .document
        .file_stem()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("output"));
    match &config.output.directory {
        Some(dir) => dir.join(stem),
        None => options
            .document
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(stem),
    }
}

/// Compile a document and write the G-code file.
pub fn run_job(config: &Config, options: &RunOptions) -> Result<(Job, PathBuf)> {
    let mut doc = MemoryDocument::from_file(&options.document)?;
    info!("Opened {} ({} objects)", options.document.display(), doc.objects.len());

    let catalog = profile_provider(&config.profiles).load_catalog(VERSION)?;

    let mut settings = job_settings(config, catalog.work_area);
    settings.timestamp = options.timestamp;

    let policy: DecisionPolicy = if options.strict {
        always_abort
    } else {
        always_continue
    };
    let mut operator = HeadlessOperator::new()
        .with_policy(policy)
        .with_interleaved_sort(options.interleave)
        .with_save_path(output_base(config, options));
    if let Some(layer) = &options.cut_layer {
        operator = operator.with_layer(LayerRole::Cut, layer.as_str());
    }
    if let Some(layer) = &options.engrave_layer {
        operator = operator.with_layer(LayerRole::Engrave, layer.as_str());
    }

    let requested = options
        .material
        .as_deref()
        .or(config.profiles.default_material.as_deref());
    let profile = toolpath::select_material(&catalog, requested, &mut operator)?;

    JobCompiler::new(&settings, &profile).run(&mut doc, &mut operator)
}
