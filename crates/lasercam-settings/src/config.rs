//! Configuration for LaserCAM
//!
//! Supports JSON and TOML files. Every section has defaults, so a partial
//! file only overrides what it names.
//!
//! Sections:
//! - Layer names for the cut and engrave roles
//! - Validation tolerance and check toggles
//! - Tessellation accuracy
//! - Sorting, estimation, profile sources and output

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{SettingsError, SettingsResult};

/// Host layer names mapped to the two roles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerConfig {
    pub cut: String,
    pub engrave: String,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            cut: "cut".to_string(),
            engrave: "engrave".to_string(),
        }
    }
}

/// Geometry validation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Absolute geometric tolerance in mm
    pub tolerance: f64,
    pub check_duplicates: bool,
    pub check_planarity: bool,
    pub check_plane_alignment: bool,
    pub check_bounds: bool,
    /// Points compared per curve when looking for duplicates
    pub duplicate_samples: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            tolerance: 0.001,
            check_duplicates: true,
            check_planarity: true,
            check_plane_alignment: true,
            check_bounds: true,
            duplicate_samples: 32,
        }
    }
}

/// Free-form curve flattening
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TessellationConfig {
    /// Maximum chord deviation in mm
    pub chord_tolerance: f64,
    pub min_segments: usize,
    pub max_depth: usize,
}

impl Default for TessellationConfig {
    fn default() -> Self {
        Self {
            chord_tolerance: 0.05,
            min_segments: 8,
            max_depth: 12,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SortingConfig {
    /// Stride of the heat-spreading sort
    pub interleave_stride: usize,
}

impl Default for SortingConfig {
    fn default() -> Self {
        Self {
            interleave_stride: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimateConfig {
    /// Acceleration compensation, multiplied into every estimate
    pub factor: f64,
}

impl Default for EstimateConfig {
    fn default() -> Self {
        Self { factor: 1.0 }
    }
}

/// Where material profiles come from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    /// Primary catalog; the built-in catalog is used when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
    /// Local fallback read when the primary source fails
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_material: Option<String>,
}

impl ProfileConfig {
    /// Configured cache path, else the platform default.
    pub fn cache_path(&self) -> Option<PathBuf> {
        self.cache.clone().or_else(default_cache_path)
    }
}

/// `<config dir>/lasercam/profiles.json`
pub fn default_cache_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("lasercam").join("profiles.json"))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory for output files when no path is given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
    pub extension: String,
    /// Write the job summary comment block at the top of the file
    pub include_summary: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: None,
            extension: "nc".to_string(),
            include_summary: true,
        }
    }
}

/// Complete configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub layers: LayerConfig,
    pub validation: ValidationConfig,
    pub tessellation: TessellationConfig,
    pub sorting: SortingConfig,
    pub estimate: EstimateConfig,
    pub profiles: ProfileConfig,
    pub output: OutputConfig,
}

enum Format {
    Json,
    Toml,
}

fn format_of(path: &Path) -> SettingsResult<Format> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Ok(Format::Json),
        Some("toml") => Ok(Format::Toml),
        other => Err(SettingsError::UnsupportedFormat(
            other.unwrap_or_default().to_string(),
        )),
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = format_of(path)?;
        let content = std::fs::read_to_string(path)
            .map_err(|e| SettingsError::LoadError(format!("{}: {}", path.display(), e)))?;

        let config: Self = match format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match format_of(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| SettingsError::ConfigDirectory(e.to_string()))?;
        }
        std::fs::write(path, content)
            .map_err(|e| SettingsError::SaveError(format!("{}: {}", path.display(), e)))?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> SettingsResult<()> {
        if self.layers.cut.trim().is_empty() {
            return Err(SettingsError::invalid("layers.cut", "must not be empty"));
        }
        if self.layers.engrave.trim().is_empty() {
            return Err(SettingsError::invalid("layers.engrave", "must not be empty"));
        }

        let tolerance = self.validation.tolerance;
        if !(tolerance.is_finite() && tolerance > 0.0) {
            return Err(SettingsError::invalid(
                "validation.tolerance",
                "must be a positive length",
            ));
        }
        if self.validation.duplicate_samples < 2 {
            return Err(SettingsError::invalid(
                "validation.duplicate_samples",
                "must be at least 2",
            ));
        }

        let chord = self.tessellation.chord_tolerance;
        if !(chord.is_finite() && chord > 0.0) {
            return Err(SettingsError::invalid(
                "tessellation.chord_tolerance",
                "must be a positive length",
            ));
        }
        if self.tessellation.min_segments == 0 {
            return Err(SettingsError::invalid(
                "tessellation.min_segments",
                "must be at least 1",
            ));
        }

        if self.sorting.interleave_stride == 0 {
            return Err(SettingsError::invalid(
                "sorting.interleave_stride",
                "must be at least 1",
            ));
        }

        let factor = self.estimate.factor;
        if !(factor.is_finite() && factor > 0.0) {
            return Err(SettingsError::invalid("estimate.factor", "must be positive"));
        }

        let ext = &self.output.extension;
        if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(SettingsError::invalid(
                "output.extension",
                "must be a non-empty alphanumeric extension",
            ));
        }

        Ok(())
    }
}
