//! Material profile catalog
//!
//! This module provides:
//! - Per-layer laser settings (feed rate, power, pulse frequency)
//! - Named material profiles with coordinate precision and slew speed
//! - The profile catalog published by the profile server, with its
//!   working area, startup and shutdown templates and availability flags
//! - A built-in catalog used when no profile source is configured

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::curve::LayerRole;
use crate::error::ProfileError;

/// Slew speed in mm/s used when a profile does not give one
pub const DEFAULT_SLEW_SPEED: f64 = 45.0;

/// Coordinate decimals used when a profile does not give one
pub const DEFAULT_PRECISION: usize = 3;

/// Highest coordinate precision a profile may request
pub const MAX_PRECISION: usize = 6;

/// Laser settings for one layer role
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayerSettings {
    /// Feed rate in mm/s
    pub feed_rate: f64,
    /// Laser power, emitted as `G97 S<power>`
    pub power: u32,
    /// Pulse frequency, emitted as `G98 P265 E<pulse>`
    pub pulse: u32,
}

impl LayerSettings {
    pub fn new(feed_rate: f64, power: u32, pulse: u32) -> Self {
        Self {
            feed_rate,
            power,
            pulse,
        }
    }
}

fn default_slew_speed() -> f64 {
    DEFAULT_SLEW_SPEED
}

fn default_precision() -> usize {
    DEFAULT_PRECISION
}

/// Named cutting configuration for one sheet material.
///
/// Immutable for the duration of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialProfile {
    /// Material name, also appended to the output file name
    pub name: String,
    /// Rapid move speed in mm/s
    #[serde(default = "default_slew_speed")]
    pub slew_speed: f64,
    /// Decimal places of emitted coordinates
    #[serde(default = "default_precision")]
    pub precision: usize,
    /// Sheet warps under concentrated heat (acrylic and similar)
    #[serde(default)]
    pub heat_sensitive: bool,
    pub cut: LayerSettings,
    pub engrave: LayerSettings,
    /// Startup G-code emitted verbatim before the first section
    #[serde(default)]
    pub header: String,
    /// Shutdown G-code emitted verbatim after the last section
    #[serde(default)]
    pub footer: String,
}

impl MaterialProfile {
    /// Create a profile with default slew speed and precision
    pub fn new(name: impl Into<String>, cut: LayerSettings, engrave: LayerSettings) -> Self {
        Self {
            name: name.into(),
            slew_speed: DEFAULT_SLEW_SPEED,
            precision: DEFAULT_PRECISION,
            heat_sensitive: false,
            cut,
            engrave,
            header: String::new(),
            footer: String::new(),
        }
    }

    /// Settings for a layer role
    pub fn layer(&self, role: LayerRole) -> &LayerSettings {
        match role {
            LayerRole::Cut => &self.cut,
            LayerRole::Engrave => &self.engrave,
        }
    }

    /// Check that speeds are usable and precision is in range
    pub fn validate(&self) -> Result<(), ProfileError> {
        let invalid = |reason: String| ProfileError::Invalid { reason };

        if self.name.trim().is_empty() {
            return Err(invalid("material name is empty".to_string()));
        }
        if !(self.slew_speed.is_finite() && self.slew_speed > 0.0) {
            return Err(invalid(format!(
                "{}: slew speed must be positive",
                self.name
            )));
        }
        for role in LayerRole::ALL {
            let feed = self.layer(role).feed_rate;
            if !(feed.is_finite() && feed > 0.0) {
                return Err(invalid(format!(
                    "{}: {} feed rate must be positive",
                    self.name, role
                )));
            }
        }
        if self.precision > MAX_PRECISION {
            return Err(invalid(format!(
                "{}: precision {} exceeds {}",
                self.name, self.precision, MAX_PRECISION
            )));
        }
        Ok(())
    }
}

/// Machine working area, origin at (0, 0)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorkArea {
    pub max_x: f64,
    pub max_y: f64,
}

impl Default for WorkArea {
    fn default() -> Self {
        Self {
            max_x: 1000.0,
            max_y: 600.0,
        }
    }
}

/// Document published by the profile server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileCatalog {
    #[serde(default)]
    pub name: String,
    /// Server is taken down for maintenance
    #[serde(default)]
    pub offline: bool,
    #[serde(default)]
    pub offline_message: String,
    /// Oldest client version allowed to use this catalog
    #[serde(default)]
    pub minimum_version: Option<String>,
    /// Where newer clients can be downloaded
    #[serde(default)]
    pub update_address: Option<String>,
    #[serde(default)]
    pub work_area: WorkArea,
    /// Startup G-code shared by all materials
    #[serde(default)]
    pub startup: String,
    /// Shutdown G-code shared by all materials
    #[serde(default)]
    pub shutdown: String,
    #[serde(default)]
    pub materials: Vec<MaterialProfile>,
}

impl ProfileCatalog {
    /// Look up a material by name, ignoring case and surrounding whitespace.
    ///
    /// A profile without its own header or footer inherits the catalog's
    /// startup and shutdown templates.
    pub fn material(&self, name: &str) -> Result<MaterialProfile, ProfileError> {
        let wanted = name.trim().to_lowercase();
        let found = self
            .materials
            .iter()
            .find(|m| m.name.trim().to_lowercase() == wanted)
            .ok_or_else(|| ProfileError::UnknownMaterial {
                name: name.to_string(),
            })?;

        let mut profile = found.clone();
        if profile.header.is_empty() {
            profile.header = self.startup.clone();
        }
        if profile.footer.is_empty() {
            profile.footer = self.shutdown.clone();
        }
        profile.validate()?;
        Ok(profile)
    }

    pub fn material_names(&self) -> Vec<String> {
        self.materials.iter().map(|m| m.name.clone()).collect()
    }

    /// Refuse catalogs that are offline or require a newer client
    pub fn check_available(&self, client_version: &str) -> Result<(), ProfileError> {
        if self.offline {
            return Err(ProfileError::Offline {
                message: self.offline_message.clone(),
            });
        }
        if let Some(required) = &self.minimum_version {
            if compare_versions(required, client_version) == Ordering::Greater {
                return Err(ProfileError::Outdated {
                    client: client_version.to_string(),
                    required: required.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Compare dotted numeric versions, ignoring any pre-release suffix.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    fn parts(v: &str) -> Vec<u64> {
        v.trim()
            .split(['-', '+'])
            .next()
            .unwrap_or("")
            .split('.')
            .map(|p| p.parse().unwrap_or(0))
            .collect()
    }

    let (pa, pb) = (parts(a), parts(b));
    let len = pa.len().max(pb.len());
    for i in 0..len {
        let x = pa.get(i).copied().unwrap_or(0);
        let y = pb.get(i).copied().unwrap_or(0);
        match x.cmp(&y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

/// Built-in catalog with a few common sheet materials
pub fn init_standard_catalog() -> ProfileCatalog {
    let mut acrylic = MaterialProfile::new(
        "Acrylic 3mm",
        LayerSettings::new(8.0, 90, 5000),
        LayerSettings::new(120.0, 20, 5000),
    );
    acrylic.heat_sensitive = true;

    let plywood = MaterialProfile::new(
        "Plywood 4mm",
        LayerSettings::new(12.0, 100, 1000),
        LayerSettings::new(150.0, 25, 1000),
    );

    let cardboard = MaterialProfile::new(
        "Cardboard",
        LayerSettings::new(40.0, 60, 2000),
        LayerSettings::new(200.0, 15, 2000),
    );

    ProfileCatalog {
        name: "standard".to_string(),
        offline: false,
        offline_message: String::new(),
        minimum_version: None,
        update_address: None,
        work_area: WorkArea::default(),
        startup: "G90\nG21".to_string(),
        shutdown: "M22\nG00 X0 Y0\nM30".to_string(),
        materials: vec![acrylic, plywood, cardboard],
    }
}
