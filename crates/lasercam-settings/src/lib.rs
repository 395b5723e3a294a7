//! LaserCAM Settings Crate
//!
//! Configuration files and material profile sources.

pub mod config;
pub mod error;
pub mod profiles;

pub use config::{
    default_cache_path, Config, EstimateConfig, LayerConfig, OutputConfig, ProfileConfig,
    SortingConfig, TessellationConfig, ValidationConfig,
};
pub use error::{SettingsError, SettingsResult};
pub use profiles::{BuiltinSource, FallbackProvider, JsonFileSource, ProfileSource};
