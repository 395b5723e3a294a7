//! Material profile sources.
//!
//! A catalog is fetched from a primary source. When that fails the local
//! cache is read instead; the run only fails when both do. Catalog
//! availability (offline flag, minimum client version) is checked after
//! loading and is never retried against the cache.

use std::path::{Path, PathBuf};

use lasercam_core::{init_standard_catalog, ProfileCatalog, ProfileError};
use tracing::{info, warn};

/// Something that can produce a profile catalog
pub trait ProfileSource {
    /// Human readable origin, used in logs.
    fn describe(&self) -> String;

    fn load(&self) -> Result<ProfileCatalog, ProfileError>;
}

/// Catalog stored as a JSON file
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProfileSource for JsonFileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> Result<ProfileCatalog, ProfileError> {
        let unavailable = |reason: String| ProfileError::Unavailable {
            reason: format!("{}: {}", self.path.display(), reason),
        };
        let content = std::fs::read_to_string(&self.path).map_err(|e| unavailable(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| unavailable(e.to_string()))
    }
}

/// The catalog compiled into the binary
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinSource;

impl ProfileSource for BuiltinSource {
    fn describe(&self) -> String {
        "built-in catalog".to_string()
    }

    fn load(&self) -> Result<ProfileCatalog, ProfileError> {
        Ok(init_standard_catalog())
    }
}

/// Primary source with a read-only local fallback
pub struct FallbackProvider {
    primary: Box<dyn ProfileSource>,
    cache: Option<Box<dyn ProfileSource>>,
}

impl FallbackProvider {
    pub fn new(primary: Box<dyn ProfileSource>) -> Self {
        Self {
            primary,
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: Box<dyn ProfileSource>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Load the catalog and check that `client_version` may use it.
    pub fn load_catalog(&self, client_version: &str) -> Result<ProfileCatalog, ProfileError> {
        let catalog = match self.primary.load() {
            Ok(catalog) => {
                info!("Loaded profiles from {}", self.primary.describe());
                catalog
            }
            Err(primary_err) => {
                let Some(cache) = &self.cache else {
                    return Err(primary_err);
                };
                warn!(
                    "Profile source {} unavailable ({}), using cache {}",
                    self.primary.describe(),
                    primary_err,
                    cache.describe()
                );
                cache.load().map_err(|cache_err| ProfileError::Unavailable {
                    reason: format!("{primary_err}; cache: {cache_err}"),
                })?
            }
        };

        catalog.check_available(client_version)?;
        Ok(catalog)
    }
}
