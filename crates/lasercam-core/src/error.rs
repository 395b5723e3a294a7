//! Error handling for lasercam
//!
//! Provides error types for every layer of a compiler run:
//! - Geometry errors (degenerate curves, closure mismatches)
//! - Profile errors (material profile retrieval and selection)
//! - Output errors (writing and verifying the G-code file)
//!
//! Invalid geometry found during validation is not an error: it is reported
//! through the validation report and the job statistics. Only the variants
//! below travel through `Result`.

use thiserror::Error;

/// Geometry error type
///
/// Raised per curve while tessellating or assembling the toolpath. The curve
/// is excluded from the job and counted as skipped; the run continues.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// The curve cannot be turned into motion primitives
    #[error("Degenerate {kind} curve: {reason}")]
    Degenerate {
        /// The curve variant name.
        kind: String,
        /// Why the curve was rejected.
        reason: String,
    },

    /// NURBS definition is inconsistent
    #[error("Invalid NURBS definition: {reason}")]
    InvalidNurbs {
        /// What is wrong with the definition.
        reason: String,
    },

    /// A curve marked closed whose tessellated endpoints do not coincide
    #[error("Curve {object} is marked closed but its endpoints are {gap:.6} apart")]
    ClosureMismatch {
        /// The host object id.
        object: String,
        /// Distance between the first and last tessellated point.
        gap: f64,
    },
}

impl GeometryError {
    /// Create a degenerate geometry error
    pub fn degenerate(kind: impl ToString, reason: impl Into<String>) -> Self {
        GeometryError::Degenerate {
            kind: kind.to_string(),
            reason: reason.into(),
        }
    }
}

/// Material profile error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProfileError {
    /// Neither the primary source nor the local cache could be read
    #[error("Material profiles unavailable: {reason}")]
    Unavailable {
        /// The reason retrieval failed.
        reason: String,
    },

    /// The profile server reports itself offline
    #[error("Profile server is offline: {message}")]
    Offline {
        /// Message published by the server.
        message: String,
    },

    /// The catalog requires a newer client
    #[error("lasercam {client} is older than the required version {required}")]
    Outdated {
        /// Version of this build.
        client: String,
        /// Minimum version required by the catalog.
        required: String,
    },

    /// Requested material is not in the catalog
    #[error("Unknown material profile: {name}")]
    UnknownMaterial {
        /// The requested material name.
        name: String,
    },

    /// Operator did not choose a material
    #[error("No material profile selected")]
    NoMaterialSelected,

    /// Catalog data could not be interpreted
    #[error("Invalid profile data: {reason}")]
    Invalid {
        /// The reason the data is invalid.
        reason: String,
    },
}

/// Output file error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OutputError {
    /// Writing the file failed
    #[error("Failed to write {path}: {reason}")]
    WriteFailed {
        /// Target path.
        path: String,
        /// The underlying reason.
        reason: String,
    },

    /// The file does not exist after writing
    #[error("Output file {path} was not created")]
    Missing {
        /// Target path.
        path: String,
    },

    /// The file exists but is empty
    #[error("Output file {path} is empty")]
    Empty {
        /// Target path.
        path: String,
    },

    /// Operator did not pick a save location
    #[error("No save location chosen")]
    NoLocation,
}

/// Main error type for lasercam
///
/// A unified error type that can represent any fatal condition of a run.
#[derive(Error, Debug)]
pub enum Error {
    /// Geometry error
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// Profile error
    #[error(transparent)]
    Profile(#[from] ProfileError),

    /// Output error
    #[error(transparent)]
    Output(#[from] OutputError),

    /// Operator chose to abort at a checkpoint
    #[error("Run aborted by operator at checkpoint: {checkpoint}")]
    Aborted {
        /// Description of the checkpoint.
        checkpoint: String,
    },

    /// Neither a cut nor an engrave layer was selected
    #[error("No cut or engrave layer selected")]
    NoLayerSelected,

    /// The selected layers hold no curves
    #[error("No curve objects found on the selected layers")]
    NoObjects,

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if the run ended because of an operator decision
    pub fn is_abort(&self) -> bool {
        matches!(self, Error::Aborted { .. })
    }

    /// Check if this is a profile error
    pub fn is_profile_error(&self) -> bool {
        matches!(self, Error::Profile(_))
    }

    /// Check if this is an output error
    pub fn is_output_error(&self) -> bool {
        matches!(self, Error::Output(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
