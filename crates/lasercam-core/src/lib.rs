//! # lasercam Core
//!
//! Core types shared by the lasercam crates.
//! Provides the planar geometry primitives, read-only curve snapshots taken
//! from the host CAD document, the host document capability trait, material
//! profile data and the error taxonomy used across the compiler.

pub mod curve;
pub mod data;
pub mod document;
pub mod error;
pub mod geometry;
pub mod units;

pub use curve::{CurveGeometry, CurveKind, CurveObject, LayerRole, ObjectId};

pub use data::materials::{
    init_standard_catalog, LayerSettings, MaterialProfile, ProfileCatalog, WorkArea,
};

pub use document::{capture_layer, DocumentObject, HostDocument, MemoryDocument};

pub use error::{Error, GeometryError, OutputError, ProfileError, Result};

pub use geometry::{BoundingBox, Containment, Point};

pub use units::{format_fixed, round_half_away, round_point};
