//! Geometry validation.
//!
//! Flags curves that must not reach the toolpath: degenerate geometry,
//! curves outside the working area, non-planar curves, curves whose plane is
//! tilted away from the machine's XY plane, and duplicates. Flags are data in
//! the [`ValidationReport`]; deciding whether to continue is up to the caller.

use std::fmt;

use lasercam_core::{CurveGeometry, CurveObject, ObjectId, Point, WorkArea};
use nalgebra::Vector3;
use tracing::warn;

/// Why a curve was flagged
#[derive(Debug, Clone, PartialEq)]
pub enum FlagReason {
    /// Geometry cannot be tessellated
    Degenerate(String),
    /// Bounding box leaves the working area
    OutOfBounds,
    /// Curve points do not share a plane
    NonPlanar,
    /// Curve plane is not parallel to the machine plane
    OffPlane,
    /// Same geometry as an earlier curve
    Duplicate { of: ObjectId },
}

impl FlagReason {
    pub fn kind(&self) -> FlagKind {
        match self {
            FlagReason::Degenerate(_) => FlagKind::Degenerate,
            FlagReason::OutOfBounds => FlagKind::OutOfBounds,
            FlagReason::NonPlanar => FlagKind::NonPlanar,
            FlagReason::OffPlane => FlagKind::OffPlane,
            FlagReason::Duplicate { .. } => FlagKind::Duplicate,
        }
    }
}

impl fmt::Display for FlagReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagReason::Degenerate(reason) => write!(f, "degenerate geometry: {reason}"),
            FlagReason::OutOfBounds => write!(f, "outside the working area"),
            FlagReason::NonPlanar => write!(f, "not planar"),
            FlagReason::OffPlane => write!(f, "not parallel to the machine plane"),
            FlagReason::Duplicate { of } => write!(f, "duplicate of {of}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlagKind {
    Degenerate,
    OutOfBounds,
    NonPlanar,
    OffPlane,
    Duplicate,
}

/// One flagged curve
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationFlag {
    /// Index into the validated slice
    pub index: usize,
    pub object: ObjectId,
    pub reason: FlagReason,
}

/// Outcome of validating a curve set. Each curve carries at most one flag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub flags: Vec<ValidationFlag>,
    total: usize,
}

impl ValidationReport {
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_clean(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn flags_of(&self, kind: FlagKind) -> impl Iterator<Item = &ValidationFlag> {
        self.flags.iter().filter(move |f| f.reason.kind() == kind)
    }

    pub fn count(&self, kind: FlagKind) -> usize {
        self.flags_of(kind).count()
    }

    /// Indices of curves without any flag
    pub fn valid_objects(&self) -> Vec<usize> {
        (0..self.total)
            .filter(|i| !self.flags.iter().any(|f| f.index == *i))
            .collect()
    }

    /// Indices of curves flagged for anything but the working area
    pub fn skipped_objects(&self) -> Vec<usize> {
        self.flags
            .iter()
            .filter(|f| f.reason.kind() != FlagKind::OutOfBounds)
            .map(|f| f.index)
            .collect()
    }

    pub fn skipped_out_of_bounds_objects(&self) -> Vec<usize> {
        self.flags_of(FlagKind::OutOfBounds).map(|f| f.index).collect()
    }
}

/// Validation parameters. Disabled checks never flag.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationSettings {
    /// Absolute geometric tolerance, mm
    pub tolerance: f64,
    pub check_duplicates: bool,
    pub check_planarity: bool,
    pub check_plane_alignment: bool,
    pub check_bounds: bool,
    /// Points compared per curve in the duplicate test
    pub duplicate_samples: usize,
    pub work_area: WorkArea,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            tolerance: 0.001,
            check_duplicates: true,
            check_planarity: true,
            check_plane_alignment: true,
            check_bounds: true,
            duplicate_samples: 32,
            work_area: WorkArea::default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GeometryValidator {
    settings: ValidationSettings,
}

impl GeometryValidator {
    pub fn new(settings: ValidationSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ValidationSettings {
        &self.settings
    }

    /// Validate every curve. The first of a set of duplicates is kept.
    pub fn validate(&self, objects: &[CurveObject]) -> ValidationReport {
        let mut flags: Vec<Option<FlagReason>> =
            objects.iter().map(|o| self.check_single(o)).collect();

        if self.settings.check_duplicates {
            let count = self.settings.duplicate_samples;
            let samples: Vec<Samples> = objects
                .iter()
                .map(|o| Samples {
                    coarse: o.geometry.sample(count),
                    dense: o.geometry.sample(count * DENSE_FACTOR),
                })
                .collect();

            for j in 0..objects.len() {
                if flags[j].is_some() {
                    continue;
                }
                for i in 0..j {
                    if flags[i].is_some() {
                        continue;
                    }
                    if self.same_geometry(&objects[i], &samples[i], &objects[j], &samples[j]) {
                        flags[j] = Some(FlagReason::Duplicate { of: objects[i].id });
                        break;
                    }
                }
            }
        }

        let flags: Vec<ValidationFlag> = flags
            .into_iter()
            .enumerate()
            .filter_map(|(index, reason)| {
                reason.map(|reason| ValidationFlag {
                    index,
                    object: objects[index].id,
                    reason,
                })
            })
            .collect();

        for flag in &flags {
            warn!("Curve {} flagged: {}", flag.object, flag.reason);
        }

        ValidationReport {
            flags,
            total: objects.len(),
        }
    }

    fn check_single(&self, object: &CurveObject) -> Option<FlagReason> {
        let tol = self.settings.tolerance;

        if let Err(e) = object.geometry.validate() {
            return Some(FlagReason::Degenerate(e.to_string()));
        }

        if self.settings.check_bounds {
            let b = &object.bounding_box;
            let area = &self.settings.work_area;
            if b.min_x < -tol
                || b.min_y < -tol
                || b.max_x > area.max_x + tol
                || b.max_y > area.max_y + tol
            {
                return Some(FlagReason::OutOfBounds);
            }
        }

        if self.settings.check_planarity && !object.planar {
            return Some(FlagReason::NonPlanar);
        }

        if self.settings.check_plane_alignment {
            if let Some(normal) = object.plane_normal {
                if !is_machine_plane(&normal, tol) {
                    return Some(FlagReason::OffPlane);
                }
            }
        }

        None
    }

    /// Two curves are duplicates when each one's samples lie on the other,
    /// whatever their start point or direction.
    fn same_geometry(
        &self,
        a: &CurveObject,
        a_samples: &Samples,
        b: &CurveObject,
        b_samples: &Samples,
    ) -> bool {
        let tol = self.settings.tolerance;
        if !a.bounding_box.contains_box(&b.bounding_box, tol)
            || !b.bounding_box.contains_box(&a.bounding_box, tol)
        {
            return false;
        }
        a_samples
            .coarse
            .iter()
            .all(|p| lies_on(p, &b.geometry, &b_samples.dense, tol))
            && b_samples
                .coarse
                .iter()
                .all(|p| lies_on(p, &a.geometry, &a_samples.dense, tol))
    }
}

/// Dense samples per coarse sample, used to seed the nearest-point search.
const DENSE_FACTOR: usize = 8;

/// Refinement steps of the nearest-point search.
const NEAREST_STEPS: usize = 48;

struct Samples {
    coarse: Vec<Point>,
    dense: Vec<Point>,
}

/// Check whether `p` is within `tol` of `geometry`.
///
/// The nearest dense sample brackets the closest parameter, which is then
/// narrowed by ternary search.
fn lies_on(p: &Point, geometry: &CurveGeometry, dense: &[Point], tol: f64) -> bool {
    let Some((nearest, distance)) = dense
        .iter()
        .map(|q| p.distance_to(q))
        .enumerate()
        .min_by(|x, y| x.1.total_cmp(&y.1))
    else {
        return false;
    };
    if distance <= tol {
        return true;
    }

    let last = dense.len().saturating_sub(1).max(1) as f64;
    let mut lo = nearest.saturating_sub(1) as f64 / last;
    let mut hi = ((nearest + 1) as f64 / last).min(1.0);
    for _ in 0..NEAREST_STEPS {
        let m1 = lo + (hi - lo) / 3.0;
        let m2 = hi - (hi - lo) / 3.0;
        if p.distance_to(&geometry.point_at(m1)) < p.distance_to(&geometry.point_at(m2)) {
            hi = m2;
        } else {
            lo = m1;
        }
    }
    p.distance_to(&geometry.point_at(0.5 * (lo + hi))) <= tol
}

/// A plane is the machine plane when its normal is parallel to Z either way up.
fn is_machine_plane(normal: &Vector3<f64>, tolerance: f64) -> bool {
    let Some(unit) = normal.try_normalize(f64::EPSILON) else {
        return true;
    };
    unit.dot(&Vector3::z()).abs() >= 1.0 - tolerance
}
