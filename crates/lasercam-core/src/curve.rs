//! Curve snapshots
//!
//! A [`CurveObject`] is a value copy of one curve taken from the host
//! document when a run starts. The compiler never holds live handles into
//! the host; parent and child links are indices into the flat arena of
//! snapshots owned by the job.

use std::f64::consts::{PI, TAU};
use std::fmt;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::GeometryError;
use crate::geometry::{BoundingBox, Point};

/// Sample count used for bounding boxes of free-form curves.
const BOUNDS_SAMPLES: usize = 256;

/// Slack allowed on arc sweeps beyond a full turn.
const SWEEP_SLACK: f64 = 1e-9;

/// Role of a layer in the job. Engraving always runs before cutting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerRole {
    Engrave,
    Cut,
}

impl LayerRole {
    /// Both roles in emission order.
    pub const ALL: [LayerRole; 2] = [LayerRole::Engrave, LayerRole::Cut];

    /// Layer name recognised for this role when none is configured.
    pub fn default_layer_name(&self) -> &'static str {
        match self {
            Self::Engrave => "engrave",
            Self::Cut => "cut",
        }
    }

    /// Comment line opening this role's G-code section.
    pub fn section_comment(&self) -> &'static str {
        match self {
            Self::Engrave => "(Engraving commands)",
            Self::Cut => "(Cutting commands)",
        }
    }
}

impl fmt::Display for LayerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Engrave => write!(f, "Engrave"),
            Self::Cut => write!(f, "Cut"),
        }
    }
}

/// Identifier of a host document object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub Uuid);

impl ObjectId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for ObjectId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Curve variant tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveKind {
    Line,
    Polyline,
    Arc,
    Circle,
    Ellipse,
    Nurbs,
    PolyCurve,
}

impl fmt::Display for CurveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Line => "line",
            Self::Polyline => "polyline",
            Self::Arc => "arc",
            Self::Circle => "circle",
            Self::Ellipse => "ellipse",
            Self::Nurbs => "nurbs",
            Self::PolyCurve => "polycurve",
        };
        f.write_str(name)
    }
}

/// Planar curve geometry as read from the host.
///
/// Angles are radians. A positive `sweep` runs counter-clockwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CurveGeometry {
    Line {
        start: Point,
        end: Point,
    },
    Polyline {
        points: Vec<Point>,
    },
    Arc {
        center: Point,
        radius: f64,
        start_angle: f64,
        sweep: f64,
    },
    Circle {
        center: Point,
        radius: f64,
        #[serde(default)]
        start_angle: f64,
        #[serde(default = "default_ccw")]
        ccw: bool,
    },
    Ellipse {
        center: Point,
        rx: f64,
        ry: f64,
        #[serde(default)]
        rotation: f64,
        #[serde(default)]
        start_angle: f64,
        #[serde(default = "default_full_sweep")]
        sweep: f64,
    },
    Nurbs {
        degree: usize,
        control_points: Vec<Point>,
        /// Empty means every weight is 1.
        #[serde(default)]
        weights: Vec<f64>,
        /// Empty means a clamped uniform knot vector.
        #[serde(default)]
        knots: Vec<f64>,
    },
    PolyCurve {
        segments: Vec<CurveGeometry>,
    },
}

fn default_ccw() -> bool {
    true
}

fn default_full_sweep() -> f64 {
    TAU
}

impl CurveGeometry {
    pub fn kind(&self) -> CurveKind {
        match self {
            Self::Line { .. } => CurveKind::Line,
            Self::Polyline { .. } => CurveKind::Polyline,
            Self::Arc { .. } => CurveKind::Arc,
            Self::Circle { .. } => CurveKind::Circle,
            Self::Ellipse { .. } => CurveKind::Ellipse,
            Self::Nurbs { .. } => CurveKind::Nurbs,
            Self::PolyCurve { .. } => CurveKind::PolyCurve,
        }
    }

    /// Reject geometry that cannot be turned into motion.
    pub fn validate(&self) -> Result<(), GeometryError> {
        let kind = self.kind();
        match self {
            Self::Line { start, end } => {
                if start == end {
                    return Err(GeometryError::degenerate(kind, "zero length"));
                }
            }
            Self::Polyline { points } => {
                if points.len() < 2 {
                    return Err(GeometryError::degenerate(kind, "fewer than two points"));
                }
            }
            Self::Arc { radius, sweep, .. } => {
                if radius.is_nan() || *radius <= 0.0 {
                    return Err(GeometryError::degenerate(kind, "radius must be positive"));
                }
                if *sweep == 0.0 || sweep.abs() > TAU + SWEEP_SLACK {
                    return Err(GeometryError::degenerate(
                        kind,
                        format!("sweep {sweep} outside (0, 2pi]"),
                    ));
                }
            }
            Self::Circle { radius, .. } => {
                if radius.is_nan() || *radius <= 0.0 {
                    return Err(GeometryError::degenerate(kind, "radius must be positive"));
                }
            }
            Self::Ellipse { rx, ry, sweep, .. } => {
                if rx.is_nan() || ry.is_nan() || *rx <= 0.0 || *ry <= 0.0 {
                    return Err(GeometryError::degenerate(kind, "radii must be positive"));
                }
                if *sweep == 0.0 || sweep.abs() > TAU + SWEEP_SLACK {
                    return Err(GeometryError::degenerate(
                        kind,
                        format!("sweep {sweep} outside (0, 2pi]"),
                    ));
                }
            }
            Self::Nurbs {
                degree,
                control_points,
                weights,
                knots,
            } => validate_nurbs(*degree, control_points, weights, knots)?,
            Self::PolyCurve { segments } => {
                if segments.is_empty() {
                    return Err(GeometryError::degenerate(kind, "no segments"));
                }
                for segment in segments {
                    segment.validate()?;
                }
            }
        }
        Ok(())
    }

    /// Evaluate the curve at normalised parameter `t` in `[0, 1]`.
    pub fn point_at(&self, t: f64) -> Point {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Line { start, end } => start.lerp(end, t),
            Self::Polyline { points } => match points.len() {
                0 => Point::origin(),
                1 => points[0],
                n => {
                    let scaled = t * (n - 1) as f64;
                    let i = (scaled.floor() as usize).min(n - 2);
                    points[i].lerp(&points[i + 1], scaled - i as f64)
                }
            },
            Self::Arc {
                center,
                radius,
                start_angle,
                sweep,
            } => polar(center, *radius, start_angle + sweep * t),
            Self::Circle {
                center,
                radius,
                start_angle,
                ccw,
            } => {
                let sweep = if *ccw { TAU } else { -TAU };
                polar(center, *radius, start_angle + sweep * t)
            }
            Self::Ellipse {
                center,
                rx,
                ry,
                rotation,
                start_angle,
                sweep,
            } => ellipse_point(center, *rx, *ry, *rotation, start_angle + sweep * t),
            Self::Nurbs {
                degree,
                control_points,
                weights,
                knots,
            } => nurbs_point(*degree, control_points, weights, knots, t),
            Self::PolyCurve { segments } => {
                if segments.is_empty() {
                    return Point::origin();
                }
                let k = segments.len();
                let scaled = t * k as f64;
                let i = (scaled.floor() as usize).min(k - 1);
                segments[i].point_at(scaled - i as f64)
            }
        }
    }

    pub fn start_point(&self) -> Point {
        self.point_at(0.0)
    }

    pub fn end_point(&self) -> Point {
        self.point_at(1.0)
    }

    /// Evaluate `count` evenly spaced parameters, endpoints included.
    pub fn sample(&self, count: usize) -> Vec<Point> {
        let count = count.max(2);
        (0..count)
            .map(|i| self.point_at(i as f64 / (count - 1) as f64))
            .collect()
    }

    /// Check whether the curve returns to its start point.
    pub fn is_closed(&self, tolerance: f64) -> bool {
        match self {
            Self::Circle { .. } => true,
            Self::Line { .. } => false,
            _ => self.start_point().approx_eq(&self.end_point(), tolerance),
        }
    }

    pub fn bounding_box(&self) -> BoundingBox {
        match self {
            Self::Line { start, end } => BoundingBox::new(
                start.x.min(end.x),
                start.y.min(end.y),
                start.x.max(end.x),
                start.y.max(end.y),
            ),
            Self::Polyline { points } => BoundingBox::from_points(points)
                .unwrap_or_else(|| BoundingBox::new(0.0, 0.0, 0.0, 0.0)),
            Self::Circle { center, radius, .. } => BoundingBox::new(
                center.x - radius,
                center.y - radius,
                center.x + radius,
                center.y + radius,
            ),
            Self::Arc {
                center,
                radius,
                start_angle,
                sweep,
            } => arc_bounds(center, *radius, *start_angle, *sweep),
            Self::PolyCurve { segments } => segments
                .iter()
                .map(|s| s.bounding_box())
                .reduce(|a, b| a.union(&b))
                .unwrap_or_else(|| BoundingBox::new(0.0, 0.0, 0.0, 0.0)),
            Self::Ellipse { .. } | Self::Nurbs { .. } => {
                BoundingBox::from_points(&self.sample(BOUNDS_SAMPLES))
                    .unwrap_or_else(|| BoundingBox::new(0.0, 0.0, 0.0, 0.0))
            }
        }
    }
}

fn polar(center: &Point, radius: f64, angle: f64) -> Point {
    Point::new(
        center.x + radius * angle.cos(),
        center.y + radius * angle.sin(),
    )
}

pub(crate) fn ellipse_point(center: &Point, rx: f64, ry: f64, rotation: f64, angle: f64) -> Point {
    let lx = rx * angle.cos();
    let ly = ry * angle.sin();
    let (sin_r, cos_r) = rotation.sin_cos();
    Point::new(
        center.x + lx * cos_r - ly * sin_r,
        center.y + lx * sin_r + ly * cos_r,
    )
}

/// Exact bounds of an arc: its endpoints plus every axis extreme it crosses.
fn arc_bounds(center: &Point, radius: f64, start_angle: f64, sweep: f64) -> BoundingBox {
    let start = polar(center, radius, start_angle);
    let mut bbox = BoundingBox::new(start.x, start.y, start.x, start.y);
    bbox.include(&polar(center, radius, start_angle + sweep));

    let (lo, hi) = if sweep >= 0.0 {
        (start_angle, start_angle + sweep)
    } else {
        (start_angle + sweep, start_angle)
    };
    let mut k = (lo / (PI / 2.0)).ceil();
    while k * (PI / 2.0) <= hi {
        bbox.include(&polar(center, radius, k * (PI / 2.0)));
        k += 1.0;
    }
    bbox
}

fn validate_nurbs(
    degree: usize,
    control_points: &[Point],
    weights: &[f64],
    knots: &[f64],
) -> Result<(), GeometryError> {
    let n = control_points.len();
    if degree == 0 {
        return Err(GeometryError::InvalidNurbs {
            reason: "degree must be at least 1".to_string(),
        });
    }
    if n <= degree {
        return Err(GeometryError::InvalidNurbs {
            reason: format!("{n} control points cannot carry degree {degree}"),
        });
    }
    if !weights.is_empty() {
        if weights.len() != n {
            return Err(GeometryError::InvalidNurbs {
                reason: format!("{} weights for {n} control points", weights.len()),
            });
        }
        if weights.iter().any(|w| w.is_nan() || *w <= 0.0) {
            return Err(GeometryError::InvalidNurbs {
                reason: "weights must be positive".to_string(),
            });
        }
    }
    if !knots.is_empty() {
        if knots.len() != n + degree + 1 {
            return Err(GeometryError::InvalidNurbs {
                reason: format!("expected {} knots, found {}", n + degree + 1, knots.len()),
            });
        }
        if knots.windows(2).any(|w| w[1] < w[0]) {
            return Err(GeometryError::InvalidNurbs {
                reason: "knot vector must be non-decreasing".to_string(),
            });
        }
        if knots[n] <= knots[degree] {
            return Err(GeometryError::InvalidNurbs {
                reason: "empty parameter domain".to_string(),
            });
        }
    }
    Ok(())
}

fn clamped_uniform_knots(degree: usize, count: usize) -> Vec<f64> {
    let interior = count.saturating_sub(degree + 1);
    let mut knots = vec![0.0; degree + 1];
    for i in 1..=interior {
        knots.push(i as f64 / (interior + 1) as f64);
    }
    knots.extend(std::iter::repeat(1.0).take(degree + 1));
    knots
}

/// Rational de Boor evaluation at normalised parameter `t`.
fn nurbs_point(
    degree: usize,
    control_points: &[Point],
    weights: &[f64],
    knots: &[f64],
    t: f64,
) -> Point {
    let n = control_points.len();
    if n == 0 {
        return Point::origin();
    }
    if degree == 0 || n <= degree {
        return control_points[0];
    }

    let generated;
    let knots = if knots.len() == n + degree + 1 {
        knots
    } else {
        generated = clamped_uniform_knots(degree, n);
        &generated[..]
    };
    let weight = |i: usize| weights.get(i).copied().unwrap_or(1.0);

    let (u0, u1) = (knots[degree], knots[n]);
    let u = u0 + (u1 - u0) * t;

    let mut span = degree;
    while span < n - 1 && knots[span + 1] <= u {
        span += 1;
    }

    // Homogeneous coordinates (w*x, w*y, w)
    let mut d: Vec<[f64; 3]> = (0..=degree)
        .map(|j| {
            let i = j + span - degree;
            let w = weight(i);
            [control_points[i].x * w, control_points[i].y * w, w]
        })
        .collect();

    for r in 1..=degree {
        for j in (r..=degree).rev() {
            let i = j + span - degree;
            let denom = knots[i + degree - r + 1] - knots[i];
            let alpha = if denom.abs() < f64::EPSILON {
                0.0
            } else {
                (u - knots[i]) / denom
            };
            for c in 0..3 {
                d[j][c] = (1.0 - alpha) * d[j - 1][c] + alpha * d[j][c];
            }
        }
    }

    let [x, y, w] = d[degree];
    if w.abs() < f64::EPSILON {
        return Point::new(x, y);
    }
    Point::new(x / w, y / w)
}

/// Read-only snapshot of one host curve plus the metadata the compiler derives.
#[derive(Debug, Clone)]
pub struct CurveObject {
    pub id: ObjectId,
    pub layer: LayerRole,
    /// Host layer name the curve was captured from.
    pub layer_name: String,
    pub geometry: CurveGeometry,
    pub closed: bool,
    pub bounding_box: BoundingBox,
    pub planar: bool,
    /// Unit normal of the curve's plane, `None` when the host cannot tell.
    pub plane_normal: Option<Vector3<f64>>,
    /// Arena index of the enclosing curve.
    pub parent: Option<usize>,
    /// Arena indices of directly contained curves.
    pub children: Vec<usize>,
}

impl CurveObject {
    /// Snapshot a planar curve lying in the XY plane.
    pub fn new(id: ObjectId, layer: LayerRole, geometry: CurveGeometry, tolerance: f64) -> Self {
        Self {
            id,
            layer,
            layer_name: layer.default_layer_name().to_string(),
            closed: geometry.is_closed(tolerance),
            bounding_box: geometry.bounding_box(),
            geometry,
            planar: true,
            plane_normal: Some(Vector3::z()),
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn kind(&self) -> CurveKind {
        self.geometry.kind()
    }

    pub fn is_top_level(&self) -> bool {
        self.parent.is_none()
    }
}
