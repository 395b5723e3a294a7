//! Curve tessellation.
//!
//! Turns each curve variant into motion primitives:
//! - lines and polylines map to straight cuts, one per sub-segment
//! - arcs and circles map to a single circular move; full circles get a
//!   closing straight cut so the path ends exactly where it started
//! - an arc too small to survive rounding falls back to straight cuts
//! - ellipses and NURBS are flattened by adaptive chord subdivision
//! - polycurves concatenate the results of their sub-curves in order
//!
//! Every emitted coordinate is rounded to the profile precision.

use std::f64::consts::{PI, TAU};

use lasercam_core::geometry::distance_to_segment;
use lasercam_core::{round_point, CurveGeometry, CurveObject, GeometryError, Point};
use tracing::debug;

use crate::segment::{ArcDirection, Segment};

/// Largest angle between outline samples taken along an arc.
const OUTLINE_ARC_STEP: f64 = PI / 36.0;

/// Sweep deficit under which an arc is treated as a full circle.
const FULL_TURN_SLACK: f64 = 1e-9;

/// Arc length change, in arc tolerances, that rounding may cause.
const ARC_LENGTH_SLACK: f64 = 4.0;

/// Output units two joined sub-curve ends may drift apart.
const JOINT_STEPS: f64 = 3.0;

/// Tessellation parameters
#[derive(Debug, Clone, PartialEq)]
pub struct TessellationSettings {
    /// Absolute tolerance for closure and coincidence tests, mm
    pub tolerance: f64,
    /// Maximum distance between a free-form curve and its chords, mm
    pub chord_tolerance: f64,
    /// Initial number of chords for free-form curves
    pub min_segments: usize,
    /// Maximum recursive subdivision depth per initial chord
    pub max_depth: usize,
    /// Decimal places of emitted coordinates
    pub precision: usize,
}

impl Default for TessellationSettings {
    fn default() -> Self {
        Self {
            tolerance: 0.001,
            chord_tolerance: 0.05,
            min_segments: 8,
            max_depth: 12,
            precision: 3,
        }
    }
}

/// Progress side channel for [`CurveTessellator::tessellate_all`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TessellationProgress {
    pub completed: usize,
    pub total: usize,
}

/// A curve reduced to motion primitives, starting at `start`.
#[derive(Debug, Clone, PartialEq)]
pub struct Tessellation {
    pub start: Point,
    pub segments: Vec<Segment>,
}

impl Tessellation {
    pub fn end(&self) -> Point {
        self.segments.last().map(|s| s.end()).unwrap_or(self.start)
    }

    /// Distance between the first and last point.
    pub fn closure_gap(&self) -> f64 {
        self.start.distance_to(&self.end())
    }

    pub fn is_closed(&self, tolerance: f64) -> bool {
        self.closure_gap() <= tolerance
    }

    /// Total cut length, arcs measured along the curve.
    pub fn length(&self) -> f64 {
        let mut pos = self.start;
        let mut total = 0.0;
        for segment in &self.segments {
            total += segment.length_from(&pos);
            pos = segment.end();
        }
        total
    }

    /// Points along the path, with arcs sampled, for region tests.
    pub fn outline(&self) -> Vec<Point> {
        let mut points = vec![self.start];
        let mut pos = self.start;
        for segment in &self.segments {
            if let Segment::Arc {
                direction,
                center,
                radius,
                to,
            } = segment
            {
                let sweep = segment.sweep_from(&pos).unwrap_or(0.0);
                let steps = (sweep / OUTLINE_ARC_STEP).ceil().max(1.0) as usize;
                let a0 = pos.angle_from(center);
                let sign = match direction {
                    ArcDirection::CounterClockwise => 1.0,
                    ArcDirection::Clockwise => -1.0,
                };
                for k in 1..steps {
                    let a = a0 + sign * sweep * k as f64 / steps as f64;
                    points.push(Point::new(
                        center.x + radius * a.cos(),
                        center.y + radius * a.sin(),
                    ));
                }
                points.push(*to);
            } else {
                points.push(segment.end());
            }
            pos = segment.end();
        }
        points
    }
}

/// Reduces curve geometry to motion primitives
#[derive(Debug, Clone, Default)]
pub struct CurveTessellator {
    settings: TessellationSettings,
}

impl CurveTessellator {
    pub fn new(settings: TessellationSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &TessellationSettings {
        &self.settings
    }

    /// Tessellate every object in order, reporting progress after each one.
    ///
    /// The callback only observes; results do not depend on it.
    pub fn tessellate_all<'a, I, F>(
        &self,
        objects: I,
        mut progress: F,
    ) -> Vec<Result<Tessellation, GeometryError>>
    where
        I: IntoIterator<Item = &'a CurveObject>,
        I::IntoIter: ExactSizeIterator,
        F: FnMut(TessellationProgress),
    {
        let objects = objects.into_iter();
        let total = objects.len();
        objects
            .enumerate()
            .map(|(i, object)| {
                let result = self.tessellate(&object.geometry, object.closed);
                debug!("Tessellated {} {} ({}/{})", object.kind(), object.id, i + 1, total);
                progress(TessellationProgress {
                    completed: i + 1,
                    total,
                });
                result
            })
            .collect()
    }

    /// Tessellate one curve. `closed` is the host's closed flag.
    ///
    /// Geometry that vanishes at output precision is degenerate.
    pub fn tessellate(
        &self,
        geometry: &CurveGeometry,
        closed: bool,
    ) -> Result<Tessellation, GeometryError> {
        geometry.validate()?;

        let tessellation = self.reduce(geometry, closed)?;
        if tessellation.segments.is_empty() {
            return Err(GeometryError::degenerate(
                geometry.kind(),
                "vanishes at output precision",
            ));
        }
        Ok(tessellation)
    }

    /// Motion for one curve. Geometry that collapses at output precision
    /// yields no segments, so a polycurve can drop it.
    fn reduce(
        &self,
        geometry: &CurveGeometry,
        closed: bool,
    ) -> Result<Tessellation, GeometryError> {
        match geometry {
            CurveGeometry::Line { start, end } => {
                self.polyline(geometry, &[*start, *end], false)
            }
            CurveGeometry::Polyline { points } => self.polyline(geometry, points, closed),
            CurveGeometry::Arc {
                center,
                start_angle,
                sweep,
                ..
            } => {
                if sweep.abs() >= TAU - FULL_TURN_SLACK {
                    self.full_turn(center, geometry.start_point(), ArcDirection::from_sweep(*sweep))
                } else {
                    self.partial_arc(geometry, center, start_angle + sweep, *sweep)
                }
            }
            CurveGeometry::Circle { center, ccw, .. } => {
                let direction = if *ccw {
                    ArcDirection::CounterClockwise
                } else {
                    ArcDirection::Clockwise
                };
                self.full_turn(center, geometry.start_point(), direction)
            }
            CurveGeometry::Ellipse { .. } | CurveGeometry::Nurbs { .. } => {
                let points = self.flatten(geometry);
                self.polyline(geometry, &points, closed)
            }
            CurveGeometry::PolyCurve { segments } => self.polycurve(geometry, segments, closed),
        }
    }

    /// Size of one unit in the last emitted decimal.
    fn output_step(&self) -> f64 {
        10f64.powi(-(self.settings.precision as i32))
    }

    /// A full circle: one arc back onto its start plus a closing cut.
    fn full_turn(
        &self,
        center: &Point,
        start: Point,
        direction: ArcDirection,
    ) -> Result<Tessellation, GeometryError> {
        let precision = self.settings.precision;
        let start = round_point(start, precision);
        let center = round_point(*center, precision);

        let radius = center.distance_to(&start);
        if radius <= self.settings.tolerance {
            return Err(GeometryError::degenerate(
                "circle",
                "radius vanishes at output precision",
            ));
        }

        Ok(Tessellation {
            start,
            segments: vec![
                Segment::Arc {
                    direction,
                    center,
                    radius,
                    to: start,
                },
                // Zero length unless the arc end drifted from the start
                Segment::Linear { to: start },
            ],
        })
    }

    /// An arc short of a full turn.
    ///
    /// The end is placed on the circle through the rounded centre and start,
    /// so both ends stay equidistant from the centre after rounding. An arc
    /// whose rounded form would change its sweep (a tiny arc collapsing onto
    /// its start reads as a full turn) is flattened into straight cuts.
    fn partial_arc(
        &self,
        geometry: &CurveGeometry,
        center: &Point,
        end_angle: f64,
        sweep: f64,
    ) -> Result<Tessellation, GeometryError> {
        let precision = self.settings.precision;
        let start = round_point(geometry.start_point(), precision);
        let center = round_point(*center, precision);

        let radius = center.distance_to(&start);
        if radius <= self.settings.tolerance {
            return Err(GeometryError::degenerate(
                "arc",
                "radius vanishes at output precision",
            ));
        }

        let end = round_point(
            Point::new(
                center.x + radius * end_angle.cos(),
                center.y + radius * end_angle.sin(),
            ),
            precision,
        );
        let segment = Segment::Arc {
            direction: ArcDirection::from_sweep(sweep),
            center,
            radius,
            to: end,
        };

        let arc_tolerance = self.settings.tolerance.max(self.output_step());
        let sweep_error = segment
            .sweep_from(&start)
            .map_or(f64::INFINITY, |s| (s - sweep.abs()).abs());
        if !segment.is_consistent_from(&start, arc_tolerance)
            || sweep_error * radius > ARC_LENGTH_SLACK * arc_tolerance
        {
            debug!(
                "Arc of sweep {:.3e} rad at radius {:.3} does not survive rounding, using straight cuts",
                sweep, radius
            );
            let points = self.flatten(geometry);
            return self.polyline(geometry, &points, false);
        }

        Ok(Tessellation {
            start,
            segments: vec![segment],
        })
    }

    fn polyline(
        &self,
        geometry: &CurveGeometry,
        points: &[Point],
        closed: bool,
    ) -> Result<Tessellation, GeometryError> {
        let precision = self.settings.precision;
        let mut rounded = points.iter().map(|p| round_point(*p, precision));
        let start = rounded
            .next()
            .ok_or_else(|| GeometryError::degenerate(geometry.kind(), "no points"))?;

        let mut segments: Vec<Segment> = Vec::with_capacity(points.len());
        let mut last = start;
        for p in rounded {
            if p != last {
                segments.push(Segment::Linear { to: p });
                last = p;
            }
        }

        if closed {
            snap_closed(&mut segments, start, self.settings.tolerance);
        }
        Ok(Tessellation { start, segments })
    }

    fn polycurve(
        &self,
        geometry: &CurveGeometry,
        parts: &[CurveGeometry],
        closed: bool,
    ) -> Result<Tessellation, GeometryError> {
        // Arc ends are re-placed on the rounded circle, so joints may drift a few units
        let joint_tolerance = self.settings.tolerance + JOINT_STEPS * self.output_step();

        let mut result: Option<Tessellation> = None;
        for part in parts {
            let piece = self.reduce(part, false)?;
            match result.as_mut() {
                None => result = Some(piece),
                Some(acc) => {
                    let gap = acc.end().distance_to(&piece.start);
                    if gap > joint_tolerance {
                        return Err(GeometryError::degenerate(
                            geometry.kind(),
                            format!("sub-curves are {gap:.6} apart"),
                        ));
                    }
                    acc.segments.extend(piece.segments);
                }
            }
        }

        let mut tessellation = result
            .ok_or_else(|| GeometryError::degenerate(geometry.kind(), "no segments"))?;
        if closed {
            let start = tessellation.start;
            snap_closed(&mut tessellation.segments, start, joint_tolerance);
        }
        Ok(tessellation)
    }

    /// Adaptive chord subdivision of a free-form curve.
    fn flatten(&self, geometry: &CurveGeometry) -> Vec<Point> {
        let n = self.settings.min_segments.max(1);
        let mut points = vec![geometry.point_at(0.0)];
        for i in 0..n {
            let t0 = i as f64 / n as f64;
            let t1 = (i + 1) as f64 / n as f64;
            self.subdivide(
                geometry,
                (t0, geometry.point_at(t0)),
                (t1, geometry.point_at(t1)),
                0,
                &mut points,
            );
        }
        points
    }

    fn subdivide(
        &self,
        geometry: &CurveGeometry,
        (t0, p0): (f64, Point),
        (t1, p1): (f64, Point),
        depth: usize,
        out: &mut Vec<Point>,
    ) {
        let tm = 0.5 * (t0 + t1);
        let pm = geometry.point_at(tm);
        let error = distance_to_segment(&pm, &p0, &p1);
        if depth < self.settings.max_depth && error > self.settings.chord_tolerance {
            self.subdivide(geometry, (t0, p0), (tm, pm), depth + 1, out);
            self.subdivide(geometry, (tm, pm), (t1, p1), depth + 1, out);
        } else {
            out.push(p1);
        }
    }
}

/// Move the final point onto `start` when it is already within `tolerance`.
///
/// Larger gaps are left alone so the toolpath builder reports them.
fn snap_closed(segments: &mut [Segment], start: Point, tolerance: f64) {
    let Some(last) = segments.last_mut() else {
        return;
    };
    if last.end() == start || last.end().distance_to(&start) > tolerance {
        return;
    }
    match last {
        Segment::Rapid { to } | Segment::Linear { to } | Segment::Arc { to, .. } => *to = start,
    }
}
