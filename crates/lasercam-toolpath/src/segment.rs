//! Motion primitives.

use std::f64::consts::TAU;

use lasercam_core::Point;

/// Distance under which two arc endpoints are the same point.
const SAME_POINT: f64 = 1e-9;

/// Rotation sense of a circular move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArcDirection {
    Clockwise,
    CounterClockwise,
}

impl ArcDirection {
    /// Direction of a parametrisation with the given sweep sign.
    pub fn from_sweep(sweep: f64) -> Self {
        if sweep < 0.0 {
            Self::Clockwise
        } else {
            Self::CounterClockwise
        }
    }

    pub fn gcode(&self) -> &'static str {
        match self {
            Self::Clockwise => "G02",
            Self::CounterClockwise => "G03",
        }
    }
}

/// A single motion primitive. The start point is implied by the previous move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Segment {
    /// Laser-off repositioning move
    Rapid { to: Point },
    /// Straight cut
    Linear { to: Point },
    /// Circular cut around `center`. `to == start` is a full turn, so the
    /// tessellator never emits a partial arc whose ends coincide.
    Arc {
        direction: ArcDirection,
        center: Point,
        radius: f64,
        to: Point,
    },
}

impl Segment {
    pub fn end(&self) -> Point {
        match self {
            Segment::Rapid { to } | Segment::Linear { to } | Segment::Arc { to, .. } => *to,
        }
    }

    pub fn is_rapid(&self) -> bool {
        matches!(self, Segment::Rapid { .. })
    }

    /// Angle subtended by an arc started at `start`, in radians within `(0, 2pi]`.
    pub fn sweep_from(&self, start: &Point) -> Option<f64> {
        let Segment::Arc {
            direction,
            center,
            to,
            ..
        } = self
        else {
            return None;
        };
        if start.approx_eq(to, SAME_POINT) {
            return Some(TAU);
        }
        let a0 = start.angle_from(center);
        let a1 = to.angle_from(center);
        let delta = match direction {
            ArcDirection::CounterClockwise => (a1 - a0).rem_euclid(TAU),
            ArcDirection::Clockwise => (a0 - a1).rem_euclid(TAU),
        };
        Some(if delta == 0.0 { TAU } else { delta })
    }

    /// Path length of this move when started at `start`.
    ///
    /// Arcs measure radius times subtended angle, not the chord.
    pub fn length_from(&self, start: &Point) -> f64 {
        match self {
            Segment::Rapid { to } | Segment::Linear { to } => start.distance_to(to),
            Segment::Arc { radius, .. } => radius * self.sweep_from(start).unwrap_or(0.0),
        }
    }

    /// Check that an arc's center is equidistant from `start` and its end.
    pub fn is_consistent_from(&self, start: &Point, tolerance: f64) -> bool {
        match self {
            Segment::Arc { center, to, .. } => {
                (center.distance_to(start) - center.distance_to(to)).abs() <= tolerance
            }
            _ => true,
        }
    }
}
