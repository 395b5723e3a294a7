use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_2, PI, TAU};

use approx::assert_relative_eq;
use lasercam_core::{CurveGeometry, LayerRole, Point};
use proptest::prelude::*;
use lasercam_toolpath::{ArcDirection, CurveTessellator, Segment, TessellationSettings};

use super::support::{circle, object, rect, TOL};

#[test]
fn test_square_tessellates_to_four_cuts() {
    let t = CurveTessellator::default()
        .tessellate(&rect(0.0, 0.0, 100.0, 100.0), true)
        .unwrap();
    assert_eq!(t.segments.len(), 4);
    assert!(t.segments.iter().all(|s| matches!(s, Segment::Linear { .. })));
    assert!(t.is_closed(TOL));
    assert_relative_eq!(t.length(), 400.0);
}

#[test]
fn test_quarter_arc_is_one_move() {
    let arc = CurveGeometry::Arc {
        center: Point::new(0.0, 0.0),
        radius: 10.0,
        start_angle: 0.0,
        sweep: -FRAC_PI_2,
    };
    let t = CurveTessellator::default().tessellate(&arc, false).unwrap();

    assert_eq!(t.start, Point::new(10.0, 0.0));
    assert_eq!(t.segments.len(), 1);
    match t.segments[0] {
        Segment::Arc { direction, to, .. } => {
            assert_eq!(direction, ArcDirection::Clockwise);
            assert_eq!(to, Point::new(0.0, -10.0));
        }
        other => panic!("expected an arc, got {other:?}"),
    }
    assert_relative_eq!(t.length(), 5.0 * PI, epsilon = 1e-9);
}

#[test]
fn test_full_circle_closes_on_start() {
    let t = CurveTessellator::default()
        .tessellate(&circle(0.0, 0.0, 3.0), true)
        .unwrap();
    assert_eq!(t.segments.len(), 2);
    assert_eq!(t.end(), t.start);
    assert!(matches!(t.segments[1], Segment::Linear { .. }));
}

#[test]
fn test_ellipse_within_chord_tolerance() {
    let ellipse = CurveGeometry::Ellipse {
        center: Point::new(50.0, 50.0),
        rx: 40.0,
        ry: 20.0,
        rotation: 0.3,
        start_angle: 0.0,
        sweep: std::f64::consts::TAU,
    };
    let settings = TessellationSettings::default();
    let t = CurveTessellator::new(settings.clone())
        .tessellate(&ellipse, true)
        .unwrap();

    assert!(t.segments.len() > settings.min_segments);
    assert!(t.is_closed(TOL));

    // Chord midpoints stay near the curve
    let dense = ellipse.sample(4096);
    let mut prev = t.start;
    for segment in &t.segments {
        let end = segment.end();
        let mid = prev.lerp(&end, 0.5);
        let nearest = dense
            .iter()
            .map(|p| p.distance_to(&mid))
            .fold(f64::INFINITY, f64::min);
        assert!(nearest < settings.chord_tolerance + 0.05, "{nearest}");
        prev = end;
    }
}

#[test]
fn test_polycurve_keeps_arcs() {
    let slot = CurveGeometry::PolyCurve {
        segments: vec![
            CurveGeometry::Line {
                start: Point::new(10.0, 0.0),
                end: Point::new(30.0, 0.0),
            },
            CurveGeometry::Arc {
                center: Point::new(30.0, 5.0),
                radius: 5.0,
                start_angle: -FRAC_PI_2,
                sweep: PI,
            },
            CurveGeometry::Line {
                start: Point::new(30.0, 10.0),
                end: Point::new(10.0, 10.0),
            },
            CurveGeometry::Arc {
                center: Point::new(10.0, 5.0),
                radius: 5.0,
                start_angle: FRAC_PI_2,
                sweep: PI,
            },
        ],
    };
    let t = CurveTessellator::default().tessellate(&slot, true).unwrap();

    let arcs = t
        .segments
        .iter()
        .filter(|s| matches!(s, Segment::Arc { .. }))
        .count();
    assert_eq!(arcs, 2);
    assert_eq!(t.segments.len(), 4);
    assert!(t.is_closed(TOL));
    assert_relative_eq!(t.length(), 40.0 + 10.0 * PI, epsilon = 1e-6);
}

#[test]
fn test_rational_nurbs_follows_circle() {
    let quarter = CurveGeometry::Nurbs {
        degree: 2,
        control_points: vec![
            Point::new(100.0, 0.0),
            Point::new(100.0, 100.0),
            Point::new(0.0, 100.0),
        ],
        weights: vec![1.0, FRAC_1_SQRT_2, 1.0],
        knots: vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0],
    };
    let settings = TessellationSettings::default();
    let t = CurveTessellator::new(settings.clone())
        .tessellate(&quarter, false)
        .unwrap();

    assert_eq!(t.start, Point::new(100.0, 0.0));
    assert_eq!(t.end(), Point::new(0.0, 100.0));
    assert!(t.segments.len() > settings.min_segments);

    let origin = Point::origin();
    let mut prev = t.start;
    for segment in &t.segments {
        let end = match segment {
            Segment::Linear { to } => *to,
            other => panic!("expected a straight cut, got {other:?}"),
        };
        assert!((end.distance_to(&origin) - 100.0).abs() <= TOL, "{end:?}");
        let sag = 100.0 - prev.lerp(&end, 0.5).distance_to(&origin);
        assert!(sag <= settings.chord_tolerance + 0.01, "{sag}");
        prev = end;
    }
    assert_relative_eq!(t.length(), 50.0 * PI, epsilon = 0.1);
}

#[test]
fn test_tiny_arc_is_not_a_full_turn() {
    let fillet = CurveGeometry::Arc {
        center: Point::new(200.0, 200.0),
        radius: 100.0,
        start_angle: 0.3,
        sweep: 1e-6,
    };
    assert!(CurveTessellator::default().tessellate(&fillet, false).is_err());
}

#[test]
fn test_tiny_arc_in_polycurve_is_dropped() {
    let kinked = CurveGeometry::PolyCurve {
        segments: vec![
            CurveGeometry::Line {
                start: Point::new(100.0, 100.0),
                end: Point::new(150.0, 100.0),
            },
            CurveGeometry::Arc {
                center: Point::new(150.0, 50.0),
                radius: 50.0,
                start_angle: FRAC_PI_2,
                sweep: -5e-6,
            },
            CurveGeometry::Line {
                start: Point::new(150.00025, 100.0),
                end: Point::new(180.0, 100.0),
            },
        ],
    };
    let t = CurveTessellator::default().tessellate(&kinked, false).unwrap();

    assert!(t.segments.iter().all(|s| !matches!(s, Segment::Arc { .. })));
    assert_eq!(t.end(), Point::new(180.0, 100.0));
    assert_relative_eq!(t.length(), 80.0, epsilon = TOL);
}

#[test]
fn test_polycurve_gap_is_degenerate() {
    let broken = CurveGeometry::PolyCurve {
        segments: vec![
            CurveGeometry::Line {
                start: Point::new(0.0, 0.0),
                end: Point::new(10.0, 0.0),
            },
            CurveGeometry::Line {
                start: Point::new(12.0, 0.0),
                end: Point::new(20.0, 0.0),
            },
        ],
    };
    assert!(CurveTessellator::default().tessellate(&broken, false).is_err());
}

#[test]
fn test_collapsed_line_is_degenerate() {
    let tiny = CurveGeometry::Line {
        start: Point::new(1.0, 1.0),
        end: Point::new(1.0001, 1.0),
    };
    assert!(CurveTessellator::default().tessellate(&tiny, false).is_err());
}

#[test]
fn test_progress_does_not_change_results() {
    let objects = vec![
        object(LayerRole::Cut, rect(0.0, 0.0, 10.0, 10.0)),
        object(LayerRole::Cut, circle(40.0, 40.0, 5.0)),
        object(
            LayerRole::Engrave,
            CurveGeometry::Line {
                start: Point::new(1.0, 1.0),
                end: Point::new(1.0, 1.0),
            },
        ),
    ];
    let tessellator = CurveTessellator::default();

    let mut seen = Vec::new();
    let observed = tessellator.tessellate_all(&objects, |p| seen.push(p));
    let silent = tessellator.tessellate_all(&objects, |_| {});

    assert_eq!(observed, silent);
    assert_eq!(seen.len(), 3);
    assert_eq!(seen.last().map(|p| (p.completed, p.total)), Some((3, 3)));
    assert!(observed[2].is_err());
}

proptest! {
    #[test]
    fn prop_rounded_arcs_keep_center_and_sweep(
        cx in 0.0..300.0f64,
        cy in 0.0..300.0f64,
        radius in 1.0..100.0f64,
        start_angle in 0.0..TAU,
        magnitude in 0.01..6.2f64,
        ccw in any::<bool>()
    ) {
        let sweep = if ccw { magnitude } else { -magnitude };
        let arc = CurveGeometry::Arc {
            center: Point::new(cx, cy),
            radius,
            start_angle,
            sweep,
        };
        let t = CurveTessellator::default().tessellate(&arc, false).unwrap();

        let mut prev = t.start;
        for segment in &t.segments {
            if let Segment::Arc { center, to, radius: r, .. } = segment {
                let drift = (center.distance_to(&prev) - center.distance_to(to)).abs();
                prop_assert!(drift <= TOL, "drift {}", drift);
                let measured = segment.sweep_from(&prev).unwrap();
                prop_assert!((measured - magnitude).abs() * r <= 4.0 * TOL + 1e-9);
            }
            prev = segment.end();
        }
    }
}
