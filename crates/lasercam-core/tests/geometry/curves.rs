use approx::assert_relative_eq;
use lasercam_core::{CurveGeometry, CurveKind, GeometryError, Point};
use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_2, PI, TAU};

#[test]
fn test_circle_parametrisation() {
    let circle = CurveGeometry::Circle {
        center: Point::origin(),
        radius: 50.0,
        start_angle: 0.0,
        ccw: true,
    };
    assert_eq!(circle.kind(), CurveKind::Circle);
    assert!(circle.is_closed(1e-6));
    assert_relative_eq!(circle.start_point().x, 50.0);
    let quarter = circle.point_at(0.25);
    assert_relative_eq!(quarter.x, 0.0, epsilon = 1e-9);
    assert_relative_eq!(quarter.y, 50.0, epsilon = 1e-9);

    let cw = CurveGeometry::Circle {
        center: Point::origin(),
        radius: 50.0,
        start_angle: 0.0,
        ccw: false,
    };
    assert_relative_eq!(cw.point_at(0.25).y, -50.0, epsilon = 1e-9);
}

#[test]
fn test_arc_bounding_box_crosses_axis() {
    let arc = CurveGeometry::Arc {
        center: Point::new(10.0, 10.0),
        radius: 5.0,
        start_angle: FRAC_PI_2,
        sweep: PI,
    };
    let bbox = arc.bounding_box();
    assert_relative_eq!(bbox.min_x, 5.0, epsilon = 1e-9);
    assert_relative_eq!(bbox.max_x, 10.0, epsilon = 1e-9);
    assert_relative_eq!(bbox.min_y, 5.0, epsilon = 1e-9);
    assert_relative_eq!(bbox.max_y, 15.0, epsilon = 1e-9);
}

#[test]
fn test_ellipse_rotation() {
    let ellipse = CurveGeometry::Ellipse {
        center: Point::origin(),
        rx: 20.0,
        ry: 10.0,
        rotation: FRAC_PI_2,
        start_angle: 0.0,
        sweep: TAU,
    };
    let start = ellipse.start_point();
    assert_relative_eq!(start.x, 0.0, epsilon = 1e-9);
    assert_relative_eq!(start.y, 20.0, epsilon = 1e-9);
    assert!(ellipse.is_closed(1e-6));
}

#[test]
fn test_rational_nurbs_quarter_circle() {
    let nurbs = CurveGeometry::Nurbs {
        degree: 2,
        control_points: vec![
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 1.0),
        ],
        weights: vec![1.0, FRAC_1_SQRT_2, 1.0],
        knots: vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0],
    };
    for p in nurbs.sample(17) {
        assert_relative_eq!(p.distance_to(&Point::origin()), 1.0, epsilon = 1e-9);
    }
}

#[test]
fn test_polycurve_endpoints() {
    let poly = CurveGeometry::PolyCurve {
        segments: vec![
            CurveGeometry::Line {
                start: Point::new(0.0, 0.0),
                end: Point::new(10.0, 0.0),
            },
            CurveGeometry::Arc {
                center: Point::new(10.0, 5.0),
                radius: 5.0,
                start_angle: -FRAC_PI_2,
                sweep: PI,
            },
        ],
    };
    assert_eq!(poly.start_point(), Point::new(0.0, 0.0));
    let end = poly.end_point();
    assert_relative_eq!(end.x, 10.0, epsilon = 1e-9);
    assert_relative_eq!(end.y, 10.0, epsilon = 1e-9);
    assert!(!poly.is_closed(1e-3));
}

#[test]
fn test_validate_rejects_degenerate() {
    let line = CurveGeometry::Line {
        start: Point::new(1.0, 1.0),
        end: Point::new(1.0, 1.0),
    };
    assert!(matches!(
        line.validate(),
        Err(GeometryError::Degenerate { .. })
    ));

    let arc = CurveGeometry::Arc {
        center: Point::origin(),
        radius: -1.0,
        start_angle: 0.0,
        sweep: 1.0,
    };
    assert!(arc.validate().is_err());

    let nurbs = CurveGeometry::Nurbs {
        degree: 3,
        control_points: vec![Point::origin(), Point::new(1.0, 1.0)],
        weights: vec![],
        knots: vec![],
    };
    assert!(matches!(
        nurbs.validate(),
        Err(GeometryError::InvalidNurbs { .. })
    ));

    let empty = CurveGeometry::PolyCurve { segments: vec![] };
    assert!(empty.validate().is_err());
}

#[test]
fn test_geometry_json_shape() {
    let json = r#"{"type":"circle","center":{"x":1.0,"y":2.0},"radius":3.0}"#;
    let circle: CurveGeometry = serde_json::from_str(json).unwrap();
    assert_eq!(
        circle,
        CurveGeometry::Circle {
            center: Point::new(1.0, 2.0),
            radius: 3.0,
            start_angle: 0.0,
            ccw: true,
        }
    );
}
