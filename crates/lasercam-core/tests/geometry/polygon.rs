use lasercam_core::geometry::{point_in_polygon, signed_area};
use lasercam_core::{BoundingBox, Containment, Point};

fn square(size: f64) -> Vec<Point> {
    vec![
        Point::new(0.0, 0.0),
        Point::new(size, 0.0),
        Point::new(size, size),
        Point::new(0.0, size),
    ]
}

#[test]
fn test_point_distance() {
    let p1 = Point::new(0.0, 0.0);
    let p2 = Point::new(3.0, 4.0);
    assert_eq!(p1.distance_to(&p2), 5.0);
    assert!(p1.approx_eq(&Point::new(0.0005, 0.0), 0.001));
}

#[test]
fn test_point_in_polygon_classification() {
    let outline = square(10.0);
    assert_eq!(
        point_in_polygon(&Point::new(5.0, 5.0), &outline, 1e-6),
        Containment::Inside
    );
    assert_eq!(
        point_in_polygon(&Point::new(15.0, 5.0), &outline, 1e-6),
        Containment::Outside
    );
    assert_eq!(
        point_in_polygon(&Point::new(10.0, 5.0), &outline, 1e-6),
        Containment::OnBoundary
    );
}

#[test]
fn test_point_in_concave_polygon() {
    // U shape opening upwards
    let outline = vec![
        Point::new(0.0, 0.0),
        Point::new(30.0, 0.0),
        Point::new(30.0, 30.0),
        Point::new(20.0, 30.0),
        Point::new(20.0, 10.0),
        Point::new(10.0, 10.0),
        Point::new(10.0, 30.0),
        Point::new(0.0, 30.0),
    ];
    assert_eq!(
        point_in_polygon(&Point::new(15.0, 20.0), &outline, 1e-6),
        Containment::Outside
    );
    assert_eq!(
        point_in_polygon(&Point::new(5.0, 20.0), &outline, 1e-6),
        Containment::Inside
    );
}

#[test]
fn test_signed_area_of_square() {
    assert_eq!(signed_area(&square(100.0)), 10000.0);
}

#[test]
fn test_bounding_box_contains() {
    let outer = BoundingBox::new(0.0, 0.0, 100.0, 100.0);
    let inner = BoundingBox::new(10.0, 10.0, 20.0, 20.0);
    assert!(outer.contains_box(&inner, 0.0));
    assert!(!inner.contains_box(&outer, 0.0));

    let touching = BoundingBox::new(0.0, 0.0, 100.0005, 50.0);
    assert!(outer.contains_box(&touching, 0.001));
    assert_eq!(outer.width(), 100.0);
    assert_eq!(inner.min_corner(), Point::new(10.0, 10.0));
}

#[test]
fn test_bounding_box_from_points() {
    assert!(BoundingBox::from_points(&[]).is_none());
    let bbox = BoundingBox::from_points(&[Point::new(3.0, -1.0), Point::new(-2.0, 4.0)]).unwrap();
    assert_eq!(bbox, BoundingBox::new(-2.0, -1.0, 3.0, 4.0));
}
