use lasercam_core::{CurveGeometry, CurveObject, LayerRole, Point};
use lasercam_toolpath::{CurveTessellator, NestingSorter, SortMode};

use super::support::{circle, object, rect, TOL};

fn sort(objects: &mut [CurveObject], mode: SortMode) -> Vec<usize> {
    let tessellator = CurveTessellator::default();
    let outlines: Vec<_> = objects
        .iter()
        .map(|o| {
            tessellator
                .tessellate(&o.geometry, o.closed)
                .ok()
                .map(|t| t.outline())
        })
        .collect();
    let members: Vec<usize> = (0..objects.len()).collect();
    NestingSorter::new(TOL, mode).sort(objects, &outlines, &members)
}

#[test]
fn test_children_before_parents() {
    let mut objects = vec![
        object(LayerRole::Cut, rect(0.0, 0.0, 100.0, 100.0)),
        object(LayerRole::Cut, rect(10.0, 10.0, 80.0, 80.0)),
        object(LayerRole::Cut, rect(20.0, 20.0, 10.0, 10.0)),
    ];

    let order = sort(&mut objects, SortMode::Spatial);

    assert_eq!(order, vec![2, 1, 0]);
    assert_eq!(objects[2].parent, Some(1));
    assert_eq!(objects[1].parent, Some(0));
    assert_eq!(objects[0].children, vec![1]);
}

#[test]
fn test_siblings_by_x_then_y() {
    let mut objects = vec![
        object(LayerRole::Cut, rect(50.0, 10.0, 5.0, 5.0)),
        object(LayerRole::Cut, rect(20.0, 40.0, 5.0, 5.0)),
        object(LayerRole::Cut, rect(20.0, 10.0, 5.0, 5.0)),
    ];

    let order = sort(&mut objects, SortMode::Spatial);
    assert_eq!(order, vec![2, 1, 0]);
}

#[test]
fn test_nested_children_sorted_inside_parent() {
    let mut objects = vec![
        object(LayerRole::Cut, rect(0.0, 0.0, 200.0, 100.0)),
        object(LayerRole::Cut, circle(150.0, 50.0, 10.0)),
        object(LayerRole::Cut, circle(50.0, 50.0, 10.0)),
        object(LayerRole::Cut, rect(300.0, 0.0, 10.0, 10.0)),
    ];

    let order = sort(&mut objects, SortMode::Spatial);
    assert_eq!(order, vec![2, 1, 0, 3]);
}

#[test]
fn test_open_curve_is_never_a_parent() {
    let mut objects = vec![
        object(
            LayerRole::Cut,
            CurveGeometry::Polyline {
                points: vec![
                    Point::new(0.0, 0.0),
                    Point::new(100.0, 0.0),
                    Point::new(100.0, 100.0),
                    Point::new(0.0, 100.0),
                ],
            },
        ),
        object(LayerRole::Cut, rect(40.0, 40.0, 10.0, 10.0)),
    ];

    sort(&mut objects, SortMode::Spatial);
    assert!(objects.iter().all(|o| o.parent.is_none()));
}

#[test]
fn test_open_child_inside_closed_parent() {
    let mut objects = vec![
        object(LayerRole::Engrave, rect(0.0, 0.0, 100.0, 100.0)),
        object(
            LayerRole::Engrave,
            CurveGeometry::Line {
                start: Point::new(10.0, 10.0),
                end: Point::new(90.0, 90.0),
            },
        ),
    ];

    let order = sort(&mut objects, SortMode::Spatial);
    assert_eq!(order, vec![1, 0]);
    assert_eq!(objects[1].parent, Some(0));
}

#[test]
fn test_concave_parent_excludes_child_in_notch() {
    // U shape open at the top; the small square sits in the notch
    let u = CurveGeometry::Polyline {
        points: vec![
            Point::new(0.0, 0.0),
            Point::new(90.0, 0.0),
            Point::new(90.0, 90.0),
            Point::new(60.0, 90.0),
            Point::new(60.0, 30.0),
            Point::new(30.0, 30.0),
            Point::new(30.0, 90.0),
            Point::new(0.0, 90.0),
            Point::new(0.0, 0.0),
        ],
    };
    let mut objects = vec![
        object(LayerRole::Cut, u),
        object(LayerRole::Cut, rect(40.0, 50.0, 10.0, 10.0)),
    ];

    sort(&mut objects, SortMode::Spatial);
    assert_eq!(objects[1].parent, None);
}

#[test]
fn test_layers_sorted_separately() {
    let mut objects = vec![
        object(LayerRole::Cut, rect(0.0, 0.0, 100.0, 100.0)),
        object(LayerRole::Engrave, rect(10.0, 10.0, 10.0, 10.0)),
    ];

    let order = sort(&mut objects, SortMode::Spatial);
    assert_eq!(order, vec![1, 0]);
    assert!(objects[1].parent.is_none());
}

#[test]
fn test_interleaved_siblings() {
    let mut objects: Vec<_> = (0..6)
        .map(|i| object(LayerRole::Cut, rect(i as f64 * 10.0, 0.0, 5.0, 5.0)))
        .collect();

    let order = sort(&mut objects, SortMode::Interleaved { stride: 5 });
    assert_eq!(order, vec![0, 5, 1, 2, 3, 4]);

    // Fewer siblings than the stride keep the spatial order
    let mut few: Vec<_> = (0..4)
        .map(|i| object(LayerRole::Cut, rect(i as f64 * 10.0, 0.0, 5.0, 5.0)))
        .collect();
    assert_eq!(sort(&mut few, SortMode::Interleaved { stride: 5 }), vec![0, 1, 2, 3]);
}
