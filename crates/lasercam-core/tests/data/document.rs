use lasercam_core::{
    capture_layer, CurveGeometry, DocumentObject, HostDocument, LayerRole, MemoryDocument, Point,
};
use std::io::Write;

const DOCUMENT: &str = r#"{
    "name": "panel.3dm",
    "layers": ["Cut", "engrave", "notes"],
    "objects": [
        {
            "layer": "Cut",
            "geometry": { "type": "polyline", "points": [
                {"x": 0.0, "y": 0.0}, {"x": 10.0, "y": 0.0},
                {"x": 10.0, "y": 10.0}, {"x": 0.0, "y": 10.0}, {"x": 0.0, "y": 0.0}
            ]}
        },
        {
            "layer": "engrave",
            "geometry": { "type": "line", "start": {"x": 1.0, "y": 1.0}, "end": {"x": 2.0, "y": 2.0} },
            "plane_deviation": 0.5,
            "normal": [0.0, 1.0, 0.0]
        }
    ]
}"#;

#[test]
fn test_document_from_json() {
    let doc = MemoryDocument::from_json_str(DOCUMENT).unwrap();
    assert_eq!(doc.name(), "panel.3dm");
    assert_eq!(doc.layer_names(), vec!["Cut", "engrave", "notes"]);
    assert_eq!(doc.objects_on_layer("Cut").len(), 1);
    assert!(doc.objects_on_layer("notes").is_empty());
}

#[test]
fn test_capture_layer_snapshot() {
    let doc = MemoryDocument::from_json_str(DOCUMENT).unwrap();

    let cut = capture_layer(&doc, "Cut", LayerRole::Cut, 0.001);
    assert_eq!(cut.len(), 1);
    assert!(cut[0].closed);
    assert!(cut[0].planar);
    assert_eq!(cut[0].layer_name, "Cut");
    assert_eq!(cut[0].bounding_box.max_x, 10.0);
    assert!(cut[0].parent.is_none());

    let engrave = capture_layer(&doc, "engrave", LayerRole::Engrave, 0.001);
    assert!(!engrave[0].closed);
    assert!(!engrave[0].planar);
    let normal = engrave[0].plane_normal.unwrap();
    assert_eq!(normal.y, 1.0);
}

#[test]
fn test_closed_override() {
    let mut doc = MemoryDocument::new("override");
    let mut object = DocumentObject::new(
        "cut",
        CurveGeometry::Polyline {
            points: vec![Point::new(0.0, 0.0), Point::new(5.0, 0.0), Point::new(5.0, 5.0)],
        },
    );
    object.closed = Some(true);
    let id = doc.add_object(object);
    assert!(doc.is_closed(id, 0.001));
}

#[test]
fn test_selection_is_recorded() {
    let mut doc = MemoryDocument::new("select");
    let a = doc.add_curve(
        "cut",
        CurveGeometry::Line {
            start: Point::origin(),
            end: Point::new(1.0, 0.0),
        },
    );
    doc.select_objects(&[a, a]);
    assert_eq!(doc.selected(), &[a]);
    doc.unselect_all();
    assert!(doc.selected().is_empty());
}

#[test]
fn test_document_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(DOCUMENT.as_bytes()).unwrap();
    let doc = MemoryDocument::from_file(file.path()).unwrap();
    assert_eq!(doc.objects.len(), 2);
}
