#![allow(dead_code)]

use lasercam_core::{
    CurveGeometry, CurveObject, LayerRole, LayerSettings, MaterialProfile, ObjectId, Point,
};

pub const TOL: f64 = 0.001;

pub fn rect(x: f64, y: f64, w: f64, h: f64) -> CurveGeometry {
    CurveGeometry::Polyline {
        points: vec![
            Point::new(x, y),
            Point::new(x + w, y),
            Point::new(x + w, y + h),
            Point::new(x, y + h),
            Point::new(x, y),
        ],
    }
}

pub fn circle(cx: f64, cy: f64, r: f64) -> CurveGeometry {
    CurveGeometry::Circle {
        center: Point::new(cx, cy),
        radius: r,
        start_angle: 0.0,
        ccw: true,
    }
}

pub fn object(layer: LayerRole, geometry: CurveGeometry) -> CurveObject {
    CurveObject::new(ObjectId::new(), layer, geometry, TOL)
}

/// Cut at 10 mm/s, engrave at 50 mm/s, slew at the default 45 mm/s.
pub fn test_profile() -> MaterialProfile {
    let mut profile = MaterialProfile::new(
        "Test",
        LayerSettings::new(10.0, 80, 2000),
        LayerSettings::new(50.0, 20, 1000),
    );
    profile.header = "G90\nG21".to_string();
    profile.footer = "M30".to_string();
    profile
}

/// Lines of the program body between the first section comment and the
/// shutdown marker.
pub fn body_lines(gcode: &str) -> Vec<&str> {
    gcode
        .lines()
        .skip_while(|l| !l.ends_with("commands)") || *l == "(Startup commands)")
        .take_while(|l| *l != "(Shutdown commands)")
        .filter(|l| !l.is_empty())
        .collect()
}
