//! Host document capability set
//!
//! The CAD host owns the curves. The compiler reaches it only through
//! [`HostDocument`], captures value snapshots once at run start, and calls
//! back into it to highlight geometry the operator should inspect.

use std::path::Path;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::curve::{CurveGeometry, CurveObject, LayerRole, ObjectId};
use crate::error::Result;
use crate::geometry::BoundingBox;

/// Queries and side effects the compiler needs from a CAD host
pub trait HostDocument {
    /// Document name, used in the output metadata.
    fn name(&self) -> &str;

    fn layer_names(&self) -> Vec<String>;

    /// Curve objects on the named layer, in document order.
    fn objects_on_layer(&self, layer: &str) -> Vec<ObjectId>;

    fn curve_geometry(&self, id: ObjectId) -> Option<CurveGeometry>;

    fn is_closed(&self, id: ObjectId, tolerance: f64) -> bool;

    fn is_planar(&self, id: ObjectId, tolerance: f64) -> bool;

    /// Unit normal of the curve's plane, if it has one.
    fn plane_normal(&self, id: ObjectId) -> Option<Vector3<f64>>;

    fn bounding_box(&self, id: ObjectId) -> Option<BoundingBox>;

    /// Highlight objects for the operator.
    fn select_objects(&mut self, ids: &[ObjectId]);

    fn unselect_all(&mut self);
}

/// Capture read-only snapshots of every curve on `layer_name`.
///
/// Objects without curve geometry are ignored.
pub fn capture_layer<D: HostDocument + ?Sized>(
    doc: &D,
    layer_name: &str,
    role: LayerRole,
    tolerance: f64,
) -> Vec<CurveObject> {
    let ids = doc.objects_on_layer(layer_name);
    let mut captured = Vec::with_capacity(ids.len());
    for id in ids {
        let Some(geometry) = doc.curve_geometry(id) else {
            debug!("Object {} on layer '{}' is not a curve", id, layer_name);
            continue;
        };
        let bounding_box = doc
            .bounding_box(id)
            .unwrap_or_else(|| geometry.bounding_box());
        captured.push(CurveObject {
            id,
            layer: role,
            layer_name: layer_name.to_string(),
            closed: doc.is_closed(id, tolerance),
            bounding_box,
            planar: doc.is_planar(id, tolerance),
            plane_normal: doc.plane_normal(id),
            geometry,
            parent: None,
            children: Vec::new(),
        });
    }
    captured
}

/// One object of a [`MemoryDocument`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentObject {
    #[serde(default)]
    pub id: ObjectId,
    pub layer: String,
    pub geometry: CurveGeometry,
    /// Overrides the closed flag derived from the geometry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed: Option<bool>,
    /// Largest distance of any curve point from its best-fit plane.
    #[serde(default)]
    pub plane_deviation: f64,
    /// Plane normal; `None` means the XY plane.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normal: Option<[f64; 3]>,
}

impl DocumentObject {
    pub fn new(layer: impl Into<String>, geometry: CurveGeometry) -> Self {
        Self {
            id: ObjectId::new(),
            layer: layer.into(),
            geometry,
            closed: None,
            plane_deviation: 0.0,
            normal: None,
        }
    }
}

/// In-memory host document, loadable from JSON
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryDocument {
    pub name: String,
    #[serde(default)]
    pub layers: Vec<String>,
    #[serde(default)]
    pub objects: Vec<DocumentObject>,
    #[serde(skip)]
    selected: Vec<ObjectId>,
}

impl MemoryDocument {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    pub fn add_layer(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.layers.contains(&name) {
            self.layers.push(name);
        }
    }

    /// Add a curve on `layer`, creating the layer if needed.
    pub fn add_curve(&mut self, layer: &str, geometry: CurveGeometry) -> ObjectId {
        self.add_object(DocumentObject::new(layer, geometry))
    }

    pub fn add_object(&mut self, object: DocumentObject) -> ObjectId {
        self.add_layer(object.layer.clone());
        let id = object.id;
        self.objects.push(object);
        id
    }

    /// Objects currently highlighted for the operator.
    pub fn selected(&self) -> &[ObjectId] {
        &self.selected
    }

    fn object(&self, id: ObjectId) -> Option<&DocumentObject> {
        self.objects.iter().find(|o| o.id == id)
    }
}

impl HostDocument for MemoryDocument {
    fn name(&self) -> &str {
        &self.name
    }

    fn layer_names(&self) -> Vec<String> {
        let mut names = self.layers.clone();
        for object in &self.objects {
            if !names.contains(&object.layer) {
                names.push(object.layer.clone());
            }
        }
        names
    }

    fn objects_on_layer(&self, layer: &str) -> Vec<ObjectId> {
        self.objects
            .iter()
            .filter(|o| o.layer == layer)
            .map(|o| o.id)
            .collect()
    }

    fn curve_geometry(&self, id: ObjectId) -> Option<CurveGeometry> {
        self.object(id).map(|o| o.geometry.clone())
    }

    fn is_closed(&self, id: ObjectId, tolerance: f64) -> bool {
        self.object(id)
            .map(|o| o.closed.unwrap_or_else(|| o.geometry.is_closed(tolerance)))
            .unwrap_or(false)
    }

    fn is_planar(&self, id: ObjectId, tolerance: f64) -> bool {
        self.object(id)
            .map(|o| o.plane_deviation <= tolerance)
            .unwrap_or(false)
    }

    fn plane_normal(&self, id: ObjectId) -> Option<Vector3<f64>> {
        let object = self.object(id)?;
        let normal = match object.normal {
            Some([x, y, z]) => Vector3::new(x, y, z),
            None => Vector3::z(),
        };
        normal.try_normalize(f64::EPSILON)
    }

    fn bounding_box(&self, id: ObjectId) -> Option<BoundingBox> {
        self.object(id).map(|o| o.geometry.bounding_box())
    }

    fn select_objects(&mut self, ids: &[ObjectId]) {
        for id in ids {
            if !self.selected.contains(id) {
                self.selected.push(*id);
            }
        }
    }

    fn unselect_all(&mut self) {
        self.selected.clear();
    }
}
