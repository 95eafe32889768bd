//! Scene objects

use serde::{Deserialize, Serialize};

use super::{MeshHandle, ObjectHandle};
use crate::foundation::math::{Bounds, Mat4, Vec3};

/// Kind of data an object carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ObjectKind {
    /// Polygon mesh
    #[default]
    Mesh,
    /// Curve; its geometry must be converted to a mesh
    Curve,
    /// NURBS surface; its geometry must be converted to a mesh
    Surface,
    /// Text object; its geometry must be converted to a mesh
    Font,
    /// Transform-only object
    Empty,
    /// Camera
    Camera,
    /// Light source
    Lamp,
}

impl ObjectKind {
    /// Whether objects of this kind can produce mesh geometry
    pub fn is_geometry(self) -> bool {
        matches!(self, Self::Mesh | Self::Curve | Self::Surface | Self::Font)
    }
}

/// Geometry modifier evaluated when a derived mesh is requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Modifier {
    /// Split quads into triangles
    Triangulate,
}

/// Object in the scene hierarchy
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    /// Display name
    pub name: String,
    /// Object kind
    pub kind: ObjectKind,
    /// Parent object
    pub parent: Option<ObjectHandle>,
    /// Local-to-world transform
    pub matrix_world: Mat4,
    /// Explicit local bounding box; derived from mesh data when unset
    pub bounds: Option<Bounds>,
    /// Geometry data (tessellated geometry for curves, surfaces and text)
    pub data: Option<MeshHandle>,
    /// Modifier stack
    pub modifiers: Vec<Modifier>,
    /// Visible in the viewport
    pub visible: bool,
    /// Part of the current selection
    pub selected: bool,
}

impl SceneObject {
    /// Create a visible, selected object at the origin
    pub fn new(name: impl Into<String>, kind: ObjectKind) -> Self {
        Self {
            name: name.into(),
            kind,
            parent: None,
            matrix_world: Mat4::identity(),
            bounds: None,
            data: None,
            modifiers: Vec::new(),
            visible: true,
            selected: true,
        }
    }

    /// Create a mesh object using the given mesh data
    pub fn mesh(name: impl Into<String>, data: MeshHandle) -> Self {
        Self::new(name, ObjectKind::Mesh).with_data(data)
    }

    /// Builder pattern: set geometry data
    pub fn with_data(mut self, data: MeshHandle) -> Self {
        self.data = Some(data);
        self
    }

    /// Builder pattern: set parent
    pub fn with_parent(mut self, parent: ObjectHandle) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Builder pattern: set world matrix
    pub fn with_matrix_world(mut self, matrix: Mat4) -> Self {
        self.matrix_world = matrix;
        self
    }

    /// Builder pattern: set selection state
    pub fn with_selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    /// Builder pattern: set visibility
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Builder pattern: append a modifier
    pub fn with_modifier(mut self, modifier: Modifier) -> Self {
        self.modifiers.push(modifier);
        self
    }

    /// Whether a modifier stack would change the geometry
    pub fn is_modified(&self) -> bool {
        !self.modifiers.is_empty()
    }

    /// World-space extent of `bounds`: box size times the object scale
    pub fn dimensions(&self, bounds: &Bounds) -> Vec3 {
        let m = &self.matrix_world;
        let scale = Vec3::new(
            Vec3::new(m.m11, m.m21, m.m31).magnitude(),
            Vec3::new(m.m12, m.m22, m.m32).magnitude(),
            Vec3::new(m.m13, m.m23, m.m33).magnitude(),
        );
        bounds.size().component_mul(&scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimensions_follow_world_scale() {
        let object = SceneObject::new("Box", ObjectKind::Empty)
            .with_matrix_world(Mat4::new_nonuniform_scaling(&Vec3::new(2.0, -1.0, 0.5)));

        let dims = object.dimensions(&Bounds::unit());
        assert_eq!(dims, Vec3::new(4.0, 2.0, 1.0));
    }

    #[test]
    fn test_geometry_kinds() {
        assert!(ObjectKind::Font.is_geometry());
        assert!(!ObjectKind::Empty.is_geometry());
        assert!(!SceneObject::new("Lamp", ObjectKind::Lamp).is_modified());
    }
}
