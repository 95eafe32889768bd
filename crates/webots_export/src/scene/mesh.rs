//! Polygon mesh data
//!
//! Meshes hold triangle and quad faces only. Each face carries a material slot
//! index and a smooth flag; an optional UV layer stores one coordinate per
//! face corner together with an optional per-face image.

use serde::{Deserialize, Serialize};

use super::{ImageHandle, MaterialHandle, SceneError};
use crate::foundation::math::{Bounds, Vec2, Vec3};

/// Vertex indices of a single face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u32>", into = "Vec<u32>")]
pub enum Polygon {
    /// Three vertex indices
    Triangle([u32; 3]),
    /// Four vertex indices
    Quad([u32; 4]),
}

impl Polygon {
    /// Vertex indices in winding order
    pub fn indices(&self) -> &[u32] {
        match self {
            Self::Triangle(indices) => &indices[..],
            Self::Quad(indices) => &indices[..],
        }
    }

    /// Number of corners (3 or 4)
    pub fn corner_count(&self) -> usize {
        self.indices().len()
    }
}

impl TryFrom<Vec<u32>> for Polygon {
    type Error = SceneError;

    fn try_from(indices: Vec<u32>) -> Result<Self, Self::Error> {
        match indices[..] {
            [a, b, c] => Ok(Self::Triangle([a, b, c])),
            [a, b, c, d] => Ok(Self::Quad([a, b, c, d])),
            _ => Err(SceneError::UnsupportedPolygon(indices.len())),
        }
    }
}

impl From<Polygon> for Vec<u32> {
    fn from(polygon: Polygon) -> Self {
        polygon.indices().to_vec()
    }
}

/// A mesh face
#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    /// Vertex indices
    pub polygon: Polygon,
    /// Index into the mesh material slots
    pub material_index: usize,
    /// Whether the face is shaded smooth
    pub smooth: bool,
}

impl Face {
    /// Flat-shaded face using the first material slot
    pub fn new(polygon: Polygon) -> Self {
        Self {
            polygon,
            material_index: 0,
            smooth: false,
        }
    }

    /// Builder pattern: set material slot index
    pub fn with_material(mut self, material_index: usize) -> Self {
        self.material_index = material_index;
        self
    }

    /// Builder pattern: set smooth shading
    pub fn with_smooth(mut self, smooth: bool) -> Self {
        self.smooth = smooth;
        self
    }
}

/// Per-face UV data
#[derive(Debug, Clone, PartialEq)]
pub struct FaceUv {
    /// One coordinate per face corner
    pub uvs: Vec<Vec2>,
    /// Image assigned to the face, if any
    pub image: Option<ImageHandle>,
}

/// The active UV layer of a mesh, one entry per face
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UvLayer {
    /// Per-face UV data, parallel to [`Mesh::faces`]
    pub faces: Vec<FaceUv>,
}

/// Polygon mesh
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Mesh {
    /// Display name
    pub name: String,
    /// Vertex positions
    pub vertices: Vec<Vec3>,
    /// Faces
    pub faces: Vec<Face>,
    /// Active UV layer
    pub uv_layer: Option<UvLayer>,
    /// Material slots; an empty slot is `None`
    pub materials: Vec<Option<MaterialHandle>>,
    /// Custom smoothing angle in radians, `None` for fully smooth
    pub auto_smooth_angle: Option<f32>,
}

impl Mesh {
    /// Create an empty mesh
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Bounding box of the vertex positions
    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(&self.vertices)
    }

    /// Whether the mesh has any face data
    pub fn has_faces(&self) -> bool {
        !self.faces.is_empty()
    }

    /// Copy of this mesh with every quad split into two triangles
    pub fn triangulated(&self) -> Self {
        let mut faces = Vec::with_capacity(self.faces.len() * 2);
        let mut uv_faces = Vec::new();

        for (i, face) in self.faces.iter().enumerate() {
            let face_uv = self.uv_layer.as_ref().and_then(|layer| layer.faces.get(i));

            match face.polygon {
                Polygon::Triangle(_) => {
                    faces.push(face.clone());
                    if let Some(face_uv) = face_uv {
                        uv_faces.push(face_uv.clone());
                    }
                }
                Polygon::Quad([a, b, c, d]) => {
                    faces.push(Face {
                        polygon: Polygon::Triangle([a, b, c]),
                        ..face.clone()
                    });
                    faces.push(Face {
                        polygon: Polygon::Triangle([a, c, d]),
                        ..face.clone()
                    });
                    if let Some(face_uv) = face_uv {
                        for corners in [[0, 1, 2], [0, 2, 3]] {
                            uv_faces.push(FaceUv {
                                uvs: corners
                                    .iter()
                                    .filter_map(|&corner| face_uv.uvs.get(corner).copied())
                                    .collect(),
                                image: face_uv.image,
                            });
                        }
                    }
                }
            }
        }

        Self {
            faces,
            uv_layer: self.uv_layer.as_ref().map(|_| UvLayer { faces: uv_faces }),
            ..self.clone()
        }
    }
}
