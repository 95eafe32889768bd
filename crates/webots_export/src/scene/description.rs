//! Serializable scene description
//!
//! A scene file names its images, materials, meshes and objects and refers
//! to them by name. Object transforms are given relative to the parent
//! object, either as location/rotation/scale or as a full row-major matrix.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{
    Face, FaceUv, Image, ImageHandle, Material, MaterialHandle, Mesh, MeshHandle, Modifier,
    ObjectHandle, ObjectKind, Polygon, Scene, SceneError, SceneObject, Texture, UvLayer, World,
};
use crate::config::{ConfigError, ConfigFormat};
use crate::foundation::math::{Bounds, Mat4, Quat, Transform, Vec2, Vec3};

/// Root of a scene description file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneDescription {
    /// Base directory for `//` image paths; defaults to the file's directory
    pub source_dir: Option<PathBuf>,
    /// World settings
    pub world: Option<WorldDescription>,
    /// Images
    pub images: Vec<Image>,
    /// Materials
    pub materials: Vec<MaterialDescription>,
    /// Meshes
    pub meshes: Vec<MeshDescription>,
    /// Objects
    pub objects: Vec<ObjectDescription>,
}

/// World settings entry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldDescription {
    /// Ambient light colour
    pub ambient_color: [f32; 3],
}

/// Texture slot entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextureDescription {
    /// Image texture referring to an image by name
    Image(String),
    /// Non-image texture
    Other(String),
}

/// Material entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialDescription {
    /// Unique name
    pub name: String,
    /// Diffuse colour
    pub diffuse_color: [f32; 3],
    /// Ambient factor
    pub ambient: f32,
    /// Emission factor
    pub emit: f32,
    /// Per-face images override material textures
    pub use_face_texture: bool,
    /// Texture slots
    pub textures: Vec<TextureDescription>,
}

impl Default for MaterialDescription {
    fn default() -> Self {
        let material = Material::default();
        Self {
            name: String::new(),
            diffuse_color: material.diffuse_color.into(),
            ambient: material.ambient,
            emit: material.emit,
            use_face_texture: material.use_face_texture,
            textures: Vec::new(),
        }
    }
}

/// Face entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceDescription {
    /// Vertex indices (3 or 4)
    pub vertices: Polygon,
    /// Material slot index
    #[serde(default)]
    pub material: usize,
    /// Smooth shading
    #[serde(default)]
    pub smooth: bool,
}

/// Per-face UV entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceUvDescription {
    /// One coordinate per corner
    pub uvs: Vec<[f32; 2]>,
    /// Image name
    #[serde(default)]
    pub image: Option<String>,
}

/// Mesh entry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshDescription {
    /// Unique name
    pub name: String,
    /// Vertex positions
    pub vertices: Vec<[f32; 3]>,
    /// Faces
    pub faces: Vec<FaceDescription>,
    /// Material slot names; an empty string is an empty slot
    pub materials: Vec<String>,
    /// Per-face UVs, parallel to `faces`
    pub uv: Option<Vec<FaceUvDescription>>,
    /// Custom smoothing angle in radians
    pub auto_smooth_angle: Option<f32>,
}

/// Object entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectDescription {
    /// Unique name
    pub name: String,
    /// Object kind
    pub kind: ObjectKind,
    /// Parent object name
    pub parent: Option<String>,
    /// Mesh name
    pub mesh: Option<String>,
    /// Location relative to the parent
    pub location: [f32; 3],
    /// XYZ Euler rotation in radians
    pub rotation: [f32; 3],
    /// Scale
    pub scale: [f32; 3],
    /// Row-major local matrix; replaces location/rotation/scale when set
    pub matrix: Option<[[f32; 4]; 4]>,
    /// Explicit local bounds as `[min, max]`
    pub bounds: Option<[[f32; 3]; 2]>,
    /// Modifier stack
    pub modifiers: Vec<Modifier>,
    /// Visibility
    pub visible: bool,
    /// Selection state
    pub selected: bool,
}

impl Default for ObjectDescription {
    fn default() -> Self {
        Self {
            name: String::new(),
            kind: ObjectKind::Mesh,
            parent: None,
            mesh: None,
            location: [0.0; 3],
            rotation: [0.0; 3],
            scale: [1.0; 3],
            matrix: None,
            bounds: None,
            modifiers: Vec::new(),
            visible: true,
            selected: true,
        }
    }
}

impl ObjectDescription {
    fn local_matrix(&self) -> Mat4 {
        if let Some(rows) = self.matrix {
            return Mat4::from_fn(|r, c| rows[r][c]);
        }
        let [rx, ry, rz] = self.rotation;
        Transform {
            position: self.location.into(),
            rotation: Quat::from_euler_angles(rx, ry, rz),
            scale: self.scale.into(),
        }
        .to_matrix()
    }
}

fn index_by_name<T>(
    kind: &'static str,
    entries: impl IntoIterator<Item = (String, T)>,
) -> Result<HashMap<String, T>, SceneError> {
    let mut map = HashMap::new();
    for (name, value) in entries {
        if map.insert(name.clone(), value).is_some() {
            return Err(SceneError::DuplicateName { kind, name });
        }
    }
    Ok(map)
}

fn resolve<T: Copy>(map: &HashMap<String, T>, kind: &'static str, name: &str) -> Result<T, SceneError> {
    map.get(name).copied().ok_or_else(|| SceneError::UnknownReference {
        kind,
        name: name.to_string(),
    })
}

impl SceneDescription {
    /// Parse a `.ron` or `.toml` description file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        let description = match ConfigFormat::from_path(path)? {
            ConfigFormat::Toml => toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))?,
            ConfigFormat::Ron => ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))?,
        };
        Ok(description)
    }

    /// Resolve names and build the in-memory scene
    pub fn build(self) -> Result<Scene, SceneError> {
        let mut scene = Scene::new();
        if let Some(dir) = self.source_dir {
            scene.set_source_dir(dir);
        }
        if let Some(world) = self.world {
            scene.set_world(World {
                ambient_color: world.ambient_color.into(),
            });
        }

        let images: HashMap<String, ImageHandle> = index_by_name(
            "image",
            self.images
                .into_iter()
                .map(|image| (image.name.clone(), scene.add_image(image)))
                .collect::<Vec<_>>(),
        )?;

        let mut materials = Vec::with_capacity(self.materials.len());
        for desc in self.materials {
            let texture_slots = desc
                .textures
                .iter()
                .map(|texture| match texture {
                    TextureDescription::Image(name) => {
                        resolve(&images, "image", name).map(|image| Some(Texture::Image(Some(image))))
                    }
                    TextureDescription::Other(name) => Ok(Some(Texture::Other(name.clone()))),
                })
                .collect::<Result<Vec<_>, _>>()?;
            let material = Material {
                name: desc.name.clone(),
                diffuse_color: desc.diffuse_color.into(),
                ambient: desc.ambient,
                emit: desc.emit,
                use_face_texture: desc.use_face_texture,
                texture_slots,
            };
            materials.push((desc.name, scene.add_material(material)));
        }
        let materials: HashMap<String, MaterialHandle> = index_by_name("material", materials)?;

        let mut meshes = Vec::with_capacity(self.meshes.len());
        for desc in self.meshes {
            let mesh = Self::build_mesh(&desc, &materials, &images)?;
            meshes.push((desc.name, scene.add_mesh(mesh)));
        }
        let meshes: HashMap<String, MeshHandle> = index_by_name("mesh", meshes)?;

        // First pass: create objects with local matrices, second pass links
        // parents and accumulates world matrices.
        let mut handles = Vec::with_capacity(self.objects.len());
        for desc in &self.objects {
            let mut object = SceneObject::new(desc.name.clone(), desc.kind)
                .with_matrix_world(desc.local_matrix())
                .with_visible(desc.visible)
                .with_selected(desc.selected);
            object.bounds = desc.bounds.map(|[min, max]| Bounds::new(min.into(), max.into()));
            object.modifiers = desc.modifiers.clone();
            if let Some(mesh) = &desc.mesh {
                object.data = Some(resolve(&meshes, "mesh", mesh)?);
            }
            handles.push((desc.name.clone(), scene.add_object(object)));
        }
        let objects: HashMap<String, ObjectHandle> = index_by_name("object", handles)?;

        for desc in &self.objects {
            if let Some(parent) = &desc.parent {
                let child = resolve(&objects, "object", &desc.name)?;
                let parent = resolve(&objects, "object", parent)?;
                scene.set_parent(child, Some(parent))?;
            }
        }

        Self::accumulate_world_matrices(&mut scene);
        Ok(scene)
    }

    fn build_mesh(
        desc: &MeshDescription,
        materials: &HashMap<String, MaterialHandle>,
        images: &HashMap<String, ImageHandle>,
    ) -> Result<Mesh, SceneError> {
        let mut mesh = Mesh::new(desc.name.clone());
        mesh.vertices = desc.vertices.iter().map(|&v| Vec3::from(v)).collect();
        let count = mesh.vertices.len();
        for (face, desc_face) in desc.faces.iter().enumerate() {
            if let Some(&index) = desc_face.vertices.indices().iter().find(|&&i| i as usize >= count) {
                return Err(SceneError::VertexOutOfRange {
                    mesh: desc.name.clone(),
                    face,
                    index,
                    count,
                });
            }
        }
        mesh.faces = desc
            .faces
            .iter()
            .map(|face| {
                Face::new(face.vertices)
                    .with_material(face.material)
                    .with_smooth(face.smooth)
            })
            .collect();
        mesh.auto_smooth_angle = desc.auto_smooth_angle;
        mesh.materials = desc
            .materials
            .iter()
            .map(|name| {
                if name.is_empty() {
                    Ok(None)
                } else {
                    resolve(materials, "material", name).map(Some)
                }
            })
            .collect::<Result<_, _>>()?;

        if let Some(uv) = &desc.uv {
            let faces = uv
                .iter()
                .map(|face| {
                    let image = face
                        .image
                        .as_deref()
                        .map(|name| resolve(images, "image", name))
                        .transpose()?;
                    Ok(FaceUv {
                        uvs: face.uvs.iter().map(|&uv| Vec2::from(uv)).collect(),
                        image,
                    })
                })
                .collect::<Result<_, SceneError>>()?;
            mesh.uv_layer = Some(UvLayer { faces });
        }
        Ok(mesh)
    }

    /// Turn parent-relative matrices into world matrices, parents first
    fn accumulate_world_matrices(scene: &mut Scene) {
        use super::SceneSource;

        let local: HashMap<ObjectHandle, (Option<ObjectHandle>, Mat4)> = scene
            .objects()
            .into_iter()
            .filter_map(|h| scene.object(h).map(|o| (h, (o.parent, o.matrix_world))))
            .collect();

        fn world_of(
            handle: ObjectHandle,
            local: &HashMap<ObjectHandle, (Option<ObjectHandle>, Mat4)>,
            cache: &mut HashMap<ObjectHandle, Mat4>,
        ) -> Mat4 {
            if let Some(world) = cache.get(&handle) {
                return *world;
            }
            let (parent, matrix) = local[&handle];
            let world = match parent {
                Some(parent) => world_of(parent, local, cache) * matrix,
                None => matrix,
            };
            cache.insert(handle, world);
            world
        }

        let mut cache = HashMap::new();
        for &handle in local.keys() {
            let world = world_of(handle, &local, &mut cache);
            if let Some(object) = scene.object_mut(handle) {
                object.matrix_world = world;
            }
        }
    }
}
