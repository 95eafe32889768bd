//! Host scene model
//!
//! The exporter reads the scene exclusively through [`SceneSource`]. The
//! in-memory [`Scene`] implements it on top of handle maps and can be built
//! programmatically or loaded from a scene description file.

pub mod description;
pub mod material;
pub mod mesh;
pub mod object;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::ConfigError;
use crate::foundation::collections::{HandleMap, TypedHandle};
use crate::foundation::math::{Bounds, Mat4};

pub use description::SceneDescription;
pub use material::{Image, Material, Texture, World};
pub use mesh::{Face, FaceUv, Mesh, Polygon, UvLayer};
pub use object::{Modifier, ObjectKind, SceneObject};

/// Handle to a [`SceneObject`]
pub type ObjectHandle = TypedHandle<SceneObject>;

/// Handle to a [`Mesh`]
pub type MeshHandle = TypedHandle<Mesh>;

/// Handle to a [`Material`]
pub type MaterialHandle = TypedHandle<Material>;

/// Handle to an [`Image`]
pub type ImageHandle = TypedHandle<Image>;

/// Scene construction errors
#[derive(Error, Debug)]
pub enum SceneError {
    /// A face with a vertex count other than 3 or 4
    #[error("Unsupported polygon with {0} vertices (only triangles and quads)")]
    UnsupportedPolygon(usize),

    /// A face refers to a vertex the mesh does not have
    #[error("Face {face} of mesh '{mesh}' uses vertex {index}, but the mesh has {count} vertices")]
    VertexOutOfRange {
        /// Mesh name
        mesh: String,
        /// Face position in the mesh
        face: usize,
        /// Offending vertex index
        index: u32,
        /// Number of vertices in the mesh
        count: usize,
    },

    /// A name reference that does not resolve
    #[error("Unknown {kind} '{name}'")]
    UnknownReference {
        /// Kind of the missing entry
        kind: &'static str,
        /// Referenced name
        name: String,
    },

    /// Two entries of the same kind share a name
    #[error("Duplicate {kind} '{name}'")]
    DuplicateName {
        /// Kind of the duplicated entry
        kind: &'static str,
        /// Duplicated name
        name: String,
    },

    /// An object is its own ancestor
    #[error("Parent cycle through object '{0}'")]
    ParentCycle(String),

    /// Loading the description file failed
    #[error("Scene file error: {0}")]
    Config(#[from] ConfigError),
}

/// Read-only accessor interface to the host scene
///
/// Derived meshes obtained from [`SceneSource::acquire_mesh`] are temporary
/// and must be handed back with [`SceneSource::release_mesh`].
pub trait SceneSource {
    /// All objects in scene order
    fn objects(&self) -> Vec<ObjectHandle>;

    /// Look up an object
    fn object(&self, handle: ObjectHandle) -> Option<&SceneObject>;

    /// Look up a mesh
    fn mesh(&self, handle: MeshHandle) -> Option<&Mesh>;

    /// Look up a material
    fn material(&self, handle: MaterialHandle) -> Option<&Material>;

    /// Look up an image
    fn image(&self, handle: ImageHandle) -> Option<&Image>;

    /// Scene lighting settings
    fn world(&self) -> Option<&World>;

    /// Directory of the scene file, base for `//` image paths
    fn source_dir(&self) -> Option<&Path>;

    /// Renderable representations of an object with their world matrices
    fn derived_objects(&self, handle: ObjectHandle) -> Vec<(ObjectHandle, Mat4)> {
        self.object(handle)
            .map(|object| vec![(handle, object.matrix_world)])
            .unwrap_or_default()
    }

    /// Local bounding box: explicit bounds, else mesh extent, else unit box
    fn bounds(&self, handle: ObjectHandle) -> Bounds {
        let Some(object) = self.object(handle) else {
            return Bounds::unit();
        };
        object
            .bounds
            .or_else(|| object.data.and_then(|mesh| self.mesh(mesh)).and_then(Mesh::bounds))
            .unwrap_or_else(Bounds::unit)
    }

    /// Evaluate an object's geometry into a temporary mesh
    fn acquire_mesh(&mut self, handle: ObjectHandle, apply_modifiers: bool) -> Option<MeshHandle>;

    /// Return a mesh obtained from [`SceneSource::acquire_mesh`]
    fn release_mesh(&mut self, mesh: MeshHandle);
}

/// In-memory scene
#[derive(Debug, Default)]
pub struct Scene {
    objects: HandleMap<SceneObject>,
    order: Vec<ObjectHandle>,
    meshes: HandleMap<Mesh>,
    materials: HandleMap<Material>,
    images: HandleMap<Image>,
    derived: HashSet<MeshHandle>,
    world: Option<World>,
    source_dir: Option<PathBuf>,
}

impl Scene {
    /// Create an empty scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object; objects keep insertion order
    pub fn add_object(&mut self, object: SceneObject) -> ObjectHandle {
        let handle = ObjectHandle::new(self.objects.insert(object));
        self.order.push(handle);
        handle
    }

    /// Add a mesh
    pub fn add_mesh(&mut self, mesh: Mesh) -> MeshHandle {
        MeshHandle::new(self.meshes.insert(mesh))
    }

    /// Add a material
    pub fn add_material(&mut self, material: Material) -> MaterialHandle {
        MaterialHandle::new(self.materials.insert(material))
    }

    /// Add an image
    pub fn add_image(&mut self, image: Image) -> ImageHandle {
        ImageHandle::new(self.images.insert(image))
    }

    /// Set the world settings
    pub fn set_world(&mut self, world: World) {
        self.world = Some(world);
    }

    /// Set the directory `//` image paths are relative to
    pub fn set_source_dir(&mut self, dir: impl Into<PathBuf>) {
        self.source_dir = Some(dir.into());
    }

    /// Mutable access to an object
    pub fn object_mut(&mut self, handle: ObjectHandle) -> Option<&mut SceneObject> {
        self.objects.get_mut(handle.key())
    }

    /// Mutable access to a mesh
    pub fn mesh_mut(&mut self, handle: MeshHandle) -> Option<&mut Mesh> {
        self.meshes.get_mut(handle.key())
    }

    /// Re-parent an object, rejecting cycles
    pub fn set_parent(
        &mut self,
        child: ObjectHandle,
        parent: Option<ObjectHandle>,
    ) -> Result<(), SceneError> {
        let mut ancestor = parent;
        while let Some(current) = ancestor {
            if current == child {
                let name = self.objects.get(child.key()).map(|o| o.name.clone()).unwrap_or_default();
                return Err(SceneError::ParentCycle(name));
            }
            ancestor = self.objects.get(current.key()).and_then(|o| o.parent);
        }

        if let Some(object) = self.objects.get_mut(child.key()) {
            object.parent = parent;
        }
        Ok(())
    }

    /// Number of meshes currently stored, temporary ones included
    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    /// Load a scene description file (`.ron` or `.toml`)
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let path = path.as_ref();
        let mut scene = SceneDescription::load(path)?.build()?;
        if scene.source_dir.is_none() {
            scene.source_dir = path.parent().map(Path::to_path_buf);
        }
        Ok(scene)
    }
}

impl SceneSource for Scene {
    fn objects(&self) -> Vec<ObjectHandle> {
        self.order.clone()
    }

    fn object(&self, handle: ObjectHandle) -> Option<&SceneObject> {
        self.objects.get(handle.key())
    }

    fn mesh(&self, handle: MeshHandle) -> Option<&Mesh> {
        self.meshes.get(handle.key())
    }

    fn material(&self, handle: MaterialHandle) -> Option<&Material> {
        self.materials.get(handle.key())
    }

    fn image(&self, handle: ImageHandle) -> Option<&Image> {
        self.images.get(handle.key())
    }

    fn world(&self) -> Option<&World> {
        self.world.as_ref()
    }

    fn source_dir(&self) -> Option<&Path> {
        self.source_dir.as_deref()
    }

    fn acquire_mesh(&mut self, handle: ObjectHandle, apply_modifiers: bool) -> Option<MeshHandle> {
        let object = self.objects.get(handle.key())?;
        let mut mesh = self.meshes.get(object.data?.key())?.clone();

        if apply_modifiers {
            for modifier in &object.modifiers {
                mesh = match modifier {
                    Modifier::Triangulate => mesh.triangulated(),
                };
            }
        }

        let derived = self.add_mesh(mesh);
        self.derived.insert(derived);
        Some(derived)
    }

    fn release_mesh(&mut self, mesh: MeshHandle) {
        if self.derived.remove(&mesh) {
            self.meshes.remove(mesh.key());
        } else {
            log::warn!("Ignoring release of a mesh that was not acquired: {mesh:?}");
        }
    }
}
