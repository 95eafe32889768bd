//! Indexed face set writer
//!
//! A mesh is written once as `DEF GROUP_<mesh> Group`, holding one `Shape`
//! per (material slot, image) combination used by its faces. Later users of
//! the same mesh write `USE GROUP_<mesh>`. All shapes of a mesh share one
//! `Coordinate` node listing every vertex.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io::{self, Write};

use super::cache::ResourceCache;
use super::emitter::{quote, TextEmitter};
use super::overrides::OverrideTable;
use super::paths::PathResolver;
use super::transform::{write_transform_begin, write_transform_end, TransformNode};
use crate::foundation::math::{Mat4, Vec2, Vec3};
use crate::scene::{ImageHandle, Material, Mesh, MeshHandle, ObjectHandle, SceneSource, World};

/// Crease angle for meshes without a custom smoothing angle
pub const FULL_SMOOTH_CREASE_ANGLE: f32 = 1.0;

/// Faces of one mesh sharing a material slot and an image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaceGroup {
    /// Material slot index
    pub material_index: usize,
    /// Resolved image
    pub image: Option<ImageHandle>,
    /// Face indices in mesh order
    pub faces: Vec<usize>,
}

/// Per-slot material data of a mesh; a mesh without slots has one empty slot
struct MaterialSlots<'s> {
    materials: Vec<Option<&'s Material>>,
    images: Vec<Option<ImageHandle>>,
}

impl<'s> MaterialSlots<'s> {
    fn new<S: SceneSource + ?Sized>(scene: &'s S, mesh: &Mesh) -> Self {
        let materials: Vec<Option<&Material>> = if mesh.materials.is_empty() {
            vec![None]
        } else {
            mesh.materials
                .iter()
                .map(|slot| slot.and_then(|handle| scene.material(handle)))
                .collect()
        };
        let images = materials
            .iter()
            .map(|material| material.and_then(Material::image_texture))
            .collect();
        Self { materials, images }
    }

    /// Slot of a face; out of range indices use the last slot
    fn slot(&self, material_index: usize) -> usize {
        material_index.min(self.materials.len() - 1)
    }

    /// Empty slots behave as if they allowed face textures
    fn uses_face_texture(&self, slot: usize) -> bool {
        self.materials[slot].map_or(true, |material| material.use_face_texture)
    }

    fn any_face_texture(&self) -> bool {
        (0..self.materials.len()).any(|slot| self.uses_face_texture(slot))
    }
}

/// Whether the mesh UV layer is written, i.e. it exists, matches the face
/// list and some slot takes per-face textures
fn writes_uvs(mesh: &Mesh, slots: &MaterialSlots<'_>) -> bool {
    mesh.uv_layer
        .as_ref()
        .is_some_and(|layer| layer.faces.len() == mesh.faces.len())
        && slots.any_face_texture()
}

/// Partition faces by (material slot, image) in output order: slot
/// ascending, then image name ascending with "no image" first.
pub fn group_faces<S: SceneSource + ?Sized>(scene: &S, mesh: &Mesh) -> Vec<FaceGroup> {
    let slots = MaterialSlots::new(scene, mesh);
    let face_slots: Vec<usize> = mesh.faces.iter().map(|f| slots.slot(f.material_index)).collect();

    let face_images: Vec<Option<ImageHandle>> = match &mesh.uv_layer {
        Some(layer) if writes_uvs(mesh, &slots) => face_slots
            .iter()
            .zip(&layer.faces)
            .map(|(&slot, face_uv)| {
                if slots.uses_face_texture(slot) {
                    face_uv.image
                } else {
                    slots.images[slot]
                }
            })
            .collect(),
        _ if slots.images.iter().any(Option::is_some) => {
            face_slots.iter().map(|&slot| slots.images[slot]).collect()
        }
        _ => vec![None; mesh.faces.len()],
    };

    // Images in first-use order; this breaks ties between equal names
    let mut images: Vec<Option<ImageHandle>> = Vec::new();
    for image in &face_images {
        if !images.contains(image) {
            images.push(*image);
        }
    }
    let image_name = |image: &Option<ImageHandle>| -> String {
        image
            .and_then(|handle| scene.image(handle))
            .map(|image| image.name.clone())
            .unwrap_or_default()
    };

    let mut groups: BTreeMap<(usize, String, usize), FaceGroup> = BTreeMap::new();
    for (face, (&slot, image)) in face_slots.iter().zip(&face_images).enumerate() {
        let rank = images.iter().position(|i| i == image).unwrap_or_default();
        groups
            .entry((slot, image_name(image), rank))
            .or_insert_with(|| FaceGroup {
                material_index: slot,
                image: *image,
                faces: Vec::new(),
            })
            .faces
            .push(face);
    }
    groups.into_values().collect()
}

fn clamp_color(color: Vec3) -> Vec3 {
    color.map(|c| c.clamp(0.0, 1.0))
}

fn color(v: &Vec3) -> String {
    format!("{:.3} {:.3} {:.3}", v.x, v.y, v.z)
}

/// Writes face sets on behalf of an export session
pub struct GeometryWriter<'a, W: Write, R: PathResolver + ?Sized> {
    /// Output
    pub out: &'a mut TextEmitter<W>,
    /// Identifier and emission state
    pub cache: &'a mut ResourceCache,
    /// Texture path resolution
    pub resolver: &'a mut R,
    /// Node overrides
    pub overrides: &'a OverrideTable,
}

impl<W: Write, R: PathResolver + ?Sized> GeometryWriter<'_, W, R> {
    /// Write `mesh` for `object` under the face-set transform `matrix`.
    ///
    /// `mesh_name` replaces the mesh's own name when deriving its identifier.
    pub fn write_indexed_face_set<S: SceneSource + ?Sized>(
        &mut self,
        scene: &S,
        object: ObjectHandle,
        mesh_handle: MeshHandle,
        mesh_name: Option<&str>,
        matrix: &Mat4,
    ) -> io::Result<()> {
        let (Some(obj), Some(mesh)) = (scene.object(object), scene.mesh(mesh_handle)) else {
            return Ok(());
        };

        let object_id = self.cache.objects.lookup_or_create(object, &format!("OB_{}", obj.name));
        let mesh_id = self
            .cache
            .meshes
            .lookup_or_create(mesh_handle, &format!("ME_{}", mesh_name.unwrap_or(&mesh.name)));

        if !mesh.has_faces() {
            log::trace!("Mesh '{}' of '{}' has no faces", mesh.name, obj.name);
            return Ok(());
        }

        let transform_id = format!("{object_id}_IFS_TRANSFORM");
        let bounds = scene.bounds(object);
        let scope = write_transform_begin(
            &mut *self.out,
            &mut self.cache.definitions,
            &TransformNode {
                id: &transform_id,
                matrix: *matrix,
                bounds,
                dimensions: obj.dimensions(&bounds),
                entry: self.overrides.get(&transform_id),
            },
        )?;

        if let Some(group_id) = self.cache.meshes.definition(mesh_handle) {
            log::debug!("Reusing {group_id} for '{}'", obj.name);
            self.out.line(&format!("USE {group_id}"))?;
        } else {
            let group_id = self.cache.definitions.reserve(&format!("GROUP_{mesh_id}"));
            self.cache.meshes.mark_emitted(mesh_handle, group_id.clone());
            self.out.line(&format!("DEF {group_id} Group {{"))?;
            self.out.line("children [")?;
            self.write_shapes(scene, mesh, &mesh_id)?;
            self.out.line("]")?;
            self.out.line("}")?;
        }

        write_transform_end(&mut *self.out, scope)
    }

    fn write_shapes<S: SceneSource + ?Sized>(&mut self, scene: &S, mesh: &Mesh, mesh_id: &str) -> io::Result<()> {
        let slots = MaterialSlots::new(scene, mesh);
        let uv_layer = mesh.uv_layer.as_ref().filter(|_| writes_uvs(mesh, &slots));
        let world = scene.world().cloned().unwrap_or_default();
        let mut coords_id: Option<String> = None;

        for group in group_faces(scene, mesh) {
            self.out.line("Shape {")?;

            self.out.line("appearance PBRAppearance {")?;
            if let Some(image) = group.image {
                self.write_image_texture(scene, image)?;
            }
            if let Some(material) = slots.materials[group.material_index] {
                self.write_material_colors(material, &world)?;
            }
            self.out.line("}")?;

            self.out.line("geometry IndexedFaceSet {")?;
            if group.faces.iter().any(|&i| mesh.faces[i].smooth) {
                let angle = mesh.auto_smooth_angle.unwrap_or(FULL_SMOOTH_CREASE_ANGLE);
                self.out.line(&format!("creaseAngle {angle:.4}"))?;
            }

            if uv_layer.is_some() {
                self.out.line("texCoordIndex [")?;
                let mut indices = String::new();
                let mut next = 0;
                for &i in &group.faces {
                    for _ in 0..mesh.faces[i].polygon.corner_count() {
                        let _ = write!(indices, "{next} ");
                        next += 1;
                    }
                    indices.push_str("-1 ");
                }
                self.out.write(&indices)?;
                self.out.write("\n")?;
                self.out.line("]")?;
            }

            self.out.line("coordIndex [")?;
            let mut indices = String::new();
            for &i in &group.faces {
                for index in mesh.faces[i].polygon.indices() {
                    let _ = write!(indices, "{index} ");
                }
                indices.push_str("-1 ");
            }
            self.out.write(&indices)?;
            self.out.write("\n")?;
            self.out.line("]")?;

            if let Some(id) = &coords_id {
                self.out.line(&format!("coord USE {id}"))?;
            } else {
                let id = self.cache.definitions.reserve(&format!("COORDS_{mesh_id}"));
                self.out.write("coord ")?;
                self.out.write(&format!("DEF {id} "))?;
                self.out.line("Coordinate {")?;
                self.out.line("point [")?;
                let mut points = String::new();
                for v in &mesh.vertices {
                    let _ = write!(points, "{:.6} {:.6} {:.6} ", v.x, v.y, v.z);
                }
                self.out.write(&points)?;
                self.out.write("\n")?;
                self.out.line("]")?;
                self.out.line("}")?;
                coords_id = Some(id);
            }

            if let Some(layer) = uv_layer {
                self.out.line("texCoord TextureCoordinate {")?;
                self.out.line("point [")?;
                let mut points = String::new();
                for &i in &group.faces {
                    let uvs = &layer.faces[i].uvs;
                    for corner in 0..mesh.faces[i].polygon.corner_count() {
                        let uv = uvs.get(corner).copied().unwrap_or_else(Vec2::zeros);
                        let _ = write!(points, "{:.4} {:.4} ", uv.x, uv.y);
                    }
                }
                self.out.write(&points)?;
                self.out.write("\n")?;
                self.out.line("]")?;
                self.out.line("}")?;
            }

            self.out.line("}")?;
            self.out.line("}")?;
        }
        Ok(())
    }

    fn write_material_colors(&mut self, material: &Material, world: &World) -> io::Result<()> {
        let ambient = world.ambient_color * (material.ambient * 2.0);
        let emissive = (material.diffuse_color * material.emit + ambient) / 2.0;

        self.out.line(&format!("baseColor {}", color(&clamp_color(material.diffuse_color))))?;
        self.out.line(&format!("emissiveColor {}", color(&clamp_color(emissive))))?;
        self.out.line("metalness 0")?;
        self.out.line("roughness 0.5")
    }

    fn write_image_texture<S: SceneSource + ?Sized>(&mut self, scene: &S, handle: ImageHandle) -> io::Result<()> {
        let Some(image) = scene.image(handle) else {
            return Ok(());
        };
        if let Some(texture_id) = self.cache.images.definition(handle) {
            return self.out.line(&format!("texture USE {texture_id}"));
        }
        let image_id = self.cache.images.lookup_or_create(handle, &format!("IM_{}", image.name));
        let image_id = self.cache.definitions.reserve(&image_id);
        self.cache.images.mark_emitted(handle, image_id.clone());

        let urls: Vec<String> = self
            .resolver
            .image_urls(&image.filepath)
            .iter()
            .map(|url| quote(url))
            .collect();
        self.out.write("texture ")?;
        self.out.write(&format!("DEF {image_id} "))?;
        self.out.line("ImageTexture {")?;
        self.out.line(&format!("url [ {} ]", urls.join(" ")))?;
        self.out.line("}")
    }
}
