//! Webots world exporter
//!
//! [`WebotsExporter::export`] walks the export forest depth first. Each object
//! gets a transform node (possibly elided or replaced by an override), then
//! the face sets of its renderable representations, then its children.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::cache::ResourceCache;
use super::emitter::TextEmitter;
use super::error::{ExportError, ExportResult};
use super::geometry::GeometryWriter;
use super::hierarchy::{build_hierarchy, HierarchyNode};
use super::options::{ensure_extension, ExportOptions};
use super::overrides::OverrideTable;
use super::paths::{copy_assets, PathReference, PathResolver};
use super::transform::{write_transform_begin, write_transform_end, TransformNode};
use crate::foundation::math::{inverted_or_identity, Mat4};
use crate::scene::{MeshHandle, ObjectHandle, ObjectKind, SceneSource};

/// Length mesh names are cut to before a `.NNN` suffix is added
const MESH_NAME_PREFIX_LEN: usize = 17;

/// Counters for one export
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportStats {
    /// Objects written, elided transforms included
    pub objects: usize,
    /// Transform nodes elided as identity
    pub skipped_transforms: usize,
    /// Mesh definitions written
    pub meshes: usize,
    /// Image definitions written
    pub images: usize,
    /// Temporary meshes evaluated
    pub derived_meshes: usize,
}

/// Result of [`WebotsExporter::save`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    /// File written
    pub path: PathBuf,
    /// Export counters
    pub stats: ExportStats,
    /// Textures copied next to the world file
    pub copied_assets: usize,
}

/// Scene to Webots world exporter
#[derive(Debug, Clone, Default)]
pub struct WebotsExporter {
    options: ExportOptions,
}

impl WebotsExporter {
    /// Create an exporter
    pub fn new(options: ExportOptions) -> Self {
        Self { options }
    }

    /// Options in use
    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Write the world for `scene` to `out`.
    ///
    /// Texture URLs come from `resolver`; copies it queues are left to the
    /// caller.
    pub fn export<S, W, R>(
        &self,
        scene: &mut S,
        overrides: &OverrideTable,
        resolver: &mut R,
        out: W,
    ) -> ExportResult<ExportStats>
    where
        S: SceneSource + ?Sized,
        W: Write,
        R: PathResolver + ?Sized,
    {
        let mut session = ExportSession {
            scene,
            overrides,
            resolver,
            options: &self.options,
            global_matrix: self.options.global_matrix()?,
            out: TextEmitter::new(out),
            cache: ResourceCache::new(),
            mesh_names: HashSet::new(),
            stats: ExportStats::default(),
        };
        session.run()
    }

    /// Export `scene` to `path` (`.wbt` appended if missing), then copy
    /// queued textures.
    pub fn save<S: SceneSource + ?Sized>(&self, scene: &mut S, path: impl AsRef<Path>) -> ExportResult<ExportReport> {
        let path = ensure_extension(path);
        let output_dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let output_dir = if output_dir.is_absolute() {
            output_dir
        } else {
            std::env::current_dir()?.join(output_dir)
        };
        let source_dir = scene
            .source_dir()
            .map_or_else(|| output_dir.clone(), Path::to_path_buf);

        let overrides = self
            .options
            .overrides_path
            .as_ref()
            .map(OverrideTable::load_or_empty)
            .unwrap_or_default();
        let mut resolver = PathReference::new(self.options.path_mode, source_dir, output_dir);

        log::info!("Starting Webots export to {}", path.display());
        let file = File::create(&path)?;
        let mut writer = BufWriter::new(file);
        let stats = self.export(scene, &overrides, &mut resolver, &mut writer)?;
        writer.flush()?;
        drop(writer);

        let copied_assets = copy_assets(resolver.copy_set())?;
        log::info!(
            "Finished Webots export to {}: {} objects, {} meshes, {} images, {} textures copied",
            path.display(),
            stats.objects,
            stats.meshes,
            stats.images,
            copied_assets
        );

        Ok(ExportReport {
            path,
            stats,
            copied_assets,
        })
    }
}

/// State of one export run
struct ExportSession<'a, S: ?Sized, W: Write, R: ?Sized> {
    scene: &'a mut S,
    overrides: &'a OverrideTable,
    resolver: &'a mut R,
    options: &'a ExportOptions,
    global_matrix: Mat4,
    out: TextEmitter<W>,
    cache: ResourceCache,
    mesh_names: HashSet<String>,
    stats: ExportStats,
}

impl<S, W, R> ExportSession<'_, S, W, R>
where
    S: SceneSource + ?Sized,
    W: Write,
    R: PathResolver + ?Sized,
{
    fn run(&mut self) -> ExportResult<ExportStats> {
        self.write_header()?;

        let candidates: Vec<ObjectHandle> = self
            .scene
            .objects()
            .into_iter()
            .filter(|&handle| {
                self.scene
                    .object(handle)
                    .is_some_and(|o| o.visible && (o.selected || !self.options.use_selection))
            })
            .collect();
        let forest = build_hierarchy(&*self.scene, &candidates);
        log::debug!("Exporting {} objects in {} trees", candidates.len(), forest.len());

        for node in &forest {
            self.export_object(None, node)?;
        }

        let depth = self.out.finish()?;
        if depth != 0 {
            return Err(ExportError::InvalidScene(format!(
                "unbalanced output, {depth} nodes left open"
            )));
        }

        self.stats.meshes = self.cache.meshes.emitted_count();
        self.stats.images = self.cache.images.emitted_count();
        Ok(self.stats)
    }

    fn write_header(&mut self) -> ExportResult<()> {
        let header = &self.options.header;
        let [ox, oy, oz, angle] = header.viewpoint_orientation;
        let [px, py, pz] = header.viewpoint_position;

        self.out.line("#VRML_SIM R2019a utf8")?;
        self.out.line("WorldInfo {")?;
        self.out.line(&format!("basicTimeStep {}", header.basic_time_step))?;
        self.out.line("}")?;
        self.out.line("Viewpoint {")?;
        self.out.line(&format!("orientation {ox:?} {oy:?} {oz:?} {angle:?}"))?;
        self.out.line(&format!("position {px:?} {py:?} {pz:?}"))?;
        self.out.line("}")?;
        self.out.line("TexturedBackground {")?;
        self.out.line("}")?;
        self.out.line("TexturedBackgroundLight {")?;
        self.out.line("}")?;
        Ok(())
    }

    fn export_object(&mut self, parent: Option<ObjectHandle>, node: &HierarchyNode) -> ExportResult<()> {
        let handle = node.object;
        let Some(object) = self.scene.object(handle) else {
            return Ok(());
        };
        let name = object.name.clone();
        let world = object.matrix_world;
        let bounds = self.scene.bounds(handle);
        let dimensions = object.dimensions(&bounds);

        let matrix = match parent.and_then(|p| self.scene.object(p)) {
            Some(parent) => inverted_or_identity(&parent.matrix_world) * world,
            None => self.global_matrix * world,
        };

        let id = self.cache.objects.lookup_or_create(handle, &name);
        let transform_id = format!("{id}_TRANSFORM");
        let scope = write_transform_begin(
            &mut self.out,
            &mut self.cache.definitions,
            &TransformNode {
                id: &transform_id,
                matrix,
                bounds,
                dimensions,
                entry: self.overrides.get(&transform_id),
            },
        )?;
        self.stats.objects += 1;
        if scope.skipped {
            self.stats.skipped_transforms += 1;
            log::debug!("Elided identity transform of '{name}'");
        } else {
            log::debug!("Wrote {transform_id} for '{name}'");
        }

        let world_inverse = inverted_or_identity(&world);
        for (derived, derived_world) in self.scene.derived_objects(handle) {
            self.export_geometry(derived, &(world_inverse * derived_world))?;
        }

        for child in &node.children {
            self.export_object(Some(handle), child)?;
        }

        write_transform_end(&mut self.out, scope)?;
        Ok(())
    }

    /// Write the face set of one renderable representation, evaluating a
    /// temporary mesh where needed and releasing it straight after.
    fn export_geometry(&mut self, object: ObjectHandle, matrix: &Mat4) -> ExportResult<()> {
        let Some(obj) = self.scene.object(object) else {
            return Ok(());
        };
        if !obj.kind.is_geometry() {
            log::trace!("Ignoring '{}' of kind {:?}", obj.name, obj.kind);
            return Ok(());
        }

        let evaluate = obj.kind != ObjectKind::Mesh || (self.options.use_mesh_modifiers && obj.is_modified());
        if !evaluate {
            let Some(data) = obj.data else {
                return Ok(());
            };
            self.write_face_set(object, data, None, matrix)?;
            return Ok(());
        }

        let object_name = obj.name.clone();
        let Some(mesh) = self.scene.acquire_mesh(object, self.options.use_mesh_modifiers) else {
            log::debug!("No geometry for '{object_name}'");
            return Ok(());
        };
        self.stats.derived_meshes += 1;

        let mesh_name = self.unique_mesh_name(&object_name);
        let written = self.write_face_set(object, mesh, Some(&mesh_name), matrix);
        self.scene.release_mesh(mesh);
        written?;
        Ok(())
    }

    fn write_face_set(
        &mut self,
        object: ObjectHandle,
        mesh: MeshHandle,
        mesh_name: Option<&str>,
        matrix: &Mat4,
    ) -> std::io::Result<()> {
        let mut writer = GeometryWriter {
            out: &mut self.out,
            cache: &mut self.cache,
            resolver: &mut *self.resolver,
            overrides: self.overrides,
        };
        writer.write_indexed_face_set(&*self.scene, object, mesh, mesh_name, matrix)
    }

    /// Name for a temporary mesh: the object name without a numeric
    /// `.NNN` suffix, disambiguated as `<17 chars>.NNN` within the run
    fn unique_mesh_name(&mut self, object_name: &str) -> String {
        unique_mesh_name(&mut self.mesh_names, object_name)
    }
}

fn unique_mesh_name(used: &mut HashSet<String>, object_name: &str) -> String {
    let base = object_name
        .trim_end_matches(|c: char| c.is_ascii_digit())
        .trim_end_matches('.');
    let prefix: String = base.chars().take(MESH_NAME_PREFIX_LEN).collect();

    let mut name = base.to_string();
    let mut counter = 0u32;
    while used.contains(&name) {
        name = format!("{prefix}.{counter:03}");
        counter += 1;
    }
    used.insert(name.clone());
    name
}
