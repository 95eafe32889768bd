//! Webots world export
//!
//! Walks a [`SceneSource`](crate::scene::SceneSource) and writes a `.wbt`
//! world: one transform node per exported object, one `Group` of shapes per
//! distinct mesh, `DEF`/`USE` sharing for meshes, coordinates and images.

pub mod cache;
pub mod emitter;
pub mod error;
pub mod exporter;
pub mod geometry;
pub mod hierarchy;
pub mod identifier;
pub mod options;
pub mod overrides;
pub mod paths;
pub mod transform;

#[cfg(test)]
mod tests;

pub use cache::ResourceCache;
pub use emitter::TextEmitter;
pub use error::{ExportError, ExportResult};
pub use exporter::{ExportReport, ExportStats, WebotsExporter};
pub use hierarchy::{build_hierarchy, HierarchyNode};
pub use identifier::{sanitize, IdentifierNamespace};
pub use options::{ensure_extension, ExportOptions, PathMode, SceneHeader};
pub use overrides::{JointOverride, NodeOverride, OverrideEntry, OverrideError, OverrideTable};
pub use paths::{copy_assets, CopySet, PathReference, PathResolver};
pub use transform::{write_transform_begin, write_transform_end, TransformNode, TransformScope};
