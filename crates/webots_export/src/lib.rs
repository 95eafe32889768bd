//! # Webots Export
//!
//! Serializes a 3D scene graph into a Webots world file (`.wbt`).
//!
//! ## Features
//!
//! - **Scene model**: handle-based objects, meshes, materials and images,
//!   loadable from RON or TOML scene descriptions
//! - **Deduplication**: shared meshes, coordinates and textures are written
//!   once and reused with `USE`
//! - **Overrides**: a JSON table turns chosen nodes into `Robot`, `Solid` or
//!   `HingeJoint` nodes with physics and bounding boxes
//! - **Texture paths**: absolute, relative, stripped or copied next to the
//!   world file
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use webots_export::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut scene = Scene::load("robot.ron")?;
//!     let exporter = WebotsExporter::new(ExportOptions::default());
//!     let report = exporter.save(&mut scene, "robot.wbt")?;
//!     println!("wrote {}", report.path.display());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod export;
pub mod foundation;
pub mod scene;

/// Common imports for library users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError},
        export::{
            ExportError, ExportOptions, ExportReport, ExportStats, OverrideTable, PathMode,
            PathReference, PathResolver, WebotsExporter,
        },
        foundation::math::{Axis, Bounds, Mat4, Transform, Vec2, Vec3},
        scene::{
            Face, FaceUv, Image, Material, Mesh, ObjectKind, Polygon, Scene, SceneDescription,
            SceneError, SceneObject, SceneSource, UvLayer, World,
        },
    };
}
