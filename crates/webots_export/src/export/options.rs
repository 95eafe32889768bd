//! # Export Options
//!
//! Settings for one export run. Options are serializable so they can be kept
//! in a TOML or RON file next to the scene and loaded with
//! [`Config::load_from_file`].
//!
//! ## Defaults
//!
//! - only selected, visible objects are written
//! - modifier stacks are not evaluated
//! - texture paths are relative when the image lives below the output folder
//! - the scene frame is kept as is (forward `Y`, up `Z`)

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::{ExportError, ExportResult};
use crate::config::Config;
use crate::foundation::math::{axis_conversion, Axis, Mat4};

/// World file extension
pub const WORLD_EXTENSION: &str = "wbt";

/// How texture paths are written into the world file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathMode {
    /// Relative when the image is inside the output directory, else absolute
    #[default]
    Auto,
    /// Always absolute
    Absolute,
    /// Always relative to the output directory
    Relative,
    /// Relative if the stored path is scene-relative (`//`), else absolute
    Match,
    /// File name only
    Strip,
    /// Copy into `textures/` next to the output file and reference relatively
    Copy,
}

impl PathMode {
    /// All modes, in declaration order
    pub const ALL: [Self; 6] = [
        Self::Auto,
        Self::Absolute,
        Self::Relative,
        Self::Match,
        Self::Strip,
        Self::Copy,
    ];

    /// Lower-case mode name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Absolute => "absolute",
            Self::Relative => "relative",
            Self::Match => "match",
            Self::Strip => "strip",
            Self::Copy => "copy",
        }
    }
}

impl fmt::Display for PathMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PathMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown path mode: {s}"))
    }
}

/// Fixed simulation settings written at the top of the world file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneHeader {
    /// Simulation step in milliseconds
    pub basic_time_step: u32,
    /// Viewpoint orientation as axis and angle
    pub viewpoint_orientation: [f32; 4],
    /// Viewpoint position
    pub viewpoint_position: [f32; 3],
}

impl Default for SceneHeader {
    fn default() -> Self {
        Self {
            basic_time_step: 8,
            viewpoint_orientation: [-0.5, -0.852, -0.159, 0.71],
            viewpoint_position: [-3.6, 2.0, 5.4],
        }
    }
}

/// Options for one export run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Export only selected objects
    pub use_selection: bool,
    /// Evaluate modifier stacks before writing geometry
    pub use_mesh_modifiers: bool,
    /// Texture path handling
    pub path_mode: PathMode,
    /// Target forward axis
    pub axis_forward: Axis,
    /// Target up axis
    pub axis_up: Axis,
    /// JSON override table
    pub overrides_path: Option<PathBuf>,
    /// World header settings
    pub header: SceneHeader,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            use_selection: true,
            use_mesh_modifiers: false,
            path_mode: PathMode::Auto,
            axis_forward: Axis::Y,
            axis_up: Axis::Z,
            overrides_path: None,
            header: SceneHeader::default(),
        }
    }
}

impl Config for ExportOptions {}

impl ExportOptions {
    /// Matrix applied to root objects to convert into the target frame
    pub fn global_matrix(&self) -> ExportResult<Mat4> {
        axis_conversion(self.axis_forward, self.axis_up).ok_or_else(|| {
            ExportError::InvalidOptions(format!(
                "forward axis {:?} and up axis {:?} are parallel",
                self.axis_forward, self.axis_up
            ))
        })
    }
}

/// Append `.wbt` unless the path already ends with it (in any case)
pub fn ensure_extension(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    let has_extension = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(WORLD_EXTENSION));
    if has_extension {
        return path.to_path_buf();
    }

    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(WORLD_EXTENSION);
    PathBuf::from(name)
}
