//! scene2wbt
//!
//! Command-line front end: loads a scene description and writes a Webots
//! world next to it (or wherever `--output` says).

use std::error::Error;
use std::path::PathBuf;

use clap::{ArgAction, Parser};
use log::{debug, info};
use webots_export::foundation::logging;
use webots_export::prelude::*;

/// Convert a scene description (.ron or .toml) into a Webots world file
#[derive(Parser, Debug)]
#[command(name = "scene2wbt")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Scene description file
    scene: PathBuf,

    /// World file to write; defaults to the scene path with a .wbt extension
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Export options file (.toml or .ron)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON table of node overrides
    #[arg(long)]
    overrides: Option<PathBuf>,

    /// Export every visible object, not just the selection
    #[arg(long)]
    all: bool,

    /// Evaluate modifier stacks before writing meshes
    #[arg(long)]
    apply_modifiers: bool,

    /// Texture path mode: auto, absolute, relative, match, strip or copy
    #[arg(long)]
    path_mode: Option<PathMode>,

    /// Forward axis of the scene (X, Y, Z, -X, -Y, -Z)
    #[arg(long, allow_hyphen_values = true)]
    forward: Option<Axis>,

    /// Up axis of the scene (X, Y, Z, -X, -Y, -Z)
    #[arg(long, allow_hyphen_values = true)]
    up: Option<Axis>,

    /// Enable verbose output (-v, -vv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn options(&self) -> Result<ExportOptions, ConfigError> {
        let mut options = match &self.config {
            Some(path) => ExportOptions::load_from_file(path)?,
            None => ExportOptions::default(),
        };
        if self.all {
            options.use_selection = false;
        }
        if self.apply_modifiers {
            options.use_mesh_modifiers = true;
        }
        if let Some(mode) = self.path_mode {
            options.path_mode = mode;
        }
        if let Some(axis) = self.forward {
            options.axis_forward = axis;
        }
        if let Some(axis) = self.up {
            options.axis_up = axis;
        }
        if let Some(path) = &self.overrides {
            options.overrides_path = Some(path.clone());
        }
        Ok(options)
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    logging::init(match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    });

    let options = cli.options()?;
    debug!("Export options: {options:?}");

    let mut scene = Scene::load(&cli.scene)?;
    let output = cli.output.clone().unwrap_or_else(|| cli.scene.with_extension(""));

    let report = WebotsExporter::new(options).save(&mut scene, output)?;
    info!(
        "Wrote {} ({} objects, {} transforms elided, {} meshes, {} images, {} textures copied)",
        report.path.display(),
        report.stats.objects,
        report.stats.skipped_transforms,
        report.stats.meshes,
        report.stats.images,
        report.copied_assets
    );
    Ok(())
}
