//! Texture path resolution and asset copying
//!
//! Each image is written with a list of candidate URLs. The first candidate
//! follows the configured [`PathMode`]; in copy mode the image is also
//! queued for copying into the output directory. Copies run in one batch
//! after the world file is complete.

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

use super::error::{ExportError, ExportResult};
use super::options::PathMode;

/// Sub-directory of the output directory receiving copied textures
pub const COPY_SUBDIR: &str = "textures";

/// Prefix marking a path relative to the scene file
pub const SCENE_RELATIVE_PREFIX: &str = "//";

/// Pending `(source, destination)` copies, sorted and deduplicated
pub type CopySet = BTreeSet<(PathBuf, PathBuf)>;

/// Resolves image file paths into world file URLs
pub trait PathResolver {
    /// Candidate URLs for an image stored at `filepath`, preferred first
    fn image_urls(&mut self, filepath: &Path) -> Vec<String>;
}

/// Resolver implementing the [`PathMode`] rules
#[derive(Debug, Clone)]
pub struct PathReference {
    mode: PathMode,
    source_dir: PathBuf,
    output_dir: PathBuf,
    copy_set: CopySet,
}

impl PathReference {
    /// Resolver for a scene in `source_dir` written to `output_dir`
    pub fn new(mode: PathMode, source_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            mode,
            source_dir: normalize(&source_dir.into()),
            output_dir: normalize(&output_dir.into()),
            copy_set: CopySet::new(),
        }
    }

    /// Copies queued so far
    pub fn copy_set(&self) -> &CopySet {
        &self.copy_set
    }

    /// Take the queued copies
    pub fn into_copy_set(self) -> CopySet {
        self.copy_set
    }

    /// Absolute form of a stored image path
    pub fn absolute(&self, filepath: &Path) -> PathBuf {
        let joined = match scene_relative(filepath) {
            Some(rest) => self.source_dir.join(rest),
            None if filepath.is_relative() => self.source_dir.join(filepath),
            None => filepath.to_path_buf(),
        };
        normalize(&joined)
    }

    /// Path written as the preferred reference for `filepath`
    pub fn reference(&mut self, filepath: &Path) -> PathBuf {
        let absolute = self.absolute(filepath);

        let mode = match self.mode {
            PathMode::Auto if absolute.starts_with(&self.output_dir) => PathMode::Relative,
            PathMode::Auto => PathMode::Absolute,
            PathMode::Match if scene_relative(filepath).is_some() => PathMode::Relative,
            PathMode::Match => PathMode::Absolute,
            other => other,
        };

        match mode {
            PathMode::Relative => relative_to(&absolute, &self.output_dir).unwrap_or(absolute),
            PathMode::Strip => absolute.file_name().map_or(absolute.clone(), PathBuf::from),
            PathMode::Copy => {
                let Some(file_name) = absolute.file_name() else {
                    return absolute;
                };
                let destination = self.output_dir.join(COPY_SUBDIR).join(file_name);
                let reference = relative_to(&destination, &self.output_dir)
                    .unwrap_or_else(|| destination.clone());
                self.copy_set.insert((absolute, destination));
                reference
            }
            _ => absolute,
        }
    }
}

impl PathResolver for PathReference {
    fn image_urls(&mut self, filepath: &Path) -> Vec<String> {
        let absolute = self.absolute(filepath);
        let mut candidates = vec![self.reference(filepath)];
        if let Some(name) = absolute.file_name() {
            candidates.push(PathBuf::from(name));
        }
        if self.mode != PathMode::Relative {
            candidates.push(absolute);
        }

        let mut urls: Vec<String> = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let url = candidate.to_string_lossy().replace('\\', "/");
            if !urls.contains(&url) {
                urls.push(url);
            }
        }
        urls
    }
}

fn scene_relative(filepath: &Path) -> Option<&str> {
    filepath.to_str()?.strip_prefix(SCENE_RELATIVE_PREFIX)
}

/// Lexically resolve `.` and `..` components
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(out.components().next_back(), Some(Component::Normal(_)))
                    && out.pop();
                if !popped && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// `path` expressed relative to `base`; both must be normalized and either
/// both absolute or both relative
pub fn relative_to(path: &Path, base: &Path) -> Option<PathBuf> {
    if path.has_root() != base.has_root() {
        return None;
    }

    let path_parts: Vec<Component> = path.components().filter(|c| *c != Component::CurDir).collect();
    let base_parts: Vec<Component> = base.components().filter(|c| *c != Component::CurDir).collect();
    let common = path_parts
        .iter()
        .zip(&base_parts)
        .take_while(|(a, b)| a == b)
        .count();

    // Different drive or root
    if path.has_root() && common == 0 {
        return None;
    }
    if base_parts[common..].iter().any(|c| *c == Component::ParentDir) {
        return None;
    }

    let mut relative = PathBuf::new();
    for _ in common..base_parts.len() {
        relative.push("..");
    }
    for part in &path_parts[common..] {
        relative.push(part.as_os_str());
    }
    if relative.as_os_str().is_empty() {
        relative.push(".");
    }
    Some(relative)
}

/// Execute a copy batch, returning the number of files copied.
///
/// Sources that do not exist are logged and skipped; any other failure
/// aborts the batch.
pub fn copy_assets(copy_set: &CopySet) -> ExportResult<usize> {
    let mut copied = 0;
    for (source, destination) in copy_set {
        if !source.is_file() {
            log::warn!("Texture {} does not exist, not copied", source.display());
            continue;
        }
        if source == destination {
            continue;
        }

        let copy = |source: &Path, destination: &Path| -> std::io::Result<()> {
            if let Some(parent) = destination.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(source, destination).map(|_| ())
        };
        copy(source, destination).map_err(|error| ExportError::AssetCopy {
            path: source.clone(),
            destination: destination.clone(),
            error,
        })?;
        log::debug!("Copied {} to {}", source.display(), destination.display());
        copied += 1;
    }
    Ok(copied)
}
