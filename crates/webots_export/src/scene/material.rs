//! Materials, textures, images and world settings

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ImageHandle;
use crate::foundation::math::Vec3;

/// Texture bound to a material slot
#[derive(Debug, Clone, PartialEq)]
pub enum Texture {
    /// Image texture; the image may be unset
    Image(Option<ImageHandle>),
    /// Any non-image texture (procedural etc.), ignored on export
    Other(String),
}

/// Surface material
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Display name
    pub name: String,
    /// Diffuse colour (linear RGB)
    pub diffuse_color: Vec3,
    /// Amount of world ambient light received
    pub ambient: f32,
    /// Emission intensity
    pub emit: f32,
    /// Whether per-face UV images override the material textures
    pub use_face_texture: bool,
    /// Texture slots in priority order; empty slots are `None`
    pub texture_slots: Vec<Option<Texture>>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            diffuse_color: Vec3::new(0.8, 0.8, 0.8),
            ambient: 1.0,
            emit: 0.0,
            use_face_texture: false,
            texture_slots: Vec::new(),
        }
    }
}

impl Material {
    /// Create a material with default properties
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Builder pattern: set diffuse colour
    pub fn with_diffuse(mut self, color: Vec3) -> Self {
        self.diffuse_color = color;
        self
    }

    /// Builder pattern: append an image texture slot
    pub fn with_image_texture(mut self, image: ImageHandle) -> Self {
        self.texture_slots.push(Some(Texture::Image(Some(image))));
        self
    }

    /// First slot holding an image texture with an image assigned
    pub fn image_texture(&self) -> Option<ImageHandle> {
        self.texture_slots.iter().flatten().find_map(|texture| match texture {
            Texture::Image(image) => *image,
            Texture::Other(_) => None,
        })
    }
}

/// Image referenced by textures
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// Display name
    pub name: String,
    /// Stored file path; a leading `//` means relative to the scene file
    pub filepath: PathBuf,
}

impl Image {
    /// Create an image record
    pub fn new(name: impl Into<String>, filepath: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            filepath: filepath.into(),
        }
    }
}

/// Scene-wide lighting settings
#[derive(Debug, Clone, PartialEq)]
pub struct World {
    /// Ambient light colour
    pub ambient_color: Vec3,
}

impl Default for World {
    fn default() -> Self {
        Self {
            ambient_color: Vec3::zeros(),
        }
    }
}
