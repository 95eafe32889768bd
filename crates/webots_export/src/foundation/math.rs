//! Math utilities and types
//!
//! Provides the vector, matrix and transform types shared by the scene model
//! and the exporter, plus the TRS decomposition used when writing nodes.

use approx::abs_diff_eq;
use serde::{Deserialize, Serialize};

pub use nalgebra::{Matrix3, Matrix4, Quaternion, Rotation3, Unit, Vector2, Vector3};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Tolerance used when deciding whether a decomposed transform is the identity
pub const IDENTITY_EPSILON: f32 = 1e-5;

/// Transform representing position, rotation, and scale
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// Position in 3D space
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Convert to a transformation matrix
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Decompose an affine matrix into translation, rotation and scale.
    ///
    /// A matrix with a negative determinant is decomposed with all three
    /// scale factors negated, so the rotation part stays a proper rotation.
    pub fn from_matrix(matrix: &Mat4) -> Self {
        let position = Vec3::new(matrix.m14, matrix.m24, matrix.m34);

        let mut basis = Mat3::new(
            matrix.m11, matrix.m12, matrix.m13,
            matrix.m21, matrix.m22, matrix.m23,
            matrix.m31, matrix.m32, matrix.m33,
        );

        let mut scale = Vec3::new(
            basis.column(0).magnitude(),
            basis.column(1).magnitude(),
            basis.column(2).magnitude(),
        );

        if basis.determinant() < 0.0 {
            basis = -basis;
            scale = -scale;
        }

        let rotation_matrix = Mat3::from_columns(&[
            normalized_or_zero(basis.column(0).into_owned()),
            normalized_or_zero(basis.column(1).into_owned()),
            normalized_or_zero(basis.column(2).into_owned()),
        ]);
        let rotation = Quat::from_rotation_matrix(&Rotation3::from_matrix_unchecked(rotation_matrix));
        // Sheared or degenerate bases do not give a unit quaternion
        let rotation = Quat::try_new(rotation.into_inner(), f32::EPSILON).unwrap_or_else(Quat::identity);

        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Rotation as (axis, angle in radians).
    ///
    /// A null rotation reports the +Y axis, matching the simulator default.
    pub fn axis_angle(&self) -> (Vec3, f32) {
        self.rotation
            .axis_angle()
            .map_or((Vec3::y(), 0.0), |(axis, angle)| (axis.into_inner(), angle))
    }

    /// Whether translation, rotation angle and scale are all within
    /// `epsilon` of the identity transform.
    pub fn is_identity(&self, epsilon: f32) -> bool {
        let (_, angle) = self.axis_angle();
        abs_diff_eq!(self.position, Vec3::zeros(), epsilon = epsilon)
            && abs_diff_eq!(angle, 0.0, epsilon = epsilon)
            && abs_diff_eq!(self.scale, Vec3::new(1.0, 1.0, 1.0), epsilon = epsilon)
    }
}

fn normalized_or_zero(v: Vec3) -> Vec3 {
    v.try_normalize(f32::EPSILON).unwrap_or_else(Vec3::zeros)
}

/// Invert a matrix, falling back to the identity for singular input
pub fn inverted_or_identity(matrix: &Mat4) -> Mat4 {
    matrix.try_inverse().unwrap_or_else(Mat4::identity)
}

/// Axis-aligned bounding box in object-local coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl Bounds {
    /// Create a new box from min and max points
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// The default extent of objects without geometry
    pub fn unit() -> Self {
        Self::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0))
    }

    /// Smallest box containing every point, `None` for an empty set
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vec3>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = *points.next()?;
        Some(points.fold(Self::new(first, first), |bounds, p| Self {
            min: bounds.min.inf(p),
            max: bounds.max.sup(p),
        }))
    }

    /// Get the center of the box
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the full edge lengths of the box
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::unit()
    }
}

/// Signed coordinate axis used to describe the target frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    /// +X
    #[serde(rename = "X")]
    X,
    /// +Y
    #[serde(rename = "Y")]
    Y,
    /// +Z
    #[serde(rename = "Z")]
    Z,
    /// -X
    #[serde(rename = "-X")]
    NegX,
    /// -Y
    #[serde(rename = "-Y")]
    NegY,
    /// -Z
    #[serde(rename = "-Z")]
    NegZ,
}

impl Axis {
    /// Unit vector along this axis
    pub fn vector(self) -> Vec3 {
        match self {
            Self::X => Vec3::x(),
            Self::Y => Vec3::y(),
            Self::Z => Vec3::z(),
            Self::NegX => -Vec3::x(),
            Self::NegY => -Vec3::y(),
            Self::NegZ => -Vec3::z(),
        }
    }
}

impl std::str::FromStr for Axis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "X" => Ok(Self::X),
            "Y" => Ok(Self::Y),
            "Z" => Ok(Self::Z),
            "-X" => Ok(Self::NegX),
            "-Y" => Ok(Self::NegY),
            "-Z" => Ok(Self::NegZ),
            _ => Err(format!("Unknown axis: {s}")),
        }
    }
}

/// Build the matrix taking the scene frame (forward +Y, up +Z) to a frame
/// with the given forward and up axes.
///
/// Returns `None` when the two axes are parallel.
pub fn axis_conversion(forward: Axis, up: Axis) -> Option<Mat4> {
    let forward = forward.vector();
    let up = up.vector();
    let right = forward.cross(&up);
    if right.magnitude_squared() < 0.5 {
        return None;
    }

    let basis = Mat3::from_columns(&[right, forward, up]);
    Some(basis.to_homogeneous())
}
