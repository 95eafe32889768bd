//! Transform node writer
//!
//! Opens the node wrapping an object's contents: a plain `Transform`, the
//! node type named by an override, or nothing at all for an identity
//! transform without an override. The returned [`TransformScope`] records
//! what has to be closed again.

use std::io::{self, Write};

use super::emitter::{quote, TextEmitter};
use super::identifier::IdentifierNamespace;
use super::overrides::{NodeOverride, OverrideEntry};
use crate::foundation::math::{Bounds, Mat4, Transform, Vec3, IDENTITY_EPSILON};

/// Everything needed to open one transform node
#[derive(Debug, Clone)]
pub struct TransformNode<'a> {
    /// Override lookup key and base of the `DEF` name
    pub id: &'a str,
    /// Transform relative to the enclosing node
    pub matrix: Mat4,
    /// Local bounding box of the object
    pub bounds: Bounds,
    /// World-space size of the bounding box
    pub dimensions: Vec3,
    /// Override registered for `id`
    pub entry: Option<&'a OverrideEntry>,
}

/// Closing obligations of an opened transform
#[must_use = "every opened transform must be closed with write_transform_end"]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformScope {
    /// Nothing was written, nothing needs closing
    pub skipped: bool,
    /// A joint end point is open and needs one more `}`
    pub extra_close: bool,
}

fn vec3(v: &Vec3) -> String {
    format!("{:.6} {:.6} {:.6}", v.x, v.y, v.z)
}

/// Open the node for `node` and its `children` list
///
/// The `DEF` name is reserved in `definitions` only when a node is written;
/// a name taken by an earlier node gets a numeric suffix.
pub fn write_transform_begin<W: Write>(
    out: &mut TextEmitter<W>,
    definitions: &mut IdentifierNamespace,
    node: &TransformNode<'_>,
) -> io::Result<TransformScope> {
    let transform = Transform::from_matrix(&node.matrix);
    let node_type = match node.entry {
        Some(entry) => entry.node_type(),
        None if transform.is_identity(IDENTITY_EPSILON) => {
            return Ok(TransformScope {
                skipped: true,
                extra_close: false,
            });
        }
        None => "Transform",
    };

    let definition = definitions.reserve(node.id);
    if definition != node.id {
        log::debug!("{} is already defined, writing it as {definition}", node.id);
    }
    out.line(&format!("DEF {definition} {node_type} {{"))?;

    let mut extra_close = false;
    if let Some(OverrideEntry {
        node: NodeOverride::Joint(joint),
        ..
    }) = node.entry
    {
        out.line("jointParameters HingeJointParameters {")?;
        out.line(&format!("anchor {}", vec3(&transform.position)))?;
        out.line(&format!("axis {}", vec3(&joint.axis)))?;
        out.line("}")?;
        out.line("device [")?;
        if let Some(motor) = &joint.motor_name {
            out.line("RotationalMotor {")?;
            out.line(&format!("name {}", quote(motor)))?;
            out.line("maxTorque 100000")?;
            out.line("}")?;
        }
        if let Some(sensor) = &joint.sensor_name {
            out.line("PositionSensor {")?;
            out.line(&format!("name {}", quote(sensor)))?;
            out.line("}")?;
        }
        out.line("]")?;
        out.line("endPoint Solid {")?;
        if let Some(motor) = &joint.motor_name {
            out.line(&format!("name {}", quote(motor)))?;
        }
        extra_close = true;
    }

    let (axis, angle) = transform.axis_angle();
    out.line(&format!("translation {}", vec3(&transform.position)))?;
    out.line(&format!("scale {}", vec3(&transform.scale)))?;
    out.line(&format!("rotation {} {:.6}", vec3(&axis), angle))?;

    if let Some(entry) = node.entry {
        if entry.has_physics() {
            out.line("physics Physics {")?;
            out.line("}")?;
        }
        if entry.bounding_object {
            out.line("boundingObject Transform {")?;
            out.line(&format!("translation {}", vec3(&node.bounds.center())))?;
            out.line("children [")?;
            out.line("Box {")?;
            out.line(&format!("size {}", vec3(&node.dimensions)))?;
            out.line("}")?;
            out.line("]")?;
            out.line("}")?;
        }
    }

    out.line("children [")?;
    Ok(TransformScope {
        skipped: false,
        extra_close,
    })
}

/// Close what [`write_transform_begin`] opened
pub fn write_transform_end<W: Write>(out: &mut TextEmitter<W>, scope: TransformScope) -> io::Result<()> {
    if scope.skipped {
        return Ok(());
    }
    out.line("]")?;
    out.line("}")?;
    if scope.extra_close {
        out.line("}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::overrides::JointOverride;
    use crate::foundation::math::Quat;

    fn node<'a>(matrix: Mat4, entry: Option<&'a OverrideEntry>) -> TransformNode<'a> {
        TransformNode {
            id: "ARM_TRANSFORM",
            matrix,
            bounds: Bounds::unit(),
            dimensions: Vec3::new(2.0, 2.0, 2.0),
            entry,
        }
    }

    fn render(node: &TransformNode<'_>) -> (TransformScope, String) {
        let mut out = TextEmitter::new(Vec::new());
        let scope = write_transform_begin(&mut out, &mut IdentifierNamespace::new(), node).unwrap();
        write_transform_end(&mut out, scope).unwrap();
        assert_eq!(out.finish().unwrap(), 0);
        (scope, String::from_utf8(out.into_inner()).unwrap())
    }

    #[test]
    fn test_identity_is_skipped() {
        let nearly = Mat4::new_translation(&Vec3::new(1e-6, 0.0, 0.0));
        let (scope, text) = render(&node(nearly, None));
        assert!(scope.skipped);
        assert!(text.is_empty());
    }

    #[test]
    fn test_taken_name_gets_suffix_and_keeps_override() {
        let entry = OverrideEntry::node("Solid");
        let mut definitions = IdentifierNamespace::new();
        let mut out = TextEmitter::new(Vec::new());
        for _ in 0..2 {
            let scope = write_transform_begin(&mut out, &mut definitions, &node(Mat4::identity(), Some(&entry))).unwrap();
            write_transform_end(&mut out, scope).unwrap();
        }
        // Elided nodes reserve nothing
        let scope = write_transform_begin(&mut out, &mut definitions, &node(Mat4::identity(), None)).unwrap();
        assert!(scope.skipped);

        let text = String::from_utf8(out.into_inner()).unwrap();
        assert!(text.starts_with("DEF ARM_TRANSFORM Solid {\n"));
        assert!(text.contains("\nDEF ARM_TRANSFORM_001 Solid {\n"));
        assert_eq!(definitions.len(), 2);
    }

    #[test]
    fn test_plain_transform() {
        let matrix = Transform {
            position: Vec3::new(1.0, 2.0, 3.0),
            rotation: Quat::from_axis_angle(&Vec3::z_axis(), 0.5),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
        .to_matrix();
        let (scope, text) = render(&node(matrix, None));

        assert!(!scope.skipped && !scope.extra_close);
        assert_eq!(
            text,
            "DEF ARM_TRANSFORM Transform {\n  translation 1.000000 2.000000 3.000000\n  scale 1.000000 1.000000 1.000000\n  rotation 0.000000 0.000000 1.000000 0.500000\n  children [\n  ]\n}\n"
        );
    }

    #[test]
    fn test_override_on_identity_writes_node_with_physics_and_bounds() {
        let entry = OverrideEntry::node("Solid");
        let (scope, text) = render(&node(Mat4::identity(), Some(&entry)));

        assert!(!scope.skipped);
        assert!(text.starts_with("DEF ARM_TRANSFORM Solid {\n"));
        assert!(text.contains("rotation 0.000000 1.000000 0.000000 0.000000\n"));
        assert!(text.contains("  physics Physics {\n  }\n"));
        assert!(text.contains("boundingObject Transform {\n    translation 0.000000 0.000000 0.000000\n"));
        assert!(text.contains("size 2.000000 2.000000 2.000000\n"));
    }

    #[test]
    fn test_robot_has_no_physics_and_bounds_can_be_disabled() {
        let mut entry = OverrideEntry::node("Robot");
        entry.bounding_object = false;
        let (_, text) = render(&node(Mat4::identity(), Some(&entry)));

        assert!(text.starts_with("DEF ARM_TRANSFORM Robot {\n"));
        assert!(!text.contains("physics"));
        assert!(!text.contains("boundingObject"));
    }

    #[test]
    fn test_hinge_joint_opens_end_point() {
        let entry = OverrideEntry::joint(JointOverride {
            axis: Vec3::y(),
            motor_name: Some("shoulder".to_string()),
            sensor_name: Some("shoulder sensor".to_string()),
        });
        let matrix = Mat4::new_translation(&Vec3::new(0.0, 0.0, 0.5));
        let (scope, text) = render(&node(matrix, Some(&entry)));

        assert!(scope.extra_close);
        assert!(text.starts_with("DEF ARM_TRANSFORM HingeJoint {\n  jointParameters HingeJointParameters {\n    anchor 0.000000 0.000000 0.500000\n    axis 0.000000 1.000000 0.000000\n  }\n"));
        assert!(text.contains("RotationalMotor {\n      name \"shoulder\"\n      maxTorque 100000\n"));
        assert!(text.contains("PositionSensor {\n      name \"shoulder sensor\"\n"));
        assert!(text.contains("endPoint Solid {\n    name \"shoulder\"\n    translation"));
        assert!(text.ends_with("    children [\n    ]\n  }\n}\n"));
    }
}
