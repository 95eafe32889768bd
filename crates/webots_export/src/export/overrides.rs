//! Per-node override table
//!
//! A JSON object keyed by node identifier (`ARM_TRANSFORM`,
//! `CUBE_IFS_TRANSFORM`, ...) that replaces the generic `Transform` written
//! for a node with a simulator node type:
//!
//! ```json
//! {
//!     "BASE_TRANSFORM": { "webotsType": "Robot" },
//!     "ARM_TRANSFORM": {
//!         "webotsType": "HingeJoint",
//!         "hingeJointParameters": { "axis": "0 1 0" },
//!         "motorName": "shoulder motor",
//!         "positionSensorName": "shoulder sensor"
//!     }
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::foundation::math::Vec3;

/// Node type that receives joint parameters and an end point
pub const HINGE_JOINT: &str = "HingeJoint";

/// Node type written without a physics block
pub const ROBOT: &str = "Robot";

/// Override table errors
#[derive(Error, Debug)]
pub enum OverrideError {
    /// The file could not be read
    #[error("Failed to read override table: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not a JSON object of override records
    #[error("Malformed override table: {0}")]
    Json(#[from] serde_json::Error),

    /// A record has an unusable value
    #[error("Invalid override for '{node}': {reason}")]
    Invalid {
        /// Node identifier of the record
        node: String,
        /// What is wrong with it
        reason: String,
    },
}

/// Hinge joint data
#[derive(Debug, Clone, PartialEq)]
pub struct JointOverride {
    /// Rotation axis in the joint frame
    pub axis: Vec3,
    /// Name of the rotational motor device
    pub motor_name: Option<String>,
    /// Name of the position sensor device
    pub sensor_name: Option<String>,
}

/// Replacement node kind
#[derive(Debug, Clone, PartialEq)]
pub enum NodeOverride {
    /// `HingeJoint` with joint parameters, devices and a `Solid` end point
    Joint(JointOverride),
    /// Any other node type, written in place of `Transform`
    Node {
        /// Simulator node type, e.g. `Solid` or `Robot`
        node_type: String,
    },
}

/// One entry of the table
#[derive(Debug, Clone, PartialEq)]
pub struct OverrideEntry {
    /// Node to write
    pub node: NodeOverride,
    /// Whether to write a box bounding object
    pub bounding_object: bool,
}

impl OverrideEntry {
    /// Entry for a plain node type with a bounding object
    pub fn node(node_type: impl Into<String>) -> Self {
        Self {
            node: NodeOverride::Node {
                node_type: node_type.into(),
            },
            bounding_object: true,
        }
    }

    /// Entry for a hinge joint with a bounding object
    pub fn joint(joint: JointOverride) -> Self {
        Self {
            node: NodeOverride::Joint(joint),
            bounding_object: true,
        }
    }

    /// Simulator node type name
    pub fn node_type(&self) -> &str {
        match &self.node {
            NodeOverride::Joint(_) => HINGE_JOINT,
            NodeOverride::Node { node_type } => node_type,
        }
    }

    /// Whether an empty `physics Physics { }` block is written
    pub fn has_physics(&self) -> bool {
        self.node_type() != ROBOT
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AxisValue {
    Text(String),
    Vector([f32; 3]),
}

#[derive(Debug, Default, Deserialize)]
struct HingeJointRecord {
    axis: Option<AxisValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OverrideRecord {
    webots_type: String,
    #[serde(default)]
    hinge_joint_parameters: Option<HingeJointRecord>,
    #[serde(default)]
    motor_name: Option<String>,
    #[serde(default)]
    position_sensor_name: Option<String>,
    #[serde(default = "default_true")]
    bounding_object: bool,
}

fn default_true() -> bool {
    true
}

fn parse_axis(node: &str, value: AxisValue) -> Result<Vec3, OverrideError> {
    let invalid = |reason: String| OverrideError::Invalid {
        node: node.to_string(),
        reason,
    };
    match value {
        AxisValue::Vector(v) => Ok(v.into()),
        AxisValue::Text(text) => {
            let components = text
                .split_whitespace()
                .map(str::parse::<f32>)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| invalid(format!("axis '{text}': {e}")))?;
            match components[..] {
                [x, y, z] => Ok(Vec3::new(x, y, z)),
                _ => Err(invalid(format!("axis '{text}' needs three components"))),
            }
        }
    }
}

impl OverrideRecord {
    fn into_entry(self, node: &str) -> Result<OverrideEntry, OverrideError> {
        if self.webots_type.trim().is_empty() {
            return Err(OverrideError::Invalid {
                node: node.to_string(),
                reason: "empty webotsType".to_string(),
            });
        }

        let kind = if self.webots_type == HINGE_JOINT {
            let axis = match self.hinge_joint_parameters.and_then(|p| p.axis) {
                Some(value) => parse_axis(node, value)?,
                None => {
                    log::warn!("Hinge joint '{node}' has no axis, using 0 0 1");
                    Vec3::z()
                }
            };
            NodeOverride::Joint(JointOverride {
                axis,
                motor_name: self.motor_name,
                sensor_name: self.position_sensor_name,
            })
        } else {
            NodeOverride::Node {
                node_type: self.webots_type,
            }
        };

        Ok(OverrideEntry {
            node: kind,
            bounding_object: self.bounding_object,
        })
    }
}

/// Override entries keyed by node identifier
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverrideTable {
    entries: HashMap<String, OverrideEntry>,
}

impl OverrideTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON document
    pub fn from_json_str(json: &str) -> Result<Self, OverrideError> {
        let records: HashMap<String, OverrideRecord> = serde_json::from_str(json)?;
        let entries = records
            .into_iter()
            .map(|(node, record)| record.into_entry(&node).map(|entry| (node, entry)))
            .collect::<Result<_, _>>()?;
        Ok(Self { entries })
    }

    /// Read and parse a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, OverrideError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Like [`OverrideTable::load`], but a missing or malformed file yields an
    /// empty table
    pub fn load_or_empty(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(table) => {
                log::info!("Loaded {} node overrides from {}", table.len(), path.display());
                table
            }
            Err(e) => {
                log::warn!("Ignoring override table {}: {e}", path.display());
                Self::new()
            }
        }
    }

    /// Add or replace an entry
    pub fn insert(&mut self, node: impl Into<String>, entry: OverrideEntry) {
        self.entries.insert(node.into(), entry);
    }

    /// Entry for a node identifier
    pub fn get(&self, node: &str) -> Option<&OverrideEntry> {
        self.entries.get(node)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
