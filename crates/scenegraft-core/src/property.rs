//! Typed node properties.

use serde::{Deserialize, Serialize};

/// Number of values in a 4x4 transform matrix.
pub const MATRIX4_LEN: usize = 16;

/// Local transform of a scene node, as a flat numeric array.
///
/// Scene sinks usually expect a column-major 4x4 matrix; the description
/// format does not enforce that, so the values are carried verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transform(pub Vec<f64>);

impl Transform {
    /// The 4x4 identity matrix.
    pub fn identity() -> Self {
        let mut values = vec![0.0; MATRIX4_LEN];
        for i in 0..4 {
            values[i * 4 + i] = 1.0;
        }
        Self(values)
    }

    /// Column-major 4x4 translation matrix.
    pub fn translation(x: f64, y: f64, z: f64) -> Self {
        let mut transform = Self::identity();
        transform.0[12] = x;
        transform.0[13] = y;
        transform.0[14] = z;
        transform
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    /// Whether the array has the shape of a finite 4x4 matrix.
    pub fn is_matrix4(&self) -> bool {
        self.0.len() == MATRIX4_LEN && self.0.iter().all(|v| v.is_finite())
    }

    /// Translation column (indices 12..15) of a 4x4 matrix.
    pub fn translation_part(&self) -> Option<[f64; 3]> {
        match self.0.get(12..15) {
            Some(&[x, y, z]) if self.0.len() == MATRIX4_LEN => Some([x, y, z]),
            _ => None,
        }
    }

    /// Column-major product `self * local`, or `None` unless both are 4x4.
    pub fn compose(&self, local: &Transform) -> Option<Transform> {
        if self.0.len() != MATRIX4_LEN || local.0.len() != MATRIX4_LEN {
            return None;
        }
        let mut product = vec![0.0; MATRIX4_LEN];
        for col in 0..4 {
            for row in 0..4 {
                product[col * 4 + row] = (0..4)
                    .map(|k| self.0[k * 4 + row] * local.0[col * 4 + k])
                    .sum();
            }
        }
        Some(Self(product))
    }
}

impl From<Vec<f64>> for Transform {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

/// Recognized property keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyKey {
    #[serde(rename = "localTransform")]
    LocalTransform,
    #[serde(rename = "label")]
    Label,
    #[serde(rename = "appearanceURI")]
    AppearanceUri,
    #[serde(rename = "enabled")]
    Enabled,
    /// World-space center of the node. Read-only.
    #[serde(rename = "globalCenter")]
    GlobalCenter,
}

impl PropertyKey {
    /// Wire name of the key, as used in description documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyKey::LocalTransform => "localTransform",
            PropertyKey::Label => "label",
            PropertyKey::AppearanceUri => "appearanceURI",
            PropertyKey::Enabled => "enabled",
            PropertyKey::GlobalCenter => "globalCenter",
        }
    }
}

impl std::fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A property assignment with its value type fixed by the key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "key", content = "value")]
pub enum NodeProperty {
    #[serde(rename = "localTransform")]
    LocalTransform(Transform),
    #[serde(rename = "label")]
    Label(String),
    #[serde(rename = "appearanceURI")]
    AppearanceUri(String),
    #[serde(rename = "enabled")]
    Enabled(bool),
    #[serde(rename = "globalCenter")]
    GlobalCenter([f64; 3]),
}

impl NodeProperty {
    pub fn key(&self) -> PropertyKey {
        match self {
            NodeProperty::LocalTransform(_) => PropertyKey::LocalTransform,
            NodeProperty::Label(_) => PropertyKey::Label,
            NodeProperty::AppearanceUri(_) => PropertyKey::AppearanceUri,
            NodeProperty::Enabled(_) => PropertyKey::Enabled,
            NodeProperty::GlobalCenter(_) => PropertyKey::GlobalCenter,
        }
    }

    /// The boolean value, if this is an `Enabled` property.
    pub fn as_enabled(&self) -> Option<bool> {
        match self {
            NodeProperty::Enabled(enabled) => Some(*enabled),
            _ => None,
        }
    }
}
