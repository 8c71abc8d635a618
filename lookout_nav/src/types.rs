// Core spatial types shared by the navigation graph and the belief core.
//
// Defines world-space points (`Vec3`), axis-aligned bounding volumes
// (`Aabb`), and the compact integer IDs used for nav graph nodes and edges.
// All types derive `Serialize` and `Deserialize` so graphs and observations
// can be loaded from JSON.
//
// World coordinates are continuous (`f32`), unlike the graph IDs, which are
// dense indices into `NavGraph` storage.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Spatial types
// ---------------------------------------------------------------------------

/// A point or direction in world space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Squared Euclidean distance. Use this for threshold checks to avoid the
    /// square root.
    pub fn distance_squared(self, other: Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }

    /// Straight-line distance between two points.
    pub fn distance(self, other: Self) -> f32 {
        self.distance_squared(other).sqrt()
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// An axis-aligned bounding box. Both corners are inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Build a box centred on `center` spanning `half_extent` along each axis
    /// in both directions. Negative extents are treated as their magnitude.
    pub fn from_center_extent(center: Vec3, half_extent: Vec3) -> Self {
        let hx = half_extent.x.abs();
        let hy = half_extent.y.abs();
        let hz = half_extent.z.abs();
        Self {
            min: Vec3::new(center.x - hx, center.y - hy, center.z - hz),
            max: Vec3::new(center.x + hx, center.y + hy, center.z + hz),
        }
    }

    pub fn contains(&self, p: Vec3) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }
}

// ---------------------------------------------------------------------------
// Nav graph IDs: simple integers for compactness.
// ---------------------------------------------------------------------------

/// Compact identifier for a navigation graph node. Serializes as a bare
/// integer, matching the node indices reported in observations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NavNodeId(pub u32);

/// Compact identifier for a navigation graph edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NavEdgeId(pub u32);

impl fmt::Display for NavNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}
