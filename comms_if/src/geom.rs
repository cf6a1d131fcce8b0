//! # Geometry
//!
//! Cartesian poses and joint-space configurations exchanged between the pick-and-place executive
//! and its equipment.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::iter::FromIterator;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A point in 3D space.
///
/// Units: meters
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// An orientation expressed as a quaternion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

/// A Cartesian pose, position and orientation in some reference frame.
///
/// Poses are values: deriving a new pose (for example with [`Pose::offset_z`]) never mutates the
/// original.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Point,

    #[serde(default)]
    pub orientation: Quaternion,
}

/// A joint-space configuration of the arm, mapping joint name to angle.
///
/// An empty set of joint angles is the sentinel for "no solution" and must never be sent to the
/// arm.
///
/// Units: radians
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JointAngles(BTreeMap<String, f64>);

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Point {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl Quaternion {
    pub fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }
}

impl Default for Quaternion {
    /// The identity rotation.
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }
}

impl Pose {
    pub fn new(position: Point, orientation: Quaternion) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// Return a copy of this pose with the vertical coordinate shifted by `dz_m`.
    pub fn offset_z(&self, dz_m: f64) -> Self {
        let mut pose = *self;
        pose.position.z += dz_m;
        pose
    }
}

impl JointAngles {
    /// Create an empty (invalid) set of joint angles.
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Build joint angles from parallel name and position sequences.
    ///
    /// Returns `None` if the sequences differ in length, since a partial solution is not
    /// representable.
    pub fn from_parallel(names: &[String], positions: &[f64]) -> Option<Self> {
        if names.len() != positions.len() {
            return None;
        }

        Some(
            names
                .iter()
                .cloned()
                .zip(positions.iter().copied())
                .collect(),
        )
    }

    /// All-zero angles for the given joints.
    pub fn zeros<S: AsRef<str>>(names: &[S]) -> Self {
        names.iter().map(|n| (n.as_ref().to_string(), 0.0)).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, joint: &str) -> Option<f64> {
        self.0.get(joint).copied()
    }

    /// Iterate over the joint names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Check whether both configurations cover exactly the same joints.
    pub fn same_joints(&self, other: &JointAngles) -> bool {
        self.0.len() == other.0.len() && self.0.keys().all(|k| other.0.contains_key(k))
    }

    /// Largest absolute per-joint difference between two configurations.
    ///
    /// Returns `None` if the configurations don't cover the same joints.
    pub fn max_abs_diff(&self, other: &JointAngles) -> Option<f64> {
        if !self.same_joints(other) {
            return None;
        }

        Some(
            self.0
                .iter()
                .map(|(k, v)| (v - other.0[k]).abs())
                .fold(0.0, f64::max),
        )
    }
}

impl FromIterator<(String, f64)> for JointAngles {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
