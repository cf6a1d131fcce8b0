//! # Kinematics Service Communications Module
//!
//! Messages exchanged with the position inverse-kinematics service. A request carries one stamped
//! pose; the response carries a result-type byte sequence whose first byte says whether a solution
//! was found and, if so, which seed produced it.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{serde::ts_milliseconds, DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::geom::Pose;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Result type reported when no valid joint solution exists.
pub const RESULT_INVALID: u8 = 0;

/// The solution was seeded from a user provided configuration.
pub const SEED_USER: u8 = 1;

/// The solution was seeded from the current joint angles.
pub const SEED_CURRENT: u8 = 2;

/// The solution was seeded from the nullspace setpoints.
pub const SEED_NS_MAP: u8 = 3;

/// Reference frame in which all kinematics requests are expressed.
pub const BASE_FRAME: &str = "base";

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Timestamp and frame information for a stamped message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Header {
    /// UTC time at which the message was created
    #[serde(with = "ts_milliseconds")]
    pub stamp: DateTime<Utc>,

    /// Reference frame the payload is expressed in
    pub frame_id: String,
}

/// A pose tagged with a [`Header`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseStamped {
    pub header: Header,
    pub pose: Pose,
}

/// Request sent to the kinematics service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IkRequest {
    pub pose_stamp: PoseStamped,
}

/// Parallel joint name and position sequences.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JointState {
    pub name: Vec<String>,

    /// Units: radians
    pub position: Vec<f64>,
}

/// Response sent back by the kinematics service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IkResponse {
    /// Validity and seed indicator, only the first byte is meaningful.
    pub result_type: Vec<u8>,

    /// The joint solution, meaningless if the result type is invalid.
    #[serde(default)]
    pub joints: JointState,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// The seed strategy which produced a valid solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedType {
    User,
    Current,
    NullSpace,
    Other(u8),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl IkRequest {
    /// Build a request for `pose` in the base frame, stamped with the current time.
    pub fn new(pose: Pose) -> Self {
        Self {
            pose_stamp: PoseStamped {
                header: Header {
                    stamp: Utc::now(),
                    frame_id: BASE_FRAME.to_string(),
                },
                pose,
            },
        }
    }
}

impl IkResponse {
    /// Get the seed which produced the solution, or `None` if the result is invalid.
    ///
    /// An empty result type carries no solution and is treated as invalid.
    pub fn seed_type(&self) -> Option<SeedType> {
        match self.result_type.first() {
            None | Some(&RESULT_INVALID) => None,
            Some(&SEED_USER) => Some(SeedType::User),
            Some(&SEED_CURRENT) => Some(SeedType::Current),
            Some(&SEED_NS_MAP) => Some(SeedType::NullSpace),
            Some(&b) => Some(SeedType::Other(b)),
        }
    }
}

impl fmt::Display for SeedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeedType::User => write!(f, "User Provided Seed"),
            SeedType::Current => write!(f, "Current Joint Angles"),
            SeedType::NullSpace => write!(f, "Nullspace Setpoints"),
            SeedType::Other(_) => write!(f, "None"),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
