//! # Pick and Place Executable Parameters
//!
//! This module provides parameters for the pick and place executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use comms_if::geom::{JointAngles, Pose};

use crate::{ik_solver, motion_exec, pnp_seq};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PnpExecParams {
    /// Network endpoint for the kinematics service
    pub ik_endpoint: String,

    /// Network endpoint for the arm controller
    pub arm_endpoint: String,

    /// Network endpoint for the gripper controller
    pub gripper_endpoint: String,

    /// Network endpoint for the scene server
    pub scene_endpoint: String,

    /// Network endpoint the simulation publishes its status on
    pub sim_endpoint: String,

    /// Receive timeout for kinematics requests, `-1` waits forever.
    ///
    /// Units: milliseconds
    pub ik_recv_timeout_ms: i32,

    /// Receive timeout for arm and gripper requests. Joint moves only reply once the motion
    /// has settled so this is normally `-1`.
    ///
    /// Units: milliseconds
    pub arm_recv_timeout_ms: i32,

    /// Maximum time to wait for the scene server before spawning the models.
    ///
    /// Units: seconds
    pub scene_connect_timeout_s: f64,

    /// Parameter file describing the scene, relative to the params directory
    pub scene_file: String,

    /// Parameter file holding the scripted joint path, relative to the params directory
    pub joint_path_file: String,

    /// Number of pick/place cycles to run, 0 runs until the executable is stopped
    pub num_cycles: usize,

    /// Poses the block is moved between, in the base frame
    pub block_poses: Vec<Pose>,

    /// Joint configuration to start from. All joints are zeroed if not given.
    #[serde(default)]
    pub start_angles: Option<JointAngles>,

    #[serde(default)]
    pub solver: ik_solver::Params,

    #[serde(default)]
    pub motion: motion_exec::Params,

    #[serde(default)]
    pub sequencer: pnp_seq::Params,
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
