//! # Pick and place library.
//!
//! The core of the pick and place executive: resolving Cartesian poses into joint angles
//! ([`ik_solver`]), guarded execution of joint and gripper commands ([`motion_exec`]) and the
//! sequencing of pick and place cycles ([`pnp_seq`]). The remaining modules connect the core to
//! the equipment servers over the network.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Pose to joint solver - resolves poses into joint angles using the kinematics service
pub mod ik_solver;

/// Motion executor - guarded joint moves and gripper actuation
pub mod motion_exec;

/// Pick and place sequencer - drives the solver and executor through the pick/place phases
pub mod pnp_seq;

/// Scripted joint path - an ordered list of joint configurations to move through
pub mod joint_path;

/// Kinematics client - sends solve requests to the kinematics service
pub mod ik_client;

/// Arm client - sends joint and gripper demands to the arm controller
pub mod arm_client;

/// Scene client - populates and clears the simulated world
pub mod scene_client;

/// Simulation client - waits for the simulation to signal it has started
pub mod sim_client;

/// Parameters for the executable
pub mod params;

#[cfg(test)]
mod mock;
