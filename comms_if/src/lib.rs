//! # Communications interface crate.
//!
//! Provides all common communications interfaces for the pick-and-place software: the geometry
//! types shared by every service, the messages exchanged with each piece of equipment, and the
//! network layer used to carry them.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Geometry shared between the executive and the equipment (poses, joint angles)
pub mod geom;

/// Request and response definitions for equipment (kinematics, arm, gripper, scene)
pub mod eqpt;

/// Network module
pub mod net;
