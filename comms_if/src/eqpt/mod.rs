//! # Equipment Interface
//!
//! This module defines the interface structures which are sent between the executive and the
//! equipment servers: the kinematics service, the arm and gripper controllers, and the simulated
//! scene.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

pub mod arm;
pub mod ik;
pub mod scene;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use crate::net::RequestError;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors raised by a piece of equipment (arm or gripper) while executing a demand.
#[derive(Debug, thiserror::Error)]
pub enum EqptError {
    #[error("The demand was rejected by the equipment: {0}")]
    DemsInvalid(String),

    #[error("The equipment is invalid so demands cannot be actuated")]
    EqptInvalid,

    #[error("The equipment sent a response that does not match the request")]
    UnexpectedResponse,

    #[error("Could not communicate with the equipment: {0}")]
    Comms(#[from] RequestError),
}
