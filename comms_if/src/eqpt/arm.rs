//! # Arm and Gripper Equipment Commands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::geom::{JointAngles, Pose};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Requests sent from the ArmClient to the arm controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ArmRequest {
    /// Enable the robot's motors.
    Enable,

    /// Query the robot state.
    State,

    /// Query the names of the limb's joints.
    JointNames,

    /// Move to the given joint positions. The controller only replies once the motion has
    /// settled.
    MoveToJointPositions(JointAngles),

    /// Query the current end-effector pose in the base frame.
    EndpointPose,
}

/// Responses from the arm controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ArmResponse {
    /// The demand was valid and has been executed.
    DemsOk,

    /// Robot state, in response to [`ArmRequest::State`].
    State { enabled: bool },

    /// Joint names, in response to [`ArmRequest::JointNames`].
    JointNames(Vec<String>),

    /// End-effector pose, in response to [`ArmRequest::EndpointPose`].
    EndpointPose(Pose),

    /// The demand was invalid and has been rejected.
    DemsInvalid(String),

    /// The equipment is invalid so demands cannot be actuated.
    EqptInvalid,
}

/// Commands sent from the GripperClient to the gripper controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GripperCmd {
    Open,
    Close,
}

/// Responses from the gripper controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GripperResponse {
    DemsOk,
    DemsInvalid(String),
    EqptInvalid,
}
