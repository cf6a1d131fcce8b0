//! # Motion Executor
//!
//! Issues joint and gripper commands to the arm. All joint moves are guarded: an empty set of
//! joint angles is never sent to the arm.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use std::thread;

use comms_if::{
    eqpt::EqptError,
    geom::{JointAngles, Pose},
};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Control interface of a single arm.
pub trait Arm {
    /// Enable the robot.
    fn enable(&mut self) -> Result<(), EqptError>;

    /// Get the current state of the robot.
    fn state(&mut self) -> Result<ArmState, EqptError>;

    /// Names of the arm's joints.
    fn joint_names(&mut self) -> Result<Vec<String>, EqptError>;

    /// Move to the given joint positions, blocking until the motion settles.
    fn move_to_joint_positions(&mut self, angles: &JointAngles) -> Result<(), EqptError>;

    /// Current pose of the end-effector in the base frame.
    fn endpoint_pose(&mut self) -> Result<Pose, EqptError>;
}

/// Control interface of the end-effector.
pub trait Gripper {
    fn open(&mut self) -> Result<(), EqptError>;

    fn close(&mut self) -> Result<(), EqptError>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// State reported by the arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArmState {
    pub enabled: bool,
}

/// Parameters for the motion executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Name of the limb being controlled, used in diagnostics
    pub limb: String,

    /// Time to wait after actuating the gripper for it to finish moving.
    ///
    /// Units: seconds
    pub gripper_settle_s: f64,

    /// Time to wait after reaching the start configuration before reporting ready.
    ///
    /// Units: seconds
    pub start_settle_s: f64,
}

/// Issues guarded joint commands and gripper actuation to the arm.
pub struct MotionExecutor<A, G> {
    arm: A,
    gripper: G,
    params: Params,

    /// Whether the robot was enabled before this executor enabled it
    init_enabled: bool,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors which can occur while executing motions.
#[derive(Debug, thiserror::Error)]
pub enum MotionError {
    #[error("No joint angles provided for move_to_joint_positions, staying put")]
    EmptyJointTarget,

    #[error("Arm error: {0}")]
    Arm(#[source] EqptError),

    #[error("Gripper error: {0}")]
    Gripper(#[source] EqptError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            limb: String::from("left"),
            gripper_settle_s: 1.0,
            start_settle_s: 1.0,
        }
    }
}

impl<A: Arm, G: Gripper> MotionExecutor<A, G> {
    /// Create a new executor, enabling the robot.
    pub fn new(mut arm: A, gripper: G, params: Params) -> Result<Self, MotionError> {
        info!("Getting robot state...");
        let init_enabled = arm.state().map_err(MotionError::Arm)?.enabled;

        info!("Enabling robot...");
        arm.enable().map_err(MotionError::Arm)?;

        Ok(Self {
            arm,
            gripper,
            params,
            init_enabled,
        })
    }

    /// Move the arm to the given joint angles, blocking until the motion settles.
    ///
    /// If `angles` is empty no command is sent, an error is logged and `EmptyJointTarget` is
    /// returned.
    pub fn move_to(&mut self, angles: &JointAngles) -> Result<(), MotionError> {
        if angles.is_empty() {
            let e = MotionError::EmptyJointTarget;
            error!("{}", e);
            return Err(e);
        }

        debug!("Moving to {:?}", angles);

        self.arm
            .move_to_joint_positions(angles)
            .map_err(MotionError::Arm)
    }

    /// Open the gripper and wait for it to settle.
    pub fn open_gripper(&mut self) -> Result<(), MotionError> {
        debug!("Opening gripper");
        self.gripper.open().map_err(MotionError::Gripper)?;
        thread::sleep(util::time::seconds_to_std(self.params.gripper_settle_s));
        Ok(())
    }

    /// Close the gripper and wait for it to settle.
    pub fn close_gripper(&mut self) -> Result<(), MotionError> {
        debug!("Closing gripper");
        self.gripper.close().map_err(MotionError::Gripper)?;
        thread::sleep(util::time::seconds_to_std(self.params.gripper_settle_s));
        Ok(())
    }

    /// Move to the start configuration and open the gripper.
    ///
    /// If no configuration is given all joints are moved to zero. A refused (empty) target is
    /// logged and the gripper is still opened.
    pub fn move_to_start(&mut self, start_angles: Option<&JointAngles>) -> Result<(), MotionError> {
        info!("Moving the {} arm to start pose...", self.params.limb);

        let zeros;
        let start_angles = match start_angles {
            Some(a) if !a.is_empty() => a,
            _ => {
                let names = self.arm.joint_names().map_err(MotionError::Arm)?;
                zeros = JointAngles::zeros(&names);
                &zeros
            }
        };

        match self.move_to(start_angles) {
            Ok(()) | Err(MotionError::EmptyJointTarget) => (),
            Err(e) => return Err(e),
        }

        self.open_gripper()?;
        thread::sleep(util::time::seconds_to_std(self.params.start_settle_s));

        info!("Ready");

        Ok(())
    }

    /// Current pose of the end-effector.
    pub fn endpoint_pose(&mut self) -> Result<Pose, MotionError> {
        self.arm.endpoint_pose().map_err(MotionError::Arm)
    }

    /// Whether the robot was enabled before this executor was created.
    pub fn init_enabled(&self) -> bool {
        self.init_enabled
    }

    pub fn arm(&self) -> &A {
        &self.arm
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
