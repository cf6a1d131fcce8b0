//! # Test doubles
//!
//! Recording implementations of the equipment traits. The mock kinematics service encodes a pose
//! directly into the joint angles (`[x, y, z, qx, qy, qz, qw]`) and the mock arm decodes them
//! back, so the end-effector pose always follows the last commanded configuration.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{Level, LevelFilter, Log, Metadata, Record};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Once;
use std::time::Duration;

use comms_if::{
    eqpt::{
        ik::{IkRequest, IkResponse, JointState, RESULT_INVALID, SEED_CURRENT},
        EqptError,
    },
    geom::{JointAngles, Point, Pose, Quaternion},
    net::RequestError,
};

use crate::{
    ik_solver::IkService,
    motion_exec::{self, Arm, ArmState, Gripper},
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

pub const JOINT_NAMES: [&str; 7] = [
    "left_e0", "left_e1", "left_s0", "left_s1", "left_w0", "left_w1", "left_w2",
];

// ------------------------------------------------------------------------------------------------
// STATICS
// ------------------------------------------------------------------------------------------------

static LOGGER_INIT: Once = Once::new();

static CAPTURE_LOGGER: CaptureLogger = CaptureLogger;

thread_local! {
    static CAPTURED: RefCell<Vec<(Level, String)>> = RefCell::new(Vec::new());
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Ordered record of every command sent to the arm or gripper.
#[derive(Debug, Clone, Default)]
pub struct CommandLog(Rc<RefCell<Vec<Cmd>>>);

pub struct MockIkService {
    pub available: bool,
    pub fail_transport: bool,

    /// Sent in place of the encoded solution when set
    pub response_override: Option<IkResponse>,

    /// Poses the service reports as unreachable
    pub invalid_poses: Vec<Pose>,

    requests: Vec<IkRequest>,
}

pub struct MockArm {
    pub current: JointAngles,
    pub enabled: bool,
    pub fail: bool,
    log: CommandLog,
}

pub struct MockGripper {
    pub fail: bool,
    log: CommandLog,
}

/// Records the level of every log entry made on the current thread.
struct CaptureLogger;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Cmd {
    Move(JointAngles),
    OpenGripper,
    CloseGripper,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl CommandLog {
    pub fn commands(&self) -> Vec<Cmd> {
        self.0.borrow().clone()
    }

    fn push(&self, cmd: Cmd) {
        self.0.borrow_mut().push(cmd)
    }
}

impl MockIkService {
    pub fn new() -> Self {
        Self {
            available: true,
            fail_transport: false,
            response_override: None,
            invalid_poses: Vec::new(),
            requests: Vec::new(),
        }
    }

    pub fn requests(&self) -> &[IkRequest] {
        &self.requests
    }
}

impl IkService for MockIkService {
    fn wait_for_service(&mut self, _timeout: Duration) -> bool {
        self.available
    }

    fn call(&mut self, request: &IkRequest) -> Result<IkResponse, RequestError> {
        self.requests.push(request.clone());

        if self.fail_transport {
            return Err(RequestError::NotConnected);
        }

        if let Some(ref r) = self.response_override {
            return Ok(r.clone());
        }

        let pose = request.pose_stamp.pose;
        let joints = pose_to_joints(&pose);

        // Unreachable poses still carry joint data, which must be ignored
        let result_type = if self.invalid_poses.contains(&pose) {
            RESULT_INVALID
        } else {
            SEED_CURRENT
        };

        Ok(IkResponse {
            result_type: vec![result_type],
            joints: JointState {
                name: joints.names().map(String::from).collect(),
                position: joints.iter().map(|(_, a)| a).collect(),
            },
        })
    }
}

impl MockArm {
    pub fn new(log: CommandLog) -> Self {
        Self {
            current: JointAngles::new(),
            enabled: false,
            fail: false,
            log,
        }
    }
}

impl Arm for MockArm {
    fn enable(&mut self) -> Result<(), EqptError> {
        self.enabled = true;
        Ok(())
    }

    fn state(&mut self) -> Result<ArmState, EqptError> {
        Ok(ArmState {
            enabled: self.enabled,
        })
    }

    fn joint_names(&mut self) -> Result<Vec<String>, EqptError> {
        Ok(JOINT_NAMES.iter().map(|s| s.to_string()).collect())
    }

    fn move_to_joint_positions(&mut self, angles: &JointAngles) -> Result<(), EqptError> {
        if self.fail {
            return Err(EqptError::EqptInvalid);
        }

        self.log.push(Cmd::Move(angles.clone()));
        self.current = angles.clone();
        Ok(())
    }

    fn endpoint_pose(&mut self) -> Result<Pose, EqptError> {
        Ok(joints_to_pose(&self.current).unwrap_or_default())
    }
}

impl MockGripper {
    pub fn new(log: CommandLog) -> Self {
        Self { fail: false, log }
    }
}

impl Gripper for MockGripper {
    fn open(&mut self) -> Result<(), EqptError> {
        if self.fail {
            return Err(EqptError::EqptInvalid);
        }

        self.log.push(Cmd::OpenGripper);
        Ok(())
    }

    fn close(&mut self) -> Result<(), EqptError> {
        if self.fail {
            return Err(EqptError::EqptInvalid);
        }

        self.log.push(Cmd::CloseGripper);
        Ok(())
    }
}

impl Log for CaptureLogger {
    fn enabled(&self, _: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        CAPTURED.with(|c| {
            c.borrow_mut()
                .push((record.level(), record.args().to_string()))
        });
    }

    fn flush(&self) {}
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Motion parameters with no settle periods.
pub fn motion_params() -> motion_exec::Params {
    motion_exec::Params {
        gripper_settle_s: 0.0,
        start_settle_s: 0.0,
        ..Default::default()
    }
}

/// Encode a pose as the joint angles the mock service returns for it.
pub fn pose_to_joints(pose: &Pose) -> JointAngles {
    let values = [
        pose.position.x,
        pose.position.y,
        pose.position.z,
        pose.orientation.x,
        pose.orientation.y,
        pose.orientation.z,
        pose.orientation.w,
    ];

    JOINT_NAMES
        .iter()
        .zip(values.iter())
        .map(|(n, v)| (n.to_string(), *v))
        .collect()
}

/// Decode joint angles produced by [`pose_to_joints`].
pub fn joints_to_pose(angles: &JointAngles) -> Option<Pose> {
    let v = |i: usize| angles.get(JOINT_NAMES[i]);

    Some(Pose::new(
        Point::new(v(0)?, v(1)?, v(2)?),
        Quaternion::new(v(3)?, v(4)?, v(5)?, v(6)?),
    ))
}

/// Start capturing log entries made on this thread, clearing any already captured.
pub fn capture_logs() {
    LOGGER_INIT.call_once(|| {
        if log::set_logger(&CAPTURE_LOGGER).is_ok() {
            log::set_max_level(LevelFilter::Trace);
        }
    });

    CAPTURED.with(|c| c.borrow_mut().clear());
}

/// Number of error entries captured on this thread since [`capture_logs`].
pub fn captured_errors() -> usize {
    captured(Level::Error).len()
}

/// Messages captured on this thread at exactly `level` since [`capture_logs`].
pub fn captured(level: Level) -> Vec<String> {
    CAPTURED.with(|c| {
        c.borrow()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    })
}
