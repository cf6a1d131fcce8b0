//! # Arm Client
//!
//! This module provides networking abstractions to connect to the arm and gripper controllers.
//! Both controllers are REQ/REP servers: every demand is acknowledged once it has been executed.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::trace;

use comms_if::{
    eqpt::{
        arm::{ArmRequest, ArmResponse, GripperCmd, GripperResponse},
        EqptError,
    },
    geom::{JointAngles, Pose},
    net::{self, zmq, MonitoredSocket, MonitoredSocketError, SocketOptions},
};

use crate::{
    motion_exec::{Arm, ArmState, Gripper},
    params::PnpExecParams,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct ArmClient {
    socket: MonitoredSocket,
}

pub struct GripperClient {
    socket: MonitoredSocket,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum ArmClientError {
    #[error("Socket error: {0}")]
    SocketError(#[from] MonitoredSocketError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ArmClient {
    /// Create a new instance of the arm client.
    pub fn new(ctx: &zmq::Context, params: &PnpExecParams) -> Result<Self, ArmClientError> {
        Ok(Self {
            socket: req_socket(ctx, &params.arm_endpoint, params.arm_recv_timeout_ms)?,
        })
    }

    fn request(&mut self, request: &ArmRequest) -> Result<ArmResponse, EqptError> {
        trace!("ArmRequest: {:?}", request);

        match net::request_json(&self.socket, request)? {
            ArmResponse::DemsInvalid(reason) => Err(EqptError::DemsInvalid(reason)),
            ArmResponse::EqptInvalid => Err(EqptError::EqptInvalid),
            r => Ok(r),
        }
    }
}

impl Arm for ArmClient {
    fn enable(&mut self) -> Result<(), EqptError> {
        match self.request(&ArmRequest::Enable)? {
            ArmResponse::DemsOk => Ok(()),
            _ => Err(EqptError::UnexpectedResponse),
        }
    }

    fn state(&mut self) -> Result<ArmState, EqptError> {
        match self.request(&ArmRequest::State)? {
            ArmResponse::State { enabled } => Ok(ArmState { enabled }),
            _ => Err(EqptError::UnexpectedResponse),
        }
    }

    fn joint_names(&mut self) -> Result<Vec<String>, EqptError> {
        match self.request(&ArmRequest::JointNames)? {
            ArmResponse::JointNames(names) => Ok(names),
            _ => Err(EqptError::UnexpectedResponse),
        }
    }

    fn move_to_joint_positions(&mut self, angles: &JointAngles) -> Result<(), EqptError> {
        match self.request(&ArmRequest::MoveToJointPositions(angles.clone()))? {
            ArmResponse::DemsOk => Ok(()),
            _ => Err(EqptError::UnexpectedResponse),
        }
    }

    fn endpoint_pose(&mut self) -> Result<Pose, EqptError> {
        match self.request(&ArmRequest::EndpointPose)? {
            ArmResponse::EndpointPose(pose) => Ok(pose),
            _ => Err(EqptError::UnexpectedResponse),
        }
    }
}

impl GripperClient {
    /// Create a new instance of the gripper client.
    pub fn new(ctx: &zmq::Context, params: &PnpExecParams) -> Result<Self, ArmClientError> {
        Ok(Self {
            socket: req_socket(ctx, &params.gripper_endpoint, params.arm_recv_timeout_ms)?,
        })
    }

    fn send(&mut self, cmd: GripperCmd) -> Result<(), EqptError> {
        trace!("GripperCmd: {:?}", cmd);

        match net::request_json(&self.socket, &cmd)? {
            GripperResponse::DemsOk => Ok(()),
            GripperResponse::DemsInvalid(reason) => Err(EqptError::DemsInvalid(reason)),
            GripperResponse::EqptInvalid => Err(EqptError::EqptInvalid),
        }
    }
}

impl Gripper for GripperClient {
    fn open(&mut self) -> Result<(), EqptError> {
        self.send(GripperCmd::Open)
    }

    fn close(&mut self) -> Result<(), EqptError> {
        self.send(GripperCmd::Close)
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn req_socket(
    ctx: &zmq::Context,
    endpoint: &str,
    recv_timeout_ms: i32,
) -> Result<MonitoredSocket, MonitoredSocketError> {
    MonitoredSocket::new(
        ctx,
        zmq::REQ,
        SocketOptions::req_client(recv_timeout_ms),
        endpoint,
    )
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
