//! # Kinematics Client
//!
//! This module provides networking abstractions to connect to the inverse kinematics service.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::time::Duration;

use comms_if::{
    eqpt::ik::{IkRequest, IkResponse},
    net::{self, zmq, MonitoredSocket, MonitoredSocketError, RequestError, SocketOptions},
};

use crate::{ik_solver::IkService, params::PnpExecParams};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct IkClient {
    socket: MonitoredSocket,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum IkClientError {
    #[error("Socket error: {0}")]
    SocketError(#[from] MonitoredSocketError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl IkClient {
    /// Create a new instance of the kinematics client.
    ///
    /// The client does not wait for the service, see [`IkService::wait_for_service`].
    pub fn new(ctx: &zmq::Context, params: &PnpExecParams) -> Result<Self, IkClientError> {
        Self::with_endpoint(ctx, &params.ik_endpoint, params.ik_recv_timeout_ms)
    }

    fn with_endpoint(
        ctx: &zmq::Context,
        endpoint: &str,
        recv_timeout_ms: i32,
    ) -> Result<Self, IkClientError> {
        let socket = MonitoredSocket::new(
            ctx,
            zmq::REQ,
            SocketOptions::req_client(recv_timeout_ms),
            endpoint,
        )?;

        Ok(Self { socket })
    }
}

impl IkService for IkClient {
    fn wait_for_service(&mut self, timeout: Duration) -> bool {
        self.socket.wait_connected(timeout)
    }

    fn call(&mut self, request: &IkRequest) -> Result<IkResponse, RequestError> {
        net::request_json(&self.socket, request)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
