//! # Simulation Client
//!
//! The simulation publishes a message on its status socket once the robot and world are ready.
//! The executable must not command the arm before then.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, warn};
use std::{
    sync::atomic::{AtomicBool, Ordering},
    time::{Duration, Instant},
};

use comms_if::net::{zmq, MonitoredSocket, MonitoredSocketError, SocketOptions};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Receive timeout used while waiting, so that the deadline is checked regularly.
///
/// Units: milliseconds
const RECV_POLL_MS: i32 = 100;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SimClientError {
    #[error("Socket error: {0}")]
    SocketError(#[from] MonitoredSocketError),

    #[error("Could not subscribe to the simulation: {0}")]
    SubscribeError(zmq::Error),

    #[error("Could not recieve a message from the simulation: {0}")]
    RecvError(zmq::Error),

    #[error("The simulation did not start within {0:?}")]
    Timeout(Duration),

    #[error("Stopped while waiting for the simulation")]
    Interrupted,
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Block until the simulation publishes its started message on `endpoint`.
///
/// Any message counts as the started signal. If `timeout` is `None` this waits until `stop` is
/// set.
pub fn wait_for_sim_started(
    ctx: &zmq::Context,
    endpoint: &str,
    timeout: Option<Duration>,
    stop: &AtomicBool,
) -> Result<(), SimClientError> {
    let socket = MonitoredSocket::new(
        ctx,
        zmq::SUB,
        SocketOptions {
            recv_timeout: RECV_POLL_MS,
            linger: 1,
            ..Default::default()
        },
        endpoint,
    )?;
    socket
        .set_subscribe(b"")
        .map_err(SimClientError::SubscribeError)?;

    let start = Instant::now();

    loop {
        match socket.recv_msg(0) {
            Ok(msg) => {
                debug!("Simulation started ({} byte message)", msg.len());
                return Ok(());
            }
            Err(zmq::Error::EAGAIN) => (),
            Err(e) => return Err(SimClientError::RecvError(e)),
        }

        if stop.load(Ordering::SeqCst) {
            return Err(SimClientError::Interrupted);
        }

        if let Some(t) = timeout {
            if start.elapsed() >= t {
                warn!("No started message from the simulation");
                return Err(SimClientError::Timeout(t));
            }
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
