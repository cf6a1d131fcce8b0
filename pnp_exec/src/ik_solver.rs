//! # Pose to Joint Solver
//!
//! Resolves a Cartesian pose of the end-effector into joint angles by calling the kinematics
//! service. The solver never returns a partial solution: the result is either a full set of joint
//! angles or the empty sentinel.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use comms_if::{
    eqpt::ik::{IkRequest, IkResponse},
    geom::{JointAngles, Pose},
    net::RequestError,
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of joints in a 7 degree of freedom arm.
pub const NUM_JOINTS: usize = 7;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A connection to an inverse kinematics service.
pub trait IkService {
    /// Block until the service is available or `timeout` elapses.
    ///
    /// Returns `true` if the service is available.
    fn wait_for_service(&mut self, timeout: Duration) -> bool;

    /// Send a request and block until the response arrives.
    fn call(&mut self, request: &IkRequest) -> Result<IkResponse, RequestError>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters for the solver.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Maximum time to wait for the service at construction.
    ///
    /// Units: seconds
    pub service_timeout_s: f64,

    /// Number of joints a valid solution must contain.
    pub num_joints: usize,

    /// Log the seed type and joint values of every successful solution.
    pub verbose: bool,
}

/// Converts Cartesian poses into joint angles.
pub struct PoseToJointSolver<S> {
    service: S,
    params: Params,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors which prevent the solver from being created.
#[derive(Debug, thiserror::Error)]
pub enum SolverInitError {
    #[error("The kinematics service was not available within {0:?}")]
    ServiceUnavailable(Duration),
}

/// Reasons a pose could not be solved.
#[derive(Debug, thiserror::Error)]
pub enum SolveError {
    #[error("Kinematics service call failed: {0}")]
    ServiceCallFailed(#[source] RequestError),

    #[error("INVALID POSE - No Valid Joint Solution Found.")]
    InvalidPose,

    #[error("Malformed solution with {names} joint names but {positions} positions")]
    MismatchedJoints { names: usize, positions: usize },

    #[error("Expected a solution for {expected} joints but found {found}")]
    WrongJointCount { expected: usize, found: usize },
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            service_timeout_s: 5.0,
            num_joints: NUM_JOINTS,
            verbose: false,
        }
    }
}

impl<S: IkService> PoseToJointSolver<S> {
    /// Create a new solver using the given service.
    ///
    /// Blocks until the service is available. If it doesn't become available within
    /// `params.service_timeout_s` the solver cannot be used and `ServiceUnavailable` is returned.
    pub fn new(mut service: S, params: Params) -> Result<Self, SolverInitError> {
        let timeout = util::time::seconds_to_std(params.service_timeout_s);

        if !service.wait_for_service(timeout) {
            return Err(SolverInitError::ServiceUnavailable(timeout));
        }

        debug!("Kinematics service available");

        Ok(Self { service, params })
    }

    /// Solve for the joint angles which place the end-effector at `pose`.
    ///
    /// On failure the reason is logged and an empty set of joint angles is returned.
    pub fn solve(&mut self, pose: &Pose) -> JointAngles {
        match self.try_solve(pose) {
            Ok(angles) => angles,
            Err(e) => {
                error!("{}", e);
                JointAngles::new()
            }
        }
    }

    /// Solve for the joint angles which place the end-effector at `pose`, returning the reason
    /// for any failure.
    pub fn try_solve(&mut self, pose: &Pose) -> Result<JointAngles, SolveError> {
        let request = IkRequest::new(*pose);

        let response = self
            .service
            .call(&request)
            .map_err(SolveError::ServiceCallFailed)?;

        // The result type decides validity, any joints sent with an invalid result are ignored
        let seed = response.seed_type().ok_or(SolveError::InvalidPose)?;

        let joints = &response.joints;
        let angles = JointAngles::from_parallel(&joints.name, &joints.position).ok_or(
            SolveError::MismatchedJoints {
                names: joints.name.len(),
                positions: joints.position.len(),
            },
        )?;

        // Duplicate names collapse in the map so they are caught here too
        if angles.len() != self.params.num_joints {
            return Err(SolveError::WrongJointCount {
                expected: self.params.num_joints,
                found: angles.len(),
            });
        }

        if self.params.verbose {
            info!(
                "IK Solution SUCCESS - Valid Joint Solution Found from Seed Type: {}",
                seed
            );
            info!("IK Joint Solution:\n{:#?}", angles);
        }

        Ok(angles)
    }

    /// Get a reference to the underlying service.
    pub fn service(&self) -> &S {
        &self.service
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::mock::{self, MockIkService};
    use comms_if::eqpt::ik::{JointState, RESULT_INVALID, SEED_CURRENT, SEED_USER};
    use log::Level;
    use comms_if::geom::{Point, Quaternion};

    fn target() -> Pose {
        Pose::new(
            Point::new(0.75, -0.1, -0.129),
            Quaternion::new(
                -0.0249590815779,
                0.999649402929,
                0.00737916180073,
                0.00486450832011,
            ),
        )
    }

    fn new_solver(service: MockIkService) -> PoseToJointSolver<MockIkService> {
        PoseToJointSolver::new(service, Params::default()).unwrap()
    }

    #[test]
    fn test_unavailable_service_is_fatal() {
        let mut service = MockIkService::new();
        service.available = false;

        match PoseToJointSolver::new(service, Params::default()) {
            Err(SolverInitError::ServiceUnavailable(t)) => assert_eq!(t, Duration::from_secs(5)),
            Ok(_) => panic!("Expected the solver to fail"),
        }
    }

    #[test]
    fn test_request_uses_base_frame() {
        let mut solver = new_solver(MockIkService::new());

        solver.solve(&target());

        let requests = solver.service().requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].pose_stamp.header.frame_id, "base");
        assert_eq!(requests[0].pose_stamp.pose, target());
    }

    #[test]
    fn test_hover_solution_has_same_joints() {
        let mut solver = new_solver(MockIkService::new());

        let at = solver.solve(&target());
        let above = solver.solve(&target().offset_z(0.15));

        assert_eq!(at.len(), NUM_JOINTS);
        assert!(at.same_joints(&above));
        assert_ne!(at, above);
    }

    #[test]
    fn test_invalid_result_ignores_joints() {
        let mut service = MockIkService::new();
        service.response_override = Some(IkResponse {
            result_type: vec![RESULT_INVALID, SEED_CURRENT],
            joints: JointState {
                name: mock::JOINT_NAMES.iter().map(|s| s.to_string()).collect(),
                position: vec![0.1; NUM_JOINTS],
            },
        });
        let mut solver = new_solver(service);

        assert!(matches!(
            solver.try_solve(&target()),
            Err(SolveError::InvalidPose)
        ));
        assert!(solver.solve(&target()).is_empty());
    }

    #[test]
    fn test_transport_failure_gives_empty_solution() {
        let mut service = MockIkService::new();
        service.fail_transport = true;
        let mut solver = new_solver(service);

        mock::capture_logs();

        assert!(solver.solve(&target()).is_empty());
        assert_eq!(mock::captured_errors(), 1);
    }

    #[test]
    fn test_seed_logged_only_when_verbose() {
        let user_seeded = || {
            let mut service = MockIkService::new();
            service.response_override = Some(IkResponse {
                result_type: vec![SEED_USER],
                joints: JointState {
                    name: mock::JOINT_NAMES.iter().map(|s| s.to_string()).collect(),
                    position: vec![0.1; NUM_JOINTS],
                },
            });
            service
        };

        let mut solver = PoseToJointSolver::new(
            user_seeded(),
            Params {
                verbose: true,
                ..Default::default()
            },
        )
        .unwrap();

        mock::capture_logs();
        assert_eq!(solver.solve(&target()).len(), NUM_JOINTS);

        let infos = mock::captured(Level::Info);
        assert_eq!(infos.len(), 2);
        assert!(infos[0].contains("User Provided Seed"));

        let mut solver = new_solver(user_seeded());

        mock::capture_logs();
        assert_eq!(solver.solve(&target()).len(), NUM_JOINTS);

        assert!(mock::captured(Level::Info).is_empty());
        assert_eq!(mock::captured_errors(), 0);
    }

    #[test]
    fn test_partial_solutions_rejected() {
        let mut service = MockIkService::new();
        service.response_override = Some(IkResponse {
            result_type: vec![SEED_CURRENT],
            joints: JointState {
                name: mock::JOINT_NAMES.iter().map(|s| s.to_string()).collect(),
                position: vec![0.1; NUM_JOINTS - 1],
            },
        });
        let mut solver = new_solver(service);

        assert!(matches!(
            solver.try_solve(&target()),
            Err(SolveError::MismatchedJoints {
                names: 7,
                positions: 6
            })
        ));

        let mut service = MockIkService::new();
        service.response_override = Some(IkResponse {
            result_type: vec![SEED_CURRENT],
            joints: JointState {
                name: vec!["left_s0".to_string(), "left_s1".to_string()],
                position: vec![0.1, 0.2],
            },
        });
        let mut solver = new_solver(service);

        assert!(matches!(
            solver.try_solve(&target()),
            Err(SolveError::WrongJointCount {
                expected: 7,
                found: 2
            })
        ));
    }
}
