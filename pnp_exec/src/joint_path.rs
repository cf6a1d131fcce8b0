//! # Scripted Joint Path
//!
//! An ordered list of joint configurations which the arm moves through one after another. Paths
//! are loaded from a parameter file of the form:
//!
//! ```toml
//! [[waypoints]]
//! left_s0 = -0.961
//! left_s1 = -0.388
//! # ...
//! ```

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::info;
use serde::{Deserialize, Serialize};

use comms_if::geom::JointAngles;

use crate::motion_exec::{Arm, Gripper, MotionError, MotionExecutor};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// An ordered sequence of complete joint configurations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JointPath {
    waypoints: Vec<JointAngles>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum JointPathError {
    #[error("Could not load the joint path: {0}")]
    LoadError(#[from] util::params::LoadError),

    #[error("Waypoint {index} has {found} joints, expected {expected}")]
    PartialWaypoint {
        index: usize,
        expected: usize,
        found: usize,
    },

    #[error("Waypoint {0} names different joints to the first waypoint")]
    MismatchedJoints(usize),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl JointPath {
    /// Build a path, checking that every waypoint has `num_joints` angles for the same joints.
    pub fn new(waypoints: Vec<JointAngles>, num_joints: usize) -> Result<Self, JointPathError> {
        for (index, w) in waypoints.iter().enumerate() {
            if w.len() != num_joints {
                return Err(JointPathError::PartialWaypoint {
                    index,
                    expected: num_joints,
                    found: w.len(),
                });
            }

            if !w.same_joints(&waypoints[0]) {
                return Err(JointPathError::MismatchedJoints(index));
            }
        }

        Ok(Self { waypoints })
    }

    /// Load a path from the given parameter file, relative to the params directory.
    pub fn load(param_file: &str, num_joints: usize) -> Result<Self, JointPathError> {
        let path: JointPath = util::params::load(param_file)?;

        Self::new(path.waypoints, num_joints)
    }

    /// Move through every waypoint in order.
    ///
    /// Stops at the first motion error.
    pub fn run<A, G>(&self, motion: &mut MotionExecutor<A, G>) -> Result<(), MotionError>
    where
        A: Arm,
        G: Gripper,
    {
        let num = self.waypoints.len();

        for (i, w) in self.waypoints.iter().enumerate() {
            info!("Moving to waypoint {}/{}", i + 1, num);
            motion.move_to(w)?;
        }

        info!("Joint path complete");

        Ok(())
    }

    pub fn waypoints(&self) -> &[JointAngles] {
        &self.waypoints
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::mock::{self, Cmd, CommandLog, MockArm, MockGripper};

    fn waypoint(value: f64) -> JointAngles {
        mock::JOINT_NAMES
            .iter()
            .map(|n| (n.to_string(), value))
            .collect()
    }

    #[test]
    fn test_partial_waypoints_rejected() {
        let partial: JointAngles = mock::JOINT_NAMES[1..]
            .iter()
            .map(|n| (n.to_string(), 0.3))
            .collect();

        match JointPath::new(vec![waypoint(0.1), partial], 7) {
            Err(JointPathError::PartialWaypoint {
                index,
                expected,
                found,
            }) => {
                assert_eq!(index, 1);
                assert_eq!(expected, 7);
                assert_eq!(found, 6);
            }
            _ => panic!("Expected a partial waypoint error"),
        }

        let mut other: JointAngles = (0..7).map(|i| (format!("right_{}", i), 0.0)).collect();
        assert!(matches!(
            JointPath::new(vec![waypoint(0.1), other.clone()], 7),
            Err(JointPathError::MismatchedJoints(1))
        ));

        other = JointAngles::new();
        assert!(matches!(
            JointPath::new(vec![other], 7),
            Err(JointPathError::PartialWaypoint { index: 0, .. })
        ));
    }

    #[test]
    fn test_path_from_toml() {
        let mut toml_str = String::new();
        for v in &[0.1, 0.2] {
            toml_str.push_str("[[waypoints]]\n");
            for n in mock::JOINT_NAMES.iter() {
                toml_str.push_str(&format!("{} = {}\n", n, v));
            }
        }

        let path: JointPath = toml::from_str(&toml_str).unwrap();
        let path = JointPath::new(path.waypoints, 7).unwrap();

        assert_eq!(path.len(), 2);
        assert_eq!(path.waypoints()[1], waypoint(0.2));
    }

    #[test]
    fn test_run_moves_in_order() {
        let log = CommandLog::default();
        let mut motion = MotionExecutor::new(
            MockArm::new(log.clone()),
            MockGripper::new(log.clone()),
            mock::motion_params(),
        )
        .unwrap();
        let path = JointPath::new(vec![waypoint(0.1), waypoint(0.2), waypoint(0.3)], 7).unwrap();

        path.run(&mut motion).unwrap();

        assert_eq!(
            log.commands(),
            vec![
                Cmd::Move(waypoint(0.1)),
                Cmd::Move(waypoint(0.2)),
                Cmd::Move(waypoint(0.3))
            ]
        );
    }
}
