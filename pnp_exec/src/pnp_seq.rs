//! # Pick and Place Sequencer
//!
//! Drives the [`PoseToJointSolver`] and [`MotionExecutor`] through the phases of a pick or place
//! cycle:
//!
//! ```text
//! Idle -> Approaching -> Descending -> (Grasping | Releasing) -> Retracting -> Idle
//! ```
//!
//! Each phase's motion command returns before the next phase begins. What happens when a phase
//! has no joint solution is decided by the [`FailurePolicy`].

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;

use comms_if::geom::Pose;

use crate::{
    ik_solver::{IkService, PoseToJointSolver},
    motion_exec::{Arm, Gripper, MotionError, MotionExecutor},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters for the sequencer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Height above the target pose used for approach and retract.
    ///
    /// Units: meters
    pub hover_distance_m: f64,

    pub failure_policy: FailurePolicy,
}

/// Orchestrates the solver and motion executor through pick and place cycles.
pub struct PickPlaceSequencer<S, A, G> {
    solver: PoseToJointSolver<S>,
    motion: MotionExecutor<A, G>,
    params: Params,
    phase: PnpPhase,
}

/// Record of a single pick or place cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    /// UTC time the cycle started
    pub started: DateTime<Utc>,

    pub action: CycleAction,
    pub target: Pose,
    pub phases: Vec<PhaseReport>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PhaseReport {
    pub phase: PnpPhase,
    pub outcome: PhaseOutcome,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Phase the sequencer is currently executing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PnpPhase {
    Idle,
    Approaching,
    Descending,
    Grasping,
    Releasing,
    Retracting,
}

/// Behaviour of the sequencer when a phase has no joint solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Skip the phase's motion and carry on with the rest of the cycle.
    SkipAndContinue,

    /// Abort the cycle with [`SequenceError::PhaseFailed`].
    FailFast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CycleAction {
    Pick,
    Place,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PhaseOutcome {
    Done,

    /// No joint solution was available so no motion was commanded
    Skipped,

    /// The cycle was aborted during this phase
    Failed,
}

/// Errors which abort a cycle.
#[derive(Debug, thiserror::Error)]
pub enum SequenceError {
    #[error("Hover distance must be a positive number of meters, found {0}")]
    InvalidHoverDistance(f64),

    #[error("No block poses were provided")]
    NoBlockPoses,

    #[error("The {phase} phase has no joint solution")]
    PhaseFailed { phase: PnpPhase },

    #[error(transparent)]
    Motion(#[from] MotionError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            hover_distance_m: 0.15,
            failure_policy: FailurePolicy::SkipAndContinue,
        }
    }
}

impl Default for FailurePolicy {
    fn default() -> Self {
        FailurePolicy::SkipAndContinue
    }
}

impl fmt::Display for PnpPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PnpPhase::Idle => "idle",
            PnpPhase::Approaching => "approach",
            PnpPhase::Descending => "descend",
            PnpPhase::Grasping => "grasp",
            PnpPhase::Releasing => "release",
            PnpPhase::Retracting => "retract",
        };

        write!(f, "{}", s)
    }
}

impl CycleReport {
    fn new(action: CycleAction, target: Pose) -> Self {
        Self {
            started: Utc::now(),
            action,
            target,
            phases: Vec::new(),
        }
    }

    /// True if no phase of the cycle was skipped or failed.
    pub fn is_complete(&self) -> bool {
        self.phases.iter().all(|p| p.outcome == PhaseOutcome::Done)
    }

    fn push(&mut self, phase: PnpPhase, outcome: PhaseOutcome) {
        self.phases.push(PhaseReport { phase, outcome })
    }
}

impl<S, A, G> PickPlaceSequencer<S, A, G>
where
    S: IkService,
    A: Arm,
    G: Gripper,
{
    pub fn new(
        solver: PoseToJointSolver<S>,
        motion: MotionExecutor<A, G>,
        params: Params,
    ) -> Result<Self, SequenceError> {
        if !(params.hover_distance_m.is_finite() && params.hover_distance_m > 0.0) {
            return Err(SequenceError::InvalidHoverDistance(params.hover_distance_m));
        }

        Ok(Self {
            solver,
            motion,
            params,
            phase: PnpPhase::Idle,
        })
    }

    /// Pick up the object at `target`.
    ///
    /// The gripper is opened, the arm approaches from above and descends to the target, the
    /// gripper closes and the arm retracts vertically from wherever it ended up.
    pub fn pick(&mut self, target: &Pose) -> Result<CycleReport, SequenceError> {
        let (report, result) = self.run_cycle(CycleAction::Pick, target);
        result.map(|_| report)
    }

    /// Place the held object at `target`.
    ///
    /// As for [`pick`](Self::pick) but the gripper is opened rather than closed at the target.
    pub fn place(&mut self, target: &Pose) -> Result<CycleReport, SequenceError> {
        let (report, result) = self.run_cycle(CycleAction::Place, target);
        result.map(|_| report)
    }

    /// Run a single pick or place, always returning the report alongside the result.
    ///
    /// If the cycle is aborted the phase it was in is recorded as [`PhaseOutcome::Failed`].
    pub fn run_cycle(
        &mut self,
        action: CycleAction,
        target: &Pose,
    ) -> (CycleReport, Result<(), SequenceError>) {
        info!("{:?} at {:?}", action, target.position);

        let mut report = CycleReport::new(action, *target);
        let result = match action {
            CycleAction::Pick => self.pick_phases(target, &mut report),
            CycleAction::Place => self.place_phases(target, &mut report),
        };

        if result.is_err() {
            report.push(self.phase, PhaseOutcome::Failed);
        }
        self.phase = PnpPhase::Idle;

        (report, result)
    }

    /// Repeatedly move the block from one pose to the next.
    ///
    /// Cycle `n` picks from `block_poses[i]` and places at `block_poses[(i + 1) % len]`, the next
    /// cycle then picks from where the block was placed. If `num_cycles` is 0 this runs until a
    /// cycle fails or `should_stop` returns true, which is checked before every pick and place.
    ///
    /// `on_report` receives every pick and place report, including the report of a failed cycle
    /// before its error is returned.
    pub fn run_block_loop<C, F>(
        &mut self,
        block_poses: &[Pose],
        num_cycles: usize,
        mut should_stop: C,
        mut on_report: F,
    ) -> Result<(), SequenceError>
    where
        C: FnMut() -> bool,
        F: FnMut(usize, &CycleReport),
    {
        if block_poses.is_empty() {
            return Err(SequenceError::NoBlockPoses);
        }

        let mut idx = 0;
        let mut cycle = 0;

        while num_cycles == 0 || cycle < num_cycles {
            let next = (idx + 1) % block_poses.len();

            if should_stop() {
                info!("Stopping the block loop before cycle {}", cycle);
                break;
            }

            info!("Cycle {}: block {} -> {}", cycle, idx, next);

            let (report, result) = self.run_cycle(CycleAction::Pick, &block_poses[idx]);
            on_report(cycle, &report);
            result?;

            if should_stop() {
                warn!("Stopping the block loop while holding the block from {}", idx);
                break;
            }

            let (report, result) = self.run_cycle(CycleAction::Place, &block_poses[next]);
            on_report(cycle, &report);
            result?;

            idx = next;
            cycle += 1;
        }

        Ok(())
    }

    /// The phase currently being executed.
    pub fn phase(&self) -> PnpPhase {
        self.phase
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn solver_mut(&mut self) -> &mut PoseToJointSolver<S> {
        &mut self.solver
    }

    pub fn motion(&self) -> &MotionExecutor<A, G> {
        &self.motion
    }

    pub fn motion_mut(&mut self) -> &mut MotionExecutor<A, G> {
        &mut self.motion
    }

    fn pick_phases(&mut self, target: &Pose, report: &mut CycleReport) -> Result<(), SequenceError> {
        self.motion.open_gripper()?;
        self.approach_and_descend(target, report)?;

        self.set_phase(PnpPhase::Grasping);
        self.motion.close_gripper()?;
        report.push(PnpPhase::Grasping, PhaseOutcome::Done);

        self.retract(report)
    }

    fn place_phases(&mut self, target: &Pose, report: &mut CycleReport) -> Result<(), SequenceError> {
        self.approach_and_descend(target, report)?;

        self.set_phase(PnpPhase::Releasing);
        self.motion.open_gripper()?;
        report.push(PnpPhase::Releasing, PhaseOutcome::Done);

        self.retract(report)
    }

    fn approach_and_descend(
        &mut self,
        target: &Pose,
        report: &mut CycleReport,
    ) -> Result<(), SequenceError> {
        let approach = target.offset_z(self.params.hover_distance_m);

        self.solve_and_move(PnpPhase::Approaching, &approach, report)?;
        self.solve_and_move(PnpPhase::Descending, target, report)
    }

    /// Move vertically up from the current end-effector pose, keeping its orientation.
    fn retract(&mut self, report: &mut CycleReport) -> Result<(), SequenceError> {
        let current = self.motion.endpoint_pose()?;
        let retract = current.offset_z(self.params.hover_distance_m);

        self.solve_and_move(PnpPhase::Retracting, &retract, report)
    }

    fn solve_and_move(
        &mut self,
        phase: PnpPhase,
        pose: &Pose,
        report: &mut CycleReport,
    ) -> Result<(), SequenceError> {
        self.set_phase(phase);

        let angles = self.solver.solve(pose);

        match self.motion.move_to(&angles) {
            Ok(()) => report.push(phase, PhaseOutcome::Done),
            Err(MotionError::EmptyJointTarget) => match self.params.failure_policy {
                FailurePolicy::SkipAndContinue => {
                    warn!("Skipping the {} motion, continuing with the cycle", phase);
                    report.push(phase, PhaseOutcome::Skipped);
                }
                FailurePolicy::FailFast => return Err(SequenceError::PhaseFailed { phase }),
            },
            Err(e) => return Err(e.into()),
        }

        Ok(())
    }

    fn set_phase(&mut self, phase: PnpPhase) {
        debug!("{:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::ik_solver;
    use crate::mock::{self, Cmd, CommandLog, MockArm, MockGripper, MockIkService};
    use comms_if::geom::{Point, Quaternion};

    type MockSequencer = PickPlaceSequencer<MockIkService, MockArm, MockGripper>;

    const HOVER: f64 = 0.15;

    fn block_pose(x: f64, y: f64) -> Pose {
        Pose::new(
            Point::new(x, y, -0.129),
            Quaternion::new(
                -0.0249590815779,
                0.999649402929,
                0.00737916180073,
                0.00486450832011,
            ),
        )
    }

    fn sequencer(
        log: &CommandLog,
        service: MockIkService,
        failure_policy: FailurePolicy,
    ) -> MockSequencer {
        let solver = PoseToJointSolver::new(service, ik_solver::Params::default()).unwrap();
        let motion = MotionExecutor::new(
            MockArm::new(log.clone()),
            MockGripper::new(log.clone()),
            mock::motion_params(),
        )
        .unwrap();

        PickPlaceSequencer::new(
            solver,
            motion,
            Params {
                hover_distance_m: HOVER,
                failure_policy,
            },
        )
        .unwrap()
    }

    fn move_to(pose: Pose) -> Cmd {
        Cmd::Move(mock::pose_to_joints(&pose))
    }

    #[test]
    fn test_hover_distance_must_be_positive() {
        for h in &[0.0, -0.15, std::f64::NAN] {
            let log = CommandLog::default();
            let solver =
                PoseToJointSolver::new(MockIkService::new(), ik_solver::Params::default()).unwrap();
            let motion = MotionExecutor::new(
                MockArm::new(log.clone()),
                MockGripper::new(log.clone()),
                mock::motion_params(),
            )
            .unwrap();

            let result = PickPlaceSequencer::new(
                solver,
                motion,
                Params {
                    hover_distance_m: *h,
                    ..Default::default()
                },
            );

            assert!(matches!(
                result,
                Err(SequenceError::InvalidHoverDistance(_))
            ));
        }
    }

    #[test]
    fn test_place_command_order() {
        let log = CommandLog::default();
        let mut seq = sequencer(&log, MockIkService::new(), FailurePolicy::SkipAndContinue);
        let p = block_pose(0.75, -0.1);

        let report = seq.place(&p).unwrap();

        assert_eq!(
            log.commands(),
            vec![
                move_to(p.offset_z(HOVER)),
                move_to(p),
                Cmd::OpenGripper,
                move_to(p.offset_z(HOVER)),
            ]
        );
        assert!(report.is_complete());
        assert_eq!(
            report.phases.iter().map(|p| p.phase).collect::<Vec<_>>(),
            vec![
                PnpPhase::Approaching,
                PnpPhase::Descending,
                PnpPhase::Releasing,
                PnpPhase::Retracting
            ]
        );
        assert_eq!(seq.phase(), PnpPhase::Idle);
    }

    #[test]
    fn test_pick_continues_after_invalid_descend() {
        let log = CommandLog::default();
        let p = block_pose(0.75, -0.1);
        let mut service = MockIkService::new();
        service.invalid_poses.push(p);
        let mut seq = sequencer(&log, service, FailurePolicy::SkipAndContinue);

        let report = seq.pick(&p).unwrap();

        // The arm never descends so it retracts from the approach pose
        assert_eq!(
            log.commands(),
            vec![
                Cmd::OpenGripper,
                move_to(p.offset_z(HOVER)),
                Cmd::CloseGripper,
                move_to(p.offset_z(HOVER).offset_z(HOVER)),
            ]
        );
        assert!(!report.is_complete());
        assert_eq!(
            report.phases[1],
            PhaseReport {
                phase: PnpPhase::Descending,
                outcome: PhaseOutcome::Skipped
            }
        );
        assert_eq!(seq.phase(), PnpPhase::Idle);
    }

    #[test]
    fn test_fail_fast_aborts_cycle() {
        let log = CommandLog::default();
        let p = block_pose(0.75, -0.1);
        let mut service = MockIkService::new();
        service.invalid_poses.push(p);
        let mut seq = sequencer(&log, service, FailurePolicy::FailFast);

        assert!(matches!(
            seq.pick(&p),
            Err(SequenceError::PhaseFailed {
                phase: PnpPhase::Descending
            })
        ));
        assert_eq!(
            log.commands(),
            vec![Cmd::OpenGripper, move_to(p.offset_z(HOVER))]
        );
        assert_eq!(seq.phase(), PnpPhase::Idle);
    }

    #[test]
    fn test_arm_errors_always_propagate() {
        let log = CommandLog::default();
        let mut seq = sequencer(&log, MockIkService::new(), FailurePolicy::SkipAndContinue);

        let mut arm = MockArm::new(log.clone());
        arm.fail = true;
        *seq.motion_mut() = MotionExecutor::new(
            arm,
            MockGripper::new(log.clone()),
            mock::motion_params(),
        )
        .unwrap();

        assert!(matches!(
            seq.place(&block_pose(0.75, -0.1)),
            Err(SequenceError::Motion(MotionError::Arm(_)))
        ));
        assert_eq!(seq.phase(), PnpPhase::Idle);
    }

    #[test]
    fn test_pick_then_place_round_trip() {
        let log = CommandLog::default();
        let mut seq = sequencer(&log, MockIkService::new(), FailurePolicy::SkipAndContinue);
        let p = block_pose(0.75, -0.1);

        seq.pick(&p).unwrap();
        let after_pick = seq.motion().arm().current.clone();

        seq.place(&p).unwrap();
        let after_place = seq.motion().arm().current.clone();

        assert!(after_pick.same_joints(&after_place));
        assert!(after_pick.max_abs_diff(&after_place).unwrap() < 1e-9);
    }

    #[test]
    fn test_block_loop_alternates_poses() {
        let log = CommandLog::default();
        let mut seq = sequencer(&log, MockIkService::new(), FailurePolicy::SkipAndContinue);
        let poses = vec![block_pose(0.75, -0.1), block_pose(0.75, 0.0)];
        let mut reports = Vec::new();

        seq.run_block_loop(&poses, 2, || false, |cycle, r| {
            reports.push((cycle, r.action, r.target))
        })
        .unwrap();

        assert_eq!(
            reports,
            vec![
                (0, CycleAction::Pick, poses[0]),
                (0, CycleAction::Place, poses[1]),
                (1, CycleAction::Pick, poses[1]),
                (1, CycleAction::Place, poses[0]),
            ]
        );

        assert!(matches!(
            seq.run_block_loop(&[], 1, || false, |_, _| ()),
            Err(SequenceError::NoBlockPoses)
        ));
    }

    #[test]
    fn test_failed_cycle_still_reported() {
        let log = CommandLog::default();
        let poses = vec![block_pose(0.75, -0.1), block_pose(0.75, 0.0)];
        let mut service = MockIkService::new();
        service.invalid_poses.push(poses[0]);
        let mut seq = sequencer(&log, service, FailurePolicy::FailFast);
        let mut reports = Vec::new();

        let result = seq.run_block_loop(&poses, 0, || false, |cycle, r| {
            reports.push((cycle, r.clone()))
        });

        assert!(matches!(
            result,
            Err(SequenceError::PhaseFailed {
                phase: PnpPhase::Descending
            })
        ));
        assert_eq!(reports.len(), 1);

        let (cycle, report) = &reports[0];
        assert_eq!(*cycle, 0);
        assert_eq!(report.action, CycleAction::Pick);
        assert!(!report.is_complete());
        assert_eq!(
            report.phases,
            vec![
                PhaseReport {
                    phase: PnpPhase::Approaching,
                    outcome: PhaseOutcome::Done
                },
                PhaseReport {
                    phase: PnpPhase::Descending,
                    outcome: PhaseOutcome::Failed
                },
            ]
        );
        assert_eq!(seq.phase(), PnpPhase::Idle);
    }

    #[test]
    fn test_block_loop_stops_when_asked() {
        let log = CommandLog::default();
        let mut seq = sequencer(&log, MockIkService::new(), FailurePolicy::SkipAndContinue);
        let poses = vec![block_pose(0.75, -0.1), block_pose(0.75, 0.0)];
        let mut actions = Vec::new();

        // Unbounded loop, stop requested after the third check (between cycle 1's pick and place)
        let mut checks = 0;
        seq.run_block_loop(
            &poses,
            0,
            || {
                checks += 1;
                checks > 3
            },
            |cycle, r| actions.push((cycle, r.action)),
        )
        .unwrap();

        assert_eq!(
            actions,
            vec![
                (0, CycleAction::Pick),
                (0, CycleAction::Place),
                (1, CycleAction::Pick),
            ]
        );

        // A stop requested up front runs nothing
        let before = log.commands().len();
        seq.run_block_loop(&poses, 0, || true, |_, _| panic!("No cycle should run"))
            .unwrap();
        assert_eq!(log.commands().len(), before);
    }
}
