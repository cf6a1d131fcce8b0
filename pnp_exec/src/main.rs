//! Main pick and place executable entry point.
//!
//! # Architecture
//!
//! The executable runs a single scripted task and then exits:
//!
//!     - Initialise the session, logging and parameters
//!     - Populate the simulated scene and wait for the simulation to start
//!     - Connect to the kinematics service, arm and gripper
//!     - Run the task selected by `--mode`:
//!         - `path`: move through the scripted joint path
//!         - `pnp`: move to start then pick and place the block between the configured poses
//!         - `start`: move to start only
//!     - Remove the scene models
//!
//! An interrupt ends the wait for the simulation, or the pick and place loop before its next pick
//! or place, so that the scene is still removed and saved reports are flushed. The shorter tasks
//! run to completion. A second interrupt exits immediately.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{error, info, warn};
use std::{
    str::FromStr,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};
use structopt::StructOpt;

// Internal
use pnp_lib::{
    arm_client::{ArmClient, GripperClient},
    ik_client::IkClient,
    ik_solver::PoseToJointSolver,
    joint_path::JointPath,
    motion_exec::MotionExecutor,
    params::PnpExecParams,
    pnp_seq::{CycleAction, PickPlaceSequencer},
    scene_client::{self, SceneClient, SceneParams},
    sim_client,
};
use util::{
    host,
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

/// Scripted pick and place controller for a single arm.
#[derive(Debug, StructOpt)]
#[structopt(name = "pnp_exec")]
struct Opts {
    /// Task to run, one of `path`, `pnp` or `start`.
    #[structopt(long, default_value = "path")]
    mode: Mode,

    /// Don't spawn the scene models or wait for the simulation, for use with real hardware.
    #[structopt(long)]
    no_scene: bool,

    /// Log every kinematics solution.
    #[structopt(short, long)]
    verbose: bool,
}

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Path,
    Pnp,
    Start,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "path" => Ok(Mode::Path),
            "pnp" => Ok(Mode::Pnp),
            "start" => Ok(Mode::Start),
            _ => Err(format!("Unknown mode \"{}\", expected path, pnp or start", s)),
        }
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opts = Opts::from_args();

    // ---- EARLY INITIALISATION ----

    let session = Session::new("pnp_exec", "sessions").wrap_err("Failed to create the session")?;

    logger_init(LevelFilter::Debug, &session).wrap_err("Failed to initialise logging")?;

    info!("Pick and Place Executable\n");
    info!("Session directory: {:?}", session.session_root);
    info!("Options: {:?}\n", opts);

    let stop = Arc::new(AtomicBool::new(false));
    let handler_stop = stop.clone();
    ctrlc::set_handler(move || {
        if handler_stop.swap(true, Ordering::SeqCst) {
            warn!("Second interrupt, exiting without removing the scene");
            std::process::exit(130);
        }
        warn!("Interrupt received, stopping before the next pick or place");
    })
    .wrap_err("Failed to set the interrupt handler")?;

    let result = run(&opts, &session, &stop);

    // Flush pending reports however the task ended
    session.exit();

    result
}

/// Initialise the scene and equipment and run the selected task.
///
/// The scene guard is dropped, removing the models, when this returns.
fn run(opts: &Opts, session: &Session, stop: &Arc<AtomicBool>) -> Result<(), Report> {
    // ---- LOAD PARAMETERS ----

    let mut params: PnpExecParams =
        util::params::load("pnp_exec.toml").wrap_err("Could not load pnp_exec params")?;

    if opts.verbose {
        params.solver.verbose = true;
    }

    info!("Exec parameters loaded");

    let zmq_ctx = comms_if::net::zmq::Context::new();

    // ---- SCENE ----

    // Models are removed when the guard is dropped at the end of this function
    let _scene = match opts.no_scene {
        true => None,
        false => {
            let scene = load_scene(&zmq_ctx, &params);

            info!("Waiting for the simulation to start...");
            sim_client::wait_for_sim_started(&zmq_ctx, &params.sim_endpoint, None, stop)
                .wrap_err("Failed waiting for the simulation to start")?;
            info!("Simulation started");

            scene
        }
    };

    // ---- INITIALISE EQUIPMENT ----

    info!("Initialising equipment");

    let ik_client =
        IkClient::new(&zmq_ctx, &params).wrap_err("Failed to initialise the IkClient")?;
    let solver = PoseToJointSolver::new(ik_client, params.solver.clone())
        .wrap_err("Failed to initialise the PoseToJointSolver")?;
    info!("PoseToJointSolver initialised");

    let arm = ArmClient::new(&zmq_ctx, &params).wrap_err("Failed to initialise the ArmClient")?;
    let gripper =
        GripperClient::new(&zmq_ctx, &params).wrap_err("Failed to initialise the GripperClient")?;
    let mut motion = MotionExecutor::new(arm, gripper, params.motion.clone())
        .wrap_err("Failed to initialise the MotionExecutor")?;
    info!(
        "MotionExecutor initialised (robot was {} enabled)",
        if motion.init_enabled() { "already" } else { "not" }
    );

    // ---- RUN TASK ----

    match opts.mode {
        Mode::Start => {
            motion
                .move_to_start(params.start_angles.as_ref())
                .wrap_err("Failed to move to start")?;
        }
        Mode::Path => {
            let path = JointPath::load(&params.joint_path_file, params.solver.num_joints)
                .wrap_err("Could not load the joint path")?;
            info!("Loaded joint path with {} waypoints", path.len());

            path.run(&mut motion)
                .wrap_err("Failed to run the joint path")?;
        }
        Mode::Pnp => {
            motion
                .move_to_start(params.start_angles.as_ref())
                .wrap_err("Failed to move to start")?;

            let mut sequencer = PickPlaceSequencer::new(solver, motion, params.sequencer.clone())
                .wrap_err("Failed to initialise the PickPlaceSequencer")?;

            sequencer
                .run_block_loop(
                    &params.block_poses,
                    params.num_cycles,
                    || stop.load(Ordering::SeqCst),
                    |cycle, report| {
                        if !report.is_complete() {
                            warn!(
                                "{:?} cycle {} ended with skipped or failed phases",
                                report.action, cycle
                            );
                        }

                        let action = match report.action {
                            CycleAction::Pick => "pick",
                            CycleAction::Place => "place",
                        };
                        session.save(
                            format!("reports/cycle_{:05}_{}.json", cycle, action),
                            report.clone(),
                        );
                    },
                )
                .wrap_err("Pick and place failed")?;
        }
    }

    info!("Task complete");

    Ok(())
}

/// Spawn the scene models, logging rather than returning any failure.
fn load_scene(
    ctx: &comms_if::net::zmq::Context,
    params: &PnpExecParams,
) -> Option<scene_client::LoadedScene<SceneClient>> {
    let scene_params: SceneParams = match util::params::load(&params.scene_file) {
        Ok(p) => p,
        Err(e) => {
            error!("Could not load the scene params: {}", e);
            return None;
        }
    };

    let models_root = match host::get_pnp_sw_root() {
        Ok(r) => r.join(&scene_params.models_dir),
        Err(e) => {
            error!("Could not find the models directory: {}", e);
            return None;
        }
    };

    let client = match SceneClient::new(
        ctx,
        &params.scene_endpoint,
        util::time::seconds_to_std(params.scene_connect_timeout_s),
    ) {
        Ok(c) => c,
        Err(e) => {
            error!("Could not connect to the scene server: {}", e);
            return None;
        }
    };

    Some(scene_client::load_scene(client, &scene_params, &models_root))
}
