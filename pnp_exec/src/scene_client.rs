//! # Scene Client
//!
//! Populates the simulated world with the props the arm works with, and clears them again on
//! shutdown. Nothing here is fatal to the executable: failures are logged and the remaining models
//! are still handled.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use comms_if::{
    eqpt::scene::{ModelFormat, SceneRequest, SceneResponse, SpawnModel},
    geom::Pose,
    net::{self, zmq, MonitoredSocket, MonitoredSocketError, RequestError, SocketOptions},
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

const WORLD_FRAME: &str = "world";

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A connection to the simulator's model spawning service.
pub trait SceneService {
    fn spawn(&mut self, model: &SpawnModel) -> Result<(), SceneClientError>;

    fn delete(&mut self, model_name: &str) -> Result<(), SceneClientError>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct SceneClient {
    socket: MonitoredSocket,
}

/// Scene description, loaded from the scene parameter file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneParams {
    /// Directory holding the model description files, relative to the software root
    pub models_dir: String,

    pub models: Vec<ModelSpec>,
}

/// A model to spawn into the scene.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSpec {
    pub name: String,

    /// Model description file, relative to the models directory
    pub file: String,

    pub format: ModelFormat,

    pub pose: Pose,

    #[serde(default = "default_reference_frame")]
    pub reference_frame: String,
}

/// Models spawned into the scene. Dropping this deletes them from the simulation.
pub struct LoadedScene<S: SceneService> {
    service: S,
    model_names: Vec<String>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum SceneClientError {
    #[error("Socket error: {0}")]
    SocketError(#[from] MonitoredSocketError),

    #[error("Scene service call failed: {0}")]
    RequestError(#[from] RequestError),

    #[error("The scene server rejected the request: {0}")]
    Rejected(String),

    #[error("Could not read the model file {0:?}: {1}")]
    ModelFileError(PathBuf, std::io::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SceneClient {
    /// Create a new scene client, waiting up to `connect_timeout` for the server.
    pub fn new(
        ctx: &zmq::Context,
        endpoint: &str,
        connect_timeout: Duration,
    ) -> Result<Self, SceneClientError> {
        let socket = MonitoredSocket::new(
            ctx,
            zmq::REQ,
            SocketOptions {
                block_on_first_connect: Some(connect_timeout),
                ..SocketOptions::req_client(5000)
            },
            endpoint,
        )?;

        Ok(Self { socket })
    }

    fn request(&mut self, request: &SceneRequest) -> Result<(), SceneClientError> {
        let response: SceneResponse = net::request_json(&self.socket, request)?;

        match response.success {
            true => Ok(()),
            false => Err(SceneClientError::Rejected(response.status_message)),
        }
    }
}

impl SceneService for SceneClient {
    fn spawn(&mut self, model: &SpawnModel) -> Result<(), SceneClientError> {
        self.request(&SceneRequest::Spawn(model.clone()))
    }

    fn delete(&mut self, model_name: &str) -> Result<(), SceneClientError> {
        self.request(&SceneRequest::Delete {
            model_name: model_name.to_string(),
        })
    }
}

impl ModelSpec {
    /// Build the spawn request for this model, reading its description from `models_root`.
    pub fn to_spawn_request(&self, models_root: &Path) -> Result<SpawnModel, SceneClientError> {
        let path = models_root.join(&self.file);

        let model_xml = fs::read_to_string(&path)
            .map_err(|e| SceneClientError::ModelFileError(path, e))?
            .replace('\n', "");

        Ok(SpawnModel {
            model_name: self.name.clone(),
            format: self.format,
            model_xml,
            robot_namespace: String::from("/"),
            initial_pose: self.pose,
            reference_frame: self.reference_frame.clone(),
        })
    }
}

impl<S: SceneService> LoadedScene<S> {
    pub fn model_names(&self) -> &[String] {
        &self.model_names
    }

    pub fn service(&self) -> &S {
        &self.service
    }
}

impl<S: SceneService> Drop for LoadedScene<S> {
    fn drop(&mut self) {
        info!("Removing models from the scene");

        // The simulator may already have gone away, which is fine
        for name in self.model_names.iter() {
            match self.service.delete(name) {
                Ok(()) => debug!("Deleted {}", name),
                Err(e) => info!("Delete model service call failed for {}: {}", name, e),
            }
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Spawn every model in `params` into the scene.
///
/// Models which fail to spawn are logged and skipped. All configured models are deleted when the
/// returned guard is dropped.
pub fn load_scene<S: SceneService>(
    mut service: S,
    params: &SceneParams,
    models_root: &Path,
) -> LoadedScene<S> {
    for model in params.models.iter() {
        info!("Spawning {} ({:?})", model.name, model.format);

        let result = model
            .to_spawn_request(models_root)
            .and_then(|req| service.spawn(&req));

        if let Err(e) = result {
            error!("Spawn {:?} service call failed: {}", model.format, e);
        }
    }

    LoadedScene {
        service,
        model_names: params.models.iter().map(|m| m.name.clone()).collect(),
    }
}

fn default_reference_frame() -> String {
    String::from(WORLD_FRAME)
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
