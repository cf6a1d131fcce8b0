//! # Simulated Scene Commands
//!
//! Requests used to populate and clear the simulated world the arm operates in.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::geom::Pose;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Spawn a model into the simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnModel {
    /// Unique name of the model instance in the world
    pub model_name: String,

    /// Format of `model_xml`
    pub format: ModelFormat,

    /// Model description
    pub model_xml: String,

    /// Namespace the model's plugins are started in
    pub robot_namespace: String,

    /// Pose the model is spawned at, expressed in `reference_frame`
    pub initial_pose: Pose,

    pub reference_frame: String,
}

/// Response from the scene server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneResponse {
    pub success: bool,

    #[serde(default)]
    pub status_message: String,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Model description formats understood by the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFormat {
    Sdf,
    Urdf,
}

/// Requests sent from the SceneClient to the scene server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SceneRequest {
    Spawn(SpawnModel),

    /// Remove the named model from the world.
    Delete { model_name: String },
}
