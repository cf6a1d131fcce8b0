//! Host platform utility functions

use std::env;
use std::path::PathBuf;

/// Environment variable holding the software root directory.
pub const SW_ROOT_ENV_VAR: &str = "PNP_SW_ROOT";

/// Get the software root directory, which contains the `params` and `sessions` directories.
pub fn get_pnp_sw_root() -> Result<PathBuf, env::VarError> {
    env::var(SW_ROOT_ENV_VAR).map(PathBuf::from)
}
