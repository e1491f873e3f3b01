//! Generic parameters functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::de::DeserializeOwned;
use std::{fs::read_to_string, path::{Path, PathBuf}};
use thiserror::Error;
use toml;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Environment variable pointing at the root of the software checkout.
pub const SW_ROOT_ENV_VAR: &str = "NAV_SW_ROOT";

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// An error that occurs during loading of a parameter file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("The software root environment variable (NAV_SW_ROOT) is not set")]
    SwRootNotSet,

    #[error("Cannot load the parmeter file: {0}")]
    FileLoadError(std::io::Error),

    #[error("Cannot read the parameter file: {0}")]
    DeserialiseError(toml::de::Error)
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the root directory of the software, as given by the `NAV_SW_ROOT` environment variable.
pub fn get_sw_root() -> Result<PathBuf, LoadError> {
    std::env::var_os(SW_ROOT_ENV_VAR)
        .map(PathBuf::from)
        .ok_or(LoadError::SwRootNotSet)
}

/// Load a parameter file
///
/// The file path is relative to the "$NAV_SW_ROOT/params" directory
pub fn load<P>(param_file_path: &str) -> Result<P, LoadError>
where
    P: DeserializeOwned
{
    // Get the params dir
    let mut path = get_sw_root()?;
    path.push("params");
    path.push(param_file_path);

    load_from(path)
}

/// Load a parameter file from an explicit path.
pub fn load_from<P, F>(path: F) -> Result<P, LoadError>
where
    P: DeserializeOwned,
    F: AsRef<Path>
{
    // Load the file into a string
    let params_str = match read_to_string(path) {
        Ok(s) => s,
        Err(e) => return Err(LoadError::FileLoadError(e))
    };

    from_str(params_str.as_str())
}

/// Parse parameters from a TOML string.
pub fn from_str<P>(params_str: &str) -> Result<P, LoadError>
where
    P: DeserializeOwned
{
    toml::from_str(params_str).map_err(LoadError::DeserialiseError)
}
