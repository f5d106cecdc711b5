//! Parameter file loading
//!
//! All parameter files are TOML and live in the `params` directory under the
//! software root (see [`crate::host::get_sw_root`]).

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::de::DeserializeOwned;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};
use thiserror::Error;
use toml;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// An error that occurs during loading of a parameter file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("The software root environment variable ({}) is not set", crate::host::SW_ROOT_ENV_VAR)]
    SwRootNotSet,

    #[error("Cannot load the parameter file {0:?}: {1}")]
    FileLoadError(PathBuf, std::io::Error),

    #[error("Cannot read the parameter file: {0}")]
    DeserialiseError(toml::de::Error)
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Load a parameter file
///
/// The file path is relative to the `$STEER_SW_ROOT/params` directory.
pub fn load<P>(param_file_path: &str) -> Result<P, LoadError>
where
    P: DeserializeOwned
{
    // Get the params dir
    let mut path = crate::host::get_sw_root()
        .map_err(|_| LoadError::SwRootNotSet)?;
    path.push("params");
    path.push(param_file_path);

    load_from_path(&path)
}

/// Load a parameter file from an explicit path.
pub fn load_from_path<P>(path: &Path) -> Result<P, LoadError>
where
    P: DeserializeOwned
{
    let params_str = read_to_string(path)
        .map_err(|e| LoadError::FileLoadError(path.to_path_buf(), e))?;

    from_str(&params_str)
}

/// Parse parameters from a TOML string.
pub fn from_str<P>(params_str: &str) -> Result<P, LoadError>
where
    P: DeserializeOwned
{
    toml::from_str(params_str).map_err(LoadError::DeserialiseError)
}

#[cfg(test)]
mod test {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct TestParams {
        endpoint: String,
        gains: [f64; 3]
    }

    #[test]
    fn test_from_str() {
        let p: TestParams = from_str(
            "endpoint = \"tcp://localhost:4567\"\ngains = [0.1, 0.001, 3.0]\n"
        ).unwrap();

        assert_eq!(p, TestParams {
            endpoint: "tcp://localhost:4567".into(),
            gains: [0.1, 0.001, 3.0]
        });
    }

    #[test]
    fn test_from_str_invalid() {
        let r: Result<TestParams, _> = from_str("endpoint = 4");
        assert!(matches!(r, Err(LoadError::DeserialiseError(_))));
    }

    #[test]
    fn test_missing_file() {
        let r: Result<TestParams, _> = load_from_path(
            Path::new("/definitely/not/a/params/file.toml")
        );
        assert!(matches!(r, Err(LoadError::FileLoadError(_, _))));
    }
}
