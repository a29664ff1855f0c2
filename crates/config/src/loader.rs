//! Parse and load user configuration.

use std::{ffi::OsStr, fs, path::Path};

use crate::{Config, Error};

/// Parse and validate a config from RON source.
pub fn load_from_str(source: &str) -> Result<Config, Error> {
    let config: Config = ron::from_str(source).map_err(|e| Error::Parse {
        path: None,
        message: e.to_string(),
    })?;
    config.validate()?;
    Ok(config)
}

/// Load a validated `Config` from a RON file at `path`.
pub fn load_from_path(path: &Path) -> Result<Config, Error> {
    if path.extension() != Some(OsStr::new("ron")) {
        return Err(Error::Read {
            path: Some(path.to_path_buf()),
            message: "Unsupported config format (expected a .ron file)".to_string(),
        });
    }
    let source = fs::read_to_string(path).map_err(|e| Error::Read {
        path: Some(path.to_path_buf()),
        message: e.to_string(),
    })?;
    load_from_str(&source).map_err(|e| e.with_path(path))
}
