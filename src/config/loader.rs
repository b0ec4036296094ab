//! Capability-scoped loading of configuration files.

use super::{ConfigError, ConfigResult, DispatchSettings, ReferenceDataDocument};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use tracing::info;

/// Directory holding dispatch configuration files.
///
/// Reads are confined to the opened directory; paths that escape it are
/// refused by the capability layer.
#[derive(Debug)]
pub struct ConfigDirectory {
    dir: Dir,
    path: String,
}

impl ConfigDirectory {
    /// Opens a configuration directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the directory cannot be opened.
    pub fn open(path: &str) -> ConfigResult<Self> {
        let dir = Dir::open_ambient_dir(path, ambient_authority()).map_err(|source| {
            ConfigError::Io {
                path: path.to_owned(),
                source,
            }
        })?;
        Ok(Self {
            dir,
            path: path.to_owned(),
        })
    }

    /// Reads and validates settings from `file`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file cannot be read, or the
    /// parse and validation errors of [`DispatchSettings::from_toml_str`].
    pub fn load_settings(&self, file: &str) -> ConfigResult<DispatchSettings> {
        let settings = DispatchSettings::from_toml_str(&self.read(file)?)?;
        info!(directory = %self.path, file, "loaded dispatch settings");
        Ok(settings)
    }

    /// Reads the reference data document in `file`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file cannot be read and
    /// [`ConfigError::Parse`] for malformed TOML.
    pub fn load_reference_data(&self, file: &str) -> ConfigResult<ReferenceDataDocument> {
        let document = ReferenceDataDocument::from_toml_str(&self.read(file)?)?;
        info!(
            directory = %self.path,
            file,
            routes = document.routes.len(),
            carriers = document.carriers.len(),
            "loaded reference data"
        );
        Ok(document)
    }

    fn read(&self, file: &str) -> ConfigResult<String> {
        self.dir
            .read_to_string(file)
            .map_err(|source| ConfigError::Io {
                path: format!("{}/{file}", self.path),
                source,
            })
    }
}
