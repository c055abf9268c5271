//! Local models file and its `.hash` sidecar.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::input::{unknown_fields, ModelsInput};
use super::SyncError;
use crate::config::XdgDirs;

/// File name of the models document inside the config directory.
pub const DEFAULT_FILE_NAME: &str = "custom-models.json";

/// The local models document plus the hash of its last synced state.
///
/// Conflict detection only applies at the default location; a file given
/// explicitly by path is trusted as-is and never gets a sidecar.
#[derive(Debug, Clone)]
pub struct ModelsFile {
    path: PathBuf,
    default_location: bool,
}

impl ModelsFile {
    /// `custom-models.json` in the config directory.
    pub fn at_default(dirs: &XdgDirs) -> Self {
        Self {
            path: dirs.config.join(DEFAULT_FILE_NAME),
            default_location: true,
        }
    }

    /// A file chosen by the user.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            default_location: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `<path>.hash`
    pub fn hash_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".hash");
        PathBuf::from(name)
    }

    pub fn checks_conflicts(&self) -> bool {
        self.default_location
    }

    /// Raw bytes, `None` if the file does not exist.
    pub fn read_bytes(&self) -> Result<Option<Vec<u8>>, SyncError> {
        read_optional(&self.path)
    }

    /// Parsed document, `None` if the file does not exist.
    pub fn read(&self) -> Result<Option<ModelsInput>, SyncError> {
        match self.read_bytes()? {
            None => Ok(None),
            Some(bytes) => {
                let parse_error = |source: serde_json::Error| SyncError::Parse {
                    path: self.path.clone(),
                    source,
                };
                let value: serde_json::Value =
                    serde_json::from_slice(&bytes).map_err(parse_error)?;
                let unknown = unknown_fields(&value);
                if !unknown.is_empty() {
                    return Err(SyncError::Validation(unknown));
                }
                ModelsInput::from_value(value).map(Some).map_err(parse_error)
            }
        }
    }

    /// Write pretty JSON, creating parent directories as needed.
    pub fn write(&self, doc: &ModelsInput) -> Result<(), SyncError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = doc.to_json_pretty()?;
        fs::write(&self.path, content)?;
        debug!(path = %self.path.display(), "Wrote models file");
        Ok(())
    }

    /// Last recorded hash, `None` when no sidecar exists.
    pub fn read_hash(&self) -> Result<Option<String>, SyncError> {
        Ok(read_optional(&self.hash_path())?
            .map(|bytes| String::from_utf8_lossy(&bytes).trim().to_string()))
    }

    pub fn write_hash(&self, hash: &str) -> Result<(), SyncError> {
        let path = self.hash_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, hash)?;
        debug!(path = %path.display(), "Recorded models hash");
        Ok(())
    }
}

fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, SyncError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}
