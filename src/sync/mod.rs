//! Sync of custom models, providers and packs with the server.
//!
//! This module handles:
//! - The local models document and its `.hash` sidecar
//! - Content hashing for conflict detection
//! - Deciding between the local file and the server state
//! - Per-kind diffs reported after a push
//!
//! The two entry points are [`SyncSession::open`], which refreshes the
//! local file from the server, and [`SyncSession::save`], which pushes it.

pub mod diff;
pub mod example;
pub mod hash;
pub mod input;
pub mod reconcile;
pub mod store;

pub use diff::{Change, ChangeAction, ChangeSet, EntityKind, KindDiff};
pub use example::example_template;
pub use hash::HashError;
pub use input::{ModelsInput, SCHEMA_URL};
pub use reconcile::{compare, reconcile, Decision};
pub use store::ModelsFile;

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::{fetch_remote_models, ApiError, ModelsApi};

/// Errors raised while syncing custom models.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to serialize models: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("Invalid models file:\n{}", .0.join("\n"))]
    Validation(Vec<String>),
    #[error(transparent)]
    Hash(#[from] HashError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Confirmation asked before local edits are dropped.
pub trait Confirm {
    /// `path` has local changes the server state would overwrite.
    /// Return `true` to drop them.
    fn confirm_overwrite(&self, path: &Path) -> io::Result<bool>;
}

/// Result of refreshing the local file from the server.
#[derive(Debug, Clone, PartialEq)]
pub enum OpenOutcome {
    /// Nothing on the server and no local file: the example was written.
    ExampleWritten,
    /// Nothing on the server; the existing local file was left alone.
    LocalKept,
    /// The local file already matches the server.
    Equivalent,
    /// The local file was replaced with the server state.
    Refreshed(ChangeSet),
    /// The user declined to drop local changes. Nothing was written.
    Cancelled,
}

/// Result of pushing the local file.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    NoChanges,
    Pushed(ChangeSet),
}

/// One open or save of the local models file against the server.
pub struct SyncSession<'a, A: ModelsApi + ?Sized> {
    api: &'a A,
    file: ModelsFile,
    is_cloud: bool,
}

impl<'a, A: ModelsApi + ?Sized> SyncSession<'a, A> {
    pub fn new(api: &'a A, file: ModelsFile, is_cloud: bool) -> Self {
        Self {
            api,
            file,
            is_cloud,
        }
    }

    pub fn file(&self) -> &ModelsFile {
        &self.file
    }

    /// Bring the local file up to date with the server.
    pub async fn open(&self, confirm: &dyn Confirm) -> Result<OpenOutcome, SyncError> {
        let remote = fetch_remote_models(self.api, self.is_cloud).await?;
        let local = self.file.read()?;
        let last_hash = if self.file.checks_conflicts() {
            self.file.read_hash()?
        } else {
            None
        };

        let mut decision = reconcile(
            &remote,
            local.as_ref(),
            last_hash.as_deref(),
            self.file.checks_conflicts(),
        )?;

        loop {
            match decision {
                Decision::NeedsConflictCheck { local_hash } => {
                    warn!(
                        path = %self.file.path().display(),
                        hash = %local_hash,
                        "Models file has local changes"
                    );
                    if !confirm.confirm_overwrite(self.file.path())? {
                        info!("Kept local changes");
                        return Ok(OpenOutcome::Cancelled);
                    }
                    decision = compare(&local.clone().unwrap_or_default(), &remote)?;
                }
                Decision::UseLocalAsIs {
                    write_example: true,
                } => {
                    self.file.write(&example_template(self.is_cloud))?;
                    info!(path = %self.file.path().display(), "Wrote example models file");
                    return Ok(OpenOutcome::ExampleWritten);
                }
                Decision::UseLocalAsIs {
                    write_example: false,
                } => return Ok(OpenOutcome::LocalKept),
                Decision::Equivalent => {
                    if let (true, Some(local)) = (self.file.checks_conflicts(), local.as_ref()) {
                        self.file.write_hash(&local.hash()?)?;
                    }
                    return Ok(OpenOutcome::Equivalent);
                }
                Decision::Diff(changes) => {
                    let refreshed = remote.prepared();
                    self.file.write(&refreshed)?;
                    if self.file.checks_conflicts() {
                        self.file.write_hash(&refreshed.hash()?)?;
                    }
                    debug!(changes = changes.changes().len(), "Refreshed models file");
                    return Ok(OpenOutcome::Refreshed(changes));
                }
            }
        }
    }

    /// Validate the local file and push it if it differs from the server.
    ///
    /// An empty document is never pushed.
    pub async fn save(&self) -> Result<SaveOutcome, SyncError> {
        let local = self
            .file
            .read()?
            .ok_or_else(|| SyncError::NotFound(self.file.path().to_path_buf()))?;
        local.validate().map_err(SyncError::Validation)?;
        if local.is_empty() {
            info!(path = %self.file.path().display(), "Models file is empty, nothing to save");
            return Ok(SaveOutcome::NoChanges);
        }

        let remote = fetch_remote_models(self.api, self.is_cloud).await?;

        let changes = match compare(&remote, &local)? {
            Decision::Diff(changes) if !changes.is_empty() => changes,
            _ => {
                self.record_hash(&local)?;
                info!("No changes to custom models");
                return Ok(SaveOutcome::NoChanges);
            }
        };

        self.api.create_custom_models(&local.prepared()).await?;
        self.record_hash(&local)?;
        info!(changes = changes.changes().len(), "Pushed custom models");
        Ok(SaveOutcome::Pushed(changes))
    }

    fn record_hash(&self, doc: &ModelsInput) -> Result<(), SyncError> {
        if self.file.checks_conflicts() {
            self.file.write_hash(&doc.hash()?)?;
        }
        Ok(())
    }
}
