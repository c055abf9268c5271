//! Decide what to do with the local file given the server state.

use super::diff::ChangeSet;
use super::hash::HashError;
use super::input::ModelsInput;

/// Outcome of comparing local and remote documents.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Nothing on the server. Write the example only if there is no local file.
    UseLocalAsIs { write_example: bool },
    /// The local file changed since the last sync and would be overwritten.
    NeedsConflictCheck { local_hash: String },
    /// Local and remote normalize to the same document.
    Equivalent,
    /// Documents differ.
    Diff(ChangeSet),
}

/// Decide how to refresh the local file from `remote`.
///
/// `last_known_hash` is the sidecar value; it is only consulted when
/// `check_conflicts` is set and a local file exists.
pub fn reconcile(
    remote: &ModelsInput,
    local: Option<&ModelsInput>,
    last_known_hash: Option<&str>,
    check_conflicts: bool,
) -> Result<Decision, HashError> {
    if remote.is_empty() {
        return Ok(Decision::UseLocalAsIs {
            write_example: local.is_none(),
        });
    }

    let Some(local) = local else {
        return compare(&ModelsInput::default(), remote);
    };

    if check_conflicts {
        let local_hash = local.hash()?;
        if last_known_hash != Some(local_hash.as_str()) {
            return Ok(Decision::NeedsConflictCheck { local_hash });
        }
    }

    compare(local, remote)
}

/// `Equivalent` or the diff of `next` against `previous`.
pub fn compare(previous: &ModelsInput, next: &ModelsInput) -> Result<Decision, HashError> {
    if next.equals(previous)? {
        return Ok(Decision::Equivalent);
    }
    Ok(Decision::Diff(next.diff(previous)?))
}
