//! Per-kind diffs between two model documents.
//!
//! Each entity kind is diffed independently by its key. Entities whose
//! canonical form is unchanged are dropped; the rest are added or updated
//! depending on whether the key existed before. Keys that disappeared are
//! deleted. Entries keep the order of the document they came from.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::Serialize;

use super::hash::{canonical_bytes, HashError};
use crate::models::{CustomModel, CustomProvider, ModelPackSchema};

/// Anything diffed by a string key.
pub trait Keyed: Serialize {
    fn key(&self) -> String;
}

impl Keyed for CustomModel {
    fn key(&self) -> String {
        self.model_id().to_string()
    }
}

impl Keyed for CustomProvider {
    fn key(&self) -> String {
        self.name.clone()
    }
}

impl Keyed for ModelPackSchema {
    fn key(&self) -> String {
        self.name.clone()
    }
}

/// Entity kinds in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EntityKind {
    Provider,
    Model,
    ModelPack,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [EntityKind::Provider, EntityKind::Model, EntityKind::ModelPack];

    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Provider => "provider",
            EntityKind::Model => "model",
            EntityKind::ModelPack => "model pack",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What happened to one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ChangeAction {
    Added,
    Updated,
    Deleted,
}

/// One line of a change set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub action: ChangeAction,
    pub kind: EntityKind,
    pub key: String,
}

/// Added, updated and deleted keys of one entity kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KindDiff {
    pub added: Vec<String>,
    pub updated: Vec<String>,
    pub deleted: Vec<String>,
}

impl KindDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }

    fn keys(&self, action: ChangeAction) -> &[String] {
        match action {
            ChangeAction::Added => &self.added,
            ChangeAction::Updated => &self.updated,
            ChangeAction::Deleted => &self.deleted,
        }
    }
}

/// Diff of all three entity kinds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub providers: KindDiff,
    pub models: KindDiff,
    pub model_packs: KindDiff,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty() && self.models.is_empty() && self.model_packs.is_empty()
    }

    pub fn kind(&self, kind: EntityKind) -> &KindDiff {
        match kind {
            EntityKind::Provider => &self.providers,
            EntityKind::Model => &self.models,
            EntityKind::ModelPack => &self.model_packs,
        }
    }

    /// Changes in display order: added, then updated, then deleted;
    /// providers before models before model packs within each group.
    pub fn changes(&self) -> Vec<Change> {
        let mut out = Vec::new();
        for action in [ChangeAction::Added, ChangeAction::Updated, ChangeAction::Deleted] {
            for kind in EntityKind::ALL {
                out.extend(self.kind(kind).keys(action).iter().map(|key| Change {
                    action,
                    kind,
                    key: key.clone(),
                }));
            }
        }
        out
    }
}

/// Diff `next` against `previous` for one entity kind.
pub fn diff_kind<T: Keyed>(previous: &[T], next: &[T]) -> Result<KindDiff, HashError> {
    let mut before: HashMap<String, Vec<u8>> = HashMap::with_capacity(previous.len());
    for item in previous {
        before.insert(item.key(), canonical_bytes(item)?);
    }

    let mut diff = KindDiff::default();
    let mut next_keys = HashSet::with_capacity(next.len());
    for item in next {
        let key = item.key();
        next_keys.insert(key.clone());
        match before.get(&key) {
            None => diff.added.push(key),
            Some(old) if *old != canonical_bytes(item)? => diff.updated.push(key),
            Some(_) => {}
        }
    }

    diff.deleted = previous
        .iter()
        .map(Keyed::key)
        .filter(|key| !next_keys.contains(key))
        .collect();

    Ok(diff)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(name: &str, url: &str) -> CustomProvider {
        CustomProvider::new(name, url, "KEY")
    }

    #[test]
    fn test_add_and_delete() {
        let previous = vec![provider("a", "https://a"), provider("b", "https://b")];
        let next = vec![provider("a", "https://a"), provider("c", "https://c")];

        let diff = diff_kind(&previous, &next).unwrap();
        assert_eq!(diff.added, vec!["c"]);
        assert!(diff.updated.is_empty());
        assert_eq!(diff.deleted, vec!["b"]);
    }

    #[test]
    fn test_updated_only_when_content_changes() {
        let previous = vec![provider("a", "https://a"), provider("b", "https://b")];
        let next = vec![provider("b", "https://b2"), provider("a", "https://a")];

        let diff = diff_kind(&previous, &next).unwrap();
        assert!(diff.added.is_empty());
        assert_eq!(diff.updated, vec!["b"]);
        assert!(diff.deleted.is_empty());
    }

    #[test]
    fn test_identical_is_empty() {
        let docs = vec![provider("a", "https://a")];
        assert!(diff_kind(&docs, &docs).unwrap().is_empty());
    }

    #[test]
    fn test_source_order_preserved() {
        let next = vec![provider("z", "u"), provider("m", "u"), provider("a", "u")];
        let diff = diff_kind(&[], &next).unwrap();
        assert_eq!(diff.added, vec!["z", "m", "a"]);
    }

    #[test]
    fn test_display_order() {
        let set = ChangeSet {
            providers: KindDiff {
                added: vec![],
                updated: vec![],
                deleted: vec!["old-provider".into()],
            },
            models: KindDiff {
                added: vec!["acme/new".into()],
                updated: vec!["acme/changed".into()],
                deleted: vec![],
            },
            model_packs: KindDiff {
                added: vec!["pack".into()],
                updated: vec![],
                deleted: vec![],
            },
        };

        let order: Vec<_> = set
            .changes()
            .into_iter()
            .map(|c| (c.action, c.kind, c.key))
            .collect();
        assert_eq!(
            order,
            vec![
                (ChangeAction::Added, EntityKind::Model, "acme/new".to_string()),
                (ChangeAction::Added, EntityKind::ModelPack, "pack".to_string()),
                (ChangeAction::Updated, EntityKind::Model, "acme/changed".to_string()),
                (ChangeAction::Deleted, EntityKind::Provider, "old-provider".to_string()),
            ]
        );
    }
}
