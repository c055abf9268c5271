//! The custom models document.
//!
//! `ModelsInput` is both the shape of the local JSON file and the shape the
//! server accepts when replacing the user's custom models, providers and
//! model packs.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::diff::{diff_kind, ChangeSet, KindDiff, Keyed};
use super::hash::{canonical_bytes, content_hash, HashError};
use crate::models::{CustomModel, CustomProvider, ModelPackSchema, ModelProvider, ModelRegistry};

/// JSON schema advertised in the `$schema` field of the local file.
pub const SCHEMA_URL: &str = "https://modelsync.dev/schemas/models-input.schema.json";

/// Keys accepted on a `customModels` entry.
const MODEL_KEYS: &[&str] = &[
    "id",
    "modelId",
    "publisher",
    "description",
    "defaultMaxConvoTokens",
    "maxTokens",
    "maxOutputTokens",
    "reservedOutputTokens",
    "modelCompatibility",
    "preferredOutputFormat",
    "roleParamsDisabled",
    "providers",
    "createdAt",
    "updatedAt",
];

/// Keys accepted on a model's `providers` entry.
const BINDING_KEYS: &[&str] = &["provider", "customProvider", "modelName"];

/// Keys accepted on a `customProviders` entry.
const PROVIDER_KEYS: &[&str] = &["id", "name", "baseUrl", "apiKeyEnvVar", "createdAt", "updatedAt"];

/// Custom models, providers and model packs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ModelsInput {
    #[serde(rename = "$schema", default, skip_serializing_if = "String::is_empty")]
    pub schema_url: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_providers: Vec<CustomProvider>,
    #[serde(default)]
    pub custom_models: Vec<CustomModel>,
    #[serde(default)]
    pub custom_model_packs: Vec<ModelPackSchema>,
}

impl ModelsInput {
    pub fn is_empty(&self) -> bool {
        self.custom_models.is_empty()
            && self.custom_providers.is_empty()
            && self.custom_model_packs.is_empty()
    }

    /// Parse a local file's bytes.
    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Pretty JSON as written to disk.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Normalize for comparison and upload: server-assigned fields are
    /// dropped, role values equal to the role defaults are omitted and
    /// the schema tag is set.
    pub fn prepare_update(&mut self) {
        self.schema_url = SCHEMA_URL.to_string();
        for model in &mut self.custom_models {
            model.clear_volatile();
        }
        for provider in &mut self.custom_providers {
            provider.clear_volatile();
        }
        for pack in &mut self.custom_model_packs {
            pack.normalize();
        }
    }

    /// A normalized copy.
    pub fn prepared(&self) -> Self {
        let mut copy = self.clone();
        copy.prepare_update();
        copy
    }

    /// Hash of the normalized document.
    pub fn hash(&self) -> Result<String, HashError> {
        content_hash(&self.prepared())
    }

    /// True if both documents normalize to the same canonical bytes.
    pub fn equals(&self, other: &ModelsInput) -> Result<bool, HashError> {
        Ok(canonical_bytes(&self.prepared())? == canonical_bytes(&other.prepared())?)
    }

    /// Per-kind diff of this document against `previous`.
    pub fn diff(&self, previous: &ModelsInput) -> Result<ChangeSet, HashError> {
        let next = self.prepared();
        let previous = previous.prepared();
        Ok(ChangeSet {
            providers: diff_kind(&previous.custom_providers, &next.custom_providers)?,
            models: diff_kind(&previous.custom_models, &next.custom_models)?,
            model_packs: diff_kind(&previous.custom_model_packs, &next.custom_model_packs)?,
        })
    }

    /// Entities of this document that differ from their counterpart in
    /// `previous` (or have none).
    pub fn filter_unchanged(&self, previous: &ModelsInput) -> Result<ModelsInput, HashError> {
        let changes = self.diff(previous)?;
        let changed = |diff: &KindDiff, key: String| {
            diff.added.iter().chain(&diff.updated).any(|k| *k == key)
        };

        Ok(ModelsInput {
            schema_url: self.schema_url.clone(),
            custom_providers: self
                .custom_providers
                .iter()
                .filter(|p| changed(&changes.providers, p.key()))
                .cloned()
                .collect(),
            custom_models: self
                .custom_models
                .iter()
                .filter(|m| changed(&changes.models, m.key()))
                .cloned()
                .collect(),
            custom_model_packs: self
                .custom_model_packs
                .iter()
                .filter(|p| changed(&changes.model_packs, p.key()))
                .cloned()
                .collect(),
        })
    }

    /// Every key that appears more than once within its kind.
    pub fn check_no_duplicates(&self) -> Result<(), Vec<String>> {
        let mut problems = Vec::new();
        duplicates("model", &self.custom_models, &mut problems);
        duplicates("provider", &self.custom_providers, &mut problems);
        duplicates("model pack", &self.custom_model_packs, &mut problems);
        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems)
        }
    }

    /// Full validation: duplicates, provider bindings, capacity fields and
    /// model pack references. Returns every problem found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut problems = match self.check_no_duplicates() {
            Ok(()) => Vec::new(),
            Err(dups) => dups,
        };

        let provider_names: HashSet<&str> =
            self.custom_providers.iter().map(|p| p.name.as_str()).collect();

        for provider in &self.custom_providers {
            if provider.base_url.trim().is_empty() {
                problems.push(format!("provider '{}': baseUrl is empty", provider.name));
            }
        }

        for model in &self.custom_models {
            let id = model.model_id();
            let shared = &model.base.shared;
            if model.base.providers.is_empty() {
                problems.push(format!("model '{}': at least one provider is required", id));
            }
            for binding in &model.base.providers {
                match (&binding.provider, binding.custom_provider.as_deref()) {
                    (ModelProvider::Custom, None) => problems.push(format!(
                        "model '{}': custom provider binding is missing customProvider",
                        id
                    )),
                    (ModelProvider::Custom, Some(name)) if !provider_names.contains(name) => {
                        problems.push(format!(
                            "model '{}': unknown custom provider '{}'",
                            id, name
                        ))
                    }
                    _ => {}
                }
            }
            if shared.max_output_tokens > shared.max_tokens {
                problems.push(format!(
                    "model '{}': maxOutputTokens ({}) exceeds maxTokens ({})",
                    id, shared.max_output_tokens, shared.max_tokens
                ));
            }
            if shared.reserved_output_tokens > shared.max_output_tokens {
                problems.push(format!(
                    "model '{}': reservedOutputTokens ({}) exceeds maxOutputTokens ({})",
                    id, shared.reserved_output_tokens, shared.max_output_tokens
                ));
            }
        }

        let registry = ModelRegistry::with_custom(&self.custom_models);
        for pack in &self.custom_model_packs {
            pack.collect_problems(&registry, &mut problems);
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems)
        }
    }
}

fn duplicates<T: Keyed>(label: &str, items: &[T], problems: &mut Vec<String>) {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    for item in items {
        let key = item.key();
        if !seen.insert(key.clone()) && reported.insert(key.clone()) {
            problems.push(format!("duplicate {}: {}", label, key));
        }
    }
}

/// Every key on a custom model, binding or provider entry that the document
/// does not define.
///
/// Model entries carry flattened fields, which serde cannot reject on its
/// own, so these are checked against the raw JSON.
pub fn unknown_fields(doc: &Value) -> Vec<String> {
    let mut problems = Vec::new();
    for (i, model) in entries(doc, "customModels") {
        let at = format!("customModels[{}]", i);
        unknown_keys(model, MODEL_KEYS, &at, &mut problems);
        if let Some(bindings) = model.get("providers").and_then(Value::as_array) {
            for (j, binding) in bindings.iter().enumerate() {
                let binding_at = format!("{}.providers[{}]", at, j);
                unknown_keys(binding, BINDING_KEYS, &binding_at, &mut problems);
            }
        }
    }
    for (i, provider) in entries(doc, "customProviders") {
        let at = format!("customProviders[{}]", i);
        unknown_keys(provider, PROVIDER_KEYS, &at, &mut problems);
    }
    problems
}

fn entries<'a>(doc: &'a Value, key: &str) -> impl Iterator<Item = (usize, &'a Value)> {
    doc.get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .enumerate()
}

fn unknown_keys(entry: &Value, allowed: &[&str], at: &str, problems: &mut Vec<String>) {
    if let Some(object) = entry.as_object() {
        for key in object.keys().filter(|k| !allowed.contains(&k.as_str())) {
            problems.push(format!("{}: unknown field '{}'", at, key));
        }
    }
}
