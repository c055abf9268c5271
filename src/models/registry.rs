//! Model registry for resolving model ids.
//!
//! This module provides `ModelRegistry` which handles:
//! - Holding the built-in base models
//! - Layering the user's custom models on top
//! - Listing the models compatible with a given role

use std::collections::HashMap;

use super::defaults::builtin_models;
use super::role::ModelRole;
use super::types::{BaseModelConfig, CustomModel, ModelId};

/// Where a registered model came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelSource {
    BuiltIn,
    Custom,
}

#[derive(Debug, Clone)]
struct Entry {
    config: BaseModelConfig,
    source: ModelSource,
}

/// Ordered registry of available models: built-ins first, then custom models.
#[derive(Debug, Default, Clone)]
pub struct ModelRegistry {
    entries: Vec<Entry>,
    index: HashMap<ModelId, usize>,
}

impl ModelRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding only the built-in models.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for model in builtin_models() {
            registry.insert(model, ModelSource::BuiltIn);
        }
        registry
    }

    /// Built-ins plus the given custom models.
    pub fn with_custom(custom: &[CustomModel]) -> Self {
        let mut registry = Self::with_builtins();
        registry.add_custom(custom);
        registry
    }

    /// Add custom models. A custom model with a built-in id replaces it.
    pub fn add_custom(&mut self, custom: &[CustomModel]) {
        for model in custom {
            self.insert(model.base.clone(), ModelSource::Custom);
        }
    }

    fn insert(&mut self, config: BaseModelConfig, source: ModelSource) {
        match self.index.get(&config.model_id) {
            Some(&idx) => self.entries[idx] = Entry { config, source },
            None => {
                self.index.insert(config.model_id.clone(), self.entries.len());
                self.entries.push(Entry { config, source });
            }
        }
    }

    /// Get a model by id.
    pub fn get(&self, id: &ModelId) -> Option<&BaseModelConfig> {
        self.index.get(id).map(|&idx| &self.entries[idx].config)
    }

    /// Check if a model exists.
    pub fn contains(&self, id: &ModelId) -> bool {
        self.index.contains_key(id)
    }

    pub fn source(&self, id: &ModelId) -> Option<ModelSource> {
        self.index.get(id).map(|&idx| self.entries[idx].source)
    }

    /// All models in registration order.
    pub fn all(&self) -> impl Iterator<Item = &BaseModelConfig> {
        self.entries.iter().map(|e| &e.config)
    }

    /// Models from one source, in registration order.
    pub fn by_source(&self, source: ModelSource) -> impl Iterator<Item = &BaseModelConfig> {
        self.entries
            .iter()
            .filter(move |e| e.source == source)
            .map(|e| &e.config)
    }

    /// Models that may be assigned to `role`, built-ins first.
    pub fn compatible_with(&self, role: ModelRole) -> Vec<&BaseModelConfig> {
        let mut models: Vec<&BaseModelConfig> = self
            .by_source(ModelSource::BuiltIn)
            .filter(|m| m.is_compatible_with(role))
            .collect();
        models.extend(
            self.by_source(ModelSource::Custom)
                .filter(|m| m.is_compatible_with(role)),
        );
        models
    }

    /// Look up `id` and check it may serve `role`.
    pub fn compatible_model(&self, id: &ModelId, role: ModelRole) -> Option<&BaseModelConfig> {
        self.get(id).filter(|m| m.is_compatible_with(role))
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of models in the registry.
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::types::{
        BaseModelShared, BaseModelUsesProvider, ModelCompatibility, ModelOutputFormat,
        ModelProvider,
    };

    fn custom(id: &str, compatibility: ModelCompatibility) -> CustomModel {
        CustomModel::from(BaseModelConfig {
            model_id: ModelId::from(id),
            publisher: "acme".to_string(),
            description: String::new(),
            shared: BaseModelShared {
                default_max_convo_tokens: 8_000,
                max_tokens: 32_000,
                max_output_tokens: 4_000,
                reserved_output_tokens: 4_000,
                model_compatibility: compatibility,
                preferred_output_format: ModelOutputFormat::Xml,
                role_params_disabled: false,
            },
            providers: vec![BaseModelUsesProvider {
                provider: ModelProvider::Openrouter,
                custom_provider: None,
                model_name: id.to_string(),
            }],
        })
    }

    #[test]
    fn test_builtins_loaded() {
        let registry = ModelRegistry::with_builtins();
        assert!(!registry.is_empty());
        assert!(registry
            .all()
            .all(|m| registry.source(&m.model_id) == Some(ModelSource::BuiltIn)));
    }

    #[test]
    fn test_custom_models_after_builtins() {
        let builtin_count = ModelRegistry::with_builtins().len();
        let registry = ModelRegistry::with_custom(&[custom("acme/one", ModelCompatibility::Full)]);

        assert_eq!(registry.len(), builtin_count + 1);
        let last = registry.all().last().unwrap();
        assert_eq!(last.model_id.as_str(), "acme/one");
        assert_eq!(registry.source(&last.model_id), Some(ModelSource::Custom));
    }

    #[test]
    fn test_compatibility_filter() {
        let registry = ModelRegistry::with_custom(&[custom(
            "acme/coder",
            ModelCompatibility::Roles(vec![ModelRole::Coder]),
        )]);
        let id = ModelId::from("acme/coder");

        assert!(registry.compatible_model(&id, ModelRole::Coder).is_some());
        assert!(registry.compatible_model(&id, ModelRole::Namer).is_none());
        assert!(registry
            .compatible_with(ModelRole::Namer)
            .iter()
            .all(|m| m.model_id != id));
    }

    #[test]
    fn test_custom_replaces_builtin_with_same_id() {
        let builtin = ModelRegistry::with_builtins();
        let first = builtin.all().next().unwrap().model_id.clone();

        let registry = ModelRegistry::with_custom(&[custom(first.as_str(), ModelCompatibility::Full)]);
        assert_eq!(registry.len(), builtin.len());
        assert_eq!(registry.source(&first), Some(ModelSource::Custom));
    }
}
