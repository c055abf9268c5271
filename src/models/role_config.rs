//! Per-role model configuration with fallback chains.
//!
//! A `ModelRoleConfig` is a node in a small out-tree: each node owns up to
//! four fallback children (large context, large output, strong, error),
//! each of which is a full node again. Traversal order over the slots is
//! fixed, see [`FallbackSlot::ALL`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::registry::ModelRegistry;
use super::role::ModelRole;
use super::types::{BaseModelConfig, ModelId};

pub const TEMPERATURE_RANGE: std::ops::RangeInclusive<f32> = -2.0..=2.0;
pub const TOP_P_RANGE: std::ops::RangeInclusive<f32> = 0.0..=1.0;

/// Errors raised while resolving or mutating role configs.
#[derive(Debug, Error, PartialEq)]
pub enum RoleConfigError {
    #[error("Temperature {0} is out of range (-2.0 to 2.0)")]
    TemperatureOutOfRange(f32),
    #[error("Top-p {0} is out of range (0.0 to 1.0)")]
    TopPOutOfRange(f32),
    #[error("Unknown model for {role}: {model_id}")]
    UnknownModel { role: ModelRole, model_id: ModelId },
}

/// Named fallback slots of a role config node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackSlot {
    LargeContext,
    LargeOutput,
    Strong,
    Error,
}

impl FallbackSlot {
    /// Traversal order.
    pub const ALL: [FallbackSlot; 4] = [
        FallbackSlot::LargeContext,
        FallbackSlot::LargeOutput,
        FallbackSlot::Strong,
        FallbackSlot::Error,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FallbackSlot::LargeContext => "large-context",
            FallbackSlot::LargeOutput => "large-output",
            FallbackSlot::Strong => "strong",
            FallbackSlot::Error => "error",
        }
    }
}

/// Temperature/top-p as actually sent to the model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectiveParams {
    pub temperature: f32,
    pub top_p: f32,
    /// Values were forced to 1.0 because the model rejects tuning
    pub disabled: bool,
}

/// A single field write on a role root.
#[derive(Debug, Clone, PartialEq)]
pub enum RoleFieldValue {
    /// Switch model; carries the resolved base config of the new model
    Model(BaseModelConfig),
    Temperature(f32),
    TopP(f32),
    ReservedOutputTokens(u32),
}

/// Resolved configuration for one role (or one fallback of a role).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelRoleConfig {
    pub role: ModelRole,
    pub model_id: ModelId,
    pub base_model_config: BaseModelConfig,
    pub temperature: f32,
    pub top_p: f32,
    /// Overrides the base model's reserved output tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reserved_output_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub large_context_fallback: Option<Box<ModelRoleConfig>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub large_output_fallback: Option<Box<ModelRoleConfig>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strong_model: Option<Box<ModelRoleConfig>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_fallback: Option<Box<ModelRoleConfig>>,
}

impl ModelRoleConfig {
    /// Node with role-default temperature/top-p and no fallbacks.
    pub fn new(role: ModelRole, base: BaseModelConfig) -> Self {
        Self {
            role,
            model_id: base.model_id.clone(),
            base_model_config: base,
            temperature: role.default_temperature(),
            top_p: role.default_top_p(),
            reserved_output_tokens: None,
            large_context_fallback: None,
            large_output_fallback: None,
            strong_model: None,
            error_fallback: None,
        }
    }

    pub fn with_fallback(mut self, slot: FallbackSlot, child: ModelRoleConfig) -> Self {
        *self.slot_mut(slot) = Some(Box::new(child));
        self
    }

    pub fn fallback(&self, slot: FallbackSlot) -> Option<&ModelRoleConfig> {
        match slot {
            FallbackSlot::LargeContext => self.large_context_fallback.as_deref(),
            FallbackSlot::LargeOutput => self.large_output_fallback.as_deref(),
            FallbackSlot::Strong => self.strong_model.as_deref(),
            FallbackSlot::Error => self.error_fallback.as_deref(),
        }
    }

    fn slot_mut(&mut self, slot: FallbackSlot) -> &mut Option<Box<ModelRoleConfig>> {
        match slot {
            FallbackSlot::LargeContext => &mut self.large_context_fallback,
            FallbackSlot::LargeOutput => &mut self.large_output_fallback,
            FallbackSlot::Strong => &mut self.strong_model,
            FallbackSlot::Error => &mut self.error_fallback,
        }
    }

    pub fn role_params_disabled(&self) -> bool {
        self.base_model_config.shared.role_params_disabled
    }

    pub fn effective_max_tokens(&self) -> u32 {
        self.base_model_config.shared.max_tokens
    }

    pub fn effective_reserved_output_tokens(&self) -> u32 {
        self.reserved_output_tokens
            .unwrap_or(self.base_model_config.shared.reserved_output_tokens)
    }

    pub fn max_input_tokens(&self) -> u32 {
        self.effective_max_tokens()
            .saturating_sub(self.effective_reserved_output_tokens())
    }

    pub fn effective_params(&self) -> EffectiveParams {
        if self.role_params_disabled() {
            EffectiveParams {
                temperature: 1.0,
                top_p: 1.0,
                disabled: true,
            }
        } else {
            EffectiveParams {
                temperature: self.temperature,
                top_p: self.top_p,
                disabled: false,
            }
        }
    }

    /// Follow the large-context chain to its last node.
    pub fn final_large_context_fallback(&self) -> &ModelRoleConfig {
        let mut node = self;
        while let Some(next) = node.large_context_fallback.as_deref() {
            node = next;
        }
        node
    }

    /// Pre-order walk: this node, then each present slot in [`FallbackSlot::ALL`] order.
    pub fn flatten(&self, label: &str, depth: usize) -> Vec<RoleRow<'_>> {
        let mut rows = Vec::new();
        self.collect_rows(label.to_string(), depth, &mut rows);
        rows
    }

    fn collect_rows<'a>(&'a self, label: String, depth: usize, rows: &mut Vec<RoleRow<'a>>) {
        rows.push(RoleRow {
            label,
            config: self,
            depth,
        });
        for slot in FallbackSlot::ALL {
            if let Some(child) = self.fallback(slot) {
                child.collect_rows(slot.label().to_string(), depth + 1, rows);
            }
        }
    }

    /// Write one field on this node (never on its fallbacks).
    ///
    /// Returns `Ok(false)` when the value is already set.
    pub fn set_field(&mut self, value: RoleFieldValue) -> Result<bool, RoleConfigError> {
        match value {
            RoleFieldValue::Model(base) => {
                if self.model_id == base.model_id {
                    return Ok(false);
                }
                self.model_id = base.model_id.clone();
                self.base_model_config = base;
            }
            RoleFieldValue::Temperature(t) => {
                if !TEMPERATURE_RANGE.contains(&t) {
                    return Err(RoleConfigError::TemperatureOutOfRange(t));
                }
                if self.temperature == t {
                    return Ok(false);
                }
                self.temperature = t;
            }
            RoleFieldValue::TopP(p) => {
                if !TOP_P_RANGE.contains(&p) {
                    return Err(RoleConfigError::TopPOutOfRange(p));
                }
                if self.top_p == p {
                    return Ok(false);
                }
                self.top_p = p;
            }
            RoleFieldValue::ReservedOutputTokens(n) => {
                if self.reserved_output_tokens == Some(n) {
                    return Ok(false);
                }
                self.reserved_output_tokens = Some(n);
            }
        }
        Ok(true)
    }

    /// Declarative form, omitting values equal to the role defaults.
    pub fn to_schema(&self) -> ModelRoleConfigSchema {
        let mut schema = ModelRoleConfigSchema {
            model_id: self.model_id.clone(),
            temperature: Some(self.temperature),
            top_p: Some(self.top_p),
            reserved_output_tokens: self.reserved_output_tokens,
            large_context_fallback: None,
            large_output_fallback: None,
            strong_model: None,
            error_fallback: None,
        };
        for slot in FallbackSlot::ALL {
            if let Some(child) = self.fallback(slot) {
                *schema.slot_mut(slot) = Some(Box::new(child.to_schema()));
            }
        }
        schema.normalize(self.role);
        schema
    }
}

/// One flattened row of a role tree.
#[derive(Debug, Clone)]
pub struct RoleRow<'a> {
    /// Role name for roots, slot label for fallbacks
    pub label: String,
    pub config: &'a ModelRoleConfig,
    pub depth: usize,
}

/// Declarative role config as written in the custom models file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ModelRoleConfigSchema {
    pub model_id: ModelId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reserved_output_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub large_context_fallback: Option<Box<ModelRoleConfigSchema>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub large_output_fallback: Option<Box<ModelRoleConfigSchema>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strong_model: Option<Box<ModelRoleConfigSchema>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_fallback: Option<Box<ModelRoleConfigSchema>>,
}

impl ModelRoleConfigSchema {
    pub fn new(model_id: impl Into<ModelId>) -> Self {
        Self {
            model_id: model_id.into(),
            temperature: None,
            top_p: None,
            reserved_output_tokens: None,
            large_context_fallback: None,
            large_output_fallback: None,
            strong_model: None,
            error_fallback: None,
        }
    }

    pub fn with_fallback(mut self, slot: FallbackSlot, child: ModelRoleConfigSchema) -> Self {
        *self.slot_mut(slot) = Some(Box::new(child));
        self
    }

    pub fn fallback(&self, slot: FallbackSlot) -> Option<&ModelRoleConfigSchema> {
        match slot {
            FallbackSlot::LargeContext => self.large_context_fallback.as_deref(),
            FallbackSlot::LargeOutput => self.large_output_fallback.as_deref(),
            FallbackSlot::Strong => self.strong_model.as_deref(),
            FallbackSlot::Error => self.error_fallback.as_deref(),
        }
    }

    fn slot_mut(&mut self, slot: FallbackSlot) -> &mut Option<Box<ModelRoleConfigSchema>> {
        match slot {
            FallbackSlot::LargeContext => &mut self.large_context_fallback,
            FallbackSlot::LargeOutput => &mut self.large_output_fallback,
            FallbackSlot::Strong => &mut self.strong_model,
            FallbackSlot::Error => &mut self.error_fallback,
        }
    }

    /// Drop explicit values that equal the role defaults, recursively.
    pub fn normalize(&mut self, role: ModelRole) {
        if self.temperature == Some(role.default_temperature()) {
            self.temperature = None;
        }
        if self.top_p == Some(role.default_top_p()) {
            self.top_p = None;
        }
        for slot in FallbackSlot::ALL {
            if let Some(child) = self.slot_mut(slot) {
                child.normalize(role);
            }
        }
    }

    /// Resolve model ids against the registry and fill in role defaults.
    pub fn resolve(
        &self,
        role: ModelRole,
        registry: &ModelRegistry,
    ) -> Result<ModelRoleConfig, RoleConfigError> {
        let base = registry
            .get(&self.model_id)
            .cloned()
            .ok_or_else(|| RoleConfigError::UnknownModel {
                role,
                model_id: self.model_id.clone(),
            })?;

        let mut config = ModelRoleConfig::new(role, base);
        if let Some(t) = self.temperature {
            config.temperature = t;
        }
        if let Some(p) = self.top_p {
            config.top_p = p;
        }
        config.reserved_output_tokens = self.reserved_output_tokens;

        for slot in FallbackSlot::ALL {
            if let Some(child) = self.fallback(slot) {
                *config.slot_mut(slot) = Some(Box::new(child.resolve(role, registry)?));
            }
        }
        Ok(config)
    }

    /// Append a line for every invalid value in this subtree.
    pub fn collect_problems(
        &self,
        path: &str,
        role: ModelRole,
        registry: &ModelRegistry,
        problems: &mut Vec<String>,
    ) {
        match registry.get(&self.model_id) {
            None => problems.push(format!("{}: unknown model '{}'", path, self.model_id)),
            Some(base) if !base.is_compatible_with(role) => problems.push(format!(
                "{}: model '{}' is not compatible with the {} role",
                path, self.model_id, role
            )),
            Some(_) => {}
        }
        if let Some(t) = self.temperature {
            if !TEMPERATURE_RANGE.contains(&t) {
                problems.push(format!("{}: temperature {} is out of range (-2.0 to 2.0)", path, t));
            }
        }
        if let Some(p) = self.top_p {
            if !TOP_P_RANGE.contains(&p) {
                problems.push(format!("{}: top-p {} is out of range (0.0 to 1.0)", path, p));
            }
        }
        for slot in FallbackSlot::ALL {
            if let Some(child) = self.fallback(slot) {
                child.collect_problems(&format!("{}.{}", path, slot.label()), role, registry, problems);
            }
        }
    }
}
