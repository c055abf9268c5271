//! Model packs: one role config per functional role.
//!
//! `ModelPack` is the resolved form the server hands out inside plan
//! settings; `ModelPackSchema` is the declarative form users write in the
//! custom models file.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::registry::ModelRegistry;
use super::role::ModelRole;
use super::role_config::{
    ModelRoleConfig, ModelRoleConfigSchema, RoleConfigError, RoleFieldValue, RoleRow,
};
use super::types::ModelProvider;

/// Errors raised while resolving a pack schema.
#[derive(Debug, Error, PartialEq)]
pub enum PackError {
    #[error("Model pack '{pack}': {source}")]
    Role {
        pack: String,
        #[source]
        source: RoleConfigError,
    },
    #[error("Unknown model pack: {0}")]
    Missing(String),
}

/// A named bundle of per-role model configs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelPack {
    /// Server-assigned id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Set for built-in packs that need a locally running provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_provider: Option<ModelProvider>,
    pub planner: ModelRoleConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub architect: Option<ModelRoleConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coder: Option<ModelRoleConfig>,
    pub plan_summary: ModelRoleConfig,
    pub builder: ModelRoleConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whole_file_builder: Option<ModelRoleConfig>,
    pub namer: ModelRoleConfig,
    pub commit_message: ModelRoleConfig,
    pub exec_status: ModelRoleConfig,
}

impl ModelPack {
    /// Architect config, falling back to the planner.
    pub fn architect(&self) -> &ModelRoleConfig {
        self.architect.as_ref().unwrap_or(&self.planner)
    }

    /// Coder config, falling back to the planner.
    pub fn coder(&self) -> &ModelRoleConfig {
        self.coder.as_ref().unwrap_or(&self.planner)
    }

    /// Whole-file builder config, falling back to the builder.
    pub fn whole_file_builder(&self) -> &ModelRoleConfig {
        self.whole_file_builder.as_ref().unwrap_or(&self.builder)
    }

    /// Effective config for a role, with optional roles resolved through their fallbacks.
    pub fn role_config(&self, role: ModelRole) -> &ModelRoleConfig {
        match role {
            ModelRole::Planner => &self.planner,
            ModelRole::Architect => self.architect(),
            ModelRole::Coder => self.coder(),
            ModelRole::PlanSummary => &self.plan_summary,
            ModelRole::Builder => &self.builder,
            ModelRole::WholeFileBuilder => self.whole_file_builder(),
            ModelRole::Namer => &self.namer,
            ModelRole::CommitMessage => &self.commit_message,
            ModelRole::ExecStatus => &self.exec_status,
        }
    }

    /// Mutable root for a role. An unset optional role is first copied
    /// from its fallback so the write does not leak into the other role.
    pub fn role_config_mut(&mut self, role: ModelRole) -> &mut ModelRoleConfig {
        match role {
            ModelRole::Planner => &mut self.planner,
            ModelRole::Architect => {
                let fallback = &self.planner;
                self.architect
                    .get_or_insert_with(|| with_role(fallback, ModelRole::Architect))
            }
            ModelRole::Coder => {
                let fallback = &self.planner;
                self.coder
                    .get_or_insert_with(|| with_role(fallback, ModelRole::Coder))
            }
            ModelRole::PlanSummary => &mut self.plan_summary,
            ModelRole::Builder => &mut self.builder,
            ModelRole::WholeFileBuilder => {
                let fallback = &self.builder;
                self.whole_file_builder
                    .get_or_insert_with(|| with_role(fallback, ModelRole::WholeFileBuilder))
            }
            ModelRole::Namer => &mut self.namer,
            ModelRole::CommitMessage => &mut self.commit_message,
            ModelRole::ExecStatus => &mut self.exec_status,
        }
    }

    /// Set one field on the root node of `role`.
    pub fn set_field(
        &mut self,
        role: ModelRole,
        value: RoleFieldValue,
    ) -> Result<bool, RoleConfigError> {
        // Validate against a copy first so a rejected write never
        // materializes an optional role.
        let mut candidate = self.role_config(role).clone();
        if !candidate.set_field(value.clone())? {
            return Ok(false);
        }
        self.role_config_mut(role).set_field(value)
    }

    /// The nine role roots in traversal order.
    pub fn roots(&self) -> [(ModelRole, &ModelRoleConfig); 9] {
        ModelRole::ALL.map(|role| (role, self.role_config(role)))
    }

    /// Every node of every role tree, pre-order, roots at depth 0.
    pub fn flatten(&self) -> Vec<RoleRow<'_>> {
        self.roots()
            .into_iter()
            .flat_map(|(role, config)| config.flatten(role.as_str(), 0))
            .collect()
    }

    /// True if any node in any role tree has role params disabled.
    pub fn any_role_params_disabled(&self) -> bool {
        self.flatten().iter().any(|row| row.config.role_params_disabled())
    }

    /// Declarative form for the custom models file.
    pub fn to_schema(&self) -> ModelPackSchema {
        ModelPackSchema {
            name: self.name.clone(),
            description: self.description.clone(),
            planner: self.planner.to_schema(),
            architect: self.architect.as_ref().map(ModelRoleConfig::to_schema),
            coder: self.coder.as_ref().map(ModelRoleConfig::to_schema),
            plan_summary: self.plan_summary.to_schema(),
            builder: self.builder.to_schema(),
            whole_file_builder: self.whole_file_builder.as_ref().map(ModelRoleConfig::to_schema),
            namer: self.namer.to_schema(),
            commit_message: self.commit_message.to_schema(),
            exec_status: self.exec_status.to_schema(),
        }
    }
}

fn with_role(config: &ModelRoleConfig, role: ModelRole) -> ModelRoleConfig {
    let mut copy = config.clone();
    copy.role = role;
    copy
}

/// Declarative model pack as written in the custom models file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ModelPackSchema {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub planner: ModelRoleConfigSchema,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub architect: Option<ModelRoleConfigSchema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coder: Option<ModelRoleConfigSchema>,
    pub plan_summary: ModelRoleConfigSchema,
    pub builder: ModelRoleConfigSchema,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whole_file_builder: Option<ModelRoleConfigSchema>,
    pub namer: ModelRoleConfigSchema,
    pub commit_message: ModelRoleConfigSchema,
    pub exec_status: ModelRoleConfigSchema,
}

impl ModelPackSchema {
    /// Schema for a role, `None` when an optional role is unset.
    pub fn role(&self, role: ModelRole) -> Option<&ModelRoleConfigSchema> {
        match role {
            ModelRole::Planner => Some(&self.planner),
            ModelRole::Architect => self.architect.as_ref(),
            ModelRole::Coder => self.coder.as_ref(),
            ModelRole::PlanSummary => Some(&self.plan_summary),
            ModelRole::Builder => Some(&self.builder),
            ModelRole::WholeFileBuilder => self.whole_file_builder.as_ref(),
            ModelRole::Namer => Some(&self.namer),
            ModelRole::CommitMessage => Some(&self.commit_message),
            ModelRole::ExecStatus => Some(&self.exec_status),
        }
    }

    /// Strip values equal to role defaults from every role tree.
    pub fn normalize(&mut self) {
        self.planner.normalize(ModelRole::Planner);
        if let Some(s) = self.architect.as_mut() {
            s.normalize(ModelRole::Architect);
        }
        if let Some(s) = self.coder.as_mut() {
            s.normalize(ModelRole::Coder);
        }
        self.plan_summary.normalize(ModelRole::PlanSummary);
        self.builder.normalize(ModelRole::Builder);
        if let Some(s) = self.whole_file_builder.as_mut() {
            s.normalize(ModelRole::WholeFileBuilder);
        }
        self.namer.normalize(ModelRole::Namer);
        self.commit_message.normalize(ModelRole::CommitMessage);
        self.exec_status.normalize(ModelRole::ExecStatus);
    }

    /// Resolve every model id against `registry`.
    pub fn to_model_pack(&self, registry: &ModelRegistry) -> Result<ModelPack, PackError> {
        let resolve = |role: ModelRole, schema: &ModelRoleConfigSchema| {
            schema.resolve(role, registry).map_err(|source| PackError::Role {
                pack: self.name.clone(),
                source,
            })
        };
        let resolve_opt = |role: ModelRole, schema: Option<&ModelRoleConfigSchema>| {
            schema.map(|s| resolve(role, s)).transpose()
        };

        Ok(ModelPack {
            id: None,
            name: self.name.clone(),
            description: self.description.clone(),
            local_provider: None,
            planner: resolve(ModelRole::Planner, &self.planner)?,
            architect: resolve_opt(ModelRole::Architect, self.architect.as_ref())?,
            coder: resolve_opt(ModelRole::Coder, self.coder.as_ref())?,
            plan_summary: resolve(ModelRole::PlanSummary, &self.plan_summary)?,
            builder: resolve(ModelRole::Builder, &self.builder)?,
            whole_file_builder: resolve_opt(
                ModelRole::WholeFileBuilder,
                self.whole_file_builder.as_ref(),
            )?,
            namer: resolve(ModelRole::Namer, &self.namer)?,
            commit_message: resolve(ModelRole::CommitMessage, &self.commit_message)?,
            exec_status: resolve(ModelRole::ExecStatus, &self.exec_status)?,
        })
    }

    /// Append a line for every invalid role value in this pack.
    pub fn collect_problems(&self, registry: &ModelRegistry, problems: &mut Vec<String>) {
        for role in ModelRole::ALL {
            if let Some(schema) = self.role(role) {
                let path = format!("model pack '{}' {}", self.name, role);
                schema.collect_problems(&path, role, registry, problems);
            }
        }
    }
}
