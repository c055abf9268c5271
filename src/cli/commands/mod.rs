//! Command handlers.
//!
//! Each handler takes a [`CommandContext`] holding the API client and the
//! resolved client config, and prints its results to stdout.

pub mod custom;
pub mod models;
pub mod set_model;

pub use custom::run_custom;
pub use models::{show_available, show_settings};
pub use set_model::run_set_model;

use anyhow::Result;

use crate::api::{ModelsApi, SettingsScope};
use crate::config::{ClientConfig, ConfigError, XdgDirs};
use crate::messaging::with_spinner;
use crate::models::SettingsUpdater;

/// Shared state for one command invocation.
pub struct CommandContext {
    pub api: Box<dyn ModelsApi>,
    pub config: ClientConfig,
    pub dirs: XdgDirs,
}

impl CommandContext {
    pub fn new(api: Box<dyn ModelsApi>, config: ClientConfig, dirs: XdgDirs) -> Self {
        Self { api, config, dirs }
    }

    /// Settings scope of the current plan and branch.
    pub fn plan_scope(&self) -> Result<SettingsScope, ConfigError> {
        let plan_id = self
            .config
            .current_plan
            .clone()
            .ok_or_else(|| ConfigError::NoCurrentPlan(ClientConfig::path_in(&self.dirs)))?;
        Ok(SettingsScope::Plan {
            plan_id,
            branch: self.config.current_branch.clone(),
        })
    }

    /// Built-in and custom models and packs visible to this user.
    pub async fn load_updater(&self) -> Result<SettingsUpdater> {
        let api = self.api.as_ref();
        let (custom_models, custom_packs) =
            tokio::try_join!(api.list_custom_models(), api.list_model_packs())?;
        Ok(SettingsUpdater::with_custom(
            &custom_models,
            &custom_packs,
            self.config.is_cloud,
        ))
    }

    pub async fn load_updater_with_spinner(&self) -> Result<SettingsUpdater> {
        with_spinner("Loading models...", self.load_updater()).await
    }
}

/// Pack names accepted in place of the real ones.
pub fn resolve_pack_alias(name: &str) -> &str {
    match name {
        "daily" => "daily-driver",
        "opus-4-planner" => "opus-planner",
        other => other,
    }
}
