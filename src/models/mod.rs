//! Model definitions, packs and plan settings.
//!
//! This module handles:
//! - Base and custom model type definitions
//! - Role configs with their fallback trees
//! - Built-in models and model packs
//! - Applying single changes to plan settings

pub mod defaults;
pub mod pack;
pub mod registry;
pub mod role;
pub mod role_config;
pub mod settings;
pub mod types;
pub mod update;

pub use defaults::{available_model_packs, builtin_model_packs, builtin_models, default_model_pack};
pub use pack::{ModelPack, ModelPackSchema, PackError};
pub use registry::{ModelRegistry, ModelSource};
pub use role::ModelRole;
pub use role_config::{
    EffectiveParams, FallbackSlot, ModelRoleConfig, ModelRoleConfigSchema, RoleConfigError,
    RoleFieldValue, RoleRow,
};
pub use settings::{ModelOverrides, PlanSettings};
pub use types::{
    BaseModelConfig, BaseModelShared, BaseModelUsesProvider, CustomModel, CustomProvider,
    ModelCompatibility, ModelId, ModelOutputFormat, ModelProvider,
};
pub use update::{OverrideSetting, RoleProperty, Selector, SettingsUpdater, UpdateError};
