//! Core model type definitions.
//!
//! This module provides the fundamental types shared by built-in and
//! custom models:
//! - `ModelId` - Publisher-qualified model identifier
//! - `ModelProvider` - Inference providers a model can be served by
//! - `BaseModelConfig` - Capacity fields, flags and provider bindings
//! - `CustomModel` / `CustomProvider` - User-defined entities synced with the server

use serde::{Deserialize, Serialize};
use std::fmt;

use super::role::ModelRole;

/// Publisher-qualified model identifier, e.g. `meta-llama/llama-4-maverick`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct ModelId(String);

impl ModelId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Publisher prefix (the part before the first `/`), if any.
    pub fn publisher(&self) -> Option<&str> {
        self.0.split_once('/').map(|(publisher, _)| publisher)
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModelId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ModelId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Supported inference providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelProvider {
    /// OpenAI API
    Openai,
    /// Anthropic API
    Anthropic,
    /// Google AI Studio
    Google,
    /// OpenRouter API
    Openrouter,
    /// DeepSeek API
    Deepseek,
    /// Local Ollama server
    Ollama,
    /// A user-defined provider from `customProviders`
    Custom,
}

impl fmt::Display for ModelProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelProvider::Openai => write!(f, "openai"),
            ModelProvider::Anthropic => write!(f, "anthropic"),
            ModelProvider::Google => write!(f, "google"),
            ModelProvider::Openrouter => write!(f, "openrouter"),
            ModelProvider::Deepseek => write!(f, "deepseek"),
            ModelProvider::Ollama => write!(f, "ollama"),
            ModelProvider::Custom => write!(f, "custom"),
        }
    }
}

/// Which roles a model may be assigned to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum ModelCompatibility {
    /// Usable for every role
    #[default]
    Full,
    /// Usable only for the listed roles
    Roles(Vec<ModelRole>),
}

impl ModelCompatibility {
    pub fn allows(&self, role: ModelRole) -> bool {
        match self {
            ModelCompatibility::Full => true,
            ModelCompatibility::Roles(roles) => roles.contains(&role),
        }
    }
}

/// Output encoding a model handles best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ModelOutputFormat {
    #[default]
    Xml,
    ToolCallJson,
}

/// Capacity fields and flags shared by all models.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseModelShared {
    /// Default conversation-token budget before summarization
    pub default_max_convo_tokens: u32,
    /// Maximum total tokens (input + output)
    pub max_tokens: u32,
    /// Maximum tokens the model can emit in one response
    pub max_output_tokens: u32,
    /// Tokens held back from the input budget for output
    pub reserved_output_tokens: u32,
    #[serde(default)]
    pub model_compatibility: ModelCompatibility,
    #[serde(default)]
    pub preferred_output_format: ModelOutputFormat,
    /// Model rejects temperature/top-p tuning
    #[serde(default, skip_serializing_if = "is_false")]
    pub role_params_disabled: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// A provider binding: which provider serves a model, under which remote name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseModelUsesProvider {
    pub provider: ModelProvider,
    /// Name of a `CustomProvider` when `provider` is `custom`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_provider: Option<String>,
    pub model_name: String,
}

/// Everything needed to resolve a model id into capacity info.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseModelConfig {
    pub model_id: ModelId,
    #[serde(default)]
    pub publisher: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub shared: BaseModelShared,
    #[serde(default)]
    pub providers: Vec<BaseModelUsesProvider>,
}

impl BaseModelConfig {
    /// Input budget once the reserved output is subtracted.
    pub fn max_input_tokens(&self) -> u32 {
        self.shared
            .max_tokens
            .saturating_sub(self.shared.reserved_output_tokens)
    }

    pub fn is_compatible_with(&self, role: ModelRole) -> bool {
        self.shared.model_compatibility.allows(role)
    }
}

/// A user-defined model, synced with the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomModel {
    /// Server-assigned id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(flatten)]
    pub base: BaseModelConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl CustomModel {
    pub fn model_id(&self) -> &ModelId {
        &self.base.model_id
    }

    /// Drop server-assigned fields.
    pub fn clear_volatile(&mut self) {
        self.id = None;
        self.created_at = None;
        self.updated_at = None;
    }
}

impl From<BaseModelConfig> for CustomModel {
    fn from(base: BaseModelConfig) -> Self {
        Self {
            id: None,
            base,
            created_at: None,
            updated_at: None,
        }
    }
}

/// A user-defined OpenAI-compatible inference endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomProvider {
    /// Server-assigned id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub base_url: String,
    /// Environment variable holding the API key
    #[serde(default)]
    pub api_key_env_var: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl CustomProvider {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key_env_var: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            base_url: base_url.into(),
            api_key_env_var: api_key_env_var.into(),
            created_at: None,
            updated_at: None,
        }
    }

    pub fn clear_volatile(&mut self) {
        self.id = None;
        self.created_at = None;
        self.updated_at = None;
    }
}
