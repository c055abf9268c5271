//! Server API for custom models and plan settings.
//!
//! This module provides:
//! - `ModelsApi` - the async interface the sync engine and commands talk to
//! - `HttpClient` - the reqwest-backed implementation
//! - `fetch_remote_models` - concurrent fetch of the full remote document

mod http;

pub use http::HttpClient;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::models::{CustomModel, CustomProvider, ModelPack, PlanSettings};
use crate::sync::ModelsInput;

/// Errors returned by the server API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Server returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Invalid response: {0}")]
    Decode(String),
}

/// Which settings a request addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsScope {
    /// One branch of one plan
    Plan { plan_id: String, branch: String },
    /// Defaults applied to new plans across the org
    OrgDefault,
}

/// Server operations on custom models and settings.
#[async_trait]
pub trait ModelsApi: Send + Sync {
    async fn list_custom_models(&self) -> Result<Vec<CustomModel>, ApiError>;

    async fn list_custom_providers(&self) -> Result<Vec<CustomProvider>, ApiError>;

    /// Custom model packs, in resolved form.
    async fn list_model_packs(&self) -> Result<Vec<ModelPack>, ApiError>;

    /// Replace the full set of custom models, providers and packs.
    async fn create_custom_models(&self, input: &ModelsInput) -> Result<(), ApiError>;

    async fn get_settings(&self, scope: &SettingsScope) -> Result<PlanSettings, ApiError>;

    /// Returns the server's confirmation message.
    async fn update_settings(
        &self,
        scope: &SettingsScope,
        settings: &PlanSettings,
    ) -> Result<String, ApiError>;
}

/// Fetch models, providers and packs concurrently.
///
/// Providers are not fetched on cloud hosting, where custom providers
/// are unsupported.
pub async fn fetch_remote_models<A>(api: &A, is_cloud: bool) -> Result<ModelsInput, ApiError>
where
    A: ModelsApi + ?Sized,
{
    let providers = async {
        if is_cloud {
            Ok(Vec::new())
        } else {
            api.list_custom_providers().await
        }
    };

    let (custom_models, custom_providers, packs) =
        tokio::try_join!(api.list_custom_models(), providers, api.list_model_packs())?;

    debug!(
        models = custom_models.len(),
        providers = custom_providers.len(),
        packs = packs.len(),
        "Fetched remote models"
    );

    Ok(ModelsInput {
        schema_url: String::new(),
        custom_providers,
        custom_models,
        custom_model_packs: packs.iter().map(ModelPack::to_schema).collect(),
    })
}
