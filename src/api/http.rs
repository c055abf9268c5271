//! reqwest implementation of `ModelsApi`.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Method, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::{ApiError, ModelsApi, SettingsScope};
use crate::models::{CustomModel, CustomProvider, ModelPack, PlanSettings};
use crate::sync::ModelsInput;

#[derive(Serialize)]
struct UpdateSettingsRequest<'a> {
    settings: &'a PlanSettings,
}

#[derive(Deserialize)]
struct UpdateSettingsResponse {
    #[serde(default)]
    msg: String,
}

/// Authenticated client for one API host.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpClient {
    /// Build a client that sends `token` as a bearer token on every request.
    pub fn new(base_url: &str, token: &str, org_id: Option<&str>) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        let mut auth_val = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| ApiError::Decode(format!("invalid token: {}", e)))?;
        auth_val.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_val);
        if let Some(org_id) = org_id {
            let value = HeaderValue::from_str(org_id)
                .map_err(|e| ApiError::Decode(format!("invalid org id: {}", e)))?;
            headers.insert("X-Org-Id", value);
        }

        let client = reqwest::Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn request<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!(%method, path, "API request");
        let mut request = self.client.request(method, self.url(path));
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = check(request.send().await?).await?;
        let text = response.text().await?;
        if text.trim().is_empty() {
            // Empty bodies decode as JSON null, which fits `()`.
            return serde_json::from_str("null").map_err(|e| ApiError::Decode(e.to_string()));
        }
        serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request::<(), T>(Method::GET, path, None).await
    }
}

fn settings_path(scope: &SettingsScope) -> String {
    match scope {
        SettingsScope::Plan { plan_id, branch } => {
            format!("/plans/{}/{}/settings", plan_id, branch)
        }
        SettingsScope::OrgDefault => "/default_settings".to_string(),
    }
}

async fn check(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    error!(status = status.as_u16(), %message, "API request failed");
    Err(ApiError::Status {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl ModelsApi for HttpClient {
    async fn list_custom_models(&self) -> Result<Vec<CustomModel>, ApiError> {
        self.get("/custom_models").await
    }

    async fn list_custom_providers(&self) -> Result<Vec<CustomProvider>, ApiError> {
        self.get("/custom_providers").await
    }

    async fn list_model_packs(&self) -> Result<Vec<ModelPack>, ApiError> {
        self.get("/model_packs").await
    }

    async fn create_custom_models(&self, input: &ModelsInput) -> Result<(), ApiError> {
        self.request::<_, ()>(Method::POST, "/custom_models", Some(input))
            .await
    }

    async fn get_settings(&self, scope: &SettingsScope) -> Result<PlanSettings, ApiError> {
        self.get(&settings_path(scope)).await
    }

    async fn update_settings(
        &self,
        scope: &SettingsScope,
        settings: &PlanSettings,
    ) -> Result<String, ApiError> {
        let response: Option<UpdateSettingsResponse> = self
            .request(
                Method::PUT,
                &settings_path(scope),
                Some(&UpdateSettingsRequest { settings }),
            )
            .await?;
        Ok(response.map(|r| r.msg).unwrap_or_default())
    }
}
