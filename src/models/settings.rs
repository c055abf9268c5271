//! Plan model settings.
//!
//! `PlanSettings` is what the server stores per plan (and once per org as
//! the default for new plans): a resolved model pack plus a few scalar
//! overrides that apply on top of the pack's planner.

use serde::{Deserialize, Serialize};

use super::pack::ModelPack;

/// Scalar overrides applied on top of the model pack.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelOverrides {
    /// Planner context limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Conversation size that triggers summarization
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_convo_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reserved_output_tokens: Option<u32>,
}

impl ModelOverrides {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Model settings of one plan, or the org-wide default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSettings {
    pub model_pack: ModelPack,
    #[serde(default)]
    pub model_overrides: ModelOverrides,
}

impl PlanSettings {
    pub fn new(model_pack: ModelPack) -> Self {
        Self {
            model_pack,
            model_overrides: ModelOverrides::default(),
        }
    }

    /// Planner max tokens: the override, else the max tokens of the last
    /// large-context fallback of the planner.
    pub fn planner_max_tokens(&self) -> u32 {
        self.model_overrides.max_tokens.unwrap_or_else(|| {
            self.model_pack
                .planner
                .final_large_context_fallback()
                .effective_max_tokens()
        })
    }

    /// Conversation token budget: the override, else the planner model's default.
    pub fn planner_max_convo_tokens(&self) -> u32 {
        self.model_overrides.max_convo_tokens.unwrap_or(
            self.model_pack
                .planner
                .base_model_config
                .shared
                .default_max_convo_tokens,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::defaults::default_model_pack;

    #[test]
    fn test_overrides_take_precedence() {
        let mut settings = PlanSettings::new(default_model_pack().unwrap());
        let pack_max = settings.planner_max_tokens();
        let pack_convo = settings.planner_max_convo_tokens();

        settings.model_overrides.max_tokens = Some(50_000);
        settings.model_overrides.max_convo_tokens = Some(12_000);

        assert_ne!(pack_max, 50_000);
        assert_ne!(pack_convo, 12_000);
        assert_eq!(settings.planner_max_tokens(), 50_000);
        assert_eq!(settings.planner_max_convo_tokens(), 12_000);
    }

    #[test]
    fn test_planner_max_tokens_follows_large_context_chain() {
        let settings = PlanSettings::new(default_model_pack().unwrap());
        let last = settings.model_pack.planner.final_large_context_fallback();
        assert_eq!(settings.planner_max_tokens(), last.effective_max_tokens());
        assert!(settings.planner_max_tokens() > settings.model_pack.planner.effective_max_tokens());
    }

    #[test]
    fn test_settings_json_shape() {
        let settings = PlanSettings::new(default_model_pack().unwrap());
        let value = serde_json::to_value(&settings).unwrap();

        assert_eq!(value["modelPack"]["name"], "daily-driver");
        assert_eq!(value["modelOverrides"], serde_json::json!({}));

        let back: PlanSettings = serde_json::from_value(value).unwrap();
        assert_eq!(back, settings);
        assert!(back.model_overrides.is_empty());
    }
}
