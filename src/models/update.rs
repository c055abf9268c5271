//! Single-change updates to plan settings.
//!
//! A `Selector` names one change: switch the whole pack, change one
//! property of one role, or set a scalar override. `SettingsUpdater`
//! applies it to a copy of the settings and reports `None` when the
//! result is identical to the input.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tracing::debug;

use super::defaults::available_model_packs;
use super::pack::ModelPack;
use super::registry::ModelRegistry;
use super::role::{compact, ModelRole};
use super::role_config::{RoleConfigError, RoleFieldValue};
use super::settings::PlanSettings;
use super::types::{CustomModel, ModelId};

/// Errors raised while applying a selector.
#[derive(Debug, Error, PartialEq)]
pub enum UpdateError {
    #[error("Unknown model pack: {0}")]
    UnknownPack(String),
    #[error("Unknown model for {role}: {model_id}")]
    UnknownModel { role: ModelRole, model_id: ModelId },
    #[error("Model {model_id} is not compatible with the {role} role")]
    IncompatibleModel { role: ModelRole, model_id: ModelId },
    #[error("Invalid value for {setting}: {value:?}")]
    InvalidValue { setting: &'static str, value: String },
    #[error(transparent)]
    Role(#[from] RoleConfigError),
}

/// Editable properties of a role root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleProperty {
    Model,
    Temperature,
    TopP,
    ReservedOutputTokens,
}

impl RoleProperty {
    pub const ALL: [RoleProperty; 4] = [
        RoleProperty::Model,
        RoleProperty::Temperature,
        RoleProperty::TopP,
        RoleProperty::ReservedOutputTokens,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoleProperty::Model => "model",
            RoleProperty::Temperature => "temperature",
            RoleProperty::TopP => "top-p",
            RoleProperty::ReservedOutputTokens => "reserved-output-tokens",
        }
    }

    /// Prompt text including the accepted range.
    pub fn prompt(&self) -> &'static str {
        match self {
            RoleProperty::Model => "Select a model",
            RoleProperty::Temperature => "Set temperature (-2.0 to 2.0)",
            RoleProperty::TopP => "Set top-p (0.0 to 1.0)",
            RoleProperty::ReservedOutputTokens => "Set reserved output tokens",
        }
    }
}

impl fmt::Display for RoleProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoleProperty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = compact(s);
        RoleProperty::ALL
            .into_iter()
            .find(|p| compact(p.as_str()) == wanted)
            .ok_or_else(|| format!("unknown role property: {}", s))
    }
}

/// Plan-level overrides settable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideSetting {
    MaxConvoTokens,
    MaxTokens,
}

impl OverrideSetting {
    pub const ALL: [OverrideSetting; 2] =
        [OverrideSetting::MaxConvoTokens, OverrideSetting::MaxTokens];

    pub fn as_str(&self) -> &'static str {
        match self {
            OverrideSetting::MaxConvoTokens => "max-convo-tokens",
            OverrideSetting::MaxTokens => "max-tokens",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            OverrideSetting::MaxConvoTokens => {
                "max conversation tokens before summarization"
            }
            OverrideSetting::MaxTokens => "overall token limit for the planner",
        }
    }
}

impl fmt::Display for OverrideSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OverrideSetting {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = compact(s);
        OverrideSetting::ALL
            .into_iter()
            .find(|o| compact(o.as_str()) == wanted)
            .ok_or_else(|| format!("unknown setting: {}", s))
    }
}

/// One requested change to plan settings.
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    /// Replace the whole pack (matched case-insensitively)
    Pack(String),
    /// Change one property of a role. `None` means the model.
    Role {
        role: ModelRole,
        property: Option<RoleProperty>,
        value: String,
    },
    /// Set an override; an empty value clears it
    Override {
        setting: OverrideSetting,
        value: String,
    },
}

/// Applies selectors against the models and packs visible to the user.
#[derive(Debug, Clone)]
pub struct SettingsUpdater {
    registry: ModelRegistry,
    packs: Vec<ModelPack>,
}

impl SettingsUpdater {
    pub fn new(registry: ModelRegistry, packs: Vec<ModelPack>) -> Self {
        Self { registry, packs }
    }

    /// Built-in models and packs plus the user's custom ones.
    ///
    /// Local-provider packs are left out on cloud hosting.
    pub fn with_custom(
        custom_models: &[CustomModel],
        custom_packs: &[ModelPack],
        is_cloud: bool,
    ) -> Self {
        let registry = ModelRegistry::with_custom(custom_models);
        let mut packs = available_model_packs(is_cloud);
        packs.extend(custom_packs.iter().cloned());
        debug!(
            models = registry.len(),
            packs = packs.len(),
            "Loaded models for settings update"
        );
        Self::new(registry, packs)
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn packs(&self) -> &[ModelPack] {
        &self.packs
    }

    pub fn find_pack(&self, name: &str) -> Option<&ModelPack> {
        self.packs.iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Apply `selector` to a copy of `settings`.
    ///
    /// Returns `Ok(None)` when the result equals the input.
    pub fn apply(
        &self,
        selector: &Selector,
        settings: &PlanSettings,
    ) -> Result<Option<PlanSettings>, UpdateError> {
        let mut updated = settings.clone();

        match selector {
            Selector::Pack(name) => {
                let pack = self
                    .find_pack(name)
                    .ok_or_else(|| UpdateError::UnknownPack(name.clone()))?;
                updated.model_pack = pack.clone();
            }
            Selector::Role {
                role,
                property,
                value,
            } => {
                let field = self.role_field(*role, property.unwrap_or(RoleProperty::Model), value)?;
                updated.model_pack.set_field(*role, field)?;
            }
            Selector::Override { setting, value } => {
                let parsed = parse_optional_tokens(setting.as_str(), value)?;
                match setting {
                    OverrideSetting::MaxTokens => updated.model_overrides.max_tokens = parsed,
                    OverrideSetting::MaxConvoTokens => {
                        updated.model_overrides.max_convo_tokens = parsed
                    }
                }
            }
        }

        if updated == *settings {
            debug!(?selector, "Settings unchanged");
            return Ok(None);
        }
        debug!(?selector, "Settings updated");
        Ok(Some(updated))
    }

    fn role_field(
        &self,
        role: ModelRole,
        property: RoleProperty,
        value: &str,
    ) -> Result<RoleFieldValue, UpdateError> {
        let value = value.trim();
        match property {
            RoleProperty::Model => {
                let model_id = ModelId::from(value);
                match self.registry.compatible_model(&model_id, role) {
                    Some(base) => Ok(RoleFieldValue::Model(base.clone())),
                    None if self.registry.contains(&model_id) => {
                        Err(UpdateError::IncompatibleModel { role, model_id })
                    }
                    None => Err(UpdateError::UnknownModel { role, model_id }),
                }
            }
            RoleProperty::Temperature => value
                .parse::<f32>()
                .map(RoleFieldValue::Temperature)
                .map_err(|_| invalid("temperature", value)),
            RoleProperty::TopP => value
                .parse::<f32>()
                .map(RoleFieldValue::TopP)
                .map_err(|_| invalid("top-p", value)),
            RoleProperty::ReservedOutputTokens => value
                .parse::<u32>()
                .map(RoleFieldValue::ReservedOutputTokens)
                .map_err(|_| invalid("reserved-output-tokens", value)),
        }
    }
}

fn invalid(setting: &'static str, value: &str) -> UpdateError {
    UpdateError::InvalidValue {
        setting,
        value: value.to_string(),
    }
}

fn parse_optional_tokens(setting: &'static str, value: &str) -> Result<Option<u32>, UpdateError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse::<u32>()
        .map(Some)
        .map_err(|_| invalid(setting, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::defaults::default_model_pack;
    use crate::models::types::{
        BaseModelConfig, BaseModelShared, BaseModelUsesProvider, ModelCompatibility,
        ModelOutputFormat, ModelProvider,
    };

    fn custom(id: &str) -> CustomModel {
        CustomModel::from(BaseModelConfig {
            model_id: ModelId::from(id),
            publisher: "acme".to_string(),
            description: String::new(),
            shared: BaseModelShared {
                default_max_convo_tokens: 20_000,
                max_tokens: 128_000,
                max_output_tokens: 16_000,
                reserved_output_tokens: 16_000,
                model_compatibility: ModelCompatibility::Full,
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

    fn updater() -> SettingsUpdater {
        SettingsUpdater::with_custom(&[custom("acme/m2")], &[], false)
    }

    fn settings() -> PlanSettings {
        PlanSettings::new(default_model_pack().unwrap())
    }

    fn role(role: ModelRole, property: Option<RoleProperty>, value: &str) -> Selector {
        Selector::Role {
            role,
            property,
            value: value.to_string(),
        }
    }

    #[test]
    fn test_switch_planner_model() {
        let original = settings();
        let updated = updater()
            .apply(&role(ModelRole::Planner, None, "acme/m2"), &original)
            .unwrap()
            .unwrap();

        assert_eq!(updated.model_pack.planner.model_id.as_str(), "acme/m2");
        assert_eq!(updated.model_pack.planner.base_model_config.shared.max_tokens, 128_000);
        assert_eq!(updated.model_pack.planner.temperature, original.model_pack.planner.temperature);
        assert_eq!(
            updated.model_pack.planner.large_context_fallback,
            original.model_pack.planner.large_context_fallback
        );
        assert_eq!(updated.model_pack.builder, original.model_pack.builder);
        assert_eq!(updated.model_overrides, original.model_overrides);
    }

    #[test]
    fn test_same_value_is_no_change() {
        let original = settings();
        let current = original.model_pack.planner.model_id.to_string();
        let updater = updater();

        assert_eq!(updater.apply(&role(ModelRole::Planner, None, &current), &original), Ok(None));
        assert_eq!(
            updater.apply(&Selector::Pack(original.model_pack.name.clone()), &original),
            Ok(None)
        );
        assert_eq!(
            updater.apply(
                &Selector::Override {
                    setting: OverrideSetting::MaxTokens,
                    value: String::new()
                },
                &original
            ),
            Ok(None)
        );
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        let original = settings();
        let updater = updater();

        assert_eq!(
            updater.apply(
                &role(ModelRole::Planner, Some(RoleProperty::Temperature), "2.5"),
                &original
            ),
            Err(UpdateError::Role(RoleConfigError::TemperatureOutOfRange(2.5)))
        );
        assert_eq!(
            updater.apply(&role(ModelRole::Coder, Some(RoleProperty::TopP), "1.5"), &original),
            Err(UpdateError::Role(RoleConfigError::TopPOutOfRange(1.5)))
        );
        assert!(matches!(
            updater.apply(&role(ModelRole::Namer, Some(RoleProperty::TopP), "high"), &original),
            Err(UpdateError::InvalidValue { setting: "top-p", .. })
        ));
    }

    #[test]
    fn test_unknown_and_incompatible_models() {
        let original = settings();
        let updater = updater();

        assert!(matches!(
            updater.apply(&role(ModelRole::Namer, None, "nobody/nothing"), &original),
            Err(UpdateError::UnknownModel { .. })
        ));
        assert!(matches!(
            updater.apply(&role(ModelRole::Namer, None, "qwen/qwen2.5-coder-32b"), &original),
            Err(UpdateError::IncompatibleModel { role: ModelRole::Namer, .. })
        ));
        assert!(updater
            .apply(&role(ModelRole::Coder, None, "qwen/qwen2.5-coder-32b"), &original)
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_switch_pack_case_insensitive() {
        let original = settings();
        let updated = updater()
            .apply(&Selector::Pack("STRONG".to_string()), &original)
            .unwrap()
            .unwrap();
        assert_eq!(updated.model_pack.name, "strong");

        assert_eq!(
            updater().apply(&Selector::Pack("nope".to_string()), &original),
            Err(UpdateError::UnknownPack("nope".to_string()))
        );
    }

    #[test]
    fn test_override_set_and_clear() {
        let updater = updater();
        let original = settings();
        let set = updater
            .apply(
                &Selector::Override {
                    setting: OverrideSetting::MaxConvoTokens,
                    value: "20000".to_string(),
                },
                &original,
            )
            .unwrap()
            .unwrap();
        assert_eq!(set.model_overrides.max_convo_tokens, Some(20_000));

        let cleared = updater
            .apply(
                &Selector::Override {
                    setting: OverrideSetting::MaxConvoTokens,
                    value: " ".to_string(),
                },
                &set,
            )
            .unwrap()
            .unwrap();
        assert_eq!(cleared, original);
    }

    #[test]
    fn test_reserved_output_tokens_on_role_root() {
        let original = settings();
        let updated = updater()
            .apply(
                &role(ModelRole::Builder, Some(RoleProperty::ReservedOutputTokens), "12000"),
                &original,
            )
            .unwrap()
            .unwrap();
        assert_eq!(updated.model_pack.builder.reserved_output_tokens, Some(12_000));
        assert_eq!(updated.model_overrides, original.model_overrides);
    }

    #[test]
    fn test_cloud_hides_local_packs() {
        let cloud = SettingsUpdater::with_custom(&[], &[], true);
        assert!(cloud.find_pack("ollama").is_none());
        assert!(updater().find_pack("ollama").is_some());
    }

    #[test]
    fn test_property_and_setting_parsing() {
        assert_eq!("topP".parse::<RoleProperty>(), Ok(RoleProperty::TopP));
        assert_eq!("top_p".parse::<RoleProperty>(), Ok(RoleProperty::TopP));
        assert_eq!(
            "reservedOutputTokens".parse::<RoleProperty>(),
            Ok(RoleProperty::ReservedOutputTokens)
        );
        assert_eq!("MaxTokens".parse::<OverrideSetting>(), Ok(OverrideSetting::MaxTokens));
        assert!("speed".parse::<OverrideSetting>().is_err());
    }
}
