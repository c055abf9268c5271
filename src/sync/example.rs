//! Starter document written when the user has nothing on the server yet.

use super::input::{ModelsInput, SCHEMA_URL};
use crate::models::{
    BaseModelConfig, BaseModelShared, BaseModelUsesProvider, CustomModel, CustomProvider,
    ModelCompatibility, ModelId, ModelOutputFormat, ModelPackSchema, ModelProvider,
    ModelRoleConfigSchema,
};

const EXAMPLE_PROVIDER: &str = "togetherai";
const EXAMPLE_MODEL: &str = "meta-llama/llama-4-maverick";

/// Example document: one custom model, one pack, and on self-hosted
/// servers one custom provider. Custom providers are unavailable on cloud.
pub fn example_template(is_cloud: bool) -> ModelsInput {
    let mut custom_providers = Vec::new();
    let mut providers = Vec::new();

    if !is_cloud {
        custom_providers.push(CustomProvider::new(
            EXAMPLE_PROVIDER,
            "https://api.together.xyz/v1",
            "TOGETHER_API_KEY",
        ));
        providers.push(BaseModelUsesProvider {
            provider: ModelProvider::Custom,
            custom_provider: Some(EXAMPLE_PROVIDER.to_string()),
            model_name: "meta-llama/Llama-4-Maverick-17B-128E-Instruct-FP8".to_string(),
        });
    }
    providers.push(BaseModelUsesProvider {
        provider: ModelProvider::Openrouter,
        custom_provider: None,
        model_name: EXAMPLE_MODEL.to_string(),
    });

    let model = CustomModel::from(BaseModelConfig {
        model_id: ModelId::from(EXAMPLE_MODEL),
        publisher: "meta-llama".to_string(),
        description: "Meta Llama 4 Maverick".to_string(),
        shared: BaseModelShared {
            default_max_convo_tokens: 75_000,
            max_tokens: 1_048_576,
            max_output_tokens: 16_000,
            reserved_output_tokens: 16_000,
            model_compatibility: ModelCompatibility::Full,
            preferred_output_format: ModelOutputFormat::Xml,
            role_params_disabled: false,
        },
        providers,
    });

    let role = ModelRoleConfigSchema::new;
    let pack = ModelPackSchema {
        name: "example-model-pack".to_string(),
        description: "Example model pack".to_string(),
        planner: role("deepseek/r1"),
        architect: Some(role("deepseek/r1")),
        coder: Some(role("deepseek/v3")),
        plan_summary: role(EXAMPLE_MODEL),
        builder: role("deepseek/r1"),
        whole_file_builder: Some(role("deepseek/r1")),
        namer: role(EXAMPLE_MODEL),
        commit_message: role(EXAMPLE_MODEL),
        exec_status: role("deepseek/r1"),
    };

    ModelsInput {
        schema_url: SCHEMA_URL.to_string(),
        custom_providers,
        custom_models: vec![model],
        custom_model_packs: vec![pack],
    }
}
