//! Built-in models and model packs.
//!
//! These ship with the client and are always available for role
//! assignment, alongside whatever custom models the user defines.

use tracing::warn;

use super::pack::{ModelPack, ModelPackSchema, PackError};
use super::registry::ModelRegistry;
use super::role::ModelRole;
use super::role_config::{FallbackSlot, ModelRoleConfigSchema};
use super::types::{
    BaseModelConfig, BaseModelShared, BaseModelUsesProvider, ModelCompatibility, ModelId,
    ModelOutputFormat, ModelProvider,
};

/// Name of the pack new plans start with.
pub const DEFAULT_PACK_NAME: &str = "daily-driver";

fn shared(max_tokens: u32, max_output: u32, reserved: u32, convo: u32) -> BaseModelShared {
    BaseModelShared {
        default_max_convo_tokens: convo,
        max_tokens,
        max_output_tokens: max_output,
        reserved_output_tokens: reserved,
        model_compatibility: ModelCompatibility::Full,
        preferred_output_format: ModelOutputFormat::Xml,
        role_params_disabled: false,
    }
}

fn uses(provider: ModelProvider, model_name: &str) -> BaseModelUsesProvider {
    BaseModelUsesProvider {
        provider,
        custom_provider: None,
        model_name: model_name.to_string(),
    }
}

fn model(
    id: &str,
    description: &str,
    shared: BaseModelShared,
    providers: Vec<BaseModelUsesProvider>,
) -> BaseModelConfig {
    let model_id = ModelId::from(id);
    BaseModelConfig {
        publisher: model_id.publisher().unwrap_or_default().to_string(),
        model_id,
        description: description.to_string(),
        shared,
        providers,
    }
}

/// All built-in base models, in display order.
pub fn builtin_models() -> Vec<BaseModelConfig> {
    use ModelProvider::*;

    let reasoning = |max, out, reserved, convo| BaseModelShared {
        role_params_disabled: true,
        ..shared(max, out, reserved, convo)
    };

    vec![
        model(
            "openai/gpt-4.1",
            "OpenAI GPT-4.1",
            shared(1_047_576, 32_768, 32_768, 75_000),
            vec![uses(Openai, "gpt-4.1"), uses(Openrouter, "openai/gpt-4.1")],
        ),
        model(
            "openai/gpt-4.1-mini",
            "OpenAI GPT-4.1 Mini",
            shared(1_047_576, 32_768, 32_768, 75_000),
            vec![uses(Openai, "gpt-4.1-mini"), uses(Openrouter, "openai/gpt-4.1-mini")],
        ),
        model(
            "openai/o3",
            "OpenAI o3",
            reasoning(200_000, 100_000, 40_000, 75_000),
            vec![uses(Openai, "o3"), uses(Openrouter, "openai/o3")],
        ),
        model(
            "openai/o4-mini",
            "OpenAI o4-mini",
            reasoning(200_000, 100_000, 40_000, 75_000),
            vec![uses(Openai, "o4-mini"), uses(Openrouter, "openai/o4-mini")],
        ),
        model(
            "anthropic/claude-sonnet-4",
            "Anthropic Claude Sonnet 4",
            shared(200_000, 64_000, 20_000, 75_000),
            vec![
                uses(Anthropic, "claude-sonnet-4-20250514"),
                uses(Openrouter, "anthropic/claude-sonnet-4"),
            ],
        ),
        model(
            "anthropic/claude-opus-4",
            "Anthropic Claude Opus 4",
            shared(200_000, 32_000, 20_000, 75_000),
            vec![
                uses(Anthropic, "claude-opus-4-20250514"),
                uses(Openrouter, "anthropic/claude-opus-4"),
            ],
        ),
        model(
            "google/gemini-2.5-pro",
            "Google Gemini 2.5 Pro",
            shared(1_048_576, 65_535, 20_000, 150_000),
            vec![
                uses(Google, "gemini-2.5-pro"),
                uses(Openrouter, "google/gemini-2.5-pro"),
            ],
        ),
        model(
            "google/gemini-2.5-flash",
            "Google Gemini 2.5 Flash",
            shared(1_048_576, 65_535, 20_000, 75_000),
            vec![
                uses(Google, "gemini-2.5-flash"),
                uses(Openrouter, "google/gemini-2.5-flash"),
            ],
        ),
        model(
            "deepseek/r1",
            "DeepSeek R1",
            reasoning(64_000, 32_000, 8_000, 15_000),
            vec![uses(Deepseek, "deepseek-reasoner"), uses(Openrouter, "deepseek/deepseek-r1")],
        ),
        model(
            "deepseek/v3",
            "DeepSeek V3",
            shared(64_000, 8_192, 8_192, 15_000),
            vec![uses(Deepseek, "deepseek-chat"), uses(Openrouter, "deepseek/deepseek-chat")],
        ),
        model(
            "qwen/qwen3-32b",
            "Qwen 3 32B, served locally",
            shared(40_960, 8_192, 8_192, 10_000),
            vec![uses(Ollama, "qwen3:32b")],
        ),
        model(
            "qwen/qwen2.5-coder-32b",
            "Qwen 2.5 Coder 32B, served locally",
            BaseModelShared {
                model_compatibility: ModelCompatibility::Roles(vec![
                    ModelRole::Coder,
                    ModelRole::Builder,
                    ModelRole::WholeFileBuilder,
                ]),
                ..shared(32_768, 8_192, 8_192, 10_000)
            },
            vec![uses(Ollama, "qwen2.5-coder:32b")],
        ),
    ]
}

fn role(id: &str) -> ModelRoleConfigSchema {
    ModelRoleConfigSchema::new(id)
}

fn with_large_context(id: &str) -> ModelRoleConfigSchema {
    role(id).with_fallback(FallbackSlot::LargeContext, role("google/gemini-2.5-pro"))
}

fn builtin_pack_schemas() -> Vec<(ModelPackSchema, Option<ModelProvider>)> {
    vec![
        (
            ModelPackSchema {
                name: DEFAULT_PACK_NAME.to_string(),
                description: "A balance of capability, cost and speed".to_string(),
                planner: with_large_context("anthropic/claude-sonnet-4"),
                architect: Some(with_large_context("anthropic/claude-sonnet-4")),
                coder: Some(
                    with_large_context("anthropic/claude-sonnet-4")
                        .with_fallback(FallbackSlot::LargeOutput, role("openai/gpt-4.1")),
                ),
                plan_summary: role("openai/o4-mini"),
                builder: role("openai/o4-mini")
                    .with_fallback(FallbackSlot::Strong, role("openai/o3"))
                    .with_fallback(FallbackSlot::Error, role("openai/gpt-4.1")),
                whole_file_builder: Some(with_large_context("openai/o4-mini")),
                namer: role("openai/gpt-4.1-mini"),
                commit_message: role("openai/gpt-4.1-mini"),
                exec_status: role("openai/o4-mini"),
            },
            None,
        ),
        (
            ModelPackSchema {
                name: "reasoning".to_string(),
                description: "Reasoning models for planning and coding".to_string(),
                planner: with_large_context("openai/o3"),
                architect: None,
                coder: Some(with_large_context("anthropic/claude-sonnet-4")),
                plan_summary: role("openai/o4-mini"),
                builder: role("openai/o4-mini"),
                whole_file_builder: None,
                namer: role("openai/gpt-4.1-mini"),
                commit_message: role("openai/gpt-4.1-mini"),
                exec_status: role("openai/o4-mini"),
            },
            None,
        ),
        (
            ModelPackSchema {
                name: "strong".to_string(),
                description: "Stronger models for difficult tasks, at higher cost".to_string(),
                planner: with_large_context("anthropic/claude-opus-4"),
                architect: Some(with_large_context("anthropic/claude-opus-4")),
                coder: Some(with_large_context("anthropic/claude-sonnet-4")),
                plan_summary: role("openai/o4-mini"),
                builder: role("openai/o3"),
                whole_file_builder: None,
                namer: role("openai/gpt-4.1-mini"),
                commit_message: role("openai/gpt-4.1-mini"),
                exec_status: role("openai/o3"),
            },
            None,
        ),
        (
            ModelPackSchema {
                name: "cheap".to_string(),
                description: "Cheaper models for simple tasks".to_string(),
                planner: role("openai/gpt-4.1-mini"),
                architect: None,
                coder: Some(role("deepseek/v3")),
                plan_summary: role("google/gemini-2.5-flash"),
                builder: role("openai/gpt-4.1-mini"),
                whole_file_builder: None,
                namer: role("google/gemini-2.5-flash"),
                commit_message: role("google/gemini-2.5-flash"),
                exec_status: role("openai/gpt-4.1-mini"),
            },
            None,
        ),
        (
            ModelPackSchema {
                name: "opus-planner".to_string(),
                description: "Claude Opus 4 for planning, Sonnet 4 for coding".to_string(),
                planner: with_large_context("anthropic/claude-opus-4"),
                architect: Some(with_large_context("anthropic/claude-sonnet-4")),
                coder: Some(with_large_context("anthropic/claude-sonnet-4")),
                plan_summary: role("openai/o4-mini"),
                builder: role("openai/o4-mini"),
                whole_file_builder: None,
                namer: role("openai/gpt-4.1-mini"),
                commit_message: role("openai/gpt-4.1-mini"),
                exec_status: role("openai/o4-mini"),
            },
            None,
        ),
        (
            ModelPackSchema {
                name: "ollama".to_string(),
                description: "Local models served by Ollama".to_string(),
                planner: role("qwen/qwen3-32b"),
                architect: None,
                coder: Some(role("qwen/qwen2.5-coder-32b")),
                plan_summary: role("qwen/qwen3-32b"),
                builder: role("qwen/qwen2.5-coder-32b"),
                whole_file_builder: None,
                namer: role("qwen/qwen3-32b"),
                commit_message: role("qwen/qwen3-32b"),
                exec_status: role("qwen/qwen3-32b"),
            },
            Some(ModelProvider::Ollama),
        ),
    ]
}

/// All built-in model packs, resolved against the built-in models.
pub fn builtin_model_packs() -> Vec<ModelPack> {
    let registry = ModelRegistry::with_builtins();
    builtin_pack_schemas()
        .into_iter()
        .filter_map(|(schema, local_provider)| match schema.to_model_pack(&registry) {
            Ok(pack) => Some(ModelPack {
                local_provider,
                ..pack
            }),
            Err(e) => {
                warn!(pack = %schema.name, error = %e, "Skipping unresolvable built-in pack");
                None
            }
        })
        .collect()
}

/// Built-in packs offered to the user. Packs that need a local provider are
/// hidden on cloud hosting.
pub fn available_model_packs(is_cloud: bool) -> Vec<ModelPack> {
    builtin_model_packs()
        .into_iter()
        .filter(|p| !(is_cloud && p.local_provider.is_some()))
        .collect()
}

/// The pack new plans start with.
pub fn default_model_pack() -> Result<ModelPack, PackError> {
    let registry = ModelRegistry::with_builtins();
    builtin_pack_schemas()
        .into_iter()
        .find(|(schema, _)| schema.name == DEFAULT_PACK_NAME)
        .map(|(schema, _)| schema.to_model_pack(&registry))
        .ok_or_else(|| PackError::Missing(DEFAULT_PACK_NAME.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_builtin_model_ids_unique() {
        let models = builtin_models();
        let ids: HashSet<_> = models.iter().map(|m| m.model_id.clone()).collect();
        assert_eq!(ids.len(), models.len());
    }

    #[test]
    fn test_publisher_from_id() {
        for model in builtin_models() {
            assert_eq!(Some(model.publisher.as_str()), model.model_id.publisher());
        }
    }

    #[test]
    fn test_every_builtin_pack_resolves() {
        assert_eq!(builtin_model_packs().len(), builtin_pack_schemas().len());
    }

    #[test]
    fn test_builtin_packs_are_role_compatible() {
        let registry = ModelRegistry::with_builtins();
        for (schema, _) in builtin_pack_schemas() {
            let mut problems = Vec::new();
            schema.collect_problems(&registry, &mut problems);
            assert!(problems.is_empty(), "{}: {:?}", schema.name, problems);
        }
    }

    #[test]
    fn test_default_pack() {
        let pack = default_model_pack().unwrap();
        assert_eq!(pack.name, DEFAULT_PACK_NAME);
        assert!(pack.local_provider.is_none());
    }

    #[test]
    fn test_local_packs_hidden_on_cloud() {
        let cloud: Vec<_> = available_model_packs(true).into_iter().map(|p| p.name).collect();
        let local: Vec<_> = available_model_packs(false).into_iter().map(|p| p.name).collect();
        assert!(!cloud.contains(&"ollama".to_string()));
        assert!(local.contains(&"ollama".to_string()));
    }

    #[test]
    fn test_reasoning_models_disable_role_params() {
        let registry = ModelRegistry::with_builtins();
        let o3 = registry.get(&ModelId::from("openai/o3")).unwrap();
        assert!(o3.shared.role_params_disabled);
        assert!(default_model_pack().unwrap().any_role_params_disabled());
    }
}
