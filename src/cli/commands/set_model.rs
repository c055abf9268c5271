//! `set-model`: change the model pack, one role, or an override.
//!
//! Arguments are taken positionally as far as they go; anything missing
//! is asked for interactively.

use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};

use super::{resolve_pack_alias, CommandContext};
use crate::api::SettingsScope;
use crate::cli::prompt::{input, is_interactive, select};
use crate::cli::render::render_settings;
use crate::messaging::with_spinner;
use crate::models::{
    ModelRole, OverrideSetting, PlanSettings, RoleProperty, Selector, SettingsUpdater,
};

/// What the first argument names.
#[derive(Debug, Clone, PartialEq)]
enum Target {
    Pack(String),
    Role(ModelRole),
    Override(OverrideSetting),
}

fn parse_target(arg: &str, updater: &SettingsUpdater) -> Result<Target> {
    let pack_name = resolve_pack_alias(arg);
    if let Some(pack) = updater.find_pack(pack_name) {
        return Ok(Target::Pack(pack.name.clone()));
    }
    if let Ok(role) = ModelRole::from_str(arg) {
        return Ok(Target::Role(role));
    }
    if let Ok(setting) = OverrideSetting::from_str(arg) {
        return Ok(Target::Override(setting));
    }
    bail!("'{}' is not a model pack, role or setting", arg)
}

/// Selector from positional arguments. `Ok(None)` means more input is needed.
fn selector_from_args(args: &[String], updater: &SettingsUpdater) -> Result<Option<Selector>> {
    let Some(first) = args.first() else {
        return Ok(None);
    };

    match parse_target(first, updater)? {
        Target::Pack(name) => {
            if args.len() > 1 {
                bail!("unexpected arguments after model pack '{}'", name);
            }
            Ok(Some(Selector::Pack(name)))
        }
        Target::Role(role) => match args.get(1) {
            None => Ok(None),
            Some(second) => match RoleProperty::from_str(second) {
                Ok(property) => Ok(args.get(2).map(|value| Selector::Role {
                    role,
                    property: Some(property),
                    value: value.clone(),
                })),
                Err(_) => Ok(Some(Selector::Role {
                    role,
                    property: None,
                    value: second.clone(),
                })),
            },
        },
        Target::Override(setting) => Ok(args.get(1).map(|value| Selector::Override {
            setting,
            value: value.clone(),
        })),
    }
}

fn cancelled() -> anyhow::Error {
    anyhow!("Cancelled")
}

fn prompt_pack(updater: &SettingsUpdater) -> Result<Selector> {
    let packs = updater.packs();
    let items: Vec<String> = packs
        .iter()
        .map(|p| format!("{} → {}", p.name, p.description))
        .collect();
    let idx = select("Select a model pack", &items)?.ok_or_else(cancelled)?;
    Ok(Selector::Pack(packs[idx].name.clone()))
}

fn prompt_role_value(
    updater: &SettingsUpdater,
    role: ModelRole,
    property: RoleProperty,
) -> Result<Selector> {
    let value = match property {
        RoleProperty::Model => {
            let models = updater.registry().compatible_with(role);
            let items: Vec<String> = models.iter().map(|m| m.model_id.to_string()).collect();
            let idx = select(property.prompt(), &items)?.ok_or_else(cancelled)?;
            items[idx].clone()
        }
        _ => input(property.prompt())?,
    };
    Ok(Selector::Role {
        role,
        property: Some(property),
        value,
    })
}

fn prompt_role(
    updater: &SettingsUpdater,
    settings: &PlanSettings,
    role: ModelRole,
) -> Result<Selector> {
    let config = settings.model_pack.role_config(role);
    let properties: Vec<RoleProperty> = RoleProperty::ALL
        .into_iter()
        .filter(|p| {
            !(config.role_params_disabled()
                && matches!(p, RoleProperty::Temperature | RoleProperty::TopP))
        })
        .collect();
    let items: Vec<&str> = properties.iter().map(|p| p.as_str()).collect();
    let idx = select(&format!("Update {}", role), &items)?.ok_or_else(cancelled)?;
    prompt_role_value(updater, role, properties[idx])
}

fn prompt_override(setting: OverrideSetting) -> Result<Selector> {
    let value = input(&format!("Set {} (empty to clear)", setting))?;
    Ok(Selector::Override { setting, value })
}

/// Fill in whatever `args` left open.
fn prompt_selector(
    args: &[String],
    updater: &SettingsUpdater,
    settings: &PlanSettings,
) -> Result<Selector> {
    if !is_interactive() {
        bail!("Missing arguments. Run 'modelsync set-model --help' for usage");
    }

    let target = match args.first() {
        Some(first) => parse_target(first, updater)?,
        None => {
            let mut targets = vec![None];
            let mut items = vec!["Select a model pack".to_string()];
            for role in ModelRole::ALL {
                let config = settings.model_pack.role_config(role);
                items.push(format!("{} → {} ({})", role, config.model_id, role.description()));
                targets.push(Some(Target::Role(role)));
            }
            for setting in OverrideSetting::ALL {
                items.push(format!("{} ({})", setting, setting.description()));
                targets.push(Some(Target::Override(setting)));
            }
            let idx = select("What do you want to update?", &items)?.ok_or_else(cancelled)?;
            match targets.swap_remove(idx) {
                Some(target) => target,
                None => return prompt_pack(updater),
            }
        }
    };

    match target {
        Target::Pack(name) => Ok(Selector::Pack(name)),
        Target::Role(role) => match args.get(1).map(|s| RoleProperty::from_str(s)) {
            Some(Ok(property)) => prompt_role_value(updater, role, property),
            _ => prompt_role(updater, settings, role),
        },
        Target::Override(setting) => prompt_override(setting),
    }
}

/// Apply one change to the settings of `scope` and push it.
pub async fn run_set_model(
    ctx: &CommandContext,
    scope: &SettingsScope,
    args: &[String],
) -> Result<()> {
    let (settings, updater) = with_spinner("Fetching model settings...", async {
        tokio::try_join!(
            async { ctx.api.get_settings(scope).await.map_err(anyhow::Error::from) },
            ctx.load_updater()
        )
    })
    .await
    .context("Failed to fetch model settings")?;

    let selector = match selector_from_args(args, &updater)? {
        Some(selector) => selector,
        None => prompt_selector(args, &updater, &settings)?,
    };

    let Some(updated) = updater.apply(&selector, &settings)? else {
        println!("🤷‍♂️ No model settings were updated");
        return Ok(());
    };

    let msg = with_spinner("Updating model settings...", ctx.api.update_settings(scope, &updated))
        .await
        .context("Failed to update model settings")?;

    if msg.is_empty() {
        println!("✅ Model settings updated");
    } else {
        println!("✅ {}", msg);
    }
    println!();
    print!("{}", render_settings(&updated, false));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn updater() -> SettingsUpdater {
        SettingsUpdater::with_custom(&[], &[], false)
    }

    #[test]
    fn test_pack_by_alias() {
        let selector = selector_from_args(&args(&["daily"]), &updater()).unwrap();
        assert_eq!(selector, Some(Selector::Pack("daily-driver".to_string())));
    }

    #[test]
    fn test_role_model_shorthand() {
        let selector = selector_from_args(&args(&["planner", "openai/gpt-4.1"]), &updater()).unwrap();
        assert_eq!(
            selector,
            Some(Selector::Role {
                role: ModelRole::Planner,
                property: None,
                value: "openai/gpt-4.1".to_string(),
            })
        );
    }

    #[test]
    fn test_role_property_value() {
        let selector =
            selector_from_args(&args(&["coder", "temperature", "0.4"]), &updater()).unwrap();
        assert_eq!(
            selector,
            Some(Selector::Role {
                role: ModelRole::Coder,
                property: Some(RoleProperty::Temperature),
                value: "0.4".to_string(),
            })
        );
    }

    #[test]
    fn test_incomplete_args_need_prompt() {
        let u = updater();
        assert_eq!(selector_from_args(&[], &u).unwrap(), None);
        assert_eq!(selector_from_args(&args(&["builder"]), &u).unwrap(), None);
        assert_eq!(selector_from_args(&args(&["builder", "top-p"]), &u).unwrap(), None);
        assert_eq!(selector_from_args(&args(&["max-tokens"]), &u).unwrap(), None);
    }

    #[test]
    fn test_override_value() {
        let selector = selector_from_args(&args(&["max-convo-tokens", "20000"]), &updater()).unwrap();
        assert_eq!(
            selector,
            Some(Selector::Override {
                setting: OverrideSetting::MaxConvoTokens,
                value: "20000".to_string(),
            })
        );
    }

    #[test]
    fn test_unknown_target() {
        assert!(selector_from_args(&args(&["reviewer"]), &updater()).is_err());
        assert!(selector_from_args(&args(&["strong", "extra"]), &updater()).is_err());
    }
}
