//! `models` command: show settings and available models.

use anyhow::{Context, Result};

use super::CommandContext;
use crate::api::SettingsScope;
use crate::cli::render::{render_available_models, render_pack_list, render_settings, title};
use crate::messaging::with_spinner;
use crate::models::{available_model_packs, ModelRegistry};

/// Print the model settings of `scope`.
pub async fn show_settings(ctx: &CommandContext, scope: &SettingsScope, all: bool) -> Result<()> {
    let settings = with_spinner("Fetching model settings...", ctx.api.get_settings(scope))
        .await
        .context("Failed to fetch model settings")?;

    let heading = match scope {
        SettingsScope::Plan { branch, .. } => format!("🧠 Model Settings ({})", branch),
        SettingsScope::OrgDefault => "🧠 Default Model Settings".to_string(),
    };
    println!("{}\n", title(&heading));
    print!("{}", render_settings(&settings, all));
    if !all {
        println!("\nUse --all to show temperature, top-p and max input tokens");
    }
    Ok(())
}

/// Print built-in and custom models, then model packs.
pub async fn show_available(ctx: &CommandContext, custom_only: bool) -> Result<()> {
    let api = ctx.api.as_ref();
    let (custom_models, custom_packs) = with_spinner("Fetching models...", async {
        tokio::try_join!(api.list_custom_models(), api.list_model_packs())
    })
    .await
    .context("Failed to fetch custom models")?;

    let registry = ModelRegistry::with_custom(&custom_models);
    print!("{}", render_available_models(&registry, custom_only));
    println!();

    if !custom_only {
        println!("{}", title("📦 Built-in Model Packs"));
        print!("{}", render_pack_list(&available_model_packs(ctx.config.is_cloud)));
        println!();
    }
    if !custom_packs.is_empty() {
        println!("{}", title("🛠️  Custom Model Packs"));
        print!("{}", render_pack_list(&custom_packs));
        println!();
    }

    println!("Use 'modelsync models custom' to manage custom models, providers and model packs");
    Ok(())
}
