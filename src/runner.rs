//! Application Runner Module
//!
//! Shared entry point for the `modelsync` binary: logging setup, config
//! resolution and command dispatch.

use std::path::PathBuf;

use anyhow::Context;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::api::{HttpClient, SettingsScope};
use crate::cli::commands::{run_custom, run_set_model, show_available, show_settings, CommandContext};
use crate::config::{ClientConfig, XdgDirs};

/// Runtime options from the command line.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Enable debug logging
    pub debug: bool,
    /// Enable verbose (trace-level) logging
    pub verbose: bool,
    pub api_host: Option<String>,
    pub plan: Option<String>,
    pub branch: Option<String>,
    /// Force cloud mode regardless of config
    pub cloud: bool,
}

/// A resolved command to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    ShowSettings { org_default: bool, all: bool },
    ShowAvailable { custom_only: bool },
    Custom { file: Option<PathBuf>, save: bool },
    SetModel { org_default: bool, args: Vec<String> },
}

fn default_filter(config: &AppConfig) -> &'static str {
    if config.verbose {
        "trace"
    } else if config.debug {
        "debug"
    } else {
        "warn"
    }
}

/// Install the stderr subscriber. `RUST_LOG` takes precedence over flags.
pub fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(config)));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .init();
}

/// Client config from disk and environment with flag overrides applied.
pub fn resolve_client_config(config: &AppConfig, dirs: &XdgDirs) -> anyhow::Result<ClientConfig> {
    let mut client = ClientConfig::load(dirs).context("Failed to load client config")?;
    if let Some(host) = &config.api_host {
        client.api_host = host.clone();
    }
    if let Some(plan) = &config.plan {
        client.current_plan = Some(plan.clone());
    }
    if let Some(branch) = &config.branch {
        client.current_branch = branch.clone();
    }
    if config.cloud {
        client.is_cloud = true;
    }
    Ok(client)
}

/// Run one command to completion.
pub fn run(config: AppConfig, command: Command) -> anyhow::Result<()> {
    init_tracing(&config);

    let dirs = XdgDirs::new();
    let client_config = resolve_client_config(&config, &dirs)?;
    debug!(
        api_host = %client_config.api_host,
        is_cloud = client_config.is_cloud,
        "Resolved client config"
    );

    let token = client_config.token()?;
    let api = HttpClient::new(
        &client_config.api_host,
        &token,
        client_config.org_id.as_deref(),
    )?;
    let ctx = CommandContext::new(Box::new(api), client_config, dirs);

    let runtime = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;
    runtime.block_on(dispatch(&ctx, command))
}

fn scope(ctx: &CommandContext, org_default: bool) -> anyhow::Result<SettingsScope> {
    if org_default {
        Ok(SettingsScope::OrgDefault)
    } else {
        Ok(ctx.plan_scope()?)
    }
}

async fn dispatch(ctx: &CommandContext, command: Command) -> anyhow::Result<()> {
    match command {
        Command::ShowSettings { org_default, all } => {
            show_settings(ctx, &scope(ctx, org_default)?, all).await
        }
        Command::ShowAvailable { custom_only } => show_available(ctx, custom_only).await,
        Command::Custom { file, save } => run_custom(ctx, file, save).await,
        Command::SetModel { org_default, args } => {
            run_set_model(ctx, &scope(ctx, org_default)?, &args).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_default_filter_levels() {
        assert_eq!(default_filter(&AppConfig::default()), "warn");
        let debug = AppConfig {
            debug: true,
            ..AppConfig::default()
        };
        assert_eq!(default_filter(&debug), "debug");
        let verbose = AppConfig {
            debug: true,
            verbose: true,
            ..AppConfig::default()
        };
        assert_eq!(default_filter(&verbose), "trace");
    }

    #[test]
    #[serial]
    fn test_flags_override_client_config() {
        std::env::remove_var("MODELSYNC_API_HOST");
        std::env::remove_var("MODELSYNC_CLOUD");
        let tmp = TempDir::new().unwrap();
        let dirs = XdgDirs::under(tmp.path());
        let config = AppConfig {
            api_host: Some("http://localhost:9000".to_string()),
            plan: Some("plan-7".to_string()),
            branch: Some("feature".to_string()),
            cloud: true,
            ..AppConfig::default()
        };

        let client = resolve_client_config(&config, &dirs).unwrap();
        assert_eq!(client.api_host, "http://localhost:9000");
        assert_eq!(client.current_plan.as_deref(), Some("plan-7"));
        assert_eq!(client.current_branch, "feature");
        assert!(client.is_cloud);
    }
}
