//! modelsync - manage custom models and per-role model settings
//!
//! Syncs a local custom models file with the server and updates the model
//! pack, role models and overrides of a plan.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use modelsync::runner::{run, AppConfig, Command};

/// modelsync - custom models, providers and model packs 🧠
#[derive(Parser, Debug)]
#[command(name = "modelsync")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Args {
    /// API host to connect to
    #[arg(long, global = true, env = "MODELSYNC_API_HOST")]
    api_host: Option<String>,

    /// Plan id (defaults to currentPlan from config.json)
    #[arg(long, global = true)]
    plan: Option<String>,

    /// Plan branch
    #[arg(long, global = true)]
    branch: Option<String>,

    /// Use managed cloud mode
    #[arg(long, global = true)]
    cloud: bool,

    /// Enable debug logging (equivalent to RUST_LOG=debug)
    #[arg(short = 'd', long, global = true)]
    debug: bool,

    /// Enable verbose logging (equivalent to RUST_LOG=trace)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show model settings
    Models {
        /// Show temperature, top-p and max input tokens
        #[arg(long, global = true)]
        all: bool,

        #[command(subcommand)]
        command: Option<ModelsCommand>,
    },

    /// Update the model pack, a role's model or parameters, or an override
    #[command(visible_alias = "set-models")]
    SetModel {
        /// [pack | role [property] value | setting value], or `default ...`
        /// to update the org-wide defaults
        #[arg(allow_hyphen_values = true)]
        args: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
enum ModelsCommand {
    /// Show org-wide default model settings
    Default,

    /// List built-in and custom models
    Available {
        /// Only show custom models and packs
        #[arg(long)]
        custom: bool,
    },

    /// Manage custom models, providers and model packs
    Custom {
        /// Push the models file without opening it
        #[arg(long)]
        save: bool,

        /// Models file path (defaults to custom-models.json in the config dir)
        #[arg(short, long)]
        file: Option<String>,
    },
}

impl From<&Args> for AppConfig {
    fn from(args: &Args) -> Self {
        AppConfig {
            debug: args.debug,
            verbose: args.verbose,
            api_host: args.api_host.clone(),
            plan: args.plan.clone(),
            branch: args.branch.clone(),
            cloud: args.cloud,
        }
    }
}

fn to_command(command: Commands) -> Command {
    match command {
        Commands::Models { all, command } => match command {
            None => Command::ShowSettings {
                org_default: false,
                all,
            },
            Some(ModelsCommand::Default) => Command::ShowSettings {
                org_default: true,
                all,
            },
            Some(ModelsCommand::Available { custom }) => Command::ShowAvailable {
                custom_only: custom,
            },
            Some(ModelsCommand::Custom { save, file }) => Command::Custom {
                file: file.map(|f| PathBuf::from(shellexpand::tilde(&f).into_owned())),
                save,
            },
        },
        Commands::SetModel { mut args } => {
            let org_default = args.first().is_some_and(|a| a == "default");
            if org_default {
                args.remove(0);
            }
            Command::SetModel { org_default, args }
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = AppConfig::from(&args);
    run(config, to_command(args.command))
}
