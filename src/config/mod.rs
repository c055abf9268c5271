//! Configuration management.

mod client;
mod xdg;

pub use client::{ClientConfig, ConfigError, DEFAULT_API_HOST, DEFAULT_TOKEN_ENV_VAR};
pub use xdg::XdgDirs;
