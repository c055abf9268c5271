//! modelsync Library
//!
//! Custom model sync and per-role model settings for plans: the models
//! document and its reconciliation with the server, model packs with their
//! fallback trees, and the settings updater behind `set-model`.

pub mod api;
pub mod cli;
pub mod config;
pub mod messaging;
pub mod models;
pub mod runner;
pub mod sync;
