//! Terminal front end: rendering, prompts, editor launch and commands.

pub mod commands;
pub mod editor;
pub mod prompt;
pub mod render;
