//! Functional roles a model pack assigns models to.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the fixed functional slots of a model pack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelRole {
    Planner,
    Architect,
    Coder,
    PlanSummary,
    Builder,
    WholeFileBuilder,
    Namer,
    CommitMessage,
    ExecStatus,
}

impl ModelRole {
    /// All roles, in pack traversal order.
    pub const ALL: [ModelRole; 9] = [
        ModelRole::Planner,
        ModelRole::Architect,
        ModelRole::Coder,
        ModelRole::PlanSummary,
        ModelRole::Builder,
        ModelRole::WholeFileBuilder,
        ModelRole::Namer,
        ModelRole::CommitMessage,
        ModelRole::ExecStatus,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelRole::Planner => "planner",
            ModelRole::Architect => "architect",
            ModelRole::Coder => "coder",
            ModelRole::PlanSummary => "plan-summary",
            ModelRole::Builder => "builder",
            ModelRole::WholeFileBuilder => "whole-file-builder",
            ModelRole::Namer => "namer",
            ModelRole::CommitMessage => "commit-message",
            ModelRole::ExecStatus => "exec-status",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ModelRole::Planner => "replies to prompts and makes plans",
            ModelRole::Architect => "decides what context to load for the planner",
            ModelRole::Coder => "writes code to implement each step of the plan",
            ModelRole::PlanSummary => "summarizes conversations exceeding max-convo-tokens",
            ModelRole::Builder => "builds the proposed changes into pending file updates",
            ModelRole::WholeFileBuilder => "rebuilds whole files when targeted edits fail",
            ModelRole::Namer => "names plans",
            ModelRole::CommitMessage => "writes commit messages",
            ModelRole::ExecStatus => "decides whether to auto-continue",
        }
    }

    /// Whether a model pack may leave this role unset.
    pub fn is_optional(&self) -> bool {
        matches!(
            self,
            ModelRole::Architect | ModelRole::Coder | ModelRole::WholeFileBuilder
        )
    }

    pub fn default_temperature(&self) -> f32 {
        match self {
            ModelRole::Planner | ModelRole::Architect | ModelRole::Coder => 0.3,
            ModelRole::PlanSummary => 0.2,
            ModelRole::Builder | ModelRole::WholeFileBuilder | ModelRole::ExecStatus => 0.1,
            ModelRole::Namer | ModelRole::CommitMessage => 0.8,
        }
    }

    pub fn default_top_p(&self) -> f32 {
        match self {
            ModelRole::Planner | ModelRole::Architect | ModelRole::Coder => 0.3,
            ModelRole::PlanSummary => 0.2,
            ModelRole::Builder | ModelRole::WholeFileBuilder | ModelRole::ExecStatus => 0.1,
            ModelRole::Namer | ModelRole::CommitMessage => 0.5,
        }
    }
}

impl fmt::Display for ModelRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelRole {
    type Err = String;

    /// Case-insensitive, ignoring `-`, `_` and spaces.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = compact(s);
        ModelRole::ALL
            .into_iter()
            .find(|role| compact(role.as_str()) == wanted)
            .ok_or_else(|| format!("unknown role: {}", s))
    }
}

/// Lowercase and strip separators so `top-p`, `topP` and `top_p` compare equal.
pub fn compact(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, '-' | '_' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}
