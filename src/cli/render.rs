//! Terminal rendering for model settings, models and change sets.

use std::fmt;

use nu_ansi_term::{Color, Style};
use unicode_width::UnicodeWidthStr;

use crate::models::{
    BaseModelConfig, ModelPack, ModelRegistry, ModelSource, PlanSettings, RoleRow,
};
use crate::sync::{Change, ChangeAction, ChangeSet, EntityKind};

const DESCRIPTION_WIDTH: usize = 64;

pub const DISABLED_PARAMS_NOTE: &str =
    "* these models do not support changing temperature or top p";

/// Display width of a cell, ignoring ANSI escapes.
fn display_width(cell: &str) -> usize {
    strip_ansi_escapes::strip_str(cell).width()
}

/// Box-drawn table sized to its widest cells.
#[derive(Debug, Clone, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn add_row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(cells.into_iter().map(Into::into).collect());
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| display_width(h)).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                let width = display_width(cell);
                match widths.get_mut(i) {
                    Some(w) => *w = (*w).max(width),
                    None => widths.push(width),
                }
            }
        }
        widths
    }
}

fn border(widths: &[usize], left: &str, mid: &str, right: &str) -> String {
    let inner: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
    format!("{}{}{}", left, inner.join(mid), right)
}

fn line(widths: &[usize], cells: &[String]) -> String {
    let mut out = String::from("│");
    for (i, width) in widths.iter().enumerate() {
        let cell = cells.get(i).map(String::as_str).unwrap_or("");
        let pad = width.saturating_sub(display_width(cell));
        out.push(' ');
        out.push_str(cell);
        out.push_str(&" ".repeat(pad + 1));
        out.push('│');
    }
    out
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let widths = self.widths();
        let bold = Style::new().bold();
        let headers: Vec<String> = self
            .headers
            .iter()
            .map(|h| bold.paint(h.as_str()).to_string())
            .collect();

        writeln!(f, "{}", border(&widths, "┌", "┬", "┐"))?;
        writeln!(f, "{}", line(&widths, &headers))?;
        writeln!(f, "{}", border(&widths, "├", "┼", "┤"))?;
        for row in &self.rows {
            writeln!(f, "{}", line(&widths, row))?;
        }
        writeln!(f, "{}", border(&widths, "└", "┴", "┘"))
    }
}

/// `128000` → `128,000`
pub fn format_tokens(n: u32) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn format_param(value: f32) -> String {
    let s = format!("{:.2}", value);
    let s = s.trim_end_matches('0');
    s.trim_end_matches('.').to_string()
}

/// Role label indented by tree depth.
pub fn role_label(row: &RoleRow<'_>) -> String {
    if row.depth == 0 {
        row.label.clone()
    } else {
        format!("{}└─ {}", "  ".repeat(row.depth - 1), row.label)
    }
}

pub fn title(text: &str) -> String {
    Color::Cyan.bold().paint(text).to_string()
}

/// Model table for a pack, one row per node of every role tree.
pub fn render_model_pack(pack: &ModelPack, all: bool) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} {}\n",
        Style::new().bold().paint("📦 Model Pack:"),
        Color::Green.bold().paint(pack.name.as_str())
    ));
    if !pack.description.is_empty() {
        for wrapped in textwrap::wrap(&pack.description, DESCRIPTION_WIDTH) {
            out.push_str(&format!("{}\n", Style::new().dimmed().paint(&*wrapped)));
        }
    }
    out.push('\n');

    let mut table = if all {
        Table::new(["Role", "Model", "Temperature", "Top P", "Max Input"])
    } else {
        Table::new(["Role", "Model"])
    };

    for row in pack.flatten() {
        let config = row.config;
        let model = config.model_id.to_string();
        let label = if row.depth == 0 {
            Style::new().bold().paint(role_label(&row)).to_string()
        } else {
            role_label(&row)
        };
        if all {
            let params = config.effective_params();
            let param_cell = |value: f32| {
                if params.disabled {
                    format!("*{}", format_param(value))
                } else {
                    format_param(value)
                }
            };
            table.add_row([
                label,
                model,
                param_cell(params.temperature),
                param_cell(params.top_p),
                format_tokens(config.max_input_tokens()),
            ]);
        } else {
            table.add_row([label, model]);
        }
    }
    out.push_str(&table.to_string());

    if all && pack.any_role_params_disabled() {
        out.push_str(&format!("{}\n", Style::new().dimmed().paint(DISABLED_PARAMS_NOTE)));
    }
    out
}

/// Full settings view: pack, planner defaults and any overrides.
pub fn render_settings(settings: &PlanSettings, all: bool) -> String {
    let mut out = render_model_pack(&settings.model_pack, all);
    out.push('\n');

    out.push_str(&format!("{}\n", title("🧠 Planner Defaults")));
    let mut defaults = Table::new(["Setting", "Value"]);
    defaults.add_row([
        "max-tokens".to_string(),
        format_tokens(settings.planner_max_tokens()),
    ]);
    defaults.add_row([
        "max-convo-tokens".to_string(),
        format_tokens(settings.planner_max_convo_tokens()),
    ]);
    out.push_str(&defaults.to_string());

    let overrides = &settings.model_overrides;
    if !overrides.is_empty() {
        out.push('\n');
        out.push_str(&format!("{}\n", title("⚙️  Overrides")));
        let mut table = Table::new(["Setting", "Value"]);
        let entries = [
            ("max-tokens", overrides.max_tokens),
            ("max-convo-tokens", overrides.max_convo_tokens),
            ("reserved-output-tokens", overrides.reserved_output_tokens),
        ];
        for (name, value) in entries {
            if let Some(value) = value {
                table.add_row([name.to_string(), format_tokens(value)]);
            }
        }
        out.push_str(&table.to_string());
    }
    out
}

fn model_table<'a>(models: impl Iterator<Item = &'a BaseModelConfig>) -> Table {
    let mut table = Table::new(["Model", "Providers", "🪙 Max Input", "Max Output"]);
    for model in models {
        let mut providers: Vec<String> = Vec::new();
        for binding in &model.providers {
            let name = match &binding.custom_provider {
                Some(custom) => custom.clone(),
                None => binding.provider.to_string(),
            };
            if !providers.contains(&name) {
                providers.push(name);
            }
        }
        let mut id = model.model_id.to_string();
        if model.shared.role_params_disabled {
            id.push('*');
        }
        table.add_row([
            id,
            providers.join(", "),
            format_tokens(model.max_input_tokens()),
            format_tokens(model.shared.max_output_tokens),
        ]);
    }
    table
}

/// Built-in and custom model tables. `custom_only` skips the built-ins.
pub fn render_available_models(registry: &ModelRegistry, custom_only: bool) -> String {
    let mut out = String::new();
    if !custom_only {
        out.push_str(&format!("{}\n", title("🏠 Built-in Models")));
        out.push_str(&model_table(registry.by_source(ModelSource::BuiltIn)).to_string());
        out.push('\n');
    }

    let custom = model_table(registry.by_source(ModelSource::Custom));
    out.push_str(&format!("{}\n", title("🛠️  Custom Models")));
    if custom.is_empty() {
        out.push_str("No custom models. Run 'modelsync models custom' to add some.\n");
    } else {
        out.push_str(&custom.to_string());
    }

    if registry.all().any(|m| m.shared.role_params_disabled) {
        out.push_str(&format!("{}\n", Style::new().dimmed().paint(DISABLED_PARAMS_NOTE)));
    }
    out
}

/// Name and description of each pack.
pub fn render_pack_list(packs: &[ModelPack]) -> String {
    let mut table = Table::new(["Pack", "Description"]);
    for pack in packs {
        let description = textwrap::wrap(&pack.description, DESCRIPTION_WIDTH)
            .first()
            .map(|line| line.to_string())
            .unwrap_or_default();
        table.add_row([pack.name.clone(), description]);
    }
    table.to_string()
}

fn kind_label(kind: EntityKind) -> String {
    match kind {
        EntityKind::ModelPack => kind.label().to_string(),
        _ => format!("custom {}", kind.label()),
    }
}

pub fn change_line(change: &Change) -> String {
    let (icon, verb, color) = match change.action {
        ChangeAction::Added => ("✅", "Added", Color::Green),
        ChangeAction::Updated => ("🔄", "Updated", Color::Yellow),
        ChangeAction::Deleted => ("❌", "Removed", Color::Red),
    };
    format!(
        "{} {} {} → {}",
        icon,
        color.paint(verb),
        kind_label(change.kind),
        Style::new().bold().paint(change.key.as_str())
    )
}

/// One line per change, in display order.
pub fn render_change_set(changes: &ChangeSet) -> String {
    changes
        .changes()
        .iter()
        .map(|c| format!("{}\n", change_line(c)))
        .collect()
}
