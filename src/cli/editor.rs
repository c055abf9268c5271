//! Detects installed editors for opening the models file.

use std::path::Path;
use std::process::Command;

use tracing::debug;

pub const MAX_EDITOR_OPTIONS: usize = 5;

/// An editor launcher found on `PATH`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Editor {
    pub name: String,
    pub command: String,
    pub args: Vec<String>,
    jetbrains: bool,
}

impl Editor {
    fn known(name: &str, command: &str, jetbrains: bool) -> Self {
        Self {
            name: name.to_string(),
            command: command.to_string(),
            args: Vec::new(),
            jetbrains,
        }
    }

    /// Launch the editor on `path` without waiting for it.
    pub fn open(&self, path: &Path) -> std::io::Result<()> {
        debug!(editor = %self.command, path = %path.display(), "Opening editor");
        Command::new(&self.command)
            .args(&self.args)
            .arg(path)
            .spawn()
            .map(|_| ())
    }
}

fn candidates() -> Vec<Editor> {
    let mut jb = Editor::known("JetBrains (jb)", "jb", true);
    jb.args.push("open".to_string());

    vec![
        Editor::known("VS Code", "code", false),
        Editor::known("Cursor", "cursor", false),
        Editor::known("Zed", "zed", false),
        Editor::known("Neovim", "nvim", false),
        Editor::known("IntelliJ IDEA", "idea", true),
        Editor::known("GoLand", "goland", true),
        Editor::known("PyCharm", "pycharm", true),
        Editor::known("CLion", "clion", true),
        Editor::known("WebStorm", "webstorm", true),
        Editor::known("PhpStorm", "phpstorm", true),
        Editor::known("DataGrip", "datagrip", true),
        Editor::known("RubyMine", "rubymine", true),
        Editor::known("Rider", "rider", true),
        Editor::known("DataSpell", "dataspell", true),
        jb,
        Editor::known("Vim", "vim", false),
        Editor::known("Nano", "nano", false),
        Editor::known("Helix", "hx", false),
        Editor::known("Micro", "micro", false),
        Editor::known("Sublime Text", "subl", false),
        Editor::known("TextMate", "mate", false),
        Editor::known("Kakoune", "kak", false),
        Editor::known("Emacs", "emacs", false),
        Editor::known("Kate", "kate", false),
    ]
}

/// Binary name from an `$EDITOR`-style value: `"/usr/bin/nvim -f"` → `nvim`.
fn preferred_command(value: &str) -> Option<String> {
    let first = value.split_whitespace().next()?;
    Path::new(first)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
}

/// Pick editors from the known list plus the preferred commands.
///
/// Preferred editors sort first. When the universal `jb` launcher is
/// installed, per-IDE JetBrains launchers are dropped unless preferred.
fn select_editors(preferred: &[String], on_path: impl Fn(&str) -> bool) -> Vec<Editor> {
    let is_preferred = |cmd: &str| preferred.iter().any(|p| p == cmd);
    let jb_on_path = on_path("jb");

    let mut found: Vec<Editor> = candidates()
        .into_iter()
        .filter(|c| on_path(&c.command))
        .filter(|c| !(jb_on_path && c.jetbrains && c.command != "jb" && !is_preferred(&c.command)))
        .collect();

    for cmd in preferred {
        if on_path(cmd) && !found.iter().any(|e| &e.command == cmd) {
            found.push(Editor::known(cmd, cmd, false));
        }
    }

    found.sort_by_key(|e| !is_preferred(&e.command));
    found.truncate(MAX_EDITOR_OPTIONS);
    found
}

/// Editors installed on this machine, most preferred first.
pub fn detect_editors() -> Vec<Editor> {
    let mut preferred = Vec::new();
    for var in ["VISUAL", "EDITOR"] {
        if let Some(cmd) = std::env::var(var).ok().and_then(|v| preferred_command(&v)) {
            if !preferred.contains(&cmd) {
                preferred.push(cmd);
            }
        }
    }
    select_editors(&preferred, |cmd| which::which(cmd).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commands(editors: &[Editor]) -> Vec<&str> {
        editors.iter().map(|e| e.command.as_str()).collect()
    }

    #[test]
    fn test_preferred_command() {
        assert_eq!(preferred_command("/usr/bin/nvim -f").as_deref(), Some("nvim"));
        assert_eq!(preferred_command("code --wait").as_deref(), Some("code"));
        assert_eq!(preferred_command("   "), None);
    }

    #[test]
    fn test_known_order_kept() {
        let installed = ["vim", "code", "nano"];
        let editors = select_editors(&[], |cmd| installed.contains(&cmd));
        assert_eq!(commands(&editors), vec!["code", "vim", "nano"]);
    }

    #[test]
    fn test_preferred_sorted_first() {
        let installed = ["vim", "code", "nano"];
        let editors = select_editors(&["nano".to_string()], |cmd| installed.contains(&cmd));
        assert_eq!(commands(&editors), vec!["nano", "code", "vim"]);
    }

    #[test]
    fn test_unknown_preferred_added() {
        let installed = ["code", "ed"];
        let editors = select_editors(&["ed".to_string()], |cmd| installed.contains(&cmd));
        assert_eq!(commands(&editors), vec!["ed", "code"]);
    }

    #[test]
    fn test_jb_hides_ide_launchers() {
        let installed = ["idea", "goland", "jb", "vim"];
        let editors = select_editors(&[], |cmd| installed.contains(&cmd));
        assert_eq!(commands(&editors), vec!["jb", "vim"]);
        assert_eq!(editors[0].args, vec!["open".to_string()]);

        let editors = select_editors(&["goland".to_string()], |cmd| installed.contains(&cmd));
        assert_eq!(commands(&editors), vec!["goland", "jb", "vim"]);
    }

    #[test]
    fn test_capped_at_max() {
        let editors = select_editors(&[], |_| true);
        assert_eq!(editors.len(), MAX_EDITOR_OPTIONS);
    }
}
