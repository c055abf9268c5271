//! `models custom`: edit custom models, providers and packs as a JSON file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use nu_ansi_term::{Color, Style};

use super::CommandContext;
use crate::cli::editor::detect_editors;
use crate::cli::prompt::{confirm, is_interactive, select, TerminalConfirm};
use crate::cli::render::render_change_set;
use crate::messaging::with_spinner;
use crate::sync::{ModelsFile, OpenOutcome, SaveOutcome, SyncError, SyncSession};

fn save_hint(file: &ModelsFile) -> String {
    let file_arg = if file.checks_conflicts() {
        String::new()
    } else {
        format!(" --file {}", file.path().display())
    };
    format!(
        "To save changes, run {}",
        Color::Cyan
            .bold()
            .paint(format!("modelsync models custom --save{}", file_arg))
    )
}

/// Open the models file for editing, or push it with `save`.
pub async fn run_custom(ctx: &CommandContext, file: Option<PathBuf>, save: bool) -> Result<()> {
    let file = match file {
        Some(path) => ModelsFile::at(path),
        None => ModelsFile::at_default(&ctx.dirs),
    };
    let session = SyncSession::new(ctx.api.as_ref(), file, ctx.config.is_cloud);

    if save {
        return save_file(&session).await;
    }

    // `open` may prompt about local changes.
    let outcome = session
        .open(&TerminalConfirm)
        .await
        .context("Failed to load custom models")?;

    let path = session.file().path();
    match outcome {
        OpenOutcome::Cancelled => {
            println!("🙅‍♂️ Kept local changes");
            println!("{}", save_hint(session.file()));
            return Ok(());
        }
        OpenOutcome::ExampleWritten => {
            println!("🧠 {} → {}", Style::new().bold().paint("Example models file"), path.display());
        }
        OpenOutcome::Refreshed(_) => {
            println!("🔄 Updated from server");
            println!("🧠 {} → {}", Style::new().bold().paint("Models file"), path.display());
        }
        OpenOutcome::LocalKept | OpenOutcome::Equivalent => {
            println!("🧠 {} → {}", Style::new().bold().paint("Models file"), path.display());
        }
    }
    println!("👨‍💻 Edit it, then come back here to save\n");

    if !open_in_editor(session.file())? {
        println!("👨‍💻 Edit the file in your JSON editor of choice\n");
        println!("{}", save_hint(session.file()));
        return Ok(());
    }

    println!("📝 Opened in editor\n");
    if !confirm("Ready to save?", true)? {
        println!("🙅‍♂️ Update canceled\n");
        println!("{}", save_hint(session.file()));
        return Ok(());
    }

    save_file(&session).await
}

/// Offer the detected editors. Returns whether one was launched.
fn open_in_editor(file: &ModelsFile) -> Result<bool> {
    if !is_interactive() {
        return Ok(false);
    }
    let editors = detect_editors();
    if editors.is_empty() {
        return Ok(false);
    }

    let mut options: Vec<String> = editors.iter().map(|e| format!("Open with {}", e.name)).collect();
    options.push("Open manually".to_string());

    match select("Open the file now?", &options)? {
        Some(idx) if idx < editors.len() => {
            let editor = &editors[idx];
            editor
                .open(file.path())
                .with_context(|| format!("Failed to launch {}", editor.command))?;
            Ok(true)
        }
        _ => Ok(false),
    }
}

async fn save_file<A>(session: &SyncSession<'_, A>) -> Result<()>
where
    A: crate::api::ModelsApi + ?Sized,
{
    match with_spinner("Saving custom models...", session.save()).await {
        Ok(SaveOutcome::NoChanges) => {
            println!("🤷‍♂️ No changes to custom models");
            Ok(())
        }
        Ok(SaveOutcome::Pushed(changes)) => {
            print!("{}", render_change_set(&changes));
            println!("\n✅ Saved custom models");
            Ok(())
        }
        Err(SyncError::Validation(problems)) => {
            println!("{}", Color::Red.bold().paint("🚨 Error validating models file"));
            for problem in &problems {
                println!("  • {}", problem);
            }
            anyhow::bail!("{} is invalid", session.file().path().display())
        }
        Err(e) => Err(e).context("Failed to save custom models"),
    }
}
