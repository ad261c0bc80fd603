//! Command-line interface and REPL

mod command;

pub use command::Command;

use crate::codec::LoadReport;
use crate::controls::{ControlId, ControlKind};
use crate::mapping::{Layer, MappingStore};
use crate::paths::AppPaths;
use crate::session::EditorSession;
use anyhow::Result;
use colored::*;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

pub fn run_repl(session: &EditorSession, paths: &AppPaths) -> Result<()> {
    let mut rl = DefaultEditor::new()?;

    // Any store change since the last save or load
    let dirty = Arc::new(AtomicBool::new(false));
    {
        let dirty = Arc::clone(&dirty);
        session.store().subscribe(move |event| {
            debug!("Store event: {:?}", event);
            dirty.store(true, Ordering::Relaxed);
        });
    }

    println!("{}", "=== Meaty MIDI Editor ===".bold().cyan());
    println!("Type 'help' for commands\n");

    loop {
        let prompt = format!("meaty[L{}]> ", session.current_layer());
        let line = match rl.readline(&prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        if !line.trim().is_empty() {
            let _ = rl.add_history_entry(line.as_str());
        }

        let command = match Command::parse(&line) {
            Ok(command) => command,
            Err(message) => {
                print_error(&message);
                continue;
            }
        };

        match command {
            Command::Empty => {}
            Command::Quit => {
                if dirty.load(Ordering::Relaxed)
                    && !confirm(&mut rl, "Unsaved changes will be lost. Quit anyway?")?
                {
                    continue;
                }
                break;
            }
            Command::Help => print_help(),
            Command::Layer(None) => print_layer(session),
            Command::Layer(Some(layer)) => {
                session.switch_layer(layer);
                print_layer(session);
            }
            Command::Next => {
                session.next_layer();
                print_layer(session);
            }
            Command::Prev => {
                session.prev_layer();
                print_layer(session);
            }
            Command::Controls => print_controls(),
            Command::Show => print_layer(session),
            Command::Assign {
                control,
                function_type,
                channel,
                number,
            } => assign(session, &control, function_type, channel, number),
            Command::Clear(control) => match control.parse::<ControlId>() {
                Ok(id) if session.clear(id) => {
                    println!("{} {} cleared", "✓".green(), id);
                }
                Ok(id) => println!("{} has no assignment on layer {}", id, session.current_layer()),
                Err(e) => print_error(&e.to_string()),
            },
            Command::ClearLayer => {
                let layer = session.current_layer();
                let count = session.store().all_for_layer(layer).len();
                if count == 0 {
                    println!("Layer {} has no assignments", layer);
                } else if confirm(
                    &mut rl,
                    &format!("Clear all {} assignments on layer {}?", count, layer),
                )? {
                    let removed = session.clear_current_layer();
                    println!("{} Removed {} assignments", "✓".green(), removed);
                }
            }
            Command::Save(target) => {
                let result = match target {
                    Some(name) => {
                        let path = paths.resolve_mapping(&name);
                        session.save_as(&path).map(|count| (path, count))
                    }
                    None => session.save(),
                };
                match result {
                    Ok((path, count)) => {
                        dirty.store(false, Ordering::Relaxed);
                        println!(
                            "{} Saved {} mappings to {}",
                            "✓".green(),
                            count,
                            path.display().to_string().bright_white()
                        );
                    }
                    Err(e) => print_error(&e.to_string()),
                }
            }
            Command::Load(target) => {
                if dirty.load(Ordering::Relaxed)
                    && !confirm(&mut rl, "Unsaved changes will be replaced. Load anyway?")?
                {
                    continue;
                }
                let result = match target {
                    Some(name) => session.load(paths.resolve_mapping(&name)),
                    None => session.reload(),
                };
                match result {
                    Ok(report) => {
                        dirty.store(false, Ordering::Relaxed);
                        print_load_report(&report);
                    }
                    Err(e) => print_error(&e.to_string()),
                }
            }
        }
    }

    Ok(())
}

fn assign(
    session: &EditorSession,
    control: &str,
    function_type: Option<String>,
    channel: Option<String>,
    number: Option<String>,
) {
    let id = match control.parse::<ControlId>() {
        Ok(id) => id,
        Err(e) => return print_error(&e.to_string()),
    };
    let proposed = session.proposed(id);
    let function_type =
        function_type.unwrap_or_else(|| proposed.function_type().as_str().to_string());
    let channel = channel.unwrap_or_else(|| proposed.channel().to_string());
    let number = number.unwrap_or_else(|| proposed.number().to_string());

    match session.assign_text(control, &function_type, &channel, &number) {
        Ok((id, assignment)) => println!(
            "{} {} ({}) → {}  {}",
            "✓".green(),
            id,
            id.hardware_label(),
            assignment.preview().bright_green(),
            assignment.to_string().dimmed()
        ),
        Err(e) => print_error(&e.to_string()),
    }
}

fn confirm(rl: &mut DefaultEditor, question: &str) -> Result<bool> {
    match rl.readline(&format!("{} [y/N] ", question.yellow())) {
        Ok(answer) => Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")),
        Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

fn print_error(message: &str) {
    println!("{} {}", "error:".red().bold(), message);
}

fn print_help() {
    println!("\n{}", "Commands:".bold());
    for (usage, description) in command::HELP {
        println!("  {:<44} {}", usage.yellow(), description);
    }
    println!(
        "\n  Controls accept ids (knob_1) or hardware labels (K1).\n  Types: Note, CC, PC (Program Change), PB (Pitch Bend).\n"
    );
}

/// Print the current layer with the display text of every control
fn print_layer(session: &EditorSession) {
    let layer = session.current_layer();
    let layers: Vec<String> = Layer::all()
        .map(|l| {
            let tag = format!("F{}", l.number());
            if l == layer {
                tag.black().on_bright_green().to_string()
            } else {
                tag.dimmed().to_string()
            }
        })
        .collect();
    println!("\n{}  {}", "Layer".bold(), layers.join(" "));

    let labels = session.layer_labels();
    for kind in ControlKind::all() {
        let row: Vec<String> = labels
            .iter()
            .filter(|(id, _)| id.kind() == *kind)
            .map(|(id, text)| {
                let text = if text.is_empty() {
                    "·".dimmed().to_string()
                } else if kind.shows_label() {
                    text.bright_green().to_string()
                } else {
                    text.green().to_string()
                };
                format!("{}={}", id.hardware_label().bright_white(), text)
            })
            .collect();
        println!("  {:<14} {}", kind.to_string().cyan(), row.join("  "));
    }
    println!();
}

/// Print every mappable control
pub fn print_controls() {
    println!("\n{}", "=== Controls ===".bold().cyan());
    for kind in ControlKind::all() {
        println!("\n{} ({})", kind.to_string().bold(), kind.count());
        for id in ControlId::of_kind(*kind) {
            println!("  {:<5} {}", id.hardware_label().yellow(), id);
        }
    }
    println!(
        "\n  Total controls: {}\n",
        ControlId::all().len().to_string().green()
    );
}

/// Print a loaded mapping document layer by layer
pub fn print_document(store: &MappingStore) {
    if store.is_empty() {
        println!("{}", "No assignments".dimmed());
        return;
    }
    for layer in store.populated_layers() {
        println!("\n{} {}", "Layer".bold(), layer.to_string().bold().cyan());
        for (id, assignment) in store.all_for_layer(layer) {
            println!(
                "  {:<5} {:<10} {:<9} {}",
                id.hardware_label().yellow(),
                id.to_string(),
                assignment.preview().green(),
                assignment.to_string().dimmed()
            );
        }
    }
    println!();
}

pub fn print_load_report(report: &LoadReport) {
    println!(
        "{} Loaded {} mappings on {} layers from {}",
        "✓".green(),
        report.loaded,
        report.layers.len(),
        report.path.display().to_string().bright_white()
    );
    for skipped in &report.skipped {
        println!("  {} {}", "skipped:".yellow(), skipped);
    }
}
