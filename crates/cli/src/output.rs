//! Printing controller state and signals to the terminal.

use std::io::{stdout, Write};

use crossterm::queue;
use crossterm::style::{Attribute, Color, Print, SetAttribute, SetForegroundColor};
use indexmap::IndexSet;
use itertools::Itertools;
use log::debug;
use script_monitor_core::controller::{SessionController, StatusLine, UiSignal};
use script_monitor_core::error::Result;
use script_monitor_core::interpolation::placeholders;
use script_monitor_core::script_definitions::{ScriptDescriptor, TemplateSentence};

use crate::browser::open_url;

/// Prints the numbered script list shown by `smon --list`.
pub fn print_script_list(scripts: &[ScriptDescriptor]) {
    let width = scripts.len().to_string().len();
    for (index, script) in scripts.iter().enumerate() {
        println!("[{:>width$}] {script}", index + 1);
    }
}

/// Numbered lines for the current templates.
pub fn template_lines(templates: &[TemplateSentence]) -> Vec<String> {
    templates
        .iter()
        .enumerate()
        .map(|(index, template)| format!("  {}. {}", index + 1, template.formatted_text()))
        .collect()
}

/// Placeholders still unresolved across all templates, in order of first
/// appearance.
pub fn pending_placeholders(templates: &[TemplateSentence]) -> IndexSet<String> {
    templates
        .iter()
        .flat_map(|template| placeholders(template.formatted_text()))
        .collect()
}

fn status_color(status: &StatusLine) -> Color {
    if status.text.starts_with("Error") || status.text.starts_with("Script timed out") {
        Color::Red
    } else {
        Color::Reset
    }
}

/// Prints what a preview declared: tags, templates and argument fields.
pub fn print_preview_summary(controller: &SessionController) -> Result<()> {
    let mut stdout = stdout();

    if let Some(script) = controller.script() {
        queue!(
            stdout,
            SetAttribute(Attribute::Bold),
            Print(format!("{}\n", script.display_name)),
            SetAttribute(Attribute::Reset),
        )?;
    }

    if !controller.tags().is_empty() {
        println!("Tags: {}", controller.tags().iter().join(", "));
    }

    if !controller.fields().is_empty() {
        println!("Arguments:");
        for field in controller.fields() {
            println!("  {field}");
        }
    }

    if !controller.templates().is_empty() {
        println!("Templates:");
        for line in template_lines(controller.templates()) {
            println!("{line}");
        }

        let pending = pending_placeholders(controller.templates());
        if !pending.is_empty() {
            println!("Waiting for: {}", pending.iter().join(", "));
        }
    }

    stdout.flush()?;
    Ok(())
}

/// Renders signals as terminal output.
#[derive(Debug, Clone, Copy, Default)]
pub struct Printer {
    open_urls: bool,
}

impl Printer {
    pub fn new(open_urls: bool) -> Self {
        Self { open_urls }
    }

    /// Prints the given signals. Templates are printed at most once per batch,
    /// after the statuses that came with them.
    pub fn print_signals(&self, controller: &SessionController, signals: &[UiSignal]) -> Result<()> {
        let mut stdout = stdout();
        let mut templates_changed = false;

        for signal in signals {
            match signal {
                UiSignal::Status(status) => {
                    queue!(
                        stdout,
                        SetForegroundColor(status_color(status)),
                        Print(format!("{status}\n")),
                        SetForegroundColor(Color::Reset),
                    )?;
                }
                UiSignal::TemplatesReplaced | UiSignal::TemplatesUpdated => {
                    templates_changed = true;
                }
                UiSignal::DisplayNameChanged(name) => {
                    queue!(stdout, Print(format!("Script: {name}\n")))?;
                }
                UiSignal::MonitorUrlChanged(url) => {
                    queue!(stdout, Print(format!("Monitoring: {url}\n")))?;
                    if self.open_urls {
                        open_url(url);
                    }
                }
                UiSignal::FoundUrlChanged(url) => {
                    queue!(
                        stdout,
                        SetForegroundColor(Color::Green),
                        Print(format!("Found: {url}\n")),
                        SetForegroundColor(Color::Reset),
                    )?;
                    if self.open_urls {
                        open_url(url);
                    }
                }
                UiSignal::StateChanged(state) => debug!("Session state: {:?}", state),
                UiSignal::TagsReplaced | UiSignal::FieldsReplaced => {}
            }
        }

        if templates_changed && !controller.templates().is_empty() {
            for line in template_lines(controller.templates()) {
                queue!(stdout, Print(format!("{line}\n")))?;
            }
        }

        stdout.flush()?;
        Ok(())
    }
}
