use std::fmt::Display;
use std::io::{stdout, Write};
use std::time::Duration;

use crossterm::cursor::MoveTo;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::style::Color::{DarkBlue, DarkGreen, Reset, Yellow};
use crossterm::style::{Attribute, Color, Print, SetAttribute, SetBackgroundColor, SetForegroundColor};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::{cursor, event, execute, queue, terminal, ExecutableCommand};
use script_monitor_core::error::Result;
use script_monitor_core::script_definitions::ScriptDescriptor;

use super::matching::filter_displayed_indexes;
use super::types::CycleDirection::{Down, Up};
use super::types::{CycleDirection, ScriptChoice, UiState};

struct RawModeGuard;

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        // Disable raw mode on drop
        let _ = disable_raw_mode();
        let _ = stdout().execute(LeaveAlternateScreen);
    }
}

/// What a key press asks the list to do.
#[derive(Debug, PartialEq, Eq)]
enum KeyOutcome {
    Choose(ScriptChoice),
    Update(UiState),
    Move(CycleDirection),
    Bell,
    Nothing,
}

/// Prompts the user to choose a script from the list
pub fn prompt_for_script_choice(scripts: &[ScriptDescriptor]) -> Result<ScriptChoice> {
    let mut stdout = stdout();

    stdout.execute(EnterAlternateScreen)?;
    enable_raw_mode()?;
    let _raw_mode_guard = RawModeGuard; // When this goes out of scope, raw mode is disabled

    let (width, height) = terminal::size()?;
    let mut ui_state = UiState::new(width, height);
    let mut indexes_to_display = filter_displayed_indexes(scripts, &ui_state.filter_text);
    let mut needs_redraw = true;

    loop {
        if needs_redraw {
            indexes_to_display = filter_displayed_indexes(scripts, &ui_state.filter_text);
            redraw_ui(&ui_state, scripts, &indexes_to_display)?;
            needs_redraw = false;
        }

        if !event::poll(Duration::from_millis(500))? {
            continue;
        }

        let new_state = match event::read()? {
            Event::Key(key_event) => {
                match handle_key_event(key_event, &ui_state, &indexes_to_display) {
                    KeyOutcome::Choose(choice) => return Ok(choice),
                    KeyOutcome::Update(state) => Some(state),
                    KeyOutcome::Move(direction) => {
                        Some(ui_state.moved(direction, indexes_to_display.len()))
                    }
                    KeyOutcome::Bell => {
                        execute!(stdout, Print("\x07"))?;
                        None
                    }
                    KeyOutcome::Nothing => None,
                }
            }
            Event::Resize(width, height) => {
                let mut state = ui_state.clone();
                state.viewport.width = width;
                state.viewport.height = height.saturating_sub(2);
                state.viewport.offset = 0;
                state.selected_index = 0;
                Some(state)
            }
            _ => None,
        };

        if let Some(new_state) = new_state {
            if new_state != ui_state {
                ui_state = new_state;
                needs_redraw = true;
            }
        }
    }
}

/// Handle keyboard events in the script selection UI
fn handle_key_event(
    key_event: KeyEvent,
    ui_state: &UiState,
    indexes_to_display: &[usize],
) -> KeyOutcome {
    match key_event.code {
        KeyCode::Up => KeyOutcome::Move(Up),
        KeyCode::Down => KeyOutcome::Move(Down),
        KeyCode::Enter => match indexes_to_display.get(ui_state.selected_index) {
            Some(index) => KeyOutcome::Choose(ScriptChoice::Index(*index)),
            None => KeyOutcome::Bell,
        },
        KeyCode::Char('c') if key_event.modifiers.contains(KeyModifiers::CONTROL) => {
            KeyOutcome::Choose(ScriptChoice::Quit)
        }
        KeyCode::Backspace if ui_state.is_filtering => {
            let mut filter_text = ui_state.filter_text.clone();
            filter_text.pop();
            KeyOutcome::Update(ui_state.filtered(filter_text))
        }
        KeyCode::Char(c) if ui_state.is_filtering => {
            let mut filter_text = ui_state.filter_text.clone();
            filter_text.push(c);
            KeyOutcome::Update(ui_state.filtered(filter_text))
        }
        KeyCode::Esc if ui_state.is_filtering => {
            let mut updated_state = ui_state.filtered(String::new());
            updated_state.is_filtering = false;
            KeyOutcome::Update(updated_state)
        }
        KeyCode::Char('/') => {
            let mut updated_state = ui_state.clone();
            updated_state.is_filtering = true;
            KeyOutcome::Update(updated_state)
        }
        KeyCode::Char('k') => KeyOutcome::Move(Up),
        KeyCode::Char('j') => KeyOutcome::Move(Down),
        KeyCode::Char('q') | KeyCode::Esc => KeyOutcome::Choose(ScriptChoice::Quit),
        _ => KeyOutcome::Nothing,
    }
}

fn redraw_ui(ui_state: &UiState, scripts: &[ScriptDescriptor], indexes_to_display: &[usize]) -> Result<()> {
    let mut stdout = stdout();

    queue!(stdout, Clear(ClearType::All), MoveTo(0, 0))?;

    print_header(ui_state, indexes_to_display.len())?;

    if indexes_to_display.is_empty() {
        queue!(
            stdout,
            MoveTo(0, 1),
            SetForegroundColor(Color::Red),
            Print("No matching scripts!".to_string()),
            SetAttribute(Attribute::Reset),
            cursor::MoveToNextLine(1)
        )?;
    } else {
        print_scripts_with_selection(ui_state, scripts, indexes_to_display)?;
    }

    if ui_state.is_filtering {
        queue!(
            stdout,
            SetAttribute(Attribute::Bold),
            Print(format!("Filter: {}", ui_state.filter_text)),
            SetAttribute(Attribute::Reset)
        )?;
    }

    stdout.flush()?;
    Ok(())
}

/// Print the header for the script selection UI
fn print_header(ui_state: &UiState, display_count: usize) -> Result<()> {
    let mut stdout = stdout();

    let left_padding = "  ";
    let instructions = if ui_state.is_filtering {
        "<esc>: Stop Filtering".to_string()
    } else {
        format!(
            "/: Begin Filtering   |   {}/{}   |   q: Quit",
            pad_to_width_of(ui_state.selected_index + 1, display_count),
            display_count
        )
    };

    let used = left_padding.len() + instructions.len();
    let right_padding = " ".repeat(usize::from(ui_state.viewport.width).saturating_sub(used));

    queue!(
        stdout,
        MoveTo(0, 0),
        SetBackgroundColor(DarkGreen),
        Print(left_padding),
        Print(instructions),
        Print(right_padding),
        SetBackgroundColor(Reset),
        SetForegroundColor(Reset),
    )?;

    Ok(())
}

/// Pad a value to match the width of the largest value
fn pad_to_width_of<T: Display>(value: T, max_number: usize) -> String {
    let width = max_number.to_string().len();
    format!("{:>width$}", value.to_string())
}

/// Print the visible scripts with the selected one highlighted
fn print_scripts_with_selection(
    ui_state: &UiState,
    scripts: &[ScriptDescriptor],
    indexes_to_display: &[usize],
) -> Result<()> {
    let mut stdout = stdout();
    let viewport = &ui_state.viewport;

    let visible = indexes_to_display
        .iter()
        .enumerate()
        .skip(viewport.offset)
        .take(usize::from(viewport.height));

    for (row, (position, script_index)) in (1u16..).zip(visible) {
        let is_selected = position == ui_state.selected_index;
        let content = format!(
            "[{}] {}",
            pad_to_width_of(script_index + 1, scripts.len()),
            scripts[*script_index]
        );
        let padding = " ".repeat(usize::from(viewport.width).saturating_sub(content.len()));

        queue!(stdout, MoveTo(0, row), Clear(ClearType::CurrentLine))?;
        if is_selected {
            queue!(
                stdout,
                SetAttribute(Attribute::Bold),
                SetBackgroundColor(DarkBlue),
                SetForegroundColor(Yellow),
            )?;
        }
        queue!(
            stdout,
            Print(content),
            Print(padding),
            SetAttribute(Attribute::Reset),
            SetBackgroundColor(Reset),
            SetForegroundColor(Reset),
            cursor::MoveToNextLine(1)
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_enter_chooses_filtered_position() {
        let state = UiState::new(80, 10);
        assert_eq!(
            handle_key_event(key(KeyCode::Enter), &state, &[4, 7]),
            KeyOutcome::Choose(ScriptChoice::Index(4))
        );
        assert_eq!(
            handle_key_event(key(KeyCode::Enter), &state, &[]),
            KeyOutcome::Bell
        );
    }

    #[test]
    fn test_filtering_keys() {
        let state = UiState::new(80, 10);
        let KeyOutcome::Update(filtering) = handle_key_event(key(KeyCode::Char('/')), &state, &[0])
        else {
            panic!("Expected filtering to start");
        };
        assert!(filtering.is_filtering);

        // While filtering, letters are text rather than commands
        let KeyOutcome::Update(typed) = handle_key_event(key(KeyCode::Char('q')), &filtering, &[0])
        else {
            panic!("Expected filter text to change");
        };
        assert_eq!(typed.filter_text, "q");

        let KeyOutcome::Update(stopped) = handle_key_event(key(KeyCode::Esc), &typed, &[0]) else {
            panic!("Expected filtering to stop");
        };
        assert!(!stopped.is_filtering);
        assert!(stopped.filter_text.is_empty());
    }

    #[test]
    fn test_navigation_and_quit_keys() {
        let state = UiState::new(80, 10);
        assert_eq!(handle_key_event(key(KeyCode::Char('j')), &state, &[0]), KeyOutcome::Move(Down));
        assert_eq!(handle_key_event(key(KeyCode::Up), &state, &[0]), KeyOutcome::Move(Up));
        assert_eq!(
            handle_key_event(key(KeyCode::Char('q')), &state, &[0]),
            KeyOutcome::Choose(ScriptChoice::Quit)
        );
        assert_eq!(
            handle_key_event(
                KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
                &state,
                &[0]
            ),
            KeyOutcome::Choose(ScriptChoice::Quit)
        );
    }

    #[test]
    fn test_pad_to_width_of() {
        assert_eq!(pad_to_width_of(3, 120), "  3");
        assert_eq!(pad_to_width_of(42, 9), "42");
    }
}
