//! Interactive script selection and user input handling.
//!
//! This module provides the terminal user interface of `smon` that runs before
//! a script starts: picking a script, entering argument values and confirming
//! the run.
//!
//! # User Interface
//!
//! The script list supports:
//! - Arrow keys or vim-style (j/k) navigation
//! - Enter to select a script
//! - Typing after `/` to filter scripts (fuzzy search or index)
//! - 'q' or Escape to quit

pub mod input;
pub mod matching;
pub mod types;
pub mod ui;

pub use input::{confirm_run, fill_argument_values, prompt_value};
pub use matching::{filter_displayed_indexes, find_script};
pub use types::{RunChoice, ScriptChoice};
pub use ui::prompt_for_script_choice;
