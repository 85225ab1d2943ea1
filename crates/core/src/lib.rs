//! Script Monitor Core Library
//!
//! This crate provides the core functionality for script-monitor, a tool that
//! runs user-supplied monitoring scripts, watches their output and turns the
//! JSON events they print into filled-in template sentences.
//!
//! # Key Features
//!
//! - **Script Catalog**: Discover scripts and their display names in a directory
//! - **Process Sessions**: Spawn, stream, time out and kill script processes
//! - **Event Protocol**: Decode the JSON objects scripts print on stdout
//! - **Template Interpolation**: Fill `{placeholder}` tokens from event values
//! - **Session Controller**: One state machine for preview, run and stop
//! - **Error Handling**: Comprehensive error types for all failure modes
//!
//! # Examples
//!
//! Previewing the first script in the configured directory:
//!
//! ```no_run
//! use script_monitor_core::catalog::list_scripts;
//! use script_monitor_core::config::{get_config_path, load_settings};
//! use script_monitor_core::controller::SessionController;
//! use script_monitor_core::notification::NoopNotifier;
//!
//! # async fn preview() -> script_monitor_core::error::Result<()> {
//! let settings = load_settings(&get_config_path(&None))?;
//! let scripts = list_scripts(&settings.scripts_directory())?;
//!
//! let mut controller = SessionController::new(settings, NoopNotifier);
//! if let Some(script) = scripts.into_iter().next() {
//!     controller.select_script(script).await?;
//!     controller.run_until_idle().await;
//!     for template in controller.templates() {
//!         println!("{template}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod arguments;
pub mod catalog;
pub mod classify;
pub mod config;
pub mod controller;
pub mod error;
pub mod interpolation;
pub mod notification;
pub mod process;
pub mod protocol;
pub mod script_definitions;
