//! Script Monitor CLI Library
//!
//! This crate provides the terminal front end for script-monitor. It picks a
//! script, previews it, collects argument values, then runs it while printing
//! status lines and filled-in templates as the script reports events.
//!
//! # Key Features
//!
//! - **Interactive Script Selection**: Terminal list with fuzzy filtering
//! - **Direct Selection**: By index, file name or display name on the command line
//! - **Argument Input**: `-a name=value` flags or interactive prompts
//! - **Live Output**: Statuses and templates printed as events arrive
//! - **Notifications**: Terminal bell per event and optional URL opening
//!
//! # Architecture
//!
//! - [`cli_args`]: Command-line argument parsing and settings overrides
//! - [`script_selection`]: Interactive UI for script selection and confirmation
//! - [`arguments`]: Parsing of `name=value` argument values
//! - [`session`]: Drives the controller until a preview or run finishes
//! - [`output`]: Printing statuses, templates and summaries
//!
//! # Examples
//!
//! The CLI binary (`smon`) can be used in several ways:
//!
//! ```bash
//! # Interactive mode - shows script selection UI
//! smon
//!
//! # List scripts with their indexes
//! smon --list
//!
//! # Run a script by index, file name or display name
//! smon 2
//! smon deals -a query=laptop -a max_price=800
//!
//! # Only show what a script declares in its preview
//! smon --preview-only weather
//!
//! # Run without prompts, with a ten minute limit
//! smon --force --timeout 10m weather
//! ```

pub mod arguments;
pub mod bell;
pub mod browser;
pub mod cli_args;
pub mod output;
pub mod script_selection;
pub mod session;
