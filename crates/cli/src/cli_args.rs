//! Command-line argument parsing.
//!
//! This module defines the command-line interface structure using the `clap`
//! crate, and how the flags override values from the settings file.

use clap::Parser;
use script_monitor_core::config::Settings;

/// Command-line arguments for the `smon` binary.
///
/// # Examples
///
/// ```rust
/// use clap::Parser;
/// use script_monitor_cli::cli_args::Args;
///
/// let args = Args::parse_from(["smon", "weather", "-a", "city=Oslo"]);
/// assert_eq!(args.script, Some("weather".to_string()));
/// ```
#[derive(Parser, Debug)] // requires `derive` feature
#[command(term_width = 0)] // Just to make testing across clap features easier
#[allow(clippy::struct_excessive_bools)] // silence clippy's warning on this struct
pub struct Args {
    /// Path to the settings file YAML.
    ///
    /// If not provided, defaults to `~/.script-monitor/config.yml`.
    #[arg(long, short = 'c')]
    pub config_path: Option<String>,

    /// Directory to load scripts from, overriding the settings file.
    #[arg(long, short = 'd')]
    pub scripts_dir: Option<String>,

    /// Interpreter executable to use instead of searching the configured
    /// candidates.
    #[arg(long, short = 'i')]
    pub interpreter: Option<String>,

    /// Wall-clock limit for a run, such as `90s` or `10m`.
    #[arg(long, short = 't')]
    pub timeout: Option<humantime::Duration>,

    /// List the available scripts and exit.
    #[arg(long, short = 'l', action)]
    pub list: bool,

    /// Only preview the script, print what it declares and exit.
    #[arg(long, short = 'p', action)]
    pub preview_only: bool,

    /// Run without prompting for argument values or confirmation.
    #[arg(long, short = 'f', action)]
    pub force: bool,

    /// Open monitor and found URLs in the default browser.
    #[arg(long, short = 'o', action)]
    pub open_urls: bool,

    /// Do not ring the terminal bell on script events.
    #[arg(long, short = 'q', action)]
    pub quiet: bool,

    /// The script to run: a 1-based index, a file name or part of a display
    /// name.
    ///
    /// If not provided, an interactive list is shown.
    #[arg(num_args(1))]
    pub script: Option<String>,

    /// Argument values for the script in the format name=value.
    ///
    /// Multiple values can be provided with repeated `-a` flags.
    ///
    /// # Examples
    /// ```bash
    /// smon deals -a query=laptop -a max_price=800
    /// ```
    #[arg(long = "arg", short = 'a', action = clap::ArgAction::Append)]
    pub arguments: Vec<String>,
}

impl Args {
    /// Applies the flags that override settings file values.
    pub fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(scripts_dir) = &self.scripts_dir {
            settings.scripts_directory.clone_from(scripts_dir);
        }

        if let Some(interpreter) = &self.interpreter {
            settings.interpreter.candidates = vec![interpreter.clone()];
        }

        if let Some(timeout) = self.timeout {
            settings.run_timeout = timeout.into();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_args_default_values() {
        let args = Args::parse_from(["smon"]);

        assert!(args.config_path.is_none());
        assert!(args.scripts_dir.is_none());
        assert!(args.interpreter.is_none());
        assert!(args.timeout.is_none());
        assert!(!args.list);
        assert!(!args.preview_only);
        assert!(!args.force);
        assert!(!args.open_urls);
        assert!(!args.quiet);
        assert!(args.script.is_none());
        assert!(args.arguments.is_empty());
    }

    #[test]
    fn test_args_short_flags() {
        let args = Args::parse_from([
            "smon",
            "-c",
            "/custom/config.yml",
            "-d",
            "/custom/scripts",
            "-i",
            "/usr/bin/python3",
            "-t",
            "90s",
            "-l",
            "-p",
            "-f",
            "-o",
            "-q",
        ]);

        assert_eq!(args.config_path, Some("/custom/config.yml".to_string()));
        assert_eq!(args.scripts_dir, Some("/custom/scripts".to_string()));
        assert_eq!(args.interpreter, Some("/usr/bin/python3".to_string()));
        assert_eq!(
            args.timeout.map(Duration::from),
            Some(Duration::from_secs(90))
        );
        assert!(args.list);
        assert!(args.preview_only);
        assert!(args.force);
        assert!(args.open_urls);
        assert!(args.quiet);
    }

    #[test]
    fn test_args_long_flags() {
        let args = Args::parse_from([
            "smon",
            "--config-path",
            "/custom/config.yml",
            "--scripts-dir",
            "/custom/scripts",
            "--interpreter",
            "/usr/bin/python3",
            "--timeout",
            "10m",
            "--list",
            "--preview-only",
            "--force",
            "--open-urls",
            "--quiet",
        ]);

        assert_eq!(args.config_path, Some("/custom/config.yml".to_string()));
        assert_eq!(args.scripts_dir, Some("/custom/scripts".to_string()));
        assert_eq!(
            args.timeout.map(Duration::from),
            Some(Duration::from_secs(600))
        );
        assert!(args.list);
        assert!(args.preview_only);
        assert!(args.force);
        assert!(args.open_urls);
        assert!(args.quiet);
    }

    #[test]
    fn test_args_script_and_arguments() {
        let args = Args::parse_from([
            "smon",
            "deals",
            "-a",
            "query=laptop",
            "--arg",
            "max_price=800",
        ]);

        assert_eq!(args.script, Some("deals".to_string()));
        assert_eq!(args.arguments, vec!["query=laptop", "max_price=800"]);
    }

    #[test]
    fn test_invalid_timeout_is_rejected() {
        let result = Args::try_parse_from(["smon", "--timeout", "soon"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_overrides_replace_settings() {
        let args = Args::parse_from([
            "smon",
            "-d",
            "/opt/scripts",
            "-i",
            "/opt/python/python3",
            "-t",
            "45s",
        ]);
        let mut settings = Settings::default();

        args.apply_overrides(&mut settings);

        assert_eq!(settings.scripts_directory, "/opt/scripts");
        assert_eq!(settings.interpreter.candidates, vec!["/opt/python/python3"]);
        assert_eq!(settings.run_timeout, Duration::from_secs(45));
    }

    #[test]
    fn test_no_overrides_keep_settings() {
        let args = Args::parse_from(["smon"]);
        let mut settings = Settings::default();
        let original = settings.clone();

        args.apply_overrides(&mut settings);

        assert_eq!(settings, original);
    }
}
