//! Configuration for script-monitor.
//!
//! Settings are read from an optional YAML file. Paths may contain shell
//! variables like `~` and are expanded when resolved.

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default path for the settings file
const DEFAULT_CONFIG_PATH: &str = "~/.script-monitor/config.yml";
/// Default directory scanned for scripts
const DEFAULT_SCRIPTS_DIRECTORY: &str = "~/.script-monitor/scripts";

/// Wall-clock limit for a run, measured from process start.
pub const DEFAULT_RUN_TIMEOUT: Duration = Duration::from_secs(5 * 60);
/// How long `stop` waits for a killed process to exit.
pub const DEFAULT_STOP_GRACE: Duration = Duration::from_secs(2);

#[cfg(windows)]
const INTERPRETER_FILE_NAME: &str = "python.exe";
#[cfg(not(windows))]
const INTERPRETER_FILE_NAME: &str = "python3";

/// How the script interpreter is located and launched.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct InterpreterConfig {
    /// Candidate executable paths, tried in order.
    pub candidates: Vec<String>,
    /// Point `PYTHONHOME`/`PYTHONPATH` at the interpreter's directory, for a
    /// runtime bundled next to the application.
    pub bundled_runtime: bool,
    /// Extra environment variables for every script.
    pub environment: HashMap<String, String>,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            candidates: default_interpreter_candidates(),
            bundled_runtime: true,
            environment: HashMap::new(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub scripts_directory: String,
    pub interpreter: InterpreterConfig,
    #[serde(with = "humantime_serde")]
    pub run_timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub stop_grace: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            scripts_directory: DEFAULT_SCRIPTS_DIRECTORY.to_string(),
            interpreter: InterpreterConfig::default(),
            run_timeout: DEFAULT_RUN_TIMEOUT,
            stop_grace: DEFAULT_STOP_GRACE,
        }
    }
}

impl Settings {
    pub fn scripts_directory(&self) -> PathBuf {
        PathBuf::from(expand_path(&self.scripts_directory))
    }

    /// Returns the first interpreter candidate that exists on disk.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ExecutableNotFound`] listing every path tried.
    pub fn resolve_interpreter(&self) -> Result<PathBuf> {
        resolve_executable(&self.interpreter.candidates)
    }
}

/// Candidate interpreter locations: the development tree above the build
/// output, next to the executable, the debug output layout, and the user's
/// home directory.
fn default_interpreter_candidates() -> Vec<String> {
    let mut candidates = Vec::new();

    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        if let Some(dev_root) = exe_dir.ancestors().nth(3) {
            candidates.push(interpreter_in(dev_root));
        }
        candidates.push(interpreter_in(&exe_dir));
        candidates.push(interpreter_in(&exe_dir.join("..").join("..").join("..").join("..")));
    }

    candidates.push(format!("~/.script-monitor/python/{INTERPRETER_FILE_NAME}"));
    candidates
}

fn interpreter_in(root: &Path) -> String {
    root.join("python")
        .join(INTERPRETER_FILE_NAME)
        .to_string_lossy()
        .to_string()
}

/// Returns the first of `candidates` that exists, after `~` expansion.
///
/// # Errors
///
/// Returns [`Error::ExecutableNotFound`] if none of them exist.
pub fn resolve_executable(candidates: &[String]) -> Result<PathBuf> {
    let mut searched = Vec::new();

    for candidate in candidates {
        let expanded = expand_path(candidate);
        if Path::new(&expanded).is_file() {
            debug!("Using interpreter `{}`", expanded);
            return Ok(PathBuf::from(expanded));
        }
        searched.push(expanded);
    }

    Err(Error::ExecutableNotFound { searched })
}

/// Resolves the settings file path.
///
/// If a custom path is provided, uses that path. Otherwise, uses the default
/// path. Shell expansions like `~` are resolved.
///
/// # Examples
///
/// ```
/// use script_monitor_core::config::get_config_path;
///
/// let default_path = get_config_path(&None);
/// let custom_path = get_config_path(&Some("/path/to/config.yml".to_string()));
/// assert_eq!(custom_path, "/path/to/config.yml");
/// ```
pub fn get_config_path(config_path_arg: &Option<String>) -> String {
    let config_path = match config_path_arg {
        Some(config_path) => config_path,
        None => DEFAULT_CONFIG_PATH,
    };

    expand_path(config_path)
}

pub fn expand_path(path: &str) -> String {
    shellexpand::tilde(path).to_string()
}

/// Loads settings from `path`, falling back to defaults when the file does not
/// exist.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or is not valid YAML.
pub fn load_settings(path: &str) -> Result<Settings> {
    if !Path::new(path).exists() {
        debug!("No settings file at `{}`, using defaults", path);
        return Ok(Settings::default());
    }

    let reader = File::open(path)
        .map_err(|e| Error::io_error("settings".to_string(), path.to_string(), e))?;

    // This can't be shortcut with ? as there is an error/some confusion with serde wanting to deserialize the error
    let settings: serde_yaml::Result<Settings> = serde_yaml::from_reader(reader);

    settings.map_err(|e| {
        Error::yaml_error(
            "reading".to_string(),
            "settings".to_string(),
            path.to_string(),
            e,
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_get_config_path_with_custom_path() {
        let custom_path = Some("/custom/path/config.yml".to_string());
        assert_eq!(get_config_path(&custom_path), "/custom/path/config.yml");
    }

    #[test]
    fn test_get_config_path_with_none() {
        let result = get_config_path(&None);
        // Should expand the tilde in the default path
        assert!(result.ends_with("config.yml"));
        assert!(!result.starts_with('~'));
    }

    #[test]
    fn test_load_settings_missing_file_gives_defaults() {
        let settings = load_settings("/this/path/does/not/exist.yml").unwrap();
        assert_eq!(settings.run_timeout, Duration::from_secs(300));
        assert_eq!(settings.stop_grace, Duration::from_secs(2));
        assert!(settings.interpreter.bundled_runtime);
        assert!(!settings.interpreter.candidates.is_empty());
    }

    #[test]
    fn test_load_settings_partial_file() {
        let yaml_content = r#"
scripts_directory: "/opt/scripts"
run_timeout: 30s
interpreter:
  candidates: ["/usr/bin/python3"]
  bundled_runtime: false
  environment:
    API_REGION: "eu"
"#;
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{yaml_content}").unwrap();

        let settings = load_settings(temp_file.path().to_str().unwrap()).unwrap();

        assert_eq!(settings.scripts_directory(), PathBuf::from("/opt/scripts"));
        assert_eq!(settings.run_timeout, Duration::from_secs(30));
        assert_eq!(settings.stop_grace, DEFAULT_STOP_GRACE);
        assert_eq!(settings.interpreter.candidates, vec!["/usr/bin/python3"]);
        assert!(!settings.interpreter.bundled_runtime);
        assert_eq!(
            settings.interpreter.environment.get("API_REGION"),
            Some(&"eu".to_string())
        );
    }

    #[test]
    fn test_load_settings_invalid_yaml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "run_timeout: [").unwrap();

        let result = load_settings(temp_file.path().to_str().unwrap());
        assert!(matches!(result, Err(Error::Yaml { .. })));
    }

    #[test]
    fn test_resolve_executable_picks_first_existing() {
        let existing = NamedTempFile::new().unwrap();
        let existing_path = existing.path().to_str().unwrap().to_string();

        let candidates = vec![
            "/this/interpreter/does/not/exist".to_string(),
            existing_path.clone(),
        ];
        assert_eq!(
            resolve_executable(&candidates).unwrap(),
            PathBuf::from(existing_path)
        );
    }

    #[test]
    fn test_resolve_executable_none_exist() {
        let candidates = vec!["/nope/a".to_string(), "/nope/b".to_string()];
        match resolve_executable(&candidates) {
            Err(Error::ExecutableNotFound { searched }) => assert_eq!(searched.len(), 2),
            other => panic!("Expected ExecutableNotFound, got {other:?}"),
        }
    }
}
