//! Script discovery for the scripts directory.
//!
//! Scripts are the `*.py` files directly inside the directory. Their display
//! names come from an optional `display_names.json` mapping of file path to
//! name, which this crate only ever reads.

use std::collections::HashMap;
use std::fs::{self, File};
use std::path::Path;

use log::{debug, info};

use crate::error::{Error, Result};
use crate::script_definitions::ScriptDescriptor;

pub const DISPLAY_NAMES_FILE: &str = "display_names.json";
const SCRIPT_EXTENSION: &str = "py";

fn get_reader(file_description: &str, path: &Path) -> Result<File> {
    File::open(path).map_err(|e| {
        Error::io_error(
            file_description.to_string(),
            path.display().to_string(),
            e,
        )
    })
}

/// Creates the scripts directory if it does not exist yet.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_scripts_directory(directory: &Path) -> Result<()> {
    if directory.is_dir() {
        return Ok(());
    }

    info!("Creating scripts directory `{}`", directory.display());
    fs::create_dir_all(directory).map_err(|e| {
        Error::io_error(
            "scripts directory".to_string(),
            directory.display().to_string(),
            e,
        )
    })
}

/// Reads the `file path -> display name` mapping stored next to the scripts.
///
/// Returns an empty map if the file doesn't exist.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or is not a JSON
/// object of strings.
pub fn load_display_names(directory: &Path) -> Result<HashMap<String, String>> {
    let path = directory.join(DISPLAY_NAMES_FILE);
    if !path.exists() {
        return Ok(HashMap::new());
    }

    let reader = get_reader("display names", &path)?;
    serde_json::from_reader(reader).map_err(|e| {
        Error::json_error(
            "display names".to_string(),
            path.display().to_string(),
            e,
        )
    })
}

/// Lists the scripts in `directory`, sorted by file name.
///
/// A missing directory yields an empty list.
///
/// # Errors
///
/// Returns an error if the directory or the display name mapping cannot be
/// read.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use script_monitor_core::catalog::list_scripts;
///
/// let scripts = list_scripts(Path::new("/home/me/.script-monitor/scripts"))?;
/// println!("Loaded {} scripts", scripts.len());
/// # Ok::<(), script_monitor_core::error::Error>(())
/// ```
pub fn list_scripts(directory: &Path) -> Result<Vec<ScriptDescriptor>> {
    if !directory.is_dir() {
        debug!("Scripts directory `{}` does not exist", directory.display());
        return Ok(Vec::new());
    }

    let display_names = load_display_names(directory)?;

    let entries = fs::read_dir(directory).map_err(|e| {
        Error::io_error(
            "scripts directory".to_string(),
            directory.display().to_string(),
            e,
        )
    })?;

    let mut scripts = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let is_script = path.is_file()
            && path
                .extension()
                .is_some_and(|extension| extension == SCRIPT_EXTENSION);
        if !is_script {
            continue;
        }

        let display_name = display_names
            .get(path.to_string_lossy().as_ref())
            .cloned();
        scripts.push(ScriptDescriptor::from_path(&path, display_name));
    }

    scripts.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    info!("Loaded {} scripts", scripts.len());

    Ok(scripts)
}
