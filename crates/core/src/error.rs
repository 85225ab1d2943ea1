use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Interpreter executable not found. Looked in: {}", .searched.join(", "))]
    ExecutableNotFound { searched: Vec<String> },

    #[error("Failed to start `{}`: {}", .program, .original)]
    SpawnFailed {
        program: String,
        original: std::io::Error,
    },

    #[error("Script exited with non-success code: {}", .0)]
    ProcessExitNonZero(i32),

    #[error("Script timed out after {:?}", .0)]
    TimedOut(std::time::Duration),

    #[error("Error parsing JSON: {}", .0)]
    MalformedEvent(#[from] serde_json::Error),

    #[error("Notification failed: {}", .0)]
    NotificationFailed(String),

    #[error("Error {} {} file at `{}`: {}", .action, .file_description, .path, .original)]
    Yaml {
        action: String,
        file_description: String,
        path: String,
        original: serde_yaml::Error,
    },

    #[error("Error reading {} file at `{}`: {}", .file_description, .path, .original)]
    Json {
        file_description: String,
        path: String,
        original: serde_json::Error,
    },

    #[error("IO error with {} file at path `{}`: {}", .file_description, .path, .original)]
    Io {
        file_description: String,
        path: String,
        original: std::io::Error,
    },

    #[error("STDIO error: {}", .0)]
    Stdio(#[from] std::io::Error),

    #[error("No script matches `{}`", .0)]
    ScriptNotFound(String),

    #[error("No scripts were found in `{}`", .0)]
    EmptyCatalog(String),

    #[error("Template index {} is out of range ({} templates)", .0, .1)]
    TemplateIndex(usize, usize),

    #[error("No script selected")]
    NoScriptSelected,

    #[error("Invalid argument `{}`: expected the form name=value", .0)]
    ArgumentFormat(String),

    #[error("The script does not declare an argument named `{}`", .0)]
    UnknownArgument(String),
}

impl Error {
    pub fn yaml_error(
        action: String,
        file_description: String,
        path: String,
        original: serde_yaml::Error,
    ) -> Self {
        Self::Yaml {
            action,
            file_description,
            path,
            original,
        }
    }

    pub fn json_error(file_description: String, path: String, original: serde_json::Error) -> Self {
        Self::Json {
            file_description,
            path,
            original,
        }
    }

    pub fn io_error(file_description: String, path: String, original: std::io::Error) -> Self {
        Self::Io {
            file_description,
            path,
            original,
        }
    }

    pub fn spawn_failed(program: String, original: std::io::Error) -> Self {
        Self::SpawnFailed { program, original }
    }
}
