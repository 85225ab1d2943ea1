//! Classification of raw script output into structured events or status text.
//!
//! A line is structured only when it holds one complete JSON object. Nothing is
//! reassembled across lines, so pretty-printed JSON arrives as status text.

use serde_json::{Map, Value};

use crate::error::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum ClassifiedLine {
    /// A single well-formed JSON object.
    Structured(Map<String, Value>),
    /// Plain text to show verbatim.
    Status(String),
    /// Looked like a JSON object but failed to parse. `error` is the rendered
    /// [`Error::MalformedEvent`].
    Malformed { line: String, error: String },
}

/// Classifies one unit of script output.
///
/// Valid JSON whose top level is not an object (`42`, `"text"`, `[1]`) is
/// status text. Input starting with `{` that fails to parse is reported as
/// malformed so the caller can surface a parse error.
pub fn classify(line: &str) -> ClassifiedLine {
    match parse_line(line) {
        Ok(Value::Object(object)) => ClassifiedLine::Structured(object),
        Ok(_) => ClassifiedLine::Status(line.to_string()),
        Err(e) if line.trim_start().starts_with('{') => ClassifiedLine::Malformed {
            line: line.to_string(),
            error: e.to_string(),
        },
        Err(_) => ClassifiedLine::Status(line.to_string()),
    }
}

/// Parses one unit of output as JSON.
///
/// # Errors
///
/// Returns [`Error::MalformedEvent`] on a JSON syntax error.
pub fn parse_line(line: &str) -> Result<Value, Error> {
    Ok(serde_json::from_str(line)?)
}

/// Classifies the whole buffered stdout of a preview run as one unit.
pub fn classify_buffered(output: &str) -> ClassifiedLine {
    let trimmed = output.trim();
    match classify(trimmed) {
        ClassifiedLine::Status(_) => ClassifiedLine::Status(trimmed.to_string()),
        other => other,
    }
}
