//! Argument values given on the command line with `-a name=value`.

use indexmap::IndexMap;
use script_monitor_core::error::Error::ArgumentFormat;
use script_monitor_core::error::Result;
use script_monitor_core::script_definitions::ArgumentField;

/// Parses `name=value` pairs, keeping the order they were given in.
///
/// Only the first `=` separates name and value, so values may contain `=`.
/// A later pair for the same name replaces the earlier one.
///
/// # Errors
///
/// Returns [`ArgumentFormat`] if a pair has no `=` or an empty name.
///
/// # Examples
///
/// ```rust
/// use script_monitor_cli::arguments::parse_named_values;
///
/// let values = parse_named_values(&["query=a=b".to_string()]).unwrap();
/// assert_eq!(values.get("query"), Some(&"a=b".to_string()));
/// ```
pub fn parse_named_values(pairs: &[String]) -> Result<IndexMap<String, String>> {
    let mut values = IndexMap::new();

    for pair in pairs {
        let Some((name, value)) = pair.split_once('=') else {
            return Err(ArgumentFormat(pair.to_string()));
        };

        let name = name.trim();
        if name.is_empty() {
            return Err(ArgumentFormat(pair.to_string()));
        }

        values.insert(name.to_string(), value.to_string());
    }

    Ok(values)
}

/// Whether the user should be asked for argument values before a run.
///
/// Never prompts when forced or when the script declares no fields, or when
/// every field already has a value from the command line.
pub fn should_prompt_for_arguments(
    fields: &[ArgumentField],
    given: &IndexMap<String, String>,
    force: bool,
) -> bool {
    if force || fields.is_empty() {
        return false;
    }

    fields.iter().any(|field| !given.contains_key(&field.name))
}
