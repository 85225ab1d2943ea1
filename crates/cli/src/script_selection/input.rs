use std::io::{stdin, stdout, BufRead, Write};

use indexmap::IndexMap;
use script_monitor_core::error::Result;
use script_monitor_core::script_definitions::ArgumentField;

use super::types::RunChoice;

/// Prompts the user for an argument value.
///
/// An empty answer keeps `previous`, or leaves the argument unset when there
/// is none.
pub fn prompt_value(field: &ArgumentField, previous: Option<&str>) -> Result<String> {
    prompt_value_from(&mut stdin().lock(), field, previous)
}

fn prompt_value_from(
    input: &mut impl BufRead,
    field: &ArgumentField,
    previous: Option<&str>,
) -> Result<String> {
    match previous {
        Some(previous) => print!("Value for {field} [{previous}]: "),
        None => print!("Value for {field}: "),
    }
    stdout().flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    let read_value = line.trim();

    if read_value.is_empty() {
        return Ok(previous.unwrap_or_default().to_string());
    }

    Ok(read_value.to_string())
}

/// Asks for a value for every field, offering values already known as
/// defaults.
pub fn fill_argument_values(
    fields: &[ArgumentField],
    existing: &IndexMap<String, String>,
) -> Result<IndexMap<String, String>> {
    let mut input = stdin().lock();
    fill_argument_values_from(&mut input, fields, existing)
}

fn fill_argument_values_from(
    input: &mut impl BufRead,
    fields: &[ArgumentField],
    existing: &IndexMap<String, String>,
) -> Result<IndexMap<String, String>> {
    let mut values = existing.clone();

    for field in fields {
        let previous = existing.get(&field.name).map(String::as_str);
        let value = prompt_value_from(input, field, previous)?;
        values.insert(field.name.clone(), value);
    }

    Ok(values)
}

/// Confirms with the user whether the script should be run
pub fn confirm_run(has_arguments: bool) -> Result<RunChoice> {
    confirm_run_from(&mut stdin().lock(), has_arguments)
}

fn confirm_run_from(input: &mut impl BufRead, has_arguments: bool) -> Result<RunChoice> {
    loop {
        let prompt_change_arguments = if has_arguments {
            "/[c]hange arguments"
        } else {
            ""
        };

        print!("Run the script? ([Y]es/[n]o{prompt_change_arguments}): ");
        stdout().flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(RunChoice::No);
        }

        match line.trim().to_lowercase().as_str() {
            "y" | "" => return Ok(RunChoice::Yes),
            "n" => return Ok(RunChoice::No),
            "c" if has_arguments => return Ok(RunChoice::ChangeArguments),
            _ => {}
        }
    }
}
