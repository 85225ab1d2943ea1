use std::collections::HashMap;

use crate::script_definitions::ArgumentField;

/// Builds the `--name value` tokens passed to a run.
///
/// A field contributes only when its value is not blank and is not the
/// placeholder hint shown to the user; everything else is left to the script's
/// own defaults. Tokens follow the order of `fields`.
pub fn build_arguments<S: std::hash::BuildHasher>(
    fields: &[ArgumentField],
    values: &HashMap<String, String, S>,
) -> Vec<String> {
    let mut arguments = Vec::new();

    for field in fields {
        let Some(value) = values.get(&field.name) else {
            continue;
        };

        if value.trim().is_empty() || *value == field.placeholder_hint {
            continue;
        }

        arguments.push(format!("--{}", field.name));
        arguments.push(value.clone());
    }

    arguments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str, hint: &str) -> ArgumentField {
        ArgumentField {
            name: name.to_string(),
            placeholder_hint: hint.to_string(),
        }
    }

    #[test]
    fn test_build_arguments_in_field_order() {
        let fields = vec![field("city", "City name"), field("units", "metric")];
        let values = HashMap::from([
            ("units".to_string(), "imperial".to_string()),
            ("city".to_string(), "New York".to_string()),
        ]);

        assert_eq!(
            build_arguments(&fields, &values),
            vec!["--city", "New York", "--units", "imperial"]
        );
    }

    #[test]
    fn test_build_arguments_skips_blank_and_placeholder() {
        let fields = vec![
            field("city", "City name"),
            field("units", "metric"),
            field("days", ""),
            field("missing", ""),
        ];
        let values = HashMap::from([
            ("city".to_string(), "City name".to_string()),
            ("units".to_string(), "   ".to_string()),
            ("days".to_string(), "3".to_string()),
        ]);

        assert_eq!(build_arguments(&fields, &values), vec!["--days", "3"]);
    }

    #[test]
    fn test_values_without_field_are_ignored() {
        let values = HashMap::from([("stray".to_string(), "x".to_string())]);
        assert!(build_arguments(&[], &values).is_empty());
    }
}
