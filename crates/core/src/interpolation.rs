use std::collections::HashMap;
use std::sync::LazyLock;

use indexmap::IndexSet;
use regex::{Captures, Regex};

use crate::script_definitions::TemplateSentence;

/// Matches `{identifier}` placeholder tokens.
static PLACEHOLDER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{(\w+)\}").expect("placeholder regex is a compile-time constant and must be valid")
});

/// Values from one decoded event, looked up case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubstitutionMap {
    values: HashMap<String, String>,
}

impl SubstitutionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later inserts win over earlier keys that differ only in case.
    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(key.to_lowercase(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(&key.to_lowercase()).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for SubstitutionMap {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert(key.as_ref(), value);
        }
        map
    }
}

/// Find the placeholder tokens in `text`, in order of first appearance.
pub fn placeholders(text: &str) -> IndexSet<String> {
    PLACEHOLDER_PATTERN
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Replaces every `{key}` found in `map` with its value in one pass.
///
/// Unknown tokens are left as they are and substituted values are not scanned
/// again, so a value containing `{other}` stays literal.
pub fn interpolate(text: &str, map: &SubstitutionMap) -> String {
    PLACEHOLDER_PATTERN
        .replace_all(text, |caps: &Captures| match map.get(&caps[1]) {
            Some(value) => value.to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Applies `map` to the formatted text of every sentence.
///
/// Returns the number of sentences whose text changed.
pub fn apply_substitutions(map: &SubstitutionMap, sentences: &mut [TemplateSentence]) -> usize {
    if map.is_empty() {
        return 0;
    }

    let mut changed = 0;
    for sentence in sentences.iter_mut() {
        let text = interpolate(sentence.formatted_text(), map);
        if sentence.set_formatted_text(text) {
            changed += 1;
        }
    }

    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> SubstitutionMap {
        pairs.iter().map(|(k, v)| (*k, *v)).collect()
    }

    #[test]
    fn test_interpolate_known_and_unknown_tokens() {
        let values = map(&[("city", "Oslo")]);
        assert_eq!(
            interpolate("Weather in {city}: {temp}", &values),
            "Weather in Oslo: {temp}"
        );
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let values = map(&[("City", "Oslo")]);
        assert_eq!(interpolate("{CITY} / {city}", &values), "Oslo / Oslo");
    }

    #[test]
    fn test_later_key_wins_on_case_collision() {
        let values = map(&[("name", "first"), ("NAME", "second")]);
        assert_eq!(values.len(), 1);
        assert_eq!(values.get("Name"), Some("second"));
    }

    #[test]
    fn test_substituted_values_are_not_rescanned() {
        let values = map(&[("a", "{b}"), ("b", "nested")]);
        assert_eq!(interpolate("{a}", &values), "{b}");
    }

    #[test]
    fn test_non_identifier_braces_are_untouched() {
        let values = map(&[("x", "1")]);
        assert_eq!(interpolate("{ x } {x-y} {} {x", &values), "{ x } {x-y} {} {x");
    }

    #[test]
    fn test_no_matching_keys_leaves_text_unchanged() {
        let mut sentences = vec![TemplateSentence::new("A {x} B {y}")];
        let changed = apply_substitutions(&map(&[("z", "9")]), &mut sentences);

        assert_eq!(changed, 0);
        assert_eq!(sentences[0].formatted_text(), "A {x} B {y}");
    }

    #[test]
    fn test_partial_events_compose_in_any_order() {
        let mut forward = vec![TemplateSentence::new("A {x} B {y}")];
        apply_substitutions(&map(&[("x", "1")]), &mut forward);
        apply_substitutions(&map(&[("y", "2")]), &mut forward);

        let mut backward = vec![TemplateSentence::new("A {x} B {y}")];
        apply_substitutions(&map(&[("y", "2")]), &mut backward);
        apply_substitutions(&map(&[("x", "1")]), &mut backward);

        assert_eq!(forward[0].formatted_text(), "A 1 B 2");
        assert_eq!(backward[0].formatted_text(), "A 1 B 2");
    }

    #[test]
    fn test_reset_then_replay_matches_continuous_application() {
        let events = [map(&[("x", "1")]), map(&[("y", "2")]), map(&[("x", "3")])];

        let mut continuous = vec![TemplateSentence::new("A {x} B {y}")];
        for event in &events {
            apply_substitutions(event, &mut continuous);
        }

        let mut replayed = continuous.clone();
        replayed[0].reset();
        for event in &events {
            apply_substitutions(event, &mut replayed);
        }

        assert_eq!(replayed[0].formatted_text(), continuous[0].formatted_text());
        assert_eq!(replayed[0].formatted_text(), "A 1 B 2");
    }

    #[test]
    fn test_user_edits_survive_substitution() {
        let mut sentences = vec![TemplateSentence::new("Hello {name}")];
        sentences[0].set_formatted_text("Hi there {name}, it is {time}");

        apply_substitutions(&map(&[("name", "Ada")]), &mut sentences);

        assert_eq!(sentences[0].formatted_text(), "Hi there Ada, it is {time}");
        assert_eq!(sentences[0].original_template(), "Hello {name}");
    }

    #[test]
    fn test_placeholders_in_order() {
        let tokens = placeholders("{b} and {a} and {b} and {not a token}");
        let tokens: Vec<&str> = tokens.iter().map(String::as_str).collect();
        assert_eq!(tokens, vec!["b", "a"]);
    }
}
