//! JSON event protocol emitted by scripts on stdout.
//!
//! Every recognised field is optional and independent. Decoding never fails on
//! a missing or wrongly typed field; it is skipped. JSON syntax errors are
//! caught earlier, by [`crate::classify`].

use serde_json::{Map, Value};

use crate::interpolation::SubstitutionMap;
use crate::script_definitions::{ArgumentField, Tag, TemplateSentence};

const DISPLAY_NAME: &str = "display_name";
const SCRIPT_TYPE: &str = "script_type";
const TAGS: &str = "tags";
const TEMPLATE_SENTENCES: &str = "template_sentences";
const OUTPUT_SENTENCES: &str = "output_sentences";
const FIELDS: &str = "fields";
const MONITOR: &str = "monitor";
const FOUND: &str = "found";

const RECOGNISED_FIELDS: &[&str] = &[
    DISPLAY_NAME,
    SCRIPT_TYPE,
    TAGS,
    TEMPLATE_SENTENCES,
    OUTPUT_SENTENCES,
    FIELDS,
    MONITOR,
    FOUND,
];

/// How a script describes itself in its preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptType {
    Static,
    Stream,
    Numbered(i64),
    Other(String),
}

impl ScriptType {
    /// Suffix appended to the display name.
    pub fn display_suffix(&self) -> Option<String> {
        match self {
            ScriptType::Stream => Some(" (Stream)".to_string()),
            ScriptType::Numbered(number) => Some(format!(" (Type {number})")),
            ScriptType::Static | ScriptType::Other(_) => None,
        }
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(text) => Some(match text.as_str() {
                "static" => ScriptType::Static,
                "stream" => ScriptType::Stream,
                _ => ScriptType::Other(text.clone()),
            }),
            Value::Number(number) => number.as_i64().map(ScriptType::Numbered),
            _ => None,
        }
    }
}

/// One decoded event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptEvent {
    pub display_name: Option<String>,
    pub script_type: Option<ScriptType>,
    pub tags: Option<Vec<Tag>>,
    pub template_sentences: Option<Vec<String>>,
    pub output_sentences: Option<Vec<String>>,
    pub fields: Option<Vec<ArgumentField>>,
    pub monitor_url: Option<String>,
    pub found_url: Option<String>,
    pub values: SubstitutionMap,
}

impl ScriptEvent {
    /// The sentences that should replace the current template set, if any.
    ///
    /// `template_sentences` wins when both lists are present since it is
    /// applied last.
    pub fn replacement_templates(&self) -> Option<Vec<TemplateSentence>> {
        self.template_sentences
            .as_ref()
            .or(self.output_sentences.as_ref())
            .map(|sentences| sentences.iter().map(TemplateSentence::new).collect())
    }

    /// The display name after applying the script type suffix.
    pub fn decorated_display_name(&self, current: &str) -> Option<String> {
        let suffix = self
            .script_type
            .as_ref()
            .and_then(ScriptType::display_suffix);

        match (&self.display_name, suffix) {
            (None, None) => None,
            (Some(name), None) => Some(name.clone()),
            (name, Some(suffix)) => {
                let base = name.as_deref().unwrap_or(current);
                Some(format!("{base}{suffix}"))
            }
        }
    }
}

/// Decodes a parsed JSON object into an event.
pub fn decode(object: &Map<String, Value>) -> ScriptEvent {
    let mut event = ScriptEvent {
        display_name: object.get(DISPLAY_NAME).and_then(string_value),
        script_type: object.get(SCRIPT_TYPE).and_then(ScriptType::from_value),
        tags: object.get(TAGS).and_then(Value::as_array).map(|tags| decode_tags(tags)),
        template_sentences: object.get(TEMPLATE_SENTENCES).and_then(string_array),
        output_sentences: object.get(OUTPUT_SENTENCES).and_then(string_array),
        fields: object
            .get(FIELDS)
            .and_then(Value::as_array)
            .map(|fields| decode_fields(fields)),
        monitor_url: object.get(MONITOR).and_then(Value::as_array).and_then(|urls| {
            urls.iter()
                .filter_map(Value::as_str)
                .find(|url| !url.is_empty())
                .map(str::to_string)
        }),
        found_url: object.get(FOUND).and_then(string_value),
        values: SubstitutionMap::new(),
    };

    for (key, value) in object {
        if RECOGNISED_FIELDS.contains(&key.as_str()) {
            continue;
        }
        if let Some(text) = scalar_text(value) {
            event.values.insert(key, text);
        }
    }

    event
}

fn string_value(value: &Value) -> Option<String> {
    value.as_str().map(str::to_string)
}

fn string_array(value: &Value) -> Option<Vec<String>> {
    value.as_array().map(|items| {
        items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect()
    })
}

/// Numbers keep their JSON text, so `19.90` stays `19.90`.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null => Some(String::new()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn decode_tags(tags: &[Value]) -> Vec<Tag> {
    tags.iter()
        .filter_map(|tag| {
            let name = tag.get("name")?.as_str()?.to_string();
            let detail = tag.get("detail").and_then(string_value);
            let tip = tag.get("tip").and_then(string_value);
            Some(Tag::new(name, detail, tip))
        })
        .collect()
}

fn decode_fields(fields: &[Value]) -> Vec<ArgumentField> {
    fields
        .iter()
        .filter_map(|field| {
            let name = field.get("name")?.as_str()?;
            if name.is_empty() {
                return None;
            }
            Some(ArgumentField {
                name: name.to_string(),
                placeholder_hint: field.get("tip").and_then(string_value).unwrap_or_default(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_str(line: &str) -> ScriptEvent {
        match serde_json::from_str(line).unwrap() {
            Value::Object(object) => decode(&object),
            other => panic!("Expected an object, got {other}"),
        }
    }

    #[test]
    fn test_preview_payload() {
        let event = decode_str(r#"{"tags":[{"name":"x"}],"template_sentences":["Hello {x}"]}"#);

        assert_eq!(
            event.tags,
            Some(vec![Tag {
                name: "x".to_string(),
                detail: "x".to_string(),
                tip: String::new(),
            }])
        );
        assert_eq!(event.template_sentences, Some(vec!["Hello {x}".to_string()]));
        assert!(event.display_name.is_none());
        assert!(event.fields.is_none());
        assert!(event.values.is_empty());
    }

    #[test]
    fn test_all_recognised_fields() {
        let event = decode_str(
            r#"{
                "display_name": "Deals",
                "script_type": "stream",
                "tags": [{"name": "price", "detail": "Current price", "tip": "USD"}],
                "output_sentences": ["Now {price}"],
                "fields": [{"name": "query", "tip": "search term"}, {"name": ""}, {"tip": "x"}],
                "monitor": ["", "https://example.com/watch"],
                "found": "https://example.com/item"
            }"#,
        );

        assert_eq!(event.display_name.as_deref(), Some("Deals"));
        assert_eq!(event.script_type, Some(ScriptType::Stream));
        assert_eq!(event.tags.as_ref().unwrap()[0].detail, "Current price");
        assert_eq!(event.output_sentences, Some(vec!["Now {price}".to_string()]));
        assert_eq!(
            event.fields,
            Some(vec![ArgumentField {
                name: "query".to_string(),
                placeholder_hint: "search term".to_string(),
            }])
        );
        assert_eq!(event.monitor_url.as_deref(), Some("https://example.com/watch"));
        assert_eq!(event.found_url.as_deref(), Some("https://example.com/item"));
        assert!(event.values.is_empty());
    }

    #[test]
    fn test_scalar_values_coerced_to_text() {
        let event = decode_str(r#"{"Price": 12.5, "count": 3, "ok": true, "gone": null, "list": [1], "name": "Ada"}"#);

        assert_eq!(event.values.get("price"), Some("12.5"));
        assert_eq!(event.values.get("COUNT"), Some("3"));
        assert_eq!(event.values.get("ok"), Some("true"));
        assert_eq!(event.values.get("gone"), Some(""));
        assert_eq!(event.values.get("name"), Some("Ada"));
        assert_eq!(event.values.get("list"), None);
        assert_eq!(event.values.len(), 5);
    }

    #[test]
    fn test_wrong_typed_fields_are_skipped() {
        let event = decode_str(
            r#"{"display_name": 5, "tags": "nope", "template_sentences": ["a", 1, null, "b"], "monitor": "x", "found": 1}"#,
        );

        assert!(event.display_name.is_none());
        assert!(event.tags.is_none());
        assert_eq!(
            event.template_sentences,
            Some(vec!["a".to_string(), "b".to_string()])
        );
        assert!(event.monitor_url.is_none());
        assert!(event.found_url.is_none());
        assert!(event.values.is_empty());
    }

    #[test]
    fn test_numbers_keep_their_json_text() {
        let event = decode_str(r#"{"price": 19.90, "big": 1e3, "n": 12345678901234567890123, "neg": -4}"#);

        assert_eq!(event.values.get("price"), Some("19.90"));
        assert_eq!(event.values.get("big"), Some("1e3"));
        assert_eq!(event.values.get("n"), Some("12345678901234567890123"));
        assert_eq!(event.values.get("neg"), Some("-4"));
    }

    #[test]
    fn test_script_type_suffixes() {
        let event = decode_str(r#"{"display_name": "Feed", "script_type": "stream"}"#);
        assert_eq!(event.decorated_display_name("old"), Some("Feed (Stream)".to_string()));

        let event = decode_str(r#"{"script_type": 3}"#);
        assert_eq!(event.decorated_display_name("feed"), Some("feed (Type 3)".to_string()));

        let event = decode_str(r#"{"display_name": "Feed", "script_type": "static"}"#);
        assert_eq!(event.decorated_display_name("old"), Some("Feed".to_string()));

        let event = decode_str(r#"{"script_type": "static"}"#);
        assert_eq!(event.decorated_display_name("old"), None);
    }

    #[test]
    fn test_replacement_templates() {
        let event = decode_str(r#"{"output_sentences": ["out {a}"]}"#);
        let templates = event.replacement_templates().unwrap();
        assert_eq!(templates[0].original_template(), "out {a}");
        assert_eq!(templates[0].formatted_text(), "out {a}");

        let event = decode_str(r#"{"output_sentences": ["out"], "template_sentences": ["tpl"]}"#);
        assert_eq!(event.replacement_templates().unwrap()[0].original_template(), "tpl");

        assert!(decode_str(r#"{"x": 1}"#).replacement_templates().is_none());
    }
}
