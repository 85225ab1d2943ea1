use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// A script found in the scripts directory.
///
/// Identity is the file path; the display name may be replaced by a preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptDescriptor {
    pub file_name: String,
    pub file_path: PathBuf,
    pub display_name: String,
}

impl ScriptDescriptor {
    /// Builds a descriptor for `path`, using the file stem as display name
    /// unless one is given.
    pub fn from_path(path: &Path, display_name: Option<String>) -> Self {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        let display_name = display_name.unwrap_or_else(|| {
            path.file_stem()
                .map(|stem| stem.to_string_lossy().to_string())
                .unwrap_or_else(|| file_name.clone())
        });

        Self {
            file_name,
            file_path: path.to_path_buf(),
            display_name,
        }
    }
}

impl Display for ScriptDescriptor {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        if self.display_name == self.file_name {
            formatter.write_str(&self.display_name)
        } else {
            write!(formatter, "{} ({})", self.display_name, self.file_name)
        }
    }
}

/// An argument the script accepts, declared in its preview output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentField {
    pub name: String,
    pub placeholder_hint: String,
}

impl Display for ArgumentField {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "`{}`", self.name)?;

        if !self.placeholder_hint.is_empty() {
            write!(formatter, " ({})", self.placeholder_hint)?;
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    pub detail: String,
    pub tip: String,
}

impl Tag {
    /// Creates a tag; an empty or missing detail falls back to the name.
    pub fn new(name: String, detail: Option<String>, tip: Option<String>) -> Self {
        let detail = match detail {
            Some(detail) if !detail.is_empty() => detail,
            _ => name.clone(),
        };

        Self {
            name,
            detail,
            tip: tip.unwrap_or_default(),
        }
    }
}

impl Display for Tag {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(&self.name)?;

        if self.detail != self.name {
            write!(formatter, ": {}", self.detail)?;
        }

        Ok(())
    }
}

/// A user-editable sentence with `{placeholder}` tokens.
///
/// The original template never changes after creation. Substitution and user
/// edits both operate on the formatted text, so successive events build on
/// each other until the sentence is explicitly reset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSentence {
    original_template: String,
    formatted_text: String,
}

impl TemplateSentence {
    pub fn new(template: impl Into<String>) -> Self {
        let original_template = template.into();
        Self {
            formatted_text: original_template.clone(),
            original_template,
        }
    }

    pub fn original_template(&self) -> &str {
        &self.original_template
    }

    pub fn formatted_text(&self) -> &str {
        &self.formatted_text
    }

    /// Returns whether the text changed.
    pub fn set_formatted_text(&mut self, text: impl Into<String>) -> bool {
        let text = text.into();
        if self.formatted_text == text {
            return false;
        }

        self.formatted_text = text;
        true
    }

    /// Restores the formatted text to the original template.
    pub fn reset(&mut self) -> bool {
        let original = self.original_template.clone();
        self.set_formatted_text(original)
    }
}

impl Display for TemplateSentence {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(&self.formatted_text)
    }
}
