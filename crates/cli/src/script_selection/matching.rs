//! Finding scripts by index, file name or fuzzy display name.

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use script_monitor_core::error::{Error, Result};
use script_monitor_core::script_definitions::ScriptDescriptor;

/// Resolves `query` to a position in `scripts`.
///
/// In order of precedence, `query` may be a 1-based index as shown by
/// `smon --list`, an exact file name (with or without the `.py` extension), an
/// exact display name, or a fuzzy match on the display name. The best fuzzy
/// score wins; ties go to the earlier script.
///
/// # Errors
///
/// Returns [`Error::ScriptNotFound`] if nothing matches or an index is out of
/// range.
pub fn find_script(scripts: &[ScriptDescriptor], query: &str) -> Result<usize> {
    if let Ok(index) = query.parse::<usize>() {
        return if (1..=scripts.len()).contains(&index) {
            Ok(index - 1)
        } else {
            Err(Error::ScriptNotFound(query.to_string()))
        };
    }

    let exact = scripts.iter().position(|script| {
        script.file_name == query
            || script.file_path.file_stem().is_some_and(|stem| stem == query)
            || script.display_name.eq_ignore_ascii_case(query)
    });
    if let Some(index) = exact {
        return Ok(index);
    }

    let matcher = SkimMatcherV2::default();
    scripts
        .iter()
        .enumerate()
        .filter_map(|(index, script)| {
            matcher
                .fuzzy_match(&script.to_string(), query)
                .map(|score| (index, score))
        })
        .fold(None, |best: Option<(usize, i64)>, (index, score)| match best {
            Some((_, best_score)) if best_score >= score => best,
            _ => Some((index, score)),
        })
        .map(|(index, _)| index)
        .ok_or_else(|| Error::ScriptNotFound(query.to_string()))
}

/// Filters the positions of `scripts` shown in the selection list.
///
/// A numeric predicate matches the 1-based index as text; anything else is a
/// fuzzy match on the script's display text. Catalog order is kept.
pub fn filter_displayed_indexes(scripts: &[ScriptDescriptor], predicate: &str) -> Vec<usize> {
    if predicate.is_empty() {
        return (0..scripts.len()).collect();
    }

    let matcher = SkimMatcherV2::default();
    let predicate_index = predicate.parse::<usize>().ok();

    scripts
        .iter()
        .enumerate()
        .filter_map(|(index, script)| {
            if let Some(predicate_index) = predicate_index {
                (index + 1)
                    .to_string()
                    .contains(&predicate_index.to_string())
                    .then_some(index)
            } else {
                matcher
                    .fuzzy_match(&script.to_string(), predicate)
                    .map(|_| index)
            }
        })
        .collect()
}
