//! The filename half of a batch update: find/replace, formatting and sanitizing.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use super::{js_replacement_template, SuperUpdateOptions};
use crate::core::error::CoreError;

use super::enumerate::apply_enumeration_pattern;

/// Case transform applied to the name (without extension) after replacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextFormatting {
    #[default]
    None,
    Lowercase,
    Uppercase,
    /// Upper-cases the first character and lower-cases the rest.
    Titlecase,
    /// Upper-cases the first letter of every word.
    Capitalize,
}

/// Splits `name` into stem and extension (with its dot).
///
/// A dot at the very start or end of the name does not start an extension.
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 && idx < name.len() - 1 => name.split_at(idx),
        _ => (name, ""),
    }
}

/// The compiled search half of the filename options.
#[derive(Debug, Clone)]
pub enum FileNameSearch {
    /// No search text; replacing is skipped.
    Disabled,
    Regex { regex: Regex, template: String },
    Literal {
        search: String,
        replace: String,
        case_sensitive: bool,
        match_all: bool,
    },
}

impl FileNameSearch {
    /// Compiles the search options once for a whole batch.
    pub fn compile(options: &SuperUpdateOptions) -> Result<Self, CoreError> {
        if options.search_text.is_empty() {
            return Ok(Self::Disabled);
        }
        if options.use_regex {
            let regex = RegexBuilder::new(&options.search_text)
                .case_insensitive(!options.case_sensitive)
                .build()
                .map_err(|source| CoreError::InvalidPattern {
                    pattern: options.search_text.clone(),
                    source,
                })?;
            let template = js_replacement_template(&options.replace_text, &regex);
            return Ok(Self::Regex { regex, template });
        }
        Ok(Self::Literal {
            search: options.search_text.clone(),
            replace: options.replace_text.clone(),
            case_sensitive: options.case_sensitive,
            match_all: options.match_all_occurrences,
        })
    }

    /// Applies the search to a name stem.
    pub fn apply(&self, stem: &str) -> String {
        match self {
            Self::Disabled => stem.to_string(),
            // Regex replacement is always global.
            Self::Regex { regex, template } => regex.replace_all(stem, template.as_str()).into_owned(),
            Self::Literal {
                search,
                replace,
                case_sensitive: true,
                match_all,
            } => {
                if *match_all {
                    stem.replace(search.as_str(), replace)
                } else {
                    stem.replacen(search.as_str(), replace, 1)
                }
            }
            Self::Literal {
                search,
                replace,
                case_sensitive: false,
                match_all,
            } => replace_ignore_case(stem, search, replace, *match_all),
        }
    }
}

/// Replaces matches of `search` regardless of case, keeping the casing of unmatched text.
fn replace_ignore_case(text: &str, search: &str, replace: &str, match_all: bool) -> String {
    let haystack: Vec<char> = text.chars().collect();
    let needle: Vec<char> = search.chars().collect();
    if needle.is_empty() || needle.len() > haystack.len() {
        return text.to_string();
    }

    let chars_equal = |a: char, b: char| a == b || a.to_lowercase().eq(b.to_lowercase());
    let matches_at = |pos: usize| {
        haystack[pos..pos + needle.len()]
            .iter()
            .zip(&needle)
            .all(|(a, b)| chars_equal(*a, *b))
    };

    let mut result = String::with_capacity(text.len());
    let mut pos = 0;
    let mut replaced_once = false;
    while pos < haystack.len() {
        let can_replace = match_all || !replaced_once;
        if can_replace && pos + needle.len() <= haystack.len() && matches_at(pos) {
            result.push_str(replace);
            pos += needle.len();
            replaced_once = true;
        } else {
            result.push(haystack[pos]);
            pos += 1;
        }
    }
    result
}

/// Applies the selected case transform.
pub fn apply_text_formatting(text: &str, formatting: TextFormatting) -> String {
    match formatting {
        TextFormatting::None => text.to_string(),
        TextFormatting::Lowercase => text.to_lowercase(),
        TextFormatting::Uppercase => text.to_uppercase(),
        TextFormatting::Titlecase => {
            let mut chars = text.chars();
            match chars.next() {
                Some(first) => format!("{}{}", first.to_uppercase(), chars.as_str().to_lowercase()),
                None => String::new(),
            }
        }
        TextFormatting::Capitalize => {
            // Word characters are ASCII letters, digits and `_`.
            let mut previous_is_word = false;
            text.chars()
                .map(|c| {
                    let is_word = c.is_ascii_alphanumeric() || c == '_';
                    let out = if is_word && !previous_is_word {
                        c.to_ascii_uppercase()
                    } else {
                        c
                    };
                    previous_is_word = is_word;
                    out
                })
                .collect()
        }
    }
}

/// Computes the raw new name for one item, before sanitizing.
///
/// An enumeration token that cannot be evaluated leaves the name unchanged.
pub fn new_file_name(
    original_name: &str,
    search: &FileNameSearch,
    options: &SuperUpdateOptions,
    index: usize,
) -> String {
    let (stem, extension) = split_extension(original_name);

    let mut name = search.apply(stem);
    if options.enumerate_items {
        match apply_enumeration_pattern(&name, index) {
            Some(enumerated) => name = enumerated,
            None => {
                tracing::debug!(original_name, "Enumeration token out of range");
                return original_name.to_string();
            }
        }
    }
    name = apply_text_formatting(&name, options.text_formatting);

    format!("{name}{extension}")
}

const FORBIDDEN_CHARS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

fn is_degenerate(name: &str) -> bool {
    name.chars().all(|c| c == '.' || c.is_whitespace())
}

/// Makes a candidate name safe for common filesystems.
///
/// Falls back to `original_name` when the result would be empty, only dots or only whitespace.
pub fn sanitize_file_name(candidate: &str, original_name: &str, max_length: usize) -> String {
    if candidate.trim().is_empty() {
        return original_name.to_string();
    }

    let (stem, extension) = split_extension(candidate);
    let sanitized = stem.replace(FORBIDDEN_CHARS, "_").replace("..", "_");
    let sanitized = sanitized.trim();

    if is_degenerate(sanitized) {
        return original_name.to_string();
    }

    let extension_length = extension.chars().count();
    let max_stem_length = max_length.saturating_sub(extension_length);
    if max_stem_length > 0 && sanitized.chars().count() > max_stem_length {
        let truncated: String = sanitized.chars().take(max_stem_length).collect();
        let truncated = truncated.trim();
        if is_degenerate(truncated) {
            return original_name.to_string();
        }
        return format!("{truncated}{extension}");
    }

    format!("{sanitized}{extension}")
}
