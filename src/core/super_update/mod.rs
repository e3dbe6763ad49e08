//! Batch rename and metadata editing ("super update").
//!
//! A batch is previewed item by item from the ordered list of selected file
//! nodes; the item's position in that list is its enumeration index. Only
//! items whose name or metadata actually change make it into the change set.

pub mod conditions;
pub mod enumerate;
pub mod filename;
pub mod metadata;

use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::error::CoreError;
use super::{LocalFileMetadata, TreeNode};

pub use filename::TextFormatting;
use filename::FileNameSearch;
use metadata::CompiledRules;

pub const DEFAULT_MAX_FILE_NAME_LENGTH: usize = 250;

/// One metadata edit rule. Rules are applied in list order; for each field the
/// last matching rule wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "targetField", rename_all = "camelCase")]
pub enum MetadataRule {
    #[serde(rename_all = "camelCase")]
    Episode {
        id: String,
        /// Condition expression selecting the files this rule applies to.
        match_expression: String,
        /// `increment=N`, `decrement=N` or an absolute episode number.
        replace_expression: String,
    },
    #[serde(rename = "aniDBEpisode", rename_all = "camelCase")]
    AniDbEpisode {
        id: String,
        /// Search text applied to the AniDB episode string.
        match_expression: String,
        replace_expression: String,
        /// Optional condition gating the rule; absent or blank applies to all files.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        filter_expression: Option<String>,
        #[serde(default)]
        use_regex: bool,
        #[serde(default)]
        case_sensitive: bool,
    },
    #[serde(rename_all = "camelCase")]
    Type {
        id: String,
        match_expression: String,
        /// `main`, `special` or `nc`. Anything else sets `nc`.
        replace_expression: String,
    },
}

impl MetadataRule {
    pub fn id(&self) -> &str {
        match self {
            MetadataRule::Episode { id, .. }
            | MetadataRule::AniDbEpisode { id, .. }
            | MetadataRule::Type { id, .. } => id,
        }
    }
}

/// Everything the batch panel configures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SuperUpdateOptions {
    pub search_text: String,
    pub replace_text: String,
    pub use_regex: bool,
    pub case_sensitive: bool,
    pub match_all_occurrences: bool,
    pub enumerate_items: bool,
    pub text_formatting: TextFormatting,
    pub edit_metadata: bool,
    pub metadata_rules: Vec<MetadataRule>,
    /// Set from configuration, never from a host payload.
    #[serde(skip_deserializing)]
    pub max_file_name_length: usize,
}

impl Default for SuperUpdateOptions {
    fn default() -> Self {
        Self {
            search_text: String::new(),
            replace_text: String::new(),
            use_regex: true,
            case_sensitive: false,
            match_all_occurrences: false,
            enumerate_items: true,
            text_formatting: TextFormatting::None,
            edit_metadata: false,
            metadata_rules: Vec::new(),
            max_file_name_length: DEFAULT_MAX_FILE_NAME_LENGTH,
        }
    }
}

/// The computed outcome for one selected file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewItem {
    pub original_path: String,
    pub original_name: String,
    pub new_name: String,
    pub will_change_name: bool,
    pub original_metadata: Option<LocalFileMetadata>,
    pub new_metadata: Option<LocalFileMetadata>,
    pub will_change_metadata: bool,
}

impl PreviewItem {
    pub fn has_changes(&self) -> bool {
        self.will_change_name || self.will_change_metadata
    }
}

/// A record sent to the library service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuperUpdateFile {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<LocalFileMetadata>,
}

/// The validated set of updates for one submission.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChangeSet {
    pub files: Vec<SuperUpdateFile>,
    /// Changed items rejected by validation.
    pub skipped: usize,
}

impl ChangeSet {
    pub fn renamed_count(&self) -> usize {
        self.files.iter().filter(|f| f.new_name.is_some()).count()
    }

    pub fn metadata_count(&self) -> usize {
        self.files.iter().filter(|f| f.metadata.is_some()).count()
    }

    /// Human-readable report of what was applied.
    pub fn success_message(&self) -> String {
        let renamed = self.renamed_count();
        let metadata = self.metadata_count();
        match (renamed, metadata) {
            (0, m) => format!("Updated metadata for {m} file(s)"),
            (r, 0) => format!("Renamed {r} file(s)"),
            (r, m) => format!("Renamed {r} file(s) and updated metadata for {m}"),
        }
    }
}

/// Computes the preview for every node, in input order.
///
/// Patterns are compiled once. An invalid filename pattern keeps every name
/// unchanged; an invalid AniDB rule pattern disables only that rule.
pub fn preview(nodes: &[&TreeNode], options: &SuperUpdateOptions) -> Vec<PreviewItem> {
    let search = match FileNameSearch::compile(options) {
        Ok(search) => Some(search),
        Err(e) => {
            warn!(error = %e, "Invalid filename pattern, names are left unchanged");
            None
        }
    };
    let rules = options
        .edit_metadata
        .then(|| CompiledRules::compile(&options.metadata_rules));

    let items: Vec<PreviewItem> = nodes
        .par_iter()
        .enumerate()
        .map(|(index, node)| preview_item(node, index, search.as_ref(), rules.as_ref(), options))
        .collect();

    debug!(
        items = items.len(),
        changed = items.iter().filter(|i| i.has_changes()).count(),
        "Computed batch preview"
    );
    items
}

fn preview_item(
    node: &TreeNode,
    index: usize,
    search: Option<&FileNameSearch>,
    rules: Option<&CompiledRules>,
    options: &SuperUpdateOptions,
) -> PreviewItem {
    let original_name = node.name.clone();
    let new_name = match search {
        Some(search) => {
            let raw = filename::new_file_name(&original_name, search, options, index);
            filename::sanitize_file_name(&raw, &original_name, options.max_file_name_length)
        }
        None => original_name.clone(),
    };

    let original_metadata = node.local_file.as_ref().map(|lf| lf.metadata.clone());
    let new_metadata = match (rules, &original_metadata) {
        (Some(rules), Some(original)) => Some(rules.apply(original, index)),
        _ => original_metadata.clone(),
    };

    PreviewItem {
        original_path: node.path.clone(),
        will_change_name: new_name != original_name,
        will_change_metadata: new_metadata != original_metadata,
        original_name,
        new_name,
        original_metadata,
        new_metadata,
    }
}

/// Turns a preview into the records to submit.
///
/// Fails with [`CoreError::NothingToApply`] when no item carries a valid change.
pub fn build_change_set(items: &[PreviewItem]) -> Result<ChangeSet, CoreError> {
    let changed: Vec<&PreviewItem> = items.iter().filter(|i| i.has_changes()).collect();

    let files: Vec<SuperUpdateFile> = changed
        .iter()
        .filter(|item| {
            !item.will_change_name
                || (!item.new_name.trim().is_empty() && item.new_name != item.original_name)
        })
        .map(|item| SuperUpdateFile {
            path: item.original_path.clone(),
            new_name: item.will_change_name.then(|| item.new_name.clone()),
            metadata: if item.will_change_metadata {
                item.new_metadata.clone()
            } else {
                None
            },
        })
        .collect();

    if files.is_empty() {
        return Err(CoreError::NothingToApply);
    }

    Ok(ChangeSet {
        skipped: changed.len() - files.len(),
        files,
    })
}

/// Reads an integer prefix the way lenient user input is read: leading
/// whitespace, an optional sign, then digits up to the first other character.
pub(crate) fn parse_leading_int(value: &str) -> Option<i64> {
    let value = value.trim_start();
    let (negative, rest) = match value.as_bytes().first() {
        Some(b'-') => (true, &value[1..]),
        Some(b'+') => (false, &value[1..]),
        _ => (false, value),
    };
    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }
    let number = rest[..digits_len].parse::<i64>().ok()?;
    Some(if negative { -number } else { number })
}

/// Translates a `$1` / `$&` / `$<name>` / `$$` replacement string into the
/// `regex` crate's template syntax for `regex`.
///
/// References resolve the way a browser resolves them: `$0` and groups the
/// pattern does not have stay literal, `$12` falls back to `$1` followed by
/// `2` when there is no twelfth group, and an unknown `$<name>` is dropped
/// only when the pattern has named groups at all. Any other `$` is literal.
pub(crate) fn js_replacement_template(replacement: &str, regex: &Regex) -> String {
    let group_count = regex.captures_len();
    let has_group = |n: usize| n >= 1 && n < group_count;
    let has_named_groups = regex.capture_names().flatten().next().is_some();

    let chars: Vec<char> = replacement.chars().collect();
    let mut out = String::with_capacity(replacement.len());
    let mut i = 0;

    while i < chars.len() {
        if chars[i] != '$' {
            out.push(chars[i]);
            i += 1;
            continue;
        }

        match chars.get(i + 1) {
            Some('$') => {
                out.push_str("$$");
                i += 2;
            }
            Some('&') => {
                out.push_str("${0}");
                i += 2;
            }
            Some(c) if c.is_ascii_digit() => {
                let first = c.to_digit(10).unwrap_or(0) as usize;
                let two_digits = chars
                    .get(i + 2)
                    .and_then(|d| d.to_digit(10))
                    .map(|d| first * 10 + d as usize);

                match two_digits {
                    Some(group) if has_group(group) => {
                        out.push_str(&format!("${{{group}}}"));
                        i += 3;
                    }
                    _ if has_group(first) => {
                        out.push_str(&format!("${{{first}}}"));
                        i += 2;
                    }
                    _ => {
                        out.push_str("$$");
                        i += 1;
                    }
                }
            }
            Some('<') if has_named_groups => {
                match chars[i + 2..].iter().position(|c| *c == '>') {
                    Some(offset) => {
                        let name: String = chars[i + 2..i + 2 + offset].iter().collect();
                        if regex.capture_names().flatten().any(|n| n == name) {
                            out.push_str(&format!("${{{name}}}"));
                        }
                        i += offset + 3;
                    }
                    None => {
                        out.push_str("$$");
                        i += 1;
                    }
                }
            }
            _ => {
                out.push_str("$$");
                i += 1;
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LocalFileType;
    use crate::utils::test_helpers::{file_with_metadata, unscanned_file};
    use tracing_test::traced_test;

    #[test]
    fn test_parse_leading_int() {
        assert_eq!(parse_leading_int("42"), Some(42));
        assert_eq!(parse_leading_int("  -3abc"), Some(-3));
        assert_eq!(parse_leading_int("+7"), Some(7));
        assert_eq!(parse_leading_int("abc"), None);
        assert_eq!(parse_leading_int(""), None);
        assert_eq!(parse_leading_int("-"), None);
    }

    #[test]
    fn test_js_replacement_template() {
        let regex = Regex::new(r"(?P<ep>\d+)-(a)(b)(c)(d)(e)(f)(g)(h)(i)(j)(k)").unwrap();
        assert_eq!(js_replacement_template("E$1", &regex), "E${1}");
        assert_eq!(js_replacement_template("[$&]", &regex), "[${0}]");
        assert_eq!(js_replacement_template("$<ep> - $12", &regex), "${ep} - ${12}");
        assert_eq!(js_replacement_template("$<nope>!", &regex), "!");
        assert_eq!(js_replacement_template("cost $$5", &regex), "cost $$5");
        assert_eq!(js_replacement_template("$x and $", &regex), "$$x and $$");
    }

    #[test]
    fn test_js_replacement_template_keeps_missing_groups_literal() {
        let regex = Regex::new(r"(\d+)").unwrap();
        assert_eq!(js_replacement_template("$0", &regex), "$$0");
        assert_eq!(js_replacement_template("$2", &regex), "$$2");
        // No twelfth group, so this is group 1 followed by a literal 2.
        assert_eq!(js_replacement_template("$12", &regex), "${1}2");
        // Without named groups `$<...>` is plain text.
        assert_eq!(js_replacement_template("$<ep>", &regex), "$$<ep>");

        let replaced = regex.replace_all("Show 7", js_replacement_template("[$0|$1|$2]", &regex).as_str());
        assert_eq!(replaced, "Show [$0|7|$2]");
    }

    #[test]
    fn test_end_to_end_rename() {
        let a = unscanned_file("/lib/Show - 01.mkv");
        let b = unscanned_file("/lib/Show - 02.mkv");
        let options = SuperUpdateOptions {
            search_text: "Show".to_string(),
            replace_text: "Series".to_string(),
            use_regex: false,
            match_all_occurrences: true,
            text_formatting: TextFormatting::Uppercase,
            ..Default::default()
        };

        let items = preview(&[&a, &b], &options);
        let names: Vec<&str> = items.iter().map(|i| i.new_name.as_str()).collect();
        // Formatting applies to the name only; the extension is kept as is.
        assert_eq!(names, vec!["SERIES - 01.mkv", "SERIES - 02.mkv"]);
        assert!(items.iter().all(|i| i.will_change_name && !i.will_change_metadata));
    }

    #[test]
    fn test_enumeration_uses_selection_order() {
        let a = unscanned_file("/lib/b.mkv");
        let b = unscanned_file("/lib/a.mkv");
        let options = SuperUpdateOptions {
            search_text: r"^.*$".to_string(),
            replace_text: "Episode ${padding=2;start=1}".to_string(),
            ..Default::default()
        };

        let items = preview(&[&a, &b], &options);
        assert_eq!(items[0].new_name, "Episode 01.mkv");
        assert_eq!(items[1].new_name, "Episode 02.mkv");
    }

    #[test]
    #[traced_test]
    fn test_invalid_regex_keeps_original_names() {
        let a = unscanned_file("/lib/Show - 01.mkv");
        let options = SuperUpdateOptions {
            search_text: "(".to_string(),
            replace_text: "x".to_string(),
            ..Default::default()
        };

        let items = preview(&[&a], &options);
        assert_eq!(items[0].new_name, "Show - 01.mkv");
        assert!(!items[0].will_change_name);
        assert!(matches!(build_change_set(&items), Err(CoreError::NothingToApply)));
        assert!(logs_contain("Invalid filename pattern"));
    }

    #[test]
    fn test_change_set_only_carries_changed_fields() {
        let a = file_with_metadata("/lib/Show - 01.mkv", 1, "1", LocalFileType::Main);
        let b = file_with_metadata("/lib/Other - 05.mkv", 5, "5", LocalFileType::Main);
        let options = SuperUpdateOptions {
            search_text: "Show".to_string(),
            replace_text: "Series".to_string(),
            use_regex: false,
            edit_metadata: true,
            metadata_rules: vec![MetadataRule::Episode {
                id: "r1".to_string(),
                match_expression: ">=5".to_string(),
                replace_expression: "decrement=4".to_string(),
            }],
            ..Default::default()
        };

        let change_set = build_change_set(&preview(&[&a, &b], &options)).expect("has changes");
        assert_eq!(change_set.skipped, 0);
        assert_eq!(
            change_set.files,
            vec![
                SuperUpdateFile {
                    path: "/lib/Show - 01.mkv".to_string(),
                    new_name: Some("Series - 01.mkv".to_string()),
                    metadata: None,
                },
                SuperUpdateFile {
                    path: "/lib/Other - 05.mkv".to_string(),
                    new_name: None,
                    metadata: Some(LocalFileMetadata {
                        episode: 1,
                        anidb_episode: "5".to_string(),
                        file_type: LocalFileType::Main,
                    }),
                },
            ]
        );
        assert_eq!(
            change_set.success_message(),
            "Renamed 1 file(s) and updated metadata for 1"
        );
    }

    #[test]
    fn test_metadata_rules_ignored_when_editing_disabled() {
        let a = file_with_metadata("/lib/a.mkv", 1, "1", LocalFileType::Main);
        let options = SuperUpdateOptions {
            edit_metadata: false,
            metadata_rules: vec![MetadataRule::Type {
                id: "t".to_string(),
                match_expression: String::new(),
                replace_expression: "special".to_string(),
            }],
            ..Default::default()
        };
        let items = preview(&[&a], &options);
        assert!(!items[0].will_change_metadata);
    }

    #[test]
    fn test_unscanned_files_have_no_metadata_change() {
        let a = unscanned_file("/lib/a.mkv");
        let options = SuperUpdateOptions {
            edit_metadata: true,
            metadata_rules: vec![MetadataRule::Episode {
                id: "e".to_string(),
                match_expression: String::new(),
                replace_expression: "3".to_string(),
            }],
            ..Default::default()
        };
        let items = preview(&[&a], &options);
        assert_eq!(items[0].new_metadata, None);
        assert!(!items[0].will_change_metadata);
    }

    #[test]
    fn test_metadata_rule_wire_format() {
        let json = r#"{"targetField":"aniDBEpisode","id":"1","matchExpression":"S","replaceExpression":"C","useRegex":false}"#;
        let rule: MetadataRule = serde_json::from_str(json).expect("valid rule");
        assert_eq!(
            rule,
            MetadataRule::AniDbEpisode {
                id: "1".to_string(),
                match_expression: "S".to_string(),
                replace_expression: "C".to_string(),
                filter_expression: None,
                use_regex: false,
                case_sensitive: false,
            }
        );
        assert_eq!(rule.id(), "1");
    }

    #[test]
    fn test_success_message_variants() {
        let renamed = ChangeSet {
            files: vec![SuperUpdateFile {
                path: "/a".to_string(),
                new_name: Some("b".to_string()),
                metadata: None,
            }],
            skipped: 0,
        };
        assert_eq!(renamed.success_message(), "Renamed 1 file(s)");

        let metadata_only = ChangeSet {
            files: vec![SuperUpdateFile {
                path: "/a".to_string(),
                new_name: None,
                metadata: Some(LocalFileMetadata::default()),
            }],
            skipped: 0,
        };
        assert_eq!(metadata_only.success_message(), "Updated metadata for 1 file(s)");
    }
}
