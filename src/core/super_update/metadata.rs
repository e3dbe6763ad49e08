//! Metadata edit rules, compiled once per batch.

use regex::{Regex, RegexBuilder};
use tracing::warn;

use super::conditions::Condition;
use super::enumerate::apply_enumeration_pattern;
use super::{js_replacement_template, parse_leading_int, MetadataRule};
use crate::core::{LocalFileMetadata, LocalFileType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EpisodeChange {
    Increment(i64),
    Decrement(i64),
    Set(i64),
    Keep,
}

impl EpisodeChange {
    fn parse(expression: &str) -> Self {
        if let Some(rest) = expression.strip_prefix("increment=") {
            return parse_leading_int(rest).map_or(Self::Keep, Self::Increment);
        }
        if let Some(rest) = expression.strip_prefix("decrement=") {
            return parse_leading_int(rest).map_or(Self::Keep, Self::Decrement);
        }
        parse_leading_int(expression).map_or(Self::Keep, Self::Set)
    }

    fn apply(self, episode: u32) -> u32 {
        let current = i64::from(episode);
        let value = match self {
            Self::Increment(n) => current.saturating_add(n),
            Self::Decrement(n) => current.saturating_sub(n),
            Self::Set(n) => n,
            Self::Keep => current,
        };
        value.clamp(0, i64::from(u32::MAX)) as u32
    }
}

#[derive(Debug, Clone)]
enum CompiledRule {
    Episode {
        condition: Condition,
        change: EpisodeChange,
    },
    AniDbEpisode {
        filter: Option<Condition>,
        search: Regex,
        template: String,
    },
    Type {
        condition: Condition,
        file_type: LocalFileType,
    },
}

/// The metadata rules of a batch, ready to apply to each item.
#[derive(Debug, Clone, Default)]
pub struct CompiledRules {
    rules: Vec<CompiledRule>,
}

impl CompiledRules {
    /// Compiles `rules`, dropping AniDB rules whose pattern does not compile.
    pub fn compile(rules: &[MetadataRule]) -> Self {
        let rules = rules
            .iter()
            .filter_map(|rule| match rule {
                MetadataRule::Episode {
                    match_expression,
                    replace_expression,
                    ..
                } => Some(CompiledRule::Episode {
                    condition: Condition::parse(match_expression),
                    change: EpisodeChange::parse(replace_expression),
                }),
                MetadataRule::Type {
                    match_expression,
                    replace_expression,
                    ..
                } => Some(CompiledRule::Type {
                    condition: Condition::parse(match_expression),
                    file_type: LocalFileType::parse(replace_expression).unwrap_or(LocalFileType::Nc),
                }),
                MetadataRule::AniDbEpisode {
                    id,
                    match_expression,
                    replace_expression,
                    filter_expression,
                    use_regex,
                    case_sensitive,
                } => {
                    let pattern = if *use_regex {
                        match_expression.clone()
                    } else {
                        regex::escape(match_expression)
                    };
                    let search = match RegexBuilder::new(&pattern)
                        .case_insensitive(!case_sensitive)
                        .build()
                    {
                        Ok(search) => search,
                        Err(e) => {
                            warn!(rule = %id, error = %e, "Skipping AniDB rule with invalid pattern");
                            return None;
                        }
                    };
                    let filter = filter_expression
                        .as_deref()
                        .filter(|f| !f.trim().is_empty())
                        .map(Condition::parse);
                    let template = js_replacement_template(replace_expression, &search);
                    Some(CompiledRule::AniDbEpisode {
                        filter,
                        search,
                        template,
                    })
                }
            })
            .collect();

        Self { rules }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Applies the rules to one item's metadata.
    ///
    /// Every rule sees `original`, never the output of an earlier rule.
    pub fn apply(&self, original: &LocalFileMetadata, index: usize) -> LocalFileMetadata {
        let mut episode = None;
        let mut anidb_episode = None;
        let mut file_type = None;

        for rule in &self.rules {
            match rule {
                CompiledRule::Episode { condition, change } => {
                    if condition.matches(original) {
                        episode = Some(change.apply(original.episode));
                    }
                }
                CompiledRule::Type {
                    condition,
                    file_type: target,
                } => {
                    if condition.matches(original) {
                        file_type = Some(*target);
                    }
                }
                CompiledRule::AniDbEpisode {
                    filter,
                    search,
                    template,
                } => {
                    if filter.as_ref().is_some_and(|f| !f.matches(original)) {
                        continue;
                    }
                    if !search.is_match(&original.anidb_episode) {
                        continue;
                    }
                    let replaced = search.replace_all(&original.anidb_episode, template.as_str());
                    let Some(enumerated) = apply_enumeration_pattern(&replaced, index) else {
                        continue;
                    };
                    anidb_episode = Some(enumerated.trim().to_string());
                }
            }
        }

        LocalFileMetadata {
            episode: episode.unwrap_or(original.episode),
            anidb_episode: anidb_episode.unwrap_or_else(|| original.anidb_episode.clone()),
            file_type: file_type.unwrap_or(original.file_type),
        }
    }
}
