//! The condition language used by metadata edit rules.
//!
//! An expression is a list of clauses separated by `;`. Every clause must
//! hold for the expression to match:
//!
//! - `>=N`, `<=N`, `>N`, `<N`, `=N`, `!=N`, `!N`, `N` compare the episode number.
//! - `anidb>=S1`, `anidb=3`, `anidb!=C2`, `!anidb=2`, ... compare the AniDB episode.
//!   When the operand carries a letter prefix, the file's prefix must equal it.
//! - `type=main|special` requires one of the listed types, `!type=nc` excludes them.
//!
//! Unknown clauses are ignored. An episode clause whose number does not parse
//! is skipped; an AniDB clause whose operand does not parse never matches.

use regex::Regex;
use std::sync::LazyLock;

use super::parse_leading_int;
use crate::core::{LocalFileMetadata, LocalFileType};

static ANIDB_EPISODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-zA-Z]*)(\d+)$").expect("AniDB episode pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Ge,
    Le,
    Gt,
    Lt,
    Eq,
    Ne,
}

impl Comparison {
    fn holds(self, actual: i64, expected: i64) -> bool {
        match self {
            Comparison::Ge => actual >= expected,
            Comparison::Le => actual <= expected,
            Comparison::Gt => actual > expected,
            Comparison::Lt => actual < expected,
            Comparison::Eq => actual == expected,
            Comparison::Ne => actual != expected,
        }
    }
}

// Longer operators first so `>=` is not read as `>`.
const ANIDB_OPERATORS: [(&str, Comparison); 7] = [
    ("anidb>=", Comparison::Ge),
    ("anidb<=", Comparison::Le),
    ("anidb>", Comparison::Gt),
    ("anidb<", Comparison::Lt),
    ("anidb!=", Comparison::Ne),
    ("!anidb=", Comparison::Ne),
    ("anidb=", Comparison::Eq),
];

const EPISODE_OPERATORS: [(&str, Comparison); 7] = [
    (">=", Comparison::Ge),
    ("<=", Comparison::Le),
    (">", Comparison::Gt),
    ("<", Comparison::Lt),
    ("!=", Comparison::Ne),
    ("!", Comparison::Ne),
    ("=", Comparison::Eq),
];

/// An AniDB episode split into its letter prefix and number, e.g. `S2` or `12`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AniDbEpisode {
    /// Upper-cased letter prefix, empty for regular episodes.
    pub prefix: String,
    pub number: i64,
}

impl AniDbEpisode {
    /// Parses a condition operand. Returns `None` when no number can be read.
    pub fn parse_operand(value: &str) -> Option<Self> {
        if let Some(caps) = ANIDB_EPISODE.captures(value) {
            let number = caps[2].parse::<i64>().ok()?;
            return Some(Self {
                prefix: caps[1].to_uppercase(),
                number,
            });
        }
        parse_leading_int(value).map(|number| Self {
            prefix: String::new(),
            number,
        })
    }

    /// Parses a file's AniDB episode, treating anything unreadable as episode 0.
    pub fn parse_lenient(value: &str) -> Self {
        Self::parse_operand(value).unwrap_or(Self {
            prefix: String::new(),
            number: 0,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AniDbClause {
    comparison: Comparison,
    operand: Option<AniDbEpisode>,
}

impl AniDbClause {
    fn holds(&self, actual: &AniDbEpisode) -> bool {
        let Some(operand) = &self.operand else {
            return false;
        };
        if !operand.prefix.is_empty() && operand.prefix != actual.prefix {
            return false;
        }
        self.comparison.holds(actual.number, operand.number)
    }
}

/// A parsed condition expression.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Condition {
    episode: Vec<(Comparison, i64)>,
    anidb: Vec<AniDbClause>,
    types: Option<Vec<LocalFileType>>,
    excluded_types: Option<Vec<LocalFileType>>,
}

impl Condition {
    pub fn parse(expression: &str) -> Self {
        let mut condition = Condition::default();

        for clause in expression.split(';').map(str::trim) {
            if clause.is_empty() {
                continue;
            }
            if let Some(list) = clause.strip_prefix("type=") {
                condition.types = Some(parse_type_list(list));
                continue;
            }
            if let Some(list) = clause.strip_prefix("!type=") {
                condition.excluded_types = Some(parse_type_list(list));
                continue;
            }
            if let Some((comparison, operand)) = split_operator(clause, &ANIDB_OPERATORS) {
                condition.anidb.push(AniDbClause {
                    comparison,
                    operand: AniDbEpisode::parse_operand(operand),
                });
                continue;
            }
            if let Some((comparison, operand)) = split_operator(clause, &EPISODE_OPERATORS) {
                if let Some(value) = parse_leading_int(operand) {
                    condition.episode.push((comparison, value));
                }
                continue;
            }
            if clause.chars().all(|c| c.is_ascii_digit()) {
                if let Ok(value) = clause.parse::<i64>() {
                    condition.episode.push((Comparison::Eq, value));
                }
            }
        }

        condition
    }

    /// Checks the expression against a file's metadata.
    pub fn matches(&self, metadata: &LocalFileMetadata) -> bool {
        let episode = i64::from(metadata.episode);
        if !self
            .episode
            .iter()
            .all(|(comparison, value)| comparison.holds(episode, *value))
        {
            return false;
        }

        if !self.anidb.is_empty() {
            let actual = AniDbEpisode::parse_lenient(&metadata.anidb_episode);
            if !self.anidb.iter().all(|clause| clause.holds(&actual)) {
                return false;
            }
        }

        if let Some(types) = &self.types {
            if !types.contains(&metadata.file_type) {
                return false;
            }
        }
        if let Some(excluded) = &self.excluded_types {
            if excluded.contains(&metadata.file_type) {
                return false;
            }
        }
        true
    }
}

fn split_operator<'a>(
    clause: &'a str,
    operators: &[(&str, Comparison)],
) -> Option<(Comparison, &'a str)> {
    operators.iter().find_map(|(token, comparison)| {
        clause
            .strip_prefix(token)
            .map(|operand| (*comparison, operand))
    })
}

fn parse_type_list(list: &str) -> Vec<LocalFileType> {
    list.split('|').filter_map(LocalFileType::parse).collect()
}
