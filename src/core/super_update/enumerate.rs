//! Expansion of `${...}` enumeration tokens.
//!
//! `${}` becomes the bare item index. `${padding=3; start=10; increment=2}`
//! computes `start + index * increment` and left-pads it with zeros.

use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::LazyLock;

use super::parse_leading_int;

static PARAM_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([^}]+)\}").expect("enumeration token pattern is valid")
});

/// Widest zero padding a token may ask for. No file name is longer.
pub const MAX_PADDING: i64 = 255;

/// Replaces every enumeration token in `text` for the item at `index`.
///
/// Returns `None` when a token cannot be evaluated: its value overflows, or
/// its padding exceeds [`MAX_PADDING`]. Callers keep the text they started
/// from in that case.
pub fn apply_enumeration_pattern(text: &str, index: usize) -> Option<String> {
    let text = text.replace("${}", &index.to_string());
    let mut invalid = false;

    let expanded = PARAM_TOKEN
        .replace_all(&text, |caps: &Captures<'_>| {
            match evaluate_token(&caps[1], index) {
                Some(value) => value,
                None => {
                    invalid = true;
                    String::new()
                }
            }
        })
        .into_owned();

    (!invalid).then_some(expanded)
}

fn evaluate_token(params: &str, index: usize) -> Option<String> {
    let params = parse_params(params);
    // Zero values fall back to the defaults, so `increment=0` still steps by one.
    let padding = params.get("padding").copied().filter(|v| *v != 0).unwrap_or(0);
    let increment = params.get("increment").copied().filter(|v| *v != 0).unwrap_or(1);
    let start = params.get("start").copied().filter(|v| *v != 0).unwrap_or(0);

    if padding > MAX_PADDING {
        return None;
    }
    let value = i64::try_from(index)
        .ok()?
        .checked_mul(increment)?
        .checked_add(start)?
        .to_string();

    Some(if padding > 0 {
        pad_start(&value, padding as usize)
    } else {
        value
    })
}

/// Parses `key=value; key=value` pairs, keeping only integer values.
fn parse_params(params: &str) -> HashMap<String, i64> {
    let mut map = HashMap::new();
    for pair in params.split(';') {
        let mut parts = pair.split('=');
        let (Some(key), Some(value)) = (parts.next(), parts.next()) else {
            continue;
        };
        if key.is_empty() || value.is_empty() {
            continue;
        }
        if let Some(number) = parse_leading_int(value.trim()) {
            map.insert(key.trim().to_string(), number);
        }
    }
    map
}

fn pad_start(value: &str, width: usize) -> String {
    let len = value.chars().count();
    if len >= width {
        return value.to_string();
    }
    format!("{}{value}", "0".repeat(width - len))
}
