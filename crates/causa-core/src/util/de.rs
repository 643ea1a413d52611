//! Field deserializers that also accept the string form of a value.
//!
//! Environment overlays hand every value over as a string, so a config
//! setting like `CAUSA_ANALYSIS_DETECT_CYCLES=false` arrives as
//! `detect_cycles = "false"`. Use these with `#[serde(deserialize_with)]`
//! on typed fields that must survive that round trip. Native TOML/JSON
//! values keep working unchanged.

use serde::de::{Deserializer, Error as _};
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(untagged)]
enum BoolOrString {
    Bool(bool),
    Str(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CountOrString {
    Count(u64),
    Str(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListOrString {
    List(Vec<String>),
    Str(String),
}

/// A boolean, or one of `true/false/1/0/yes/no/on/off` (case-insensitive).
pub fn bool_or_string<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match BoolOrString::deserialize(deserializer)? {
        BoolOrString::Bool(b) => Ok(b),
        BoolOrString::Str(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            other => Err(D::Error::custom(format!("expected a boolean, got '{other}'"))),
        },
    }
}

/// An optional count; an empty string means unset.
pub fn opt_usize_or_string<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match Option::<CountOrString>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(CountOrString::Count(n)) => n,
        Some(CountOrString::Str(s)) if s.trim().is_empty() => return Ok(None),
        Some(CountOrString::Str(s)) => s
            .trim()
            .parse::<u64>()
            .map_err(|_| D::Error::custom(format!("expected a non-negative integer, got '{s}'")))?,
    };
    usize::try_from(value)
        .map(Some)
        .map_err(|_| D::Error::custom(format!("{value} is out of range")))
}

/// A list of strings, or one comma-separated string (blank items dropped).
pub fn list_or_comma_string<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match ListOrString::deserialize(deserializer)? {
        ListOrString::List(items) => items,
        ListOrString::Str(s) => s
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(String::from)
            .collect(),
    })
}
