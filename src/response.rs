//! Pulls labeled fields out of a free-text classification completion.
//!
//! Parsing never fails. A missing or garbled field comes back empty (or
//! `None`), and the caller decides the default. Malformed output is therefore
//! swallowed rather than reported; the debug log is the only trace of it.

use crate::season::{FALLBACK_TEMP_MAX, FALLBACK_TEMP_MIN, TemperatureRange};
use log::debug;
use regex::Regex;
use std::sync::LazyLock;

pub const FIELD_LABELS: [&str; 7] = [
    "Categories",
    "Season",
    "Water Types",
    "Weather Conditions",
    "Target Species",
    "Temperature Range",
    "Fishing Depth",
];

static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"["'][^"']+["']|\S+"#).expect("token pattern"));

// A sign only binds when it is not acting as the range separator.
static NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^\d.])(-?)(\d+(?:\.\d+)?)").expect("number pattern")
});

static FIELDS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    FIELD_LABELS
        .iter()
        .map(|label| {
            let pattern = format!(r"{}:[ \t]*(.*)", regex::escape(label));
            (*label, Regex::new(&pattern).expect("field pattern"))
        })
        .collect()
});

/// Fields as read from the completion, before vocabulary mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedDetails {
    pub categories: Vec<String>,
    pub seasons: Vec<String>,
    pub water_types: Vec<String>,
    pub weather_conditions: Vec<String>,
    pub target_species: Vec<String>,
    pub temp_min: Option<f64>,
    pub temp_max: Option<f64>,
    pub depth: Option<String>,
}

impl ParsedDetails {
    /// Parsed range with each missing bound replaced by its fallback. A
    /// merged range that is inverted falls back as a whole.
    pub fn temperature(&self) -> TemperatureRange {
        let merged = TemperatureRange {
            min: self.temp_min.unwrap_or(FALLBACK_TEMP_MIN),
            max: self.temp_max.unwrap_or(FALLBACK_TEMP_MAX),
        };
        match merged.validate() {
            Ok(()) => merged,
            Err(e) => {
                debug!("discarding parsed temperature range: {}", e);
                TemperatureRange::default()
            }
        }
    }
}

/// Content after `Label:` up to the end of that line. Only the labels in
/// [`FIELD_LABELS`] are recognised.
pub fn field<'a>(text: &'a str, label: &str) -> Option<&'a str> {
    let (_, re) = FIELDS.iter().find(|(known, _)| *known == label)?;
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
}

/// Quoted segments stay whole, anything else splits on whitespace. Quotes,
/// list brackets and separators are stripped from each token.
pub fn tokenize(content: &str) -> Vec<String> {
    TOKEN
        .find_iter(content)
        .map(|m| {
            m.as_str()
                .trim_matches(|c: char| matches!(c, '"' | '\'' | ',' | ';' | '[' | ']' | '.'))
                .trim()
                .to_string()
        })
        .filter(|token| !token.is_empty())
        .collect()
}

fn tokens_for(text: &str, label: &str) -> Vec<String> {
    match field(text, label) {
        Some(content) => tokenize(content),
        None => {
            debug!("completion has no {:?} field", label);
            Vec::new()
        }
    }
}

/// First two numbers of a "min-max" range, e.g. `8-18`, `-2 - 10°C`,
/// `10 to 20`.
pub fn parse_temperature(content: &str) -> (Option<f64>, Option<f64>) {
    let mut numbers = NUMBER.captures_iter(content).filter_map(|caps| {
        let sign = caps.get(1).map_or("", |m| m.as_str());
        let digits = caps.get(2)?.as_str();
        format!("{sign}{digits}").parse::<f64>().ok()
    });
    (numbers.next(), numbers.next())
}

pub fn parse_details(text: &str) -> ParsedDetails {
    let (temp_min, temp_max) = match field(text, "Temperature Range") {
        Some(content) => parse_temperature(content),
        None => (None, None),
    };
    let depth = field(text, "Fishing Depth")
        .map(|d| d.trim_matches(|c: char| matches!(c, '[' | ']')).trim().to_string())
        .filter(|d| !d.is_empty());

    ParsedDetails {
        categories: tokens_for(text, "Categories"),
        seasons: tokens_for(text, "Season"),
        water_types: tokens_for(text, "Water Types"),
        weather_conditions: tokens_for(text, "Weather Conditions"),
        target_species: tokens_for(text, "Target Species"),
        temp_min,
        temp_max,
        depth,
    }
}
