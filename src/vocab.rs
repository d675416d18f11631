//! Controlled vocabularies for fly classification and the mappers that snap
//! free text onto them.
//!
//! Every mapper drops what it does not recognise. Completion output is loose
//! in both format and wording, so only canonical values ever leave this module.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

macro_rules! vocabulary {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $label:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $label)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownTerm;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($label => Ok($name::$variant),)+
                    other => Err(UnknownTerm(other.to_string())),
                }
            }
        }
    };
}

/// A value that is not part of a controlled vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown vocabulary term: {0:?}")]
pub struct UnknownTerm(pub String);

vocabulary! {
    Season {
        Winter => "Winter",
        Spring => "Spring",
        Summer => "Summer",
        Fall => "Fall",
    }
}

vocabulary! {
    WaterType {
        Lakes => "Lakes",
        Rivers => "Rivers",
        SaltWater => "Salt Water",
        Streams => "Streams",
    }
}

vocabulary! {
    /// Weather vocabulary, in the order the admin surface lists it.
    WeatherCondition {
        ClearSunny => "Clear, Sunny",
        MostlyClear => "Mostly Clear",
        PartlyCloudy => "Partly Cloudy",
        MostlyCloudy => "Mostly Cloudy",
        Cloudy => "Cloudy",
        Fog => "Fog",
        LightFog => "Light Fog",
        Drizzle => "Drizzle",
        Rain => "Rain",
        LightRain => "Light Rain",
        HeavyRain => "Heavy Rain",
        Snow => "Snow",
        Flurries => "Flurries",
        LightSnow => "Light Snow",
        HeavySnow => "Heavy Snow",
        FreezingDrizzle => "Freezing Drizzle",
        FreezingRain => "Freezing Rain",
        LightFreezingRain => "Light Freezing Rain",
        HeavyFreezingRain => "Heavy Freezing Rain",
        IcePellets => "Ice Pellets",
        HeavyIcePellets => "Heavy Ice Pellets",
        LightIcePellets => "Light Ice Pellets",
        Thunderstorm => "Thunderstorm",
    }
}

vocabulary! {
    FishingDepth {
        Surface => "Surface",
        Film => "Film",
        Subsurface => "Subsurface",
        MidColumn => "Mid-Column",
        Deep => "Deep",
    }
}

/// Fly types offered to the completion service. Categories are stored as
/// free strings since this list has changed between catalog revisions.
pub const FLY_CATEGORIES: &[&str] = &[
    "Dry Fly",
    "Wet Fly",
    "Nymph",
    "Streamer",
    "Buzzer",
    "Emerger",
    "Salmon Fly",
    "Terrestrial",
];

/// Substring rules tried after an exact match fails. Order matters: the
/// qualified phrases must be checked before the bare words they contain.
const WEATHER_HEURISTICS: &[(&str, WeatherCondition)] = &[
    ("mostly clear", WeatherCondition::MostlyClear),
    ("partly cloudy", WeatherCondition::PartlyCloudy),
    ("mostly cloudy", WeatherCondition::MostlyCloudy),
    ("light fog", WeatherCondition::LightFog),
    ("light rain", WeatherCondition::LightRain),
    ("heavy rain", WeatherCondition::HeavyRain),
    ("light snow", WeatherCondition::LightSnow),
    ("heavy snow", WeatherCondition::HeavySnow),
    ("freezing drizzle", WeatherCondition::FreezingDrizzle),
    ("light freezing", WeatherCondition::LightFreezingRain),
    ("heavy freezing", WeatherCondition::HeavyFreezingRain),
    ("freezing", WeatherCondition::FreezingRain),
    ("light ice", WeatherCondition::LightIcePellets),
    ("heavy ice", WeatherCondition::HeavyIcePellets),
    ("fog", WeatherCondition::Fog),
    ("drizzle", WeatherCondition::Drizzle),
    ("rain", WeatherCondition::Rain),
    ("snow", WeatherCondition::Snow),
    ("flurries", WeatherCondition::Flurries),
    ("ice", WeatherCondition::IcePellets),
    ("thunder", WeatherCondition::Thunderstorm),
    ("cloudy", WeatherCondition::Cloudy),
];

/// Snap one free-text weather token onto the vocabulary.
pub fn snap_weather(token: &str) -> Option<WeatherCondition> {
    let token = token.trim();
    if let Ok(exact) = token.parse() {
        return Some(exact);
    }
    if token.eq_ignore_ascii_case("clear") || token.eq_ignore_ascii_case("sunny") {
        return Some(WeatherCondition::ClearSunny);
    }

    let normalized = token.to_lowercase();
    WEATHER_HEURISTICS
        .iter()
        .find(|(needle, _)| normalized.contains(needle))
        .map(|(_, condition)| *condition)
}

pub fn map_weather<S: AsRef<str>>(tokens: &[S]) -> BTreeSet<WeatherCondition> {
    tokens
        .iter()
        .filter_map(|token| snap_weather(token.as_ref()))
        .collect()
}

/// Seasons are matched by containment, so "late spring" still counts and
/// "autumn" is read as Fall.
pub fn map_seasons<S: AsRef<str>>(tokens: &[S]) -> BTreeSet<Season> {
    let mut seasons = BTreeSet::new();
    for token in tokens {
        let normalized = token.as_ref().trim().to_lowercase();
        if normalized.contains("winter") {
            seasons.insert(Season::Winter);
        }
        if normalized.contains("spring") {
            seasons.insert(Season::Spring);
        }
        if normalized.contains("summer") {
            seasons.insert(Season::Summer);
        }
        if normalized.contains("fall") || normalized.contains("autumn") {
            seasons.insert(Season::Fall);
        }
    }
    seasons
}

/// Water types get no fuzzy matching at all: exact canonical names only.
pub fn filter_water_types<S: AsRef<str>>(tokens: &[S]) -> BTreeSet<WaterType> {
    tokens
        .iter()
        .filter_map(|token| token.as_ref().trim().parse().ok())
        .collect()
}

/// Read a depth out of a loose label such as "Subsurface (for wet flies)".
pub fn snap_depth(text: &str) -> Option<FishingDepth> {
    let text = text.trim();
    if let Ok(exact) = text.parse() {
        return Some(exact);
    }

    let normalized = text.to_lowercase();
    if normalized.contains("mid-column") || normalized.contains("mid column") {
        Some(FishingDepth::MidColumn)
    } else if normalized.contains("subsurface") {
        Some(FishingDepth::Subsurface)
    } else if normalized.contains("surface") {
        Some(FishingDepth::Surface)
    } else if normalized.contains("film") {
        Some(FishingDepth::Film)
    } else if normalized.contains("deep") {
        Some(FishingDepth::Deep)
    } else {
        None
    }
}
