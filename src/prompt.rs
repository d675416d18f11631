//! Prompts sent to the completion service for one fly.

use crate::vocab::{FLY_CATEGORIES, Season, WaterType, WeatherCondition};

fn join_labels<T: std::fmt::Display>(values: &[T]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn description_prompt(fly_name: &str) -> String {
    format!(
        "Given the following fly fishing pattern: \"{fly_name}\", provide a detailed description of the fly pattern, its history, and how it's typically tied (2-3 sentences)."
    )
}

/// Classification prompt, seeded with the description returned for
/// [`description_prompt`]. Each field starts with the label that
/// [`crate::response::parse_details`] looks for.
pub fn details_prompt(fly_name: &str, description: &str) -> String {
    let categories = FLY_CATEGORIES.join(", ");
    let seasons = join_labels(Season::ALL);
    let water_types = join_labels(WaterType::ALL);
    let weather = join_labels(WeatherCondition::ALL);

    format!(
        r#"Using this description of the {fly_name}:
"{description}"

Provide specific details in this exact format:
Categories: [list all applicable fly types from these options: {categories}]
Season: [list applicable seasons from ONLY these options: {seasons}. Most flies work in multiple seasons, so list all that apply]
Water Types: [IMPORTANT: Most flies work effectively across multiple water types. List ALL water types where this fly pattern could reasonably be effective from these options: {water_types}. For example:
- If it works in Streams, it usually works in Rivers too
- Most freshwater patterns work in both Rivers and Lakes
- Only include Salt Water for specific saltwater patterns
Please be comprehensive in listing all applicable water types.]
Weather Conditions: [IMPORTANT: List at least 3-4 weather conditions when this fly is most effective. Most flies work in various weather conditions. Use ONLY these exact terms and be comprehensive: {weather}. For example:
- If it works in Cloudy conditions, it likely works in Mostly Cloudy and Partly Cloudy too
- Many dry flies work well in Clear, Sunny, and Partly Cloudy conditions
- Many nymphs work across multiple weather conditions including cloudy and light rain]
Target Species: [list specific fish species this fly is designed to catch]
Temperature Range: [specific min-max in Celsius when this fly is most effective]
Fishing Depth: [specify one of these options:
- Surface (for dry flies and terrestrials)
- Film (for emergers and spent flies)
- Subsurface (for wet flies and shallow nymphs)
- Mid-Column (for nymphs and streamers)
- Deep (for heavy nymphs and deep streamers)]"#
    )
}
