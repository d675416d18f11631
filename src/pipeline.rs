//! Description and classification for one fly: prompt, complete, parse, map,
//! expand. Each step waits on the one before it.

use crate::completion::{CompletionError, CompletionService};
use crate::expand::{expand_water_types, expand_weather};
use crate::prompt::{description_prompt, details_prompt};
use crate::record::FlyDetails;
use crate::response::{ParsedDetails, parse_details};
use crate::season::SeasonWindow;
use crate::vocab::{filter_water_types, map_seasons, map_weather, snap_depth};
use log::debug;

/// Map parsed fields onto the vocabularies and apply one expansion pass.
pub fn normalize(description: String, parsed: &ParsedDetails) -> FlyDetails {
    let temperature = parsed.temperature();
    let window = SeasonWindow::default();

    FlyDetails {
        description,
        categories: parsed.categories.clone(),
        season: map_seasons(&parsed.seasons),
        water_type: expand_water_types(&filter_water_types(&parsed.water_types)),
        weather_conditions: expand_weather(&map_weather(&parsed.weather_conditions)),
        target_species: parsed.target_species.clone(),
        temp_min: temperature.min,
        temp_max: temperature.max,
        season_start: window.start,
        season_end: window.end,
        depth: parsed.depth.as_deref().and_then(snap_depth),
    }
}

pub async fn describe_and_classify<C>(
    completion: &C,
    fly_name: &str,
) -> Result<FlyDetails, CompletionError>
where
    C: CompletionService + ?Sized,
{
    let description = completion.complete(&description_prompt(fly_name)).await?;
    let response = completion
        .complete(&details_prompt(fly_name, &description))
        .await?;
    debug!("classification for {}: {}", fly_name, response);

    Ok(normalize(description, &parse_details(&response)))
}
