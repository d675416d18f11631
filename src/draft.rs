//! Editable copy of a fly. Edits arrive as typed patches; each patch yields
//! a new draft and is validated on arrival, so an invalid draft never exists.

use crate::error::ValidationError;
use crate::record::{Fly, FlyDetails, FlyId, NewFly};
use crate::season::{FALLBACK_TEMP_MAX, FALLBACK_TEMP_MIN, SeasonWindow, TemperatureRange};
use crate::vocab::{
    FishingDepth, Season, WaterType, WeatherCondition, filter_water_types, map_seasons,
    map_weather, snap_depth,
};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum DetailsPatch {
    Name(String),
    ImageUrl(Option<String>),
    Description(String),
    Categories(Vec<String>),
    Seasons(BTreeSet<Season>),
    WaterTypes(BTreeSet<WaterType>),
    WeatherConditions(BTreeSet<WeatherCondition>),
    TargetSpecies(Vec<String>),
    Temperature { min: f64, max: f64 },
    SeasonWindow { start: u8, end: u8 },
    Depth(Option<FishingDepth>),
    /// Replace every derived field at once, as classification does.
    Classified(FlyDetails),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlyDraft {
    id: Option<FlyId>,
    name: String,
    image_url: Option<String>,
    description: String,
    categories: Vec<String>,
    season: BTreeSet<Season>,
    water_type: BTreeSet<WaterType>,
    weather_conditions: BTreeSet<WeatherCondition>,
    target_species: Vec<String>,
    temperature: TemperatureRange,
    season_window: SeasonWindow,
    depth: Option<FishingDepth>,
}

impl FlyDraft {
    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        let draft = Self {
            id: None,
            name: name.into().trim().to_string(),
            image_url: None,
            description: String::new(),
            categories: Vec::new(),
            season: BTreeSet::new(),
            water_type: BTreeSet::new(),
            weather_conditions: BTreeSet::new(),
            target_species: Vec::new(),
            temperature: TemperatureRange::default(),
            season_window: SeasonWindow::default(),
            depth: None,
        };
        draft.validate()?;
        Ok(draft)
    }

    /// Start editing a stored fly. Stored tags are snapped onto the
    /// vocabularies; unknown spellings are dropped. A stored temperature
    /// range that does not validate is replaced by the fallback range.
    pub fn from_fly(fly: &Fly) -> Self {
        let stored = TemperatureRange {
            min: fly.temp_min.unwrap_or(FALLBACK_TEMP_MIN),
            max: fly.temp_max.unwrap_or(FALLBACK_TEMP_MAX),
        };
        let temperature = match stored.validate() {
            Ok(()) => stored,
            Err(e) => {
                warn!("Stored temperature range of {} is invalid ({}); using fallback", fly.name, e);
                TemperatureRange::default()
            }
        };
        Self {
            id: Some(fly.id.clone()),
            name: fly.name.clone(),
            image_url: fly.image_url.clone(),
            description: fly.description.clone().unwrap_or_default(),
            categories: fly.categories.clone(),
            season: map_seasons(&fly.season),
            water_type: filter_water_types(&fly.water_type),
            weather_conditions: map_weather(&fly.weather_conditions),
            target_species: fly.target_species.clone(),
            temperature,
            season_window: fly.season_window().unwrap_or_default(),
            depth: fly.depth.as_deref().and_then(snap_depth),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.is_empty() {
            return Err(ValidationError::MissingName);
        }
        self.temperature.validate()
    }

    pub fn apply(&self, patch: DetailsPatch) -> Result<Self, ValidationError> {
        let mut next = self.clone();
        match patch {
            DetailsPatch::Name(name) => next.name = name.trim().to_string(),
            DetailsPatch::ImageUrl(url) => next.image_url = url,
            DetailsPatch::Description(description) => next.description = description,
            DetailsPatch::Categories(categories) => {
                next.categories = categories
                    .into_iter()
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty())
                    .collect()
            }
            DetailsPatch::Seasons(season) => next.season = season,
            DetailsPatch::WaterTypes(water_type) => next.water_type = water_type,
            DetailsPatch::WeatherConditions(weather) => next.weather_conditions = weather,
            DetailsPatch::TargetSpecies(species) => {
                next.target_species = species
                    .into_iter()
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            }
            DetailsPatch::Temperature { min, max } => {
                next.temperature = TemperatureRange::new(min, max)?
            }
            DetailsPatch::SeasonWindow { start, end } => {
                next.season_window = SeasonWindow::new(start, end)?
            }
            DetailsPatch::Depth(depth) => next.depth = depth,
            DetailsPatch::Classified(details) => {
                next.temperature = details.temperature();
                next.season_window = SeasonWindow {
                    start: details.season_start,
                    end: details.season_end,
                };
                next.description = details.description;
                next.categories = details.categories;
                next.season = details.season;
                next.water_type = details.water_type;
                next.weather_conditions = details.weather_conditions;
                next.target_species = details.target_species;
                next.depth = details.depth;
            }
        }
        next.validate()?;
        Ok(next)
    }

    pub fn apply_all(
        &self,
        patches: impl IntoIterator<Item = DetailsPatch>,
    ) -> Result<Self, ValidationError> {
        patches
            .into_iter()
            .try_fold(self.clone(), |draft, patch| draft.apply(patch))
    }

    pub fn details(&self) -> FlyDetails {
        FlyDetails {
            description: self.description.clone(),
            categories: self.categories.clone(),
            season: self.season.clone(),
            water_type: self.water_type.clone(),
            weather_conditions: self.weather_conditions.clone(),
            target_species: self.target_species.clone(),
            temp_min: self.temperature.min,
            temp_max: self.temperature.max,
            season_start: self.season_window.start,
            season_end: self.season_window.end,
            depth: self.depth,
        }
    }

    pub fn to_new_fly(&self) -> NewFly {
        NewFly {
            name: self.name.clone(),
            image_url: self.image_url.clone(),
            created_at: Some(chrono::Utc::now().to_rfc3339()),
            details: Some(self.details()),
        }
    }
}
