use crate::season::{Month, SeasonWindow, TemperatureRange};
use crate::vocab::{FishingDepth, Season, WaterType, WeatherCondition};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Surrogate key of a row in the flies table.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlyId(pub String);

impl fmt::Display for FlyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FlyId {
    fn from(id: &str) -> Self {
        FlyId(id.to_string())
    }
}

/// A row of the flies table as stored. Tag columns are kept as plain strings
/// because rows written by older admin screens use other spellings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fly {
    pub id: FlyId,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub categories: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub season: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub water_type: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub target_species: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub weather_conditions: Vec<String>,
    pub temp_min: Option<f64>,
    pub temp_max: Option<f64>,
    pub season_start: Option<Month>,
    pub season_end: Option<Month>,
    pub depth: Option<String>,
}

impl Default for Fly {
    fn default() -> Self {
        Self {
            id: FlyId(String::new()),
            name: String::new(),
            description: None,
            image_url: None,
            categories: Vec::new(),
            season: Vec::new(),
            water_type: Vec::new(),
            target_species: Vec::new(),
            weather_conditions: Vec::new(),
            temp_min: None,
            temp_max: None,
            season_start: None,
            season_end: None,
            depth: None,
        }
    }
}

impl Fly {
    /// Still waiting on classification: no description, categories or season.
    pub fn is_incomplete(&self) -> bool {
        self.description.as_deref().is_none_or(|d| d.trim().is_empty())
            || self.categories.is_empty()
            || self.season.is_empty()
    }

    pub fn season_window(&self) -> Option<SeasonWindow> {
        Some(SeasonWindow {
            start: self.season_start?,
            end: self.season_end?,
        })
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Every field classification derives for one fly, written in one update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlyDetails {
    pub description: String,
    pub categories: Vec<String>,
    pub season: BTreeSet<Season>,
    pub water_type: BTreeSet<WaterType>,
    pub weather_conditions: BTreeSet<WeatherCondition>,
    pub target_species: Vec<String>,
    pub temp_min: f64,
    pub temp_max: f64,
    pub season_start: Month,
    pub season_end: Month,
    pub depth: Option<FishingDepth>,
}

impl FlyDetails {
    pub fn temperature(&self) -> TemperatureRange {
        TemperatureRange {
            min: self.temp_min,
            max: self.temp_max,
        }
    }
}

/// Insert payload for the flies table. Absent fields are left to the
/// table's defaults.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NewFly {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub details: Option<FlyDetails>,
}

impl NewFly {
    pub fn stub(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            created_at: Some(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaitlistEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub email: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeletionStatus {
    Pending,
    Processed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeletionRequest {
    pub email: String,
    pub status: DeletionStatus,
}
