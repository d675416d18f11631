//! Implication rules that broaden a mapped tag set.
//!
//! Each rule reads the input set only, so one call is a single pass: a tag
//! added here never triggers another rule in the same call.

use crate::vocab::{WaterType, WeatherCondition};
use std::collections::BTreeSet;

pub fn expand_water_types(input: &BTreeSet<WaterType>) -> BTreeSet<WaterType> {
    let mut expanded = input.clone();

    if input.contains(&WaterType::Streams) {
        expanded.insert(WaterType::Rivers);
    }
    if input.contains(&WaterType::Rivers) {
        expanded.insert(WaterType::Streams);
    }
    if input.contains(&WaterType::Rivers) || input.contains(&WaterType::Streams) {
        expanded.insert(WaterType::Lakes);
    }
    // Salt Water is only ever explicit.

    expanded
}

pub fn expand_weather(input: &BTreeSet<WeatherCondition>) -> BTreeSet<WeatherCondition> {
    use WeatherCondition::*;

    let mut expanded = input.clone();

    if input.contains(&ClearSunny) {
        expanded.insert(MostlyClear);
    }
    if input.contains(&Cloudy) {
        expanded.extend([MostlyCloudy, PartlyCloudy]);
    }
    if input.contains(&LightRain) {
        expanded.insert(Drizzle);
    }
    if input.contains(&HeavyRain) {
        expanded.extend([LightRain, Rain]);
    }
    if input.contains(&HeavySnow) {
        expanded.extend([LightSnow, Snow]);
    }

    expanded
}
