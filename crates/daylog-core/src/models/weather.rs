//! Weather tag
//!
//! Variant names match the `main` condition strings reported by the weather
//! service, so a lookup result deserializes straight into a tag.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Weather {
    Thunderstorm,
    Drizzle,
    Rain,
    Snow,
    Clear,
    Clouds,
    Mist,
    Smoke,
    Haze,
    Dust,
    Fog,
    Sand,
    Ash,
    Squall,
    Tornado,
}

impl Weather {
    pub const ALL: [Self; 15] = [
        Self::Thunderstorm,
        Self::Drizzle,
        Self::Rain,
        Self::Snow,
        Self::Clear,
        Self::Clouds,
        Self::Mist,
        Self::Smoke,
        Self::Haze,
        Self::Dust,
        Self::Fog,
        Self::Sand,
        Self::Ash,
        Self::Squall,
        Self::Tornado,
    ];

    /// Conditions offered for manual selection.
    pub const SELECTABLE: [Self; 7] = [
        Self::Thunderstorm,
        Self::Drizzle,
        Self::Rain,
        Self::Snow,
        Self::Clear,
        Self::Clouds,
        Self::Mist,
    ];

    /// Emoji shown for the condition. Several conditions share one label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Clear => "☀️",
            Self::Rain => "🌧",
            Self::Clouds => "☁️",
            Self::Snow => "❄️",
            Self::Drizzle => "🌦",
            Self::Thunderstorm => "⛈",
            Self::Mist | Self::Smoke | Self::Haze | Self::Fog => "🌫️",
            Self::Dust | Self::Sand | Self::Squall | Self::Tornado => "🌪️",
            Self::Ash => "🌋",
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Thunderstorm => "Thunderstorm",
            Self::Drizzle => "Drizzle",
            Self::Rain => "Rain",
            Self::Snow => "Snow",
            Self::Clear => "Clear",
            Self::Clouds => "Clouds",
            Self::Mist => "Mist",
            Self::Smoke => "Smoke",
            Self::Haze => "Haze",
            Self::Dust => "Dust",
            Self::Fog => "Fog",
            Self::Sand => "Sand",
            Self::Ash => "Ash",
            Self::Squall => "Squall",
            Self::Tornado => "Tornado",
        }
    }
}

impl fmt::Display for Weather {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Weather {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|weather| weather.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown weather '{wanted}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn foggy_conditions_share_a_label() {
        assert_eq!(Weather::Mist.label(), Weather::Fog.label());
        assert_eq!(Weather::Haze.label(), Weather::Smoke.label());
        assert_ne!(Weather::Clear.label(), Weather::Rain.label());
    }

    #[test]
    fn deserializes_service_condition_names() {
        let weather: Weather = serde_json::from_str("\"Thunderstorm\"").unwrap();
        assert_eq!(weather, Weather::Thunderstorm);
        assert_eq!("clouds".parse::<Weather>().unwrap(), Weather::Clouds);
    }
}
