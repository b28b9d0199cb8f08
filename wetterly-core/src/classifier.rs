//! Maps free-text condition descriptions to background categories.

use std::fmt;

/// Weather bucket used to pick a background asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionCategory {
    Clear,
    Cloudy,
    Rain,
    Thunderstorm,
    Snow,
    Default,
}

impl ConditionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionCategory::Clear => "clear",
            ConditionCategory::Cloudy => "cloudy",
            ConditionCategory::Rain => "rain",
            ConditionCategory::Thunderstorm => "thunderstorm",
            ConditionCategory::Snow => "snow",
            ConditionCategory::Default => "default",
        }
    }

    /// File name of the background video shown for this category.
    pub fn background_asset(&self) -> &'static str {
        match self {
            ConditionCategory::Clear => "clear_sky.mp4",
            ConditionCategory::Cloudy => "clouds.mp4",
            ConditionCategory::Rain => "shower.mp4",
            ConditionCategory::Thunderstorm => "thunderstorm.mp4",
            ConditionCategory::Snow => "snow.mp4",
            ConditionCategory::Default => "video.mp4",
        }
    }

    pub const fn all() -> &'static [ConditionCategory] {
        &[
            ConditionCategory::Clear,
            ConditionCategory::Cloudy,
            ConditionCategory::Rain,
            ConditionCategory::Thunderstorm,
            ConditionCategory::Snow,
            ConditionCategory::Default,
        ]
    }
}

impl fmt::Display for ConditionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered keyword table; the first row with a matching keyword wins.
const RULES: &[(&[&str], ConditionCategory)] = &[
    (&["clear"], ConditionCategory::Clear),
    (&["cloud"], ConditionCategory::Cloudy),
    // before rain: "thunderstorm with heavy rain" is a thunderstorm
    (&["thunder"], ConditionCategory::Thunderstorm),
    (&["rain", "drizzle"], ConditionCategory::Rain),
    (&["snow"], ConditionCategory::Snow),
];

/// Classify a condition description such as "light rain" or "few clouds".
///
/// Matching is case-insensitive substring containment. Every input maps to
/// exactly one category; anything unrecognised is [`ConditionCategory::Default`].
pub fn classify(description: &str) -> ConditionCategory {
    let lower = description.to_lowercase();

    RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(_, category)| *category)
        .unwrap_or(ConditionCategory::Default)
}
