use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::domain::enums::{ExperienceLevel, FarmSize, Season, SoilType, WaterLevel};
use crate::error::ValidationError;

/// Normalized Indian state name, title-cased per word ("tamil nadu" parses
/// to "Tamil Nadu").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StateName(String);

impl StateName {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyStateName);
        }

        let normalized = trimmed
            .split_whitespace()
            .map(title_case_word)
            .collect::<Vec<_>>()
            .join(" ");

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for StateName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for StateName {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<StateName> for String {
    fn from(value: StateName) -> Self {
        value.0
    }
}

fn title_case_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => {
            first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
        }
        None => String::new(),
    }
}

/// Caller-supplied farming context for a recommendation request.
///
/// Validated at construction; the recommendation engine itself assumes a
/// well-formed profile (a malformed one reaching it indicates a bug in the
/// calling layer, not an external-world condition).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FarmingProfile {
    pub soil_type: SoilType,
    pub season: Season,
    pub state: StateName,
    pub district: Option<String>,
    pub ph_override: Option<f64>,
    pub water_availability: WaterLevel,
    pub experience: ExperienceLevel,
    pub farm_size: FarmSize,
}

impl FarmingProfile {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        soil_type: SoilType,
        season: Season,
        state: StateName,
        district: Option<String>,
        ph_override: Option<f64>,
        water_availability: WaterLevel,
        experience: ExperienceLevel,
        farm_size: FarmSize,
    ) -> Result<Self, ValidationError> {
        if let Some(ph) = ph_override {
            if !ph.is_finite() {
                return Err(ValidationError::NonFiniteValue { field: "ph_override" });
            }
            if !(0.0..=14.0).contains(&ph) {
                return Err(ValidationError::PhOutOfBounds { value: ph });
            }
        }

        Ok(Self {
            soil_type,
            season,
            state,
            district: district.map(|d| d.trim().to_owned()).filter(|d| !d.is_empty()),
            ph_override,
            water_availability,
            experience,
            farm_size,
        })
    }
}
