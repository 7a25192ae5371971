use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Broad soil classification used by the crop catalogue and soil signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoilType {
    Clay,
    Loamy,
    Silty,
    Sandy,
    Black,
    Red,
    Alluvial,
    WellDrained,
}

impl SoilType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Clay => "clay",
            Self::Loamy => "loamy",
            Self::Silty => "silty",
            Self::Sandy => "sandy",
            Self::Black => "black",
            Self::Red => "red",
            Self::Alluvial => "alluvial",
            Self::WellDrained => "well_drained",
        }
    }
}

impl Display for SoilType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SoilType {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match normalize(value).as_str() {
            "clay" => Ok(Self::Clay),
            "loamy" | "loam" => Ok(Self::Loamy),
            "silty" | "silt" => Ok(Self::Silty),
            "sandy" | "sand" => Ok(Self::Sandy),
            "black" => Ok(Self::Black),
            "red" => Ok(Self::Red),
            "alluvial" => Ok(Self::Alluvial),
            "well_drained" => Ok(Self::WellDrained),
            other => Err(ValidationError::InvalidSoilType {
                value: other.to_owned(),
            }),
        }
    }
}

/// Indian cropping season. `YearRound` acts as a wildcard: a crop listing it
/// is compatible with every requested season.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    Kharif,
    Rabi,
    Summer,
    Monsoon,
    Winter,
    YearRound,
}

impl Season {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Kharif => "kharif",
            Self::Rabi => "rabi",
            Self::Summer => "summer",
            Self::Monsoon => "monsoon",
            Self::Winter => "winter",
            Self::YearRound => "year_round",
        }
    }
}

impl Display for Season {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Season {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match normalize(value).as_str() {
            "kharif" => Ok(Self::Kharif),
            "rabi" => Ok(Self::Rabi),
            "summer" => Ok(Self::Summer),
            "monsoon" => Ok(Self::Monsoon),
            "winter" => Ok(Self::Winter),
            "year_round" | "yearround" => Ok(Self::YearRound),
            other => Err(ValidationError::InvalidSeason {
                value: other.to_owned(),
            }),
        }
    }
}

/// Ordered water level, used both for a crop's requirement and for the
/// caller's stated availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaterLevel {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl WaterLevel {
    pub const ALL: [Self; 4] = [Self::Low, Self::Medium, Self::High, Self::VeryHigh];

    /// Ordinal position, 1 (low) through 4 (very high).
    pub const fn rank(self) -> i8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
            Self::VeryHigh => 4,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::VeryHigh => "very_high",
        }
    }
}

impl Display for WaterLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WaterLevel {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match normalize(value).as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "very_high" | "veryhigh" => Ok(Self::VeryHigh),
            other => Err(ValidationError::InvalidWaterLevel {
                value: other.to_owned(),
            }),
        }
    }
}

/// Self-reported farming experience.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceLevel {
    Beginner,
    Intermediate,
    Expert,
}

impl FromStr for ExperienceLevel {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match normalize(value).as_str() {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "expert" => Ok(Self::Expert),
            other => Err(ValidationError::InvalidExperienceLevel {
                value: other.to_owned(),
            }),
        }
    }
}

/// Farm size category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FarmSize {
    Small,
    Medium,
    Large,
}

impl FromStr for FarmSize {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match normalize(value).as_str() {
            "small" => Ok(Self::Small),
            "medium" => Ok(Self::Medium),
            "large" => Ok(Self::Large),
            other => Err(ValidationError::InvalidFarmSize {
                value: other.to_owned(),
            }),
        }
    }
}

/// Soil macronutrient tracked by survey datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Nutrient {
    Nitrogen,
    Phosphorus,
    Potassium,
    OrganicCarbon,
}

impl Nutrient {
    pub const ALL: [Self; 4] = [
        Self::Nitrogen,
        Self::Phosphorus,
        Self::Potassium,
        Self::OrganicCarbon,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Nitrogen => "nitrogen",
            Self::Phosphorus => "phosphorus",
            Self::Potassium => "potassium",
            Self::OrganicCarbon => "organic_carbon",
        }
    }
}

impl Display for Nutrient {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classified nutrient status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NutrientLevel {
    Low,
    Medium,
    High,
}

impl NutrientLevel {
    /// Classify a raw survey value against agronomic guideline thresholds
    /// (kg/ha for N/P/K, percent for organic carbon).
    pub fn classify(nutrient: Nutrient, value: f64) -> Self {
        let (low, medium) = match nutrient {
            Nutrient::Nitrogen => (280.0, 560.0),
            Nutrient::Phosphorus => (10.0, 25.0),
            Nutrient::Potassium => (110.0, 280.0),
            Nutrient::OrganicCarbon => (0.5, 0.75),
        };

        if value < low {
            Self::Low
        } else if value < medium {
            Self::Medium
        } else {
            Self::High
        }
    }
}

fn normalize(value: &str) -> String {
    value.trim().to_ascii_lowercase().replace(['-', ' '], "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_soil_types_case_insensitively() {
        assert_eq!("Loamy".parse::<SoilType>().expect("valid"), SoilType::Loamy);
        assert_eq!(
            "well-drained".parse::<SoilType>().expect("valid"),
            SoilType::WellDrained
        );
    }

    #[test]
    fn rejects_unknown_season() {
        let err = "spring".parse::<Season>().expect_err("must fail");
        assert!(matches!(err, ValidationError::InvalidSeason { .. }));
    }

    #[test]
    fn water_levels_are_totally_ordered() {
        assert!(WaterLevel::Low < WaterLevel::Medium);
        assert!(WaterLevel::High < WaterLevel::VeryHigh);
        assert_eq!(WaterLevel::VeryHigh.rank() - WaterLevel::Low.rank(), 3);
    }

    #[test]
    fn classifies_nutrients_against_thresholds() {
        assert_eq!(
            NutrientLevel::classify(Nutrient::Nitrogen, 150.0),
            NutrientLevel::Low
        );
        assert_eq!(
            NutrientLevel::classify(Nutrient::Phosphorus, 15.0),
            NutrientLevel::Medium
        );
        assert_eq!(
            NutrientLevel::classify(Nutrient::OrganicCarbon, 0.9),
            NutrientLevel::High
        );
    }
}
