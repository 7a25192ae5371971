//! Static crop catalogue: growing conditions, historical regions and
//! baseline economics per crop.

use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::domain::{Season, SoilType, StateName, WaterLevel};
use crate::error::ValidationError;

/// Validated crop identifier: lowercase ascii letters and underscores.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CropId(String);

impl CropId {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim().to_ascii_lowercase();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyCropId);
        }

        for (index, ch) in trimmed.chars().enumerate() {
            if !(ch.is_ascii_lowercase() || ch == '_') {
                return Err(ValidationError::CropIdInvalidChar { ch, index });
            }
        }

        Ok(Self(trimmed))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CropId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for CropId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CropId> for String {
    fn from(value: CropId) -> Self {
        value.0
    }
}

/// Closed numeric interval with a validated `min <= max` invariant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub min: f64,
    pub max: f64,
}

impl Span {
    pub fn new(field: &'static str, min: f64, max: f64) -> Result<Self, ValidationError> {
        if !min.is_finite() || !max.is_finite() {
            return Err(ValidationError::NonFiniteValue { field });
        }
        if min > max {
            return Err(ValidationError::InvalidRange { field, min, max });
        }
        Ok(Self { min, max })
    }

    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }

    /// Whether `value` lies within `margin` of the interval on either side.
    pub fn contains_within(&self, value: f64, margin: f64) -> bool {
        (self.min - margin..=self.max + margin).contains(&value)
    }

    pub fn average(&self) -> f64 {
        (self.min + self.max) / 2.0
    }
}

/// Static, immutable profile of one crop's growing conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropProfile {
    pub id: CropId,
    pub name: String,
    pub soils: BTreeSet<SoilType>,
    pub seasons: BTreeSet<Season>,
    pub ph: Span,
    pub water: WaterLevel,
    pub temperature_c: Span,
    pub states: BTreeSet<StateName>,
    /// Expected yield, quintals per acre.
    pub baseline_yield: Span,
    /// Historical mandi price, rupees per quintal; used when no live price
    /// is available and as the reference for premium detection.
    pub baseline_price: Span,
    pub growth_period_days: u16,
}

impl CropProfile {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: CropId,
        name: impl Into<String>,
        soils: BTreeSet<SoilType>,
        seasons: BTreeSet<Season>,
        ph: Span,
        water: WaterLevel,
        temperature_c: Span,
        states: BTreeSet<StateName>,
        baseline_yield: Span,
        baseline_price: Span,
        growth_period_days: u16,
    ) -> Result<Self, ValidationError> {
        if soils.is_empty() {
            return Err(ValidationError::EmptyCropSet {
                id: id.as_str().to_owned(),
                field: "soil type",
            });
        }
        if seasons.is_empty() {
            return Err(ValidationError::EmptyCropSet {
                id: id.as_str().to_owned(),
                field: "season",
            });
        }
        if states.is_empty() {
            return Err(ValidationError::EmptyCropSet {
                id: id.as_str().to_owned(),
                field: "state",
            });
        }

        Ok(Self {
            id,
            name: name.into(),
            soils,
            seasons,
            ph,
            water,
            temperature_c,
            states,
            baseline_yield,
            baseline_price,
            growth_period_days,
        })
    }

    /// Season compatibility, honoring the year-round wildcard.
    pub fn grows_in(&self, season: Season) -> bool {
        self.seasons.contains(&season) || self.seasons.contains(&Season::YearRound)
    }
}

/// Ordered catalogue of crop profiles. Declaration order is significant: it
/// is the tie-break for equally scored recommendations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropKnowledgeBase {
    profiles: Vec<CropProfile>,
}

impl CropKnowledgeBase {
    pub fn new(profiles: Vec<CropProfile>) -> Result<Self, ValidationError> {
        let mut seen = BTreeSet::new();
        for profile in &profiles {
            if !seen.insert(profile.id.as_str().to_owned()) {
                return Err(ValidationError::DuplicateCropId {
                    id: profile.id.as_str().to_owned(),
                });
            }
        }

        Ok(Self { profiles })
    }

    pub fn empty() -> Self {
        Self {
            profiles: Vec::new(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &CropProfile> {
        self.profiles.iter()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn profile(&self, id: &str) -> Option<&CropProfile> {
        self.profiles.iter().find(|p| p.id.as_str() == id)
    }

    /// Crops compatible with a season that are historically grown in the
    /// given state, in catalogue order.
    pub fn seasonal(&self, season: Season, state: &StateName) -> Vec<&CropProfile> {
        self.profiles
            .iter()
            .filter(|profile| profile.grows_in(season) && profile.states.contains(state))
            .collect()
    }

    /// The built-in catalogue of eight staple crops.
    pub fn builtin() -> Self {
        let entries = [
            CatalogueEntry {
                id: "rice",
                name: "Rice",
                soils: &[SoilType::Clay, SoilType::Loamy, SoilType::Silty],
                seasons: &[Season::Kharif, Season::Monsoon, Season::Winter],
                ph: (5.5, 7.0),
                water: WaterLevel::High,
                temperature_c: (20.0, 35.0),
                states: &["Kerala", "Tamil Nadu", "West Bengal", "Odisha", "Punjab"],
                baseline_yield: (15.0, 20.0),
                baseline_price: (1800.0, 2200.0),
                growth_period_days: 120,
            },
            CatalogueEntry {
                id: "wheat",
                name: "Wheat",
                soils: &[SoilType::Loamy, SoilType::Clay, SoilType::Sandy],
                seasons: &[Season::Winter, Season::Rabi],
                ph: (6.0, 7.5),
                water: WaterLevel::Medium,
                temperature_c: (15.0, 25.0),
                states: &["Punjab", "Haryana", "Uttar Pradesh", "Madhya Pradesh"],
                baseline_yield: (12.0, 18.0),
                baseline_price: (2000.0, 2500.0),
                growth_period_days: 110,
            },
            CatalogueEntry {
                id: "sugarcane",
                name: "Sugarcane",
                soils: &[SoilType::Loamy, SoilType::Clay, SoilType::Alluvial],
                seasons: &[Season::YearRound],
                ph: (6.0, 8.0),
                water: WaterLevel::VeryHigh,
                temperature_c: (20.0, 35.0),
                states: &["Maharashtra", "Uttar Pradesh", "Karnataka", "Tamil Nadu"],
                baseline_yield: (300.0, 500.0),
                baseline_price: (300.0, 400.0),
                growth_period_days: 365,
            },
            CatalogueEntry {
                id: "cotton",
                name: "Cotton",
                soils: &[SoilType::Black, SoilType::Loamy, SoilType::Sandy],
                seasons: &[Season::Kharif, Season::Summer],
                ph: (6.0, 8.0),
                water: WaterLevel::Medium,
                temperature_c: (21.0, 32.0),
                states: &["Gujarat", "Maharashtra", "Andhra Pradesh", "Telangana"],
                baseline_yield: (8.0, 15.0),
                baseline_price: (5000.0, 6500.0),
                growth_period_days: 180,
            },
            CatalogueEntry {
                id: "tomato",
                name: "Tomato",
                soils: &[SoilType::Loamy, SoilType::Sandy, SoilType::Red],
                seasons: &[Season::Winter, Season::Summer],
                ph: (6.0, 7.0),
                water: WaterLevel::Medium,
                temperature_c: (18.0, 29.0),
                states: &["Karnataka", "Andhra Pradesh", "Maharashtra", "Odisha"],
                baseline_yield: (150.0, 300.0),
                baseline_price: (800.0, 2000.0),
                growth_period_days: 75,
            },
            CatalogueEntry {
                id: "onion",
                name: "Onion",
                soils: &[SoilType::Loamy, SoilType::Sandy, SoilType::Alluvial],
                seasons: &[Season::Rabi, Season::Kharif],
                ph: (6.0, 7.5),
                water: WaterLevel::Medium,
                temperature_c: (15.0, 25.0),
                states: &["Maharashtra", "Karnataka", "Gujarat", "Rajasthan"],
                baseline_yield: (100.0, 200.0),
                baseline_price: (1000.0, 3000.0),
                growth_period_days: 120,
            },
            CatalogueEntry {
                id: "potato",
                name: "Potato",
                soils: &[SoilType::Loamy, SoilType::Sandy, SoilType::WellDrained],
                seasons: &[Season::Rabi, Season::Winter],
                ph: (5.5, 6.5),
                water: WaterLevel::Medium,
                temperature_c: (15.0, 25.0),
                states: &["Uttar Pradesh", "West Bengal", "Bihar", "Punjab"],
                baseline_yield: (100.0, 250.0),
                baseline_price: (500.0, 1500.0),
                growth_period_days: 90,
            },
            CatalogueEntry {
                id: "banana",
                name: "Banana",
                soils: &[SoilType::Loamy, SoilType::Alluvial, SoilType::Clay],
                seasons: &[Season::YearRound],
                ph: (6.0, 7.5),
                water: WaterLevel::High,
                temperature_c: (26.0, 35.0),
                states: &["Tamil Nadu", "Kerala", "Karnataka", "Andhra Pradesh"],
                baseline_yield: (200.0, 400.0),
                baseline_price: (800.0, 1500.0),
                growth_period_days: 300,
            },
        ];

        let profiles = entries
            .into_iter()
            .map(CatalogueEntry::build)
            .collect::<Vec<_>>();

        Self::new(profiles).expect("builtin catalogue ids are unique")
    }
}

struct CatalogueEntry {
    id: &'static str,
    name: &'static str,
    soils: &'static [SoilType],
    seasons: &'static [Season],
    ph: (f64, f64),
    water: WaterLevel,
    temperature_c: (f64, f64),
    states: &'static [&'static str],
    baseline_yield: (f64, f64),
    baseline_price: (f64, f64),
    growth_period_days: u16,
}

impl CatalogueEntry {
    fn build(self) -> CropProfile {
        CropProfile::new(
            CropId::parse(self.id).expect("catalogue ids are valid"),
            self.name,
            self.soils.iter().copied().collect(),
            self.seasons.iter().copied().collect(),
            Span::new("ph", self.ph.0, self.ph.1).expect("catalogue pH ranges are valid"),
            self.water,
            Span::new("temperature_c", self.temperature_c.0, self.temperature_c.1)
                .expect("catalogue temperature ranges are valid"),
            self.states
                .iter()
                .map(|state| StateName::parse(state).expect("catalogue states are valid"))
                .collect(),
            Span::new("baseline_yield", self.baseline_yield.0, self.baseline_yield.1)
                .expect("catalogue yield ranges are valid"),
            Span::new("baseline_price", self.baseline_price.0, self.baseline_price.1)
                .expect("catalogue price ranges are valid"),
            self.growth_period_days,
        )
        .expect("catalogue entries are valid")
    }
}
