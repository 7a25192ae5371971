//! Weighted rule-based crop scoring and ranking.
//!
//! Scoring is additive and evaluated in a fixed rule order, so the reason
//! list and the final ranking are reproducible for identical inputs. The
//! engine is pure: it never touches the clock or any external source, only
//! the profile, the signal bundle and the static catalogue it was built
//! with.

use serde::{Deserialize, Serialize};

use crate::domain::{
    FarmingProfile, LocationSignals, NutrientLevel, Nutrient, Season, SignalProvenance,
    WaterLevel,
};
use crate::knowledge::{CropId, CropKnowledgeBase, CropProfile};

/// Minimum clamped score a crop needs to appear in the output.
pub const INCLUSION_THRESHOLD: i32 = 50;

const SOIL_MATCH_BONUS: i32 = 25;
const SEASON_MATCH_BONUS: i32 = 25;
const STATE_MATCH_BONUS: i32 = 25;
const PH_MATCH_BONUS: i32 = 10;
const PH_MISMATCH_PENALTY: i32 = -5;
const EXPERIENCE_BONUS: i32 = 5;
const FARM_SIZE_BONUS: i32 = 3;
const TEMP_IDEAL_BONUS: i32 = 10;
const TEMP_ACCEPTABLE_BONUS: i32 = 5;
const TEMP_TOLERANCE_C: f64 = 5.0;
const HUMIDITY_BONUS: i32 = 5;
const PRICE_STRONG_BONUS: i32 = 15;
const PRICE_MODEST_BONUS: i32 = 8;
const STRONG_PREMIUM_FACTOR: f64 = 1.2;

const TIP_LIMIT: usize = 6;

// Flavor pairings; extending these does not change the algorithm.
const BEGINNER_FRIENDLY: &[&str] = &["wheat", "rice", "tomato"];
const EXPERT_SUITED: &[&str] = &["cotton", "sugarcane"];
const SMALL_FARM_SUITED: &[&str] = &["tomato", "onion", "potato"];
const LARGE_FARM_SUITED: &[&str] = &["sugarcane", "cotton", "wheat"];

/// Recommendation strength derived purely from the final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationTier {
    HighlyRecommended,
    Recommended,
    Suitable,
    ConsiderWithCaution,
}

impl RecommendationTier {
    pub fn from_score(score: u8) -> Self {
        match score {
            80..=u8::MAX => Self::HighlyRecommended,
            65..=79 => Self::Recommended,
            50..=64 => Self::Suitable,
            _ => Self::ConsiderWithCaution,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::HighlyRecommended => "Highly Recommended",
            Self::Recommended => "Recommended",
            Self::Suitable => "Suitable",
            Self::ConsiderWithCaution => "Consider with Caution",
        }
    }
}

/// Price attached to a recommendation, tagged with where it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "basis", rename_all = "snake_case")]
pub enum PriceQuote {
    Live { rupees_per_quintal: f64 },
    Baseline {
        min_rupees_per_quintal: f64,
        max_rupees_per_quintal: f64,
    },
}

/// One ranked crop with its score, tier and the reasons that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub crop_id: CropId,
    pub crop_name: String,
    pub score: u8,
    pub tier: RecommendationTier,
    pub reasons: Vec<String>,
    pub price: PriceQuote,
}

/// Full result of one recommendation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationReport {
    pub recommendations: Vec<Recommendation>,
    pub total_suitable: usize,
    pub summary: String,
    pub tips: Vec<String>,
    pub provenance: SignalProvenance,
}

/// Scores every catalogue crop against a profile and the available signals.
#[derive(Debug, Clone)]
pub struct RecommendationEngine {
    knowledge: CropKnowledgeBase,
}

impl RecommendationEngine {
    pub fn new(knowledge: CropKnowledgeBase) -> Self {
        Self { knowledge }
    }

    pub fn knowledge(&self) -> &CropKnowledgeBase {
        &self.knowledge
    }

    pub fn recommend(
        &self,
        profile: &FarmingProfile,
        signals: &LocationSignals,
    ) -> RecommendationReport {
        let provenance = signals.provenance();

        if self.knowledge.is_empty() {
            return RecommendationReport {
                recommendations: Vec::new(),
                total_suitable: 0,
                summary: String::from("No crops were evaluable: the crop catalogue is empty."),
                tips: Vec::new(),
                provenance,
            };
        }

        let mut recommendations = Vec::new();
        for crop in self.knowledge.iter() {
            let outcome = score_crop(profile, signals, crop);
            let score = outcome.score.clamp(0, 100);
            if score < INCLUSION_THRESHOLD {
                continue;
            }

            let score = score as u8;
            recommendations.push(Recommendation {
                crop_id: crop.id.clone(),
                crop_name: crop.name.clone(),
                score,
                tier: RecommendationTier::from_score(score),
                reasons: outcome.reasons,
                price: match outcome.live_price {
                    Some(rupees_per_quintal) => PriceQuote::Live { rupees_per_quintal },
                    None => PriceQuote::Baseline {
                        min_rupees_per_quintal: crop.baseline_price.min,
                        max_rupees_per_quintal: crop.baseline_price.max,
                    },
                },
            });
        }

        // Stable sort: equal scores keep catalogue declaration order.
        recommendations.sort_by(|a, b| b.score.cmp(&a.score));

        let summary = build_summary(profile, signals, &recommendations);
        let tips = build_tips(profile, signals, &recommendations);
        let total_suitable = recommendations.len();

        RecommendationReport {
            recommendations,
            total_suitable,
            summary,
            tips,
            provenance,
        }
    }
}

struct ScoreOutcome {
    score: i32,
    reasons: Vec<String>,
    live_price: Option<f64>,
}

fn score_crop(
    profile: &FarmingProfile,
    signals: &LocationSignals,
    crop: &CropProfile,
) -> ScoreOutcome {
    let mut score = 0;
    let mut reasons = Vec::new();

    // 1. Soil type.
    if crop.soils.contains(&profile.soil_type) {
        score += SOIL_MATCH_BONUS;
        reasons.push(format!("suitable for {} soil", profile.soil_type));
    }

    // 2. Season, honoring the year-round wildcard.
    if crop.grows_in(profile.season) {
        score += SEASON_MATCH_BONUS;
        reasons.push(format!("suitable for the {} season", profile.season));
    }

    // 3. Historical state.
    if crop.states.contains(&profile.state) {
        score += STATE_MATCH_BONUS;
        reasons.push(format!("historically grown in {}", profile.state));
    }

    // 4. pH: an explicit caller value outranks the soil signal's average.
    let effective_ph = profile
        .ph_override
        .or_else(|| signals.soil.as_ref().and_then(|soil| soil.average_ph));
    if let Some(ph) = effective_ph {
        if crop.ph.contains(ph) {
            score += PH_MATCH_BONUS;
            reasons.push(format!(
                "pH {ph:.1} is within the tolerated range {:.1}-{:.1}",
                crop.ph.min, crop.ph.max
            ));
        } else {
            score += PH_MISMATCH_PENALTY;
            reasons.push(format!(
                "pH {ph:.1} is outside the tolerated range {:.1}-{:.1}",
                crop.ph.min, crop.ph.max
            ));
        }
    }

    // 5. Water availability vs requirement.
    let water = water_score(profile.water_availability, crop.water);
    score += water.0;
    reasons.push(water.1.to_owned());

    // 6. Experience and farm-size pairings.
    let id = crop.id.as_str();
    match profile.experience {
        crate::domain::ExperienceLevel::Beginner if BEGINNER_FRIENDLY.contains(&id) => {
            score += EXPERIENCE_BONUS;
            reasons.push(String::from("good starter crop for beginners"));
        }
        crate::domain::ExperienceLevel::Expert if EXPERT_SUITED.contains(&id) => {
            score += EXPERIENCE_BONUS;
            reasons.push(String::from("rewards experienced management"));
        }
        _ => {}
    }
    match profile.farm_size {
        crate::domain::FarmSize::Small if SMALL_FARM_SUITED.contains(&id) => {
            score += FARM_SIZE_BONUS;
            reasons.push(String::from("works well on small holdings"));
        }
        crate::domain::FarmSize::Large if LARGE_FARM_SUITED.contains(&id) => {
            score += FARM_SIZE_BONUS;
            reasons.push(String::from("suited to large-scale operation"));
        }
        _ => {}
    }

    // 7. Live weather.
    if let Some(weather) = &signals.weather {
        let temp = weather.temperature_c;
        if crop.temperature_c.contains(temp) {
            score += TEMP_IDEAL_BONUS;
            reasons.push(format!("current temperature {temp:.1} C is ideal"));
        } else if crop.temperature_c.contains_within(temp, TEMP_TOLERANCE_C) {
            score += TEMP_ACCEPTABLE_BONUS;
            reasons.push(format!("current temperature {temp:.1} C is acceptable"));
        } else {
            reasons.push(format!(
                "current temperature {temp:.1} C is outside the range this crop tolerates"
            ));
        }

        if crop.water == WaterLevel::High && weather.humidity_pct > 70.0 {
            score += HUMIDITY_BONUS;
            reasons.push(String::from("high humidity supports this water-intensive crop"));
        } else if crop.water == WaterLevel::Low && weather.humidity_pct < 50.0 {
            score += HUMIDITY_BONUS;
            reasons.push(String::from("low humidity suits this drought-tolerant crop"));
        }
    }

    // 8. Live market price premium over the baseline average.
    let live_price = signals
        .market
        .as_ref()
        .and_then(|market| market.price_for(&crop.name));
    if let Some(price) = live_price {
        let baseline = crop.baseline_price.average();
        if price > baseline * STRONG_PREMIUM_FACTOR {
            score += PRICE_STRONG_BONUS;
            reasons.push(format!(
                "live price of {price:.0} rupees/quintal is well above the baseline average"
            ));
        } else if price > baseline {
            score += PRICE_MODEST_BONUS;
            reasons.push(format!(
                "live price of {price:.0} rupees/quintal is above the baseline average"
            ));
        }
    }

    ScoreOutcome {
        score,
        reasons,
        live_price,
    }
}

/// Total mapping from (availability, requirement) to a score contribution.
/// Every ordinal combination is covered: exact match pays most, a one-step
/// surplus still pays, a large surplus pays little, and shortfalls penalize
/// by magnitude.
fn water_score(available: WaterLevel, required: WaterLevel) -> (i32, &'static str) {
    match available.rank() - required.rank() {
        0 => (15, "water availability matches the crop requirement"),
        1 => (10, "water availability comfortably covers the requirement"),
        d if d >= 2 => (5, "water availability far exceeds what this crop needs"),
        -1 => (-5, "water availability falls one level short of the requirement"),
        _ => (-10, "water availability is well below what this crop needs"),
    }
}

fn build_summary(
    profile: &FarmingProfile,
    signals: &LocationSignals,
    recommendations: &[Recommendation],
) -> String {
    let weather_context = signals
        .weather
        .as_ref()
        .map(|weather| {
            format!(
                " Current conditions: {:.1} C, {:.0}% humidity.",
                weather.temperature_c, weather.humidity_pct
            )
        })
        .unwrap_or_default();

    match recommendations.first() {
        Some(top) => format!(
            "Based on {} soil and the {} season in {}, {} leads with a suitability score of {}.{} {} crop(s) cleared the inclusion threshold.",
            profile.soil_type,
            profile.season,
            profile.state,
            top.crop_name,
            top.score,
            weather_context,
            recommendations.len(),
        ),
        None => format!(
            "No crops scored above the inclusion threshold for {} soil in the {} season in {}.{} Consider adjusting inputs or consulting a local extension office.",
            profile.soil_type, profile.season, profile.state, weather_context,
        ),
    }
}

fn build_tips(
    profile: &FarmingProfile,
    signals: &LocationSignals,
    recommendations: &[Recommendation],
) -> Vec<String> {
    let mut tips = Vec::new();

    if let Some(soil) = &signals.soil {
        if let Some(ph) = soil.average_ph {
            if ph < 6.0 {
                tips.push(format!(
                    "Soil is acidic (pH {ph:.1}); lime application will raise it toward most crops' optimum."
                ));
            } else if ph > 7.5 {
                tips.push(format!(
                    "Soil is alkaline (pH {ph:.1}); gypsum or elemental sulfur will bring it down."
                ));
            } else {
                tips.push(format!(
                    "Soil pH ({ph:.1}) sits in the optimal band for most crops."
                ));
            }
        }

        for (nutrient, level) in &soil.nutrients {
            if *level != NutrientLevel::Low {
                continue;
            }
            tips.push(String::from(match nutrient {
                Nutrient::Nitrogen => {
                    "Nitrogen is low; apply urea or well-rotted compost before sowing."
                }
                Nutrient::Phosphorus => {
                    "Phosphorus is low; work in phosphate fertiliser or bone meal."
                }
                Nutrient::Potassium => "Potassium is low; apply potash or wood ash.",
                Nutrient::OrganicCarbon => {
                    "Organic carbon is low; add farmyard manure to rebuild soil life."
                }
            }));
        }
    }

    if let Some(top) = recommendations.first() {
        match top.crop_id.as_str() {
            "banana" => tips.push(String::from(
                "Banana needs reliable irrigation and roughly ten months to harvest; plan the calendar accordingly.",
            )),
            "rice" => tips.push(String::from(
                "Rice needs standing water; prepare bunds early and consider SRI planting for better yields.",
            )),
            "cotton" => tips.push(String::from(
                "Scout cotton regularly for bollworm and keep moisture steady through flowering.",
            )),
            "sugarcane" => tips.push(String::from(
                "Sugarcane occupies the field for a year or more and needs water throughout.",
            )),
            _ => {}
        }
        tips.push(String::from(
            "Rotate crops between seasons to keep the soil structure healthy.",
        ));
    }

    match profile.season {
        Season::Kharif | Season::Monsoon => tips.push(String::from(
            "Monsoon sowing: ensure drainage so fields do not waterlog.",
        )),
        Season::Rabi | Season::Winter => tips.push(String::from(
            "Winter season: protect young crops from frost and cold winds.",
        )),
        Season::Summer => tips.push(String::from(
            "Summer season: prioritize mulching and water management.",
        )),
        Season::YearRound => {}
    }

    tips.push(String::from(
        "Track the weather forecast when scheduling field operations.",
    ));
    tips.push(String::from(
        "Get a soil test done before planting to confirm nutrient levels.",
    ));

    dedup_preserving_order(tips, TIP_LIMIT)
}

fn dedup_preserving_order(tips: Vec<String>, limit: usize) -> Vec<String> {
    let mut seen = std::collections::BTreeSet::new();
    let mut unique = Vec::new();
    for tip in tips {
        if seen.insert(tip.clone()) {
            unique.push(tip);
        }
        if unique.len() == limit {
            break;
        }
    }
    unique
}
