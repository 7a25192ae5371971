//! Canonical domain types for agricultural signals and farm inputs.
//!
//! All types validate their invariants at construction and carry explicit
//! provenance where a value can arrive from more than one origin, so that
//! downstream consumers never re-derive trust from payload shape.

mod enums;
mod profile;
mod snapshot;
mod timestamp;

pub use enums::{
    ExperienceLevel, FarmSize, Nutrient, NutrientLevel, Season, SoilType, WaterLevel,
};
pub use profile::{FarmingProfile, StateName};
pub use snapshot::{
    DateRange, LocationSignals, MarketRow, MarketSnapshot, SignalFailure, SignalKind,
    SignalProvenance, SignalState, SoilProvenance, SoilSnapshot, WeatherSnapshot,
};
pub use timestamp::{day_format, format_day, parse_day, UtcDateTime};
