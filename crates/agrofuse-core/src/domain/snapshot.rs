use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use time::Date;

use crate::domain::enums::{Nutrient, NutrientLevel, SoilType};
use crate::domain::timestamp::{day_format, UtcDateTime};
use crate::error::ValidationError;

/// Which pipeline produced a value: the live upstream, a lower-fidelity
/// fallback, or nothing at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignalState {
    Live,
    Fallback,
    Absent,
}

/// Per-signal provenance flags attached to every recommendation report, so a
/// degraded answer is always distinguishable from a fully-informed one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalProvenance {
    pub weather: SignalState,
    pub soil: SignalState,
    pub market: SignalState,
}

/// The three independent signal pipelines feeding a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    Weather,
    Soil,
    Market,
}

impl SignalKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Weather => "weather",
            Self::Soil => "soil",
            Self::Market => "market",
        }
    }
}

impl Display for SignalKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record of one signal pipeline degrading or dropping out, carried on the
/// signal bundle for observability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalFailure {
    pub signal: SignalKind,
    pub code: String,
    pub message: String,
}

impl SignalFailure {
    pub fn new(signal: SignalKind, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            signal,
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Current-conditions weather snapshot for the representative city of the
/// requested state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub temperature_c: f64,
    pub humidity_pct: f64,
    pub description: String,
    pub fetched_at: UtcDateTime,
}

impl WeatherSnapshot {
    pub fn new(
        temperature_c: f64,
        humidity_pct: f64,
        description: impl Into<String>,
        fetched_at: UtcDateTime,
    ) -> Result<Self, ValidationError> {
        if !temperature_c.is_finite() {
            return Err(ValidationError::NonFiniteValue {
                field: "temperature_c",
            });
        }
        if !humidity_pct.is_finite() {
            return Err(ValidationError::NonFiniteValue {
                field: "humidity_pct",
            });
        }

        Ok(Self {
            temperature_c,
            humidity_pct,
            description: description.into(),
            fetched_at,
        })
    }
}

/// Provenance tag carried on every soil snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SoilProvenance {
    Live,
    FallbackDataset,
}

impl SoilProvenance {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::FallbackDataset => "fallback-dataset",
        }
    }
}

/// Aggregated soil survey snapshot for a state/district.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoilSnapshot {
    pub average_ph: Option<f64>,
    pub dominant_soil: Option<SoilType>,
    pub nutrients: BTreeMap<Nutrient, NutrientLevel>,
    pub moisture_pct: Option<f64>,
    pub provenance: SoilProvenance,
}

impl SoilSnapshot {
    pub fn new(
        average_ph: Option<f64>,
        dominant_soil: Option<SoilType>,
        nutrients: BTreeMap<Nutrient, NutrientLevel>,
        moisture_pct: Option<f64>,
        provenance: SoilProvenance,
    ) -> Result<Self, ValidationError> {
        if let Some(ph) = average_ph {
            if !ph.is_finite() {
                return Err(ValidationError::NonFiniteValue { field: "average_ph" });
            }
            if !(0.0..=14.0).contains(&ph) {
                return Err(ValidationError::PhOutOfBounds { value: ph });
            }
        }
        if let Some(moisture) = moisture_pct {
            if !moisture.is_finite() {
                return Err(ValidationError::NonFiniteValue {
                    field: "moisture_pct",
                });
            }
        }

        Ok(Self {
            average_ph,
            dominant_soil,
            nutrients,
            moisture_pct,
            provenance,
        })
    }
}

/// One sanitized market price row for a single commodity on a single day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketRow {
    pub commodity: String,
    pub wholesale_price: Option<f64>,
    pub retail_price: Option<f64>,
    pub unit: String,
    #[serde(with = "day_format")]
    pub observed_on: Date,
}

impl MarketRow {
    /// Preferred price for scoring: retail when published, wholesale
    /// otherwise. Non-positive prices are treated as unpublished.
    pub fn best_price(&self) -> Option<f64> {
        self.retail_price
            .filter(|price| *price > 0.0)
            .or(self.wholesale_price.filter(|price| *price > 0.0))
    }
}

/// Inclusive calendar-day range. Reversed bounds are swapped rather than
/// rejected, matching the lenient behavior callers rely on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(with = "day_format")]
    start: Date,
    #[serde(with = "day_format")]
    end: Date,
}

impl DateRange {
    pub fn new(start: Date, end: Date) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    pub fn single(day: Date) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    pub fn start(&self) -> Date {
        self.start
    }

    pub fn end(&self) -> Date {
        self.end
    }

    /// Number of calendar days covered, inclusive of both bounds.
    pub fn span_days(&self) -> i64 {
        (self.end - self.start).whole_days() + 1
    }
}

/// Best-available market data for a requested window.
///
/// `served` may differ from `requested` when the walk-back strategy had to
/// reach into earlier days; `fallback_date` makes that explicit so callers
/// can warn that the shown prices are not for the date asked about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub rows: Vec<MarketRow>,
    pub requested: DateRange,
    pub served: DateRange,
    pub fallback_date: bool,
    pub commodities: Vec<String>,
    pub total_records: usize,
    /// Per-day transport failures seen while assembling this window. Data
    /// was still found, so these are advisory.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<SignalFailure>,
}

impl MarketSnapshot {
    /// Look up a live price for a crop by lenient name match (either string
    /// containing the other, case-insensitive). Returns the first row with a
    /// published positive price, in row order.
    pub fn price_for(&self, crop_name: &str) -> Option<f64> {
        let needle = crop_name.trim().to_ascii_lowercase();
        if needle.is_empty() {
            return None;
        }

        self.rows.iter().find_map(|row| {
            let label = row.commodity.to_ascii_lowercase();
            if label.contains(&needle) || needle.contains(&label) {
                row.best_price()
            } else {
                None
            }
        })
    }
}

/// Immutable per-request bundle of whatever signals could be gathered.
///
/// Each field is independently optional: the aggregator never fails a
/// request because one upstream dropped out. Constructed atomically and
/// returned as one value; never shared across requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSignals {
    pub weather: Option<WeatherSnapshot>,
    pub soil: Option<SoilSnapshot>,
    pub market: Option<MarketSnapshot>,
    pub failures: Vec<SignalFailure>,
}

impl LocationSignals {
    pub fn empty() -> Self {
        Self {
            weather: None,
            soil: None,
            market: None,
            failures: Vec::new(),
        }
    }

    /// Derive per-signal provenance flags. A market snapshot served from a
    /// walked-back date is reported as `Fallback`: the data is live but not
    /// for the requested day.
    pub fn provenance(&self) -> SignalProvenance {
        SignalProvenance {
            weather: match &self.weather {
                Some(_) => SignalState::Live,
                None => SignalState::Absent,
            },
            soil: match &self.soil {
                Some(snapshot) => match snapshot.provenance {
                    SoilProvenance::Live => SignalState::Live,
                    SoilProvenance::FallbackDataset => SignalState::Fallback,
                },
                None => SignalState::Absent,
            },
            market: match &self.market {
                Some(snapshot) if snapshot.fallback_date => SignalState::Fallback,
                Some(_) => SignalState::Live,
                None => SignalState::Absent,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::timestamp::parse_day;

    fn day(input: &str) -> Date {
        parse_day(input).expect("valid day")
    }

    fn row(commodity: &str, retail: Option<f64>, wholesale: Option<f64>) -> MarketRow {
        MarketRow {
            commodity: commodity.to_owned(),
            wholesale_price: wholesale,
            retail_price: retail,
            unit: "1 kg".to_owned(),
            observed_on: day("2025-06-02"),
        }
    }

    #[test]
    fn reversed_range_bounds_are_swapped() {
        let range = DateRange::new(day("2025-06-10"), day("2025-06-02"));
        assert_eq!(range.start(), day("2025-06-02"));
        assert_eq!(range.end(), day("2025-06-10"));
        assert_eq!(range.span_days(), 9);
    }

    #[test]
    fn best_price_prefers_retail_and_skips_unpublished() {
        assert_eq!(row("Tomato", Some(40.0), Some(28.0)).best_price(), Some(40.0));
        assert_eq!(row("Tomato", None, Some(28.0)).best_price(), Some(28.0));
        assert_eq!(row("Tomato", Some(0.0), None).best_price(), None);
    }

    #[test]
    fn price_lookup_matches_names_leniently() {
        let snapshot = MarketSnapshot {
            rows: vec![row("Tomato Hybrid", Some(42.0), None)],
            requested: DateRange::single(day("2025-06-02")),
            served: DateRange::single(day("2025-06-02")),
            fallback_date: false,
            commodities: vec!["Tomato Hybrid".to_owned()],
            total_records: 1,
            failures: Vec::new(),
        };

        assert_eq!(snapshot.price_for("tomato"), Some(42.0));
        assert_eq!(snapshot.price_for("onion"), None);
    }

    #[test]
    fn provenance_reflects_walked_back_market_data() {
        let mut signals = LocationSignals::empty();
        assert_eq!(signals.provenance().market, SignalState::Absent);

        signals.market = Some(MarketSnapshot {
            rows: Vec::new(),
            requested: DateRange::single(day("2025-06-02")),
            served: DateRange::single(day("2025-05-31")),
            fallback_date: true,
            commodities: Vec::new(),
            total_records: 0,
            failures: Vec::new(),
        });
        assert_eq!(signals.provenance().market, SignalState::Fallback);
    }

    #[test]
    fn soil_snapshot_rejects_out_of_bounds_ph() {
        let err = SoilSnapshot::new(
            Some(19.0),
            None,
            BTreeMap::new(),
            None,
            SoilProvenance::Live,
        )
        .expect_err("must fail");
        assert!(matches!(err, ValidationError::PhOutOfBounds { .. }));
    }
}
