//! Source adapters: one per external origin, plus the bundled soil dataset
//! that stands in for the live government API.

mod datagov;
mod openweather;
mod soil_dataset;
mod vegmarket;

pub use datagov::DataGovSoilAdapter;
pub use openweather::OpenWeatherAdapter;
pub use soil_dataset::{DatasetSoilSource, FallbackSoilSource, SoilDataset};
pub use vegmarket::VegMarketAdapter;

use std::collections::BTreeMap;

use crate::domain::{Nutrient, NutrientLevel, SoilProvenance, SoilSnapshot, SoilType};
use crate::error::ValidationError;

/// Accumulates raw soil survey samples into one aggregated snapshot.
///
/// Both the live government adapter and the bundled dataset feed this same
/// aggregation, so the resulting snapshot is identical for identical sample
/// values regardless of which path produced them; only the provenance tag
/// differs.
#[derive(Debug, Default)]
pub(crate) struct SoilSampleAccumulator {
    phs: Vec<f64>,
    soils: BTreeMap<SoilType, usize>,
    nutrients: BTreeMap<Nutrient, Vec<f64>>,
    moisture: Vec<f64>,
    samples: usize,
}

impl SoilSampleAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_sample(&mut self) {
        self.samples += 1;
    }

    pub fn push_ph(&mut self, value: f64) {
        if value.is_finite() && (0.0..=14.0).contains(&value) {
            self.phs.push(value);
        }
    }

    pub fn push_soil(&mut self, soil: SoilType) {
        *self.soils.entry(soil).or_insert(0) += 1;
    }

    pub fn push_nutrient(&mut self, nutrient: Nutrient, value: f64) {
        if value.is_finite() && value >= 0.0 {
            self.nutrients.entry(nutrient).or_default().push(value);
        }
    }

    pub fn push_moisture(&mut self, value: f64) {
        if value.is_finite() && value >= 0.0 {
            self.moisture.push(value);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.samples == 0
    }

    pub fn finish(self, provenance: SoilProvenance) -> Result<SoilSnapshot, ValidationError> {
        let average_ph = mean(&self.phs);

        // Dominant soil = the most frequent type; ties break toward the
        // first type in enum order to stay deterministic.
        let dominant_soil = self
            .soils
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(soil, _)| *soil);

        let nutrients = self
            .nutrients
            .into_iter()
            .filter_map(|(nutrient, values)| {
                mean(&values).map(|avg| (nutrient, NutrientLevel::classify(nutrient, avg)))
            })
            .collect();

        let moisture_pct = mean(&self.moisture);

        SoilSnapshot::new(average_ph, dominant_soil, nutrients, moisture_pct, provenance)
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Lenient numeric extraction for upstream fields that arrive as numbers or
/// numeric strings.
pub(crate) fn lenient_f64(value: Option<&serde_json::Value>) -> Option<f64> {
    match value? {
        serde_json::Value::Number(number) => number.as_f64(),
        serde_json::Value::String(text) => text.trim().replace(',', "").parse().ok(),
        _ => None,
    }
}
