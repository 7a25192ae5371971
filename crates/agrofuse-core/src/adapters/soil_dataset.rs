use std::sync::Arc;

use once_cell::sync::Lazy;
use serde::Deserialize;

use crate::adapters::SoilSampleAccumulator;
use crate::domain::{Nutrient, SoilProvenance, SoilSnapshot};
use crate::sources::{RegionQuery, SoilSource, SourceFailure, SourceFuture};

const BUNDLED_JSON: &str = include_str!("../../data/soil_baseline.json");

static BUNDLED: Lazy<SoilDataset> = Lazy::new(|| {
    SoilDataset::from_json(BUNDLED_JSON).expect("bundled soil dataset is valid JSON")
});

/// District-level soil survey dataset bundled with the crate, standing in
/// for the live open-data API when it is unreachable or unconfigured.
///
/// Loaded at most once per process behind a guarded initializer and
/// read-only afterwards.
#[derive(Debug, Clone, Deserialize)]
pub struct SoilDataset {
    pub survey_year: u16,
    records: Vec<DatasetRecord>,
}

#[derive(Debug, Clone, Deserialize)]
struct DatasetRecord {
    state: String,
    district: String,
    soil_type: String,
    ph: f64,
    nitrogen: f64,
    phosphorus: f64,
    potassium: f64,
    organic_carbon: f64,
    moisture_pct: f64,
}

impl SoilDataset {
    /// The process-wide bundled dataset.
    pub fn bundled() -> &'static Self {
        &BUNDLED
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn districts(&self, state: &str) -> Vec<&str> {
        let mut districts: Vec<&str> = self
            .records
            .iter()
            .filter(|record| record.state.eq_ignore_ascii_case(state))
            .map(|record| record.district.as_str())
            .collect();
        districts.sort();
        districts.dedup();
        districts
    }

    /// Aggregate the records matching a region into one snapshot tagged
    /// `fallback-dataset`. `None` when the region is not covered.
    pub fn snapshot_for(&self, query: &RegionQuery) -> Option<SoilSnapshot> {
        let mut acc = SoilSampleAccumulator::new();

        for record in &self.records {
            if !record.state.eq_ignore_ascii_case(query.state.as_str()) {
                continue;
            }
            if let Some(district) = &query.district {
                if !record.district.eq_ignore_ascii_case(district) {
                    continue;
                }
            }

            acc.record_sample();
            acc.push_ph(record.ph);
            if let Ok(soil) = record.soil_type.parse() {
                acc.push_soil(soil);
            }
            acc.push_nutrient(Nutrient::Nitrogen, record.nitrogen);
            acc.push_nutrient(Nutrient::Phosphorus, record.phosphorus);
            acc.push_nutrient(Nutrient::Potassium, record.potassium);
            acc.push_nutrient(Nutrient::OrganicCarbon, record.organic_carbon);
            acc.push_moisture(record.moisture_pct);
        }

        if acc.is_empty() {
            return None;
        }

        acc.finish(SoilProvenance::FallbackDataset).ok()
    }
}

/// [`SoilSource`] over the bundled dataset.
pub struct DatasetSoilSource;

impl SoilSource for DatasetSoilSource {
    fn name(&self) -> &'static str {
        "soil-baseline-dataset"
    }

    fn fetch<'a>(&'a self, query: &'a RegionQuery) -> SourceFuture<'a, SoilSnapshot> {
        Box::pin(async move {
            SoilDataset::bundled()
                .snapshot_for(query)
                .ok_or_else(|| {
                    SourceFailure::parse(format!(
                        "no baseline soil records for {}",
                        query.state.as_str()
                    ))
                })
        })
    }
}

/// Soil pipeline: try the live source, fall through to the secondary on any
/// failure. Both fail only when the region is covered by neither; the
/// aggregator then omits the signal.
pub struct FallbackSoilSource {
    primary: Arc<dyn SoilSource>,
    secondary: Arc<dyn SoilSource>,
}

impl FallbackSoilSource {
    pub fn new(primary: Arc<dyn SoilSource>, secondary: Arc<dyn SoilSource>) -> Self {
        Self { primary, secondary }
    }
}

impl SoilSource for FallbackSoilSource {
    fn name(&self) -> &'static str {
        "soil-pipeline"
    }

    fn fetch<'a>(&'a self, query: &'a RegionQuery) -> SourceFuture<'a, SoilSnapshot> {
        Box::pin(async move {
            match self.primary.fetch(query).await {
                Ok(snapshot) => Ok(snapshot),
                Err(failure) => {
                    tracing::warn!(
                        source = self.primary.name(),
                        code = %failure.code(),
                        "live soil source failed; trying fallback"
                    );
                    self.secondary.fetch(query).await
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NutrientLevel, SoilType, StateName};

    fn region(state: &str, district: Option<&str>) -> RegionQuery {
        RegionQuery {
            state: StateName::parse(state).expect("valid state"),
            district: district.map(str::to_owned),
        }
    }

    #[test]
    fn bundled_dataset_loads_and_covers_kerala() {
        let dataset = SoilDataset::bundled();
        assert!(!dataset.is_empty());
        assert_eq!(dataset.survey_year, 2020);
        assert!(dataset.districts("Kerala").contains(&"Ernakulam"));
    }

    #[test]
    fn statewide_snapshot_is_tagged_as_fallback() {
        let snapshot = SoilDataset::bundled()
            .snapshot_for(&region("Kerala", None))
            .expect("Kerala is covered");

        assert_eq!(snapshot.provenance, SoilProvenance::FallbackDataset);
        assert_eq!(snapshot.dominant_soil, Some(SoilType::Loamy));
        let ph = snapshot.average_ph.expect("pH is surveyed");
        assert!((5.5..=7.5).contains(&ph));
        assert!(snapshot.nutrients.contains_key(&Nutrient::Nitrogen));
    }

    #[test]
    fn district_filter_narrows_the_aggregate() {
        let snapshot = SoilDataset::bundled()
            .snapshot_for(&region("Kerala", Some("Palakkad")))
            .expect("Palakkad is covered");

        assert_eq!(snapshot.dominant_soil, Some(SoilType::Black));
        assert_eq!(snapshot.average_ph, Some(6.9));
        assert_eq!(
            snapshot.nutrients.get(&Nutrient::OrganicCarbon),
            Some(&NutrientLevel::Medium)
        );
    }

    #[test]
    fn uncovered_region_yields_nothing() {
        assert!(SoilDataset::bundled()
            .snapshot_for(&region("Sikkim", None))
            .is_none());
    }

    #[tokio::test]
    async fn pipeline_falls_back_when_primary_fails() {
        struct AlwaysFailing;
        impl SoilSource for AlwaysFailing {
            fn name(&self) -> &'static str {
                "always-failing"
            }
            fn fetch<'a>(&'a self, _query: &'a RegionQuery) -> SourceFuture<'a, SoilSnapshot> {
                Box::pin(async { Err(SourceFailure::timeout("synthetic outage")) })
            }
        }

        let pipeline =
            FallbackSoilSource::new(Arc::new(AlwaysFailing), Arc::new(DatasetSoilSource));
        let snapshot = pipeline
            .fetch(&region("Kerala", None))
            .await
            .expect("fallback covers Kerala");

        assert_eq!(snapshot.provenance, SoilProvenance::FallbackDataset);
    }

    #[tokio::test]
    async fn pipeline_reports_failure_when_both_paths_fail() {
        let pipeline = FallbackSoilSource::new(
            Arc::new(DatasetSoilSource),
            Arc::new(DatasetSoilSource),
        );
        let failure = pipeline
            .fetch(&region("Sikkim", None))
            .await
            .expect_err("neither path covers Sikkim");

        assert_eq!(failure.code(), "parse-error");
    }
}
