use std::env;
use std::sync::Arc;

use serde::Deserialize;

use crate::adapters::{lenient_f64, SoilSampleAccumulator};
use crate::circuit_breaker::CircuitBreaker;
use crate::domain::{Nutrient, SoilProvenance, SoilSnapshot};
use crate::http_client::{HttpClient, HttpRequest};
use crate::sources::{RegionQuery, SoilSource, SourceFailure, SourceFuture};

const BASE_URL: &str = "https://api.data.gov.in/resource";

/// Soil survey resource on the open-data portal.
pub const SOIL_RESOURCE_ID: &str = "5713d7e0-8961-4742-a71c-4c5001bac94a";

const RECORD_LIMIT: u32 = 50;

/// Live soil adapter for the data.gov.in open-data API.
///
/// Filters by upper-cased state and district names the way the portal
/// expects, then aggregates the returned survey samples into one snapshot.
pub struct DataGovSoilAdapter {
    http: Arc<dyn HttpClient>,
    api_key: Option<String>,
    breaker: CircuitBreaker,
}

impl DataGovSoilAdapter {
    /// Reads `AGROFUSE_DATAGOV_API_KEY`, falling back to `DATA_GOV_API_KEY`.
    pub fn from_env(http: Arc<dyn HttpClient>) -> Self {
        let api_key = env::var("AGROFUSE_DATAGOV_API_KEY")
            .or_else(|_| env::var("DATA_GOV_API_KEY"))
            .ok()
            .filter(|key| !key.trim().is_empty());

        if api_key.is_none() {
            tracing::warn!("soil API key not configured; live soil data will be unavailable");
        }

        Self {
            http,
            api_key,
            breaker: CircuitBreaker::default(),
        }
    }

    pub fn with_api_key(http: Arc<dyn HttpClient>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            api_key: Some(api_key.into()),
            breaker: CircuitBreaker::default(),
        }
    }

    async fn fetch_inner(&self, query: &RegionQuery) -> Result<SoilSnapshot, SourceFailure> {
        let Some(api_key) = &self.api_key else {
            return Err(SourceFailure::not_configured(
                "soil API key is not configured",
            ));
        };

        if !self.breaker.allow_request() {
            return Err(SourceFailure::connection(
                "soil circuit breaker is open; skipping upstream call",
            ));
        }

        let mut url = format!(
            "{BASE_URL}/{SOIL_RESOURCE_ID}?api-key={}&format=json&limit={RECORD_LIMIT}&filters[state_name]={}",
            urlencoding::encode(api_key),
            urlencoding::encode(&query.state.as_str().to_uppercase()),
        );
        if let Some(district) = &query.district {
            url.push_str(&format!(
                "&filters[district_name]={}",
                urlencoding::encode(&district.to_uppercase())
            ));
        }

        let response = self
            .http
            .execute(HttpRequest::get(url))
            .await
            .map_err(|error| {
                self.breaker.record_failure();
                SourceFailure::from_http_error(&error)
            })?;

        if !response.is_success() {
            self.breaker.record_failure();
            return Err(SourceFailure::http(
                response.status,
                format!("soil upstream returned status {}", response.status),
            ));
        }

        self.breaker.record_success();
        parse_soil_records(&response.body, query)
    }
}

fn parse_soil_records(body: &str, query: &RegionQuery) -> Result<SoilSnapshot, SourceFailure> {
    let payload: SoilPayload = serde_json::from_str(body)
        .map_err(|e| SourceFailure::parse(format!("unexpected soil payload shape: {e}")))?;

    let mut acc = SoilSampleAccumulator::new();
    for record in &payload.records {
        acc.record_sample();

        if let Some(ph) = lenient_f64(record.ph.as_ref()) {
            acc.push_ph(ph);
        }
        if let Some(soil) = record
            .soil_type
            .as_deref()
            .and_then(|value| value.parse().ok())
        {
            acc.push_soil(soil);
        }
        if let Some(value) = lenient_f64(record.nitrogen.as_ref()) {
            acc.push_nutrient(Nutrient::Nitrogen, value);
        }
        if let Some(value) = lenient_f64(record.phosphorus.as_ref()) {
            acc.push_nutrient(Nutrient::Phosphorus, value);
        }
        if let Some(value) = lenient_f64(record.potassium.as_ref()) {
            acc.push_nutrient(Nutrient::Potassium, value);
        }
        if let Some(value) = lenient_f64(record.organic_carbon.as_ref()) {
            acc.push_nutrient(Nutrient::OrganicCarbon, value);
        }
        if let Some(value) = lenient_f64(record.moisture_level.as_ref()) {
            acc.push_moisture(value);
        }
    }

    if acc.is_empty() {
        return Err(SourceFailure::parse(format!(
            "no soil records for {}",
            query.state.as_str()
        )));
    }

    acc.finish(SoilProvenance::Live)
        .map_err(|e| SourceFailure::parse(e.to_string()))
}

impl SoilSource for DataGovSoilAdapter {
    fn name(&self) -> &'static str {
        "datagov-soil"
    }

    fn fetch<'a>(&'a self, query: &'a RegionQuery) -> SourceFuture<'a, SoilSnapshot> {
        Box::pin(self.fetch_inner(query))
    }
}

#[derive(Debug, Deserialize)]
struct SoilPayload {
    #[serde(default)]
    records: Vec<SoilRecord>,
}

/// One survey record. The portal publishes numbers as strings more often
/// than not, so every numeric field goes through lenient extraction.
#[derive(Debug, Deserialize)]
struct SoilRecord {
    #[serde(default)]
    ph: Option<serde_json::Value>,
    #[serde(default)]
    soil_type: Option<String>,
    #[serde(default)]
    nitrogen: Option<serde_json::Value>,
    #[serde(default)]
    phosphorus: Option<serde_json::Value>,
    #[serde(default)]
    potassium: Option<serde_json::Value>,
    #[serde(default)]
    organic_carbon: Option<serde_json::Value>,
    #[serde(rename = "average_soilmoisture_level__at_15cm_", default)]
    moisture_level: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NutrientLevel, SoilType, StateName};

    fn region(state: &str) -> RegionQuery {
        RegionQuery {
            state: StateName::parse(state).expect("valid state"),
            district: None,
        }
    }

    const SAMPLE: &str = r#"{
        "records": [
            {"ph": "6.25", "soil_type": "loamy", "nitrogen": "220", "phosphorus": "12", "potassium": "180", "organic_carbon": "0.5", "average_soilmoisture_level__at_15cm_": "38.5"},
            {"ph": 6.75, "soil_type": "loamy", "nitrogen": 260, "phosphorus": 14, "potassium": 200, "organic_carbon": 0.75, "average_soilmoisture_level__at_15cm_": 41.5}
        ]
    }"#;

    #[test]
    fn aggregates_string_and_numeric_records_identically() {
        let snapshot = parse_soil_records(SAMPLE, &region("Kerala")).expect("must parse");

        assert_eq!(snapshot.average_ph, Some(6.5));
        assert_eq!(snapshot.dominant_soil, Some(SoilType::Loamy));
        assert_eq!(snapshot.moisture_pct, Some(40.0));
        assert_eq!(snapshot.provenance, SoilProvenance::Live);
        assert_eq!(
            snapshot.nutrients.get(&Nutrient::Nitrogen),
            Some(&NutrientLevel::Low)
        );
        assert_eq!(
            snapshot.nutrients.get(&Nutrient::Phosphorus),
            Some(&NutrientLevel::Medium)
        );
    }

    #[test]
    fn empty_record_set_is_a_failure_so_callers_fall_back() {
        let failure =
            parse_soil_records(r#"{"records": []}"#, &region("Kerala")).expect_err("must fail");
        assert_eq!(failure.code(), "parse-error");
        assert!(failure.message().contains("Kerala"));
    }

    #[test]
    fn malformed_body_is_a_parse_failure() {
        let failure = parse_soil_records("<html>", &region("Kerala")).expect_err("must fail");
        assert_eq!(failure.code(), "parse-error");
    }
}
