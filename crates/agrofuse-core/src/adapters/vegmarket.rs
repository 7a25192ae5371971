use std::sync::Arc;

use serde::Deserialize;
use time::Date;

use crate::circuit_breaker::CircuitBreaker;
use crate::domain::{format_day, MarketRow};
use crate::http_client::{HttpClient, HttpRequest};
use crate::market::is_valid_commodity_label;
use crate::sources::{MarketDaySource, SourceFailure, SourceFuture};

const ENDPOINT: &str = "https://vegetablemarketprice.com/api/dataapi/market/kerala/daywisedata";

// The upstream serves browsers; plain API clients get blocked.
const USER_AGENT: &str =
    "Mozilla/5.0 (Linux; Android 8.0.0; SM-G955U Build/R16NW) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/141.0.0.0 Mobile Safari/537.36";
const REFERER: &str = "https://vegetablemarketprice.com/market/kerala/today";

/// Market price adapter for the day-wise vegetable price endpoint.
///
/// No credential is required. A day with nothing published yields
/// `Ok(vec![])`, a real upstream condition the window resolver's walk-back
/// depends on, while transport and payload problems surface as failures.
pub struct VegMarketAdapter {
    http: Arc<dyn HttpClient>,
    breaker: CircuitBreaker,
}

impl VegMarketAdapter {
    pub fn new(http: Arc<dyn HttpClient>) -> Self {
        Self {
            http,
            breaker: CircuitBreaker::default(),
        }
    }

    async fn fetch_inner(&self, day: Date) -> Result<Vec<MarketRow>, SourceFailure> {
        if !self.breaker.allow_request() {
            return Err(SourceFailure::connection(
                "market circuit breaker is open; skipping upstream call",
            ));
        }

        let url = format!("{ENDPOINT}?date={}", format_day(day));
        let request = HttpRequest::get(url)
            .with_header("user-agent", USER_AGENT)
            .with_header("referer", REFERER);

        let response = self.http.execute(request).await.map_err(|error| {
            self.breaker.record_failure();
            SourceFailure::from_http_error(&error)
        })?;

        if !response.is_success() {
            self.breaker.record_failure();
            return Err(SourceFailure::http(
                response.status,
                format!("market upstream returned status {}", response.status),
            ));
        }

        self.breaker.record_success();
        parse_day_payload(&response.body, day)
    }
}

fn parse_day_payload(body: &str, day: Date) -> Result<Vec<MarketRow>, SourceFailure> {
    let payload: DaywisePayload = serde_json::from_str(body)
        .map_err(|e| SourceFailure::parse(format!("unexpected market payload shape: {e}")))?;

    let rows = payload
        .data
        .unwrap_or_default()
        .into_iter()
        .filter_map(|item| {
            let commodity = item.vegetablename?.trim().to_owned();
            if !is_valid_commodity_label(&commodity) {
                return None;
            }

            Some(MarketRow {
                commodity,
                wholesale_price: parse_price(item.price.as_ref()),
                retail_price: parse_price(item.retailprice.as_ref()),
                unit: item.units.unwrap_or_default(),
                observed_on: day,
            })
        })
        .collect();

    Ok(rows)
}

/// Extract a price from a field that may be a number, a plain numeric
/// string, or a range like `"₹45-50"` (averaged).
pub(crate) fn parse_price(value: Option<&serde_json::Value>) -> Option<f64> {
    match value? {
        serde_json::Value::Number(number) => number.as_f64(),
        serde_json::Value::String(text) => {
            let clean = text.replace('₹', "").replace(',', "");
            let clean = clean.trim();
            if clean.is_empty() || clean.eq_ignore_ascii_case("none") {
                return None;
            }

            if clean.contains('-') {
                let parts: Vec<f64> = clean
                    .split('-')
                    .filter_map(|part| part.trim().parse().ok())
                    .collect();
                if parts.is_empty() {
                    None
                } else {
                    Some(parts.iter().sum::<f64>() / parts.len() as f64)
                }
            } else {
                clean.parse().ok()
            }
        }
        _ => None,
    }
}

impl MarketDaySource for VegMarketAdapter {
    fn name(&self) -> &'static str {
        "vegmarket-kerala"
    }

    fn fetch_day<'a>(&'a self, day: Date) -> SourceFuture<'a, Vec<MarketRow>> {
        Box::pin(self.fetch_inner(day))
    }
}

#[derive(Debug, Deserialize)]
struct DaywisePayload {
    #[serde(default)]
    data: Option<Vec<DaywiseItem>>,
}

#[derive(Debug, Deserialize)]
struct DaywiseItem {
    #[serde(default)]
    vegetablename: Option<String>,
    #[serde(default)]
    price: Option<serde_json::Value>,
    #[serde(default)]
    retailprice: Option<serde_json::Value>,
    #[serde(default)]
    units: Option<String>,
}
