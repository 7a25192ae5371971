use std::env;
use std::sync::Arc;

use serde::Deserialize;

use crate::circuit_breaker::CircuitBreaker;
use crate::domain::{UtcDateTime, WeatherSnapshot};
use crate::http_client::{HttpClient, HttpRequest};
use crate::sources::{CityQuery, SourceFailure, SourceFuture, WeatherSource};

const ENDPOINT: &str = "https://api.openweathermap.org/data/2.5/weather";

/// Live weather adapter for the OpenWeatherMap current-conditions endpoint.
///
/// A missing API key is detected once at construction; from then on every
/// fetch answers `not-configured` so the aggregator simply omits the signal.
pub struct OpenWeatherAdapter {
    http: Arc<dyn HttpClient>,
    api_key: Option<String>,
    breaker: CircuitBreaker,
}

impl OpenWeatherAdapter {
    /// Reads `AGROFUSE_OPENWEATHER_API_KEY`, falling back to
    /// `OPENWEATHER_API_KEY`.
    pub fn from_env(http: Arc<dyn HttpClient>) -> Self {
        let api_key = env::var("AGROFUSE_OPENWEATHER_API_KEY")
            .or_else(|_| env::var("OPENWEATHER_API_KEY"))
            .ok()
            .filter(|key| !key.trim().is_empty());

        if api_key.is_none() {
            tracing::warn!("weather API key not configured; weather signal will be absent");
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

    async fn fetch_inner(&self, query: &CityQuery) -> Result<WeatherSnapshot, SourceFailure> {
        let Some(api_key) = &self.api_key else {
            return Err(SourceFailure::not_configured(
                "weather API key is not configured",
            ));
        };

        if !self.breaker.allow_request() {
            return Err(SourceFailure::connection(
                "weather circuit breaker is open; skipping upstream call",
            ));
        }

        let url = format!(
            "{ENDPOINT}?q={},{}&appid={}&units=metric",
            urlencoding::encode(&query.city),
            query.country,
            urlencoding::encode(api_key),
        );

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
                format!("weather upstream returned status {}", response.status),
            ));
        }

        self.breaker.record_success();
        parse_weather(&response.body)
    }
}

fn parse_weather(body: &str) -> Result<WeatherSnapshot, SourceFailure> {
    let payload: OwmPayload = serde_json::from_str(body)
        .map_err(|e| SourceFailure::parse(format!("unexpected weather payload shape: {e}")))?;

    let description = payload
        .weather
        .first()
        .map(|condition| condition.description.clone())
        .unwrap_or_default();

    WeatherSnapshot::new(
        payload.main.temp,
        payload.main.humidity,
        description,
        UtcDateTime::now(),
    )
    .map_err(|e| SourceFailure::parse(e.to_string()))
}

impl WeatherSource for OpenWeatherAdapter {
    fn name(&self) -> &'static str {
        "openweathermap"
    }

    fn fetch<'a>(&'a self, query: &'a CityQuery) -> SourceFuture<'a, WeatherSnapshot> {
        Box::pin(self.fetch_inner(query))
    }
}

#[derive(Debug, Deserialize)]
struct OwmPayload {
    main: OwmMain,
    #[serde(default)]
    weather: Vec<OwmCondition>,
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct OwmCondition {
    description: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::{HttpError, HttpResponse};
    use crate::sources::FailureKind;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;

    struct CannedHttpClient {
        responses: Mutex<Vec<Result<HttpResponse, HttpError>>>,
    }

    impl CannedHttpClient {
        fn new(responses: Vec<Result<HttpResponse, HttpError>>) -> Self {
            Self {
                responses: Mutex::new(responses),
            }
        }
    }

    impl HttpClient for CannedHttpClient {
        fn execute<'a>(
            &'a self,
            _request: HttpRequest,
        ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
            let response = self
                .responses
                .lock()
                .expect("response store is not poisoned")
                .remove(0);
            Box::pin(async move { response })
        }
    }

    const SAMPLE: &str = r#"{
        "name": "Kochi",
        "main": {"temp": 29.4, "humidity": 78},
        "weather": [{"description": "light rain", "icon": "10d"}]
    }"#;

    #[tokio::test]
    async fn parses_live_payload_into_snapshot() {
        let http = Arc::new(CannedHttpClient::new(vec![Ok(HttpResponse::ok_json(SAMPLE))]));
        let adapter = OpenWeatherAdapter::with_api_key(http, "demo-key");
        let query = CityQuery::india("Kochi");

        let snapshot = adapter.fetch(&query).await.expect("must parse");
        assert_eq!(snapshot.temperature_c, 29.4);
        assert_eq!(snapshot.humidity_pct, 78.0);
        assert_eq!(snapshot.description, "light rain");
    }

    #[tokio::test]
    async fn missing_key_reports_not_configured() {
        let http = Arc::new(CannedHttpClient::new(vec![]));
        let adapter = OpenWeatherAdapter {
            http,
            api_key: None,
            breaker: CircuitBreaker::default(),
        };
        let query = CityQuery::india("Kochi");

        let failure = adapter.fetch(&query).await.expect_err("must fail");
        assert_eq!(failure.code(), "not-configured");
    }

    #[tokio::test]
    async fn non_success_status_maps_to_http_failure() {
        let http = Arc::new(CannedHttpClient::new(vec![Ok(HttpResponse {
            status: 401,
            body: String::from("{\"cod\":401}"),
        })]));
        let adapter = OpenWeatherAdapter::with_api_key(http, "bad-key");
        let query = CityQuery::india("Kochi");

        let failure = adapter.fetch(&query).await.expect_err("must fail");
        assert_eq!(failure.code(), "http-error:401");
        assert!(matches!(failure.kind(), FailureKind::Http(401)));
    }

    #[tokio::test]
    async fn malformed_payload_maps_to_parse_failure() {
        let http = Arc::new(CannedHttpClient::new(vec![Ok(HttpResponse::ok_json(
            "{\"unexpected\": true}",
        ))]));
        let adapter = OpenWeatherAdapter::with_api_key(http, "demo-key");
        let query = CityQuery::india("Kochi");

        let failure = adapter.fetch(&query).await.expect_err("must fail");
        assert_eq!(failure.code(), "parse-error");
    }
}
