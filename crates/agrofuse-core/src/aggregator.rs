//! Concurrent gathering of the three signal pipelines into one immutable
//! bundle.
//!
//! The three fetches are independent and run under one `tokio::join!`; no
//! ordering between them affects the result, and any subset may fail
//! without failing the request. Each pipeline's own fallback behavior
//! (soil live-then-dataset, market walk-back) lives inside that pipeline.

use std::sync::Arc;

use time::Date;

use crate::adapters::DatasetSoilSource;
use crate::domain::{
    DateRange, FarmingProfile, LocationSignals, MarketSnapshot, SignalFailure, SignalKind,
    SoilSnapshot, WeatherSnapshot,
};
use crate::geo;
use crate::market::{MarketWindow, MarketWindowResolver};
use crate::sources::{RegionQuery, SoilSource, SourceFailure, WeatherSource};

/// Builds a [`LocationSignals`] bundle for one recommendation request.
pub struct SignalAggregator {
    weather: Option<Arc<dyn WeatherSource>>,
    soil: Option<Arc<dyn SoilSource>>,
    market: Option<MarketWindowResolver>,
}

impl SignalAggregator {
    pub fn new(
        weather: Option<Arc<dyn WeatherSource>>,
        soil: Option<Arc<dyn SoilSource>>,
        market: Option<MarketWindowResolver>,
    ) -> Self {
        Self {
            weather,
            soil,
            market,
        }
    }

    /// Gather whatever signals are reachable. With `use_live` off, the
    /// network is never touched: weather and market stay absent and soil is
    /// served from the bundled dataset.
    pub async fn gather(
        &self,
        profile: &FarmingProfile,
        today: Date,
        use_live: bool,
    ) -> LocationSignals {
        let region = RegionQuery {
            state: profile.state.clone(),
            district: profile.district.clone(),
        };

        let (weather, soil, market) = tokio::join!(
            self.gather_weather(profile, use_live),
            self.gather_soil(&region, use_live),
            self.gather_market(today, use_live),
        );

        let mut failures = Vec::new();
        let (weather, weather_failure) = weather;
        let (soil, soil_failure) = soil;
        let (market, market_failures) = market;
        failures.extend(weather_failure);
        failures.extend(soil_failure);
        failures.extend(market_failures);

        LocationSignals {
            weather,
            soil,
            market,
            failures,
        }
    }

    async fn gather_weather(
        &self,
        profile: &FarmingProfile,
        use_live: bool,
    ) -> (Option<WeatherSnapshot>, Option<SignalFailure>) {
        if !use_live {
            return (None, None);
        }
        let Some(source) = &self.weather else {
            return (None, None);
        };

        let query = geo::representative_city(&profile.state);
        match source.fetch(&query).await {
            Ok(snapshot) => (Some(snapshot), None),
            Err(failure) => {
                tracing::warn!(code = %failure.code(), "weather signal unavailable");
                (None, Some(signal_failure(SignalKind::Weather, &failure)))
            }
        }
    }

    async fn gather_soil(
        &self,
        region: &RegionQuery,
        use_live: bool,
    ) -> (Option<SoilSnapshot>, Option<SignalFailure>) {
        let result = if use_live {
            match &self.soil {
                Some(source) => source.fetch(region).await,
                None => DatasetSoilSource.fetch(region).await,
            }
        } else {
            DatasetSoilSource.fetch(region).await
        };

        match result {
            Ok(snapshot) => (Some(snapshot), None),
            Err(failure) => {
                tracing::warn!(code = %failure.code(), "soil signal unavailable");
                (None, Some(signal_failure(SignalKind::Soil, &failure)))
            }
        }
    }

    async fn gather_market(
        &self,
        today: Date,
        use_live: bool,
    ) -> (Option<MarketSnapshot>, Vec<SignalFailure>) {
        if !use_live {
            return (None, Vec::new());
        }
        let Some(resolver) = &self.market else {
            return (None, Vec::new());
        };

        match resolver.resolve(DateRange::single(today), None).await {
            Ok(MarketWindow::Found(snapshot)) => {
                let failures = snapshot.failures.clone();
                (Some(snapshot), failures)
            }
            Ok(MarketWindow::NoData { failures, .. }) => {
                tracing::warn!("market signal unavailable: no data in window");
                (None, failures)
            }
            Err(error) => (
                None,
                vec![SignalFailure::new(
                    SignalKind::Market,
                    "invalid-range",
                    error.to_string(),
                )],
            ),
        }
    }
}

fn signal_failure(kind: SignalKind, failure: &SourceFailure) -> SignalFailure {
    SignalFailure::new(kind, failure.code(), failure.message().to_owned())
}
