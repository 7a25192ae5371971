//! Public surface of the core: one call for ranked recommendations, one for
//! market snapshots.

use std::sync::Arc;
use std::time::Duration;

use time::{Date, OffsetDateTime};

use crate::adapters::{
    DataGovSoilAdapter, DatasetSoilSource, FallbackSoilSource, OpenWeatherAdapter,
    VegMarketAdapter,
};
use crate::aggregator::SignalAggregator;
use crate::cache::{CachedMarketDaySource, CachedSoilSource, CachedWeatherSource};
use crate::domain::{DateRange, FarmingProfile};
use crate::engine::{RecommendationEngine, RecommendationReport};
use crate::http_client::ReqwestHttpClient;
use crate::knowledge::CropKnowledgeBase;
use crate::market::{MarketQueryError, MarketWindow, MarketWindowResolver};
use crate::sources::{MarketDaySource, SoilSource, WeatherSource};

/// Cache lifetimes per signal, tuned to how often each upstream moves.
pub const WEATHER_CACHE_TTL: Duration = Duration::from_secs(10 * 60);
pub const SOIL_CACHE_TTL: Duration = Duration::from_secs(60 * 60);
pub const MARKET_CACHE_TTL: Duration = Duration::from_secs(30 * 60);

/// Entry point consumed by the thin API layer.
///
/// `recommend` never fails for external-world reasons: transport problems,
/// missing credentials and unpublished data all degrade into omitted
/// signals, visible through the report's provenance flags.
pub struct RecommendationService {
    aggregator: SignalAggregator,
    engine: RecommendationEngine,
    resolver: MarketWindowResolver,
}

impl RecommendationService {
    /// Wire the real adapters: one shared HTTP client, per-source response
    /// caches, the soil live-then-dataset pipeline, and the built-in crop
    /// catalogue. API keys are read from the environment; a missing key
    /// leaves that source permanently in its failure mode rather than
    /// failing construction.
    pub fn from_env() -> Self {
        let http = Arc::new(ReqwestHttpClient::new());

        let weather: Arc<dyn WeatherSource> = Arc::new(CachedWeatherSource::new(
            Arc::new(OpenWeatherAdapter::from_env(http.clone())),
            WEATHER_CACHE_TTL,
        ));

        let soil_pipeline: Arc<dyn SoilSource> = Arc::new(FallbackSoilSource::new(
            Arc::new(DataGovSoilAdapter::from_env(http.clone())),
            Arc::new(DatasetSoilSource),
        ));
        let soil: Arc<dyn SoilSource> =
            Arc::new(CachedSoilSource::new(soil_pipeline, SOIL_CACHE_TTL));

        let market: Arc<dyn MarketDaySource> = Arc::new(CachedMarketDaySource::new(
            Arc::new(VegMarketAdapter::new(http)),
            MARKET_CACHE_TTL,
        ));
        let resolver = MarketWindowResolver::new(market);

        Self::with_sources(
            Some(weather),
            Some(soil),
            resolver,
            CropKnowledgeBase::builtin(),
        )
    }

    /// Assemble from explicit sources; the seam used by tests and by
    /// callers with their own adapters.
    pub fn with_sources(
        weather: Option<Arc<dyn WeatherSource>>,
        soil: Option<Arc<dyn SoilSource>>,
        resolver: MarketWindowResolver,
        knowledge: CropKnowledgeBase,
    ) -> Self {
        Self {
            aggregator: SignalAggregator::new(weather, soil, Some(resolver.clone())),
            engine: RecommendationEngine::new(knowledge),
            resolver,
        }
    }

    /// Rank the catalogue for a farming profile. With `use_live_signals`
    /// off, no network call is made and soil comes from the bundled
    /// dataset.
    pub async fn recommend(
        &self,
        profile: &FarmingProfile,
        use_live_signals: bool,
    ) -> RecommendationReport {
        self.recommend_on(profile, use_live_signals, today_utc()).await
    }

    /// Same as [`recommend`](Self::recommend) with an explicit "today",
    /// which anchors the market window. Deterministic for a fixed date.
    pub async fn recommend_on(
        &self,
        profile: &FarmingProfile,
        use_live_signals: bool,
        today: Date,
    ) -> RecommendationReport {
        let signals = self
            .aggregator
            .gather(profile, today, use_live_signals)
            .await;
        self.engine.recommend(profile, &signals)
    }

    /// Resolve the best available market snapshot for a date range,
    /// optionally filtered to commodities matching `crop_filter`.
    pub async fn market_snapshot(
        &self,
        range: DateRange,
        crop_filter: Option<&str>,
    ) -> Result<MarketWindow, MarketQueryError> {
        self.resolver.resolve(range, crop_filter).await
    }
}

fn today_utc() -> Date {
    OffsetDateTime::now_utc().date()
}
