//! # Agrofuse Core
//!
//! Multi-source agricultural data fusion and crop recommendation engine.
//!
//! ## Overview
//!
//! This crate aggregates heterogeneous, unreliable external agricultural
//! signals (live weather, scraped market prices, government soil surveys)
//! and produces a ranked, explainable crop-suitability recommendation for a
//! location and farming profile:
//!
//! - **Source adapters** for each external origin, each translating its
//!   upstream's payload into a typed snapshot and its misbehavior into a
//!   structured failure with a stable reason code
//! - **Fallback pipelines** so partial or total source failure degrades the
//!   answer instead of failing the caller
//! - **Market window resolution** that walks backward through earlier days
//!   when the requested date has no published data yet
//! - **A TTL response cache** bounding repeated external calls
//! - **A deterministic rule-weighted scoring engine** over a static crop
//!   catalogue, with one human-readable reason per fired rule
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Source adapters (OpenWeatherMap, data.gov.in soil, day-wise market prices, bundled soil dataset) |
//! | [`aggregator`] | Concurrent signal gathering with partial-failure tolerance |
//! | [`cache`] | TTL response cache and caching source decorators |
//! | [`circuit_breaker`] | Circuit breaker for upstream calls |
//! | [`domain`] | Domain types (snapshots, profile, provenance, timestamps) |
//! | [`engine`] | Rule-ordered scoring, ranking, tiers and farming tips |
//! | [`error`] | Core error types |
//! | [`geo`] | State-to-city resolution for weather queries |
//! | [`http_client`] | HTTP client abstraction (reqwest / no-op) |
//! | [`knowledge`] | Static crop catalogue |
//! | [`market`] | Market window resolver and walk-back strategy |
//! | [`service`] | Public entry points (`recommend`, `market_snapshot`) |
//! | [`sources`] | Source traits and the structured failure type |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use agrofuse_core::{
//!     ExperienceLevel, FarmSize, FarmingProfile, RecommendationService, Season, SoilType,
//!     StateName, WaterLevel,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = RecommendationService::from_env();
//!
//!     let profile = FarmingProfile::new(
//!         SoilType::Loamy,
//!         Season::Kharif,
//!         StateName::parse("Kerala")?,
//!         None,
//!         Some(6.5),
//!         WaterLevel::High,
//!         ExperienceLevel::Intermediate,
//!         FarmSize::Small,
//!     )?;
//!
//!     let report = service.recommend(&profile, true).await;
//!     for crop in &report.recommendations {
//!         println!("{}: {} ({})", crop.crop_name, crop.score, crop.tier.label());
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! External-world problems never surface as errors from [`service`]: a
//! timeout, a missing credential or an unpublished market day degrades into
//! an omitted signal, and the report's provenance flags say which signals
//! were live, which came from a fallback, and which were absent. The only
//! hard failures are caller errors (an oversized date range) and
//! construction-time validation, both structured.

pub mod adapters;
pub mod aggregator;
pub mod cache;
pub mod circuit_breaker;
pub mod domain;
pub mod engine;
pub mod error;
pub mod geo;
pub mod http_client;
pub mod knowledge;
pub mod market;
pub mod service;
pub mod sources;

// Re-export commonly used types at crate root for convenience

pub use adapters::{
    DataGovSoilAdapter, DatasetSoilSource, FallbackSoilSource, OpenWeatherAdapter, SoilDataset,
    VegMarketAdapter,
};
pub use aggregator::SignalAggregator;
pub use cache::{
    CacheKey, CacheStats, CachedMarketDaySource, CachedSoilSource, CachedWeatherSource,
    ResponseCache,
};
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
pub use domain::{
    DateRange, ExperienceLevel, FarmSize, FarmingProfile, LocationSignals, MarketRow,
    MarketSnapshot, Nutrient, NutrientLevel, Season, SignalFailure, SignalKind, SignalProvenance,
    SignalState, SoilProvenance, SoilSnapshot, SoilType, StateName, UtcDateTime, WaterLevel,
    WeatherSnapshot,
};
pub use engine::{
    PriceQuote, Recommendation, RecommendationEngine, RecommendationReport, RecommendationTier,
    INCLUSION_THRESHOLD,
};
pub use error::{CoreError, ValidationError};
pub use http_client::{
    HttpClient, HttpError, HttpRequest, HttpResponse, NoopHttpClient, ReqwestHttpClient,
};
pub use knowledge::{CropId, CropKnowledgeBase, CropProfile, Span};
pub use market::{
    market_tips, MarketQueryError, MarketWindow, MarketWindowResolver, MAX_RANGE_DAYS,
    MAX_WALK_BACK_ATTEMPTS,
};
pub use service::RecommendationService;
pub use sources::{
    CityQuery, FailureKind, MarketDaySource, RegionQuery, SoilSource, SourceFailure, SourceFuture,
    WeatherSource,
};
