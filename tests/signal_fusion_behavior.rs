//! Behavior-driven tests for signal fusion at the service level: fallback
//! provenance, partial and total source failure, offline mode, and the
//! cache's idempotence seen through a whole pipeline.

use std::sync::Arc;
use std::time::Duration;

use agrofuse_core::{
    CachedMarketDaySource, CropKnowledgeBase, DatasetSoilSource, ExperienceLevel, FallbackSoilSource,
    FarmSize, FarmingProfile, MarketDaySource, MarketWindowResolver, RecommendationService,
    Season, SignalState, SoilSource, SoilType, SourceFailure, StateName, UtcDateTime, WaterLevel,
    WeatherSnapshot, WeatherSource,
};
use agrofuse_tests::{
    day, market_row, FailingSoilSource, FailingWeatherSource, ScriptedMarketSource,
    StaticWeatherSource,
};

fn kerala_profile() -> FarmingProfile {
    FarmingProfile::new(
        SoilType::Loamy,
        Season::Kharif,
        StateName::parse("Kerala").expect("valid state"),
        None,
        Some(6.5),
        WaterLevel::High,
        ExperienceLevel::Intermediate,
        FarmSize::Small,
    )
    .expect("valid profile")
}

fn service_with(
    weather: Option<Arc<dyn WeatherSource>>,
    soil: Option<Arc<dyn SoilSource>>,
    market: Arc<dyn MarketDaySource>,
) -> RecommendationService {
    RecommendationService::with_sources(
        weather,
        soil,
        MarketWindowResolver::new(market),
        CropKnowledgeBase::builtin(),
    )
}

// =============================================================================
// Soil fallback provenance
// =============================================================================

#[tokio::test]
async fn when_live_soil_fails_the_dataset_serves_and_provenance_says_so() {
    // Given: a soil pipeline whose live leg always times out
    let soil: Arc<dyn SoilSource> = Arc::new(FallbackSoilSource::new(
        Arc::new(FailingSoilSource(SourceFailure::timeout("synthetic outage"))),
        Arc::new(DatasetSoilSource),
    ));
    let service = service_with(None, Some(soil), Arc::new(ScriptedMarketSource::new()));

    // When: a recommendation is requested with live signals on
    let report = service
        .recommend_on(&kerala_profile(), true, day("2025-06-02"))
        .await;

    // Then: the soil signal is present, flagged as fallback, and scoring
    // proceeded normally
    assert_eq!(report.provenance.soil, SignalState::Fallback);
    assert!(!report.recommendations.is_empty());
}

#[tokio::test]
async fn when_the_live_key_is_missing_the_pipeline_behaves_like_any_failure() {
    let soil: Arc<dyn SoilSource> = Arc::new(FallbackSoilSource::new(
        Arc::new(FailingSoilSource(SourceFailure::not_configured(
            "soil API key is not configured",
        ))),
        Arc::new(DatasetSoilSource),
    ));
    let service = service_with(None, Some(soil), Arc::new(ScriptedMarketSource::new()));

    let report = service
        .recommend_on(&kerala_profile(), true, day("2025-06-02"))
        .await;

    assert_eq!(report.provenance.soil, SignalState::Fallback);
}

// =============================================================================
// Partial and total failure tolerance
// =============================================================================

#[tokio::test]
async fn when_every_source_fails_the_request_still_answers_with_absent_flags() {
    // Given: weather and soil both fail, and the market publisher has
    // nothing for the requested day or the prior week
    let weather: Arc<dyn WeatherSource> = Arc::new(FailingWeatherSource(SourceFailure::http(
        503,
        "weather upstream returned status 503",
    )));
    let soil: Arc<dyn SoilSource> = Arc::new(FailingSoilSource(SourceFailure::timeout(
        "soil upstream timed out",
    )));
    let service = service_with(
        Some(weather),
        Some(soil),
        Arc::new(ScriptedMarketSource::new()),
    );

    // When: a recommendation is requested
    let report = service
        .recommend_on(&kerala_profile(), true, day("2025-06-02"))
        .await;

    // Then: no panic, no error; every signal is flagged absent and the
    // engine still ranked crops from the static catalogue
    assert_eq!(report.provenance.weather, SignalState::Absent);
    assert_eq!(report.provenance.soil, SignalState::Absent);
    assert_eq!(report.provenance.market, SignalState::Absent);
    assert!(!report.recommendations.is_empty());
    assert_eq!(report.recommendations[0].crop_id.as_str(), "rice");
}

#[tokio::test]
async fn when_weather_succeeds_and_market_is_stale_flags_distinguish_the_grades() {
    // Given: live weather, and market data only three days back
    let weather: Arc<dyn WeatherSource> = Arc::new(StaticWeatherSource::new(
        WeatherSnapshot::new(
            28.0,
            76.0,
            "scattered clouds",
            UtcDateTime::parse("2025-06-02T06:00:00Z").expect("valid timestamp"),
        )
        .expect("valid snapshot"),
    ));
    let market = ScriptedMarketSource::new().with_rows(
        day("2025-05-30"),
        vec![market_row("Rice", 2400.0, 2600.0, day("2025-05-30"))],
    );
    let service = service_with(Some(weather), None, Arc::new(market));

    // When: a recommendation is requested for the empty day
    let report = service
        .recommend_on(&kerala_profile(), true, day("2025-06-02"))
        .await;

    // Then: weather is live, market is flagged fallback (stale date), and
    // the live price still reached the scoring path
    assert_eq!(report.provenance.weather, SignalState::Live);
    assert_eq!(report.provenance.market, SignalState::Fallback);
    let rice = report
        .recommendations
        .iter()
        .find(|r| r.crop_id.as_str() == "rice")
        .expect("rice qualifies");
    assert!(rice
        .reasons
        .iter()
        .any(|reason| reason.contains("above the baseline average")));
}

// =============================================================================
// Offline mode
// =============================================================================

#[tokio::test]
async fn offline_mode_touches_no_live_source_and_serves_bundled_soil() {
    // Given: counting live sources
    let weather = Arc::new(StaticWeatherSource::new(
        WeatherSnapshot::new(
            28.0,
            76.0,
            "clear sky",
            UtcDateTime::parse("2025-06-02T06:00:00Z").expect("valid timestamp"),
        )
        .expect("valid snapshot"),
    ));
    let market = Arc::new(ScriptedMarketSource::new().with_rows(
        day("2025-06-02"),
        vec![market_row("Rice", 2400.0, 2600.0, day("2025-06-02"))],
    ));
    let live_weather: Arc<dyn WeatherSource> = weather.clone();
    let live_soil: Arc<dyn SoilSource> = Arc::new(FailingSoilSource(SourceFailure::timeout(
        "must never be called",
    )));
    let service = service_with(Some(live_weather), Some(live_soil), market.clone());

    // When: live signals are disabled
    let report = service
        .recommend_on(&kerala_profile(), false, day("2025-06-02"))
        .await;

    // Then: neither live source was invoked, and soil came from the
    // bundled dataset
    assert_eq!(weather.call_count(), 0);
    assert_eq!(market.call_count(), 0);
    assert_eq!(report.provenance.weather, SignalState::Absent);
    assert_eq!(report.provenance.market, SignalState::Absent);
    assert_eq!(report.provenance.soil, SignalState::Fallback);
}

// =============================================================================
// Cache idempotence through the pipeline
// =============================================================================

#[tokio::test]
async fn cached_market_source_invokes_the_upstream_once_per_day_within_ttl() {
    let inner = Arc::new(ScriptedMarketSource::new().with_rows(
        day("2025-06-02"),
        vec![market_row("Tomato", 30.0, 40.0, day("2025-06-02"))],
    ));
    let cached: Arc<dyn MarketDaySource> = Arc::new(CachedMarketDaySource::new(
        inner.clone(),
        Duration::from_secs(60),
    ));
    let resolver = MarketWindowResolver::new(cached);

    // Two identical resolutions inside the TTL window
    for _ in 0..2 {
        resolver
            .resolve(
                agrofuse_core::DateRange::single(day("2025-06-02")),
                None,
            )
            .await
            .expect("range is valid");
    }

    // The wrapped source saw exactly one call
    assert_eq!(inner.call_count(), 1);
}

#[tokio::test]
async fn cached_market_source_refetches_after_ttl_expiry() {
    let inner = Arc::new(ScriptedMarketSource::new().with_rows(
        day("2025-06-02"),
        vec![market_row("Tomato", 30.0, 40.0, day("2025-06-02"))],
    ));
    let cached: Arc<dyn MarketDaySource> = Arc::new(CachedMarketDaySource::new(
        inner.clone(),
        Duration::from_millis(40),
    ));
    let resolver = MarketWindowResolver::new(cached);
    let range = agrofuse_core::DateRange::single(day("2025-06-02"));

    resolver.resolve(range, None).await.expect("range is valid");
    resolver.resolve(range, None).await.expect("range is valid");
    tokio::time::sleep(Duration::from_millis(80)).await;
    resolver.resolve(range, None).await.expect("range is valid");

    assert_eq!(inner.call_count(), 2);
}

// =============================================================================
// Whole-service determinism
// =============================================================================

#[tokio::test]
async fn identical_requests_against_fixed_sources_serialize_identically() {
    let market = Arc::new(ScriptedMarketSource::new().with_rows(
        day("2025-06-02"),
        vec![market_row("Rice", 2400.0, 2600.0, day("2025-06-02"))],
    ));
    let soil: Arc<dyn SoilSource> = Arc::new(DatasetSoilSource);
    let service = service_with(None, Some(soil), market);

    let first = service
        .recommend_on(&kerala_profile(), true, day("2025-06-02"))
        .await;
    let second = service
        .recommend_on(&kerala_profile(), true, day("2025-06-02"))
        .await;

    assert_eq!(
        serde_json::to_string(&first).expect("report serializes"),
        serde_json::to_string(&second).expect("report serializes"),
    );
}
