//! Shared scripted sources for the behavior tests.
//!
//! These stand in for the real adapters at the source-trait seam, so every
//! test drives the resolver, aggregator and engine through the same code
//! paths production uses.

use std::collections::HashMap;
use std::sync::Mutex;

use time::Date;

use agrofuse_core::{
    CityQuery, MarketDaySource, MarketRow, RegionQuery, SoilSnapshot, SoilSource, SourceFailure,
    SourceFuture, WeatherSnapshot, WeatherSource,
};

pub fn day(input: &str) -> Date {
    agrofuse_core::domain::parse_day(input).expect("test dates are valid")
}

pub fn market_row(commodity: &str, wholesale: f64, retail: f64, observed_on: Date) -> MarketRow {
    MarketRow {
        commodity: commodity.to_owned(),
        wholesale_price: Some(wholesale),
        retail_price: Some(retail),
        unit: "1 kg".to_owned(),
        observed_on,
    }
}

/// Market source answering from a fixed per-day script. Unscripted days
/// answer successfully with zero rows, the way a publisher that has not
/// posted yet does. Records every day probed, in order.
#[derive(Default)]
pub struct ScriptedMarketSource {
    days: HashMap<Date, Result<Vec<MarketRow>, SourceFailure>>,
    calls: Mutex<Vec<Date>>,
}

impl ScriptedMarketSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(mut self, day: Date, rows: Vec<MarketRow>) -> Self {
        self.days.insert(day, Ok(rows));
        self
    }

    pub fn with_failure(mut self, day: Date, failure: SourceFailure) -> Self {
        self.days.insert(day, Err(failure));
        self
    }

    pub fn probed_days(&self) -> Vec<Date> {
        self.calls.lock().expect("call log is not poisoned").clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("call log is not poisoned").len()
    }
}

impl MarketDaySource for ScriptedMarketSource {
    fn name(&self) -> &'static str {
        "scripted-market"
    }

    fn fetch_day<'a>(&'a self, day: Date) -> SourceFuture<'a, Vec<MarketRow>> {
        self.calls
            .lock()
            .expect("call log is not poisoned")
            .push(day);
        let result = self.days.get(&day).cloned().unwrap_or_else(|| Ok(Vec::new()));
        Box::pin(async move { result })
    }
}

/// Weather source returning one fixed snapshot, counting calls.
pub struct StaticWeatherSource {
    snapshot: WeatherSnapshot,
    calls: Mutex<usize>,
}

impl StaticWeatherSource {
    pub fn new(snapshot: WeatherSnapshot) -> Self {
        Self {
            snapshot,
            calls: Mutex::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().expect("call counter is not poisoned")
    }
}

impl WeatherSource for StaticWeatherSource {
    fn name(&self) -> &'static str {
        "static-weather"
    }

    fn fetch<'a>(&'a self, _query: &'a CityQuery) -> SourceFuture<'a, WeatherSnapshot> {
        *self.calls.lock().expect("call counter is not poisoned") += 1;
        let snapshot = self.snapshot.clone();
        Box::pin(async move { Ok(snapshot) })
    }
}

/// Weather source that always fails with a given failure.
pub struct FailingWeatherSource(pub SourceFailure);

impl WeatherSource for FailingWeatherSource {
    fn name(&self) -> &'static str {
        "failing-weather"
    }

    fn fetch<'a>(&'a self, _query: &'a CityQuery) -> SourceFuture<'a, WeatherSnapshot> {
        let failure = self.0.clone();
        Box::pin(async move { Err(failure) })
    }
}

/// Soil source returning one fixed snapshot.
pub struct StaticSoilSource(pub SoilSnapshot);

impl SoilSource for StaticSoilSource {
    fn name(&self) -> &'static str {
        "static-soil"
    }

    fn fetch<'a>(&'a self, _query: &'a RegionQuery) -> SourceFuture<'a, SoilSnapshot> {
        let snapshot = self.0.clone();
        Box::pin(async move { Ok(snapshot) })
    }
}

/// Soil source that always fails with a given failure.
pub struct FailingSoilSource(pub SourceFailure);

impl SoilSource for FailingSoilSource {
    fn name(&self) -> &'static str {
        "failing-soil"
    }

    fn fetch<'a>(&'a self, _query: &'a RegionQuery) -> SourceFuture<'a, SoilSnapshot> {
        let failure = self.0.clone();
        Box::pin(async move { Err(failure) })
    }
}
