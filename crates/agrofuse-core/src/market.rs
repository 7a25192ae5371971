//! Market window resolution: turning a requested date range into the best
//! available snapshot, even when the upstream publisher has not posted data
//! for the requested days.
//!
//! The walk-back here is a retrieval degradation chain, not a retry-on-error
//! chain: each attempt is a fully successful call that returned no rows, and
//! the decision to reach into earlier days is a data-staleness decision the
//! caller can see (`fallback_date` on the snapshot).

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use time::{Date, Duration};

use crate::domain::{format_day, DateRange, MarketRow, MarketSnapshot, SignalFailure, SignalKind};
use crate::sources::MarketDaySource;

/// Largest inclusive day span accepted for a single query.
pub const MAX_RANGE_DAYS: i64 = 30;

/// How many earlier days are probed when the requested window is empty.
pub const MAX_WALK_BACK_ATTEMPTS: u32 = 7;

const HEADER_TOKENS: &[&str] = &[
    "vegetablename",
    "price",
    "retailprice",
    "units",
    "crop",
    "name",
    "vegetable",
];
const MIN_LABEL_LEN: usize = 2;

/// Whether a row label denotes a real commodity. Upstream payloads intermix
/// header-like and placeholder rows with real data; those never count toward
/// a non-empty result.
pub fn is_valid_commodity_label(label: &str) -> bool {
    let trimmed = label.trim();
    if trimmed.chars().count() < MIN_LABEL_LEN {
        return false;
    }
    !HEADER_TOKENS.contains(&trimmed.to_ascii_lowercase().as_str())
}

/// Drop header-like and placeholder rows.
pub fn sanitize_rows(rows: Vec<MarketRow>) -> Vec<MarketRow> {
    rows.into_iter()
        .filter(|row| is_valid_commodity_label(&row.commodity))
        .collect()
}

/// Caller errors on a market query. Everything else degrades into the
/// structured [`MarketWindow`] instead of failing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MarketQueryError {
    #[error("date range spans {days} days; the maximum is {max}")]
    RangeTooLarge { days: i64, max: i64 },
}

/// Outcome of a market window resolution.
///
/// `NoData` is a first-class result, distinct from transport failure: every
/// probed day answered successfully with zero usable rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MarketWindow {
    Found(MarketSnapshot),
    NoData {
        requested: DateRange,
        /// Earliest day probed before giving up.
        #[serde(with = "crate::domain::day_format")]
        checked_through: Date,
        failures: Vec<SignalFailure>,
    },
}

impl MarketWindow {
    pub fn snapshot(&self) -> Option<&MarketSnapshot> {
        match self {
            Self::Found(snapshot) => Some(snapshot),
            Self::NoData { .. } => None,
        }
    }
}

/// Resolves the best available market snapshot for a requested window.
#[derive(Clone)]
pub struct MarketWindowResolver {
    source: Arc<dyn MarketDaySource>,
}

impl MarketWindowResolver {
    pub fn new(source: Arc<dyn MarketDaySource>) -> Self {
        Self { source }
    }

    /// Walk the requested window day by day, then walk backward when it is
    /// empty. The walk is strictly sequential: whether the next day is
    /// attempted depends on the previous day's outcome.
    pub async fn resolve(
        &self,
        requested: DateRange,
        crop_filter: Option<&str>,
    ) -> Result<MarketWindow, MarketQueryError> {
        let days = requested.span_days();
        if days > MAX_RANGE_DAYS {
            return Err(MarketQueryError::RangeTooLarge {
                days,
                max: MAX_RANGE_DAYS,
            });
        }

        let mut rows = Vec::new();
        let mut failures = Vec::new();

        let mut day = requested.start();
        loop {
            match self.source.fetch_day(day).await {
                Ok(day_rows) => rows.extend(sanitize_rows(day_rows)),
                Err(failure) => failures.push(day_failure(day, &failure)),
            }

            if day >= requested.end() {
                break;
            }
            match day.next_day() {
                Some(next) => day = next,
                None => break,
            }
        }

        if !rows.is_empty() {
            return Ok(MarketWindow::Found(build_snapshot(
                rows, requested, requested, false, crop_filter, failures,
            )));
        }

        tracing::warn!(
            start = %format_day(requested.start()),
            end = %format_day(requested.end()),
            "no market rows in requested window; walking back"
        );

        let mut attempts = 0;
        let mut probe = requested.start().previous_day();
        while attempts < MAX_WALK_BACK_ATTEMPTS {
            let Some(day) = probe else { break };

            match self.source.fetch_day(day).await {
                Ok(day_rows) => {
                    let sanitized = sanitize_rows(day_rows);
                    if !sanitized.is_empty() {
                        tracing::info!(
                            served = %format_day(day),
                            "serving market data from an earlier day"
                        );
                        return Ok(MarketWindow::Found(build_snapshot(
                            sanitized,
                            requested,
                            DateRange::single(day),
                            true,
                            crop_filter,
                            failures,
                        )));
                    }
                }
                Err(failure) => failures.push(day_failure(day, &failure)),
            }

            attempts += 1;
            probe = day.previous_day();
        }

        let checked_through = requested
            .start()
            .checked_sub(Duration::days(i64::from(MAX_WALK_BACK_ATTEMPTS)))
            .unwrap_or(requested.start());

        Ok(MarketWindow::NoData {
            requested,
            checked_through,
            failures,
        })
    }
}

fn day_failure(day: Date, failure: &crate::sources::SourceFailure) -> SignalFailure {
    SignalFailure::new(
        SignalKind::Market,
        failure.code(),
        format!("{}: {}", format_day(day), failure.message()),
    )
}

fn build_snapshot(
    rows: Vec<MarketRow>,
    requested: DateRange,
    served: DateRange,
    fallback_date: bool,
    crop_filter: Option<&str>,
    failures: Vec<SignalFailure>,
) -> MarketSnapshot {
    let mut commodities: Vec<String> = rows.iter().map(|row| row.commodity.clone()).collect();
    commodities.sort();
    commodities.dedup();

    let filtered = match crop_filter.map(str::trim).filter(|f| !f.is_empty()) {
        Some(filter) => {
            let needle = filter.to_ascii_lowercase();
            rows.into_iter()
                .filter(|row| row.commodity.to_ascii_lowercase().contains(&needle))
                .collect()
        }
        None => rows,
    };

    let total_records = filtered.len();
    MarketSnapshot {
        rows: filtered,
        requested,
        served,
        fallback_date,
        commodities,
        total_records,
        failures,
    }
}

/// Advisory observations over a resolved snapshot: wholesale/retail margin,
/// volatility, and the best-paying commodity. Text only; never feeds the
/// recommendation scoring.
pub fn market_tips(snapshot: &MarketSnapshot) -> Vec<String> {
    let mut tips = Vec::new();

    let wholesale: Vec<f64> = snapshot
        .rows
        .iter()
        .filter_map(|row| row.wholesale_price.filter(|p| *p > 0.0))
        .collect();
    let retail: Vec<f64> = snapshot
        .rows
        .iter()
        .filter_map(|row| row.retail_price.filter(|p| *p > 0.0))
        .collect();

    if !wholesale.is_empty() && !retail.is_empty() {
        let avg_wholesale = mean(&wholesale);
        let avg_retail = mean(&retail);
        let margin = avg_retail - avg_wholesale;

        if margin > 10.0 {
            tips.push(String::from(
                "Retail prices are running well above wholesale; direct selling would capture the margin.",
            ));
        } else if margin > 0.0 {
            tips.push(String::from(
                "Retail is slightly above wholesale; targeting consumers directly can still pay off.",
            ));
        } else {
            tips.push(String::from(
                "The wholesale market is more favorable right now; direct selling adds little.",
            ));
        }
    }

    if retail.len() > 1 {
        let avg = mean(&retail);
        let variance = retail.iter().map(|p| (p - avg).powi(2)).sum::<f64>() / retail.len() as f64;
        if variance.sqrt() > 10.0 {
            tips.push(String::from(
                "Prices are volatile across commodities; spread sales rather than committing to one buyer.",
            ));
        }
    }

    if let Some(best) = best_retail_commodity(snapshot) {
        tips.push(format!(
            "'{best}' fetched the best retail price on average in this window."
        ));
    }

    tips
}

fn best_retail_commodity(snapshot: &MarketSnapshot) -> Option<String> {
    let mut sums: Vec<(String, f64, u32)> = Vec::new();
    for row in &snapshot.rows {
        let Some(price) = row.retail_price.filter(|p| *p > 0.0) else {
            continue;
        };
        match sums.iter_mut().find(|(name, _, _)| *name == row.commodity) {
            Some((_, sum, count)) => {
                *sum += price;
                *count += 1;
            }
            None => sums.push((row.commodity.clone(), price, 1)),
        }
    }

    sums.into_iter()
        .map(|(name, sum, count)| (name, sum / f64::from(count)))
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(name, _)| name)
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::parse_day;

    fn day(input: &str) -> Date {
        parse_day(input).expect("valid day")
    }

    fn row(commodity: &str, retail: f64) -> MarketRow {
        MarketRow {
            commodity: commodity.to_owned(),
            wholesale_price: Some(retail - 15.0),
            retail_price: Some(retail),
            unit: "1 kg".to_owned(),
            observed_on: day("2025-06-02"),
        }
    }

    #[test]
    fn header_and_placeholder_labels_are_dropped() {
        assert!(!is_valid_commodity_label("vegetablename"));
        assert!(!is_valid_commodity_label("Price"));
        assert!(!is_valid_commodity_label(""));
        assert!(!is_valid_commodity_label(" x "));
        assert!(is_valid_commodity_label("Tomato"));
    }

    #[test]
    fn sanitize_keeps_only_real_rows() {
        let rows = vec![row("vegetablename", 10.0), row("Tomato", 42.0), row("Onion", 30.0)];
        let sanitized = sanitize_rows(rows);
        assert_eq!(sanitized.len(), 2);
    }

    #[test]
    fn filter_is_case_insensitive_and_commodity_list_precedes_filtering() {
        let rows = vec![row("Tomato Hybrid", 42.0), row("Onion Big", 30.0)];
        let range = DateRange::single(day("2025-06-02"));
        let snapshot = build_snapshot(rows, range, range, false, Some("tomato"), Vec::new());

        assert_eq!(snapshot.total_records, 1);
        assert_eq!(snapshot.rows[0].commodity, "Tomato Hybrid");
        assert_eq!(
            snapshot.commodities,
            vec!["Onion Big".to_owned(), "Tomato Hybrid".to_owned()]
        );
    }

    #[test]
    fn tips_flag_a_wide_retail_margin_and_the_best_commodity() {
        let rows = vec![row("Tomato", 60.0), row("Onion", 35.0)];
        let range = DateRange::single(day("2025-06-02"));
        let snapshot = build_snapshot(rows, range, range, false, None, Vec::new());

        let tips = market_tips(&snapshot);
        assert!(tips.iter().any(|t| t.contains("direct selling")));
        assert!(tips.iter().any(|t| t.contains("'Tomato'")));
    }
}
