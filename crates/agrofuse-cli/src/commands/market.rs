use serde::Serialize;

use agrofuse_core::{
    market_tips, DateRange, MarketWindow, RecommendationService,
};

use crate::cli::MarketArgs;
use crate::error::CliError;

use super::render;

#[derive(Debug, Serialize)]
struct MarketResponse {
    #[serde(flatten)]
    window: MarketWindow,
    tips: Vec<String>,
}

pub async fn run(args: &MarketArgs, pretty: bool) -> Result<(), CliError> {
    let start = agrofuse_core::domain::parse_day(&args.start)?;
    let end = match &args.end {
        Some(end) => agrofuse_core::domain::parse_day(end)?,
        None => start,
    };

    let service = RecommendationService::from_env();
    let window = service
        .market_snapshot(DateRange::new(start, end), args.crop.as_deref())
        .await?;

    let tips = window
        .snapshot()
        .map(market_tips)
        .unwrap_or_default();

    render(&MarketResponse { window, tips }, pretty)
}
