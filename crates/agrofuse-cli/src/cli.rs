//! CLI argument definitions.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `recommend` | Rank catalogue crops for a farming profile |
//! | `market` | Fetch the best available market snapshot for a date range |
//!
//! # Examples
//!
//! ```bash
//! # Ranked recommendations with live signals
//! agrofuse recommend --soil loamy --season kharif --state Kerala --ph 6.5 --water high
//!
//! # Offline: bundled soil data only, no network calls
//! agrofuse recommend --soil loamy --season kharif --state Kerala --offline
//!
//! # Market prices for a window, filtered to one crop
//! agrofuse market --start 2025-06-01 --end 2025-06-07 --crop tomato
//! ```

use clap::{Args, Parser, Subcommand};

/// Agrofuse - crop recommendations from fused agricultural signals
#[derive(Debug, Parser)]
#[command(
    name = "agrofuse",
    author,
    version,
    about = "Crop recommendations from fused weather, market and soil signals"
)]
pub struct Cli {
    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Rank catalogue crops for a farming profile.
    Recommend(RecommendArgs),
    /// Fetch the best available market snapshot for a date range.
    Market(MarketArgs),
}

#[derive(Debug, Args)]
pub struct RecommendArgs {
    /// Soil type on the farm (clay, loamy, silty, sandy, black, red,
    /// alluvial, well_drained).
    #[arg(long)]
    pub soil: String,

    /// Sowing season (kharif, rabi, summer, monsoon, winter).
    #[arg(long)]
    pub season: String,

    /// State the farm is in.
    #[arg(long)]
    pub state: String,

    /// District, used to narrow soil survey data.
    #[arg(long)]
    pub district: Option<String>,

    /// Measured soil pH; overrides the soil signal's average.
    #[arg(long)]
    pub ph: Option<f64>,

    /// Water availability (low, medium, high, very_high).
    #[arg(long, default_value = "medium")]
    pub water: String,

    /// Farming experience (beginner, intermediate, expert).
    #[arg(long, default_value = "intermediate")]
    pub experience: String,

    /// Farm size category (small, medium, large).
    #[arg(long = "farm-size", default_value = "small")]
    pub farm_size: String,

    /// Skip all live sources; soil comes from the bundled dataset.
    #[arg(long)]
    pub offline: bool,
}

#[derive(Debug, Args)]
pub struct MarketArgs {
    /// First day of the window, YYYY-MM-DD.
    #[arg(long)]
    pub start: String,

    /// Last day of the window, YYYY-MM-DD; defaults to the start day.
    #[arg(long)]
    pub end: Option<String>,

    /// Only keep commodities whose name contains this filter.
    #[arg(long)]
    pub crop: Option<String>,
}
