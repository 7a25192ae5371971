use agrofuse_core::{FarmingProfile, RecommendationService, StateName};

use crate::cli::RecommendArgs;
use crate::error::CliError;

use super::render;

pub async fn run(args: &RecommendArgs, pretty: bool) -> Result<(), CliError> {
    let profile = FarmingProfile::new(
        args.soil.parse()?,
        args.season.parse()?,
        StateName::parse(&args.state)?,
        args.district.clone(),
        args.ph,
        args.water.parse()?,
        args.experience.parse()?,
        args.farm_size.parse()?,
    )?;

    let service = RecommendationService::from_env();
    let report = service.recommend(&profile, !args.offline).await;

    render(&report, pretty)
}
