//! coverage command: which season would a teammate gap be reported for?

use crate::cli::config::DbArgs;
use crate::cli::error::HelpfulError;
use anyhow::Result;
use pitwall_interpret::{find_best_season_with_coverage, CoverageConfig, SeasonCoverage};
use pitwall_resolve::{DriverResolveOptions, DriverResolver, ResolveError};

/// Arguments for the coverage command
#[derive(Debug, clap::Args)]
pub struct CoverageArgs {
    /// Driver name, code or id
    pub driver: String,

    /// Requested season
    #[arg(long)]
    pub season: i32,

    /// Teammate-gap metric
    #[arg(long, default_value = "teammate_gap_raw")]
    pub metric: String,

    /// How many seasons back to search (0 disables the lookback)
    #[arg(long)]
    pub max_years: Option<i32>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub db: DbArgs,
}

impl CoverageArgs {
    fn coverage_config(&self) -> CoverageConfig {
        let mut config = CoverageConfig::default();
        if let Some(years) = self.max_years {
            config.max_fallback_years = years.max(0);
        }
        config
    }
}

pub async fn run(args: CoverageArgs) -> Result<()> {
    let db = args.db.open().await?;

    let driver_id = DriverResolver::new(db.clone())
        .resolve(&args.driver, &DriverResolveOptions::for_season(args.season))
        .await
        .map_err(|err| match err {
            ResolveError::UnknownEntity { .. } => {
                anyhow::Error::new(HelpfulError::unknown_entity("driver", &args.driver))
            }
            other => anyhow::Error::new(other),
        })?
        .canonical_id;

    let config = args.coverage_config();
    let coverage =
        find_best_season_with_coverage(&db, &driver_id, args.season, &args.metric, &config).await?;

    if args.json {
        let out = serde_json::json!({
            "driver_id": driver_id,
            "metric": args.metric,
            "coverage": coverage,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print_coverage(&driver_id, &args.metric, &coverage, &config);
    }
    Ok(())
}

fn print_coverage(driver_id: &str, metric: &str, coverage: &SeasonCoverage, config: &CoverageConfig) {
    println!("Driver:        {}", driver_id);
    println!("Metric:        {}", metric);
    println!("Season:        {}", coverage.season);
    println!(
        "Shared races:  {} ({}; min {}, preferred {})",
        coverage.shared_races,
        coverage.coverage_status.as_str(),
        config.min_shared_races,
        config.preferred_shared_races
    );
    if coverage.used_fallback {
        if let Some(original) = coverage.original_season {
            println!("Requested:     {}", original);
        }
        if let Some(reason) = &coverage.fallback_reason {
            println!("Fallback:      {}", reason);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(max_years: Option<i32>) -> CoverageArgs {
        CoverageArgs {
            driver: "Hamilton".into(),
            season: 2024,
            metric: "teammate_gap_raw".into(),
            max_years,
            json: false,
            db: DbArgs { db: None },
        }
    }

    #[test]
    fn test_max_years_override() {
        assert_eq!(args(None).coverage_config(), CoverageConfig::default());
        assert_eq!(args(Some(0)).coverage_config().max_fallback_years, 0);
        assert_eq!(args(Some(-2)).coverage_config().max_fallback_years, 0);
    }
}
