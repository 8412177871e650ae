//! Season lookback for teammate-gap coverage, plus percentile helpers.
//!
//! The search never substitutes a season silently: every result says whether
//! a fallback was used, which season was originally requested and why.

use crate::config::CoverageConfig;
use pitwall_db::PitwallDb;
use pitwall_intent::{CoverageStatus, MIN_SEASON};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Outcome of a coverage lookback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonCoverage {
    /// Season to use
    pub season: i32,
    pub used_fallback: bool,
    /// Set whenever `used_fallback` is true
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_season: Option<i32>,
    /// Set whenever `used_fallback` is true
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
    pub shared_races: u32,
    pub coverage_status: CoverageStatus,
}

/// Pure state of one lookback search.
///
/// Feed it the requested season's coverage, then each candidate season in
/// order until [`SeasonSearch::offer`] says to stop.
#[derive(Debug, Clone)]
pub struct SeasonSearch {
    requested: i32,
    requested_shared: u32,
    requested_status: CoverageStatus,
    best: Option<(i32, u32, CoverageStatus)>,
    config: CoverageConfig,
}

impl SeasonSearch {
    pub fn start(
        requested: i32,
        shared_races: u32,
        status: CoverageStatus,
        config: &CoverageConfig,
    ) -> Self {
        Self {
            requested,
            requested_shared: shared_races,
            requested_status: status,
            best: None,
            config: config.clone(),
        }
    }

    pub fn needs_fallback(&self) -> bool {
        self.requested_shared < self.config.min_shared_races
    }

    /// Prior seasons to try, most recent first.
    pub fn candidate_seasons(&self) -> Vec<i32> {
        if !self.needs_fallback() {
            return Vec::new();
        }
        (1..=self.config.max_fallback_years.max(0))
            .map(|offset| self.requested - offset)
            .filter(|season| *season >= MIN_SEASON)
            .collect()
    }

    fn best_shared(&self) -> u32 {
        self.best
            .map(|(_, shared, _)| shared)
            .unwrap_or(self.requested_shared)
    }

    /// Record a candidate; returns `true` once the search can stop.
    pub fn offer(&mut self, season: i32, shared_races: u32, status: CoverageStatus) -> bool {
        if shared_races > self.best_shared() {
            self.best = Some((season, shared_races, status));
        }
        self.best_shared() >= self.config.preferred_shared_races
    }

    pub fn finish(self) -> SeasonCoverage {
        match self.best {
            Some((season, shared_races, coverage_status)) => SeasonCoverage {
                season,
                used_fallback: true,
                original_season: Some(self.requested),
                fallback_reason: Some(format!(
                    "low_coverage_sample: {} shared races in {}",
                    self.requested_shared, self.requested
                )),
                shared_races,
                coverage_status,
            },
            None => SeasonCoverage {
                season: self.requested,
                used_fallback: false,
                original_season: None,
                fallback_reason: None,
                shared_races: self.requested_shared,
                coverage_status: self.requested_status,
            },
        }
    }
}

/// Pick the season to report a driver's teammate gap for.
pub async fn find_best_season_with_coverage(
    db: &PitwallDb,
    driver_id: &str,
    season: i32,
    metric: &str,
    config: &CoverageConfig,
) -> pitwall_db::Result<SeasonCoverage> {
    let (shared, status) = season_coverage(db, driver_id, season, metric).await?;
    let mut search = SeasonSearch::start(season, shared, status, config);

    for candidate in search.candidate_seasons() {
        let (shared, status) = season_coverage(db, driver_id, candidate, metric).await?;
        debug!(driver_id, season = candidate, shared_races = shared, "Lookback candidate");
        if search.offer(candidate, shared, status) {
            break;
        }
    }

    let outcome = search.finish();
    if outcome.used_fallback {
        info!(
            driver_id,
            requested = season,
            season = outcome.season,
            shared_races = outcome.shared_races,
            "Using earlier season with better teammate coverage"
        );
    }
    Ok(outcome)
}

async fn season_coverage(
    db: &PitwallDb,
    driver_id: &str,
    season: i32,
    metric: &str,
) -> pitwall_db::Result<(u32, CoverageStatus)> {
    Ok(db
        .teammate_gap_coverage(driver_id, season, metric)
        .await?
        .map(|row| (row.shared_races, row.status()))
        .unwrap_or((0, CoverageStatus::Insufficient)))
}

// ============================================================================
// Percentiles
// ============================================================================

/// Percentile of a 1-based rank: rank 1 is 100, last is 0.
pub fn calculate_percentile(rank: u32, total: u32) -> u32 {
    if total <= 1 {
        return 100;
    }
    let rank = rank.clamp(1, total);
    let fraction = f64::from(total - rank) / f64::from(total - 1);
    (fraction * 100.0).round() as u32
}

/// Teammate-gap percentile: losers sit in the lower half, winners in the upper.
///
/// A ranked winner maps to `calculate_percentile / 2 + 50`. Percentiles are
/// whole numbers, so the halved value is rounded half away from zero before
/// the offset: a base of 33 gives 67, not 66.5.
pub fn calculate_teammate_gap_percentile(won: bool, ranking: Option<(u32, u32)>) -> u32 {
    if !won {
        return 25;
    }
    match ranking {
        Some((rank, total)) => (f64::from(calculate_percentile(rank, total)) / 2.0).round() as u32 + 50,
        None => 75,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_percentile_endpoints() {
        assert_eq!(calculate_percentile(1, 10), 100);
        assert_eq!(calculate_percentile(10, 10), 0);
        assert_eq!(calculate_percentile(1, 1), 100);
        assert_eq!(calculate_percentile(3, 0), 100);
        assert_eq!(calculate_percentile(2, 3), 50);
    }

    #[test]
    fn test_teammate_gap_percentile_halves() {
        assert_eq!(calculate_teammate_gap_percentile(false, Some((1, 10))), 25);
        assert_eq!(calculate_teammate_gap_percentile(true, None), 75);
        assert_eq!(calculate_teammate_gap_percentile(true, Some((1, 10))), 100);
        assert_eq!(calculate_teammate_gap_percentile(true, Some((10, 10))), 50);
        // Base percentile 33 halves to 16.5, rounded up
        assert_eq!(calculate_percentile(3, 4), 33);
        assert_eq!(calculate_teammate_gap_percentile(true, Some((3, 4))), 67);
    }

    #[test]
    fn test_sufficient_season_is_kept() {
        let config = CoverageConfig::default();
        let search = SeasonSearch::start(2023, 4, CoverageStatus::LowCoverage, &config);
        assert!(!search.needs_fallback());
        assert!(search.candidate_seasons().is_empty());
        let outcome = search.finish();
        assert_eq!(outcome.season, 2023);
        assert!(!outcome.used_fallback);
    }

    #[test]
    fn test_stops_at_preferred() {
        let config = CoverageConfig::default();
        let mut search = SeasonSearch::start(2024, 3, CoverageStatus::Insufficient, &config);
        assert_eq!(search.candidate_seasons(), vec![2023, 2022, 2021]);
        assert!(!search.offer(2023, 6, CoverageStatus::LowCoverage));
        assert!(search.offer(2022, 9, CoverageStatus::Valid));

        let outcome = search.finish();
        assert_eq!(outcome.season, 2022);
        assert_eq!(outcome.original_season, Some(2024));
        assert_eq!(outcome.shared_races, 9);
    }

    #[test]
    fn test_ties_keep_the_more_recent_season() {
        let config = CoverageConfig::default();
        let mut search = SeasonSearch::start(2024, 0, CoverageStatus::Insufficient, &config);
        search.offer(2023, 5, CoverageStatus::LowCoverage);
        search.offer(2022, 5, CoverageStatus::LowCoverage);
        assert_eq!(search.finish().season, 2023);
    }

    #[test]
    fn test_no_better_season_keeps_original() {
        let config = CoverageConfig::default();
        let mut search = SeasonSearch::start(2024, 2, CoverageStatus::Insufficient, &config);
        search.offer(2023, 1, CoverageStatus::Insufficient);
        search.offer(2022, 2, CoverageStatus::Insufficient);
        let outcome = search.finish();
        assert_eq!(outcome.season, 2024);
        assert!(!outcome.used_fallback);
        assert!(outcome.original_season.is_none());
    }

    #[test]
    fn test_never_looks_before_first_season() {
        let config = CoverageConfig::default();
        let search = SeasonSearch::start(1951, 0, CoverageStatus::Insufficient, &config);
        assert_eq!(search.candidate_seasons(), vec![1950]);
    }

    proptest! {
        #[test]
        fn prop_lookback_bounded_and_explicit(
            season in 1950i32..2100,
            requested_shared in 0u32..12,
            offers in proptest::collection::vec(0u32..12, 0..6),
        ) {
            let config = CoverageConfig::default();
            let mut search =
                SeasonSearch::start(season, requested_shared, CoverageStatus::from_shared_races(requested_shared), &config);
            let candidates = search.candidate_seasons();
            prop_assert!(candidates.len() <= 3);
            for candidate in &candidates {
                prop_assert!(season - candidate >= 1 && season - candidate <= 3);
            }
            for (candidate, shared) in candidates.iter().zip(offers) {
                if search.offer(*candidate, shared, CoverageStatus::from_shared_races(shared)) {
                    break;
                }
            }
            let outcome = search.finish();
            if outcome.used_fallback {
                prop_assert_eq!(outcome.original_season, Some(season));
                prop_assert!(outcome.fallback_reason.as_deref().is_some_and(|r| !r.is_empty()));
                prop_assert!(season - outcome.season <= 3);
                prop_assert!(outcome.shared_races > requested_shared);
            } else {
                prop_assert_eq!(outcome.season, season);
            }
        }

        #[test]
        fn prop_percentile_bounds(total in 1u32..60, rank_seed in 0u32..60) {
            let rank = rank_seed % total + 1;
            let p = calculate_percentile(rank, total);
            prop_assert!(p <= 100);
            let gap = calculate_teammate_gap_percentile(true, Some((rank, total)));
            prop_assert!((50..=100).contains(&gap));
        }
    }
}
