//! Driver name resolution.
//!
//! A driver alias resolves to every reference row with a name field that
//! normalizes to the same text. One match is literal; several are ranked by,
//! in strict priority:
//!
//! 1. non-test season entries in the requested season
//! 2. team+season rows shared with the supplied teammate
//! 3. coverage score (metric-summary rows plus capped lap count)
//! 4. canonical id ascending
//!
//! Each tier only breaks ties left by the one before it.

use crate::error::{ResolutionResult, ResolveError, Resolved};
use crate::normalize::normalize;
use pitwall_db::PitwallDb;
use std::cmp::Ordering;
use tracing::debug;

/// Normalized laps counted toward a driver's coverage score.
pub const LAP_CONTRIBUTION_CAP: i64 = 1000;

/// Context used only to rank colliding matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriverResolveOptions {
    pub season: Option<i32>,
    /// Canonical id of the other driver in the request, if known
    pub teammate_id: Option<String>,
}

impl DriverResolveOptions {
    pub fn for_season(season: i32) -> Self {
        Self {
            season: Some(season),
            teammate_id: None,
        }
    }

    pub fn with_teammate(mut self, teammate_id: impl Into<String>) -> Self {
        self.teammate_id = Some(teammate_id.into());
        self
    }
}

/// Ranking scores for one colliding driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverCandidate {
    pub driver_id: String,
    pub season_participation: i64,
    pub teammate_overlap: i64,
    pub coverage_score: i64,
}

impl DriverCandidate {
    /// Total order: higher scores first, then lower id.
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .season_participation
            .cmp(&self.season_participation)
            .then_with(|| other.teammate_overlap.cmp(&self.teammate_overlap))
            .then_with(|| other.coverage_score.cmp(&self.coverage_score))
            .then_with(|| self.driver_id.cmp(&other.driver_id))
    }
}

/// Resolves free-text driver names to canonical driver ids.
#[derive(Clone)]
pub struct DriverResolver {
    db: PitwallDb,
}

impl DriverResolver {
    pub fn new(db: PitwallDb) -> Self {
        Self { db }
    }

    pub async fn resolve(
        &self,
        alias: &str,
        options: &DriverResolveOptions,
    ) -> ResolutionResult<Resolved> {
        let needle = normalize(alias);
        if needle.is_empty() {
            return Err(ResolveError::unknown(alias));
        }

        let rows = self.db.driver_name_rows().await?;
        let mut matches: Vec<String> = rows
            .into_iter()
            .filter(|row| row.matchable_names().any(|name| normalize(name) == needle))
            .map(|row| row.driver_id)
            .collect();

        match matches.len() {
            0 => Err(ResolveError::unknown(alias)),
            1 => Ok(Resolved::literal(matches.swap_remove(0))),
            _ => {
                let mut candidates = Vec::with_capacity(matches.len());
                for driver_id in matches {
                    candidates.push(self.score(driver_id, options).await?);
                }
                candidates.sort_by(DriverCandidate::rank_cmp);

                for candidate in &candidates {
                    debug!(
                        alias,
                        driver_id = %candidate.driver_id,
                        season_participation = candidate.season_participation,
                        teammate_overlap = candidate.teammate_overlap,
                        coverage_score = candidate.coverage_score,
                        "Ranked driver candidate"
                    );
                }

                candidates
                    .into_iter()
                    .next()
                    .map(|c| Resolved::ranked(c.driver_id))
                    .ok_or_else(|| ResolveError::unknown(alias))
            }
        }
    }

    /// Resolve each alias one at a time, in input order.
    ///
    /// Repeated aliases keep their first position.
    pub async fn resolve_many(
        &self,
        aliases: &[&str],
        options: &DriverResolveOptions,
    ) -> Vec<(String, ResolutionResult<Resolved>)> {
        let mut out: Vec<(String, ResolutionResult<Resolved>)> = Vec::with_capacity(aliases.len());
        for alias in aliases {
            if out.iter().any(|(seen, _)| seen == alias) {
                continue;
            }
            let result = self.resolve(alias, options).await;
            out.push((alias.to_string(), result));
        }
        out
    }

    async fn score(
        &self,
        driver_id: String,
        options: &DriverResolveOptions,
    ) -> ResolutionResult<DriverCandidate> {
        let season_participation = match options.season {
            Some(season) => self.db.season_participation_count(&driver_id, season).await?,
            None => 0,
        };
        let teammate_overlap = match options.teammate_id.as_deref() {
            Some(teammate) if teammate != driver_id => {
                self.db.teammate_overlap_count(&driver_id, teammate).await?
            }
            _ => 0,
        };
        let coverage_score = self
            .db
            .driver_coverage_score(&driver_id, LAP_CONTRIBUTION_CAP)
            .await?;

        Ok(DriverCandidate {
            driver_id,
            season_participation,
            teammate_overlap,
            coverage_score,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str, season: i64, overlap: i64, coverage: i64) -> DriverCandidate {
        DriverCandidate {
            driver_id: id.to_string(),
            season_participation: season,
            teammate_overlap: overlap,
            coverage_score: coverage,
        }
    }

    #[test]
    fn test_season_tier_dominates_coverage() {
        let a = candidate("a", 1, 0, 0);
        let b = candidate("b", 0, 5, 9999);
        assert_eq!(a.rank_cmp(&b), Ordering::Less);
    }

    #[test]
    fn test_overlap_tier_dominates_coverage() {
        let a = candidate("z", 1, 2, 0);
        let b = candidate("a", 1, 1, 500);
        assert_eq!(a.rank_cmp(&b), Ordering::Less);
    }

    #[test]
    fn test_id_breaks_full_tie() {
        let a = candidate("alpha", 1, 1, 1);
        let b = candidate("beta", 1, 1, 1);
        assert_eq!(a.rank_cmp(&b), Ordering::Less);
        assert_eq!(b.rank_cmp(&a), Ordering::Greater);
    }
}
