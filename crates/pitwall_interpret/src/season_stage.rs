//! Season-adjustment stage of the adaptive loop.
//!
//! When a named driver did not race in the requested season, the request is
//! moved to the latest season every named driver raced in, and the move is
//! recorded as a fallback step.

use crate::answer::display_name;
use pitwall_db::PitwallDb;
use pitwall_intent::{FallbackReason, FallbackStep, Query, QueryIntent};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Result of the season stage: the intent to execute and the step taken, if any.
#[derive(Debug, Clone)]
pub struct SeasonAdjustment {
    pub intent: QueryIntent,
    pub step: Option<FallbackStep>,
}

impl SeasonAdjustment {
    fn unchanged(intent: QueryIntent) -> Self {
        Self { intent, step: None }
    }
}

/// Move the intent to a season all of its drivers raced in, if needed.
pub async fn adjust_season(db: &PitwallDb, intent: QueryIntent) -> pitwall_db::Result<SeasonAdjustment> {
    let driver_ids: Vec<String> = intent
        .query
        .driver_ids()
        .into_iter()
        .map(str::to_string)
        .collect();
    if driver_ids.is_empty() {
        return Ok(SeasonAdjustment::unchanged(intent));
    }

    let season = intent.season();
    let mut missing = Vec::new();
    let mut common: Option<BTreeSet<i32>> = None;
    for driver_id in &driver_ids {
        let seasons: BTreeSet<i32> = db.driver_seasons(driver_id).await?.into_iter().collect();
        if seasons.is_empty() {
            // Unknown to the store; nothing to base a substitution on
            debug!(driver_id, "No season entries, skipping season adjustment");
            return Ok(SeasonAdjustment::unchanged(intent));
        }
        if !seasons.contains(&season) {
            missing.push(driver_id.as_str());
        }
        common = Some(match common {
            Some(acc) => acc.intersection(&seasons).copied().collect(),
            None => seasons,
        });
    }

    if missing.is_empty() {
        return Ok(SeasonAdjustment::unchanged(intent));
    }

    let excluded = match &intent.query {
        Query::DriverSeasonComparison(c) => Some(c.compare_season),
        _ => None,
    };
    let replacement = common
        .unwrap_or_default()
        .into_iter()
        .filter(|s| Some(*s) != excluded)
        .next_back();

    let Some(replacement) = replacement else {
        debug!(season, "No season shared by all drivers");
        return Ok(SeasonAdjustment::unchanged(intent));
    };

    let names: Vec<String> = missing.iter().map(|id| display_name(id)).collect();
    let note = format!(
        "{} did not race in {}; showing {} instead.",
        names.join(" and "),
        season,
        replacement
    );
    info!(
        from_season = season,
        to_season = replacement,
        drivers = ?missing,
        "Substituting season"
    );

    let kind = intent.kind();
    let mut adjusted = intent;
    adjusted.common.season = replacement;
    Ok(SeasonAdjustment {
        intent: adjusted,
        step: Some(FallbackStep::new(
            FallbackReason::DriverNotInSeason,
            kind,
            kind,
            note,
        )),
    })
}
