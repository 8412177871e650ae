//! Kind-downgrade stage of the adaptive loop.

use crate::answer::display_name;
use crate::executor::ExecutionError;
use pitwall_intent::{DriverPair, FallbackReason, FallbackStep, Query, QueryIntent};
use pitwall_rules::{apply_defaults, IntentValidator};

/// Fallback reason an execution failure maps to, if it is eligible at all.
pub fn classify(error: &ExecutionError) -> Option<FallbackReason> {
    error.kind.fallback_reason()
}

/// Broader intent to try after `reason`, with the step describing the move.
///
/// Only track-scoped pair comparisons with both driver ids known degrade,
/// to the season-wide comparison of the same pair. The season and common
/// qualifiers carry over; metric and normalization are re-defaulted for the
/// new kind.
pub fn downgrade(intent: &QueryIntent, reason: FallbackReason) -> Option<(QueryIntent, FallbackStep)> {
    let Query::CrossTeamTrackScopedDriverComparison(scoped) = &intent.query else {
        return None;
    };
    let (a, b) = scoped.pair.ids()?;

    let mut common = intent.common.clone();
    common.metric = None;
    common.normalization = None;
    let mut next = QueryIntent {
        query: Query::SeasonDriverVsDriver(DriverPair::canonical(a, b)),
        common,
    };
    apply_defaults(&mut next);
    IntentValidator::validate(&next).ok()?;

    let place = scoped
        .track
        .track_id
        .as_deref()
        .map(display_name)
        .unwrap_or_else(|| "this track".to_string());
    let season = intent.season();
    let note = match reason {
        FallbackReason::InsufficientSharedLaps => format!(
            "Not enough shared laps at {place}; showing the {season} season-wide comparison instead."
        ),
        FallbackReason::LowCoverageSample => format!(
            "The sample at {place} is too small; showing the {season} season-wide comparison instead."
        ),
        FallbackReason::NoTeammateOverlap | FallbackReason::DriverNotInSeason => format!(
            "No comparable running at {place}; showing the {season} season-wide comparison instead."
        ),
    };

    let step = FallbackStep::new(reason, intent.kind(), next.kind(), note);
    Some((next, step))
}
