//! Structural intent validation.
//!
//! Season range first, then the kind's own slot and sub-filter rules, then
//! the metric registry for kinds that read a pace metric. The first violation
//! wins; errors are never aggregated.

use crate::metric_registry::MetricRegistryValidator;
use chrono::NaiveDate;
use pitwall_intent::{
    non_empty, DriverPair, DriverRef, DriverSet, HeadToHead, Query, QueryError, QueryIntent,
    TeammatePair, TrackRef, TrackSet, MAX_SEASON, MIN_SEASON,
};
use tracing::debug;

pub type ValidationResult = Result<(), QueryError>;

pub const SESSION_SCOPES: &[&str] = &["race", "qualifying", "sprint", "all"];
pub const COMPOUND_CONTEXTS: &[&str] = &["mixed", "soft", "medium", "hard", "intermediate", "wet"];
pub const H2H_METRICS: &[&str] = &["qualifying_position", "race_finish_position"];
pub const H2H_SCOPES: &[&str] = &["field", "teammate"];
pub const H2H_SESSIONS: &[&str] = &["race", "qualifying", "sprint"];
pub const TRACK_TYPES: &[&str] = &["street", "permanent"];
pub const WEATHER_CONDITIONS: &[&str] = &["dry", "wet", "mixed"];

/// Bounds for multi-driver and multi-track comparisons.
pub const MIN_COMPARED: usize = 2;
pub const MAX_COMPARED: usize = 6;

/// Validates intents before identity resolution.
pub struct IntentValidator;

impl IntentValidator {
    pub fn validate(intent: &QueryIntent) -> ValidationResult {
        let result = Self::check(intent);
        if let Err(err) = &result {
            debug!(kind = %intent.kind(), reason = %err.reason, "Intent failed validation");
        }
        result
    }

    /// Distinctness over canonical ids, once identity resolution has run.
    ///
    /// Different surface names can resolve to one driver or track
    /// (`Verstappen` and `VER`), which `validate` cannot see.
    pub fn validate_resolved(intent: &QueryIntent) -> ValidationResult {
        let result = Self::check_resolved(intent);
        if let Err(err) = &result {
            debug!(kind = %intent.kind(), reason = %err.reason, "Resolved intent failed validation");
        }
        result
    }

    fn check_resolved(intent: &QueryIntent) -> ValidationResult {
        let slots = intent.query.slots();
        if let Some((a, b)) = slots.pair.and_then(DriverPair::ids) {
            if a == b {
                return Err(invalid(format!(
                    "cannot compare a driver with themselves ({} on both sides)",
                    a
                )));
            }
        }
        if let Some(set) = slots.drivers {
            check_distinct("driver_ids", &set.driver_ids)?;
        }
        if let Some(set) = slots.tracks {
            check_distinct("track_ids", &set.track_ids)?;
        }
        Ok(())
    }

    fn check(intent: &QueryIntent) -> ValidationResult {
        check_season("season", intent.season())?;
        check_common(intent)?;

        match &intent.query {
            Query::DriverSeasonSummary(d)
            | Query::DriverCareerSummary(d)
            | Query::DriverProfileSummary(d)
            | Query::DriverPerformanceVector(d)
            | Query::DriverPoleCount(d)
            | Query::DriverCareerPoleCount(d)
            | Query::DriverWinCount(d) => require_driver(d, "driver")?,
            Query::DriverTrendSummary(t) => {
                require_driver(&t.driver, "driver")?;
                if let Some(start) = t.start_season {
                    check_season("start_season", start)?;
                }
                if let Some(end) = t.end_season {
                    check_season("end_season", end)?;
                }
                if let (Some(start), Some(end)) = (t.start_season, t.end_season) {
                    if start > end {
                        return Err(invalid(format!(
                            "start_season {} is after end_season {}",
                            start, end
                        )));
                    }
                }
            }
            Query::DriverSeasonComparison(c) => {
                require_driver(&c.driver, "driver")?;
                check_season("compare_season", c.compare_season)?;
                if c.compare_season == intent.season() {
                    return Err(invalid("compare_season must differ from season"));
                }
            }
            Query::SeasonDriverVsDriver(p)
            | Query::DriverVsDriverComprehensive(p)
            | Query::DriverMatchupLookup(p)
            | Query::QualifyingGapDrivers(p) => require_pair(p)?,
            Query::CrossTeamTrackScopedDriverComparison(p) => {
                require_pair(&p.pair)?;
                require_track(&p.track)?;
            }
            Query::DriverHeadToHeadCount(h) => check_head_to_head(h)?,
            Query::DriverMultiComparison(s) => check_driver_set(s)?,
            Query::TeammateGapSummarySeason(t) | Query::TeammateGapDualComparison(t) => {
                check_teammate_pair(t)?
            }
            Query::TrackFastestDrivers(t)
            | Query::RaceResultsSummary(t)
            | Query::QualifyingResultsSummary(t)
            | Query::TrackWinners(t) => require_track(t)?,
            Query::DriverTrackHistory(d) => {
                require_driver(&d.driver, "driver")?;
                require_track(&d.track)?;
            }
            Query::DriverMultiTrackComparison(d) => {
                require_driver(&d.driver, "driver")?;
                check_track_set(&d.tracks)?;
            }
            Query::SeasonDriverRankings => {}
        }

        check_metric(intent)
    }
}

fn invalid(reason: impl Into<String>) -> QueryError {
    QueryError::validation_failed(reason)
}

fn check_season(field: &str, season: i32) -> ValidationResult {
    if (MIN_SEASON..=MAX_SEASON).contains(&season) {
        Ok(())
    } else {
        Err(invalid(format!(
            "{} must be between {} and {}, got {}",
            field, MIN_SEASON, MAX_SEASON, season
        )))
    }
}

fn check_member(field: &str, value: &Option<String>, allowed: &[&str]) -> ValidationResult {
    match value.as_deref() {
        None => Ok(()),
        Some(v) if allowed.contains(&v) => Ok(()),
        Some(v) => Err(invalid(format!(
            "{} must be one of {}, got '{}'",
            field,
            allowed.join("|"),
            v
        ))),
    }
}

fn check_common(intent: &QueryIntent) -> ValidationResult {
    check_member("session_scope", &intent.common.session_scope, SESSION_SCOPES)?;
    check_member("compound_context", &intent.common.compound_context, COMPOUND_CONTEXTS)
}

fn check_metric(intent: &QueryIntent) -> ValidationResult {
    let kind = intent.kind();
    if MetricRegistryValidator::is_metric_free(kind) {
        return Ok(());
    }

    let Some(metric) = non_empty(&intent.common.metric) else {
        return Err(invalid(format!("metric is required for {}", kind)));
    };
    let Some(normalization) = non_empty(&intent.common.normalization) else {
        return Err(invalid(format!("normalization is required for metric '{}'", metric)));
    };

    MetricRegistryValidator::validate(metric, kind, normalization)
        .map_err(|violation| invalid(violation.to_string()))
}

fn present(surface: &Option<String>, canonical: &Option<String>) -> bool {
    non_empty(surface).is_some() || non_empty(canonical).is_some()
}

fn require_driver(driver: &DriverRef, field: &str) -> ValidationResult {
    if present(&driver.driver, &driver.driver_id) {
        Ok(())
    } else {
        Err(invalid(format!("{} is required", field)))
    }
}

fn require_track(track: &TrackRef) -> ValidationResult {
    if present(&track.track, &track.track_id) {
        Ok(())
    } else {
        Err(invalid("track is required"))
    }
}

/// Comparison key for self-comparison checks: the canonical id when known,
/// otherwise the case-folded surface text.
fn side_key(surface: &Option<String>, canonical: &Option<String>) -> Option<String> {
    non_empty(canonical)
        .map(str::to_string)
        .or_else(|| non_empty(surface).map(|s| s.to_lowercase()))
}

fn require_pair(pair: &DriverPair) -> ValidationResult {
    if !present(&pair.driver_a, &pair.driver_a_id) {
        return Err(invalid("driver_a is required"));
    }
    if !present(&pair.driver_b, &pair.driver_b_id) {
        return Err(invalid("driver_b is required"));
    }
    check_not_self(pair)
}

fn check_not_self(pair: &DriverPair) -> ValidationResult {
    let a_id = non_empty(&pair.driver_a_id);
    let b_id = non_empty(&pair.driver_b_id);
    let same = match (a_id, b_id) {
        (Some(a), Some(b)) => a == b,
        (None, None) => {
            side_key(&pair.driver_a, &None) == side_key(&pair.driver_b, &None)
        }
        // Mixed surface/canonical sides: see `IntentValidator::validate_resolved`.
        _ => false,
    };
    if same {
        Err(invalid("cannot compare a driver with themselves"))
    } else {
        Ok(())
    }
}

fn check_teammate_pair(t: &TeammatePair) -> ValidationResult {
    let has_a = present(&t.pair.driver_a, &t.pair.driver_a_id);
    let has_b = present(&t.pair.driver_b, &t.pair.driver_b_id);
    if has_a && has_b {
        return check_not_self(&t.pair);
    }
    if non_empty(&t.team_id).is_some() {
        return Ok(());
    }
    Err(invalid("teammate gap queries need driver_a and driver_b, or team_id"))
}

fn check_count(field: &str, count: usize) -> ValidationResult {
    if (MIN_COMPARED..=MAX_COMPARED).contains(&count) {
        Ok(())
    } else {
        Err(invalid(format!(
            "{} must list between {} and {} entries, got {}",
            field, MIN_COMPARED, MAX_COMPARED, count
        )))
    }
}

fn check_distinct(field: &str, values: &[String]) -> ValidationResult {
    let mut keys: Vec<String> = values.iter().map(|v| v.trim().to_lowercase()).collect();
    keys.sort_unstable();
    let before = keys.len();
    keys.dedup();
    if keys.len() == before {
        Ok(())
    } else {
        Err(invalid(format!("{} must not repeat an entry", field)))
    }
}

fn check_driver_set(set: &DriverSet) -> ValidationResult {
    let (field, values) = if set.driver_ids.is_empty() {
        ("drivers", &set.drivers)
    } else {
        ("driver_ids", &set.driver_ids)
    };
    check_count(field, values.iter().filter(|v| !v.trim().is_empty()).count())?;
    check_distinct(field, values)
}

fn check_track_set(set: &TrackSet) -> ValidationResult {
    let (field, values) = if set.track_ids.is_empty() {
        ("tracks", &set.tracks)
    } else {
        ("track_ids", &set.track_ids)
    };
    check_count(field, values.iter().filter(|v| !v.trim().is_empty()).count())?;
    check_distinct(field, values)
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate, QueryError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| invalid(format!("{} must be an ISO date (YYYY-MM-DD), got '{}'", field, value)))
}

fn check_head_to_head(h: &HeadToHead) -> ValidationResult {
    require_pair(&h.pair)?;

    if !H2H_METRICS.contains(&h.h2h_metric.as_str()) {
        return Err(invalid(format!(
            "h2h_metric must be one of {}, got '{}'",
            H2H_METRICS.join("|"),
            h.h2h_metric
        )));
    }
    check_member("h2h_scope", &h.h2h_scope, H2H_SCOPES)?;

    let filters = &h.filters;
    check_member("filters.session", &filters.session, H2H_SESSIONS)?;
    check_member("filters.track_type", &filters.track_type, TRACK_TYPES)?;
    check_member("filters.weather", &filters.weather, WEATHER_CONDITIONS)?;

    let from = non_empty(&filters.date_from)
        .map(|v| parse_date("filters.date_from", v))
        .transpose()?;
    let to = non_empty(&filters.date_to)
        .map(|v| parse_date("filters.date_to", v))
        .transpose()?;
    if let (Some(from), Some(to)) = (from, to) {
        if from > to {
            return Err(invalid(format!(
                "filters.date_from {} is after filters.date_to {}",
                from, to
            )));
        }
    }
    Ok(())
}
