//! Approved metric x scope x normalization x context combinations.
//!
//! The registry is fail-closed: an unknown metric, a metric used outside its
//! allowed contexts, or a normalization other than the metric's required one
//! is rejected. Result-style kinds that never read a pace metric are
//! metric-free and bypass the registry.

use pitwall_intent::QueryKind;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::LazyLock;
use thiserror::Error;

/// Normalization applied to raw lap times.
pub const NORMALIZATION_NONE: &str = "none";
/// Percent of the session median lap; comparable across circuits.
pub const NORMALIZATION_SESSION_MEDIAN_PERCENT: &str = "session_median_percent";

/// Granularity a metric is summarized at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricScope {
    DriverTrack,
    DriverSeason,
    TeammateSeason,
}

/// Which direction of a metric ranks ahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingBasis {
    LowerIsFaster,
    HigherIsBetter,
}

impl RankingBasis {
    pub fn as_str(&self) -> &'static str {
        match self {
            RankingBasis::LowerIsFaster => "lower_is_faster",
            RankingBasis::HigherIsBetter => "higher_is_better",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricEntry {
    pub metric: &'static str,
    pub scope: MetricScope,
    pub ranking_basis: RankingBasis,
    /// Required normalization
    pub normalization: &'static str,
    pub allowed_contexts: &'static [QueryKind],
}

/// Why a (metric, context, normalization) triple was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryViolation {
    #[error("Unknown metric '{metric}'")]
    UnknownMetric { metric: String },

    #[error("Metric '{metric}' is not allowed for {context}")]
    ContextNotAllowed { metric: String, context: QueryKind },

    #[error("Metric '{metric}' requires normalization '{expected}', got '{actual}'")]
    NormalizationMismatch {
        metric: String,
        expected: &'static str,
        actual: String,
    },
}

/// Kinds that report results rather than pace metrics.
pub const METRIC_FREE_CONTEXTS: &[QueryKind] = &[
    QueryKind::DriverSeasonSummary,
    QueryKind::DriverCareerSummary,
    QueryKind::DriverProfileSummary,
    QueryKind::DriverPoleCount,
    QueryKind::DriverCareerPoleCount,
    QueryKind::DriverWinCount,
    QueryKind::DriverMatchupLookup,
    QueryKind::DriverHeadToHeadCount,
    QueryKind::RaceResultsSummary,
    QueryKind::QualifyingResultsSummary,
    QueryKind::TrackWinners,
    QueryKind::SeasonDriverRankings,
];

/// The single documented alternate normalization: cross-circuit averages of
/// true pace may use the session-median percentage.
const ALTERNATE_NORMALIZATIONS: &[(&str, QueryKind, &str)] = &[(
    "avg_true_pace",
    QueryKind::DriverMultiTrackComparison,
    NORMALIZATION_SESSION_MEDIAN_PERCENT,
)];

const TRACK_PACE_CONTEXTS: &[QueryKind] = &[
    QueryKind::CrossTeamTrackScopedDriverComparison,
    QueryKind::TrackFastestDrivers,
    QueryKind::DriverTrackHistory,
    QueryKind::DriverMultiTrackComparison,
];

const CLEAN_AIR_CONTEXTS: &[QueryKind] = &[
    QueryKind::CrossTeamTrackScopedDriverComparison,
    QueryKind::TrackFastestDrivers,
    QueryKind::DriverTrackHistory,
];

const SEASON_PACE_CONTEXTS: &[QueryKind] = &[
    QueryKind::DriverTrendSummary,
    QueryKind::DriverPerformanceVector,
    QueryKind::DriverSeasonComparison,
    QueryKind::SeasonDriverVsDriver,
    QueryKind::DriverVsDriverComprehensive,
    QueryKind::DriverMultiComparison,
];

const TEAMMATE_CONTEXTS: &[QueryKind] = &[
    QueryKind::TeammateGapSummarySeason,
    QueryKind::TeammateGapDualComparison,
];

static REGISTRY: LazyLock<HashMap<&'static str, MetricEntry>> = LazyLock::new(|| {
    [
        MetricEntry {
            metric: "avg_true_pace",
            scope: MetricScope::DriverTrack,
            ranking_basis: RankingBasis::LowerIsFaster,
            normalization: NORMALIZATION_NONE,
            allowed_contexts: TRACK_PACE_CONTEXTS,
        },
        MetricEntry {
            metric: "clean_air_pace",
            scope: MetricScope::DriverTrack,
            ranking_basis: RankingBasis::LowerIsFaster,
            normalization: NORMALIZATION_NONE,
            allowed_contexts: CLEAN_AIR_CONTEXTS,
        },
        MetricEntry {
            metric: "season_avg_pace",
            scope: MetricScope::DriverSeason,
            ranking_basis: RankingBasis::LowerIsFaster,
            normalization: NORMALIZATION_SESSION_MEDIAN_PERCENT,
            allowed_contexts: SEASON_PACE_CONTEXTS,
        },
        MetricEntry {
            metric: "qualifying_gap",
            scope: MetricScope::DriverSeason,
            ranking_basis: RankingBasis::LowerIsFaster,
            normalization: NORMALIZATION_NONE,
            allowed_contexts: &[QueryKind::QualifyingGapDrivers],
        },
        MetricEntry {
            metric: "teammate_gap_raw",
            scope: MetricScope::TeammateSeason,
            ranking_basis: RankingBasis::LowerIsFaster,
            normalization: NORMALIZATION_NONE,
            allowed_contexts: TEAMMATE_CONTEXTS,
        },
        MetricEntry {
            metric: "teammate_gap_qualifying",
            scope: MetricScope::TeammateSeason,
            ranking_basis: RankingBasis::LowerIsFaster,
            normalization: NORMALIZATION_NONE,
            allowed_contexts: TEAMMATE_CONTEXTS,
        },
    ]
    .into_iter()
    .map(|entry| (entry.metric, entry))
    .collect()
});

/// Read-only access to the metric registry.
pub struct MetricRegistryValidator;

impl MetricRegistryValidator {
    pub fn is_metric_free(context: QueryKind) -> bool {
        METRIC_FREE_CONTEXTS.contains(&context)
    }

    pub fn get_entry(metric: &str) -> Option<&'static MetricEntry> {
        REGISTRY.get(metric)
    }

    pub fn is_allowed_in_context(metric: &str, context: QueryKind) -> bool {
        Self::get_entry(metric).is_some_and(|entry| entry.allowed_contexts.contains(&context))
    }

    pub fn get_ranking_basis(metric: &str) -> Option<RankingBasis> {
        Self::get_entry(metric).map(|entry| entry.ranking_basis)
    }

    /// Every registered metric name, sorted.
    pub fn metrics() -> Vec<&'static str> {
        let mut names: Vec<&'static str> = REGISTRY.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Check one (metric, context, normalization) triple.
    pub fn validate(
        metric: &str,
        context: QueryKind,
        normalization: &str,
    ) -> Result<(), RegistryViolation> {
        if Self::is_metric_free(context) {
            return Ok(());
        }

        let entry = Self::get_entry(metric).ok_or_else(|| RegistryViolation::UnknownMetric {
            metric: metric.to_string(),
        })?;

        if !entry.allowed_contexts.contains(&context) {
            return Err(RegistryViolation::ContextNotAllowed {
                metric: metric.to_string(),
                context,
            });
        }

        if normalization == entry.normalization {
            return Ok(());
        }
        let alternate_ok = ALTERNATE_NORMALIZATIONS
            .iter()
            .any(|(m, ctx, norm)| *m == metric && *ctx == context && *norm == normalization);
        if alternate_ok {
            return Ok(());
        }

        Err(RegistryViolation::NormalizationMismatch {
            metric: metric.to_string(),
            expected: entry.normalization,
            actual: normalization.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_free_contexts_bypass() {
        assert!(MetricRegistryValidator::validate("anything", QueryKind::TrackWinners, "whatever").is_ok());
    }

    #[test]
    fn test_unknown_metric_rejected() {
        let err = MetricRegistryValidator::validate(
            "vibes_index",
            QueryKind::SeasonDriverVsDriver,
            NORMALIZATION_NONE,
        )
        .unwrap_err();
        assert!(matches!(err, RegistryViolation::UnknownMetric { .. }));
    }

    #[test]
    fn test_out_of_context_rejected() {
        let err = MetricRegistryValidator::validate(
            "teammate_gap_raw",
            QueryKind::SeasonDriverVsDriver,
            NORMALIZATION_NONE,
        )
        .unwrap_err();
        assert!(matches!(err, RegistryViolation::ContextNotAllowed { .. }));
    }

    #[test]
    fn test_alternate_normalization_only_for_documented_pair() {
        assert!(MetricRegistryValidator::validate(
            "avg_true_pace",
            QueryKind::DriverMultiTrackComparison,
            NORMALIZATION_SESSION_MEDIAN_PERCENT,
        )
        .is_ok());

        let err = MetricRegistryValidator::validate(
            "avg_true_pace",
            QueryKind::TrackFastestDrivers,
            NORMALIZATION_SESSION_MEDIAN_PERCENT,
        )
        .unwrap_err();
        assert!(matches!(err, RegistryViolation::NormalizationMismatch { .. }));
    }

    #[test]
    fn test_every_default_metric_is_registered_for_its_kind() {
        for kind in QueryKind::ALL {
            match kind.default_metric() {
                Some(metric) => {
                    assert!(
                        MetricRegistryValidator::is_allowed_in_context(metric, kind),
                        "{} not allowed in {}",
                        metric,
                        kind
                    );
                }
                None => assert!(MetricRegistryValidator::is_metric_free(kind), "{}", kind),
            }
        }
    }

    #[test]
    fn test_ranking_basis_lookup() {
        assert_eq!(
            MetricRegistryValidator::get_ranking_basis("qualifying_gap"),
            Some(RankingBasis::LowerIsFaster)
        );
        assert_eq!(MetricRegistryValidator::get_ranking_basis("nope"), None);
    }
}
