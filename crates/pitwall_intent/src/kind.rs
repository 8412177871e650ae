//! Fieldless query kind discriminant.
//!
//! `QueryKind` mirrors the variants of [`crate::Query`] one-to-one. It is what
//! the registry, the fallback trail and the answer builder key on.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Kind of analytics request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    DriverSeasonSummary,
    DriverCareerSummary,
    DriverProfileSummary,
    DriverTrendSummary,
    DriverPerformanceVector,
    DriverPoleCount,
    DriverCareerPoleCount,
    DriverWinCount,
    DriverSeasonComparison,
    SeasonDriverVsDriver,
    CrossTeamTrackScopedDriverComparison,
    DriverVsDriverComprehensive,
    DriverMatchupLookup,
    DriverHeadToHeadCount,
    QualifyingGapDrivers,
    DriverMultiComparison,
    TeammateGapSummarySeason,
    TeammateGapDualComparison,
    TrackFastestDrivers,
    RaceResultsSummary,
    QualifyingResultsSummary,
    TrackWinners,
    DriverTrackHistory,
    DriverMultiTrackComparison,
    SeasonDriverRankings,
}

impl QueryKind {
    pub const ALL: [QueryKind; 25] = [
        QueryKind::DriverSeasonSummary,
        QueryKind::DriverCareerSummary,
        QueryKind::DriverProfileSummary,
        QueryKind::DriverTrendSummary,
        QueryKind::DriverPerformanceVector,
        QueryKind::DriverPoleCount,
        QueryKind::DriverCareerPoleCount,
        QueryKind::DriverWinCount,
        QueryKind::DriverSeasonComparison,
        QueryKind::SeasonDriverVsDriver,
        QueryKind::CrossTeamTrackScopedDriverComparison,
        QueryKind::DriverVsDriverComprehensive,
        QueryKind::DriverMatchupLookup,
        QueryKind::DriverHeadToHeadCount,
        QueryKind::QualifyingGapDrivers,
        QueryKind::DriverMultiComparison,
        QueryKind::TeammateGapSummarySeason,
        QueryKind::TeammateGapDualComparison,
        QueryKind::TrackFastestDrivers,
        QueryKind::RaceResultsSummary,
        QueryKind::QualifyingResultsSummary,
        QueryKind::TrackWinners,
        QueryKind::DriverTrackHistory,
        QueryKind::DriverMultiTrackComparison,
        QueryKind::SeasonDriverRankings,
    ];

    /// Wire name, identical to the serde tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryKind::DriverSeasonSummary => "driver_season_summary",
            QueryKind::DriverCareerSummary => "driver_career_summary",
            QueryKind::DriverProfileSummary => "driver_profile_summary",
            QueryKind::DriverTrendSummary => "driver_trend_summary",
            QueryKind::DriverPerformanceVector => "driver_performance_vector",
            QueryKind::DriverPoleCount => "driver_pole_count",
            QueryKind::DriverCareerPoleCount => "driver_career_pole_count",
            QueryKind::DriverWinCount => "driver_win_count",
            QueryKind::DriverSeasonComparison => "driver_season_comparison",
            QueryKind::SeasonDriverVsDriver => "season_driver_vs_driver",
            QueryKind::CrossTeamTrackScopedDriverComparison => {
                "cross_team_track_scoped_driver_comparison"
            }
            QueryKind::DriverVsDriverComprehensive => "driver_vs_driver_comprehensive",
            QueryKind::DriverMatchupLookup => "driver_matchup_lookup",
            QueryKind::DriverHeadToHeadCount => "driver_head_to_head_count",
            QueryKind::QualifyingGapDrivers => "qualifying_gap_drivers",
            QueryKind::DriverMultiComparison => "driver_multi_comparison",
            QueryKind::TeammateGapSummarySeason => "teammate_gap_summary_season",
            QueryKind::TeammateGapDualComparison => "teammate_gap_dual_comparison",
            QueryKind::TrackFastestDrivers => "track_fastest_drivers",
            QueryKind::RaceResultsSummary => "race_results_summary",
            QueryKind::QualifyingResultsSummary => "qualifying_results_summary",
            QueryKind::TrackWinners => "track_winners",
            QueryKind::DriverTrackHistory => "driver_track_history",
            QueryKind::DriverMultiTrackComparison => "driver_multi_track_comparison",
            QueryKind::SeasonDriverRankings => "season_driver_rankings",
        }
    }

    /// Kinds that run through the bounded degrade-and-retry loop.
    pub fn is_adaptive(&self) -> bool {
        matches!(
            self,
            QueryKind::CrossTeamTrackScopedDriverComparison
                | QueryKind::DriverSeasonComparison
                | QueryKind::DriverSeasonSummary
                | QueryKind::DriverCareerSummary
                | QueryKind::TeammateGapSummarySeason
                | QueryKind::TeammateGapDualComparison
        )
    }

    pub fn is_teammate_gap(&self) -> bool {
        matches!(
            self,
            QueryKind::TeammateGapSummarySeason | QueryKind::TeammateGapDualComparison
        )
    }

    /// Metric used when the intent does not name one.
    ///
    /// `None` for kinds that report results rather than pace metrics.
    pub fn default_metric(&self) -> Option<&'static str> {
        match self {
            QueryKind::DriverTrendSummary
            | QueryKind::DriverPerformanceVector
            | QueryKind::DriverSeasonComparison
            | QueryKind::SeasonDriverVsDriver
            | QueryKind::DriverVsDriverComprehensive
            | QueryKind::DriverMultiComparison => Some("season_avg_pace"),
            QueryKind::CrossTeamTrackScopedDriverComparison
            | QueryKind::TrackFastestDrivers
            | QueryKind::DriverTrackHistory
            | QueryKind::DriverMultiTrackComparison => Some("avg_true_pace"),
            QueryKind::QualifyingGapDrivers => Some("qualifying_gap"),
            QueryKind::TeammateGapSummarySeason | QueryKind::TeammateGapDualComparison => {
                Some("teammate_gap_raw")
            }
            QueryKind::DriverSeasonSummary
            | QueryKind::DriverCareerSummary
            | QueryKind::DriverProfileSummary
            | QueryKind::DriverPoleCount
            | QueryKind::DriverCareerPoleCount
            | QueryKind::DriverWinCount
            | QueryKind::DriverMatchupLookup
            | QueryKind::DriverHeadToHeadCount
            | QueryKind::RaceResultsSummary
            | QueryKind::QualifyingResultsSummary
            | QueryKind::TrackWinners
            | QueryKind::SeasonDriverRankings => None,
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when parsing a QueryKind from string.
#[derive(Debug, Error, Clone)]
#[error("unknown query kind: {0}")]
pub struct KindParseError(String);

impl std::str::FromStr for QueryKind {
    type Err = KindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QueryKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| KindParseError(s.to_string()))
    }
}
