//! Interpretation of resolved Pitwall intents into answers.
//!
//! - [`Executor`]: contract with the analytics execution layer
//! - [`find_best_season_with_coverage`]: explicit season lookback for thin samples
//! - [`InterpretationBuilder`]: validate, resolve, execute and degrade within a bounded loop
//! - [`Answer`]: headline, bullets, confidence and follow-ups

mod answer;
mod builder;
mod config;
mod coverage;
mod diagnostics;
mod downgrade;
mod executor;
mod season_stage;

pub use answer::{
    advantage, build_answer, display_name, fail_closed_answer, follow_ups, format_metric,
    overlap_percent, Advantage, Answer, FAIL_CLOSED_HEADLINE,
};
pub use builder::{InterpretationBuilder, InterpretationResponse};
pub use config::{AdaptiveLoopConfig, CoverageConfig};
pub use coverage::{
    calculate_percentile, calculate_teammate_gap_percentile, find_best_season_with_coverage,
    SeasonCoverage, SeasonSearch,
};
pub use diagnostics::{diagnose_teammate_gap, GapDiagnosis};
pub use downgrade::{classify, downgrade};
pub use executor::{
    CountSummary, CoverageInfo, DriverSummary, ExecutionError, ExecutionErrorKind, Executor,
    PairComparison, QueryResult, Ranking, RankingEntry, ResultPayload, SeasonDelta, TeammateGap,
};
pub use season_stage::{adjust_season, SeasonAdjustment};
