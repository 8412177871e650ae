//! Contract with the analytics execution layer.
//!
//! The executor runs a validated, resolved intent against precomputed
//! summary tables. Failures carry an [`ExecutionErrorKind`] so the adaptive
//! loop can decide whether to degrade without reading prose.

use async_trait::async_trait;
use pitwall_intent::{CoverageLevel, CoverageStatus, FallbackReason, QueryIntent, QueryKind};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

// ============================================================================
// Errors
// ============================================================================

/// Closed set of execution failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionErrorKind {
    /// Too few laps shared by both drivers at the scoped track
    InsufficientSharedLaps,
    /// The drivers never shared a constructor in scope
    NoTeammateOverlap,
    /// A sample exists but is below the coverage threshold
    LowCoverageSample,
    /// The summary table has nothing usable for the request
    InsufficientData,
    /// Anything else: SQL errors, missing tables, bad payloads
    Failed,
}

impl ExecutionErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionErrorKind::InsufficientSharedLaps => "insufficient_shared_laps",
            ExecutionErrorKind::NoTeammateOverlap => "no_teammate_overlap",
            ExecutionErrorKind::LowCoverageSample => "low_coverage_sample",
            ExecutionErrorKind::InsufficientData => "insufficient_data",
            ExecutionErrorKind::Failed => "failed",
        }
    }

    /// Fallback reason this failure classifies as, if any.
    pub fn fallback_reason(&self) -> Option<FallbackReason> {
        match self {
            ExecutionErrorKind::InsufficientSharedLaps => Some(FallbackReason::InsufficientSharedLaps),
            ExecutionErrorKind::NoTeammateOverlap => Some(FallbackReason::NoTeammateOverlap),
            ExecutionErrorKind::LowCoverageSample => Some(FallbackReason::LowCoverageSample),
            ExecutionErrorKind::InsufficientData | ExecutionErrorKind::Failed => None,
        }
    }
}

/// Failure reported by an [`Executor`].
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{reason}")]
pub struct ExecutionError {
    pub kind: ExecutionErrorKind,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ExecutionError {
    pub fn new(kind: ExecutionErrorKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
            details: None,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self::new(ExecutionErrorKind::Failed, reason)
    }

    pub fn insufficient_data(reason: impl Into<String>) -> Self {
        Self::new(ExecutionErrorKind::InsufficientData, reason)
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn code(&self) -> &'static str {
        self.kind.as_str()
    }
}

// ============================================================================
// Payloads
// ============================================================================

/// Two drivers on one metric; `delta` is `a - b`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairComparison {
    pub driver_a_id: String,
    pub driver_b_id: String,
    pub metric: String,
    pub driver_a_value: f64,
    pub driver_b_value: f64,
    pub delta: f64,
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub laps_a: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub laps_b: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_id: Option<String>,
}

/// One teammate-gap summary row as reported to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeammateGap {
    pub team_id: String,
    pub driver_primary_id: String,
    pub driver_secondary_id: String,
    pub metric: String,
    /// Negative means the primary driver was faster
    pub gap_percent: f64,
    pub shared_races: u32,
    pub faster_primary_count: u32,
    pub coverage_status: CoverageStatus,
    /// Rank of this gap among all teams in the season (1 = closest)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_rank: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teams_ranked: Option<u32>,
}

/// One driver across two seasons; `delta` is `season - compare_season`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonDelta {
    pub driver_id: String,
    pub season: i32,
    pub compare_season: i32,
    pub metric: String,
    pub season_value: f64,
    pub compare_value: f64,
    pub delta: f64,
    pub unit: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriverSummary {
    pub driver_id: String,
    /// `None` for career-wide summaries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<i32>,
    pub starts: u32,
    pub wins: u32,
    pub podiums: u32,
    pub poles: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_finish: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub position: u32,
    pub driver_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

/// Ordered list of drivers (fastest first, winners, classification, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranking {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<String>,
    #[serde(default)]
    pub unit: String,
    pub entries: Vec<RankingEntry>,
}

/// A counted outcome, optionally against an opponent (head-to-head).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountSummary {
    pub driver_id: String,
    /// What was counted, e.g. "wins", "poles", "qualifying_position"
    pub label: String,
    pub count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opponent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opponent_count: Option<u32>,
}

/// Typed execution payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResultPayload {
    PairComparison(PairComparison),
    TeammateGap(TeammateGap),
    TeammateGapDual {
        race: TeammateGap,
        qualifying: TeammateGap,
    },
    SeasonComparison(SeasonDelta),
    DriverSummary(DriverSummary),
    Ranking(Ranking),
    Count(CountSummary),
    Generic {
        summary: String,
        #[serde(default)]
        data: Value,
    },
}

/// Sample the result was computed over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageInfo {
    pub level: CoverageLevel,
    pub sample_size: u32,
    /// "laps", "races", "sessions", ...
    pub unit: String,
}

impl CoverageInfo {
    pub fn new(level: CoverageLevel, sample_size: u32, unit: impl Into<String>) -> Self {
        Self {
            level,
            sample_size,
            unit: unit.into(),
        }
    }
}

/// Successful execution of one intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub kind: QueryKind,
    pub payload: ResultPayload,
    pub coverage: CoverageInfo,
}

impl QueryResult {
    pub fn new(kind: QueryKind, payload: ResultPayload, coverage: CoverageInfo) -> Self {
        Self {
            kind,
            payload,
            coverage,
        }
    }
}

// ============================================================================
// Executor
// ============================================================================

/// Runs intents against the analytics tables.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(&self, intent: &QueryIntent) -> Result<QueryResult, ExecutionError>;

    /// Machine-readable response for a successful dual teammate comparison.
    fn build_dual_comparison_response_from_payload(
        &self,
        intent: &QueryIntent,
        payload: &ResultPayload,
    ) -> Value {
        json!({
            "status": "ok",
            "kind": intent.kind(),
            "season": intent.season(),
            "payload": payload,
        })
    }

    /// Machine-readable response for a failed dual teammate comparison.
    fn build_dual_comparison_error_response(
        &self,
        intent: &QueryIntent,
        error: &ExecutionError,
    ) -> Value {
        json!({
            "status": "error",
            "kind": intent.kind(),
            "season": intent.season(),
            "error": error.code(),
            "reason": error.reason,
        })
    }
}
