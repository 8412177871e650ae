//! Per-request outcome types: errors, fallback trail, coverage and confidence.

use crate::kind::QueryKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Minimum shared races for a season to be used as-is.
pub const MIN_SHARED_RACES: u32 = 4;
/// Shared races at which the lookback search stops early.
pub const PREFERRED_SHARED_RACES: u32 = 8;
/// How many prior seasons the lookback search may visit.
pub const MAX_FALLBACK_YEARS: i32 = 3;

// ============================================================================
// Query Error
// ============================================================================

/// Stable error category surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    IntentResolutionFailed,
    ValidationFailed,
    ExecutionFailed,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::IntentResolutionFailed => "intent_resolution_failed",
            ErrorCode::ValidationFailed => "validation_failed",
            ErrorCode::ExecutionFailed => "execution_failed",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Terminal error returned to the caller.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{error}: {reason}")]
pub struct QueryError {
    pub error: ErrorCode,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl QueryError {
    pub fn new(error: ErrorCode, reason: impl Into<String>) -> Self {
        Self {
            error,
            reason: reason.into(),
            details: None,
        }
    }

    pub fn intent_resolution_failed(reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::IntentResolutionFailed, reason)
    }

    pub fn validation_failed(reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, reason)
    }

    pub fn execution_failed(reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::ExecutionFailed, reason)
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

// ============================================================================
// Fallback Trail
// ============================================================================

/// Why a request was degraded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    DriverNotInSeason,
    InsufficientSharedLaps,
    NoTeammateOverlap,
    LowCoverageSample,
}

impl FallbackReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackReason::DriverNotInSeason => "driver_not_in_season",
            FallbackReason::InsufficientSharedLaps => "insufficient_shared_laps",
            FallbackReason::NoTeammateOverlap => "no_teammate_overlap",
            FallbackReason::LowCoverageSample => "low_coverage_sample",
        }
    }
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One recorded degradation of the original request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackStep {
    pub reason: FallbackReason,
    pub from_kind: QueryKind,
    pub to_kind: QueryKind,
    pub note: String,
}

impl FallbackStep {
    pub fn new(
        reason: FallbackReason,
        from_kind: QueryKind,
        to_kind: QueryKind,
        note: impl Into<String>,
    ) -> Self {
        Self {
            reason,
            from_kind,
            to_kind,
            note: note.into(),
        }
    }
}

/// Append-only list of fallback steps for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FallbackTrail(Vec<FallbackStep>);

impl FallbackTrail {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, step: FallbackStep) {
        self.0.push(step);
    }

    pub fn steps(&self) -> &[FallbackStep] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Notes in the order the steps were taken.
    pub fn notes(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|step| step.note.as_str())
    }

    pub fn contains(&self, reason: FallbackReason) -> bool {
        self.0.iter().any(|step| step.reason == reason)
    }

    pub fn into_vec(self) -> Vec<FallbackStep> {
        self.0
    }
}

// ============================================================================
// Coverage and Confidence
// ============================================================================

/// Sample-size classification stored with teammate-gap summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageStatus {
    Valid,
    LowCoverage,
    Insufficient,
}

impl CoverageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoverageStatus::Valid => "valid",
            CoverageStatus::LowCoverage => "low_coverage",
            CoverageStatus::Insufficient => "insufficient",
        }
    }

    /// Parse the stored column value; unknown values are treated as insufficient.
    pub fn parse_lossy(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "valid" => CoverageStatus::Valid,
            "low_coverage" | "low" => CoverageStatus::LowCoverage,
            _ => CoverageStatus::Insufficient,
        }
    }

    /// Classify a shared-race count.
    pub fn from_shared_races(shared_races: u32) -> Self {
        if shared_races >= PREFERRED_SHARED_RACES {
            CoverageStatus::Valid
        } else if shared_races >= MIN_SHARED_RACES {
            CoverageStatus::LowCoverage
        } else {
            CoverageStatus::Insufficient
        }
    }
}

/// Four-valued raw coverage reported with an execution result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageLevel {
    High,
    Moderate,
    Low,
    Insufficient,
}

/// User-facing confidence classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    High,
    Moderate,
    Weak,
    Insufficient,
}

impl From<CoverageLevel> for ConfidenceLevel {
    fn from(level: CoverageLevel) -> Self {
        match level {
            CoverageLevel::High => ConfidenceLevel::High,
            CoverageLevel::Moderate => ConfidenceLevel::Moderate,
            CoverageLevel::Low => ConfidenceLevel::Weak,
            CoverageLevel::Insufficient => ConfidenceLevel::Insufficient,
        }
    }
}

/// Confidence annotation attached to every answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confidence {
    pub level: ConfidenceLevel,
    pub summary: String,
}

impl Confidence {
    /// Build from a raw coverage level and the sample it was computed over.
    pub fn from_level(level: CoverageLevel, sample_size: u32, unit: &str) -> Self {
        let level = ConfidenceLevel::from(level);
        Self {
            level,
            summary: summarize(level, sample_size, unit),
        }
    }

    /// Build from a stored coverage status and its shared-race count.
    pub fn from_status(status: CoverageStatus, shared_races: u32) -> Self {
        let level = match status {
            CoverageStatus::Valid if shared_races >= PREFERRED_SHARED_RACES => {
                ConfidenceLevel::High
            }
            CoverageStatus::Valid => ConfidenceLevel::Moderate,
            CoverageStatus::LowCoverage => ConfidenceLevel::Weak,
            CoverageStatus::Insufficient => ConfidenceLevel::Insufficient,
        };
        Self {
            level,
            summary: summarize(level, shared_races, "shared races"),
        }
    }

    /// Confidence for an answer that could not be produced.
    pub fn insufficient(summary: impl Into<String>) -> Self {
        Self {
            level: ConfidenceLevel::Insufficient,
            summary: summary.into(),
        }
    }
}

fn summarize(level: ConfidenceLevel, sample_size: u32, unit: &str) -> String {
    match level {
        ConfidenceLevel::High => format!("High confidence: based on {} {}.", sample_size, unit),
        ConfidenceLevel::Moderate => {
            format!("Moderate confidence: based on {} {}.", sample_size, unit)
        }
        ConfidenceLevel::Weak => format!(
            "Weak confidence: only {} {}; treat this as indicative.",
            sample_size, unit
        ),
        ConfidenceLevel::Insufficient => format!(
            "Insufficient coverage: {} {} is below the reporting threshold.",
            sample_size, unit
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_error_serializes_stable_codes() {
        let err = QueryError::validation_failed("driver_a and driver_b must differ");
        let encoded = serde_json::to_value(&err).unwrap();
        assert_eq!(encoded["error"], "validation_failed");
        assert!(encoded.get("details").is_none());
        assert_eq!(
            err.to_string(),
            "validation_failed: driver_a and driver_b must differ"
        );
    }

    #[test]
    fn test_trail_is_append_only_and_ordered() {
        let mut trail = FallbackTrail::new();
        trail.push(FallbackStep::new(
            FallbackReason::DriverNotInSeason,
            QueryKind::DriverSeasonSummary,
            QueryKind::DriverSeasonSummary,
            "first",
        ));
        trail.push(FallbackStep::new(
            FallbackReason::LowCoverageSample,
            QueryKind::DriverSeasonSummary,
            QueryKind::DriverSeasonSummary,
            "second",
        ));
        assert_eq!(trail.notes().collect::<Vec<_>>(), vec!["first", "second"]);
        assert!(trail.contains(FallbackReason::LowCoverageSample));
        assert!(!trail.contains(FallbackReason::NoTeammateOverlap));
    }

    #[test]
    fn test_coverage_level_mapping() {
        assert_eq!(ConfidenceLevel::from(CoverageLevel::High), ConfidenceLevel::High);
        assert_eq!(
            ConfidenceLevel::from(CoverageLevel::Moderate),
            ConfidenceLevel::Moderate
        );
        assert_eq!(ConfidenceLevel::from(CoverageLevel::Low), ConfidenceLevel::Weak);
        assert_eq!(
            ConfidenceLevel::from(CoverageLevel::Insufficient),
            ConfidenceLevel::Insufficient
        );
    }

    #[test]
    fn test_status_confidence_uses_sample_size() {
        assert_eq!(
            Confidence::from_status(CoverageStatus::Valid, 12).level,
            ConfidenceLevel::High
        );
        assert_eq!(
            Confidence::from_status(CoverageStatus::Valid, 5).level,
            ConfidenceLevel::Moderate
        );
        assert_eq!(
            Confidence::from_status(CoverageStatus::LowCoverage, 5).level,
            ConfidenceLevel::Weak
        );
    }

    #[test]
    fn test_shared_race_classification() {
        assert_eq!(CoverageStatus::from_shared_races(3), CoverageStatus::Insufficient);
        assert_eq!(CoverageStatus::from_shared_races(4), CoverageStatus::LowCoverage);
        assert_eq!(CoverageStatus::from_shared_races(8), CoverageStatus::Valid);
        assert_eq!(CoverageStatus::parse_lossy("LOW_COVERAGE"), CoverageStatus::LowCoverage);
        assert_eq!(CoverageStatus::parse_lossy("???"), CoverageStatus::Insufficient);
    }
}
