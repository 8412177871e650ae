//! Default metric and normalization filling.

use crate::metric_registry::MetricRegistryValidator;
use pitwall_intent::{non_empty, QueryIntent};

/// Fill an omitted metric with the kind's default, and an omitted
/// normalization with the metric's required one.
///
/// Runs before validation; explicit values are never overwritten, so an
/// unsupported explicit choice still fails validation.
pub fn apply_defaults(intent: &mut QueryIntent) {
    if non_empty(&intent.common.metric).is_none() {
        intent.common.metric = intent.kind().default_metric().map(str::to_string);
    }

    if non_empty(&intent.common.normalization).is_none() {
        intent.common.normalization = non_empty(&intent.common.metric)
            .and_then(MetricRegistryValidator::get_entry)
            .map(|entry| entry.normalization.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pitwall_intent::{DriverPair, DriverRef, Query, TeammatePair};

    #[test]
    fn test_defaults_follow_kind_and_registry() {
        let mut intent = QueryIntent::new(
            Query::SeasonDriverVsDriver(DriverPair::canonical("a", "b")),
            2024,
        );
        apply_defaults(&mut intent);
        assert_eq!(intent.common.metric.as_deref(), Some("season_avg_pace"));
        assert_eq!(intent.common.normalization.as_deref(), Some("session_median_percent"));
    }

    #[test]
    fn test_explicit_metric_kept() {
        let mut intent = QueryIntent::new(
            Query::TeammateGapSummarySeason(TeammatePair::default()),
            2024,
        )
        .with_metric("teammate_gap_qualifying");
        apply_defaults(&mut intent);
        assert_eq!(intent.common.metric.as_deref(), Some("teammate_gap_qualifying"));
        assert_eq!(intent.common.normalization.as_deref(), Some("none"));
    }

    #[test]
    fn test_metric_free_kind_gets_no_metric() {
        let mut intent = QueryIntent::new(Query::DriverWinCount(DriverRef::canonical("x")), 2024);
        apply_defaults(&mut intent);
        assert!(intent.common.metric.is_none());
        assert!(intent.common.normalization.is_none());
    }
}
