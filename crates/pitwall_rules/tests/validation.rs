//! Registry and validator behavior over parsed intents.

use pitwall_intent::{ErrorCode, QueryIntent, QueryKind};
use pitwall_rules::{
    apply_defaults, IntentValidator, MetricRegistryValidator, RegistryViolation,
    NORMALIZATION_NONE, NORMALIZATION_SESSION_MEDIAN_PERCENT,
};
use proptest::prelude::*;
use serde_json::{json, Value};

fn parse(value: Value) -> QueryIntent {
    let mut intent: QueryIntent = serde_json::from_value(value).unwrap();
    apply_defaults(&mut intent);
    intent
}

fn reason(value: Value) -> String {
    let err = IntentValidator::validate(&parse(value)).unwrap_err();
    assert_eq!(err.error, ErrorCode::ValidationFailed);
    err.reason
}

#[test]
fn test_valid_intents_pass() {
    let intents = [
        json!({ "kind": "teammate_gap_summary_season", "season": 2023, "team_id": "red_bull" }),
        json!({ "kind": "cross_team_track_scoped_driver_comparison", "season": 2024,
                "driver_a": "Leclerc", "driver_b": "Norris", "track": "Monza" }),
        json!({ "kind": "driver_multi_comparison", "season": 2024,
                "drivers": ["VER", "NOR", "LEC"] }),
        json!({ "kind": "driver_multi_track_comparison", "season": 2024, "driver": "Norris",
                "tracks": ["Monza", "Spa"], "metric": "avg_true_pace",
                "normalization": "session_median_percent" }),
        json!({ "kind": "driver_trend_summary", "season": 2024, "driver_id": "lando_norris",
                "start_season": 2020, "end_season": 2024 }),
        json!({ "kind": "season_driver_rankings", "season": 2024, "session_scope": "race" }),
        json!({ "kind": "track_winners", "season": 2024, "track_id": "monza",
                "metric": "ignored_on_metric_free_kinds" }),
    ];
    for value in intents {
        let intent = parse(value.clone());
        assert!(IntentValidator::validate(&intent).is_ok(), "rejected: {}", value);
    }
}

#[test]
fn test_missing_identity_fields() {
    assert!(reason(json!({ "kind": "driver_win_count", "season": 2024 })).contains("driver"));
    assert!(reason(json!({ "kind": "track_fastest_drivers", "season": 2024 })).contains("track"));
    assert!(reason(json!({ "kind": "qualifying_gap_drivers", "season": 2024,
                            "driver_a": "VER" }))
        .contains("driver_b"));
    assert!(reason(json!({ "kind": "teammate_gap_dual_comparison", "season": 2024 }))
        .contains("team_id"));
}

#[test]
fn test_multi_comparison_bounds() {
    assert!(reason(json!({ "kind": "driver_multi_comparison", "season": 2024,
                            "drivers": ["VER"] }))
        .contains("between 2 and 6"));
    assert!(reason(json!({ "kind": "driver_multi_comparison", "season": 2024,
                            "driver_ids": ["a", "b", "c", "d", "e", "f", "g"] }))
        .contains("between 2 and 6"));
    assert!(reason(json!({ "kind": "driver_multi_comparison", "season": 2024,
                            "drivers": ["VER", "ver"] }))
        .contains("repeat"));
}

#[test]
fn test_sub_filter_membership() {
    assert!(reason(json!({ "kind": "season_driver_rankings", "season": 2024,
                            "session_scope": "practice" }))
        .contains("session_scope"));
    assert!(reason(json!({ "kind": "season_driver_rankings", "season": 2024,
                            "compound_context": "supersoft" }))
        .contains("compound_context"));
    assert!(reason(json!({ "kind": "driver_head_to_head_count", "season": 2024,
                            "driver_a_id": "a", "driver_b_id": "b",
                            "h2h_metric": "points" }))
        .contains("h2h_metric"));
    assert!(reason(json!({ "kind": "driver_head_to_head_count", "season": 2024,
                            "driver_a_id": "a", "driver_b_id": "b",
                            "h2h_metric": "qualifying_position",
                            "filters": { "weather": "snow" } }))
        .contains("weather"));
    assert!(reason(json!({ "kind": "driver_head_to_head_count", "season": 2024,
                            "driver_a_id": "a", "driver_b_id": "b",
                            "h2h_metric": "qualifying_position",
                            "filters": { "date_from": "June 1st" } }))
        .contains("ISO date"));
}

#[test]
fn test_trend_range_order() {
    assert!(reason(json!({ "kind": "driver_trend_summary", "season": 2024,
                            "driver_id": "x", "start_season": 2024, "end_season": 2020 }))
        .contains("start_season"));
}

#[test]
fn test_registry_mismatch_surfaces_as_validation_failure() {
    assert!(reason(json!({ "kind": "season_driver_vs_driver", "season": 2024,
                            "driver_a_id": "a", "driver_b_id": "b",
                            "metric": "teammate_gap_raw" }))
        .contains("not allowed"));
    assert!(reason(json!({ "kind": "track_fastest_drivers", "season": 2024,
                            "track_id": "monza", "metric": "avg_true_pace",
                            "normalization": "session_median_percent" }))
        .contains("normalization"));
}

#[test]
fn test_season_out_of_range() {
    assert!(reason(json!({ "kind": "season_driver_rankings", "season": 2101 })).contains("season"));
    assert!(reason(json!({ "kind": "season_driver_rankings", "season": 1949 })).contains("season"));
}

#[test]
fn test_non_integer_season_rejected_at_parse() {
    let parsed: Result<QueryIntent, _> =
        serde_json::from_value(json!({ "kind": "season_driver_rankings", "season": 2024.5 }));
    assert!(parsed.is_err());
}

const NORMALIZATIONS: &[&str] = &[
    NORMALIZATION_NONE,
    NORMALIZATION_SESSION_MEDIAN_PERCENT,
    "team_baseline",
];

proptest! {
    #[test]
    fn prop_registry_rejects_unlisted_pairs(
        metric_idx in 0usize..6,
        kind_idx in 0usize..QueryKind::ALL.len(),
        norm_idx in 0usize..NORMALIZATIONS.len(),
    ) {
        let metric = MetricRegistryValidator::metrics()[metric_idx];
        let kind = QueryKind::ALL[kind_idx];
        let normalization = NORMALIZATIONS[norm_idx];
        let entry = MetricRegistryValidator::get_entry(metric).unwrap();
        let result = MetricRegistryValidator::validate(metric, kind, normalization);

        if MetricRegistryValidator::is_metric_free(kind) {
            prop_assert!(result.is_ok());
        } else if !entry.allowed_contexts.contains(&kind) {
            let is_context_error = matches!(result, Err(RegistryViolation::ContextNotAllowed { .. }));
            prop_assert!(is_context_error);
        } else if normalization == entry.normalization {
            prop_assert!(result.is_ok());
        } else {
            let documented = metric == "avg_true_pace"
                && kind == QueryKind::DriverMultiTrackComparison
                && normalization == NORMALIZATION_SESSION_MEDIAN_PERCENT;
            prop_assert_eq!(result.is_ok(), documented);
        }
    }
}
