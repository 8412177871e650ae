//! Teammate-gap handling and direct (single-shot) kinds.

mod common;

use common::{gap, gap_result, ScriptedExecutor};
use pitwall_intent::{
    CoverageLevel, DriverPair, ErrorCode, FallbackReason, Query, QueryIntent, QueryKind,
    TeammatePair, TrackRef,
};
use pitwall_interpret::{
    CoverageInfo, ExecutionError, ExecutionErrorKind, InterpretationBuilder, QueryResult, Ranking,
    RankingEntry, ResultPayload, FAIL_CLOSED_HEADLINE,
};
use pitwall_test_utils::FixtureDb;

async fn builder(script: Vec<Result<QueryResult, ExecutionError>>) -> InterpretationBuilder<ScriptedExecutor> {
    let fixture = FixtureDb::standard_grid().await.unwrap();
    InterpretationBuilder::new(fixture.into_db(), ScriptedExecutor::new(script))
}

fn red_bull(kind: QueryKind, season: i32) -> QueryIntent {
    let pair = TeammatePair {
        pair: DriverPair::default(),
        team_id: Some("red_bull".to_string()),
    };
    let query = match kind {
        QueryKind::TeammateGapDualComparison => Query::TeammateGapDualComparison(pair),
        _ => Query::TeammateGapSummarySeason(pair),
    };
    QueryIntent::new(query, season)
}

#[tokio::test]
async fn test_low_coverage_gap_retries_on_earlier_season() {
    let builder = builder(vec![
        Ok(gap_result(QueryKind::TeammateGapSummarySeason, 3, -0.4)),
        Ok(gap_result(QueryKind::TeammateGapSummarySeason, 20, -0.81)),
    ])
    .await;

    let response = builder
        .build_interpretation_response(red_bull(QueryKind::TeammateGapSummarySeason, 2024), None)
        .await
        .unwrap();

    let steps = response.fallbacks.steps();
    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0].reason, FallbackReason::LowCoverageSample);
    assert_eq!(response.intent.season(), 2023);
    assert_eq!(response.supplemental_results.len(), 1);
    assert!(response
        .answer
        .headline
        .starts_with("Only 3 shared races in 2024; showing 2023 (20 shared races) instead."));

    let seen = builder.executor().seen();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].query.driver_ids(), vec!["max_verstappen", "sergio_perez"]);
    assert_eq!(seen[1].season(), 2023);
}

#[tokio::test]
async fn test_well_covered_gap_is_answered_directly() {
    let builder = builder(vec![Ok(gap_result(QueryKind::TeammateGapSummarySeason, 20, -0.81))]).await;

    let response = builder
        .build_interpretation_response(red_bull(QueryKind::TeammateGapSummarySeason, 2023), None)
        .await
        .unwrap();

    assert!(response.fallbacks.is_empty());
    assert!(response.supplemental_results.is_empty());
    assert!(response
        .answer
        .headline
        .starts_with("Max Verstappen out-paced Sergio Perez at Red Bull in 2023"));
}

#[tokio::test]
async fn test_insufficient_gap_data_is_diagnosed() {
    let builder = builder(vec![Err(ExecutionError::insufficient_data(
        "INSUFFICIENT_DATA for teammate gap",
    ))])
    .await;

    let response = builder
        .build_interpretation_response(red_bull(QueryKind::TeammateGapSummarySeason, 2024), None)
        .await
        .unwrap();

    assert_eq!(response.answer.headline, FAIL_CLOSED_HEADLINE);
    assert!(response.answer.bullets[0].contains("shared only 3 races in 2024"));
    let error = response.error.unwrap();
    assert_eq!(error.error, ErrorCode::ExecutionFailed);
    assert_eq!(error.details.unwrap()["code"], "low_shared_races");
    assert!(response.fallbacks.is_empty());
    assert_eq!(builder.executor().seen().len(), 1);
}

#[tokio::test]
async fn test_dual_comparison_failure_does_not_cascade() {
    let builder = builder(vec![Err(ExecutionError::new(
        ExecutionErrorKind::InsufficientSharedLaps,
        "qualifying gap table is empty",
    ))])
    .await;

    let response = builder
        .build_interpretation_response(red_bull(QueryKind::TeammateGapDualComparison, 2023), None)
        .await
        .unwrap();

    assert_eq!(response.answer.headline, FAIL_CLOSED_HEADLINE);
    assert!(response.fallbacks.is_empty());
    let canonical = response.canonical_response.unwrap();
    assert_eq!(canonical["status"], "error");
    assert_eq!(canonical["error"], "insufficient_shared_laps");
    assert_eq!(builder.executor().seen().len(), 1);
}

#[tokio::test]
async fn test_dual_comparison_success_has_canonical_response() {
    let payload = ResultPayload::TeammateGapDual {
        race: gap("teammate_gap_raw", 20, -0.81),
        qualifying: gap("teammate_gap_qualifying", 21, -0.35),
    };
    let result = QueryResult::new(
        QueryKind::TeammateGapDualComparison,
        payload,
        CoverageInfo::new(CoverageLevel::High, 20, "shared races"),
    );
    let builder = builder(vec![Ok(result)]).await;

    let response = builder
        .build_interpretation_response(red_bull(QueryKind::TeammateGapDualComparison, 2023), None)
        .await
        .unwrap();

    let canonical = response.canonical_response.unwrap();
    assert_eq!(canonical["status"], "ok");
    assert_eq!(canonical["payload"]["type"], "teammate_gap_dual");
    assert!(response.answer.headline.starts_with("Race pace: Max Verstappen out-paced"));
}

#[tokio::test]
async fn test_direct_kind_success() {
    let ranking = Ranking {
        metric: None,
        unit: String::new(),
        entries: vec![
            RankingEntry {
                position: 2,
                driver_id: "charles_leclerc".to_string(),
                team_id: Some("ferrari".to_string()),
                value: None,
            },
            RankingEntry {
                position: 1,
                driver_id: "max_verstappen".to_string(),
                team_id: Some("red_bull".to_string()),
                value: None,
            },
        ],
    };
    let builder = builder(vec![Ok(QueryResult::new(
        QueryKind::RaceResultsSummary,
        ResultPayload::Ranking(ranking),
        CoverageInfo::new(CoverageLevel::High, 1, "race"),
    ))])
    .await;
    let intent = QueryIntent::new(
        Query::RaceResultsSummary(TrackRef::surface("Italian Grand Prix")),
        2023,
    );

    let response = builder.build_interpretation_response(intent, None).await.unwrap();

    assert_eq!(response.answer.headline, "Max Verstappen won at Monza in 2023");
    assert_eq!(response.answer.bullets[0], "P1 Max Verstappen");
    assert_eq!(
        builder.executor().seen()[0].query,
        Query::RaceResultsSummary(TrackRef::canonical("monza"))
    );
}

#[tokio::test]
async fn test_direct_kind_failure_fails_closed_once() {
    let builder = builder(vec![Err(ExecutionError::new(
        ExecutionErrorKind::InsufficientSharedLaps,
        "no laps recorded",
    ))])
    .await;
    let intent = QueryIntent::new(Query::TrackWinners(TrackRef::canonical("spa")), 2023);

    let response = builder.build_interpretation_response(intent, None).await.unwrap();

    assert_eq!(response.answer.headline, FAIL_CLOSED_HEADLINE);
    assert!(response.fallbacks.is_empty());
    assert!(response.error.is_some());
    assert!(!response.answer.follow_ups.is_empty());
    assert_eq!(builder.executor().seen().len(), 1);
}

#[tokio::test]
async fn test_invalid_intent_is_terminal() {
    let builder = builder(vec![]).await;
    let intent = QueryIntent::new(
        Query::SeasonDriverVsDriver(DriverPair::canonical("max_verstappen", "lewis_hamilton")),
        2023,
    )
    .with_metric("teammate_gap_raw");

    let err = builder
        .build_interpretation_response(intent, None)
        .await
        .unwrap_err();
    assert_eq!(err.error, ErrorCode::ValidationFailed);
    assert!(builder.executor().seen().is_empty());
}
