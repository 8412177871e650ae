//! Requests that must never reach a confident answer: self-comparisons that
//! only show up after resolution, and results below the reporting threshold.

mod common;

use common::{gap_result, pair_result, ScriptedExecutor};
use pitwall_intent::{
    ConfidenceLevel, CoverageLevel, DriverPair, DriverSet, ErrorCode, PipelineState, Query,
    QueryIntent, QueryKind, TeammatePair,
};
use pitwall_interpret::{
    AdaptiveLoopConfig, CoverageConfig, CoverageInfo, ExecutionError, InterpretationBuilder,
    QueryResult, FAIL_CLOSED_HEADLINE,
};
use pitwall_test_utils::FixtureDb;

async fn builder(script: Vec<Result<QueryResult, ExecutionError>>) -> InterpretationBuilder<ScriptedExecutor> {
    let fixture = FixtureDb::standard_grid().await.unwrap();
    InterpretationBuilder::new(fixture.into_db(), ScriptedExecutor::new(script))
}

#[tokio::test]
async fn test_name_and_code_for_one_driver_rejected() {
    let builder = builder(vec![]).await;
    let intent = QueryIntent::new(
        Query::SeasonDriverVsDriver(DriverPair::surface("Verstappen", "VER")),
        2023,
    );

    let err = builder
        .build_interpretation_response(intent, None)
        .await
        .unwrap_err();
    assert_eq!(err.error, ErrorCode::ValidationFailed);
    assert!(err.reason.contains("themselves"), "reason: {}", err.reason);
    assert!(builder.executor().seen().is_empty());
}

#[tokio::test]
async fn test_alias_and_full_name_in_driver_set_rejected() {
    let builder = builder(vec![]).await;
    let intent = QueryIntent::new(
        Query::DriverMultiComparison(DriverSet {
            drivers: vec!["Checo".into(), "Sergio Perez".into()],
            driver_ids: vec![],
        }),
        2023,
    );

    let err = builder
        .build_interpretation_response(intent, None)
        .await
        .unwrap_err();
    assert_eq!(err.error, ErrorCode::ValidationFailed);
    assert!(err.reason.contains("driver_ids"), "reason: {}", err.reason);
    assert!(builder.executor().seen().is_empty());
}

#[tokio::test]
async fn test_distinct_surface_names_still_execute() {
    let builder = builder(vec![Ok(pair_result(
        QueryKind::SeasonDriverVsDriver,
        "max_verstappen",
        "sergio_perez",
        -0.4,
        None,
    ))])
    .await;
    let intent = QueryIntent::new(
        Query::SeasonDriverVsDriver(DriverPair::surface("VER", "Checo")),
        2023,
    );

    let response = builder.build_interpretation_response(intent, None).await.unwrap();
    assert!(response.error.is_none());
    assert_eq!(
        builder.executor().seen()[0].query.driver_ids(),
        vec!["max_verstappen", "sergio_perez"]
    );
}

#[tokio::test]
async fn test_insufficient_pair_coverage_states_no_winner() {
    let mut result = pair_result(
        QueryKind::SeasonDriverVsDriver,
        "lewis_hamilton",
        "george_russell",
        -0.3,
        None,
    );
    result.coverage = CoverageInfo::new(CoverageLevel::Insufficient, 1, "races");
    let builder = builder(vec![Ok(result)]).await;
    let intent = QueryIntent::new(
        Query::SeasonDriverVsDriver(DriverPair::canonical("lewis_hamilton", "george_russell")),
        2023,
    );

    let response = builder.build_interpretation_response(intent, None).await.unwrap();
    let answer = &response.answer;
    assert_eq!(answer.headline, FAIL_CLOSED_HEADLINE);
    assert!(answer.bullets.iter().all(|b| !b.contains("faster")));
    assert_eq!(answer.confidence.level, ConfidenceLevel::Insufficient);
    assert!(answer.confidence.summary.contains("below the reporting threshold"));
    assert_eq!(
        response.state_history.last().map(|t| t.to),
        Some(PipelineState::Success)
    );
}

#[tokio::test]
async fn test_insufficient_teammate_gap_without_better_season_states_no_winner() {
    let builder = builder(vec![Ok(gap_result(QueryKind::TeammateGapSummarySeason, 3, -0.4))])
        .await
        .with_config(AdaptiveLoopConfig {
            coverage: CoverageConfig::no_lookback(),
            ..AdaptiveLoopConfig::default()
        });
    let intent = QueryIntent::new(
        Query::TeammateGapSummarySeason(TeammatePair {
            pair: DriverPair::default(),
            team_id: Some("red_bull".to_string()),
        }),
        2024,
    );

    let response = builder.build_interpretation_response(intent, None).await.unwrap();
    assert!(response.fallbacks.is_empty());
    assert_eq!(response.answer.headline, FAIL_CLOSED_HEADLINE);
    assert!(!response.answer.headline.contains("out-paced"));
    assert!(response.answer.bullets[0].contains("3 shared races"));
    assert_eq!(response.answer.confidence.level, ConfidenceLevel::Insufficient);
    assert_eq!(builder.executor().seen().len(), 1);
}
