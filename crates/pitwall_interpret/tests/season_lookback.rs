//! Coverage lookback and season adjustment against the fixture store.

use pitwall_intent::{DriverPair, FallbackReason, PairAtTrack, Query, QueryIntent, TrackRef};
use pitwall_interpret::{adjust_season, find_best_season_with_coverage, CoverageConfig};
use pitwall_test_utils::{FixtureDb, GapFixture};

#[tokio::test]
async fn test_lookback_finds_covered_season() {
    let fixture = FixtureDb::standard_grid().await.unwrap();
    let outcome = find_best_season_with_coverage(
        fixture.db(),
        "max_verstappen",
        2024,
        "teammate_gap_raw",
        &CoverageConfig::default(),
    )
    .await
    .unwrap();

    assert!(outcome.used_fallback);
    assert_eq!(outcome.season, 2023);
    assert_eq!(outcome.original_season, Some(2024));
    assert_eq!(outcome.shared_races, 20);
    assert!(outcome.fallback_reason.is_some());
}

#[tokio::test]
async fn test_lookback_keeps_covered_request() {
    let fixture = FixtureDb::standard_grid().await.unwrap();
    let outcome = find_best_season_with_coverage(
        fixture.db(),
        "lewis_hamilton",
        2023,
        "teammate_gap_raw",
        &CoverageConfig::default(),
    )
    .await
    .unwrap();

    assert!(!outcome.used_fallback);
    assert_eq!(outcome.season, 2023);
    assert_eq!(outcome.shared_races, 21);
}

#[tokio::test]
async fn test_lookback_stops_at_preferred() {
    let fixture = FixtureDb::standard_grid().await.unwrap();
    fixture
        .add_teammate_gap(GapFixture {
            shared_races: 2,
            ..GapFixture::new(2025, "red_bull", "max_verstappen", "sergio_perez")
        })
        .await
        .unwrap();

    // 2022 has more shared races, but 2023 already reaches the preferred count
    let outcome = find_best_season_with_coverage(
        fixture.db(),
        "max_verstappen",
        2025,
        "teammate_gap_raw",
        &CoverageConfig::default(),
    )
    .await
    .unwrap();
    assert_eq!(outcome.season, 2023);
    assert_eq!(outcome.shared_races, 20);
    assert_eq!(outcome.original_season, Some(2025));
}

#[tokio::test]
async fn test_adjust_season_leaves_active_drivers_alone() {
    let fixture = FixtureDb::standard_grid().await.unwrap();
    let intent = QueryIntent::new(
        Query::CrossTeamTrackScopedDriverComparison(PairAtTrack {
            pair: DriverPair::canonical("max_verstappen", "charles_leclerc"),
            track: TrackRef::canonical("monza"),
        }),
        2023,
    );

    let adjusted = adjust_season(fixture.db(), intent.clone()).await.unwrap();
    assert!(adjusted.step.is_none());
    assert_eq!(adjusted.intent, intent);
}

#[tokio::test]
async fn test_adjust_season_without_common_season_is_unchanged() {
    let fixture = FixtureDb::standard_grid().await.unwrap();
    let intent = QueryIntent::new(
        Query::SeasonDriverVsDriver(DriverPair::canonical("michael_schumacher", "lando_norris")),
        2023,
    );

    let adjusted = adjust_season(fixture.db(), intent).await.unwrap();
    assert!(adjusted.step.is_none());
    assert_eq!(adjusted.intent.season(), 2023);
}

#[tokio::test]
async fn test_adjust_season_records_step() {
    let fixture = FixtureDb::standard_grid().await.unwrap();
    let intent = QueryIntent::new(
        Query::SeasonDriverVsDriver(DriverPair::canonical("mick_schumacher", "lewis_hamilton")),
        2024,
    );

    let adjusted = adjust_season(fixture.db(), intent).await.unwrap();
    let step = adjusted.step.unwrap();
    assert_eq!(step.reason, FallbackReason::DriverNotInSeason);
    assert_eq!(adjusted.intent.season(), 2022);
    assert_eq!(step.note, "Mick Schumacher did not race in 2024; showing 2022 instead.");
}
