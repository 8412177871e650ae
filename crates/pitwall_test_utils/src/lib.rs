//! Pitwall Test Utilities
//!
//! Seeded in-memory SQLite databases for resolver and interpreter tests.
//! Tests run against the real schema; there is no store mock.
//!
//! # Usage
//!
//! ```rust,ignore
//! use pitwall_test_utils::FixtureDb;
//!
//! #[tokio::test]
//! async fn test_resolve() {
//!     let fixture = FixtureDb::standard_grid().await.unwrap();
//!     let db = fixture.db();
//!     // ...
//! }
//! ```

mod grid;

use pitwall_db::{PitwallDb, Result};
use std::path::Path;

/// A teammate-gap summary row to seed.
#[derive(Debug, Clone)]
pub struct GapFixture {
    pub season: i32,
    pub team_id: String,
    pub driver_primary_id: String,
    pub driver_secondary_id: String,
    pub metric_name: String,
    pub shared_races: i64,
    pub gap_percent: Option<f64>,
    pub faster_primary_count: i64,
    pub coverage_status: String,
    pub failure_reason: Option<String>,
}

impl GapFixture {
    /// A valid row; adjust fields with struct update syntax.
    pub fn new(season: i32, team_id: &str, primary: &str, secondary: &str) -> Self {
        Self {
            season,
            team_id: team_id.to_string(),
            driver_primary_id: primary.to_string(),
            driver_secondary_id: secondary.to_string(),
            metric_name: "teammate_gap_raw".to_string(),
            shared_races: 20,
            gap_percent: Some(-0.5),
            faster_primary_count: 14,
            coverage_status: "valid".to_string(),
            failure_reason: None,
        }
    }
}

/// In-memory analytics store with seeding helpers.
pub struct FixtureDb {
    db: PitwallDb,
}

impl FixtureDb {
    /// Empty database with the reference schema.
    pub async fn new() -> Result<Self> {
        Ok(Self {
            db: PitwallDb::open_in_memory().await?,
        })
    }

    pub fn db(&self) -> &PitwallDb {
        &self.db
    }

    pub fn into_db(self) -> PitwallDb {
        self.db
    }

    /// Write the seeded database to a file, for tests that open a snapshot by path.
    pub async fn persist_to(&self, path: &Path) -> Result<()> {
        sqlx::query("VACUUM INTO ?")
            .bind(path.to_string_lossy().into_owned())
            .execute(self.db.pool())
            .await?;
        Ok(())
    }

    pub async fn add_driver(&self, driver_id: &str, first: &str, last: &str, code: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO drivers (driver_id, code, first_name, last_name, full_name) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(driver_id)
        .bind(code)
        .bind(first)
        .bind(last)
        .bind(format!("{} {}", first, last))
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    pub async fn add_driver_alias(&self, alias: &str, driver_id: &str) -> Result<()> {
        sqlx::query("INSERT INTO driver_aliases (alias, driver_id) VALUES (?, ?)")
            .bind(alias)
            .bind(driver_id)
            .execute(self.db.pool())
            .await?;
        Ok(())
    }

    pub async fn add_track(&self, track_id: &str, name: &str, full_name: &str) -> Result<()> {
        sqlx::query("INSERT INTO tracks (track_id, track_name, full_name) VALUES (?, ?, ?)")
            .bind(track_id)
            .bind(name)
            .bind(full_name)
            .execute(self.db.pool())
            .await?;
        Ok(())
    }

    pub async fn add_track_alias(&self, alias: &str, track_id: &str) -> Result<()> {
        sqlx::query("INSERT INTO track_aliases (alias, track_id) VALUES (?, ?)")
            .bind(alias)
            .bind(track_id)
            .execute(self.db.pool())
            .await?;
        Ok(())
    }

    pub async fn add_entry(&self, season: i32, driver_id: &str, team_id: &str) -> Result<()> {
        self.insert_entry(season, driver_id, team_id, false).await
    }

    pub async fn add_test_entry(&self, season: i32, driver_id: &str, team_id: &str) -> Result<()> {
        self.insert_entry(season, driver_id, team_id, true).await
    }

    async fn insert_entry(&self, season: i32, driver_id: &str, team_id: &str, test: bool) -> Result<()> {
        sqlx::query(
            "INSERT INTO driver_season_entries (season, driver_id, team_id, is_test_driver) VALUES (?, ?, ?, ?)",
        )
        .bind(season)
        .bind(driver_id)
        .bind(team_id)
        .bind(test)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    pub async fn add_season_metric(
        &self,
        season: i32,
        driver_id: &str,
        metric: &str,
        value: f64,
        laps: i64,
    ) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO pace_metric_summary_driver_season
               (season, driver_id, metric_name, metric_value, laps_considered)
               VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(season)
        .bind(driver_id)
        .bind(metric)
        .bind(value)
        .bind(laps)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    pub async fn add_track_metric(
        &self,
        season: i32,
        track_id: &str,
        driver_id: &str,
        metric: &str,
        value: f64,
        laps: i64,
    ) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO pace_metric_summary_driver_track
               (season, track_id, driver_id, metric_name, metric_value, laps_considered)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(season)
        .bind(track_id)
        .bind(driver_id)
        .bind(metric)
        .bind(value)
        .bind(laps)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    /// Insert `count` valid laps for a driver at a track.
    pub async fn add_laps(&self, season: i32, track_id: &str, driver_id: &str, count: i64) -> Result<()> {
        sqlx::query(
            r#"WITH RECURSIVE n(lap) AS (SELECT 1 UNION ALL SELECT lap + 1 FROM n WHERE lap < ?)
               INSERT INTO laps_normalized (season, round, track_id, driver_id, lap_number, lap_time_seconds)
               SELECT ?, 1, ?, ?, lap, 90.0 FROM n"#,
        )
        .bind(count)
        .bind(season)
        .bind(track_id)
        .bind(driver_id)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    pub async fn add_teammate_gap(&self, gap: GapFixture) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO teammate_gap_season_summary
               (season, team_id, driver_primary_id, driver_secondary_id, metric_name,
                shared_races, gap_percent, faster_primary_count, coverage_status, failure_reason)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(gap.season)
        .bind(&gap.team_id)
        .bind(&gap.driver_primary_id)
        .bind(&gap.driver_secondary_id)
        .bind(&gap.metric_name)
        .bind(gap.shared_races)
        .bind(gap.gap_percent)
        .bind(gap.faster_primary_count)
        .bind(&gap.coverage_status)
        .bind(&gap.failure_reason)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }
}
