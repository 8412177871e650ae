//! Driver and track reference lookups, plus the signals used to rank
//! colliding name matches.

use crate::error::Result;
use crate::types::{DriverNameRow, TrackNameRow};
use crate::PitwallDb;
use sqlx::Row;
use std::collections::BTreeMap;

impl PitwallDb {
    // ========================================================================
    // Name Rows
    // ========================================================================

    /// All drivers with their literal-matchable names, ordered by id.
    pub async fn driver_name_rows(&self) -> Result<Vec<DriverNameRow>> {
        let rows = sqlx::query(
            "SELECT driver_id, full_name, first_name, last_name, code FROM drivers ORDER BY driver_id",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut drivers = BTreeMap::new();
        for row in rows {
            let driver_id: String = row.try_get("driver_id")?;
            drivers.insert(
                driver_id.clone(),
                DriverNameRow {
                    driver_id,
                    full_name: row.try_get("full_name")?,
                    first_name: row.try_get("first_name")?,
                    last_name: row.try_get("last_name")?,
                    code: row.try_get("code")?,
                    aliases: Vec::new(),
                },
            );
        }

        let aliases = sqlx::query("SELECT alias, driver_id FROM driver_aliases ORDER BY alias")
            .fetch_all(&self.pool)
            .await?;
        for row in aliases {
            let driver_id: String = row.try_get("driver_id")?;
            // Aliases pointing at unknown drivers are ignored.
            if let Some(entry) = drivers.get_mut(&driver_id) {
                entry.aliases.push(row.try_get("alias")?);
            }
        }

        Ok(drivers.into_values().collect())
    }

    /// All tracks with their literal-matchable names, ordered by id.
    pub async fn track_name_rows(&self) -> Result<Vec<TrackNameRow>> {
        let rows =
            sqlx::query("SELECT track_id, track_name, full_name FROM tracks ORDER BY track_id")
                .fetch_all(&self.pool)
                .await?;

        let mut tracks = BTreeMap::new();
        for row in rows {
            let track_id: String = row.try_get("track_id")?;
            tracks.insert(
                track_id.clone(),
                TrackNameRow {
                    track_id,
                    track_name: row.try_get("track_name")?,
                    full_name: row.try_get("full_name")?,
                    aliases: Vec::new(),
                },
            );
        }

        let aliases = sqlx::query("SELECT alias, track_id FROM track_aliases ORDER BY alias")
            .fetch_all(&self.pool)
            .await?;
        for row in aliases {
            let track_id: String = row.try_get("track_id")?;
            if let Some(entry) = tracks.get_mut(&track_id) {
                entry.aliases.push(row.try_get("alias")?);
            }
        }

        Ok(tracks.into_values().collect())
    }

    // ========================================================================
    // Ranking Signals
    // ========================================================================

    /// Non-test season-entry rows for a driver in one season.
    pub async fn season_participation_count(&self, driver_id: &str, season: i32) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"SELECT COUNT(*) FROM driver_season_entries
               WHERE driver_id = ? AND season = ? AND is_test_driver = 0"#,
        )
        .bind(driver_id)
        .bind(season)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Season-entry rows where both drivers raced for the same team.
    pub async fn teammate_overlap_count(&self, driver_id: &str, teammate_id: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"SELECT COUNT(*)
               FROM driver_season_entries a
               JOIN driver_season_entries b
                 ON a.season = b.season AND a.team_id = b.team_id
               WHERE a.driver_id = ? AND b.driver_id = ?
                 AND a.is_test_driver = 0 AND b.is_test_driver = 0"#,
        )
        .bind(driver_id)
        .bind(teammate_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Metric-summary rows for a driver plus normalized laps, the latter capped.
    pub async fn driver_coverage_score(&self, driver_id: &str, lap_cap: i64) -> Result<i64> {
        let score: i64 = sqlx::query_scalar(
            r#"SELECT
                 (SELECT COUNT(*) FROM pace_metric_summary_driver_season WHERE driver_id = ?1)
               + (SELECT COUNT(*) FROM pace_metric_summary_driver_track WHERE driver_id = ?1)
               + MIN((SELECT COUNT(*) FROM laps_normalized WHERE driver_id = ?1), ?2)"#,
        )
        .bind(driver_id)
        .bind(lap_cap)
        .fetch_one(&self.pool)
        .await?;
        Ok(score)
    }

    /// Metric-summary rows plus normalized laps recorded at a track.
    pub async fn track_coverage_score(&self, track_id: &str) -> Result<i64> {
        let score: i64 = sqlx::query_scalar(
            r#"SELECT
                 (SELECT COUNT(*) FROM pace_metric_summary_driver_track WHERE track_id = ?1)
               + (SELECT COUNT(*) FROM laps_normalized WHERE track_id = ?1)"#,
        )
        .bind(track_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(score)
    }
}
