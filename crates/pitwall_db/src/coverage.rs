//! Teammate-gap coverage lookups.

use crate::error::Result;
use crate::types::TeammateGapSummaryRow;
use crate::PitwallDb;
use sqlx::Row;

const GAP_COLUMNS: &str = "season, team_id, driver_primary_id, driver_secondary_id, metric_name, \
     shared_races, gap_percent, faster_primary_count, coverage_status, failure_reason";

impl PitwallDb {
    /// Best-covered gap summary involving a driver in a season.
    ///
    /// Picks the row with the most shared races; ties go to the lower team id.
    pub async fn teammate_gap_coverage(
        &self,
        driver_id: &str,
        season: i32,
        metric: &str,
    ) -> Result<Option<TeammateGapSummaryRow>> {
        let sql = format!(
            r#"SELECT {GAP_COLUMNS} FROM teammate_gap_season_summary
               WHERE season = ?1 AND metric_name = ?2
                 AND (driver_primary_id = ?3 OR driver_secondary_id = ?3)
               ORDER BY shared_races DESC, team_id ASC
               LIMIT 1"#
        );
        let row = sqlx::query(&sql)
            .bind(season)
            .bind(metric)
            .bind(driver_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_gap).transpose()
    }

    /// Gap summary for an exact driver pair, in either orientation.
    pub async fn teammate_gap_summary(
        &self,
        season: i32,
        driver_a: &str,
        driver_b: &str,
        metric: &str,
    ) -> Result<Option<TeammateGapSummaryRow>> {
        let sql = format!(
            r#"SELECT {GAP_COLUMNS} FROM teammate_gap_season_summary
               WHERE season = ?1 AND metric_name = ?2
                 AND ((driver_primary_id = ?3 AND driver_secondary_id = ?4)
                   OR (driver_primary_id = ?4 AND driver_secondary_id = ?3))
               ORDER BY shared_races DESC, team_id ASC
               LIMIT 1"#
        );
        let row = sqlx::query(&sql)
            .bind(season)
            .bind(metric)
            .bind(driver_a)
            .bind(driver_b)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_gap).transpose()
    }
}

fn row_to_gap(row: &sqlx::sqlite::SqliteRow) -> Result<TeammateGapSummaryRow> {
    Ok(TeammateGapSummaryRow {
        season: row.try_get("season")?,
        team_id: row.try_get("team_id")?,
        driver_primary_id: row.try_get("driver_primary_id")?,
        driver_secondary_id: row.try_get("driver_secondary_id")?,
        metric_name: row.try_get("metric_name")?,
        shared_races: row.try_get::<i64, _>("shared_races")?.max(0) as u32,
        gap_percent: row.try_get("gap_percent")?,
        faster_primary_count: row.try_get::<i64, _>("faster_primary_count")?.max(0) as u32,
        coverage_status: row.try_get("coverage_status")?,
        failure_reason: row.try_get("failure_reason")?,
    })
}
