//! Season participation queries. Test-driver rows are always excluded.

use crate::error::Result;
use crate::types::SeasonEntry;
use crate::PitwallDb;
use sqlx::Row;

impl PitwallDb {
    /// All race-driver entries for a season, ordered by driver then team.
    pub async fn season_entries(&self, season: i32) -> Result<Vec<SeasonEntry>> {
        let rows = sqlx::query(
            r#"SELECT season, driver_id, team_id FROM driver_season_entries
               WHERE season = ? AND is_test_driver = 0
               ORDER BY driver_id, team_id"#,
        )
        .bind(season)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_entry).collect()
    }

    /// Race-driver entries for the given drivers in a season.
    pub async fn season_entries_for_drivers(
        &self,
        season: i32,
        driver_ids: &[&str],
    ) -> Result<Vec<SeasonEntry>> {
        let mut entries = Vec::new();
        for driver_id in driver_ids {
            let rows = sqlx::query(
                r#"SELECT season, driver_id, team_id FROM driver_season_entries
                   WHERE season = ? AND driver_id = ? AND is_test_driver = 0
                   ORDER BY team_id"#,
            )
            .bind(season)
            .bind(driver_id)
            .fetch_all(&self.pool)
            .await?;

            for row in &rows {
                entries.push(row_to_entry(row)?);
            }
        }
        Ok(entries)
    }

    /// Distinct seasons a driver raced in, ascending.
    pub async fn driver_seasons(&self, driver_id: &str) -> Result<Vec<i32>> {
        let seasons: Vec<i32> = sqlx::query_scalar(
            r#"SELECT DISTINCT season FROM driver_season_entries
               WHERE driver_id = ? AND is_test_driver = 0
               ORDER BY season"#,
        )
        .bind(driver_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(seasons)
    }
}

fn row_to_entry(row: &sqlx::sqlite::SqliteRow) -> Result<SeasonEntry> {
    Ok(SeasonEntry {
        season: row.try_get("season")?,
        driver_id: row.try_get("driver_id")?,
        team_id: row.try_get("team_id")?,
    })
}
