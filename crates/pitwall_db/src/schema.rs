//! Reference and coverage table definitions.
//!
//! All CREATE TABLE statements live here - single source of truth. The
//! statements are idempotent; nothing here alters an existing table.

use crate::error::Result;
use crate::PitwallDb;
use tracing::info;

impl PitwallDb {
    /// Ensure all tables exist.
    pub(crate) async fn ensure_schema(&self, file_backed: bool) -> Result<()> {
        if file_backed {
            sqlx::query("PRAGMA journal_mode=WAL")
                .execute(&self.pool)
                .await?;
            sqlx::query("PRAGMA synchronous=NORMAL")
                .execute(&self.pool)
                .await?;
        }

        self.create_reference_tables().await?;
        self.create_coverage_tables().await?;

        info!("Database schema verified");
        Ok(())
    }

    /// Drivers, tracks, their aliases, and season entries.
    async fn create_reference_tables(&self) -> Result<()> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS drivers (
                driver_id TEXT PRIMARY KEY,
                code TEXT,
                first_name TEXT,
                last_name TEXT,
                full_name TEXT
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS driver_aliases (
                alias TEXT PRIMARY KEY,
                driver_id TEXT NOT NULL,
                is_primary INTEGER NOT NULL DEFAULT 0
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS tracks (
                track_id TEXT PRIMARY KEY,
                track_name TEXT,
                full_name TEXT,
                country TEXT
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS track_aliases (
                alias TEXT PRIMARY KEY,
                track_id TEXT NOT NULL,
                is_primary INTEGER NOT NULL DEFAULT 0
            )"#,
        )
        .execute(&self.pool)
        .await?;

        // A driver can appear under more than one entrant in a season.
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS driver_season_entries (
                season INTEGER NOT NULL,
                driver_id TEXT NOT NULL,
                team_id TEXT NOT NULL,
                is_test_driver INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (season, driver_id, team_id)
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_season_entries_driver ON driver_season_entries(driver_id)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Metric summaries, normalized laps and teammate-gap summaries.
    async fn create_coverage_tables(&self) -> Result<()> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS pace_metric_summary_driver_season (
                season INTEGER NOT NULL,
                driver_id TEXT NOT NULL,
                metric_name TEXT NOT NULL,
                metric_value REAL,
                normalization TEXT NOT NULL DEFAULT 'none',
                laps_considered INTEGER NOT NULL DEFAULT 0,
                clean_air_only INTEGER NOT NULL DEFAULT 0,
                compound_context TEXT NOT NULL DEFAULT 'mixed',
                session_scope TEXT NOT NULL DEFAULT 'all'
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS pace_metric_summary_driver_track (
                season INTEGER NOT NULL,
                track_id TEXT NOT NULL,
                driver_id TEXT NOT NULL,
                metric_name TEXT NOT NULL,
                metric_value REAL,
                normalization TEXT NOT NULL DEFAULT 'none',
                laps_considered INTEGER NOT NULL DEFAULT 0,
                clean_air_only INTEGER NOT NULL DEFAULT 0,
                compound_context TEXT NOT NULL DEFAULT 'mixed',
                session_scope TEXT NOT NULL DEFAULT 'race'
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS laps_normalized (
                season INTEGER NOT NULL,
                round INTEGER NOT NULL,
                track_id TEXT NOT NULL,
                driver_id TEXT NOT NULL,
                lap_number INTEGER NOT NULL,
                lap_time_seconds REAL,
                is_valid_lap INTEGER NOT NULL DEFAULT 1
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS teammate_gap_season_summary (
                season INTEGER NOT NULL,
                team_id TEXT NOT NULL,
                driver_primary_id TEXT NOT NULL,
                driver_secondary_id TEXT NOT NULL,
                metric_name TEXT NOT NULL DEFAULT 'teammate_gap_raw',
                shared_races INTEGER NOT NULL DEFAULT 0,
                gap_percent REAL,
                faster_primary_count INTEGER NOT NULL DEFAULT 0,
                coverage_status TEXT NOT NULL DEFAULT 'insufficient',
                failure_reason TEXT
            )"#,
        )
        .execute(&self.pool)
        .await?;

        for stmt in [
            "CREATE INDEX IF NOT EXISTS idx_season_metrics_driver ON pace_metric_summary_driver_season(driver_id)",
            "CREATE INDEX IF NOT EXISTS idx_track_metrics_driver ON pace_metric_summary_driver_track(driver_id)",
            "CREATE INDEX IF NOT EXISTS idx_track_metrics_track ON pace_metric_summary_driver_track(track_id)",
            "CREATE INDEX IF NOT EXISTS idx_laps_driver ON laps_normalized(driver_id)",
            "CREATE INDEX IF NOT EXISTS idx_laps_track ON laps_normalized(track_id)",
            "CREATE INDEX IF NOT EXISTS idx_gap_summary_season ON teammate_gap_season_summary(season)",
        ] {
            sqlx::query(stmt).execute(&self.pool).await?;
        }

        Ok(())
    }
}
