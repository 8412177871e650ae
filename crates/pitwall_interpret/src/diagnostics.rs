//! Why a teammate-gap summary had no usable data.

use crate::answer::display_name;
use pitwall_db::PitwallDb;
use serde::Serialize;

/// Cause of an insufficient-data teammate-gap result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum GapDiagnosis {
    /// The ETL recorded a failure for this pair
    UpstreamFailure { failure_reason: String },
    NoRow,
    GapNull,
    LowSharedRaces { shared_races: u32 },
    /// A row exists and looks usable; the executor disagreed
    Unknown,
}

impl GapDiagnosis {
    pub fn code(&self) -> &'static str {
        match self {
            GapDiagnosis::UpstreamFailure { .. } => "upstream_failure",
            GapDiagnosis::NoRow => "no_row",
            GapDiagnosis::GapNull => "gap_null",
            GapDiagnosis::LowSharedRaces { .. } => "low_shared_races",
            GapDiagnosis::Unknown => "unknown",
        }
    }

    /// User-facing explanation.
    pub fn message(&self, driver_a: &str, driver_b: &str, season: i32, min_shared_races: u32) -> String {
        let a = display_name(driver_a);
        let b = display_name(driver_b);
        match self {
            GapDiagnosis::UpstreamFailure { failure_reason } => format!(
                "The teammate gap for {a} and {b} in {season} could not be computed: {failure_reason}."
            ),
            GapDiagnosis::NoRow => {
                format!("No teammate-gap summary exists for {a} and {b} in {season}.")
            }
            GapDiagnosis::GapNull => format!(
                "{a} and {b} have a {season} summary, but no comparable laps produced a gap."
            ),
            GapDiagnosis::LowSharedRaces { shared_races } => format!(
                "{a} and {b} shared only {shared_races} races in {season}; at least {min_shared_races} are needed."
            ),
            GapDiagnosis::Unknown => {
                format!("The teammate gap for {a} and {b} in {season} is not available.")
            }
        }
    }
}

/// Inspect the stored summary row for a pair.
pub async fn diagnose_teammate_gap(
    db: &PitwallDb,
    season: i32,
    driver_a: &str,
    driver_b: &str,
    metric: &str,
    min_shared_races: u32,
) -> pitwall_db::Result<GapDiagnosis> {
    let Some(row) = db.teammate_gap_summary(season, driver_a, driver_b, metric).await? else {
        return Ok(GapDiagnosis::NoRow);
    };

    if let Some(reason) = row.failure_reason.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
        return Ok(GapDiagnosis::UpstreamFailure {
            failure_reason: reason.to_string(),
        });
    }
    if row.gap_percent.is_none() {
        return Ok(GapDiagnosis::GapNull);
    }
    if row.shared_races < min_shared_races {
        return Ok(GapDiagnosis::LowSharedRaces {
            shared_races: row.shared_races,
        });
    }
    Ok(GapDiagnosis::Unknown)
}
