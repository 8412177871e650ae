//! Row types returned by the read queries.

use pitwall_intent::CoverageStatus;
use serde::{Deserialize, Serialize};

/// Every literal-matchable name recorded for one driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverNameRow {
    pub driver_id: String,
    pub full_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Three-letter abbreviation (VER, HAM, ...)
    pub code: Option<String>,
    /// Rows from `driver_aliases`
    pub aliases: Vec<String>,
}

impl DriverNameRow {
    /// Id plus every populated name field.
    pub fn matchable_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.driver_id.as_str())
            .chain(self.full_name.as_deref())
            .chain(self.first_name.as_deref())
            .chain(self.last_name.as_deref())
            .chain(self.code.as_deref())
            .chain(self.aliases.iter().map(String::as_str))
    }
}

/// Every literal-matchable name recorded for one track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackNameRow {
    pub track_id: String,
    pub track_name: Option<String>,
    pub full_name: Option<String>,
    /// Rows from `track_aliases`
    pub aliases: Vec<String>,
}

impl TrackNameRow {
    pub fn matchable_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.track_id.as_str())
            .chain(self.track_name.as_deref())
            .chain(self.full_name.as_deref())
            .chain(self.aliases.iter().map(String::as_str))
    }
}

/// A non-test-driver season entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonEntry {
    pub season: i32,
    pub driver_id: String,
    pub team_id: String,
}

/// One row of `teammate_gap_season_summary`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeammateGapSummaryRow {
    pub season: i32,
    pub team_id: String,
    pub driver_primary_id: String,
    pub driver_secondary_id: String,
    pub metric_name: String,
    pub shared_races: u32,
    /// Signed primary-minus-secondary gap; negative means the primary was faster
    pub gap_percent: Option<f64>,
    pub faster_primary_count: u32,
    pub coverage_status: String,
    pub failure_reason: Option<String>,
}

impl TeammateGapSummaryRow {
    pub fn status(&self) -> CoverageStatus {
        CoverageStatus::parse_lossy(&self.coverage_status)
    }

    pub fn involves(&self, driver_id: &str) -> bool {
        self.driver_primary_id == driver_id || self.driver_secondary_id == driver_id
    }
}
