//! Teammate ownership: were two drivers literal teammates in a season, and
//! which two drivers raced for a constructor.
//!
//! Team ids are compared after normalization so entrant and constructor
//! spellings of the same team (`Red Bull Racing`, `red_bull`) collapse.

use crate::error::TeammateError;
use pitwall_db::{PitwallDb, SeasonEntry};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

pub type TeammateResult<T> = std::result::Result<T, TeammateError>;

/// Suffix tokens dropped from team ids, checked in order; at most one is removed.
const TEAM_SUFFIXES: &[&str] = &["_f1_team", "_racing", "_team"];

/// Normalize a team identifier for comparison.
pub fn normalize_team_id(team_id: &str) -> String {
    let mut unified = String::with_capacity(team_id.len());
    for c in team_id.trim().to_lowercase().chars() {
        let c = if matches!(c, ' ' | '-' | '.') { '_' } else { c };
        if c == '_' && (unified.is_empty() || unified.ends_with('_')) {
            continue;
        }
        unified.push(c);
    }
    while unified.ends_with('_') {
        unified.pop();
    }

    for suffix in TEAM_SUFFIXES {
        if let Some(stripped) = unified.strip_suffix(suffix) {
            if !stripped.is_empty() {
                return stripped.to_string();
            }
        }
    }
    unified
}

/// Confirmed shared constructor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeammateCheck {
    /// Raw team id as stored (lowest when several spellings collapse)
    pub constructor_id: String,
}

/// Season-entry based teammate checks.
#[derive(Clone)]
pub struct TeammateOwnership {
    db: PitwallDb,
}

impl TeammateOwnership {
    pub fn new(db: PitwallDb) -> Self {
        Self { db }
    }

    /// Check that both drivers raced for exactly one shared team in `season`.
    ///
    /// Symmetric in its driver arguments.
    pub async fn check_teammates(
        &self,
        driver_a: &str,
        driver_b: &str,
        season: i32,
    ) -> TeammateResult<TeammateCheck> {
        let (first, second) = if driver_a <= driver_b {
            (driver_a, driver_b)
        } else {
            (driver_b, driver_a)
        };

        let entries = self
            .db
            .season_entries_for_drivers(season, &[first, second])
            .await?;
        let teams_by_driver = teams_by_driver(&entries);

        let missing: Vec<String> = [first, second]
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .filter(|d| !teams_by_driver.contains_key(*d))
            .map(str::to_string)
            .collect();
        if !missing.is_empty() {
            return Err(TeammateError::DriverNotInSeason {
                drivers: missing,
                season,
            });
        }

        for driver in [first, second] {
            if let Some(teams) = teams_by_driver.get(driver) {
                if teams.len() > 1 {
                    return Err(TeammateError::MultipleConstructors {
                        driver_id: driver.to_string(),
                        teams: teams.iter().cloned().collect(),
                        season,
                    });
                }
            }
        }

        let not_teammates = || TeammateError::NotTeammates {
            driver_a: first.to_string(),
            driver_b: second.to_string(),
            season,
        };
        if first == second {
            return Err(not_teammates());
        }

        let first_team = teams_by_driver.get(first).and_then(|t| t.iter().next());
        let second_team = teams_by_driver.get(second).and_then(|t| t.iter().next());
        match (first_team, second_team) {
            (Some(a), Some(b)) if a == b => {
                let constructor_id = entries
                    .iter()
                    .filter(|e| normalize_team_id(&e.team_id) == *a)
                    .map(|e| e.team_id.as_str())
                    .min()
                    .ok_or_else(not_teammates)?
                    .to_string();
                debug!(first, second, season, %constructor_id, "Confirmed teammates");
                Ok(TeammateCheck { constructor_id })
            }
            _ => Err(not_teammates()),
        }
    }

    /// Find the two race drivers of a constructor in `season`.
    ///
    /// Returns the pair sorted by id. More than two drivers is ambiguous and
    /// rejected rather than guessed.
    pub async fn resolve_teammate_pair_from_constructor(
        &self,
        season: i32,
        constructor_id: &str,
    ) -> TeammateResult<(String, String)> {
        let wanted = normalize_team_id(constructor_id);
        let drivers: BTreeSet<String> = self
            .db
            .season_entries(season)
            .await?
            .into_iter()
            .filter(|e| normalize_team_id(&e.team_id) == wanted)
            .map(|e| e.driver_id)
            .collect();

        let team_id = constructor_id.to_string();
        let mut drivers = drivers.into_iter();
        match (drivers.next(), drivers.next(), drivers.next()) {
            (None, _, _) => Err(TeammateError::NoDriversForTeam { team_id, season }),
            (Some(_), None, _) => Err(TeammateError::OnlyOneDriver { team_id, season }),
            (Some(a), Some(b), None) => Ok((a, b)),
            (Some(a), Some(b), Some(c)) => {
                let mut all = vec![a, b, c];
                all.extend(drivers);
                Err(TeammateError::MultipleDrivers {
                    team_id,
                    drivers: all,
                    season,
                })
            }
        }
    }
}

fn teams_by_driver(entries: &[SeasonEntry]) -> BTreeMap<&str, BTreeSet<String>> {
    let mut map: BTreeMap<&str, BTreeSet<String>> = BTreeMap::new();
    for entry in entries {
        map.entry(entry.driver_id.as_str())
            .or_default()
            .insert(normalize_team_id(&entry.team_id));
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_team_id_collapses_variants() {
        assert_eq!(normalize_team_id("Red Bull Racing"), "red_bull");
        assert_eq!(normalize_team_id("red_bull"), "red_bull");
        assert_eq!(normalize_team_id("Haas F1 Team"), "haas");
        assert_eq!(normalize_team_id("McLaren-Mercedes"), "mclaren_mercedes");
        assert_eq!(normalize_team_id("  Williams  "), "williams");
    }

    #[test]
    fn test_normalize_team_id_strips_one_suffix() {
        assert_eq!(normalize_team_id("racing_team"), "racing");
        assert_eq!(normalize_team_id("_team"), "team");
    }
}
