//! Error types for entity resolution and teammate ownership.

use pitwall_db::DbError;
use serde::Serialize;
use thiserror::Error;

/// Outcome of a single resolver call.
pub type ResolutionResult<T> = std::result::Result<T, ResolveError>;

/// Entity resolution failures.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// No literal match after normalization
    #[error("unknown_entity: {alias}")]
    UnknownEntity { alias: String },

    /// The store failed while building or ranking candidates
    #[error("store_error: {0}")]
    Store(#[from] DbError),
}

impl ResolveError {
    pub fn unknown(alias: impl Into<String>) -> Self {
        Self::UnknownEntity {
            alias: alias.into(),
        }
    }

    /// Stable machine code.
    pub fn code(&self) -> &'static str {
        match self {
            ResolveError::UnknownEntity { .. } => "unknown_entity",
            ResolveError::Store(_) => "store_error",
        }
    }
}

/// Teammate ownership failures.
///
/// Only the store variant wraps an underlying error; every other variant is
/// an expected answer about the reference data.
#[derive(Error, Debug)]
pub enum TeammateError {
    #[error("driver_not_in_season: {} not entered in {season}", drivers.join(", "))]
    DriverNotInSeason { drivers: Vec<String>, season: i32 },

    #[error("multiple_constructors: {driver_id} entered for {} in {season}", teams.join(", "))]
    MultipleConstructors {
        driver_id: String,
        teams: Vec<String>,
        season: i32,
    },

    #[error("not_teammates: {driver_a} and {driver_b} in {season}")]
    NotTeammates {
        driver_a: String,
        driver_b: String,
        season: i32,
    },

    #[error("no_drivers_for_team: {team_id} in {season}")]
    NoDriversForTeam { team_id: String, season: i32 },

    #[error("only_one_driver: {team_id} in {season}")]
    OnlyOneDriver { team_id: String, season: i32 },

    #[error("multiple_drivers: {team_id} entered {} drivers in {season}", drivers.len())]
    MultipleDrivers {
        team_id: String,
        drivers: Vec<String>,
        season: i32,
    },

    #[error("store_error: {0}")]
    Store(#[from] DbError),
}

impl TeammateError {
    /// Stable machine code.
    pub fn code(&self) -> &'static str {
        match self {
            TeammateError::DriverNotInSeason { .. } => "driver_not_in_season",
            TeammateError::MultipleConstructors { .. } => "multiple_constructors",
            TeammateError::NotTeammates { .. } => "not_teammates",
            TeammateError::NoDriversForTeam { .. } => "no_drivers_for_team",
            TeammateError::OnlyOneDriver { .. } => "only_one_driver",
            TeammateError::MultipleDrivers { .. } => "multiple_drivers",
            TeammateError::Store(_) => "store_error",
        }
    }
}

/// How a canonical id was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Exactly one literal match (or a static alias hit)
    Literal,
    /// Several literal matches, ordered by the tie-break tiers
    Ranked,
}

impl MatchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMode::Literal => "literal",
            MatchMode::Ranked => "ranked",
        }
    }
}

/// A successful resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolved {
    pub canonical_id: String,
    pub match_mode: MatchMode,
}

impl Resolved {
    pub fn literal(id: impl Into<String>) -> Self {
        Self {
            canonical_id: id.into(),
            match_mode: MatchMode::Literal,
        }
    }

    pub fn ranked(id: impl Into<String>) -> Self {
        Self {
            canonical_id: id.into(),
            match_mode: MatchMode::Ranked,
        }
    }
}
