//! Resolves every identity slot on a [`QueryIntent`] to canonical ids.
//!
//! A slot holds a surface field and its canonical counterpart. When only the
//! canonical id is present it passes through; when only the surface text is
//! present it is resolved and written back; when both are present the surface
//! must resolve to the same id. The surface field is always cleared after a
//! successful resolution.

use crate::driver::{DriverResolveOptions, DriverResolver};
use crate::error::{MatchMode, ResolveError, TeammateError};
use crate::teammates::{normalize_team_id, TeammateOwnership};
use crate::track::TrackResolver;
use pitwall_db::PitwallDb;
use pitwall_intent::{non_empty, DriverPair, QueryError, QueryIntent};
use serde_json::json;
use tracing::{debug, info};

/// Walks an intent's identity slots and resolves them against the store.
#[derive(Clone)]
pub struct IntentResolver {
    drivers: DriverResolver,
    tracks: TrackResolver,
    teammates: TeammateOwnership,
}

impl IntentResolver {
    pub fn new(db: PitwallDb) -> Self {
        Self {
            drivers: DriverResolver::new(db.clone()),
            tracks: TrackResolver::new(db.clone()),
            teammates: TeammateOwnership::new(db),
        }
    }

    pub fn drivers(&self) -> &DriverResolver {
        &self.drivers
    }

    pub fn tracks(&self) -> &TrackResolver {
        &self.tracks
    }

    pub fn teammates(&self) -> &TeammateOwnership {
        &self.teammates
    }

    /// Identity resolution, team-to-pair expansion and teammate checks, in order.
    pub async fn resolve(&self, intent: QueryIntent) -> Result<QueryIntent, QueryError> {
        let intent = self.resolve_identities(intent).await?;
        let intent = self.resolve_teammate_gap_drivers(intent).await?;
        self.validate_teammate_constraints(intent).await
    }

    /// Resolve the surface fields of every slot the intent's kind declares.
    pub async fn resolve_identities(&self, mut intent: QueryIntent) -> Result<QueryIntent, QueryError> {
        let season = intent.season();
        let slots = intent.query.slots_mut();

        if let Some(driver) = slots.driver {
            self.resolve_driver_field(
                &mut driver.driver,
                &mut driver.driver_id,
                "driver",
                DriverResolveOptions::for_season(season),
            )
            .await?;
        }

        if let Some(pair) = slots.pair {
            let DriverPair {
                driver_a,
                driver_a_id,
                driver_b,
                driver_b_id,
            } = pair;

            let alias_a = non_empty(driver_a).map(str::to_string);
            let rerank_a = non_empty(driver_a_id).is_none() && non_empty(driver_b_id).is_none();

            let options_a = ranking_context(season, non_empty(driver_b_id));
            let mode_a = self
                .resolve_driver_field(driver_a, driver_a_id, "driver_a", options_a)
                .await?;
            let options_b = ranking_context(season, non_empty(driver_a_id));
            self.resolve_driver_field(driver_b, driver_b_id, "driver_b", options_b)
                .await?;

            // driver_a was ranked before driver_b was known; rank it again
            // with driver_b as teammate context.
            if let (true, Some(MatchMode::Ranked), Some(alias), Some(b_id)) =
                (rerank_a, mode_a, alias_a, non_empty(driver_b_id))
            {
                let resolved = self
                    .drivers
                    .resolve(&alias, &ranking_context(season, Some(b_id)))
                    .await
                    .map_err(|e| resolution_failed("driver_a", &alias, e))?;
                debug!(alias = %alias, driver_id = %resolved.canonical_id, "Re-ranked driver_a with driver_b context");
                *driver_a_id = Some(resolved.canonical_id);
            }
        }

        if let Some(set) = slots.drivers {
            let surfaces = non_blank(&set.drivers);
            if !surfaces.is_empty() {
                let options = DriverResolveOptions::for_season(season);
                let mut ids = Vec::with_capacity(surfaces.len());
                for alias in &surfaces {
                    let resolved = self
                        .drivers
                        .resolve(alias, &options)
                        .await
                        .map_err(|e| resolution_failed("drivers", alias, e))?;
                    ids.push(resolved.canonical_id);
                }
                let existing = non_blank(&set.driver_ids);
                if !existing.is_empty() && existing != ids {
                    return Err(conflict("drivers", &surfaces.join(", "), &ids.join(", "), &existing.join(", ")));
                }
                set.driver_ids = ids;
                set.drivers.clear();
            }
        }

        if let Some(track) = slots.track {
            self.resolve_track_field(&mut track.track, &mut track.track_id, "track")
                .await?;
        }

        if let Some(set) = slots.tracks {
            let surfaces = non_blank(&set.tracks);
            if !surfaces.is_empty() {
                let mut ids = Vec::with_capacity(surfaces.len());
                for alias in &surfaces {
                    let resolved = self
                        .tracks
                        .resolve(alias)
                        .await
                        .map_err(|e| resolution_failed("tracks", alias, e))?;
                    ids.push(resolved.canonical_id);
                }
                let existing = non_blank(&set.track_ids);
                if !existing.is_empty() && existing != ids {
                    return Err(conflict("tracks", &surfaces.join(", "), &ids.join(", "), &existing.join(", ")));
                }
                set.track_ids = ids;
                set.tracks.clear();
            }
        }

        info!(
            kind = %intent.kind(),
            season,
            driver_ids = ?intent.query.driver_ids(),
            "Resolved intent identities"
        );
        Ok(intent)
    }

    /// Fill a teammate-gap intent's driver pair from its `team_id` when the
    /// pair is not already explicit.
    pub async fn resolve_teammate_gap_drivers(
        &self,
        mut intent: QueryIntent,
    ) -> Result<QueryIntent, QueryError> {
        if !intent.kind().is_teammate_gap() {
            return Ok(intent);
        }
        let season = intent.season();
        let slots = intent.query.slots_mut();
        let (Some(pair), Some(team_id)) = (slots.pair, slots.team_id) else {
            return Ok(intent);
        };
        if pair.ids().is_some() {
            return Ok(intent);
        }

        let Some(team) = non_empty(team_id).map(str::to_string) else {
            return Err(QueryError::validation_failed(
                "Teammate gap queries need both drivers or a team_id",
            ));
        };

        let (first, second) = self
            .teammates
            .resolve_teammate_pair_from_constructor(season, &team)
            .await
            .map_err(|e| {
                QueryError::validation_failed(format!(
                    "Could not resolve a driver pair for team {} in {}: {}",
                    team, season, e
                ))
                .with_details(json!({ "team_id": team, "season": season, "code": e.code() }))
            })?;

        // A single named driver must belong to the team's pair.
        let named = non_empty(&pair.driver_a_id).or(non_empty(&pair.driver_b_id));
        let (a, b) = match named {
            Some(id) if id == first => (first, second),
            Some(id) if id == second => (second, first),
            Some(id) => {
                return Err(QueryError::validation_failed(format!(
                    "{} did not race for {} in {}",
                    id, team, season
                )))
            }
            None => (first, second),
        };

        debug!(team = %team, season, driver_a = %a, driver_b = %b, "Resolved teammate pair from team");
        *pair = DriverPair::canonical(a, b);
        Ok(intent)
    }

    /// Confirm a teammate-gap pair shared a constructor and record it as `team_id`.
    pub async fn validate_teammate_constraints(
        &self,
        mut intent: QueryIntent,
    ) -> Result<QueryIntent, QueryError> {
        if !intent.kind().is_teammate_gap() {
            return Ok(intent);
        }
        let season = intent.season();
        let slots = intent.query.slots_mut();
        let (Some(pair), Some(team_id)) = (slots.pair, slots.team_id) else {
            return Ok(intent);
        };
        let Some((a, b)) = pair.ids().map(|(a, b)| (a.to_string(), b.to_string())) else {
            return Err(QueryError::validation_failed(
                "Teammate gap queries require both driver_a_id and driver_b_id",
            ));
        };

        let check = match self.teammates.check_teammates(&a, &b, season).await {
            Ok(check) => check,
            Err(TeammateError::NotTeammates { .. }) => {
                return Err(QueryError::validation_failed(format!(
                    "{} and {} were not teammates in {}",
                    a, b, season
                ))
                .with_details(json!({ "code": "not_teammates", "season": season })))
            }
            Err(TeammateError::Store(e)) => {
                return Err(QueryError::execution_failed(format!(
                    "Store error while checking teammates: {}",
                    e
                )))
            }
            Err(other) => {
                return Err(QueryError::validation_failed(other.to_string())
                    .with_details(json!({ "code": other.code(), "season": season })))
            }
        };

        let given = non_empty(team_id).map(str::to_string);
        match given {
            Some(given) if normalize_team_id(&given) != normalize_team_id(&check.constructor_id) => {
                return Err(QueryError::validation_failed(format!(
                    "{} and {} raced for {} in {}, not {}",
                    a, b, check.constructor_id, season, given
                )));
            }
            Some(_) => {}
            None => *team_id = Some(check.constructor_id),
        }
        Ok(intent)
    }

    async fn resolve_driver_field(
        &self,
        surface: &mut Option<String>,
        canonical: &mut Option<String>,
        field: &'static str,
        options: DriverResolveOptions,
    ) -> Result<Option<MatchMode>, QueryError> {
        let Some(alias) = non_empty(surface).map(str::to_string) else {
            *surface = None;
            return Ok(None);
        };

        let resolved = self
            .drivers
            .resolve(&alias, &options)
            .await
            .map_err(|e| resolution_failed(field, &alias, e))?;
        if let Some(existing) = non_empty(canonical) {
            if existing != resolved.canonical_id {
                return Err(conflict(field, &alias, &resolved.canonical_id, existing));
            }
        }

        debug!(field, alias = %alias, driver_id = %resolved.canonical_id, match_mode = resolved.match_mode.as_str(), "Resolved driver");
        *canonical = Some(resolved.canonical_id);
        *surface = None;
        Ok(Some(resolved.match_mode))
    }

    async fn resolve_track_field(
        &self,
        surface: &mut Option<String>,
        canonical: &mut Option<String>,
        field: &'static str,
    ) -> Result<(), QueryError> {
        let Some(alias) = non_empty(surface).map(str::to_string) else {
            *surface = None;
            return Ok(());
        };

        let resolved = self
            .tracks
            .resolve(&alias)
            .await
            .map_err(|e| resolution_failed(field, &alias, e))?;
        if let Some(existing) = non_empty(canonical) {
            if existing != resolved.canonical_id {
                return Err(conflict(field, &alias, &resolved.canonical_id, existing));
            }
        }

        debug!(field, alias = %alias, track_id = %resolved.canonical_id, "Resolved track");
        *canonical = Some(resolved.canonical_id);
        *surface = None;
        Ok(())
    }
}

fn ranking_context(season: i32, teammate: Option<&str>) -> DriverResolveOptions {
    let options = DriverResolveOptions::for_season(season);
    match teammate {
        Some(id) => options.with_teammate(id),
        None => options,
    }
}

fn non_blank(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

fn resolution_failed(field: &str, alias: &str, err: ResolveError) -> QueryError {
    let reason = match &err {
        ResolveError::UnknownEntity { .. } => format!("Could not resolve {} '{}'", field, alias),
        ResolveError::Store(e) => format!("Store error while resolving {} '{}': {}", field, alias, e),
    };
    QueryError::intent_resolution_failed(reason)
        .with_details(json!({ "field": field, "alias": alias, "code": err.code() }))
}

fn conflict(field: &str, alias: &str, resolved: &str, existing: &str) -> QueryError {
    QueryError::intent_resolution_failed(format!(
        "{} '{}' resolves to {} but the canonical field holds {}",
        field, alias, resolved, existing
    ))
    .with_details(json!({ "field": field, "alias": alias, "code": "conflicting_identity" }))
}
