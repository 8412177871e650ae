//! Track name resolution.
//!
//! Colloquial and event names are looked up in a static alias table before
//! the store is consulted. Store matches follow the same literal rule as
//! drivers; collisions rank by coverage score, then canonical id.

use crate::error::{ResolutionResult, ResolveError, Resolved};
use crate::normalize::normalize;
use pitwall_db::PitwallDb;
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::debug;

/// Normalized alias -> canonical track id. Keys are stored pre-normalized.
static STATIC_TRACK_ALIASES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ("albert park", "albert_park"),
        ("australian grand prix", "albert_park"),
        ("melbourne", "albert_park"),
        ("bahrain grand prix", "sakhir"),
        ("bahrain international circuit", "sakhir"),
        ("saudi arabian grand prix", "jeddah"),
        ("jeddah corniche circuit", "jeddah"),
        ("japanese grand prix", "suzuka"),
        ("chinese grand prix", "shanghai"),
        ("miami grand prix", "miami"),
        ("emilia romagna grand prix", "imola"),
        ("enzo e dino ferrari", "imola"),
        ("monaco grand prix", "monaco"),
        ("circuit de monaco", "monaco"),
        ("monte carlo", "monaco"),
        ("canadian grand prix", "montreal"),
        ("circuit gilles villeneuve", "montreal"),
        ("spanish grand prix", "barcelona"),
        ("catalunya", "barcelona"),
        ("austrian grand prix", "red_bull_ring"),
        ("red bull ring", "red_bull_ring"),
        ("spielberg", "red_bull_ring"),
        ("british grand prix", "silverstone"),
        ("hungarian grand prix", "hungaroring"),
        ("belgian grand prix", "spa"),
        ("spa francorchamps", "spa"),
        ("dutch grand prix", "zandvoort"),
        ("italian grand prix", "monza"),
        ("temple of speed", "monza"),
        ("azerbaijan grand prix", "baku"),
        ("singapore grand prix", "marina_bay"),
        ("marina bay", "marina_bay"),
        ("united states grand prix", "austin"),
        ("cota", "austin"),
        ("circuit of the americas", "austin"),
        ("mexico city grand prix", "mexico_city"),
        ("mexican grand prix", "mexico_city"),
        ("sao paulo grand prix", "interlagos"),
        ("brazilian grand prix", "interlagos"),
        ("las vegas grand prix", "las_vegas"),
        ("qatar grand prix", "lusail"),
        ("abu dhabi grand prix", "yas_marina"),
        ("yas marina", "yas_marina"),
    ])
});

/// Look up a normalized name in the static alias table.
pub fn static_track_alias(normalized: &str) -> Option<&'static str> {
    STATIC_TRACK_ALIASES.get(normalized).copied()
}

/// Ranking scores for one colliding track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackCandidate {
    pub track_id: String,
    pub coverage_score: i64,
}

/// Resolves free-text circuit names to canonical track ids.
#[derive(Clone)]
pub struct TrackResolver {
    db: PitwallDb,
}

impl TrackResolver {
    pub fn new(db: PitwallDb) -> Self {
        Self { db }
    }

    pub async fn resolve(&self, alias: &str) -> ResolutionResult<Resolved> {
        let needle = normalize(alias);
        if needle.is_empty() {
            return Err(ResolveError::unknown(alias));
        }

        if let Some(track_id) = static_track_alias(&needle) {
            debug!(alias, track_id, "Static track alias hit");
            return Ok(Resolved::literal(track_id));
        }

        let rows = self.db.track_name_rows().await?;
        let mut matches: Vec<String> = rows
            .into_iter()
            .filter(|row| row.matchable_names().any(|name| normalize(name) == needle))
            .map(|row| row.track_id)
            .collect();

        match matches.len() {
            0 => Err(ResolveError::unknown(alias)),
            1 => Ok(Resolved::literal(matches.swap_remove(0))),
            _ => {
                let mut candidates = Vec::with_capacity(matches.len());
                for track_id in matches {
                    let coverage_score = self.db.track_coverage_score(&track_id).await?;
                    candidates.push(TrackCandidate {
                        track_id,
                        coverage_score,
                    });
                }
                candidates.sort_by(|a, b| {
                    b.coverage_score
                        .cmp(&a.coverage_score)
                        .then_with(|| a.track_id.cmp(&b.track_id))
                });
                debug!(alias, candidates = ?candidates, "Ranked track candidates");

                candidates
                    .into_iter()
                    .next()
                    .map(|c| Resolved::ranked(c.track_id))
                    .ok_or_else(|| ResolveError::unknown(alias))
            }
        }
    }

    /// Resolve each alias one at a time, in input order.
    pub async fn resolve_many(&self, aliases: &[&str]) -> Vec<(String, ResolutionResult<Resolved>)> {
        let mut out: Vec<(String, ResolutionResult<Resolved>)> = Vec::with_capacity(aliases.len());
        for alias in aliases {
            if out.iter().any(|(seen, _)| seen == alias) {
                continue;
            }
            let result = self.resolve(alias).await;
            out.push((alias.to_string(), result));
        }
        out
    }
}
