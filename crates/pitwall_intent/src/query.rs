//! Query intent tagged union.
//!
//! One variant per kind, each carrying only the identity slots that kind
//! uses. Every slot pairs a free-text *surface* field (`driver`, `track`, ...)
//! with its canonical counterpart (`driver_id`, `track_id`, ...). Fields that a
//! kind does not declare are dropped when the intent is parsed.

use crate::kind::QueryKind;
use serde::{Deserialize, Serialize};

// ============================================================================
// Identity slots
// ============================================================================

/// A single driver slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_id: Option<String>,
}

impl DriverRef {
    pub fn canonical(id: impl Into<String>) -> Self {
        Self {
            driver: None,
            driver_id: Some(id.into()),
        }
    }

    pub fn surface(text: impl Into<String>) -> Self {
        Self {
            driver: Some(text.into()),
            driver_id: None,
        }
    }
}

/// Two driver slots compared against each other.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverPair {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_a: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_a_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_b: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_b_id: Option<String>,
}

impl DriverPair {
    pub fn canonical(a: impl Into<String>, b: impl Into<String>) -> Self {
        Self {
            driver_a: None,
            driver_a_id: Some(a.into()),
            driver_b: None,
            driver_b_id: Some(b.into()),
        }
    }

    pub fn surface(a: impl Into<String>, b: impl Into<String>) -> Self {
        Self {
            driver_a: Some(a.into()),
            driver_a_id: None,
            driver_b: Some(b.into()),
            driver_b_id: None,
        }
    }

    /// Both canonical ids, when both are known.
    pub fn ids(&self) -> Option<(&str, &str)> {
        match (non_empty(&self.driver_a_id), non_empty(&self.driver_b_id)) {
            (Some(a), Some(b)) => Some((a, b)),
            _ => None,
        }
    }
}

/// Driver pair scoped to one constructor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeammatePair {
    #[serde(flatten)]
    pub pair: DriverPair,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
}

/// Two to six drivers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverSet {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub drivers: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub driver_ids: Vec<String>,
}

/// A single track slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_id: Option<String>,
}

impl TrackRef {
    pub fn canonical(id: impl Into<String>) -> Self {
        Self {
            track: None,
            track_id: Some(id.into()),
        }
    }

    pub fn surface(text: impl Into<String>) -> Self {
        Self {
            track: Some(text.into()),
            track_id: None,
        }
    }
}

/// Two to six tracks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackSet {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tracks: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub track_ids: Vec<String>,
}

// ============================================================================
// Variant payloads
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverAtTrack {
    #[serde(flatten)]
    pub driver: DriverRef,
    #[serde(flatten)]
    pub track: TrackRef,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairAtTrack {
    #[serde(flatten)]
    pub pair: DriverPair,
    #[serde(flatten)]
    pub track: TrackRef,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverTracks {
    #[serde(flatten)]
    pub driver: DriverRef,
    #[serde(flatten)]
    pub tracks: TrackSet,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverTrend {
    #[serde(flatten)]
    pub driver: DriverRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_season: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_season: Option<i32>,
}

/// Same driver, two seasons.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonComparison {
    #[serde(flatten)]
    pub driver: DriverRef,
    pub compare_season: i32,
}

/// Optional narrowing filters for head-to-head counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadToHeadFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather: Option<String>,
    /// ISO date (YYYY-MM-DD)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_from: Option<String>,
    /// ISO date (YYYY-MM-DD)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_to: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadToHead {
    #[serde(flatten)]
    pub pair: DriverPair,
    pub h2h_metric: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h2h_scope: Option<String>,
    #[serde(default)]
    pub filters: HeadToHeadFilters,
}

// ============================================================================
// Query
// ============================================================================

/// Kind-specific part of a query intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Query {
    DriverSeasonSummary(DriverRef),
    DriverCareerSummary(DriverRef),
    DriverProfileSummary(DriverRef),
    DriverTrendSummary(DriverTrend),
    DriverPerformanceVector(DriverRef),
    DriverPoleCount(DriverRef),
    DriverCareerPoleCount(DriverRef),
    DriverWinCount(DriverRef),
    DriverSeasonComparison(SeasonComparison),
    SeasonDriverVsDriver(DriverPair),
    CrossTeamTrackScopedDriverComparison(PairAtTrack),
    DriverVsDriverComprehensive(DriverPair),
    DriverMatchupLookup(DriverPair),
    DriverHeadToHeadCount(HeadToHead),
    QualifyingGapDrivers(DriverPair),
    DriverMultiComparison(DriverSet),
    TeammateGapSummarySeason(TeammatePair),
    TeammateGapDualComparison(TeammatePair),
    TrackFastestDrivers(TrackRef),
    RaceResultsSummary(TrackRef),
    QualifyingResultsSummary(TrackRef),
    TrackWinners(TrackRef),
    DriverTrackHistory(DriverAtTrack),
    DriverMultiTrackComparison(DriverTracks),
    SeasonDriverRankings,
}

/// Borrowed view of the identity slots a query carries.
#[derive(Debug, Default)]
pub struct IdentitySlots<'a> {
    pub driver: Option<&'a DriverRef>,
    pub pair: Option<&'a DriverPair>,
    pub drivers: Option<&'a DriverSet>,
    pub track: Option<&'a TrackRef>,
    pub tracks: Option<&'a TrackSet>,
    pub team_id: Option<&'a Option<String>>,
}

/// Mutable view of the identity slots a query carries.
#[derive(Debug, Default)]
pub struct IdentitySlotsMut<'a> {
    pub driver: Option<&'a mut DriverRef>,
    pub pair: Option<&'a mut DriverPair>,
    pub drivers: Option<&'a mut DriverSet>,
    pub track: Option<&'a mut TrackRef>,
    pub tracks: Option<&'a mut TrackSet>,
    pub team_id: Option<&'a mut Option<String>>,
}

impl Query {
    pub fn kind(&self) -> QueryKind {
        match self {
            Query::DriverSeasonSummary(_) => QueryKind::DriverSeasonSummary,
            Query::DriverCareerSummary(_) => QueryKind::DriverCareerSummary,
            Query::DriverProfileSummary(_) => QueryKind::DriverProfileSummary,
            Query::DriverTrendSummary(_) => QueryKind::DriverTrendSummary,
            Query::DriverPerformanceVector(_) => QueryKind::DriverPerformanceVector,
            Query::DriverPoleCount(_) => QueryKind::DriverPoleCount,
            Query::DriverCareerPoleCount(_) => QueryKind::DriverCareerPoleCount,
            Query::DriverWinCount(_) => QueryKind::DriverWinCount,
            Query::DriverSeasonComparison(_) => QueryKind::DriverSeasonComparison,
            Query::SeasonDriverVsDriver(_) => QueryKind::SeasonDriverVsDriver,
            Query::CrossTeamTrackScopedDriverComparison(_) => {
                QueryKind::CrossTeamTrackScopedDriverComparison
            }
            Query::DriverVsDriverComprehensive(_) => QueryKind::DriverVsDriverComprehensive,
            Query::DriverMatchupLookup(_) => QueryKind::DriverMatchupLookup,
            Query::DriverHeadToHeadCount(_) => QueryKind::DriverHeadToHeadCount,
            Query::QualifyingGapDrivers(_) => QueryKind::QualifyingGapDrivers,
            Query::DriverMultiComparison(_) => QueryKind::DriverMultiComparison,
            Query::TeammateGapSummarySeason(_) => QueryKind::TeammateGapSummarySeason,
            Query::TeammateGapDualComparison(_) => QueryKind::TeammateGapDualComparison,
            Query::TrackFastestDrivers(_) => QueryKind::TrackFastestDrivers,
            Query::RaceResultsSummary(_) => QueryKind::RaceResultsSummary,
            Query::QualifyingResultsSummary(_) => QueryKind::QualifyingResultsSummary,
            Query::TrackWinners(_) => QueryKind::TrackWinners,
            Query::DriverTrackHistory(_) => QueryKind::DriverTrackHistory,
            Query::DriverMultiTrackComparison(_) => QueryKind::DriverMultiTrackComparison,
            Query::SeasonDriverRankings => QueryKind::SeasonDriverRankings,
        }
    }

    /// Identity slots present on this kind.
    pub fn slots(&self) -> IdentitySlots<'_> {
        match self {
            Query::DriverSeasonSummary(d)
            | Query::DriverCareerSummary(d)
            | Query::DriverProfileSummary(d)
            | Query::DriverPerformanceVector(d)
            | Query::DriverPoleCount(d)
            | Query::DriverCareerPoleCount(d)
            | Query::DriverWinCount(d) => IdentitySlots {
                driver: Some(d),
                ..Default::default()
            },
            Query::DriverTrendSummary(t) => IdentitySlots {
                driver: Some(&t.driver),
                ..Default::default()
            },
            Query::DriverSeasonComparison(c) => IdentitySlots {
                driver: Some(&c.driver),
                ..Default::default()
            },
            Query::SeasonDriverVsDriver(p)
            | Query::DriverVsDriverComprehensive(p)
            | Query::DriverMatchupLookup(p)
            | Query::QualifyingGapDrivers(p) => IdentitySlots {
                pair: Some(p),
                ..Default::default()
            },
            Query::CrossTeamTrackScopedDriverComparison(p) => IdentitySlots {
                pair: Some(&p.pair),
                track: Some(&p.track),
                ..Default::default()
            },
            Query::DriverHeadToHeadCount(h) => IdentitySlots {
                pair: Some(&h.pair),
                ..Default::default()
            },
            Query::DriverMultiComparison(s) => IdentitySlots {
                drivers: Some(s),
                ..Default::default()
            },
            Query::TeammateGapSummarySeason(t) | Query::TeammateGapDualComparison(t) => {
                IdentitySlots {
                    pair: Some(&t.pair),
                    team_id: Some(&t.team_id),
                    ..Default::default()
                }
            }
            Query::TrackFastestDrivers(t)
            | Query::RaceResultsSummary(t)
            | Query::QualifyingResultsSummary(t)
            | Query::TrackWinners(t) => IdentitySlots {
                track: Some(t),
                ..Default::default()
            },
            Query::DriverTrackHistory(d) => IdentitySlots {
                driver: Some(&d.driver),
                track: Some(&d.track),
                ..Default::default()
            },
            Query::DriverMultiTrackComparison(d) => IdentitySlots {
                driver: Some(&d.driver),
                tracks: Some(&d.tracks),
                ..Default::default()
            },
            Query::SeasonDriverRankings => IdentitySlots::default(),
        }
    }

    /// Mutable identity slots present on this kind.
    pub fn slots_mut(&mut self) -> IdentitySlotsMut<'_> {
        match self {
            Query::DriverSeasonSummary(d)
            | Query::DriverCareerSummary(d)
            | Query::DriverProfileSummary(d)
            | Query::DriverPerformanceVector(d)
            | Query::DriverPoleCount(d)
            | Query::DriverCareerPoleCount(d)
            | Query::DriverWinCount(d) => IdentitySlotsMut {
                driver: Some(d),
                ..Default::default()
            },
            Query::DriverTrendSummary(t) => IdentitySlotsMut {
                driver: Some(&mut t.driver),
                ..Default::default()
            },
            Query::DriverSeasonComparison(c) => IdentitySlotsMut {
                driver: Some(&mut c.driver),
                ..Default::default()
            },
            Query::SeasonDriverVsDriver(p)
            | Query::DriverVsDriverComprehensive(p)
            | Query::DriverMatchupLookup(p)
            | Query::QualifyingGapDrivers(p) => IdentitySlotsMut {
                pair: Some(p),
                ..Default::default()
            },
            Query::CrossTeamTrackScopedDriverComparison(p) => IdentitySlotsMut {
                pair: Some(&mut p.pair),
                track: Some(&mut p.track),
                ..Default::default()
            },
            Query::DriverHeadToHeadCount(h) => IdentitySlotsMut {
                pair: Some(&mut h.pair),
                ..Default::default()
            },
            Query::DriverMultiComparison(s) => IdentitySlotsMut {
                drivers: Some(s),
                ..Default::default()
            },
            Query::TeammateGapSummarySeason(t) | Query::TeammateGapDualComparison(t) => {
                IdentitySlotsMut {
                    pair: Some(&mut t.pair),
                    team_id: Some(&mut t.team_id),
                    ..Default::default()
                }
            }
            Query::TrackFastestDrivers(t)
            | Query::RaceResultsSummary(t)
            | Query::QualifyingResultsSummary(t)
            | Query::TrackWinners(t) => IdentitySlotsMut {
                track: Some(t),
                ..Default::default()
            },
            Query::DriverTrackHistory(d) => IdentitySlotsMut {
                driver: Some(&mut d.driver),
                track: Some(&mut d.track),
                ..Default::default()
            },
            Query::DriverMultiTrackComparison(d) => IdentitySlotsMut {
                driver: Some(&mut d.driver),
                tracks: Some(&mut d.tracks),
                ..Default::default()
            },
            Query::SeasonDriverRankings => IdentitySlotsMut::default(),
        }
    }

    /// Whether this kind is scoped to a single track.
    pub fn requires_track(&self) -> bool {
        self.slots().track.is_some()
    }

    /// Canonical driver ids currently known on this query, in slot order.
    pub fn driver_ids(&self) -> Vec<&str> {
        let slots = self.slots();
        let mut ids = Vec::new();
        if let Some(d) = slots.driver {
            ids.extend(non_empty(&d.driver_id));
        }
        if let Some(p) = slots.pair {
            ids.extend(non_empty(&p.driver_a_id));
            ids.extend(non_empty(&p.driver_b_id));
        }
        if let Some(s) = slots.drivers {
            ids.extend(s.driver_ids.iter().map(String::as_str));
        }
        ids
    }
}

// ============================================================================
// Query Intent
// ============================================================================

/// Fields shared by every query kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommonFields {
    pub season: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalization: Option<String>,
    #[serde(default)]
    pub clean_air_only: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compound_context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_scope: Option<String>,
    /// Original question text, carried for audit only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_query: Option<String>,
}

/// A structured analytics request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryIntent {
    #[serde(flatten)]
    pub query: Query,
    #[serde(flatten)]
    pub common: CommonFields,
}

impl QueryIntent {
    pub fn new(query: Query, season: i32) -> Self {
        Self {
            query,
            common: CommonFields {
                season,
                ..Default::default()
            },
        }
    }

    pub fn with_metric(mut self, metric: impl Into<String>) -> Self {
        self.common.metric = Some(metric.into());
        self
    }

    pub fn with_normalization(mut self, normalization: impl Into<String>) -> Self {
        self.common.normalization = Some(normalization.into());
        self
    }

    pub fn with_raw_query(mut self, raw_query: impl Into<String>) -> Self {
        self.common.raw_query = Some(raw_query.into());
        self
    }

    pub fn kind(&self) -> QueryKind {
        self.query.kind()
    }

    pub fn season(&self) -> i32 {
        self.common.season
    }

    /// Stable key identifying the request; `raw_query` does not participate.
    pub fn identity_key(&self) -> String {
        let mut keyed = self.clone();
        keyed.common.raw_query = None;
        serde_json::to_string(&keyed).unwrap_or_else(|_| self.kind().to_string())
    }
}

/// Borrow an optional string as `&str` when it is present and non-blank.
pub fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_flat_intent() {
        let intent: QueryIntent = serde_json::from_value(json!({
            "kind": "teammate_gap_summary_season",
            "season": 2023,
            "driver_a": "Max Verstappen",
            "driver_b_id": "sergio_perez",
            "team_id": "red_bull",
            "raw_query": "how far apart were the red bulls?"
        }))
        .unwrap();

        assert_eq!(intent.kind(), QueryKind::TeammateGapSummarySeason);
        assert_eq!(intent.season(), 2023);
        match &intent.query {
            Query::TeammateGapSummarySeason(t) => {
                assert_eq!(t.pair.driver_a.as_deref(), Some("Max Verstappen"));
                assert_eq!(t.pair.driver_b_id.as_deref(), Some("sergio_perez"));
                assert_eq!(t.team_id.as_deref(), Some("red_bull"));
            }
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn test_stray_track_fields_dropped_on_non_track_kind() {
        let intent: QueryIntent = serde_json::from_value(json!({
            "kind": "season_driver_vs_driver",
            "season": 2024,
            "driver_a_id": "max_verstappen",
            "driver_b_id": "lando_norris",
            "track_id": "monza"
        }))
        .unwrap();

        assert!(!intent.query.requires_track());
        let encoded = serde_json::to_value(&intent).unwrap();
        assert!(encoded.get("track_id").is_none());
    }

    #[test]
    fn test_identity_key_ignores_raw_query() {
        let a = QueryIntent::new(Query::TrackWinners(TrackRef::canonical("monza")), 2024)
            .with_raw_query("who won at monza?");
        let b = QueryIntent::new(Query::TrackWinners(TrackRef::canonical("monza")), 2024)
            .with_raw_query("monza winners please");
        assert_eq!(a.identity_key(), b.identity_key());
    }

    #[test]
    fn test_driver_ids_in_slot_order() {
        let intent = QueryIntent::new(
            Query::SeasonDriverVsDriver(DriverPair::canonical("lewis_hamilton", "george_russell")),
            2024,
        );
        assert_eq!(intent.query.driver_ids(), vec!["lewis_hamilton", "george_russell"]);
    }

    #[test]
    fn test_serialize_roundtrip_keeps_kind_tag() {
        let intent = QueryIntent::new(
            Query::CrossTeamTrackScopedDriverComparison(PairAtTrack {
                pair: DriverPair::surface("Leclerc", "Norris"),
                track: TrackRef::surface("Monza"),
            }),
            2024,
        )
        .with_metric("avg_true_pace");

        let encoded = serde_json::to_value(&intent).unwrap();
        assert_eq!(encoded["kind"], "cross_team_track_scoped_driver_comparison");
        assert_eq!(encoded["track"], "Monza");

        let decoded: QueryIntent = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, intent);
    }

    #[test]
    fn test_every_kind_has_matching_variant_name() {
        let intent = QueryIntent::new(Query::SeasonDriverRankings, 2022);
        let encoded = serde_json::to_value(&intent).unwrap();
        assert_eq!(encoded["kind"], QueryKind::SeasonDriverRankings.as_str());
    }
}
