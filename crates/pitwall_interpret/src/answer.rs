//! User-facing answers built from execution results.
//!
//! Every answer carries a headline, a short bullet list, a confidence
//! annotation and follow-up suggestions. Fail-closed answers report the
//! limitation instead of a number.

use crate::coverage::{calculate_percentile, calculate_teammate_gap_percentile};
use crate::executor::{
    CountSummary, DriverSummary, PairComparison, QueryResult, Ranking, ResultPayload, SeasonDelta,
    TeammateGap,
};
use pitwall_intent::{
    non_empty, Confidence, ConfidenceLevel, FallbackTrail, Query, QueryIntent, QueryKind,
};
use pitwall_rules::{MetricRegistryValidator, RankingBasis};
use serde::{Deserialize, Serialize};

/// Headline used whenever an answer cannot be given with confidence.
pub const FAIL_CLOSED_HEADLINE: &str = "Coverage is limited for this scope";

const MAX_BULLETS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub headline: String,
    pub bullets: Vec<String>,
    pub confidence: Confidence,
    pub follow_ups: Vec<String>,
}

impl Answer {
    /// Prefix the headline with the trail's notes, in the order they were taken.
    pub fn with_fallback_notes(mut self, trail: &FallbackTrail) -> Self {
        if trail.is_empty() {
            return self;
        }
        let mut parts: Vec<&str> = trail.notes().collect();
        parts.push(&self.headline);
        self.headline = parts.join(" ");
        self
    }
}

// ============================================================================
// Formatting helpers
// ============================================================================

/// Title-case a canonical id: `max_verstappen` -> `Max Verstappen`.
pub fn display_name(id: &str) -> String {
    id.split(['_', '-'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Which side of a signed delta comes out ahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advantage {
    First,
    Second,
    Even,
}

/// Decide the advantage from the sign of `first - second` alone.
pub fn advantage(delta: f64, basis: RankingBasis) -> Advantage {
    if delta == 0.0 || delta.is_nan() {
        return Advantage::Even;
    }
    let first_lower = delta < 0.0;
    match (basis, first_lower) {
        (RankingBasis::LowerIsFaster, true) | (RankingBasis::HigherIsBetter, false) => {
            Advantage::First
        }
        _ => Advantage::Second,
    }
}

/// Share of the larger lap count that the smaller one covers, as a percentage.
pub fn overlap_percent(a: u32, b: u32) -> u32 {
    let max = a.max(b);
    if max == 0 {
        return 0;
    }
    (f64::from(a.min(b)) / f64::from(max) * 100.0).round() as u32
}

pub fn format_metric(value: f64, unit: &str) -> String {
    match unit {
        "s" => format!("{:.3}s", value),
        "%" => format!("{:.3}%", value),
        "" => format!("{:.3}", value),
        other => format!("{:.3} {}", value, other),
    }
}

fn basis_for(metric: &str) -> RankingBasis {
    MetricRegistryValidator::get_ranking_basis(metric).unwrap_or(RankingBasis::LowerIsFaster)
}

fn track_name(intent: &QueryIntent) -> Option<String> {
    intent
        .query
        .slots()
        .track
        .and_then(|t| non_empty(&t.track_id))
        .map(display_name)
}

// ============================================================================
// Success answers
// ============================================================================

/// Kind-specific answer for a successful result.
///
/// A result whose sample is below the reporting threshold is answered
/// fail-closed: no direction and no figure, only the limitation.
pub fn build_answer(intent: &QueryIntent, result: &QueryResult) -> Answer {
    let (headline, bullets, confidence) = match &result.payload {
        ResultPayload::PairComparison(p) => pair_comparison(intent, p, result),
        ResultPayload::TeammateGap(gap) => teammate_gap(intent, gap),
        ResultPayload::TeammateGapDual { race, qualifying } => {
            teammate_gap_dual(intent, race, qualifying)
        }
        ResultPayload::SeasonComparison(delta) => season_comparison(delta, result),
        ResultPayload::DriverSummary(summary) => driver_summary(summary, result),
        ResultPayload::Ranking(ranking) => {
            if ranking.entries.is_empty() {
                return fail_closed_answer(intent, "No ranked drivers were returned for this scope.");
            }
            ranking_answer(intent, ranking, result)
        }
        ResultPayload::Count(count) => count_answer(intent, count, result),
        ResultPayload::Generic { summary, .. } => (
            summary.clone(),
            vec![format!("Season: {}", intent.season())],
            coverage_confidence(result),
        ),
    };

    if confidence.level == ConfidenceLevel::Insufficient {
        let mut answer = fail_closed_answer(intent, &confidence.summary);
        answer.confidence = confidence;
        return answer;
    }

    Answer {
        headline,
        bullets: bullets.into_iter().take(MAX_BULLETS).collect(),
        confidence,
        follow_ups: follow_ups(intent),
    }
}

fn coverage_confidence(result: &QueryResult) -> Confidence {
    Confidence::from_level(
        result.coverage.level,
        result.coverage.sample_size,
        &result.coverage.unit,
    )
}

type Parts = (String, Vec<String>, Confidence);

fn pair_comparison(intent: &QueryIntent, p: &PairComparison, result: &QueryResult) -> Parts {
    let a = display_name(&p.driver_a_id);
    let b = display_name(&p.driver_b_id);
    let scope = match p.track_id.as_deref().map(display_name).or_else(|| track_name(intent)) {
        Some(track) => format!("at {} in {}", track, intent.season()),
        None => format!("across {}", intent.season()),
    };
    let gap = format_metric(p.delta.abs(), &p.unit);

    let headline = match advantage(p.delta, basis_for(&p.metric)) {
        Advantage::First => format!("{a} was faster than {b} {scope} by {gap}"),
        Advantage::Second => format!("{b} was faster than {a} {scope} by {gap}"),
        Advantage::Even => format!("{a} and {b} were evenly matched {scope}"),
    };

    let mut bullets = vec![
        format!("{a}: {}", format_metric(p.driver_a_value, &p.unit)),
        format!("{b}: {}", format_metric(p.driver_b_value, &p.unit)),
        format!("Metric: {}", p.metric),
    ];
    if let (Some(la), Some(lb)) = (p.laps_a, p.laps_b) {
        bullets.push(format!(
            "Lap overlap: {}% ({la} vs {lb} laps)",
            overlap_percent(la, lb)
        ));
    }
    (headline, bullets, coverage_confidence(result))
}

fn gap_headline(intent: &QueryIntent, gap: &TeammateGap) -> String {
    let primary = display_name(&gap.driver_primary_id);
    let secondary = display_name(&gap.driver_secondary_id);
    let team = display_name(&gap.team_id);
    let size = format_metric(gap.gap_percent.abs(), "%");
    match advantage(gap.gap_percent, basis_for(&gap.metric)) {
        Advantage::First => {
            format!("{primary} out-paced {secondary} at {team} in {} by {size}", intent.season())
        }
        Advantage::Second => {
            format!("{secondary} out-paced {primary} at {team} in {} by {size}", intent.season())
        }
        Advantage::Even => {
            format!("{primary} and {secondary} were evenly matched at {team} in {}", intent.season())
        }
    }
}

fn teammate_gap(intent: &QueryIntent, gap: &TeammateGap) -> Parts {
    let primary = display_name(&gap.driver_primary_id);
    let mut bullets = vec![
        format!("Gap: {} ({})", format_metric(gap.gap_percent, "%"), gap.metric),
        format!(
            "{primary} was faster in {} of {} shared races",
            gap.faster_primary_count, gap.shared_races
        ),
        format!("Coverage: {}", gap.coverage_status.as_str()),
    ];
    if let (Some(rank), Some(total)) = (gap.team_rank, gap.teams_ranked) {
        let won = advantage(gap.gap_percent, basis_for(&gap.metric)) == Advantage::First;
        bullets.push(format!(
            "Gap ranks {rank} of {total} teams; {primary} sits at the {}th teammate percentile",
            calculate_teammate_gap_percentile(won, Some((rank, total)))
        ));
    }
    (
        gap_headline(intent, gap),
        bullets,
        Confidence::from_status(gap.coverage_status, gap.shared_races),
    )
}

fn teammate_gap_dual(intent: &QueryIntent, race: &TeammateGap, qualifying: &TeammateGap) -> Parts {
    let headline = format!(
        "Race pace: {}. Qualifying: {}",
        gap_headline(intent, race),
        gap_headline(intent, qualifying)
    );
    let bullets = vec![
        format!("Race gap: {}", format_metric(race.gap_percent, "%")),
        format!("Qualifying gap: {}", format_metric(qualifying.gap_percent, "%")),
        format!(
            "Shared races: {} race, {} qualifying",
            race.shared_races, qualifying.shared_races
        ),
    ];
    // The weaker of the two samples bounds the confidence
    let weaker = if race.shared_races <= qualifying.shared_races {
        race
    } else {
        qualifying
    };
    (
        headline,
        bullets,
        Confidence::from_status(weaker.coverage_status, weaker.shared_races),
    )
}

fn season_comparison(d: &SeasonDelta, result: &QueryResult) -> Parts {
    let driver = display_name(&d.driver_id);
    let change = format_metric(d.delta.abs(), &d.unit);
    let headline = match advantage(d.delta, basis_for(&d.metric)) {
        Advantage::First => format!(
            "{driver} was faster in {} than in {} by {change}",
            d.season, d.compare_season
        ),
        Advantage::Second => format!(
            "{driver} was slower in {} than in {} by {change}",
            d.season, d.compare_season
        ),
        Advantage::Even => format!(
            "{driver}'s pace was unchanged between {} and {}",
            d.compare_season, d.season
        ),
    };
    let bullets = vec![
        format!("{}: {}", d.season, format_metric(d.season_value, &d.unit)),
        format!("{}: {}", d.compare_season, format_metric(d.compare_value, &d.unit)),
        format!("Metric: {}", d.metric),
    ];
    (headline, bullets, coverage_confidence(result))
}

fn driver_summary(s: &DriverSummary, result: &QueryResult) -> Parts {
    let driver = display_name(&s.driver_id);
    let headline = match s.season {
        Some(season) => format!("{driver} in {season}: {} wins from {} starts", s.wins, s.starts),
        None => format!("{driver}'s career: {} wins from {} starts", s.wins, s.starts),
    };
    let mut bullets = vec![
        format!("Podiums: {}", s.podiums),
        format!("Poles: {}", s.poles),
    ];
    if let Some(points) = s.points {
        bullets.push(format!("Points: {points}"));
    }
    if let Some(best) = s.best_finish {
        bullets.push(format!("Best finish: P{best}"));
    }
    (headline, bullets, coverage_confidence(result))
}

fn ranking_answer(intent: &QueryIntent, ranking: &Ranking, result: &QueryResult) -> Parts {
    let leader = ranking
        .entries
        .iter()
        .min_by_key(|e| e.position)
        .map(|e| display_name(&e.driver_id))
        .unwrap_or_default();
    let season = intent.season();
    let place = track_name(intent).unwrap_or_else(|| "this track".to_string());

    let headline = match intent.kind() {
        QueryKind::RaceResultsSummary => format!("{leader} won at {place} in {season}"),
        QueryKind::QualifyingResultsSummary => format!("{leader} took pole at {place} in {season}"),
        QueryKind::TrackWinners => format!("{leader} heads the winners list at {place}"),
        QueryKind::TrackFastestDrivers => format!("{leader} was fastest at {place} in {season}"),
        _ => format!("{leader} leads the {season} ranking"),
    };

    let total = ranking.entries.len() as u32;
    let mut entries: Vec<_> = ranking.entries.iter().collect();
    entries.sort_by_key(|e| e.position);
    let bullets = entries
        .into_iter()
        .take(MAX_BULLETS - 1)
        .map(|e| match e.value {
            Some(value) => format!(
                "P{} {} ({})",
                e.position,
                display_name(&e.driver_id),
                format_metric(value, &ranking.unit)
            ),
            None => format!("P{} {}", e.position, display_name(&e.driver_id)),
        })
        .chain(std::iter::once(format!(
            "{} drivers ranked; the leader sits at the {}th percentile",
            total,
            calculate_percentile(1, total)
        )))
        .collect();
    (headline, bullets, coverage_confidence(result))
}

fn count_answer(intent: &QueryIntent, c: &CountSummary, result: &QueryResult) -> Parts {
    let driver = display_name(&c.driver_id);
    let label = c.label.replace('_', " ");
    let scope = match intent.kind() {
        QueryKind::DriverCareerPoleCount | QueryKind::DriverCareerSummary => {
            "across their career".to_string()
        }
        _ => format!("in {}", intent.season()),
    };

    let (headline, mut bullets) = match (&c.opponent_id, c.opponent_count) {
        (Some(opponent), Some(theirs)) => {
            let opponent = display_name(opponent);
            let headline = if c.count > theirs {
                format!("{driver} leads {opponent} {}-{theirs} on {label} {scope}", c.count)
            } else if c.count < theirs {
                format!("{opponent} leads {driver} {theirs}-{} on {label} {scope}", c.count)
            } else {
                format!("{driver} and {opponent} are level at {}-{theirs} on {label} {scope}", c.count)
            };
            let bullets = vec![
                format!("{driver}: {}", c.count),
                format!("{opponent}: {theirs}"),
                format!("Meetings counted: {}", c.count + theirs),
            ];
            (headline, bullets)
        }
        _ => (
            format!("{driver} recorded {} {label} {scope}", c.count),
            vec![format!("{}: {}", display_name(&c.label), c.count)],
        ),
    };
    bullets.push(format!(
        "Sample: {} {}",
        result.coverage.sample_size, result.coverage.unit
    ));
    (headline, bullets, coverage_confidence(result))
}

// ============================================================================
// Fail-closed answers
// ============================================================================

/// Answer reporting that the request cannot be answered reliably.
pub fn fail_closed_answer(intent: &QueryIntent, reason: &str) -> Answer {
    let mut bullets = Vec::new();
    if !reason.trim().is_empty() {
        bullets.push(reason.trim().to_string());
    }
    bullets.push("No figure is shown because the available sample would not support it.".to_string());
    bullets.push("Try another season or a different driver pairing.".to_string());
    if intent.query.requires_track() {
        bullets.push("Season-wide comparisons usually have more coverage than a single track.".to_string());
    }

    Answer {
        headline: FAIL_CLOSED_HEADLINE.to_string(),
        bullets: bullets.into_iter().take(MAX_BULLETS).collect(),
        confidence: Confidence::insufficient("Insufficient coverage to answer reliably."),
        follow_ups: follow_ups(intent),
    }
}

// ============================================================================
// Follow-ups
// ============================================================================

/// Suggested next questions for a kind.
pub fn follow_ups(intent: &QueryIntent) -> Vec<String> {
    let season = intent.season();
    let previous = season - 1;
    let pair_names = intent
        .query
        .slots()
        .pair
        .and_then(|p| p.ids())
        .map(|(a, b)| (display_name(a), display_name(b)));
    let (a, b) = pair_names.unwrap_or_else(|| ("them".to_string(), "their rival".to_string()));

    match &intent.query {
        Query::CrossTeamTrackScopedDriverComparison(_) => vec![
            format!("Compare {a} and {b} across the whole {season} season"),
            "Show the fastest drivers at this track".to_string(),
        ],
        Query::SeasonDriverVsDriver(_)
        | Query::DriverVsDriverComprehensive(_)
        | Query::DriverMatchupLookup(_) => vec![
            format!("Compare {a} and {b} at a specific track"),
            format!("Head-to-head qualifying count for {a} and {b} in {season}"),
        ],
        Query::QualifyingGapDrivers(_) | Query::DriverHeadToHeadCount(_) => vec![
            format!("Compare {a} and {b} on race pace in {season}"),
            format!("Repeat for {previous}"),
        ],
        Query::TeammateGapSummarySeason(_) => vec![
            "Show the race and qualifying gaps side by side".to_string(),
            format!("Compare the same team in {previous}"),
        ],
        Query::TeammateGapDualComparison(_) => vec![
            "Show only the race-pace teammate gap".to_string(),
            format!("Compare the same team in {previous}"),
        ],
        Query::DriverSeasonSummary(_) | Query::DriverSeasonComparison(_) => vec![
            format!("Show the {season} driver rankings"),
            "Show this driver's career summary".to_string(),
        ],
        Query::DriverCareerSummary(_)
        | Query::DriverProfileSummary(_)
        | Query::DriverCareerPoleCount(_) => vec![
            "Show this driver's pace trend over recent seasons".to_string(),
            format!("Show this driver's {season} season summary"),
        ],
        Query::DriverTrendSummary(_) | Query::DriverPerformanceVector(_) => vec![
            format!("Compare {season} with {previous} for this driver"),
            "Show this driver's career summary".to_string(),
        ],
        Query::DriverPoleCount(_) | Query::DriverWinCount(_) => vec![
            format!("Show this driver's {season} season summary"),
            format!("Show the {season} driver rankings"),
        ],
        Query::DriverMultiComparison(_) => vec![
            "Narrow the comparison to two drivers".to_string(),
            format!("Show the full {season} driver rankings"),
        ],
        Query::TrackFastestDrivers(_)
        | Query::RaceResultsSummary(_)
        | Query::QualifyingResultsSummary(_)
        | Query::TrackWinners(_) => vec![
            format!("Show the race result at this track in {previous}"),
            "Show the fastest drivers at this track".to_string(),
        ],
        Query::DriverTrackHistory(_) | Query::DriverMultiTrackComparison(_) => vec![
            "Compare this driver with a teammate at the same track".to_string(),
            format!("Show this driver's {season} season summary"),
        ],
        Query::SeasonDriverRankings => vec![
            format!("Show the {previous} driver rankings"),
            "Compare the top two drivers head to head".to_string(),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::CoverageInfo;
    use pitwall_intent::{
        ConfidenceLevel, CoverageLevel, CoverageStatus, DriverPair, FallbackReason, FallbackStep,
        PairAtTrack, TeammatePair, TrackRef,
    };

    fn scoped_intent() -> QueryIntent {
        QueryIntent::new(
            Query::CrossTeamTrackScopedDriverComparison(PairAtTrack {
                pair: DriverPair::canonical("charles_leclerc", "lando_norris"),
                track: TrackRef::canonical("monza"),
            }),
            2024,
        )
    }

    fn pair_result(delta: f64, laps: (u32, u32)) -> QueryResult {
        QueryResult::new(
            QueryKind::CrossTeamTrackScopedDriverComparison,
            ResultPayload::PairComparison(PairComparison {
                driver_a_id: "charles_leclerc".to_string(),
                driver_b_id: "lando_norris".to_string(),
                metric: "avg_true_pace".to_string(),
                driver_a_value: 81.2 + delta,
                driver_b_value: 81.2,
                delta,
                unit: "s".to_string(),
                laps_a: Some(laps.0),
                laps_b: Some(laps.1),
                track_id: Some("monza".to_string()),
            }),
            CoverageInfo::new(CoverageLevel::High, 40, "laps"),
        )
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("max_verstappen"), "Max Verstappen");
        assert_eq!(display_name("red_bull"), "Red Bull");
        assert_eq!(display_name("monza"), "Monza");
        assert_eq!(display_name(""), "");
    }

    #[test]
    fn test_advantage_by_sign_only() {
        assert_eq!(advantage(-0.2, RankingBasis::LowerIsFaster), Advantage::First);
        assert_eq!(advantage(0.2, RankingBasis::LowerIsFaster), Advantage::Second);
        assert_eq!(advantage(0.0, RankingBasis::LowerIsFaster), Advantage::Even);
        assert_eq!(advantage(0.2, RankingBasis::HigherIsBetter), Advantage::First);
    }

    #[test]
    fn test_overlap_percent() {
        assert_eq!(overlap_percent(0, 0), 0);
        assert_eq!(overlap_percent(30, 40), 75);
        assert_eq!(overlap_percent(40, 30), 75);
        assert_eq!(overlap_percent(1, 3), 33);
    }

    #[test]
    fn test_pair_comparison_headline() {
        let answer = build_answer(&scoped_intent(), &pair_result(-0.135, (30, 40)));
        assert_eq!(
            answer.headline,
            "Charles Leclerc was faster than Lando Norris at Monza in 2024 by 0.135s"
        );
        assert!(answer.bullets.iter().any(|b| b.contains("75%")));
        assert_eq!(answer.confidence.level, ConfidenceLevel::High);
        assert!(!answer.follow_ups.is_empty());
    }

    #[test]
    fn test_zero_delta_states_no_advantage() {
        let answer = build_answer(&scoped_intent(), &pair_result(0.0, (10, 10)));
        assert!(answer.headline.contains("evenly matched"));
        assert!(!answer.headline.contains("faster"));
    }

    #[test]
    fn test_teammate_gap_confidence_from_status() {
        let intent = QueryIntent::new(
            Query::TeammateGapSummarySeason(TeammatePair {
                pair: DriverPair::canonical("max_verstappen", "sergio_perez"),
                team_id: Some("red_bull".to_string()),
            }),
            2023,
        );
        let result = QueryResult::new(
            QueryKind::TeammateGapSummarySeason,
            ResultPayload::TeammateGap(TeammateGap {
                team_id: "red_bull".to_string(),
                driver_primary_id: "max_verstappen".to_string(),
                driver_secondary_id: "sergio_perez".to_string(),
                metric: "teammate_gap_raw".to_string(),
                gap_percent: -0.81,
                shared_races: 6,
                faster_primary_count: 5,
                coverage_status: CoverageStatus::LowCoverage,
                team_rank: None,
                teams_ranked: None,
            }),
            CoverageInfo::new(CoverageLevel::Low, 6, "shared races"),
        );

        let answer = build_answer(&intent, &result);
        assert!(answer.headline.starts_with("Max Verstappen out-paced Sergio Perez at Red Bull"));
        assert_eq!(answer.confidence.level, ConfidenceLevel::Weak);
    }

    #[test]
    fn test_insufficient_pair_sample_makes_no_claim() {
        let mut result = pair_result(-0.3, (2, 3));
        result.coverage = CoverageInfo::new(CoverageLevel::Insufficient, 1, "races");

        let answer = build_answer(&scoped_intent(), &result);
        assert_eq!(answer.headline, FAIL_CLOSED_HEADLINE);
        assert!(answer.bullets.iter().all(|b| !b.contains("faster") && !b.contains("0.300")));
        assert_eq!(answer.confidence.level, ConfidenceLevel::Insufficient);
        assert!(answer.confidence.summary.contains("1 races"));
    }

    #[test]
    fn test_fallback_notes_prefix_in_order() {
        let mut trail = FallbackTrail::new();
        trail.push(FallbackStep::new(
            FallbackReason::DriverNotInSeason,
            QueryKind::CrossTeamTrackScopedDriverComparison,
            QueryKind::CrossTeamTrackScopedDriverComparison,
            "First note.",
        ));
        trail.push(FallbackStep::new(
            FallbackReason::InsufficientSharedLaps,
            QueryKind::CrossTeamTrackScopedDriverComparison,
            QueryKind::SeasonDriverVsDriver,
            "Second note.",
        ));
        let answer = build_answer(&scoped_intent(), &pair_result(-0.1, (5, 5)))
            .with_fallback_notes(&trail);
        assert!(answer.headline.starts_with("First note. Second note. Charles Leclerc"));
    }

    #[test]
    fn test_fail_closed_answer_has_no_figure() {
        let answer = fail_closed_answer(&scoped_intent(), "Only 3 shared laps.");
        assert_eq!(answer.headline, FAIL_CLOSED_HEADLINE);
        assert_eq!(answer.bullets[0], "Only 3 shared laps.");
        assert_eq!(answer.confidence.level, ConfidenceLevel::Insufficient);
        assert!(answer.bullets.len() <= MAX_BULLETS);
        assert!(!answer.follow_ups.is_empty());
    }

    #[test]
    fn test_empty_ranking_fails_closed() {
        let intent = QueryIntent::new(Query::SeasonDriverRankings, 2024);
        let result = QueryResult::new(
            QueryKind::SeasonDriverRankings,
            ResultPayload::Ranking(Ranking {
                metric: None,
                unit: String::new(),
                entries: vec![],
            }),
            CoverageInfo::new(CoverageLevel::Insufficient, 0, "races"),
        );
        assert_eq!(build_answer(&intent, &result).headline, FAIL_CLOSED_HEADLINE);
    }
}
