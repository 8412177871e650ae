//! Scripted executors for driving the interpretation pipeline.

#![allow(dead_code)]

use async_trait::async_trait;
use pitwall_intent::{CoverageLevel, CoverageStatus, QueryIntent, QueryKind};
use pitwall_interpret::{
    CoverageInfo, ExecutionError, Executor, PairComparison, QueryResult, ResultPayload,
    TeammateGap,
};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Replays canned outcomes in order and records every intent it saw.
#[derive(Default)]
pub struct ScriptedExecutor {
    script: Mutex<VecDeque<Result<QueryResult, ExecutionError>>>,
    seen: Mutex<Vec<QueryIntent>>,
}

impl ScriptedExecutor {
    pub fn new(script: Vec<Result<QueryResult, ExecutionError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn seen(&self) -> Vec<QueryIntent> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Executor for ScriptedExecutor {
    async fn execute(&self, intent: &QueryIntent) -> Result<QueryResult, ExecutionError> {
        self.seen.lock().unwrap().push(intent.clone());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ExecutionError::failed("script exhausted")))
    }
}

pub fn pair_result(kind: QueryKind, a: &str, b: &str, delta: f64, track_id: Option<&str>) -> QueryResult {
    QueryResult::new(
        kind,
        ResultPayload::PairComparison(PairComparison {
            driver_a_id: a.to_string(),
            driver_b_id: b.to_string(),
            metric: "season_avg_pace".to_string(),
            driver_a_value: 100.4 + delta,
            driver_b_value: 100.4,
            delta,
            unit: "%".to_string(),
            laps_a: None,
            laps_b: None,
            track_id: track_id.map(str::to_string),
        }),
        CoverageInfo::new(CoverageLevel::High, 22, "races"),
    )
}

pub fn gap_result(kind: QueryKind, shared_races: u32, gap_percent: f64) -> QueryResult {
    QueryResult::new(
        kind,
        ResultPayload::TeammateGap(gap("teammate_gap_raw", shared_races, gap_percent)),
        CoverageInfo::new(CoverageLevel::Moderate, shared_races, "shared races"),
    )
}

pub fn gap(metric: &str, shared_races: u32, gap_percent: f64) -> TeammateGap {
    TeammateGap {
        team_id: "red_bull".to_string(),
        driver_primary_id: "max_verstappen".to_string(),
        driver_secondary_id: "sergio_perez".to_string(),
        metric: metric.to_string(),
        gap_percent,
        shared_races,
        faster_primary_count: shared_races / 2 + 1,
        coverage_status: CoverageStatus::from_shared_races(shared_races),
        team_rank: None,
        teams_ranked: None,
    }
}
