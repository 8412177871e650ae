//! Orchestrates validation, resolution, execution and answer synthesis.
//!
//! Direct kinds execute once. Adaptive kinds run a bounded loop where each
//! iteration first adjusts the season, then executes, then (on a classified
//! failure) downgrades the kind. Resolution and validation failures are
//! terminal and never enter the loop.

use crate::answer::{build_answer, fail_closed_answer, Answer};
use crate::config::AdaptiveLoopConfig;
use crate::coverage::find_best_season_with_coverage;
use crate::diagnostics::{diagnose_teammate_gap, GapDiagnosis};
use crate::downgrade::{classify, downgrade};
use crate::executor::{ExecutionError, ExecutionErrorKind, Executor, QueryResult, ResultPayload};
use crate::season_stage::adjust_season;
use pitwall_db::{DbError, PitwallDb};
use pitwall_intent::{
    non_empty, FallbackReason, FallbackStep, FallbackTrail, PipelineState, QueryError,
    QueryIntent, QueryKind, StateMachine, StateTransition,
};
use pitwall_resolve::IntentResolver;
use pitwall_rules::{apply_defaults, IntentValidator};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

/// Everything returned for one interpreted request.
#[derive(Debug, Clone, Serialize)]
pub struct InterpretationResponse {
    /// The intent that produced `result` (after any season or kind fallback)
    pub intent: QueryIntent,
    pub result: Option<QueryResult>,
    pub answer: Answer,
    pub fallbacks: FallbackTrail,
    /// Earlier results superseded by a coverage fallback
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub supplemental_results: Vec<QueryResult>,
    /// Machine-readable response for dual teammate comparisons
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical_response: Option<Value>,
    /// Set for fail-closed answers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<QueryError>,
    pub state_history: Vec<StateTransition>,
}

/// Per-request mutable state of the adaptive loop.
struct LoopState {
    machine: StateMachine,
    trail: FallbackTrail,
    supplemental: Vec<QueryResult>,
    coverage_retry_used: bool,
}

pub struct InterpretationBuilder<E: Executor> {
    db: PitwallDb,
    resolver: IntentResolver,
    executor: E,
    config: AdaptiveLoopConfig,
}

impl<E: Executor> InterpretationBuilder<E> {
    pub fn new(db: PitwallDb, executor: E) -> Self {
        Self {
            resolver: IntentResolver::new(db.clone()),
            db,
            executor,
            config: AdaptiveLoopConfig::default(),
        }
    }

    pub fn with_config(mut self, config: AdaptiveLoopConfig) -> Self {
        self.config = config;
        self
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn config(&self) -> &AdaptiveLoopConfig {
        &self.config
    }

    /// Interpret one request.
    ///
    /// `Err` is returned for resolution and validation failures and when the
    /// adaptive loop runs out of iterations. Execution failures otherwise
    /// produce a fail-closed answer with `error` set.
    pub async fn build_interpretation_response(
        &self,
        mut intent: QueryIntent,
        raw_question: Option<&str>,
    ) -> Result<InterpretationResponse, QueryError> {
        if non_empty(&intent.common.raw_query).is_none() {
            intent.common.raw_query = raw_question.map(str::to_string);
        }
        let mut machine = StateMachine::new();

        apply_defaults(&mut intent);
        if let Err(err) = IntentValidator::validate(&intent) {
            info!(kind = %intent.kind(), reason = %err.reason, "Intent rejected");
            advance(&mut machine, PipelineState::TerminalError, Some(err.error.as_str()))?;
            return Err(err);
        }

        advance(&mut machine, PipelineState::Resolving, None)?;
        let intent = match self.resolver.resolve(intent).await {
            Ok(intent) => intent,
            Err(err) => {
                info!(reason = %err.reason, "Intent resolution failed");
                advance(&mut machine, PipelineState::TerminalError, Some(err.error.as_str()))?;
                return Err(err);
            }
        };
        if let Err(err) = IntentValidator::validate_resolved(&intent) {
            info!(kind = %intent.kind(), reason = %err.reason, "Resolved intent rejected");
            advance(&mut machine, PipelineState::TerminalError, Some(err.error.as_str()))?;
            return Err(err);
        }

        advance(&mut machine, PipelineState::Executing, None)?;
        if intent.kind().is_adaptive() {
            self.run_adaptive(intent, machine).await
        } else {
            self.run_direct(intent, machine).await
        }
    }

    async fn run_direct(
        &self,
        intent: QueryIntent,
        mut machine: StateMachine,
    ) -> Result<InterpretationResponse, QueryError> {
        match self.executor.execute(&intent).await {
            Ok(result) => {
                advance(&mut machine, PipelineState::Success, None)?;
                let answer = build_answer(&intent, &result);
                Ok(InterpretationResponse {
                    intent,
                    result: Some(result),
                    answer,
                    fallbacks: FallbackTrail::new(),
                    supplemental_results: Vec::new(),
                    canonical_response: None,
                    error: None,
                    state_history: machine.history().to_vec(),
                })
            }
            Err(err) => {
                warn!(kind = %intent.kind(), code = err.code(), reason = %err.reason, "Execution failed, answering fail-closed");
                advance(&mut machine, PipelineState::Success, Some(err.code()))?;
                let answer = fail_closed_answer(&intent, &err.reason);
                Ok(InterpretationResponse {
                    intent,
                    result: None,
                    answer,
                    fallbacks: FallbackTrail::new(),
                    supplemental_results: Vec::new(),
                    canonical_response: None,
                    error: Some(execution_query_error(&err)),
                    state_history: machine.history().to_vec(),
                })
            }
        }
    }

    async fn run_adaptive(
        &self,
        intent: QueryIntent,
        machine: StateMachine,
    ) -> Result<InterpretationResponse, QueryError> {
        let mut state = LoopState {
            machine,
            trail: FallbackTrail::new(),
            supplemental: Vec::new(),
            coverage_retry_used: false,
        };
        let mut current = intent;

        for iteration in 1..=self.config.max_iterations {
            if iteration > 1 {
                advance(&mut state.machine, PipelineState::Executing, None)?;
            }

            // Stage 1: season adjustment
            current = match self.resolver.resolve_identities(current).await {
                Ok(intent) => intent,
                Err(err) => return self.terminal(state, err),
            };
            let adjusted = match adjust_season(&self.db, current).await {
                Ok(adjusted) => adjusted,
                Err(err) => return self.terminal(state, store_error(err)),
            };
            current = adjusted.intent;
            if let Some(step) = adjusted.step {
                state.trail.push(step);
            }

            // Stage 2: execute, then downgrade on classified failures
            let outcome = self.executor.execute(&current).await;
            let kind = current.kind();
            match outcome {
                Ok(result) => {
                    if !state.coverage_retry_used {
                        let retry = match self.coverage_retry(&current, &result).await {
                            Ok(retry) => retry,
                            Err(err) => return self.terminal(state, err),
                        };
                        if let Some((next, step)) = retry {
                            state.coverage_retry_used = true;
                            state.trail.push(step);
                            state.supplemental.push(result);
                            current = next;
                            advance(
                                &mut state.machine,
                                PipelineState::RetryableError,
                                Some(FallbackReason::LowCoverageSample.as_str()),
                            )?;
                            continue;
                        }
                    }
                    return self.success(state, current, result);
                }
                Err(err) if kind == QueryKind::TeammateGapDualComparison => {
                    warn!(code = err.code(), reason = %err.reason, "Dual comparison failed");
                    let canonical = self
                        .executor
                        .build_dual_comparison_error_response(&current, &err);
                    let answer = fail_closed_answer(&current, &err.reason);
                    let error = execution_query_error(&err);
                    return self.fail_closed(state, current, answer, error, Some(canonical));
                }
                Err(err)
                    if kind == QueryKind::TeammateGapSummarySeason
                        && err.kind == ExecutionErrorKind::InsufficientData =>
                {
                    let (message, diagnosis) = match self.diagnose(&current).await {
                        Ok(found) => found,
                        Err(err) => return self.terminal(state, err),
                    };
                    warn!(code = diagnosis.code(), "Teammate gap unavailable");
                    let answer = fail_closed_answer(&current, &message);
                    let error = QueryError::execution_failed(message)
                        .with_details(json!({ "code": diagnosis.code(), "diagnosis": diagnosis }));
                    return self.fail_closed(state, current, answer, error, None);
                }
                Err(err) => {
                    let next = classify(&err).and_then(|reason| downgrade(&current, reason));
                    match next {
                        Some((next, step)) => {
                            info!(
                                reason = %step.reason,
                                from = %step.from_kind,
                                to = %step.to_kind,
                                iteration,
                                "Downgrading request"
                            );
                            let reason = step.reason;
                            state.trail.push(step);
                            current = next;
                            advance(
                                &mut state.machine,
                                PipelineState::RetryableError,
                                Some(reason.as_str()),
                            )?;
                        }
                        None => {
                            warn!(code = err.code(), reason = %err.reason, fallbacks = state.trail.len(), "No fallback available, answering fail-closed");
                            let answer = fail_closed_answer(&current, &err.reason);
                            let error = execution_query_error(&err);
                            return self.fail_closed(state, current, answer, error, None);
                        }
                    }
                }
            }
        }

        warn!(
            iterations = self.config.max_iterations,
            fallbacks = state.trail.len(),
            "Fallback attempts exceeded"
        );
        let err = QueryError::execution_failed("Fallback attempts exceeded").with_details(json!({
            "iterations": self.config.max_iterations,
            "fallbacks": state.trail,
        }));
        advance(&mut state.machine, PipelineState::TerminalError, Some("fallback_attempts_exceeded"))?;
        Err(err)
    }

    /// Season to retry a low-coverage teammate gap on, if the lookback found one
    /// the pair also shared a constructor in.
    async fn coverage_retry(
        &self,
        intent: &QueryIntent,
        result: &QueryResult,
    ) -> Result<Option<(QueryIntent, FallbackStep)>, QueryError> {
        if intent.kind() != QueryKind::TeammateGapSummarySeason {
            return Ok(None);
        }
        let ResultPayload::TeammateGap(gap) = &result.payload else {
            return Ok(None);
        };
        let coverage = &self.config.coverage;
        if gap.shared_races >= coverage.min_shared_races {
            return Ok(None);
        }

        let metric = non_empty(&intent.common.metric).unwrap_or(gap.metric.as_str());
        let best = find_best_season_with_coverage(
            &self.db,
            &gap.driver_primary_id,
            intent.season(),
            metric,
            coverage,
        )
        .await
        .map_err(store_error)?;
        if !best.used_fallback {
            return Ok(None);
        }

        let mut next = intent.clone();
        next.common.season = best.season;
        let next = match self.resolver.validate_teammate_constraints(next).await {
            Ok(next) => next,
            Err(err) => {
                info!(season = best.season, reason = %err.reason, "Lookback season not usable for this pair");
                return Ok(None);
            }
        };

        let note = format!(
            "Only {} shared races in {}; showing {} ({} shared races) instead.",
            gap.shared_races,
            intent.season(),
            best.season,
            best.shared_races
        );
        let step = FallbackStep::new(
            FallbackReason::LowCoverageSample,
            intent.kind(),
            next.kind(),
            note,
        );
        Ok(Some((next, step)))
    }

    async fn diagnose(&self, intent: &QueryIntent) -> Result<(String, GapDiagnosis), QueryError> {
        let min = self.config.coverage.min_shared_races;
        let season = intent.season();
        let Some((a, b)) = intent.query.slots().pair.and_then(|p| p.ids()) else {
            let diagnosis = GapDiagnosis::Unknown;
            return Ok((diagnosis.message("", "", season, min), diagnosis));
        };
        let metric = non_empty(&intent.common.metric).unwrap_or("teammate_gap_raw");
        let diagnosis = diagnose_teammate_gap(&self.db, season, a, b, metric, min)
            .await
            .map_err(store_error)?;
        Ok((diagnosis.message(a, b, season, min), diagnosis))
    }

    fn success(
        &self,
        mut state: LoopState,
        intent: QueryIntent,
        result: QueryResult,
    ) -> Result<InterpretationResponse, QueryError> {
        advance(&mut state.machine, PipelineState::Success, None)?;
        let answer = build_answer(&intent, &result).with_fallback_notes(&state.trail);
        let canonical_response = (intent.kind() == QueryKind::TeammateGapDualComparison).then(|| {
            self.executor
                .build_dual_comparison_response_from_payload(&intent, &result.payload)
        });
        Ok(InterpretationResponse {
            intent,
            result: Some(result),
            answer,
            fallbacks: state.trail,
            supplemental_results: state.supplemental,
            canonical_response,
            error: None,
            state_history: state.machine.history().to_vec(),
        })
    }

    fn fail_closed(
        &self,
        mut state: LoopState,
        intent: QueryIntent,
        answer: Answer,
        error: QueryError,
        canonical_response: Option<Value>,
    ) -> Result<InterpretationResponse, QueryError> {
        advance(&mut state.machine, PipelineState::Success, Some("fail_closed"))?;
        Ok(InterpretationResponse {
            intent,
            result: None,
            answer,
            fallbacks: state.trail,
            supplemental_results: state.supplemental,
            canonical_response,
            error: Some(error),
            state_history: state.machine.history().to_vec(),
        })
    }

    fn terminal(
        &self,
        mut state: LoopState,
        err: QueryError,
    ) -> Result<InterpretationResponse, QueryError> {
        advance(&mut state.machine, PipelineState::TerminalError, Some(err.error.as_str()))?;
        Err(err)
    }
}

fn advance(
    machine: &mut StateMachine,
    to: PipelineState,
    reason: Option<&str>,
) -> Result<(), QueryError> {
    machine
        .transition_with_reason(to, reason.map(str::to_string))
        .map_err(|err| QueryError::execution_failed(format!("pipeline state error: {err}")))
}

fn store_error(err: DbError) -> QueryError {
    QueryError::execution_failed(format!("store error: {err}"))
}

fn execution_query_error(err: &ExecutionError) -> QueryError {
    let mut details = json!({ "code": err.code() });
    if let Some(extra) = &err.details {
        details["details"] = extra.clone();
    }
    QueryError::execution_failed(err.reason.clone()).with_details(details)
}
