//! Interpretation pipeline states and transitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// States a single request moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Validating,
    Resolving,
    Executing,
    /// Terminal: an answer was produced (possibly fail-closed)
    Success,
    /// Execution failed in a way the adaptive loop may degrade around
    RetryableError,
    /// Terminal: the request ends with a `QueryError`
    TerminalError,
}

impl PipelineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineState::Validating => "validating",
            PipelineState::Resolving => "resolving",
            PipelineState::Executing => "executing",
            PipelineState::Success => "success",
            PipelineState::RetryableError => "retryable_error",
            PipelineState::TerminalError => "terminal_error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Success | PipelineState::TerminalError)
    }

    pub fn valid_transitions(&self) -> &'static [PipelineState] {
        match self {
            PipelineState::Validating => &[PipelineState::Resolving, PipelineState::TerminalError],
            PipelineState::Resolving => &[PipelineState::Executing, PipelineState::TerminalError],
            PipelineState::Executing => &[
                PipelineState::Success,
                PipelineState::RetryableError,
                PipelineState::TerminalError,
            ],
            PipelineState::RetryableError => &[
                PipelineState::Executing,
                PipelineState::Success,
                PipelineState::TerminalError,
            ],
            PipelineState::Success | PipelineState::TerminalError => &[],
        }
    }

    pub fn can_transition_to(&self, target: PipelineState) -> bool {
        self.valid_transitions().contains(&target)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A recorded state transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition {
    pub from: PipelineState,
    pub to: PipelineState,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Error)]
pub enum StateMachineError {
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition {
        from: PipelineState,
        to: PipelineState,
    },

    #[error("state is terminal: {0}")]
    TerminalState(PipelineState),
}

/// Tracks one request's progress through the pipeline.
#[derive(Debug)]
pub struct StateMachine {
    current: PipelineState,
    history: Vec<StateTransition>,
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            current: PipelineState::Validating,
            history: Vec::new(),
        }
    }

    pub fn current(&self) -> PipelineState {
        self.current
    }

    pub fn history(&self) -> &[StateTransition] {
        &self.history
    }

    /// Number of times the machine has entered `Executing`.
    pub fn execution_count(&self) -> usize {
        self.history
            .iter()
            .filter(|t| t.to == PipelineState::Executing)
            .count()
    }

    pub fn transition(&mut self, to: PipelineState) -> Result<(), StateMachineError> {
        self.transition_with_reason(to, None)
    }

    pub fn transition_with_reason(
        &mut self,
        to: PipelineState,
        reason: Option<String>,
    ) -> Result<(), StateMachineError> {
        if self.current.is_terminal() {
            return Err(StateMachineError::TerminalState(self.current));
        }
        if !self.current.can_transition_to(to) {
            return Err(StateMachineError::InvalidTransition {
                from: self.current,
                to,
            });
        }

        self.history.push(StateTransition {
            from: self.current,
            to,
            timestamp: Utc::now(),
            reason,
        });
        self.current = to;
        Ok(())
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}
