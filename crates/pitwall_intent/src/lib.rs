//! Query intent types for the Pitwall analytics pipeline.
//!
//! - [`QueryIntent`]: tagged union of every supported request kind
//! - [`QueryError`], [`FallbackStep`], [`Confidence`]: per-request outcomes
//! - [`StateMachine`]: validating -> resolving -> executing -> terminal

mod kind;
mod outcome;
mod query;
mod state;

pub use kind::{KindParseError, QueryKind};
pub use outcome::{
    Confidence, ConfidenceLevel, CoverageLevel, CoverageStatus, ErrorCode, FallbackReason,
    FallbackStep, FallbackTrail, QueryError, MAX_FALLBACK_YEARS, MIN_SHARED_RACES,
    PREFERRED_SHARED_RACES,
};
pub use query::{
    non_empty, CommonFields, DriverAtTrack, DriverPair, DriverRef, DriverSet, DriverTracks,
    DriverTrend, HeadToHead, HeadToHeadFilters, IdentitySlots, IdentitySlotsMut, PairAtTrack,
    Query, QueryIntent, SeasonComparison, TeammatePair, TrackRef, TrackSet,
};
pub use state::{PipelineState, StateMachine, StateMachineError, StateTransition};

/// Earliest season accepted by validation.
pub const MIN_SEASON: i32 = 1950;
/// Latest season accepted by validation.
pub const MAX_SEASON: i32 = 2100;
