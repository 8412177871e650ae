//! Identity resolution for Pitwall query intents.
//!
//! - [`normalize`]: canonical form used for every literal comparison
//! - [`DriverResolver`], [`TrackResolver`]: free text to canonical id
//! - [`TeammateOwnership`]: shared-constructor checks per season
//! - [`IntentResolver`]: applies all of the above to a [`pitwall_intent::QueryIntent`]
//!
//! Matching is exact after normalization. Collisions are broken by a
//! deterministic ranking; an unmatched name is an error, never a guess.

mod driver;
mod error;
mod intent_resolver;
mod normalize;
mod teammates;
mod track;

pub use driver::{DriverCandidate, DriverResolveOptions, DriverResolver, LAP_CONTRIBUTION_CAP};
pub use error::{MatchMode, ResolutionResult, ResolveError, Resolved, TeammateError};
pub use intent_resolver::IntentResolver;
pub use normalize::normalize;
pub use teammates::{normalize_team_id, TeammateCheck, TeammateOwnership, TeammateResult};
pub use track::{static_track_alias, TrackCandidate, TrackResolver};
