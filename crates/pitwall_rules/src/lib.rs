//! Fail-closed rules for Pitwall query intents.
//!
//! - [`MetricRegistryValidator`]: approved metric/context/normalization table
//! - [`IntentValidator`]: per-kind structural checks plus registry enforcement
//! - [`apply_defaults`]: kind default metric and metric normalization

mod defaults;
mod metric_registry;
mod validator;

pub use defaults::apply_defaults;
pub use metric_registry::{
    MetricEntry, MetricRegistryValidator, MetricScope, RankingBasis, RegistryViolation,
    METRIC_FREE_CONTEXTS, NORMALIZATION_NONE, NORMALIZATION_SESSION_MEDIAN_PERCENT,
};
pub use validator::{
    IntentValidator, ValidationResult, COMPOUND_CONTEXTS, H2H_METRICS, H2H_SCOPES, H2H_SESSIONS,
    MAX_COMPARED, MIN_COMPARED, SESSION_SCOPES, TRACK_TYPES, WEATHER_CONDITIONS,
};
