//! Tunables for coverage fallback and the adaptive loop.

use pitwall_intent::{MAX_FALLBACK_YEARS, MIN_SHARED_RACES, PREFERRED_SHARED_RACES};
use serde::{Deserialize, Serialize};

/// Shared-race thresholds for teammate-gap coverage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageConfig {
    /// Below this a season is not used as-is
    pub min_shared_races: u32,

    /// Lookback stops early once a season reaches this
    pub preferred_shared_races: u32,

    /// Prior seasons searched at most
    pub max_fallback_years: i32,
}

impl Default for CoverageConfig {
    fn default() -> Self {
        Self {
            min_shared_races: MIN_SHARED_RACES,
            preferred_shared_races: PREFERRED_SHARED_RACES,
            max_fallback_years: MAX_FALLBACK_YEARS,
        }
    }
}

impl CoverageConfig {
    /// Never look back; report the requested season as-is.
    pub fn no_lookback() -> Self {
        Self {
            max_fallback_years: 0,
            ..Self::default()
        }
    }
}

/// Configuration for the adaptive interpretation loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdaptiveLoopConfig {
    /// Executions allowed per request, across all fallback stages
    pub max_iterations: usize,

    pub coverage: CoverageConfig,
}

impl Default for AdaptiveLoopConfig {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            coverage: CoverageConfig::default(),
        }
    }
}

impl AdaptiveLoopConfig {
    /// Execute once; every failure is answered fail-closed.
    pub fn single_attempt() -> Self {
        Self {
            max_iterations: 1,
            coverage: CoverageConfig::no_lookback(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_thresholds() {
        let config = AdaptiveLoopConfig::default();
        assert_eq!(config.max_iterations, 5);
        assert_eq!(config.coverage.min_shared_races, 4);
        assert_eq!(config.coverage.preferred_shared_races, 8);
        assert_eq!(config.coverage.max_fallback_years, 3);
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = AdaptiveLoopConfig::single_attempt();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: AdaptiveLoopConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
