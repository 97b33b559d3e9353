//! Engine configuration
//!
//! The 0-5 ordinal scale and the tie epsilon are conventions, not contracts,
//! so they live here rather than as constants in the scoring code.

use crate::error::{MatrixError, Result};
use serde::{Deserialize, Serialize};

/// Criterion tag consulted when breaking near-ties
pub const COMPLEXITY_TAG: &str = "implementation-complexity";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Top of the ordinal rating scale (ratings run 0..=max_rating)
    pub max_rating: u8,
    /// Allowed distance of a domain's weight sum from 1.0
    pub weight_tolerance: f64,
    /// Scores closer than this are treated as tied
    pub tie_epsilon: f64,
    /// How many runner-ups a recommendation carries
    pub runner_up_count: usize,
    /// Tag marking the criterion whose lower rating wins ties
    pub complexity_tag: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_rating: 5,
            weight_tolerance: 1e-6,
            tie_epsilon: 0.01,
            runner_up_count: 2,
            complexity_tag: COMPLEXITY_TAG.to_string(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_rating == 0 {
            return Err(MatrixError::InvalidConfig(
                "max_rating must be at least 1".to_string(),
            ));
        }
        if !self.weight_tolerance.is_finite() || self.weight_tolerance < 0.0 {
            return Err(MatrixError::InvalidConfig(format!(
                "weight_tolerance must be a non-negative number, got {}",
                self.weight_tolerance
            )));
        }
        if !self.tie_epsilon.is_finite() || self.tie_epsilon < 0.0 {
            return Err(MatrixError::InvalidConfig(format!(
                "tie_epsilon must be a non-negative number, got {}",
                self.tie_epsilon
            )));
        }
        Ok(())
    }
}
