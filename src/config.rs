//! Engine configuration
//!
//! Tunable parameters that are not reference data: aggregation weights, the
//! recommendation cap and the chart's age range.

use serde::{Deserialize, Serialize};

use crate::error::ImpactError;
use crate::types::{Dimension, MAX_CHILD_AGE, MIN_CHILD_AGE};

/// Default number of recommendations returned
pub const DEFAULT_RECOMMENDATION_CAP: usize = 4;

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Per-dimension weights of the aggregate score (must sum to 1)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DimensionWeights {
    pub sleep: f64,
    pub physical: f64,
    pub attention: f64,
    pub academic: f64,
    pub family: f64,
    pub social: f64,
}

impl Default for DimensionWeights {
    fn default() -> Self {
        let equal = 1.0 / 6.0;
        Self {
            sleep: equal,
            physical: equal,
            attention: equal,
            academic: equal,
            family: equal,
            social: equal,
        }
    }
}

impl DimensionWeights {
    pub fn weight(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::Sleep => self.sleep,
            Dimension::Physical => self.physical,
            Dimension::Attention => self.attention,
            Dimension::Academic => self.academic,
            Dimension::Family => self.family,
            Dimension::Social => self.social,
        }
    }

    pub fn sum(&self) -> f64 {
        Dimension::PRIORITY.iter().map(|d| self.weight(*d)).sum()
    }
}

/// Age range covered by the comparison chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrajectoryConfig {
    pub min_age: u8,
    pub max_age: u8,
}

impl Default for TrajectoryConfig {
    fn default() -> Self {
        Self {
            min_age: MIN_CHILD_AGE,
            max_age: MAX_CHILD_AGE,
        }
    }
}

/// Configuration for the impact engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of recommendations (one per dimension at most)
    pub recommendation_cap: usize,
    pub trajectory: TrajectoryConfig,
    pub weights: DimensionWeights,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            recommendation_cap: DEFAULT_RECOMMENDATION_CAP,
            trajectory: TrajectoryConfig::default(),
            weights: DimensionWeights::default(),
        }
    }
}

impl EngineConfig {
    /// Load a configuration from JSON; omitted keys keep their defaults
    pub fn from_json(json: &str) -> Result<Self, ImpactError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn validate(&self) -> Result<(), ImpactError> {
        if self.recommendation_cap == 0 || self.recommendation_cap > Dimension::PRIORITY.len() {
            return Err(ImpactError::InvalidConfig(format!(
                "recommendation_cap must be between 1 and {}, got {}",
                Dimension::PRIORITY.len(),
                self.recommendation_cap
            )));
        }

        let TrajectoryConfig { min_age, max_age } = self.trajectory;
        // The child's own age must always land on the chart
        if min_age > MIN_CHILD_AGE || max_age < MAX_CHILD_AGE {
            return Err(ImpactError::InvalidConfig(format!(
                "trajectory range {min_age}-{max_age} must cover ages {MIN_CHILD_AGE}-{MAX_CHILD_AGE}"
            )));
        }

        if let Some(dimension) = Dimension::PRIORITY
            .iter()
            .find(|d| !self.weights.weight(**d).is_finite() || self.weights.weight(**d) < 0.0)
        {
            return Err(ImpactError::InvalidConfig(format!(
                "weight for {} must be a non-negative number",
                dimension.as_str()
            )));
        }

        let sum = self.weights.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ImpactError::InvalidConfig(format!(
                "dimension weights must sum to 1, got {sum}"
            )));
        }

        Ok(())
    }
}
