//! Search configuration and presets.

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Maximum operations per program
    pub max_steps: usize,

    /// Search budget in trials
    pub max_trials: u64,

    /// Seed for reproducible runs; drawn at random when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub random_seed: Option<u64>,

    /// Probability of picking a generator when consumers are also applicable
    pub generator_bias: f64,

    /// Worker threads (1 = sequential)
    pub workers: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_steps: 50,
            max_trials: 500,
            random_seed: None,
            generator_bias: 0.5,
            workers: 1,
        }
    }
}

impl SearchConfig {
    /// Small programs, small budget.
    pub fn quick() -> Self {
        Self {
            max_steps: 20,
            max_trials: 100,
            ..Self::default()
        }
    }

    /// Long programs and a large budget spread across workers.
    pub fn thorough() -> Self {
        Self {
            max_steps: 200,
            max_trials: 10_000,
            workers: 4,
            ..Self::default()
        }
    }

    /// Get preset by name
    pub fn for_preset(name: &str) -> Self {
        match name {
            "quick" => Self::quick(),
            "thorough" => Self::thorough(),
            _ => Self::default(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    pub fn with_max_trials(mut self, max_trials: u64) -> Self {
        self.max_trials = max_trials;
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_generator_bias(mut self, bias: f64) -> Self {
        self.generator_bias = bias;
        self
    }

    /// Load from YAML; missing fields take their defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigurationError> {
        let config: Self =
            serde_yaml::from_str(yaml).map_err(|e| ConfigurationError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.max_steps == 0 {
            return Err(ConfigurationError::InvalidValue(
                "max_steps must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.generator_bias) {
            return Err(ConfigurationError::InvalidValue(format!(
                "generator_bias must be within [0, 1], got {}",
                self.generator_bias
            )));
        }
        if self.workers == 0 {
            return Err(ConfigurationError::InvalidValue(
                "workers must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
