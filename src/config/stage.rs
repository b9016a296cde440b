//! Stage and pipeline configuration structures.

use serde::{Deserialize, Serialize};

use crate::core::ExecutionMode;

/// Configuration for a single stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageConfig {
    /// Stage name, used in logs and pipeline lookups.
    pub name: String,
    /// Worker threads for pool stages. Ignored by inline stages, which always
    /// have exactly one caller-supplied agent.
    pub workers: usize,
    /// Bounded queue capacity (the backpressure threshold).
    pub capacity: usize,
    /// Execution strategy backing the stage.
    pub mode: ExecutionMode,
}

impl StageConfig {
    /// Configuration for a pool-backed stage.
    pub fn pool(name: impl Into<String>, workers: usize, capacity: usize) -> Self {
        Self {
            name: name.into(),
            workers,
            capacity,
            mode: ExecutionMode::Pool,
        }
    }

    /// Configuration for an inline (caller-driven) stage.
    pub fn inline(name: impl Into<String>, capacity: usize) -> Self {
        Self {
            name: name.into(),
            workers: 1,
            capacity,
            mode: ExecutionMode::Inline,
        }
    }

    /// Validate stage configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("name must not be empty".into());
        }
        if self.mode == ExecutionMode::Pool && self.workers == 0 {
            return Err("workers must be greater than 0 for pool stages".into());
        }
        if self.capacity == 0 {
            return Err("capacity must be greater than 0".into());
        }
        Ok(())
    }
}

impl Default for StageConfig {
    /// A pool stage with one worker per available CPU and the conventional
    /// queue capacity.
    fn default() -> Self {
        Self::pool("stage", num_cpus::get(), 20)
    }
}

/// Root pipeline configuration: an ordered list of stage configurations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Stage configurations in chain order.
    pub stages: Vec<StageConfig>,
}

impl PipelineConfig {
    /// Validate all stages and ensure the pipeline is non-empty with unique
    /// stage names.
    pub fn validate(&self) -> Result<(), String> {
        if self.stages.is_empty() {
            return Err("at least one stage must be defined".into());
        }
        for (i, stage) in self.stages.iter().enumerate() {
            stage
                .validate()
                .map_err(|e| format!("stage `{}` invalid: {e}", stage.name))?;
            if self.stages[..i].iter().any(|s| s.name == stage.name) {
                return Err(format!("duplicate stage name `{}`", stage.name));
            }
        }
        Ok(())
    }

    /// Parse pipeline configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }
}
