//! Configuration models for stages and pipelines.

pub mod stage;

pub use stage::{PipelineConfig, StageConfig};
