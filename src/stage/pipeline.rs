//! Owning collection for a chain of stages.

use std::sync::Arc;

use crate::config::{PipelineConfig, StageConfig};
use crate::core::{ExecutionMode, StageError};

use super::{chain, Stage};

/// A chain of stages with shared lifetime management.
///
/// The pipeline owns every stage handle for the duration of a run, so
/// forwarding links never dangle. Stages are chained in the order given:
/// tokens pushed into the pipeline enter the first stage and exit after the
/// last.
///
/// Completion is per stage: call [`set_task_count`](Pipeline::set_task_count)
/// once with the token total (it fans out to every stage), push the tokens,
/// then call [`wait`](Pipeline::wait). Inline-backed stages make no progress
/// on their own; drive them with [`Stage::run`] on the thread of your
/// choosing, or [`run_cooperative`](Pipeline::run_cooperative) to drive them
/// all on the current thread.
pub struct Pipeline<T: Clone + Send + 'static> {
    stages: Vec<Arc<Stage<T>>>,
}

impl<T: Clone + Send + 'static> Pipeline<T> {
    /// Chains the given stages in order and takes ownership of their handles.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::EmptyPipeline`] for an empty stage list and
    /// [`StageError::DuplicateStage`] when two stages share a name.
    pub fn new(stages: Vec<Arc<Stage<T>>>) -> Result<Self, StageError> {
        if stages.is_empty() {
            return Err(StageError::EmptyPipeline);
        }
        for (i, stage) in stages.iter().enumerate() {
            if stages[..i].iter().any(|s| s.name() == stage.name()) {
                return Err(StageError::DuplicateStage(stage.name().to_string()));
            }
        }
        for pair in stages.windows(2) {
            chain(&pair[0], &pair[1]);
        }
        Ok(Self { stages })
    }

    /// Sets the expected token total on every stage.
    pub fn set_task_count(&self, count: usize) {
        for stage in &self.stages {
            stage.set_task_count(count);
        }
    }

    /// Pushes a token into the first stage. Blocks under backpressure when
    /// the first stage's queue is full.
    pub fn push(&self, token: T) {
        self.stages[0].push(token);
    }

    /// Blocks until every pool-backed stage's completion count reaches zero.
    ///
    /// Inline-backed stages are skipped: their progress depends on a caller
    /// invoking `run`, so waiting on them here could deadlock the thread
    /// that was meant to drive them.
    pub fn wait(&self) {
        for stage in &self.stages {
            if stage.mode() == ExecutionMode::Pool {
                stage.wait();
            }
        }
    }

    /// Drives every inline-backed stage to completion on the current thread,
    /// in chain order.
    pub fn run_cooperative(&self) {
        for stage in &self.stages {
            if stage.mode() == ExecutionMode::Inline {
                stage.run();
            }
        }
    }

    /// Total transform panics across all stages.
    #[must_use]
    pub fn failures(&self) -> u64 {
        self.stages.iter().map(|s| s.failures()).sum()
    }

    /// The stages in chain order.
    #[must_use]
    pub fn stages(&self) -> &[Arc<Stage<T>>] {
        &self.stages
    }

    /// Looks up a stage by name.
    #[must_use]
    pub fn stage(&self, name: &str) -> Option<&Arc<Stage<T>>> {
        self.stages.iter().find(|s| s.name() == name)
    }
}

type Transform<T> = Box<dyn Fn(T) + Send + Sync + 'static>;

/// Builds a [`Pipeline`] from per-stage configurations and transforms.
///
/// # Examples
///
/// ```
/// use conveyor::config::StageConfig;
/// use conveyor::stage::PipelineBuilder;
/// use std::sync::atomic::{AtomicI64, Ordering};
/// use std::sync::Arc;
///
/// let data: Arc<Vec<AtomicI64>> = Arc::new((0..4).map(AtomicI64::new).collect());
///
/// let d = Arc::clone(&data);
/// let e = Arc::clone(&data);
/// let pipeline = PipelineBuilder::new()
///     .stage(StageConfig::pool("double", 2, 8), move |i: usize| {
///         let v = d[i].load(Ordering::SeqCst);
///         d[i].store(v * 2, Ordering::SeqCst);
///     })
///     .stage(StageConfig::pool("add-one", 2, 8), move |i: usize| {
///         e[i].fetch_add(1, Ordering::SeqCst);
///     })
///     .build()
///     .unwrap();
///
/// pipeline.set_task_count(4);
/// for i in 0..4 {
///     pipeline.push(i);
/// }
/// pipeline.wait();
/// assert_eq!(data[3].load(Ordering::SeqCst), 7);
/// ```
pub struct PipelineBuilder<T: Clone + Send + 'static> {
    stages: Vec<(StageConfig, Transform<T>)>,
}

impl<T: Clone + Send + 'static> PipelineBuilder<T> {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Appends a stage; chain order is append order.
    #[must_use]
    pub fn stage(
        mut self,
        config: StageConfig,
        transform: impl Fn(T) + Send + Sync + 'static,
    ) -> Self {
        self.stages.push((config, Box::new(transform)));
        self
    }

    /// Validates the accumulated configuration and builds the pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::InvalidConfig`] when any stage configuration is
    /// invalid, the builder is empty, or names collide.
    pub fn build(self) -> Result<Pipeline<T>, StageError> {
        let config = PipelineConfig {
            stages: self.stages.iter().map(|(cfg, _)| cfg.clone()).collect(),
        };
        config.validate().map_err(StageError::InvalidConfig)?;

        let stages = self
            .stages
            .into_iter()
            .map(|(cfg, transform)| Stage::from_config(&cfg, transform))
            .collect::<Result<Vec<_>, _>>()?;
        Pipeline::new(stages)
    }
}

impl<T: Clone + Send + 'static> Default for PipelineBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}
