//! Step functions and the registry the runner resolves them from.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;

use super::context::StepContext;

/// An asynchronous unit of work in a pipeline.
///
/// Receives the current pipeline value and returns the value threaded to the
/// next step. Returning `Err` marks the attempt as failed.
#[async_trait]
pub trait StepFunction<T: Send + 'static>: Send + Sync {
    /// Run the step on `input`.
    async fn run(&self, input: T, ctx: &StepContext) -> Result<T>;
}

/// Adapter that turns an async closure into a [`StepFunction`].
pub struct FnStep<F> {
    f: F,
}

/// Wrap an async closure as a step function.
///
/// ```
/// use tabkit::pipeline::step_fn;
///
/// let increment = step_fn(|n: i64, _ctx| async move { Ok(n + 1) });
/// # let _ = increment;
/// ```
pub fn step_fn<T, F, Fut>(f: F) -> FnStep<F>
where
    T: Send + 'static,
    F: Fn(T, StepContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    FnStep { f }
}

#[async_trait]
impl<T, F, Fut> StepFunction<T> for FnStep<F>
where
    T: Send + 'static,
    F: Fn(T, StepContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    async fn run(&self, input: T, ctx: &StepContext) -> Result<T> {
        (self.f)(input, ctx.clone()).await
    }
}

/// Named step functions available to a pipeline run.
pub struct StepRegistry<T> {
    steps: HashMap<String, Arc<dyn StepFunction<T>>>,
}

impl<T: Send + 'static> StepRegistry<T> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            steps: HashMap::new(),
        }
    }

    /// Register a step function under `name`, replacing any previous one.
    pub fn register(&mut self, name: impl Into<String>, step: impl StepFunction<T> + 'static) -> &mut Self {
        self.steps.insert(name.into(), Arc::new(step));
        self
    }

    /// Builder-style variant of [`Self::register`].
    pub fn with_step(mut self, name: impl Into<String>, step: impl StepFunction<T> + 'static) -> Self {
        self.register(name, step);
        self
    }

    /// Look up a step function.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn StepFunction<T>>> {
        self.steps.get(name)
    }

    /// Check whether a step is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.steps.contains_key(name)
    }

    /// Registered step names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.steps.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl<T: Send + 'static> Default for StepRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for StepRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.steps.keys().collect();
        names.sort();
        f.debug_struct("StepRegistry").field("steps", &names).finish()
    }
}
