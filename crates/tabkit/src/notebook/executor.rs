//! Pluggable cell executors and the context shared across a notebook run.

use std::future::Future;

use async_trait::async_trait;
use indexmap::IndexMap;

use crate::dataset::Value;
use crate::error::Result;

use super::cell::CellOutput;

/// State threaded through every cell executed by one runner.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionContext {
    execution_count: u64,
    /// Values executors choose to share between cells.
    pub variables: IndexMap<String, Value>,
}

impl ExecutionContext {
    /// Create a context with the counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cells executed so far.
    pub fn execution_count(&self) -> u64 {
        self.execution_count
    }

    /// Advance the counter and return the new value.
    pub fn next_execution_count(&mut self) -> u64 {
        self.execution_count += 1;
        self.execution_count
    }

    /// Store a variable, replacing any previous value under `name`.
    pub fn set_variable(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.variables.insert(name.into(), value.into());
    }

    /// Look up a variable set by an earlier cell.
    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }
}

/// Turns a code cell's source into outputs.
///
/// Returning `Err` marks the cell as errored; the error's message becomes the
/// cell's single error output.
#[async_trait]
pub trait CellExecutor: Send + Sync {
    /// Execute `source`.
    async fn execute(&self, source: &str, ctx: &mut ExecutionContext) -> Result<Vec<CellOutput>>;

    /// Name used in log events.
    fn name(&self) -> &str {
        "custom"
    }
}

/// Executor that echoes the source back without running anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubExecutor;

#[async_trait]
impl CellExecutor for StubExecutor {
    async fn execute(&self, source: &str, _ctx: &mut ExecutionContext) -> Result<Vec<CellOutput>> {
        Ok(vec![CellOutput::text(source)])
    }

    fn name(&self) -> &str {
        "stub"
    }
}

/// Adapter that turns an async closure into a [`CellExecutor`].
pub struct FnExecutor<F> {
    f: F,
}

/// Wrap an async closure as an executor.
///
/// The closure receives an owned copy of the source and a snapshot of the
/// context; changes it makes to the snapshot are not written back.
pub fn executor_fn<F, Fut>(f: F) -> FnExecutor<F>
where
    F: Fn(String, ExecutionContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<CellOutput>>> + Send + 'static,
{
    FnExecutor { f }
}

#[async_trait]
impl<F, Fut> CellExecutor for FnExecutor<F>
where
    F: Fn(String, ExecutionContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<CellOutput>>> + Send + 'static,
{
    async fn execute(&self, source: &str, ctx: &mut ExecutionContext) -> Result<Vec<CellOutput>> {
        (self.f)(source.to_string(), ctx.clone()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TabkitError;

    #[test]
    fn test_execution_counter_is_monotonic() {
        let mut ctx = ExecutionContext::new();
        assert_eq!(ctx.execution_count(), 0);
        assert_eq!(ctx.next_execution_count(), 1);
        assert_eq!(ctx.next_execution_count(), 2);
        assert_eq!(ctx.execution_count(), 2);
    }

    #[tokio::test]
    async fn test_stub_echoes_source() {
        let mut ctx = ExecutionContext::new();
        let outputs = StubExecutor.execute("print(1)", &mut ctx).await.unwrap();
        assert_eq!(outputs, vec![CellOutput::text("print(1)")]);
        assert_eq!(StubExecutor.name(), "stub");
    }

    #[tokio::test]
    async fn test_closure_executor_sees_snapshot() {
        let executor = executor_fn(|source: String, mut ctx: ExecutionContext| async move {
            ctx.set_variable("seen", source.len());
            if source.contains("raise") {
                return Err(TabkitError::executor("raised"));
            }
            Ok(vec![CellOutput::data(ctx.execution_count())])
        });

        let mut ctx = ExecutionContext::new();
        ctx.next_execution_count();
        let outputs = executor.execute("x = 1", &mut ctx).await.unwrap();
        assert_eq!(outputs, vec![CellOutput::data(1u32)]);
        assert!(ctx.variable("seen").is_none());

        let err = executor.execute("raise", &mut ctx).await.unwrap_err();
        assert_eq!(err.to_string(), "raised");
        assert_eq!(executor.name(), "custom");
    }
}
