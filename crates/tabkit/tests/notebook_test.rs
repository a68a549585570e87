//! Integration tests for notebook execution.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use tabkit::notebook::{
    Cell, CellExecutor, CellOutput, CellStatus, ExecutionContext, Notebook, NotebookRunOptions,
    NotebookRunner,
};
use tabkit::{Result, TabkitError, Value};

/// Executor that counts invocations and fails on sources containing "error".
///
/// It also records each cell's source length in the shared context.
#[derive(Clone, Default)]
struct SpyExecutor {
    calls: Arc<AtomicUsize>,
}

impl SpyExecutor {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CellExecutor for SpyExecutor {
    async fn execute(&self, source: &str, ctx: &mut ExecutionContext) -> Result<Vec<CellOutput>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        ctx.set_variable("last_len", source.len());
        if source.contains("error") {
            return Err(TabkitError::executor(format!("cell raised: {}", source)));
        }
        Ok(vec![CellOutput::text(source.to_uppercase())])
    }

    fn name(&self) -> &str {
        "spy"
    }
}

fn notebook() -> Notebook {
    Notebook::new("analysis")
        .with_cell(Cell::code("load").with_id("c1"))
        .with_cell(Cell::markdown("## Notes").with_id("c2"))
        .with_cell(Cell::code("error here").with_id("c3"))
        .with_cell(Cell::code("plot").with_id("c4"))
}

// =============================================================================
// Single Cell Tests
// =============================================================================

#[tokio::test]
async fn test_empty_code_cell_skips_executor() {
    let spy = SpyExecutor::default();
    let mut runner = NotebookRunner::new(spy.clone());

    let mut empty = Cell::code("");
    let mut blank = Cell::code("   \n  ");
    assert_eq!(runner.execute_cell(&mut empty).await, CellStatus::Skipped);
    assert_eq!(runner.execute_cell(&mut blank).await, CellStatus::Skipped);

    assert_eq!(spy.calls(), 0);
    assert_eq!(runner.context().execution_count(), 0);
}

#[tokio::test]
async fn test_non_code_cells_skip_executor() {
    let spy = SpyExecutor::default();
    let mut runner = NotebookRunner::new(spy.clone());

    let mut markdown = Cell::markdown("# Title");
    let mut raw = Cell::raw("raw text");
    assert_eq!(runner.execute_cell(&mut markdown).await, CellStatus::Skipped);
    assert_eq!(runner.execute_cell(&mut raw).await, CellStatus::Skipped);
    assert_eq!(spy.calls(), 0);
}

#[tokio::test]
async fn test_rerun_replaces_outputs() {
    let mut runner = NotebookRunner::new(SpyExecutor::default());
    let mut cell = Cell::code("x");

    runner.execute_cell(&mut cell).await;
    runner.execute_cell(&mut cell).await;

    assert_eq!(cell.status, CellStatus::Completed);
    assert_eq!(cell.outputs, vec![CellOutput::text("X")]);
    assert_eq!(cell.execution_count, Some(2));
}

#[tokio::test]
async fn test_executor_mutates_shared_context() {
    let mut runner = NotebookRunner::new(SpyExecutor::default());
    let mut cell = Cell::code("four");
    runner.execute_cell(&mut cell).await;
    assert_eq!(runner.context().variable("last_len"), Some(&Value::from(4)));
}

// =============================================================================
// Notebook Run Tests
// =============================================================================

#[tokio::test]
async fn test_stop_on_error_leaves_later_cells_idle() {
    let spy = SpyExecutor::default();
    let mut runner = NotebookRunner::new(spy.clone());
    let mut nb = notebook();

    let report = runner
        .execute_notebook(&mut nb, &NotebookRunOptions::default())
        .await;

    assert_eq!(report.executed, 3);
    assert_eq!(report.completed, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.errored, 1);
    assert!(report.stopped_early);
    assert!(!report.is_success());

    let c3 = nb.cell("c3").unwrap();
    assert_eq!(c3.status, CellStatus::Error);
    assert_eq!(c3.outputs, vec![CellOutput::error("cell raised: error here")]);
    assert_eq!(nb.cell("c4").unwrap().status, CellStatus::Idle);
    assert_eq!(spy.calls(), 2);
}

#[tokio::test]
async fn test_without_stop_on_error_runs_every_cell() {
    let spy = SpyExecutor::default();
    let mut runner = NotebookRunner::new(spy.clone());
    let mut nb = notebook();

    let options = NotebookRunOptions::new().with_stop_on_error(false);
    let report = runner.execute_notebook(&mut nb, &options).await;

    assert_eq!(report.executed, 4);
    assert_eq!(report.completed, 2);
    assert_eq!(report.errored, 1);
    assert!(!report.stopped_early);
    assert_eq!(nb.cell("c4").unwrap().status, CellStatus::Completed);
    assert_eq!(nb.cell("c4").unwrap().execution_count, Some(3));
}

#[tokio::test]
async fn test_subset_runs_in_given_order() {
    let mut runner = NotebookRunner::new(SpyExecutor::default());
    let mut nb = notebook();

    let options = NotebookRunOptions::new().with_cell_ids(["c4", "missing", "c1"]);
    let report = runner.execute_notebook(&mut nb, &options).await;

    assert_eq!(report.executed, 2);
    assert_eq!(nb.cell("c4").unwrap().execution_count, Some(1));
    assert_eq!(nb.cell("c1").unwrap().execution_count, Some(2));
    assert_eq!(nb.cell("c3").unwrap().status, CellStatus::Idle);
    let ids: Vec<&str> = nb.cells.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["c1", "c2", "c3", "c4"]);
}

#[tokio::test]
async fn test_counter_continues_across_runs() {
    let mut runner = NotebookRunner::new(SpyExecutor::default());
    let mut first = Notebook::new("a").with_cell(Cell::code("one"));
    let mut second = Notebook::new("b").with_cell(Cell::code("two"));

    runner
        .execute_notebook(&mut first, &NotebookRunOptions::default())
        .await;
    runner
        .execute_notebook(&mut second, &NotebookRunOptions::default())
        .await;

    assert_eq!(second.cells[0].execution_count, Some(2));
    assert_eq!(runner.context().execution_count(), 2);
}

#[test]
fn test_run_options_from_json() {
    let options: NotebookRunOptions =
        serde_json::from_str(r#"{"cellIds": ["c1"]}"#).unwrap();
    assert!(options.stop_on_error);
    assert_eq!(options.cell_ids, Some(vec!["c1".to_string()]));
}
