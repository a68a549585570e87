//! Cell and notebook execution.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::cell::{Cell, CellStatus, Notebook};
use super::executor::{CellExecutor, ExecutionContext, StubExecutor};

/// Options for [`NotebookRunner::execute_notebook`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NotebookRunOptions {
    /// Halt at the first cell that errors.
    pub stop_on_error: bool,
    /// Run only these cells, in this order. `None` runs every cell.
    pub cell_ids: Option<Vec<String>>,
}

impl Default for NotebookRunOptions {
    fn default() -> Self {
        Self {
            stop_on_error: true,
            cell_ids: None,
        }
    }
}

impl NotebookRunOptions {
    /// Options that run every cell and stop at the first error.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether a failed cell halts the remaining cells.
    pub fn with_stop_on_error(mut self, stop_on_error: bool) -> Self {
        self.stop_on_error = stop_on_error;
        self
    }

    /// Restrict the run to `ids`, executed in the given order.
    pub fn with_cell_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cell_ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }
}

/// Summary of a notebook run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotebookRunReport {
    /// Cells visited, whatever their outcome.
    pub executed: usize,
    pub completed: usize,
    pub errored: usize,
    pub skipped: usize,
    /// The run halted at an errored cell before reaching every selected cell.
    pub stopped_early: bool,
}

impl NotebookRunReport {
    /// Check if no cell errored.
    pub fn is_success(&self) -> bool {
        self.errored == 0
    }

    fn record(&mut self, status: CellStatus) {
        self.executed += 1;
        match status {
            CellStatus::Completed => self.completed += 1,
            CellStatus::Error => self.errored += 1,
            CellStatus::Skipped => self.skipped += 1,
            CellStatus::Idle | CellStatus::Running => {}
        }
    }
}

/// Executes cells with one executor and a context shared across runs.
pub struct NotebookRunner {
    executor: Box<dyn CellExecutor>,
    context: ExecutionContext,
}

impl Default for NotebookRunner {
    fn default() -> Self {
        Self::new(StubExecutor)
    }
}

impl NotebookRunner {
    /// Create a runner with a fresh execution context.
    pub fn new(executor: impl CellExecutor + 'static) -> Self {
        Self::with_context(executor, ExecutionContext::new())
    }

    /// Create a runner that continues from an existing context.
    pub fn with_context(executor: impl CellExecutor + 'static, context: ExecutionContext) -> Self {
        Self {
            executor: Box::new(executor),
            context,
        }
    }

    /// The shared execution context.
    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    /// Execute one cell and return its final status.
    ///
    /// Non-code cells and cells with blank source are skipped without
    /// touching the executor or the execution counter.
    pub async fn execute_cell(&mut self, cell: &mut Cell) -> CellStatus {
        if !cell.is_executable() {
            debug!(cell = %cell.id, "Skipping non-executable cell");
            cell.mark_skipped();
            return cell.status;
        }

        let count = self.context.next_execution_count();
        cell.mark_running(count);
        debug!(
            cell = %cell.id,
            execution_count = count,
            executor = self.executor.name(),
            "Executing cell"
        );

        let result = self.executor.execute(&cell.source, &mut self.context).await;
        match result {
            Ok(outputs) => cell.mark_completed(outputs),
            Err(err) => {
                warn!(cell = %cell.id, error = %err, "Cell execution failed");
                cell.mark_error(err.to_string());
            }
        }
        cell.status
    }

    /// Execute the cells of `notebook` sequentially.
    ///
    /// With `cell_ids` set, only those cells run, in the order listed; IDs
    /// not present in the notebook are ignored. With `stop_on_error`, cells
    /// after the first errored one keep their previous state.
    pub async fn execute_notebook(
        &mut self,
        notebook: &mut Notebook,
        options: &NotebookRunOptions,
    ) -> NotebookRunReport {
        let selected: Vec<usize> = match &options.cell_ids {
            Some(ids) => ids
                .iter()
                .filter_map(|id| {
                    let position = notebook.cells.iter().position(|c| &c.id == id);
                    if position.is_none() {
                        warn!(notebook = %notebook.name, cell = %id, "Unknown cell id");
                    }
                    position
                })
                .collect(),
            None => (0..notebook.cells.len()).collect(),
        };

        let mut report = NotebookRunReport::default();
        for (visited, &index) in selected.iter().enumerate() {
            let status = self.execute_cell(&mut notebook.cells[index]).await;
            report.record(status);
            if status == CellStatus::Error && options.stop_on_error {
                report.stopped_early = visited + 1 < selected.len();
                break;
            }
        }

        info!(
            notebook = %notebook.name,
            executed = report.executed,
            completed = report.completed,
            errored = report.errored,
            skipped = report.skipped,
            stopped_early = report.stopped_early,
            "Notebook run finished"
        );
        report
    }
}
