//! Notebook cells and their execution state.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::dataset::Value;

/// Kind of notebook cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellType {
    /// Source handed to an executor.
    Code,
    /// Prose; never executed.
    Markdown,
    /// Passed through untouched; never executed.
    Raw,
}

/// Execution state of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellStatus {
    /// Not executed yet.
    #[default]
    Idle,
    /// Executor is running.
    Running,
    /// Executor returned outputs.
    Completed,
    /// Executor failed.
    Error,
    /// Not executable: non-code or blank source.
    Skipped,
}

impl CellStatus {
    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            CellStatus::Idle => "Idle",
            CellStatus::Running => "Running",
            CellStatus::Completed => "Completed",
            CellStatus::Error => "Error",
            CellStatus::Skipped => "Skipped",
        }
    }

    /// Check if the cell has reached a final state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CellStatus::Completed | CellStatus::Error | CellStatus::Skipped
        )
    }
}

/// One output produced by executing a cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outputType", rename_all = "snake_case")]
pub enum CellOutput {
    /// Plain text, such as printed output.
    Text { text: String },
    /// A structured result value.
    Data { data: Value },
    /// Failure message.
    Error { message: String },
}

impl CellOutput {
    /// Text output.
    pub fn text(text: impl Into<String>) -> Self {
        CellOutput::Text { text: text.into() }
    }

    /// Structured data output.
    pub fn data(data: impl Into<Value>) -> Self {
        CellOutput::Data { data: data.into() }
    }

    /// Error output carrying `message`.
    pub fn error(message: impl Into<String>) -> Self {
        CellOutput::Error {
            message: message.into(),
        }
    }

    /// Check if this is an error output.
    pub fn is_error(&self) -> bool {
        matches!(self, CellOutput::Error { .. })
    }
}

/// A notebook cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    /// Unique identifier within the notebook.
    pub id: String,
    #[serde(rename = "type")]
    pub cell_type: CellType,
    pub source: String,
    #[serde(default)]
    pub outputs: Vec<CellOutput>,
    #[serde(default)]
    pub status: CellStatus,
    /// Execution counter value from the most recent run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_count: Option<u64>,
}

impl Cell {
    /// Create an idle cell with a generated ID.
    pub fn new(cell_type: CellType, source: impl Into<String>) -> Self {
        Self {
            id: generate_cell_id(),
            cell_type,
            source: source.into(),
            outputs: Vec::new(),
            status: CellStatus::Idle,
            execution_count: None,
        }
    }

    /// Create a code cell.
    pub fn code(source: impl Into<String>) -> Self {
        Self::new(CellType::Code, source)
    }

    /// Create a markdown cell.
    pub fn markdown(source: impl Into<String>) -> Self {
        Self::new(CellType::Markdown, source)
    }

    /// Create a raw cell.
    pub fn raw(source: impl Into<String>) -> Self {
        Self::new(CellType::Raw, source)
    }

    /// Replace the generated ID.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Check if the runner would hand this cell to an executor.
    pub fn is_executable(&self) -> bool {
        self.cell_type == CellType::Code && !self.source.trim().is_empty()
    }

    /// Clear outputs and record the execution count for a new run.
    pub fn mark_running(&mut self, execution_count: u64) {
        self.status = CellStatus::Running;
        self.outputs.clear();
        self.execution_count = Some(execution_count);
    }

    pub fn mark_completed(&mut self, outputs: Vec<CellOutput>) {
        self.status = CellStatus::Completed;
        self.outputs = outputs;
    }

    /// Fail the cell with a single error output.
    pub fn mark_error(&mut self, message: impl Into<String>) {
        self.status = CellStatus::Error;
        self.outputs = vec![CellOutput::error(message)];
    }

    pub fn mark_skipped(&mut self) {
        self.status = CellStatus::Skipped;
    }
}

/// An ordered collection of cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notebook {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub cells: Vec<Cell>,
}

impl Notebook {
    /// Create an empty notebook with a generated ID.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: generate_notebook_id(),
            name: name.into(),
            cells: Vec::new(),
        }
    }

    /// Append a cell and return its ID.
    pub fn add_cell(&mut self, cell: Cell) -> String {
        let id = cell.id.clone();
        self.cells.push(cell);
        id
    }

    /// Builder-style variant of [`Self::add_cell`].
    pub fn with_cell(mut self, cell: Cell) -> Self {
        self.cells.push(cell);
        self
    }

    /// Find a cell by ID.
    pub fn cell(&self, id: &str) -> Option<&Cell> {
        self.cells.iter().find(|c| c.id == id)
    }

    /// Find a cell by ID for modification.
    pub fn cell_mut(&mut self, id: &str) -> Option<&mut Cell> {
        self.cells.iter_mut().find(|c| c.id == id)
    }
}

fn generate_cell_id() -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(1);
    format!("cell_{:03}", COUNTER.fetch_add(1, Ordering::SeqCst))
}

fn generate_notebook_id() -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(1);
    format!("nb_{:03}", COUNTER.fetch_add(1, Ordering::SeqCst))
}
