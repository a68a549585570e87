//! Notebook cells and their execution.
//!
//! Cells are executed one at a time by a [`NotebookRunner`], which owns a
//! [`CellExecutor`] and an [`ExecutionContext`] shared by every cell it runs.
//! Real code execution is left to caller-supplied executors; the default
//! [`StubExecutor`] only echoes the source.

mod cell;
mod executor;
mod runner;

pub use cell::{Cell, CellOutput, CellStatus, CellType, Notebook};
pub use executor::{CellExecutor, ExecutionContext, FnExecutor, StubExecutor, executor_fn};
pub use runner::{NotebookRunOptions, NotebookRunReport, NotebookRunner};
