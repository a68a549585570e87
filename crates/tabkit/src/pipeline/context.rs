//! Per-step execution context and the run-wide log sink.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::dataset::Value;

/// A message logged by a step through [`StepContext::log`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Name of the step that logged the message.
    pub step: String,
    /// The message.
    pub message: String,
    /// When the message was logged.
    pub timestamp: DateTime<Utc>,
}

/// Collects log entries across all steps of a run.
#[derive(Debug, Clone, Default)]
pub struct LogBuffer {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl LogBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, entry: LogEntry) {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(entry);
    }

    /// Copy of every entry logged so far.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

/// Context handed to each step function.
#[derive(Debug, Clone)]
pub struct StepContext {
    /// Name of the running pipeline.
    pub pipeline_name: String,
    /// Name of the current step.
    pub step_name: String,
    /// Zero-based position of the current step.
    pub step_index: usize,
    /// Number of steps in the pipeline.
    pub total_steps: usize,
    /// Free-form metadata. Fresh for every step; nothing carries over.
    pub metadata: IndexMap<String, Value>,
    logs: LogBuffer,
}

impl StepContext {
    /// Create a context for one step.
    pub fn new(
        pipeline_name: impl Into<String>,
        step_name: impl Into<String>,
        step_index: usize,
        total_steps: usize,
        logs: LogBuffer,
    ) -> Self {
        Self {
            pipeline_name: pipeline_name.into(),
            step_name: step_name.into(),
            step_index,
            total_steps,
            metadata: IndexMap::new(),
            logs,
        }
    }

    /// Record a message for the caller and emit it as a tracing event.
    pub fn log(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!(
            target: "tabkit::pipeline",
            pipeline = %self.pipeline_name,
            step = %self.step_name,
            "{}",
            message
        );
        self.logs.push(LogEntry {
            step: self.step_name.clone(),
            message,
            timestamp: Utc::now(),
        });
    }
}
