//! Step records tracked by the pipeline runner.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a pipeline step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    /// Reached by the runner but not started.
    Pending,
    /// Step function is executing.
    Running,
    /// Step function succeeded.
    Completed,
    /// Step function failed after all attempts, or was not registered.
    Failed,
    /// Never executed because an earlier step halted the run.
    Skipped,
}

impl StepStatus {
    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            StepStatus::Pending => "Pending",
            StepStatus::Running => "Running",
            StepStatus::Completed => "Completed",
            StepStatus::Failed => "Failed",
            StepStatus::Skipped => "Skipped",
        }
    }

    /// Check if the step has reached a final state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StepStatus::Completed | StepStatus::Failed | StepStatus::Skipped
        )
    }
}

/// Record of one step in a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    /// Unique identifier for this step record.
    pub id: String,
    /// Name of the step function.
    pub name: String,
    /// Current status.
    pub status: StepStatus,
    /// When the step started running.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    /// When the step reached a terminal state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Final error message for failed steps.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Step {
    /// Create a pending step.
    pub fn pending(name: impl Into<String>) -> Self {
        Self {
            id: generate_step_id(),
            name: name.into(),
            status: StepStatus::Pending,
            started_at: None,
            completed_at: None,
            error: None,
        }
    }

    /// Create a skipped step with no timestamps.
    pub fn skipped(name: impl Into<String>) -> Self {
        Self {
            status: StepStatus::Skipped,
            ..Self::pending(name)
        }
    }

    /// Transition to running.
    pub fn start(&mut self) {
        self.status = StepStatus::Running;
        self.started_at = Some(Utc::now());
    }

    /// Transition to completed.
    pub fn complete(&mut self) {
        self.status = StepStatus::Completed;
        self.completed_at = Some(Utc::now());
    }

    /// Transition to failed with the final error message.
    pub fn fail(&mut self, error: impl Into<String>) {
        let now = Utc::now();
        self.status = StepStatus::Failed;
        self.started_at.get_or_insert(now);
        self.completed_at = Some(now);
        self.error = Some(error.into());
    }

    /// Wall-clock duration, if the step has both timestamps.
    pub fn duration_ms(&self) -> Option<i64> {
        match (self.started_at, self.completed_at) {
            (Some(start), Some(end)) => Some((end - start).num_milliseconds()),
            _ => None,
        }
    }
}

/// Generate a unique step ID.
fn generate_step_id() -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(1);
    format!("step_{:03}", COUNTER.fetch_add(1, Ordering::SeqCst))
}
