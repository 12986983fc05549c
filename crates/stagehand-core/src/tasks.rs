//! Task tracker
//!
//! Models the single background job shown beside the conversation. Starting a task
//! replaces whatever was there. Updates name the task they target, so an update
//! that arrives after its task was replaced is an orphan and is ignored.
//!
//! Step statuses only move forward: `pending → running → completed`.

use crate::error::TaskError;
use serde::{Deserialize, Serialize};
use stagehand_kernel::Millis;

/// Status of a single step. Ordered by progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Pending,
    Running,
    Completed,
}

/// One stage of a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStep {
    pub id: String,
    pub text: String,
    pub status: StepStatus,
}

/// Simulated background job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentTask {
    pub id: String,
    pub title: String,
    /// Free-text overall status
    pub status: String,
    pub steps: Vec<TaskStep>,
    #[serde(rename = "startTime")]
    pub start_time: Millis,
}

impl AgentTask {
    /// Task with no steps yet
    #[must_use]
    pub fn new(id: &str, title: &str, status: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            status: status.to_string(),
            steps: Vec::new(),
            start_time: 0,
        }
    }

    /// Append a step
    #[must_use]
    pub fn step(mut self, id: &str, text: &str, status: StepStatus) -> Self {
        self.steps.push(TaskStep {
            id: id.to_string(),
            text: text.to_string(),
            status,
        });
        self
    }

    /// Look up a step
    #[must_use]
    pub fn find_step(&self, id: &str) -> Option<&TaskStep> {
        self.steps.iter().find(|step| step.id == id)
    }

    /// Whether every step is completed
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.steps
            .iter()
            .all(|step| step.status == StepStatus::Completed)
    }
}

/// Scheduled change to the active task
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<(String, StepStatus)>,
    #[serde(default)]
    pub complete_all: bool,
}

impl TaskPatch {
    /// Empty patch
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Patch that marks every step completed and sets the overall status
    #[must_use]
    pub fn complete(status: &str) -> Self {
        Self::new().status(status).complete_all()
    }

    #[must_use]
    pub fn status(mut self, status: &str) -> Self {
        self.status = Some(status.to_string());
        self
    }

    #[must_use]
    pub fn step(mut self, id: &str, status: StepStatus) -> Self {
        self.steps.push((id.to_string(), status));
        self
    }

    #[must_use]
    pub fn complete_all(mut self) -> Self {
        self.complete_all = true;
        self
    }

    /// Status `step` would have after this patch, given its current status
    #[must_use]
    pub fn resulting_status(&self, step: &str, current: StepStatus) -> StepStatus {
        if self.complete_all {
            return StepStatus::Completed;
        }
        self.steps
            .iter()
            .rev()
            .find(|(id, _)| id == step)
            .map_or(current, |(_, status)| *status)
    }
}

/// A step update that was refused because it would move backwards
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRegression {
    pub step: String,
    pub from: StepStatus,
    pub to: StepStatus,
}

/// What a successful patch did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchReport {
    /// Steps whose status changed
    pub changed: usize,
    /// Refused backward moves
    pub regressions: Vec<StepRegression>,
    /// Step ids the task does not have
    pub unknown_steps: Vec<String>,
}

/// Owner of the single active task
#[derive(Debug, Clone, Default)]
pub struct TaskTracker {
    active: Option<AgentTask>,
    epoch: u64,
    orphaned: u64,
    regressions: u64,
}

impl TaskTracker {
    /// Tracker with no task
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a task, returning the one it replaced
    pub fn start(&mut self, task: AgentTask) -> Option<AgentTask> {
        self.epoch += 1;
        tracing::debug!(task = %task.id, steps = task.steps.len(), epoch = self.epoch, "task started");
        self.active.replace(task)
    }

    /// Apply a patch to the task named `task_id`
    ///
    /// Backward step moves are refused individually; the rest of the patch applies.
    ///
    /// # Errors
    /// `TaskError::NoActiveTask` or `TaskError::TaskMismatch` for orphaned updates.
    pub fn apply(&mut self, task_id: &str, patch: &TaskPatch) -> Result<PatchReport, TaskError> {
        let task = match self.active.as_mut() {
            None => {
                self.orphaned += 1;
                return Err(TaskError::NoActiveTask);
            }
            Some(task) if task.id != task_id => {
                self.orphaned += 1;
                return Err(TaskError::TaskMismatch {
                    target: task_id.to_string(),
                    active: task.id.clone(),
                });
            }
            Some(task) => task,
        };

        let mut report = PatchReport::default();

        for (id, _) in &patch.steps {
            if task.find_step(id).is_none() {
                report.unknown_steps.push(id.clone());
            }
        }

        for step in &mut task.steps {
            let next = patch.resulting_status(&step.id, step.status);
            if next < step.status {
                report.regressions.push(StepRegression {
                    step: step.id.clone(),
                    from: step.status,
                    to: next,
                });
            } else if next != step.status {
                step.status = next;
                report.changed += 1;
            }
        }

        if let Some(status) = &patch.status {
            task.status.clone_from(status);
        }

        self.regressions += report.regressions.len() as u64;
        Ok(report)
    }

    /// The active task
    #[inline]
    #[must_use]
    pub fn active(&self) -> Option<&AgentTask> {
        self.active.as_ref()
    }

    /// Number of tasks started so far; distinguishes re-runs of the same task id
    #[inline]
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Updates ignored because their task was gone
    #[inline]
    #[must_use]
    pub fn orphaned(&self) -> u64 {
        self.orphaned
    }

    /// Step updates refused because they moved backwards
    #[inline]
    #[must_use]
    pub fn regressions(&self) -> u64 {
        self.regressions
    }
}
