//! Error types for Stagehand Core
//!
//! Provides error handling for:
//! - Scene lookup and recipe validation
//! - Mission patch consistency
//! - Task step updates
//! - Configuration loading

use crate::types::SceneId;

/// Main orchestrator error type
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    /// Scene id is not in the registry
    #[error("unknown scene: {0}")]
    UnknownScene(SceneId),

    /// A scene recipe failed validation
    #[error("invalid recipe: {0}")]
    InvalidRecipe(#[from] RecipeError),

    /// Configuration could not be loaded or is inconsistent
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl StageError {
    /// Whether the orchestrator keeps running normally after this error
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::UnknownScene(_))
    }
}

/// Scene recipe validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecipeError {
    /// A task update names a step the task does not have
    #[error("scene {scene}: task {task} has no step {step}")]
    UnknownStep {
        scene: SceneId,
        task: String,
        step: String,
    },

    /// Task updates must be listed in firing order
    #[error("scene {scene}: task updates are not in delay order")]
    UnorderedUpdates { scene: SceneId },

    /// A scripted task update would move a step backwards
    #[error("scene {scene}: step {step} of task {task} would regress")]
    StepRegression {
        scene: SceneId,
        task: String,
        step: String,
    },

    /// An auto-advance or button points at a scene that is not registered
    #[error("scene {scene}: target {target} is not registered")]
    UnknownTarget { scene: SceneId, target: SceneId },

    /// The same scene id was registered twice
    #[error("scene {0} registered twice")]
    Duplicate(SceneId),
}

/// Mission aggregator inconsistencies
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MissionError {
    /// Progress must stay within 0..=100
    #[error("mission progress {value} is outside 0..=100")]
    ProgressOutOfRange { value: u8 },
}

/// Task tracker errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    /// No task is active
    #[error("no active task")]
    NoActiveTask,

    /// The update targets a task that has been replaced
    #[error("task {target} is not active (active: {active})")]
    TaskMismatch { target: String, active: String },
}

impl TaskError {
    /// Orphaned updates are ignored rather than reported
    #[inline]
    #[must_use]
    pub fn is_orphan(&self) -> bool {
        matches!(self, Self::NoActiveTask | Self::TaskMismatch { .. })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Reading the file failed
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// TOML did not parse
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// Values are inconsistent
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_error_display() {
        let err = StageError::UnknownScene(SceneId::new("S99"));
        assert_eq!(err.to_string(), "unknown scene: S99");
        assert!(err.is_recoverable());
    }

    #[test]
    fn recipe_error_converts_and_is_not_recoverable() {
        let err: StageError = RecipeError::Duplicate(SceneId::new("S1")).into();
        assert!(err.to_string().contains("registered twice"));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn task_error_orphans() {
        assert!(TaskError::NoActiveTask.is_orphan());
        assert!(TaskError::TaskMismatch {
            target: "a".into(),
            active: "b".into()
        }
        .is_orphan());
    }

    #[test]
    fn mission_error_display() {
        let err = MissionError::ProgressOutOfRange { value: 140 };
        assert!(err.to_string().contains("140"));
    }
}
