//! Walkthrough store
//!
//! The single mutable state of an orchestrator. It changes only through the named
//! operations below or by applying an [`Effect`] popped from the timeline; nothing
//! else holds a mutable reference to it.

use crate::canvas::{CanvasPublisher, CanvasState};
use crate::expert::ExpertOutput;
use crate::mission::{MissionAggregator, MissionPatch, MissionState};
use crate::tasks::{AgentTask, TaskPatch, TaskTracker};
use crate::types::{AgentRole, ChatMessage, MessageId, SceneId, Utterance};
use serde::{Deserialize, Serialize};
use stagehand_kernel::{Millis, Owner};

/// Scheduled work, applied when its timeline entry comes due
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Switch the typing indicator on
    BeginTyping { label: String },
    /// Append a message and clear the indicator
    Deliver(Box<Utterance>),
    /// Patch the task named `task_id`
    UpdateTask { task_id: String, patch: TaskPatch },
    /// Replace the canvas
    Publish(Option<Box<CanvasState>>),
    /// Enter another scene
    AdvanceTo(SceneId),
    /// Prepend an expert-desk deliverable
    RecordOutput(ExpertOutput),
}

impl Effect {
    /// Short name for logs
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BeginTyping { .. } => "begin_typing",
            Self::Deliver(_) => "deliver",
            Self::UpdateTask { .. } => "update_task",
            Self::Publish(_) => "publish",
            Self::AdvanceTo(_) => "advance_to",
            Self::RecordOutput(_) => "record_output",
        }
    }
}

/// Typing indicator and the timeline owner that switched it on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypingIndicator {
    pub label: String,
    pub owner: Owner,
}

/// Externally observable state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub scene_id: Option<SceneId>,
    pub messages: Vec<ChatMessage>,
    pub canvas: Option<CanvasState>,
    pub mission: MissionState,
    pub task: Option<AgentTask>,
    pub is_typing: bool,
    pub typing_label: Option<String>,
}

impl Snapshot {
    /// Snapshot of an orchestrator that has not entered any scene
    #[must_use]
    pub fn empty() -> Self {
        Self {
            scene_id: None,
            messages: Vec::new(),
            canvas: None,
            mission: MissionState::initial(),
            task: None,
            is_typing: false,
            typing_label: None,
        }
    }

    /// Last message in the conversation
    #[must_use]
    pub fn last_message(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }
}

/// Single-writer state of one walkthrough
#[derive(Debug, Default)]
pub struct Store {
    scene: Option<SceneId>,
    messages: Vec<ChatMessage>,
    next_message: u64,
    canvas: CanvasPublisher,
    mission: MissionAggregator,
    tasks: TaskTracker,
    typing: Option<TypingIndicator>,
    outputs: Vec<ExpertOutput>,
}

impl Store {
    /// Empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- named operations ---

    /// Record the current scene
    pub fn set_scene(&mut self, scene: SceneId) {
        self.scene = Some(scene);
    }

    /// Merge a mission patch; an out-of-range progress is logged and skipped
    pub fn patch_mission(&mut self, patch: &MissionPatch) {
        if let Err(err) = self.mission.patch(patch) {
            tracing::warn!(scene = ?self.scene, error = %err, "mission inconsistency");
        }
    }

    /// Replace the canvas
    pub fn publish_canvas(&mut self, canvas: Option<CanvasState>) {
        self.canvas.publish(canvas);
    }

    /// Install a task stamped with `now`
    pub fn start_task(&mut self, mut task: AgentTask, now: Millis) {
        task.start_time = now;
        self.tasks.start(task);
    }

    /// Patch the task named `task_id`; orphans and regressions are logged and skipped
    pub fn update_task(&mut self, task_id: &str, patch: &TaskPatch) {
        match self.tasks.apply(task_id, patch) {
            Ok(report) => {
                for regression in &report.regressions {
                    tracing::warn!(
                        task = task_id,
                        step = %regression.step,
                        from = ?regression.from,
                        to = ?regression.to,
                        "refused step regression"
                    );
                }
                for step in &report.unknown_steps {
                    tracing::warn!(task = task_id, step = %step, "update for unknown step");
                }
            }
            Err(err) => tracing::debug!(task = task_id, reason = %err, "ignored orphaned task update"),
        }
    }

    /// Switch the typing indicator on for `owner`
    pub fn begin_typing(&mut self, label: String, owner: Owner) {
        self.typing = Some(TypingIndicator { label, owner });
    }

    /// Clear an indicator left behind by a superseded scene chain
    pub fn clear_stale_typing(&mut self, is_stale: impl Fn(Owner) -> bool) {
        if self.typing.as_ref().is_some_and(|t| is_stale(t.owner)) {
            tracing::debug!("cleared typing indicator of superseded chain");
            self.typing = None;
        }
    }

    /// Append an agent message and clear the indicator
    pub fn deliver(&mut self, utterance: Utterance, now: Millis) -> MessageId {
        self.typing = None;
        let id = self.next_id();
        tracing::debug!(id = %id, agent = %utterance.agent, "message delivered");
        self.messages.push(utterance.into_message(id, now));
        id
    }

    /// Append a user message
    pub fn append_user(&mut self, text: &str, now: Millis) -> MessageId {
        let id = self.next_id();
        self.messages.push(ChatMessage {
            id,
            role: AgentRole::User,
            agent_name: None,
            content: text.to_string(),
            actions: Vec::new(),
            reasoning: Vec::new(),
            meta: None,
            timestamp: now,
        });
        id
    }

    /// Prepend an expert-desk deliverable
    pub fn record_output(&mut self, output: ExpertOutput) {
        self.outputs.insert(0, output);
    }

    /// Apply a timeline effect. `AdvanceTo` is not a store operation and is ignored.
    pub fn apply(&mut self, effect: Effect, owner: Owner, now: Millis) {
        match effect {
            Effect::BeginTyping { label } => self.begin_typing(label, owner),
            Effect::Deliver(utterance) => {
                self.deliver(*utterance, now);
            }
            Effect::UpdateTask { task_id, patch } => self.update_task(&task_id, &patch),
            Effect::Publish(canvas) => self.publish_canvas(canvas.map(|c| *c)),
            Effect::RecordOutput(output) => self.record_output(output),
            Effect::AdvanceTo(scene) => {
                tracing::debug!(scene = %scene, "advance effect reached the store; ignored");
            }
        }
    }

    fn next_id(&mut self) -> MessageId {
        self.next_message += 1;
        MessageId(self.next_message)
    }

    // --- reads ---

    #[inline]
    #[must_use]
    pub fn scene(&self) -> Option<&SceneId> {
        self.scene.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    #[inline]
    #[must_use]
    pub fn canvas(&self) -> Option<&CanvasState> {
        self.canvas.current()
    }

    /// Canvas publications so far
    #[inline]
    #[must_use]
    pub fn canvas_revision(&self) -> u64 {
        self.canvas.revision()
    }

    #[inline]
    #[must_use]
    pub fn mission(&self) -> &MissionState {
        self.mission.state()
    }

    /// Rejected mission patches so far
    #[inline]
    #[must_use]
    pub fn mission_inconsistencies(&self) -> u64 {
        self.mission.inconsistencies()
    }

    #[inline]
    #[must_use]
    pub fn tasks(&self) -> &TaskTracker {
        &self.tasks
    }

    #[inline]
    #[must_use]
    pub fn typing(&self) -> Option<&TypingIndicator> {
        self.typing.as_ref()
    }

    /// Whether any agent is typing
    #[inline]
    #[must_use]
    pub fn is_typing(&self) -> bool {
        self.typing.is_some()
    }

    /// Expert-desk deliverables, newest first
    #[inline]
    #[must_use]
    pub fn outputs(&self) -> &[ExpertOutput] {
        &self.outputs
    }

    /// Copy out the observable state
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            scene_id: self.scene.clone(),
            messages: self.messages.clone(),
            canvas: self.canvas.current().cloned(),
            mission: self.mission.state().clone(),
            task: self.tasks.active().cloned(),
            is_typing: self.typing.is_some(),
            typing_label: self.typing.as_ref().map(|t| t.label.clone()),
        }
    }
}
