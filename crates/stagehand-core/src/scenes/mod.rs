//! Scene registry
//!
//! A scene is declarative data: a [`SceneRecipe`] says what the mission, canvas and
//! task look like on entry, which utterances are delivered, which task updates
//! follow and where the scene auto-advances. One generic engine in the
//! orchestrator interprets every recipe.
//!
//! Recipes are validated when registered, so a broken recipe is rejected before it
//! can touch any state.

pub mod script;

use crate::canvas::CanvasState;
use crate::error::RecipeError;
use crate::mission::MissionPatch;
use crate::tasks::{AgentTask, TaskPatch};
use crate::types::{ActionButton, SceneId, Utterance};
use indexmap::IndexMap;
use stagehand_kernel::Millis;

pub use script::canonical_registry;

/// What entering a scene does to the canvas
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CanvasDirective {
    /// Leave the current canvas in place
    #[default]
    Keep,
    /// Replace it
    Replace(Box<CanvasState>),
    /// Show nothing
    Clear,
}

/// A task update fired `after` ms from scene entry
#[derive(Debug, Clone, PartialEq)]
pub struct TaskUpdate {
    pub after: Millis,
    pub patch: TaskPatch,
    /// Canvas published together with the update
    pub canvas: Option<CanvasState>,
}

/// Background job of a scene and its scripted progress
#[derive(Debug, Clone, PartialEq)]
pub struct TaskPlan {
    pub task: AgentTask,
    /// Updates in firing order
    pub updates: Vec<TaskUpdate>,
    /// Follow-up scene and its delay from scene entry
    pub advance: Option<(Millis, SceneId)>,
}

impl TaskPlan {
    /// Plan with no updates yet
    #[must_use]
    pub fn new(task: AgentTask) -> Self {
        Self {
            task,
            updates: Vec::new(),
            advance: None,
        }
    }

    /// Add an update
    #[must_use]
    pub fn update(mut self, after: Millis, patch: TaskPatch) -> Self {
        self.updates.push(TaskUpdate {
            after,
            patch,
            canvas: None,
        });
        self
    }

    /// Add an update that also replaces the canvas
    #[must_use]
    pub fn update_with_canvas(mut self, after: Millis, patch: TaskPatch, canvas: CanvasState) -> Self {
        self.updates.push(TaskUpdate {
            after,
            patch,
            canvas: Some(canvas),
        });
        self
    }

    /// Auto-advance to `scene` no earlier than `after` ms from entry
    #[must_use]
    pub fn advance(mut self, after: Millis, scene: &str) -> Self {
        self.advance = Some((after, SceneId::new(scene)));
        self
    }
}

/// Everything one scene does
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneRecipe {
    pub mission: Option<MissionPatch>,
    pub utterances: Vec<Utterance>,
    pub canvas: CanvasDirective,
    pub task: Option<TaskPlan>,
}

impl SceneRecipe {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn mission(mut self, patch: MissionPatch) -> Self {
        self.mission = Some(patch);
        self
    }

    #[must_use]
    pub fn say(mut self, utterance: Utterance) -> Self {
        self.utterances.push(utterance);
        self
    }

    #[must_use]
    pub fn canvas(mut self, canvas: CanvasState) -> Self {
        self.canvas = CanvasDirective::Replace(Box::new(canvas));
        self
    }

    #[must_use]
    pub fn clear_canvas(mut self) -> Self {
        self.canvas = CanvasDirective::Clear;
        self
    }

    #[must_use]
    pub fn task(mut self, plan: TaskPlan) -> Self {
        self.task = Some(plan);
        self
    }

    /// Buttons offered by this scene's utterances
    pub fn buttons(&self) -> impl Iterator<Item = &ActionButton> {
        self.utterances.iter().flat_map(|u| u.actions.iter())
    }

    /// Auto-advance target, if any
    #[must_use]
    pub fn advance_target(&self) -> Option<&SceneId> {
        self.task.as_ref()?.advance.as_ref().map(|(_, scene)| scene)
    }

    /// Check the task plan in isolation
    ///
    /// # Errors
    /// The first [`RecipeError`] found.
    pub fn check(&self, id: &SceneId) -> Result<(), RecipeError> {
        let Some(plan) = &self.task else {
            return Ok(());
        };

        let mut statuses: Vec<_> = plan
            .task
            .steps
            .iter()
            .map(|step| (step.id.as_str(), step.status))
            .collect();
        let mut last_after = 0;

        for update in &plan.updates {
            if update.after < last_after {
                return Err(RecipeError::UnorderedUpdates { scene: id.clone() });
            }
            last_after = update.after;

            for (step, _) in &update.patch.steps {
                if plan.task.find_step(step).is_none() {
                    return Err(RecipeError::UnknownStep {
                        scene: id.clone(),
                        task: plan.task.id.clone(),
                        step: step.clone(),
                    });
                }
            }

            for (step, status) in &mut statuses {
                let next = update.patch.resulting_status(step, *status);
                if next < *status {
                    return Err(RecipeError::StepRegression {
                        scene: id.clone(),
                        task: plan.task.id.clone(),
                        step: (*step).to_string(),
                    });
                }
                *status = next;
            }
        }
        Ok(())
    }
}

/// A transition in the scene graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneEdge {
    pub from: SceneId,
    pub to: SceneId,
    /// Button action id, or `None` for an auto-advance
    pub via: Option<String>,
}

/// Scene id → recipe, in registration order
#[derive(Debug, Clone, Default)]
pub struct SceneRegistry {
    scenes: IndexMap<SceneId, SceneRecipe>,
}

impl SceneRegistry {
    /// Create new empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a recipe after checking it
    ///
    /// # Errors
    /// `RecipeError::Duplicate` or any error from [`SceneRecipe::check`].
    pub fn register(&mut self, id: impl Into<SceneId>, recipe: SceneRecipe) -> Result<(), RecipeError> {
        let id = id.into();
        if self.scenes.contains_key(&id) {
            return Err(RecipeError::Duplicate(id));
        }
        recipe.check(&id)?;
        self.scenes.insert(id, recipe);
        Ok(())
    }

    /// Check that every navigation target is registered
    ///
    /// # Errors
    /// `RecipeError::UnknownTarget` for the first dangling target.
    pub fn validate(&self) -> Result<(), RecipeError> {
        for edge in self.edges() {
            if !self.contains(edge.to.as_str()) {
                return Err(RecipeError::UnknownTarget {
                    scene: edge.from,
                    target: edge.to,
                });
            }
        }
        Ok(())
    }

    #[inline]
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&SceneRecipe> {
        self.scenes.get(id)
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.scenes.contains_key(id)
    }

    /// Scene ids in registration order
    pub fn ids(&self) -> impl Iterator<Item = &SceneId> {
        self.scenes.keys()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// First scripted button anywhere with this action id
    #[must_use]
    pub fn button(&self, action_id: &str) -> Option<&ActionButton> {
        self.scenes
            .values()
            .flat_map(SceneRecipe::buttons)
            .find(|button| button.action_id == action_id)
    }

    /// Every button and auto-advance transition
    #[must_use]
    pub fn edges(&self) -> Vec<SceneEdge> {
        let mut edges = Vec::new();
        for (from, recipe) in &self.scenes {
            for button in recipe.buttons() {
                if let Some(to) = &button.next_state {
                    edges.push(SceneEdge {
                        from: from.clone(),
                        to: to.clone(),
                        via: Some(button.action_id.clone()),
                    });
                }
            }
            if let Some(to) = recipe.advance_target() {
                edges.push(SceneEdge {
                    from: from.clone(),
                    to: to.clone(),
                    via: None,
                });
            }
        }
        edges
    }
}
