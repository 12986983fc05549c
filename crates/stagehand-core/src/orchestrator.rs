//! Walkthrough orchestrator
//!
//! The object consumers hold. It owns the store, the timeline and the scene
//! registry, and it is the only writer of walkthrough state.
//!
//! # Timing model
//! Entering a scene starts a new timeline generation. Everything the scene
//! schedules (typing, deliveries, task updates, auto-advance) is owned by that
//! generation, so entering another scene purges it. Conversation replies are owned
//! by the conversation and survive scene changes; a reply still waiting to type is
//! planned again so it does not wait on messages that will never play.
//!
//! Entry points first catch up with the clock, so callers never observe effects
//! that should already have fired.

use crate::actions::{ActionOutcome, ActionRecord, ActionRouter, Resolution};
use crate::config::OrchestratorConfig;
use crate::error::StageError;
use crate::expert::{ExpertAction, ExpertOutcome, ExpertOutput, EXPERT_AGENT};
use crate::scenes::{canonical_registry, CanvasDirective, SceneRegistry};
use crate::sequencer::{PlannedDelivery, Sequencer};
use crate::store::{Effect, Snapshot, Store};
use crate::types::{MessageId, SceneId, Utterance};
use serde_json::Value;
use stagehand_kernel::{Clock, Entry, Generation, Millis, Owner, Pump, Timeline, TimelineStats};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::watch;

/// A conversation reply that has not landed yet
#[derive(Debug, Clone)]
struct PendingReply {
    requested_at: Millis,
    hold: Millis,
    utterance: Utterance,
    expert: Option<(u64, ExpertAction)>,
    land: Millis,
    typing: bool,
}

/// Scripted walkthrough state machine
#[derive(Debug)]
pub struct Orchestrator {
    config: OrchestratorConfig,
    clock: Arc<dyn Clock>,
    registry: SceneRegistry,
    router: ActionRouter,
    store: Store,
    timeline: Timeline<Effect>,
    sequencer: Sequencer,
    action_log: Vec<ActionRecord>,
    replies: VecDeque<PendingReply>,
    expert_sequence: u64,
    publisher: watch::Sender<Snapshot>,
}

impl Orchestrator {
    /// Create an orchestrator and enter the start scene
    ///
    /// # Errors
    /// Invalid configuration, a registry with dangling targets, or a start scene
    /// that is not registered.
    pub fn new(
        config: OrchestratorConfig,
        registry: SceneRegistry,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, StageError> {
        config.validate()?;
        registry.validate()?;
        if !registry.contains(config.start_scene.as_str()) {
            return Err(StageError::UnknownScene(config.start_scene.clone()));
        }

        let (publisher, _) = watch::channel(Snapshot::empty());
        let mut timeline = Timeline::new();
        timeline.advance_to(clock.now());

        let mut orchestrator = Self {
            router: ActionRouter::new(config.action_routes.clone()),
            sequencer: Sequencer::new(config.timing),
            config,
            clock,
            registry,
            store: Store::new(),
            timeline,
            action_log: Vec::new(),
            replies: VecDeque::new(),
            expert_sequence: 0,
            publisher,
        };

        let start = orchestrator.config.start_scene.clone();
        orchestrator.enter(start.as_str())?;
        orchestrator.publish();
        tracing::info!(start = %start, scenes = orchestrator.registry.len(), "orchestrator ready");
        Ok(orchestrator)
    }

    /// Orchestrator running the full migration walkthrough
    ///
    /// # Errors
    /// As [`Orchestrator::new`].
    pub fn with_script(config: OrchestratorConfig, clock: Arc<dyn Clock>) -> Result<Self, StageError> {
        Self::new(config, canonical_registry()?, clock)
    }

    // --- entry points ---

    /// Enter a scene, superseding whatever the current scene still had scheduled
    ///
    /// # Errors
    /// `StageError::UnknownScene` when `id` is not registered; nothing changes.
    pub fn advance_to_scene(&mut self, id: &str) -> Result<Generation, StageError> {
        self.catch_up();
        let result = self.enter(id);
        self.publish();
        result
    }

    /// Append a user message and queue the scripted reply
    pub fn submit_user_message(&mut self, text: &str) -> MessageId {
        self.catch_up();
        let now = self.timeline.now();
        let id = self.store.append_user(text, now);

        let reply = &self.config.reply;
        let mut utterance = Utterance::assistant(&reply.agent, &reply.content);
        utterance.reasoning.clone_from(&reply.reasoning);
        let hold = self.config.timing.user_reply_delay_ms;
        let reply_at = self.queue_reply(utterance, hold, None);

        tracing::info!(id = %id, reply_at, "user message submitted");
        self.publish();
        id
    }

    /// Resolve and perform an action
    pub fn dispatch_action(&mut self, action_id: &str, params: Option<Value>) -> ActionOutcome {
        self.catch_up();
        let at = self.timeline.now();
        let resolution = self
            .router
            .resolve(action_id, self.store.messages(), &self.registry);

        let outcome = match resolution {
            Resolution::Navigate { scene, source } => {
                tracing::debug!(action = action_id, ?source, "action navigates");
                match self.enter(scene.as_str()) {
                    Ok(generation) => ActionOutcome::Navigated { scene, generation },
                    Err(_) => ActionOutcome::UnknownTarget { scene },
                }
            }
            Resolution::Effect { effect, .. } => ActionOutcome::Notice { effect },
            Resolution::Expert(action) => ActionOutcome::Expert(self.queue_expert(action)),
            Resolution::Unresolved => ActionOutcome::Unhandled,
        };

        tracing::info!(action = action_id, outcome = ?outcome, "action dispatched");
        self.action_log.push(ActionRecord {
            at,
            action_id: action_id.to_string(),
            params,
            outcome: outcome.clone(),
        });
        self.publish();
        outcome
    }

    /// Run an expert-desk tool
    pub fn handle_expert_action(&mut self, action: ExpertAction) -> ExpertOutcome {
        self.catch_up();
        let outcome = self.queue_expert(action);
        self.publish();
        outcome
    }

    // --- driving ---

    /// Apply everything due by the clock's current time
    pub fn pump(&mut self) -> usize {
        let now = self.clock.now();
        self.pump_to(now)
    }

    /// Apply everything due at or before `now`, in due order
    pub fn pump_to(&mut self, now: Millis) -> usize {
        let mut applied = 0;
        while let Some(entry) = self.timeline.pop_due(now) {
            self.apply(entry);
            applied += 1;
        }
        self.timeline.advance_to(now);
        if applied > 0 {
            self.publish();
        }
        applied
    }

    /// Earliest pending due time
    #[inline]
    #[must_use]
    pub fn next_due(&self) -> Option<Millis> {
        self.timeline.next_due()
    }

    /// Whether nothing is scheduled
    #[inline]
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.timeline.is_empty()
    }

    // --- observation ---

    /// Current observable state
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.store.snapshot()
    }

    /// Receiver that always holds the latest snapshot
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.publisher.subscribe()
    }

    /// Virtual time of the last applied effect or entry point
    #[inline]
    #[must_use]
    pub fn now(&self) -> Millis {
        self.timeline.now()
    }

    /// Scene entered last
    #[inline]
    #[must_use]
    pub fn current_scene(&self) -> Option<&SceneId> {
        self.store.scene()
    }

    /// Generation owning the current scene's schedule
    #[inline]
    #[must_use]
    pub fn current_generation(&self) -> Generation {
        self.timeline.current_generation()
    }

    /// Scheduling counters
    #[inline]
    #[must_use]
    pub fn timeline_stats(&self) -> TimelineStats {
        self.timeline.stats()
    }

    /// Every dispatched action, oldest first
    #[inline]
    #[must_use]
    pub fn action_log(&self) -> &[ActionRecord] {
        &self.action_log
    }

    /// Expert-desk deliverables, newest first
    #[inline]
    #[must_use]
    pub fn expert_outputs(&self) -> &[ExpertOutput] {
        self.store.outputs()
    }

    /// Tasks started so far
    #[inline]
    #[must_use]
    pub fn task_epoch(&self) -> u64 {
        self.store.tasks().epoch()
    }

    /// Walkthrough state
    #[inline]
    #[must_use]
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Scenes this orchestrator can enter
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &SceneRegistry {
        &self.registry
    }

    /// Configuration in use
    #[inline]
    #[must_use]
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    // --- engine ---

    fn catch_up(&mut self) {
        let now = self.clock.now();
        self.pump_to(now);
    }

    /// Interpret a recipe at the timeline's current time
    fn enter(&mut self, id: &str) -> Result<Generation, StageError> {
        let Some(recipe) = self.registry.get(id).cloned() else {
            tracing::warn!(scene = id, "unknown scene; state unchanged");
            return Err(StageError::UnknownScene(SceneId::new(id)));
        };

        let now = self.timeline.now();
        let generation = self.timeline.begin_generation();
        let owner = Owner::Scene(generation);
        let timeline = &self.timeline;
        self.store.clear_stale_typing(|o| timeline.is_stale(o));
        self.replan_replies(now);

        self.store.set_scene(SceneId::new(id));
        if let Some(patch) = &recipe.mission {
            self.store.patch_mission(patch);
        }
        match recipe.canvas {
            CanvasDirective::Keep => {}
            CanvasDirective::Replace(canvas) => self.store.publish_canvas(Some(*canvas)),
            CanvasDirective::Clear => self.store.publish_canvas(None),
        }
        if let Some(plan) = &recipe.task {
            self.store.start_task(plan.task.clone(), now);
        }

        let chain = self.sequencer.plan_chain(now, recipe.utterances);
        let utterances = chain.len();
        for delivery in chain {
            schedule_delivery(&mut self.timeline, owner, delivery);
        }

        if let Some(plan) = recipe.task {
            for update in plan.updates {
                let due = now.saturating_add(update.after);
                self.timeline.schedule_at(
                    due,
                    owner,
                    Effect::UpdateTask {
                        task_id: plan.task.id.clone(),
                        patch: update.patch,
                    },
                );
                if let Some(canvas) = update.canvas {
                    self.timeline
                        .schedule_at(due, owner, Effect::Publish(Some(Box::new(canvas))));
                }
            }
            if let Some((after, target)) = plan.advance {
                let due = now
                    .saturating_add(after)
                    .max(self.sequencer.scene_busy_until());
                tracing::debug!(scene = id, target = %target, due, "auto-advance scheduled");
                self.timeline.schedule_at(due, owner, Effect::AdvanceTo(target));
            }
        }

        tracing::info!(scene = id, %generation, at = now, utterances, "entered scene");
        Ok(generation)
    }

    /// Plan a conversation reply behind whatever is in flight; returns its landing time
    fn queue_reply(
        &mut self,
        utterance: Utterance,
        hold: Millis,
        expert: Option<(u64, ExpertAction)>,
    ) -> Millis {
        let now = self.timeline.now();
        let delivery = self.sequencer.plan_reply(now, utterance.clone(), hold);
        let land = delivery.land;
        schedule_delivery(&mut self.timeline, Owner::Conversation, delivery);
        self.replies.push_back(PendingReply {
            requested_at: now,
            hold,
            utterance,
            expert,
            land,
            typing: false,
        });
        land
    }

    /// Plan again every reply that has not started typing
    ///
    /// Runs after the previous generation was purged, so replies that were queued
    /// behind its unplayed messages move forward.
    fn replan_replies(&mut self, now: Millis) {
        if self.replies.iter().all(|reply| reply.typing) {
            return;
        }
        let dropped = self.timeline.take_owned(Owner::Conversation).len();
        let in_flight = self
            .replies
            .front()
            .filter(|reply| reply.typing)
            .map_or(0, |reply| reply.land);
        self.sequencer.reset_conversation(in_flight);

        for reply in &mut self.replies {
            if reply.typing {
                self.timeline.schedule_at(
                    reply.land,
                    Owner::Conversation,
                    Effect::Deliver(Box::new(reply.utterance.clone())),
                );
                continue;
            }
            let delivery =
                self.sequencer
                    .replan_reply(now, reply.requested_at, reply.utterance.clone(), reply.hold);
            reply.land = delivery.land;
            schedule_delivery(&mut self.timeline, Owner::Conversation, delivery);
        }
        tracing::debug!(
            replies = self.replies.len(),
            dropped,
            at = now,
            "re-planned waiting conversation replies"
        );
    }

    fn queue_expert(&mut self, action: ExpertAction) -> ExpertOutcome {
        if self.store.is_typing() {
            tracing::debug!(action = %action, "expert desk busy");
            return ExpertOutcome::Busy;
        }

        let summary = action.summary();
        let hold = self.sequencer.typing_duration(summary);
        self.expert_sequence += 1;
        let lands_at = self.queue_reply(
            Utterance::assistant(EXPERT_AGENT, summary),
            hold,
            Some((self.expert_sequence, action)),
        );

        tracing::info!(action = %action, lands_at, "expert deliverable queued");
        ExpertOutcome::Queued { lands_at }
    }

    fn apply(&mut self, entry: Entry<Effect>) {
        tracing::debug!(kind = entry.effect.kind(), due = entry.due, owner = ?entry.owner, "applying effect");
        let (owner, due) = (entry.owner, entry.due);
        match (owner, entry.effect) {
            (_, Effect::AdvanceTo(scene)) => {
                if let Err(err) = self.enter(scene.as_str()) {
                    tracing::warn!(error = %err, "auto-advance failed");
                }
            }
            (Owner::Conversation, effect @ Effect::BeginTyping { .. }) => {
                if let Some(reply) = self.replies.iter_mut().find(|reply| !reply.typing) {
                    reply.typing = true;
                }
                self.store.apply(effect, owner, due);
            }
            (Owner::Conversation, effect @ Effect::Deliver(_)) => {
                self.store.apply(effect, owner, due);
                if let Some(PendingReply {
                    expert: Some((sequence, action)),
                    ..
                }) = self.replies.pop_front()
                {
                    let output = ExpertOutput::new(sequence, action, due);
                    self.store.apply(Effect::RecordOutput(output), owner, due);
                }
            }
            (Owner::Scene(_), effect @ Effect::Deliver(_)) => {
                self.sequencer.scene_delivered(due);
                self.store.apply(effect, owner, due);
            }
            (_, effect) => self.store.apply(effect, owner, due),
        }
    }

    fn publish(&self) {
        self.publisher.send_replace(self.store.snapshot());
    }
}

fn schedule_delivery(timeline: &mut Timeline<Effect>, owner: Owner, delivery: PlannedDelivery) {
    timeline.schedule_at(
        delivery.begin,
        owner,
        Effect::BeginTyping {
            label: delivery.utterance.typing_label(),
        },
    );
    timeline.schedule_at(delivery.land, owner, Effect::Deliver(Box::new(delivery.utterance)));
}

impl Pump for Orchestrator {
    fn next_due(&self) -> Option<Millis> {
        Self::next_due(self)
    }

    fn pump_to(&mut self, now: Millis) -> usize {
        Self::pump_to(self, now)
    }
}
