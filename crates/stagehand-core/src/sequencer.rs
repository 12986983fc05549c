//! Message sequencer
//!
//! Plans when each utterance starts typing and when it lands. Planning is pure
//! arithmetic over virtual time; the orchestrator turns each plan into timeline
//! entries.
//!
//! Two kinds of chains exist:
//! - **Scene chains** belong to one scene entry. A new scene chain supersedes the
//!   previous one.
//! - **Conversation replies** queue behind whatever is in flight and are never
//!   superseded. A reply that was waiting on a superseded scene chain is planned
//!   again with [`Sequencer::replan_reply`].
//!
//! Deliveries never overlap: a scene chain waits for a pending reply and a reply
//! waits for the scene chain. Time arithmetic saturates at `Millis::MAX`.

use crate::config::TimingConfig;
use crate::types::Utterance;
use stagehand_kernel::Millis;

/// When one utterance types and lands
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedDelivery {
    /// Typing indicator switches on
    pub begin: Millis,
    /// Message is appended and the indicator clears
    pub land: Millis,
    pub utterance: Utterance,
}

/// Delivery planner
#[derive(Debug, Clone)]
pub struct Sequencer {
    timing: TimingConfig,
    scene_busy_until: Millis,
    last_scene_delivery: Millis,
    conversation_busy_until: Millis,
    chains: u64,
}

impl Sequencer {
    /// Create a sequencer
    #[must_use]
    pub fn new(timing: TimingConfig) -> Self {
        Self {
            timing,
            scene_busy_until: 0,
            last_scene_delivery: 0,
            conversation_busy_until: 0,
            chains: 0,
        }
    }

    /// Timing in use
    #[inline]
    #[must_use]
    pub fn timing(&self) -> &TimingConfig {
        &self.timing
    }

    /// Typing duration for a message
    #[inline]
    #[must_use]
    pub fn typing_duration(&self, text: &str) -> Millis {
        self.timing.typing.duration_for(text)
    }

    /// Plan a scene chain starting at `now`, superseding any previous scene chain
    ///
    /// The first utterance begins `lead_in_ms` after `now` (or after a pending
    /// conversation reply). Each later one begins `inter_message_ms` after its
    /// predecessor lands.
    pub fn plan_chain(&mut self, now: Millis, utterances: Vec<Utterance>) -> Vec<PlannedDelivery> {
        self.chains += 1;
        self.scene_busy_until = now;

        let mut cursor = now
            .max(self.conversation_busy_until)
            .saturating_add(self.timing.lead_in_ms);
        let mut plan = Vec::with_capacity(utterances.len());
        for utterance in utterances {
            let begin = cursor;
            let land = begin.saturating_add(self.typing_duration(&utterance.text));
            cursor = land.saturating_add(self.timing.inter_message_ms);
            self.scene_busy_until = land;
            plan.push(PlannedDelivery {
                begin,
                land,
                utterance,
            });
        }

        tracing::debug!(
            chain = self.chains,
            utterances = plan.len(),
            busy_until = self.scene_busy_until,
            "planned scene chain"
        );
        plan
    }

    /// Plan a conversation reply that holds the typing indicator for `hold`
    pub fn plan_reply(&mut self, now: Millis, utterance: Utterance, hold: Millis) -> PlannedDelivery {
        let begin = now
            .max(self.scene_busy_until)
            .max(self.conversation_busy_until);
        let land = begin.saturating_add(hold);
        self.conversation_busy_until = land;
        PlannedDelivery {
            begin,
            land,
            utterance,
        }
    }

    /// Record that a scene message landed at `at`
    #[inline]
    pub fn scene_delivered(&mut self, at: Millis) {
        self.last_scene_delivery = self.last_scene_delivery.max(at);
    }

    /// Restart conversation planning with nothing queued past `until`
    #[inline]
    pub fn reset_conversation(&mut self, until: Millis) {
        self.conversation_busy_until = until;
    }

    /// Plan again a reply that has not started typing, ignoring unplayed scene messages
    ///
    /// The reply keeps the slot it would have had if only delivered messages stood
    /// before it: `hold` after it was requested, after the reply ahead of it, or after
    /// the last scene message that actually landed. Typing starts no earlier than `now`
    /// and the reply never lands before `now`.
    pub fn replan_reply(
        &mut self,
        now: Millis,
        requested_at: Millis,
        utterance: Utterance,
        hold: Millis,
    ) -> PlannedDelivery {
        let slot = requested_at
            .max(self.last_scene_delivery)
            .max(self.conversation_busy_until);
        let begin = slot.max(now);
        let land = slot.saturating_add(hold).max(begin);
        self.conversation_busy_until = land;
        PlannedDelivery {
            begin,
            land,
            utterance,
        }
    }

    /// When the current scene chain lands its last message
    #[inline]
    #[must_use]
    pub fn scene_busy_until(&self) -> Millis {
        self.scene_busy_until
    }

    /// When the last queued conversation reply lands
    #[inline]
    #[must_use]
    pub fn conversation_busy_until(&self) -> Millis {
        self.conversation_busy_until
    }

    /// When every planned delivery has landed
    #[inline]
    #[must_use]
    pub fn busy_until(&self) -> Millis {
        self.scene_busy_until.max(self.conversation_busy_until)
    }

    /// Scene chains planned so far
    #[inline]
    #[must_use]
    pub fn chains(&self) -> u64 {
        self.chains
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sequencer() -> Sequencer {
        Sequencer::new(TimingConfig::default())
    }

    #[test]
    fn chain_spaces_utterances_after_landing() {
        let mut seq = sequencer();
        let plan = seq.plan_chain(
            0,
            vec![
                Utterance::system("A", &"x".repeat(100)),
                Utterance::assistant("B", "short"),
            ],
        );

        assert_eq!(plan[0].begin, 100);
        assert_eq!(plan[0].land, 1_600);
        assert_eq!(plan[1].begin, 3_600);
        assert_eq!(plan[1].land, 4_600);
        assert_eq!(seq.scene_busy_until(), 4_600);
    }

    #[test]
    fn empty_chain_is_not_busy() {
        let mut seq = sequencer();
        assert!(seq.plan_chain(500, Vec::new()).is_empty());
        assert_eq!(seq.scene_busy_until(), 500);
    }

    #[test]
    fn new_chain_resets_scene_horizon() {
        let mut seq = sequencer();
        seq.plan_chain(0, vec![Utterance::system("A", &"x".repeat(500))]);
        assert_eq!(seq.scene_busy_until(), 2_600);

        let plan = seq.plan_chain(300, vec![Utterance::system("A", "hi")]);
        assert_eq!(plan[0].begin, 400);
        assert_eq!(seq.scene_busy_until(), 1_400);
        assert_eq!(seq.chains(), 2);
    }

    #[test]
    fn reply_queues_behind_scene_chain() {
        let mut seq = sequencer();
        seq.plan_chain(0, vec![Utterance::system("A", "hi")]);
        let reply = seq.plan_reply(200, Utterance::assistant("Gemini 3", "ok"), 2_000);
        assert_eq!(reply.begin, 1_100);
        assert_eq!(reply.land, 3_100);

        let second = seq.plan_reply(200, Utterance::assistant("Gemini 3", "ok"), 2_000);
        assert_eq!(second.begin, 3_100);
        assert_eq!(seq.busy_until(), 5_100);
    }

    #[test]
    fn replanned_reply_ignores_unplayed_scene_messages() {
        let mut seq = sequencer();
        seq.plan_chain(0, vec![Utterance::system("A", &"x".repeat(100))]);
        let queued = seq.plan_reply(50, Utterance::assistant("Gemini 3", "ok"), 2_000);
        assert_eq!(queued.begin, 1_600);

        seq.reset_conversation(0);
        let replanned = seq.replan_reply(300, 50, Utterance::assistant("Gemini 3", "ok"), 2_000);
        assert_eq!(replanned.begin, 300);
        assert_eq!(replanned.land, 2_050);
        assert_eq!(seq.conversation_busy_until(), 2_050);
    }

    #[test]
    fn replanned_reply_waits_for_delivered_scene_messages() {
        let mut seq = sequencer();
        seq.scene_delivered(5_025);
        seq.reset_conversation(0);
        let replanned = seq.replan_reply(5_025, 1_000, Utterance::assistant("Gemini 3", "ok"), 2_000);
        assert_eq!(replanned.begin, 5_025);
        assert_eq!(replanned.land, 7_025);
    }

    #[test]
    fn overdue_reply_lands_at_replan_time() {
        let mut seq = sequencer();
        seq.reset_conversation(0);
        let replanned = seq.replan_reply(9_000, 1_000, Utterance::assistant("Gemini 3", "ok"), 2_000);
        assert_eq!(replanned.begin, 9_000);
        assert_eq!(replanned.land, 9_000);
    }

    #[test]
    fn huge_gaps_saturate() {
        let mut seq = Sequencer::new(TimingConfig {
            inter_message_ms: Millis::MAX,
            ..TimingConfig::default()
        });
        let plan = seq.plan_chain(
            0,
            vec![Utterance::system("A", "one"), Utterance::system("A", "two")],
        );
        assert_eq!(plan[0].land, 1_100);
        assert_eq!(plan[1].begin, Millis::MAX);
        assert_eq!(plan[1].land, Millis::MAX);

        let reply = seq.plan_reply(0, Utterance::assistant("Gemini 3", "ok"), 2_000);
        assert_eq!(reply.land, Millis::MAX);
    }

    #[test]
    fn scene_chain_waits_for_pending_reply() {
        let mut seq = sequencer();
        seq.plan_reply(0, Utterance::assistant("Gemini 3", "ok"), 2_000);
        let plan = seq.plan_chain(500, vec![Utterance::system("A", "hi")]);
        assert_eq!(plan[0].begin, 2_100);
    }
}
