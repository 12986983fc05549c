//! Action routing
//!
//! `dispatch_action` is the only command bus. An action id resolves, in order:
//! 1. Configured routes (always navigate)
//! 2. Expert-desk tool ids
//! 3. The newest delivered message offering a button with that id
//! 4. The first scripted button with that id anywhere in the walkthrough
//!
//! A resolved target scene navigates; a resolved effect (a toast) is handed back to
//! the caller; anything else is recorded as unhandled.

use crate::expert::{ExpertAction, ExpertOutcome};
use crate::scenes::SceneRegistry;
use crate::types::{ActionButton, ChatMessage, MessageId, SceneId};
use serde_json::Value;
use stagehand_kernel::{Generation, Millis};
use std::collections::BTreeMap;

/// Where a resolution came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteSource {
    /// Configured route
    Configured,
    /// A button on a delivered message
    Message(MessageId),
    /// A button anywhere in the script
    Script,
}

/// What an action id means right now
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Navigate { scene: SceneId, source: RouteSource },
    Effect { effect: String, source: RouteSource },
    Expert(ExpertAction),
    Unresolved,
}

/// Result of a dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Entered `scene` as generation `generation`
    Navigated { scene: SceneId, generation: Generation },
    /// Presentational effect for the caller to show
    Notice { effect: String },
    /// Routed to the expert desk
    Expert(ExpertOutcome),
    /// Resolved to a scene that is not registered; nothing changed
    UnknownTarget { scene: SceneId },
    /// No route, button or tool with this id
    Unhandled,
}

/// One entry of the action log
#[derive(Debug, Clone, PartialEq)]
pub struct ActionRecord {
    pub at: Millis,
    pub action_id: String,
    pub params: Option<Value>,
    pub outcome: ActionOutcome,
}

/// Resolves action ids
#[derive(Debug, Clone, Default)]
pub struct ActionRouter {
    routes: BTreeMap<String, SceneId>,
}

impl ActionRouter {
    /// Router with configured routes
    #[must_use]
    pub fn new(routes: BTreeMap<String, SceneId>) -> Self {
        Self { routes }
    }

    /// Configured routes
    #[inline]
    #[must_use]
    pub fn routes(&self) -> &BTreeMap<String, SceneId> {
        &self.routes
    }

    /// Resolve `action_id` against the conversation and the script
    #[must_use]
    pub fn resolve(
        &self,
        action_id: &str,
        messages: &[ChatMessage],
        registry: &SceneRegistry,
    ) -> Resolution {
        if let Some(scene) = self.routes.get(action_id) {
            return Resolution::Navigate {
                scene: scene.clone(),
                source: RouteSource::Configured,
            };
        }
        if let Some(action) = ExpertAction::from_id(action_id) {
            return Resolution::Expert(action);
        }

        let on_screen = messages.iter().rev().find_map(|message| {
            message
                .actions
                .iter()
                .find(|button| button.action_id == action_id)
                .map(|button| (button, RouteSource::Message(message.id)))
        });
        let found = on_screen.or_else(|| {
            registry
                .button(action_id)
                .map(|button| (button, RouteSource::Script))
        });

        match found {
            Some((button, source)) => from_button(button, source),
            None => Resolution::Unresolved,
        }
    }
}

fn from_button(button: &ActionButton, source: RouteSource) -> Resolution {
    if let Some(scene) = &button.next_state {
        Resolution::Navigate {
            scene: scene.clone(),
            source,
        }
    } else if let Some(effect) = &button.effect {
        Resolution::Effect {
            effect: effect.clone(),
            source,
        }
    } else {
        Resolution::Unresolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenes::{canonical_registry, SceneRecipe};
    use crate::types::Utterance;

    fn message(id: u64, buttons: Vec<ActionButton>) -> ChatMessage {
        Utterance::assistant("Agent", "Pick one")
            .with_actions(buttons)
            .into_message(MessageId(id), 0)
    }

    fn router() -> ActionRouter {
        ActionRouter::new(BTreeMap::from([("run_scan".to_string(), SceneId::new("S2"))]))
    }

    #[test]
    fn configured_route_wins() {
        let registry = SceneRegistry::new();
        let messages = [message(1, vec![ActionButton::navigate("Scan", "run_scan", "S9")])];
        assert_eq!(
            router().resolve("run_scan", &messages, &registry),
            Resolution::Navigate {
                scene: SceneId::new("S2"),
                source: RouteSource::Configured
            }
        );
    }

    #[test]
    fn newest_message_button_wins_over_script() {
        let mut registry = SceneRegistry::new();
        registry
            .register(
                "SA",
                SceneRecipe::new().say(
                    Utterance::assistant("Agent", "Old")
                        .with_actions(vec![ActionButton::navigate("Go", "go", "SA")]),
                ),
            )
            .unwrap();
        let messages = [
            message(1, vec![ActionButton::navigate("Go", "go", "S1")]),
            message(2, vec![ActionButton::navigate("Go", "go", "S4")]),
        ];
        assert_eq!(
            router().resolve("go", &messages, &registry),
            Resolution::Navigate {
                scene: SceneId::new("S4"),
                source: RouteSource::Message(MessageId(2))
            }
        );
        assert_eq!(
            router().resolve("go", &[], &registry),
            Resolution::Navigate {
                scene: SceneId::new("SA"),
                source: RouteSource::Script
            }
        );
    }

    #[test]
    fn effect_buttons_resolve_to_effects() {
        let registry = canonical_registry().unwrap();
        assert_eq!(
            router().resolve("load_scan", &[], &registry),
            Resolution::Effect {
                effect: "toast".to_string(),
                source: RouteSource::Script
            }
        );
    }

    #[test]
    fn expert_tools_and_unknown_ids() {
        let registry = SceneRegistry::new();
        assert_eq!(
            router().resolve("generate_recap", &[], &registry),
            Resolution::Expert(ExpertAction::GenerateRecap)
        );
        assert_eq!(
            router().resolve("launch_rocket", &[], &registry),
            Resolution::Unresolved
        );
    }
}
