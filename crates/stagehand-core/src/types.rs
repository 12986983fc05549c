//! Core types for Stagehand
//!
//! Defines the conversation vocabulary shared by every component:
//! - Scene identifiers
//! - Chat messages, their action buttons and job metadata
//! - Utterances: scripted messages before they are delivered

use serde::{Deserialize, Serialize};
use stagehand_kernel::Millis;
use std::borrow::Borrow;

/// Opaque scene identifier (`S0`, `S6_80`, ...)
///
/// Identifiers are tokens, never ordinals: the scripted set is sparse.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SceneId(String);

impl SceneId {
    /// Create a scene id
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw token
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SceneId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for SceneId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&SceneId> for SceneId {
    fn from(id: &SceneId) -> Self {
        id.clone()
    }
}

impl Borrow<str> for SceneId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SceneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Message identifier, unique and increasing within one orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub u64);

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "msg-{:04}", self.0)
    }
}

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentRole {
    /// Orchestrating voice
    System,
    /// A specialist agent
    Assistant,
    /// The human
    User,
}

/// Declarative affordance attached to a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionButton {
    pub label: String,
    pub action_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_state: Option<SceneId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Vec<serde_json::Value>>,
}

impl ActionButton {
    /// Button that moves the walkthrough to `next`
    #[must_use]
    pub fn navigate(label: &str, action_id: &str, next: &str) -> Self {
        Self {
            label: label.to_string(),
            action_id: action_id.to_string(),
            next_state: Some(SceneId::new(next)),
            effect: None,
            params: None,
        }
    }

    /// Button that only triggers a presentational effect (e.g. a toast)
    #[must_use]
    pub fn effect(label: &str, action_id: &str, effect: &str) -> Self {
        Self {
            label: label.to_string(),
            action_id: action_id.to_string(),
            next_state: None,
            effect: Some(effect.to_string()),
            params: None,
        }
    }
}

/// Background job state shown next to a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Running,
    Completed,
    Failed,
}

/// Job metadata attached to a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
}

impl MessageMeta {
    /// Metadata for a running job
    #[must_use]
    pub fn running_job(job_id: &str) -> Self {
        Self {
            job_id: Some(job_id.to_string()),
            status: Some(JobStatus::Running),
        }
    }
}

/// A message in the conversation. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub role: AgentRole,
    #[serde(rename = "agentName", default, skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<String>,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<ActionButton>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reasoning: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<MessageMeta>,
    pub timestamp: Millis,
}

/// A scripted message waiting to be delivered
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utterance {
    pub agent: String,
    pub role: AgentRole,
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<ActionButton>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reasoning: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<MessageMeta>,
}

impl Utterance {
    fn new(agent: &str, role: AgentRole, text: &str) -> Self {
        Self {
            agent: agent.to_string(),
            role,
            text: text.to_string(),
            actions: Vec::new(),
            reasoning: Vec::new(),
            meta: None,
        }
    }

    /// Orchestrator-voice utterance
    #[inline]
    #[must_use]
    pub fn system(agent: &str, text: &str) -> Self {
        Self::new(agent, AgentRole::System, text)
    }

    /// Specialist-agent utterance
    #[inline]
    #[must_use]
    pub fn assistant(agent: &str, text: &str) -> Self {
        Self::new(agent, AgentRole::Assistant, text)
    }

    /// Attach action buttons
    #[inline]
    #[must_use]
    pub fn with_actions(mut self, actions: Vec<ActionButton>) -> Self {
        self.actions = actions;
        self
    }

    /// Attach chain-of-thought lines
    #[must_use]
    pub fn with_reasoning(mut self, reasoning: &[&str]) -> Self {
        self.reasoning = reasoning.iter().map(ToString::to_string).collect();
        self
    }

    /// Attach job metadata
    #[inline]
    #[must_use]
    pub fn with_meta(mut self, meta: MessageMeta) -> Self {
        self.meta = Some(meta);
        self
    }

    /// Label shown while this utterance is being typed
    #[must_use]
    pub fn typing_label(&self) -> String {
        typing_label(&self.agent)
    }

    /// Turn into a chat message
    #[must_use]
    pub fn into_message(self, id: MessageId, timestamp: Millis) -> ChatMessage {
        ChatMessage {
            id,
            role: self.role,
            agent_name: Some(self.agent),
            content: self.text,
            actions: self.actions,
            reasoning: self.reasoning,
            meta: self.meta,
            timestamp,
        }
    }
}

/// Typing indicator label for an agent
#[must_use]
pub fn typing_label(agent: &str) -> String {
    format!("{agent} is typing...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scene_id_is_opaque_token() {
        let id = SceneId::new("S6_80");
        assert_eq!(id.as_str(), "S6_80");
        assert_eq!(id.to_string(), "S6_80");
        assert_eq!(SceneId::from("S6_80"), id);
    }

    #[test]
    fn chat_message_uses_wire_field_names() {
        let message = Utterance::assistant("Navigator Agent", "Ready to scan the org?")
            .with_actions(vec![ActionButton::navigate("Start scan", "start_scan", "S2")])
            .into_message(MessageId(7), 1_200);

        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["agentName"], "Navigator Agent");
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["actions"][0]["next_state"], "S2");
        assert!(json["actions"][0].get("effect").is_none());
        assert!(json.get("reasoning").is_none());
        assert_eq!(json["timestamp"], 1_200);
    }

    #[test]
    fn effect_button_has_no_target() {
        let button = ActionButton::effect("Edit scope", "edit_scope", "toast");
        assert!(button.next_state.is_none());
        assert_eq!(button.effect.as_deref(), Some("toast"));
    }

    #[test]
    fn typing_label_names_agent() {
        let utterance = Utterance::system("Migration Agent", "hello");
        assert_eq!(utterance.typing_label(), "Migration Agent is typing...");
    }
}
