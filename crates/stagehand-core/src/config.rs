//! Orchestrator configuration
//!
//! Every timing constant of the walkthrough plus the scripted conversation reply
//! and the configured action routes. Loadable from TOML; omitted keys keep their
//! defaults.
//!
//! ```toml
//! start_scene = "S0"
//!
//! [timing]
//! lead_in_ms = 100
//! inter_message_ms = 2000
//! user_reply_delay_ms = 2000
//!
//! [timing.typing]
//! per_char_ms = 15
//! min_ms = 1000
//! max_ms = 2500
//!
//! [action_routes]
//! rerun_scan = "S2"
//! ```
//!
//! Entries under `[action_routes]` are merged over the default routes. A default
//! route can be redirected but not removed.

use crate::error::ConfigError;
use crate::types::SceneId;
use serde::{Deserialize, Deserializer, Serialize};
use stagehand_kernel::Millis;
use std::collections::BTreeMap;
use std::path::Path;

/// How long an agent "types" a message of a given length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypingProfile {
    /// Cost of one character
    pub per_char_ms: Millis,
    /// Shortest typing duration
    pub min_ms: Millis,
    /// Longest typing duration
    pub max_ms: Millis,
}

impl TypingProfile {
    /// Typing duration for `text`: `chars × per_char_ms`, clamped to `[min_ms, max_ms]`
    #[must_use]
    pub fn duration_for(&self, text: &str) -> Millis {
        let chars = text.chars().count() as Millis;
        chars
            .saturating_mul(self.per_char_ms)
            .clamp(self.min_ms, self.max_ms)
    }
}

impl Default for TypingProfile {
    fn default() -> Self {
        Self {
            per_char_ms: 15,
            min_ms: 1_000,
            max_ms: 2_500,
        }
    }
}

/// Delivery timing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Delay before the first utterance of a scene starts typing
    pub lead_in_ms: Millis,
    /// Gap between one utterance landing and the next starting to type
    pub inter_message_ms: Millis,
    /// Typing duration model
    pub typing: TypingProfile,
    /// Fixed wait before the scripted reply to a user message lands
    pub user_reply_delay_ms: Millis,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            lead_in_ms: 100,
            inter_message_ms: 2_000,
            typing: TypingProfile::default(),
            user_reply_delay_ms: 2_000,
        }
    }
}

/// Canned answer to every user message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptedReply {
    pub agent: String,
    pub content: String,
    pub reasoning: Vec<String>,
}

impl Default for ScriptedReply {
    fn default() -> Self {
        Self {
            agent: "Gemini 3".to_string(),
            content: "I'm tracking the migration progress. I can help you modify the scope, \
                      explain the RCA logic, or run specific scenarios. usage-based \
                      prioritization is currently active."
                .to_string(),
            reasoning: vec![
                "Analyzing user intent...".to_string(),
                "Checking Mission Context...".to_string(),
                "Formulating helpful response based on current phase.".to_string(),
            ],
        }
    }
}

/// Orchestrator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Scene entered on construction
    pub start_scene: SceneId,
    /// Delivery timing
    pub timing: TimingConfig,
    /// Reply to free-text user messages
    pub reply: ScriptedReply,
    /// Action ids that always navigate, regardless of which buttons are on screen
    #[serde(deserialize_with = "routes_over_defaults")]
    pub action_routes: BTreeMap<String, SceneId>,
}

fn default_routes() -> BTreeMap<String, SceneId> {
    let mut routes = BTreeMap::new();
    routes.insert("run_scan".to_string(), SceneId::new("S2"));
    routes.insert("confirm_intent".to_string(), SceneId::new("S9"));
    routes
}

fn routes_over_defaults<'de, D>(deserializer: D) -> Result<BTreeMap<String, SceneId>, D::Error>
where
    D: Deserializer<'de>,
{
    let overrides = BTreeMap::<String, SceneId>::deserialize(deserializer)?;
    let mut routes = default_routes();
    routes.extend(overrides);
    Ok(routes)
}

impl OrchestratorConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With start scene
    #[inline]
    #[must_use]
    pub fn with_start_scene(mut self, scene: impl Into<SceneId>) -> Self {
        self.start_scene = scene.into();
        self
    }

    /// With timing
    #[inline]
    #[must_use]
    pub fn with_timing(mut self, timing: TimingConfig) -> Self {
        self.timing = timing;
        self
    }

    /// With scripted reply
    #[inline]
    #[must_use]
    pub fn with_reply(mut self, reply: ScriptedReply) -> Self {
        self.reply = reply;
        self
    }

    /// With an extra action route
    #[must_use]
    pub fn with_route(mut self, action_id: &str, scene: impl Into<SceneId>) -> Self {
        self.action_routes.insert(action_id.to_string(), scene.into());
        self
    }

    /// Parse and validate TOML
    ///
    /// # Errors
    /// `ConfigError::Parse` for malformed TOML, `ConfigError::Invalid` for bad values.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    ///
    /// # Errors
    /// `ConfigError::Io` when the file cannot be read, otherwise as [`Self::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml_str(&source)?;
        tracing::info!(path = %path.display(), start = %config.start_scene, "loaded configuration");
        Ok(config)
    }

    /// Check value consistency
    ///
    /// # Errors
    /// `ConfigError::Invalid` describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.start_scene.as_str().is_empty() {
            return Err(ConfigError::Invalid("start_scene must not be empty".into()));
        }
        let typing = &self.timing.typing;
        if typing.min_ms > typing.max_ms {
            return Err(ConfigError::Invalid(format!(
                "typing.min_ms ({}) exceeds typing.max_ms ({})",
                typing.min_ms, typing.max_ms
            )));
        }
        if self.reply.agent.is_empty() {
            return Err(ConfigError::Invalid("reply.agent must not be empty".into()));
        }
        if let Some((action, _)) = self
            .action_routes
            .iter()
            .find(|(_, scene)| scene.as_str().is_empty())
        {
            return Err(ConfigError::Invalid(format!(
                "action route {action} has an empty target"
            )));
        }
        Ok(())
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            start_scene: SceneId::new("S0"),
            timing: TimingConfig::default(),
            reply: ScriptedReply::default(),
            action_routes: default_routes(),
        }
    }
}
