//! Canvas publisher
//!
//! The workspace shows exactly one payload at a time. Payloads form a closed set of
//! `type` tags; renderers pattern-match on the tag and on the `data` field names, so
//! the serde names below are a wire contract.
//!
//! A publish replaces the whole canvas. Nothing from the previous payload survives.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Every `type` tag a renderer may receive
pub const CANVAS_TYPES: [&str; 11] = [
    "scan_scope",
    "scan_progress",
    "usage_radar",
    "dependency_map",
    "phase_scope_proposal",
    "stakeholder_confirm",
    "translation_canvas",
    "replay_progress",
    "diff_viewer",
    "run_summary",
    "run_timeline",
];

/// Current workspace view: `{type, title, data}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasState {
    pub title: String,
    #[serde(flatten)]
    pub payload: CanvasPayload,
}

impl CanvasState {
    /// Create a canvas
    #[inline]
    #[must_use]
    pub fn new(title: &str, payload: CanvasPayload) -> Self {
        Self {
            title: title.to_string(),
            payload,
        }
    }

    /// Tag selecting the rendering contract
    #[inline]
    #[must_use]
    pub fn type_tag(&self) -> &'static str {
        self.payload.type_tag()
    }

    /// Decode a canvas the way a renderer would
    ///
    /// Unknown tags and malformed data mean "nothing to show", not an error.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }
}

/// Tagged payload; serialized as `"type": <tag>, "data": {...}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum CanvasPayload {
    ScanScope(ScanScopeData),
    ScanProgress(ScanProgressData),
    UsageRadar(Box<UsageRadarData>),
    DependencyMap(DependencyMapData),
    PhaseScopeProposal(PhaseScopeData),
    StakeholderConfirm(StakeholderData),
    TranslationCanvas(Box<TranslationData>),
    ReplayProgress(ReplayProgressData),
    DiffViewer(DiffViewerData),
    RunSummary(RunSummaryData),
    RunTimeline(RunTimelineData),
}

impl CanvasPayload {
    /// Serialized `type` tag
    #[must_use]
    pub fn type_tag(&self) -> &'static str {
        match self {
            Self::ScanScope(_) => "scan_scope",
            Self::ScanProgress(_) => "scan_progress",
            Self::UsageRadar(_) => "usage_radar",
            Self::DependencyMap(_) => "dependency_map",
            Self::PhaseScopeProposal(_) => "phase_scope_proposal",
            Self::StakeholderConfirm(_) => "stakeholder_confirm",
            Self::TranslationCanvas(_) => "translation_canvas",
            Self::ReplayProgress(_) => "replay_progress",
            Self::DiffViewer(_) => "diff_viewer",
            Self::RunSummary(_) => "run_summary",
            Self::RunTimeline(_) => "run_timeline",
        }
    }
}

// --- scan_scope ---

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanScopeData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scope: Vec<ScopeEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeEntry {
    pub name: String,
    pub enabled: bool,
}

// --- scan_progress ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanProgressData {
    pub stepper: Vec<String>,
    pub current_step: String,
    /// Fraction complete, 0.0 to 1.0
    pub progress: f64,
    #[serde(default)]
    pub counters: Vec<Counter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counter {
    pub label: String,
    pub value: String,
}

// --- usage_radar ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRadarData {
    pub tabs: Vec<RadarTab>,
    pub summary: RadarSummary,
    pub quotes: Vec<InventoryRow>,
    pub products: Vec<InventoryRow>,
    pub bundles: Vec<InventoryRow>,
    pub pricing: Vec<InventoryRow>,
    pub approvals: Vec<InventoryRow>,
    pub documents: Vec<InventoryRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RadarTab {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RadarSummary {
    pub stats: Vec<StatCard>,
    pub area_cards: Vec<AreaCard>,
    pub top_priority: Vec<InventoryRow>,
}

/// Headline number with a trend tag; also used for run metrics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatCard {
    pub label: String,
    pub value: String,
    pub trend: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaCard {
    pub area: String,
    pub icon: String,
    pub total_items: u32,
    pub active_items: u32,
    pub active_percent: u32,
    pub usage_coverage: String,
    pub usage_count: String,
    pub insight: String,
    pub link_to_tab: String,
}

/// One row of a functional-area table: `{name, type, usage, complexity}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRow {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub usage: String,
    pub complexity: String,
}

// --- dependency_map ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyMapData {
    pub nodes: Vec<GraphNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: String,
}

// --- phase_scope_proposal ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseScopeData {
    pub coverage: String,
    pub included: Vec<ScopeItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeItem {
    pub item: String,
    pub usage: String,
    pub steps: Vec<String>,
}

// --- stakeholder_confirm ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeholderData {
    pub teams: Vec<TeamRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRow {
    pub team: String,
    pub top_user: String,
    pub activity: String,
}

// --- translation_canvas ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationData {
    pub cpq_side: CpqSide,
    pub rca_side: RcaSide,
    pub confirmations: Vec<Confirmation>,
    pub test_plan_preview: TestPlanPreview,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpqSide {
    pub name: String,
    pub inputs: Vec<String>,
    pub plain_english: Vec<String>,
    pub evidence: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RcaSide {
    pub construct: String,
    pub blocks: Vec<String>,
}

/// Question plus an ordered field map shown for confirmation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confirmation {
    pub question: String,
    pub fields: IndexMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestPlanPreview {
    pub replay_sets: Vec<String>,
}

// --- replay_progress ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayProgressData {
    pub suite_name: String,
    pub scenarios: u32,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live_log: Option<Vec<String>>,
}

// --- diff_viewer ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffViewerData {
    pub summary: DiffSummary,
    pub diffs: Vec<DiffRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSummary {
    pub passing: u32,
    pub total: u32,
    pub score: String,
}

/// One compared field: CPQ value (before), RCA value (after), delta and cause
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffRow {
    pub id: u32,
    pub field: String,
    pub cpq: String,
    pub rca: String,
    pub diff: String,
    pub cause: String,
}

// --- run_summary ---

/// Either a metrics list or a bare status tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RunSummaryData {
    Metrics { metrics: Vec<StatCard> },
    Status { status: String },
}

// --- run_timeline ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunTimelineData {
    pub current_step: String,
}

/// Holder of the single current canvas
#[derive(Debug, Clone, Default)]
pub struct CanvasPublisher {
    current: Option<CanvasState>,
    revision: u64,
}

impl CanvasPublisher {
    /// Empty publisher
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole canvas (or clear it)
    pub fn publish(&mut self, canvas: Option<CanvasState>) {
        tracing::debug!(
            canvas = canvas.as_ref().map_or("none", CanvasState::type_tag),
            revision = self.revision + 1,
            "canvas published"
        );
        self.current = canvas;
        self.revision += 1;
    }

    /// Current canvas
    #[inline]
    #[must_use]
    pub fn current(&self) -> Option<&CanvasState> {
        self.current.as_ref()
    }

    /// Number of publishes so far
    #[inline]
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn timeline(step: &str) -> CanvasState {
        CanvasState::new(
            "AI Migration Run — QA",
            CanvasPayload::RunTimeline(RunTimelineData {
                current_step: step.to_string(),
            }),
        )
    }

    #[test]
    fn canvas_serializes_type_title_data() {
        let json = serde_json::to_value(timeline("Deploy to QA")).unwrap();
        assert_eq!(
            json,
            json!({
                "type": "run_timeline",
                "title": "AI Migration Run — QA",
                "data": { "current_step": "Deploy to QA" }
            })
        );
    }

    #[test]
    fn type_tags_match_serialized_tags() {
        let payloads = [
            CanvasPayload::ScanScope(ScanScopeData::default()),
            CanvasPayload::RunSummary(RunSummaryData::Status {
                status: "SUCCESS".into(),
            }),
            CanvasPayload::ReplayProgress(ReplayProgressData {
                suite_name: "suite".into(),
                scenarios: 4,
                status: "Ready".into(),
                live_log: None,
            }),
        ];
        for payload in payloads {
            let tag = payload.type_tag();
            let json = serde_json::to_value(CanvasState::new("t", payload)).unwrap();
            assert_eq!(json["type"], tag);
            assert!(CANVAS_TYPES.contains(&tag));
        }
    }

    #[test]
    fn inventory_rows_use_type_field() {
        let row = InventoryRow {
            name: "Volume Discount".into(),
            kind: "Price Rule".into(),
            usage: "62% coverage".into(),
            complexity: "High".into(),
        };
        let json = serde_json::to_value(row).unwrap();
        assert_eq!(json["type"], "Price Rule");
        assert!(json.get("kind").is_none());
    }

    #[test]
    fn confirmation_fields_keep_authored_order() {
        let mut fields = IndexMap::new();
        fields.insert("Tier 1 Min".to_string(), "10".to_string());
        fields.insert("Tier 1 %".to_string(), "5.0".to_string());
        let text = serde_json::to_string(&Confirmation {
            question: "Confirm Tiers".into(),
            fields,
        })
        .unwrap();
        assert!(text.find("Tier 1 Min").unwrap() < text.find("Tier 1 %").unwrap());
    }

    #[test]
    fn unknown_type_means_nothing_to_show() {
        let value = json!({ "type": "hologram", "title": "?", "data": {} });
        assert!(CanvasState::from_json(&value).is_none());
    }

    #[test]
    fn publish_replaces_wholesale() {
        let mut publisher = CanvasPublisher::new();
        publisher.publish(Some(timeline("Deploy to QA")));
        publisher.publish(Some(CanvasState::new(
            "QA Run Summary — Phase 1",
            CanvasPayload::RunSummary(RunSummaryData::Status {
                status: "SUCCESS".into(),
            }),
        )));

        let current = publisher.current().unwrap();
        assert_eq!(current.type_tag(), "run_summary");
        assert_eq!(publisher.revision(), 2);

        publisher.publish(None);
        assert!(publisher.current().is_none());
    }
}
