//! Discover phase: welcome, scan and inventory (`S0`..`S5`)

use super::{
    row, stat, strings, MIGRATION_AGENT, NAVIGATOR_AGENT, PLANNER_AGENT, SCANNER_AGENT, TOAST,
};
use crate::canvas::{
    AreaCard, CanvasPayload, CanvasState, DependencyMapData, GraphNode, RadarSummary, RadarTab,
    ScanProgressData, ScanScopeData, ScopeEntry, UsageRadarData,
};
use crate::error::RecipeError;
use crate::mission::{MissionPatch, MissionState};
use crate::scenes::{SceneRecipe, SceneRegistry, TaskPlan};
use crate::tasks::{AgentTask, StepStatus, TaskPatch};
use crate::types::{ActionButton, Utterance};

const SCAN_STEPPER: [&str; 4] = [
    "Discover activity",
    "Index rules",
    "Map dependencies",
    "Summarize health",
];

pub(super) fn register(registry: &mut SceneRegistry) -> Result<(), RecipeError> {
    registry.register("S0", welcome())?;
    registry.register("S1", scan_scope())?;
    registry.register("S2", scanning())?;
    registry.register("S3", usage_radar())?;
    registry.register("S4", inventory_health())?;
    registry.register("S5", dependency_map())?;
    Ok(())
}

fn welcome() -> SceneRecipe {
    let scope = [
        "Quotes + Quote Lines",
        "Products + Price Books",
        "Bundles + Options",
        "Pricing (Price Rules, Discount Schedules)",
        "Approvals",
        "Quote Documents/Templates",
    ]
    .into_iter()
    .map(|name| ScopeEntry {
        name: name.to_string(),
        enabled: true,
    })
    .collect();

    SceneRecipe::new()
        .mission(MissionPatch::reset_to(MissionState::initial()))
        .say(Utterance::system(
            MIGRATION_AGENT,
            "Welcome to Agentic Migration. I am your Master Orchestrator. I've assembled a specialized agent team to handle your CPQ to RCA transition.",
        ))
        .say(
            Utterance::assistant(
                NAVIGATOR_AGENT,
                "Hi Maya. I'm the Navigator. I'll guide the strategy. We migrate by priority: usage-first, parity-proven. Ready to scan the org?",
            )
            .with_actions(vec![
                ActionButton::navigate("Start scan", "start_scan", "S2"),
                ActionButton::navigate("What will you scan?", "view_scope", "S1"),
            ]),
        )
        .canvas(CanvasState::new(
            "Connect & Scan",
            CanvasPayload::ScanScope(ScanScopeData {
                connection_status: Some("Connected to Salesforce — Read-only scan mode".into()),
                window: Some("Last 90 days".into()),
                scope,
                note: Some("We’ll introduce RCA objects only after Phase 1 scope is set.".into()),
            }),
        ))
}

fn scan_scope() -> SceneRecipe {
    SceneRecipe::new()
        .mission(MissionPatch::new().phase("Discover").progress(5))
        .say(Utterance::system(
            MIGRATION_AGENT,
            "I'm deploying the Org Scanner Agent to map your metadata topology.",
        ))
        .say(
            Utterance::assistant(
                SCANNER_AGENT,
                "I am ready. I can discover your entire CPQ implementation, including data volume, metadata dependencies, and custom scripts. Shall we build the inventory?",
            )
            .with_actions(vec![
                ActionButton::navigate("Scan Org", "scan_org", "S2"),
                ActionButton::effect("Load previous scan", "load_scan", TOAST),
            ]),
        )
        .canvas(CanvasState::new(
            "Scan Configuration",
            CanvasPayload::ScanScope(ScanScopeData::default()),
        ))
}

fn scan_progress(current_step: &str, progress: f64) -> CanvasState {
    CanvasState::new(
        "Scan in progress",
        CanvasPayload::ScanProgress(ScanProgressData {
            stepper: strings(&SCAN_STEPPER),
            current_step: current_step.to_string(),
            progress,
            counters: Vec::new(),
        }),
    )
}

fn scanning() -> SceneRecipe {
    let task = AgentTask::new("task_scan_01", "Scanning CPQ Inventory", "Connecting...")
        .step("1", "Scan Product Objects", StepStatus::Running)
        .step("2", "Analyze Price Rules", StepStatus::Pending)
        .step("3", "Map Dependencies", StepStatus::Pending);

    SceneRecipe::new()
        .mission(MissionPatch::new().progress(12).jobs_running(1))
        .say(Utterance::system(
            MIGRATION_AGENT,
            "Scanner, please proceed with the connection. Analyze usage frequency to determine highest value targets.",
        ))
        .say(
            Utterance::assistant(
                SCANNER_AGENT,
                "On it. Connecting to Salesforce Metadata API now. I'll prioritize what impacts quotes most.",
            )
            .with_reasoning(&[
                "Connecting to Salesforce Metadata API...",
                "Querying SBQQ__QuoteLine__c for usage frequency...",
                "Identifying top 5 artifacts affecting Total Price.",
            ]),
        )
        .canvas(scan_progress("Discover activity", 0.1))
        .task(
            TaskPlan::new(task)
                .update_with_canvas(
                    2_500,
                    TaskPatch::new()
                        .status("Mapping dependencies...")
                        .step("1", StepStatus::Completed)
                        .step("2", StepStatus::Completed)
                        .step("3", StepStatus::Running),
                    scan_progress("Map dependencies", 0.6),
                )
                .update(5_000, TaskPatch::complete("Complete"))
                .advance(5_000, "S3"),
        )
}

fn area_card(
    area: &str,
    icon: &str,
    (total_items, active_items, active_percent): (u32, u32, u32),
    usage_coverage: &str,
    usage_count: &str,
    insight: &str,
    link_to_tab: &str,
) -> AreaCard {
    AreaCard {
        area: area.to_string(),
        icon: icon.to_string(),
        total_items,
        active_items,
        active_percent,
        usage_coverage: usage_coverage.to_string(),
        usage_count: usage_count.to_string(),
        insight: insight.to_string(),
        link_to_tab: link_to_tab.to_string(),
    }
}

fn radar_data() -> UsageRadarData {
    let tabs = [
        ("summary", "Summary"),
        ("quotes", "Quotes + Quote Lines"),
        ("products", "Products + Price Books"),
        ("bundles", "Bundles + Options"),
        ("pricing", "Pricing (Price Rules...)"),
        ("approvals", "Approvals"),
        ("documents", "Quote Documents"),
    ]
    .into_iter()
    .map(|(id, label)| RadarTab {
        id: id.to_string(),
        label: label.to_string(),
    })
    .collect();

    let summary = RadarSummary {
        stats: vec![
            stat("Total Artifacts", "1,453", "Active"),
            stat("High Complexity", "12", "Critical"),
            stat("Migration Effort", "4 Weeks", "Est."),
        ],
        area_cards: vec![
            area_card("Volume Discount", "activity", (12, 9, 75), "62%", "8,942", "High complexity, 3 scripts found", "pricing"),
            area_card("Approval Rules", "shield", (4, 2, 50), "22%", "3,168", "Logic mixed with triggers", "approvals"),
            area_card("Product Bundles", "layers", (8, 5, 63), "41%", "5,904", "Mostly standard structure", "bundles"),
            area_card("Quote Templates", "file-text", (3, 2, 67), "12%", "1,728", "Visualforce pages detected", "documents"),
            area_card("Product Objects", "database", (1204, 434, 36), "100%", "14,400", "Large SKU catalog", "products"),
            area_card("Pricing Scripts", "code", (5, 3, 60), "45%", "6,480", "Custom QCP logic detected", "pricing"),
        ],
        top_priority: vec![
            row("Volume Discount (Seat Tiers)", "Price Rule", "62% of Quotes", "High"),
            row("Laptop Package Bundle", "Product Bundle", "310 Quotes/mo", "Medium"),
            row("Partner Rebate Logic", "Price Rule", "45% of Quotes", "High"),
            row("Discount > 15% Approval", "Approval Rule", "224 Triggers/mo", "Low"),
            row("Enterprise Quote Template", "Quote Template", "12% of Quotes", "Medium"),
        ],
    };

    UsageRadarData {
        tabs,
        summary,
        quotes: vec![
            row("SBQQ__QuoteLine__c", "Object", "1.2M Records", "Low"),
            row("SBQQ__Quote__c", "Object", "145k Records", "Low"),
            row("Quote Line Group", "Object", "45k Records", "Low"),
        ],
        products: vec![
            row("Hardware Family", "Product Family", "85 active SKUs", "Low"),
            row("Software Licenses", "Product Family", "12 active SKUs", "Medium"),
            row("Maintenance Packs", "Product Family", "4 active SKUs", "Low"),
        ],
        bundles: vec![
            row("Laptop Package Bundle", "Bundle", "Top 1 used", "Medium"),
            row("Server Rack Config", "Bundle", "Top 2 used", "High"),
            row("Workstation Setup", "Bundle", "Top 3 used", "Low"),
        ],
        pricing: vec![
            row("Volume Discount (Seat Tiers)", "Price Rule", "62% coverage", "High"),
            row("Partner Rebate Logic", "Price Rule", "45% coverage", "High"),
            row("Region Adjustment Script", "QCP Script", "100% coverage", "Critical"),
            row("Distributor Margin", "Price Rule", "15% coverage", "Medium"),
        ],
        approvals: vec![
            row("Discount > 15%", "Approval Rule", "224 triggers", "Low"),
            row("Payment Terms > Net30", "Approval Rule", "56 triggers", "Low"),
            row("Legal Review (Custom)", "Approval Chain", "12 triggers", "Medium"),
        ],
        documents: vec![
            row("Enterprise Quote PDF v3", "Template", "Default", "Medium"),
            row("Partner Quote PDF", "Template", "Secondary", "Low"),
            row("Order Form (Signed)", "Content", "Rare", "Low"),
        ],
    }
}

fn usage_radar() -> SceneRecipe {
    SceneRecipe::new()
        .mission(MissionPatch::new().progress(20).jobs_running(0))
        .say(
            Utterance::assistant(
                SCANNER_AGENT,
                "Scan complete. I found 14 active CPQ artifacts. The 'Usage Radar' shows that 62% of your quote volume relies on just 5 complex Price Rules. We should migrate those first.",
            )
            .with_actions(vec![ActionButton::navigate(
                "View Inventory Health",
                "view_health",
                "S4",
            )]),
        )
        .canvas(CanvasState::new(
            "Usage Radar — Complexity vs. Impact",
            CanvasPayload::UsageRadar(Box::new(radar_data())),
        ))
}

// Health numbers live in the radar summary, so the canvas stays.
fn inventory_health() -> SceneRecipe {
    SceneRecipe::new()
        .mission(MissionPatch::new().progress(25))
        .say(
            Utterance::assistant(
                SCANNER_AGENT,
                "The inventory scan is complete. I've identified the high-complexity artifacts. Let's analyze the dependency chains next.",
            )
            .with_actions(vec![ActionButton::navigate(
                "Analyze Dependencies",
                "view_deps",
                "S5",
            )]),
        )
}

fn dependency_map() -> SceneRecipe {
    let nodes = [
        ("bundle", "Laptop Package", "Bundle"),
        ("opt1", "CPU Option", "Option"),
        ("opt2", "RAM Option", "Option"),
        ("opt3", "SSD Option", "Option"),
        ("field1", "Seat Count", "Field"),
        ("field2", "Region", "Field"),
        ("rule1", "Volume Discount", "Price Rule"),
        ("rule2", "Partner Rebate", "Price Rule"),
        ("pr1", "Compat Rule", "Product Rule"),
        ("appr", "Disc > 15%", "Approval"),
        ("doc", "Quote PDF", "Template"),
    ]
    .into_iter()
    .map(|(id, label, kind)| GraphNode {
        id: id.to_string(),
        label: label.to_string(),
        kind: kind.to_string(),
    })
    .collect();

    SceneRecipe::new()
        .mission(MissionPatch::new().progress(30))
        .say(
            Utterance::assistant(
                PLANNER_AGENT,
                "I've mapped the dependencies. The Volume Discount logic feeds into the Partner Rebate program. We must migrate them together to avoid breaking the calculation chain.",
            )
            .with_actions(vec![ActionButton::navigate(
                "Generate Phase 1 Proposal",
                "gen_proposal",
                "S6_80",
            )]),
        )
        .canvas(CanvasState::new(
            "Dependency Graph — Volume Discount",
            CanvasPayload::DependencyMap(DependencyMapData { nodes }),
        ))
}
