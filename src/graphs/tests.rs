use chrono::{TimeZone, Utc};
use uuid::Uuid;

use crate::registry::TopologyRegistry;
use crate::resolver::StatusResolver;
use crate::telemetry::{
    ExecutionPathRecord, RunRecord, RunSnapshot, StageExecutionRecord, SubStageRecord,
    TraversedEdge,
};
use crate::types::{RunStatus, StageClass, StageStatus};

use super::builder::{NodeRole, select_node_record};
use super::edges::{EdgeClass, EdgeKind};
use super::{build_graph, resolve_view};

fn exec(stage: &str, status: StageStatus) -> StageExecutionRecord {
    StageExecutionRecord::new(Uuid::nil(), stage, status)
}

fn exec_at(stage: &str, id: &str, hour: u32) -> StageExecutionRecord {
    let mut rec = exec(stage, StageStatus::Success);
    rec.id = id.to_string();
    rec.started_at = Some(Utc.with_ymd_and_hms(2026, 8, 1, hour, 0, 0).unwrap());
    rec
}

fn had_snapshot() -> RunSnapshot {
    let mut path = ExecutionPathRecord::default();
    path.edges_taken
        .push(TraversedEdge::new("zone_planner", "game_orchestrator"));
    RunSnapshot::default()
        .with_run(RunRecord::new(Uuid::nil(), RunStatus::Running).with_preset("had"))
        .with_executions(vec![
            exec("zone_planner", StageStatus::Success),
            exec("game_orchestrator", StageStatus::Running),
        ])
        .with_path(path)
}

#[test]
fn had_topology_renders_all_declared_stages() {
    let registry = TopologyRegistry::builtin();
    let snapshot = had_snapshot();
    let view = resolve_view(&registry, &snapshot);
    assert_eq!(view.topology_id, "had");
    let stages: Vec<&str> = view
        .nodes
        .iter()
        .filter(|n| n.role == NodeRole::Primary)
        .map(|n| n.stage.as_str())
        .collect();
    // output_orchestrator has no telemetry but still renders.
    assert_eq!(
        stages,
        vec!["zone_planner", "game_orchestrator", "output_orchestrator"]
    );
    assert_eq!(
        view.node("output_orchestrator").unwrap().status,
        StageStatus::Pending
    );
}

#[test]
fn had_topology_marks_only_literal_traversals() {
    let registry = TopologyRegistry::builtin();
    let view = resolve_view(&registry, &had_snapshot());
    let traversed: Vec<(&str, &str)> = view
        .edges
        .iter()
        .filter(|e| e.traversed)
        .map(|e| (e.from.as_str(), e.to.as_str()))
        .collect();
    assert_eq!(traversed, vec![("zone_planner", "game_orchestrator")]);
    // The downstream edge exists (generated bipartite) but is untraversed
    // even though one endpoint executed.
    let downstream = view
        .edges
        .iter()
        .find(|e| e.from == "game_orchestrator" && e.to == "output_orchestrator")
        .unwrap();
    assert!(!downstream.traversed);
    assert_eq!(downstream.kind, EdgeKind::Generated);
    assert_eq!(downstream.class, EdgeClass::Dimmed);
}

#[test]
fn default_topology_hides_unexecuted_stages() {
    let registry = TopologyRegistry::builtin();
    let snapshot = RunSnapshot::default().with_run(RunRecord::new(Uuid::nil(), RunStatus::Success));
    let view = resolve_view(&registry, &snapshot);
    assert_eq!(view.topology_id, "default");
    assert!(view.nodes.is_empty());
    assert!(view.edges.is_empty());
}

#[test]
fn specialized_topology_renders_declared_universe_when_empty() {
    let registry = TopologyRegistry::builtin();
    let snapshot = RunSnapshot::default()
        .with_run(RunRecord::new(Uuid::nil(), RunStatus::Success).with_preset("v4"));
    let view = resolve_view(&registry, &snapshot);
    assert_eq!(view.nodes.len(), 6);
    assert!(
        view.nodes
            .iter()
            .all(|n| n.status == StageStatus::Skipped && !n.was_executed)
    );
}

#[test]
fn empty_columns_are_compacted() {
    let registry = TopologyRegistry::builtin();
    // Default topology, telemetry only for stages in raw columns 3 and 8.
    // The preset is explicit because zone_planner would otherwise
    // signature-match a specialized topology.
    let snapshot = RunSnapshot::default()
        .with_run(RunRecord::new(Uuid::nil(), RunStatus::Running).with_preset("default"))
        .with_executions(vec![
            exec("zone_planner", StageStatus::Success),
            exec("output_orchestrator", StageStatus::Running),
        ]);
    let view = resolve_view(&registry, &snapshot);
    let zone = view.node("zone_planner").unwrap();
    let output = view.node("output_orchestrator").unwrap();
    assert_eq!(zone.position.column, 0);
    assert_eq!(output.position.column, 1);
}

#[test]
fn single_stage_centers_on_axis_and_pairs_split() {
    let registry = TopologyRegistry::builtin();
    let snapshot = RunSnapshot::default()
        .with_run(RunRecord::new(Uuid::nil(), RunStatus::Running))
        .with_executions(vec![
            exec("asset_merge", StageStatus::Running),
            exec("balance_validator", StageStatus::Pending),
            exec("playtest_validator", StageStatus::Pending),
        ]);
    let view = resolve_view(&registry, &snapshot);
    assert_eq!(view.node("asset_merge").unwrap().position.lane, 0.0);
    assert_eq!(view.node("balance_validator").unwrap().position.lane, -0.5);
    assert_eq!(view.node("playtest_validator").unwrap().position.lane, 0.5);
}

#[test]
fn fan_out_primary_binds_to_earliest_execution() {
    let registry = TopologyRegistry::builtin();
    let snapshot = RunSnapshot::default()
        .with_run(RunRecord::new(Uuid::nil(), RunStatus::Running).with_preset("v4"))
        .with_executions(vec![
            exec_at("scene_generator", "t3", 3),
            exec_at("scene_generator", "t1", 1),
            exec_at("scene_generator", "t2", 2),
        ]);
    let view = resolve_view(&registry, &snapshot);
    let primary = view.node("scene_generator").unwrap();
    assert_eq!(primary.execution_id.as_deref(), Some("t1"));
    let siblings: Vec<&str> = view
        .nodes
        .iter()
        .filter(|n| matches!(n.role, NodeRole::FanOutSibling { .. }))
        .map(|n| n.execution_id.as_deref().unwrap())
        .collect();
    assert_eq!(siblings, vec!["t2", "t3"]);
}

#[test]
fn fan_out_labels_prefer_scene_then_mechanic_then_ordinal() {
    let registry = TopologyRegistry::builtin();
    let mut with_scene = exec_at("scene_generator", "b", 2);
    with_scene.scene_id = Some("castle".into());
    let mut with_mechanic = exec_at("scene_generator", "c", 3);
    with_mechanic.mechanic_id = Some("traps".into());
    let bare = exec_at("scene_generator", "d", 4);
    let snapshot = RunSnapshot::default()
        .with_run(RunRecord::new(Uuid::nil(), RunStatus::Running).with_preset("v4"))
        .with_executions(vec![exec_at("scene_generator", "a", 1), with_scene, with_mechanic, bare]);
    let view = resolve_view(&registry, &snapshot);
    let labels: Vec<&str> = view
        .nodes
        .iter()
        .filter(|n| matches!(n.role, NodeRole::FanOutSibling { .. }))
        .map(|n| n.label.as_str())
        .collect();
    assert_eq!(labels, vec!["castle", "traps", "#4"]);
}

#[test]
fn compound_stage_expands_into_connected_chain() {
    let registry = TopologyRegistry::builtin();
    let mut rec = exec("game_orchestrator", StageStatus::Running);
    rec.id = "orch".into();
    rec.sub_stages = vec![
        SubStageRecord {
            name: Some("plan".into()),
            status: StageStatus::Success,
            ..SubStageRecord::default()
        },
        SubStageRecord {
            name: Some("dispatch".into()),
            status: StageStatus::Running,
            ..SubStageRecord::default()
        },
    ];
    let snapshot = RunSnapshot::default()
        .with_run(RunRecord::new(Uuid::nil(), RunStatus::Running).with_preset("had"))
        .with_executions(vec![rec]);
    let view = resolve_view(&registry, &snapshot);

    let subs: Vec<&str> = view
        .nodes
        .iter()
        .filter(|n| matches!(n.role, NodeRole::SubStage { .. }))
        .map(|n| n.id.as_str())
        .collect();
    assert_eq!(subs, vec!["game_orchestrator/0", "game_orchestrator/1"]);

    let chain: Vec<(&str, &str)> = view
        .edges
        .iter()
        .filter(|e| e.kind == EdgeKind::SubStageChain)
        .map(|e| (e.from.as_str(), e.to.as_str()))
        .collect();
    assert_eq!(
        chain,
        vec![
            ("game_orchestrator", "game_orchestrator/0"),
            ("game_orchestrator/0", "game_orchestrator/1"),
        ]
    );
}

#[test]
fn selecting_sub_stage_synthesizes_record_shape() {
    let registry = TopologyRegistry::builtin();
    let run_id = Uuid::new_v4();
    let mut rec = StageExecutionRecord::new(run_id, "game_orchestrator", StageStatus::Running);
    rec.id = "orch".into();
    rec.started_at = Some(Utc.with_ymd_and_hms(2026, 8, 1, 9, 0, 0).unwrap());
    rec.sub_stages = vec![SubStageRecord {
        name: Some("plan".into()),
        status: StageStatus::Success,
        duration_ms: Some(1200),
        ..SubStageRecord::default()
    }];
    let snapshot = RunSnapshot::default()
        .with_run(RunRecord::new(run_id, RunStatus::Running).with_preset("had"))
        .with_executions(vec![rec]);
    let view = resolve_view(&registry, &snapshot);
    let sub_node = view.node("game_orchestrator/0").unwrap();
    let detail = select_node_record(&snapshot, sub_node).unwrap();
    assert_eq!(detail.run_id, run_id);
    assert_eq!(detail.status, StageStatus::Success);
    assert_eq!(detail.duration_ms, Some(1200));
    // Parent timestamps carry over when the sub-stage has none.
    assert!(detail.started_at.is_some());
}

#[test]
fn undeclared_stage_renders_with_heuristic_class() {
    let registry = TopologyRegistry::builtin();
    let snapshot = RunSnapshot::default()
        .with_run(RunRecord::new(Uuid::nil(), RunStatus::Running).with_preset("had"))
        .with_executions(vec![exec("surprise_validator", StageStatus::Running)]);
    let view = resolve_view(&registry, &snapshot);
    let node = view.node("surprise_validator").unwrap();
    assert_eq!(node.class, StageClass::Decision);
    // Appended after the declared columns.
    assert_eq!(node.position.column, 3);
}

#[test]
fn escalation_edges_classify_first() {
    let registry = TopologyRegistry::builtin();
    let mut path = ExecutionPathRecord::default();
    path.edges_taken
        .push(TraversedEdge::new("balance_validator", "human_review"));
    let snapshot = RunSnapshot::default()
        .with_run(RunRecord::new(Uuid::nil(), RunStatus::Running))
        .with_executions(vec![
            exec("balance_validator", StageStatus::Success),
            exec("human_review", StageStatus::Running),
        ])
        .with_path(path);
    let view = resolve_view(&registry, &snapshot);
    let edge = view
        .edges
        .iter()
        .find(|e| e.from == "balance_validator" && e.to == "human_review")
        .unwrap();
    assert!(edge.traversed);
    // Escalation outranks traversed coloring.
    assert_eq!(edge.class, EdgeClass::Escalation);
}

#[test]
fn traversal_never_inferred_from_endpoint_success() {
    let registry = TopologyRegistry::builtin();
    // Both endpoints succeeded, but the edge was never taken.
    let snapshot = RunSnapshot::default()
        .with_run(RunRecord::new(Uuid::nil(), RunStatus::Success))
        .with_executions(vec![
            exec("intake", StageStatus::Success),
            exec("concept_planner", StageStatus::Success),
        ])
        .with_path(ExecutionPathRecord::default());
    let view = resolve_view(&registry, &snapshot);
    let edge = view
        .edges
        .iter()
        .find(|e| e.from == "intake" && e.to == "concept_planner")
        .unwrap();
    assert!(!edge.traversed);
    assert_eq!(edge.class, EdgeClass::Dimmed);
}

#[test]
fn resolve_is_idempotent() {
    let registry = TopologyRegistry::builtin();
    let snapshot = had_snapshot();
    let first = resolve_view(&registry, &snapshot);
    let second = resolve_view(&registry, &snapshot);
    assert_eq!(first, second);
}

#[test]
fn build_graph_drops_edges_with_missing_endpoints() {
    let registry = TopologyRegistry::builtin();
    let topology = registry.default_topology();
    // Only intake executed; every declared edge touching a hidden stage
    // must be dropped.
    let snapshot = RunSnapshot::default()
        .with_run(RunRecord::new(Uuid::nil(), RunStatus::Running))
        .with_executions(vec![exec("intake", StageStatus::Running)]);
    let resolver = StatusResolver::new(&snapshot);
    let (nodes, edges) = build_graph(topology, &resolver, &snapshot);
    assert_eq!(nodes.len(), 1);
    assert!(edges.is_empty());
}
