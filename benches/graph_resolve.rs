//! Benchmarks for snapshot resolution.
//!
//! These benchmarks measure the performance of:
//! - Full view resolution against built-in topologies
//! - Resolution of backend-provided dynamic layouts
//! - Fan-out expansion under wide sibling groups
//! - Revision-keyed view caching

use chrono::{TimeZone, Utc};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use uuid::Uuid;

use stagegraph::graphs::{ViewCache, resolve_view};
use stagegraph::registry::TopologyRegistry;
use stagegraph::telemetry::{
    DynamicLayout, ExecutionPathRecord, PathStageEntry, RunRecord, RunSnapshot,
    StageExecutionRecord, TraversedEdge,
};
use stagegraph::types::{RunStatus, StageStatus};

fn exec_at(run_id: Uuid, stage: &str, minute: u32) -> StageExecutionRecord {
    let mut rec = StageExecutionRecord::new(run_id, stage, StageStatus::Success);
    rec.started_at = Some(
        Utc.with_ymd_and_hms(2026, 8, 1, minute / 60, minute % 60, 0)
            .unwrap(),
    );
    rec
}

/// Snapshot mid-run on a built-in preset, with records and a path for
/// every declared stage so the resolver exercises all its sources.
fn preset_snapshot(preset: &str) -> RunSnapshot {
    let registry = TopologyRegistry::builtin();
    let topology = registry.get(preset).expect("built-in preset");
    let run_id = Uuid::new_v4();

    let stages: Vec<String> = topology
        .declared_stages()
        .into_iter()
        .map(String::from)
        .collect();
    let executions: Vec<StageExecutionRecord> = stages
        .iter()
        .enumerate()
        .map(|(i, stage)| exec_at(run_id, stage, i as u32))
        .collect();

    let mut path = ExecutionPathRecord::default();
    for stage in &stages {
        path.executed.push(PathStageEntry {
            stage: stage.clone(),
            status: StageStatus::Success,
            retries: 0,
            duration_ms: None,
            started_at: None,
            finished_at: None,
        });
    }
    for pair in stages.windows(2) {
        path.edges_taken
            .push(TraversedEdge::new(&pair[0], &pair[1]));
    }

    RunSnapshot::default()
        .with_run(RunRecord::new(run_id, RunStatus::Running).with_preset(preset))
        .with_executions(executions)
        .with_path(path)
}

/// Snapshot whose shape comes entirely from a backend layout.
fn dynamic_snapshot(columns: usize, rows: usize) -> RunSnapshot {
    let run_id = Uuid::new_v4();
    let mut layout = DynamicLayout::default();
    let mut executions = Vec::new();
    for col in 0..columns {
        let mut names = Vec::with_capacity(rows);
        for row in 0..rows {
            let name = format!("C{col}_R{row}");
            executions.push(exec_at(run_id, &name, (col * rows + row) as u32));
            names.push(name);
        }
        layout.columns.push(names);
    }
    RunSnapshot::default()
        .with_run(RunRecord::new(run_id, RunStatus::Running))
        .with_executions(executions)
        .with_dynamic_layout(layout)
}

/// Snapshot with one fan-out stage expanded `width` ways.
fn fan_out_snapshot(width: usize) -> RunSnapshot {
    let run_id = Uuid::new_v4();
    let executions: Vec<StageExecutionRecord> = (0..width)
        .map(|i| {
            let mut rec = exec_at(run_id, "scene_generator", i as u32);
            rec.scene_id = Some(format!("scene_{i}"));
            rec
        })
        .collect();
    RunSnapshot::default()
        .with_run(RunRecord::new(run_id, RunStatus::Running).with_preset("v4"))
        .with_executions(executions)
}

fn bench_resolve_presets(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_view");
    let registry = TopologyRegistry::builtin();

    for preset in ["had", "v4", "v4_algorithm", "default"] {
        let snapshot = preset_snapshot(preset);
        group.bench_with_input(
            BenchmarkId::new("preset", preset),
            &snapshot,
            |b, snapshot| {
                b.iter(|| resolve_view(&registry, snapshot));
            },
        );
    }

    group.finish();
}

fn bench_resolve_dynamic(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_dynamic");
    let registry = TopologyRegistry::builtin();

    for (columns, rows) in [(5, 2), (10, 5), (20, 10)] {
        let snapshot = dynamic_snapshot(columns, rows);
        group.bench_with_input(
            BenchmarkId::new("layout", format!("{columns}x{rows}")),
            &snapshot,
            |b, snapshot| {
                b.iter(|| resolve_view(&registry, snapshot));
            },
        );
    }

    group.finish();
}

fn bench_fan_out_expansion(c: &mut Criterion) {
    let mut group = c.benchmark_group("fan_out_expansion");
    let registry = TopologyRegistry::builtin();

    for width in [4, 16, 64] {
        let snapshot = fan_out_snapshot(width);
        group.bench_with_input(
            BenchmarkId::new("siblings", width),
            &snapshot,
            |b, snapshot| {
                b.iter(|| resolve_view(&registry, snapshot));
            },
        );
    }

    group.finish();
}

fn bench_view_cache(c: &mut Criterion) {
    let mut group = c.benchmark_group("view_cache");
    let registry = TopologyRegistry::builtin();
    let mut snapshot = preset_snapshot("default");
    snapshot.revision = 1;

    group.bench_function("hit", |b| {
        let mut cache = ViewCache::new();
        cache.get_or_resolve(&registry, &snapshot);
        b.iter(|| cache.get_or_resolve(&registry, &snapshot));
    });

    group.bench_function("miss", |b| {
        let mut cache = ViewCache::new();
        b.iter(|| {
            snapshot.revision += 1;
            cache.get_or_resolve(&registry, &snapshot)
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_resolve_presets,
    bench_resolve_dynamic,
    bench_fan_out_expansion,
    bench_view_cache,
);

criterion_main!(benches);
