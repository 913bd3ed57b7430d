//! Topology registry: the immutable, declarative table of pipeline layouts.
//!
//! A [`Topology`] arranges stage names into ordered columns (parallel
//! branches share a column) and declares which names are fan-out capable,
//! merge barriers, decision nodes, or orchestrators. The
//! [`TopologyRegistry`] holds every known layout in signature-scan order and
//! is built exactly once; nothing here mutates at runtime — consumers get
//! read-only lookups.
//!
//! # Examples
//!
//! ```rust
//! use stagegraph::registry::TopologyRegistry;
//! use stagegraph::types::StageClass;
//!
//! let registry = TopologyRegistry::builtin();
//! let had = registry.get("had").unwrap();
//! assert!(had.contains("zone_planner"));
//! assert_eq!(had.class_of("game_orchestrator"), Some(StageClass::Orchestrator));
//! ```

pub mod clusters;

pub use clusters::{Cluster, ClusterRegistry};

use rustc_hash::FxHashSet;

use crate::telemetry::DynamicLayout;
use crate::types::{StageClass, classify_stage_name};

/// Static definition of one stage within a topology.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StageDefinition {
    pub name: String,
    /// Raw column index in the registry (before empty-column compaction).
    pub column: usize,
    /// Row index within the column.
    pub row: usize,
    pub class: StageClass,
}

/// Anchor hint for where a declared edge attaches to a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnchorHint {
    Top,
    Bottom,
    Left,
    Right,
}

/// A declared edge in the default topology's explicit edge list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeclaredEdge {
    pub from: String,
    pub to: String,
    pub from_anchor: Option<AnchorHint>,
    pub to_anchor: Option<AnchorHint>,
    /// Marks a path toward a human-checkpoint stage.
    pub escalation: bool,
}

impl DeclaredEdge {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            from_anchor: None,
            to_anchor: None,
            escalation: false,
        }
    }

    pub fn escalation(mut self) -> Self {
        self.escalation = true;
        self
    }

    pub fn anchored(mut self, from: AnchorHint, to: AnchorHint) -> Self {
        self.from_anchor = Some(from);
        self.to_anchor = Some(to);
        self
    }
}

/// One named pipeline layout.
#[derive(Clone, Debug, PartialEq)]
pub struct Topology {
    pub id: String,
    /// Ordered columns of stage names; parallel branches share a column.
    pub columns: Vec<Vec<String>>,
    /// Names that may execute more than once per run.
    pub fan_out: FxHashSet<String>,
    /// Merge/barrier names; excluded from decision classification even when
    /// their name would otherwise match.
    pub merges: FxHashSet<String>,
    pub decisions: FxHashSet<String>,
    pub orchestrators: FxHashSet<String>,
    /// Stage names unique to this variant, used by the signature scan.
    pub signatures: Vec<String>,
    /// Explicit edge list; empty for specialized topologies.
    pub declared_edges: Vec<DeclaredEdge>,
    /// Render every declared stage, executed or not.
    pub render_all: bool,
    /// Synthesize full-bipartite edges between consecutive visible columns
    /// instead of using a declared list.
    pub generated_edges: bool,
}

impl Topology {
    /// Whether this topology declares the stage name.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.columns.iter().flatten().any(|s| s == name)
    }

    /// Raw (column, row) position of a declared stage.
    #[must_use]
    pub fn position_of(&self, name: &str) -> Option<(usize, usize)> {
        self.columns.iter().enumerate().find_map(|(col, stages)| {
            stages
                .iter()
                .position(|s| s == name)
                .map(|row| (col, row))
        })
    }

    /// Declared classification for a stage this topology contains.
    ///
    /// Membership checks run merge-first so barrier stages never classify
    /// as decisions regardless of their name.
    #[must_use]
    pub fn class_of(&self, name: &str) -> Option<StageClass> {
        if !self.contains(name) {
            return None;
        }
        Some(if self.merges.contains(name) {
            StageClass::Merge
        } else if self.decisions.contains(name) {
            StageClass::Decision
        } else if self.orchestrators.contains(name) {
            StageClass::Orchestrator
        } else if self.fan_out.contains(name) {
            StageClass::FanOut
        } else {
            StageClass::Agent
        })
    }

    /// Declared classification, or the central name heuristic for stages
    /// the registry does not know.
    #[must_use]
    pub fn class_or_heuristic(&self, name: &str) -> StageClass {
        self.class_of(name).unwrap_or_else(|| classify_stage_name(name))
    }

    /// Whether the stage may legitimately execute more than once per run.
    #[must_use]
    pub fn is_fan_out(&self, name: &str) -> bool {
        self.fan_out.contains(name)
    }

    /// Full static definition table, in column order.
    #[must_use]
    pub fn stage_definitions(&self) -> Vec<StageDefinition> {
        let mut defs = Vec::new();
        for (column, stages) in self.columns.iter().enumerate() {
            for (row, name) in stages.iter().enumerate() {
                defs.push(StageDefinition {
                    name: name.clone(),
                    column,
                    row,
                    class: self.class_or_heuristic(name),
                });
            }
        }
        defs
    }

    /// Ordered list of every declared stage name.
    #[must_use]
    pub fn declared_stages(&self) -> Vec<&str> {
        self.columns
            .iter()
            .flatten()
            .map(String::as_str)
            .collect()
    }

    /// Build a topology from a backend-supplied dynamic layout.
    ///
    /// Classification comes entirely from the name heuristic; the layout
    /// carries display metadata only and never overrides status resolution.
    /// When the layout supplies no edge list, edges are generated
    /// column-to-column like a specialized topology.
    #[must_use]
    pub fn from_dynamic_layout(layout: &DynamicLayout) -> Self {
        let declared_edges = layout
            .edges
            .iter()
            .map(|e| DeclaredEdge::new(e.from.clone(), e.to.clone()))
            .collect::<Vec<_>>();
        Topology {
            id: "dynamic".to_string(),
            columns: layout.columns.clone(),
            fan_out: FxHashSet::default(),
            merges: FxHashSet::default(),
            decisions: FxHashSet::default(),
            orchestrators: FxHashSet::default(),
            signatures: Vec::new(),
            generated_edges: declared_edges.is_empty(),
            declared_edges,
            render_all: true,
        }
    }
}

/// The ordered, immutable table of every known topology.
///
/// Construction happens once via [`TopologyRegistry::builtin`]; the scan
/// order of [`TopologyRegistry::specialized`] is most-specific-first, which
/// the selector relies on.
#[derive(Clone, Debug, PartialEq)]
pub struct TopologyRegistry {
    topologies: Vec<Topology>,
    default_id: String,
}

impl TopologyRegistry {
    /// Look up a topology by its preset id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Topology> {
        self.topologies.iter().find(|t| t.id == id)
    }

    /// The hardcoded fallback layout.
    #[must_use]
    pub fn default_topology(&self) -> &Topology {
        // The builtin table always contains the default id.
        self.get(&self.default_id)
            .unwrap_or(&self.topologies[0])
    }

    /// Specialized topologies in signature-scan order (most specific first).
    pub fn specialized(&self) -> impl Iterator<Item = &Topology> {
        self.topologies.iter().filter(|t| t.id != self.default_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Topology> {
        self.topologies.iter()
    }

    /// The built-in layout table for the game-content pipeline.
    #[must_use]
    pub fn builtin() -> Self {
        let specialized = |id: &str, columns: Vec<Vec<&str>>, signatures: Vec<&str>| Topology {
            id: id.to_string(),
            columns: columns
                .into_iter()
                .map(|col| col.into_iter().map(str::to_string).collect())
                .collect(),
            fan_out: FxHashSet::default(),
            merges: FxHashSet::default(),
            decisions: FxHashSet::default(),
            orchestrators: FxHashSet::default(),
            signatures: signatures.into_iter().map(str::to_string).collect(),
            declared_edges: Vec::new(),
            render_all: true,
            generated_edges: true,
        };

        let mut v4_algorithm = specialized(
            "v4_algorithm",
            vec![
                vec!["concept_planner"],
                vec!["algorithm_designer"],
                vec!["mechanic_generator"],
                vec!["mechanic_merge"],
                vec!["balance_validator"],
                vec!["output_orchestrator"],
            ],
            vec!["algorithm_designer", "mechanic_merge"],
        );
        v4_algorithm.fan_out.insert("mechanic_generator".into());
        v4_algorithm.merges.insert("mechanic_merge".into());
        v4_algorithm.decisions.insert("balance_validator".into());
        v4_algorithm.orchestrators.insert("output_orchestrator".into());

        let mut v4 = specialized(
            "v4",
            vec![
                vec!["concept_planner"],
                vec!["scene_planner"],
                vec!["scene_generator"],
                vec!["scene_merge"],
                vec!["playtest_validator"],
                vec!["output_orchestrator"],
            ],
            vec!["scene_planner", "scene_merge"],
        );
        v4.fan_out.insert("scene_generator".into());
        v4.merges.insert("scene_merge".into());
        v4.decisions.insert("playtest_validator".into());
        v4.orchestrators.insert("output_orchestrator".into());

        let mut had = specialized(
            "had",
            vec![
                vec!["zone_planner"],
                vec!["game_orchestrator"],
                vec!["output_orchestrator"],
            ],
            vec!["zone_planner"],
        );
        had.orchestrators.insert("game_orchestrator".into());
        had.orchestrators.insert("output_orchestrator".into());

        let mut default = Topology {
            id: "default".to_string(),
            columns: vec![
                vec!["intake"],
                vec!["concept_planner"],
                vec!["game_orchestrator"],
                vec!["zone_planner", "narrative_designer"],
                vec!["scene_generator", "mechanic_generator"],
                vec!["asset_merge"],
                vec!["balance_validator", "playtest_validator"],
                vec!["human_review"],
                vec!["output_orchestrator"],
                vec!["publisher"],
            ]
            .into_iter()
            .map(|col| col.into_iter().map(str::to_string).collect())
            .collect(),
            fan_out: ["scene_generator", "mechanic_generator"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            merges: std::iter::once("asset_merge".to_string()).collect(),
            decisions: ["balance_validator", "playtest_validator"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            orchestrators: ["game_orchestrator", "output_orchestrator"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            signatures: Vec::new(),
            declared_edges: Vec::new(),
            render_all: false,
            generated_edges: false,
        };
        default.declared_edges = vec![
            DeclaredEdge::new("intake", "concept_planner"),
            DeclaredEdge::new("concept_planner", "game_orchestrator"),
            DeclaredEdge::new("game_orchestrator", "zone_planner"),
            DeclaredEdge::new("game_orchestrator", "narrative_designer"),
            DeclaredEdge::new("zone_planner", "scene_generator"),
            DeclaredEdge::new("narrative_designer", "mechanic_generator"),
            DeclaredEdge::new("scene_generator", "asset_merge"),
            DeclaredEdge::new("mechanic_generator", "asset_merge"),
            DeclaredEdge::new("asset_merge", "balance_validator"),
            DeclaredEdge::new("asset_merge", "playtest_validator"),
            DeclaredEdge::new("balance_validator", "human_review")
                .anchored(AnchorHint::Top, AnchorHint::Left)
                .escalation(),
            DeclaredEdge::new("playtest_validator", "human_review")
                .anchored(AnchorHint::Bottom, AnchorHint::Left)
                .escalation(),
            DeclaredEdge::new("balance_validator", "output_orchestrator"),
            DeclaredEdge::new("playtest_validator", "output_orchestrator"),
            DeclaredEdge::new("human_review", "output_orchestrator"),
            DeclaredEdge::new("output_orchestrator", "publisher"),
        ];

        TopologyRegistry {
            // Scan order matters: v4_algorithm before v4 so the more
            // specific signature wins when names overlap.
            topologies: vec![v4_algorithm, v4, had, default],
            default_id: "default".to_string(),
        }
    }
}
