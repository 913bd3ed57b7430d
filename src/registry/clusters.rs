//! Named cluster registry for the cluster view.
//!
//! Clusters are ordered subsets of stage names with display metadata. Like
//! the topology table, the cluster table is built once and never mutated.

/// One named cluster of stages.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cluster {
    pub id: String,
    pub label: String,
    /// Accent color for the cluster header.
    pub color: String,
    /// Member stage names, in display order.
    pub stages: Vec<String>,
}

impl Cluster {
    fn new(id: &str, label: &str, color: &str, stages: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            color: color.to_string(),
            stages: stages.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[must_use]
    pub fn contains(&self, stage: &str) -> bool {
        self.stages.iter().any(|s| s == stage)
    }
}

/// Ordered, immutable table of clusters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClusterRegistry {
    clusters: Vec<Cluster>,
}

impl ClusterRegistry {
    #[must_use]
    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Cluster> {
        self.clusters.iter().find(|c| c.id == id)
    }

    /// The built-in cluster table matching the default topology.
    #[must_use]
    pub fn builtin() -> Self {
        ClusterRegistry {
            clusters: vec![
                Cluster::new(
                    "planning",
                    "Planning",
                    "#3b82f6",
                    &["intake", "concept_planner", "zone_planner", "narrative_designer"],
                ),
                Cluster::new(
                    "generation",
                    "Generation",
                    "#06b6d4",
                    &[
                        "game_orchestrator",
                        "scene_generator",
                        "mechanic_generator",
                        "asset_merge",
                    ],
                ),
                Cluster::new(
                    "validation",
                    "Validation",
                    "#f59e0b",
                    &["balance_validator", "playtest_validator", "human_review"],
                ),
                Cluster::new(
                    "delivery",
                    "Delivery",
                    "#10b981",
                    &["output_orchestrator", "publisher"],
                ),
            ],
        }
    }
}
