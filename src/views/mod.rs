//! Alternate groupings of the same resolved data.
//!
//! The cluster and timeline views derive everything through the same
//! [`crate::resolver::StatusResolver`] the graph uses, so the three views
//! can never disagree about a stage's status for a given snapshot.

pub mod cluster;
pub mod timeline;

pub use cluster::{ClusterMember, ClusterSummary, cluster_summaries};
pub use timeline::{TimelineEntry, timeline_entries};
