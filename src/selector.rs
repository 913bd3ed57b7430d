//! Topology selection.
//!
//! Picks the active layout for a run from, in order: the run config's
//! explicit preset id, a most-specific-first scan for signature stage names
//! observed in telemetry, a backend-supplied dynamic layout, and finally the
//! hardcoded default. Selection is deterministic for identical inputs and is
//! re-evaluated on every refresh; because a run's config is immutable, the
//! result is effectively final once the run record is known.

use std::borrow::Cow;

use rustc_hash::FxHashSet;

use crate::registry::{Topology, TopologyRegistry};
use crate::telemetry::RunSnapshot;

/// How the active topology was chosen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionSource {
    /// Exact match on the run config's explicit preset id.
    Preset,
    /// A signature stage name unique to the variant was observed.
    Signature,
    /// Backend-supplied dynamic layout.
    Dynamic,
    /// Hardcoded default layout.
    Default,
}

/// The selected topology plus how it was chosen.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectedTopology<'a> {
    pub topology: Cow<'a, Topology>,
    pub source: SelectionSource,
}

/// Select the active topology for a snapshot.
///
/// Preset matching is exact: `"v4_algorithm"` selects the v4-algorithm
/// variant even though its stage names overlap with plain `"v4"`.
#[must_use]
pub fn select_topology<'a>(
    registry: &'a TopologyRegistry,
    snapshot: &RunSnapshot,
) -> SelectedTopology<'a> {
    if let Some(preset) = snapshot.preset()
        && let Some(topology) = registry.get(preset)
    {
        return SelectedTopology {
            topology: Cow::Borrowed(topology),
            source: SelectionSource::Preset,
        };
    }

    let observed: FxHashSet<&str> = snapshot.observed_stage_names();
    for topology in registry.specialized() {
        if topology
            .signatures
            .iter()
            .any(|sig| observed.contains(sig.as_str()))
        {
            return SelectedTopology {
                topology: Cow::Borrowed(topology),
                source: SelectionSource::Signature,
            };
        }
    }

    if let Some(layout) = &snapshot.dynamic_layout
        && !layout.columns.is_empty()
    {
        tracing::debug!(run = ?snapshot.run.as_ref().map(|r| r.id), "using backend dynamic layout");
        return SelectedTopology {
            topology: Cow::Owned(Topology::from_dynamic_layout(layout)),
            source: SelectionSource::Dynamic,
        };
    }

    SelectedTopology {
        topology: Cow::Borrowed(registry.default_topology()),
        source: SelectionSource::Default,
    }
}
