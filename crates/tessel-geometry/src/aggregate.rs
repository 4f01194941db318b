//! Aggregation of a shape tree into contiguous root buffers.
//!
//! Two passes over the tree:
//!
//! 1. [`aggregate`] walks post-order. Leaves claim the next vertex and index
//!    offsets of each pass and renumber their indices; groups sum their
//!    children's counts and take their start and end markers from the first
//!    and last non-empty child.
//! 2. [`copy_to_root`] writes each leaf's arrays into the root buffers at
//!    the claimed offsets.
//!
//! Both passes are idempotent: running them again without changes yields
//! identical buffers.

use crate::tree::{NodeId, ShapeNode};
use crate::{PassCounters, TessGeometry};
use tessel_core::alloc::HashMap;
use tessel_core::profiling::profile_function;

/// Outcome of one [`ShapeTree::prepare`](crate::ShapeTree::prepare).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateStats {
    /// Leaves tessellated again because they were stale.
    pub retessellated: usize,
    /// Leaves whose geometry exceeded the limits and was dropped.
    pub aborted: Vec<NodeId>,
    /// Root vertex and index totals per pass.
    pub totals: PassCounters,
    /// Whether the structural passes ran at all.
    pub aggregated: bool,
}

/// Assign offsets below `id` and return the running totals in `counters`.
pub fn aggregate(nodes: &mut HashMap<NodeId, ShapeNode>, id: NodeId, counters: &mut PassCounters) {
    profile_function!();

    let children = match nodes.get_mut(&id) {
        Some(node) if node.is_group() => node.children.clone(),
        Some(node) => {
            node.tess.assign_offsets(counters);
            return;
        }
        None => return,
    };

    for &child in &children {
        aggregate(nodes, child, counters);
    }

    let mut ranges = TessGeometry::new();
    for child in &children {
        if let Some(child) = nodes.get(child) {
            ranges.set_first(&child.tess);
            ranges.add_counts(&child.tess);
            ranges.set_last(&child.tess);
        }
    }
    if let Some(node) = nodes.get_mut(&id) {
        node.tess = ranges;
    }
}

/// Copy every leaf below `id` into `root` at its assigned offsets.
///
/// `root` must already be sized to the totals [`aggregate`] produced.
pub fn copy_to_root(nodes: &HashMap<NodeId, ShapeNode>, id: NodeId, root: &mut TessGeometry) {
    let Some(node) = nodes.get(&id) else {
        return;
    };
    if node.is_group() {
        for &child in &node.children {
            copy_to_root(nodes, child, root);
        }
    } else {
        node.tess.copy_into(root);
    }
}
