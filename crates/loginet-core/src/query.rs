//! Read-only query API for inspecting simulation state.
//!
//! Snapshot types are owned copies -- no references into network storage --
//! so drivers can collect statistics between ticks.

use crate::id::{GoodTypeId, NodeId};
use crate::node::{Node, NodeKind};
use crate::position::Position;
use std::collections::BTreeMap;

/// An aggregated, read-only view of a single node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSnapshot {
    pub id: NodeId,
    pub kind: NodeKind,
    /// Produced good, or accepted good for a customer point.
    pub good: GoodTypeId,
    pub position: Position,
    /// Configured capacity.
    pub capacity: u32,
    /// Units waiting in the output queue. Always 0 for customer points.
    pub output_backlog: usize,
    /// Units manufactured since construction. Always 0 for customer points.
    pub total_produced: u64,
    /// Material stock (factory) or received tally (customer point).
    pub storage: BTreeMap<GoodTypeId, u64>,
    /// Units still travelling towards this node.
    pub in_transit: u64,
    pub customer_count: usize,
}

impl NodeSnapshot {
    pub(crate) fn capture(id: NodeId, node: &Node) -> Self {
        Self {
            id,
            kind: node.kind(),
            good: node.good(),
            position: node.position,
            capacity: node.capacity(),
            output_backlog: node.output_len(),
            total_produced: node.total_produced(),
            storage: node.storage().cloned().unwrap_or_default(),
            in_transit: node.arrivals().map(|a| a.in_transit()).unwrap_or(0),
            customer_count: node.customers().len(),
        }
    }

    /// Sum of all storage entries.
    pub fn stored_total(&self) -> u64 {
        self.storage.values().sum()
    }
}
