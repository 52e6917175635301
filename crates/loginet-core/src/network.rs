//! The logistics network: owns every node and drives ticks.
//!
//! # Lifecycle
//!
//! 1. Build a [`GoodRegistry`] and hand it to [`Network::new`].
//! 2. Add every node (`add_mine`, `add_factory`, `add_customer_point`).
//!    Each good may have exactly one producer.
//! 3. Call [`Network::wire`] once. For every good a node needs it links the
//!    node to that good's sole producer and registers a demand weight.
//! 4. Call [`Network::tick`] (or [`Network::tick_with`] for capacity shocks)
//!    once per simulation step.
//!
//! # Tick semantics
//!
//! Nodes step one at a time, in the order given by [`TickOrder`]. After a
//! node steps, its shipments are scheduled on the recipients' delay lines
//! before the next node runs. A node that fails its step halts the network.

use crate::goods::GoodRegistry;
use crate::id::{GoodTypeId, NodeId};
use crate::node::{CustomerLink, Node, NodeError};
use crate::position::{Position, delivery_delay};
use crate::query::NodeSnapshot;
use crate::sim::{AdvanceResult, SimState, StateHash, TickResult};
use crate::transport::{MAX_DELAY, Shipment};
use slotmap::SlotMap;
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors raised while building, wiring, or ticking a network.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetworkError {
    #[error("good type not in registry: {0:?}")]
    UnknownGood(GoodTypeId),
    #[error("{good:?} already has a producer: {existing:?}")]
    DuplicateProducer { good: GoodTypeId, existing: NodeId },
    #[error("no node produces {good:?}, required by {consumer:?}")]
    NoProducer { good: GoodTypeId, consumer: NodeId },
    #[error("node position {0} is not finite")]
    InvalidPosition(String),
    #[error("{consumer:?} is more than {max} ticks away from its producer {producer:?}")]
    DelayTooLong { producer: NodeId, consumer: NodeId, max: u32 },
    #[error("network is already wired")]
    AlreadyWired,
    #[error("network must be wired before ticking")]
    NotWired,
    #[error("node not found: {0:?}")]
    NodeNotFound(NodeId),
    #[error("shipment addressed to {0:?}, which has no delay line")]
    NotAConsumer(NodeId),
    #[error("network halted after a fatal node error")]
    Halted,
    #[error(transparent)]
    Node(#[from] NodeError),
}

fn check_position(position: &Position) -> Result<(), NetworkError> {
    if position.is_finite() {
        Ok(())
    } else {
        Err(NetworkError::InvalidPosition(position.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tick order
// ---------------------------------------------------------------------------

/// The order nodes are visited within a tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TickOrder {
    /// Insertion order.
    Insertion,
    /// Mines, then factories, then customer points; insertion order within
    /// each kind.
    #[default]
    ByKind,
}

// ---------------------------------------------------------------------------
// Network
// ---------------------------------------------------------------------------

/// Flat arena of nodes plus the producer index used for wiring.
#[derive(Debug, Clone)]
pub struct Network {
    registry: GoodRegistry,
    nodes: SlotMap<NodeId, Node>,
    /// Insertion order. Nodes are never removed.
    insertion: Vec<NodeId>,
    /// The sole producer of each good.
    producers: BTreeMap<GoodTypeId, NodeId>,
    tick_order: TickOrder,
    wired: bool,
    halted: bool,
    pub sim_state: SimState,
}

impl Network {
    pub fn new(registry: GoodRegistry) -> Self {
        Self {
            registry,
            nodes: SlotMap::with_key(),
            insertion: Vec::new(),
            producers: BTreeMap::new(),
            tick_order: TickOrder::default(),
            wired: false,
            halted: false,
            sim_state: SimState::new(),
        }
    }

    pub fn with_tick_order(mut self, order: TickOrder) -> Self {
        self.tick_order = order;
        self
    }

    pub fn set_tick_order(&mut self, order: TickOrder) {
        self.tick_order = order;
    }

    pub fn tick_order(&self) -> TickOrder {
        self.tick_order
    }

    pub fn registry(&self) -> &GoodRegistry {
        &self.registry
    }

    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    /// Add a mine producing `good` at `floor(raw_capacity / difficulty)` per tick.
    pub fn add_mine(
        &mut self,
        good: GoodTypeId,
        raw_capacity: u32,
        position: Position,
    ) -> Result<NodeId, NetworkError> {
        self.check_producer_slot(good)?;
        check_position(&position)?;
        let good_type = self.registry.get(good).ok_or(NetworkError::UnknownGood(good))?;
        let node = Node::mine(good, good_type, raw_capacity, position);
        let id = self.insert(node);
        self.producers.insert(good, id);
        Ok(id)
    }

    /// Add a factory manufacturing `good` from its registered requirements.
    pub fn add_factory(
        &mut self,
        good: GoodTypeId,
        raw_capacity: u32,
        position: Position,
    ) -> Result<NodeId, NetworkError> {
        self.check_producer_slot(good)?;
        check_position(&position)?;
        let good_type = self.registry.get(good).ok_or(NetworkError::UnknownGood(good))?;
        let node = Node::factory(good, good_type, raw_capacity, position);
        let id = self.insert(node);
        self.producers.insert(good, id);
        Ok(id)
    }

    /// Add a customer point demanding `raw_capacity` units of `good` per tick.
    pub fn add_customer_point(
        &mut self,
        good: GoodTypeId,
        raw_capacity: u32,
        position: Position,
    ) -> Result<NodeId, NetworkError> {
        if self.wired {
            return Err(NetworkError::AlreadyWired);
        }
        if self.registry.get(good).is_none() {
            return Err(NetworkError::UnknownGood(good));
        }
        check_position(&position)?;
        Ok(self.insert(Node::customer_point(good, raw_capacity, position)))
    }

    fn check_producer_slot(&self, good: GoodTypeId) -> Result<(), NetworkError> {
        if self.wired {
            return Err(NetworkError::AlreadyWired);
        }
        match self.producers.get(&good) {
            Some(&existing) => Err(NetworkError::DuplicateProducer { good, existing }),
            None => Ok(()),
        }
    }

    fn insert(&mut self, node: Node) -> NodeId {
        let id = self.nodes.insert(node);
        self.insertion.push(id);
        tracing::debug!(?id, node = %self.nodes[id].display(&self.registry), "node added");
        id
    }

    // -----------------------------------------------------------------------
    // Wiring
    // -----------------------------------------------------------------------

    /// Link every consumer to the producer of each good it needs.
    ///
    /// Customers are registered on each producer in node insertion order,
    /// which fixes the export allocation order. Must be called exactly once,
    /// after every node exists. On error nothing is linked.
    pub fn wire(&mut self) -> Result<(), NetworkError> {
        if self.wired {
            return Err(NetworkError::AlreadyWired);
        }

        let mut links: Vec<(NodeId, GoodTypeId, NodeId, CustomerLink)> = Vec::new();
        for &consumer in &self.insertion {
            let node = &self.nodes[consumer];
            for (good, weight) in node.demands() {
                let producer = *self
                    .producers
                    .get(&good)
                    .ok_or(NetworkError::NoProducer { good, consumer })?;
                let mut delay = delivery_delay(&self.nodes[producer].position, &node.position)
                    .filter(|&d| d <= MAX_DELAY)
                    .ok_or(NetworkError::DelayTooLong {
                        producer,
                        consumer,
                        max: MAX_DELAY,
                    })?;
                if delay == 0 {
                    tracing::warn!(
                        ?producer,
                        ?consumer,
                        "producer and customer closer than one unit; delivering next tick"
                    );
                    delay = 1;
                }
                links.push((
                    consumer,
                    good,
                    producer,
                    CustomerLink { node: consumer, weight, delay },
                ));
            }
        }

        for (consumer, good, producer, link) in links {
            if let Some(suppliers) = self.nodes[consumer].suppliers_mut() {
                suppliers.insert(good, producer);
            }
            if let Some(customers) = self.nodes[producer].customers_mut() {
                customers.push(link);
            }
        }

        self.wired = true;
        tracing::debug!(nodes = self.nodes.len(), "network wired");
        Ok(())
    }

    pub fn is_wired(&self) -> bool {
        self.wired
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    // -----------------------------------------------------------------------
    // Ticking
    // -----------------------------------------------------------------------

    /// The order nodes are stepped in under the current [`TickOrder`].
    pub fn step_order(&self) -> Vec<NodeId> {
        let mut order = self.insertion.clone();
        if self.tick_order == TickOrder::ByKind {
            // Stable sort keeps insertion order within a kind.
            order.sort_by_key(|&id| self.nodes[id].kind());
        }
        order
    }

    /// Run one tick with every node at its configured capacity.
    pub fn tick(&mut self) -> Result<TickResult, NetworkError> {
        self.tick_with(&BTreeMap::new())
    }

    /// Run one tick, substituting `overrides[id]` for the capacity of the
    /// listed nodes. Configured capacities are unchanged afterwards.
    pub fn tick_with(
        &mut self,
        overrides: &BTreeMap<NodeId, u32>,
    ) -> Result<TickResult, NetworkError> {
        if self.halted {
            return Err(NetworkError::Halted);
        }
        if !self.wired {
            return Err(NetworkError::NotWired);
        }

        let mut result = TickResult {
            tick: self.sim_state.tick + 1,
            ..TickResult::default()
        };

        for id in self.step_order() {
            let node = self.nodes.get_mut(id).ok_or(NetworkError::NodeNotFound(id))?;
            let capacity = overrides.get(&id).copied().unwrap_or(node.capacity());
            let produced_before = node.total_produced();

            let shipments = match node.step(id, capacity) {
                Ok(shipments) => shipments,
                Err(err) => {
                    self.halted = true;
                    return Err(err.into());
                }
            };
            result.produced += node.total_produced() - produced_before;

            for shipment in shipments {
                result.shipments += 1;
                result.shipped += shipment.bundle.len() as u64;
                if let Err(err) = self.deliver(id, shipment) {
                    self.halted = true;
                    return Err(err);
                }
            }
        }

        self.sim_state.tick = result.tick;
        tracing::debug!(
            tick = result.tick,
            produced = result.produced,
            shipped = result.shipped,
            "tick complete"
        );
        Ok(result)
    }

    /// Run `ticks` ticks at configured capacity, stopping at the first error.
    pub fn advance(&mut self, ticks: u64) -> Result<AdvanceResult, NetworkError> {
        let mut total = AdvanceResult::default();
        for _ in 0..ticks {
            let tick = self.tick()?;
            total.absorb(&tick);
        }
        Ok(total)
    }

    fn deliver(&mut self, from: NodeId, shipment: Shipment) -> Result<(), NetworkError> {
        let to = shipment.to;
        let arrivals = self
            .nodes
            .get_mut(to)
            .ok_or(NetworkError::NodeNotFound(to))?
            .arrivals_mut()
            .ok_or(NetworkError::NotAConsumer(to))?;
        tracing::trace!(
            ?from,
            ?to,
            units = shipment.bundle.len(),
            delay = shipment.delay,
            "shipment scheduled"
        );
        arrivals.schedule(shipment.delay, shipment.bundle);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// The sole producer of `good`, if any.
    pub fn producer_of(&self, good: GoodTypeId) -> Option<NodeId> {
        self.producers.get(&good).copied()
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.insertion.iter().map(|&id| (id, &self.nodes[id]))
    }

    pub fn snapshot_node(&self, id: NodeId) -> Option<NodeSnapshot> {
        self.nodes.get(id).map(|node| NodeSnapshot::capture(id, node))
    }

    /// Snapshots of every node, in insertion order.
    pub fn snapshot_all(&self) -> Vec<NodeSnapshot> {
        self.nodes()
            .map(|(id, node)| NodeSnapshot::capture(id, node))
            .collect()
    }

    /// Deterministic hash over tick counter and every node's observable state.
    pub fn state_hash(&self) -> u64 {
        let mut hash = StateHash::new();
        hash.write_u64(self.sim_state.tick);
        for (_, node) in self.nodes() {
            hash.write_u32(node.kind() as u32);
            hash.write_u32(node.good().0);
            hash.write_u32(node.capacity());
            hash.write_u64(node.output_len() as u64);
            hash.write_u64(node.total_produced());
            if let Some(storage) = node.storage() {
                for (good, &count) in storage {
                    hash.write_u32(good.0);
                    hash.write_u64(count);
                }
            }
            if let Some(arrivals) = node.arrivals() {
                hash.write_u64(arrivals.len() as u64);
                hash.write_u64(arrivals.in_transit());
            }
        }
        hash.finish()
    }
}
