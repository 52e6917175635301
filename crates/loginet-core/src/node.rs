//! Node variants and their per-tick behaviour.
//!
//! A node is a positioned actor in the network. Three variants exist:
//!
//! - [`Mine`] -- produces a good from nothing and exports it.
//! - [`Factory`] -- consumes stored materials to produce a good, then exports it.
//! - [`CustomerPoint`] -- receives a good and tallies it. Terminal demand sink.
//!
//! Dispatch goes through [`NodeBody`] (enum match, no trait objects). Each
//! variant's `step` swaps in a per-tick capacity, runs its phases in a fixed
//! order, and restores the configured capacity.

use crate::goods::{GoodRegistry, GoodType};
use crate::id::{GoodTypeId, NodeId};
use crate::item::Unit;
use crate::position::Position;
use crate::transport::{DelayLine, Shipment};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Fatal consistency violations raised while a node steps.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NodeError {
    /// A delivered unit's good is not one the node stores. Signals a wiring
    /// defect; the simulation must not continue.
    #[error("{kind} {node:?} accepted a unit of {good:?} it does not store (stores {stores:?})")]
    MisroutedDelivery {
        node: NodeId,
        kind: NodeKind,
        good: GoodTypeId,
        stores: Vec<GoodTypeId>,
    },
}

// ---------------------------------------------------------------------------
// Kind tag
// ---------------------------------------------------------------------------

/// Discriminant for node variants. Ordered the way a tick visits them under
/// [`TickOrder::ByKind`](crate::network::TickOrder::ByKind).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Mine,
    Factory,
    CustomerPoint,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Mine => "Mine",
            NodeKind::Factory => "Factory",
            NodeKind::CustomerPoint => "Customer Point",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Customer links
// ---------------------------------------------------------------------------

/// A registered customer of a producing node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CustomerLink {
    pub node: NodeId,
    /// Demand weight used for ratio-based export.
    pub weight: u32,
    /// Transit time in ticks. Always >= 1.
    pub delay: u32,
}

/// Split the current output among customers proportionally to their weight.
///
/// Each customer gets `floor(available * weight / total_weight)` units from the
/// front of `output`, in registration order. Whatever the flooring leaves
/// behind stays in `output` for the next tick. One shipment is emitted per
/// customer even when its share is zero.
fn export(output: &mut VecDeque<Unit>, customers: &[CustomerLink]) -> Vec<Shipment> {
    let total_weight: u64 = customers.iter().map(|c| c.weight as u64).sum();
    if total_weight == 0 {
        return Vec::new();
    }
    let available = output.len() as u64;

    customers
        .iter()
        .map(|customer| {
            let allocated = (available * customer.weight as u64 / total_weight) as usize;
            Shipment {
                to: customer.node,
                delay: customer.delay,
                bundle: output.drain(..allocated).collect(),
            }
        })
        .collect()
}

/// Unpack every bundle due this tick into `storage`, one unit at a time.
fn accept_supplies(
    node: NodeId,
    kind: NodeKind,
    arrivals: &mut DelayLine,
    storage: &mut BTreeMap<GoodTypeId, u64>,
) -> Result<(), NodeError> {
    let Some(bucket) = arrivals.drain_front() else {
        return Ok(());
    };
    for mut bundle in bucket {
        while let Some(unit) = bundle.unpack() {
            let Some(count) = storage.get_mut(&unit.good) else {
                tracing::error!(?node, %kind, good = ?unit.good, "misrouted delivery");
                return Err(NodeError::MisroutedDelivery {
                    node,
                    kind,
                    good: unit.good,
                    stores: storage.keys().copied().collect(),
                });
            };
            *count += 1;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Mine
// ---------------------------------------------------------------------------

/// Produces a single good from nothing.
#[derive(Debug, Clone)]
pub struct Mine {
    pub good: GoodTypeId,
    /// Units produced per tick: raw capacity divided by the good's difficulty.
    pub capacity: u32,
    pub customers: Vec<CustomerLink>,
    pub output: VecDeque<Unit>,
    pub total_produced: u64,
}

impl Mine {
    pub fn new(good: GoodTypeId, good_type: &GoodType, raw_capacity: u32) -> Self {
        Self {
            good,
            capacity: good_type.effective_capacity(raw_capacity),
            customers: Vec::new(),
            output: VecDeque::new(),
            total_produced: 0,
        }
    }

    /// Append `capacity` fresh units to the output queue.
    pub fn produce(&mut self) {
        let unit = Unit::new(self.good);
        self.output
            .extend(std::iter::repeat_n(unit, self.capacity as usize));
        self.total_produced += self.capacity as u64;
    }

    pub fn export(&mut self) -> Vec<Shipment> {
        export(&mut self.output, &self.customers)
    }

    pub fn step(&mut self, effective_capacity: u32) -> Vec<Shipment> {
        let configured = std::mem::replace(&mut self.capacity, effective_capacity);
        self.produce();
        let shipments = self.export();
        self.capacity = configured;
        shipments
    }
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

/// Consumes stored materials to manufacture a good.
#[derive(Debug, Clone)]
pub struct Factory {
    pub good: GoodTypeId,
    pub capacity: u32,
    /// Units of each material consumed per unit of output.
    pub requirements: BTreeMap<GoodTypeId, u32>,
    /// Stock per required material. Keys are exactly the requirement keys.
    pub storage: BTreeMap<GoodTypeId, u64>,
    pub suppliers: BTreeMap<GoodTypeId, NodeId>,
    pub customers: Vec<CustomerLink>,
    pub output: VecDeque<Unit>,
    pub arrivals: DelayLine,
    pub total_produced: u64,
}

impl Factory {
    pub fn new(good: GoodTypeId, good_type: &GoodType, raw_capacity: u32) -> Self {
        Self {
            good,
            capacity: good_type.effective_capacity(raw_capacity),
            requirements: good_type.requirements.clone(),
            storage: good_type.requirements.keys().map(|&g| (g, 0)).collect(),
            suppliers: BTreeMap::new(),
            customers: Vec::new(),
            output: VecDeque::new(),
            arrivals: DelayLine::new(),
            total_produced: 0,
        }
    }

    /// Units producible from current stock, ignoring capacity.
    ///
    /// `None` for a factory without requirements.
    pub fn material_sufficient(&self) -> Option<u64> {
        self.requirements
            .iter()
            .map(|(good, &per_unit)| self.storage.get(good).copied().unwrap_or(0) / per_unit as u64)
            .min()
    }

    pub fn accept_supplies(&mut self, id: NodeId) -> Result<(), NodeError> {
        accept_supplies(id, NodeKind::Factory, &mut self.arrivals, &mut self.storage)
    }

    /// Manufacture `min(material_sufficient, capacity)` units and deduct the
    /// materials. Returns the amount produced.
    pub fn produce(&mut self) -> u64 {
        let amount = match self.material_sufficient() {
            Some(sufficient) => sufficient.min(self.capacity as u64),
            None => self.capacity as u64,
        };

        for (good, &per_unit) in &self.requirements {
            if let Some(stock) = self.storage.get_mut(good) {
                // Bounded by material_sufficient, never underflows.
                *stock -= amount * per_unit as u64;
            }
        }

        let unit = Unit::new(self.good);
        self.output.extend(std::iter::repeat_n(unit, amount as usize));
        self.total_produced += amount;
        amount
    }

    pub fn export(&mut self) -> Vec<Shipment> {
        export(&mut self.output, &self.customers)
    }

    /// Accept, produce, export -- in that order, so materials arriving this
    /// tick feed this tick's production.
    pub fn step(&mut self, id: NodeId, effective_capacity: u32) -> Result<Vec<Shipment>, NodeError> {
        let configured = std::mem::replace(&mut self.capacity, effective_capacity);
        let result = self.accept_supplies(id).map(|()| {
            self.produce();
            self.export()
        });
        self.capacity = configured;
        result
    }
}

// ---------------------------------------------------------------------------
// Customer point
// ---------------------------------------------------------------------------

/// Terminal demand sink. Receives a single good and counts it.
#[derive(Debug, Clone)]
pub struct CustomerPoint {
    pub good: GoodTypeId,
    /// Raw demand rate. Not divided by difficulty.
    pub capacity: u32,
    /// Single-entry tally of received units.
    pub storage: BTreeMap<GoodTypeId, u64>,
    pub suppliers: BTreeMap<GoodTypeId, NodeId>,
    pub arrivals: DelayLine,
}

impl CustomerPoint {
    pub fn new(good: GoodTypeId, raw_capacity: u32) -> Self {
        Self {
            good,
            capacity: raw_capacity,
            storage: BTreeMap::from([(good, 0)]),
            suppliers: BTreeMap::new(),
            arrivals: DelayLine::new(),
        }
    }

    /// Units received so far.
    pub fn received(&self) -> u64 {
        self.storage.get(&self.good).copied().unwrap_or(0)
    }

    pub fn accept_supplies(&mut self, id: NodeId) -> Result<(), NodeError> {
        accept_supplies(
            id,
            NodeKind::CustomerPoint,
            &mut self.arrivals,
            &mut self.storage,
        )
    }

    pub fn step(&mut self, id: NodeId, effective_capacity: u32) -> Result<(), NodeError> {
        let configured = std::mem::replace(&mut self.capacity, effective_capacity);
        let result = self.accept_supplies(id);
        self.capacity = configured;
        result
    }
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// Variant-specific state of a node.
#[derive(Debug, Clone)]
pub enum NodeBody {
    Mine(Mine),
    Factory(Factory),
    CustomerPoint(CustomerPoint),
}

/// A positioned actor in the network.
#[derive(Debug, Clone)]
pub struct Node {
    pub position: Position,
    pub body: NodeBody,
}

impl Node {
    pub fn mine(good: GoodTypeId, good_type: &GoodType, raw_capacity: u32, position: Position) -> Self {
        Self {
            position,
            body: NodeBody::Mine(Mine::new(good, good_type, raw_capacity)),
        }
    }

    pub fn factory(
        good: GoodTypeId,
        good_type: &GoodType,
        raw_capacity: u32,
        position: Position,
    ) -> Self {
        Self {
            position,
            body: NodeBody::Factory(Factory::new(good, good_type, raw_capacity)),
        }
    }

    pub fn customer_point(good: GoodTypeId, raw_capacity: u32, position: Position) -> Self {
        Self {
            position,
            body: NodeBody::CustomerPoint(CustomerPoint::new(good, raw_capacity)),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match &self.body {
            NodeBody::Mine(_) => NodeKind::Mine,
            NodeBody::Factory(_) => NodeKind::Factory,
            NodeBody::CustomerPoint(_) => NodeKind::CustomerPoint,
        }
    }

    /// The good this node produces, or accepts for a customer point.
    pub fn good(&self) -> GoodTypeId {
        match &self.body {
            NodeBody::Mine(m) => m.good,
            NodeBody::Factory(f) => f.good,
            NodeBody::CustomerPoint(c) => c.good,
        }
    }

    /// Configured capacity.
    pub fn capacity(&self) -> u32 {
        match &self.body {
            NodeBody::Mine(m) => m.capacity,
            NodeBody::Factory(f) => f.capacity,
            NodeBody::CustomerPoint(c) => c.capacity,
        }
    }

    pub fn is_producer(&self) -> bool {
        !matches!(self.body, NodeBody::CustomerPoint(_))
    }

    /// Goods this node needs and the demand weight it registers with each
    /// producer: per-unit requirement for a factory, raw capacity for a
    /// customer point.
    pub fn demands(&self) -> Vec<(GoodTypeId, u32)> {
        match &self.body {
            NodeBody::Mine(_) => Vec::new(),
            NodeBody::Factory(f) => f.requirements.iter().map(|(&g, &q)| (g, q)).collect(),
            NodeBody::CustomerPoint(c) => vec![(c.good, c.capacity)],
        }
    }

    pub fn suppliers(&self) -> Option<&BTreeMap<GoodTypeId, NodeId>> {
        match &self.body {
            NodeBody::Mine(_) => None,
            NodeBody::Factory(f) => Some(&f.suppliers),
            NodeBody::CustomerPoint(c) => Some(&c.suppliers),
        }
    }

    pub(crate) fn suppliers_mut(&mut self) -> Option<&mut BTreeMap<GoodTypeId, NodeId>> {
        match &mut self.body {
            NodeBody::Mine(_) => None,
            NodeBody::Factory(f) => Some(&mut f.suppliers),
            NodeBody::CustomerPoint(c) => Some(&mut c.suppliers),
        }
    }

    /// Registered customers, in export order. Empty for customer points.
    pub fn customers(&self) -> &[CustomerLink] {
        match &self.body {
            NodeBody::Mine(m) => &m.customers,
            NodeBody::Factory(f) => &f.customers,
            NodeBody::CustomerPoint(_) => &[],
        }
    }

    pub(crate) fn customers_mut(&mut self) -> Option<&mut Vec<CustomerLink>> {
        match &mut self.body {
            NodeBody::Mine(m) => Some(&mut m.customers),
            NodeBody::Factory(f) => Some(&mut f.customers),
            NodeBody::CustomerPoint(_) => None,
        }
    }

    pub fn arrivals(&self) -> Option<&DelayLine> {
        match &self.body {
            NodeBody::Mine(_) => None,
            NodeBody::Factory(f) => Some(&f.arrivals),
            NodeBody::CustomerPoint(c) => Some(&c.arrivals),
        }
    }

    pub fn arrivals_mut(&mut self) -> Option<&mut DelayLine> {
        match &mut self.body {
            NodeBody::Mine(_) => None,
            NodeBody::Factory(f) => Some(&mut f.arrivals),
            NodeBody::CustomerPoint(c) => Some(&mut c.arrivals),
        }
    }

    pub fn storage(&self) -> Option<&BTreeMap<GoodTypeId, u64>> {
        match &self.body {
            NodeBody::Mine(_) => None,
            NodeBody::Factory(f) => Some(&f.storage),
            NodeBody::CustomerPoint(c) => Some(&c.storage),
        }
    }

    /// Units waiting in the output queue.
    pub fn output_len(&self) -> usize {
        match &self.body {
            NodeBody::Mine(m) => m.output.len(),
            NodeBody::Factory(f) => f.output.len(),
            NodeBody::CustomerPoint(_) => 0,
        }
    }

    pub fn total_produced(&self) -> u64 {
        match &self.body {
            NodeBody::Mine(m) => m.total_produced,
            NodeBody::Factory(f) => f.total_produced,
            NodeBody::CustomerPoint(_) => 0,
        }
    }

    /// Run one tick with `effective_capacity` standing in for the configured
    /// capacity. Returns the shipments produced by the export phase.
    pub fn step(&mut self, id: NodeId, effective_capacity: u32) -> Result<Vec<Shipment>, NodeError> {
        match &mut self.body {
            NodeBody::Mine(m) => Ok(m.step(effective_capacity)),
            NodeBody::Factory(f) => f.step(id, effective_capacity),
            NodeBody::CustomerPoint(c) => c.step(id, effective_capacity).map(|()| Vec::new()),
        }
    }

    /// Human-readable description, e.g. `Factory at (3, 4) producing steel`.
    pub fn display<'a>(&'a self, registry: &'a GoodRegistry) -> NodeDisplay<'a> {
        NodeDisplay { node: self, registry }
    }
}

/// Helper returned by [`Node::display`].
pub struct NodeDisplay<'a> {
    node: &'a Node,
    registry: &'a GoodRegistry,
}

impl fmt::Display for NodeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = if self.node.is_producer() {
            "producing"
        } else {
            "accepting"
        };
        write!(
            f,
            "{} at {} {} {}",
            self.node.kind(),
            self.node.position,
            verb,
            self.registry.name(self.node.good())
        )
    }
}
