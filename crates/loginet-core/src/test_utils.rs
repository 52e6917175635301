//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use crate::fixed::{Fixed64, f64_to_fixed64};
use crate::goods::{GoodRegistry, GoodRegistryBuilder};
use crate::id::{GoodTypeId, NodeId};
use crate::network::Network;
use crate::position::Position;
use std::collections::BTreeMap;

// ===========================================================================
// Fixed-point helper
// ===========================================================================

pub fn fixed(v: f64) -> Fixed64 {
    f64_to_fixed64(v)
}

pub fn at(x: f64, y: f64) -> Position {
    Position::new(x, y)
}

// ===========================================================================
// Standard goods
// ===========================================================================

/// IDs of the goods in [`standard_registry`].
#[derive(Debug, Clone, Copy)]
pub struct StandardGoods {
    /// Raw, difficulty 1.
    pub iron_ore: GoodTypeId,
    /// Raw, difficulty 2.
    pub coal: GoodTypeId,
    /// 2 iron ore per plate, difficulty 1.
    pub iron_plate: GoodTypeId,
    /// 1 iron plate + 1 coal per unit, difficulty 1.
    pub steel: GoodTypeId,
}

/// A small registry covering raw goods, a single-input and a two-input recipe.
pub fn standard_registry() -> (GoodRegistry, StandardGoods) {
    let mut builder = GoodRegistryBuilder::new();
    let iron_ore = builder.register_raw("iron_ore", fixed(1.0)).unwrap();
    let coal = builder.register_raw("coal", fixed(2.0)).unwrap();
    let iron_plate = builder
        .register("iron_plate", fixed(1.0), BTreeMap::from([(iron_ore, 2)]))
        .unwrap();
    let steel = builder
        .register(
            "steel",
            fixed(1.0),
            BTreeMap::from([(iron_plate, 1), (coal, 1)]),
        )
        .unwrap();
    let goods = StandardGoods {
        iron_ore,
        coal,
        iron_plate,
        steel,
    };
    (builder.build().unwrap(), goods)
}

// ===========================================================================
// Network builders
// ===========================================================================

/// Node IDs of the network built by [`build_steel_chain`].
#[derive(Debug, Clone, Copy)]
pub struct SteelChain {
    pub ore_mine: NodeId,
    pub coal_mine: NodeId,
    pub smelter: NodeId,
    pub steel_mill: NodeId,
    pub market: NodeId,
}

/// Ore mine -> smelter -> steel mill <- coal mine, steel mill -> market.
///
/// Wired and ready to tick.
pub fn build_steel_chain() -> (Network, StandardGoods, SteelChain) {
    let (registry, goods) = standard_registry();
    let mut network = Network::new(registry);
    let ore_mine = network.add_mine(goods.iron_ore, 10, at(0.0, 0.0)).unwrap();
    let coal_mine = network.add_mine(goods.coal, 10, at(0.0, 4.0)).unwrap();
    let smelter = network.add_factory(goods.iron_plate, 8, at(2.0, 0.0)).unwrap();
    let steel_mill = network.add_factory(goods.steel, 6, at(3.0, 3.0)).unwrap();
    let market = network.add_customer_point(goods.steel, 5, at(6.0, 7.0)).unwrap();
    network.wire().unwrap();
    (
        network,
        goods,
        SteelChain {
            ore_mine,
            coal_mine,
            smelter,
            steel_mill,
            market,
        },
    )
}

/// `chains` independent raw-material chains, each a mine feeding one customer
/// point through `chain_length - 2` intermediate single-input factories.
///
/// Every chain has its own goods, so producers never collide.
pub fn build_chains(chains: usize, chain_length: usize) -> Network {
    let chain_length = chain_length.max(2);
    let mut builder = GoodRegistryBuilder::new();
    let mut goods_per_chain = Vec::with_capacity(chains);
    for c in 0..chains {
        let mut goods = Vec::with_capacity(chain_length - 1);
        let raw = builder
            .register_raw(&format!("raw_{c}"), fixed(1.0))
            .unwrap();
        goods.push(raw);
        for step in 1..chain_length - 1 {
            let prev = goods[step - 1];
            let next = builder
                .register(
                    &format!("good_{c}_{step}"),
                    fixed(1.0),
                    BTreeMap::from([(prev, 1)]),
                )
                .unwrap();
            goods.push(next);
        }
        goods_per_chain.push(goods);
    }

    let mut network = Network::new(builder.build().unwrap());
    for (c, goods) in goods_per_chain.iter().enumerate() {
        let y = c as f64 * 2.0;
        network.add_mine(goods[0], 6, at(0.0, y)).unwrap();
        for (step, &good) in goods.iter().enumerate().skip(1) {
            network
                .add_factory(good, 6, at(step as f64 * 1.5, y))
                .unwrap();
        }
        let last = goods[goods.len() - 1];
        network
            .add_customer_point(last, 4, at(chain_length as f64 * 1.5, y))
            .unwrap();
    }
    network.wire().unwrap();
    network
}

// ===========================================================================
// Query helpers
// ===========================================================================

/// Units received so far by a customer point (or stored by a factory).
pub fn stored(network: &Network, node: NodeId) -> u64 {
    network
        .snapshot_node(node)
        .map(|s| s.stored_total())
        .unwrap_or(0)
}

pub fn stored_of(network: &Network, node: NodeId, good: GoodTypeId) -> u64 {
    network
        .node(node)
        .and_then(|n| n.storage())
        .and_then(|s| s.get(&good).copied())
        .unwrap_or(0)
}

pub fn backlog(network: &Network, node: NodeId) -> usize {
    network.node(node).map(|n| n.output_len()).unwrap_or(0)
}

pub fn produced(network: &Network, node: NodeId) -> u64 {
    network.node(node).map(|n| n.total_produced()).unwrap_or(0)
}

pub fn in_transit(network: &Network, node: NodeId) -> u64 {
    network
        .node(node)
        .and_then(|n| n.arrivals())
        .map(|a| a.in_transit())
        .unwrap_or(0)
}
