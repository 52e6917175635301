//! Steel chain example: ore and coal mines feeding a smelter and steel mill.
//!
//! Builds the network by hand, wires it, and runs 12 ticks, printing each
//! node's state after every tick. Tick 6 applies a capacity shock that
//! shuts the smelter down for one tick.
//!
//! Run with: `cargo run -p loginet-core --example steel_chain`

use loginet_core::fixed::Fixed64;
use loginet_core::goods::GoodRegistryBuilder;
use loginet_core::network::Network;
use loginet_core::position::Position;
use std::collections::BTreeMap;

fn main() {
    // --- Goods ---

    let mut goods = GoodRegistryBuilder::new();
    let ore = goods.register_raw("iron_ore", Fixed64::from_num(1)).unwrap();
    let coal = goods.register_raw("coal", Fixed64::from_num(2)).unwrap();
    let plate = goods
        .register("iron_plate", Fixed64::from_num(1), BTreeMap::from([(ore, 2)]))
        .unwrap();
    let steel = goods
        .register(
            "steel",
            Fixed64::from_num(1),
            BTreeMap::from([(plate, 1), (coal, 1)]),
        )
        .unwrap();

    // --- Nodes ---

    let mut network = Network::new(goods.build().unwrap());
    network.add_mine(ore, 10, Position::new(0.0, 0.0)).unwrap();
    network.add_mine(coal, 10, Position::new(0.0, 4.0)).unwrap();
    let smelter = network
        .add_factory(plate, 8, Position::new(2.0, 0.0))
        .unwrap();
    network.add_factory(steel, 6, Position::new(3.0, 3.0)).unwrap();
    network
        .add_customer_point(steel, 5, Position::new(6.0, 7.0))
        .unwrap();

    // --- Wire and run ---

    network.wire().unwrap();

    for tick in 1..=12 {
        let result = if tick == 6 {
            network.tick_with(&BTreeMap::from([(smelter, 0)])).unwrap()
        } else {
            network.tick().unwrap()
        };
        println!(
            "tick {:>2}: produced {:>2}, shipped {:>2}",
            result.tick, result.produced, result.shipped
        );
        for snapshot in network.snapshot_all() {
            let node = network.node(snapshot.id).unwrap();
            println!(
                "    {:<40} backlog {:>3}  stored {:>4}  in transit {:>3}",
                node.display(network.registry()).to_string(),
                snapshot.output_backlog,
                snapshot.stored_total(),
                snapshot.in_transit,
            );
        }
    }
}
