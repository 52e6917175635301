//! Data-driven network loading from JSON or TOML.
//!
//! Feature-gated behind `data-loader`. Goods and nodes reference each other by
//! name; the loader resolves names, builds the registry, adds every node, and
//! wires the result.

use crate::fixed::checked_f64_to_fixed64;
use crate::goods::{GoodRegistryBuilder, GoodsError};
use crate::id::GoodTypeId;
use crate::network::{Network, NetworkError, TickOrder};
use crate::node::NodeKind;
use crate::position::Position;
use std::collections::{BTreeMap, HashMap};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during data loading.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("goods error: {0}")]
    Goods(#[from] GoodsError),
    #[error("network error: {0}")]
    Network(#[from] NetworkError),
    #[error("unknown good reference: {0}")]
    UnknownGood(String),
}

// ---------------------------------------------------------------------------
// Data structures
// ---------------------------------------------------------------------------

/// Top-level network description.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct NetworkData {
    #[serde(default)]
    pub tick_order: TickOrder,
    #[serde(default)]
    pub goods: Vec<GoodData>,
    #[serde(default)]
    pub nodes: Vec<NodeData>,
}

/// A good type. Requirements map input good names to per-unit quantities.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct GoodData {
    pub name: String,
    #[serde(default = "default_difficulty")]
    pub difficulty: f64,
    #[serde(default)]
    pub requirements: BTreeMap<String, u32>,
}

fn default_difficulty() -> f64 {
    1.0
}

/// A node placement.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct NodeData {
    pub kind: NodeKind,
    /// Good produced, or accepted for a customer point.
    pub good: String,
    /// Raw capacity (divided by difficulty for producers).
    pub capacity: u32,
    pub position: Position,
}

// ---------------------------------------------------------------------------
// Loading functions
// ---------------------------------------------------------------------------

/// Load and wire a network from a JSON string.
pub fn load_network_json(json: &str) -> Result<Network, DataLoadError> {
    let data: NetworkData = serde_json::from_str(json)?;
    build_network(data)
}

/// Load and wire a network from a TOML string.
pub fn load_network_toml(source: &str) -> Result<Network, DataLoadError> {
    let data: NetworkData = toml::from_str(source)?;
    build_network(data)
}

/// Build and wire a network from an already-parsed description.
pub fn build_network(data: NetworkData) -> Result<Network, DataLoadError> {
    // Goods are registered in list order, so IDs are list indices. Resolving
    // names up front allows requirements to reference later goods.
    let ids: HashMap<&str, GoodTypeId> = data
        .goods
        .iter()
        .enumerate()
        .map(|(i, g)| (g.name.as_str(), GoodTypeId(i as u32)))
        .collect();
    let resolve = |name: &str| {
        ids.get(name)
            .copied()
            .ok_or_else(|| DataLoadError::UnknownGood(name.to_string()))
    };

    let mut builder = GoodRegistryBuilder::new();
    for good in &data.goods {
        let requirements = good
            .requirements
            .iter()
            .map(|(name, &qty)| Ok((resolve(name)?, qty)))
            .collect::<Result<BTreeMap<_, _>, DataLoadError>>()?;
        let difficulty = checked_f64_to_fixed64(good.difficulty)
            .ok_or_else(|| GoodsError::InvalidDifficulty(good.name.clone()))?;
        builder.register(&good.name, difficulty, requirements)?;
    }

    let mut network = Network::new(builder.build()?).with_tick_order(data.tick_order);
    for node in &data.nodes {
        let good = resolve(&node.good)?;
        match node.kind {
            NodeKind::Mine => network.add_mine(good, node.capacity, node.position)?,
            NodeKind::Factory => network.add_factory(good, node.capacity, node.position)?,
            NodeKind::CustomerPoint => {
                network.add_customer_point(good, node.capacity, node.position)?
            }
        };
    }

    network.wire()?;
    tracing::debug!(
        goods = data.goods.len(),
        nodes = data.nodes.len(),
        "network loaded"
    );
    Ok(network)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHAIN_JSON: &str = r#"{
        "tick_order": "insertion",
        "goods": [
            { "name": "plate", "difficulty": 2.0, "requirements": { "ore": 2 } },
            { "name": "ore" }
        ],
        "nodes": [
            { "kind": "mine", "good": "ore", "capacity": 10, "position": { "x": 0, "y": 0 } },
            { "kind": "factory", "good": "plate", "capacity": 8, "position": { "x": 3, "y": 4 } },
            { "kind": "customer_point", "good": "plate", "capacity": 5, "position": { "x": 3, "y": 6 } }
        ]
    }"#;

    #[test]
    fn load_json_chain() {
        let network = load_network_json(CHAIN_JSON).unwrap();
        assert!(network.is_wired());
        assert_eq!(network.node_count(), 3);
        assert_eq!(network.tick_order(), TickOrder::Insertion);

        let plate = network.registry().good_id("plate").unwrap();
        let factory = network.producer_of(plate).unwrap();
        assert_eq!(network.node(factory).unwrap().capacity(), 4);
        assert_eq!(network.node(factory).unwrap().customers()[0].delay, 2);
    }

    #[test]
    fn load_toml_chain() {
        let source = r#"
            [[goods]]
            name = "ore"

            [[goods]]
            name = "plate"
            requirements = { ore = 3 }

            [[nodes]]
            kind = "mine"
            good = "ore"
            capacity = 6
            position = { x = 0.0, y = 0.0 }

            [[nodes]]
            kind = "factory"
            good = "plate"
            capacity = 2
            position = { x = 1.0, y = 0.0 }
        "#;
        let network = load_network_toml(source).unwrap();
        assert_eq!(network.tick_order(), TickOrder::ByKind);
        let ore = network.registry().good_id("ore").unwrap();
        let mine = network.producer_of(ore).unwrap();
        assert_eq!(network.node(mine).unwrap().customers()[0].weight, 3);
    }

    #[test]
    fn unknown_requirement_name() {
        let json = r#"{ "goods": [ { "name": "plate", "requirements": { "ore": 1 } } ] }"#;
        let err = load_network_json(json).unwrap_err();
        assert!(matches!(err, DataLoadError::UnknownGood(name) if name == "ore"));
    }

    #[test]
    fn unknown_node_good() {
        let json = r#"{
            "goods": [ { "name": "ore" } ],
            "nodes": [ { "kind": "mine", "good": "gold", "capacity": 1, "position": { "x": 0, "y": 0 } } ]
        }"#;
        assert!(matches!(
            load_network_json(json),
            Err(DataLoadError::UnknownGood(name)) if name == "gold"
        ));
    }

    #[test]
    fn non_positive_difficulty_surfaces_goods_error() {
        let json = r#"{ "goods": [ { "name": "ore", "difficulty": 0 } ] }"#;
        assert!(matches!(
            load_network_json(json),
            Err(DataLoadError::Goods(GoodsError::NonPositiveDifficulty { .. }))
        ));
    }

    #[test]
    fn out_of_range_difficulty_is_an_error() {
        let json = r#"{ "goods": [ { "name": "ore", "difficulty": 1e20 } ] }"#;
        assert!(matches!(
            load_network_json(json),
            Err(DataLoadError::Goods(GoodsError::InvalidDifficulty(name))) if name == "ore"
        ));
    }

    #[test]
    fn non_finite_difficulty_is_an_error() {
        for literal in ["nan", "inf", "-inf"] {
            let source = format!("[[goods]]\nname = \"ore\"\ndifficulty = {literal}\n");
            assert!(matches!(
                load_network_toml(&source),
                Err(DataLoadError::Goods(GoodsError::InvalidDifficulty(name))) if name == "ore"
            ));
        }
    }

    #[test]
    fn non_finite_position_is_an_error() {
        let source = r#"
            [[goods]]
            name = "ore"

            [[nodes]]
            kind = "mine"
            good = "ore"
            capacity = 1
            position = { x = nan, y = 0.0 }
        "#;
        assert!(matches!(
            load_network_toml(source),
            Err(DataLoadError::Network(NetworkError::InvalidPosition(_)))
        ));
    }

    #[test]
    fn missing_producer_surfaces_network_error() {
        let json = r#"{
            "goods": [ { "name": "ore" } ],
            "nodes": [ { "kind": "customer_point", "good": "ore", "capacity": 1, "position": { "x": 0, "y": 0 } } ]
        }"#;
        assert!(matches!(
            load_network_json(json),
            Err(DataLoadError::Network(NetworkError::NoProducer { .. }))
        ));
    }

    #[test]
    fn malformed_json() {
        assert!(matches!(
            load_network_json("{ not json"),
            Err(DataLoadError::JsonParse(_))
        ));
    }
}
