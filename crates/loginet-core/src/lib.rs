//! Loginet Core -- a discrete-time production and logistics network.
//!
//! Spatially placed nodes produce, transform, and consume typed goods.
//! Shipments between nodes are delayed by the floored distance between them.
//!
//! # Tick Pipeline
//!
//! Each call to [`network::Network::tick`] steps every node once. A node's
//! step runs, in order:
//!
//! 1. **Accept** -- drain the front bucket of its delay line into storage
//!    (factories and customer points).
//! 2. **Produce** -- mines create `capacity` units; factories create as many
//!    as both capacity and stored materials allow.
//! 3. **Export** -- split the output queue among customers by demand weight,
//!    flooring each share and carrying the remainder forward.
//!
//! Shipments from a node's export are scheduled on the recipients' delay
//! lines before the next node steps.
//!
//! # Key Types
//!
//! - [`network::Network`] -- Node arena, producer index, wiring and tick driver.
//! - [`node::Node`] -- Mine, Factory, and CustomerPoint variants.
//! - [`transport::DelayLine`] -- Time-bucketed arrival queue.
//! - [`goods::GoodRegistry`] -- Immutable registry of good types.
//! - [`fixed::Fixed64`] -- Q32.32 fixed-point type for difficulty math.

#[cfg(feature = "data-loader")]
pub mod data_loader;
pub mod fixed;
pub mod goods;
pub mod id;
pub mod item;
pub mod network;
pub mod node;
pub mod position;
pub mod query;
pub mod sim;
pub mod transport;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
