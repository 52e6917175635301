//! Goods in transit between nodes.
//!
//! Every consuming node owns a [`DelayLine`]: a queue of buckets where the
//! bucket at index `i` holds the bundles arriving in `i + 1` ticks. Producers
//! do not touch the delay line directly. Their export step emits
//! [`Shipment`]s, which the network schedules on the recipient right after the
//! sender's step.

use crate::id::NodeId;
use crate::item::Bundle;
use std::collections::VecDeque;

/// Longest transit a wired link may have, in ticks. Bounds delay-line padding.
pub const MAX_DELAY: u32 = 100_000;

// ---------------------------------------------------------------------------
// Shipment
// ---------------------------------------------------------------------------

/// A bundle leaving a producer, addressed to one customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shipment {
    pub to: NodeId,
    /// Ticks until the recipient unpacks it. Always >= 1.
    pub delay: u32,
    pub bundle: Bundle,
}

// ---------------------------------------------------------------------------
// Delay line
// ---------------------------------------------------------------------------

/// Time-bucketed arrival queue.
///
/// The bucket count only grows through padding and shrinks by one each time
/// the front bucket is drained.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DelayLine {
    buckets: VecDeque<Vec<Bundle>>,
}

impl DelayLine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place `bundle` so it is drained by the `delay`-th call to
    /// [`drain_front`](Self::drain_front) from now.
    ///
    /// A `delay` of 0 is treated as 1 (next drain).
    pub fn schedule(&mut self, delay: u32, bundle: Bundle) {
        let delay = delay.max(1) as usize;
        while self.buckets.len() < delay {
            self.buckets.push_back(Vec::new());
        }
        self.buckets[delay - 1].push(bundle);
    }

    /// Remove and return the bucket due now. `None` when nothing is queued.
    pub fn drain_front(&mut self) -> Option<Vec<Bundle>> {
        self.buckets.pop_front()
    }

    /// Number of buckets, including empty padding buckets.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Total units across every bucket.
    pub fn in_transit(&self) -> u64 {
        self.buckets
            .iter()
            .flatten()
            .map(|bundle| bundle.len() as u64)
            .sum()
    }
}
