//! World positions and the distance-to-delay rule.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A point in the 2D world.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Both coordinates are finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Euclidean distance to another position.
    pub fn distance(&self, other: &Position) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Ticks a shipment spends in transit: the floored distance.
///
/// May be 0 for nodes closer than one unit apart; callers decide how to
/// treat that. `None` when the distance is not finite or does not fit a `u32`.
pub fn delivery_delay(from: &Position, to: &Position) -> Option<u32> {
    let dist = from.distance(to).floor();
    (dist.is_finite() && dist <= u32::MAX as f64).then_some(dist as u32)
}
