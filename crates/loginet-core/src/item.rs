use crate::id::GoodTypeId;
use std::collections::VecDeque;

/// A single unit of a good.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Unit {
    pub good: GoodTypeId,
}

impl Unit {
    pub fn new(good: GoodTypeId) -> Self {
        Self { good }
    }
}

/// An ordered package of units travelling between two nodes.
///
/// Unpacking is FIFO: units come out in the order they were packed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bundle {
    units: VecDeque<Unit>,
}

impl Bundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a unit to the back of the bundle.
    pub fn pack(&mut self, unit: Unit) {
        self.units.push_back(unit);
    }

    /// Remove and return the earliest packed unit.
    pub fn unpack(&mut self) -> Option<Unit> {
        self.units.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter()
    }
}

impl FromIterator<Unit> for Bundle {
    fn from_iter<I: IntoIterator<Item = Unit>>(iter: I) -> Self {
        Self {
            units: iter.into_iter().collect(),
        }
    }
}
