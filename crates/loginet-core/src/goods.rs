//! Good types and the frozen registry that describes them.
//!
//! Goods are registered once through a [`GoodRegistryBuilder`], validated, and
//! frozen into a [`GoodRegistry`]. Nodes hold [`GoodTypeId`]s and look the
//! definitions up through the registry.

use crate::fixed::{Fixed64, floor_div};
use crate::id::GoodTypeId;
use std::collections::{BTreeMap, HashMap};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Construction-time contract violations in the goods model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GoodsError {
    #[error("good type already registered: {0}")]
    DuplicateName(String),
    #[error("difficulty of {0} is not a finite fixed-point number")]
    InvalidDifficulty(String),
    #[error("difficulty of {name} must be positive, got {difficulty}")]
    NonPositiveDifficulty { name: String, difficulty: Fixed64 },
    #[error("{name} requires zero units of {requirement:?}")]
    ZeroRequirement { name: String, requirement: GoodTypeId },
    #[error("{name} references unknown good type {requirement:?}")]
    InvalidGoodRef { name: String, requirement: GoodTypeId },
    #[error("{0} lists itself as a requirement")]
    SelfRequirement(String),
}

// ---------------------------------------------------------------------------
// Definitions
// ---------------------------------------------------------------------------

/// A good type definition in the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct GoodType {
    pub name: String,
    /// Divides raw capacity into effective production capacity.
    pub difficulty: Fixed64,
    /// Units of each input consumed per unit of output. Empty for raw materials.
    pub requirements: BTreeMap<GoodTypeId, u32>,
}

impl GoodType {
    /// Whether this good is produced from nothing.
    pub fn is_raw(&self) -> bool {
        self.requirements.is_empty()
    }

    /// Production rate a node gets from `raw_capacity` when making this good.
    pub fn effective_capacity(&self, raw_capacity: u32) -> u32 {
        // Difficulty is validated positive at registration.
        floor_div(raw_capacity, self.difficulty).unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for constructing an immutable [`GoodRegistry`].
#[derive(Debug, Default)]
pub struct GoodRegistryBuilder {
    goods: Vec<GoodType>,
    name_to_id: HashMap<String, GoodTypeId>,
}

impl GoodRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a raw material (no requirements). Returns its ID.
    pub fn register_raw(
        &mut self,
        name: &str,
        difficulty: Fixed64,
    ) -> Result<GoodTypeId, GoodsError> {
        self.register(name, difficulty, BTreeMap::new())
    }

    /// Register a good type. Requirements may only reference goods that are
    /// registered by the time [`build`](Self::build) runs.
    pub fn register(
        &mut self,
        name: &str,
        difficulty: Fixed64,
        requirements: BTreeMap<GoodTypeId, u32>,
    ) -> Result<GoodTypeId, GoodsError> {
        if self.name_to_id.contains_key(name) {
            return Err(GoodsError::DuplicateName(name.to_string()));
        }
        if difficulty <= Fixed64::ZERO {
            return Err(GoodsError::NonPositiveDifficulty {
                name: name.to_string(),
                difficulty,
            });
        }
        if let Some((&requirement, _)) = requirements.iter().find(|&(_, &qty)| qty == 0) {
            return Err(GoodsError::ZeroRequirement {
                name: name.to_string(),
                requirement,
            });
        }

        let id = GoodTypeId(self.goods.len() as u32);
        if requirements.contains_key(&id) {
            return Err(GoodsError::SelfRequirement(name.to_string()));
        }
        self.goods.push(GoodType {
            name: name.to_string(),
            difficulty,
            requirements,
        });
        self.name_to_id.insert(name.to_string(), id);
        Ok(id)
    }

    /// Finalize and build the immutable registry.
    pub fn build(self) -> Result<GoodRegistry, GoodsError> {
        for good in &self.goods {
            if let Some(&requirement) = good
                .requirements
                .keys()
                .find(|id| id.0 as usize >= self.goods.len())
            {
                return Err(GoodsError::InvalidGoodRef {
                    name: good.name.clone(),
                    requirement,
                });
            }
        }

        Ok(GoodRegistry {
            goods: self.goods,
            name_to_id: self.name_to_id,
        })
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Immutable registry of good types. Frozen after `build()`.
#[derive(Debug, Clone)]
pub struct GoodRegistry {
    goods: Vec<GoodType>,
    name_to_id: HashMap<String, GoodTypeId>,
}

impl GoodRegistry {
    pub fn get(&self, id: GoodTypeId) -> Option<&GoodType> {
        self.goods.get(id.0 as usize)
    }

    pub fn good_id(&self, name: &str) -> Option<GoodTypeId> {
        self.name_to_id.get(name).copied()
    }

    /// Display name for a good, or `"<unknown>"` for foreign IDs.
    pub fn name(&self, id: GoodTypeId) -> &str {
        self.get(id).map(|g| g.name.as_str()).unwrap_or("<unknown>")
    }

    pub fn len(&self) -> usize {
        self.goods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.goods.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (GoodTypeId, &GoodType)> {
        self.goods
            .iter()
            .enumerate()
            .map(|(i, g)| (GoodTypeId(i as u32), g))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::f64_to_fixed64;

    fn one() -> Fixed64 {
        f64_to_fixed64(1.0)
    }

    #[test]
    fn register_and_build() {
        let mut builder = GoodRegistryBuilder::new();
        let ore = builder.register_raw("ore", one()).unwrap();
        let plate = builder
            .register("plate", f64_to_fixed64(2.0), BTreeMap::from([(ore, 2)]))
            .unwrap();
        let registry = builder.build().unwrap();

        assert_eq!(registry.len(), 2);
        assert!(registry.get(ore).unwrap().is_raw());
        assert_eq!(registry.get(plate).unwrap().requirements[&ore], 2);
        assert_eq!(registry.good_id("plate"), Some(plate));
        assert_eq!(registry.name(plate), "plate");
    }

    #[test]
    fn effective_capacity_divides_by_difficulty() {
        let mut builder = GoodRegistryBuilder::new();
        let ore = builder.register_raw("ore", f64_to_fixed64(2.0)).unwrap();
        let registry = builder.build().unwrap();
        assert_eq!(registry.get(ore).unwrap().effective_capacity(10), 5);
        assert_eq!(registry.get(ore).unwrap().effective_capacity(11), 5);
    }

    #[test]
    fn rejects_non_positive_difficulty() {
        let mut builder = GoodRegistryBuilder::new();
        let err = builder.register_raw("ore", Fixed64::ZERO).unwrap_err();
        assert!(matches!(err, GoodsError::NonPositiveDifficulty { .. }));
    }

    #[test]
    fn rejects_duplicate_name() {
        let mut builder = GoodRegistryBuilder::new();
        builder.register_raw("ore", one()).unwrap();
        let err = builder.register_raw("ore", one()).unwrap_err();
        assert_eq!(err, GoodsError::DuplicateName("ore".into()));
    }

    #[test]
    fn rejects_zero_requirement() {
        let mut builder = GoodRegistryBuilder::new();
        let ore = builder.register_raw("ore", one()).unwrap();
        let err = builder
            .register("plate", one(), BTreeMap::from([(ore, 0)]))
            .unwrap_err();
        assert!(matches!(err, GoodsError::ZeroRequirement { .. }));
    }

    #[test]
    fn rejects_self_requirement() {
        let mut builder = GoodRegistryBuilder::new();
        let err = builder
            .register("loop", one(), BTreeMap::from([(GoodTypeId(0), 1)]))
            .unwrap_err();
        assert_eq!(err, GoodsError::SelfRequirement("loop".into()));
    }

    #[test]
    fn build_rejects_dangling_requirement() {
        let mut builder = GoodRegistryBuilder::new();
        builder.register_raw("ore", one()).unwrap();
        builder
            .register("plate", one(), BTreeMap::from([(GoodTypeId(7), 1)]))
            .unwrap();
        let err = builder.build().unwrap_err();
        assert!(matches!(err, GoodsError::InvalidGoodRef { .. }));
    }

    #[test]
    fn forward_references_resolve_at_build() {
        let mut builder = GoodRegistryBuilder::new();
        let plate = builder
            .register("plate", one(), BTreeMap::from([(GoodTypeId(1), 3)]))
            .unwrap();
        let ore = builder.register_raw("ore", one()).unwrap();
        let registry = builder.build().unwrap();
        assert_eq!(registry.get(plate).unwrap().requirements[&ore], 3);
    }
}
