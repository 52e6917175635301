use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies a node (mine, factory, customer point) in the network arena.
    pub struct NodeId;
}

/// Identifies a good type in the registry. Cheap to copy and compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GoodTypeId(pub u32);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn good_type_id_equality() {
        let a = GoodTypeId(0);
        let b = GoodTypeId(0);
        let c = GoodTypeId(1);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn good_type_ids_order_by_index() {
        let mut ids = vec![GoodTypeId(3), GoodTypeId(1), GoodTypeId(2)];
        ids.sort();
        assert_eq!(ids, vec![GoodTypeId(1), GoodTypeId(2), GoodTypeId(3)]);
    }

    #[test]
    fn node_ids_are_distinct_per_insert() {
        let mut arena: slotmap::SlotMap<NodeId, ()> = slotmap::SlotMap::with_key();
        let a = arena.insert(());
        let b = arena.insert(());
        assert_ne!(a, b);
    }
}
