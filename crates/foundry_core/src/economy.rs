//! Item stock and consumption checks for structures.
//!
//! All quantities are integer item counts.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ids::{EntityId, ItemId};

/// Items a structure burns on a fixed cadence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumeItems {
    /// Item consumed.
    pub item: ItemId,
    /// Items removed per cycle.
    pub amount: u32,
    /// Cycle length in ticks.
    pub use_time: f32,
}

/// Resource checks the generator simulation depends on.
pub trait ConsumptionValidator {
    /// Whether `structure` currently holds what `requirement` needs.
    fn consumption_satisfied(&self, structure: EntityId, requirement: &ConsumeItems) -> bool;

    /// Remove up to `amount` of `item` from `structure`.
    fn remove_resource(&mut self, structure: EntityId, item: &ItemId, amount: u32);
}

/// Per-structure item inventories.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemLedger {
    stock: BTreeMap<EntityId, BTreeMap<ItemId, u32>>,
}

impl ItemLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Deposit items, returning the new total.
    /// Uses saturating addition to prevent overflow.
    pub fn add(&mut self, structure: EntityId, item: ItemId, amount: u32) -> u32 {
        let slot = self
            .stock
            .entry(structure)
            .or_default()
            .entry(item)
            .or_insert(0);
        *slot = slot.saturating_add(amount);
        *slot
    }

    /// Items of one kind held by a structure.
    #[must_use]
    pub fn amount(&self, structure: EntityId, item: &ItemId) -> u32 {
        self.stock
            .get(&structure)
            .and_then(|items| items.get(item))
            .copied()
            .unwrap_or(0)
    }

    /// Withdraw items, returning how many were actually removed.
    pub fn remove(&mut self, structure: EntityId, item: &ItemId, amount: u32) -> u32 {
        let Some(slot) = self
            .stock
            .get_mut(&structure)
            .and_then(|items| items.get_mut(item))
        else {
            return 0;
        };
        let actual = amount.min(*slot);
        *slot -= actual;
        actual
    }

    /// Drop a structure's whole inventory.
    pub fn clear_structure(&mut self, structure: EntityId) {
        self.stock.remove(&structure);
    }
}

impl ConsumptionValidator for ItemLedger {
    fn consumption_satisfied(&self, structure: EntityId, requirement: &ConsumeItems) -> bool {
        self.amount(structure, &requirement.item) >= requirement.amount
    }

    fn remove_resource(&mut self, structure: EntityId, item: &ItemId, amount: u32) {
        self.remove(structure, item, amount);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blast() -> ItemId {
        ItemId::from_static("blast-compound")
    }

    #[test]
    fn test_add_and_remove() {
        let mut ledger = ItemLedger::new();
        assert_eq!(ledger.add(1, blast(), 5), 5);
        assert_eq!(ledger.remove(1, &blast(), 3), 3);
        assert_eq!(ledger.remove(1, &blast(), 3), 2);
        assert_eq!(ledger.amount(1, &blast()), 0);
        assert_eq!(ledger.remove(2, &blast(), 1), 0);
    }

    #[test]
    fn test_add_saturates() {
        let mut ledger = ItemLedger::new();
        ledger.add(1, blast(), u32::MAX);
        assert_eq!(ledger.add(1, blast(), 10), u32::MAX);
    }

    #[test]
    fn test_consumption_satisfied() {
        let mut ledger = ItemLedger::new();
        let requirement = ConsumeItems {
            item: blast(),
            amount: 2,
            use_time: 60.0,
        };
        ledger.add(1, blast(), 1);
        assert!(!ledger.consumption_satisfied(1, &requirement));
        ledger.add(1, blast(), 1);
        assert!(ledger.consumption_satisfied(1, &requirement));
        assert!(!ledger.consumption_satisfied(2, &requirement));
    }

    #[test]
    fn test_clear_structure() {
        let mut ledger = ItemLedger::new();
        ledger.add(1, blast(), 4);
        ledger.clear_structure(1);
        assert_eq!(ledger.amount(1, &blast()), 0);
    }
}
