//! The client-side basket state machine.
//!
//! The basket is a deterministic reducer: every mutation goes through [`Basket::dispatch`] with a
//! [`BasketAction`], and the new state is persisted to a [`BasketStorage`] partition after each
//! one. Lines are keyed by a composite identity derived from the full item configuration, so
//! adding the same configuration twice merges into one line instead of duplicating it.
//!
//! Prices held here are display-only. The server re-derives every price from the catalog at
//! checkout and never trusts what the client submits.

use bistro_common::Cents;
use bistro_engine::db_types::{ItemComposition, OrderedItem};
use log::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum BasketError {
    #[error("No basket line with identity {0}")]
    UnknownLine(String),
    #[error("Quantity must be positive, got {0}")]
    InvalidQuantity(i64),
    #[error("Basket storage error: {0}")]
    Storage(String),
}

/// Persistence seam for the basket. Partitions are named per identity (`guest`, `user-{id}`), so
/// that a guest basket and each user's basket live side by side.
pub trait BasketStorage {
    fn load(&self, partition: &str) -> Result<Option<Vec<BasketLine>>, BasketError>;
    fn store(&mut self, partition: &str, lines: &[BasketLine]) -> Result<(), BasketError>;
    fn clear(&mut self, partition: &str) -> Result<(), BasketError>;
}

/// One line of the basket. `identity` is derived from the composition and is the merge key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasketLine {
    pub identity: String,
    pub composition: ItemComposition,
    /// Display price only; the server recomputes at checkout.
    pub unit_price: Cents,
}

impl BasketLine {
    pub fn total_price(&self) -> Cents {
        self.unit_price * self.composition.quantity
    }
}

/// The composite identity of a basket line: base item, version, sauce, sorted extras and sorted
/// removed ingredients. The note and the quantity are deliberately excluded, so that changing
/// either mutates the existing line rather than forking a new one.
pub fn composite_identity(composition: &ItemComposition) -> String {
    let base = match composition.item {
        OrderedItem::Dish(id) => format!("dish-{id}"),
        OrderedItem::Sauce(id) => format!("sauce-{id}"),
    };
    let version = composition.version_size.as_deref().unwrap_or("");
    let sauce = composition.sauce_id.map(|id| id.to_string()).unwrap_or_default();
    let mut extras = composition.extra_ids.clone();
    extras.sort_unstable();
    let mut removed = composition.removed_ingredient_ids.clone();
    removed.sort_unstable();
    let extras = extras.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(".");
    let removed = removed.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(".");
    format!("{base}|v:{version}|s:{sauce}|e:{extras}|r:{removed}")
}

/// The closed set of basket commands. Every mutation is one of these, dispatched through
/// [`Basket::dispatch`]; there is no other way to change basket state.
#[derive(Debug, Clone)]
pub enum BasketAction {
    /// Add a configured item. Merges with an existing line of the same identity.
    Add { composition: ItemComposition, unit_price: Cents },
    Remove { identity: String },
    /// Set a line's quantity outright (not additive). A quantity ≤ 0 removes the line.
    SetQuantity { identity: String, quantity: i64 },
    SetNote { identity: String, note: Option<String> },
    Clear,
    /// Replace in-memory state with whatever the current partition holds.
    LoadFromStorage,
    /// Login (`Some(user_id)`) keeps the basket and re-keys it under the user's partition,
    /// overwriting anything stored there. Logout (`None`) clears the basket and resets to a fresh
    /// guest partition.
    SwitchIdentity(Option<i64>),
}

pub const GUEST_PARTITION: &str = "guest";

#[derive(Debug, Clone, Default)]
pub struct Basket {
    owner: Option<i64>,
    lines: Vec<BasketLine>,
    total_items: i64,
    total_price: Cents,
}

impl Basket {
    pub fn new() -> Self {
        Self::default()
    }

    /// The storage partition the basket currently reads from and writes to.
    pub fn partition(&self) -> String {
        match self.owner {
            Some(id) => format!("user-{id}"),
            None => GUEST_PARTITION.to_string(),
        }
    }

    pub fn owner(&self) -> Option<i64> {
        self.owner
    }

    pub fn lines(&self) -> &[BasketLine] {
        &self.lines
    }

    pub fn total_items(&self) -> i64 {
        self.total_items
    }

    pub fn total_price(&self) -> Cents {
        self.total_price
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The checkout payload: the composed lines, ready to submit. The server prices them itself.
    pub fn checkout_items(&self) -> Vec<ItemComposition> {
        self.lines.iter().map(|line| line.composition.clone()).collect()
    }

    /// Apply one action and persist the result. The reducer is total: every action either
    /// succeeds, or fails without mutating state.
    pub fn dispatch<S: BasketStorage>(&mut self, action: BasketAction, storage: &mut S) -> Result<(), BasketError> {
        match action {
            BasketAction::Add { composition, unit_price } => self.add(composition, unit_price)?,
            BasketAction::Remove { identity } => self.remove(&identity)?,
            BasketAction::SetQuantity { identity, quantity } => self.set_quantity(&identity, quantity)?,
            BasketAction::SetNote { identity, note } => self.set_note(&identity, note)?,
            BasketAction::Clear => self.lines.clear(),
            BasketAction::LoadFromStorage => {
                self.lines = storage.load(&self.partition())?.unwrap_or_default();
            },
            BasketAction::SwitchIdentity(new_owner) => self.switch_identity(new_owner, storage)?,
        }
        self.recompute_totals();
        storage.store(&self.partition(), &self.lines)?;
        Ok(())
    }

    fn add(&mut self, composition: ItemComposition, unit_price: Cents) -> Result<(), BasketError> {
        if composition.quantity <= 0 {
            return Err(BasketError::InvalidQuantity(composition.quantity));
        }
        let identity = composite_identity(&composition);
        match self.lines.iter_mut().find(|line| line.identity == identity) {
            Some(line) => {
                line.composition.quantity += composition.quantity;
                trace!("🧺️ Merged into line {identity}; quantity is now {}", line.composition.quantity);
            },
            None => {
                trace!("🧺️ New line {identity} × {}", composition.quantity);
                self.lines.push(BasketLine { identity, composition, unit_price });
            },
        }
        Ok(())
    }

    fn remove(&mut self, identity: &str) -> Result<(), BasketError> {
        let before = self.lines.len();
        self.lines.retain(|line| line.identity != identity);
        if self.lines.len() == before {
            return Err(BasketError::UnknownLine(identity.to_string()));
        }
        Ok(())
    }

    fn set_quantity(&mut self, identity: &str, quantity: i64) -> Result<(), BasketError> {
        if quantity <= 0 {
            return self.remove(identity);
        }
        let line = self
            .lines
            .iter_mut()
            .find(|line| line.identity == identity)
            .ok_or_else(|| BasketError::UnknownLine(identity.to_string()))?;
        line.composition.quantity = quantity;
        Ok(())
    }

    fn set_note(&mut self, identity: &str, note: Option<String>) -> Result<(), BasketError> {
        let line = self
            .lines
            .iter_mut()
            .find(|line| line.identity == identity)
            .ok_or_else(|| BasketError::UnknownLine(identity.to_string()))?;
        line.composition.message = note;
        Ok(())
    }

    /// Login keeps the basket (a guest's in-progress cart survives authenticating); logout clears
    /// it (a logged-out session must not leak into the next guest).
    fn switch_identity<S: BasketStorage>(
        &mut self,
        new_owner: Option<i64>,
        storage: &mut S,
    ) -> Result<(), BasketError> {
        let old_partition = self.partition();
        match new_owner {
            Some(user_id) => {
                debug!("🧺️ Re-keying basket from {old_partition} to user-{user_id}");
                storage.clear(&old_partition)?;
                self.owner = Some(user_id);
            },
            None => {
                debug!("🧺️ Logout; clearing basket and resetting to guest partition");
                storage.clear(&old_partition)?;
                self.owner = None;
                self.lines.clear();
            },
        }
        Ok(())
    }

    // Always from scratch. No incremental bookkeeping to drift.
    fn recompute_totals(&mut self) {
        self.total_items = self.lines.iter().map(|line| line.composition.quantity).sum();
        self.total_price = self.lines.iter().map(BasketLine::total_price).sum();
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use super::*;

    #[derive(Default)]
    struct MemoryStorage {
        partitions: HashMap<String, Vec<BasketLine>>,
    }

    impl BasketStorage for MemoryStorage {
        fn load(&self, partition: &str) -> Result<Option<Vec<BasketLine>>, BasketError> {
            Ok(self.partitions.get(partition).cloned())
        }

        fn store(&mut self, partition: &str, lines: &[BasketLine]) -> Result<(), BasketError> {
            self.partitions.insert(partition.to_string(), lines.to_vec());
            Ok(())
        }

        fn clear(&mut self, partition: &str) -> Result<(), BasketError> {
            self.partitions.remove(partition);
            Ok(())
        }
    }

    fn tacos() -> ItemComposition {
        ItemComposition::dish(1, 1).with_version("L").with_sauce(2).with_extras(vec![7, 3])
    }

    fn add(basket: &mut Basket, storage: &mut MemoryStorage, composition: ItemComposition, price: i64) {
        basket.dispatch(BasketAction::Add { composition, unit_price: Cents::from(price) }, storage).unwrap();
    }

    #[test]
    fn identical_configurations_merge_into_one_line() {
        let mut basket = Basket::new();
        let mut storage = MemoryStorage::default();
        add(&mut basket, &mut storage, tacos(), 1150);
        // Same configuration with the extras listed in a different order.
        add(&mut basket, &mut storage, ItemComposition::dish(1, 2).with_version("L").with_sauce(2).with_extras(vec![3, 7]), 1150);
        assert_eq!(basket.lines().len(), 1);
        assert_eq!(basket.lines()[0].composition.quantity, 3);
        assert_eq!(basket.total_items(), 3);
        assert_eq!(basket.total_price(), Cents::from(3450));
    }

    #[test]
    fn any_modifier_change_forks_a_new_line() {
        let mut basket = Basket::new();
        let mut storage = MemoryStorage::default();
        add(&mut basket, &mut storage, tacos(), 1150);
        add(&mut basket, &mut storage, tacos().with_version("M"), 1000);
        add(&mut basket, &mut storage, tacos().without_ingredients(vec![4]), 1150);
        assert_eq!(basket.lines().len(), 3);
    }

    #[test]
    fn notes_do_not_change_identity() {
        let mut basket = Basket::new();
        let mut storage = MemoryStorage::default();
        add(&mut basket, &mut storage, tacos(), 1150);
        add(&mut basket, &mut storage, tacos().with_message("Bien cuit svp"), 1150);
        assert_eq!(basket.lines().len(), 1);
        assert_eq!(basket.lines()[0].composition.quantity, 2);
    }

    #[test]
    fn set_quantity_is_absolute_and_zero_removes() {
        let mut basket = Basket::new();
        let mut storage = MemoryStorage::default();
        add(&mut basket, &mut storage, tacos(), 1150);
        let identity = basket.lines()[0].identity.clone();
        basket.dispatch(BasketAction::SetQuantity { identity: identity.clone(), quantity: 5 }, &mut storage).unwrap();
        assert_eq!(basket.lines()[0].composition.quantity, 5);
        assert_eq!(basket.total_price(), Cents::from(5750));
        basket.dispatch(BasketAction::SetQuantity { identity, quantity: 0 }, &mut storage).unwrap();
        assert!(basket.is_empty());
        assert_eq!(basket.total_price(), Cents::from(0));
    }

    #[test]
    fn unknown_lines_are_rejected() {
        let mut basket = Basket::new();
        let mut storage = MemoryStorage::default();
        let err = basket.dispatch(BasketAction::Remove { identity: "dish-9|v:|s:|e:|r:".to_string() }, &mut storage);
        assert!(matches!(err, Err(BasketError::UnknownLine(_))));
    }

    #[test]
    fn login_preserves_the_basket_and_rekeys_the_partition() {
        let mut basket = Basket::new();
        let mut storage = MemoryStorage::default();
        add(&mut basket, &mut storage, tacos(), 1150);
        assert!(storage.partitions.contains_key(GUEST_PARTITION));

        basket.dispatch(BasketAction::SwitchIdentity(Some(42)), &mut storage).unwrap();
        assert_eq!(basket.lines().len(), 1);
        assert_eq!(basket.partition(), "user-42");
        // The guest partition is gone; the contents now live under the user's key.
        assert!(!storage.partitions.contains_key(GUEST_PARTITION));
        assert_eq!(storage.partitions["user-42"].len(), 1);
    }

    #[test]
    fn login_overwrites_any_previously_stored_basket() {
        let mut storage = MemoryStorage::default();
        // A stale basket already stored under the user's partition.
        storage
            .partitions
            .insert("user-42".to_string(), vec![BasketLine {
                identity: composite_identity(&ItemComposition::dish(9, 1)),
                composition: ItemComposition::dish(9, 1),
                unit_price: Cents::from(700),
            }]);
        let mut basket = Basket::new();
        add(&mut basket, &mut storage, tacos(), 1150);
        basket.dispatch(BasketAction::SwitchIdentity(Some(42)), &mut storage).unwrap();
        // Last write wins; no merge with the stale basket.
        assert_eq!(storage.partitions["user-42"].len(), 1);
        assert_eq!(storage.partitions["user-42"][0].identity, composite_identity(&tacos()));
    }

    #[test]
    fn logout_clears_the_basket_and_resets_to_guest() {
        let mut basket = Basket::new();
        let mut storage = MemoryStorage::default();
        add(&mut basket, &mut storage, tacos(), 1150);
        basket.dispatch(BasketAction::SwitchIdentity(Some(42)), &mut storage).unwrap();
        basket.dispatch(BasketAction::SwitchIdentity(None), &mut storage).unwrap();
        assert!(basket.is_empty());
        assert_eq!(basket.partition(), GUEST_PARTITION);
        assert!(!storage.partitions.contains_key("user-42"));
        assert_eq!(storage.partitions[GUEST_PARTITION], Vec::<BasketLine>::new());
    }

    #[test]
    fn load_from_storage_replaces_in_memory_state() {
        let mut basket = Basket::new();
        let mut storage = MemoryStorage::default();
        add(&mut basket, &mut storage, tacos(), 1150);
        let mut fresh = Basket::new();
        fresh.dispatch(BasketAction::LoadFromStorage, &mut storage).unwrap();
        assert_eq!(fresh.lines().len(), 1);
        assert_eq!(fresh.total_items(), 1);
        assert_eq!(fresh.total_price(), Cents::from(1150));
    }
}
