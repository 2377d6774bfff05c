//! The pricing engine.
//!
//! Pure functions computing authoritative item and order prices from a catalog snapshot taken at
//! checkout time. The server never trusts client-submitted prices: every amount is re-derived here,
//! and any reference to a dish, sauce, extra or ingredient that does not exist in the snapshot
//! fails the whole computation.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::Display,
};

use bistro_common::Cents;
use thiserror::Error;

use crate::db_types::{Dish, DishVersion, Extra, Ingredient, ItemComposition, OrderType, OrderedItem, Sauce};

//--------------------------------------     Errors          ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    Dish,
    Sauce,
    Extra,
    Ingredient,
}

impl Display for RefKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefKind::Dish => write!(f, "dish"),
            RefKind::Sauce => write!(f, "sauce"),
            RefKind::Extra => write!(f, "extra"),
            RefKind::Ingredient => write!(f, "ingredient"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    #[error("Unknown {kind} reference: id {id} does not exist in the catalog")]
    UnknownReference { kind: RefKind, id: i64 },
}

impl PricingError {
    pub fn unknown(kind: RefKind, id: i64) -> Self {
        Self::UnknownReference { kind, id }
    }
}

//--------------------------------------   FeeSchedule       ---------------------------------------------------------
/// Delivery fee policy. Sourced from configuration; see `bistro_server::config`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSchedule {
    /// Delivery orders with a subtotal at or above this threshold ship free.
    pub free_delivery_threshold: Cents,
    /// Flat fee charged below the threshold.
    pub delivery_fee: Cents,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self { free_delivery_threshold: Cents::from(2500), delivery_fee: Cents::from(250) }
    }
}

//--------------------------------------  CatalogSnapshot    ---------------------------------------------------------
/// A read-only view of the catalog, authoritative at the instant of checkout.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    dishes: BTreeMap<i64, (Dish, Vec<DishVersion>)>,
    sauces: BTreeMap<i64, Sauce>,
    extras: BTreeMap<i64, Extra>,
    ingredients: BTreeSet<i64>,
}

impl CatalogSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_dish(&mut self, dish: Dish, versions: Vec<DishVersion>) {
        self.dishes.insert(dish.id, (dish, versions));
    }

    pub fn add_sauce(&mut self, sauce: Sauce) {
        self.sauces.insert(sauce.id, sauce);
    }

    pub fn add_extra(&mut self, extra: Extra) {
        self.extras.insert(extra.id, extra);
    }

    pub fn add_ingredient(&mut self, ingredient: Ingredient) {
        self.ingredients.insert(ingredient.id);
    }

    fn dish(&self, id: i64) -> Result<&(Dish, Vec<DishVersion>), PricingError> {
        self.dishes.get(&id).ok_or(PricingError::unknown(RefKind::Dish, id))
    }

    fn sauce(&self, id: i64) -> Result<&Sauce, PricingError> {
        self.sauces.get(&id).ok_or(PricingError::unknown(RefKind::Sauce, id))
    }

    fn extra(&self, id: i64) -> Result<&Extra, PricingError> {
        self.extras.get(&id).ok_or(PricingError::unknown(RefKind::Extra, id))
    }

    fn check_ingredient(&self, id: i64) -> Result<(), PricingError> {
        if self.ingredients.contains(&id) {
            Ok(())
        } else {
            Err(PricingError::unknown(RefKind::Ingredient, id))
        }
    }
}

//--------------------------------------    PricedItem       ---------------------------------------------------------
/// One basket line with all prices resolved and locked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedItem {
    pub composition: ItemComposition,
    /// The version/size name actually applied, after fallback.
    pub resolved_version: Option<String>,
    pub unit_price: Cents,
    /// `unit_price` × quantity.
    pub total_price: Cents,
    /// Each added extra with its own locked price.
    pub extra_prices: Vec<(i64, Cents)>,
}

/// Computes the authoritative unit price for a single item composition.
///
/// Price components:
/// * base price of the selected dish or sauce;
/// * the version/size surcharge. When the requested version is missing from the catalog the first
///   defined version applies, deterministically;
/// * the modifier sauce's price, unless the dish includes a sauce for free;
/// * each added extra's own price;
/// * removed ingredients are validated but carry no price delta.
pub fn unit_price(composition: &ItemComposition, catalog: &CatalogSnapshot) -> Result<PricedItem, PricingError> {
    let mut price;
    let mut resolved_version = None;
    match composition.item {
        OrderedItem::Dish(dish_id) => {
            let (dish, versions) = catalog.dish(dish_id)?;
            price = dish.price;
            if !versions.is_empty() {
                let version = composition
                    .version_size
                    .as_deref()
                    .and_then(|wanted| versions.iter().find(|v| v.name == wanted))
                    .unwrap_or(&versions[0]);
                price = price + version.extra_price;
                resolved_version = Some(version.name.clone());
            }
            if let Some(sauce_id) = composition.sauce_id {
                let sauce = catalog.sauce(sauce_id)?;
                if !dish.sauce_included {
                    price = price + sauce.price;
                }
            }
        },
        OrderedItem::Sauce(sauce_id) => {
            price = catalog.sauce(sauce_id)?.price;
        },
    }
    let mut extra_prices = Vec::with_capacity(composition.extra_ids.len());
    for extra_id in &composition.extra_ids {
        let extra = catalog.extra(*extra_id)?;
        price = price + extra.price;
        extra_prices.push((*extra_id, extra.price));
    }
    for ingredient_id in &composition.removed_ingredient_ids {
        catalog.check_ingredient(*ingredient_id)?;
    }
    Ok(PricedItem {
        composition: composition.clone(),
        resolved_version,
        unit_price: price,
        total_price: price * composition.quantity,
        extra_prices,
    })
}

/// Prices every line or fails the whole batch.
pub fn price_items(items: &[ItemComposition], catalog: &CatalogSnapshot) -> Result<Vec<PricedItem>, PricingError> {
    items.iter().map(|c| unit_price(c, catalog)).collect()
}

pub fn subtotal(items: &[PricedItem]) -> Cents {
    items.iter().map(|i| i.total_price).sum()
}

/// Zero for takeout. For delivery: zero at or above the free-delivery threshold, a flat fee below.
pub fn delivery_fee(order_type: OrderType, subtotal: Cents, schedule: &FeeSchedule) -> Cents {
    match order_type {
        OrderType::Takeout => Cents::from(0),
        OrderType::Delivery if subtotal >= schedule.free_delivery_threshold => Cents::from(0),
        OrderType::Delivery => schedule.delivery_fee,
    }
}

pub fn order_total(items: &[PricedItem], order_type: OrderType, schedule: &FeeSchedule) -> Cents {
    let sub = subtotal(items);
    sub + delivery_fee(order_type, sub, schedule)
}
