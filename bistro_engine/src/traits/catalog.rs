use crate::{
    db_types::{Dish, DishVersion, Extra, Ingredient, ItemComposition, OrderedItem, Sauce},
    pricing::CatalogSnapshot,
    traits::OrderFlowError,
};

/// Read-only, authoritative catalog access at the instant of checkout.
#[allow(async_fn_in_trait)]
pub trait CatalogStore {
    /// The dish plus its version/size list, ordered by catalog position.
    async fn fetch_dish(&self, id: i64) -> Result<Option<(Dish, Vec<DishVersion>)>, OrderFlowError>;
    async fn fetch_sauce(&self, id: i64) -> Result<Option<Sauce>, OrderFlowError>;
    async fn fetch_extra(&self, id: i64) -> Result<Option<Extra>, OrderFlowError>;
    async fn fetch_ingredient(&self, id: i64) -> Result<Option<Ingredient>, OrderFlowError>;

    /// Assembles the snapshot covering every reference in `items`. Missing references are
    /// reported as pricing errors naming the offending id, and fail the whole checkout.
    async fn snapshot_for_items(&self, items: &[ItemComposition]) -> Result<CatalogSnapshot, OrderFlowError> {
        use crate::pricing::{PricingError, RefKind};
        let mut snapshot = CatalogSnapshot::new();
        for composition in items {
            match composition.item {
                OrderedItem::Dish(id) => {
                    let (dish, versions) =
                        self.fetch_dish(id).await?.ok_or(PricingError::unknown(RefKind::Dish, id))?;
                    snapshot.add_dish(dish, versions);
                },
                OrderedItem::Sauce(id) => {
                    let sauce = self.fetch_sauce(id).await?.ok_or(PricingError::unknown(RefKind::Sauce, id))?;
                    snapshot.add_sauce(sauce);
                },
            }
            if let Some(id) = composition.sauce_id {
                let sauce = self.fetch_sauce(id).await?.ok_or(PricingError::unknown(RefKind::Sauce, id))?;
                snapshot.add_sauce(sauce);
            }
            for &id in &composition.extra_ids {
                let extra = self.fetch_extra(id).await?.ok_or(PricingError::unknown(RefKind::Extra, id))?;
                snapshot.add_extra(extra);
            }
            for &id in &composition.removed_ingredient_ids {
                let ingredient =
                    self.fetch_ingredient(id).await?.ok_or(PricingError::unknown(RefKind::Ingredient, id))?;
                snapshot.add_ingredient(ingredient);
            }
        }
        Ok(snapshot)
    }
}
