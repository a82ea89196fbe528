//! Price Resolver
//!
//! One batched lookup per entity type; prices are always read from the store
//! at build time, never held in memory between orders.

use std::collections::{BTreeSet, HashMap};

use shared::models::{MealPrice, ModifierPrice, OrderItemInput};
use sqlx::SqliteConnection;

use super::error::{OrderError, OrderResult};
use super::money::validate_price;
use crate::core::ModifierPolicy;
use crate::db::repository::{meal, modifier};

/// Current prices for the ids referenced by one request
#[derive(Debug, Clone, Default)]
pub struct PriceTable {
    meals: HashMap<i64, f64>,
    modifiers: HashMap<i64, ModifierPrice>,
}

impl PriceTable {
    pub fn from_rows(meals: Vec<MealPrice>, modifiers: Vec<ModifierPrice>) -> Self {
        Self {
            meals: meals.into_iter().map(|m| (m.id, m.price)).collect(),
            modifiers: modifiers.into_iter().map(|m| (m.id, m)).collect(),
        }
    }

    pub fn meal_price(&self, id: i64) -> Option<f64> {
        self.meals.get(&id).copied()
    }

    pub fn modifier(&self, id: i64) -> Option<&ModifierPrice> {
        self.modifiers.get(&id)
    }
}

/// De-duplicated meal and modifier ids referenced by a set of lines,
/// in first-seen order
pub fn collect_ids(items: &[OrderItemInput]) -> (Vec<i64>, Vec<i64>) {
    let mut seen_meals = BTreeSet::new();
    let mut seen_modifiers = BTreeSet::new();
    let mut meal_ids = Vec::new();
    let mut modifier_ids = Vec::new();

    for item in items {
        if seen_meals.insert(item.meal_id) {
            meal_ids.push(item.meal_id);
        }
        for id in &item.modifiers {
            if seen_modifiers.insert(*id) {
                modifier_ids.push(*id);
            }
        }
    }
    (meal_ids, modifier_ids)
}

#[derive(Debug, Clone, Copy)]
pub struct PriceResolver {
    policy: ModifierPolicy,
}

impl PriceResolver {
    pub fn new(policy: ModifierPolicy) -> Self {
        Self { policy }
    }

    /// Fetch prices for the given ids; fails on the first missing meal, and on
    /// the first missing modifier unless the policy ignores them
    pub async fn resolve(
        &self,
        conn: &mut SqliteConnection,
        meal_ids: &[i64],
        modifier_ids: &[i64],
    ) -> OrderResult<PriceTable> {
        let meals = meal::find_prices_by_ids(&mut *conn, meal_ids).await?;
        let modifiers = modifier::find_prices_by_ids(&mut *conn, modifier_ids).await?;
        let table = PriceTable::from_rows(meals, modifiers);
        self.check(&table, meal_ids, modifier_ids)?;
        Ok(table)
    }

    fn check(&self, table: &PriceTable, meal_ids: &[i64], modifier_ids: &[i64]) -> OrderResult<()> {
        for id in meal_ids {
            let price = table.meal_price(*id).ok_or(OrderError::MealNotFound(*id))?;
            validate_price(price, "meal price").map_err(|e| OrderError::InvalidMealPrice {
                id: *id,
                reason: e.to_string(),
            })?;
        }

        for id in modifier_ids {
            match table.modifier(*id) {
                Some(m) => {
                    if let Some(price) = m.price {
                        validate_price(price, "modifier price").map_err(|e| {
                            OrderError::InvalidModifierPrice {
                                id: *id,
                                reason: e.to_string(),
                            }
                        })?;
                    }
                }
                None => match self.policy {
                    ModifierPolicy::Reject => return Err(OrderError::ModifierNotFound(*id)),
                    ModifierPolicy::Ignore => {
                        tracing::warn!(modifier_id = *id, "Unknown modifier ignored");
                    }
                },
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(meal_id: i64, modifiers: Vec<i64>) -> OrderItemInput {
        OrderItemInput {
            meal_id,
            quantity: 1,
            modifiers,
        }
    }

    fn table() -> PriceTable {
        PriceTable::from_rows(
            vec![MealPrice { id: 1, price: 50.0 }],
            vec![ModifierPrice {
                id: 9,
                price: Some(10.0),
                has_price: true,
            }],
        )
    }

    #[test]
    fn test_collect_ids_deduplicates_in_order() {
        let items = vec![line(3, vec![9, 7]), line(1, vec![7]), line(3, vec![])];
        let (meals, modifiers) = collect_ids(&items);
        assert_eq!(meals, vec![3, 1]);
        assert_eq!(modifiers, vec![9, 7]);
    }

    #[test]
    fn test_missing_meal_names_the_id() {
        let resolver = PriceResolver::new(ModifierPolicy::Reject);
        let err = resolver.check(&table(), &[1, 2], &[]).unwrap_err();
        assert!(matches!(err, OrderError::MealNotFound(2)));
    }

    #[test]
    fn test_missing_modifier_rejected_by_default() {
        let resolver = PriceResolver::new(ModifierPolicy::default());
        let err = resolver.check(&table(), &[1], &[9, 11]).unwrap_err();
        assert!(matches!(err, OrderError::ModifierNotFound(11)));
    }

    #[test]
    fn test_missing_modifier_ignored_by_policy() {
        let resolver = PriceResolver::new(ModifierPolicy::Ignore);
        assert!(resolver.check(&table(), &[1], &[9, 11]).is_ok());
    }

    #[test]
    fn test_negative_stored_price_rejected() {
        let resolver = PriceResolver::new(ModifierPolicy::Reject);
        let table = PriceTable::from_rows(vec![MealPrice { id: 1, price: -1.0 }], vec![]);
        assert!(matches!(
            resolver.check(&table, &[1], &[]),
            Err(OrderError::InvalidMealPrice { id: 1, .. })
        ));

        let table = PriceTable::from_rows(
            vec![MealPrice { id: 1, price: 50.0 }],
            vec![ModifierPrice {
                id: 9,
                price: Some(f64::NAN),
                has_price: true,
            }],
        );
        assert!(matches!(
            resolver.check(&table, &[1], &[9]),
            Err(OrderError::InvalidModifierPrice { id: 9, .. })
        ));
    }
}
