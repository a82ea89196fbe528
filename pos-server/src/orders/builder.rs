//! Order Builder
//!
//! Expands a request into priced lines and a total, entirely in memory.
//!
//! - line subtotal = meal price × quantity
//! - each distinct priced modifier on a line adds modifier price × quantity
//!   to the order total (not to the line subtotal)
//! - total = Σ subtotals + Σ priced-modifier contributions

use rust_decimal::Decimal;
use shared::models::{MealSubtotal, OrderCreate, OrderItemInput, OrderStatus, PaymentInput};

use super::error::{OrderError, OrderResult};
use super::money::{line_amount, to_decimal, to_f64, validate_payment, validate_quantity};
use super::pricing::PriceTable;

/// A line with its prices resolved
#[derive(Debug, Clone, PartialEq)]
pub struct PricedLine {
    pub meal_id: i64,
    pub quantity: i64,
    pub unit_price: f64,
    /// meal price × quantity
    pub subtotal: Decimal,
    /// Σ priced modifier × quantity
    pub modifier_total: Decimal,
    /// Known, de-duplicated modifier ids to link to the line
    pub modifier_ids: Vec<i64>,
}

impl PricedLine {
    pub fn total(&self) -> Decimal {
        self.subtotal + self.modifier_total
    }
}

/// Fully priced order ready to persist
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub client_name: String,
    pub client_phone: String,
    pub status: OrderStatus,
    pub lines: Vec<PricedLine>,
    pub payments: Vec<PaymentInput>,
    pub total: Decimal,
}

impl OrderDraft {
    pub fn total_price(&self) -> f64 {
        to_f64(self.total)
    }

    /// Receipt entries, one per line
    pub fn subtotals(&self) -> Vec<MealSubtotal> {
        self.lines
            .iter()
            .map(|line| MealSubtotal {
                meal_id: line.meal_id,
                subtotal: to_f64(line.subtotal),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OrderBuilder {
    allow_empty: bool,
}

impl OrderBuilder {
    pub fn new(allow_empty: bool) -> Self {
        Self { allow_empty }
    }

    /// Checks that need no store access
    pub fn validate(&self, request: &OrderCreate) -> OrderResult<()> {
        if request.client_name.trim().is_empty() {
            return Err(OrderError::Validation("client name is required".into()));
        }
        self.validate_lines(&request.items)?;
        self.validate_payments(&request.payments)
    }

    pub fn validate_lines(&self, items: &[OrderItemInput]) -> OrderResult<()> {
        if items.is_empty() && !self.allow_empty {
            return Err(OrderError::EmptyOrder);
        }
        items.iter().try_for_each(|item| validate_quantity(item.quantity))
    }

    pub fn validate_payments(&self, payments: &[PaymentInput]) -> OrderResult<()> {
        payments.iter().try_for_each(validate_payment)
    }

    /// Price every line against `prices`
    pub fn price_lines(
        &self,
        items: &[OrderItemInput],
        prices: &PriceTable,
    ) -> OrderResult<(Vec<PricedLine>, Decimal)> {
        let mut total = Decimal::ZERO;
        let mut lines = Vec::with_capacity(items.len());

        for item in items {
            validate_quantity(item.quantity)?;
            let unit_price = prices
                .meal_price(item.meal_id)
                .ok_or(OrderError::MealNotFound(item.meal_id))?;
            let subtotal = line_amount(unit_price, item.quantity);

            let mut modifier_total = Decimal::ZERO;
            let mut modifier_ids: Vec<i64> = Vec::with_capacity(item.modifiers.len());
            for id in &item.modifiers {
                if modifier_ids.contains(id) {
                    continue;
                }
                // Unknown ids only reach here under the ignore policy
                let Some(modifier) = prices.modifier(*id) else {
                    continue;
                };
                if modifier.has_price {
                    modifier_total += line_amount(modifier.price.unwrap_or(0.0), item.quantity);
                }
                modifier_ids.push(*id);
            }

            total += subtotal + modifier_total;
            lines.push(PricedLine {
                meal_id: item.meal_id,
                quantity: item.quantity,
                unit_price: to_f64(to_decimal(unit_price)),
                subtotal,
                modifier_total,
                modifier_ids,
            });
        }

        Ok((lines, total))
    }

    pub fn build(&self, request: &OrderCreate, prices: &PriceTable) -> OrderResult<OrderDraft> {
        self.validate(request)?;
        let (lines, total) = self.price_lines(&request.items, prices)?;
        Ok(OrderDraft {
            client_name: request.client_name.trim().to_string(),
            client_phone: request.client_phone.trim().to_string(),
            status: request.status.unwrap_or_default(),
            lines,
            payments: request.payments.clone(),
            total,
        })
    }
}
