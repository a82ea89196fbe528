//! Payment Reconciler
//!
//! exchange = Σ tendered − total. Never clamped: a shortfall is either an
//! error (reject policy) or reported as a negative exchange (advisory).

use rust_decimal::Decimal;
use shared::models::{Payment, PaymentInput};

use super::error::{OrderError, OrderResult};
use super::money::{to_decimal, to_f64};
use crate::core::PaymentPolicy;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reconciliation {
    pub tendered: Decimal,
    pub due: Decimal,
    pub exchange: Decimal,
}

impl Reconciliation {
    pub fn exchange(&self) -> f64 {
        to_f64(self.exchange)
    }

    pub fn is_sufficient(&self) -> bool {
        self.exchange >= Decimal::ZERO
    }
}

pub fn tendered_sum<'a>(amounts: impl IntoIterator<Item = &'a f64>) -> Decimal {
    amounts.into_iter().map(|a| to_decimal(*a)).sum()
}

pub fn reconcile(
    payments: &[PaymentInput],
    due: Decimal,
    policy: PaymentPolicy,
) -> OrderResult<Reconciliation> {
    settle(tendered_sum(payments.iter().map(|p| &p.amount_given)), due, policy)
}

/// Same as [`reconcile`] for tenders already stored
pub fn reconcile_stored(
    payments: &[Payment],
    due: Decimal,
    policy: PaymentPolicy,
) -> OrderResult<Reconciliation> {
    settle(tendered_sum(payments.iter().map(|p| &p.amount_given)), due, policy)
}

fn settle(tendered: Decimal, due: Decimal, policy: PaymentPolicy) -> OrderResult<Reconciliation> {
    let result = Reconciliation {
        tendered,
        due,
        exchange: tendered - due,
    };

    if !result.is_sufficient() {
        match policy {
            PaymentPolicy::Reject => {
                return Err(OrderError::InsufficientPayment {
                    tendered: to_f64(tendered),
                    due: to_f64(due),
                });
            }
            PaymentPolicy::Advisory => {
                tracing::warn!(
                    tendered = %tendered,
                    due = %due,
                    "Insufficient payment accepted under advisory policy"
                );
            }
        }
    }
    Ok(result)
}
