//! Money calculation utilities using rust_decimal for precision
//!
//! All arithmetic happens on `Decimal`; values are converted back to `f64`
//! (rounded to 2 dp, half away from zero) only for storage and responses.

use super::error::OrderError;
use rust_decimal::prelude::*;
use shared::models::PaymentInput;

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Maximum allowed unit price
pub const MAX_PRICE: f64 = 1_000_000.0;
/// Maximum allowed quantity per line
pub const MAX_QUANTITY: i64 = 9999;
/// Maximum allowed single payment
pub const MAX_PAYMENT_AMOUNT: f64 = 1_000_000.0;

/// Validate that a f64 value is finite (not NaN, not Infinity)
#[inline]
fn require_finite(value: f64, field_name: &str) -> Result<(), OrderError> {
    if !value.is_finite() {
        return Err(OrderError::Validation(format!(
            "{} must be a finite number, got {}",
            field_name, value
        )));
    }
    Ok(())
}

/// Quantity must be a positive integer within bounds
pub fn validate_quantity(quantity: i64) -> Result<(), OrderError> {
    if quantity <= 0 {
        return Err(OrderError::Validation(format!(
            "quantity must be positive, got {}",
            quantity
        )));
    }
    if quantity > MAX_QUANTITY {
        return Err(OrderError::Validation(format!(
            "quantity exceeds maximum allowed ({}), got {}",
            MAX_QUANTITY, quantity
        )));
    }
    Ok(())
}

/// Stored prices are trusted but still checked before multiplying
pub fn validate_price(price: f64, field_name: &str) -> Result<(), OrderError> {
    require_finite(price, field_name)?;
    if !(0.0..=MAX_PRICE).contains(&price) {
        return Err(OrderError::Validation(format!(
            "{} out of range (0..={}), got {}",
            field_name, MAX_PRICE, price
        )));
    }
    Ok(())
}

/// Validate a tender before it is summed or stored
pub fn validate_payment(payment: &PaymentInput) -> Result<(), OrderError> {
    require_finite(payment.amount_given, "payment amount")?;
    if payment.amount_given <= 0.0 {
        return Err(OrderError::Validation(format!(
            "payment amount must be positive, got {}",
            payment.amount_given
        )));
    }
    if payment.amount_given > MAX_PAYMENT_AMOUNT {
        return Err(OrderError::Validation(format!(
            "payment amount exceeds maximum allowed ({}), got {}",
            MAX_PAYMENT_AMOUNT, payment.amount_given
        )));
    }
    Ok(())
}

/// Convert f64 to Decimal for calculation
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// price × quantity
#[inline]
pub fn line_amount(price: f64, quantity: i64) -> Decimal {
    to_decimal(price) * Decimal::from(quantity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::PaymentMethod;

    #[test]
    fn test_to_decimal_precision() {
        let a = 0.1_f64;
        let b = 0.2_f64;
        assert_ne!(a + b, 0.3);
        assert_eq!(to_f64(to_decimal(a) + to_decimal(b)), 0.3);
    }

    #[test]
    fn test_accumulation_precision() {
        let mut total = Decimal::ZERO;
        for _ in 0..1000 {
            total += to_decimal(0.01);
        }
        assert_eq!(to_f64(total), 10.0);
    }

    #[test]
    fn test_rounding_half_away_from_zero() {
        assert_eq!(to_f64(Decimal::new(1005, 3)), 1.01);
        assert_eq!(to_f64(Decimal::new(-1005, 3)), -1.01);
    }

    #[test]
    fn test_line_amount() {
        assert_eq!(to_f64(line_amount(50.0, 2)), 100.0);
        assert_eq!(to_f64(line_amount(10.99, 3)), 32.97);
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_QUANTITY).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-3).is_err());
        assert!(validate_quantity(MAX_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_payment() {
        let ok = PaymentInput {
            payment_method: PaymentMethod::Cash,
            amount_given: 130.0,
        };
        assert!(validate_payment(&ok).is_ok());

        for bad in [0.0, -5.0, f64::NAN, f64::INFINITY, MAX_PAYMENT_AMOUNT + 1.0] {
            let p = PaymentInput {
                payment_method: PaymentMethod::Card,
                amount_given: bad,
            };
            assert!(validate_payment(&p).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_validate_price() {
        assert!(validate_price(0.0, "price").is_ok());
        assert!(validate_price(-0.01, "price").is_err());
        assert!(validate_price(f64::NAN, "price").is_err());
    }
}
