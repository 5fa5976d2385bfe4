//! # Validation Module
//!
//! Input validation for cart and checkout operations.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Register input (apps/register)                               │
//! │  ├── Parsing (is it a number? a known method?)                         │
//! │  └── Immediate operator feedback                                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Quantity bounds, price cap, discount range, tax rate range        │
//! │  └── Cart size                                                         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Engine invariants (CartStore, PaymentReconciler)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::{Money, BPS_SCALE};
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY, MAX_PRICE_CENTS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validates a product identifier.
pub fn validate_product_id(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "product id".to_string(),
        });
    }

    Ok(())
}

/// Validates a quantity being added or set.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> CoreResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        }
        .into());
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(CoreError::QuantityTooLarge {
            requested: qty,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a product's unit price and returns it as [`Money`].
///
/// ## Rules
/// - Must not be negative (`InvalidAmount`); zero is allowed
/// - Must not exceed MAX_PRICE_CENTS (`OutOfRange`)
pub fn validate_price_cents(cents: i64) -> CoreResult<Money> {
    let price = Money::non_negative(cents, "product price")?;
    if cents > MAX_PRICE_CENTS {
        return Err(ValidationError::OutOfRange {
            field: "product price".to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        }
        .into());
    }

    Ok(price)
}

/// Validates a whole-number discount percent and narrows it.
///
/// ```rust
/// use till_core::validation::validate_discount_percent;
///
/// assert_eq!(validate_discount_percent(15).unwrap(), 15);
/// assert!(validate_discount_percent(-1).is_err());
/// assert!(validate_discount_percent(101).is_err());
/// ```
pub fn validate_discount_percent(percent: i64) -> CoreResult<u8> {
    if !(0..=100).contains(&percent) {
        return Err(CoreError::InvalidDiscount { percent });
    }

    Ok(percent as u8)
}

/// Validates a tax rate in basis points.
///
/// ## Rules
/// - Must be between 0 and 10000 (0% to 100%)
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps as i64 > BPS_SCALE {
        return Err(ValidationError::OutOfRange {
            field: "tax_rate".to_string(),
            min: 0,
            max: BPS_SCALE,
        });
    }

    Ok(())
}

/// Validates that one more line fits in the cart.
pub fn validate_cart_size(current_items: usize) -> CoreResult<()> {
    if current_items >= MAX_CART_ITEMS {
        return Err(CoreError::CartTooLarge {
            max: MAX_CART_ITEMS,
        });
    }

    Ok(())
}
