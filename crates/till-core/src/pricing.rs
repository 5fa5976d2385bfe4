//! # Pricing Engine
//!
//! Pure functions from a cart to its totals.
//!
//! ## Order of Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  subtotal  = Σ unit_price × quantity            (exact)                 │
//! │  discount  = subtotal × discount%               (rounded once)          │
//! │  taxable   = subtotal − discount                (discount is PRE-tax)   │
//! │  tax       = taxable × tax rate                 (rounded once)          │
//! │  total     = max(0, taxable + tax)                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing is cached. Call [`price`] whenever fresh numbers are needed.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::Cart;
use crate::money::Money;
use crate::types::TaxRate;

/// Derived totals for one cart at one tax rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PricingSnapshot {
    pub subtotal: Money,
    pub discount_amount: Money,
    pub tax_amount: Money,
    pub total: Money,
    /// Inputs, kept for display ("Tax (8.25%)", "Discount (10%)").
    pub tax_rate: TaxRate,
    pub discount_percent: u8,
}

impl PricingSnapshot {
    /// Subtotal after discount, before tax.
    #[inline]
    pub fn taxable_amount(&self) -> Money {
        self.subtotal - self.discount_amount
    }
}

/// Prices a cart.
///
/// ## Example
/// ```rust
/// use till_core::cart::CartStore;
/// use till_core::pricing::price;
/// use till_core::{Product, TaxRate};
///
/// let mut store = CartStore::new();
/// store.add_item(&Product::new("p-1", "Widget", 1000), 2).unwrap();
/// store.apply_discount(10).unwrap();
///
/// let pricing = price(store.cart(), TaxRate::from_bps(800));
/// assert_eq!(pricing.discount_amount.cents(), 200);
/// assert_eq!(pricing.tax_amount.cents(), 144);
/// assert_eq!(pricing.total.cents(), 1944);
/// ```
pub fn price(cart: &Cart, tax_rate: TaxRate) -> PricingSnapshot {
    let subtotal: Money = cart.items().iter().map(|item| item.line_total()).sum();
    let discount_amount = subtotal.percent_of(cart.discount_percent());
    let taxable = subtotal - discount_amount;
    let tax_amount = taxable.calculate_tax(tax_rate);
    let total = (taxable + tax_amount).clamp_non_negative();

    PricingSnapshot {
        subtotal,
        discount_amount,
        tax_amount,
        total,
        tax_rate,
        discount_percent: cart.discount_percent(),
    }
}
