//! # Domain Types
//!
//! Shared domain types used throughout Till.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │    TaxRate      │   │ PaymentMethod   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  bps (u32)      │   │  Cash           │       │
//! │  │  name           │   │  825 = 8.25%    │   │  Card           │       │
//! │  │  price_cents    │   └─────────────────┘   │  Contactless    │       │
//! │  │  category?      │                         │  Mobile         │       │
//! │  └─────────────────┘                         └─────────────────┘       │
//! │                                                                         │
//! │  Cart/LineItem live in `cart`, PricingSnapshot in `pricing`,           │
//! │  PaymentState in `payment`, ReceiptSnapshot in `receipt`.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 825 bps = 8.25% (e.g., Texas sales tax)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

/// `8.25%`, trailing zeros trimmed.
impl fmt::Display for TaxRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / 100;
        let frac = self.0 % 100;
        match frac {
            0 => write!(f, "{}%", whole),
            f2 if f2 % 10 == 0 => write!(f, "{}.{}%", whole, f2 / 10),
            f2 => write!(f, "{}.{:02}%", whole, f2),
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product offered by the catalog collaborator.
///
/// The core never looks products up; the caller hands one to
/// [`CartStore::add_item`](crate::cart::CartStore::add_item), which copies
/// the fields it needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    /// Catalog identifier. Cart lines are unique by this value.
    pub id: String,

    /// Display name shown to cashier and on receipt.
    pub name: String,

    /// Price in minor units.
    pub price_cents: i64,

    /// Optional grouping used by the catalog screens.
    #[serde(default)]
    pub category: Option<String>,
}

impl Product {
    pub fn new(id: impl Into<String>, name: impl Into<String>, price_cents: i64) -> Self {
        Product {
            id: id.into(),
            name: name.into(),
            price_cents,
            category: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// How the customer pays.
///
/// Only `Cash` goes through amount entry. Everything else is charged for
/// exactly the amount due on an external terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// Chip or swipe card on an external terminal.
    Card,
    /// Tap-to-pay card.
    Contactless,
    /// Phone wallet / QR payment.
    Mobile,
}

impl PaymentMethod {
    #[inline]
    pub const fn is_cash(&self) -> bool {
        matches!(self, PaymentMethod::Cash)
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMethod::Cash => write!(f, "cash"),
            PaymentMethod::Card => write!(f, "card"),
            PaymentMethod::Contactless => write!(f, "contactless"),
            PaymentMethod::Mobile => write!(f, "mobile"),
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "card" | "credit" | "debit" => Ok(PaymentMethod::Card),
            "contactless" | "tap" | "nfc" => Ok(PaymentMethod::Contactless),
            "mobile" | "wallet" | "qr" => Ok(PaymentMethod::Mobile),
            _ => Err(ValidationError::NotAllowed {
                field: "payment method".to_string(),
                allowed: vec![
                    "cash".into(),
                    "card".into(),
                    "contactless".into(),
                    "mobile".into(),
                ],
            }),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
