//! # till-core: Cart and Checkout Engine for Till
//!
//! This crate is the **heart** of Till. It turns selected products into a
//! total, checks the tender against it, and freezes the result into a
//! receipt. Pure, synchronous, zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Till Architecture                                │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │          UI collaborator (apps/register, web front end)         │   │
//! │  │    Product tap ──► Cart panel ──► Tender keypad ──► Receipt     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ calls / subscribes                     │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ till-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   cart    │─►│  pricing  │─►│  payment  │─►│  receipt  │  │   │
//! │  │   │ CartStore │  │  price()  │  │Reconciler │  │ Generator │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │          └──────────── session (CheckoutSession) ─────┘        │   │
//! │  │                                                                 │   │
//! │  │   money • types • validation • error                            │   │
//! │  │   NO I/O • NO THREADS • NO FLOATS IN TOTALS                     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money type, rounding, the single formatting function
//! - [`types`] - Product, TaxRate, PaymentMethod
//! - [`cart`] - CartStore (single owner of the cart, change listeners)
//! - [`pricing`] - Subtotal, discount, tax, total
//! - [`payment`] - PaymentReconciler state machine
//! - [`receipt`] - ReceiptGenerator and receipt numbering
//! - [`session`] - CheckoutSession tying the above together
//! - [`validation`] - Business rule validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use till_core::receipt::DailySequence;
//! use till_core::session::CheckoutSession;
//! use till_core::{Money, PaymentMethod, Product, TaxRate};
//!
//! let mut session =
//!     CheckoutSession::new(TaxRate::from_bps(825), DailySequence::new("pos-01")).unwrap();
//! session.cart_mut().add_one(&Product::new("p-1", "Sandwich", 1000)).unwrap();
//!
//! let payment = session.begin_checkout();
//! payment.select_method(PaymentMethod::Cash).unwrap();
//! payment.set_amount_tendered(Money::from_cents(2000)).unwrap();
//!
//! let receipt = session.complete_checkout(None).unwrap();
//! assert_eq!(receipt.pricing().total.cents(), 1083);
//! assert_eq!(receipt.payment().change.cents(), 917);
//! assert!(session.cart().is_empty());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod payment;
pub mod pricing;
pub mod receipt;
pub mod session;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartStore, LineItem, SubscriptionId};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{Currency, Locale, Money};
pub use payment::{PaymentReconciler, PaymentStage, PaymentState, TenderStatus};
pub use pricing::PricingSnapshot;
pub use receipt::{DailySequence, ReceiptGenerator, ReceiptNumberProvider, ReceiptSnapshot};
pub use session::CheckoutSession;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines allowed in a single cart
///
/// ## Business Reason
/// Prevents runaway carts and keeps receipts printable.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line
///
/// ## Business Reason
/// Catches keypad slips (typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Highest unit price accepted for a product, in minor units
///
/// ## Business Reason
/// One million in major units per item is far past any till sale, and
/// keeps every line total and cart total well inside `i64`.
pub const MAX_PRICE_CENTS: i64 = 100_000_000;
