//! # Receipt Generator
//!
//! Freezes a finished checkout into a [`ReceiptSnapshot`] for the printer.
//!
//! ## Snapshot Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   CartStore (live) ──clone──┐                                          │
//! │   PricingSnapshot ───copy───┼──► ReceiptSnapshot ──► printer / display │
//! │   PaymentState ─────copy────┤      (owned, immutable)                  │
//! │   ReceiptNumberProvider ────┘                                          │
//! │                                                                         │
//! │   Clearing or editing the live cart afterwards cannot reach the        │
//! │   receipt: it holds its own LineItems.                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity
//! - `id`: UUID v4, immutable, for storage and sync
//! - `receipt_number`: human-readable, from the sequence collaborator

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use ts_rs::TS;
use uuid::Uuid;

use crate::cart::{Cart, LineItem};
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::payment::PaymentState;
use crate::pricing::PricingSnapshot;

// =============================================================================
// Receipt Numbers
// =============================================================================

/// Supplies receipt numbers. Treated as opaque by the generator.
pub trait ReceiptNumberProvider {
    /// Returns the number for a receipt issued at `issued_at`.
    fn next_receipt_number(&mut self, issued_at: DateTime<Utc>) -> String;
}

/// Per-device daily counter: `YYYYMMDD-DD-NNNN`.
///
/// ## Format
/// - YYYYMMDD: issue date (UTC)
/// - DD: device code (last 2 chars of device_id, "00" if shorter)
/// - NNNN: sequence within the day, starting at 0001
///
/// ## Example
/// `20260131-01-0001`
#[derive(Debug, Clone)]
pub struct DailySequence {
    device_code: String,
    day: Option<NaiveDate>,
    counter: u32,
}

impl DailySequence {
    pub fn new(device_id: &str) -> Self {
        let chars: Vec<char> = device_id.chars().collect();
        let device_code = if chars.len() < 2 {
            "00".to_string()
        } else {
            chars[chars.len() - 2..].iter().collect()
        };

        DailySequence {
            device_code,
            day: None,
            counter: 0,
        }
    }

    /// Resumes a day's sequence (e.g. after a restart, from the last
    /// printed receipt).
    pub fn resume(device_id: &str, day: NaiveDate, last_issued: u32) -> Self {
        DailySequence {
            day: Some(day),
            counter: last_issued,
            ..DailySequence::new(device_id)
        }
    }
}

impl ReceiptNumberProvider for DailySequence {
    fn next_receipt_number(&mut self, issued_at: DateTime<Utc>) -> String {
        let today = issued_at.date_naive();
        if self.day != Some(today) {
            self.day = Some(today);
            self.counter = 0;
        }
        self.counter += 1;

        format!(
            "{}-{}-{:04}",
            today.format("%Y%m%d"),
            self.device_code,
            self.counter
        )
    }
}

// =============================================================================
// Receipt Snapshot
// =============================================================================

/// Immutable record of a completed sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptSnapshot {
    #[ts(as = "String")]
    id: Uuid,
    receipt_number: String,
    #[ts(as = "String")]
    timestamp_utc: DateTime<Utc>,
    line_items: Vec<ReceiptLine>,
    pricing: PricingSnapshot,
    payment: PaymentState,
    cashier: Option<String>,
    note: Option<String>,
}

/// A frozen line. Mirrors [`LineItem`] without the cart-only fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptLine {
    pub product_id: String,
    pub name: String,
    pub unit_price: Money,
    pub quantity: i64,
    pub line_total: Money,
    pub category: Option<String>,
}

impl From<&LineItem> for ReceiptLine {
    fn from(item: &LineItem) -> Self {
        ReceiptLine {
            product_id: item.product_id.clone(),
            name: item.name.clone(),
            unit_price: item.unit_price,
            quantity: item.quantity,
            line_total: item.line_total(),
            category: item.category.clone(),
        }
    }
}

impl ReceiptSnapshot {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn receipt_number(&self) -> &str {
        &self.receipt_number
    }

    pub fn timestamp_utc(&self) -> DateTime<Utc> {
        self.timestamp_utc
    }

    pub fn line_items(&self) -> &[ReceiptLine] {
        &self.line_items
    }

    pub fn pricing(&self) -> &PricingSnapshot {
        &self.pricing
    }

    pub fn payment(&self) -> &PaymentState {
        &self.payment
    }

    pub fn cashier(&self) -> Option<&str> {
        self.cashier.as_deref()
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    /// JSON for the printing/display collaborator.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

// =============================================================================
// Generator
// =============================================================================

/// Builds receipt snapshots.
///
/// ## Usage
/// ```rust
/// use till_core::cart::CartStore;
/// use till_core::payment::PaymentReconciler;
/// use till_core::pricing::price;
/// use till_core::receipt::{DailySequence, ReceiptGenerator};
/// use till_core::{PaymentMethod, Product, TaxRate};
///
/// let mut store = CartStore::new();
/// store.add_one(&Product::new("p-1", "Coffee", 350)).unwrap();
/// let pricing = price(store.cart(), TaxRate::from_bps(825));
///
/// let mut payment = PaymentReconciler::begin(store.cart(), &pricing);
/// payment.select_method(PaymentMethod::Card).unwrap();
/// let paid = payment.complete().unwrap();
///
/// let mut numbers = DailySequence::new("pos-01");
/// let receipt = ReceiptGenerator::new()
///     .with_cashier("Sam")
///     .generate(store.cart(), &pricing, &paid, &mut numbers)
///     .unwrap();
///
/// store.clear();
/// assert_eq!(receipt.line_items().len(), 1);
/// assert!(receipt.receipt_number().ends_with("-01-0001"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ReceiptGenerator {
    cashier: Option<String>,
    note: Option<String>,
}

impl ReceiptGenerator {
    pub fn new() -> Self {
        ReceiptGenerator::default()
    }

    pub fn with_cashier(mut self, cashier: impl Into<String>) -> Self {
        self.cashier = Some(cashier.into());
        self
    }

    /// Free-text note printed on the receipt. Supplied by the UI.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Snapshots a sale, timestamped now.
    pub fn generate(
        &self,
        cart: &Cart,
        pricing: &PricingSnapshot,
        payment: &PaymentState,
        numbers: &mut dyn ReceiptNumberProvider,
    ) -> CoreResult<ReceiptSnapshot> {
        self.generate_at(cart, pricing, payment, numbers, Utc::now())
    }

    /// Snapshots a sale with an explicit issue time.
    ///
    /// ## Errors
    /// - `EmptyCartReceipt` if the cart has no items
    /// - `IncompletePayment` if the payment was taken for a different total
    pub fn generate_at(
        &self,
        cart: &Cart,
        pricing: &PricingSnapshot,
        payment: &PaymentState,
        numbers: &mut dyn ReceiptNumberProvider,
        issued_at: DateTime<Utc>,
    ) -> CoreResult<ReceiptSnapshot> {
        if cart.is_empty() {
            warn!("Receipt requested for empty cart");
            return Err(CoreError::EmptyCartReceipt);
        }

        if payment.amount_due != pricing.total {
            return Err(CoreError::IncompletePayment {
                reason: format!(
                    "payment taken for {} but total is {}",
                    payment.amount_due, pricing.total
                ),
            });
        }

        let receipt = ReceiptSnapshot {
            id: Uuid::new_v4(),
            receipt_number: numbers.next_receipt_number(issued_at),
            timestamp_utc: issued_at,
            line_items: cart.items().iter().map(ReceiptLine::from).collect(),
            pricing: *pricing,
            payment: *payment,
            cashier: self.cashier.clone(),
            note: self.note.clone(),
        };

        info!(
            receipt_id = %receipt.id,
            receipt_number = %receipt.receipt_number,
            total = %receipt.pricing.total,
            items = receipt.line_items.len(),
            "Receipt generated"
        );
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::CartStore;
    use crate::payment::PaymentReconciler;
    use crate::pricing::price;
    use crate::types::{PaymentMethod, Product, TaxRate};
    use chrono::TimeZone;

    fn paid_cart() -> (CartStore, PricingSnapshot, PaymentState) {
        let mut store = CartStore::new();
        store
            .add_item(&Product::new("1", "Widget", 1000).with_category("tools"), 2)
            .unwrap();
        store.apply_discount(10).unwrap();
        let pricing = price(store.cart(), TaxRate::from_bps(800));

        let mut payment = PaymentReconciler::begin(store.cart(), &pricing);
        payment.select_method(PaymentMethod::Cash).unwrap();
        payment.set_amount_tendered(Money::from_cents(2000)).unwrap();
        let state = payment.complete().unwrap();
        (store, pricing, state)
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_generate_copies_everything() {
        let (store, pricing, payment) = paid_cart();
        let mut numbers = DailySequence::new("pos-07");
        let issued = at(2026, 1, 31, 12);

        let receipt = ReceiptGenerator::new()
            .with_cashier("Alex")
            .with_note("Gift wrap")
            .generate_at(store.cart(), &pricing, &payment, &mut numbers, issued)
            .unwrap();

        assert_eq!(receipt.receipt_number(), "20260131-07-0001");
        assert_eq!(receipt.timestamp_utc(), issued);
        assert_eq!(receipt.line_items().len(), 1);
        assert_eq!(receipt.line_items()[0].line_total.cents(), 2000);
        assert_eq!(receipt.line_items()[0].category.as_deref(), Some("tools"));
        assert_eq!(receipt.pricing().discount_percent, 10);
        assert_eq!(receipt.pricing().total.cents(), 1944);
        assert_eq!(receipt.payment().change.cents(), 56);
        assert_eq!(receipt.cashier(), Some("Alex"));
        assert_eq!(receipt.note(), Some("Gift wrap"));
    }

    #[test]
    fn test_receipt_unaffected_by_later_cart_mutation() {
        let (mut store, pricing, payment) = paid_cart();
        let mut numbers = DailySequence::new("pos-01");
        let receipt = ReceiptGenerator::new()
            .generate(store.cart(), &pricing, &payment, &mut numbers)
            .unwrap();

        store.update_quantity("1", 9).unwrap();
        store.add_one(&Product::new("2", "Extra", 50)).unwrap();
        store.clear();

        assert_eq!(receipt.line_items().len(), 1);
        assert_eq!(receipt.line_items()[0].quantity, 2);
        assert_eq!(receipt.pricing().discount_percent, 10);
    }

    #[test]
    fn test_empty_cart_receipt_fails() {
        let store = CartStore::new();
        let pricing = price(store.cart(), TaxRate::zero());
        let payment = PaymentState {
            method: PaymentMethod::Card,
            amount_due: Money::zero(),
            amount_tendered: Money::zero(),
            change: Money::zero(),
            is_valid: true,
        };
        let mut numbers = DailySequence::new("pos-01");

        let err = ReceiptGenerator::new()
            .generate(store.cart(), &pricing, &payment, &mut numbers)
            .unwrap_err();
        assert_eq!(err, CoreError::EmptyCartReceipt);
    }

    #[test]
    fn test_mismatched_payment_rejected() {
        let (mut store, _, payment) = paid_cart();
        store.add_one(&Product::new("2", "Late add", 100)).unwrap();
        let repriced = price(store.cart(), TaxRate::from_bps(800));
        let mut numbers = DailySequence::new("pos-01");

        assert!(matches!(
            ReceiptGenerator::new().generate(store.cart(), &repriced, &payment, &mut numbers),
            Err(CoreError::IncompletePayment { .. })
        ));
    }

    #[test]
    fn test_daily_sequence_counts_and_resets() {
        let mut numbers = DailySequence::new("register-12");
        assert_eq!(
            numbers.next_receipt_number(at(2026, 3, 1, 9)),
            "20260301-12-0001"
        );
        assert_eq!(
            numbers.next_receipt_number(at(2026, 3, 1, 17)),
            "20260301-12-0002"
        );
        assert_eq!(
            numbers.next_receipt_number(at(2026, 3, 2, 8)),
            "20260302-12-0001"
        );
    }

    #[test]
    fn test_daily_sequence_short_device_id_and_resume() {
        let mut numbers = DailySequence::new("x");
        assert_eq!(
            numbers.next_receipt_number(at(2026, 3, 1, 9)),
            "20260301-00-0001"
        );

        let day = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let mut resumed = DailySequence::resume("pos-01", day, 41);
        assert_eq!(
            resumed.next_receipt_number(at(2026, 3, 1, 10)),
            "20260301-01-0042"
        );
    }

    #[test]
    fn test_receipt_json_export() {
        let (store, pricing, payment) = paid_cart();
        let mut numbers = DailySequence::new("pos-01");
        let receipt = ReceiptGenerator::new()
            .generate(store.cart(), &pricing, &payment, &mut numbers)
            .unwrap();

        let json = receipt.to_json().unwrap();
        assert!(json.contains("\"receiptNumber\""));
        let parsed: ReceiptSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, receipt);
    }
}
