//! # Checkout Session
//!
//! Wires the engine together for one register.
//!
//! ## Checkout Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Checkout Lifecycle                                   │
//! │                                                                         │
//! │  ┌──────────┐     ┌──────────┐     ┌──────────┐     ┌──────────┐       │
//! │  │  Empty   │────►│ In Cart  │────►│  Tender  │────►│ Receipt  │       │
//! │  │  Cart    │     │          │     │          │     │  Issued  │       │
//! │  └──────────┘     └──────────┘     └──────────┘     └──────────┘       │
//! │       ▲                │  ▲             │                 │             │
//! │       │           cart_mut()      begin_checkout()        │             │
//! │       │                │  └── cancel / edit cart ─┘       │             │
//! │       │                ▼                                   │             │
//! │       └──────────── clear ◄──── complete_checkout() ──────┘             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A checkout is tied to the cart revision it priced. Any edit that changes
//! the cart drops that checkout, since its amount due no longer matches.
//! Rejected edits and no-ops change nothing, so the checkout stays open.

use tracing::{debug, info};

use crate::cart::CartStore;
use crate::error::{CoreError, CoreResult};
use crate::payment::PaymentReconciler;
use crate::pricing::{price, PricingSnapshot};
use crate::receipt::{ReceiptGenerator, ReceiptNumberProvider, ReceiptSnapshot};
use crate::types::TaxRate;
use crate::validation::validate_tax_rate_bps;

/// One register's cart plus its in-flight payment.
#[derive(Debug)]
pub struct CheckoutSession<P: ReceiptNumberProvider> {
    cart: CartStore,
    tax_rate: TaxRate,
    payment: Option<PaymentReconciler>,
    /// Cart revision the open payment was priced against.
    priced_revision: u64,
    numbers: P,
    cashier: Option<String>,
}

impl<P: ReceiptNumberProvider> CheckoutSession<P> {
    /// Creates a session with an empty cart.
    ///
    /// ## Errors
    /// - `Validation` (`OutOfRange`) if the tax rate is over 100%
    pub fn new(tax_rate: TaxRate, numbers: P) -> CoreResult<Self> {
        validate_tax_rate_bps(tax_rate.bps())?;

        Ok(CheckoutSession {
            cart: CartStore::new(),
            tax_rate,
            payment: None,
            priced_revision: 0,
            numbers,
            cashier: None,
        })
    }

    /// Cashier name printed on every receipt of this session.
    pub fn with_cashier(mut self, cashier: impl Into<String>) -> Self {
        self.cashier = Some(cashier.into());
        self
    }

    #[inline]
    pub fn tax_rate(&self) -> TaxRate {
        self.tax_rate
    }

    #[inline]
    pub fn cart(&self) -> &CartStore {
        &self.cart
    }

    /// Mutable cart access. A successful edit cancels any open checkout.
    pub fn cart_mut(&mut self) -> &mut CartStore {
        &mut self.cart
    }

    /// The open payment, if the cart is unchanged since it was priced.
    fn open_payment(&self) -> Option<&PaymentReconciler> {
        self.payment
            .as_ref()
            .filter(|_| self.priced_revision == self.cart.revision())
    }

    /// Drops the payment if the cart changed after checkout began.
    fn discard_stale_payment(&mut self) {
        if self.payment.is_some() && self.priced_revision != self.cart.revision() {
            self.payment = None;
            debug!("Cart edited during checkout, payment discarded");
        }
    }

    /// Fresh totals for the current cart.
    pub fn pricing(&self) -> PricingSnapshot {
        price(self.cart.cart(), self.tax_rate)
    }

    /// Prices the cart and opens (or reopens) payment.
    pub fn begin_checkout(&mut self) -> &mut PaymentReconciler {
        let pricing = self.pricing();
        debug!(total = %pricing.total, items = self.cart.cart().item_count(), "Checkout started");
        self.priced_revision = self.cart.revision();
        self.payment
            .insert(PaymentReconciler::begin(self.cart.cart(), &pricing))
    }

    #[inline]
    pub fn is_checkout_active(&self) -> bool {
        self.open_payment().is_some()
    }

    pub fn payment(&self) -> CoreResult<&PaymentReconciler> {
        self.open_payment()
            .ok_or_else(|| CoreError::invalid_transition("read the payment", "not started"))
    }

    pub fn payment_mut(&mut self) -> CoreResult<&mut PaymentReconciler> {
        self.discard_stale_payment();
        self.payment
            .as_mut()
            .ok_or_else(|| CoreError::invalid_transition("change the payment", "not started"))
    }

    /// Closes the open checkout. The cart is untouched.
    /// Returns false if no checkout was open.
    pub fn cancel_checkout(&mut self) -> bool {
        self.discard_stale_payment();
        let was_active = self.payment.take().is_some();
        if was_active {
            debug!("Checkout cancelled");
        }
        was_active
    }

    /// Takes the payment, issues the receipt, and clears the cart.
    ///
    /// ## Errors
    /// - `InvalidStateTransition` if no checkout is open
    /// - `IncompletePayment` if the payment cannot complete yet; the cart
    ///   and the open checkout are left as they were
    pub fn complete_checkout(&mut self, note: Option<String>) -> CoreResult<ReceiptSnapshot> {
        self.discard_stale_payment();
        let payment = self
            .payment
            .as_mut()
            .ok_or_else(|| CoreError::invalid_transition("complete checkout", "not started"))?;

        let paid = payment.complete()?;
        let pricing = price(self.cart.cart(), self.tax_rate);

        let mut generator = ReceiptGenerator::new();
        if let Some(cashier) = &self.cashier {
            generator = generator.with_cashier(cashier.clone());
        }
        if let Some(note) = note {
            generator = generator.with_note(note);
        }
        let receipt = generator.generate(self.cart.cart(), &pricing, &paid, &mut self.numbers)?;

        self.payment = None;
        self.cart.clear();
        info!(
            receipt_number = %receipt.receipt_number(),
            total = %receipt.pricing().total,
            method = %paid.method,
            "Sale completed"
        );
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::payment::{PaymentStage, TenderStatus};
    use crate::receipt::DailySequence;
    use crate::types::{PaymentMethod, Product};
    use std::sync::{Arc, Mutex};

    fn session() -> CheckoutSession<DailySequence> {
        CheckoutSession::new(TaxRate::from_bps(800), DailySequence::new("pos-01"))
            .unwrap()
            .with_cashier("Jordan")
    }

    fn widget() -> Product {
        Product::new("w-1", "Widget", 1000)
    }

    #[test]
    fn test_cash_sale_end_to_end() {
        let mut session = session();
        let cleared = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&cleared);
        session
            .cart_mut()
            .subscribe(move |cart| sink.lock().unwrap().push(cart.is_empty()));

        session.cart_mut().add_item(&widget(), 2).unwrap();
        session.cart_mut().apply_discount(10).unwrap();
        assert_eq!(session.pricing().total.cents(), 1944);

        let payment = session.begin_checkout();
        payment.select_method(PaymentMethod::Cash).unwrap();
        let status = payment
            .set_amount_tendered(Money::from_cents(1900))
            .unwrap();
        assert_eq!(
            status,
            TenderStatus::Insufficient {
                shortfall: Money::from_cents(44)
            }
        );
        assert!(matches!(
            session.complete_checkout(None),
            Err(CoreError::IncompletePayment { .. })
        ));
        // Still open, cart untouched
        assert!(session.is_checkout_active());
        assert_eq!(session.cart().cart().total_quantity(), 2);

        session
            .payment_mut()
            .unwrap()
            .set_amount_tendered(Money::from_cents(2000))
            .unwrap();
        let receipt = session
            .complete_checkout(Some("Thank you".to_string()))
            .unwrap();

        assert_eq!(receipt.payment().change.cents(), 56);
        assert_eq!(receipt.cashier(), Some("Jordan"));
        assert_eq!(receipt.note(), Some("Thank you"));
        assert_eq!(receipt.line_items()[0].quantity, 2);
        assert!(session.cart().is_empty());
        assert!(!session.is_checkout_active());
        // add, discount, clear
        assert_eq!(*cleared.lock().unwrap(), vec![false, false, true]);
    }

    #[test]
    fn test_card_sale_and_sequence() {
        let mut session = session();

        for expected in ["-01-0001", "-01-0002"] {
            session.cart_mut().add_one(&widget()).unwrap();
            let state = session
                .begin_checkout()
                .select_method(PaymentMethod::Card)
                .unwrap();
            assert_eq!(state.amount_tendered.cents(), 1080);
            let receipt = session.complete_checkout(None).unwrap();
            assert!(receipt.receipt_number().ends_with(expected));
        }
    }

    #[test]
    fn test_editing_cart_cancels_checkout() {
        let mut session = session();
        session.cart_mut().add_one(&widget()).unwrap();
        session.begin_checkout();
        assert!(session.is_checkout_active());

        session.cart_mut().add_one(&widget()).unwrap();
        assert!(!session.is_checkout_active());
        assert!(matches!(
            session.payment(),
            Err(CoreError::InvalidStateTransition { .. })
        ));

        // New checkout sees the new total
        assert_eq!(session.begin_checkout().amount_due().cents(), 2160);
    }

    #[test]
    fn test_rejected_or_noop_edit_keeps_checkout() {
        let mut session = session();
        session.cart_mut().add_one(&widget()).unwrap();
        session
            .begin_checkout()
            .select_method(PaymentMethod::Cash)
            .unwrap();
        session
            .payment_mut()
            .unwrap()
            .set_amount_tendered(Money::from_cents(100))
            .unwrap();

        assert!(session.cart_mut().add_item(&widget(), 1000).is_err());
        assert!(session.cart_mut().apply_discount(150).is_err());
        assert!(session
            .cart_mut()
            .add_one(&Product::new("gold", "Gold bar", i64::MAX))
            .is_err());
        assert!(!session.cart_mut().remove_item("absent"));
        session.cart_mut().update_quantity("absent", 5).unwrap();
        session.cart_mut().update_quantity("absent", 0).unwrap();

        assert!(session.is_checkout_active());
        let payment = session.payment().unwrap();
        assert_eq!(payment.stage(), PaymentStage::AmountEntry);
        assert_eq!(payment.amount_due().cents(), 1080);

        session
            .payment_mut()
            .unwrap()
            .set_amount_tendered(Money::from_cents(2000))
            .unwrap();
        let receipt = session.complete_checkout(None).unwrap();
        assert_eq!(receipt.payment().change.cents(), 920);
    }

    #[test]
    fn test_stale_checkout_cannot_complete() {
        let mut session = session();
        session.cart_mut().add_one(&widget()).unwrap();
        session
            .begin_checkout()
            .select_method(PaymentMethod::Card)
            .unwrap();

        session.cart_mut().add_one(&widget()).unwrap();
        assert!(matches!(
            session.complete_checkout(None),
            Err(CoreError::InvalidStateTransition { .. })
        ));
        assert!(session.payment_mut().is_err());
        assert!(!session.cancel_checkout());
        assert_eq!(session.cart().cart().total_quantity(), 2);
    }

    #[test]
    fn test_new_rejects_tax_rate_over_100_percent() {
        assert!(matches!(
            CheckoutSession::new(TaxRate::from_bps(10_001), DailySequence::new("pos-01")),
            Err(CoreError::Validation(_))
        ));
        assert!(matches!(
            CheckoutSession::new(TaxRate::from_bps(u32::MAX), DailySequence::new("pos-01")),
            Err(CoreError::Validation(_))
        ));
        let session =
            CheckoutSession::new(TaxRate::from_bps(10_000), DailySequence::new("pos-01")).unwrap();
        assert_eq!(session.tax_rate().bps(), 10_000);
    }

    #[test]
    fn test_cancel_checkout_keeps_cart() {
        let mut session = session();
        session.cart_mut().add_one(&widget()).unwrap();
        session
            .begin_checkout()
            .select_method(PaymentMethod::Cash)
            .unwrap();

        assert!(session.cancel_checkout());
        assert!(!session.cancel_checkout());
        assert_eq!(session.cart().cart().item_count(), 1);
    }

    #[test]
    fn test_complete_without_checkout() {
        let mut session = session();
        session.cart_mut().add_one(&widget()).unwrap();
        assert!(matches!(
            session.complete_checkout(None),
            Err(CoreError::InvalidStateTransition { .. })
        ));
    }

    #[test]
    fn test_empty_cart_checkout_cannot_complete() {
        let mut session = session();
        let payment = session.begin_checkout();
        payment.select_method(PaymentMethod::Mobile).unwrap();
        assert!(!payment.can_complete());

        assert!(matches!(
            session.complete_checkout(None),
            Err(CoreError::IncompletePayment { .. })
        ));
        assert_eq!(
            session.payment().unwrap().stage(),
            PaymentStage::Validated
        );
    }
}
