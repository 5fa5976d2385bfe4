//! # Payment Reconciler
//!
//! Tracks the tender for one checkout: which method, how much was handed
//! over, whether it covers the total, and the change owed.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   ┌─────────────────┐  select(Cash)   ┌──────────────┐                  │
//! │   │ MethodSelection │ ──────────────► │ AmountEntry  │ ◄──┐             │
//! │   └─────────────────┘                 └──────┬───────┘    │ tendered    │
//! │        │      ▲                              │ tendered    │ < due       │
//! │        │      │ cancel()                     │ >= due      │             │
//! │        │      │ (any non-terminal)           ▼             │             │
//! │        │      │                       ┌──────────────┐    │             │
//! │        └──────┼─────────────────────► │  Validated   │ ───┘             │
//! │  select(Card, │ Contactless, Mobile)  └──────┬───────┘                  │
//! │               │                              │ complete()               │
//! │               │                              ▼                          │
//! │               │                       ┌──────────────┐                  │
//! │               └────── ✗ ──────────────│  Completed   │  (terminal)      │
//! │                                       └──────────────┘                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Short cash is NOT an error. `set_amount_tendered` returns
//! [`TenderStatus::Insufficient`] and the register keeps prompting.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};
use ts_rs::TS;

use crate::cart::Cart;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::pricing::PricingSnapshot;
use crate::types::PaymentMethod;

// =============================================================================
// Stage
// =============================================================================

/// Where the checkout is in the payment flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStage {
    /// Waiting for the cashier to pick a method.
    MethodSelection,
    /// Cash chosen, tendered amount does not cover the total yet.
    AmountEntry,
    /// Ready to complete.
    Validated,
    /// Payment taken. Nothing else is allowed.
    Completed,
}

impl fmt::Display for PaymentStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentStage::MethodSelection => write!(f, "method_selection"),
            PaymentStage::AmountEntry => write!(f, "amount_entry"),
            PaymentStage::Validated => write!(f, "validated"),
            PaymentStage::Completed => write!(f, "completed"),
        }
    }
}

// =============================================================================
// Payment State
// =============================================================================

/// The tender for the current checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentState {
    pub method: PaymentMethod,
    pub amount_due: Money,
    pub amount_tendered: Money,
    /// Never negative. Only cash can produce change.
    pub change: Money,
    pub is_valid: bool,
}

impl PaymentState {
    fn new(method: PaymentMethod, amount_due: Money) -> Self {
        if method.is_cash() {
            PaymentState {
                method,
                amount_due,
                amount_tendered: Money::zero(),
                change: Money::zero(),
                is_valid: amount_due.is_zero(),
            }
        } else {
            // Non-cash terminals charge exactly the amount due
            PaymentState {
                method,
                amount_due,
                amount_tendered: amount_due,
                change: Money::zero(),
                is_valid: true,
            }
        }
    }

    fn tender(&mut self, amount: Money) {
        self.amount_tendered = amount;
        self.is_valid = amount >= self.amount_due;
        self.change = (amount - self.amount_due).clamp_non_negative();
    }

    /// How much more cash is needed. Zero once the tender covers the total.
    pub fn shortfall(&self) -> Money {
        (self.amount_due - self.amount_tendered).clamp_non_negative()
    }

    pub fn tender_status(&self) -> TenderStatus {
        if self.is_valid {
            TenderStatus::Sufficient {
                change: self.change,
            }
        } else {
            TenderStatus::Insufficient {
                shortfall: self.shortfall(),
            }
        }
    }
}

/// Outcome of entering a cash amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TenderStatus {
    Sufficient { change: Money },
    /// Expected, recoverable: the customer has to hand over more.
    Insufficient { shortfall: Money },
}

// =============================================================================
// Reconciler
// =============================================================================

/// Payment state machine for one checkout.
///
/// The amount due is captured when the reconciler is created. If the cart
/// changes afterwards, start a new one.
#[derive(Debug, Clone)]
pub struct PaymentReconciler {
    stage: PaymentStage,
    amount_due: Money,
    has_items: bool,
    state: Option<PaymentState>,
}

impl PaymentReconciler {
    /// Starts payment for a priced cart.
    pub fn begin(cart: &Cart, pricing: &PricingSnapshot) -> Self {
        PaymentReconciler::new(pricing.total, !cart.is_empty())
    }

    /// Starts payment for an amount due.
    ///
    /// `has_items` gates [`can_complete`](Self::can_complete): an empty
    /// order can never be paid.
    pub fn new(amount_due: Money, has_items: bool) -> Self {
        debug!(amount_due = %amount_due, has_items, "Payment started");
        PaymentReconciler {
            stage: PaymentStage::MethodSelection,
            amount_due: amount_due.clamp_non_negative(),
            has_items,
            state: None,
        }
    }

    #[inline]
    pub fn stage(&self) -> PaymentStage {
        self.stage
    }

    #[inline]
    pub fn amount_due(&self) -> Money {
        self.amount_due
    }

    /// Current tender, `None` until a method is selected.
    #[inline]
    pub fn state(&self) -> Option<&PaymentState> {
        self.state.as_ref()
    }

    /// Chooses (or switches) the payment method.
    ///
    /// ## Behavior
    /// - Cash: `AmountEntry`, tendered reset to zero
    /// - Anything else: tendered = due, immediately `Validated`
    pub fn select_method(&mut self, method: PaymentMethod) -> CoreResult<PaymentState> {
        self.ensure_open("select a payment method")?;

        let state = PaymentState::new(method, self.amount_due);
        // A zero-total cash sale is valid with nothing tendered
        self.stage = if state.is_valid {
            PaymentStage::Validated
        } else {
            PaymentStage::AmountEntry
        };
        self.state = Some(state);
        debug!(method = %method, stage = %self.stage, "Payment method selected");

        Ok(state)
    }

    /// Records the cash the customer handed over.
    ///
    /// ## Errors
    /// - `InvalidStateTransition` unless the selected method is cash
    /// - `InvalidAmount` for a negative amount
    pub fn set_amount_tendered(&mut self, amount: Money) -> CoreResult<TenderStatus> {
        self.ensure_open("enter a cash amount")?;

        let state = match self.state.as_mut() {
            Some(state) if state.method.is_cash() => state,
            _ => {
                warn!(stage = %self.stage, "Cash amount entered without cash payment");
                return Err(CoreError::invalid_transition(
                    "enter a cash amount",
                    self.stage,
                ));
            }
        };

        if amount.is_negative() {
            return Err(CoreError::invalid_amount("tendered amount", amount));
        }

        state.tender(amount);
        let status = state.tender_status();
        self.stage = if state.is_valid {
            PaymentStage::Validated
        } else {
            PaymentStage::AmountEntry
        };
        debug!(tendered = %amount, due = %self.amount_due, ?status, "Cash tendered");

        Ok(status)
    }

    /// True iff the order has items, a method is selected, and the tender
    /// covers the total (always the case for non-cash).
    pub fn can_complete(&self) -> bool {
        if !self.has_items || self.stage == PaymentStage::Completed {
            return false;
        }
        match &self.state {
            Some(state) => !state.method.is_cash() || state.is_valid,
            None => false,
        }
    }

    /// Takes the payment and returns the frozen tender.
    pub fn complete(&mut self) -> CoreResult<PaymentState> {
        if !self.can_complete() {
            let reason = self.incomplete_reason();
            warn!(stage = %self.stage, %reason, "Payment completion refused");
            return Err(CoreError::IncompletePayment { reason });
        }

        self.stage = PaymentStage::Completed;
        let state = self
            .state
            .ok_or_else(|| CoreError::IncompletePayment {
                reason: "no payment method selected".to_string(),
            })?;
        info!(
            method = %state.method,
            due = %state.amount_due,
            tendered = %state.amount_tendered,
            change = %state.change,
            "Payment completed"
        );
        Ok(state)
    }

    /// Discards the tender and goes back to method selection.
    pub fn cancel(&mut self) -> CoreResult<()> {
        self.ensure_open("cancel the payment")?;
        self.state = None;
        self.stage = PaymentStage::MethodSelection;
        debug!("Payment cancelled");
        Ok(())
    }

    fn ensure_open(&self, operation: &str) -> CoreResult<()> {
        if self.stage == PaymentStage::Completed {
            return Err(CoreError::invalid_transition(operation, self.stage));
        }
        Ok(())
    }

    fn incomplete_reason(&self) -> String {
        if self.stage == PaymentStage::Completed {
            return "payment already completed".to_string();
        }
        if !self.has_items {
            return "cart is empty".to_string();
        }
        match &self.state {
            None => "no payment method selected".to_string(),
            Some(state) => format!("{} short", state.shortfall()),
        }
    }
}
