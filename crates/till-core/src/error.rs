//! # Error Types
//!
//! Domain-specific error types for till-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  till-core errors (this file)                                          │
//! │  ├── CoreError        - Structural checkout violations (fail fast)     │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  register app errors (apps/register)                                   │
//! │  └── AppError         - Config, I/O, command parsing                   │
//! │                                                                         │
//! │  NOT an error: insufficient cash. That is TenderStatus::Insufficient,  │
//! │  because the register must keep prompting for more money.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Checkout engine errors.
///
/// Every variant is a programmer or operator mistake the caller must see
/// immediately. None of them is silently corrected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A negative amount where the context requires zero or more
    /// (product price, tendered cash).
    #[error("Invalid amount for {field}: {amount} (must not be negative)")]
    InvalidAmount { field: String, amount: Money },

    /// Discount percent outside 0..=100.
    #[error("Invalid discount: {percent}% (must be between 0 and 100)")]
    InvalidDiscount { percent: i64 },

    /// Operation not allowed in the current payment stage.
    ///
    /// ## When This Occurs
    /// - Entering a cash amount after choosing Card
    /// - Cancelling or re-selecting after the payment completed
    /// - Asking the session for a payment when no checkout is active
    #[error("Cannot {operation} while payment is {stage}")]
    InvalidStateTransition { operation: String, stage: String },

    /// `complete()` called before the payment can complete.
    #[error("Payment incomplete: {reason}")]
    IncompletePayment { reason: String },

    /// A receipt was requested for a cart with no items.
    #[error("Cannot generate a receipt for an empty cart")]
    EmptyCartReceipt,

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Item quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    pub(crate) fn invalid_amount(field: &str, amount: Money) -> Self {
        CoreError::InvalidAmount {
            field: field.to_string(),
            amount,
        }
    }

    pub(crate) fn invalid_transition(operation: &str, stage: impl ToString) -> Self {
        CoreError::InvalidStateTransition {
            operation: operation.to_string(),
            stage: stage.to_string(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
