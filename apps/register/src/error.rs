//! # Register Error Type
//!
//! Unified error type for register commands and startup.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Register                           │
//! │                                                                         │
//! │  stdin line ──► Command::parse ── bad syntax ──► AppError::Parse ──┐    │
//! │                      │                                             │    │
//! │                      ▼                                             │    │
//! │               Register::execute ── CoreError ──► AppError::Core ───┤    │
//! │                      │                                             │    │
//! │                      ▼                                             ▼    │
//! │                 reply printed                  "error [CODE]: message"  │
//! │                                                 loop continues          │
//! │                                                                         │
//! │  Startup (config load) errors end the process with exit code 1.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;
use till_core::{CoreError, ValidationError};

/// Errors surfaced by the register.
#[derive(Debug, Error)]
pub enum AppError {
    /// Rejected by the checkout engine
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Config values that fail validation
    #[error("Invalid configuration: {0}")]
    Config(#[from] ValidationError),

    /// Config file is not valid TOML for `RegisterConfig`
    #[error("Config file error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Reading the config file or stdin failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Receipt JSON export failed
    #[error("Receipt export failed: {0}")]
    Export(#[from] serde_json::Error),

    /// Product id not in the configured catalog
    #[error("Product not found: {0}")]
    UnknownProduct(String),

    /// Command line could not be understood
    #[error("{0}")]
    Parse(String),
}

impl AppError {
    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        AppError::Parse(message.into())
    }

    /// Machine-readable code printed next to the message.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Core(err) => match err {
                CoreError::InvalidAmount { .. } | CoreError::Validation(_) => "VALIDATION_ERROR",
                CoreError::InvalidDiscount { .. } => "VALIDATION_ERROR",
                CoreError::CartTooLarge { .. } | CoreError::QuantityTooLarge { .. } => "CART_ERROR",
                CoreError::IncompletePayment { .. } => "PAYMENT_ERROR",
                CoreError::InvalidStateTransition { .. } => "BUSINESS_LOGIC",
                CoreError::EmptyCartReceipt => "CART_ERROR",
            },
            AppError::Config(_) | AppError::ConfigParse(_) => "CONFIG_ERROR",
            AppError::UnknownProduct(_) => "NOT_FOUND",
            AppError::Parse(_) => "BAD_COMMAND",
            AppError::Io(_) | AppError::Export(_) => "INTERNAL",
        }
    }
}

/// Result type for register operations.
pub type AppResult<T> = Result<T, AppError>;
