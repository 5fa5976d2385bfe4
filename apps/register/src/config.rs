//! # Register Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     TILL_TAX_RATE_BPS=825   TILL_CURRENCY=EUR   TILL_LOCALE=de-DE      │
//! │     TILL_DEVICE_ID=pos-02   TILL_CASHIER=Sam                           │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     --config <path>, else TILL_CONFIG, else                            │
//! │     ~/.config/till/register.toml (Linux)                               │
//! │     ~/Library/Application Support/com.till.register/register.toml      │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     USD, en-US, 0% tax, device "pos-01", empty catalog                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [store]
//! name = "Corner Shop"
//! currency = "USD"
//! locale = "en-US"
//! tax_rate_bps = 825
//!
//! [device]
//! id = "pos-01"
//! cashier = "Sam"
//!
//! [[catalog]]
//! id = "coffee"
//! name = "Coffee"
//! price_cents = 350
//! category = "drinks"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use till_core::validation::{validate_product_id, validate_tax_rate_bps};
use till_core::{Currency, Locale, Product, TaxRate, ValidationError, MAX_PRICE_CENTS};

use crate::error::AppResult;

// =============================================================================
// Store Configuration
// =============================================================================

/// Store-wide settings printed on receipts and used for pricing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store name shown in the receipt header.
    #[serde(default = "default_store_name")]
    pub name: String,

    #[serde(default)]
    pub currency: Currency,

    #[serde(default)]
    pub locale: Locale,

    /// Sales tax in basis points (825 = 8.25%).
    #[serde(default)]
    pub tax_rate_bps: u32,
}

fn default_store_name() -> String {
    "Till".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            name: default_store_name(),
            currency: Currency::default(),
            locale: Locale::default(),
            tax_rate_bps: 0,
        }
    }
}

// =============================================================================
// Device Configuration
// =============================================================================

/// Settings for this register.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// The last two characters become the device code in receipt numbers.
    #[serde(default = "default_device_id")]
    pub id: String,

    /// Cashier printed on receipts.
    #[serde(default)]
    pub cashier: Option<String>,
}

fn default_device_id() -> String {
    "pos-01".to_string()
}

impl Default for DeviceConfig {
    fn default() -> Self {
        DeviceConfig {
            id: default_device_id(),
            cashier: None,
        }
    }
}

// =============================================================================
// Register Configuration
// =============================================================================

/// Complete register configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterConfig {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub device: DeviceConfig,

    /// Products the cashier can ring up.
    #[serde(default)]
    pub catalog: Vec<Product>,
}

impl RegisterConfig {
    /// Loads configuration from file and environment.
    ///
    /// A missing file is not an error; defaults are used.
    pub fn load(config_path: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading register config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = Self::from_toml(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Parses a TOML document. No env overrides, no validation.
    pub fn from_toml(contents: &str) -> AppResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> AppResult<()> {
        validate_tax_rate_bps(self.store.tax_rate_bps)?;

        if self.device.id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "device.id".to_string(),
            }
            .into());
        }

        let mut seen = HashSet::new();
        for product in &self.catalog {
            validate_product_id(&product.id)?;
            if product.price_cents < 0 {
                return Err(ValidationError::MustBePositive {
                    field: format!("catalog[{}].price_cents", product.id),
                }
                .into());
            }
            if product.price_cents > MAX_PRICE_CENTS {
                return Err(ValidationError::OutOfRange {
                    field: format!("catalog[{}].price_cents", product.id),
                    min: 0,
                    max: MAX_PRICE_CENTS,
                }
                .into());
            }
            if !seen.insert(product.id.as_str()) {
                return Err(ValidationError::NotAllowed {
                    field: format!("catalog[{}] (duplicate id)", product.id),
                    allowed: Vec::new(),
                }
                .into());
            }
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(bps) = std::env::var("TILL_TAX_RATE_BPS") {
            match bps.parse::<u32>() {
                Ok(bps) => {
                    debug!(tax_rate_bps = bps, "Overriding tax rate from environment");
                    self.store.tax_rate_bps = bps;
                }
                Err(_) => warn!(value = %bps, "Ignoring non-numeric TILL_TAX_RATE_BPS"),
            }
        }

        if let Ok(currency) = std::env::var("TILL_CURRENCY") {
            match currency.parse() {
                Ok(parsed) => self.store.currency = parsed,
                Err(e) => warn!(value = %currency, "Ignoring TILL_CURRENCY: {}", e),
            }
        }

        if let Ok(locale) = std::env::var("TILL_LOCALE") {
            match locale.parse() {
                Ok(parsed) => self.store.locale = parsed,
                Err(e) => warn!(value = %locale, "Ignoring TILL_LOCALE: {}", e),
            }
        }

        if let Ok(id) = std::env::var("TILL_DEVICE_ID") {
            debug!(device_id = %id, "Overriding device ID from environment");
            self.device.id = id;
        }

        if let Ok(cashier) = std::env::var("TILL_CASHIER") {
            self.device.cashier = Some(cashier);
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("TILL_CONFIG") {
            return Some(PathBuf::from(path));
        }
        directories::ProjectDirs::from("com", "till", "register")
            .map(|dirs| dirs.config_dir().join("register.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.store.tax_rate_bps)
    }

    /// Looks a product up by id.
    pub fn product(&self, id: &str) -> Option<&Product> {
        self.catalog.iter().find(|p| p.id == id)
    }
}
