//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely, plus the
//! one and only place that turns an amount into display text.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌                                  │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units                                      │
//! │    Every amount is an i64 count of cents (or yen, or pence).           │
//! │    Percentages are basis points (825 = 8.25%).                          │
//! │    Rounding happens ONCE, when a derived value is produced.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use till_core::money::{Currency, Locale, Money};
//!
//! let price = Money::from_cents(1099);
//! let line = price.multiply_quantity(3);
//! assert_eq!(line.cents(), 3297);
//!
//! assert_eq!(line.format(Locale::EnUs, Currency::Usd), "$32.97");
//! assert_eq!(line.format(Locale::DeDe, Currency::Eur), "32,97 €");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::TaxRate;

/// 100% expressed in basis points.
pub const BPS_SCALE: i64 = 10_000;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit.
///
/// ## Design Decisions
/// - **i64 (signed)**: intermediate values may go negative (a discount
///   larger than a subtotal); user-facing totals are clamped at zero.
/// - **Single field tuple struct**: zero-cost abstraction over i64.
/// - **No currency inside**: a register works in one currency, chosen by
///   config and passed to [`Money::format`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units. Unchecked; use
    /// [`Money::non_negative`] at boundaries where negatives are invalid.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value that must not be negative.
    ///
    /// `field` names the value in the error (e.g. "tendered amount").
    ///
    /// ## Example
    /// ```rust
    /// use till_core::money::Money;
    ///
    /// assert!(Money::non_negative(0, "price").is_ok());
    /// assert!(Money::non_negative(-1, "price").is_err());
    /// ```
    pub fn non_negative(cents: i64, field: &str) -> CoreResult<Self> {
        if cents < 0 {
            return Err(CoreError::invalid_amount(field, Money(cents)));
        }
        Ok(Money(cents))
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Clamps negative values to zero.
    #[inline]
    pub const fn clamp_non_negative(&self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            *self
        }
    }

    /// Multiplies money by a quantity. Exact, no rounding.
    ///
    /// ## Example
    /// ```rust
    /// use till_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299);
    /// assert_eq!(unit_price.multiply_quantity(3).cents(), 897);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Returns `bps` basis points of this amount, rounded half-up
    /// (half away from zero) to the nearest minor unit.
    ///
    /// ## Implementation
    /// `(amount * bps ± 5000) / 10000` in i128, so large carts cannot
    /// overflow before the division.
    pub fn percent_of_bps(&self, bps: u32) -> Money {
        let product = self.0 as i128 * bps as i128;
        let half = (BPS_SCALE / 2) as i128;
        let rounded = if product >= 0 {
            (product + half) / BPS_SCALE as i128
        } else {
            (product - half) / BPS_SCALE as i128
        };
        Money(rounded as i64)
    }

    /// Returns `percent`% of this amount (whole percent, 0..=100).
    ///
    /// ## Example
    /// ```rust
    /// use till_core::money::Money;
    ///
    /// let subtotal = Money::from_cents(2000);
    /// assert_eq!(subtotal.percent_of(10).cents(), 200);
    /// ```
    #[inline]
    pub fn percent_of(&self, percent: u8) -> Money {
        self.percent_of_bps(u32::from(percent) * 100)
    }

    /// Calculates tax on this amount at a flat rate.
    ///
    /// ```rust
    /// use till_core::money::Money;
    /// use till_core::types::TaxRate;
    ///
    /// // $10.00 × 8.25% = $0.825 → rounds half-up to $0.83
    /// let tax = Money::from_cents(1000).calculate_tax(TaxRate::from_bps(825));
    /// assert_eq!(tax.cents(), 83);
    /// ```
    #[inline]
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        self.percent_of_bps(rate.bps())
    }

    /// Formats the amount for display.
    ///
    /// This is the single source of truth for money text: receipts, the
    /// cart panel and log lines all go through here.
    ///
    /// ```text
    ///   123456 minor units
    ///     en-US + USD  →  $1,234.56
    ///     en-GB + GBP  →  £1,234.56
    ///     de-DE + EUR  →  1.234,56 €
    ///     fr-FR + EUR  →  1 234,56 €
    ///     en-US + JPY  →  ¥123,456      (JPY has no minor unit)
    /// ```
    pub fn format(&self, locale: Locale, currency: Currency) -> String {
        let exponent = currency.exponent();
        let divisor = 10u64.pow(exponent);
        let abs = self.0.unsigned_abs();
        let major = abs / divisor;
        let minor = abs % divisor;

        let mut number = group_digits(major, locale.group_separator());
        if exponent > 0 {
            number.push(locale.decimal_separator());
            number.push_str(&format!("{:0width$}", minor, width = exponent as usize));
        }

        let sign = if self.0 < 0 { "-" } else { "" };
        if locale.symbol_after() {
            format!("{}{} {}", sign, number, currency.symbol())
        } else {
            format!("{}{}{}", sign, currency.symbol(), number)
        }
    }
}

fn group_digits(value: u64, separator: char) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(separator);
        }
        out.push(ch);
    }
    out
}

// =============================================================================
// Currency & Locale
// =============================================================================

/// Supported currencies (ISO 4217).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum Currency {
    #[default]
    #[serde(rename = "USD")]
    Usd,
    #[serde(rename = "EUR")]
    Eur,
    #[serde(rename = "GBP")]
    Gbp,
    #[serde(rename = "JPY")]
    Jpy,
}

impl Currency {
    /// ISO 4217 code.
    pub const fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Jpy => "JPY",
        }
    }

    pub const fn symbol(&self) -> &'static str {
        match self {
            Currency::Usd => "$",
            Currency::Eur => "€",
            Currency::Gbp => "£",
            Currency::Jpy => "¥",
        }
    }

    /// Number of minor-unit digits (2 for cents, 0 for yen).
    pub const fn exponent(&self) -> u32 {
        match self {
            Currency::Jpy => 0,
            _ => 2,
        }
    }
}

impl FromStr for Currency {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            "GBP" => Ok(Currency::Gbp),
            "JPY" => Ok(Currency::Jpy),
            _ => Err(ValidationError::NotAllowed {
                field: "currency".to_string(),
                allowed: vec!["USD".into(), "EUR".into(), "GBP".into(), "JPY".into()],
            }),
        }
    }
}

/// Display conventions for amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum Locale {
    #[default]
    #[serde(rename = "en-US")]
    EnUs,
    #[serde(rename = "en-GB")]
    EnGb,
    #[serde(rename = "de-DE")]
    DeDe,
    #[serde(rename = "fr-FR")]
    FrFr,
}

impl Locale {
    pub const fn tag(&self) -> &'static str {
        match self {
            Locale::EnUs => "en-US",
            Locale::EnGb => "en-GB",
            Locale::DeDe => "de-DE",
            Locale::FrFr => "fr-FR",
        }
    }

    const fn group_separator(&self) -> char {
        match self {
            Locale::EnUs | Locale::EnGb => ',',
            Locale::DeDe => '.',
            Locale::FrFr => ' ',
        }
    }

    const fn decimal_separator(&self) -> char {
        match self {
            Locale::EnUs | Locale::EnGb => '.',
            Locale::DeDe | Locale::FrFr => ',',
        }
    }

    const fn symbol_after(&self) -> bool {
        matches!(self, Locale::DeDe | Locale::FrFr)
    }
}

impl FromStr for Locale {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().replace('_', "-").to_lowercase().as_str() {
            "en-us" => Ok(Locale::EnUs),
            "en-gb" => Ok(Locale::EnGb),
            "de-de" => Ok(Locale::DeDe),
            "fr-fr" => Ok(Locale::FrFr),
            _ => Err(ValidationError::NotAllowed {
                field: "locale".to_string(),
                allowed: vec![
                    "en-US".into(),
                    "en-GB".into(),
                    "de-DE".into(),
                    "fr-FR".into(),
                ],
            }),
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shorthand for `format(Locale::EnUs, Currency::Usd)`, used in logs and
/// error messages.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format(Locale::EnUs, Currency::Usd))
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_negative() {
        assert_eq!(Money::non_negative(1099, "price").unwrap().cents(), 1099);
        assert_eq!(Money::non_negative(0, "price").unwrap(), Money::zero());

        let err = Money::non_negative(-1, "tendered amount").unwrap_err();
        assert!(matches!(err, CoreError::InvalidAmount { .. }));
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "$10.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "$5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-$5.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "$0.00");
        assert_eq!(format!("{}", Money::from_cents(7)), "$0.07");
    }

    #[test]
    fn test_format_locales() {
        let amount = Money::from_cents(123456);
        assert_eq!(amount.format(Locale::EnUs, Currency::Usd), "$1,234.56");
        assert_eq!(amount.format(Locale::EnGb, Currency::Gbp), "£1,234.56");
        assert_eq!(amount.format(Locale::DeDe, Currency::Eur), "1.234,56 €");
        assert_eq!(amount.format(Locale::FrFr, Currency::Eur), "1 234,56 €");
        assert_eq!(
            Money::from_cents(-123456).format(Locale::DeDe, Currency::Eur),
            "-1.234,56 €"
        );
    }

    #[test]
    fn test_format_zero_exponent_currency() {
        let yen = Money::from_cents(1500);
        assert_eq!(yen.format(Locale::EnUs, Currency::Jpy), "¥1,500");
        assert_eq!(Money::from_cents(1234567).format(Locale::EnUs, Currency::Usd), "$12,345.67");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);

        let total: Money = vec![a, b, b].into_iter().sum();
        assert_eq!(total.cents(), 2000);
    }

    #[test]
    fn test_tax_calculation_with_rounding() {
        // $10.00 at 8.25% = $0.825 → $0.83
        let tax = Money::from_cents(1000).calculate_tax(TaxRate::from_bps(825));
        assert_eq!(tax.cents(), 83);

        // $10.99 at 8.25% = $0.906675 → $0.91
        let tax = Money::from_cents(1099).calculate_tax(TaxRate::from_bps(825));
        assert_eq!(tax.cents(), 91);
    }

    #[test]
    fn test_percent_of_rounds_half_up() {
        // 50 × 1% = 0.5 → 1
        assert_eq!(Money::from_cents(50).percent_of(1).cents(), 1);
        // 49 × 1% = 0.49 → 0
        assert_eq!(Money::from_cents(49).percent_of(1).cents(), 0);
        // Symmetric for negatives: -0.5 → -1
        assert_eq!(Money::from_cents(-50).percent_of(1).cents(), -1);
        assert_eq!(Money::from_cents(2000).percent_of(100).cents(), 2000);
        assert_eq!(Money::from_cents(2000).percent_of(0).cents(), 0);
    }

    #[test]
    fn test_rounding_applied_once_not_per_line() {
        // Three lines of 5 cents at 10%: per-line rounding would give
        // 1 + 1 + 1 = 3, rounding the 15-cent subtotal gives 2.
        let lines = [Money::from_cents(5); 3];
        let per_line: i64 = lines.iter().map(|m| m.percent_of(10).cents()).sum();
        let subtotal: Money = lines.iter().copied().sum();
        assert_eq!(per_line, 3);
        assert_eq!(subtotal.percent_of(10).cents(), 2);
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        let negative = Money::from_cents(-100);
        assert!(negative.is_negative());
        assert_eq!(negative.clamp_non_negative(), Money::zero());
        assert_eq!(Money::from_cents(5).clamp_non_negative().cents(), 5);
    }

    #[test]
    fn test_parse_codes() {
        assert_eq!("usd".parse::<Currency>().unwrap(), Currency::Usd);
        assert_eq!("JPY".parse::<Currency>().unwrap(), Currency::Jpy);
        assert!("XYZ".parse::<Currency>().is_err());

        assert_eq!("de_DE".parse::<Locale>().unwrap(), Locale::DeDe);
        assert_eq!("en-gb".parse::<Locale>().unwrap(), Locale::EnGb);
        assert!("pt-BR".parse::<Locale>().is_err());
    }
}
