//! # Text Rendering
//!
//! Turns carts and receipts into fixed-width text for the terminal or a
//! receipt printer. Every amount goes through `Money::format`.
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │              Corner Shop                 │
//! │  Receipt 20261019-01-0001                │
//! │  2026-10-19 14:03          Cashier: Sam  │
//! │  ────────────────────────────────────    │
//! │  Coffee x2                      $7.00    │
//! │  Subtotal                       $7.00    │
//! │  Tax (8.25%)                    $0.58    │
//! │  TOTAL                          $7.58    │
//! │  Cash                          $10.00    │
//! │  Change                         $2.42    │
//! └──────────────────────────────────────────┘
//! ```

use chrono::Local;
use std::fmt::Write;

use till_core::{Cart, Currency, Locale, Money, PricingSnapshot, ReceiptSnapshot};

const WIDTH: usize = 40;

/// Locale, currency and header text used for every rendering.
#[derive(Debug, Clone)]
pub struct Layout {
    pub store_name: String,
    pub locale: Locale,
    pub currency: Currency,
}

impl Layout {
    fn money(&self, amount: Money) -> String {
        amount.format(self.locale, self.currency)
    }

    fn row(&self, out: &mut String, label: &str, amount: Money) {
        let value = self.money(amount);
        let pad = WIDTH.saturating_sub(label.chars().count() + value.chars().count()).max(1);
        let _ = writeln!(out, "{}{}{}", label, " ".repeat(pad), value);
    }

    fn totals(&self, out: &mut String, pricing: &PricingSnapshot) {
        self.row(out, "Subtotal", pricing.subtotal);
        if pricing.discount_percent > 0 {
            let label = format!("Discount ({}%)", pricing.discount_percent);
            self.row(out, &label, Money::zero() - pricing.discount_amount);
        }
        let label = format!("Tax ({})", pricing.tax_rate);
        self.row(out, &label, pricing.tax_amount);
        let _ = writeln!(out, "{}", "-".repeat(WIDTH));
        self.row(out, "TOTAL", pricing.total);
    }

    /// One-line status shown after each cart change.
    pub fn cart_banner(&self, cart: &Cart, pricing: &PricingSnapshot) -> String {
        if cart.is_empty() {
            return "Cart: empty".to_string();
        }
        format!(
            "Cart: {} line(s), {} item(s), total {}",
            cart.item_count(),
            cart.total_quantity(),
            self.money(pricing.total)
        )
    }

    /// Full cart listing with totals.
    pub fn cart(&self, cart: &Cart, pricing: &PricingSnapshot) -> String {
        let mut out = String::new();
        if cart.is_empty() {
            out.push_str("Cart is empty\n");
            return out;
        }
        for item in cart.items() {
            let label = format!("{} x{} [{}]", item.name, item.quantity, item.product_id);
            self.row(&mut out, &label, item.line_total());
        }
        let _ = writeln!(out, "{}", "-".repeat(WIDTH));
        self.totals(&mut out, pricing);
        out
    }

    /// Printable receipt.
    pub fn receipt(&self, receipt: &ReceiptSnapshot) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{:^width$}", self.store_name, width = WIDTH);
        let _ = writeln!(out, "Receipt {}", receipt.receipt_number());

        let issued = receipt
            .timestamp_utc()
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
            .to_string();
        match receipt.cashier() {
            Some(cashier) => {
                let right = format!("Cashier: {}", cashier);
                let pad = WIDTH.saturating_sub(issued.len() + right.chars().count()).max(1);
                let _ = writeln!(out, "{}{}{}", issued, " ".repeat(pad), right);
            }
            None => {
                let _ = writeln!(out, "{}", issued);
            }
        }
        let _ = writeln!(out, "{}", "=".repeat(WIDTH));

        for line in receipt.line_items() {
            let label = format!("{} x{}", line.name, line.quantity);
            self.row(&mut out, &label, line.line_total);
            if line.quantity > 1 {
                let _ = writeln!(out, "  @ {}", self.money(line.unit_price));
            }
        }
        let _ = writeln!(out, "{}", "-".repeat(WIDTH));
        self.totals(&mut out, receipt.pricing());

        let payment = receipt.payment();
        let method = payment.method.to_string();
        self.row(&mut out, &capitalize(&method), payment.amount_tendered);
        if payment.method.is_cash() {
            self.row(&mut out, "Change", payment.change);
        }

        if let Some(note) = receipt.note() {
            let _ = writeln!(out);
            let _ = writeln!(out, "{:^width$}", note, width = WIDTH);
        }
        out
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use till_core::pricing::price;
    use till_core::{CartStore, Product, TaxRate};

    fn layout() -> Layout {
        Layout {
            store_name: "Corner Shop".to_string(),
            locale: Locale::EnUs,
            currency: Currency::Usd,
        }
    }

    #[test]
    fn test_cart_listing() {
        let mut store = CartStore::new();
        store.add_item(&Product::new("coffee", "Coffee", 350), 2).unwrap();
        store.apply_discount(10).unwrap();
        let pricing = price(store.cart(), TaxRate::from_bps(825));

        let text = layout().cart(store.cart(), &pricing);
        assert!(text.contains("Coffee x2 [coffee]"));
        assert!(text.contains("$7.00"));
        assert!(text.contains("Discount (10%)"));
        assert!(text.contains("-$0.70"));
        assert!(text.contains("Tax (8.25%)"));
        // 630 taxable, tax 51.975 -> 52, total 682
        assert!(text.contains("$6.82"));
    }

    #[test]
    fn test_banner() {
        let layout = layout();
        let mut store = CartStore::new();
        let pricing = price(store.cart(), TaxRate::zero());
        assert_eq!(layout.cart_banner(store.cart(), &pricing), "Cart: empty");

        store.add_item(&Product::new("a", "A", 150), 3).unwrap();
        let pricing = price(store.cart(), TaxRate::zero());
        assert_eq!(
            layout.cart_banner(store.cart(), &pricing),
            "Cart: 1 line(s), 3 item(s), total $4.50"
        );
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("cash"), "Cash");
        assert_eq!(capitalize(""), "");
    }
}
