//! # Register Commands
//!
//! Line commands the cashier types, and the [`Register`] that runs them
//! against a checkout session.
//!
//! ## Sale Workflow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    One Sale at the Register                             │
//! │                                                                         │
//! │  add coffee 2 ──► discount 10 ──► checkout ──► pay cash ──► tender 10   │
//! │       │                              │                         │        │
//! │  qty / remove / clear           cancel (back to cart)     complete      │
//! │  (cancels an open checkout)                                    │        │
//! │                                                                ▼        │
//! │                                              receipt printed, cart empty│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::{Arc, Mutex};
use tracing::debug;

use till_core::pricing::price;
use till_core::{
    CheckoutSession, Currency, DailySequence, Money, PaymentMethod, PaymentStage,
    ReceiptSnapshot, TenderStatus,
};

use crate::config::RegisterConfig;
use crate::error::{AppError, AppResult};
use crate::render::Layout;

pub const HELP: &str = "\
Commands:
  catalog                     list products
  add <product> [qty]         add to cart (default qty 1)
  qty <product> <qty>         set quantity (0 removes)
  remove <product>            remove a line
  discount <percent>          whole-cart discount, 0-100
  clear                       empty the cart
  cart                        show cart and totals
  total                       show amount due
  checkout                    start payment
  pay <cash|card|contactless|mobile>
  tender <amount>             cash received, e.g. 20 or 20.00
  complete [note]             finish the sale and print the receipt
  cancel                      abandon payment, keep the cart
  receipt [json]              reprint the last receipt
  help | quit";

// =============================================================================
// Command Parsing
// =============================================================================

/// A parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Catalog,
    Add { product_id: String, quantity: i64 },
    Quantity { product_id: String, quantity: i64 },
    Remove { product_id: String },
    Discount { percent: i64 },
    Clear,
    Show,
    Total,
    Checkout,
    Pay { method: PaymentMethod },
    /// Amount text is parsed against the store currency at execution.
    Tender { amount: String },
    Complete { note: Option<String> },
    Cancel,
    Receipt { json: bool },
    Help,
    Quit,
}

impl Command {
    /// Parses one line. Blank lines yield `None`.
    pub fn parse(line: &str) -> AppResult<Option<Command>> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(None);
        };
        let args: Vec<&str> = words.collect();

        let command = match (verb.to_lowercase().as_str(), args.as_slice()) {
            ("catalog" | "products", []) => Command::Catalog,
            ("add", [id]) => Command::Add {
                product_id: id.to_string(),
                quantity: 1,
            },
            ("add", [id, qty]) => Command::Add {
                product_id: id.to_string(),
                quantity: parse_int(qty, "quantity")?,
            },
            ("qty" | "quantity", [id, qty]) => Command::Quantity {
                product_id: id.to_string(),
                quantity: parse_int(qty, "quantity")?,
            },
            ("remove" | "rm", [id]) => Command::Remove {
                product_id: id.to_string(),
            },
            ("discount", [pct]) => Command::Discount {
                percent: parse_int(pct.trim_end_matches('%'), "discount")?,
            },
            ("clear", []) => Command::Clear,
            ("cart", []) => Command::Show,
            ("total", []) => Command::Total,
            ("checkout", []) => Command::Checkout,
            ("pay", [method]) => Command::Pay {
                method: method
                    .parse::<PaymentMethod>()
                    .map_err(|e| AppError::parse(e.to_string()))?,
            },
            ("tender", [amount]) => Command::Tender {
                amount: amount.to_string(),
            },
            ("complete" | "done", note) => Command::Complete {
                note: if note.is_empty() {
                    None
                } else {
                    Some(note.join(" "))
                },
            },
            ("cancel", []) => Command::Cancel,
            ("receipt", []) => Command::Receipt { json: false },
            ("receipt", ["json"]) => Command::Receipt { json: true },
            ("help" | "?", _) => Command::Help,
            ("quit" | "exit", []) => Command::Quit,
            (other, _) => {
                return Err(AppError::parse(format!(
                    "Unknown command or wrong arguments: '{}' (try 'help')",
                    other
                )))
            }
        };
        Ok(Some(command))
    }
}

fn parse_int(text: &str, field: &str) -> AppResult<i64> {
    text.parse::<i64>()
        .map_err(|_| AppError::parse(format!("{} must be a whole number, got '{}'", field, text)))
}

/// Parses a typed amount into minor units of `currency`.
///
/// Accepts `20`, `20.5`, `20.50` and `20,50`. No grouping, no sign.
pub fn parse_amount(input: &str, currency: Currency) -> AppResult<Money> {
    let text = input.trim().trim_start_matches(currency.symbol());
    let invalid = || AppError::parse(format!("Not an amount: '{}'", input));

    let (whole, fraction) = match text.find(|c: char| c == '.' || c == ',') {
        Some(i) => (&text[..i], &text[i + 1..]),
        None => (text, ""),
    };

    let exponent = currency.exponent() as usize;
    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty())
        || !all_digits(whole)
        || !all_digits(fraction)
        || fraction.len() > exponent
    {
        return Err(invalid());
    }

    let scale = 10i64.pow(exponent as u32);
    let major = if whole.is_empty() {
        0
    } else {
        whole.parse::<i64>().map_err(|_| invalid())?
    };
    let minor = if fraction.is_empty() {
        0
    } else {
        let padded = format!("{:0<width$}", fraction, width = exponent);
        padded.parse::<i64>().map_err(|_| invalid())?
    };

    major
        .checked_mul(scale)
        .and_then(|cents| cents.checked_add(minor))
        .map(Money::from_cents)
        .ok_or_else(invalid)
}

// =============================================================================
// Register
// =============================================================================

/// Output of one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Quit,
}

impl Reply {
    fn text(s: impl Into<String>) -> Self {
        Reply::Text(s.into())
    }
}

/// A register: one checkout session plus its catalog and display.
pub struct Register {
    session: CheckoutSession<DailySequence>,
    config: RegisterConfig,
    layout: Layout,
    /// Latest cart banner from the cart listener, printed once.
    banner: Arc<Mutex<Option<String>>>,
    last_receipt: Option<ReceiptSnapshot>,
}

impl Register {
    pub fn new(config: RegisterConfig) -> AppResult<Self> {
        let tax_rate = config.tax_rate();
        let mut session = CheckoutSession::new(tax_rate, DailySequence::new(&config.device.id))?;
        if let Some(cashier) = &config.device.cashier {
            session = session.with_cashier(cashier.clone());
        }

        let layout = Layout {
            store_name: config.store.name.clone(),
            locale: config.store.locale,
            currency: config.store.currency,
        };

        let banner = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&banner);
        let display = layout.clone();
        session.cart_mut().subscribe(move |cart| {
            let text = display.cart_banner(cart, &price(cart, tax_rate));
            if let Ok(mut slot) = sink.lock() {
                *slot = Some(text);
            }
        });

        Ok(Register {
            session,
            config,
            layout,
            banner,
            last_receipt: None,
        })
    }

    pub fn greeting(&self) -> String {
        format!(
            "{} register {} ({} tax). Type 'help' for commands.",
            self.config.store.name,
            self.config.device.id,
            self.session.tax_rate()
        )
    }

    /// Takes the cart banner produced since the last call, if any.
    pub fn take_banner(&self) -> Option<String> {
        self.banner.lock().ok().and_then(|mut slot| slot.take())
    }

    pub fn last_receipt(&self) -> Option<&ReceiptSnapshot> {
        self.last_receipt.as_ref()
    }

    /// Parses and runs one input line.
    pub fn handle_line(&mut self, line: &str) -> AppResult<Reply> {
        match Command::parse(line)? {
            Some(command) => self.execute(command),
            None => Ok(Reply::text("")),
        }
    }

    /// Runs a command.
    pub fn execute(&mut self, command: Command) -> AppResult<Reply> {
        debug!(?command, "Executing register command");

        match command {
            Command::Catalog => Ok(Reply::Text(self.catalog_listing())),

            Command::Add {
                product_id,
                quantity,
            } => {
                let product = self
                    .config
                    .product(&product_id)
                    .cloned()
                    .ok_or(AppError::UnknownProduct(product_id))?;
                let had_checkout = self.session.is_checkout_active();
                self.session.cart_mut().add_item(&product, quantity)?;
                Ok(self.cart_edit_reply(
                    format!("Added {} x{}", product.name, quantity),
                    had_checkout,
                ))
            }

            Command::Quantity {
                product_id,
                quantity,
            } => {
                if self.session.cart().cart().get(&product_id).is_none() {
                    return Err(AppError::UnknownProduct(product_id));
                }
                let had_checkout = self.session.is_checkout_active();
                self.session
                    .cart_mut()
                    .update_quantity(&product_id, quantity)?;
                let message = if quantity <= 0 {
                    format!("Removed {}", product_id)
                } else {
                    format!("{} quantity set to {}", product_id, quantity)
                };
                Ok(self.cart_edit_reply(message, had_checkout))
            }

            Command::Remove { product_id } => {
                let had_checkout = self.session.is_checkout_active();
                if self.session.cart_mut().remove_item(&product_id) {
                    Ok(self.cart_edit_reply(format!("Removed {}", product_id), had_checkout))
                } else {
                    Ok(self.cart_edit_reply(
                        format!("{} is not in the cart", product_id),
                        had_checkout,
                    ))
                }
            }

            Command::Discount { percent } => {
                let had_checkout = self.session.is_checkout_active();
                self.session.cart_mut().apply_discount(percent)?;
                Ok(self.cart_edit_reply(format!("Discount set to {}%", percent), had_checkout))
            }

            Command::Clear => {
                let had_checkout = self.session.is_checkout_active();
                self.session.cart_mut().clear();
                Ok(self.cart_edit_reply("Cart cleared".to_string(), had_checkout))
            }

            Command::Show => {
                let pricing = self.session.pricing();
                Ok(Reply::Text(self.layout.cart(self.session.cart().cart(), &pricing)))
            }

            Command::Total => {
                let pricing = self.session.pricing();
                Ok(Reply::Text(format!("Total: {}", self.money(pricing.total))))
            }

            Command::Checkout => {
                let due = self.session.begin_checkout().amount_due();
                Ok(Reply::Text(format!(
                    "Amount due: {}. Choose payment: pay cash | card | contactless | mobile",
                    self.money(due)
                )))
            }

            Command::Pay { method } => {
                let state = self.session.payment_mut()?.select_method(method)?;
                let message = match self.session.payment()?.stage() {
                    PaymentStage::AmountEntry => format!(
                        "{} selected. Amount due {}. Enter 'tender <amount>'",
                        method,
                        self.money(state.amount_due)
                    ),
                    _ => format!(
                        "{} charged {}. Type 'complete' to finish",
                        method,
                        self.money(state.amount_tendered)
                    ),
                };
                Ok(Reply::Text(message))
            }

            Command::Tender { amount } => {
                let amount = parse_amount(&amount, self.config.store.currency)?;
                let status = self.session.payment_mut()?.set_amount_tendered(amount)?;
                let message = match status {
                    TenderStatus::Sufficient { change } => {
                        format!("Change due: {}. Type 'complete' to finish", self.money(change))
                    }
                    TenderStatus::Insufficient { shortfall } => {
                        format!("Short by {}", self.money(shortfall))
                    }
                };
                Ok(Reply::Text(message))
            }

            Command::Complete { note } => {
                let receipt = self.session.complete_checkout(note)?;
                let text = self.layout.receipt(&receipt);
                self.last_receipt = Some(receipt);
                Ok(Reply::Text(text))
            }

            Command::Cancel => {
                if self.session.cancel_checkout() {
                    Ok(Reply::text("Checkout cancelled, cart kept"))
                } else {
                    Ok(Reply::text("No checkout in progress"))
                }
            }

            Command::Receipt { json } => {
                let receipt = self
                    .last_receipt
                    .as_ref()
                    .ok_or_else(|| AppError::parse("No receipt issued yet"))?;
                if json {
                    Ok(Reply::Text(receipt.to_json()?))
                } else {
                    Ok(Reply::Text(self.layout.receipt(receipt)))
                }
            }

            Command::Help => Ok(Reply::text(HELP)),

            Command::Quit => Ok(Reply::Quit),
        }
    }

    fn money(&self, amount: Money) -> String {
        amount.format(self.layout.locale, self.layout.currency)
    }

    /// Reply for a cart edit. Mentions the checkout only if this edit
    /// actually dropped one.
    fn cart_edit_reply(&self, message: String, had_checkout: bool) -> Reply {
        if had_checkout && !self.session.is_checkout_active() {
            Reply::Text(format!("{} (checkout cancelled, run 'checkout' again)", message))
        } else {
            Reply::Text(message)
        }
    }

    fn catalog_listing(&self) -> String {
        if self.config.catalog.is_empty() {
            return "Catalog is empty. Add [[catalog]] entries to the config file.".to_string();
        }
        self.config
            .catalog
            .iter()
            .map(|p| format!("{:<12} {:<24} {}", p.id, p.name, self.money(p.price())))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
