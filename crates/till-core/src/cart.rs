//! # Cart Store
//!
//! Owns the in-progress order and tells the UI every time it changes.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Store Operations                                │
//! │                                                                         │
//! │  UI Action                CartStore               Cart Change           │
//! │  ─────────                ─────────               ───────────           │
//! │                                                                         │
//! │  Tap Product ────────────► add_item() ──────────► push / qty += n      │
//! │                                                                         │
//! │  Change Quantity ────────► update_quantity() ───► qty = n (≤0 removes) │
//! │                                                                         │
//! │  Tap Remove ─────────────► remove_item() ───────► items.remove(i)      │
//! │                                                                         │
//! │  Enter Discount ─────────► apply_discount() ────► discount_percent = p │
//! │                                                                         │
//! │  Tap Clear / Sale Done ──► clear() ─────────────► items = [], disc = 0 │
//! │                                                                         │
//! │  After EVERY mutation: listeners(&cart), in registration order         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - Items are unique by `product_id` (adding the same product again
//!   increases its quantity)
//! - Every quantity is in `1..=MAX_ITEM_QUANTITY`; a line whose quantity
//!   would reach zero is removed
//! - At most `MAX_CART_ITEMS` lines
//! - Only `CartStore` mutates a `Cart`

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::Product;
use crate::validation::{
    validate_cart_size, validate_discount_percent, validate_price_cents, validate_product_id,
    validate_quantity,
};
use crate::MAX_ITEM_QUANTITY;

// =============================================================================
// Line Item
// =============================================================================

/// An item in the cart.
///
/// ## Price Freezing
/// `unit_price` and `name` are copied from the product when the line is
/// created. A later catalog price change does not touch an open cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: String,

    /// Product name at time of adding (frozen)
    pub name: String,

    /// Unit price at time of adding (frozen)
    pub unit_price: Money,

    /// Always > 0 while the line exists
    pub quantity: i64,

    pub category: Option<String>,

    #[ts(as = "String")]
    pub added_at: DateTime<Utc>,
}

impl LineItem {
    fn from_product(product: &Product, unit_price: Money, quantity: i64) -> Self {
        LineItem {
            product_id: product.id.clone(),
            name: product.name.clone(),
            unit_price,
            quantity,
            category: product.category.clone(),
            added_at: Utc::now(),
        }
    }

    /// Unit price × quantity. Exact.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The current order: ordered line items plus a whole-percent discount.
///
/// Read-only outside this module. Listeners and the pricing engine get
/// `&Cart`; receipts get a clone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    items: Vec<LineItem>,
    discount_percent: u8,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart::default()
    }

    /// Lines in insertion order.
    #[inline]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Pre-tax discount, 0..=100.
    #[inline]
    pub fn discount_percent(&self) -> u8 {
        self.discount_percent
    }

    pub fn get(&self, product_id: &str) -> Option<&LineItem> {
        self.items.iter().find(|i| i.product_id == product_id)
    }

    /// Returns the number of unique lines in the cart.
    #[inline]
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Returns the total quantity of all items.
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn position(&self, product_id: &str) -> Option<usize> {
        self.items.iter().position(|i| i.product_id == product_id)
    }
}

// =============================================================================
// Cart Store
// =============================================================================

/// A cart change listener. Called with the cart as it is after the change.
pub type CartListener = Box<dyn FnMut(&Cart) + Send>;

/// Handle returned by [`CartStore::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Single owner of the current [`Cart`].
///
/// ## Notification
/// Listeners run synchronously, in registration order, once per mutating
/// call. There is no batching: `add_item` twice fires twice. A call that
/// changes nothing (updating or removing an absent product) fires nothing.
///
/// Every notification also bumps [`CartStore::revision`], so a holder can
/// tell whether the cart changed since it last looked.
#[derive(Default)]
pub struct CartStore {
    cart: Cart,
    listeners: Vec<(SubscriptionId, CartListener)>,
    next_subscription: u64,
    revision: u64,
}

impl CartStore {
    /// Creates a store holding an empty cart.
    pub fn new() -> Self {
        CartStore::default()
    }

    /// Read access to the current cart.
    #[inline]
    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Counter bumped on every effective change. Rejected and no-op calls
    /// leave it alone.
    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cart.is_empty()
    }

    /// Adds `quantity` of a product, merging with an existing line.
    ///
    /// ## Behavior
    /// - Product already in cart: quantity increases
    /// - Product not in cart: new line appended with the price frozen now
    ///
    /// ## Errors
    /// - `Validation` for an empty product id or non-positive quantity
    /// - `InvalidAmount` for a negative product price
    /// - `Validation` (`OutOfRange`) for a price over `MAX_PRICE_CENTS`
    /// - `QuantityTooLarge` if the line would exceed `MAX_ITEM_QUANTITY`
    /// - `CartTooLarge` if a new line would exceed `MAX_CART_ITEMS`
    pub fn add_item(&mut self, product: &Product, quantity: i64) -> CoreResult<()> {
        validate_product_id(&product.id)?;
        validate_quantity(quantity)?;
        let unit_price = validate_price_cents(product.price_cents)?;

        match self.cart.position(&product.id) {
            Some(idx) => {
                let item = &mut self.cart.items[idx];
                let new_qty = item.quantity + quantity;
                if new_qty > MAX_ITEM_QUANTITY {
                    warn!(product_id = %product.id, requested = new_qty, "Quantity over maximum");
                    return Err(CoreError::QuantityTooLarge {
                        requested: new_qty,
                        max: MAX_ITEM_QUANTITY,
                    });
                }
                item.quantity = new_qty;
                debug!(product_id = %product.id, quantity = new_qty, "Cart line merged");
            }
            None => {
                validate_cart_size(self.cart.items.len())?;
                self.cart
                    .items
                    .push(LineItem::from_product(product, unit_price, quantity));
                debug!(product_id = %product.id, quantity, unit_price = %unit_price, "Cart line added");
            }
        }

        self.notify();
        Ok(())
    }

    /// Adds a single unit of a product.
    pub fn add_one(&mut self, product: &Product) -> CoreResult<()> {
        self.add_item(product, 1)
    }

    /// Sets the quantity of a line.
    ///
    /// ## Behavior
    /// - `quantity <= 0`: removes the line, same as [`CartStore::remove_item`]
    /// - Product not in cart: no-op, not an error, whatever the quantity
    pub fn update_quantity(&mut self, product_id: &str, quantity: i64) -> CoreResult<()> {
        if quantity <= 0 {
            self.remove_item(product_id);
            return Ok(());
        }

        let Some(idx) = self.cart.position(product_id) else {
            debug!(product_id, "update_quantity: product not in cart");
            return Ok(());
        };

        if quantity > MAX_ITEM_QUANTITY {
            warn!(product_id, requested = quantity, "Quantity over maximum");
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_ITEM_QUANTITY,
            });
        }

        self.cart.items[idx].quantity = quantity;
        debug!(product_id, quantity, "Cart line quantity set");
        self.notify();
        Ok(())
    }

    /// Removes a line by product id. Returns whether anything was removed.
    pub fn remove_item(&mut self, product_id: &str) -> bool {
        let Some(idx) = self.cart.position(product_id) else {
            debug!(product_id, "remove_item: product not in cart");
            return false;
        };

        self.cart.items.remove(idx);
        debug!(product_id, "Cart line removed");
        self.notify();
        true
    }

    /// Empties the cart and resets the discount. Safe to call repeatedly.
    pub fn clear(&mut self) {
        self.cart.items.clear();
        self.cart.discount_percent = 0;
        debug!("Cart cleared");
        self.notify();
    }

    /// Sets the pre-tax discount percent.
    ///
    /// The value comes from the UI (keypad, manager override); this method
    /// never asks for it.
    pub fn apply_discount(&mut self, percent: i64) -> CoreResult<()> {
        let percent = validate_discount_percent(percent).inspect_err(|_| {
            warn!(percent, "Discount rejected");
        })?;
        self.cart.discount_percent = percent;
        debug!(percent, "Discount applied");
        self.notify();
        Ok(())
    }

    /// Registers a change listener.
    ///
    /// ## Usage
    /// ```rust
    /// use std::sync::{Arc, Mutex};
    /// use till_core::cart::CartStore;
    /// use till_core::Product;
    ///
    /// let mut store = CartStore::new();
    /// let seen = Arc::new(Mutex::new(Vec::new()));
    /// let sink = Arc::clone(&seen);
    /// let id = store.subscribe(move |cart| sink.lock().unwrap().push(cart.item_count()));
    ///
    /// store.add_one(&Product::new("p-1", "Chips", 249)).unwrap();
    /// store.unsubscribe(id);
    /// store.clear();
    ///
    /// assert_eq!(*seen.lock().unwrap(), vec![1]);
    /// ```
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&Cart) + Send + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        debug!(subscription = id.0, "Cart listener subscribed");
        id
    }

    /// Removes a listener. Returns false if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    fn notify(&mut self) {
        self.revision += 1;
        for (_, listener) in self.listeners.iter_mut() {
            listener(&self.cart);
        }
    }
}

impl fmt::Debug for CartStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CartStore")
            .field("cart", &self.cart)
            .field("listeners", &self.listeners.len())
            .field("revision", &self.revision)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::{MAX_CART_ITEMS, MAX_PRICE_CENTS};
    use std::sync::{Arc, Mutex};

    fn test_product(id: &str, price_cents: i64) -> Product {
        Product::new(id, format!("Product {}", id), price_cents)
    }

    #[test]
    fn test_cart_add_item() {
        let mut store = CartStore::new();
        store.add_item(&test_product("1", 999), 2).unwrap();

        let cart = store.cart();
        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.total_quantity(), 2);
        assert_eq!(cart.items()[0].line_total().cents(), 1998);
    }

    #[test]
    fn test_cart_add_same_product_increases_quantity() {
        let mut store = CartStore::new();
        let product = test_product("1", 999);

        store.add_item(&product, 2).unwrap();
        store.add_item(&product, 3).unwrap();

        assert_eq!(store.cart().item_count(), 1);
        assert_eq!(store.cart().total_quantity(), 5);
    }

    #[test]
    fn test_add_one_twice_equals_add_two() {
        let product = test_product("1", 150);

        let mut once = CartStore::new();
        once.add_item(&product, 2).unwrap();

        let mut twice = CartStore::new();
        twice.add_one(&product).unwrap();
        twice.add_one(&product).unwrap();

        assert_eq!(twice.cart().items().len(), 1);
        assert_eq!(twice.cart().items()[0].quantity, 2);
        assert_eq!(
            once.cart().items()[0].quantity,
            twice.cart().items()[0].quantity
        );
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut store = CartStore::new();
        store.add_one(&test_product("b", 100)).unwrap();
        store.add_one(&test_product("a", 100)).unwrap();
        store.add_one(&test_product("b", 100)).unwrap();

        let ids: Vec<&str> = store
            .cart()
            .items()
            .iter()
            .map(|i| i.product_id.as_str())
            .collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn test_price_frozen_at_add_time() {
        let mut store = CartStore::new();
        let mut product = test_product("1", 500);
        store.add_one(&product).unwrap();

        // Catalog price change after the item is in the cart
        product.price_cents = 700;
        store.add_one(&product).unwrap();

        let item = store.cart().get("1").unwrap();
        assert_eq!(item.unit_price.cents(), 500);
        assert_eq!(item.quantity, 2);
    }

    #[test]
    fn test_add_item_rejects_bad_input() {
        let mut store = CartStore::new();

        assert!(matches!(
            store.add_item(&test_product("1", 100), 0),
            Err(CoreError::Validation(ValidationError::MustBePositive { .. }))
        ));
        assert!(matches!(
            store.add_item(&test_product("1", -100), 1),
            Err(CoreError::InvalidAmount { .. })
        ));
        assert!(matches!(
            store.add_item(&test_product("", 100), 1),
            Err(CoreError::Validation(ValidationError::Required { .. }))
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn test_add_item_quantity_cap() {
        let mut store = CartStore::new();
        let product = test_product("1", 100);
        store.add_item(&product, MAX_ITEM_QUANTITY).unwrap();

        let err = store.add_one(&product).unwrap_err();
        assert_eq!(
            err,
            CoreError::QuantityTooLarge {
                requested: MAX_ITEM_QUANTITY + 1,
                max: MAX_ITEM_QUANTITY
            }
        );
        assert_eq!(store.cart().items()[0].quantity, MAX_ITEM_QUANTITY);
    }

    #[test]
    fn test_cart_line_cap() {
        let mut store = CartStore::new();
        for i in 0..MAX_CART_ITEMS {
            store.add_one(&test_product(&i.to_string(), 100)).unwrap();
        }

        let err = store.add_one(&test_product("one-too-many", 100)).unwrap_err();
        assert!(matches!(err, CoreError::CartTooLarge { .. }));
        // Existing lines can still grow
        assert!(store.add_one(&test_product("0", 100)).is_ok());
    }

    #[test]
    fn test_update_quantity() {
        let mut store = CartStore::new();
        store.add_one(&test_product("1", 100)).unwrap();

        store.update_quantity("1", 7).unwrap();
        assert_eq!(store.cart().get("1").unwrap().quantity, 7);

        assert!(matches!(
            store.update_quantity("1", 1000),
            Err(CoreError::QuantityTooLarge { .. })
        ));
        assert_eq!(store.cart().get("1").unwrap().quantity, 7);
    }

    #[test]
    fn test_update_quantity_zero_equals_remove() {
        let mut updated = CartStore::new();
        let mut removed = CartStore::new();
        for store in [&mut updated, &mut removed] {
            store.add_one(&test_product("1", 100)).unwrap();
            store.add_one(&test_product("2", 200)).unwrap();
        }

        updated.update_quantity("1", 0).unwrap();
        removed.remove_item("1");

        let lines = |store: &CartStore| -> Vec<(String, i64)> {
            store
                .cart()
                .items()
                .iter()
                .map(|i| (i.product_id.clone(), i.quantity))
                .collect()
        };
        assert_eq!(lines(&updated), lines(&removed));
        assert!(updated.cart().get("1").is_none());

        // Negative behaves the same
        updated.update_quantity("2", -3).unwrap();
        assert!(updated.is_empty());
    }

    #[test]
    fn test_absent_product_is_silent_noop() {
        let mut store = CartStore::new();
        store.add_one(&test_product("1", 100)).unwrap();
        let before = store.cart().clone();
        let revision = store.revision();

        assert!(store.update_quantity("missing", 5).is_ok());
        assert!(!store.remove_item("missing"));
        assert_eq!(store.cart(), &before);
        assert_eq!(store.revision(), revision);
    }

    #[test]
    fn test_update_absent_product_over_cap_is_noop() {
        let mut store = CartStore::new();
        let count = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&count);
        store.subscribe(move |_| *sink.lock().unwrap() += 1);

        assert_eq!(store.update_quantity("absent", MAX_ITEM_QUANTITY + 1), Ok(()));
        assert_eq!(store.update_quantity("absent", i64::MAX), Ok(()));
        assert!(store.is_empty());
        assert_eq!(*count.lock().unwrap(), 0);
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn test_price_cap() {
        let mut store = CartStore::new();
        let count = Arc::new(Mutex::new(0usize));
        let sink = Arc::clone(&count);
        store.subscribe(move |_| *sink.lock().unwrap() += 1);

        // Largest accepted price at the largest quantity, on every line
        for i in 0..MAX_CART_ITEMS {
            store
                .add_item(&test_product(&i.to_string(), MAX_PRICE_CENTS), MAX_ITEM_QUANTITY)
                .unwrap();
        }
        let total: i64 = store.cart().items().iter().map(|i| i.line_total().cents()).sum();
        assert_eq!(total, MAX_PRICE_CENTS * MAX_ITEM_QUANTITY * MAX_CART_ITEMS as i64);
        assert_eq!(*count.lock().unwrap(), MAX_CART_ITEMS);

        let mut store = CartStore::new();
        let count = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&count);
        store.subscribe(move |_| *sink.lock().unwrap() += 1);

        for price in [MAX_PRICE_CENTS + 1, 10_000_000_000_000_000, i64::MAX] {
            assert!(matches!(
                store.add_item(&test_product("gold", price), 2),
                Err(CoreError::Validation(ValidationError::OutOfRange { .. }))
            ));
        }
        assert!(store.is_empty());
        assert_eq!(*count.lock().unwrap(), 0);
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn test_cart_clear_is_idempotent() {
        let mut store = CartStore::new();
        store.add_item(&test_product("1", 999), 2).unwrap();
        store.apply_discount(10).unwrap();

        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.cart().discount_percent(), 0);

        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn test_apply_discount() {
        let mut store = CartStore::new();
        store.apply_discount(15).unwrap();
        assert_eq!(store.cart().discount_percent(), 15);

        assert_eq!(
            store.apply_discount(101),
            Err(CoreError::InvalidDiscount { percent: 101 })
        );
        assert_eq!(
            store.apply_discount(-1),
            Err(CoreError::InvalidDiscount { percent: -1 })
        );
        // Rejected values leave the previous discount in place
        assert_eq!(store.cart().discount_percent(), 15);
    }

    #[test]
    fn test_listeners_fire_per_mutation_in_order() {
        let mut store = CartStore::new();
        let log = Arc::new(Mutex::new(Vec::<String>::new()));

        let first = Arc::clone(&log);
        store.subscribe(move |cart| {
            first
                .lock()
                .unwrap()
                .push(format!("first:{}", cart.total_quantity()))
        });
        let second = Arc::clone(&log);
        store.subscribe(move |cart| {
            second
                .lock()
                .unwrap()
                .push(format!("second:{}", cart.total_quantity()))
        });

        let product = test_product("1", 100);
        store.add_one(&product).unwrap();
        store.add_one(&product).unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["first:1", "second:1", "first:2", "second:2"]
        );
    }

    #[test]
    fn test_noop_and_failed_mutations_do_not_notify() {
        let mut store = CartStore::new();
        let count = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&count);
        store.subscribe(move |_| *sink.lock().unwrap() += 1);

        store.remove_item("missing");
        store.update_quantity("missing", 3).unwrap();
        let _ = store.apply_discount(500);
        let _ = store.add_item(&test_product("1", 100), 0);

        assert_eq!(*count.lock().unwrap(), 0);

        store.clear();
        assert_eq!(*count.lock().unwrap(), 1);
    }

    #[test]
    fn test_unsubscribe() {
        let mut store = CartStore::new();
        let count = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&count);
        let id = store.subscribe(move |_| *sink.lock().unwrap() += 1);

        store.add_one(&test_product("1", 100)).unwrap();
        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.add_one(&test_product("1", 100)).unwrap();

        assert_eq!(*count.lock().unwrap(), 1);
    }
}
