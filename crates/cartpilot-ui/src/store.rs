//! Explicit client-side cart state.
//!
//! The store is the single writer of every displayed cart value. Each
//! transition takes server-reported values verbatim — the client performs no
//! arithmetic of its own — so the displayed counter, quantities, and totals
//! always equal the last server response for that field, and tests can
//! assert on transitions without a DOM.

use std::collections::HashMap;

use cartpilot_api::{RemoveItemResponse, UpdateCartResponse};

/// Render the navbar counter label for a cart count.
pub fn counter_label(count: u64) -> String {
    format!("🛒 Cart ({count})")
}

/// Render a cart total price with two decimal places.
pub fn format_price(total: f64) -> String {
    format!("{total:.2}")
}

/// Client-side mirror of the server's cart state.
#[derive(Debug, Clone, Default)]
pub struct CartStore {
    count: u64,
    total: Option<f64>,
    total_qty: Option<u64>,
    quantities: HashMap<String, i64>,
}

impl CartStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current cart count (navbar counter value).
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Last server-reported total price, if any response carried one.
    pub fn total(&self) -> Option<f64> {
        self.total
    }

    /// Last server-reported total item count, if any response carried one.
    pub fn total_qty(&self) -> Option<u64> {
        self.total_qty
    }

    /// Last server-reported quantity of a line item.
    pub fn quantity(&self, id: &str) -> Option<i64> {
        self.quantities.get(id).copied()
    }

    /// Overwrite the cart count with a server-reported value.
    pub fn set_count(&mut self, count: u64) -> u64 {
        self.count = count;
        count
    }

    /// Apply a successful quantity adjustment: the item's new quantity and
    /// the new totals, all server-reported.
    pub fn apply_quantity_update(&mut self, id: &str, resp: &UpdateCartResponse) {
        self.quantities.insert(id.to_string(), resp.qty);
        self.total = Some(resp.total);
        self.total_qty = Some(resp.total_qty);
        self.count = resp.total_qty;
    }

    /// Apply a successful removal: the line item is gone and the totals are
    /// the server's.
    pub fn apply_removal(&mut self, id: &str, resp: &RemoveItemResponse) {
        self.quantities.remove(id);
        self.total = Some(resp.total);
        self.total_qty = Some(resp.total_qty);
        self.count = resp.total_qty;
    }
}
