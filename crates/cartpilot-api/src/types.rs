//! Serde types for the storefront cart API.
//!
//! Only the fields the UI consumes are deserialized; everything else is
//! ignored. Fields are `#[serde(default)]` throughout: an absent `success`
//! is falsy, an absent count is zero, an absent message is `None`. The
//! client never rejects a response for a missing field.

use serde::{Deserialize, Serialize};

/// Direction of a quantity adjustment, as the `action` field of
/// `/update_cart`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QtyAction {
    Increase,
    Decrease,
}

/// Response of `GET /cart_count`.
#[derive(Debug, Clone, Deserialize)]
pub struct CartCountResponse {
    #[serde(default)]
    pub count: u64,
}

/// Response of `POST /add_to_cart`.
#[derive(Debug, Clone, Deserialize)]
pub struct AddToCartResponse {
    /// New total item count across the cart.
    #[serde(default, rename = "cartCount")]
    pub cart_count: u64,
    /// Optional confirmation message for the banner.
    #[serde(default)]
    pub message: Option<String>,
}

/// Response of `POST /update_cart`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCartResponse {
    #[serde(default)]
    pub success: bool,
    /// New quantity of the adjusted line item.
    #[serde(default)]
    pub qty: i64,
    /// New cart total price.
    #[serde(default)]
    pub total: f64,
    /// New total item count across the cart.
    #[serde(default)]
    pub total_qty: u64,
}

/// Response of `POST /remove_item`.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoveItemResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub total: f64,
    #[serde(default)]
    pub total_qty: u64,
}

/// Response of `POST /checkout`.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutResponse {
    #[serde(default)]
    pub success: bool,
    /// Failure explanation shown to the user.
    #[serde(default)]
    pub message: Option<String>,
    /// Navigation target on success; the client falls back to the
    /// checkout-details path when absent.
    #[serde(default)]
    pub redirect: Option<String>,
}
