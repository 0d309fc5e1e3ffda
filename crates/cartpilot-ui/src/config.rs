//! Controller configuration: the page's selectors and timings.
//!
//! Defaults match the storefront's markup (Bootstrap card layout, `qty-<id>`
//! quantity nodes, a `d-none`-toggled message banner). A TOML file can
//! override any subset of fields for shops with different markup.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Config files larger than this are rejected rather than parsed.
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024; // 1 MB

/// Errors from configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("config file too large: {size} bytes, limit is {limit}")]
    TooLarge { size: u64, limit: u64 },
}

/// Selectors, ids, and timings of the cart page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Element id of the navbar cart counter label.
    pub counter_id: String,
    /// Element id of the add-to-cart message banner.
    pub message_id: String,
    /// Class that hides the message banner.
    pub hidden_class: String,
    /// Element id of the cart total price node.
    pub total_price_id: String,
    /// Element id of the cart total item count node.
    pub total_items_id: String,
    /// Prefix of per-item quantity node ids (`qty-<item id>`).
    pub qty_id_prefix: String,
    /// Marker class of add-to-cart controls.
    pub add_button_class: String,
    /// Marker class of quantity-increase controls.
    pub increase_button_class: String,
    /// Marker class of quantity-decrease controls.
    pub decrease_button_class: String,
    /// Marker class of remove-item controls.
    pub remove_button_class: String,
    /// Element id of the checkout control.
    pub checkout_button_id: String,
    /// Selector of the ancestor card removed with a line item.
    pub item_card_selector: String,
    /// Selector of the container holding the item cards.
    pub items_container_selector: String,
    /// Markup shown in the items container once the cart is empty.
    pub empty_cart_html: String,
    /// localStorage key mirroring the cart count across page loads.
    pub storage_key: String,
    /// Name of the meta tag carrying the CSRF token.
    pub csrf_meta_name: String,
    /// How long the add-to-cart message stays visible.
    pub message_visible_ms: u64,
    /// Fallback navigation target after a successful checkout.
    pub checkout_details_path: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            counter_id: "cart-link".to_string(),
            message_id: "cart-message".to_string(),
            hidden_class: "d-none".to_string(),
            total_price_id: "total-price".to_string(),
            total_items_id: "total-items".to_string(),
            qty_id_prefix: "qty-".to_string(),
            add_button_class: "add-to-cart-btn".to_string(),
            increase_button_class: "increase-btn".to_string(),
            decrease_button_class: "decrease-btn".to_string(),
            remove_button_class: "remove-btn".to_string(),
            checkout_button_id: "checkout-btn".to_string(),
            item_card_selector: ".card".to_string(),
            items_container_selector: ".col-md-8".to_string(),
            empty_cart_html: "<p>Your cart is empty.</p>".to_string(),
            storage_key: "cartCount".to_string(),
            csrf_meta_name: "csrf-token".to_string(),
            message_visible_ms: 2000,
            checkout_details_path: "/checkout/details".to_string(),
        }
    }
}

impl UiConfig {
    /// Load configuration from a TOML file. Absent fields keep their
    /// defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let size = std::fs::metadata(path)?.len();
        if size > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::TooLarge {
                size,
                limit: MAX_CONFIG_FILE_SIZE,
            });
        }
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}
