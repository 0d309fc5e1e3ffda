//! Cart UI controller.
//!
//! Wires a storefront cart page's controls to the shop's JSON API and keeps
//! the page's counter, quantities, and totals in sync with server responses.
//! The moving parts:
//!
//! - [`store::CartStore`] — explicit client-side state with single-writer
//!   transitions, assertable without a DOM. Displayed values always equal
//!   the last server-reported value; the client does no arithmetic of its
//!   own beyond formatting.
//! - [`events`] — the click bridge: a delegated listener installed in the
//!   page forwards marker-class clicks to the controller as `{kind, id}`
//!   payloads through a DevTools binding.
//! - [`view::CartView`] — the display surface the controller writes
//!   through; [`view::PageView`] implements it over a live page session.
//! - [`controller::CartController`] — attach, serial event dispatch with a
//!   per-action disable guard, and one handler per cart operation.

pub mod config;
pub mod controller;
pub mod events;
pub mod store;
pub mod view;

use thiserror::Error;

pub use config::UiConfig;
pub use controller::{read_csrf_token, CartController};
pub use events::{parse_click_payload, UiEvent, CLICK_BINDING};
pub use store::{counter_label, format_price, CartStore};
pub use view::{CartView, PageView};

/// Errors from cart UI operations.
#[derive(Debug, Error)]
pub enum UiError {
    /// The page carries no usable `meta[name="csrf-token"]` tag. Without a
    /// token every mutating request would be rejected, so attach fails fast
    /// instead of wiring handlers that cannot work.
    #[error("page carries no CSRF token meta tag")]
    MissingCsrfToken,

    #[error("page operation failed: {0}")]
    Page(#[from] cartpilot_browser::PageError),

    #[error("storefront request failed: {0}")]
    Api(#[from] cartpilot_api::ApiError),

    #[error("invalid navigation target `{target}`: {reason}")]
    BadNavigationTarget { target: String, reason: String },
}
