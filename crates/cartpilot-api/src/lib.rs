//! Typed HTTP client for the storefront cart API.
//!
//! Covers the six endpoints the cart UI talks to: count read, add, quantity
//! update, removal, checkout, and the checkout-details navigation target.
//! Every mutating call is a JSON `POST` carrying the page's CSRF token in an
//! `X-CSRFToken` header; the count read is a plain `GET`.
//!
//! Response types deserialize only the fields the UI uses and default the
//! rest — a missing or malformed field degrades to its zero value rather
//! than failing the request.

pub mod client;
pub mod types;

pub use client::{ApiError, Storefront, StorefrontClient};
pub use types::{
    AddToCartResponse, CartCountResponse, CheckoutResponse, QtyAction, RemoveItemResponse,
    UpdateCartResponse,
};
