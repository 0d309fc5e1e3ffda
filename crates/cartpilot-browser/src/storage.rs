//! localStorage access through page-context expressions.
//!
//! The cart counter is mirrored into the page's localStorage so it survives
//! page loads. All access goes through `Runtime.evaluate` with expressions
//! built here; keys and values are embedded as quoted literals so arbitrary
//! text cannot escape into the expression, and values are size-limited.

use crate::error::PageError;
use crate::page::{js_quote, PageSession};

/// Maximum localStorage value length in bytes. Far above anything the cart
/// counter needs; guards against mirroring runaway payloads.
pub const MAX_STORAGE_VALUE_LEN: usize = 4096;

/// Build the expression for `localStorage.setItem(key, value)`.
///
/// Resolves to `true` when storage accepted the write.
pub fn set_item_expr(key: &str, value: &str) -> Result<String, PageError> {
    if value.len() > MAX_STORAGE_VALUE_LEN {
        return Err(PageError::StorageValueTooLarge {
            size: value.len(),
            limit: MAX_STORAGE_VALUE_LEN,
        });
    }
    Ok(format!(
        "(() => {{ window.localStorage.setItem({key}, {value}); return true; }})()",
        key = js_quote(key),
        value = js_quote(value),
    ))
}

/// Build the expression for `localStorage.getItem(key)`.
pub fn get_item_expr(key: &str) -> String {
    format!("window.localStorage.getItem({})", js_quote(key))
}

/// Write a localStorage key on the given page.
pub async fn set_item(page: &PageSession, key: &str, value: &str) -> Result<(), PageError> {
    let expr = set_item_expr(key, value)?;
    page.evaluate(&expr).await?;
    Ok(())
}

/// Read a localStorage key from the given page. `None` when unset.
pub async fn get_item(page: &PageSession, key: &str) -> Result<Option<String>, PageError> {
    let value = page.evaluate(&get_item_expr(key)).await?;
    Ok(value.as_str().map(str::to_string))
}
