//! The click bridge: page clicks arriving as controller events.
//!
//! A delegated listener is installed once per page load. It matches clicks
//! against the configured marker selectors, suppresses default navigation
//! for the checkout control, and forwards `{kind, id}` JSON through a
//! DevTools binding. [`parse_click_payload`] turns those payloads into
//! [`UiEvent`]s; anything unrecognized is dropped by the caller.

use serde::Deserialize;

use cartpilot_api::QtyAction;

use crate::config::UiConfig;

/// Name of the page binding the click shim calls into.
pub const CLICK_BINDING: &str = "__cartpilot";

/// A user-initiated cart action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// Click on an add-to-cart control carrying a numeric item id.
    AddToCart { id: i64 },
    /// Click on an increase/decrease control.
    AdjustQty { id: String, action: QtyAction },
    /// Click on a remove control.
    RemoveItem { id: String },
    /// Click on the checkout control.
    Checkout,
}

impl UiEvent {
    /// Selector of the control(s) to disable while this action's request is
    /// in flight.
    pub fn guard_selector(&self, config: &UiConfig) -> String {
        match self {
            UiEvent::AddToCart { id } => {
                format!(".{}[data-id=\"{id}\"]", config.add_button_class)
            }
            UiEvent::AdjustQty { id, action } => {
                let class = match action {
                    QtyAction::Increase => &config.increase_button_class,
                    QtyAction::Decrease => &config.decrease_button_class,
                };
                format!(".{class}[data-id=\"{id}\"]")
            }
            UiEvent::RemoveItem { id } => {
                format!(".{}[data-id=\"{id}\"]", config.remove_button_class)
            }
            UiEvent::Checkout => format!("#{}", config.checkout_button_id),
        }
    }
}

/// Wire shape of a click-bridge payload.
#[derive(Debug, Deserialize)]
struct ClickPayload {
    kind: String,
    #[serde(default)]
    id: Option<String>,
}

/// Parse a click-bridge payload into a [`UiEvent`].
///
/// Returns `None` for junk payloads, unknown kinds, missing ids, and
/// non-numeric add-to-cart ids.
pub fn parse_click_payload(payload: &str) -> Option<UiEvent> {
    let parsed: ClickPayload = serde_json::from_str(payload).ok()?;
    match parsed.kind.as_str() {
        "add" => {
            let id = parsed.id?.parse::<i64>().ok()?;
            Some(UiEvent::AddToCart { id })
        }
        "increase" => Some(UiEvent::AdjustQty {
            id: parsed.id?,
            action: QtyAction::Increase,
        }),
        "decrease" => Some(UiEvent::AdjustQty {
            id: parsed.id?,
            action: QtyAction::Decrease,
        }),
        "remove" => Some(UiEvent::RemoveItem { id: parsed.id? }),
        "checkout" => Some(UiEvent::Checkout),
        _ => None,
    }
}

/// Build the delegated click listener installed in the page.
///
/// The shim is idempotent (a window flag guards double installation, since
/// the bridge is reinstalled on every load event) and captures clicks on the
/// configured marker classes plus the checkout control.
pub fn click_shim(config: &UiConfig) -> String {
    format!(
        r#"(() => {{
  if (window.__cartpilotBound) return;
  window.__cartpilotBound = true;
  document.addEventListener("click", (e) => {{
    if (typeof window.{binding} !== "function") return;
    const control = e.target.closest(".{add}, .{inc}, .{dec}, .{rem}, #{checkout}");
    if (!control) return;
    let kind = null;
    if (control.classList.contains("{add}")) kind = "add";
    else if (control.classList.contains("{inc}")) kind = "increase";
    else if (control.classList.contains("{dec}")) kind = "decrease";
    else if (control.classList.contains("{rem}")) kind = "remove";
    else if (control.id === "{checkout}") {{ kind = "checkout"; e.preventDefault(); }}
    if (!kind) return;
    window.{binding}(JSON.stringify({{ kind: kind, id: control.getAttribute("data-id") }}));
  }}, true);
}})()"#,
        binding = CLICK_BINDING,
        add = config.add_button_class,
        inc = config.increase_button_class,
        dec = config.decrease_button_class,
        rem = config.remove_button_class,
        checkout = config.checkout_button_id,
    )
}
