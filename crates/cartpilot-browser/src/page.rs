//! Page session: evaluate, navigate, bindings, and DOM patch expressions.
//!
//! [`PageSession`] wraps the CDP client with the operations the cart
//! controller needs. All DOM access goes through `Runtime.evaluate` with
//! expressions produced by the pure builder functions in this module; each
//! patch expression resolves to a boolean "did an element match", so callers
//! can observe a missing node without treating it as a failure.

use serde_json::Value;

use crate::cdp::{CdpClient, CdpEvent, CdpEventStream};
use crate::error::PageError;

// ---------------------------------------------------------------------------
// JS expression builders
// ---------------------------------------------------------------------------

/// Quote a Rust string as a JavaScript double-quoted string literal.
///
/// Escapes backslashes, quotes, and control characters so page-supplied or
/// config-supplied text can never terminate the literal early.
pub fn js_quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            // Forward slash escaping keeps "</script>" inert inside markup.
            '/' => out.push_str("\\/"),
            c if (c as u32) < 0x20 || c == '\u{2028}' || c == '\u{2029}' => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Set the text content of the element with the given id.
pub fn set_text_expr(element_id: &str, text: &str) -> String {
    format!(
        "(() => {{ const el = document.getElementById({id}); if (!el) return false; \
         el.textContent = {text}; return true; }})()",
        id = js_quote(element_id),
        text = js_quote(text),
    )
}

/// Read the `content` attribute of `<meta name="...">`, or `null`.
pub fn meta_content_expr(meta_name: &str) -> String {
    let selector = format!("meta[name=\"{meta_name}\"]");
    format!(
        "(() => {{ const el = document.querySelector({sel}); \
         return el ? el.getAttribute(\"content\") : null; }})()",
        sel = js_quote(&selector),
    )
}

/// Remove the closest `ancestor_selector` ancestor of the element matching
/// `trigger_selector` (e.g. the item card enclosing a remove button).
pub fn remove_closest_expr(trigger_selector: &str, ancestor_selector: &str) -> String {
    format!(
        "(() => {{ const el = document.querySelector({trigger}); if (!el) return false; \
         const target = el.closest({ancestor}); if (!target) return false; \
         target.remove(); return true; }})()",
        trigger = js_quote(trigger_selector),
        ancestor = js_quote(ancestor_selector),
    )
}

/// Replace the innerHTML of the first element matching `selector`.
pub fn replace_inner_html_expr(selector: &str, html: &str) -> String {
    format!(
        "(() => {{ const el = document.querySelector({sel}); if (!el) return false; \
         el.innerHTML = {html}; return true; }})()",
        sel = js_quote(selector),
        html = js_quote(html),
    )
}

/// Set or clear the `disabled` property on every element matching
/// `selector`. Resolves to the number of elements touched.
pub fn set_disabled_expr(selector: &str, disabled: bool) -> String {
    format!(
        "(() => {{ const els = document.querySelectorAll({sel}); \
         els.forEach(el => {{ el.disabled = {disabled}; }}); return els.length; }})()",
        sel = js_quote(selector),
    )
}

/// Add or remove a class on the element with the given id.
pub fn toggle_class_expr(element_id: &str, class: &str, on: bool) -> String {
    let op = if on { "add" } else { "remove" };
    format!(
        "(() => {{ const el = document.getElementById({id}); if (!el) return false; \
         el.classList.{op}({class}); return true; }})()",
        id = js_quote(element_id),
        class = js_quote(class),
    )
}

/// Show a blocking `window.alert`.
pub fn alert_expr(text: &str) -> String {
    format!("window.alert({})", js_quote(text))
}

// ---------------------------------------------------------------------------
// Page events
// ---------------------------------------------------------------------------

/// Events the controller reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    /// The page finished loading (`Page.loadEventFired`). Fires again after
    /// every navigation, which is when the click bridge must be reinstalled.
    Loaded,
    /// A page binding was invoked (`Runtime.bindingCalled`).
    BindingCalled { name: String, payload: String },
}

/// Map a raw DevTools event onto a [`PageEvent`], dropping everything else.
pub fn parse_page_event(event: &CdpEvent) -> Option<PageEvent> {
    match event.method.as_str() {
        "Page.loadEventFired" => Some(PageEvent::Loaded),
        "Runtime.bindingCalled" => {
            let name = event.params.get("name")?.as_str()?.to_string();
            let payload = event.params.get("payload")?.as_str()?.to_string();
            Some(PageEvent::BindingCalled { name, payload })
        }
        _ => None,
    }
}

/// Single-consumer stream of [`PageEvent`]s for one session.
pub struct PageEvents {
    inner: CdpEventStream,
}

impl PageEvents {
    /// Receive the next page event, skipping DevTools events the controller
    /// does not care about. Returns `None` once the connection is gone.
    pub async fn next(&mut self) -> Option<PageEvent> {
        while let Some(event) = self.inner.next().await {
            if let Some(parsed) = parse_page_event(&event) {
                return Some(parsed);
            }
        }
        None
    }
}

// ---------------------------------------------------------------------------
// PageSession
// ---------------------------------------------------------------------------

/// A live connection to one page target.
///
/// Cloneable; all clones share the underlying WebSocket. The matching
/// [`PageEvents`] stream is handed out once by [`PageSession::attach`].
#[derive(Clone)]
pub struct PageSession {
    client: CdpClient,
}

impl PageSession {
    /// Connect to a page target and enable the `Page` and `Runtime` domains.
    pub async fn attach(ws_url: &str) -> Result<(Self, PageEvents), PageError> {
        let (client, events) = CdpClient::connect(ws_url).await?;

        client.enable_domain("Page").await?;
        client.enable_domain("Runtime").await?;

        Ok((Self { client }, PageEvents { inner: events }))
    }

    /// Access the underlying CDP client.
    pub fn client(&self) -> &CdpClient {
        &self.client
    }

    /// Evaluate a JavaScript expression in page context and return its value.
    ///
    /// Page exceptions surface as [`PageError::JsException`].
    pub async fn evaluate(&self, expression: &str) -> Result<Value, PageError> {
        let result = self
            .client
            .command(
                "Runtime.evaluate",
                serde_json::json!({
                    "expression": expression,
                    "returnByValue": true,
                    "awaitPromise": true,
                }),
            )
            .await?;

        if let Some(exception) = result.get("exceptionDetails") {
            let message = exception
                .get("exception")
                .and_then(|e| e.get("description"))
                .and_then(Value::as_str)
                .or_else(|| exception.get("text").and_then(Value::as_str))
                .unwrap_or("unknown exception")
                .to_string();
            return Err(PageError::JsException { message });
        }

        Ok(result
            .get("result")
            .and_then(|r| r.get("value"))
            .cloned()
            .unwrap_or(Value::Null))
    }

    /// Evaluate an expression that resolves to a "did an element match"
    /// boolean. Non-boolean results count as `false`.
    pub async fn eval_matched(&self, expression: &str) -> Result<bool, PageError> {
        Ok(self.evaluate(expression).await?.as_bool().unwrap_or(false))
    }

    /// Read the `content` of `<meta name="...">`, or `None` when the tag is
    /// absent or empty.
    pub async fn meta_content(&self, meta_name: &str) -> Result<Option<String>, PageError> {
        let value = self.evaluate(&meta_content_expr(meta_name)).await?;
        Ok(value
            .as_str()
            .map(str::to_string)
            .filter(|s| !s.is_empty()))
    }

    /// Navigate the page to an absolute URL.
    pub async fn navigate(&self, url: &str) -> Result<(), PageError> {
        let result = self
            .client
            .command("Page.navigate", serde_json::json!({ "url": url }))
            .await?;

        if let Some(error_text) = result.get("errorText").and_then(Value::as_str) {
            return Err(PageError::NavigationFailed {
                reason: error_text.to_string(),
            });
        }

        Ok(())
    }

    /// Expose a binding callable from page JavaScript as
    /// `window.<name>(payload)`. Invocations arrive as
    /// [`PageEvent::BindingCalled`].
    pub async fn add_binding(&self, name: &str) -> Result<(), PageError> {
        self.client
            .command("Runtime.addBinding", serde_json::json!({ "name": name }))
            .await?;
        Ok(())
    }
}
