//! The display surface the controller writes through.
//!
//! [`CartView`] is the seam between cart semantics and the page: the
//! controller only ever mutates the UI through these operations, so tests
//! can record them and production drives a live page. Operations that target
//! a specific element report whether anything matched — a missing node is
//! observable, never fatal.

use async_trait::async_trait;
use url::Url;

use cartpilot_browser::page::{
    alert_expr, remove_closest_expr, replace_inner_html_expr, set_disabled_expr, set_text_expr,
    toggle_class_expr,
};
use cartpilot_browser::{storage, PageSession};

use crate::config::UiConfig;
use crate::UiError;

/// Display operations of the cart page.
#[async_trait]
pub trait CartView: Send + Sync {
    /// Set the navbar counter label text.
    async fn set_counter_text(&self, text: &str) -> Result<(), UiError>;

    /// Set the text content of an element by id. `false` when no element
    /// matched.
    async fn set_text(&self, element_id: &str, text: &str) -> Result<bool, UiError>;

    /// Show the message banner with the given text. `false` when the page
    /// has no banner.
    async fn show_message(&self, text: &str) -> Result<bool, UiError>;

    /// Hide the message banner again.
    async fn hide_message(&self) -> Result<(), UiError>;

    /// Remove the card enclosing the given line item. `false` when nothing
    /// matched.
    async fn remove_item_card(&self, item_id: &str) -> Result<bool, UiError>;

    /// Replace the items container's contents. `false` when the container
    /// selector matched nothing.
    async fn replace_items_container(&self, html: &str) -> Result<bool, UiError>;

    /// Disable or re-enable the controls matching a selector.
    async fn set_controls_disabled(&self, selector: &str, disabled: bool) -> Result<(), UiError>;

    /// Show a blocking alert.
    async fn alert(&self, text: &str) -> Result<(), UiError>;

    /// Navigate the page. `target` may be relative to the shop origin.
    async fn navigate(&self, target: &str) -> Result<(), UiError>;

    /// Mirror a value into the page's localStorage.
    async fn persist_value(&self, key: &str, value: &str) -> Result<(), UiError>;

    /// Read a meta tag's content. `None` when absent or empty.
    async fn meta_content(&self, name: &str) -> Result<Option<String>, UiError>;

    /// Install the click bridge: expose the binding and run the shim.
    async fn install_click_bridge(&self, binding: &str, shim_js: &str) -> Result<(), UiError>;
}

/// [`CartView`] over a live page session.
#[derive(Clone)]
pub struct PageView {
    session: PageSession,
    config: std::sync::Arc<UiConfig>,
    base: Url,
}

impl PageView {
    /// Create a view over a page session. `base` is the shop origin used to
    /// resolve relative navigation targets.
    pub fn new(session: PageSession, config: std::sync::Arc<UiConfig>, base: Url) -> Self {
        Self {
            session,
            config,
            base,
        }
    }
}

#[async_trait]
impl CartView for PageView {
    async fn set_counter_text(&self, text: &str) -> Result<(), UiError> {
        // The counter is optional on some pages; a missing node is fine.
        self.session
            .eval_matched(&set_text_expr(&self.config.counter_id, text))
            .await?;
        Ok(())
    }

    async fn set_text(&self, element_id: &str, text: &str) -> Result<bool, UiError> {
        Ok(self
            .session
            .eval_matched(&set_text_expr(element_id, text))
            .await?)
    }

    async fn show_message(&self, text: &str) -> Result<bool, UiError> {
        let shown = self
            .session
            .eval_matched(&set_text_expr(&self.config.message_id, text))
            .await?;
        if shown {
            self.session
                .eval_matched(&toggle_class_expr(
                    &self.config.message_id,
                    &self.config.hidden_class,
                    false,
                ))
                .await?;
        }
        Ok(shown)
    }

    async fn hide_message(&self) -> Result<(), UiError> {
        self.session
            .eval_matched(&toggle_class_expr(
                &self.config.message_id,
                &self.config.hidden_class,
                true,
            ))
            .await?;
        Ok(())
    }

    async fn remove_item_card(&self, item_id: &str) -> Result<bool, UiError> {
        let trigger = format!(
            ".{}[data-id=\"{item_id}\"]",
            self.config.remove_button_class
        );
        Ok(self
            .session
            .eval_matched(&remove_closest_expr(
                &trigger,
                &self.config.item_card_selector,
            ))
            .await?)
    }

    async fn replace_items_container(&self, html: &str) -> Result<bool, UiError> {
        Ok(self
            .session
            .eval_matched(&replace_inner_html_expr(
                &self.config.items_container_selector,
                html,
            ))
            .await?)
    }

    async fn set_controls_disabled(&self, selector: &str, disabled: bool) -> Result<(), UiError> {
        self.session
            .evaluate(&set_disabled_expr(selector, disabled))
            .await?;
        Ok(())
    }

    async fn alert(&self, text: &str) -> Result<(), UiError> {
        self.session.evaluate(&alert_expr(text)).await?;
        Ok(())
    }

    async fn navigate(&self, target: &str) -> Result<(), UiError> {
        let url = self
            .base
            .join(target)
            .map_err(|e| UiError::BadNavigationTarget {
                target: target.to_string(),
                reason: e.to_string(),
            })?;
        self.session.navigate(url.as_str()).await?;
        Ok(())
    }

    async fn persist_value(&self, key: &str, value: &str) -> Result<(), UiError> {
        storage::set_item(&self.session, key, value).await?;
        Ok(())
    }

    async fn meta_content(&self, name: &str) -> Result<Option<String>, UiError> {
        Ok(self.session.meta_content(name).await?)
    }

    async fn install_click_bridge(&self, binding: &str, shim_js: &str) -> Result<(), UiError> {
        self.session.add_binding(binding).await?;
        self.session.evaluate(shim_js).await?;
        Ok(())
    }
}
