//! The cart controller: attach, event dispatch, and the per-action handlers.
//!
//! One controller serves one page session. Events are dispatched serially —
//! a handler's request settles before the next event is taken — and the
//! triggering control is disabled in the page for the duration, so rapid
//! repeated clicks cannot produce overlapping mutations. Handler failures
//! are logged and never fatal to the loop.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use cartpilot_api::{QtyAction, Storefront};
use cartpilot_browser::{PageEvent, PageEvents};

use crate::config::UiConfig;
use crate::events::{click_shim, parse_click_payload, UiEvent, CLICK_BINDING};
use crate::store::{counter_label, format_price, CartStore};
use crate::view::CartView;
use crate::UiError;

/// Banner text when the add response carries no message.
const DEFAULT_ADD_MESSAGE: &str = "Added to cart successfully!";

/// Alert text when the checkout failure carries no message.
const DEFAULT_CHECKOUT_FAILURE: &str = "Your cart is empty.";

/// Read the CSRF token from the page's meta tag.
///
/// Fails with [`UiError::MissingCsrfToken`] when the tag is absent or empty;
/// a controller without the token could only issue requests the server will
/// reject.
pub async fn read_csrf_token<V: CartView>(view: &V, meta_name: &str) -> Result<String, UiError> {
    view.meta_content(meta_name)
        .await?
        .ok_or(UiError::MissingCsrfToken)
}

/// Controller wiring one cart page to the storefront API.
pub struct CartController<S, V> {
    api: S,
    view: Arc<V>,
    store: CartStore,
    config: Arc<UiConfig>,
    /// Generation counter for the message banner's hide-timer. A timer only
    /// hides the banner if no newer message has been shown since it started.
    msg_generation: Arc<AtomicU64>,
}

impl<S, V> CartController<S, V>
where
    S: Storefront,
    V: CartView + 'static,
{
    pub fn new(api: S, view: Arc<V>, config: UiConfig) -> Self {
        Self {
            api,
            view,
            store: CartStore::new(),
            config: Arc::new(config),
            msg_generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// The client-side store, for inspection.
    pub fn store(&self) -> &CartStore {
        &self.store
    }

    /// The storefront client, for inspection.
    pub fn api(&self) -> &S {
        &self.api
    }

    /// Install the click bridge and render the initial cart count.
    ///
    /// Called once per page load (the bridge does not survive navigation).
    pub async fn attach(&mut self) -> Result<(), UiError> {
        self.view
            .install_click_bridge(CLICK_BINDING, &click_shim(&self.config))
            .await?;
        self.init().await
    }

    /// Fetch the current cart count and render it.
    ///
    /// On success the count is persisted to localStorage and displayed; on
    /// failure the counter falls back to zero so it is never left in an
    /// inconsistent visual state.
    pub async fn init(&mut self) -> Result<(), UiError> {
        match self.api.cart_count().await {
            Ok(resp) => {
                let count = self.store.set_count(resp.count);
                self.view
                    .persist_value(&self.config.storage_key, &count.to_string())
                    .await?;
                self.view.set_counter_text(&counter_label(count)).await?;
            }
            Err(e) => {
                warn!(error = %e, "failed to fetch cart count");
                self.store.set_count(0);
                self.view.set_counter_text(&counter_label(0)).await?;
            }
        }
        Ok(())
    }

    /// Serve page events until the session ends.
    pub async fn run(&mut self, events: &mut PageEvents) -> Result<(), UiError> {
        while let Some(event) = events.next().await {
            match event {
                PageEvent::Loaded => {
                    debug!("page load event, reattaching");
                    if let Err(e) = self.attach().await {
                        warn!(error = %e, "reattach after navigation failed");
                    }
                }
                PageEvent::BindingCalled { name, payload } if name == CLICK_BINDING => {
                    match parse_click_payload(&payload) {
                        Some(ui_event) => self.dispatch(ui_event).await,
                        None => warn!(payload = %payload, "unrecognized click payload"),
                    }
                }
                PageEvent::BindingCalled { name, .. } => {
                    debug!(name = %name, "ignoring unrelated binding call");
                }
            }
        }
        Ok(())
    }

    /// Run one cart action: disable its control, perform the request and
    /// patches, re-enable. Failures are logged, never propagated — the UI
    /// simply keeps its previous state.
    pub async fn dispatch(&mut self, event: UiEvent) {
        let guard = event.guard_selector(&self.config);
        if let Err(e) = self.view.set_controls_disabled(&guard, true).await {
            warn!(error = %e, selector = %guard, "failed to disable control");
        }

        let result = match &event {
            UiEvent::AddToCart { id } => self.handle_add(*id).await,
            UiEvent::AdjustQty { id, action } => self.handle_adjust_qty(id, *action).await,
            UiEvent::RemoveItem { id } => self.handle_remove(id).await,
            UiEvent::Checkout => self.handle_checkout().await,
        };

        if let Err(e) = self.view.set_controls_disabled(&guard, false).await {
            warn!(error = %e, selector = %guard, "failed to re-enable control");
        }

        if let Err(e) = result {
            warn!(error = %e, ?event, "cart action failed");
        }
    }

    /// Add one unit of an item; refresh the counter and show the banner.
    async fn handle_add(&mut self, id: i64) -> Result<(), UiError> {
        let resp = self.api.add_to_cart(id).await?;

        let count = self.store.set_count(resp.cart_count);
        self.view
            .persist_value(&self.config.storage_key, &count.to_string())
            .await?;
        self.view.set_counter_text(&counter_label(count)).await?;

        let text = resp
            .message
            .unwrap_or_else(|| DEFAULT_ADD_MESSAGE.to_string());
        if self.view.show_message(&text).await? {
            self.schedule_message_hide();
        }
        Ok(())
    }

    /// Hide the banner after the configured duration unless a newer message
    /// has been shown in the meantime.
    fn schedule_message_hide(&self) {
        let generation = self.msg_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let counter = Arc::clone(&self.msg_generation);
        let view = Arc::clone(&self.view);
        let visible = Duration::from_millis(self.config.message_visible_ms);

        tokio::spawn(async move {
            tokio::time::sleep(visible).await;
            if counter.load(Ordering::SeqCst) == generation {
                if let Err(e) = view.hide_message().await {
                    warn!(error = %e, "failed to hide message banner");
                }
            }
        });
    }

    /// Adjust a line item's quantity and patch every affected node.
    async fn handle_adjust_qty(&mut self, id: &str, action: QtyAction) -> Result<(), UiError> {
        let resp = self.api.update_cart(id, action).await?;
        if !resp.success {
            debug!(id, ?action, "quantity update rejected by server");
            return Ok(());
        }

        self.store.apply_quantity_update(id, &resp);

        let qty_node = format!("{}{id}", self.config.qty_id_prefix);
        if !self.view.set_text(&qty_node, &resp.qty.to_string()).await? {
            warn!(id, "no quantity node for item");
        }
        self.view
            .set_text(&self.config.total_price_id, &format_price(resp.total))
            .await?;
        self.view
            .set_text(&self.config.total_items_id, &resp.total_qty.to_string())
            .await?;
        self.view
            .set_counter_text(&counter_label(resp.total_qty))
            .await?;
        Ok(())
    }

    /// Remove a line item's card and refresh totals; swap in the empty-cart
    /// markup when the cart reaches zero.
    async fn handle_remove(&mut self, id: &str) -> Result<(), UiError> {
        let resp = self.api.remove_item(id).await?;
        if !resp.success {
            debug!(id, "removal rejected by server");
            return Ok(());
        }

        self.store.apply_removal(id, &resp);

        if !self.view.remove_item_card(id).await? {
            warn!(id, "no card matched for removed item");
        }
        self.view
            .set_text(&self.config.total_price_id, &format_price(resp.total))
            .await?;
        self.view
            .set_text(&self.config.total_items_id, &resp.total_qty.to_string())
            .await?;
        self.view
            .persist_value(&self.config.storage_key, &resp.total_qty.to_string())
            .await?;
        self.view
            .set_counter_text(&counter_label(resp.total_qty))
            .await?;

        if resp.total_qty == 0
            && !self
                .view
                .replace_items_container(&self.config.empty_cart_html)
                .await?
        {
            debug!("items container selector matched nothing");
        }
        Ok(())
    }

    /// Start checkout: navigate on success, alert on rejection.
    async fn handle_checkout(&mut self) -> Result<(), UiError> {
        let resp = self.api.checkout().await?;
        if resp.success {
            let target = resp
                .redirect
                .unwrap_or_else(|| self.config.checkout_details_path.clone());
            self.view.navigate(&target).await?;
        } else {
            let message = resp
                .message
                .unwrap_or_else(|| DEFAULT_CHECKOUT_FAILURE.to_string());
            self.view.alert(&message).await?;
        }
        Ok(())
    }
}
