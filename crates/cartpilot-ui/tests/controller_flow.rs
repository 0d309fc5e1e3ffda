//! End-to-end controller tests against a scripted storefront and a
//! recording view: every server-reported value must land in exactly the
//! right display primitive, and failures must leave the UI untouched.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use cartpilot_api::{
    AddToCartResponse, ApiError, CartCountResponse, CheckoutResponse, QtyAction,
    RemoveItemResponse, Storefront, UpdateCartResponse,
};
use cartpilot_ui::{read_csrf_token, CartController, CartView, UiConfig, UiError, UiEvent};

// ---------------------------------------------------------------------------
// Scripted storefront
// ---------------------------------------------------------------------------

/// One-shot scripted responses; an endpoint with no script errors out.
#[derive(Default)]
struct FakeStorefront {
    count: Mutex<Option<Result<CartCountResponse, ApiError>>>,
    add: Mutex<Option<Result<AddToCartResponse, ApiError>>>,
    update: Mutex<Option<Result<UpdateCartResponse, ApiError>>>,
    remove: Mutex<Option<Result<RemoveItemResponse, ApiError>>>,
    checkout: Mutex<Option<Result<CheckoutResponse, ApiError>>>,
    requests: Mutex<Vec<String>>,
}

impl FakeStorefront {
    fn take<T>(slot: &Mutex<Option<Result<T, ApiError>>>, name: &str) -> Result<T, ApiError> {
        slot.lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Err(ApiError::Other(format!("unexpected call to {name}"))))
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Storefront for FakeStorefront {
    async fn cart_count(&self) -> Result<CartCountResponse, ApiError> {
        self.requests.lock().unwrap().push("cart_count".to_string());
        Self::take(&self.count, "cart_count")
    }

    async fn add_to_cart(&self, id: i64) -> Result<AddToCartResponse, ApiError> {
        self.requests.lock().unwrap().push(format!("add {id}"));
        Self::take(&self.add, "add_to_cart")
    }

    async fn update_cart(
        &self,
        id: &str,
        action: QtyAction,
    ) -> Result<UpdateCartResponse, ApiError> {
        self.requests
            .lock()
            .unwrap()
            .push(format!("update {id} {action:?}"));
        Self::take(&self.update, "update_cart")
    }

    async fn remove_item(&self, id: &str) -> Result<RemoveItemResponse, ApiError> {
        self.requests.lock().unwrap().push(format!("remove {id}"));
        Self::take(&self.remove, "remove_item")
    }

    async fn checkout(&self) -> Result<CheckoutResponse, ApiError> {
        self.requests.lock().unwrap().push("checkout".to_string());
        Self::take(&self.checkout, "checkout")
    }
}

// ---------------------------------------------------------------------------
// Recording view
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum ViewCall {
    SetCounter(String),
    SetText(String, String),
    ShowMessage(String),
    HideMessage,
    RemoveCard(String),
    ReplaceContainer(String),
    SetDisabled(String, bool),
    Alert(String),
    Navigate(String),
    Persist(String, String),
    InstallBridge(String),
}

struct RecordingView {
    calls: Mutex<Vec<ViewCall>>,
    /// Meta content served for CSRF lookups.
    meta: Option<String>,
    /// Whether the page has a message banner.
    has_message_area: bool,
}

impl Default for RecordingView {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            meta: Some("test-token".to_string()),
            has_message_area: true,
        }
    }
}

impl RecordingView {
    fn calls(&self) -> Vec<ViewCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: ViewCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl CartView for RecordingView {
    async fn set_counter_text(&self, text: &str) -> Result<(), UiError> {
        self.record(ViewCall::SetCounter(text.to_string()));
        Ok(())
    }

    async fn set_text(&self, element_id: &str, text: &str) -> Result<bool, UiError> {
        self.record(ViewCall::SetText(element_id.to_string(), text.to_string()));
        Ok(true)
    }

    async fn show_message(&self, text: &str) -> Result<bool, UiError> {
        if self.has_message_area {
            self.record(ViewCall::ShowMessage(text.to_string()));
        }
        Ok(self.has_message_area)
    }

    async fn hide_message(&self) -> Result<(), UiError> {
        self.record(ViewCall::HideMessage);
        Ok(())
    }

    async fn remove_item_card(&self, item_id: &str) -> Result<bool, UiError> {
        self.record(ViewCall::RemoveCard(item_id.to_string()));
        Ok(true)
    }

    async fn replace_items_container(&self, html: &str) -> Result<bool, UiError> {
        self.record(ViewCall::ReplaceContainer(html.to_string()));
        Ok(true)
    }

    async fn set_controls_disabled(&self, selector: &str, disabled: bool) -> Result<(), UiError> {
        self.record(ViewCall::SetDisabled(selector.to_string(), disabled));
        Ok(())
    }

    async fn alert(&self, text: &str) -> Result<(), UiError> {
        self.record(ViewCall::Alert(text.to_string()));
        Ok(())
    }

    async fn navigate(&self, target: &str) -> Result<(), UiError> {
        self.record(ViewCall::Navigate(target.to_string()));
        Ok(())
    }

    async fn persist_value(&self, key: &str, value: &str) -> Result<(), UiError> {
        self.record(ViewCall::Persist(key.to_string(), value.to_string()));
        Ok(())
    }

    async fn meta_content(&self, _name: &str) -> Result<Option<String>, UiError> {
        Ok(self.meta.clone())
    }

    async fn install_click_bridge(&self, binding: &str, _shim_js: &str) -> Result<(), UiError> {
        self.record(ViewCall::InstallBridge(binding.to_string()));
        Ok(())
    }
}

fn controller_with(
    api: FakeStorefront,
    view: Arc<RecordingView>,
) -> CartController<FakeStorefront, RecordingView> {
    CartController::new(api, view, UiConfig::default())
}

// ---------------------------------------------------------------------------
// CSRF
// ---------------------------------------------------------------------------

#[tokio::test]
async fn csrf_token_read_from_meta() {
    let view = RecordingView::default();
    let token = read_csrf_token(&view, "csrf-token").await.unwrap();
    assert_eq!(token, "test-token");
}

#[tokio::test]
async fn missing_csrf_meta_fails_fast() {
    let view = RecordingView {
        meta: None,
        ..Default::default()
    };
    assert!(matches!(
        read_csrf_token(&view, "csrf-token").await,
        Err(UiError::MissingCsrfToken)
    ));
}

// ---------------------------------------------------------------------------
// Init
// ---------------------------------------------------------------------------

#[tokio::test]
async fn init_renders_and_persists_count() {
    let api = FakeStorefront::default();
    *api.count.lock().unwrap() = Some(Ok(CartCountResponse { count: 5 }));

    let view = Arc::new(RecordingView::default());
    let mut controller = controller_with(api, Arc::clone(&view));
    controller.init().await.unwrap();

    let calls = view.calls();
    assert!(calls.contains(&ViewCall::Persist("cartCount".to_string(), "5".to_string())));
    assert!(calls.contains(&ViewCall::SetCounter("🛒 Cart (5)".to_string())));
    assert_eq!(controller.store().count(), 5);
}

#[tokio::test]
async fn init_failure_renders_zero_without_persisting() {
    let api = FakeStorefront::default();
    *api.count.lock().unwrap() = Some(Err(ApiError::Other("connection refused".to_string())));

    let view = Arc::new(RecordingView::default());
    let mut controller = controller_with(api, Arc::clone(&view));
    controller.init().await.unwrap();

    let calls = view.calls();
    assert!(calls.contains(&ViewCall::SetCounter("🛒 Cart (0)".to_string())));
    assert!(!calls
        .iter()
        .any(|c| matches!(c, ViewCall::Persist(_, _))));
    assert_eq!(controller.store().count(), 0);
}

#[tokio::test]
async fn attach_installs_bridge_before_init() {
    let api = FakeStorefront::default();
    *api.count.lock().unwrap() = Some(Ok(CartCountResponse { count: 1 }));

    let view = Arc::new(RecordingView::default());
    let mut controller = controller_with(api, Arc::clone(&view));
    controller.attach().await.unwrap();

    let calls = view.calls();
    assert_eq!(calls[0], ViewCall::InstallBridge("__cartpilot".to_string()));
    assert!(calls.contains(&ViewCall::SetCounter("🛒 Cart (1)".to_string())));
}

// ---------------------------------------------------------------------------
// Add to cart
// ---------------------------------------------------------------------------

#[tokio::test]
async fn add_updates_counter_and_shows_message() {
    let api = FakeStorefront::default();
    *api.add.lock().unwrap() = Some(Ok(AddToCartResponse {
        cart_count: 2,
        message: Some("Item added".to_string()),
    }));

    let view = Arc::new(RecordingView::default());
    let mut controller = controller_with(api, Arc::clone(&view));
    controller.dispatch(UiEvent::AddToCart { id: 7 }).await;

    let calls = view.calls();
    assert_eq!(
        calls[0],
        ViewCall::SetDisabled(".add-to-cart-btn[data-id=\"7\"]".to_string(), true)
    );
    assert!(calls.contains(&ViewCall::Persist("cartCount".to_string(), "2".to_string())));
    assert!(calls.contains(&ViewCall::SetCounter("🛒 Cart (2)".to_string())));
    assert!(calls.contains(&ViewCall::ShowMessage("Item added".to_string())));
    assert_eq!(
        *calls.last().unwrap(),
        ViewCall::SetDisabled(".add-to-cart-btn[data-id=\"7\"]".to_string(), false)
    );
}

#[tokio::test]
async fn add_without_message_uses_default_text() {
    let api = FakeStorefront::default();
    *api.add.lock().unwrap() = Some(Ok(AddToCartResponse {
        cart_count: 1,
        message: None,
    }));

    let view = Arc::new(RecordingView::default());
    let mut controller = controller_with(api, Arc::clone(&view));
    controller.dispatch(UiEvent::AddToCart { id: 3 }).await;

    assert!(view
        .calls()
        .contains(&ViewCall::ShowMessage("Added to cart successfully!".to_string())));
}

#[tokio::test(start_paused = true)]
async fn message_hidden_after_timeout() {
    let api = FakeStorefront::default();
    *api.add.lock().unwrap() = Some(Ok(AddToCartResponse {
        cart_count: 1,
        message: None,
    }));

    let view = Arc::new(RecordingView::default());
    let mut controller = controller_with(api, Arc::clone(&view));
    controller.dispatch(UiEvent::AddToCart { id: 3 }).await;

    assert!(!view.calls().contains(&ViewCall::HideMessage));
    tokio::time::sleep(std::time::Duration::from_millis(2100)).await;
    assert!(view.calls().contains(&ViewCall::HideMessage));
}

#[tokio::test(start_paused = true)]
async fn newer_message_supersedes_pending_hide_timer() {
    let api = FakeStorefront::default();

    let view = Arc::new(RecordingView::default());
    let mut controller = controller_with(api, Arc::clone(&view));

    *controller_api(&controller).add.lock().unwrap() = Some(Ok(AddToCartResponse {
        cart_count: 1,
        message: None,
    }));
    controller.dispatch(UiEvent::AddToCart { id: 1 }).await;

    *controller_api(&controller).add.lock().unwrap() = Some(Ok(AddToCartResponse {
        cart_count: 2,
        message: None,
    }));
    controller.dispatch(UiEvent::AddToCart { id: 2 }).await;

    tokio::time::sleep(std::time::Duration::from_millis(2100)).await;

    // Only the newer message's timer may hide the banner.
    let hides = view
        .calls()
        .iter()
        .filter(|c| **c == ViewCall::HideMessage)
        .count();
    assert_eq!(hides, 1);
}

/// The controller owns its storefront; reach in to rescript between
/// dispatches.
fn controller_api<'a>(
    controller: &'a CartController<FakeStorefront, RecordingView>,
) -> &'a FakeStorefront {
    controller.api()
}

// ---------------------------------------------------------------------------
// Quantity adjustment
// ---------------------------------------------------------------------------

#[tokio::test]
async fn quantity_update_patches_all_nodes() {
    let api = FakeStorefront::default();
    *api.update.lock().unwrap() = Some(Ok(UpdateCartResponse {
        success: true,
        qty: 3,
        total: 19.5,
        total_qty: 4,
    }));

    let view = Arc::new(RecordingView::default());
    let mut controller = controller_with(api, Arc::clone(&view));
    controller
        .dispatch(UiEvent::AdjustQty {
            id: "7".to_string(),
            action: QtyAction::Increase,
        })
        .await;

    let calls = view.calls();
    assert!(calls.contains(&ViewCall::SetText("qty-7".to_string(), "3".to_string())));
    assert!(calls.contains(&ViewCall::SetText(
        "total-price".to_string(),
        "19.50".to_string()
    )));
    assert!(calls.contains(&ViewCall::SetText(
        "total-items".to_string(),
        "4".to_string()
    )));
    assert!(calls.contains(&ViewCall::SetCounter("🛒 Cart (4)".to_string())));
    // The quantity path redisplays without persisting.
    assert!(!calls.iter().any(|c| matches!(c, ViewCall::Persist(_, _))));
    assert_eq!(controller.store().quantity("7"), Some(3));
    assert_eq!(controller.store().count(), 4);
}

#[tokio::test]
async fn rejected_quantity_update_leaves_ui_unchanged() {
    let api = FakeStorefront::default();
    *api.update.lock().unwrap() = Some(Ok(UpdateCartResponse {
        success: false,
        qty: 0,
        total: 0.0,
        total_qty: 0,
    }));

    let view = Arc::new(RecordingView::default());
    let mut controller = controller_with(api, Arc::clone(&view));
    controller
        .dispatch(UiEvent::AdjustQty {
            id: "7".to_string(),
            action: QtyAction::Decrease,
        })
        .await;

    // Only the disable guard ran; no patches, no counter update.
    assert!(view
        .calls()
        .iter()
        .all(|c| matches!(c, ViewCall::SetDisabled(_, _))));
    assert_eq!(controller.store().quantity("7"), None);
}

#[tokio::test]
async fn quantity_transport_error_leaves_ui_unchanged() {
    let api = FakeStorefront::default();
    *api.update.lock().unwrap() = Some(Err(ApiError::Other("timeout".to_string())));

    let view = Arc::new(RecordingView::default());
    let mut controller = controller_with(api, Arc::clone(&view));
    controller
        .dispatch(UiEvent::AdjustQty {
            id: "7".to_string(),
            action: QtyAction::Increase,
        })
        .await;

    assert!(view
        .calls()
        .iter()
        .all(|c| matches!(c, ViewCall::SetDisabled(_, _))));
}

// ---------------------------------------------------------------------------
// Remove item
// ---------------------------------------------------------------------------

#[tokio::test]
async fn remove_at_zero_swaps_in_empty_cart_markup() {
    let api = FakeStorefront::default();
    *api.remove.lock().unwrap() = Some(Ok(RemoveItemResponse {
        success: true,
        total: 0.0,
        total_qty: 0,
    }));

    let view = Arc::new(RecordingView::default());
    let mut controller = controller_with(api, Arc::clone(&view));
    controller
        .dispatch(UiEvent::RemoveItem {
            id: "3".to_string(),
        })
        .await;

    let calls = view.calls();
    assert!(calls.contains(&ViewCall::RemoveCard("3".to_string())));
    assert!(calls.contains(&ViewCall::SetText(
        "total-price".to_string(),
        "0.00".to_string()
    )));
    assert!(calls.contains(&ViewCall::SetText(
        "total-items".to_string(),
        "0".to_string()
    )));
    assert!(calls.contains(&ViewCall::Persist("cartCount".to_string(), "0".to_string())));
    assert!(calls.contains(&ViewCall::SetCounter("🛒 Cart (0)".to_string())));
    assert!(calls.contains(&ViewCall::ReplaceContainer(
        "<p>Your cart is empty.</p>".to_string()
    )));
}

#[tokio::test]
async fn remove_with_items_left_keeps_container() {
    let api = FakeStorefront::default();
    *api.remove.lock().unwrap() = Some(Ok(RemoveItemResponse {
        success: true,
        total: 9.5,
        total_qty: 2,
    }));

    let view = Arc::new(RecordingView::default());
    let mut controller = controller_with(api, Arc::clone(&view));
    controller
        .dispatch(UiEvent::RemoveItem {
            id: "3".to_string(),
        })
        .await;

    let calls = view.calls();
    assert!(calls.contains(&ViewCall::RemoveCard("3".to_string())));
    assert!(calls.contains(&ViewCall::SetText(
        "total-price".to_string(),
        "9.50".to_string()
    )));
    assert!(!calls
        .iter()
        .any(|c| matches!(c, ViewCall::ReplaceContainer(_))));
}

#[tokio::test]
async fn rejected_removal_leaves_ui_unchanged() {
    let api = FakeStorefront::default();
    *api.remove.lock().unwrap() = Some(Ok(RemoveItemResponse {
        success: false,
        total: 0.0,
        total_qty: 0,
    }));

    let view = Arc::new(RecordingView::default());
    let mut controller = controller_with(api, Arc::clone(&view));
    controller
        .dispatch(UiEvent::RemoveItem {
            id: "3".to_string(),
        })
        .await;

    assert!(view
        .calls()
        .iter()
        .all(|c| matches!(c, ViewCall::SetDisabled(_, _))));
}

// ---------------------------------------------------------------------------
// Checkout
// ---------------------------------------------------------------------------

#[tokio::test]
async fn checkout_success_navigates_to_default_details_page() {
    let api = FakeStorefront::default();
    *api.checkout.lock().unwrap() = Some(Ok(CheckoutResponse {
        success: true,
        message: None,
        redirect: None,
    }));

    let view = Arc::new(RecordingView::default());
    let mut controller = controller_with(api, Arc::clone(&view));
    controller.dispatch(UiEvent::Checkout).await;

    assert!(view
        .calls()
        .contains(&ViewCall::Navigate("/checkout/details".to_string())));
}

#[tokio::test]
async fn checkout_honors_server_redirect() {
    let api = FakeStorefront::default();
    *api.checkout.lock().unwrap() = Some(Ok(CheckoutResponse {
        success: true,
        message: None,
        redirect: Some("/checkout/express".to_string()),
    }));

    let view = Arc::new(RecordingView::default());
    let mut controller = controller_with(api, Arc::clone(&view));
    controller.dispatch(UiEvent::Checkout).await;

    assert!(view
        .calls()
        .contains(&ViewCall::Navigate("/checkout/express".to_string())));
}

#[tokio::test]
async fn checkout_failure_alerts_and_stays() {
    let api = FakeStorefront::default();
    *api.checkout.lock().unwrap() = Some(Ok(CheckoutResponse {
        success: false,
        message: Some("Cart is empty".to_string()),
        redirect: None,
    }));

    let view = Arc::new(RecordingView::default());
    let mut controller = controller_with(api, Arc::clone(&view));
    controller.dispatch(UiEvent::Checkout).await;

    let calls = view.calls();
    assert!(calls.contains(&ViewCall::Alert("Cart is empty".to_string())));
    assert!(!calls.iter().any(|c| matches!(c, ViewCall::Navigate(_))));
}

#[tokio::test]
async fn checkout_failure_without_message_uses_default() {
    let api = FakeStorefront::default();
    *api.checkout.lock().unwrap() = Some(Ok(CheckoutResponse {
        success: false,
        message: None,
        redirect: None,
    }));

    let view = Arc::new(RecordingView::default());
    let mut controller = controller_with(api, Arc::clone(&view));
    controller.dispatch(UiEvent::Checkout).await;

    assert!(view
        .calls()
        .contains(&ViewCall::Alert("Your cart is empty.".to_string())));
}

#[tokio::test]
async fn checkout_transport_error_gives_no_feedback() {
    let api = FakeStorefront::default();
    *api.checkout.lock().unwrap() = Some(Err(ApiError::Other("network down".to_string())));

    let view = Arc::new(RecordingView::default());
    let mut controller = controller_with(api, Arc::clone(&view));
    controller.dispatch(UiEvent::Checkout).await;

    let calls = view.calls();
    assert!(!calls.iter().any(|c| matches!(c, ViewCall::Alert(_))));
    assert!(!calls.iter().any(|c| matches!(c, ViewCall::Navigate(_))));
}

// ---------------------------------------------------------------------------
// Request shapes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn dispatch_routes_ids_to_the_right_endpoints() {
    let api = FakeStorefront::default();
    *api.add.lock().unwrap() = Some(Ok(AddToCartResponse {
        cart_count: 1,
        message: None,
    }));

    let view = Arc::new(RecordingView::default());
    let mut controller = controller_with(api, Arc::clone(&view));
    controller.dispatch(UiEvent::AddToCart { id: 42 }).await;

    assert_eq!(controller.api().requests(), vec!["add 42".to_string()]);
}
