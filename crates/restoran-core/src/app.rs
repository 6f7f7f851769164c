//! Application state for the ordering client.
//!
//! `App` ties together the config, the session store, the API client and
//! the route guard, and holds what each view last fetched. User-facing
//! feedback is collected as `Notice`s instead of being printed, so any front
//! end can decide how to show it.

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, error, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::auth::{FileStorage, SessionStore};
use crate::config::Config;
use crate::guard::{Route, RouteGuard};
use crate::models::{
    cart_total, is_valid_quantity, AddToCart, CartItem, CartQuantityUpdate, MenuItem, Order,
    OrderRequest, PaymentMethod, MIN_QUANTITY,
};

/// User id used when the backend never told us one.
pub const DEFAULT_USER_ID: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

pub struct App {
    pub config: Config,
    pub session: SessionStore,
    pub api: ApiClient,
    guard: RouteGuard,

    /// Where the user currently is, after guarding.
    pub route: Route,

    // Last successful fetches
    pub cart: Vec<CartItem>,
    pub menu: Vec<MenuItem>,
    pub orders: Vec<Order>,

    /// Menu ids added to the cart since the current menu view was opened
    pub menu_added: HashSet<i64>,

    notices: Vec<Notice>,
}

impl App {
    pub fn new(config: Config, session: SessionStore) -> Result<Self> {
        let base_url = config.base_url();
        debug!(base_url = %base_url, "Creating API client");
        let api = ApiClient::with_options(&base_url, session.clone(), config.client_options())
            .context("Failed to create API client")?;

        let guard = RouteGuard::new(session.clone());
        let route = guard.resolve(Route::Home);

        Ok(Self {
            config,
            session,
            api,
            guard,
            route,
            cart: Vec::new(),
            menu: Vec::new(),
            orders: Vec::new(),
            menu_added: HashSet::new(),
            notices: Vec::new(),
        })
    }

    /// Open the app with `config`, restoring the session persisted in the
    /// config's cache directory.
    pub fn open(config: Config) -> Result<Self> {
        let cache_dir = config.cache_dir().unwrap_or_else(|_| PathBuf::from("./cache"));
        debug!(?cache_dir, "Session directory configured");

        let session = SessionStore::load(FileStorage::new(cache_dir));
        Self::new(config, session)
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Move to `route`, or to wherever the guard sends us instead.
    pub fn navigate(&mut self, route: Route) -> &Route {
        let target = self.guard.resolve(route.clone());
        if target != route {
            info!(requested = %route, target = %target, "Navigation redirected");
        }
        if matches!(target, Route::Menu(_)) && target != self.route {
            self.menu_added.clear();
        }
        self.route = target;
        &self.route
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    pub fn user_id(&self) -> i64 {
        self.session.user_id().unwrap_or(DEFAULT_USER_ID)
    }

    // =========================================================================
    // Notices
    // =========================================================================

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn notify(&mut self, level: NoticeLevel, message: impl Into<String>) {
        self.notices.push(Notice::new(level, message));
    }

    /// Protected actions call this before touching the network.
    fn require_session(&mut self) -> bool {
        if self.session.is_authenticated() {
            return true;
        }
        debug!("Protected action without a session, redirecting to login");
        self.notify(NoticeLevel::Warning, "You must log in first.");
        self.navigate(Route::Login);
        false
    }

    fn report(&mut self, action: &str, err: ApiError) {
        if let ApiError::MissingSession = err {
            self.require_session();
            return;
        }

        error!(action = action, error = %err, "Request failed");
        self.notify(NoticeLevel::Error, format!("{}: {}", action, err));

        // The client may have logged us out on a 401/403
        if err.is_auth_failure() && !self.session.is_authenticated() {
            self.navigate(Route::Login);
        }
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Log in with email and password. On success the token is stored and
    /// the user lands on the home view.
    pub async fn login(&mut self, email: &str, password: &str) -> bool {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            self.notify(NoticeLevel::Warning, "Email and password are required.");
            return false;
        }

        match self.api.authenticate(email, password).await {
            Ok(response) => {
                if let Err(e) = self.session.login(response.access_token) {
                    warn!(error = %e, "Failed to save session");
                }
                if let Some(user_id) = response.user_id {
                    if let Err(e) = self.session.set_user_id(user_id) {
                        warn!(error = %e, "Failed to save user id");
                    }
                }
                self.config.last_email = Some(email.to_string());

                info!("Login successful");
                self.navigate(Route::Home);
                true
            }
            Err(e) => {
                error!(error = %e, "Login failed");
                let message = match &e {
                    ApiError::Unauthorized
                    | ApiError::AccessDenied(_)
                    | ApiError::NotFound(_)
                    | ApiError::Rejected { .. } => "Username or password is wrong".to_string(),
                    ApiError::Network(_) => {
                        "Unable to connect to server. Check your internet connection.".to_string()
                    }
                    ApiError::Timeout => "Connection timed out. Please try again.".to_string(),
                    other => format!("Login failed: {}", other),
                };
                self.notify(NoticeLevel::Error, message);
                false
            }
        }
    }

    pub fn logout(&mut self) {
        if let Err(e) = self.session.logout() {
            warn!(error = %e, "Failed to clear stored session");
        }
        self.cart.clear();
        self.orders.clear();
        self.menu_added.clear();
        info!("Logged out");
        self.navigate(Route::Login);
    }

    // =========================================================================
    // Cart
    // =========================================================================

    pub async fn load_cart(&mut self) -> bool {
        if !self.require_session() {
            return false;
        }
        match self.api.fetch_cart(self.user_id()).await {
            Ok(items) => {
                debug!(count = items.len(), "Cart loaded");
                self.cart = items;
                true
            }
            Err(e) => {
                self.report("Failed to load cart", e);
                false
            }
        }
    }

    /// Set the quantity of the cart line for `menu_id`. Quantities below
    /// the minimum are refused without contacting the backend.
    pub async fn change_quantity(&mut self, menu_id: i64, new_quantity: i64) -> bool {
        if !is_valid_quantity(new_quantity) {
            self.notify(
                NoticeLevel::Warning,
                format!("Minimum quantity is {}", MIN_QUANTITY),
            );
            return false;
        }
        if !self.require_session() {
            return false;
        }

        let update = CartQuantityUpdate {
            user_id: self.user_id(),
            menu_id,
            quantity: new_quantity,
        };
        match self.api.update_cart_quantity(&update).await {
            Ok(()) => {
                for item in self.cart.iter_mut().filter(|i| i.menu.id == menu_id) {
                    item.quantity = new_quantity;
                }
                true
            }
            Err(e) => {
                self.report("Failed to update quantity", e);
                false
            }
        }
    }

    pub async fn remove_cart_item(&mut self, menu_id: i64) -> bool {
        if !self.require_session() {
            return false;
        }
        match self.api.remove_cart_item(self.user_id(), menu_id).await {
            Ok(()) => {
                self.cart.retain(|item| item.menu.id != menu_id);
                self.notify(NoticeLevel::Info, "Item removed from cart.");
                true
            }
            Err(e) => {
                self.report("Failed to remove item from cart", e);
                false
            }
        }
    }

    /// Total shown in both the cart and checkout views.
    pub fn cart_total(&self) -> i64 {
        cart_total(&self.cart)
    }

    // =========================================================================
    // Menu
    // =========================================================================

    pub async fn load_menu(&mut self) -> bool {
        if !self.require_session() {
            return false;
        }
        match self.api.fetch_menus().await {
            Ok(menu) => {
                debug!(count = menu.len(), "Menu loaded");
                self.menu = menu;
                true
            }
            Err(e) => {
                self.report("Failed to load menu", e);
                false
            }
        }
    }

    /// Add one of `menu_id` to the cart. Adding an item that is already a
    /// line of the loaded cart, or was added from this menu view, is refused
    /// locally.
    pub async fn add_to_cart(&mut self, menu_id: i64) -> bool {
        if !self.require_session() {
            return false;
        }
        let in_cart = self.cart.iter().any(|item| item.menu.id == menu_id);
        if in_cart || self.menu_added.contains(&menu_id) {
            self.notify(NoticeLevel::Warning, "This item is already in the cart!");
            return false;
        }

        let item = AddToCart {
            user_id: self.user_id(),
            menu_id,
            quantity: 1,
        };
        match self.api.add_to_cart(&item).await {
            Ok(()) => {
                self.menu_added.insert(menu_id);
                self.notify(NoticeLevel::Info, "Added to cart!");
                true
            }
            Err(e) => {
                self.report("Failed to add to cart", e);
                false
            }
        }
    }

    // =========================================================================
    // Checkout & orders
    // =========================================================================

    /// Submit the loaded cart as an order. On success the cart is emptied
    /// and the user moves to the order history view.
    pub async fn checkout(&mut self, payment_method: Option<PaymentMethod>, delivery_address: &str) -> bool {
        let payment_method = match payment_method {
            Some(method) if !delivery_address.trim().is_empty() => method,
            _ => {
                self.notify(
                    NoticeLevel::Warning,
                    "Please choose a payment method and fill in the delivery address!",
                );
                return false;
            }
        };
        if self.cart.is_empty() {
            self.notify(NoticeLevel::Warning, "Cart is empty, cannot place an order.");
            return false;
        }
        if !self.require_session() {
            return false;
        }

        let order = OrderRequest::from_cart(self.user_id(), payment_method, delivery_address, &self.cart);
        info!(total = order.total_price, lines = order.cart_items.len(), "Placing order");

        match self.api.place_order(&order).await {
            Ok(()) => {
                self.notify(NoticeLevel::Info, "Order placed!");
                self.cart.clear();
                self.navigate(Route::OrderHistory);
                true
            }
            Err(e) => {
                self.report("Failed to place order", e);
                false
            }
        }
    }

    pub async fn load_orders(&mut self) -> bool {
        if !self.require_session() {
            return false;
        }
        match self.api.fetch_orders(self.user_id()).await {
            Ok(orders) => {
                debug!(count = orders.len(), "Order history loaded");
                self.orders = orders;
                true
            }
            Err(e) => {
                self.report("Failed to load order history", e);
                false
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
