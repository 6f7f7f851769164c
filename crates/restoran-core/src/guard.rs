//! Route table and the access check run on every navigation.
//!
//! The decision is a pure function of "is there a token" and "what kind of
//! route is this", so it can be tested without any view code. Nothing is
//! cached: `RouteGuard::check` reads the session each time it is called.

use std::fmt;

use tracing::debug;

use crate::auth::SessionStore;

/// Every view the client knows about.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Register,
    Home,
    Posts,
    Restaurants,
    Menu(String),
    Cart,
    Checkout,
    OrderHistory,
    Profile,
    Help,
    NotFound(String),
}

/// Who may enter a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Only reachable without a session (login, register).
    Public,
    /// Only reachable with a session.
    Private,
    /// Reachable either way (the 404 view).
    Open,
}

/// Outcome of a guard check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Redirect(Route),
}

impl Route {
    /// Parse a path such as `/menu/3` or `cart`. Unknown paths map to
    /// `NotFound` carrying the original path.
    pub fn parse(path: &str) -> Self {
        let trimmed = path.trim().trim_matches('/');
        let segments: Vec<&str> = trimmed.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Route::Home,
            ["login"] => Route::Login,
            ["register"] => Route::Register,
            ["posts"] => Route::Posts,
            ["restaurants"] => Route::Restaurants,
            ["menu", restaurant_id] => Route::Menu((*restaurant_id).to_string()),
            ["cart"] => Route::Cart,
            ["checkout"] => Route::Checkout,
            ["orderhistory"] => Route::OrderHistory,
            ["profile"] => Route::Profile,
            ["help"] => Route::Help,
            _ => Route::NotFound(format!("/{}", trimmed)),
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Login => "/login".to_string(),
            Route::Register => "/register".to_string(),
            Route::Home => "/".to_string(),
            Route::Posts => "/posts".to_string(),
            Route::Restaurants => "/restaurants".to_string(),
            Route::Menu(id) => format!("/menu/{}", id),
            Route::Cart => "/cart".to_string(),
            Route::Checkout => "/checkout".to_string(),
            Route::OrderHistory => "/orderhistory".to_string(),
            Route::Profile => "/profile".to_string(),
            Route::Help => "/help".to_string(),
            Route::NotFound(path) => path.clone(),
        }
    }

    pub fn access(&self) -> Access {
        match self {
            Route::Login | Route::Register => Access::Public,
            Route::NotFound(_) => Access::Open,
            _ => Access::Private,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Pure access decision.
///
/// Private routes without a session go to the login view; public routes with
/// a session go to the home view. The attempted path is not remembered.
pub fn decide(session_present: bool, access: Access) -> Decision {
    match (access, session_present) {
        (Access::Private, false) => Decision::Redirect(Route::Login),
        (Access::Public, true) => Decision::Redirect(Route::Home),
        _ => Decision::Allow,
    }
}

/// Applies `decide` against a live session store.
#[derive(Debug, Clone)]
pub struct RouteGuard {
    session: SessionStore,
}

impl RouteGuard {
    pub fn new(session: SessionStore) -> Self {
        Self { session }
    }

    pub fn check(&self, route: &Route) -> Decision {
        let decision = decide(self.session.is_authenticated(), route.access());
        debug!(route = %route, ?decision, "Route guard evaluated");
        decision
    }

    /// The route the user actually ends up on when asking for `route`.
    pub fn resolve(&self, route: Route) -> Route {
        match self.check(&route) {
            Decision::Allow => route,
            Decision::Redirect(target) => target,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
