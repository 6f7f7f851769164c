//! One function per subcommand. Each returns whether the action succeeded;
//! user-facing problems end up as notices on the app.

use std::io::{self, Write};

use anyhow::Result;
use tracing::{debug, warn};

use restoran_core::auth::CredentialStore;
use restoran_core::models::PaymentMethod;
use restoran_core::{App, Route};

use crate::views;

/// Environment variable holding the login password for scripted use
const PASSWORD_ENV: &str = "RESTORAN_PASSWORD";

/// Enter `route`, printing where the guard sent us if it was elsewhere.
/// Returns false when the user did not end up on `route`.
fn enter(app: &mut App, route: Route) -> bool {
    let target = app.navigate(route.clone()).clone();
    if target == route {
        return true;
    }
    match target {
        Route::Login => eprintln!("You must log in first (restoran login)."),
        other => eprintln!("Redirected to {}", other.path()),
    }
    false
}

pub async fn login(app: &mut App, email: Option<String>, remember: bool) -> Result<bool> {
    if app.is_authenticated() {
        println!("Already logged in. Run `restoran logout` to switch accounts.");
        return Ok(true);
    }

    let email = match email.or_else(|| app.config.last_email.clone()) {
        Some(email) => email,
        None => prompt_email()?,
    };
    let password = password_for(&email)?;

    println!("Authenticating...");
    if !app.login(&email, &password).await {
        return Ok(false);
    }

    if remember {
        if let Err(e) = CredentialStore::remember(&email, &password) {
            warn!(error = %e, "Failed to store credentials");
        }
    }
    if let Err(e) = app.config.save() {
        warn!(error = %e, "Failed to save config");
    }

    println!("Login successful!");
    Ok(true)
}

/// Password from the environment, the keychain, or a prompt, in that order.
fn password_for(email: &str) -> Result<String> {
    if let Ok(password) = std::env::var(PASSWORD_ENV) {
        debug!("Using password from environment");
        return Ok(password);
    }
    if CredentialStore::has_password(email) {
        debug!("Using stored password");
        return CredentialStore::recall(email);
    }
    Ok(rpassword::prompt_password("Password: ")?)
}

fn prompt_email() -> Result<String> {
    print!("Email: ");
    io::stdout().flush()?;

    let mut email = String::new();
    io::stdin().read_line(&mut email)?;
    Ok(email.trim().to_string())
}

pub fn logout(app: &mut App, forget: bool) -> bool {
    app.logout();
    if forget {
        if let Some(email) = app.config.last_email.clone() {
            if let Err(e) = CredentialStore::forget(&email) {
                warn!(error = %e, "Failed to delete stored password");
            }
        }
    }
    println!("Logged out.");
    true
}

pub fn status(app: &App) -> bool {
    println!("Backend:  {}", app.api.base_url());
    if app.is_authenticated() {
        println!("Session:  logged in (user {})", app.user_id());
    } else {
        println!("Session:  logged out");
    }
    if let Some(email) = &app.config.last_email {
        println!("Email:    {}", email);
    }
    true
}

pub fn open(app: &mut App, path: &str) -> bool {
    let requested = Route::parse(path);
    let landed = enter(app, requested.clone());
    if let Route::NotFound(path) = &app.route {
        println!("404 - no page at {}", path);
        return false;
    }
    if landed {
        println!("{}", app.route.path());
    }
    landed
}

pub async fn menu(app: &mut App, restaurant: String) -> bool {
    if !enter(app, Route::Menu(restaurant.clone())) {
        return false;
    }
    if !app.load_menu().await {
        return false;
    }
    views::print_menu(&restaurant, &app.menu);
    true
}

pub async fn add(app: &mut App, restaurant: String, menu_id: i64) -> bool {
    // The cart tells us what this process did not add itself
    enter(app, Route::Menu(restaurant)) && app.load_cart().await && app.add_to_cart(menu_id).await
}

pub async fn cart(app: &mut App) -> bool {
    if !enter(app, Route::Cart) || !app.load_cart().await {
        return false;
    }
    views::print_cart(&app.cart, app.cart_total());
    true
}

pub async fn quantity(app: &mut App, menu_id: i64, quantity: i64) -> bool {
    if !enter(app, Route::Cart) || !app.load_cart().await {
        return false;
    }
    if !app.cart.iter().any(|item| item.menu.id == menu_id) {
        eprintln!("Menu {} is not in the cart.", menu_id);
        return false;
    }
    if !app.change_quantity(menu_id, quantity).await {
        return false;
    }
    views::print_cart(&app.cart, app.cart_total());
    true
}

pub async fn remove(app: &mut App, menu_id: i64) -> bool {
    if !enter(app, Route::Cart) || !app.load_cart().await {
        return false;
    }
    if !app.remove_cart_item(menu_id).await {
        return false;
    }
    views::print_cart(&app.cart, app.cart_total());
    true
}

pub async fn checkout(app: &mut App, payment: Option<PaymentMethod>, address: String) -> bool {
    if !enter(app, Route::Checkout) || !app.load_cart().await {
        return false;
    }
    views::print_checkout(&app.cart, app.cart_total(), payment, &address);
    if !app.checkout(payment, &address).await {
        return false;
    }
    // Checkout moves the app to order history
    if app.load_orders().await {
        views::print_orders(&app.orders);
    }
    true
}

pub async fn orders(app: &mut App) -> bool {
    if !enter(app, Route::OrderHistory) || !app.load_orders().await {
        return false;
    }
    views::print_orders(&app.orders);
    true
}
