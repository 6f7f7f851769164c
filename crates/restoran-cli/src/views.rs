//! Plain-text rendering of the menu, cart, checkout and order views.

use restoran_core::models::{CartItem, MenuItem, Order, PaymentMethod};
use restoran_core::utils::{format_rupiah, truncate_string};
use restoran_core::{Notice, NoticeLevel};

const NAME_WIDTH: usize = 28;
const ADDRESS_WIDTH: usize = 32;

pub fn print_notices(notices: &[Notice]) {
    for notice in notices {
        let prefix = match notice.level {
            NoticeLevel::Info => "",
            NoticeLevel::Warning => "warning: ",
            NoticeLevel::Error => "error: ",
        };
        eprintln!("{}{}", prefix, notice.message);
    }
}

pub fn print_menu(restaurant: &str, menu: &[MenuItem]) {
    println!("Menu for restaurant {}", restaurant);
    if menu.is_empty() {
        println!("  (no items)");
        return;
    }
    for item in menu {
        println!(
            "  {:>4}  {:<width$}  {:>12}",
            item.id,
            truncate_string(&item.name, NAME_WIDTH),
            item.display_price(),
            width = NAME_WIDTH
        );
    }
}

fn print_lines(cart: &[CartItem]) {
    for item in cart {
        println!(
            "  {:>4}  {:<width$}  {:>3} x {:>10}  {:>12}",
            item.menu.id,
            truncate_string(&item.menu.name, NAME_WIDTH),
            item.quantity,
            format_rupiah(item.menu.price),
            item.display_line_total(),
            width = NAME_WIDTH
        );
    }
}

pub fn print_cart(cart: &[CartItem], total: i64) {
    println!("Cart");
    if cart.is_empty() {
        println!("  Your cart is empty.");
        return;
    }
    print_lines(cart);
    println!("  Total: {}", format_rupiah(total));
}

pub fn print_checkout(cart: &[CartItem], total: i64, payment: Option<PaymentMethod>, address: &str) {
    println!("Checkout");
    print_lines(cart);
    println!("  Total:    {}", format_rupiah(total));
    if let Some(method) = payment {
        println!("  Payment:  {}", method);
    }
    if !address.trim().is_empty() {
        println!("  Deliver:  {}", address.trim());
    }
}

pub fn print_orders(orders: &[Order]) {
    println!("Order history");
    if orders.is_empty() {
        println!("  No orders yet.");
        return;
    }
    for order in orders {
        println!(
            "  #{:<5} {:<18} {:>12}  {:<10} {:<12} {}",
            order.id,
            order.display_created_at(),
            order.display_total(),
            order.payment_method,
            order.status,
            truncate_string(&order.delivery_address, ADDRESS_WIDTH)
        );
    }
}
