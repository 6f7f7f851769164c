//! Payloads exchanged with the backend.
//!
//! - `MenuItem`, `AddToCart`: menu listing and adding to the cart
//! - `CartItem`, `CartQuantityUpdate`: cart lines and quantity changes
//! - `Order`, `OrderRequest`, `PaymentMethod`: checkout and order history
//!
//! Wire names are camelCase; prices are whole rupiah.

pub mod cart;
pub mod menu;
pub mod order;

pub use cart::{cart_total, is_valid_quantity, CartItem, CartMenu, CartQuantityUpdate, CartResponse, MIN_QUANTITY};
pub use menu::{AddToCart, MenuItem};
pub use order::{Order, OrderLine, OrderRequest, OrdersResponse, PaymentMethod};
