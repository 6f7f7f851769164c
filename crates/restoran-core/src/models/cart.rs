use serde::{Deserialize, Serialize};

use crate::utils::format_rupiah;

/// Smallest quantity a cart line may hold. Going lower is a removal.
pub const MIN_QUANTITY: i64 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: i64,
    pub quantity: i64,
    pub menu: CartMenu,
}

/// The menu entry embedded in a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartMenu {
    pub id: i64,
    pub name: String,
    pub price: i64,
    #[serde(rename = "imageUrl", default)]
    pub image_url: String,
}

/// `GET /api/cart/{userId}` wraps the lines in a `data` field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CartResponse {
    #[serde(default)]
    pub data: Vec<CartItem>,
}

/// Body of `PATCH /api/cart`. Carries the desired end state, not a delta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartQuantityUpdate {
    #[serde(rename = "userId")]
    pub user_id: i64,
    #[serde(rename = "menuId")]
    pub menu_id: i64,
    pub quantity: i64,
}

impl CartItem {
    /// Price times quantity, saturating instead of overflowing on bad data.
    pub fn line_total(&self) -> i64 {
        self.menu.price.saturating_mul(self.quantity)
    }

    pub fn display_line_total(&self) -> String {
        format_rupiah(self.line_total())
    }
}

pub fn is_valid_quantity(quantity: i64) -> bool {
    quantity >= MIN_QUANTITY
}

/// Sum of price * quantity over every line. Both the cart view and the
/// checkout view display this value.
pub fn cart_total(items: &[CartItem]) -> i64 {
    items
        .iter()
        .map(CartItem::line_total)
        .fold(0, i64::saturating_add)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(id: i64, menu_id: i64, price: i64, quantity: i64) -> CartItem {
        CartItem {
            id,
            quantity,
            menu: CartMenu {
                id: menu_id,
                name: format!("Menu {}", menu_id),
                price,
                image_url: String::new(),
            },
        }
    }

    #[test]
    fn test_cart_total_two_lines() {
        let items = vec![line(1, 10, 15000, 2), line(2, 11, 25000, 1)];
        assert_eq!(cart_total(&items), 55000);
        assert_eq!(format_rupiah(cart_total(&items)), "Rp 55.000");
    }

    #[test]
    fn test_cart_total_empty() {
        assert_eq!(cart_total(&[]), 0);
    }

    #[test]
    fn test_cart_total_saturates_on_huge_values() {
        let items = vec![line(1, 10, i64::MAX, 2), line(2, 11, 25000, 1)];
        assert_eq!(items[0].line_total(), i64::MAX);
        assert_eq!(cart_total(&items), i64::MAX);
    }

    #[test]
    fn test_quantity_bounds() {
        assert!(!is_valid_quantity(0));
        assert!(!is_valid_quantity(-3));
        assert!(is_valid_quantity(1));
        assert!(is_valid_quantity(99));
    }

    #[test]
    fn test_cart_response_parses_wrapped_lines() {
        let json = r#"{"data":[{"id":1,"quantity":2,"menu":{"id":10,"name":"Sate","price":15000,"imageUrl":"x"}}]}"#;
        let parsed: CartResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.data.len(), 1);
        assert_eq!(parsed.data[0].line_total(), 30000);

        let empty: CartResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.data.is_empty());
    }
}
