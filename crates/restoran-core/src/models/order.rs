use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::cart::{cart_total, CartItem};
use crate::utils::{format_date, format_rupiah};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "e-wallet")]
    EWallet,
    #[serde(rename = "transfer")]
    Transfer,
    #[serde(rename = "cod")]
    CashOnDelivery,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 3] = [
        PaymentMethod::EWallet,
        PaymentMethod::Transfer,
        PaymentMethod::CashOnDelivery,
    ];

    /// Value sent to the backend.
    pub fn code(&self) -> &'static str {
        match self {
            PaymentMethod::EWallet => "e-wallet",
            PaymentMethod::Transfer => "transfer",
            PaymentMethod::CashOnDelivery => "cod",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PaymentMethod::EWallet => "E-Wallet",
            PaymentMethod::Transfer => "Bank Transfer",
            PaymentMethod::CashOnDelivery => "Cash On Delivery",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        PaymentMethod::ALL
            .into_iter()
            .find(|m| m.code() == lower)
            .ok_or_else(|| format!("unknown payment method '{}' (expected e-wallet, transfer or cod)", s))
    }
}

/// A past order as returned by `GET /api/order/{userId}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    #[serde(rename = "totalPrice")]
    pub total_price: i64,
    #[serde(rename = "paymentMethod", default)]
    pub payment_method: String,
    #[serde(rename = "deliveryAddress", default)]
    pub delivery_address: String,
    #[serde(rename = "createdAt", default)]
    pub created_at: String,
    #[serde(default)]
    pub status: String,
}

impl Order {
    pub fn display_total(&self) -> String {
        format_rupiah(self.total_price)
    }

    pub fn display_created_at(&self) -> String {
        format_date(&self.created_at)
    }
}

/// The order history endpoint has been seen returning both a bare array and
/// a `{ "data": [...] }` wrapper.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OrdersResponse {
    List(Vec<Order>),
    Wrapped {
        #[serde(default)]
        data: Vec<Order>,
    },
}

impl OrdersResponse {
    pub fn into_orders(self) -> Vec<Order> {
        match self {
            OrdersResponse::List(orders) | OrdersResponse::Wrapped { data: orders } => orders,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLine {
    #[serde(rename = "menuId")]
    pub menu_id: i64,
    pub quantity: i64,
    pub price: i64,
}

/// Body of `POST /api/order/{userId}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderRequest {
    #[serde(rename = "userId")]
    pub user_id: i64,
    #[serde(rename = "paymentMethod")]
    pub payment_method: PaymentMethod,
    #[serde(rename = "deliveryAddress")]
    pub delivery_address: String,
    #[serde(rename = "totalPrice")]
    pub total_price: i64,
    #[serde(rename = "cartItems")]
    pub cart_items: Vec<OrderLine>,
}

impl OrderRequest {
    pub fn from_cart(
        user_id: i64,
        payment_method: PaymentMethod,
        delivery_address: &str,
        items: &[CartItem],
    ) -> Self {
        Self {
            user_id,
            payment_method,
            delivery_address: delivery_address.trim().to_string(),
            total_price: cart_total(items),
            cart_items: items
                .iter()
                .map(|item| OrderLine {
                    menu_id: item.menu.id,
                    quantity: item.quantity,
                    price: item.menu.price,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::cart::CartMenu;

    fn item(menu_id: i64, price: i64, quantity: i64) -> CartItem {
        CartItem {
            id: menu_id * 100,
            quantity,
            menu: CartMenu {
                id: menu_id,
                name: String::from("x"),
                price,
                image_url: String::new(),
            },
        }
    }

    #[test]
    fn test_payment_method_parse() {
        assert_eq!("cod".parse::<PaymentMethod>(), Ok(PaymentMethod::CashOnDelivery));
        assert_eq!(" E-Wallet ".parse::<PaymentMethod>(), Ok(PaymentMethod::EWallet));
        assert!("cash".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_order_request_matches_cart_total() {
        let items = vec![item(10, 15000, 2), item(11, 25000, 1)];
        let request = OrderRequest::from_cart(1, PaymentMethod::Transfer, "  Jl. Makan 1 ", &items);

        assert_eq!(request.total_price, 55000);
        assert_eq!(request.total_price, cart_total(&items));
        assert_eq!(request.delivery_address, "Jl. Makan 1");

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["paymentMethod"], "transfer");
        assert_eq!(body["cartItems"][0], serde_json::json!({"menuId": 10, "quantity": 2, "price": 15000}));
    }

    #[test]
    fn test_orders_response_shapes() {
        let bare = r#"[{"id":1,"totalPrice":55000,"paymentMethod":"cod","deliveryAddress":"a","createdAt":"2025-05-01T10:00:00Z","status":"pending"}]"#;
        let wrapped = r#"{"data":[{"id":2,"totalPrice":1000}]}"#;

        let orders = serde_json::from_str::<OrdersResponse>(bare).unwrap().into_orders();
        assert_eq!(orders[0].display_total(), "Rp 55.000");
        assert_eq!(orders[0].display_created_at(), "May 01, 2025");

        let orders = serde_json::from_str::<OrdersResponse>(wrapped).unwrap().into_orders();
        assert_eq!(orders[0].id, 2);
        assert_eq!(orders[0].status, "");
    }
}
