use serde::{Deserialize, Serialize};

use crate::utils::format_rupiah;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: i64,
    #[serde(rename = "imageUrl", default)]
    pub image_url: String,
}

impl MenuItem {
    pub fn display_price(&self) -> String {
        format_rupiah(self.price)
    }
}

/// Body of `POST /api/cart`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddToCart {
    #[serde(rename = "userId")]
    pub user_id: i64,
    #[serde(rename = "menuId")]
    pub menu_id: i64,
    pub quantity: i64,
}
