use mongodb::bson::oid::ObjectId;
use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAYMENT_METHOD: &str = "COD";
pub const PENDING: &str = "Pending";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ShippingAddress {
    pub first_name: String,
    pub last_name: String,
    pub address1: String,
    pub address2: String,
    pub country: String,
    pub province: String,
    pub city: String,
    pub postal_code: String,
    pub phone: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Pricing {
    pub subtotal: f64,
    pub shipping: f64,
    pub total: f64,
    pub currency: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: ObjectId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub qty: u32,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub seller_email: String,
}

impl OrderItem {
    pub fn line_total(&self) -> f64 {
        self.price * f64::from(self.qty)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub email: String,
    pub shipping: ShippingAddress,
    pub payment_method: String,
    pub items: Vec<OrderItem>,
    pub pricing: Pricing,
    pub status: String,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

/// Checkout payload posted by the storefront.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub shipping: ShippingAddress,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderItemRequest>,
    #[serde(default)]
    pub pricing: Pricing,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub product_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub qty: u32,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub seller_email: String,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct OrderPlaced {
    pub success: bool,
    pub order_id: String,
}
