use serde::{Deserialize, Serialize};

use crate::models::user::UserId;

pub const DEFAULT_PAYMENT_METHOD: &str = "CASH_ON_DELIVERY";

/// One cart line. Carts written by older clients used `laptopID` or `id`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct CartLine {
    #[serde(rename = "laptopId", alias = "laptopID", alias = "id")]
    pub laptop_id: i64,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Checkout {
    pub laptops: Vec<CartLine>,
    #[serde(default)]
    pub payment_method: Option<String>,
}

/// Body of `/orders/create-with-payment`: one laptop id per unit ordered.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderWithPaymentRequest {
    pub user_id: UserId,
    pub laptop_ids: Vec<i64>,
    pub payment_method: String,
}

/// How the order status reaches `/admin/orders/{id}/status`; backend
/// versions disagree on body, query parameter or path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusUpdateStyle {
    Body,
    Query,
    Path,
}
