use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{NewOrderLine, Order, PaymentMethod};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub items: Vec<NewOrderLine>,
    pub payment_method: PaymentMethod,
    pub contact_name: String,
    pub contact_phone: String,
    pub shipping_address: String,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}
