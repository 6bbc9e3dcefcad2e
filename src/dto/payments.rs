use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Order;

/// Synthetic intent; nothing is persisted and no idempotency key exists.
#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentIntent {
    pub payment_id: String,
    pub order_id: Uuid,
    pub amount: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyPaymentRequest {
    pub payment_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentOutcome {
    Succeeded,
    Declined,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentResult {
    pub payment_id: String,
    pub outcome: PaymentOutcome,
    /// Present when the payment settled and the order moved to `paid`.
    pub order: Option<Order>,
}
