use uuid::Uuid;

use crate::{
    dto::payments::{PaymentIntent, PaymentOutcome, PaymentResult, VerifyPaymentRequest},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::OrderStatus,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Simulated gateway acceptance rate.
const SUCCESS_RATE: f64 = 0.9;

fn gateway_accepts() -> bool {
    rand::random::<f64>() < SUCCESS_RATE
}

pub async fn create_intent(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
) -> AppResult<ApiResponse<PaymentIntent>> {
    let order = state
        .store
        .order_by_id(order_id)
        .await?
        .ok_or(AppError::NotFound)?;
    if order.user_id != user.user_id && !user.is_admin() {
        return Err(AppError::NotFound);
    }
    if order.status != OrderStatus::Pending {
        return Err(AppError::BadRequest("Order is not payable".into()));
    }

    let intent = PaymentIntent {
        payment_id: format!("PAY-{}", Uuid::new_v4().simple()),
        order_id: order.id,
        amount: order.total_amount,
    };
    Ok(ApiResponse::success(
        "Payment intent created",
        intent,
        Some(Meta::empty()),
    ))
}

/// Pretend-verification: no gateway is called, the result is a coin flip.
pub async fn verify(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
    payload: VerifyPaymentRequest,
) -> AppResult<ApiResponse<PaymentResult>> {
    let order = state
        .store
        .order_by_id(order_id)
        .await?
        .ok_or(AppError::NotFound)?;
    if order.user_id != user.user_id && !user.is_admin() {
        return Err(AppError::NotFound);
    }

    if !gateway_accepts() {
        tracing::info!(order_id = %order_id, payment_id = %payload.payment_id, "payment declined");
        let result = PaymentResult {
            payment_id: payload.payment_id,
            outcome: PaymentOutcome::Declined,
            order: None,
        };
        return Ok(ApiResponse::success(
            "Payment declined",
            result,
            Some(Meta::empty()),
        ));
    }

    let order = state.store.mark_order_paid(order_id).await?;

    tracing::info!(order_id = %order.id, payment_id = %payload.payment_id, "payment recorded");
    let result = PaymentResult {
        payment_id: payload.payment_id,
        outcome: PaymentOutcome::Succeeded,
        order: Some(order),
    };
    Ok(ApiResponse::success(
        "Payment recorded",
        result,
        Some(Meta::empty()),
    ))
}
