use axum::{
    Json, Router,
    extract::{Path, State},
    routing::post,
};
use uuid::Uuid;

use crate::{
    dto::payments::{PaymentIntent, PaymentResult, VerifyPaymentRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::payment_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{order_id}", post(create_intent))
        .route("/{order_id}/verify", post(verify))
}

#[utoipa::path(
    post,
    path = "/api/v1/payments/{order_id}",
    params(("order_id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Create payment intent", body = ApiResponse<PaymentIntent>),
        (status = 400, description = "Order not payable"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
pub async fn create_intent(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<PaymentIntent>>> {
    let resp = payment_service::create_intent(&state, &user, order_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/v1/payments/{order_id}/verify",
    params(("order_id" = Uuid, Path, description = "Order ID")),
    request_body = VerifyPaymentRequest,
    responses(
        (status = 200, description = "Simulated verification result", body = ApiResponse<PaymentResult>),
        (status = 400, description = "Order not payable"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
pub async fn verify(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<VerifyPaymentRequest>,
) -> AppResult<Json<ApiResponse<PaymentResult>>> {
    let resp = payment_service::verify(&state, &user, order_id, payload).await?;
    Ok(Json(resp))
}
