use uuid::Uuid;

use crate::{
    dto::orders::{CreateOrderRequest, OrderList, UpdateOrderStatusRequest},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Order, OrderStatus},
    response::{ApiResponse, Meta},
    routes::params::OrderListQuery,
    state::AppState,
    store::{NewOrder, OrderFilter},
};

pub async fn create_order(
    state: &AppState,
    user: &AuthUser,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<Order>> {
    if payload.items.is_empty() {
        return Err(AppError::BadRequest("Order has no items".into()));
    }
    if payload.contact_name.trim().is_empty() || payload.contact_phone.trim().is_empty() {
        return Err(AppError::BadRequest("Contact info is required".into()));
    }
    if payload.shipping_address.trim().is_empty() {
        return Err(AppError::BadRequest("Shipping address is required".into()));
    }

    let order = state
        .store
        .place_order(NewOrder {
            user_id: user.user_id,
            lines: payload.items,
            payment_method: payload.payment_method,
            contact_name: payload.contact_name,
            contact_phone: payload.contact_phone,
            shipping_address: payload.shipping_address,
            note: payload.note,
        })
        .await?;

    tracing::info!(order_id = %order.id, order_number = %order.order_number, "order placed");
    Ok(ApiResponse::success(
        "Order placed",
        order,
        Some(Meta::empty()),
    ))
}

pub async fn list_my_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination.normalize();
    let filter = OrderFilter {
        user_id: Some(user.user_id),
        status: query.status,
        sort_order: query.sort_order,
        limit,
        offset,
    };
    let (items, total) = state.store.list_orders(&filter).await?;
    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Orders", OrderList { items }, Some(meta)))
}

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination.normalize();
    let filter = OrderFilter {
        user_id: None,
        status: query.status,
        sort_order: query.sort_order,
        limit,
        offset,
    };
    let (items, total) = state.store.list_orders(&filter).await?;
    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Orders", OrderList { items }, Some(meta)))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    let order = state
        .store
        .order_by_id(id)
        .await?
        .ok_or(AppError::NotFound)?;
    if order.user_id != user.user_id && !user.is_admin() {
        return Err(AppError::NotFound);
    }
    Ok(ApiResponse::success("Order", order, Some(Meta::empty())))
}

pub async fn cancel_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    let order = state
        .store
        .order_by_id(id)
        .await?
        .ok_or(AppError::NotFound)?;
    if order.user_id != user.user_id && !user.is_admin() {
        return Err(AppError::NotFound);
    }

    let order = state.store.cancel_order(id, Some(user.user_id)).await?;

    tracing::info!(order_id = %order.id, "order cancelled");
    Ok(ApiResponse::success(
        "Order cancelled",
        order,
        Some(Meta::empty()),
    ))
}

/// Admin sets any known status; there is deliberately no transition table,
/// only the matching timestamp side effect.
pub async fn update_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;
    let status = OrderStatus::parse(&payload.status)
        .ok_or_else(|| AppError::BadRequest("Invalid order status".into()))?;

    let order = state.store.set_order_status(id, status).await?;

    tracing::info!(order_id = %order.id, status = %status.as_str(), "order status updated");
    Ok(ApiResponse::success(
        "Order updated",
        order,
        Some(Meta::empty()),
    ))
}
