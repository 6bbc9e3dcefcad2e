use uuid::Uuid;

use crate::{
    dto::inventory::{AdjustStockRequest, LedgerList, StockAdjustment},
    dto::products::ProductList,
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    response::{ApiResponse, Meta},
    routes::params::{LedgerQuery, LowStockQuery},
    state::AppState,
    store::LedgerFilter,
};

pub async fn list_ledger(
    state: &AppState,
    user: &AuthUser,
    query: LedgerQuery,
) -> AppResult<ApiResponse<LedgerList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination.normalize();
    let filter = LedgerFilter {
        product_id: query.product_id,
        limit,
        offset,
    };
    let (items, total) = state.store.list_inventory(&filter).await?;
    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Inventory records",
        LedgerList { items },
        Some(meta),
    ))
}

pub async fn list_low_stock(
    state: &AppState,
    user: &AuthUser,
    query: LowStockQuery,
) -> AppResult<ApiResponse<ProductList>> {
    ensure_admin(user)?;
    let threshold = query.threshold.unwrap_or(5);
    let (page, limit, offset) = query.pagination.normalize();
    let (items, total) = state.store.low_stock(threshold, limit, offset).await?;
    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Low stock",
        ProductList { items },
        Some(meta),
    ))
}

pub async fn adjust(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    payload: AdjustStockRequest,
) -> AppResult<ApiResponse<StockAdjustment>> {
    ensure_admin(user)?;
    if payload.delta == 0 {
        return Err(AppError::BadRequest("delta must not be 0".into()));
    }

    let (product, record) = state
        .store
        .adjust_stock(product_id, payload.delta, payload.note, Some(user.user_id))
        .await?;

    tracing::info!(
        product_id = %product.id,
        delta = payload.delta,
        stock = product.stock,
        "inventory adjusted"
    );
    Ok(ApiResponse::success(
        "Inventory updated",
        StockAdjustment { product, record },
        Some(Meta::empty()),
    ))
}
