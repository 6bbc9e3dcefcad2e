use chrono::Utc;
use uuid::Uuid;

use crate::{
    dto::products::{
        CreateProductRequest, CreateReviewRequest, ProductList, ReviewList, UpdateProductRequest,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Product, Review},
    response::{ApiResponse, Meta},
    routes::params::ProductQuery,
    state::AppState,
    store::ProductFilter,
};

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination.normalize();
    let filter = ProductFilter {
        search: query.q,
        category: query.category,
        featured: query.featured,
        min_price: query.min_price,
        max_price: query.max_price,
        sort_by: query.sort_by,
        sort_order: query.sort_order,
        limit,
        offset,
    };
    let (items, total) = state.store.list_products(&filter).await?;
    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Products",
        ProductList { items },
        Some(meta),
    ))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Product>> {
    let product = state
        .store
        .product_by_id(id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Product", product, None))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("Name must not be empty".into()));
    }
    if payload.price < 0 {
        return Err(AppError::BadRequest("Price cannot be negative".into()));
    }
    if payload.stock < 0 {
        return Err(AppError::BadRequest("stock cannot be negative".into()));
    }

    let now = Utc::now();
    let product = Product {
        id: Uuid::new_v4(),
        name: payload.name,
        description: payload.description,
        price: payload.price,
        category: payload.category,
        stock: payload.stock,
        in_stock: payload.stock > 0,
        featured: payload.featured,
        rating: 0.0,
        num_reviews: 0,
        created_at: now,
        updated_at: now,
    };
    let product = state
        .store
        .insert_product(product, Some(user.user_id))
        .await?;

    tracing::info!(product_id = %product.id, "product created");
    Ok(ApiResponse::success(
        "Product created",
        product,
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    let existing = state
        .store
        .product_by_id(id)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut updated = existing.clone();
    if let Some(name) = payload.name {
        updated.name = name;
    }
    if let Some(description) = payload.description {
        updated.description = Some(description);
    }
    if let Some(price) = payload.price {
        if price < 0 {
            return Err(AppError::BadRequest("Price cannot be negative".into()));
        }
        updated.price = price;
    }
    if let Some(category) = payload.category {
        updated.category = category;
    }
    if let Some(featured) = payload.featured {
        updated.featured = featured;
    }
    let mut product = state.store.update_product(updated).await?;

    // A stock edit is an inventory mutation, so it lands in the ledger with
    // before/after snapshots like any other.
    if let Some(stock) = payload.stock {
        let delta = stock - product.stock;
        if delta != 0 {
            let (adjusted, _) = state
                .store
                .adjust_stock(id, delta, Some("catalog edit".into()), Some(user.user_id))
                .await?;
            product = adjusted;
        }
    }

    Ok(ApiResponse::success(
        "Updated",
        product,
        Some(Meta::empty()),
    ))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    if !state.store.delete_product(id).await? {
        return Err(AppError::NotFound);
    }

    tracing::info!(product_id = %id, "product deleted");
    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn add_review(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    payload: CreateReviewRequest,
) -> AppResult<ApiResponse<Review>> {
    if !(1..=5).contains(&payload.rating) {
        return Err(AppError::BadRequest(
            "Rating must be between 1 and 5".into(),
        ));
    }

    let review = Review {
        id: Uuid::new_v4(),
        product_id,
        user_id: user.user_id,
        rating: payload.rating,
        comment: payload.comment,
        created_at: Utc::now(),
    };
    let review = state.store.insert_review(review).await?;
    Ok(ApiResponse::success(
        "Review added",
        review,
        Some(Meta::empty()),
    ))
}

pub async fn list_reviews(
    state: &AppState,
    product_id: Uuid,
) -> AppResult<ApiResponse<ReviewList>> {
    if state.store.product_by_id(product_id).await?.is_none() {
        return Err(AppError::NotFound);
    }
    let items = state.store.list_reviews(product_id).await?;
    Ok(ApiResponse::success(
        "Reviews",
        ReviewList { items },
        Some(Meta::empty()),
    ))
}
